//! Gas concentration estimate from the MQ-135 analog output
//!
//! The sensor forms a voltage divider with a known load resistor. The ADC
//! reading gives the divider output voltage, from which the sensor
//! resistance `RS` follows; `RS/R0` is then mapped through the
//! manufacturer's empirical curve `ppm = A * (RS/R0)^B`.
//!
//! The result is a ppm-equivalent figure, not a certified concentration.

use hal_abstractions::Measurement;

use crate::error::ConfigError;

/// Calibration constants for the gas curve
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Calibration {
    /// Sensor resistance in clean air, kΩ
    pub r0_kohm: f32,
    /// Load resistor on the divider, kΩ
    pub load_kohm: f32,
    /// Divider supply voltage, V
    pub supply_voltage: f32,
    /// Curve scale factor
    pub a: f32,
    /// Curve exponent
    pub b: f32,
    /// Full-scale ADC code (4095 for a 12-bit converter)
    pub adc_max: u16,
    /// Ceiling applied to the estimate when RS approaches zero
    pub max_ppm: f32,
}

impl Default for Calibration {
    fn default() -> Self {
        Self {
            r0_kohm: 10.0,
            load_kohm: 10.0,
            supply_voltage: 5.0,
            a: 116.602_068_2,
            b: -2.769_034_857,
            adc_max: 4095,
            max_ppm: 10_000.0,
        }
    }
}

impl Calibration {
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        let positive = |v: f32| v.is_finite() && v > 0.0;
        if !positive(self.r0_kohm)
            || !positive(self.load_kohm)
            || !positive(self.supply_voltage)
            || !positive(self.a)
            || !positive(self.max_ppm)
            || !self.b.is_finite()
            || self.b == 0.0
            || self.adc_max == 0
        {
            return Err(ConfigError::InvalidCalibration);
        }
        Ok(())
    }

    /// Derive R0 from a reading taken in clean air of known concentration
    ///
    /// Inverts the curve: `RS/R0 = (ppm / A)^(1/B)`. Typical outdoor air is
    /// around 400 ppm CO2-equivalent.
    pub fn with_clean_air_r0(self, raw_adc: u16, ambient_ppm: f32) -> Result<Self, ConfigError> {
        self.validate()?;
        if !(ambient_ppm.is_finite() && ambient_ppm > 0.0) {
            return Err(ConfigError::InvalidCalibration);
        }
        let rs = self
            .sensor_resistance(raw_adc)
            .valid()
            .filter(|rs| *rs > 0.0)
            .ok_or(ConfigError::InvalidCalibration)?;

        let clean_ratio = libm::powf(ambient_ppm / self.a, 1.0 / self.b);
        let r0_kohm = rs / clean_ratio;
        if !(r0_kohm.is_finite() && r0_kohm > 0.0) {
            return Err(ConfigError::InvalidCalibration);
        }
        Ok(Self { r0_kohm, ..self })
    }

    /// Sensor resistance in kΩ for an ADC code
    ///
    /// Zero volts on the divider would divide by zero and is reported as
    /// invalid, as are codes above full scale.
    fn sensor_resistance(&self, raw_adc: u16) -> Measurement<f32> {
        if raw_adc == 0 || raw_adc > self.adc_max {
            return Measurement::Invalid;
        }
        let voltage = (raw_adc as f32 / self.adc_max as f32) * self.supply_voltage;
        if voltage <= 0.0 {
            return Measurement::Invalid;
        }
        Measurement::from_f32((self.supply_voltage - voltage) / voltage * self.load_kohm)
    }
}

/// Pure mapping from raw ADC code to estimated ppm
#[derive(Debug, Clone, Copy)]
pub struct GasEstimator {
    calibration: Calibration,
}

impl GasEstimator {
    pub fn new(calibration: &Calibration) -> Self {
        Self {
            calibration: *calibration,
        }
    }

    pub fn calibration(&self) -> &Calibration {
        &self.calibration
    }

    /// Estimate concentration for `raw_adc` in `[0, ADC_MAX]`
    ///
    /// Returns `Invalid` for a zero reading. Every other in-range code yields
    /// a finite value in `[0, max_ppm]`.
    pub fn estimate(&self, raw_adc: u16) -> Measurement<f32> {
        let cal = &self.calibration;
        let Some(rs) = self.calibration.sensor_resistance(raw_adc).valid() else {
            return Measurement::Invalid;
        };

        let ratio = rs / cal.r0_kohm;
        if ratio <= 0.0 {
            // RS -> 0 at full scale; the curve diverges
            return Measurement::Valid(cal.max_ppm);
        }

        let ppm = cal.a * libm::powf(ratio, cal.b);
        if ppm.is_finite() {
            Measurement::Valid(ppm.clamp(0.0, cal.max_ppm))
        } else {
            Measurement::Valid(cal.max_ppm)
        }
    }
}
