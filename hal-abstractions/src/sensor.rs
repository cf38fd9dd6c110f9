//! Environmental sensor provider
//!
//! Drivers report floating-point values through [`Measurement`] rather than
//! NaN sentinels so that downstream code never inspects a float to decide
//! whether it is usable.

/// A value that is either usable or known to be invalid
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Measurement<T> {
    /// The sensor produced a usable value
    Valid(T),
    /// The sensor did not produce a usable value (timeout, checksum, range)
    Invalid,
}

impl<T> Measurement<T> {
    /// Returns `true` for [`Measurement::Valid`]
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid(_))
    }

    /// Convert into an `Option`, discarding the invalid marker
    pub fn valid(self) -> Option<T> {
        match self {
            Self::Valid(value) => Some(value),
            Self::Invalid => None,
        }
    }

    /// Map the contained value, preserving `Invalid`
    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Measurement<U> {
        match self {
            Self::Valid(value) => Measurement::Valid(f(value)),
            Self::Invalid => Measurement::Invalid,
        }
    }
}

impl Measurement<f32> {
    /// Wrap a raw float, treating NaN and infinities as invalid
    pub fn from_f32(value: f32) -> Self {
        if value.is_finite() {
            Self::Valid(value)
        } else {
            Self::Invalid
        }
    }
}

impl<T> From<Option<T>> for Measurement<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => Self::Valid(value),
            None => Self::Invalid,
        }
    }
}

/// One temperature/humidity sample
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ClimateReading {
    /// Air temperature in degrees Celsius
    pub temperature_celsius: Measurement<f32>,
    /// Relative humidity in percent
    pub relative_humidity_percent: Measurement<f32>,
}

impl ClimateReading {
    /// A reading where both channels failed
    pub const INVALID: Self = Self {
        temperature_celsius: Measurement::Invalid,
        relative_humidity_percent: Measurement::Invalid,
    };
}

/// Source of raw environmental readings
#[allow(async_fn_in_trait)]
pub trait SensorProvider {
    /// Sample temperature and relative humidity
    async fn read_temperature_humidity(&mut self) -> ClimateReading;

    /// Sample the gas sensor ADC channel, in `[0, ADC_MAX]`
    async fn read_raw_gas(&mut self) -> u16;
}

impl<T: SensorProvider + ?Sized> SensorProvider for &mut T {
    async fn read_temperature_humidity(&mut self) -> ClimateReading {
        T::read_temperature_humidity(self).await
    }

    async fn read_raw_gas(&mut self) -> u16 {
        T::read_raw_gas(self).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_f32_rejects_non_finite() {
        assert_eq!(Measurement::from_f32(21.5), Measurement::Valid(21.5));
        assert_eq!(Measurement::from_f32(f32::NAN), Measurement::Invalid);
        assert_eq!(Measurement::from_f32(f32::INFINITY), Measurement::Invalid);
        assert_eq!(
            Measurement::from_f32(f32::NEG_INFINITY),
            Measurement::Invalid
        );
    }

    #[test]
    fn test_map_preserves_invalid() {
        let valid = Measurement::Valid(2u16).map(|v| v * 10);
        assert_eq!(valid, Measurement::Valid(20));

        let invalid: Measurement<u16> = Measurement::Invalid;
        assert_eq!(invalid.map(|v| v * 10), Measurement::Invalid);
    }

    #[test]
    fn test_option_conversions() {
        assert_eq!(Measurement::from(Some(3)), Measurement::Valid(3));
        assert_eq!(Measurement::<i32>::from(None), Measurement::Invalid);
        assert_eq!(Measurement::Valid(7).valid(), Some(7));
        assert!(!ClimateReading::INVALID.temperature_celsius.is_valid());
    }
}
