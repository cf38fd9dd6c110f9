//! Wire payload
//!
//! One compact JSON object per valid cycle:
//!
//! ```text
//! {"temperature":22.50,"humidity":55.00,"co2":59}
//! ```
//!
//! The schema is additive-only; consumers ignore unknown fields and must
//! tolerate a missing `co2` field, which is omitted when the gas estimate
//! is invalid.

use core::fmt::Write;

use heapless::String;

use crate::error::PayloadError;

/// Encoded payload capacity
pub const PAYLOAD_MAX_LEN: usize = 128;

pub type PayloadBuffer = String<PAYLOAD_MAX_LEN>;

/// Canonical telemetry record
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TelemetryPayload {
    /// Degrees Celsius
    pub temperature: f32,
    /// Percent relative humidity
    pub humidity: f32,
    /// Estimated ppm-equivalent, truncated
    pub gas_concentration: Option<u32>,
}

impl TelemetryPayload {
    /// Render the record as JSON
    ///
    /// NaN and infinities have no JSON representation and are rejected.
    pub fn encode(&self) -> Result<PayloadBuffer, PayloadError> {
        if !(self.temperature.is_finite() && self.humidity.is_finite()) {
            return Err(PayloadError::NonFinite);
        }
        let mut out = PayloadBuffer::new();
        write!(
            out,
            "{{\"temperature\":{:.2},\"humidity\":{:.2}",
            self.temperature, self.humidity
        )
        .map_err(|_| PayloadError::Overflow)?;
        if let Some(ppm) = self.gas_concentration {
            write!(out, ",\"co2\":{}", ppm).map_err(|_| PayloadError::Overflow)?;
        }
        out.push('}').map_err(|_| PayloadError::Overflow)?;
        Ok(out)
    }
}
