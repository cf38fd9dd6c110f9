//! Error types for the telemetry core
//!
//! Nothing here is fatal to the node: every variant is recovered by the
//! caller (retry on the next cycle, skip a publish, show an error screen).

/// Configuration rejected at start-up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Topic is empty, too long, or contains `+`, `#` or NUL
    InvalidTopic,
    /// Broker host is empty
    InvalidBroker,
    /// Client identifier does not fit the MQTT client ID buffer
    ClientIdTooLong,
    /// Sampling interval is zero
    InvalidSamplingInterval,
    /// Connect attempts per call is zero
    InvalidRetryPolicy,
    /// A calibration constant is zero, negative or not finite
    InvalidCalibration,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::InvalidTopic => write!(f, "Invalid MQTT topic"),
            Self::InvalidBroker => write!(f, "Invalid broker address"),
            Self::ClientIdTooLong => write!(f, "Client ID too long"),
            Self::InvalidSamplingInterval => write!(f, "Invalid sampling interval"),
            Self::InvalidRetryPolicy => write!(f, "Invalid reconnect policy"),
            Self::InvalidCalibration => write!(f, "Invalid calibration constants"),
        }
    }
}

impl core::error::Error for ConfigError {}

/// Broker session could not be established
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConnectionError {
    /// Every handshake attempt in this call failed
    RetriesExhausted {
        /// Number of handshakes attempted
        attempts: u8,
    },
}

impl core::fmt::Display for ConnectionError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::RetriesExhausted { attempts } => {
                write!(f, "Broker unreachable after {} attempts", attempts)
            }
        }
    }
}

impl core::error::Error for ConnectionError {}

/// Publish was not delivered to the transport
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PublishError {
    /// Session is not connected; no I/O was attempted
    NotConnected,
    /// The transport rejected the publish; the session is now disconnected
    Transport,
}

impl core::fmt::Display for PublishError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotConnected => write!(f, "Not connected to broker"),
            Self::Transport => write!(f, "Transport publish failed"),
        }
    }
}

impl core::error::Error for PublishError {}

/// Wire payload could not be encoded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PayloadError {
    /// Encoded record exceeds the payload buffer
    Overflow,
    /// Temperature or humidity is NaN or infinite
    NonFinite,
}

impl core::fmt::Display for PayloadError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Overflow => write!(f, "Payload buffer overflow"),
            Self::NonFinite => write!(f, "Non-finite value in payload"),
        }
    }
}

impl core::error::Error for PayloadError {}
