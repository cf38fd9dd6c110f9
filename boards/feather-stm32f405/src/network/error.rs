#![deny(unsafe_code)]
//! Network error types

use defmt::Format;

/// Link and broker transport errors
#[derive(Debug, Clone, Copy, Format)]
pub enum NetworkError {
    /// DNS resolution failed
    DnsError,
    /// Socket connect/read/write error
    SocketError,
    /// No broker session is open
    NotConnected,
    /// MQTT CONNECT was rejected or timed out
    MqttConnectionFailed,
    /// MQTT publish failed
    MqttPublishFailed,
    /// MQTT string or topic could not be encoded
    MqttProtocolError,
}

impl core::fmt::Display for NetworkError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::DnsError => write!(f, "DNS resolution failed"),
            Self::SocketError => write!(f, "Socket error"),
            Self::NotConnected => write!(f, "Not connected"),
            Self::MqttConnectionFailed => write!(f, "MQTT connection failed"),
            Self::MqttPublishFailed => write!(f, "MQTT publish failed"),
            Self::MqttProtocolError => write!(f, "MQTT protocol error"),
        }
    }
}

// Implement core::error::Error for no_std compatibility
impl core::error::Error for NetworkError {}

impl embedded_io_async::Error for NetworkError {
    fn kind(&self) -> embedded_io_async::ErrorKind {
        match self {
            Self::SocketError | Self::NotConnected => embedded_io_async::ErrorKind::BrokenPipe,
            _ => embedded_io_async::ErrorKind::Other,
        }
    }
}
