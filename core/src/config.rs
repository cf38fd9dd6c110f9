//! Node configuration
//!
//! A single [`NodeConfig`] is built at start-up, checked once with
//! [`NodeConfig::validate`], and handed by reference to the components that
//! need it. There are no mutable globals.

use crate::error::ConfigError;
use crate::estimator::Calibration;

/// Maximum MQTT topic length in bytes
pub const MAX_TOPIC_LEN: usize = 64;

/// MQTT broker and publish settings
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MqttConfig {
    /// Broker hostname or dotted address
    pub broker_host: &'static str,
    /// Broker port (1883 for plain MQTT)
    pub broker_port: u16,
    /// Static user name, if the broker requires one
    pub username: Option<&'static str>,
    /// Static password, if the broker requires one
    pub password: Option<&'static str>,
    /// Topic that telemetry is published to
    pub topic: &'static str,
    /// Prepended to the hardware identifier to form the client ID
    pub client_id_prefix: &'static str,
    /// Keep-alive interval in seconds
    pub keep_alive_secs: u16,
    /// Clean start flag (true = new session)
    pub clean_start: bool,
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            broker_host: "broker.emqx.io",
            broker_port: 1883,
            username: None,
            password: None,
            topic: "iot/esp32/data",
            client_id_prefix: "telemetry-node-",
            keep_alive_secs: 60,
            clean_start: true,
        }
    }
}

/// Sampling cadence
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SamplingConfig {
    /// Minimum time between sampling cycles in milliseconds
    pub interval_ms: u32,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self { interval_ms: 10_000 }
    }
}

/// Broker reconnect policy
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SessionConfig {
    /// Fixed delay after each failed handshake in milliseconds
    pub reconnect_backoff_ms: u32,
    /// Handshakes attempted per `ensure_connected` call
    pub max_connect_attempts: u8,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            reconnect_backoff_ms: 2_000,
            max_connect_attempts: 3,
        }
    }
}

/// Complete node configuration
#[derive(Debug, Clone, Copy, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct NodeConfig {
    pub mqtt: MqttConfig,
    pub sampling: SamplingConfig,
    pub session: SessionConfig,
    pub calibration: Calibration,
}

impl NodeConfig {
    /// Check every option once, before any component is built
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.mqtt.broker_host.is_empty() {
            return Err(ConfigError::InvalidBroker);
        }
        validate_topic(self.mqtt.topic)?;
        if self.sampling.interval_ms == 0 {
            return Err(ConfigError::InvalidSamplingInterval);
        }
        if self.session.max_connect_attempts == 0 {
            return Err(ConfigError::InvalidRetryPolicy);
        }
        self.calibration.validate()
    }
}

/// Check that `topic` is a publishable MQTT topic name
///
/// Topic names cannot contain wildcards (`+`, `#`) or null characters,
/// and must fit in [`MAX_TOPIC_LEN`] bytes.
pub fn validate_topic(topic: &str) -> Result<(), ConfigError> {
    if topic.is_empty() || topic.len() > MAX_TOPIC_LEN {
        return Err(ConfigError::InvalidTopic);
    }
    if topic.contains('+') || topic.contains('#') || topic.contains('\0') {
        return Err(ConfigError::InvalidTopic);
    }
    Ok(())
}
