#![deny(unsafe_code)]
//! Board configuration
//!
//! Secrets come from the build environment, e.g.
//! `MQTT_BROKER=10.0.0.5 MQTT_USERNAME=node MQTT_PASSWORD=... cargo embed --release`.

use hal_abstractions::LinkCredentials;
use iot_core::config::{MqttConfig, NodeConfig};

/// Idle time between scheduler checks
pub const POLL_MS: u32 = 100;

/// Interval between link status checks during start-up
pub const LINK_POLL_MS: u32 = 500;

/// Wired link; kept for boards that associate with Wi-Fi
pub const LINK_CREDENTIALS: LinkCredentials<'static> = LinkCredentials {
    ssid: match option_env!("WIFI_SSID") {
        Some(ssid) => ssid,
        None => "ethernet",
    },
    password: match option_env!("WIFI_PASSWORD") {
        Some(password) => password,
        None => "",
    },
};

/// Build the node configuration for this board
pub fn node_config() -> NodeConfig {
    let defaults = MqttConfig::default();
    NodeConfig {
        mqtt: MqttConfig {
            broker_host: option_env!("MQTT_BROKER").unwrap_or(defaults.broker_host),
            username: option_env!("MQTT_USERNAME"),
            password: option_env!("MQTT_PASSWORD"),
            client_id_prefix: "feather-f405-",
            ..defaults
        },
        ..NodeConfig::default()
    }
}
