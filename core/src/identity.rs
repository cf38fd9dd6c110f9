//! MQTT client identity
//!
//! The client ID is derived from a stable per-device identifier (chip UID,
//! MAC address) so that two nodes never collide on the broker and a node
//! keeps its identity across reboots.

use core::fmt::Write;

use heapless::String;

use crate::error::ConfigError;

/// Maximum length of the client ID string
///
/// Fits e.g. `stm32f405-` (10 chars) + 24 hex chars for a 96-bit UID with
/// room for longer prefixes.
pub const CLIENT_ID_MAX_LEN: usize = 48;

pub type ClientId = String<CLIENT_ID_MAX_LEN>;

/// Build `{prefix}{lowercase hex of hardware_id}`
///
/// # Example
///
/// ```
/// let id = iot_core::identity::client_id("ESP32Client-", &[0xde, 0xad, 0xbe, 0xef]).unwrap();
/// assert_eq!(id.as_str(), "ESP32Client-deadbeef");
/// ```
pub fn client_id(prefix: &str, hardware_id: &[u8]) -> Result<ClientId, ConfigError> {
    let mut id = ClientId::new();
    id.push_str(prefix)
        .map_err(|_| ConfigError::ClientIdTooLong)?;
    for byte in hardware_id {
        write!(id, "{:02x}", byte).map_err(|_| ConfigError::ClientIdTooLong)?;
    }
    Ok(id)
}
