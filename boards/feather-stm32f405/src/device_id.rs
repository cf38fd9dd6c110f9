#![deny(unsafe_code)]
//! Device identifier utilities for STM32F405
//!
//! The factory-programmed 96-bit unique device ID is stable across reboots
//! and unique to each chip. It seeds the MQTT client ID, the Ethernet MAC
//! address and the network stack's random seed.

/// Get the device UID bytes
///
/// Returns the raw 12-byte (96-bit) unique device ID.
pub fn uid() -> &'static [u8; 12] {
    embassy_stm32::uid::uid()
}

/// Locally administered, unicast MAC address derived from the UID
pub fn mac_address() -> [u8; 6] {
    let uid = uid();
    // Lot number bytes vary least between chips; use the wafer/position bytes
    [0x02, uid[0], uid[1], uid[2], uid[3], uid[4] ^ uid[11]]
}

/// Seed for the network stack's TCP sequence numbers and DHCP transaction IDs
pub fn seed() -> u64 {
    let uid = uid();
    let mut bytes = [0u8; 8];
    for (i, byte) in uid.iter().enumerate() {
        bytes[i % 8] ^= *byte;
    }
    u64::from_le_bytes(bytes)
}
