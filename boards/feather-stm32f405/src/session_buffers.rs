//! Broker Session Buffers in Main SRAM
//!
//! The broker session outlives the `connect` call that opens it, so the TCP
//! socket and MQTT packet buffers must be `'static`. They are handed out
//! again on every reconnect, after the previous session has been dropped.
//!
//! # Buffer Sizing
//!
//! **TCP RX/TX (4 KB each)**: the node only publishes QoS 0 records of
//! under 128 bytes and receives CONNACK; 4 KB leaves room for the stack's
//! window without starving embassy-net.
//!
//! **MQTT packet buffer (2 KB)**: bump allocator backing for CONNECT,
//! CONNACK and PUBLISH packet assembly.
//!
//! # Safety
//!
//! These buffers use `static mut` which is unsafe. Safety is ensured by:
//! - A single accessor that re-borrows all of them at once
//! - The only caller (`BrokerTransport::connect`) dropping the previous
//!   session before asking for the buffers again
//! - All access happening from the single node task

#![allow(unsafe_code)] // Required for static mut buffers

use rust_mqtt::buffer::BumpBuffer;

/// TCP receive buffer size: 4 KB
pub const TCP_RX_BUF_SIZE: usize = 4096;

/// TCP transmit buffer size: 4 KB
pub const TCP_TX_BUF_SIZE: usize = 4096;

/// MQTT packet buffer size: 2 KB
pub const MQTT_BUF_SIZE: usize = 2048;

static mut TCP_RX_BUF: [u8; TCP_RX_BUF_SIZE] = [0; TCP_RX_BUF_SIZE];
static mut TCP_TX_BUF: [u8; TCP_TX_BUF_SIZE] = [0; TCP_TX_BUF_SIZE];
static mut MQTT_BUF: [u8; MQTT_BUF_SIZE] = [0; MQTT_BUF_SIZE];

/// Bump allocator over `MQTT_BUF`, rebuilt for every session
static mut MQTT_BUMP: Option<BumpBuffer<'static>> = None;

/// Borrowed buffers for one broker session
pub struct SessionBuffers {
    pub tcp_rx: &'static mut [u8],
    pub tcp_tx: &'static mut [u8],
    pub mqtt: &'static mut BumpBuffer<'static>,
}

/// Get all buffers for a new broker session
///
/// The bump allocator is reset, so packet space used by the previous
/// session is reclaimed.
///
/// # Safety
///
/// The caller must ensure:
/// - Any session built from a previous call has been dropped
/// - The buffers are not accessed concurrently from multiple contexts
pub unsafe fn session_buffers() -> SessionBuffers {
    // Raw pointer dereference required per Rust 2024 edition
    let bump = &mut *core::ptr::addr_of_mut!(MQTT_BUMP);
    let mqtt = bump.insert(BumpBuffer::new(&mut *core::ptr::addr_of_mut!(MQTT_BUF)));

    SessionBuffers {
        tcp_rx: &mut *core::ptr::addr_of_mut!(TCP_RX_BUF),
        tcp_tx: &mut *core::ptr::addr_of_mut!(TCP_TX_BUF),
        mqtt,
    }
}
