#![deny(unsafe_code)]
//! Async TCP socket wrapper for the MQTT client
//!
//! This module provides an async wrapper around `embassy_net::tcp::TcpSocket`
//! that implements the `embedded-io-async` traits required by `rust-mqtt`.

use embassy_net::tcp::TcpSocket;
use embassy_net::{IpEndpoint, Stack};
use embassy_time::Duration;
use embedded_io_async::{ErrorType, Read, Write};

use super::error::NetworkError;

/// Idle time after which a silent connection is treated as dead
const SOCKET_TIMEOUT: Duration = Duration::from_secs(30);

/// Async TCP socket wrapper implementing embedded-io-async traits
pub struct AsyncTcpSocket<'a> {
    socket: TcpSocket<'a>,
}

impl<'a> AsyncTcpSocket<'a> {
    /// Create a new async TCP socket
    ///
    /// # Arguments
    ///
    /// * `stack` - Embassy network stack
    /// * `rx_buffer` - Buffer for receiving data
    /// * `tx_buffer` - Buffer for transmitting data
    pub fn new(stack: Stack<'a>, rx_buffer: &'a mut [u8], tx_buffer: &'a mut [u8]) -> Self {
        let mut socket = TcpSocket::new(stack, rx_buffer, tx_buffer);
        socket.set_timeout(Some(SOCKET_TIMEOUT));
        Self { socket }
    }

    /// Connect to a remote endpoint
    ///
    /// # Errors
    ///
    /// Returns `NetworkError::SocketError` if connection fails
    pub async fn connect(&mut self, endpoint: IpEndpoint) -> Result<(), NetworkError> {
        self.socket
            .connect(endpoint)
            .await
            .map_err(|_| NetworkError::SocketError)
    }
}

impl ErrorType for AsyncTcpSocket<'_> {
    type Error = NetworkError;
}

impl Read for AsyncTcpSocket<'_> {
    async fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        self.socket
            .read(buf)
            .await
            .map_err(|_| NetworkError::SocketError)
    }
}

impl Write for AsyncTcpSocket<'_> {
    async fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        self.socket
            .write(buf)
            .await
            .map_err(|_| NetworkError::SocketError)
    }

    async fn flush(&mut self) -> Result<(), Self::Error> {
        self.socket
            .flush()
            .await
            .map_err(|_| NetworkError::SocketError)
    }
}
