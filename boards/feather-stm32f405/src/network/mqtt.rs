//! MQTT v5.0 broker transport over plain TCP
//!
//! Implements [`MqttTransport`] with the `rust-mqtt` client. Every
//! `connect` performs the full handshake (DNS, TCP, CONNECT/CONNACK) and
//! replaces the previous session; nothing here retries on its own.
//!
//! # Session Health
//!
//! `poll` keeps the trait's no-op default, so a broker-side close is not
//! seen until the next write. A failed publish or a socket timeout drops
//! the session, after which `is_connected` reports false and the next
//! cycle reconnects. A QoS 0 publish into a half-closed socket may be lost
//! without an error.
//!
//! # Memory Management
//!
//! The session lives in static buffers (see `session_buffers`):
//! - MQTT packet buffer: 2KB bump allocator
//! - TCP buffers: 8KB total

#![allow(unsafe_code)] // Required for session buffer access and unchecked topic names

use core::net::Ipv4Addr;

use defmt::{debug, error, info, Debug2Format};
use embassy_net::{dns::DnsQueryType, IpAddress, IpEndpoint, Stack};
use hal_abstractions::{ConnectOptions as SessionOptions, MqttTransport};
use rust_mqtt::{
    buffer::BumpBuffer,
    client::{
        options::{ConnectOptions, PublicationOptions, TopicReference},
        Client,
    },
    config::{KeepAlive, SessionExpiryInterval},
    types::{MqttBinary, MqttString, QoS, TopicName},
    Bytes,
};

use crate::session_buffers;

use super::error::NetworkError;
use super::socket::AsyncTcpSocket;

/// An open broker session borrowing the static session buffers
type Session = Client<'static, AsyncTcpSocket<'static>, BumpBuffer<'static>, 1, 1, 1, 0>;

/// Publish-only MQTT transport on the embassy-net stack
pub struct BrokerTransport {
    stack: Stack<'static>,
    session: Option<Session>,
    published: u32,
}

impl BrokerTransport {
    pub fn new(stack: Stack<'static>) -> Self {
        Self {
            stack,
            session: None,
            published: 0,
        }
    }

    /// Resolve the broker host, accepting dotted IPv4 literals without DNS
    async fn resolve(&self, host: &str, port: u16) -> Result<IpEndpoint, NetworkError> {
        if let Ok(ip) = host.parse::<Ipv4Addr>() {
            return Ok(IpEndpoint::new(IpAddress::Ipv4(ip), port));
        }

        let server_ip = self
            .stack
            .dns_query(host, DnsQueryType::A)
            .await
            .map_err(|e| {
                error!("DNS query failed: {:?}", Debug2Format(&e));
                NetworkError::DnsError
            })?
            .first()
            .copied()
            .ok_or_else(|| {
                error!("DNS returned no results for {}", host);
                NetworkError::DnsError
            })?;

        Ok(IpEndpoint::new(server_ip, port))
    }
}

impl MqttTransport for BrokerTransport {
    type Error = NetworkError;

    async fn connect(&mut self, options: &SessionOptions<'_>) -> Result<(), Self::Error> {
        // The buffers below are re-borrowed, so the old session must go first
        self.disconnect();

        let endpoint = self.resolve(options.broker_host, options.broker_port).await?;
        info!(
            "Resolved {} to {}",
            options.broker_host,
            Debug2Format(&endpoint)
        );

        // SAFETY: the previous session was dropped above and this transport
        // is the only user of the session buffers.
        let buffers = unsafe { session_buffers::session_buffers() };

        let mut socket = AsyncTcpSocket::new(self.stack, buffers.tcp_rx, buffers.tcp_tx);
        socket.connect(endpoint).await?;
        debug!("TCP connection established to {}", Debug2Format(&endpoint));

        let mut client: Session = Client::new(buffers.mqtt);

        let user_name = match options.username {
            Some(name) => Some(MqttString::new(name.into()).map_err(|e| {
                error!("Invalid MQTT user name: {:?}", Debug2Format(&e));
                NetworkError::MqttProtocolError
            })?),
            None => None,
        };
        let password = match options.password {
            Some(secret) => Some(MqttBinary::new(Bytes::from(secret.as_bytes())).map_err(
                |e| {
                    error!("Invalid MQTT password: {:?}", Debug2Format(&e));
                    NetworkError::MqttProtocolError
                },
            )?),
            None => None,
        };

        let connect_opts = ConnectOptions {
            session_expiry_interval: SessionExpiryInterval::EndOnDisconnect,
            clean_start: options.clean_start,
            keep_alive: if options.keep_alive_secs == 0 {
                KeepAlive::Infinite
            } else {
                KeepAlive::Seconds(options.keep_alive_secs)
            },
            will: None,
            user_name,
            password,
        };

        let client_id = MqttString::new(options.client_id.into()).map_err(|e| {
            error!(
                "Failed to create MQTT client ID string: {:?}",
                Debug2Format(&e)
            );
            NetworkError::MqttProtocolError
        })?;

        client
            .connect(socket, &connect_opts, Some(client_id))
            .await
            .map_err(|e| {
                error!("MQTT connect failed: {:?}", Debug2Format(&e));
                NetworkError::MqttConnectionFailed
            })?;

        self.session = Some(client);
        Ok(())
    }

    /// True until a write fails; see "Session Health" above
    fn is_connected(&self) -> bool {
        self.session.is_some()
    }

    async fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), Self::Error> {
        let Some(client) = self.session.as_mut() else {
            return Err(NetworkError::NotConnected);
        };

        let topic_string = MqttString::new(topic.into()).map_err(|e| {
            error!("Failed to create MQTT topic string: {:?}", Debug2Format(&e));
            NetworkError::MqttProtocolError
        })?;

        // SAFETY: NodeConfig::validate() rejects topics containing wildcard
        // or null characters before the transport is ever used.
        let topic_name = unsafe { TopicName::new_unchecked(topic_string) };

        let pub_options = PublicationOptions {
            retain: false,
            message_expiry_interval: None,
            topic: TopicReference::Name(topic_name),
            qos: QoS::AtMostOnce,
        };

        match client.publish(&pub_options, Bytes::from(payload)).await {
            Ok(_) => {
                self.published = self.published.wrapping_add(1);
                debug!(
                    "Message #{} published ({} bytes)",
                    self.published,
                    payload.len()
                );
                Ok(())
            }
            Err(e) => {
                error!("MQTT publish failed: {:?}", Debug2Format(&e));
                // A failed write leaves the session unusable
                self.session = None;
                Err(NetworkError::MqttPublishFailed)
            }
        }
    }

    fn disconnect(&mut self) {
        if self.session.take().is_some() {
            info!("MQTT session closed");
        }
    }
}
