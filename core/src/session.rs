//! Broker session management
//!
//! [`SessionManager`] exclusively owns the publish channel. It is the only
//! place where connection state changes:
//!
//! ```text
//! Disconnected --connect ok--> Connected --health check / transport error--> Disconnected
//! ```
//!
//! `Connecting` is held only while a handshake is in flight. Every reconnect
//! is a full handshake; sessions are never resumed.
//!
//! Reconnection is explicit: [`SessionManager::publish`] never reconnects on
//! its own, so the caller always sees the channel-down/channel-up transition.

use embedded_hal_async::delay::DelayNs;
use hal_abstractions::{ConnectOptions, MqttTransport};

use crate::config::{MqttConfig, SessionConfig};
use crate::error::{ConnectionError, PublishError};
use crate::fmt::Debug2Format;
use crate::identity::ClientId;

/// Publish channel state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

/// Owner of the broker connection
///
/// `ensure_connected` blocks the caller through a bounded number of
/// handshake attempts with a fixed backoff between them. The delay source
/// is injected.
pub struct SessionManager<T, W> {
    transport: T,
    delay: W,
    mqtt: MqttConfig,
    policy: SessionConfig,
    client_id: ClientId,
    state: ConnectionState,
    handshake_attempts: u32,
}

impl<T, W> SessionManager<T, W>
where
    T: MqttTransport,
    W: DelayNs,
{
    pub fn new(
        transport: T,
        delay: W,
        mqtt: &MqttConfig,
        policy: &SessionConfig,
        client_id: ClientId,
    ) -> Self {
        Self {
            transport,
            delay,
            mqtt: *mqtt,
            policy: *policy,
            client_id,
            state: ConnectionState::Disconnected,
            handshake_attempts: 0,
        }
    }

    /// Make sure the session is up, reconnecting if needed
    ///
    /// Returns immediately when already connected and the transport reports
    /// a healthy session. Otherwise performs up to `max_connect_attempts`
    /// handshakes, sleeping `reconnect_backoff_ms` between them.
    pub async fn ensure_connected(&mut self) -> Result<(), ConnectionError> {
        if self.state == ConnectionState::Connected {
            if self.transport.is_connected() {
                return Ok(());
            }
            warn!("MQTT session lost, reconnecting");
            self.drop_session();
        }

        let attempts = self.policy.max_connect_attempts;
        let backoff_ms = self.policy.reconnect_backoff_ms;
        let options = ConnectOptions {
            broker_host: self.mqtt.broker_host,
            broker_port: self.mqtt.broker_port,
            client_id: self.client_id.as_str(),
            username: self.mqtt.username,
            password: self.mqtt.password,
            keep_alive_secs: self.mqtt.keep_alive_secs,
            clean_start: self.mqtt.clean_start,
        };

        for attempt in 1..=attempts {
            self.state = ConnectionState::Connecting;
            self.handshake_attempts = self.handshake_attempts.wrapping_add(1);
            info!(
                "Connecting to MQTT broker at {}:{} (attempt {}/{})",
                options.broker_host, options.broker_port, attempt, attempts
            );

            match self.transport.connect(&options).await {
                Ok(()) => {
                    // Publish-only node: nothing to subscribe to after connect
                    self.state = ConnectionState::Connected;
                    info!(
                        "MQTT connected as {} to {}:{}",
                        options.client_id, options.broker_host, options.broker_port
                    );
                    return Ok(());
                }
                Err(e) if attempt < attempts => {
                    self.state = ConnectionState::Disconnected;
                    warn!(
                        "MQTT connect failed: {:?}, retrying in {} ms",
                        Debug2Format(&e),
                        backoff_ms
                    );
                    self.delay.delay_ms(backoff_ms).await;
                }
                Err(e) => {
                    // No backoff after the last attempt
                    self.state = ConnectionState::Disconnected;
                    warn!("MQTT connect failed: {:?}", Debug2Format(&e));
                }
            }
        }

        error!("MQTT broker unreachable after {} attempts", attempts);
        Err(ConnectionError::RetriesExhausted { attempts })
    }

    /// Publish `payload` to `topic`
    ///
    /// Fails fast with [`PublishError::NotConnected`] unless the session is
    /// connected. A transport failure drops the session; the next
    /// `ensure_connected` performs a fresh handshake.
    pub async fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), PublishError> {
        if self.state != ConnectionState::Connected {
            return Err(PublishError::NotConnected);
        }

        match self.transport.publish(topic, payload).await {
            Ok(()) => {
                debug!("Published {} bytes to '{}'", payload.len(), topic);
                Ok(())
            }
            Err(e) => {
                warn!("MQTT publish failed: {:?}", Debug2Format(&e));
                self.drop_session();
                Err(PublishError::Transport)
            }
        }
    }

    /// Let the transport service the session between cycles
    ///
    /// Moves to `Disconnected` when the transport reports the session gone.
    pub async fn service(&mut self) {
        if self.state != ConnectionState::Connected {
            return;
        }
        if !self.transport.is_connected() {
            warn!("MQTT session closed by transport");
            self.drop_session();
            return;
        }
        if let Err(e) = self.transport.poll().await {
            warn!("MQTT keep-alive failed: {:?}", Debug2Format(&e));
            self.drop_session();
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    /// Total handshakes attempted since construction
    pub fn handshake_attempts(&self) -> u32 {
        self.handshake_attempts
    }

    pub fn client_id(&self) -> &str {
        self.client_id.as_str()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    fn drop_session(&mut self) {
        self.transport.disconnect();
        self.state = ConnectionState::Disconnected;
    }
}

#[cfg(test)]
mod tests {
    use embassy_futures::block_on;

    use super::*;
    use crate::identity::client_id;
    use crate::testing::{FakeError, FakeTransport, RecordingDelay};

    fn session<'a>(
        transport: &'a mut FakeTransport,
        delay: &'a mut RecordingDelay,
    ) -> SessionManager<&'a mut FakeTransport, &'a mut RecordingDelay> {
        SessionManager::new(
            transport,
            delay,
            &MqttConfig::default(),
            &SessionConfig::default(),
            client_id("test-", &[0xab, 0xcd]).unwrap(),
        )
    }

    #[test]
    fn test_initial_state() {
        let mut transport = FakeTransport::new();
        let mut delay = RecordingDelay::default();
        let session = session(&mut transport, &mut delay);
        assert_eq!(session.state(), ConnectionState::Disconnected);
        assert_eq!(session.handshake_attempts(), 0);
        assert_eq!(session.client_id(), "test-abcd");
    }

    #[test]
    fn test_connect_uses_configured_identity() {
        let mut transport = FakeTransport::new();
        let mut delay = RecordingDelay::default();
        {
            let mut session = session(&mut transport, &mut delay);
            assert_eq!(block_on(session.ensure_connected()), Ok(()));
            assert_eq!(session.state(), ConnectionState::Connected);
        }
        let options = transport.last_connect.as_ref().unwrap();
        assert_eq!(options.client_id, "test-abcd");
        assert_eq!(options.broker_host, "broker.emqx.io");
        assert_eq!(options.broker_port, 1883);
        assert!(delay.delays_ms.is_empty());
    }

    #[test]
    fn test_ensure_connected_is_idempotent() {
        let mut transport = FakeTransport::new();
        let mut delay = RecordingDelay::default();
        let mut session = session(&mut transport, &mut delay);

        block_on(session.ensure_connected()).unwrap();
        assert_eq!(session.handshake_attempts(), 1);

        block_on(session.ensure_connected()).unwrap();
        block_on(session.ensure_connected()).unwrap();
        assert_eq!(session.handshake_attempts(), 1);
    }

    #[test]
    fn test_publish_when_disconnected_does_no_io() {
        let mut transport = FakeTransport::new();
        let mut delay = RecordingDelay::default();
        {
            let mut session = session(&mut transport, &mut delay);
            let result = block_on(session.publish("iot/esp32/data", b"{}"));
            assert_eq!(result, Err(PublishError::NotConnected));
        }
        assert_eq!(transport.publish_calls, 0);
        assert_eq!(transport.connects, 0);
    }

    #[test]
    fn test_three_failed_attempts_back_off_and_return() {
        let mut transport = FakeTransport::new();
        transport.fail_next_connects(3);
        let mut delay = RecordingDelay::default();
        {
            let mut session = session(&mut transport, &mut delay);
            let result = block_on(session.ensure_connected());
            assert_eq!(
                result,
                Err(ConnectionError::RetriesExhausted { attempts: 3 })
            );
            assert_eq!(session.state(), ConnectionState::Disconnected);
            assert_eq!(session.handshake_attempts(), 3);
        }
        // Backoff only between attempts
        assert_eq!(delay.delays_ms, vec![2_000, 2_000]);
    }

    #[test]
    fn test_recovers_after_transient_failure() {
        let mut transport = FakeTransport::new();
        transport.fail_next_connects(2);
        let mut delay = RecordingDelay::default();
        {
            let mut session = session(&mut transport, &mut delay);
            assert_eq!(block_on(session.ensure_connected()), Ok(()));
            assert_eq!(session.handshake_attempts(), 3);
        }
        assert_eq!(delay.delays_ms, vec![2_000, 2_000]);
    }

    #[test]
    fn test_publish_failure_disconnects() {
        let mut transport = FakeTransport::new();
        let mut delay = RecordingDelay::default();
        {
            let mut session = session(&mut transport, &mut delay);
            block_on(session.ensure_connected()).unwrap();
            session
                .transport
                .publish_results
                .push_back(Err(FakeError::Transport));

            let result = block_on(session.publish("iot/esp32/data", b"{}"));
            assert_eq!(result, Err(PublishError::Transport));
            assert_eq!(session.state(), ConnectionState::Disconnected);

            // No implicit reconnect on the next publish
            let result = block_on(session.publish("iot/esp32/data", b"{}"));
            assert_eq!(result, Err(PublishError::NotConnected));
            assert_eq!(session.handshake_attempts(), 1);

            // Explicit reconnect is a fresh handshake
            block_on(session.ensure_connected()).unwrap();
            assert_eq!(session.handshake_attempts(), 2);
            block_on(session.publish("iot/esp32/data", b"{}")).unwrap();
        }
        assert_eq!(transport.publish_calls, 2);
        assert_eq!(transport.published.len(), 1);
        assert_eq!(transport.disconnects, 1);
    }

    #[test]
    fn test_health_check_triggers_reconnect() {
        let mut transport = FakeTransport::new();
        let mut delay = RecordingDelay::default();
        let mut session = session(&mut transport, &mut delay);

        block_on(session.ensure_connected()).unwrap();
        session.transport.healthy = false;

        block_on(session.ensure_connected()).unwrap();
        assert_eq!(session.handshake_attempts(), 2);
        assert_eq!(session.state(), ConnectionState::Connected);
    }

    #[test]
    fn test_service_detects_dead_session() {
        let mut transport = FakeTransport::new();
        let mut delay = RecordingDelay::default();
        let mut session = session(&mut transport, &mut delay);

        block_on(session.ensure_connected()).unwrap();
        block_on(session.service());
        assert_eq!(session.state(), ConnectionState::Connected);

        session.transport.fail_next_polls(1);
        block_on(session.service());
        assert_eq!(session.state(), ConnectionState::Disconnected);
    }
}
