//! Broker transport

/// Parameters for a single broker handshake
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ConnectOptions<'a> {
    /// Broker hostname or dotted address
    pub broker_host: &'a str,
    /// Broker TCP port
    pub broker_port: u16,
    /// Client identifier, unique per device
    pub client_id: &'a str,
    /// Optional user name
    pub username: Option<&'a str>,
    /// Optional password
    pub password: Option<&'a str>,
    /// Keep-alive interval in seconds (0 disables keep-alive)
    pub keep_alive_secs: u16,
    /// Discard any previous session state on the broker
    pub clean_start: bool,
}

/// Publish-only MQTT transport
///
/// The transport performs the full handshake on every `connect` (socket,
/// CONNECT/CONNACK); there is no session resume. It never reconnects on its
/// own: that decision belongs to the caller.
#[allow(async_fn_in_trait)]
pub trait MqttTransport {
    /// Transport-level failure
    type Error: core::fmt::Debug;

    /// Open a new session, dropping any previous one
    async fn connect(&mut self, options: &ConnectOptions<'_>) -> Result<(), Self::Error>;

    /// Health of the current session as seen by the transport
    fn is_connected(&self) -> bool;

    /// Publish `payload` to `topic` at QoS 0 without retain
    async fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), Self::Error>;

    /// Service the session between publishes (keep-alive, inbound packets)
    ///
    /// Transports that publish more often than the keep-alive interval may
    /// leave this as a no-op.
    async fn poll(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Tear down the current session, if any
    fn disconnect(&mut self);
}

impl<T: MqttTransport + ?Sized> MqttTransport for &mut T {
    type Error = T::Error;

    async fn connect(&mut self, options: &ConnectOptions<'_>) -> Result<(), Self::Error> {
        T::connect(self, options).await
    }

    fn is_connected(&self) -> bool {
        T::is_connected(self)
    }

    async fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), Self::Error> {
        T::publish(self, topic, payload).await
    }

    async fn poll(&mut self) -> Result<(), Self::Error> {
        T::poll(self).await
    }

    fn disconnect(&mut self) {
        T::disconnect(self)
    }
}
