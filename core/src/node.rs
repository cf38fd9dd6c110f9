//! Node start-up and main loop
//!
//! Single logical thread of control: one context calls
//! [`TelemetryLoop::run_cycle`] repeatedly with no overlap. The only
//! blocking points are the reconnect backoff and the idle poll delay.

use core::net::IpAddr;

use embedded_hal_async::delay::DelayNs;
use hal_abstractions::{
    Clock, Connectivity, DisplaySink, LinkCredentials, MqttTransport, SensorProvider,
};

use crate::fmt::Debug2Format;
use crate::telemetry::TelemetryLoop;

/// How long the start-up banner stays on screen
pub const SPLASH_MS: u32 = 1_000;

/// Show the start-up banner, then blank the display
pub async fn splash<D: DisplaySink, W: DelayNs>(display: &mut D, delay: &mut W) {
    display.clear().await;
    display.write_at(0, 0, "Starting...").await;
    delay.delay_ms(SPLASH_MS).await;
    display.clear().await;
}

/// Associate the network link and wait until it carries traffic
///
/// Retries association every `poll_ms` until it is accepted, then polls
/// until the provider reports the link up. Returns the local address, if
/// the provider exposes one.
pub async fn bring_up_link<C, W>(
    link: &mut C,
    credentials: &LinkCredentials<'_>,
    delay: &mut W,
    poll_ms: u32,
) -> Option<IpAddr>
where
    C: Connectivity,
    W: DelayNs,
{
    info!("Connecting to network '{}'", credentials.ssid);
    while let Err(e) = link.connect(credentials).await {
        warn!("Network association failed: {:?}", Debug2Format(&e));
        delay.delay_ms(poll_ms).await;
    }

    while !link.is_connected() {
        delay.delay_ms(poll_ms).await;
    }

    let address = link.local_address();
    match address {
        Some(ip) => info!("Network is UP, IP: {:?}", Debug2Format(&ip)),
        None => info!("Network is UP"),
    }
    address
}

/// Poll the telemetry loop forever
///
/// `poll_ms` is the idle time between scheduler checks, not the sampling
/// interval; keep it well below `SamplingConfig::interval_ms`.
pub async fn run<S, D, T, W, K, P>(
    telemetry: &mut TelemetryLoop<S, D, T, W>,
    clock: &K,
    delay: &mut P,
    poll_ms: u32,
) -> !
where
    S: SensorProvider,
    D: DisplaySink,
    T: MqttTransport,
    W: DelayNs,
    K: Clock,
    P: DelayNs,
{
    info!("Telemetry loop started");
    loop {
        let outcome = telemetry.run_cycle(clock.now_ms()).await;
        debug!("Cycle outcome: {:?}", Debug2Format(&outcome));
        telemetry.service_link().await;
        delay.delay_ms(poll_ms).await;
    }
}
