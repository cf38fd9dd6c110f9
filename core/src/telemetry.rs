//! Acquisition-and-publish cycle
//!
//! Each due cycle runs one way through the node:
//!
//! ```text
//! sensors -> validate -> estimate -> display/log -> encode -> session -> broker
//! ```
//!
//! The local display never depends on the broker: when the session cannot
//! be established the reading is still shown and only the publish is
//! skipped. An invalid temperature or humidity short-circuits the cycle
//! before anything is estimated or published.

use core::fmt::Write;

use embedded_hal_async::delay::DelayNs;
use hal_abstractions::{DisplaySink, Measurement, MqttTransport, SensorProvider};
use heapless::String;

use crate::config::NodeConfig;
use crate::estimator::GasEstimator;
use crate::payload::TelemetryPayload;
use crate::scheduler::SampleScheduler;
use crate::session::SessionManager;

/// Display line buffer; 16 glyphs, some of them multi-byte
type Line = String<32>;

/// Raw values sampled in one cycle
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Reading {
    pub temperature_celsius: Measurement<f32>,
    pub relative_humidity_percent: Measurement<f32>,
    pub raw_gas_adc: u16,
}

/// Values computed from a [`Reading`]
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DerivedMetrics {
    pub estimated_gas_ppm: Measurement<f32>,
}

/// What a call to [`TelemetryLoop::run_cycle`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CycleOutcome {
    /// Interval not elapsed; nothing happened
    NotDue,
    /// Temperature or humidity invalid; error shown, nothing published
    SensorFault,
    /// Reading shown; broker unreachable so publish was skipped
    Offline,
    /// Reading shown and published
    Published,
    /// Reading shown; encoding or transport failed
    PublishFailed,
}

/// Orchestrates sampling, local rendering and publishing
pub struct TelemetryLoop<S, D, T, W> {
    sensors: S,
    display: D,
    session: SessionManager<T, W>,
    scheduler: SampleScheduler,
    estimator: GasEstimator,
    topic: &'static str,
}

impl<S, D, T, W> TelemetryLoop<S, D, T, W>
where
    S: SensorProvider,
    D: DisplaySink,
    T: MqttTransport,
    W: DelayNs,
{
    pub fn new(sensors: S, display: D, session: SessionManager<T, W>, config: &NodeConfig) -> Self {
        Self {
            sensors,
            display,
            session,
            scheduler: SampleScheduler::new(config.sampling.interval_ms),
            estimator: GasEstimator::new(&config.calibration),
            topic: config.mqtt.topic,
        }
    }

    /// Run one cycle if the sampling interval has elapsed at `now_ms`
    pub async fn run_cycle(&mut self, now_ms: u32) -> CycleOutcome {
        if !self.scheduler.due_for_sample(now_ms) {
            return CycleOutcome::NotDue;
        }

        let online = match self.session.ensure_connected().await {
            Ok(()) => true,
            Err(e) => {
                warn!("Continuing offline this cycle: {}", e);
                false
            }
        };

        let reading = self.sample().await;
        let outcome = match (
            reading.temperature_celsius,
            reading.relative_humidity_percent,
        ) {
            (Measurement::Valid(temperature), Measurement::Valid(humidity))
                if temperature.is_finite() && humidity.is_finite() =>
            {
                let metrics = DerivedMetrics {
                    estimated_gas_ppm: self.estimator.estimate(reading.raw_gas_adc),
                };
                self.render(temperature, humidity, &metrics).await;
                let payload = TelemetryPayload {
                    temperature,
                    humidity,
                    gas_concentration: metrics.estimated_gas_ppm.valid().map(|ppm| ppm as u32),
                };
                if online {
                    self.publish(&payload).await
                } else {
                    CycleOutcome::Offline
                }
            }
            _ => {
                warn!("Error reading temperature/humidity sensor");
                self.render_error().await;
                CycleOutcome::SensorFault
            }
        };

        self.scheduler.mark_sampled(now_ms);
        outcome
    }

    /// Service the broker session between cycles
    pub async fn service_link(&mut self) {
        self.session.service().await;
    }

    pub fn session(&self) -> &SessionManager<T, W> {
        &self.session
    }

    pub fn scheduler(&self) -> &SampleScheduler {
        &self.scheduler
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    pub fn sensors(&self) -> &S {
        &self.sensors
    }

    async fn sample(&mut self) -> Reading {
        let climate = self.sensors.read_temperature_humidity().await;
        let raw_gas_adc = self.sensors.read_raw_gas().await;
        Reading {
            temperature_celsius: climate.temperature_celsius,
            relative_humidity_percent: climate.relative_humidity_percent,
            raw_gas_adc,
        }
    }

    async fn render(&mut self, temperature: f32, humidity: f32, metrics: &DerivedMetrics) {
        match metrics.estimated_gas_ppm {
            Measurement::Valid(ppm) => info!(
                "Temp: {} Hum: {} CO2: {}",
                temperature, humidity, ppm
            ),
            Measurement::Invalid => info!(
                "Temp: {} Hum: {} CO2: invalid",
                temperature, humidity
            ),
        }

        let (top, bottom) = reading_lines(temperature, humidity, metrics);
        self.display.clear().await;
        self.display.write_at(0, 0, top.as_str()).await;
        self.display.write_at(1, 0, bottom.as_str()).await;
    }

    async fn render_error(&mut self) {
        self.display.clear().await;
        self.display.write_at(0, 0, "Sensor error").await;
    }

    async fn publish(&mut self, payload: &TelemetryPayload) -> CycleOutcome {
        let encoded = match payload.encode() {
            Ok(encoded) => encoded,
            Err(e) => {
                error!("Failed to encode payload: {}", e);
                return CycleOutcome::PublishFailed;
            }
        };

        match self.session.publish(self.topic, encoded.as_bytes()).await {
            Ok(()) => CycleOutcome::Published,
            Err(e) => {
                warn!("Publish to '{}' skipped: {}", self.topic, e);
                CycleOutcome::PublishFailed
            }
        }
    }
}

/// Format the two 16x2 display rows for a valid reading
///
/// Text that does not fit is cut by the display, so formatting errors from
/// a full buffer are ignored here.
fn reading_lines(temperature: f32, humidity: f32, metrics: &DerivedMetrics) -> (Line, Line) {
    let mut top = Line::new();
    let mut bottom = Line::new();
    let _ = write!(top, "T:{:.2}\u{b0} H:{:.2}", temperature, humidity);
    let _ = match metrics.estimated_gas_ppm {
        Measurement::Valid(ppm) => write!(bottom, "CO2:{} ppm", ppm as u32),
        Measurement::Invalid => write!(bottom, "CO2:-- ppm"),
    };
    (top, bottom)
}

#[cfg(test)]
mod tests {
    use embassy_futures::block_on;
    use hal_abstractions::ClimateReading;

    use super::*;
    use crate::config::NodeConfig;
    use crate::identity::client_id;
    use crate::session::ConnectionState;
    use crate::testing::{FakeTransport, RecordingDelay, RecordingDisplay, ScriptedSensors};

    type TestLoop<'a> = TelemetryLoop<
        &'a mut ScriptedSensors,
        &'a mut RecordingDisplay,
        &'a mut FakeTransport,
        &'a mut RecordingDelay,
    >;

    struct Rig {
        sensors: ScriptedSensors,
        display: RecordingDisplay,
        transport: FakeTransport,
        delay: RecordingDelay,
        config: NodeConfig,
    }

    impl Rig {
        fn new(temperature: f32, humidity: f32, raw_gas: u16) -> Self {
            Self {
                sensors: ScriptedSensors::new(temperature, humidity, raw_gas),
                display: RecordingDisplay::default(),
                transport: FakeTransport::new(),
                delay: RecordingDelay::default(),
                config: NodeConfig::default(),
            }
        }

        fn telemetry(&mut self) -> TestLoop<'_> {
            let session = SessionManager::new(
                &mut self.transport,
                &mut self.delay,
                &self.config.mqtt,
                &self.config.session,
                client_id("test-", &[0x01]).unwrap(),
            );
            TelemetryLoop::new(&mut self.sensors, &mut self.display, session, &self.config)
        }
    }

    #[test]
    fn test_valid_reading_is_rendered_and_published() {
        let mut rig = Rig::new(22.5, 55.0, 1800);
        {
            let mut telemetry = rig.telemetry();
            assert_eq!(block_on(telemetry.run_cycle(0)), CycleOutcome::Published);
            assert_eq!(telemetry.scheduler().last_sample_ms(), Some(0));
        }

        assert_eq!(rig.transport.published.len(), 1);
        assert_eq!(rig.transport.published[0].0, "iot/esp32/data");
        assert_eq!(
            rig.transport.published_payload(0),
            "{\"temperature\":22.50,\"humidity\":55.00,\"co2\":59}"
        );
        assert_eq!(rig.display.row(0), "T:22.50\u{b0} H:55.00");
        assert_eq!(rig.display.row(1), "CO2:59 ppm");
    }

    #[test]
    fn test_invalid_reading_short_circuits() {
        let mut rig = Rig::new(f32::NAN, 55.0, 1800);
        {
            let mut telemetry = rig.telemetry();
            assert_eq!(block_on(telemetry.run_cycle(5)), CycleOutcome::SensorFault);
            // Scheduler still advances: no busy retry
            assert_eq!(telemetry.scheduler().last_sample_ms(), Some(5));
            assert_eq!(block_on(telemetry.run_cycle(6)), CycleOutcome::NotDue);
        }

        assert_eq!(rig.transport.publish_calls, 0);
        assert_eq!(rig.display.row(0), "Sensor error");
        assert_eq!(rig.display.row(1), "");
    }

    #[test]
    fn test_invalid_humidity_short_circuits() {
        let mut rig = Rig::new(21.0, f32::NAN, 1800);
        {
            let mut telemetry = rig.telemetry();
            assert_eq!(block_on(telemetry.run_cycle(0)), CycleOutcome::SensorFault);
        }
        assert!(rig.transport.published.is_empty());
    }

    #[test]
    fn test_non_finite_valid_reading_is_a_fault() {
        let mut rig = Rig::new(21.0, 50.0, 1800);
        rig.sensors.readings.clear();
        rig.sensors.push_climate(
            ClimateReading {
                temperature_celsius: Measurement::Valid(f32::NAN),
                relative_humidity_percent: Measurement::Valid(f32::INFINITY),
            },
            1800,
        );
        {
            let mut telemetry = rig.telemetry();
            assert_eq!(block_on(telemetry.run_cycle(0)), CycleOutcome::SensorFault);
            assert_eq!(telemetry.scheduler().last_sample_ms(), Some(0));
        }
        assert_eq!(rig.transport.publish_calls, 0);
        assert_eq!(rig.display.row(0), "Sensor error");
    }

    #[test]
    fn test_not_due_has_no_side_effects() {
        let mut rig = Rig::new(22.5, 55.0, 1800);
        {
            let mut telemetry = rig.telemetry();
            block_on(telemetry.run_cycle(1_000));
            assert_eq!(block_on(telemetry.run_cycle(10_999)), CycleOutcome::NotDue);
            assert_eq!(telemetry.sensors().reads, 1);
            assert_eq!(telemetry.display().clears, 1);
            assert_eq!(block_on(telemetry.run_cycle(11_000)), CycleOutcome::Published);
        }
        assert_eq!(rig.transport.published.len(), 2);
        assert_eq!(rig.transport.connects, 1);
    }

    #[test]
    fn test_offline_still_renders_locally() {
        let mut rig = Rig::new(22.5, 55.0, 1800);
        rig.transport.fail_next_connects(3);
        {
            let mut telemetry = rig.telemetry();
            assert_eq!(block_on(telemetry.run_cycle(0)), CycleOutcome::Offline);
            assert_eq!(
                telemetry.session().state(),
                ConnectionState::Disconnected
            );
            assert_eq!(telemetry.scheduler().last_sample_ms(), Some(0));
        }
        assert_eq!(rig.transport.publish_calls, 0);
        assert_eq!(rig.delay.delays_ms, vec![2_000, 2_000]);
        assert_eq!(rig.display.row(0), "T:22.50\u{b0} H:55.00");
    }

    #[test]
    fn test_reconnects_on_next_cycle() {
        let mut rig = Rig::new(22.5, 55.0, 1800);
        rig.transport.fail_next_connects(3);
        {
            let mut telemetry = rig.telemetry();
            assert_eq!(block_on(telemetry.run_cycle(0)), CycleOutcome::Offline);
            assert_eq!(
                block_on(telemetry.run_cycle(10_000)),
                CycleOutcome::Published
            );
            assert_eq!(telemetry.session().handshake_attempts(), 4);
        }
        assert_eq!(rig.transport.published.len(), 1);
    }

    #[test]
    fn test_publish_failure_keeps_display() {
        let mut rig = Rig::new(22.5, 55.0, 1800);
        rig.transport
            .publish_results
            .push_back(Err(crate::testing::FakeError::Transport));
        {
            let mut telemetry = rig.telemetry();
            assert_eq!(block_on(telemetry.run_cycle(0)), CycleOutcome::PublishFailed);
            assert_eq!(
                telemetry.session().state(),
                ConnectionState::Disconnected
            );
            assert_eq!(telemetry.scheduler().last_sample_ms(), Some(0));
        }
        assert_eq!(rig.display.row(1), "CO2:59 ppm");
    }

    #[test]
    fn test_invalid_gas_is_omitted_from_payload() {
        let mut rig = Rig::new(19.0, 40.0, 0);
        {
            let mut telemetry = rig.telemetry();
            assert_eq!(block_on(telemetry.run_cycle(0)), CycleOutcome::Published);
        }
        assert_eq!(
            rig.transport.published_payload(0),
            "{\"temperature\":19.00,\"humidity\":40.00}"
        );
        assert_eq!(rig.display.row(1), "CO2:-- ppm");
    }

    #[test]
    fn test_service_link_drops_dead_session() {
        let mut rig = Rig::new(22.5, 55.0, 1800);
        rig.transport.fail_next_polls(1);
        {
            let mut telemetry = rig.telemetry();
            assert_eq!(block_on(telemetry.run_cycle(0)), CycleOutcome::Published);

            block_on(telemetry.service_link());
            assert_eq!(telemetry.session().state(), ConnectionState::Disconnected);

            assert_eq!(
                block_on(telemetry.run_cycle(10_000)),
                CycleOutcome::Published
            );
            assert_eq!(telemetry.session().handshake_attempts(), 2);
        }
        assert_eq!(rig.transport.published.len(), 2);
    }

    #[test]
    fn test_samples_processed_in_order() {
        let mut rig = Rig::new(20.0, 50.0, 1800);
        rig.sensors.push(f32::NAN, 50.0, 1800);
        rig.sensors.push(21.0, 51.0, 1800);
        {
            let mut telemetry = rig.telemetry();
            assert_eq!(block_on(telemetry.run_cycle(0)), CycleOutcome::Published);
            assert_eq!(
                block_on(telemetry.run_cycle(10_000)),
                CycleOutcome::SensorFault
            );
            assert_eq!(
                block_on(telemetry.run_cycle(20_000)),
                CycleOutcome::Published
            );
        }
        assert_eq!(rig.transport.published.len(), 2);
        assert!(rig.transport.published_payload(0).contains("\"temperature\":20.00"));
        assert!(rig.transport.published_payload(1).contains("\"temperature\":21.00"));
    }
}
