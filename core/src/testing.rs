//! Test doubles for the hardware seams

use std::collections::VecDeque;
use std::string::{String, ToString};
use std::vec::Vec;

use embedded_hal_async::delay::DelayNs;
use hal_abstractions::{
    ClimateReading, ConnectOptions, Connectivity, DisplaySink, LinkCredentials,
    Measurement, MqttTransport, SensorProvider,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FakeError {
    Refused,
    Transport,
}

#[derive(Debug, Clone)]
pub struct RecordedConnect {
    pub broker_host: String,
    pub broker_port: u16,
    pub client_id: String,
    pub username: Option<String>,
}

/// Scripted broker transport; unscripted calls succeed
#[derive(Debug, Default)]
pub struct FakeTransport {
    pub connect_results: VecDeque<Result<(), FakeError>>,
    pub publish_results: VecDeque<Result<(), FakeError>>,
    pub poll_results: VecDeque<Result<(), FakeError>>,
    pub healthy: bool,
    pub connects: u32,
    pub publish_calls: u32,
    pub disconnects: u32,
    pub last_connect: Option<RecordedConnect>,
    pub published: Vec<(String, Vec<u8>)>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_next_connects(&mut self, count: usize) {
        for _ in 0..count {
            self.connect_results.push_back(Err(FakeError::Refused));
        }
    }

    pub fn fail_next_polls(&mut self, count: usize) {
        for _ in 0..count {
            self.poll_results.push_back(Err(FakeError::Transport));
        }
    }

    pub fn published_payload(&self, index: usize) -> &str {
        core::str::from_utf8(&self.published[index].1).unwrap()
    }
}

impl MqttTransport for FakeTransport {
    type Error = FakeError;

    async fn connect(&mut self, options: &ConnectOptions<'_>) -> Result<(), Self::Error> {
        self.connects += 1;
        self.last_connect = Some(RecordedConnect {
            broker_host: options.broker_host.to_string(),
            broker_port: options.broker_port,
            client_id: options.client_id.to_string(),
            username: options.username.map(|u| u.to_string()),
        });
        let result = self.connect_results.pop_front().unwrap_or(Ok(()));
        self.healthy = result.is_ok();
        result
    }

    fn is_connected(&self) -> bool {
        self.healthy
    }

    async fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), Self::Error> {
        self.publish_calls += 1;
        let result = self.publish_results.pop_front().unwrap_or(Ok(()));
        match result {
            Ok(()) => self.published.push((topic.to_string(), payload.to_vec())),
            Err(_) => self.healthy = false,
        }
        result
    }

    async fn poll(&mut self) -> Result<(), Self::Error> {
        let result = self.poll_results.pop_front().unwrap_or(Ok(()));
        if result.is_err() {
            self.healthy = false;
        }
        result
    }

    fn disconnect(&mut self) {
        self.disconnects += 1;
        self.healthy = false;
    }
}

/// Delay that returns immediately and records what was asked for
#[derive(Debug, Default)]
pub struct RecordingDelay {
    pub delays_ms: Vec<u32>,
    pub total_ns: u64,
}

impl DelayNs for RecordingDelay {
    async fn delay_ns(&mut self, ns: u32) {
        self.total_ns += u64::from(ns);
    }

    async fn delay_ms(&mut self, ms: u32) {
        self.delays_ms.push(ms);
        self.total_ns += u64::from(ms) * 1_000_000;
    }
}

/// Sensors that replay a script, repeating the last entry
#[derive(Debug)]
pub struct ScriptedSensors {
    pub readings: VecDeque<(ClimateReading, u16)>,
    last: (ClimateReading, u16),
    pub reads: u32,
}

impl ScriptedSensors {
    pub fn new(temperature: f32, humidity: f32, raw_gas: u16) -> Self {
        let mut sensors = Self {
            readings: VecDeque::new(),
            last: (ClimateReading::INVALID, 0),
            reads: 0,
        };
        sensors.push(temperature, humidity, raw_gas);
        sensors
    }

    /// Queue a sample; NaN becomes `Invalid` as a driver would report it
    pub fn push(&mut self, temperature: f32, humidity: f32, raw_gas: u16) {
        let climate = ClimateReading {
            temperature_celsius: Measurement::from_f32(temperature),
            relative_humidity_percent: Measurement::from_f32(humidity),
        };
        self.readings.push_back((climate, raw_gas));
    }

    /// Queue a sample exactly as given, bypassing the NaN check
    pub fn push_climate(&mut self, climate: ClimateReading, raw_gas: u16) {
        self.readings.push_back((climate, raw_gas));
    }

    fn current(&mut self) -> (ClimateReading, u16) {
        if let Some(next) = self.readings.pop_front() {
            self.last = next;
        }
        self.last
    }
}

impl SensorProvider for ScriptedSensors {
    async fn read_temperature_humidity(&mut self) -> ClimateReading {
        self.reads += 1;
        self.current().0
    }

    async fn read_raw_gas(&mut self) -> u16 {
        self.last.1
    }
}

/// 16x2 text buffer
#[derive(Debug)]
pub struct RecordingDisplay {
    pub rows: [String; 2],
    pub clears: u32,
}

impl Default for RecordingDisplay {
    fn default() -> Self {
        Self {
            rows: [String::new(), String::new()],
            clears: 0,
        }
    }
}

impl RecordingDisplay {
    pub fn row(&self, row: usize) -> &str {
        self.rows[row].as_str()
    }
}

impl DisplaySink for RecordingDisplay {
    async fn clear(&mut self) {
        self.clears += 1;
        self.rows = [String::new(), String::new()];
    }

    async fn write_at(&mut self, row: u8, col: u8, text: &str) {
        let line = &mut self.rows[row as usize];
        while line.chars().count() < col as usize {
            line.push(' ');
        }
        let prefix: String = line.chars().take(col as usize).collect();
        *line = prefix + text;
    }
}

/// Link that comes up after a number of polls
#[derive(Debug, Default)]
pub struct FakeLink {
    pub connect_calls: u32,
    pub fail_connects: u32,
    pub polls_until_up: u32,
    polls: core::cell::Cell<u32>,
    associated: bool,
}

impl FakeLink {
    pub fn new(polls_until_up: u32) -> Self {
        Self {
            polls_until_up,
            ..Self::default()
        }
    }
}

impl Connectivity for FakeLink {
    type Error = FakeError;

    async fn connect(&mut self, _credentials: &LinkCredentials<'_>) -> Result<(), Self::Error> {
        self.connect_calls += 1;
        if self.fail_connects > 0 {
            self.fail_connects -= 1;
            return Err(FakeError::Refused);
        }
        self.associated = true;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        if !self.associated {
            return false;
        }
        let polls = self.polls.get() + 1;
        self.polls.set(polls);
        polls > self.polls_until_up
    }

    fn local_address(&self) -> Option<core::net::IpAddr> {
        self.associated
            .then(|| core::net::IpAddr::V4(core::net::Ipv4Addr::new(192, 168, 1, 42)))
    }
}
