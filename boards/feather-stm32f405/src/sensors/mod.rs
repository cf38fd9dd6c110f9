#![deny(unsafe_code)]
//! Board sensors
//!
//! - **`dht11`**: temperature and relative humidity
//! - **`mq135`**: raw gas sensor conversion

pub mod dht11;
pub mod mq135;

use defmt::{debug, warn};
use hal_abstractions::{ClimateReading, Measurement, SensorProvider};

use dht11::Dht11;
use mq135::Mq135;

/// [`SensorProvider`] backed by the DHT11 and MQ-135
pub struct BoardSensors<'d> {
    climate: Dht11<'d>,
    gas: Mq135<'d>,
}

impl<'d> BoardSensors<'d> {
    pub fn new(climate: Dht11<'d>, gas: Mq135<'d>) -> Self {
        Self { climate, gas }
    }
}

impl SensorProvider for BoardSensors<'_> {
    async fn read_temperature_humidity(&mut self) -> ClimateReading {
        match self.climate.read().await {
            Ok(sample) => ClimateReading {
                temperature_celsius: Measurement::from_f32(sample.temperature_celsius),
                relative_humidity_percent: Measurement::from_f32(
                    sample.relative_humidity_percent,
                ),
            },
            Err(e) => {
                warn!("DHT11 read failed: {}", e);
                ClimateReading::INVALID
            }
        }
    }

    async fn read_raw_gas(&mut self) -> u16 {
        let raw = self.gas.read_raw();
        debug!("MQ-135 raw: {}", raw);
        raw
    }
}
