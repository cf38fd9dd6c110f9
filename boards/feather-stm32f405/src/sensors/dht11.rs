#![deny(unsafe_code)]
//! DHT11 temperature/humidity sensor on a single open-drain data line
//!
//! The bus needs an external pull-up (fitted on the usual breakout boards).
//! The 40-bit frame is timed by busy-waiting inside a critical section.

use defmt::Format;
use embassy_stm32::gpio::{Flex, Speed};
use embassy_time::{Instant, Timer};

/// Host start signal: hold the line low for at least 18 ms
const START_LOW_MS: u64 = 20;
/// Per-edge timeout; every phase of the protocol is under 100 µs
const EDGE_TIMEOUT_US: u64 = 100;
/// High phases longer than this encode a 1 (0 is ~27 µs, 1 is ~70 µs)
const ONE_THRESHOLD_US: u64 = 40;

/// DHT11 read failures
#[derive(Debug, Clone, Copy, PartialEq, Format)]
pub enum Dht11Error {
    /// The sensor did not answer or stopped mid-frame
    Timeout,
    /// The checksum byte did not match the data bytes
    Checksum,
}

/// One decoded DHT11 frame
#[derive(Debug, Clone, Copy, PartialEq, Format)]
pub struct Dht11Sample {
    pub temperature_celsius: f32,
    pub relative_humidity_percent: f32,
}

pub struct Dht11<'d> {
    pin: Flex<'d>,
}

impl<'d> Dht11<'d> {
    pub fn new(mut pin: Flex<'d>) -> Self {
        pin.set_high();
        pin.set_as_input_output(Speed::Low);
        Self { pin }
    }

    /// Run one start/response/data exchange
    pub async fn read(&mut self) -> Result<Dht11Sample, Dht11Error> {
        self.pin.set_low();
        Timer::after_millis(START_LOW_MS).await;

        let mut frame = [0u8; 5];
        critical_section::with(|_| {
            self.pin.set_high();

            // Response: ~80 µs low, ~80 µs high, then the first bit's low
            self.wait_while(true)?;
            self.wait_while(false)?;
            self.wait_while(true)?;

            for bit in 0..40 {
                self.wait_while(false)?;
                let high_us = self.wait_while(true)?;
                if high_us > ONE_THRESHOLD_US {
                    frame[bit / 8] |= 0x80 >> (bit % 8);
                }
            }
            Ok(())
        })?;

        decode(frame)
    }

    /// Spin until the line leaves `high`, returning how long that took
    fn wait_while(&mut self, high: bool) -> Result<u64, Dht11Error> {
        let start = Instant::now();
        while self.pin.is_high() == high {
            if start.elapsed().as_micros() > EDGE_TIMEOUT_US {
                return Err(Dht11Error::Timeout);
            }
        }
        Ok(start.elapsed().as_micros())
    }
}

fn decode(frame: [u8; 5]) -> Result<Dht11Sample, Dht11Error> {
    let sum = frame[..4]
        .iter()
        .fold(0u8, |acc, byte| acc.wrapping_add(*byte));
    if sum != frame[4] {
        return Err(Dht11Error::Checksum);
    }

    let relative_humidity_percent = frame[0] as f32 + frame[1] as f32 / 10.0;
    // Bit 7 of the fraction byte flags sub-zero temperatures on newer parts
    let magnitude = frame[2] as f32 + (frame[3] & 0x7F) as f32 / 10.0;
    let temperature_celsius = if frame[3] & 0x80 != 0 {
        -magnitude
    } else {
        magnitude
    };

    Ok(Dht11Sample {
        temperature_celsius,
        relative_humidity_percent,
    })
}
