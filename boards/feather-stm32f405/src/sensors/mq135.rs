#![deny(unsafe_code)]
//! MQ-135 gas sensor analog output on ADC1
//!
//! The module's AOUT swings to 5 V; it reaches the 3.3 V ADC through a
//! divider, so the raw code spans the full 12-bit range.

use embassy_stm32::adc::{Adc, AnyAdcChannel, Resolution, SampleTime};
use embassy_stm32::peripherals::ADC1;

pub struct Mq135<'d> {
    adc: Adc<'d, ADC1>,
    channel: AnyAdcChannel<ADC1>,
}

impl<'d> Mq135<'d> {
    pub fn new(mut adc: Adc<'d, ADC1>, channel: AnyAdcChannel<ADC1>) -> Self {
        adc.set_resolution(Resolution::BITS12);
        // High source impedance; use the longest sample time
        adc.set_sample_time(SampleTime::CYCLES480);
        Self { adc, channel }
    }

    /// Read the 12-bit conversion result
    pub fn read_raw(&mut self) -> u16 {
        self.adc.blocking_read(&mut self.channel)
    }
}
