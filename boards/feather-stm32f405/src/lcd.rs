#![deny(unsafe_code)]
//! HD44780 16x2 character LCD, 4-bit parallel, write-only (RW tied low)

use embassy_stm32::gpio::Output;
use embassy_time::Timer;
use hal_abstractions::DisplaySink;

/// Characters per row
pub const COLUMNS: u8 = 16;
/// Visible rows
pub const ROWS: u8 = 2;

/// DDRAM address of the first column of each row
const ROW_OFFSETS: [u8; ROWS as usize] = [0x00, 0x40];

const CMD_CLEAR: u8 = 0x01;
const CMD_ENTRY_MODE: u8 = 0x06; // increment, no shift
const CMD_DISPLAY_ON: u8 = 0x0C; // display on, cursor off, blink off
const CMD_FUNCTION_SET: u8 = 0x28; // 4-bit bus, 2 lines, 5x8 font
const CMD_SET_DDRAM: u8 = 0x80;

/// Degree sign in the A00 character ROM
const GLYPH_DEGREE: u8 = 0xDF;

pub struct Lcd<'d> {
    rs: Output<'d>,
    en: Output<'d>,
    data: [Output<'d>; 4],
}

impl<'d> Lcd<'d> {
    /// `data` is D4..D7 in that order
    pub fn new(rs: Output<'d>, en: Output<'d>, data: [Output<'d>; 4]) -> Self {
        Self { rs, en, data }
    }

    /// Power-on initialisation by instruction
    pub async fn init(&mut self) {
        Timer::after_millis(50).await;
        self.rs.set_low();

        // Force 8-bit mode three times, then switch to 4-bit
        self.write_nibble(0x03).await;
        Timer::after_millis(5).await;
        self.write_nibble(0x03).await;
        Timer::after_micros(150).await;
        self.write_nibble(0x03).await;
        self.write_nibble(0x02).await;

        self.command(CMD_FUNCTION_SET).await;
        self.command(CMD_DISPLAY_ON).await;
        self.command(CMD_ENTRY_MODE).await;
        self.clear().await;
    }

    async fn command(&mut self, byte: u8) {
        self.rs.set_low();
        self.write_byte(byte).await;
    }

    async fn data(&mut self, byte: u8) {
        self.rs.set_high();
        self.write_byte(byte).await;
    }

    async fn write_byte(&mut self, byte: u8) {
        self.write_nibble(byte >> 4).await;
        self.write_nibble(byte & 0x0F).await;
        // Longest non-clear instruction is 37 µs
        Timer::after_micros(50).await;
    }

    async fn write_nibble(&mut self, nibble: u8) {
        for (bit, pin) in self.data.iter_mut().enumerate() {
            if nibble & (1 << bit) != 0 {
                pin.set_high();
            } else {
                pin.set_low();
            }
        }
        self.en.set_high();
        Timer::after_micros(1).await;
        self.en.set_low();
        Timer::after_micros(1).await;
    }
}

/// Map a character onto the controller's ROM, `?` for anything unprintable
fn glyph(c: char) -> u8 {
    match c {
        '°' => GLYPH_DEGREE,
        ' '..='}' => c as u8,
        _ => b'?',
    }
}

impl DisplaySink for Lcd<'_> {
    async fn clear(&mut self) {
        self.command(CMD_CLEAR).await;
        Timer::after_millis(2).await;
    }

    async fn write_at(&mut self, row: u8, col: u8, text: &str) {
        if row >= ROWS || col >= COLUMNS {
            return;
        }
        self.command(CMD_SET_DDRAM | (ROW_OFFSETS[row as usize] + col))
            .await;
        for c in text.chars().take((COLUMNS - col) as usize) {
            self.data(glyph(c)).await;
        }
    }
}
