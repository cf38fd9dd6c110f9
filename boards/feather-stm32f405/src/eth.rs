#![deny(unsafe_code)]
//! Ethernet hardware layer module
//!
//! Adafruit Ethernet FeatherWing (W5500) on SPI2.

use defmt::info;
use embassy_embedded_hal::shared_bus::asynch::spi::SpiDevice as SpiDeviceBus;
use embassy_net_wiznet::chip::W5500;
use embassy_net_wiznet::{Device, Runner};
use embassy_stm32::exti::ExtiInput;
use embassy_stm32::gpio::{Level, Output, Pull, Speed};
use embassy_stm32::mode::Async;
use embassy_stm32::peripherals;
use embassy_stm32::spi::{self, Spi};
use embassy_stm32::time::Hertz;
use embassy_stm32::Peri;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use static_cell::StaticCell;

/// W5500 driver runner; must be polled continuously for the device to work
pub type W5500Runner = Runner<
    'static,
    W5500,
    SpiDeviceBus<'static, CriticalSectionRawMutex, Spi<'static, Async>, Output<'static>>,
    ExtiInput<'static>,
    Output<'static>,
>;

/// Raw peripherals wired to the W5500
pub struct EthPeripherals {
    pub spi: Peri<'static, peripherals::SPI2>,
    pub sck: Peri<'static, peripherals::PB13>,
    pub mosi: Peri<'static, peripherals::PB15>,
    pub miso: Peri<'static, peripherals::PB14>,
    pub cs: Peri<'static, peripherals::PC6>,
    pub reset: Peri<'static, peripherals::PC3>,
    pub int: Peri<'static, peripherals::PC2>,
    pub exti: Peri<'static, peripherals::EXTI2>,
    pub dma_tx: Peri<'static, peripherals::DMA1_CH4>,
    pub dma_rx: Peri<'static, peripherals::DMA1_CH3>,
}

/// Initialize the W5500 Ethernet hardware
///
/// Returns device and runner. Runner must be continuously polled for device operation.
pub async fn init_w5500(periph: EthPeripherals, mac_addr: [u8; 6]) -> (Device<'static>, W5500Runner) {
    let mut spi_config = spi::Config::default();
    spi_config.frequency = Hertz(10_000_000); // 10 MHz for W5500

    let spi = Spi::new(
        periph.spi,
        periph.sck,
        periph.mosi,
        periph.miso,
        periph.dma_tx,
        periph.dma_rx,
        spi_config,
    );

    let cs = Output::new(periph.cs, Level::High, Speed::VeryHigh);
    let mut reset = Output::new(periph.reset, Level::High, Speed::Low);
    let int = ExtiInput::new(periph.int, periph.exti, Pull::Up);

    info!("Performing W5500 hardware reset...");
    reset.set_low();
    embassy_time::Timer::after_millis(1).await;
    reset.set_high();
    embassy_time::Timer::after_millis(2).await;

    type SpiBusType = embassy_sync::mutex::Mutex<CriticalSectionRawMutex, Spi<'static, Async>>;
    static SPI_BUS: StaticCell<SpiBusType> = StaticCell::new();
    let spi_bus = SPI_BUS.init(embassy_sync::mutex::Mutex::new(spi));
    let spi_device = SpiDeviceBus::new(spi_bus, cs);

    info!(
        "MAC address: {:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
        mac_addr[0], mac_addr[1], mac_addr[2], mac_addr[3], mac_addr[4], mac_addr[5]
    );

    static STATE: StaticCell<embassy_net_wiznet::State<8, 8>> = StaticCell::new();
    let state = STATE.init(embassy_net_wiznet::State::<8, 8>::new());

    // No network without the chip; nothing to fall back to
    let (device, runner) = embassy_net_wiznet::new(mac_addr, state, spi_device, int, reset)
        .await
        .unwrap();

    info!("W5500 initialized");

    (device, runner)
}
