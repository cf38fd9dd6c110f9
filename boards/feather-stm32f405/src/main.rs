#![deny(unsafe_code)]
#![no_main]
#![no_std]

use defmt_rtt as _; // global logger
use panic_probe as _;
use rtic::app;
use rtic_monotonics::stm32::prelude::*;

mod clock;
mod config;
mod device_id;
mod eth;
mod lcd;
mod network;
mod sensors;
mod session_buffers;

stm32_tim2_monotonic!(Mono, 1_000_000);

#[app(device = embassy_stm32, peripherals = true, dispatchers = [USART1, USART2, USART3])]
mod app {
    use super::*;
    use defmt::{error, info};
    use embassy_futures::join::join3;
    use embassy_stm32::adc::{Adc, AdcChannel};
    use embassy_stm32::gpio::{Flex, Level, Output, Speed};
    use embassy_stm32::rcc::{Hse, HseMode};
    use embassy_stm32::time::Hertz;
    use embassy_time::Delay;

    use iot_core::{identity, node, SessionManager, TelemetryLoop};

    use clock::UptimeClock;
    use eth::EthPeripherals;
    use lcd::Lcd;
    use network::{BrokerTransport, EthLink};
    use sensors::{dht11::Dht11, mq135::Mq135, BoardSensors};

    #[shared]
    struct Shared {}

    #[local]
    struct Local {
        led: Output<'static>,
        sensors: BoardSensors<'static>,
        lcd: Lcd<'static>,
    }

    #[init]
    fn init(_cx: init::Context) -> (Shared, Local) {
        info!("Telemetry node starting...");

        // Adafruit Feather STM32F405: 12 MHz HSE
        let mut config = embassy_stm32::Config::default();
        config.rcc.hse = Some(Hse {
            freq: Hertz(12_000_000),
            mode: HseMode::Oscillator,
        });

        // HSE (12 MHz) / PREDIV(6) = 2 MHz (PLL input)
        // 2 MHz * MUL(168) = 336 MHz (VCO)
        // VCO / DIVP(4) = 84 MHz (SYSCLK)
        config.rcc.pll_src = embassy_stm32::rcc::PllSource::HSE;
        config.rcc.pll = Some(embassy_stm32::rcc::Pll {
            prediv: embassy_stm32::rcc::PllPreDiv::DIV6, // 12 MHz / 6 = 2 MHz
            mul: embassy_stm32::rcc::PllMul::MUL168,     // 2 MHz * 168 = 336 MHz (VCO)
            divp: Some(embassy_stm32::rcc::PllPDiv::DIV4), // 336 MHz / 4 = 84 MHz (SYSCLK)
            divq: Some(embassy_stm32::rcc::PllQDiv::DIV7), // 336 MHz / 7 = 48 MHz
            divr: None,
        });
        config.rcc.sys = embassy_stm32::rcc::Sysclk::PLL1_P;
        config.rcc.ahb_pre = embassy_stm32::rcc::AHBPrescaler::DIV1; // 84 MHz
        config.rcc.apb1_pre = embassy_stm32::rcc::APBPrescaler::DIV2; // 42 MHz
        config.rcc.apb2_pre = embassy_stm32::rcc::APBPrescaler::DIV1; // 84 MHz

        let p = embassy_stm32::init(config);
        info!("System initialized: SYSCLK=84MHz");

        // TIM2 on APB1: timer clock = 2*APB1 when prescaler != 1
        let timer_clock_hz = 84_000_000;
        Mono::start(timer_clock_hz);

        let led = Output::new(p.PC1, Level::High, Speed::Low);

        // A0: MQ-135 AOUT, D9: DHT11 data
        let gas = Mq135::new(Adc::new(p.ADC1), p.PA4.degrade_adc());
        let climate = Dht11::new(Flex::new(p.PB8));
        let sensors = BoardSensors::new(climate, gas);

        // A1: RS, A2: E, A3..A5 + D10: D4..D7
        let lcd = Lcd::new(
            Output::new(p.PA5, Level::Low, Speed::Low),
            Output::new(p.PA6, Level::Low, Speed::Low),
            [
                Output::new(p.PA7, Level::Low, Speed::Low),
                Output::new(p.PC4, Level::Low, Speed::Low),
                Output::new(p.PC5, Level::Low, Speed::Low),
                Output::new(p.PB9, Level::Low, Speed::Low),
            ],
        );

        let eth_periph = EthPeripherals {
            spi: p.SPI2,
            sck: p.PB13,
            mosi: p.PB15,
            miso: p.PB14,
            cs: p.PC6,
            reset: p.PC3,
            int: p.PC2,
            exti: p.EXTI2,
            dma_tx: p.DMA1_CH4,
            dma_rx: p.DMA1_CH3,
        };

        heartbeat::spawn().ok();
        node_task::spawn(eth_periph).ok();

        (Shared {}, Local { led, sensors, lcd })
    }

    /// Heartbeat task
    #[task(priority = 1, local = [led])]
    async fn heartbeat(cx: heartbeat::Context) {
        info!("Heartbeat task started");
        loop {
            cx.local.led.set_high();
            Mono::delay(100.millis()).await;
            cx.local.led.set_low();
            Mono::delay(4900.millis()).await;
        }
    }

    /// Node task - network stack runners plus the telemetry loop
    ///
    /// Stack is !Send and must remain within this task.
    #[task(priority = 1, local = [sensors, lcd])]
    async fn node_task(cx: node_task::Context, periph: EthPeripherals) -> ! {
        use embassy_net::{Config, StackResources};
        use static_cell::StaticCell;

        info!("Node task started");

        let node_config = config::node_config();
        if let Err(e) = node_config.validate() {
            error!("Invalid configuration: {}", e);
            defmt::panic!("refusing to start with invalid configuration");
        }

        let (device, w5500_runner) = eth::init_w5500(periph, device_id::mac_address()).await;

        static RESOURCES: StaticCell<StackResources<3>> = StaticCell::new();
        let (stack, mut net_runner) = embassy_net::new(
            device,
            Config::dhcpv4(Default::default()),
            RESOURCES.init(StackResources::new()),
            device_id::seed(),
        );
        info!("Network stack initialized with DHCP");

        let sensors = cx.local.sensors;
        let lcd = cx.local.lcd;

        let app_logic = async {
            let mut delay = Delay;
            lcd.init().await;
            node::splash(lcd, &mut delay).await;

            let mut link = EthLink::new(stack);
            node::bring_up_link(
                &mut link,
                &config::LINK_CREDENTIALS,
                &mut delay,
                config::LINK_POLL_MS,
            )
            .await;

            let client_id =
                match identity::client_id(node_config.mqtt.client_id_prefix, device_id::uid()) {
                    Ok(id) => id,
                    Err(e) => defmt::panic!("Cannot derive client ID: {}", e),
                };
            info!("MQTT client ID: {}", client_id.as_str());

            let session = SessionManager::new(
                BrokerTransport::new(stack),
                Delay,
                &node_config.mqtt,
                &node_config.session,
                client_id,
            );
            let mut telemetry = TelemetryLoop::new(sensors, lcd, session, &node_config);
            node::run(&mut telemetry, &UptimeClock, &mut delay, config::POLL_MS).await
        };

        join3(w5500_runner.run(), net_runner.run(), app_logic).await;
    }

    /// RTIC idle task - WFI sleep mode when no tasks active
    #[idle]
    fn idle(_cx: idle::Context) -> ! {
        info!("Idle task started - entering WFI loop");
        loop {
            cortex_m::asm::wfi();
        }
    }
}
