//! UART drivers for the PCM stream and the log output.
//!
//! # Hardware Setup
//!
//! ```text
//! Host TX ─────────▶ GPIO16 (UART2 RX)   PCM16LE in, 921600 baud
//! Host RX ◀───────── GPIO17 (UART2 TX)   framed frames out
//! USB-UART RX ◀───── GPIO6  (UART1 TX)   log lines, 115200 baud
//! ```
//!
//! At 921600 baud (8N1) the link carries about 92 KB/s, enough for one
//! 16 kHz PCM16 stream (32 KB/s) in each direction.

#[cfg(target_os = "espidf")]
use esp_idf_svc::hal::gpio;
#[cfg(target_os = "espidf")]
use esp_idf_svc::hal::peripheral::Peripheral;
#[cfg(target_os = "espidf")]
use esp_idf_svc::hal::uart::{self, Uart, UartDriver, UartTxDriver};
#[cfg(target_os = "espidf")]
use esp_idf_svc::hal::units::Hertz;
#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::EspError;

/// Data link settings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SerialConfig {
    pub baud_rate: u32,
    pub rx_pin: u8,
    pub tx_pin: u8,
    /// Driver RX ring size in bytes.
    pub rx_buffer_len: usize,
    /// Driver TX ring size in bytes.
    pub tx_buffer_len: usize,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            baud_rate: 921_600,
            rx_pin: 16, // GPIO16 - UART2 RX
            tx_pin: 17, // GPIO17 - UART2 TX
            rx_buffer_len: 2048,
            tx_buffer_len: 2048,
        }
    }
}

/// Log output settings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LogUartConfig {
    pub baud_rate: u32,
    pub tx_pin: u8,
}

impl Default for LogUartConfig {
    fn default() -> Self {
        Self {
            baud_rate: 115_200,
            tx_pin: 6, // GPIO6 - UART1 TX
        }
    }
}

/// Initialize the data UART, RX and TX, no flow control.
#[cfg(target_os = "espidf")]
pub fn init_data_uart<'d, U: Uart>(
    uart: impl Peripheral<P = U> + 'd,
    tx_pin: impl Peripheral<P = impl gpio::OutputPin> + 'd,
    rx_pin: impl Peripheral<P = impl gpio::InputPin> + 'd,
    config: &SerialConfig,
) -> Result<UartDriver<'d>, EspError> {
    let uart_config = uart::config::Config::default()
        .baudrate(Hertz(config.baud_rate))
        .rx_fifo_size(config.rx_buffer_len)
        .tx_fifo_size(config.tx_buffer_len);

    UartDriver::new(
        uart,
        tx_pin,
        rx_pin,
        Option::<gpio::AnyIOPin>::None, // CTS
        Option::<gpio::AnyIOPin>::None, // RTS
        &uart_config,
    )
}

/// Initialize a TX-only UART for log output.
#[cfg(target_os = "espidf")]
pub fn init_log_uart<'d, U: Uart>(
    uart: impl Peripheral<P = U> + 'd,
    tx_pin: impl Peripheral<P = impl gpio::OutputPin> + 'd,
    config: &LogUartConfig,
) -> Result<UartTxDriver<'d>, EspError> {
    let uart_config = uart::config::Config::default().baudrate(Hertz(config.baud_rate));

    UartTxDriver::new(
        uart,
        tx_pin,
        Option::<gpio::AnyIOPin>::None, // CTS
        Option::<gpio::AnyIOPin>::None, // RTS
        &uart_config,
    )
}
