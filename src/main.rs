//! RustUartBandpass - Main entry point
//!
//! Firmware (`target_os = "espidf"`):
//! 1. Initialize data UART (UART2) and log UART (UART1)
//! 2. Start ingest task on Core 0
//! 3. Start process task on Core 1
//! 4. Drain logs on the main thread
//!
//! Host: replay tool, PCM16LE on stdin, framed filtered frames on stdout,
//! logs on stderr. Same two-task pipeline on two OS threads.

#[cfg(target_os = "espidf")]
fn main() -> Result<(), esp_idf_svc::sys::EspError> {
    firmware::main()
}

#[cfg(not(target_os = "espidf"))]
fn main() -> std::io::Result<()> {
    host::main()
}

#[cfg(target_os = "espidf")]
mod firmware {
    use std::thread;

    use esp_idf_svc::hal::cpu::Core;
    use esp_idf_svc::hal::delay::FreeRtos;
    use esp_idf_svc::hal::peripherals::Peripherals;
    use esp_idf_svc::hal::task::thread::ThreadSpawnConfiguration;
    use esp_idf_svc::sys::{EspError, ESP_ERR_NO_MEM};

    use rust_uart_bandpass::hal::{self, uart, LogUartConfig, SerialConfig};
    use rust_uart_bandpass::log_drain::LogDrain;
    use rust_uart_bandpass::{
        rt_error, rt_info, FilterConfig, FrameFilter, FrameRing, Ingest, PipelineStats, Process,
        RetryPolicy, Telemetry, ALL_LOGS, INGEST_LOG, PROCESS_LOG, SYSTEM_LOG,
    };

    // Static allocations: 64 KiB ring in .bss, shared counters
    static RING: FrameRing = FrameRing::new();
    static STATS: PipelineStats = PipelineStats::new();

    const TASK_STACK_SIZE: usize = 16 * 1024;
    const STATS_INTERVAL_US: i64 = 10_000_000;

    fn spawn_failed(e: std::io::Error) -> EspError {
        rt_error!(SYSTEM_LOG, hal::timestamp_us(), "thread spawn: {}", e);
        EspError::from_infallible::<ESP_ERR_NO_MEM>()
    }

    pub fn main() -> Result<(), EspError> {
        esp_idf_svc::sys::link_patches();

        let peripherals = Peripherals::take()?;
        let pins = peripherals.pins;

        let mut data = uart::init_data_uart(
            peripherals.uart2,
            pins.gpio17,
            pins.gpio16,
            &SerialConfig::default(),
        )?;
        let mut log_uart =
            uart::init_log_uart(peripherals.uart1, pins.gpio6, &LogUartConfig::default())?;

        let filter = match FrameFilter::new(&FilterConfig::DEFAULT) {
            Ok(filter) => filter,
            Err(e) => {
                rt_error!(SYSTEM_LOG, hal::timestamp_us(), "filter config rejected: {}", e);
                let _ = LogDrain::default().pump(&ALL_LOGS, &mut log_uart, hal::timestamp_us());
                return Ok(());
            }
        };

        let Some((tx, rx)) = RING.split() else {
            return Ok(());
        };

        rt_info!(
            SYSTEM_LOG,
            hal::timestamp_us(),
            "{} bins {}..={}",
            env!("VERSION_STRING"),
            filter.mask().k_min(),
            filter.mask().k_max()
        );

        let mut ingest = Ingest::new(
            tx,
            RetryPolicy::DEFAULT,
            Telemetry::new(&STATS, &INGEST_LOG, hal::timestamp_us),
        );
        let mut process = Process::new(
            rx,
            filter,
            Telemetry::new(&STATS, &PROCESS_LOG, hal::timestamp_us),
        );

        let (mut serial_tx, mut serial_rx) = data.split();

        thread::scope(|s| -> Result<(), EspError> {
            ThreadSpawnConfiguration {
                name: Some("ingest\0".as_bytes()),
                stack_size: TASK_STACK_SIZE,
                priority: 10,
                pin_to_core: Some(Core::Core0),
                ..Default::default()
            }
            .set()?;

            thread::Builder::new()
                .stack_size(TASK_STACK_SIZE)
                .spawn_scoped(s, move || {
                    let mut delay = FreeRtos;
                    loop {
                        // Returns on an empty read; errors are logged and retried
                        if let Err(e) = ingest.run(&mut serial_rx, &mut delay) {
                            rt_error!(INGEST_LOG, hal::timestamp_us(), "uart read: {}", e);
                            FreeRtos::delay_ms(10);
                        }
                    }
                })
                .map_err(spawn_failed)?;

            ThreadSpawnConfiguration {
                name: Some("process\0".as_bytes()),
                stack_size: TASK_STACK_SIZE,
                priority: 9,
                pin_to_core: Some(Core::Core1),
                ..Default::default()
            }
            .set()?;

            thread::Builder::new()
                .stack_size(TASK_STACK_SIZE)
                .spawn_scoped(s, move || {
                    let mut delay = FreeRtos;
                    loop {
                        if let Err(e) = process.run(&mut serial_tx, &mut delay) {
                            rt_error!(PROCESS_LOG, hal::timestamp_us(), "uart write: {}", e);
                            FreeRtos::delay_ms(10);
                        }
                    }
                })
                .map_err(spawn_failed)?;

            // Back to defaults for anything spawned later
            ThreadSpawnConfiguration::default().set()?;

            let mut drain = LogDrain::default();
            let mut last_stats = 0i64;
            loop {
                let now = hal::timestamp_us();
                if now - last_stats >= STATS_INTERVAL_US {
                    rt_info!(SYSTEM_LOG, now, "{}", STATS.snapshot());
                    last_stats = now;
                }

                let lines = drain.pump(&ALL_LOGS, &mut log_uart, now).unwrap_or(0);
                if lines == 0 {
                    FreeRtos::delay_ms(10);
                }
            }
        })
    }
}

#[cfg(not(target_os = "espidf"))]
mod host {
    use std::io::{self, BufWriter};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::OnceLock;
    use std::thread;
    use std::time::{Duration, Instant};

    use embedded_hal::delay::DelayNs;
    use embedded_io_adapters::std::FromStd;

    use rust_uart_bandpass::log_drain::LogDrain;
    use rust_uart_bandpass::logging::LogLevel;
    use rust_uart_bandpass::{
        rt_info, FilterConfig, FrameFilter, FrameRing, Ingest, MaskMode, PipelineStats, Process,
        RetryPolicy, Telemetry, ALL_LOGS, INGEST_LOG, PROCESS_LOG, SYSTEM_LOG,
    };

    static RING: FrameRing = FrameRing::new();
    static STATS: PipelineStats = PipelineStats::new();

    /// `DelayNs` on top of `thread::sleep`.
    struct StdDelay;

    impl DelayNs for StdDelay {
        fn delay_ns(&mut self, ns: u32) {
            thread::sleep(Duration::from_nanos(ns as u64));
        }
    }

    fn clock_us() -> i64 {
        static START: OnceLock<Instant> = OnceLock::new();
        START.get_or_init(Instant::now).elapsed().as_micros() as i64
    }

    fn usage() -> io::Error {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            "usage: bandpass [--one-sided] [--verbose] < pcm16le > framed",
        )
    }

    pub fn main() -> io::Result<()> {
        let mut config = FilterConfig::DEFAULT;
        for arg in std::env::args().skip(1) {
            match arg.as_str() {
                "--one-sided" => config = config.with_mask_mode(MaskMode::OneSided),
                "--verbose" => ALL_LOGS.iter().for_each(|log| log.set_min_level(LogLevel::Debug)),
                _ => return Err(usage()),
            }
        }

        let filter = FrameFilter::new(&config)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        let (tx, rx) = RING
            .split()
            .ok_or_else(|| io::Error::other("ring already split"))?;

        rt_info!(
            SYSTEM_LOG,
            clock_us(),
            "{} bins {}..={} ({:?})",
            env!("VERSION_STRING"),
            filter.mask().k_min(),
            filter.mask().k_max(),
            config.mask_mode
        );

        let mut ingest = Ingest::new(tx, RetryPolicy::DEFAULT, Telemetry::new(&STATS, &INGEST_LOG, clock_us));
        let mut process = Process::new(rx, filter, Telemetry::new(&STATS, &PROCESS_LOG, clock_us));

        let stop = AtomicBool::new(false);
        let stop = &stop;
        let mut log_sink = FromStd::new(io::stderr());
        let mut drain = LogDrain::default();

        let (ingested, processed) = thread::scope(|s| {
            let ingest_task = s.spawn(move || {
                let mut source = FromStd::new(io::stdin().lock());
                let result = ingest.run(&mut source, &mut StdDelay);
                stop.store(true, Ordering::Release);
                result
            });

            let process_task = s.spawn(move || {
                let mut sink = FromStd::new(BufWriter::new(io::stdout().lock()));
                process.run_until(&mut sink, &mut StdDelay, stop)
            });

            while !(ingest_task.is_finished() && process_task.is_finished()) {
                // A dead consumer would leave the producer blocked on a full ring
                if process_task.is_finished() && !ingest_task.is_finished() {
                    break;
                }
                let lines = drain.pump(&ALL_LOGS, &mut log_sink, clock_us()).unwrap_or(0);
                if lines == 0 {
                    thread::sleep(Duration::from_millis(5));
                }
            }

            let processed = process_task
                .join()
                .unwrap_or_else(|_| Err(io::Error::other("process task panicked")));
            if processed.is_err() && !ingest_task.is_finished() {
                let _ = drain.pump(&ALL_LOGS, &mut log_sink, clock_us());
                eprintln!("output failed, stopping");
                std::process::exit(1);
            }

            let ingested = ingest_task
                .join()
                .unwrap_or_else(|_| Err(io::Error::other("ingest task panicked")));
            (ingested, processed)
        });

        rt_info!(SYSTEM_LOG, clock_us(), "{}", STATS.snapshot());
        let _ = drain.pump(&ALL_LOGS, &mut log_sink, clock_us());

        ingested?;
        processed.map(|_| ())
    }
}
