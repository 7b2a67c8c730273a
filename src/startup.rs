//! Startup sequencer: serial console, worker thread, scheduler hand-off.
//!
//! # ESP-IDF threading model
//!
//! ESP-IDF implements `std::thread` via pthreads, which are thin wrappers
//! around FreeRTOS tasks. `esp_pthread_set_cfg()` sets thread-local
//! configuration that applies to the *next* `pthread_create()` call from
//! the calling thread, so the config→spawn pair must not be interleaved
//! with other thread creation on the same thread.
//!
//! The FreeRTOS scheduler is already running when `main` is entered, so
//! "starting the scheduler" means parking the main task on the worker's
//! join handle for good.

use std::thread::JoinHandle;

use crate::error::Error;

/// Task name for the worker (null-terminated for `esp_pthread_cfg_t`).
pub const WORKER_NAME: &str = "app\0";

/// Set the console UART to `baud`.
#[cfg(target_os = "espidf")]
pub fn init_serial(baud: u32) -> Result<(), Error> {
    use esp_idf_svc::sys::{ESP_OK, uart_set_baudrate};

    // SAFETY: the console UART driver is owned by ESP-IDF; changing its
    // baud rate is a register write with no aliasing Rust state.
    let ret = unsafe { uart_set_baudrate(crate::pins::CONSOLE_UART_NUM as _, baud) };
    if ret != ESP_OK as i32 {
        return Err(Error::Serial(ret));
    }
    log::info!("Console UART at {} baud", baud);
    Ok(())
}

/// Simulation fallback — stdout has no baud rate.
#[cfg(not(target_os = "espidf"))]
pub fn init_serial(baud: u32) -> Result<(), Error> {
    log::info!("serial(sim): {} baud requested", baud);
    Ok(())
}

/// Spawn the single worker thread with explicit priority and stack.
///
/// On ESP-IDF, uses `esp_pthread_set_cfg()` so the FreeRTOS task gets the
/// requested priority and stack size.  `name` must be null-terminated.
#[cfg(target_os = "espidf")]
pub fn spawn_worker(
    priority: u8,
    stack_bytes: usize,
    name: &'static str,
    f: impl FnOnce() + Send + 'static,
) -> Result<JoinHandle<()>, Error> {
    use esp_idf_svc::sys::{ESP_OK, esp_pthread_get_default_config, esp_pthread_set_cfg};

    // SAFETY: both calls only touch this thread's pthread config block.
    unsafe {
        let mut cfg = esp_pthread_get_default_config();
        cfg.prio = priority as _;
        cfg.stack_size = stack_bytes as _;
        cfg.thread_name = name.as_ptr().cast();
        if esp_pthread_set_cfg(&cfg) != ESP_OK as i32 {
            return Err(Error::Thread("esp_pthread_set_cfg failed"));
        }
    }

    let display_name = name.trim_end_matches('\0');
    log::info!(
        "Spawning '{}' (pri={}, stack={}B)",
        display_name,
        priority,
        stack_bytes
    );

    std::thread::Builder::new()
        .name(display_name.into())
        .stack_size(stack_bytes)
        .spawn(f)
        .map_err(|_| Error::Thread("worker thread creation failed"))
}

/// Simulation fallback — ignores priority, honours the stack size.
#[cfg(not(target_os = "espidf"))]
pub fn spawn_worker(
    priority: u8,
    stack_bytes: usize,
    name: &'static str,
    f: impl FnOnce() + Send + 'static,
) -> Result<JoinHandle<()>, Error> {
    let display_name = name.trim_end_matches('\0');
    log::info!(
        "Spawning '{}' (sim, pri={} ignored, stack={}B)",
        display_name,
        priority,
        stack_bytes
    );

    std::thread::Builder::new()
        .name(display_name.into())
        .stack_size(stack_bytes)
        .spawn(f)
        .map_err(|_| Error::Thread("worker thread creation failed"))
}

/// Hand the processor over to the worker.  Only returns if the worker
/// thread ends, which the firmware treats as fatal.
pub fn start_scheduler(worker: JoinHandle<()>) -> Error {
    match worker.join() {
        Ok(()) => Error::Thread("worker returned"),
        Err(_) => Error::Thread("worker panicked"),
    }
}
