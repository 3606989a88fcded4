//! # Early-Boot Console Logging
//!
//! A `log::Log` sink for the stretch of boot where the only output is a byte
//! register on a debug UART. The board supplies a `putc` function; this crate
//! turns log records into `[LEVEL] target: message\r\n` lines without
//! allocating.
//!
//! ```text
//! info!(...) ──► ConsoleLogger ──► ConsoleSink (fmt::Write) ──► putc(u8)
//! ```
//!
//! ## Setup
//!
//! ```rust,no_run
//! use log::LevelFilter;
//! use sli_console::ConsoleLogger;
//!
//! fn uart_putc(_byte: u8) {
//!     // write the board's UART data register
//! }
//!
//! static LOGGER: ConsoleLogger = ConsoleLogger::new(LevelFilter::Info, uart_putc);
//!
//! LOGGER.init().expect("first logger");
//! log::info!("console up");
//! ```
//!
//! With the `enabled` feature turned off the logger still installs but
//! discards every record.

#![cfg_attr(not(any(test, doctest)), no_std)]

mod logger;
mod sink;

pub use logger::ConsoleLogger;
pub use sink::{ConsoleSink, PutC, console_write};
