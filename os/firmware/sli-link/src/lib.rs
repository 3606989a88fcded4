//! # SLI Link Bring-up and Delay Calibration
//!
//! Brings the die-to-die Serial Link Interconnect from the power-on reference
//! clock to its operating rate, then calibrates the receive-side pad delays so
//! that every lane samples inside its data eye.
//!
//! ## Sequence
//!
//! ```text
//! LowSpeedBringup   every block at the reference clock, cleared, SLIH suspended
//! [Workaround]      pre-production I/O die oscillator rewrite
//! AutoTrainOff      stop hardware retraining on SLIH/SLIM
//! SpeedUp           engine clock, latch edge, PHY clock (I/O die first)
//! CalibrateAhb      shared-tap sweep on the I/O die SLIH block
//! CalibrateMemory   shared-tap sweep, then per-lane sweeps on the CPU die SLIM block
//! AutoTrainOn       resume retraining, wait for both calibrated blocks to suspend
//! ```
//!
//! A link that reports RX errors at the bring-up rate, or a clear request the
//! hardware never acknowledges, aborts the sequence with a [`TrainError`]. Not
//! finding a passing delay is not fatal: the scanners fall back to known-good
//! taps and log a warning.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use sli_hw::{Board, SpinDelay, VolatileMmio};
//! use sli_link::{ChannelGroups, ChipRevision, TargetPhyClock, TrainingConfig, train_links};
//! use sli_hw::PhyClock;
//!
//! // SAFETY: running on the SoC with the SLI windows identity-mapped.
//! let mut board = Board::new(unsafe { VolatileMmio::new() }, SpinDelay::new(100));
//! let config = TrainingConfig::new(ChipRevision::A1, TargetPhyClock::SpeedUp(PhyClock::Mhz400));
//! let linked = train_links(&mut board, &ChannelGroups::soc(), &config);
//! ```
//!
//! ## Modules
//!
//! * [`channel`]: block handles and the register view bound to a platform
//! * [`reset`]: the clear-and-wait primitive
//! * [`detect`]: link condition classification and suspend waits
//! * [`scan`]: coarse (shared) and fine (per-lane) delay sweeps
//! * [`clock`]: clock stepping from reference to target rate
//! * [`train`]: the orchestrating state machine

#![cfg_attr(not(any(test, doctest)), no_std)]

pub mod channel;
pub mod clock;
pub mod config;
pub mod detect;
mod error;
pub mod reset;
pub mod scan;
mod tap;
pub mod train;

pub use channel::{ChannelGroup, ChannelGroups, ChannelRegs, ChannelRole, DieSide};
pub use clock::{ClockProfile, ClockStepper};
pub use config::{ChipRevision, FallbackTaps, TargetPhyClock, TrainingConfig};
pub use detect::{LinkCondition, poll_condition, wait_for_suspend, wait_for_suspend_within};
pub use error::{LinkError, TrainError};
pub use reset::clear_and_wait;
pub use scan::{ScanResult, Sweep, coarse_scan, fine_scan};
pub use tap::{CalibrationWindow, DelayTap};
pub use train::{CalibrationReport, Linked, MEMORY_LANES, SliTrainer, TrainingState, train_links};
