//! # Typed SLI Hardware Access
//!
//! Register definitions and hardware seams for the die-to-die Serial Link
//! Interconnect (SLI). Every SLI channel block (`SLIH`, `SLIM`, `SLIV`, on both
//! the CPU die and the I/O die) exposes the same three registers this crate
//! models:
//!
//! ```text
//! block base
//!   + 0x00  CTRL_I        clear requests, auto-train off, latch edge, raw mode
//!   + 0x08  CTRL_III      pad delays (4 × 6 bits), PHY clock, engine clock
//!   + 0x14  INTR_STATUS   idle / suspend / training / error bits (W1C)
//! ```
//!
//! The bit layout lives in exactly one place: the [`bitfield_struct`] types in
//! [`ctrl1`], [`ctrl3`], [`intr_status`] and [`osc`]. Calling code manipulates
//! named fields only.
//!
//! ## Hardware seams
//!
//! * [`Mmio`] performs 32-bit accesses at physical addresses. [`VolatileMmio`]
//!   is the bare-metal implementation; host tests substitute a model.
//! * [`Delay`] provides the microsecond busy-waits the link requires.
//!   [`SpinDelay`] is a calibrated spin loop.
//! * [`Board`] bundles one of each so the training engine can borrow a single
//!   platform object.

#![cfg_attr(not(any(test, doctest)), no_std)]
#![allow(unsafe_code)]

mod board;
pub mod ctrl1;
pub mod ctrl3;
mod delay;
pub mod intr_status;
pub mod memory_map;
#[cfg(feature = "volatile")]
mod mmio;
pub mod osc;

pub use board::Board;
pub use ctrl1::SliCtrlI;
pub use ctrl3::{EngineClock, PhyClock, SliCtrlIII};
pub use delay::{Delay, SpinDelay};
pub use intr_status::SliIntrStatus;
pub use memory_map::RegisterBlock;
#[cfg(feature = "volatile")]
pub use mmio::VolatileMmio;
pub use osc::IoOscillator;

/// A 32-bit register at a fixed offset inside a [`RegisterBlock`].
pub trait SliRegister: Copy {
    /// Byte offset from the block base.
    const OFFSET: u64;

    fn from_raw(raw: u32) -> Self;

    fn into_raw(self) -> u32;
}

/// 32-bit memory-mapped register access.
///
/// Reads take `&mut self`: on real hardware a read may have side effects, and
/// register models update their state on access.
pub trait Mmio {
    fn read32(&mut self, address: u64) -> u32;

    fn write32(&mut self, address: u64, value: u32);

    /// Read the typed register `R` of `block`.
    #[inline]
    fn load<R: SliRegister>(&mut self, block: RegisterBlock) -> R {
        R::from_raw(self.read32(block.register(R::OFFSET)))
    }

    /// Write the typed register `R` of `block`.
    #[inline]
    fn store<R: SliRegister>(&mut self, block: RegisterBlock, value: R) {
        self.write32(block.register(R::OFFSET), value.into_raw());
    }

    /// Read-modify-write of `R`; returns the value written.
    #[inline]
    fn modify<R: SliRegister>(&mut self, block: RegisterBlock, f: impl FnOnce(R) -> R) -> R {
        let value = f(self.load::<R>(block));
        self.store(block, value);
        value
    }
}

impl<T: Mmio + ?Sized> Mmio for &mut T {
    #[inline]
    fn read32(&mut self, address: u64) -> u32 {
        (**self).read32(address)
    }

    #[inline]
    fn write32(&mut self, address: u64, value: u32) {
        (**self).write32(address, value);
    }
}
