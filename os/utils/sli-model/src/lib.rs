//! # SLI Register Model
//!
//! A host-side stand-in for the two-die SLI hardware. [`DiePair`] implements
//! [`Mmio`] and [`Delay`]: reads and writes inside a registered channel block
//! are routed to a [`BlockModel`], everything else lands in a flat register
//! file. Time is simulated; [`Delay::delay_us`] only advances a counter.
//!
//! Each block models just enough behavior to drive link training:
//!
//! * clear requests in `CTRL_I` drop after a configurable number of polls, or
//!   never ([`ClearBehavior::Stuck`]);
//! * `INTR_STATUS` reports a suspended link when the block runs at the
//!   reference clock or every configured lane eye contains its tap;
//! * RX errors and fixed status values can be injected per block.
//!
//! ```rust
//! use sli_hw::{Mmio, SliIntrStatus};
//! use sli_hw::memory_map::{SLI_CPU_BASE, SLIM_OFFSET};
//! use sli_hw::RegisterBlock;
//! use sli_model::DiePair;
//!
//! let memory = RegisterBlock::new(SLI_CPU_BASE + SLIM_OFFSET);
//! let mut dies = DiePair::soc();
//! dies.block_mut(memory).set_shared_window(4, 8..=14);
//!
//! let status: SliIntrStatus = dies.load(memory);
//! assert!(status.is_suspended());
//! ```

mod block;

pub use block::{BlockModel, ClearBehavior};

use sli_hw::memory_map::{SLI_BLOCK_SIZE, SLI_CPU_BASE, SLI_IO_BASE, SLIH_OFFSET, SLIM_OFFSET, SLIV_OFFSET};
use sli_hw::{Delay, Mmio, RegisterBlock, SliRegister};
use std::collections::BTreeMap;

/// One recorded register write.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct RegisterWrite {
    pub address: u64,
    pub value: u32,
}

/// The CPU die and the I/O die as seen over MMIO.
#[derive(Debug, Clone)]
pub struct DiePair {
    blocks: BTreeMap<u64, BlockModel>,
    registers: BTreeMap<u64, u32>,
    writes: Vec<RegisterWrite>,
    elapsed_us: u64,
}

impl DiePair {
    /// Register the three channel blocks of each SLI window.
    #[must_use]
    pub fn new(cpu_window: u64, io_window: u64) -> Self {
        let blocks = [cpu_window, io_window]
            .into_iter()
            .flat_map(|window| [SLIM_OFFSET, SLIH_OFFSET, SLIV_OFFSET].map(|offset| window + offset))
            .map(|base| (base, BlockModel::default()))
            .collect();

        Self {
            blocks,
            registers: BTreeMap::new(),
            writes: Vec::new(),
            elapsed_us: 0,
        }
    }

    /// Both dies at their fixed chip addresses.
    #[must_use]
    pub fn soc() -> Self {
        Self::new(SLI_CPU_BASE, SLI_IO_BASE)
    }

    /// The model behind `block`, created on first use.
    pub fn block_mut(&mut self, block: RegisterBlock) -> &mut BlockModel {
        self.blocks.entry(block.base()).or_default()
    }

    #[must_use]
    pub fn block(&self, block: RegisterBlock) -> Option<&BlockModel> {
        self.blocks.get(&block.base())
    }

    /// Set a register without recording a write or triggering side effects.
    pub fn poke32(&mut self, address: u64, value: u32) {
        match self.locate_mut(address) {
            Some((block, offset)) => block.poke(offset, value),
            None => {
                self.registers.insert(address, value);
            }
        }
    }

    /// Typed [`DiePair::poke32`].
    pub fn preload<R: SliRegister>(&mut self, block: RegisterBlock, value: R) {
        self.poke32(block.register(R::OFFSET), value.into_raw());
    }

    /// Read a register without side effects.
    #[must_use]
    pub fn peek32(&self, address: u64) -> u32 {
        let base = block_base(address);
        self.blocks.get(&base).map_or_else(
            || self.registers.get(&address).copied().unwrap_or_default(),
            |block| block.peek(address - base),
        )
    }

    /// Typed [`DiePair::peek32`].
    #[must_use]
    pub fn peek<R: SliRegister>(&self, block: RegisterBlock) -> R {
        R::from_raw(self.peek32(block.register(R::OFFSET)))
    }

    /// Current pad delay of each lane of `block`.
    #[must_use]
    pub fn lane_taps(&self, block: RegisterBlock) -> [u8; 4] {
        let ctrl: sli_hw::SliCtrlIII = self.peek(block);
        core::array::from_fn(|lane| ctrl.pad_delay(lane))
    }

    /// Every write so far, oldest first.
    #[must_use]
    pub fn writes(&self) -> &[RegisterWrite] {
        &self.writes
    }

    /// Number of writes to `address`.
    #[must_use]
    pub fn writes_to(&self, address: u64) -> usize {
        self.writes.iter().filter(|w| w.address == address).count()
    }

    /// Number of writes to register `R` of `block`.
    #[must_use]
    pub fn writes_to_register<R: SliRegister>(&self, block: RegisterBlock) -> usize {
        self.writes_to(block.register(R::OFFSET))
    }

    /// Simulated time spent in [`Delay::delay_us`].
    #[must_use]
    pub const fn elapsed_us(&self) -> u64 {
        self.elapsed_us
    }

    fn locate_mut(&mut self, address: u64) -> Option<(&mut BlockModel, u64)> {
        let base = block_base(address);
        self.blocks.get_mut(&base).map(|block| (block, address - base))
    }
}

impl Default for DiePair {
    fn default() -> Self {
        Self::soc()
    }
}

impl Mmio for DiePair {
    fn read32(&mut self, address: u64) -> u32 {
        match self.locate_mut(address) {
            Some((block, offset)) => block.read(offset),
            None => self.registers.get(&address).copied().unwrap_or_default(),
        }
    }

    fn write32(&mut self, address: u64, value: u32) {
        self.writes.push(RegisterWrite { address, value });
        match self.locate_mut(address) {
            Some((block, offset)) => block.write(offset, value),
            None => {
                self.registers.insert(address, value);
            }
        }
    }
}

impl Delay for DiePair {
    fn delay_us(&mut self, us: u32) {
        self.elapsed_us += u64::from(us);
    }
}

const fn block_base(address: u64) -> u64 {
    address & !(SLI_BLOCK_SIZE - 1)
}
