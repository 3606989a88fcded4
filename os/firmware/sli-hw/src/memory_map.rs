//! # Chip Memory Map
//!
//! Physical placement of the SLI register blocks. Each die carries one SLI
//! controller window holding the three channel blocks at fixed offsets:
//!
//! ```text
//! SLI window (CPU die: 0x12C1_7000, I/O die: 0x14C1_E000)
//!   + 0x000  SLIM  memory bus, 4 RX lanes
//!   + 0x200  SLIH  AHB bus, 2 RX lanes
//!   + 0x400  SLIV  video bus, raw mode only
//! ```

/// SLI controller window on the CPU die.
pub const SLI_CPU_BASE: u64 = 0x12C1_7000;

/// SLI controller window on the I/O die.
///
/// Accesses to this window travel over the `SLIH` link itself.
pub const SLI_IO_BASE: u64 = 0x14C1_E000;

/// Offset of the memory-class block (`SLIM`) inside an SLI window.
pub const SLIM_OFFSET: u64 = 0x000;

/// Offset of the AHB-class block (`SLIH`) inside an SLI window.
pub const SLIH_OFFSET: u64 = 0x200;

/// Offset of the video-class block (`SLIV`) inside an SLI window.
pub const SLIV_OFFSET: u64 = 0x400;

/// Size of one channel block.
pub const SLI_BLOCK_SIZE: u64 = 0x200;

/// I/O die system control unit, home of the local oscillator register.
pub const IO_SCU_BASE: u64 = 0x14C0_2000;

const _: () = {
    assert!(SLIH_OFFSET - SLIM_OFFSET == SLI_BLOCK_SIZE);
    assert!(SLIV_OFFSET - SLIH_OFFSET == SLI_BLOCK_SIZE);
    assert!(SLI_CPU_BASE.is_multiple_of(0x1000));
    assert!(SLI_IO_BASE.is_multiple_of(0x1000));
};

/// Base address of one register block.
#[repr(transparent)]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct RegisterBlock(u64);

impl RegisterBlock {
    #[inline]
    #[must_use]
    pub const fn new(base: u64) -> Self {
        Self(base)
    }

    #[inline]
    #[must_use]
    pub const fn base(self) -> u64 {
        self.0
    }

    /// Absolute address of the register at `offset`.
    #[inline]
    #[must_use]
    pub const fn register(self, offset: u64) -> u64 {
        self.0 + offset
    }

    /// The block located `by` bytes past this one.
    #[inline]
    #[must_use]
    pub const fn offset(self, by: u64) -> Self {
        Self(self.0 + by)
    }
}

impl core::fmt::LowerHex for RegisterBlock {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::LowerHex::fmt(&self.0, f)
    }
}

/// The I/O die system control unit block.
pub const IO_SCU: RegisterBlock = RegisterBlock::new(IO_SCU_BASE);
