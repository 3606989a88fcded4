use crate::SliRegister;
use bitfield_struct::bitfield;

/// Frequency of the board crystal feeding the I/O die local oscillator.
pub const CRYSTAL_HZ: u32 = 25_000_000;

/// I/O die local oscillator control (I/O SCU offset `0x310`).
///
/// The SLI reference clock is `CRYSTAL_HZ × multiplier / divisor`. Both
/// fields reset to 1, i.e. the reference runs at the crystal rate.
#[bitfield(u32)]
#[derive(Eq, PartialEq)]
pub struct IoOscillator {
    /// Bits 0–11 — Feedback multiplier.
    #[bits(12)]
    pub multiplier: u16,

    /// Bits 12–17 — Output divisor.
    #[bits(6)]
    pub divisor: u8,

    /// Bits 18–31 — Reserved.
    #[bits(14)]
    _reserved_18_31: u16,
}

impl IoOscillator {
    /// Output rate in Hz; `None` while the divisor is zero.
    #[must_use]
    pub fn rate_hz(self) -> Option<u32> {
        if self.divisor() == 0 {
            return None;
        }
        let hz = u64::from(CRYSTAL_HZ) * u64::from(self.multiplier()) / u64::from(self.divisor());
        u32::try_from(hz).ok()
    }
}

impl SliRegister for IoOscillator {
    const OFFSET: u64 = 0x310;

    #[inline]
    fn from_raw(raw: u32) -> Self {
        Self::from_bits(raw)
    }

    #[inline]
    fn into_raw(self) -> u32 {
        self.into_bits()
    }
}
