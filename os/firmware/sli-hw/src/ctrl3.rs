use crate::SliRegister;
use bitfield_struct::bitfield;

/// Width of one pad delay field in bits.
pub const PAD_DELAY_BITS: u32 = 6;

/// Largest value a pad delay field can hold.
pub const PAD_DELAY_MAX: u8 = (1 << PAD_DELAY_BITS) - 1;

/// Number of pad delay fields in `CTRL_III`.
pub const PAD_DELAY_FIELDS: usize = 4;

/// `CTRL_III` (offset `0x08`): pad delays and clock selection.
///
/// The meaning of the four delay fields depends on the block:
///
/// | Field | `SLIM` | `SLIH` |
/// |:------|:-------|:-------|
/// | 0     | RX lane 0 | RX lane 0 |
/// | 1     | RX lane 1 | RX lane 1 |
/// | 2     | RX lane 2 | TX lane 0 |
/// | 3     | RX lane 3 | TX lane 1 |
///
/// The PHY clock select field survives a warm reset, which makes it the
/// "already trained" marker for the current power cycle.
#[bitfield(u32)]
#[derive(Eq, PartialEq)]
pub struct SliCtrlIII {
    /// Bits 0–5 — Pad delay field 0.
    #[bits(6)]
    pub pad_delay_0: u8,

    /// Bits 6–11 — Pad delay field 1.
    #[bits(6)]
    pub pad_delay_1: u8,

    /// Bits 12–17 — Pad delay field 2.
    #[bits(6)]
    pub pad_delay_2: u8,

    /// Bits 18–23 — Pad delay field 3.
    #[bits(6)]
    pub pad_delay_3: u8,

    /// Bits 24–27 — PHY clock select, see [`PhyClock`].
    #[bits(4)]
    pub phy_clock_select: u8,

    /// Bits 28–31 — Engine clock select, see [`EngineClock`].
    #[bits(4)]
    pub engine_clock_select: u8,
}

impl SliCtrlIII {
    /// Pad delay field `index` (`0..4`).
    ///
    /// # Panics
    /// Panics if `index` is out of range.
    #[must_use]
    pub const fn pad_delay(self, index: usize) -> u8 {
        match index {
            0 => self.pad_delay_0(),
            1 => self.pad_delay_1(),
            2 => self.pad_delay_2(),
            3 => self.pad_delay_3(),
            _ => panic!("pad delay index out of range"),
        }
    }

    /// `self` with pad delay field `index` replaced by `value`.
    ///
    /// # Panics
    /// Panics if `index` is out of range or `value` exceeds [`PAD_DELAY_MAX`].
    #[must_use]
    pub const fn with_pad_delay(self, index: usize, value: u8) -> Self {
        match index {
            0 => self.with_pad_delay_0(value),
            1 => self.with_pad_delay_1(value),
            2 => self.with_pad_delay_2(value),
            3 => self.with_pad_delay_3(value),
            _ => panic!("pad delay index out of range"),
        }
    }

    /// Decoded PHY clock, `None` for a reserved selector.
    #[must_use]
    pub const fn phy_clock(self) -> Option<PhyClock> {
        PhyClock::from_select(self.phy_clock_select())
    }

    /// Decoded engine clock, `None` for a reserved selector.
    #[must_use]
    pub const fn engine_clock(self) -> Option<EngineClock> {
        EngineClock::from_select(self.engine_clock_select())
    }
}

impl SliRegister for SliCtrlIII {
    const OFFSET: u64 = 0x08;

    #[inline]
    fn from_raw(raw: u32) -> Self {
        Self::from_bits(raw)
    }

    #[inline]
    fn into_raw(self) -> u32 {
        self.into_bits()
    }
}

/// PHY (bit-rate) clock selection.
#[repr(u8)]
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum PhyClock {
    /// The bring-up reference clock, 25 MHz unless revised by the
    /// I/O die oscillator workaround.
    Reference = 0x0,
    Mhz800 = 0x1,
    Mhz400 = 0x2,
    Mhz200 = 0x3,
    Mhz788 = 0x5,
    Mhz500 = 0x6,
    Mhz250 = 0x7,
}

impl PhyClock {
    #[must_use]
    pub const fn from_select(select: u8) -> Option<Self> {
        Some(match select {
            0x0 => Self::Reference,
            0x1 => Self::Mhz800,
            0x2 => Self::Mhz400,
            0x3 => Self::Mhz200,
            0x5 => Self::Mhz788,
            0x6 => Self::Mhz500,
            0x7 => Self::Mhz250,
            _ => return None,
        })
    }

    #[must_use]
    pub const fn select(self) -> u8 {
        self as u8
    }

    /// Bit rate in Hz; the reference selector runs at `reference_hz`.
    #[must_use]
    pub const fn rate_hz(self, reference_hz: u32) -> u32 {
        match self {
            Self::Reference => reference_hz,
            Self::Mhz800 => 800_000_000,
            Self::Mhz400 => 400_000_000,
            Self::Mhz200 => 200_000_000,
            Self::Mhz788 => 788_000_000,
            Self::Mhz500 => 500_000_000,
            Self::Mhz250 => 250_000_000,
        }
    }

    /// Whether the memory bus receiver must latch on the negative edge at
    /// this rate.
    #[must_use]
    pub const fn needs_negedge_latch(self) -> bool {
        matches!(self, Self::Mhz800 | Self::Mhz788)
    }
}

/// SLI engine (core logic) clock selection.
#[repr(u8)]
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum EngineClock {
    Reference = 0x0,
    Mhz200 = 0x3,
    Mhz500 = 0x6,
}

impl EngineClock {
    #[must_use]
    pub const fn from_select(select: u8) -> Option<Self> {
        Some(match select {
            0x0 => Self::Reference,
            0x3 => Self::Mhz200,
            0x6 => Self::Mhz500,
            _ => return None,
        })
    }

    #[must_use]
    pub const fn select(self) -> u8 {
        self as u8
    }
}
