use crate::SliRegister;
use bitfield_struct::bitfield;

/// `CTRL_I` (offset `0x00`): link control and clear requests.
///
/// The clear and reset bits are self-clearing: software sets them, hardware
/// drops them once the corresponding logic has been flushed.
#[bitfield(u32)]
#[derive(Eq, PartialEq)]
pub struct SliCtrlI {
    /// Bit 0 — Reset trigger (self-clearing).
    pub reset_trigger: bool,

    /// Bit 1 — Clear TX path (self-clearing).
    pub clear_tx: bool,

    /// Bit 2 — Clear RX path (self-clearing).
    pub clear_rx: bool,

    /// Bits 3–4 — Reserved.
    #[bits(2)]
    _reserved_3_4: u8,

    /// Bit 5 — Transfer enable.
    pub transfer_enable: bool,

    /// Bit 6 — Clear bus logic and error counters (self-clearing).
    pub clear_bus: bool,

    /// Bit 7 — Reserved.
    _reserved_7: bool,

    /// Bit 8 — Auto-send training off.
    ///
    /// - 0: hardware retrains continuously on its own.
    /// - 1: retraining stopped; delay taps may be driven manually.
    pub auto_train_off: bool,

    /// Bits 9–11 — Reserved.
    #[bits(3)]
    _reserved_9_11: u8,

    /// Bit 12 — RX PHY latches on the negative clock edge.
    pub rx_latch_negedge: bool,

    /// Bit 13 — RX PHY latch order reversed.
    pub rx_latch_reversed: bool,

    /// Bit 14 — TX mode.
    pub tx_mode: bool,

    /// Bit 15 — Raw (bypass) mode; used by `SLIV`.
    pub raw_mode: bool,

    /// Bits 16–31 — Reserved.
    #[bits(16)]
    _reserved_16_31: u16,
}

impl SliCtrlI {
    /// Clear request bits for the bus logic and the receiver.
    pub const CLEAR_RX_BUS: Self = Self::new().with_clear_bus(true).with_clear_rx(true);

    /// Clear request bits for the whole channel datapath.
    pub const CLEAR_ALL: Self = Self::new()
        .with_clear_bus(true)
        .with_clear_rx(true)
        .with_clear_tx(true);

    /// Mask of every bit hardware deasserts on its own.
    pub const SELF_CLEARING: Self = Self::new()
        .with_reset_trigger(true)
        .with_clear_tx(true)
        .with_clear_rx(true)
        .with_clear_bus(true);

    /// The self-clearing bits of `mask`.
    #[must_use]
    pub const fn self_clearing(mask: Self) -> Self {
        Self::from_bits(mask.into_bits() & Self::SELF_CLEARING.into_bits())
    }

    /// `self` with every bit of `mask` set.
    #[must_use]
    pub const fn union(self, mask: Self) -> Self {
        Self::from_bits(self.into_bits() | mask.into_bits())
    }

    /// Whether any bit of `mask` is still set in `self`.
    #[must_use]
    pub const fn any_of(self, mask: Self) -> bool {
        self.into_bits() & mask.into_bits() != 0
    }
}

impl SliRegister for SliCtrlI {
    const OFFSET: u64 = 0x00;

    #[inline]
    fn from_raw(raw: u32) -> Self {
        Self::from_bits(raw)
    }

    #[inline]
    fn into_raw(self) -> u32 {
        self.into_bits()
    }
}
