use crate::SliRegister;
use bitfield_struct::bitfield;

/// `INTR_STATUS` (offset `0x14`): latched link events, write-1-to-clear.
#[bitfield(u32)]
#[derive(Eq, PartialEq)]
pub struct SliIntrStatus {
    /// Bit 0 — RX idle.
    pub rx_idle: bool,

    /// Bit 1 — RX suspended (trained and idle).
    pub rx_suspend: bool,

    /// Bit 2 — TX idle.
    pub tx_idle: bool,

    /// Bit 3 — TX sending training sequences.
    pub tx_train: bool,

    /// Bit 4 — TX suspended (trained and idle).
    pub tx_suspend: bool,

    /// Bit 5 — Reserved.
    _reserved_5: bool,

    /// Bit 6 — RX disconnected.
    pub rx_disconnect: bool,

    /// Bits 7–9 — Reserved.
    #[bits(3)]
    _reserved_7_9: u8,

    /// Bit 10 — RX received a training packet.
    pub rx_train_packet: bool,

    /// Bit 11 — Reserved.
    _reserved_11: bool,

    /// Bit 12 — RX NACK.
    pub rx_nack: bool,

    /// Bit 13 — RX error.
    pub rx_error: bool,

    /// Bit 14 — Reserved.
    _reserved_14: bool,

    /// Bit 15 — RX synchronized.
    pub rx_sync: bool,

    /// Bits 16–31 — Reserved.
    #[bits(16)]
    _reserved_16_31: u16,
}

impl SliIntrStatus {
    /// Value that clears every latched bit when written.
    pub const CLEAR_ALL: Self = Self::from_bits(u32::MAX);

    /// Any of the RX error indications (error, NACK, disconnect).
    #[must_use]
    pub const fn has_rx_errors(self) -> bool {
        self.rx_error() || self.rx_nack() || self.rx_disconnect()
    }

    /// Both directions report suspend, i.e. the link is trained and idle.
    #[must_use]
    pub const fn is_suspended(self) -> bool {
        self.tx_suspend() && self.rx_suspend()
    }
}

impl SliRegister for SliIntrStatus {
    const OFFSET: u64 = 0x14;

    #[inline]
    fn from_raw(raw: u32) -> Self {
        Self::from_bits(raw)
    }

    #[inline]
    fn into_raw(self) -> u32 {
        self.into_bits()
    }
}
