use crate::{Delay, Mmio};

/// A platform made of one register accessor and one delay source.
#[derive(Debug)]
pub struct Board<M, D> {
    pub mmio: M,
    pub delay: D,
}

impl<M, D> Board<M, D> {
    pub const fn new(mmio: M, delay: D) -> Self {
        Self { mmio, delay }
    }
}

impl<M: Mmio, D> Mmio for Board<M, D> {
    #[inline]
    fn read32(&mut self, address: u64) -> u32 {
        self.mmio.read32(address)
    }

    #[inline]
    fn write32(&mut self, address: u64, value: u32) {
        self.mmio.write32(address, value);
    }
}

impl<M, D: Delay> Delay for Board<M, D> {
    #[inline]
    fn delay_us(&mut self, us: u32) {
        self.delay.delay_us(us);
    }
}
