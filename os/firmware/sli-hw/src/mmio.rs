use crate::Mmio;

/// Volatile 32-bit access to identity-mapped device memory.
#[derive(Debug)]
pub struct VolatileMmio {
    _private: (),
}

impl VolatileMmio {
    /// # Safety
    /// Every address passed to [`Mmio::read32`] / [`Mmio::write32`] must be a
    /// 4-byte aligned, identity-mapped device register, and no other code may
    /// access the SLI register blocks while this value exists.
    #[must_use]
    pub const unsafe fn new() -> Self {
        Self { _private: () }
    }
}

impl Mmio for VolatileMmio {
    #[inline]
    #[allow(clippy::cast_possible_truncation)]
    fn read32(&mut self, address: u64) -> u32 {
        let ptr = address as usize as *const u32;
        // SAFETY: upheld by the contract of `VolatileMmio::new`.
        unsafe { core::ptr::read_volatile(ptr) }
    }

    #[inline]
    #[allow(clippy::cast_possible_truncation)]
    fn write32(&mut self, address: u64, value: u32) {
        let ptr = address as usize as *mut u32;
        // SAFETY: upheld by the contract of `VolatileMmio::new`.
        unsafe { core::ptr::write_volatile(ptr, value) }
    }
}
