use core::hint::spin_loop;

/// Microsecond busy-wait source.
///
/// The SLI runs before any timer interrupt exists, so every wait is a blocking
/// spin of a known length.
pub trait Delay {
    fn delay_us(&mut self, us: u32);
}

impl<T: Delay + ?Sized> Delay for &mut T {
    #[inline]
    fn delay_us(&mut self, us: u32) {
        (**self).delay_us(us);
    }
}

/// Spin loop calibrated in iterations per microsecond.
///
/// The calibration is board-specific; derive it from the boot CPU clock.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct SpinDelay {
    loops_per_us: u32,
}

impl SpinDelay {
    #[must_use]
    pub const fn new(loops_per_us: u32) -> Self {
        Self { loops_per_us }
    }
}

impl Delay for SpinDelay {
    fn delay_us(&mut self, us: u32) {
        let loops = u64::from(us) * u64::from(self.loops_per_us);
        for _ in 0..loops {
            spin_loop();
        }
    }
}
