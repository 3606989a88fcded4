use core::fmt::{self, Write};

/// Board hook that emits one byte on the boot console.
pub type PutC = fn(u8);

/// A `core::fmt::Write` adapter over a [`PutC`] hook.
///
/// Line feeds go out as `\r\n`; serial terminals expect both.
pub struct ConsoleSink {
    putc: PutC,
}

impl ConsoleSink {
    #[must_use]
    pub const fn new(putc: PutC) -> Self {
        Self { putc }
    }
}

impl Write for ConsoleSink {
    #[inline]
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for b in s.bytes() {
            if b == b'\n' {
                (self.putc)(b'\r');
            }
            (self.putc)(b);
        }
        Ok(())
    }
}

/// Format `args` straight onto the console.
#[cfg(feature = "enabled")]
#[inline]
pub fn console_write(putc: PutC, args: fmt::Arguments<'_>) {
    // Best-effort; a console has nowhere to report its own failure.
    let _ = ConsoleSink::new(putc).write_fmt(args);
}

#[cfg(not(feature = "enabled"))]
#[inline]
pub const fn console_write(_: PutC, _: fmt::Arguments<'_>) {
    // no-op when feature disabled
}
