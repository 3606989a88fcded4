//! # Reset/Clear Primitive

use crate::channel::ChannelRegs;
use crate::config::POLL_INTERVAL_US;
use crate::error::LinkError;
use log::trace;
use sli_hw::{Delay, Mmio, SliCtrlI};

/// Assert the clear requests in `mask` and wait for hardware to drop them.
///
/// Only the control register is polled. The wait gives up once `timeout_us`
/// have elapsed, sleeping [`POLL_INTERVAL_US`] between polls; the returned
/// error is fatal to the caller.
///
/// # Errors
/// [`LinkError::ClearTimeout`] if the self-clearing bits of `mask` are still
/// set after `timeout_us`.
pub fn clear_and_wait<P: Mmio + Delay>(
    regs: &mut ChannelRegs<'_, P>,
    mask: SliCtrlI,
    timeout_us: u32,
) -> Result<(), LinkError> {
    let pending = SliCtrlI::self_clearing(mask);
    regs.assert_clear(mask);

    let mut waited_us = 0;
    loop {
        if !regs.read_control().any_of(pending) {
            trace!("{}: clear {:#06x} done after {waited_us} us", regs.channel(), mask.into_bits());
            return Ok(());
        }
        if waited_us >= timeout_us {
            return Err(LinkError::ClearTimeout {
                channel: regs.channel(),
                mask: mask.into_bits(),
                waited_us,
            });
        }
        regs.delay_us(POLL_INTERVAL_US);
        waited_us += POLL_INTERVAL_US;
    }
}
