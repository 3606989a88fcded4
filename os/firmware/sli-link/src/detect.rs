//! # Link-State Detector
//!
//! Classifies the interrupt status of a channel block:
//!
//! | RX error bits | TX+RX suspend | Condition   |
//! |:-------------:|:-------------:|:------------|
//! | set           | any           | `Errored`   |
//! | clear         | both set      | `Suspended` |
//! | clear         | otherwise     | `Training`  |

use crate::channel::ChannelRegs;
use crate::config::POLL_INTERVAL_US;
use crate::error::LinkError;
use core::hint::spin_loop;
use sli_hw::{Delay, Mmio, SliIntrStatus};

/// Link condition derived from one status read.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum LinkCondition {
    /// Still negotiating.
    Training,
    /// Both directions trained and idle; the link is usable.
    Suspended,
    /// RX error bits latched.
    Errored,
}

impl LinkCondition {
    /// Classify a status value; RX errors dominate the suspend bits.
    #[must_use]
    pub const fn classify(status: SliIntrStatus) -> Self {
        if status.has_rx_errors() {
            Self::Errored
        } else if status.is_suspended() {
            Self::Suspended
        } else {
            Self::Training
        }
    }
}

/// Clear the latched status, then sample the link once.
pub fn poll_condition<P: Mmio + Delay>(regs: &mut ChannelRegs<'_, P>) -> LinkCondition {
    regs.clear_interrupt_status();
    LinkCondition::classify(regs.read_status())
}

/// Spin until the link suspends.
///
/// Does not time out: a correctly clocked link always settles. Use
/// [`wait_for_suspend_within`] where a bound is required.
///
/// # Errors
/// [`LinkError::Errored`] as soon as RX errors are latched.
pub fn wait_for_suspend<P: Mmio + Delay>(regs: &mut ChannelRegs<'_, P>) -> Result<(), LinkError> {
    regs.clear_interrupt_status();
    loop {
        let status = regs.read_status();
        match LinkCondition::classify(status) {
            LinkCondition::Suspended => return Ok(()),
            LinkCondition::Errored => return Err(errored(regs, status)),
            LinkCondition::Training => spin_loop(),
        }
    }
}

/// [`wait_for_suspend`] bounded by `deadline_us`.
///
/// # Errors
/// [`LinkError::Errored`] on RX errors, [`LinkError::SuspendTimeout`] once the
/// deadline has passed.
pub fn wait_for_suspend_within<P: Mmio + Delay>(
    regs: &mut ChannelRegs<'_, P>,
    deadline_us: u32,
) -> Result<(), LinkError> {
    regs.clear_interrupt_status();
    let mut waited_us = 0;
    loop {
        let status = regs.read_status();
        match LinkCondition::classify(status) {
            LinkCondition::Suspended => return Ok(()),
            LinkCondition::Errored => return Err(errored(regs, status)),
            LinkCondition::Training if waited_us >= deadline_us => {
                return Err(LinkError::SuspendTimeout {
                    channel: regs.channel(),
                    waited_us,
                });
            }
            LinkCondition::Training => {
                regs.delay_us(POLL_INTERVAL_US);
                waited_us += POLL_INTERVAL_US;
            }
        }
    }
}

/// Wait for suspend, bounded only if `deadline_us` is set.
pub(crate) fn wait_for_suspend_bounded<P: Mmio + Delay>(
    regs: &mut ChannelRegs<'_, P>,
    deadline_us: Option<u32>,
) -> Result<(), LinkError> {
    match deadline_us {
        Some(deadline_us) => wait_for_suspend_within(regs, deadline_us),
        None => wait_for_suspend(regs),
    }
}

fn errored<P: Mmio + Delay>(regs: &ChannelRegs<'_, P>, status: SliIntrStatus) -> LinkError {
    LinkError::Errored {
        channel: regs.channel(),
        status: status.into_bits(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(error: bool, suspend: bool) -> SliIntrStatus {
        SliIntrStatus::new()
            .with_rx_error(error)
            .with_tx_suspend(suspend)
            .with_rx_suspend(suspend)
    }

    #[test]
    fn error_bit_dominates_suspend() {
        assert_eq!(LinkCondition::classify(status(false, false)), LinkCondition::Training);
        assert_eq!(LinkCondition::classify(status(false, true)), LinkCondition::Suspended);
        assert_eq!(LinkCondition::classify(status(true, false)), LinkCondition::Errored);
        assert_eq!(LinkCondition::classify(status(true, true)), LinkCondition::Errored);
    }

    #[test]
    fn one_sided_suspend_is_still_training() {
        let tx_only = SliIntrStatus::new().with_tx_suspend(true);
        assert_eq!(LinkCondition::classify(tx_only), LinkCondition::Training);
    }

    #[test]
    fn nack_and_disconnect_count_as_errors() {
        let nack = status(false, true).with_rx_nack(true);
        let disconnect = status(false, false).with_rx_disconnect(true);
        assert_eq!(LinkCondition::classify(nack), LinkCondition::Errored);
        assert_eq!(LinkCondition::classify(disconnect), LinkCondition::Errored);
    }
}
