//! # Delay Scanners
//!
//! Both scanners sweep ascending taps, program each one, clear the receiver and
//! bus logic, then take a single non-blocking sample of the link condition.
//!
//! ```text
//! tap:     0 1 2 3 4 5 6 7 8 9 ...
//! sample:  . . . P P P P P . ×      P = Suspended, × = sweep stops
//!                ^first    ^last
//! selected = floor((first + last) / 2)
//! ```
//!
//! The pass region is assumed to be one contiguous run: the sweep stops at the
//! first failing tap after a pass. A disjoint second run further up is never
//! seen.
//!
//! An RX error during a sweep just fails that tap. Only a clear request that
//! never completes aborts the scan.

use crate::channel::ChannelRegs;
use crate::config::TrainingConfig;
use crate::detect::{LinkCondition, poll_condition};
use crate::error::LinkError;
use crate::reset::clear_and_wait;
use crate::tap::{CalibrationWindow, DelayTap};
use log::{debug, trace, warn};
use sli_hw::{Delay, Mmio, SliCtrlI};

/// Sweep bounds shared by both scanners.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Sweep {
    pub tap_min: DelayTap,
    /// End of the sweep, exclusive.
    pub tap_max: u8,
    pub clear_timeout_us: u32,
}

impl Sweep {
    #[must_use]
    pub const fn from_config(config: &TrainingConfig) -> Self {
        Self {
            tap_min: config.tap_min,
            tap_max: config.tap_max,
            clear_timeout_us: config.clear_timeout_us,
        }
    }

    /// Taps of `[start, end)`, clipped to the representable range.
    fn taps(start: u8, end: u8) -> impl Iterator<Item = DelayTap> {
        (start..end).filter_map(DelayTap::new)
    }
}

/// Outcome of one sweep.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct ScanResult {
    pub window: CalibrationWindow,
    /// The tap left programmed (coarse) or to be programmed (fine).
    pub selected: DelayTap,
    /// No pass was seen; `selected` is the fallback value.
    pub fell_back: bool,
}

impl ScanResult {
    fn select(window: CalibrationWindow, fallback: DelayTap) -> Self {
        match window.midpoint() {
            Some(selected) => Self {
                window,
                selected,
                fell_back: false,
            },
            None => Self {
                window,
                selected: fallback,
                fell_back: true,
            },
        }
    }
}

/// Sweep one shared tap across every RX lane of the block.
///
/// Falls back to `fallback` if nothing passes. The selected tap is programmed
/// and the block cleared before returning.
///
/// # Errors
/// [`LinkError::ClearTimeout`] if a clear request never completes.
pub fn coarse_scan<P: Mmio + Delay>(
    regs: &mut ChannelRegs<'_, P>,
    sweep: Sweep,
    fallback: DelayTap,
) -> Result<ScanResult, LinkError> {
    let mut window = CalibrationWindow::EMPTY;
    for tap in Sweep::taps(sweep.tap_min.get(), sweep.tap_max) {
        regs.set_shared_delay(tap);
        let passed = sample(regs, sweep.clear_timeout_us)?;
        trace!("{}: shared tap {tap}: {}", regs.channel(), verdict(passed));
        if !passed && window.has_pass() {
            break;
        }
        window.record(tap, passed);
    }

    let result = ScanResult::select(window, fallback);
    if result.fell_back {
        warn!(
            "{}: no passing tap in [{}, {}), falling back to {}",
            regs.channel(),
            sweep.tap_min,
            sweep.tap_max,
            fallback
        );
    } else {
        debug!(
            "{}: pass window {window}, selected {}",
            regs.channel(),
            result.selected
        );
    }

    regs.set_shared_delay(result.selected);
    clear_and_wait(regs, SliCtrlI::CLEAR_RX_BUS, sweep.clear_timeout_us)?;
    Ok(result)
}

/// Sweep `lane` alone in `[max(coarse - radius, 0), min(coarse + radius, tap_max))`.
///
/// Every other lane stays at `coarse`; the swept lane is restored to `coarse`
/// before returning, so the result is applied by the caller. Falls back to
/// `coarse` if nothing passes.
///
/// # Errors
/// [`LinkError::ClearTimeout`] if a clear request never completes.
pub fn fine_scan<P: Mmio + Delay>(
    regs: &mut ChannelRegs<'_, P>,
    sweep: Sweep,
    lane: usize,
    coarse: DelayTap,
    radius: u8,
) -> Result<ScanResult, LinkError> {
    let start = coarse.get().saturating_sub(radius);
    let end = coarse.get().saturating_add(radius).min(sweep.tap_max);

    let mut window = CalibrationWindow::EMPTY;
    for tap in Sweep::taps(start, end) {
        regs.set_lane_delay(lane, tap);
        let passed = sample(regs, sweep.clear_timeout_us)?;
        trace!("{}: lane {lane} tap {tap}: {}", regs.channel(), verdict(passed));
        if !passed && window.has_pass() {
            break;
        }
        window.record(tap, passed);
    }

    let result = ScanResult::select(window, coarse);
    if result.fell_back {
        warn!(
            "{}: lane {lane} has no passing tap in [{start}, {end}), keeping {coarse}",
            regs.channel()
        );
    } else {
        debug!(
            "{}: lane {lane} pass window {window}, selected {}",
            regs.channel(),
            result.selected
        );
    }

    regs.set_lane_delay(lane, coarse);
    clear_and_wait(regs, SliCtrlI::CLEAR_RX_BUS, sweep.clear_timeout_us)?;
    Ok(result)
}

/// Clear RX and bus, then take one sample.
fn sample<P: Mmio + Delay>(regs: &mut ChannelRegs<'_, P>, clear_timeout_us: u32) -> Result<bool, LinkError> {
    clear_and_wait(regs, SliCtrlI::CLEAR_RX_BUS, clear_timeout_us)?;
    Ok(poll_condition(regs) == LinkCondition::Suspended)
}

const fn verdict(passed: bool) -> &'static str {
    if passed { "pass" } else { "fail" }
}
