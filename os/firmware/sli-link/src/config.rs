//! # Training Configuration
//!
//! Timing constants that are hardware requirements, and the per-boot
//! [`TrainingConfig`] derived once from the chip revision and the requested
//! target PHY clock.

use crate::tap::DelayTap;
use sli_hw::{EngineClock, IoOscillator, PhyClock};

/// Settle time after every pad delay write. Hardware requirement.
pub const DELAY_SETTLE_US: u32 = 8;

/// Bound on a clear request before the channel is declared dead.
pub const CLEAR_TIMEOUT_US: u32 = 100;

/// Sleep between two polls of a bounded wait.
pub const POLL_INTERVAL_US: u32 = 1;

/// Bring-up reference rate before any oscillator adjustment.
pub const REFERENCE_HZ: u32 = sli_hw::osc::CRYSTAL_HZ;

/// First tap of the coarse sweep.
pub const TAP_MIN: DelayTap = DelayTap::ZERO;

/// End (exclusive) of the coarse sweep.
pub const TAP_MAX: u8 = 32;

/// Half-width of the per-lane fine sweep around the coarse value.
pub const FINE_WINDOW_RADIUS: u8 = 5;

/// `SLIH` tap used when the coarse sweep finds no pass.
pub const AHB_FALLBACK_TAP: DelayTap = tap(11);

/// `SLIM` fallback tap for targets latched on the positive edge.
pub const MEMORY_FALLBACK_TAP: DelayTap = tap(12);

/// `SLIM` fallback tap at 788/800 MHz (negative-edge latching).
pub const MEMORY_FALLBACK_TAP_NEGEDGE: DelayTap = tap(5);

/// I/O die oscillator setting for pre-production silicon: 25 MHz × 24 / 25.
pub const WORKAROUND_OSCILLATOR: IoOscillator = IoOscillator::new().with_multiplier(24).with_divisor(25);

const fn tap(value: u8) -> DelayTap {
    match DelayTap::new(value) {
        Some(tap) => tap,
        None => panic!("tap does not fit the pad delay field"),
    }
}

const _: () = {
    assert!(TAP_MAX <= sli_hw::ctrl3::PAD_DELAY_MAX + 1);
    assert!(AHB_FALLBACK_TAP.get() < TAP_MAX);
    assert!(MEMORY_FALLBACK_TAP.get() < TAP_MAX);
};

/// Silicon revision, as reported by the chip-revision collaborator.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ChipRevision {
    /// Pre-production silicon; requires the oscillator workaround.
    A0,
    A1,
}

impl ChipRevision {
    #[must_use]
    pub const fn needs_oscillator_workaround(self) -> bool {
        matches!(self, Self::A0)
    }
}

/// Final operating rate of the link.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum TargetPhyClock {
    /// Calibrate and run at the bring-up reference rate.
    StayAtReference,
    /// Speed up to the given PHY clock.
    SpeedUp(PhyClock),
}

impl TargetPhyClock {
    /// The PHY clock the link ends up on.
    #[must_use]
    pub const fn phy_clock(self) -> PhyClock {
        match self {
            Self::StayAtReference => PhyClock::Reference,
            Self::SpeedUp(clock) => clock,
        }
    }

    #[must_use]
    pub const fn is_speed_up(self) -> bool {
        !matches!(self, Self::StayAtReference | Self::SpeedUp(PhyClock::Reference))
    }
}

/// Taps applied when a coarse sweep finds no pass.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct FallbackTaps {
    pub ahb: DelayTap,
    pub memory: DelayTap,
}

impl FallbackTaps {
    #[must_use]
    pub const fn for_target(target: TargetPhyClock) -> Self {
        Self {
            ahb: AHB_FALLBACK_TAP,
            memory: if target.phy_clock().needs_negedge_latch() {
                MEMORY_FALLBACK_TAP_NEGEDGE
            } else {
                MEMORY_FALLBACK_TAP
            },
        }
    }
}

/// Everything the trainer needs to know about this boot.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct TrainingConfig {
    pub workaround_required: bool,
    pub target: TargetPhyClock,
    /// Engine clock used once the link leaves the reference rate.
    pub engine_clock: EngineClock,
    pub fallback: FallbackTaps,
    pub tap_min: DelayTap,
    /// End (exclusive) of every sweep.
    pub tap_max: u8,
    pub fine_window_radius: u8,
    pub clear_timeout_us: u32,
    /// Outer bound on suspend waits; `None` waits forever.
    pub suspend_deadline_us: Option<u32>,
}

impl TrainingConfig {
    #[must_use]
    pub const fn new(revision: ChipRevision, target: TargetPhyClock) -> Self {
        Self {
            workaround_required: revision.needs_oscillator_workaround(),
            target,
            engine_clock: EngineClock::Mhz500,
            fallback: FallbackTaps::for_target(target),
            tap_min: TAP_MIN,
            tap_max: TAP_MAX,
            fine_window_radius: FINE_WINDOW_RADIUS,
            clear_timeout_us: CLEAR_TIMEOUT_US,
            suspend_deadline_us: None,
        }
    }

    #[must_use]
    pub const fn with_suspend_deadline_us(mut self, deadline_us: u32) -> Self {
        self.suspend_deadline_us = Some(deadline_us);
        self
    }

    #[must_use]
    pub const fn with_clear_timeout_us(mut self, timeout_us: u32) -> Self {
        self.clear_timeout_us = timeout_us;
        self
    }

    /// Restrict sweeps to `[min, max)`.
    ///
    /// # Panics
    /// Panics if the range is empty or exceeds the pad delay field.
    #[must_use]
    pub const fn with_tap_range(mut self, min: DelayTap, max: u8) -> Self {
        assert!(min.get() < max, "empty tap range");
        assert!(max <= sli_hw::ctrl3::PAD_DELAY_MAX + 1, "tap range exceeds the field");
        self.tap_min = min;
        self.tap_max = max;
        self
    }
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self::new(ChipRevision::A1, TargetPhyClock::SpeedUp(PhyClock::Mhz400))
    }
}
