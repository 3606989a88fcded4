//! # Clock-Stepping Controller
//!
//! Moves the link from the fixed bring-up reference to the target PHY clock.
//!
//! ```text
//! reference (25 MHz, raw) ──[oscillator workaround]──► auto-train off
//!     ──► engine clock 500 MHz ──► I/O die PHY clock ──► CPU die PHY clock
//! ```
//!
//! Clock transitions only ever go up and happen at most once per boot. Once the
//! I/O die PHY clock has been switched, the I/O die registers are reached
//! through the link at its new rate; nothing here re-reads them at the old one.

use crate::channel::{ChannelGroups, ChannelRole};
use crate::config::{REFERENCE_HZ, TargetPhyClock, TrainingConfig, WORKAROUND_OSCILLATOR};
use crate::detect::wait_for_suspend_bounded;
use crate::error::LinkError;
use crate::reset::clear_and_wait;
use log::{debug, info, warn};
use sli_hw::memory_map::IO_SCU;
use sli_hw::{Delay, EngineClock, Mmio, PhyClock, SliCtrlI};

/// The clocks the link currently runs on.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct ClockProfile {
    /// Rate behind [`PhyClock::Reference`].
    pub reference_hz: u32,
    pub engine_clock: EngineClock,
    pub phy_clock: PhyClock,
}

impl ClockProfile {
    /// Clocks right after power-on.
    #[must_use]
    pub const fn bring_up() -> Self {
        Self {
            reference_hz: REFERENCE_HZ,
            engine_clock: EngineClock::Reference,
            phy_clock: PhyClock::Reference,
        }
    }

    #[must_use]
    pub const fn phy_rate_hz(&self) -> u32 {
        self.phy_clock.rate_hz(self.reference_hz)
    }
}

impl Default for ClockProfile {
    fn default() -> Self {
        Self::bring_up()
    }
}

/// Owner of the clock state for one training run.
#[derive(Debug)]
pub struct ClockStepper {
    profile: ClockProfile,
    oscillator_adjusted: bool,
}

impl ClockStepper {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            profile: ClockProfile::bring_up(),
            oscillator_adjusted: false,
        }
    }

    #[must_use]
    pub const fn profile(&self) -> ClockProfile {
        self.profile
    }

    #[must_use]
    pub const fn oscillator_adjusted(&self) -> bool {
        self.oscillator_adjusted
    }

    /// Bring every block up at the reference clock and wait for the AHB link.
    ///
    /// Video blocks are put into raw mode. Every block is cleared, then both
    /// `SLIH` instances must suspend.
    ///
    /// # Errors
    /// A stuck clear request, RX errors on the AHB link, or an expired suspend
    /// deadline.
    pub fn bring_up<P: Mmio + Delay>(
        &mut self,
        platform: &mut P,
        groups: &ChannelGroups,
        config: &TrainingConfig,
    ) -> Result<(), LinkError> {
        for channel in groups.all() {
            let mut regs = channel.bind(platform);
            regs.select_reference_clocks();
            regs.set_raw_mode(channel.role() == ChannelRole::Video);
            regs.set_transfer_enable(true);
        }
        debug!("all SLI blocks at the {} Hz reference", self.profile.reference_hz);

        for channel in groups.all() {
            clear_and_wait(&mut channel.bind(platform), SliCtrlI::CLEAR_ALL, config.clear_timeout_us)?;
        }

        for channel in [groups.ahb_io, groups.ahb_cpu] {
            wait_for_suspend_bounded(&mut channel.bind(platform), config.suspend_deadline_us)?;
            debug!("{channel}: suspended at reference rate");
        }
        Ok(())
    }

    /// Rewrite the I/O die local oscillator for pre-production silicon.
    ///
    /// Applied at most once; returns the revised reference rate, or `None` if
    /// the adjustment had already been made.
    pub fn apply_oscillator_workaround<P: Mmio>(&mut self, platform: &mut P) -> Option<u32> {
        if self.oscillator_adjusted {
            warn!("oscillator workaround already applied");
            return None;
        }

        platform.store(IO_SCU, WORKAROUND_OSCILLATOR);
        self.oscillator_adjusted = true;
        if let Some(hz) = WORKAROUND_OSCILLATOR.rate_hz() {
            self.profile.reference_hz = hz;
        }
        info!(
            "I/O die oscillator set to {}/{}, reference now {} Hz",
            WORKAROUND_OSCILLATOR.multiplier(),
            WORKAROUND_OSCILLATOR.divisor(),
            self.profile.reference_hz
        );
        Some(self.profile.reference_hz)
    }

    /// Enable or stop continuous retraining on every calibrated block.
    pub fn set_auto_train<P: Mmio + Delay>(platform: &mut P, groups: &ChannelGroups, enabled: bool) {
        for channel in groups.calibrated() {
            channel.bind(platform).set_auto_train(enabled);
        }
        debug!("auto-training {}", if enabled { "on" } else { "off" });
    }

    /// Switch engine and PHY clocks to the target rate.
    ///
    /// Returns `false` and leaves the clocks alone if the target is the
    /// reference rate or the switch would not be a one-time speed-up.
    pub fn speed_up<P: Mmio + Delay>(
        &mut self,
        platform: &mut P,
        groups: &ChannelGroups,
        config: &TrainingConfig,
    ) -> bool {
        let TargetPhyClock::SpeedUp(target) = config.target else {
            return false;
        };
        let from_hz = self.profile.phy_rate_hz();
        let to_hz = target.rate_hz(self.profile.reference_hz);
        if self.profile.phy_clock != PhyClock::Reference || to_hz <= from_hz {
            warn!("refusing PHY clock change {from_hz} Hz -> {to_hz} Hz");
            return false;
        }

        for channel in groups.calibrated() {
            channel.bind(platform).set_engine_clock(config.engine_clock);
        }
        self.profile.engine_clock = config.engine_clock;

        if target.needs_negedge_latch() {
            for channel in [groups.memory_io, groups.memory_cpu] {
                channel.bind(platform).set_rx_latch_negedge(true);
            }
        }

        // Far side first: these writes still travel at the old rate.
        for channel in [groups.ahb_io, groups.memory_io] {
            channel.bind(platform).set_phy_clock(target);
        }
        for channel in [groups.ahb_cpu, groups.memory_cpu] {
            channel.bind(platform).set_phy_clock(target);
        }
        self.profile.phy_clock = target;

        info!("SLI PHY clock {from_hz} Hz -> {to_hz} Hz");
        true
    }
}

impl Default for ClockStepper {
    fn default() -> Self {
        Self::new()
    }
}
