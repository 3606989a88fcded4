//! # Training Orchestrator
//!
//! ```text
//! Uninitialized ─┬─ already at target ──────────────────────────────► Linked
//!                └► LowSpeedBringup ─► [Workaround] ─┬► AutoTrainOff ─► SpeedUp ─┐
//!                                                    └───── reference target ────┤
//!                   ┌────────────────────────────────────────────────────────────┘
//!                   └► CalibrateAhb ─► CalibrateMemory ─► AutoTrainOn ─► Linked
//!
//! any failing step ─► Aborted
//! ```
//!
//! The entry guard looks at the PHY clock select of the I/O die `SLIH` block:
//! it survives warm resets and only reaches the target value after a completed
//! speed-up, so a match means this power cycle is already trained.

use crate::channel::{ChannelGroup, ChannelGroups};
use crate::clock::{ClockProfile, ClockStepper};
use crate::config::TrainingConfig;
use crate::detect::wait_for_suspend_bounded;
use crate::error::{LinkError, TrainError};
use crate::reset::clear_and_wait;
use crate::scan::{ScanResult, Sweep, coarse_scan, fine_scan};
use crate::tap::DelayTap;
use core::fmt;
use log::{debug, error, info};
use sli_hw::{Delay, Mmio, SliCtrlI};

/// Number of independently delayed lanes on the memory bus.
pub const MEMORY_LANES: usize = 4;

/// Orchestrator state.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum TrainingState {
    Uninitialized,
    LowSpeedBringup,
    Workaround,
    AutoTrainOff,
    SpeedUp,
    CalibrateAhb,
    CalibrateMemory,
    AutoTrainOn,
    Linked,
    Aborted,
}

impl TrainingState {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::LowSpeedBringup => "low-speed bring-up",
            Self::Workaround => "oscillator workaround",
            Self::AutoTrainOff => "auto-train off",
            Self::SpeedUp => "speed-up",
            Self::CalibrateAhb => "SLIH calibration",
            Self::CalibrateMemory => "SLIM calibration",
            Self::AutoTrainOn => "auto-train on",
            Self::Linked => "linked",
            Self::Aborted => "aborted",
        }
    }

    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Linked | Self::Aborted)
    }
}

impl fmt::Display for TrainingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What a completed calibration settled on.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct CalibrationReport {
    pub clocks: ClockProfile,
    pub workaround_applied: bool,
    pub ahb: ScanResult,
    pub memory_coarse: ScanResult,
    pub memory_lanes: [ScanResult; MEMORY_LANES],
}

impl CalibrationReport {
    /// Final per-lane memory bus taps.
    #[must_use]
    pub fn memory_taps(&self) -> [DelayTap; MEMORY_LANES] {
        self.memory_lanes.map(|lane| lane.selected)
    }
}

/// Successful outcome of [`train_links`].
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Linked {
    /// The persisted clock select already showed the target; nothing was done.
    AlreadyTrained,
    Calibrated(CalibrationReport),
}

/// Results gathered while the state machine runs.
#[derive(Debug, Default)]
struct Progress {
    ahb: Option<ScanResult>,
    memory_coarse: Option<ScanResult>,
    memory_lanes: Option<[ScanResult; MEMORY_LANES]>,
}

/// The SLI training state machine.
pub struct SliTrainer<'p, P> {
    platform: &'p mut P,
    groups: ChannelGroups,
    config: TrainingConfig,
    clocks: ClockStepper,
    state: TrainingState,
    progress: Progress,
    failure: Option<TrainError>,
}

impl<'p, P: Mmio + Delay> SliTrainer<'p, P> {
    pub fn new(platform: &'p mut P, groups: ChannelGroups, config: TrainingConfig) -> Self {
        Self {
            platform,
            groups,
            config,
            clocks: ClockStepper::new(),
            state: TrainingState::Uninitialized,
            progress: Progress::default(),
            failure: None,
        }
    }

    #[must_use]
    pub const fn state(&self) -> TrainingState {
        self.state
    }

    #[must_use]
    pub const fn clocks(&self) -> ClockProfile {
        self.clocks.profile()
    }

    /// Run the sequence to `Linked` or `Aborted`.
    ///
    /// # Errors
    /// [`TrainError`] naming the phase and channel that failed. The trainer is
    /// left in [`TrainingState::Aborted`]; no safe link configuration exists,
    /// so the caller is expected to halt.
    pub fn train_links(&mut self) -> Result<Linked, TrainError> {
        if self.state.is_terminal() {
            return self.outcome_of_finished_run();
        }

        if self.already_trained() {
            info!(
                "SLI already running at {:?}, skipping calibration",
                self.config.target.phy_clock()
            );
            self.state = TrainingState::Linked;
            return Ok(Linked::AlreadyTrained);
        }

        let mut next = TrainingState::LowSpeedBringup;
        while !next.is_terminal() {
            self.state = next;
            debug!("SLI training: entering {next}");
            next = match self.step(next) {
                Ok(following) => following,
                Err(source) => {
                    let failure = TrainError { phase: next, source };
                    error!("{failure}");
                    self.state = TrainingState::Aborted;
                    self.failure = Some(failure);
                    return Err(failure);
                }
            };
        }

        self.state = TrainingState::Linked;
        let report = self.report();
        info!(
            "SLI linked at {} Hz: SLIH tap {}, SLIM taps {:?}",
            report.clocks.phy_rate_hz(),
            report.ahb.selected,
            report.memory_taps().map(DelayTap::get)
        );
        Ok(Linked::Calibrated(report))
    }

    fn already_trained(&mut self) -> bool {
        if !self.config.target.is_speed_up() {
            return false;
        }
        self.groups.ahb_io.bind(self.platform).phy_clock() == Some(self.config.target.phy_clock())
    }

    fn outcome_of_finished_run(&self) -> Result<Linked, TrainError> {
        if let Some(failure) = self.failure {
            return Err(failure);
        }
        if self.progress.ahb.is_none() {
            return Ok(Linked::AlreadyTrained);
        }
        Ok(Linked::Calibrated(self.report()))
    }

    /// Execute `state` and return the state that follows it.
    ///
    /// `Uninitialized` leads to bring-up; terminal states map to themselves.
    fn step(&mut self, state: TrainingState) -> Result<TrainingState, LinkError> {
        let speed_up = self.config.target.is_speed_up();
        let after_bringup = if speed_up {
            TrainingState::AutoTrainOff
        } else {
            TrainingState::CalibrateAhb
        };

        Ok(match state {
            TrainingState::LowSpeedBringup => {
                self.clocks.bring_up(self.platform, &self.groups, &self.config)?;
                info!("SLI up at reference rate");
                if self.config.workaround_required {
                    TrainingState::Workaround
                } else {
                    after_bringup
                }
            }
            TrainingState::Workaround => {
                if let Some(hz) = self.clocks.apply_oscillator_workaround(self.platform) {
                    debug!("SLI reference revised to {hz} Hz");
                }
                after_bringup
            }
            TrainingState::AutoTrainOff => {
                ClockStepper::set_auto_train(self.platform, &self.groups, false);
                TrainingState::SpeedUp
            }
            TrainingState::SpeedUp => {
                if !self.clocks.speed_up(self.platform, &self.groups, &self.config) {
                    info!(
                        "SLI calibrating at the current {} Hz",
                        self.clocks.profile().phy_rate_hz()
                    );
                }
                TrainingState::CalibrateAhb
            }
            TrainingState::CalibrateAhb => {
                self.calibrate_ahb()?;
                TrainingState::CalibrateMemory
            }
            TrainingState::CalibrateMemory => {
                self.calibrate_memory()?;
                TrainingState::AutoTrainOn
            }
            TrainingState::AutoTrainOn => {
                ClockStepper::set_auto_train(self.platform, &self.groups, true);
                for channel in self.calibration_targets() {
                    let mut regs = channel.bind(self.platform);
                    wait_for_suspend_bounded(&mut regs, self.config.suspend_deadline_us)?;
                }
                TrainingState::Linked
            }
            TrainingState::Uninitialized => TrainingState::LowSpeedBringup,
            TrainingState::Linked | TrainingState::Aborted => state,
        })
    }

    /// The blocks whose receivers are tap-calibrated.
    const fn calibration_targets(&self) -> [ChannelGroup; 2] {
        [self.groups.ahb_io, self.groups.memory_cpu]
    }

    fn calibrate_ahb(&mut self) -> Result<(), LinkError> {
        let channel = self.groups.ahb_io;
        let result = coarse_scan(
            &mut channel.bind(self.platform),
            Sweep::from_config(&self.config),
            self.config.fallback.ahb,
        )?;
        info!("{channel}: shared tap {} (window {})", result.selected, result.window);
        self.progress.ahb = Some(result);
        Ok(())
    }

    fn calibrate_memory(&mut self) -> Result<(), LinkError> {
        let channel = self.groups.memory_cpu;
        let sweep = Sweep::from_config(&self.config);
        let mut regs = channel.bind(self.platform);

        let coarse = coarse_scan(&mut regs, sweep, self.config.fallback.memory)?;
        info!("{channel}: coarse tap {} (window {})", coarse.selected, coarse.window);

        // Blocks with a single shared delay keep the coarse result on every lane.
        let tuned = if channel.role().has_per_lane_delay() {
            channel.role().rx_lanes().min(MEMORY_LANES)
        } else {
            0
        };
        let mut lanes = [coarse; MEMORY_LANES];
        for (lane, result) in lanes.iter_mut().enumerate().take(tuned) {
            *result = fine_scan(
                &mut regs,
                sweep,
                lane,
                coarse.selected,
                self.config.fine_window_radius,
            )?;
        }

        for (lane, result) in lanes.iter().enumerate().take(tuned) {
            regs.set_lane_delay(lane, result.selected);
        }
        clear_and_wait(&mut regs, SliCtrlI::CLEAR_RX_BUS, self.config.clear_timeout_us)?;
        info!(
            "{channel}: lane taps {:?}",
            lanes.map(|lane| lane.selected.get())
        );

        self.progress.memory_coarse = Some(coarse);
        self.progress.memory_lanes = Some(lanes);
        Ok(())
    }

    fn report(&self) -> CalibrationReport {
        let ahb = self
            .progress
            .ahb
            .unwrap_or_else(|| unscanned(self.config.fallback.ahb));
        let memory_coarse = self
            .progress
            .memory_coarse
            .unwrap_or_else(|| unscanned(self.config.fallback.memory));
        CalibrationReport {
            clocks: self.clocks.profile(),
            workaround_applied: self.clocks.oscillator_adjusted(),
            ahb,
            memory_coarse,
            memory_lanes: self.progress.memory_lanes.unwrap_or([memory_coarse; MEMORY_LANES]),
        }
    }
}

const fn unscanned(fallback: DelayTap) -> ScanResult {
    ScanResult {
        window: crate::tap::CalibrationWindow::EMPTY,
        selected: fallback,
        fell_back: true,
    }
}

/// Train the SLI once, early in boot.
///
/// # Errors
/// See [`SliTrainer::train_links`].
pub fn train_links<P: Mmio + Delay>(
    platform: &mut P,
    groups: &ChannelGroups,
    config: &TrainingConfig,
) -> Result<Linked, TrainError> {
    SliTrainer::new(platform, *groups, *config).train_links()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_linked_and_aborted_are_terminal() {
        assert!(TrainingState::Linked.is_terminal());
        assert!(TrainingState::Aborted.is_terminal());
        assert!(!TrainingState::SpeedUp.is_terminal());
    }

    #[test]
    fn outer_states_touch_no_hardware() {
        let mut dies = sli_model::DiePair::soc();
        let mut trainer = SliTrainer::new(&mut dies, ChannelGroups::soc(), TrainingConfig::default());
        assert_eq!(
            trainer.step(TrainingState::Uninitialized),
            Ok(TrainingState::LowSpeedBringup)
        );
        assert_eq!(trainer.step(TrainingState::Linked), Ok(TrainingState::Linked));
        assert_eq!(trainer.step(TrainingState::Aborted), Ok(TrainingState::Aborted));
        assert!(dies.writes().is_empty());
    }

    #[test]
    fn states_render_for_diagnostics() {
        assert_eq!(format!("{}", TrainingState::CalibrateMemory), "SLIM calibration");
    }
}
