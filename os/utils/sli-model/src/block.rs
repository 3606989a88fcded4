use sli_hw::ctrl3::PAD_DELAY_FIELDS;
use sli_hw::{PhyClock, SliCtrlI, SliCtrlIII, SliIntrStatus, SliRegister};
use std::collections::BTreeMap;
use std::ops::RangeInclusive;

const CTRL_I: u64 = <SliCtrlI as SliRegister>::OFFSET;
const CTRL_III: u64 = <SliCtrlIII as SliRegister>::OFFSET;
const INTR_STATUS: u64 = <SliIntrStatus as SliRegister>::OFFSET;

/// How a block answers clear requests.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ClearBehavior {
    /// Requests drop after this many `CTRL_I` reads have seen them set.
    AfterReads(u32),
    /// Requests are never acknowledged.
    Stuck,
}

impl Default for ClearBehavior {
    fn default() -> Self {
        Self::AfterReads(1)
    }
}

/// Behavioral model of one SLI channel block.
///
/// The link is considered trained while the block runs at the reference PHY
/// clock, or while every lane with a configured eye samples inside it. Lanes
/// without a window always pass.
#[derive(Debug, Clone, Default)]
pub struct BlockModel {
    ctrl_i: u32,
    ctrl_iii: u32,
    other: BTreeMap<u64, u32>,
    clear: ClearBehavior,
    polls_since_request: u32,
    lane_windows: Vec<RangeInclusive<u8>>,
    status_override: Option<SliIntrStatus>,
    rx_errors: bool,
    status_reads: usize,
}

impl BlockModel {
    /// Passing taps per RX lane, lane 0 first.
    ///
    /// # Panics
    /// Panics if more windows than pad delay fields are given.
    pub fn set_lane_windows(&mut self, windows: impl IntoIterator<Item = RangeInclusive<u8>>) -> &mut Self {
        self.lane_windows = windows.into_iter().collect();
        assert!(
            self.lane_windows.len() <= PAD_DELAY_FIELDS,
            "at most {PAD_DELAY_FIELDS} lanes"
        );
        self
    }

    /// The same passing taps on the first `lanes` RX lanes.
    pub fn set_shared_window(&mut self, lanes: usize, window: RangeInclusive<u8>) -> &mut Self {
        self.set_lane_windows(std::iter::repeat_n(window, lanes))
    }

    pub const fn set_clear_behavior(&mut self, clear: ClearBehavior) -> &mut Self {
        self.clear = clear;
        self
    }

    /// Report `status` on every read instead of the modeled value.
    pub const fn override_status(&mut self, status: Option<SliIntrStatus>) -> &mut Self {
        self.status_override = status;
        self
    }

    /// Latch RX errors on every status read.
    pub const fn inject_rx_errors(&mut self, errors: bool) -> &mut Self {
        self.rx_errors = errors;
        self
    }

    #[must_use]
    pub const fn control(&self) -> SliCtrlI {
        SliCtrlI::from_bits(self.ctrl_i)
    }

    #[must_use]
    pub const fn clock_delay(&self) -> SliCtrlIII {
        SliCtrlIII::from_bits(self.ctrl_iii)
    }

    /// Number of `INTR_STATUS` reads so far.
    #[must_use]
    pub const fn status_reads(&self) -> usize {
        self.status_reads
    }

    /// Whether the current configuration trains.
    #[must_use]
    pub fn link_passes(&self) -> bool {
        let ctrl = self.clock_delay();
        ctrl.phy_clock() == Some(PhyClock::Reference)
            || self
                .lane_windows
                .iter()
                .enumerate()
                .all(|(lane, window)| window.contains(&ctrl.pad_delay(lane)))
    }

    /// The status value a read would currently return.
    #[must_use]
    pub fn status(&self) -> SliIntrStatus {
        if let Some(status) = self.status_override {
            return status;
        }

        let status = if self.link_passes() {
            SliIntrStatus::new()
                .with_rx_idle(true)
                .with_tx_idle(true)
                .with_rx_suspend(true)
                .with_tx_suspend(true)
        } else {
            SliIntrStatus::new().with_tx_train(true).with_rx_train_packet(true)
        };
        status.with_rx_error(self.rx_errors)
    }

    pub(crate) fn read(&mut self, offset: u64) -> u32 {
        match offset {
            CTRL_I => self.poll_control(),
            INTR_STATUS => {
                self.status_reads += 1;
                self.status().into_bits()
            }
            _ => self.peek(offset),
        }
    }

    pub(crate) fn peek(&self, offset: u64) -> u32 {
        match offset {
            CTRL_I => self.ctrl_i,
            CTRL_III => self.ctrl_iii,
            INTR_STATUS => self.status().into_bits(),
            _ => self.other.get(&offset).copied().unwrap_or_default(),
        }
    }

    pub(crate) fn write(&mut self, offset: u64, value: u32) {
        match offset {
            CTRL_I => {
                self.ctrl_i = value;
                self.polls_since_request = 0;
            }
            // Write-one-to-clear; the modeled status is level-triggered.
            INTR_STATUS => {}
            _ => self.poke(offset, value),
        }
    }

    pub(crate) fn poke(&mut self, offset: u64, value: u32) {
        match offset {
            CTRL_I => self.ctrl_i = value,
            CTRL_III => self.ctrl_iii = value,
            INTR_STATUS => {}
            _ => {
                self.other.insert(offset, value);
            }
        }
    }

    fn poll_control(&mut self) -> u32 {
        let pending = SliCtrlI::SELF_CLEARING.into_bits();
        if self.ctrl_i & pending != 0 {
            match self.clear {
                ClearBehavior::AfterReads(reads) if self.polls_since_request >= reads => {
                    self.ctrl_i &= !pending;
                }
                ClearBehavior::AfterReads(_) => self.polls_since_request += 1,
                ClearBehavior::Stuck => {}
            }
        }
        self.ctrl_i
    }
}
