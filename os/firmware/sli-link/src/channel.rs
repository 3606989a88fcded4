//! # Channel Register Interface
//!
//! [`ChannelGroup`] is a plain handle naming one SLI block: its role, the die it
//! sits on, and its register base. Handles are `Copy`; they carry no access
//! rights of their own. Register access happens through [`ChannelRegs`], a
//! short-lived view that borrows the platform mutably for the duration of one
//! operation:
//!
//! ```text
//! ChannelGroup ──bind(&mut platform)──► ChannelRegs ──► Mmio / Delay
//! ```
//!
//! Every delay write is followed by [`DELAY_SETTLE_US`] of settling time before
//! the new tap is considered effective.

use crate::config::DELAY_SETTLE_US;
use crate::tap::DelayTap;
use core::fmt;
use log::trace;
use sli_hw::memory_map::{SLI_CPU_BASE, SLI_IO_BASE, SLIH_OFFSET, SLIM_OFFSET, SLIV_OFFSET};
use sli_hw::{Delay, EngineClock, Mmio, PhyClock, RegisterBlock, SliCtrlI, SliCtrlIII, SliIntrStatus};

/// The bus a channel block carries.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum ChannelRole {
    /// `SLIH`: register/peripheral bus, 2 RX lanes, shared delay only.
    Ahb,
    /// `SLIM`: memory bus, 4 independently delayed RX lanes.
    Memory,
    /// `SLIV`: video bus, raw mode, not tap-calibrated.
    Video,
}

impl ChannelRole {
    /// RX lanes with a programmable pad delay.
    #[must_use]
    pub const fn rx_lanes(self) -> usize {
        match self {
            Self::Ahb => 2,
            Self::Memory => 4,
            Self::Video => 0,
        }
    }

    /// Whether each lane may carry its own delay value.
    #[must_use]
    pub const fn has_per_lane_delay(self) -> bool {
        matches!(self, Self::Memory)
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Ahb => "SLIH",
            Self::Memory => "SLIM",
            Self::Video => "SLIV",
        }
    }

    const fn block_offset(self) -> u64 {
        match self {
            Self::Ahb => SLIH_OFFSET,
            Self::Memory => SLIM_OFFSET,
            Self::Video => SLIV_OFFSET,
        }
    }
}

/// The die a channel block sits on.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum DieSide {
    Cpu,
    /// The far side; its registers are reached across the `SLIH` link.
    Io,
}

impl DieSide {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Cpu => "CPU",
            Self::Io => "IOD",
        }
    }
}

/// Handle for one physical channel block.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct ChannelGroup {
    role: ChannelRole,
    side: DieSide,
    block: RegisterBlock,
}

impl ChannelGroup {
    #[must_use]
    pub const fn new(role: ChannelRole, side: DieSide, block: RegisterBlock) -> Self {
        Self { role, side, block }
    }

    #[must_use]
    pub const fn role(&self) -> ChannelRole {
        self.role
    }

    #[must_use]
    pub const fn side(&self) -> DieSide {
        self.side
    }

    #[must_use]
    pub const fn block(&self) -> RegisterBlock {
        self.block
    }

    /// Borrow `platform` for register access to this block.
    pub fn bind<P: Mmio + Delay>(self, platform: &mut P) -> ChannelRegs<'_, P> {
        ChannelRegs {
            channel: self,
            platform,
        }
    }
}

impl fmt::Display for ChannelGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.role.name(), self.side.name())
    }
}

/// The six channel blocks of the two-die system.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct ChannelGroups {
    pub ahb_cpu: ChannelGroup,
    pub ahb_io: ChannelGroup,
    pub memory_cpu: ChannelGroup,
    pub memory_io: ChannelGroup,
    pub video_cpu: ChannelGroup,
    pub video_io: ChannelGroup,
}

impl ChannelGroups {
    /// Derive all blocks from the two SLI window bases.
    #[must_use]
    pub const fn new(cpu_window: RegisterBlock, io_window: RegisterBlock) -> Self {
        const fn group(role: ChannelRole, side: DieSide, window: RegisterBlock) -> ChannelGroup {
            ChannelGroup::new(role, side, window.offset(role.block_offset()))
        }

        Self {
            ahb_cpu: group(ChannelRole::Ahb, DieSide::Cpu, cpu_window),
            ahb_io: group(ChannelRole::Ahb, DieSide::Io, io_window),
            memory_cpu: group(ChannelRole::Memory, DieSide::Cpu, cpu_window),
            memory_io: group(ChannelRole::Memory, DieSide::Io, io_window),
            video_cpu: group(ChannelRole::Video, DieSide::Cpu, cpu_window),
            video_io: group(ChannelRole::Video, DieSide::Io, io_window),
        }
    }

    /// The blocks at the fixed chip addresses.
    #[must_use]
    pub const fn soc() -> Self {
        Self::new(
            RegisterBlock::new(SLI_CPU_BASE),
            RegisterBlock::new(SLI_IO_BASE),
        )
    }

    /// All blocks, I/O die first.
    #[must_use]
    pub const fn all(&self) -> [ChannelGroup; 6] {
        [
            self.ahb_io,
            self.memory_io,
            self.video_io,
            self.ahb_cpu,
            self.memory_cpu,
            self.video_cpu,
        ]
    }

    /// The AHB and memory blocks, I/O die first.
    #[must_use]
    pub const fn calibrated(&self) -> [ChannelGroup; 4] {
        [self.ahb_io, self.memory_io, self.ahb_cpu, self.memory_cpu]
    }
}

impl Default for ChannelGroups {
    fn default() -> Self {
        Self::soc()
    }
}

/// Register view of one channel block.
pub struct ChannelRegs<'p, P> {
    channel: ChannelGroup,
    platform: &'p mut P,
}

impl<P: Mmio + Delay> ChannelRegs<'_, P> {
    #[must_use]
    pub const fn channel(&self) -> ChannelGroup {
        self.channel
    }

    /// Write-clear every latched interrupt status bit.
    pub fn clear_interrupt_status(&mut self) {
        self.platform
            .store(self.channel.block, SliIntrStatus::CLEAR_ALL);
    }

    pub fn read_status(&mut self) -> SliIntrStatus {
        self.platform.load(self.channel.block)
    }

    pub fn read_control(&mut self) -> SliCtrlI {
        self.platform.load(self.channel.block)
    }

    pub fn read_clock_delay(&mut self) -> SliCtrlIII {
        self.platform.load(self.channel.block)
    }

    /// Set the clear/reset request bits of `mask`.
    pub fn assert_clear(&mut self, mask: SliCtrlI) {
        self.platform
            .modify(self.channel.block, |ctrl: SliCtrlI| ctrl.union(mask));
    }

    /// Program `tap` on every RX lane, then settle.
    pub fn set_shared_delay(&mut self, tap: DelayTap) {
        let lanes = self.channel.role.rx_lanes();
        self.platform.modify(self.channel.block, |mut r: SliCtrlIII| {
            for lane in 0..lanes {
                r = r.with_pad_delay(lane, tap.get());
            }
            r
        });
        trace!("{}: shared delay {tap}", self.channel);
        self.platform.delay_us(DELAY_SETTLE_US);
    }

    /// Program `tap` on RX lane `lane` only, then settle.
    ///
    /// # Panics
    /// Panics if `lane` is not an RX lane of this block.
    pub fn set_lane_delay(&mut self, lane: usize, tap: DelayTap) {
        assert!(
            lane < self.channel.role.rx_lanes(),
            "{} has no RX lane {lane}",
            self.channel
        );
        self.platform.modify(self.channel.block, |r: SliCtrlIII| {
            r.with_pad_delay(lane, tap.get())
        });
        trace!("{}: lane {lane} delay {tap}", self.channel);
        self.platform.delay_us(DELAY_SETTLE_US);
    }

    pub fn set_engine_clock(&mut self, clock: EngineClock) {
        self.platform.modify(self.channel.block, |r: SliCtrlIII| {
            r.with_engine_clock_select(clock.select())
        });
    }

    pub fn set_phy_clock(&mut self, clock: PhyClock) {
        self.platform.modify(self.channel.block, |r: SliCtrlIII| {
            r.with_phy_clock_select(clock.select())
        });
    }

    /// The PHY clock currently selected, `None` for a reserved selector.
    pub fn phy_clock(&mut self) -> Option<PhyClock> {
        self.read_clock_delay().phy_clock()
    }

    /// Program both clock selectors for the bring-up reference.
    pub fn select_reference_clocks(&mut self) {
        self.platform.modify(self.channel.block, |r: SliCtrlIII| {
            r.with_engine_clock_select(EngineClock::Reference.select())
                .with_phy_clock_select(PhyClock::Reference.select())
        });
    }

    /// Enable or stop continuous hardware retraining.
    pub fn set_auto_train(&mut self, enabled: bool) {
        self.platform.modify(self.channel.block, |c: SliCtrlI| {
            c.with_auto_train_off(!enabled)
        });
    }

    pub fn set_transfer_enable(&mut self, enabled: bool) {
        self.platform.modify(self.channel.block, |c: SliCtrlI| {
            c.with_transfer_enable(enabled)
        });
    }

    pub fn set_raw_mode(&mut self, enabled: bool) {
        self.platform
            .modify(self.channel.block, |c: SliCtrlI| c.with_raw_mode(enabled));
    }

    pub fn set_rx_latch_negedge(&mut self, enabled: bool) {
        self.platform.modify(self.channel.block, |c: SliCtrlI| {
            c.with_rx_latch_negedge(enabled)
        });
    }

    /// Busy-wait on the platform delay source.
    pub fn delay_us(&mut self, us: u32) {
        self.platform.delay_us(us);
    }
}
