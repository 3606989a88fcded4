use sli_hw::memory_map::IO_SCU;
use sli_hw::{
    EngineClock, IoOscillator, PhyClock, SliCtrlI, SliCtrlIII, SliIntrStatus, SliRegister,
};
use sli_link::config::WORKAROUND_OSCILLATOR;
use sli_link::{
    ChannelGroups, ChipRevision, DelayTap, LinkError, Linked, SliTrainer, TargetPhyClock, TrainError,
    TrainingConfig, TrainingState, train_links,
};
use sli_model::{ClearBehavior, DiePair};
use std::collections::BTreeMap;

fn groups() -> ChannelGroups {
    ChannelGroups::soc()
}

/// Memory eye at shared taps 8 to 14, AHB eye at 9 to 15.
fn healthy_dies() -> DiePair {
    let g = groups();
    let mut dies = DiePair::soc();
    dies.block_mut(g.memory_cpu.block()).set_shared_window(4, 8..=14);
    dies.block_mut(g.ahb_io.block()).set_shared_window(2, 9..=15);
    dies
}

fn calibrated(outcome: Result<Linked, TrainError>) -> sli_link::CalibrationReport {
    match outcome.expect("training succeeds") {
        Linked::Calibrated(report) => report,
        Linked::AlreadyTrained => panic!("expected a calibration run"),
    }
}

#[test]
fn end_to_end_training_links_at_the_target_rate() {
    let g = groups();
    let mut dies = healthy_dies();
    let config = TrainingConfig::default();

    let report = calibrated(train_links(&mut dies, &g, &config));

    assert_eq!(report.memory_coarse.selected.get(), 11);
    for tap in report.memory_taps() {
        assert!((6..=16).contains(&tap.get()), "lane tap {tap}");
    }
    assert_eq!(report.ahb.selected.get(), 12);
    assert!(!report.workaround_applied);
    assert_eq!(report.clocks.phy_clock, PhyClock::Mhz400);
    assert_eq!(report.clocks.engine_clock, EngineClock::Mhz500);

    let taps: Vec<u8> = report.memory_taps().iter().copied().map(DelayTap::get).collect();
    assert_eq!(dies.lane_taps(g.memory_cpu.block()).to_vec(), taps);
    for channel in g.calibrated() {
        let ctrl3: SliCtrlIII = dies.peek(channel.block());
        assert_eq!(ctrl3.phy_clock(), Some(PhyClock::Mhz400), "{channel}");
        assert_eq!(ctrl3.engine_clock(), Some(EngineClock::Mhz500), "{channel}");
        let ctrl1: SliCtrlI = dies.peek(channel.block());
        assert!(!ctrl1.auto_train_off(), "{channel} retrains");
    }
}

#[test]
fn independent_lane_eyes_get_independent_taps() {
    let g = groups();
    let mut dies = healthy_dies();
    dies.block_mut(g.memory_cpu.block())
        .set_lane_windows([6..=12, 8..=14, 9..=15, 10..=16]);

    let report = calibrated(train_links(&mut dies, &g, &TrainingConfig::default()));

    assert_eq!(report.memory_coarse.selected.get(), 11);
    assert_eq!(report.memory_taps().map(DelayTap::get), [9, 11, 12, 12]);
    assert_eq!(dies.lane_taps(g.memory_cpu.block()), [9, 11, 12, 12]);
}

#[test]
fn auto_training_is_off_for_every_delay_write() {
    let g = groups();
    let mut dies = healthy_dies();
    let _ = calibrated(train_links(&mut dies, &g, &TrainingConfig::default()));

    let mut control: BTreeMap<u64, SliCtrlI> = BTreeMap::new();
    let mut delays: BTreeMap<u64, SliCtrlIII> = BTreeMap::new();
    let mut delay_writes = 0;
    for write in dies.writes() {
        for channel in g.all() {
            let block = channel.block();
            if write.address == block.register(SliCtrlI::OFFSET) {
                control.insert(block.base(), SliCtrlI::from_bits(write.value));
            } else if write.address == block.register(SliCtrlIII::OFFSET) {
                let after = SliCtrlIII::from_bits(write.value);
                let before = delays.insert(block.base(), after).unwrap_or_default();
                if (0..4).any(|lane| before.pad_delay(lane) != after.pad_delay(lane)) {
                    delay_writes += 1;
                    let ctrl = control.get(&block.base()).copied().unwrap_or_default();
                    assert!(ctrl.auto_train_off(), "{channel}: delay write while retraining");
                }
            }
        }
    }
    assert!(delay_writes > 0);
}

#[test]
fn persisted_target_clock_skips_training() {
    let g = groups();
    let mut dies = healthy_dies();
    dies.preload(
        g.ahb_io.block(),
        SliCtrlIII::new().with_phy_clock_select(PhyClock::Mhz400.select()),
    );

    let outcome = train_links(&mut dies, &g, &TrainingConfig::default()).expect("linked");

    assert_eq!(outcome, Linked::AlreadyTrained);
    assert!(dies.writes().is_empty());
    assert_eq!(dies.elapsed_us(), 0);
}

#[test]
fn a_different_persisted_clock_trains_again() {
    let g = groups();
    let mut dies = healthy_dies();
    dies.preload(
        g.ahb_io.block(),
        SliCtrlIII::new().with_phy_clock_select(PhyClock::Mhz200.select()),
    );

    // Bring-up reprograms the reference clock first, so the speed-up is legal.
    let report = calibrated(train_links(&mut dies, &g, &TrainingConfig::default()));
    assert_eq!(report.clocks.phy_clock, PhyClock::Mhz400);
}

#[test]
fn rx_errors_at_bring_up_abort_the_sequence() {
    let g = groups();
    let mut dies = healthy_dies();
    dies.block_mut(g.ahb_io.block()).inject_rx_errors(true);

    let config = TrainingConfig::default();
    let mut trainer = SliTrainer::new(&mut dies, g, config);
    let err = trainer.train_links().expect_err("aborts");

    assert_eq!(err.phase, TrainingState::LowSpeedBringup);
    assert!(matches!(err.source, LinkError::Errored { channel, .. } if channel == g.ahb_io));
    assert_eq!(trainer.state(), TrainingState::Aborted);
    assert_eq!(trainer.train_links(), Err(err));
}

#[test]
fn stuck_clear_aborts_with_the_failing_channel() {
    let g = groups();
    let mut dies = healthy_dies();
    dies.block_mut(g.video_io.block())
        .set_clear_behavior(ClearBehavior::Stuck);

    let err = train_links(&mut dies, &g, &TrainingConfig::default()).expect_err("aborts");

    assert_eq!(err.phase, TrainingState::LowSpeedBringup);
    assert_eq!(err.source.channel(), g.video_io);
    assert!(matches!(err.source, LinkError::ClearTimeout { waited_us: 100, .. }));
    assert_eq!(
        err.to_string(),
        format!(
            "SLI training aborted during low-speed bring-up: SLIV_IOD: clear request {:#06x} still pending after 100 us",
            SliCtrlI::CLEAR_ALL.into_bits()
        )
    );
}

#[test]
fn slow_clear_fails_a_tightened_timeout() {
    let g = groups();
    let mut dies = healthy_dies();
    dies.block_mut(g.ahb_io.block())
        .set_clear_behavior(ClearBehavior::AfterReads(20));
    let config = TrainingConfig::default().with_clear_timeout_us(10);

    let err = train_links(&mut dies, &g, &config).expect_err("aborts");
    assert_eq!(err.phase, TrainingState::LowSpeedBringup);
    assert_eq!(err.source.channel(), g.ahb_io);
}

#[test]
fn workaround_revises_the_reference_rate() {
    let g = groups();
    let mut dies = healthy_dies();
    let config = TrainingConfig::new(
        ChipRevision::A0,
        TargetPhyClock::SpeedUp(PhyClock::Mhz400),
    );

    let report = calibrated(train_links(&mut dies, &g, &config));

    assert!(report.workaround_applied);
    assert_eq!(report.clocks.reference_hz, 24_000_000);
    assert_eq!(report.clocks.phy_rate_hz(), 400_000_000);
    assert_eq!(dies.peek::<IoOscillator>(IO_SCU), WORKAROUND_OSCILLATOR);
    assert_eq!(dies.writes_to_register::<IoOscillator>(IO_SCU), 1);
}

#[test]
fn production_silicon_leaves_the_oscillator_alone() {
    let g = groups();
    let mut dies = healthy_dies();
    let _ = calibrated(train_links(&mut dies, &g, &TrainingConfig::default()));
    assert_eq!(dies.writes_to_register::<IoOscillator>(IO_SCU), 0);
}

#[test]
fn stay_at_reference_skips_the_speed_up() {
    let g = groups();
    let mut dies = healthy_dies();
    let config = TrainingConfig::new(ChipRevision::A1, TargetPhyClock::StayAtReference);

    let report = calibrated(train_links(&mut dies, &g, &config));

    assert_eq!(report.clocks.phy_clock, PhyClock::Reference);
    assert_eq!(report.clocks.engine_clock, EngineClock::Reference);
    for channel in g.all() {
        let ctrl3: SliCtrlIII = dies.peek(channel.block());
        assert_eq!(ctrl3.phy_clock(), Some(PhyClock::Reference), "{channel}");
        let ctrl1: SliCtrlI = dies.peek(channel.block());
        assert!(!ctrl1.auto_train_off(), "{channel}");
    }
    // Every tap trains at the reference rate.
    assert_eq!(report.ahb.selected.get(), 15);
}

#[test]
fn negedge_targets_latch_memory_on_the_falling_edge() {
    let g = groups();
    let mut dies = healthy_dies();
    let config = TrainingConfig::new(
        ChipRevision::A1,
        TargetPhyClock::SpeedUp(PhyClock::Mhz800),
    );

    let _ = calibrated(train_links(&mut dies, &g, &config));

    for channel in [g.memory_cpu, g.memory_io] {
        assert!(dies.peek::<SliCtrlI>(channel.block()).rx_latch_negedge(), "{channel}");
    }
    assert!(!dies.peek::<SliCtrlI>(g.ahb_cpu.block()).rx_latch_negedge());
}

#[test]
fn video_blocks_run_raw_at_the_reference_clock() {
    let g = groups();
    let mut dies = healthy_dies();
    let _ = calibrated(train_links(&mut dies, &g, &TrainingConfig::default()));

    for channel in [g.video_cpu, g.video_io] {
        let ctrl1: SliCtrlI = dies.peek(channel.block());
        assert!(ctrl1.raw_mode() && ctrl1.transfer_enable(), "{channel}");
        let ctrl3: SliCtrlIII = dies.peek(channel.block());
        assert_eq!(ctrl3.phy_clock(), Some(PhyClock::Reference), "{channel}");
    }
    assert!(!dies.peek::<SliCtrlI>(g.memory_cpu.block()).raw_mode());
}

#[test]
fn no_memory_eye_falls_back_then_times_out_on_retraining() {
    let g = groups();
    let mut dies = healthy_dies();
    dies.block_mut(g.memory_cpu.block()).set_shared_window(4, 40..=50);
    let config = TrainingConfig::default().with_suspend_deadline_us(1_000);

    let err = train_links(&mut dies, &g, &config).expect_err("memory link never suspends");

    assert_eq!(err.phase, TrainingState::AutoTrainOn);
    assert_eq!(
        err.source,
        LinkError::SuspendTimeout {
            channel: g.memory_cpu,
            waited_us: 1_000
        }
    );
    assert_eq!(dies.lane_taps(g.memory_cpu.block()), [12; 4]);
}

#[test]
fn suspend_deadline_bounds_the_bring_up_wait() {
    let g = groups();
    let mut dies = healthy_dies();
    dies.block_mut(g.ahb_cpu.block())
        .override_status(Some(SliIntrStatus::new().with_tx_train(true)));
    let config = TrainingConfig::default().with_suspend_deadline_us(250);

    let err = train_links(&mut dies, &g, &config).expect_err("times out");

    assert_eq!(err.phase, TrainingState::LowSpeedBringup);
    assert_eq!(err.source.channel(), g.ahb_cpu);
}

#[test]
fn a_finished_trainer_reports_the_same_outcome() {
    let g = groups();
    let mut dies = healthy_dies();
    let mut trainer = SliTrainer::new(&mut dies, g, TrainingConfig::default());

    let first = trainer.train_links().expect("linked");
    assert_eq!(trainer.state(), TrainingState::Linked);
    let second = trainer.train_links().expect("still linked");
    assert_eq!(first, second);
}
