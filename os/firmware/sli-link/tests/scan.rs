use sli_hw::{PhyClock, SliCtrlIII};
use sli_link::config::DELAY_SETTLE_US;
use sli_link::{ChannelGroups, DelayTap, Sweep, TrainingConfig, coarse_scan, fine_scan};
use sli_model::DiePair;
use std::ops::RangeInclusive;

fn tap(value: u8) -> DelayTap {
    DelayTap::new(value).expect("valid tap")
}

/// A die pair whose CPU memory block runs above the reference clock.
fn fast_memory_block(windows: &[RangeInclusive<u8>]) -> (DiePair, ChannelGroups) {
    let groups = ChannelGroups::soc();
    let mut dies = DiePair::soc();
    dies.preload(
        groups.memory_cpu.block(),
        SliCtrlIII::new().with_phy_clock_select(PhyClock::Mhz400.select()),
    );
    dies.block_mut(groups.memory_cpu.block())
        .set_lane_windows(windows.iter().cloned());
    (dies, groups)
}

fn sweep() -> Sweep {
    Sweep::from_config(&TrainingConfig::default())
}

#[test]
fn coarse_scan_selects_the_window_midpoint() {
    for (a, b) in [(8, 14), (0, 0), (0, 31), (3, 4), (20, 31), (13, 13)] {
        let (mut dies, groups) = fast_memory_block(&[a..=b, a..=b, a..=b, a..=b]);
        let result = coarse_scan(&mut groups.memory_cpu.bind(&mut dies), sweep(), tap(12))
            .expect("scan completes");

        assert_eq!(result.selected.get(), (a + b) / 2, "window [{a}, {b}]");
        assert_eq!(result.window.first_pass, Some(tap(a)));
        assert_eq!(result.window.last_pass, Some(tap(b)));
        assert!(!result.fell_back);
    }
}

#[test]
fn coarse_scan_leaves_the_selected_tap_programmed() {
    let (mut dies, groups) = fast_memory_block(&[8..=14, 8..=14, 8..=14, 8..=14]);
    coarse_scan(&mut groups.memory_cpu.bind(&mut dies), sweep(), tap(12)).expect("scan completes");
    assert_eq!(dies.lane_taps(groups.memory_cpu.block()), [11; 4]);
}

#[test]
fn every_delay_write_settles() {
    let (mut dies, groups) = fast_memory_block(&[]);
    let mut regs = groups.memory_cpu.bind(&mut dies);
    regs.set_shared_delay(tap(11));
    regs.set_lane_delay(2, tap(9));

    assert_eq!(dies.elapsed_us(), 16);
}

#[test]
fn coarse_scan_samples_each_tap_once_after_settling() {
    let (mut dies, groups) = fast_memory_block(&[8..=14, 8..=14, 8..=14, 8..=14]);
    coarse_scan(&mut groups.memory_cpu.bind(&mut dies), sweep(), tap(12)).expect("scan completes");

    // Taps 0 to 15 are swept; 15 is the first failure after the eye.
    let block = dies.block(groups.memory_cpu.block()).expect("modeled block");
    assert_eq!(block.status_reads(), 16);
    assert!(dies.elapsed_us() >= u64::from(DELAY_SETTLE_US) * 16);
}

#[test]
fn coarse_scan_falls_back_without_a_pass() {
    let (mut dies, groups) = fast_memory_block(&[40..=50]);
    let result = coarse_scan(&mut groups.memory_cpu.bind(&mut dies), sweep(), tap(12))
        .expect("no pass is not an error");

    assert!(result.fell_back);
    assert!(!result.window.has_pass());
    assert_eq!(result.selected, tap(12));
    assert_eq!(dies.lane_taps(groups.memory_cpu.block())[0], 12);
}

#[test]
fn coarse_scan_respects_a_narrowed_range() {
    let (mut dies, groups) = fast_memory_block(&[0..=31]);
    let config = TrainingConfig::default().with_tap_range(tap(10), 20);
    let result = coarse_scan(
        &mut groups.memory_cpu.bind(&mut dies),
        Sweep::from_config(&config),
        tap(12),
    )
    .expect("scan completes");
    assert_eq!(result.window.first_pass, Some(tap(10)));
    assert_eq!(result.window.last_pass, Some(tap(19)));
    assert_eq!(result.selected, tap(14));
}

#[test]
fn fine_scan_stays_inside_the_radius() {
    for coarse in [0, 2, 11, 28, 31] {
        // Every tap passes, so the result is the centre of the clipped range.
        let (mut dies, groups) = fast_memory_block(&[]);
        let mut regs = groups.memory_cpu.bind(&mut dies);
        regs.set_shared_delay(tap(coarse));

        for lane in 0..4 {
            let result = fine_scan(&mut regs, sweep(), lane, tap(coarse), 5).expect("scan completes");
            let lo = coarse.saturating_sub(5);
            let hi = (coarse + 5).min(32);
            let first = result.window.first_pass.expect("has pass").get();
            let last = result.window.last_pass.expect("has pass").get();
            assert_eq!((first, last), (lo, hi - 1), "coarse {coarse}");
            assert!((lo..hi).contains(&result.selected.get()));
        }
    }
}

#[test]
fn fine_scan_finds_each_lane_eye_and_restores_the_lane() {
    let (mut dies, groups) = fast_memory_block(&[6..=12, 8..=14, 9..=15, 10..=16]);
    let block = groups.memory_cpu.block();
    let mut regs = groups.memory_cpu.bind(&mut dies);
    regs.set_shared_delay(tap(11));

    let selected: Vec<u8> = (0..4)
        .map(|lane| {
            fine_scan(&mut regs, sweep(), lane, tap(11), 5)
                .expect("scan completes")
                .selected
                .get()
        })
        .collect();

    // Lane 3 is clipped at the exclusive upper bound 16.
    assert_eq!(selected, [9, 11, 12, 12]);
    assert_eq!(dies.lane_taps(block), [11; 4]);
}

#[test]
fn fine_scan_keeps_the_coarse_tap_without_a_pass() {
    let (mut dies, groups) = fast_memory_block(&[8..=14, 25..=30]);
    let mut regs = groups.memory_cpu.bind(&mut dies);
    regs.set_shared_delay(tap(11));

    // Lane 1 at 11 fails, so every lane 0 sample fails as well.
    let result = fine_scan(&mut regs, sweep(), 0, tap(11), 5).expect("scan completes");
    assert!(result.fell_back);
    assert_eq!(result.selected, tap(11));
}
