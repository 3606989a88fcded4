use log::LevelFilter;
use sli_console::ConsoleLogger;
use sli_hw::{PhyClock, SliCtrlIII};
use sli_link::{
    CalibrationReport, ChannelGroups, ChipRevision, Linked, TargetPhyClock, TrainingConfig,
    train_links,
};
use sli_model::DiePair;
use std::env;
use std::io::Write;
use std::ops::RangeInclusive;
use std::process::ExitCode;

const USAGE: &str = "usage: sli-sim [--revision a0|a1] [--target ref|200|250|400|500|788|800] \
[--memory-window LO-HI] [--lane N=LO-HI]... [--ahb-window LO-HI] [--trained] [--verbose]";

static LOGGER: ConsoleLogger = ConsoleLogger::new(LevelFilter::Trace, stdout_putc);

fn stdout_putc(b: u8) {
    let _ = std::io::stdout().write_all(&[b]);
}

struct Options {
    revision: ChipRevision,
    target: TargetPhyClock,
    memory_window: RangeInclusive<u8>,
    lane_windows: Vec<(usize, RangeInclusive<u8>)>,
    ahb_window: RangeInclusive<u8>,
    trained: bool,
    level: LevelFilter,
}

impl Options {
    fn parse(mut args: impl Iterator<Item = String>) -> Result<Self, String> {
        let mut options = Self {
            revision: ChipRevision::A1,
            target: TargetPhyClock::SpeedUp(PhyClock::Mhz400),
            memory_window: 8..=14,
            lane_windows: Vec::new(),
            ahb_window: 9..=15,
            trained: false,
            level: LevelFilter::Info,
        };

        while let Some(arg) = args.next() {
            let mut value = || args.next().ok_or_else(|| format!("{arg} needs a value"));
            match arg.as_str() {
                "--revision" => options.revision = parse_revision(&value()?)?,
                "--target" => options.target = parse_target(&value()?)?,
                "--memory-window" => options.memory_window = parse_window(&value()?)?,
                "--ahb-window" => options.ahb_window = parse_window(&value()?)?,
                "--lane" => options.lane_windows.push(parse_lane(&value()?)?),
                "--trained" => options.trained = true,
                "--verbose" => options.level = LevelFilter::Trace,
                other => return Err(format!("unknown argument {other}")),
            }
        }
        Ok(options)
    }
}

fn parse_revision(s: &str) -> Result<ChipRevision, String> {
    match s {
        "a0" | "A0" => Ok(ChipRevision::A0),
        "a1" | "A1" => Ok(ChipRevision::A1),
        _ => Err(format!("unknown revision {s}")),
    }
}

fn parse_target(s: &str) -> Result<TargetPhyClock, String> {
    let clock = match s {
        "ref" => return Ok(TargetPhyClock::StayAtReference),
        "200" => PhyClock::Mhz200,
        "250" => PhyClock::Mhz250,
        "400" => PhyClock::Mhz400,
        "500" => PhyClock::Mhz500,
        "788" => PhyClock::Mhz788,
        "800" => PhyClock::Mhz800,
        _ => return Err(format!("unknown target {s}")),
    };
    Ok(TargetPhyClock::SpeedUp(clock))
}

fn parse_window(s: &str) -> Result<RangeInclusive<u8>, String> {
    let (lo, hi) = s.split_once('-').ok_or_else(|| format!("window {s} is not LO-HI"))?;
    let lo: u8 = lo.parse().map_err(|e| format!("window {s}: {e}"))?;
    let hi: u8 = hi.parse().map_err(|e| format!("window {s}: {e}"))?;
    Ok(lo..=hi)
}

fn parse_lane(s: &str) -> Result<(usize, RangeInclusive<u8>), String> {
    let (lane, window) = s.split_once('=').ok_or_else(|| format!("lane {s} is not N=LO-HI"))?;
    let lane: usize = lane.parse().map_err(|e| format!("lane {s}: {e}"))?;
    if lane >= sli_link::MEMORY_LANES {
        return Err(format!("lane {lane} out of range"));
    }
    Ok((lane, parse_window(window)?))
}

fn build_dies(options: &Options, groups: &ChannelGroups) -> DiePair {
    let mut dies = DiePair::soc();

    let mut memory: [RangeInclusive<u8>; sli_link::MEMORY_LANES] =
        std::array::from_fn(|_| options.memory_window.clone());
    for (lane, window) in &options.lane_windows {
        memory[*lane] = window.clone();
    }
    dies.block_mut(groups.memory_cpu.block()).set_lane_windows(memory);
    dies.block_mut(groups.ahb_io.block())
        .set_shared_window(2, options.ahb_window.clone());

    if options.trained {
        dies.preload(
            groups.ahb_io.block(),
            SliCtrlIII::new().with_phy_clock_select(options.target.phy_clock().select()),
        );
    }
    dies
}

fn print_report(report: &CalibrationReport, dies: &DiePair) {
    println!("PHY clock      {:?} ({} Hz)", report.clocks.phy_clock, report.clocks.phy_rate_hz());
    println!("engine clock   {:?}", report.clocks.engine_clock);
    println!("reference      {} Hz", report.clocks.reference_hz);
    println!("workaround     {}", if report.workaround_applied { "applied" } else { "no" });
    println!(
        "SLIH tap       {} (window {}{})",
        report.ahb.selected,
        report.ahb.window,
        if report.ahb.fell_back { ", fallback" } else { "" }
    );
    println!(
        "SLIM coarse    {} (window {}{})",
        report.memory_coarse.selected,
        report.memory_coarse.window,
        if report.memory_coarse.fell_back { ", fallback" } else { "" }
    );
    for (lane, result) in report.memory_lanes.iter().enumerate() {
        println!("SLIM lane {lane}    {} (window {})", result.selected, result.window);
    }
    println!("simulated time {} us", dies.elapsed_us());
}

fn main() -> ExitCode {
    let options = match Options::parse(env::args().skip(1)) {
        Ok(options) => options,
        Err(e) => {
            eprintln!("sli-sim: {e}");
            eprintln!("{USAGE}");
            return ExitCode::from(2);
        }
    };

    if LOGGER.init().is_ok() {
        log::set_max_level(options.level);
    }

    let groups = ChannelGroups::soc();
    let config = TrainingConfig::new(options.revision, options.target);
    let mut dies = build_dies(&options, &groups);

    match train_links(&mut dies, &groups, &config) {
        Ok(Linked::AlreadyTrained) => {
            println!("already trained, {} register writes", dies.writes().len());
            ExitCode::SUCCESS
        }
        Ok(Linked::Calibrated(report)) => {
            print_report(&report, &dies);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("sli-sim: {e}");
            ExitCode::FAILURE
        }
    }
}
