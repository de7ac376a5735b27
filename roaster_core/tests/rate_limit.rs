//! Acquisition cadence under a deterministic clock.
use std::sync::atomic::AtomicBool;

use roaster_core::config::RoasterSettings;
use roaster_core::mocks::MockRig;
use roaster_core::{RunLimits, StopReason};
use roaster_traits::clock::test_clock::TestClock;
use rstest::rstest;

#[rstest]
#[case(10, 250, 100, 1_000, 4, 10)]
#[case(10, 100, 50, 1_000, 10, 20)]
#[case(20, 250, 100, 2_000, 8, 20)]
fn sensor_classes_read_at_their_own_cadence(
    #[case] tick_ms: u64,
    #[case] thermocouple_ms: u64,
    #[case] load_cell_ms: u64,
    #[case] duration_ms: u64,
    #[case] tc_reads: u64,
    #[case] lc_reads: u64,
) {
    let mut settings = RoasterSettings::default();
    settings.sampling.tick_ms = tick_ms;
    settings.sampling.thermocouple_ms = thermocouple_ms;
    settings.sampling.load_cell_ms = load_cell_ms;

    let rig = MockRig::default();
    let clock = TestClock::new();
    let mut roaster = rig
        .builder()
        .with_settings(settings)
        .with_clock(clock.clone())
        .try_build()
        .expect("build");

    let limits = RunLimits {
        max_ticks: Some(duration_ms / tick_ms),
        ..RunLimits::default()
    };
    let summary = roaster
        .run(&AtomicBool::new(false), limits)
        .expect("run");

    assert_eq!(summary.reason, StopReason::MaxTicks);
    assert_eq!(summary.ticks, duration_ms / tick_ms);
    assert_eq!(rig.bean.reads(), tc_reads);
    assert_eq!(rig.intake.reads(), tc_reads);
    assert_eq!(rig.load_cell.reads(), lc_reads);
}

#[test]
fn dials_and_outputs_update_every_tick() {
    let rig = MockRig::default();
    rig.heat_dial.set(4095);
    rig.fan_dial.set(1024);
    let clock = TestClock::new();
    let mut roaster = rig
        .builder()
        .with_clock(clock.clone())
        .try_build()
        .expect("build");

    let limits = RunLimits {
        max_ticks: Some(100),
        ..RunLimits::default()
    };
    roaster
        .run(&AtomicBool::new(false), limits)
        .expect("run");

    // One write per tick plus the zeroing on exit
    assert_eq!(rig.heater.writes(), 101);
    assert_eq!(rig.fan.writes(), 101);
    assert_eq!(rig.heater.last(), Some(0));
    assert_eq!(roaster.command().heat_duty, 4095);
    assert_eq!(roaster.command().fan_duty, 1024);
    assert_eq!(clock.elapsed_ms(), 1_000);
}

#[test]
fn duration_limit_counts_clock_time() {
    let rig = MockRig::default();
    let clock = TestClock::new();
    let mut roaster = rig
        .builder()
        .with_clock(clock.clone())
        .try_build()
        .expect("build");

    let limits = RunLimits {
        duration_ms: Some(500),
        ..RunLimits::default()
    };
    let summary = roaster
        .run(&AtomicBool::new(false), limits)
        .expect("run");
    assert_eq!(summary.reason, StopReason::Duration);
    assert_eq!(summary.ticks, 50);
    assert_eq!(summary.elapsed_ms, 500);
}
