//! Telemetry and display output through the running controller.
use std::sync::atomic::AtomicBool;

use roaster_core::config::RoasterSettings;
use roaster_core::error::{Channel, SensorError};
use roaster_core::mocks::MockRig;
use roaster_core::telemetry::HEADER;
use roaster_core::{RoastPhase, Roaster, RunLimits};
use roaster_traits::clock::test_clock::TestClock;

fn build(rig: &MockRig, clock: &TestClock, settings: RoasterSettings) -> Roaster {
    rig.builder()
        .with_settings(settings)
        .with_clock(clock.clone())
        .try_build()
        .expect("build")
}

fn run_ticks(roaster: &mut Roaster, ticks: u64) {
    let limits = RunLimits {
        max_ticks: Some(ticks),
        ..RunLimits::default()
    };
    roaster
        .run(&AtomicBool::new(false), limits)
        .expect("run");
}

#[test]
fn first_line_reflects_the_first_tick() {
    let rig = MockRig::default();
    let clock = TestClock::new();
    let mut roaster = build(&rig, &clock, RoasterSettings::default());
    run_ticks(&mut roaster, 1);
    assert_eq!(rig.telemetry.lines(), vec!["0,0,heat,0,0,70.00,70.00,0.00,0.00"]);
    assert_eq!(HEADER.split(',').count(), 9);
}

#[test]
fn lines_are_spaced_by_the_interval() {
    let rig = MockRig::default();
    let clock = TestClock::new();
    let mut roaster = build(&rig, &clock, RoasterSettings::default());
    run_ticks(&mut roaster, 100);

    let lines = rig.telemetry.lines();
    assert_eq!(lines.len(), 4);
    let totals: Vec<u64> = lines
        .iter()
        .map(|l| l.split(',').nth(1).and_then(|f| f.parse().ok()).expect("elapsed_total_ms"))
        .collect();
    assert_eq!(totals, vec![0, 250, 500, 750]);
}

#[test]
fn display_is_capped_at_its_frame_rate() {
    let rig = MockRig::default();
    rig.heat_dial.set(4095);
    let clock = TestClock::new();
    let mut roaster = build(&rig, &clock, RoasterSettings::default());
    run_ticks(&mut roaster, 100);

    let frames = rig.display.frames();
    assert!(!frames.is_empty());
    assert!(frames.len() <= 60, "{} frames in one second", frames.len());
    let first = &frames[0];
    assert_eq!(first.phase, RoastPhase::Preheat);
    assert_eq!(first.heat_percent, 100);
    assert_eq!(first.heat_dial, 833);
    assert!(!first.calibrating);
}

#[test]
fn display_cap_holds_with_millisecond_ticks() {
    let mut settings = RoasterSettings::default();
    settings.sampling.tick_ms = 1;
    let rig = MockRig::default();
    let clock = TestClock::new();
    let mut roaster = build(&rig, &clock, settings);
    run_ticks(&mut roaster, 1_000);

    assert_eq!(clock.elapsed_ms(), 1_000);
    let frames = rig.display.frames().len();
    assert!(frames <= 60, "{frames} frames in one second");
    assert!(frames >= 58, "{frames} frames in one second");
}

#[test]
fn sink_failure_does_not_stop_the_loop() {
    let rig = MockRig::default();
    rig.telemetry.set_failing(true);
    let clock = TestClock::new();
    let mut roaster = build(&rig, &clock, RoasterSettings::default());

    run_ticks(&mut roaster, 50);
    assert_eq!(roaster.ticks(), 50);
    assert!(rig.telemetry.lines().is_empty());

    rig.telemetry.set_failing(false);
    run_ticks(&mut roaster, 50);
    assert_eq!(roaster.ticks(), 100);
    assert!(!rig.telemetry.lines().is_empty());
}

#[test]
fn faults_column_names_faulted_channels() {
    let mut settings = RoasterSettings::default();
    settings.telemetry.include_faults = true;
    let rig = MockRig::default();
    rig.intake.fail("thermocouple open");
    rig.load_cell.set_failing(true);
    let clock = TestClock::new();
    let mut roaster = build(&rig, &clock, settings);

    run_ticks(&mut roaster, 1);
    let line = rig.telemetry.lines().pop().expect("line");
    assert!(line.ends_with(",intake|weight"), "{line}");
    assert_eq!(
        roaster.snapshot().fault(Channel::Weight),
        Some(&SensorError::Timeout)
    );

    rig.intake.set(100.0);
    rig.load_cell.set_failing(false);
    run_ticks(&mut roaster, 30);
    let line = rig.telemetry.lines().pop().expect("line");
    assert!(line.ends_with(",-"), "{line}");
}

#[test]
fn faulted_intake_holds_preheat_until_it_recovers() {
    let rig = MockRig::default();
    rig.intake.fail("thermocouple open");
    let clock = TestClock::new();
    let mut roaster = build(&rig, &clock, RoasterSettings::default());

    run_ticks(&mut roaster, 60);
    assert_eq!(roaster.phase(), RoastPhase::Preheat);

    rig.intake.set(400.0);
    run_ticks(&mut roaster, 30);
    assert!(roaster.phase() > RoastPhase::Preheat);
}

#[test]
fn implausible_reading_is_a_fault_not_a_value() {
    let rig = MockRig::default();
    rig.intake.set(1_500.0);
    let clock = TestClock::new();
    let mut roaster = build(&rig, &clock, RoasterSettings::default());
    run_ticks(&mut roaster, 10);
    assert_eq!(roaster.phase(), RoastPhase::Preheat);
    assert!(matches!(
        roaster.snapshot().fault(Channel::IntakeTemp),
        Some(SensorError::Implausible(_))
    ));
}
