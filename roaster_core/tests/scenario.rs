//! End-to-end roasts through the full tick pipeline.
use std::sync::atomic::AtomicBool;

use roaster_core::mocks::MockRig;
use roaster_core::{RoastPhase, RoastStatus, Roaster, RunLimits, StopReason};
use roaster_hardware::{SimDialKind, SimParams, SimProbe, SimPwmKind, SimRig};
use roaster_traits::clock::test_clock::TestClock;

/// Tick every 10ms for `ms` of clock time, returning the last status.
fn run_for(roaster: &mut Roaster, clock: &TestClock, ms: u64) -> RoastStatus {
    let mut last = roaster.status().clone();
    for _ in 0..ms / 10 {
        last = roaster.tick().expect("tick");
        clock.advance_ms(10);
    }
    last
}

fn step(roaster: &mut Roaster, clock: &TestClock) -> RoastStatus {
    run_for(roaster, clock, 10)
}

#[test]
fn mock_rig_roasts_from_ready_to_done() {
    let rig = MockRig::default();
    rig.intake.set(330.0);
    rig.bean.set(70.0);
    rig.heat_dial.set(4095);
    rig.fan_dial.set(2048);
    rig.load_cell.set_raw(84_000);

    let clock = TestClock::new();
    let mut roaster = rig
        .builder()
        .with_clock(clock.clone())
        .try_build()
        .expect("build");

    assert_eq!(step(&mut roaster, &clock).phase, RoastPhase::Preheat);
    assert_eq!(step(&mut roaster, &clock).phase, RoastPhase::Tare);
    assert_eq!(step(&mut roaster, &clock).phase, RoastPhase::Load);
    assert_eq!(roaster.calibration().zero_counts, 84_000);

    // Pour 100 g; nothing happens until the button is pressed
    rig.load_cell.set_raw(94_000);
    assert_eq!(run_for(&mut roaster, &clock, 200).phase, RoastPhase::Load);
    rig.button.press();
    assert_eq!(step(&mut roaster, &clock).phase, RoastPhase::Calibrate);
    assert_eq!(step(&mut roaster, &clock).phase, RoastPhase::Roast);
    assert!((roaster.calibration().gain_units_per_count - 0.01).abs() < 1e-6);

    // Beans lose 12 g of moisture
    rig.load_cell.set_raw(92_800);
    let status = run_for(&mut roaster, &clock, 1_000);
    assert_eq!(status.phase, RoastPhase::Roast);
    assert!((status.weight_units - 88.0).abs() < 0.01);
    assert!((status.drop_percent - 12.0).abs() < 0.01);
    assert!(status.elapsed_roast_ms >= 990);
    assert_eq!(roaster.command().heat_duty, 4095);
    assert_eq!(roaster.command().fan_duty, 2048);

    rig.heat_dial.set(0);
    let status = step(&mut roaster, &clock);
    assert_eq!(status.phase, RoastPhase::Drop);
    let frozen = status.elapsed_roast_ms;
    assert_eq!(rig.heater.last(), Some(0));

    rig.bean.set(140.0);
    let status = run_for(&mut roaster, &clock, 300);
    assert_eq!(status.phase, RoastPhase::Done);
    assert_eq!(status.elapsed_roast_ms, frozen);
    assert_eq!(status.elapsed_total_ms, clock.elapsed_ms() - 10);

    run_for(&mut roaster, &clock, 300);
    let lines = rig.telemetry.lines();
    assert!(lines.iter().any(|l| l.contains(",cook,")));
    assert!(lines.iter().any(|l| l.contains(",done,")));
}

#[test]
fn run_stops_at_done_and_zeroes_outputs() {
    let rig = MockRig::default();
    rig.heat_dial.set(2000);
    rig.fan_dial.set(3000);
    let clock = TestClock::new();
    let mut roaster = rig
        .builder()
        .with_clock(clock.clone())
        .try_build()
        .expect("build");

    // Jump straight to Drop; the beans are already cool
    for _ in 0..RoastPhase::Drop.index() {
        roaster.request_advance();
        roaster.tick().expect("tick");
        clock.advance_ms(10);
    }
    assert_eq!(roaster.phase(), RoastPhase::Drop);

    let limits = RunLimits {
        duration_ms: Some(5_000),
        stop_at_done: true,
        ..RunLimits::default()
    };
    let summary = roaster
        .run(&AtomicBool::new(false), limits)
        .expect("run");
    assert_eq!(summary.reason, StopReason::Done);
    assert_eq!(summary.status.phase, RoastPhase::Done);
    assert!(summary.elapsed_ms <= 260);
    assert_eq!(rig.heater.last(), Some(0));
    assert_eq!(rig.fan.last(), Some(0));
}

#[test]
fn shutdown_flag_stops_before_first_tick() {
    let rig = MockRig::default();
    let mut roaster = rig
        .builder()
        .with_clock(TestClock::new())
        .try_build()
        .expect("build");
    let summary = roaster
        .run(&AtomicBool::new(true), RunLimits::default())
        .expect("run");
    assert_eq!(summary.reason, StopReason::Shutdown);
    assert_eq!(summary.ticks, 0);
    assert_eq!(rig.heater.last(), Some(0));
}

#[test]
fn simulated_rig_preheats_tares_and_calibrates() {
    let clock = TestClock::new();
    let sim = SimRig::new(
        SimParams {
            heat_raw: 4095,
            ..SimParams::default()
        },
        std::sync::Arc::new(clock.clone()),
    );
    let mut roaster = Roaster::builder()
        .with_dials(sim.dial(SimDialKind::Fan), sim.dial(SimDialKind::Heat))
        .with_thermocouples(
            sim.thermocouple(SimProbe::Bean),
            sim.thermocouple(SimProbe::Intake),
        )
        .with_load_cell(sim.load_cell())
        .with_outputs(sim.pwm(SimPwmKind::Heater), sim.pwm(SimPwmKind::Fan))
        .with_button(sim.button())
        .with_clock(clock.clone())
        .try_build()
        .expect("build");

    // Full heat brings the intake past 325 °F in well under 30 s
    let status = run_for(&mut roaster, &clock, 30_000);
    assert_eq!(status.phase, RoastPhase::Load);
    assert!(sim.intake_f() >= 325.0);
    assert_eq!(roaster.calibration().zero_counts, 84_000);
    assert!((sim.duty_fractions().0 - 1.0).abs() < 1e-6);

    sim.load_charge(100.0);
    sim.press();
    assert_eq!(step(&mut roaster, &clock).phase, RoastPhase::Calibrate);
    assert_eq!(step(&mut roaster, &clock).phase, RoastPhase::Roast);
    assert!((roaster.calibration().gain_units_per_count - 0.01).abs() < 1e-5);

    let status = run_for(&mut roaster, &clock, 200);
    assert!((status.weight_units - sim.weight_units()).abs() < 0.5);
}
