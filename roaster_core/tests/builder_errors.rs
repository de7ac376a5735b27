use roaster_core::config::RoasterSettings;
use roaster_core::error::BuildError;
use roaster_core::mocks::{MockRig, RecordingPwm, SharedDial, SharedLoadCell, SharedThermocouple};
use roaster_core::{Roaster, RoasterBuilder};
use rstest::rstest;

fn expect_build_error(builder: RoasterBuilder) -> BuildError {
    let err = builder.try_build().expect_err("build should fail");
    match err.downcast_ref::<BuildError>() {
        Some(e) => e.clone(),
        None => panic!("expected BuildError, got: {err:?}"),
    }
}

#[rstest]
fn builder_missing_dials_yields_typed_build_error() {
    let b = Roaster::builder()
        .with_thermocouples(SharedThermocouple::default(), SharedThermocouple::default())
        .with_load_cell(SharedLoadCell::default())
        .with_outputs(RecordingPwm::default(), RecordingPwm::default());
    assert_eq!(expect_build_error(b), BuildError::MissingDial);
}

#[rstest]
fn builder_missing_thermocouples_yields_typed_build_error() {
    let b = Roaster::builder()
        .with_dials(SharedDial::default(), SharedDial::default())
        .with_load_cell(SharedLoadCell::default())
        .with_outputs(RecordingPwm::default(), RecordingPwm::default());
    assert_eq!(expect_build_error(b), BuildError::MissingThermocouple);
}

#[rstest]
fn builder_missing_load_cell_yields_typed_build_error() {
    let b = Roaster::builder()
        .with_dials(SharedDial::default(), SharedDial::default())
        .with_thermocouples(SharedThermocouple::default(), SharedThermocouple::default())
        .with_outputs(RecordingPwm::default(), RecordingPwm::default());
    assert_eq!(expect_build_error(b), BuildError::MissingLoadCell);
}

#[rstest]
fn builder_missing_outputs_yields_typed_build_error() {
    let b = Roaster::builder()
        .with_dials(SharedDial::default(), SharedDial::default())
        .with_thermocouples(SharedThermocouple::default(), SharedThermocouple::default())
        .with_load_cell(SharedLoadCell::default());
    assert_eq!(expect_build_error(b), BuildError::MissingPwm);
}

#[rstest]
#[case::zero_tick(|s: &mut RoasterSettings| s.sampling.tick_ms = 0)]
#[case::zero_fps(|s: &mut RoasterSettings| s.display.fps = 0)]
#[case::zero_telemetry_interval(|s: &mut RoasterSettings| s.telemetry.interval_ms = 0)]
#[case::zero_charge(|s: &mut RoasterSettings| s.roast.target_charge_units = 0.0)]
#[case::zero_samples(|s: &mut RoasterSettings| s.calibration.samples = 0)]
#[case::zero_gain(|s: &mut RoasterSettings| s.initial_calibration.gain_units_per_count = 0.0)]
fn builder_rejects_invalid_settings(#[case] tweak: fn(&mut RoasterSettings)) {
    let mut settings = RoasterSettings::default();
    tweak(&mut settings);
    let b = MockRig::default().builder().with_settings(settings);
    assert!(matches!(
        expect_build_error(b),
        BuildError::InvalidConfig(_)
    ));
}

#[test]
fn builder_with_all_devices_succeeds() {
    let rig = MockRig::default();
    let roaster = rig.builder().try_build().expect("build");
    assert_eq!(roaster.ticks(), 0);
    assert_eq!(roaster.phase(), roaster_core::RoastPhase::Ready);
}
