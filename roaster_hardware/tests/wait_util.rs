use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use std::thread;
use std::time::Duration;

use roaster_hardware::error::HwError;
use roaster_hardware::util::{decode_max6675, wait_until_low_with_timeout};
use rstest::rstest;

#[test]
fn wait_until_low_success_path() {
    let high = Arc::new(AtomicBool::new(true));
    let high_bg = high.clone();
    thread::spawn(move || {
        thread::sleep(Duration::from_millis(3));
        high_bg.store(false, Ordering::Relaxed);
    });

    let res = wait_until_low_with_timeout(
        || high.load(Ordering::Relaxed),
        Duration::from_millis(200),
        Duration::from_micros(200),
    );
    assert!(res.is_ok(), "expected success, got {res:?}");
}

#[test]
fn wait_until_low_timeout_path() {
    let high = Arc::new(AtomicBool::new(true));

    let err = wait_until_low_with_timeout(
        || high.load(Ordering::Relaxed),
        Duration::from_millis(5),
        Duration::from_micros(200),
    )
    .expect_err("expected timeout error");

    assert!(matches!(err, HwError::DataReadyTimeout), "got {err:?}");
}

#[rstest]
#[case(0x0000, 32.0)]
// 100 °C = 400 quarter degrees
#[case(400 << 3, 212.0)]
// 25.25 °C
#[case(101 << 3, 77.45)]
fn max6675_frames_decode_to_fahrenheit(#[case] frame: u16, #[case] expected_f: f32) {
    let f = decode_max6675(frame).expect("closed thermocouple");
    assert!((f - expected_f).abs() < 0.01, "{f} != {expected_f}");
}

#[test]
fn max6675_open_circuit_is_an_error() {
    let err = decode_max6675((400 << 3) | 0x0004).expect_err("open circuit");
    assert!(matches!(err, HwError::ThermocoupleOpen));
}
