#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // Parse and validation errors are fine; panics are not.
    if let Ok(cfg) = roaster_config::load_toml(data)
        && cfg.validate().is_ok()
    {
        // A validated config must convert without panicking
        let _ = roaster_core::RoasterSettings::from(&cfg);
    }
});
