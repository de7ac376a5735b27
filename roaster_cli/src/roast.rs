//! Command bodies: config loading, telemetry sink assembly, the roast run,
//! self-check and diagnostics.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use eyre::WrapErr;
use roaster_core::diag::DiagMode;
use roaster_core::display::TraceDisplay;
use roaster_core::telemetry::HEADER;
use roaster_core::writer::{FileSink, LineWriter, StdoutSink, TeeSink};
use roaster_core::{
    Channel, RoasterError, RoasterSettings, RunLimits, RunSummary, SensorError, StopReason,
};
use roaster_traits::LineSink;

use crate::cli::DEFAULT_CONFIG;

/// Queue depth of the background telemetry writer.
const WRITER_CAPACITY: usize = 256;

/// Limits and overrides from `roaster run`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunArgs {
    pub duration_ms: Option<u64>,
    pub max_ticks: Option<u64>,
    pub target_g: Option<f32>,
    pub until_done: bool,
    pub tee: bool,
}

/// Load and validate the config. Without `--config`, the default path is
/// used when it exists and built-in defaults otherwise.
pub fn load_config(path: Option<&Path>) -> eyre::Result<roaster_config::Config> {
    let path = match path {
        Some(p) => Some(p),
        None => Some(Path::new(DEFAULT_CONFIG)).filter(|p| p.exists()),
    };
    let Some(path) = path else {
        return Ok(roaster_config::Config::default());
    };
    roaster_config::load_file(path)
        .map_err(|e| eyre::Report::new(RoasterError::Config(format!("{e:#}"))))
}

pub fn stop_reason_name(r: StopReason) -> &'static str {
    match r {
        StopReason::Shutdown => "Shutdown",
        StopReason::MaxTicks => "MaxTicks",
        StopReason::Duration => "Duration",
        StopReason::Done => "Done",
    }
}

/// Telemetry destination per `[telemetry]` and `--tee`.
fn telemetry_sink(
    cfg: &roaster_config::Telemetry,
    tee: bool,
) -> eyre::Result<Box<dyn LineSink + Send>> {
    let mut sink: Box<dyn LineSink + Send> = match cfg.file.as_deref() {
        Some(path) => {
            let file = FileSink::create(Path::new(path))
                .wrap_err_with(|| format!("open telemetry file {path}"))?;
            if tee {
                Box::new(TeeSink::new(file, StdoutSink))
            } else {
                Box::new(file)
            }
        }
        None => Box::new(StdoutSink),
    };
    sink.write_line(HEADER)
        .map_err(|e| eyre::eyre!("write telemetry header: {e}"))?;
    Ok(sink)
}

pub fn run_roast(
    cfg: &roaster_config::Config,
    args: RunArgs,
    shutdown: &Arc<AtomicBool>,
) -> eyre::Result<RunSummary> {
    let mut settings = RoasterSettings::from(cfg);
    if let Some(g) = args.target_g {
        if !(g.is_finite() && g > 0.0) {
            return Err(eyre::Report::new(RoasterError::Config(format!(
                "--target-g must be > 0 (got {g})"
            ))));
        }
        settings.roast.target_charge_units = g;
    }

    let sink = telemetry_sink(&cfg.telemetry, args.tee)?;
    let builder = crate::rig::builder(cfg)?
        .with_settings(settings)
        .with_display(TraceDisplay);
    let builder = if cfg.telemetry.background {
        builder.with_telemetry(LineWriter::spawn(sink, WRITER_CAPACITY))
    } else {
        builder.with_telemetry(sink)
    };
    let mut roaster = builder.try_build()?;

    tracing::info!(
        target_g = roaster.settings().roast.target_charge_units,
        tick_ms = roaster.settings().sampling.tick_ms,
        "roast start"
    );
    let limits = RunLimits {
        max_ticks: args.max_ticks,
        duration_ms: args.duration_ms,
        stop_at_done: args.until_done,
    };
    let summary = roaster.run(shutdown, limits)?;
    // Joins the background writer, if any, before the summary is printed
    drop(roaster);
    Ok(summary)
}

pub fn print_summary(summary: &RunSummary, json: bool) {
    let st = &summary.status;
    if json {
        let obj = serde_json::json!({
            "reason": stop_reason_name(summary.reason),
            "ticks": summary.ticks,
            "elapsed_ms": summary.elapsed_ms,
            "phase": st.phase.label(),
            "elapsed_roast_ms": st.elapsed_roast_ms,
            "elapsed_total_ms": st.elapsed_total_ms,
            "weight_g": st.weight_units,
            "drop_percent": st.drop_percent,
            "fault": st.fault.as_ref().map(ToString::to_string),
        });
        println!("{obj}");
    } else {
        println!(
            "roast stopped ({}): phase={} ticks={} elapsed={}ms roast={}ms weight={:.2}g drop={:.2}%",
            stop_reason_name(summary.reason),
            st.phase,
            summary.ticks,
            summary.elapsed_ms,
            st.elapsed_roast_ms,
            st.weight_units,
            st.drop_percent,
        );
    }
}

/// Print every channel's state; fail with the first fault found.
pub fn self_check(cfg: &roaster_config::Config, json: bool) -> eyre::Result<()> {
    let mut roaster = crate::rig::builder(cfg)?
        .with_settings(RoasterSettings::from(cfg))
        .try_build()?;
    let report = roaster.self_check();

    if json {
        let channels: serde_json::Map<String, serde_json::Value> = report
            .iter()
            .map(|(c, f)| {
                let v = f.as_ref().map_or(serde_json::Value::Null, |e| e.to_string().into());
                (c.as_str().to_owned(), v)
            })
            .collect();
        println!("{}", serde_json::json!({ "self_check": channels }));
    } else {
        for (channel, fault) in &report {
            match fault {
                None => println!("{channel:<7} ok"),
                Some(e) => println!("{channel:<7} FAULT {e}"),
            }
        }
    }

    let first_fault: Option<(Channel, SensorError)> = report
        .into_iter()
        .find_map(|(c, f)| f.map(|e| (c, e)));
    match first_fault {
        None => Ok(()),
        Some((channel, source)) => Err(eyre::Report::new(RoasterError::Sensor { channel, source })),
    }
}

pub fn diag(cfg: &roaster_config::Config, mode: DiagMode) -> eyre::Result<()> {
    let mut roaster = crate::rig::builder(cfg)?
        .with_settings(RoasterSettings::from(cfg))
        .try_build()?;
    for line in roaster.diag_frame(mode) {
        println!("{line}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_explicit_config_is_a_config_error() {
        let err = load_config(Some(Path::new("/nonexistent/roaster.toml"))).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<RoasterError>(),
            Some(RoasterError::Config(msg)) if msg.contains("read config")
        ));
    }

    #[test]
    fn stop_reasons_have_stable_names() {
        assert_eq!(stop_reason_name(StopReason::MaxTicks), "MaxTicks");
        assert_eq!(stop_reason_name(StopReason::Done), "Done");
    }
}
