//! Diagnostic readouts, one per peripheral class.

use std::fmt;
use std::str::FromStr;

use crate::actuator::{ActuatorCommand, DutyMap};
use crate::error::SensorError;
use crate::sensors::{Reading, SensorSnapshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagMode {
    Buttons,
    Pots,
    Thermocouples,
    Scale,
}

impl DiagMode {
    pub const ALL: [Self; 4] = [Self::Buttons, Self::Pots, Self::Thermocouples, Self::Scale];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Buttons => "buttons",
            Self::Pots => "pots",
            Self::Thermocouples => "thermocouples",
            Self::Scale => "scale",
        }
    }
}

impl fmt::Display for DiagMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DiagMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                format!("unknown diagnostic mode `{s}` (expected buttons|pots|thermocouples|scale)")
            })
    }
}

/// Inputs a diagnostic frame is rendered from.
#[derive(Debug, Clone, Copy)]
pub struct DiagInputs<'a> {
    pub snapshot: &'a SensorSnapshot,
    pub command: &'a ActuatorCommand,
    pub map: &'a DutyMap,
    pub presses: u32,
}

/// Title plus body lines for one diagnostic screen.
pub fn frame(mode: DiagMode, inputs: &DiagInputs<'_>) -> Vec<String> {
    match mode {
        DiagMode::Buttons => buttons(inputs),
        DiagMode::Pots => pots(inputs),
        DiagMode::Thermocouples => thermocouples(inputs),
        DiagMode::Scale => scale(inputs),
    }
}

fn buttons(inputs: &DiagInputs<'_>) -> Vec<String> {
    vec![
        "Test Buttons".to_owned(),
        format!("Button 0: {}", inputs.presses),
    ]
}

fn pot_line(label: &str, reading: &Reading<u16>, map: &DutyMap) -> String {
    if let Some(e) = &reading.fault {
        return format!("{label:<4} {}", fault_text(e));
    }
    let raw = reading.value;
    let dial = map.dial_hundredths(raw);
    format!(
        "{label:<4} {raw:4} {:3}% {}.{:02}",
        map.percent(raw),
        dial / 100,
        dial % 100
    )
}

fn pots(inputs: &DiagInputs<'_>) -> Vec<String> {
    vec![
        "Test Potentiometers".to_owned(),
        "Pot   Res Duty Dial".to_owned(),
        "-------------------".to_owned(),
        pot_line("Fan", &inputs.snapshot.fan_raw, inputs.map),
        pot_line("Heat", &inputs.snapshot.heat_raw, inputs.map),
        format!(
            "Duty heat {} fan {}",
            inputs.command.heat_duty, inputs.command.fan_duty
        ),
    ]
}

fn temp_line(label: &str, reading: &Reading<f32>) -> String {
    match (&reading.fault, reading.has_value()) {
        (Some(e), _) => format!("{label:<7} {}", fault_text(e)),
        (None, false) => format!("{label:<7} --"),
        (None, true) => {
            let f = reading.value;
            let c = (f - 32.0) * 5.0 / 9.0;
            format!("{label:<7} {c:6.1} {f:6.1}")
        }
    }
}

fn thermocouples(inputs: &DiagInputs<'_>) -> Vec<String> {
    vec![
        "Test Thermocouples".to_owned(),
        "Therm       °C     °F".to_owned(),
        "---------------------".to_owned(),
        temp_line("Intake", &inputs.snapshot.intake_temp_f),
        temp_line("Bean", &inputs.snapshot.bean_temp_f),
    ]
}

fn scale(inputs: &DiagInputs<'_>) -> Vec<String> {
    let w = &inputs.snapshot.raw_weight;
    let body = match &w.fault {
        Some(e) => format!("Scale {}", fault_text(e)),
        None => format!("Raw {} Weight {:.2}", w.value, inputs.snapshot.weight_units),
    };
    vec!["Test Scale".to_owned(), body]
}

fn fault_text(e: &SensorError) -> String {
    match e {
        SensorError::Timeout => "timeout".to_owned(),
        SensorError::Hardware(msg) => format!("fault: {msg}"),
        SensorError::Implausible(v) => format!("implausible {v:.1}"),
    }
}
