//! Dial-to-PWM mapping for the heater and fan.

use roaster_traits::PwmOutput;

use crate::config::ActuatorCfg;
use crate::error::RoasterError;
use crate::hw_error::map_actuator_error;
use crate::sensors::SensorSnapshot;
use crate::util::max_for_bits;

/// Full dial travel is 300° of a 360° knob marked 0..10.
const DIAL_TRAVEL_DEG: u64 = 300;
const DIAL_FULL_TURN_DEG: u64 = 360;
const DIAL_MARKS: u64 = 10;

/// Integer scaling from raw ADC counts to duty, percent and dial position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DutyMap {
    max_raw: u32,
    max_duty: u32,
}

impl DutyMap {
    pub fn new(adc_bits: u8, duty_bits: u8) -> Self {
        Self {
            max_raw: max_for_bits(adc_bits),
            max_duty: max_for_bits(duty_bits),
        }
    }

    pub const fn max_raw(&self) -> u32 {
        self.max_raw
    }

    pub const fn max_duty(&self) -> u32 {
        self.max_duty
    }

    fn clamp(&self, raw: u16) -> u64 {
        u64::from(u32::from(raw).min(self.max_raw))
    }

    /// `raw * 100 / MAX_RAW`, rounded down.
    pub fn percent(&self, raw: u16) -> u8 {
        let p = self.clamp(raw) * 100 / u64::from(self.max_raw);
        u8::try_from(p).unwrap_or(100)
    }

    /// `raw * MAX_DUTY / MAX_RAW`, rounded down.
    pub fn duty(&self, raw: u16) -> u32 {
        let d = self.clamp(raw) * u64::from(self.max_duty) / u64::from(self.max_raw);
        u32::try_from(d).unwrap_or(self.max_duty)
    }

    /// Dial position in hundredths of a mark (`833` reads as 8.33).
    pub fn dial_hundredths(&self, raw: u16) -> u32 {
        let h = self.clamp(raw) * DIAL_TRAVEL_DEG * DIAL_MARKS * 100
            / (DIAL_FULL_TURN_DEG * u64::from(self.max_raw));
        u32::try_from(h).unwrap_or(u32::MAX)
    }
}

impl Default for DutyMap {
    fn default() -> Self {
        Self::new(12, 12)
    }
}

/// Duties derived from the dials on one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActuatorCommand {
    pub heat_duty: u32,
    pub fan_duty: u32,
    pub heat_percent: u8,
    pub fan_percent: u8,
    pub heat_dial: u32,
    pub fan_dial: u32,
}

impl ActuatorCommand {
    pub fn from_raw(map: &DutyMap, heat_raw: u16, fan_raw: u16) -> Self {
        Self {
            heat_duty: map.duty(heat_raw),
            fan_duty: map.duty(fan_raw),
            heat_percent: map.percent(heat_raw),
            fan_percent: map.percent(fan_raw),
            heat_dial: map.dial_hundredths(heat_raw),
            fan_dial: map.dial_hundredths(fan_raw),
        }
    }

    /// Same command with both outputs driven to zero.
    #[must_use]
    pub const fn zeroed(&self) -> Self {
        Self {
            heat_duty: 0,
            fan_duty: 0,
            ..*self
        }
    }
}

/// Writes heater and fan duty every tick; no deadband, no smoothing.
pub struct ActuatorDriver {
    heater: Box<dyn PwmOutput>,
    fan: Box<dyn PwmOutput>,
    map: DutyMap,
    last: Option<ActuatorCommand>,
}

impl core::fmt::Debug for ActuatorDriver {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ActuatorDriver")
            .field("map", &self.map)
            .field("last", &self.last)
            .finish_non_exhaustive()
    }
}

impl ActuatorDriver {
    pub fn new(heater: Box<dyn PwmOutput>, fan: Box<dyn PwmOutput>, cfg: &ActuatorCfg) -> Self {
        Self {
            heater,
            fan,
            map: DutyMap::new(cfg.adc_bits, cfg.duty_bits),
            last: None,
        }
    }

    pub const fn map(&self) -> &DutyMap {
        &self.map
    }

    /// Command implied by the snapshot's last-known dial values.
    pub fn command(&self, snapshot: &SensorSnapshot) -> ActuatorCommand {
        ActuatorCommand::from_raw(&self.map, snapshot.heat_raw.value, snapshot.fan_raw.value)
    }

    /// Write both duties. Repeating the same command is harmless.
    pub fn apply(&mut self, cmd: &ActuatorCommand) -> Result<(), RoasterError> {
        self.heater
            .set_duty(cmd.heat_duty)
            .map_err(|e| map_actuator_error(&*e))?;
        self.fan
            .set_duty(cmd.fan_duty)
            .map_err(|e| map_actuator_error(&*e))?;
        if self.last.as_ref() != Some(cmd) {
            tracing::debug!(
                heat_duty = cmd.heat_duty,
                fan_duty = cmd.fan_duty,
                "duty changed"
            );
        }
        self.last = Some(*cmd);
        Ok(())
    }

    /// Drive both outputs to zero, keeping the last percentages for reporting.
    pub fn force_zero(&mut self) -> Result<(), RoasterError> {
        let cmd = self.last.unwrap_or_default().zeroed();
        self.apply(&cmd)
    }

    pub const fn last(&self) -> Option<&ActuatorCommand> {
        self.last.as_ref()
    }
}
