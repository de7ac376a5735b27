//! Simulated roaster rig.
//!
//! A first-order thermal model driven by the heater/fan duty and by time from
//! a [`Clock`]. All simulated devices share one [`SimRig`] handle, so writing
//! heater duty through [`SimPwm`] warms what [`SimThermocouple`] reads.
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::time::{Duration, Instant};

use roaster_traits::{BoxError, Clock, Dial, LoadCell, PressCounter, PwmOutput, Thermocouple};

use crate::error::HwError;

const AMBIENT_F: f32 = 70.0;
/// Intake temperature reached at 100 % heat and 0 % fan.
const HEATER_RISE_F: f32 = 520.0;
/// Cooling contributed by 100 % fan.
const FAN_COOLING_F: f32 = 80.0;
const INTAKE_TAU_S: f32 = 20.0;
const BEAN_TAU_S: f32 = 60.0;
/// Beans start losing moisture above this temperature.
const MOISTURE_LOSS_F: f32 = 300.0;
/// Beans never lose more than this fraction of the charge.
const MAX_LOSS_FRACTION: f32 = 0.2;

/// Tunables for the simulated rig.
#[derive(Debug, Clone)]
pub struct SimParams {
    /// Multiplier applied to wall-clock time before integrating the model.
    pub time_scale: f32,
    pub intake_start_f: f32,
    pub bean_start_f: f32,
    /// Load-cell raw counts with nothing on the scale.
    pub zero_counts: i32,
    /// Units (grams) per raw count of the simulated load cell.
    pub units_per_count: f32,
    pub fan_raw: u16,
    pub heat_raw: u16,
    /// PWM resolution the simulated actuators interpret duties against.
    pub max_duty: u32,
}

impl Default for SimParams {
    fn default() -> Self {
        Self {
            time_scale: 1.0,
            intake_start_f: AMBIENT_F,
            bean_start_f: AMBIENT_F,
            zero_counts: 84_000,
            units_per_count: 0.01,
            fan_raw: 0,
            heat_raw: 0,
            max_duty: 4095,
        }
    }
}

#[derive(Debug)]
struct SimState {
    params: SimParams,
    last_update: Instant,
    intake_f: f32,
    bean_f: f32,
    charge_units: f32,
    weight_units: f32,
    heat_frac: f32,
    fan_frac: f32,
    fan_raw: u16,
    heat_raw: u16,
    presses: u32,
    fail_bean: bool,
    fail_intake: bool,
    fail_scale: bool,
}

impl SimState {
    fn integrate(&mut self, now: Instant) {
        let dt_s = now.saturating_duration_since(self.last_update).as_secs_f32()
            * self.params.time_scale.max(0.0);
        self.last_update = now;
        if dt_s <= 0.0 {
            return;
        }

        let intake_target =
            AMBIENT_F + self.heat_frac * HEATER_RISE_F - self.fan_frac * FAN_COOLING_F;
        let intake_target = intake_target.max(AMBIENT_F);
        self.intake_f += (intake_target - self.intake_f) * (1.0 - (-dt_s / INTAKE_TAU_S).exp());
        self.bean_f += (self.intake_f - self.bean_f) * (1.0 - (-dt_s / BEAN_TAU_S).exp());

        if self.bean_f > MOISTURE_LOSS_F && self.weight_units > 0.0 {
            let rate = 0.0015 * ((self.bean_f - MOISTURE_LOSS_F) / 100.0);
            let floor = self.charge_units * (1.0 - MAX_LOSS_FRACTION);
            self.weight_units = (self.weight_units * (1.0 - rate * dt_s)).max(floor);
        }
    }
}

/// Shared handle to the simulated rig. Cheap to clone.
#[derive(Clone)]
pub struct SimRig {
    state: Rc<RefCell<SimState>>,
    clock: Arc<dyn Clock + Send + Sync>,
}

impl core::fmt::Debug for SimRig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let s = self.state.borrow();
        f.debug_struct("SimRig")
            .field("intake_f", &s.intake_f)
            .field("bean_f", &s.bean_f)
            .field("weight_units", &s.weight_units)
            .finish()
    }
}

impl SimRig {
    pub fn new(params: SimParams, clock: Arc<dyn Clock + Send + Sync>) -> Self {
        let now = clock.now();
        let state = SimState {
            last_update: now,
            intake_f: params.intake_start_f,
            bean_f: params.bean_start_f,
            charge_units: 0.0,
            weight_units: 0.0,
            heat_frac: 0.0,
            fan_frac: 0.0,
            fan_raw: params.fan_raw,
            heat_raw: params.heat_raw,
            presses: 0,
            fail_bean: false,
            fail_intake: false,
            fail_scale: false,
            params,
        };
        Self {
            state: Rc::new(RefCell::new(state)),
            clock,
        }
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut SimState) -> R) -> R {
        let now = self.clock.now();
        let mut s = self.state.borrow_mut();
        s.integrate(now);
        f(&mut s)
    }

    /// Pour a charge of green beans onto the scale.
    pub fn load_charge(&self, units: f32) {
        self.with_state(|s| {
            s.charge_units = units.max(0.0);
            s.weight_units = units.max(0.0);
        });
    }

    pub fn set_dials(&self, fan_raw: u16, heat_raw: u16) {
        self.with_state(|s| {
            s.fan_raw = fan_raw;
            s.heat_raw = heat_raw;
        });
    }

    pub fn set_intake_f(&self, f: f32) {
        self.with_state(|s| s.intake_f = f);
    }

    pub fn set_bean_f(&self, f: f32) {
        self.with_state(|s| s.bean_f = f);
    }

    /// Simulate one debounced press of the advance button.
    pub fn press(&self) {
        self.with_state(|s| s.presses = s.presses.wrapping_add(1));
    }

    /// Make the bean/intake thermocouples or the scale fail their reads.
    pub fn inject_faults(&self, bean: bool, intake: bool, scale: bool) {
        self.with_state(|s| {
            s.fail_bean = bean;
            s.fail_intake = intake;
            s.fail_scale = scale;
        });
    }

    pub fn intake_f(&self) -> f32 {
        self.with_state(|s| s.intake_f)
    }

    pub fn bean_f(&self) -> f32 {
        self.with_state(|s| s.bean_f)
    }

    pub fn weight_units(&self) -> f32 {
        self.with_state(|s| s.weight_units)
    }

    /// Last duty fractions written by the actuators: (heat, fan).
    pub fn duty_fractions(&self) -> (f32, f32) {
        self.with_state(|s| (s.heat_frac, s.fan_frac))
    }

    pub fn dial(&self, which: SimDialKind) -> SimDial {
        SimDial {
            rig: self.clone(),
            which,
        }
    }

    pub fn thermocouple(&self, which: SimProbe) -> SimThermocouple {
        SimThermocouple {
            rig: self.clone(),
            which,
        }
    }

    pub fn load_cell(&self) -> SimLoadCell {
        SimLoadCell { rig: self.clone() }
    }

    pub fn pwm(&self, which: SimPwmKind) -> SimPwm {
        SimPwm {
            rig: self.clone(),
            which,
        }
    }

    pub fn button(&self) -> SimButton {
        SimButton { rig: self.clone() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimDialKind {
    Fan,
    Heat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimProbe {
    Bean,
    Intake,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimPwmKind {
    Heater,
    Fan,
}

pub struct SimDial {
    rig: SimRig,
    which: SimDialKind,
}

impl Dial for SimDial {
    fn read_raw(&mut self) -> Result<u16, BoxError> {
        let which = self.which;
        Ok(self.rig.with_state(|s| match which {
            SimDialKind::Fan => s.fan_raw,
            SimDialKind::Heat => s.heat_raw,
        }))
    }
}

pub struct SimThermocouple {
    rig: SimRig,
    which: SimProbe,
}

impl Thermocouple for SimThermocouple {
    fn read_fahrenheit(&mut self) -> Result<f32, BoxError> {
        let which = self.which;
        self.rig.with_state(|s| {
            let (failed, value) = match which {
                SimProbe::Bean => (s.fail_bean, s.bean_f),
                SimProbe::Intake => (s.fail_intake, s.intake_f),
            };
            if failed {
                Err(Box::new(HwError::ThermocoupleOpen) as BoxError)
            } else {
                Ok(value)
            }
        })
    }
}

pub struct SimLoadCell {
    rig: SimRig,
}

impl LoadCell for SimLoadCell {
    fn read(&mut self, _timeout: Duration) -> Result<i32, BoxError> {
        self.rig.with_state(|s| {
            if s.fail_scale {
                return Err(Box::new(HwError::Timeout) as BoxError);
            }
            let per_count = if s.params.units_per_count > 0.0 {
                s.params.units_per_count
            } else {
                1.0
            };
            let counts = (s.weight_units / per_count).round() as i32;
            let raw = s.params.zero_counts.saturating_add(counts);
            tracing::trace!(raw, "sim load cell read");
            Ok(raw)
        })
    }
}

pub struct SimPwm {
    rig: SimRig,
    which: SimPwmKind,
}

impl PwmOutput for SimPwm {
    fn set_duty(&mut self, duty: u32) -> Result<(), BoxError> {
        let which = self.which;
        self.rig.with_state(|s| {
            let max = s.params.max_duty.max(1);
            let frac = (duty.min(max) as f32) / (max as f32);
            match which {
                SimPwmKind::Heater => s.heat_frac = frac,
                SimPwmKind::Fan => s.fan_frac = frac,
            }
        });
        Ok(())
    }
}

pub struct SimButton {
    rig: SimRig,
}

impl PressCounter for SimButton {
    fn count(&mut self) -> u32 {
        self.rig.with_state(|s| s.presses)
    }
}
