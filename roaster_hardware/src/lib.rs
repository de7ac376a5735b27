//! Device backends for the roaster controller.
//!
//! - `sim`: a shared simulated rig (always available).
//! - `hardware` (feature `hardware`, Linux): HX711 load cell, MCP3208 dial
//!   ADC, MAX6675 thermocouples, hardware PWM and a GPIO advance button,
//!   all through `rppal`.
pub mod error;
pub mod sim;
pub mod util;

#[cfg(feature = "hardware")]
pub mod gpio_button;
#[cfg(feature = "hardware")]
pub mod hardware;
#[cfg(feature = "hardware")]
pub mod hx711;
#[cfg(feature = "hardware")]
pub mod max6675;
#[cfg(feature = "hardware")]
pub mod mcp3208;
#[cfg(feature = "hardware")]
pub mod pwm;

pub use error::HwError;
pub use sim::{SimDialKind, SimParams, SimProbe, SimPwmKind, SimRig};
