//! Simulated GPIO for hosts without output hardware

use std::collections::BTreeMap;

use tracing::debug;

use super::DigitalOutput;

/// Keeps pin levels in memory and logs every write
#[derive(Debug, Default)]
pub struct SimulatedGpio {
    levels: BTreeMap<u32, bool>,
}

impl SimulatedGpio {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last level written to `pin`, if it was configured
    pub fn level(&self, pin: u32) -> Option<bool> {
        self.levels.get(&pin).copied()
    }
}

impl DigitalOutput for SimulatedGpio {
    fn configure(&mut self, pin: u32) {
        self.levels.insert(pin, false);
        debug!(pin, "[SIM] GPIO pin configured as output");
    }

    fn write(&mut self, pin: u32, high: bool) {
        self.levels.insert(pin, high);
        debug!(pin, "[SIM] GPIO pin turned {}", if high { "ON" } else { "OFF" });
    }
}
