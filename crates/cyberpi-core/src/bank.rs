//! The fixed set of indicator outputs and the state → output mapping

use serde::Serialize;

use crate::config::OutputPins;
use crate::gpio::DigitalOutput;
use crate::output::Output;
use crate::state::VehicleState;

/// Desired on/off value for each indicator
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IndicatorCommands {
    pub driver: bool,
    pub passenger: bool,
    pub lock: bool,
    pub awake: bool,
}

impl IndicatorCommands {
    /// Pure mapping from a vehicle snapshot to indicator values.
    ///
    /// The lock indicator means "unlocked", so it is the inverse of
    /// `locked`. Only an explicit awake state lights the awake indicator.
    pub fn from_state(state: &VehicleState) -> Self {
        Self {
            driver: state.driver_door_open,
            passenger: state.passenger_door_open,
            lock: !state.locked,
            awake: state.is_awake(),
        }
    }
}

/// Driver, passenger, lock and awake indicators on one output device
pub struct OutputBank {
    device: Box<dyn DigitalOutput>,
    driver: Output,
    passenger: Output,
    lock: Output,
    awake: Output,
}

impl OutputBank {
    pub fn new(mut device: Box<dyn DigitalOutput>, pins: &OutputPins) -> Self {
        let driver = Output::new(pins.driver, "driver", device.as_mut());
        let passenger = Output::new(pins.passenger, "passenger", device.as_mut());
        let lock = Output::new(pins.lock, "lock", device.as_mut());
        let awake = Output::new(pins.awake, "awake", device.as_mut());
        Self {
            device,
            driver,
            passenger,
            lock,
            awake,
        }
    }

    /// Drive every indicator from `state`. Returns the number of outputs
    /// that changed.
    pub fn apply(&mut self, state: &VehicleState) -> usize {
        let commands = IndicatorCommands::from_state(state);
        let device = self.device.as_mut();

        [
            self.driver.set(device, commands.driver),
            self.passenger.set(device, commands.passenger),
            self.lock.set(device, commands.lock),
            self.awake.set(device, commands.awake),
        ]
        .into_iter()
        .filter(|changed| *changed)
        .count()
    }

    /// Currently commanded value of each indicator
    pub fn snapshot(&self) -> IndicatorCommands {
        IndicatorCommands {
            driver: self.driver.commanded(),
            passenger: self.passenger.commanded(),
            lock: self.lock.commanded(),
            awake: self.awake.commanded(),
        }
    }

    pub fn outputs(&self) -> [&Output; 4] {
        [&self.driver, &self.passenger, &self.lock, &self.awake]
    }
}
