//! Idempotent named digital output

use tracing::info;

use crate::gpio::DigitalOutput;

/// One named physical indicator on a single pin.
///
/// `commanded` always holds the last value sent to the device; a write is
/// only issued when the desired value differs from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Output {
    pin: u32,
    label: String,
    commanded: bool,
}

impl Output {
    /// Claim `pin` on the device. The device drives it low, which is the
    /// initial commanded state.
    pub fn new(pin: u32, label: impl Into<String>, device: &mut dyn DigitalOutput) -> Self {
        device.configure(pin);
        Self {
            pin,
            label: label.into(),
            commanded: false,
        }
    }

    pub fn pin(&self) -> u32 {
        self.pin
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Last value written to the device
    pub fn commanded(&self) -> bool {
        self.commanded
    }

    /// Drive the output to `desired`.
    ///
    /// Returns `true` if a hardware write happened. Repeating the current
    /// value is a no-op: no write, no log.
    pub fn set(&mut self, device: &mut dyn DigitalOutput, desired: bool) -> bool {
        if desired == self.commanded {
            return false;
        }

        device.write(self.pin, desired);
        self.commanded = desired;
        info!(
            pin = self.pin,
            label = %self.label,
            "Relay on pin {} turned {} ({})",
            self.pin,
            if desired { "ON" } else { "OFF" },
            self.label
        );
        true
    }
}
