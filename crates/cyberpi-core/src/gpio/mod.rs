//! Digital output devices for indicator relays/LEDs
//!
//! This module provides the devices the output bank writes through:
//! - sysfs GPIO adapter for Linux single-board computers
//! - Simulated adapter for hosts without GPIO
//! - Recording adapter for testing
//!
//! # Example
//!
//! ```ignore
//! use cyberpi_core::config::GpioConfig;
//! use cyberpi_core::gpio::create_output_device;
//!
//! let mut device = create_output_device(&GpioConfig::default());
//! device.configure(21);
//! device.write(21, true);
//! ```

pub mod mock;
mod simulated;
mod sysfs;

pub use mock::{PinWrite, RecordingOutput};
pub use simulated::SimulatedGpio;
pub use sysfs::{detect_chip_base, SysfsGpio};

use std::path::Path;

use tracing::{info, warn};

use crate::config::GpioConfig;

/// A device that can drive a set of digital output pins.
///
/// Writes are infallible at this level: a failing physical write is a
/// hardware or wiring fault, so adapters log it and carry on.
#[cfg_attr(test, mockall::automock)]
pub trait DigitalOutput: Send {
    /// Claim `pin` as an output, initially driven low
    fn configure(&mut self, pin: u32);

    /// Drive `pin` high (`true`) or low (`false`)
    fn write(&mut self, pin: u32, high: bool);
}

/// Create an output device based on configuration
pub fn create_output_device(config: &GpioConfig) -> Box<dyn DigitalOutput> {
    match config {
        GpioConfig::Auto {
            base_path,
            chip_base,
        } => {
            if Path::new(base_path).is_dir() {
                Box::new(sysfs_device(base_path, *chip_base))
            } else {
                warn!(
                    base_path = %base_path,
                    "GPIO sysfs not found, running in simulation mode"
                );
                Box::new(SimulatedGpio::new())
            }
        }
        GpioConfig::Sysfs {
            base_path,
            chip_base,
        } => Box::new(sysfs_device(base_path, *chip_base)),
        GpioConfig::Simulated => Box::new(SimulatedGpio::new()),
    }
}

fn sysfs_device(base_path: &str, chip_base: Option<u32>) -> SysfsGpio {
    let chip_base = chip_base.unwrap_or_else(|| detect_chip_base(Path::new(base_path)));
    info!(base_path = %base_path, chip_base, "Using sysfs GPIO");
    SysfsGpio::new(base_path, chip_base)
}
