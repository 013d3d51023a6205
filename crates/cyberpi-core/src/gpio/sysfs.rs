//! Linux sysfs GPIO adapter

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, error, warn};

use super::DigitalOutput;

/// Drives pins through `/sys/class/gpio` (or another base directory).
///
/// Pins are chip offsets (BCM numbers on a Raspberry Pi); `chip_base` is
/// added to form the sysfs line number.
pub struct SysfsGpio {
    base: PathBuf,
    chip_base: u32,
}

impl SysfsGpio {
    pub fn new(base: impl Into<PathBuf>, chip_base: u32) -> Self {
        Self {
            base: base.into(),
            chip_base,
        }
    }

    fn line(&self, pin: u32) -> u32 {
        self.chip_base.saturating_add(pin)
    }

    fn pin_dir(&self, pin: u32) -> PathBuf {
        self.base.join(format!("gpio{}", self.line(pin)))
    }

    fn try_configure(&self, pin: u32) -> io::Result<()> {
        let dir = self.pin_dir(pin);
        if !dir.exists() {
            fs::write(self.base.join("export"), self.line(pin).to_string())?;
        }
        // "low" sets the direction to output with an initial low level
        fs::write(dir.join("direction"), "low")
    }

    fn try_write(&self, pin: u32, high: bool) -> io::Result<()> {
        let value = if high { "1" } else { "0" };
        fs::write(self.pin_dir(pin).join("value"), value)
    }
}

impl DigitalOutput for SysfsGpio {
    fn configure(&mut self, pin: u32) {
        match self.try_configure(pin) {
            Ok(()) => debug!(
                pin,
                line = self.line(pin),
                base = %self.base.display(),
                "GPIO pin configured as output"
            ),
            Err(e) => error!(pin, line = self.line(pin), error = %e, "Failed to configure GPIO pin"),
        }
    }

    fn write(&mut self, pin: u32, high: bool) {
        if let Err(e) = self.try_write(pin, high) {
            error!(pin, line = self.line(pin), high, error = %e, "GPIO write failed");
        }
    }
}

/// Find the sysfs number of the SoC GPIO chip under `base`.
///
/// Prefers a chip labelled `pinctrl-*` (bcm2835, bcm2711, rp1), then the
/// lowest base found. Falls back to 0 when no chip is listed.
pub fn detect_chip_base(base: &Path) -> u32 {
    let entries = match fs::read_dir(base) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(base = %base.display(), error = %e, "Cannot list GPIO chips, assuming base 0");
            return 0;
        }
    };

    let mut chips: Vec<(u32, String)> = entries
        .filter_map(Result::ok)
        .filter(|entry| entry.file_name().to_string_lossy().starts_with("gpiochip"))
        .filter_map(|entry| {
            let dir = entry.path();
            let chip_base = fs::read_to_string(dir.join("base")).ok()?.trim().parse().ok()?;
            let label = fs::read_to_string(dir.join("label")).unwrap_or_default();
            Some((chip_base, label.trim().to_string()))
        })
        .collect();
    chips.sort();

    let detected = chips
        .iter()
        .find(|(_, label)| label.starts_with("pinctrl"))
        .or_else(|| chips.first())
        .map(|(chip_base, _)| *chip_base)
        .unwrap_or(0);
    debug!(base = %base.display(), chip_base = detected, "GPIO chip base detected");
    detected
}

#[cfg(test)]
mod tests {
    use super::*;

    fn add_chip(base: &Path, chip_base: u32, label: &str) {
        let dir = base.join(format!("gpiochip{}", chip_base));
        fs::create_dir(&dir).unwrap();
        fs::write(dir.join("base"), format!("{}\n", chip_base)).unwrap();
        fs::write(dir.join("label"), format!("{}\n", label)).unwrap();
    }

    #[test]
    fn test_configure_exports_missing_pin() {
        let dir = tempfile::tempdir().unwrap();
        let mut gpio = SysfsGpio::new(dir.path(), 0);

        // Without a kernel the export file is a plain file and no gpioN
        // directory appears, so the direction write fails and is only logged.
        gpio.configure(16);

        let exported = fs::read_to_string(dir.path().join("export")).unwrap();
        assert_eq!(exported, "16");
    }

    #[test]
    fn test_configure_sets_direction_low() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("gpio20")).unwrap();
        let mut gpio = SysfsGpio::new(dir.path(), 0);

        gpio.configure(20);

        assert!(!dir.path().join("export").exists());
        let direction = fs::read_to_string(dir.path().join("gpio20/direction")).unwrap();
        assert_eq!(direction, "low");
    }

    #[test]
    fn test_write_values() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("gpio21")).unwrap();
        let mut gpio = SysfsGpio::new(dir.path(), 0);

        gpio.write(21, true);
        assert_eq!(
            fs::read_to_string(dir.path().join("gpio21/value")).unwrap(),
            "1"
        );

        gpio.write(21, false);
        assert_eq!(
            fs::read_to_string(dir.path().join("gpio21/value")).unwrap(),
            "0"
        );
    }

    #[test]
    fn test_chip_base_offsets_export_and_value() {
        let dir = tempfile::tempdir().unwrap();
        let mut gpio = SysfsGpio::new(dir.path(), 512);

        gpio.configure(21);
        assert_eq!(
            fs::read_to_string(dir.path().join("export")).unwrap(),
            "533"
        );

        fs::create_dir(dir.path().join("gpio533")).unwrap();
        gpio.write(21, true);
        assert_eq!(
            fs::read_to_string(dir.path().join("gpio533/value")).unwrap(),
            "1"
        );
        assert!(!dir.path().join("gpio21").exists());
    }

    #[test]
    fn test_write_failure_is_swallowed() {
        let dir = tempfile::tempdir().unwrap();
        let mut gpio = SysfsGpio::new(dir.path().join("missing"), 0);
        gpio.write(5, true);
    }

    #[test]
    fn test_detect_prefers_pinctrl_chip() {
        let dir = tempfile::tempdir().unwrap();
        add_chip(dir.path(), 512, "gpio-brcmstb@107d508500");
        add_chip(dir.path(), 571, "pinctrl-rp1");

        assert_eq!(detect_chip_base(dir.path()), 571);
    }

    #[test]
    fn test_detect_falls_back_to_lowest_base() {
        let dir = tempfile::tempdir().unwrap();
        add_chip(dir.path(), 570, "raspberrypi-exp-gpio");
        add_chip(dir.path(), 512, "gpio-mockup");
        fs::write(dir.path().join("export"), "").unwrap();

        assert_eq!(detect_chip_base(dir.path()), 512);
    }

    #[test]
    fn test_detect_without_chips_is_zero() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(detect_chip_base(dir.path()), 0);
        assert_eq!(detect_chip_base(&dir.path().join("missing")), 0);
    }
}
