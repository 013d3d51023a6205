//! Recording output device for testing

use std::sync::Arc;

use parking_lot::Mutex;

use super::DigitalOutput;

/// A single recorded hardware write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinWrite {
    pub pin: u32,
    pub high: bool,
}

#[derive(Debug, Default)]
struct Recorded {
    configured: Vec<u32>,
    writes: Vec<PinWrite>,
}

/// Records every configure/write call.
///
/// Clones share the same record, so a test can keep one handle while the
/// output bank owns the other.
#[derive(Debug, Clone, Default)]
pub struct RecordingOutput {
    inner: Arc<Mutex<Recorded>>,
}

impl RecordingOutput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pins configured so far, in order
    pub fn configured(&self) -> Vec<u32> {
        self.inner.lock().configured.clone()
    }

    /// All writes so far, in order
    pub fn writes(&self) -> Vec<PinWrite> {
        self.inner.lock().writes.clone()
    }

    /// Writes issued to a single pin
    pub fn writes_to(&self, pin: u32) -> Vec<bool> {
        self.inner
            .lock()
            .writes
            .iter()
            .filter(|w| w.pin == pin)
            .map(|w| w.high)
            .collect()
    }

    /// Current level of `pin`: last write, or low once configured
    pub fn level(&self, pin: u32) -> Option<bool> {
        let inner = self.inner.lock();
        inner
            .writes
            .iter()
            .rev()
            .find(|w| w.pin == pin)
            .map(|w| w.high)
            .or_else(|| inner.configured.contains(&pin).then_some(false))
    }

    /// Forget recorded writes (configuration is kept)
    pub fn clear_writes(&self) {
        self.inner.lock().writes.clear();
    }
}

impl DigitalOutput for RecordingOutput {
    fn configure(&mut self, pin: u32) {
        self.inner.lock().configured.push(pin);
    }

    fn write(&mut self, pin: u32, high: bool) {
        self.inner.lock().writes.push(PinWrite { pin, high });
    }
}
