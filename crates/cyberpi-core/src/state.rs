//! Vehicle state snapshots

use serde::{Deserialize, Serialize};

/// Whether the vehicle's body controller is awake
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AwakeState {
    #[default]
    Unknown,
    Asleep,
    Awake,
}

/// Per-door open flags as reported by the vehicle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Closures {
    pub driver_front: bool,
    pub driver_rear: bool,
    pub passenger_front: bool,
    pub passenger_rear: bool,
    pub locked: bool,
}

/// One immutable snapshot of door, lock and awake status.
///
/// A fresh value is produced on every successful poll and dropped once the
/// output bank has been driven from it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleState {
    pub driver_door_open: bool,
    pub passenger_door_open: bool,
    pub locked: bool,
    pub awake: AwakeState,
}

impl VehicleState {
    /// Collapse per-door closures into per-side state. A side is open when
    /// either of its doors is open.
    pub fn from_closures(closures: Closures, awake: AwakeState) -> Self {
        Self {
            driver_door_open: closures.driver_front || closures.driver_rear,
            passenger_door_open: closures.passenger_front || closures.passenger_rear,
            locked: closures.locked,
            awake,
        }
    }

    /// Only an explicit `Awake` counts; `Unknown` and `Asleep` do not
    pub fn is_awake(&self) -> bool {
        self.awake == AwakeState::Awake
    }
}
