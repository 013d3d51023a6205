//! cyberpi-core - vehicle closure state mirrored onto indicator outputs
//!
//! This crate keeps a set of physical indicators (relays/LEDs on a
//! single-board computer) in step with a vehicle's door, lock and awake
//! state, reconnecting through transient loss of the vehicle link.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Supervisor                           │
//! │                                                             │
//! │  ┌──────────────────┐  session   ┌──────────────────┐       │
//! │  │ SessionLifecycle │──────────▶ │     PollLoop     │       │
//! │  │ (connect/recover)│◀────────── │ (poll + classify)│       │
//! │  └────────┬─────────┘  failure   └────────┬─────────┘       │
//! │           │                               │ VehicleState    │
//! │  ┌────────┴──────────────┐       ┌────────┴─────────┐       │
//! │  │VehicleSessionProvider │       │    OutputBank    │       │
//! │  │ (simulated / BLE)     │       │ (state → outputs)│       │
//! │  └───────────────────────┘       └────────┬─────────┘       │
//! │                                           │                 │
//! │                                  ┌────────┴─────────┐       │
//! │                                  │  DigitalOutput   │       │
//! │                                  │ (sysfs/simulated)│       │
//! │                                  └──────────────────┘       │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod backoff;
pub mod bank;
pub mod config;
pub mod error;
pub mod gpio;
pub mod lifecycle;
pub mod output;
pub mod poll;
pub mod provider;
pub mod shutdown;
pub mod state;
pub mod supervisor;

pub use backoff::BackoffConfig;
pub use bank::{IndicatorCommands, OutputBank};
pub use config::CyberPiConfig;
pub use error::{
    ConfigError, ConnectError, DisconnectError, FailureClass, LifecycleError, PollError,
    SupervisorError,
};
pub use gpio::{create_output_device, DigitalOutput};
pub use lifecycle::{LinkState, SessionLifecycle};
pub use output::Output;
pub use poll::{PollExit, PollLoop, PollReport};
pub use provider::{
    create_provider, SessionInfo, VehicleIdentity, VehicleSession, VehicleSessionProvider,
};
pub use shutdown::{shutdown_channel, ShutdownSignal, ShutdownTrigger};
pub use state::{AwakeState, VehicleState};
pub use supervisor::{ExitReason, Supervisor};
