//! Vehicle session provider boundary
//!
//! The provider owns everything below the session: vehicle discovery, key
//! exchange and the authenticated message channel. This crate only sees
//! the three operations of the traits below.
//!
//! ```text
//!   SessionLifecycle ──connect──▶ VehicleSessionProvider
//!          │                             │
//!          │ owns                        ▼
//!          └──────────────────▶ Box<dyn VehicleSession>
//!                                 poll_state / disconnect
//! ```
//!
//! - Simulated provider for running without a vehicle
//! - Scripted mock provider for testing

pub mod mock;
mod simulated;

pub use simulated::SimulatedProvider;

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

use crate::config::ProviderConfig;
use crate::error::{ConnectError, DisconnectError, PollError};
use crate::state::VehicleState;

/// Which vehicle to connect to and which credential to use
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VehicleIdentity {
    pub vin: String,
    pub key_path: PathBuf,
}

/// Explicitly enumerated description of a live session, logged on connect
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionInfo {
    pub vin: String,
    pub provider: String,
}

impl fmt::Display for SessionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "vin={} provider={}", self.vin, self.provider)
    }
}

/// Source of authenticated sessions to one vehicle
#[async_trait]
pub trait VehicleSessionProvider: Send + Sync {
    /// Discover the vehicle and establish an authenticated session
    async fn connect(
        &self,
        identity: &VehicleIdentity,
    ) -> Result<Box<dyn VehicleSession>, ConnectError>;
}

/// A live, authenticated channel to one vehicle.
///
/// Only one request is ever in flight per session.
#[async_trait]
pub trait VehicleSession: Send {
    /// Request a fresh state snapshot. The provider applies its own timeout.
    async fn poll_state(&mut self) -> Result<VehicleState, PollError>;

    /// Tear the session down. Callers treat this as best-effort.
    async fn disconnect(&mut self) -> Result<(), DisconnectError>;

    /// Identity of the connected vehicle for observability
    fn describe(&self) -> SessionInfo;
}

/// Create a session provider based on configuration
pub fn create_provider(config: &ProviderConfig) -> Arc<dyn VehicleSessionProvider> {
    match config {
        ProviderConfig::Simulated {
            fault_every,
            latency_ms,
        } => Arc::new(SimulatedProvider::new(*fault_every, *latency_ms)),
    }
}
