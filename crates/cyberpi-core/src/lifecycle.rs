//! Session lifecycle: connect → poll → fail → reconnect
//!
//! ```text
//!                 connect ok
//!   Disconnected ───────────▶ Connected
//!        ▲  │                    │
//!        │  │ NotFound / Fatal   │ Timeout, TagOrSignatureFault,
//!        │  ▼                    │ AuthOrCounterFault (after disconnect)
//!        │ Aborted ◀─── Fatal ───┤
//!        └───────────────────────┘
//! ```

use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};

use crate::backoff::BackoffConfig;
use crate::error::{ConnectError, FailureClass, LifecycleError};
use crate::poll::PollFailure;
use crate::provider::{VehicleIdentity, VehicleSession, VehicleSessionProvider};
use crate::shutdown::ShutdownSignal;

/// Upper bound on a best-effort disconnect
const DISCONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Connection state of the lifecycle manager
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Disconnected,
    Connected,
    /// Terminal; the process exits
    Aborted,
}

/// What to do with the current session after a poll failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryAction {
    /// Drop the session and connect again
    Reconnect,
    /// Session state is presumed corrupted: disconnect first, then connect again
    DisconnectThenReconnect,
    /// Stop the supervisor
    Abort,
}

/// Single classify-then-branch point for the reconnect policy
pub fn recovery_action(class: FailureClass) -> RecoveryAction {
    match class {
        FailureClass::Timeout | FailureClass::TagOrSignatureFault => RecoveryAction::Reconnect,
        FailureClass::AuthOrCounterFault => RecoveryAction::DisconnectThenReconnect,
        FailureClass::Fatal => RecoveryAction::Abort,
    }
}

/// Owns the one live session and decides how to replace it
pub struct SessionLifecycle {
    provider: Arc<dyn VehicleSessionProvider>,
    identity: VehicleIdentity,
    backoff: BackoffConfig,
    state: LinkState,
    session: Option<Box<dyn VehicleSession>>,
    /// Failed attempts since a session last produced a vehicle state
    consecutive_failures: u32,
}

impl SessionLifecycle {
    pub fn new(
        provider: Arc<dyn VehicleSessionProvider>,
        identity: VehicleIdentity,
        backoff: BackoffConfig,
    ) -> Self {
        Self {
            provider,
            identity,
            backoff,
            state: LinkState::Disconnected,
            session: None,
            consecutive_failures: 0,
        }
    }

    pub fn state(&self) -> LinkState {
        self.state
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    /// Obtain a connected session, retrying unavailable vehicles with backoff.
    ///
    /// Returns `Ok(None)` if shutdown was requested while waiting.
    pub async fn establish(
        &mut self,
        shutdown: &mut ShutdownSignal,
    ) -> Result<Option<&mut (dyn VehicleSession + 'static)>, LifecycleError> {
        if self.state == LinkState::Aborted {
            return Err(LifecycleError::Fatal(
                "session lifecycle already aborted".to_string(),
            ));
        }
        if self.state == LinkState::Connected {
            return Ok(self.session.as_deref_mut());
        }

        loop {
            let delay = self.backoff.delay_for_attempt(self.consecutive_failures);
            if !delay.is_zero() {
                info!(
                    attempt = self.consecutive_failures,
                    delay_ms = delay.as_millis() as u64,
                    "Waiting before reconnect"
                );
                tokio::select! {
                    biased;
                    _ = shutdown.triggered() => return Ok(None),
                    _ = tokio::time::sleep(delay) => {}
                }
            }
            if shutdown.is_triggered() {
                return Ok(None);
            }

            info!(vin = %self.identity.vin, "Establishing connection to vehicle...");
            let result = tokio::select! {
                biased;
                _ = shutdown.triggered() => None,
                result = self.provider.connect(&self.identity) => Some(result),
            };
            let Some(result) = result else {
                info!("Shutdown requested while connecting");
                return Ok(None);
            };

            match result {
                Ok(session) => {
                    let info = session.describe();
                    self.transition(LinkState::Connected);
                    info!(vin = %info.vin, provider = %info.provider, "Session established");
                    let session = self.session.insert(session);
                    return Ok(Some(&mut **session));
                }
                Err(ConnectError::NotFound(msg)) => {
                    error!(error = %msg, "Error finding vehicle");
                    info!("Please check your VIN and key path in the configuration file.");
                    self.transition(LinkState::Aborted);
                    return Err(LifecycleError::Configuration(msg));
                }
                Err(ConnectError::Unavailable(msg)) => {
                    self.consecutive_failures = self.consecutive_failures.saturating_add(1);
                    warn!(
                        error = %msg,
                        attempt = self.consecutive_failures,
                        "Vehicle unavailable, retrying"
                    );
                }
                Err(ConnectError::Fatal(msg)) => {
                    error!(error = %msg, "Unrecoverable error while connecting");
                    self.transition(LinkState::Aborted);
                    return Err(LifecycleError::Fatal(msg));
                }
            }
        }
    }

    /// Handle a poll loop failure: discard (and possibly disconnect) the
    /// current session, or abort on a fatal failure.
    pub async fn recover(
        &mut self,
        failure: &PollFailure,
        successful_polls: u64,
    ) -> Result<(), LifecycleError> {
        if successful_polls > 0 {
            self.consecutive_failures = 0;
        } else {
            self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        }

        let session = self.session.take();
        match recovery_action(failure.class) {
            RecoveryAction::Reconnect => {
                drop(session);
                info!(class = %failure.class, "Discarding session, reconnecting");
                self.transition(LinkState::Disconnected);
                Ok(())
            }
            RecoveryAction::DisconnectThenReconnect => {
                if let Some(session) = session {
                    teardown(session).await;
                }
                info!(class = %failure.class, "Session torn down, reconnecting");
                self.transition(LinkState::Disconnected);
                Ok(())
            }
            RecoveryAction::Abort => {
                if let Some(session) = session {
                    teardown(session).await;
                }
                self.transition(LinkState::Aborted);
                Err(LifecycleError::Fatal(failure.error.to_string()))
            }
        }
    }

    /// Best-effort disconnect of the live session for orderly shutdown
    pub async fn release(&mut self) {
        if let Some(session) = self.session.take() {
            teardown(session).await;
        }
        if self.state == LinkState::Connected {
            self.transition(LinkState::Disconnected);
        }
    }

    fn transition(&mut self, next: LinkState) {
        if self.state != next {
            info!(from = ?self.state, to = ?next, "Session state changed");
            self.state = next;
        }
    }
}

/// Disconnect and drop a session. Failures are logged, never escalated, so
/// they cannot block reconnection.
async fn teardown(mut session: Box<dyn VehicleSession>) {
    let vin = session.describe().vin;
    match tokio::time::timeout(DISCONNECT_TIMEOUT, session.disconnect()).await {
        Ok(Ok(())) => info!(vin = %vin, "Session disconnected"),
        Ok(Err(e)) => warn!(vin = %vin, error = %e, "Disconnect failed, discarding session"),
        Err(_) => warn!(vin = %vin, "Disconnect timed out, discarding session"),
    }
}
