//! Scripted session provider for testing
//!
//! Each `connect` consumes the next scripted outcome; each session replays
//! its poll steps in order. Every call is recorded in a shared [`EventLog`]
//! so tests can assert on call ordering.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::{SessionInfo, VehicleIdentity, VehicleSession, VehicleSessionProvider};
use crate::error::{ConnectError, DisconnectError, PollError};
use crate::state::VehicleState;

/// A recorded provider or session call. Sessions are numbered from 1 in
/// connect order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderEvent {
    Connect,
    Poll { session: usize },
    Disconnect { session: usize },
}

/// Shared, cloneable call log
#[derive(Debug, Clone, Default)]
pub struct EventLog(Arc<Mutex<Vec<ProviderEvent>>>);

impl EventLog {
    fn push(&self, event: ProviderEvent) {
        self.0.lock().push(event);
    }

    pub fn events(&self) -> Vec<ProviderEvent> {
        self.0.lock().clone()
    }

    pub fn connects(&self) -> usize {
        self.count(|e| matches!(e, ProviderEvent::Connect))
    }

    pub fn polls(&self, session: usize) -> usize {
        self.count(|e| *e == ProviderEvent::Poll { session })
    }

    pub fn disconnects(&self, session: usize) -> usize {
        self.count(|e| *e == ProviderEvent::Disconnect { session })
    }

    fn count(&self, pred: impl Fn(&ProviderEvent) -> bool) -> usize {
        self.0.lock().iter().filter(|e| pred(e)).count()
    }
}

/// One step of a scripted session
#[derive(Debug, Clone)]
pub enum PollStep {
    State(VehicleState),
    Fail(PollError),
    /// Never completes; only a shutdown can end the poll
    Hang,
}

/// Poll and disconnect behaviour of one scripted session.
///
/// Once the steps run out, polls fail with a fatal error.
#[derive(Debug, Clone, Default)]
pub struct SessionScript {
    steps: VecDeque<PollStep>,
    disconnect_error: Option<DisconnectError>,
    disconnect_hangs: bool,
}

impl SessionScript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(mut self, state: VehicleState) -> Self {
        self.steps.push_back(PollStep::State(state));
        self
    }

    /// Repeat `state` for `count` polls
    pub fn states(mut self, state: VehicleState, count: usize) -> Self {
        for _ in 0..count {
            self.steps.push_back(PollStep::State(state));
        }
        self
    }

    pub fn fail(mut self, error: PollError) -> Self {
        self.steps.push_back(PollStep::Fail(error));
        self
    }

    pub fn hang(mut self) -> Self {
        self.steps.push_back(PollStep::Hang);
        self
    }

    pub fn disconnect_fails(mut self, message: &str) -> Self {
        self.disconnect_error = Some(DisconnectError(message.to_string()));
        self
    }

    /// Disconnect never completes
    pub fn disconnect_hangs(mut self) -> Self {
        self.disconnect_hangs = true;
        self
    }
}

enum ConnectStep {
    Session(SessionScript),
    Error(ConnectError),
}

/// Provider that replays scripted connect outcomes.
///
/// Connects beyond the script fail with a fatal error.
#[derive(Default)]
pub struct ScriptedProvider {
    connects: Mutex<VecDeque<ConnectStep>>,
    sessions_created: Mutex<usize>,
    log: EventLog,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(self, script: SessionScript) -> Self {
        self.connects.lock().push_back(ConnectStep::Session(script));
        self
    }

    pub fn with_connect_error(self, error: ConnectError) -> Self {
        self.connects.lock().push_back(ConnectStep::Error(error));
        self
    }

    /// Handle to the call log; stays valid after the provider is moved
    pub fn log(&self) -> EventLog {
        self.log.clone()
    }
}

#[async_trait]
impl VehicleSessionProvider for ScriptedProvider {
    async fn connect(
        &self,
        identity: &VehicleIdentity,
    ) -> Result<Box<dyn VehicleSession>, ConnectError> {
        self.log.push(ProviderEvent::Connect);

        let step = self.connects.lock().pop_front();
        match step {
            Some(ConnectStep::Session(script)) => {
                let id = {
                    let mut created = self.sessions_created.lock();
                    *created += 1;
                    *created
                };
                Ok(Box::new(ScriptedSession {
                    id,
                    vin: identity.vin.clone(),
                    script,
                    log: self.log.clone(),
                }))
            }
            Some(ConnectStep::Error(error)) => Err(error),
            None => Err(ConnectError::Fatal("connect script exhausted".to_string())),
        }
    }
}

struct ScriptedSession {
    id: usize,
    vin: String,
    script: SessionScript,
    log: EventLog,
}

#[async_trait]
impl VehicleSession for ScriptedSession {
    async fn poll_state(&mut self) -> Result<VehicleState, PollError> {
        self.log.push(ProviderEvent::Poll { session: self.id });

        match self.script.steps.pop_front() {
            Some(PollStep::State(state)) => Ok(state),
            Some(PollStep::Fail(error)) => Err(error),
            Some(PollStep::Hang) => std::future::pending().await,
            None => Err(PollError::Fatal("poll script exhausted".to_string())),
        }
    }

    async fn disconnect(&mut self) -> Result<(), DisconnectError> {
        self.log.push(ProviderEvent::Disconnect { session: self.id });

        if self.script.disconnect_hangs {
            std::future::pending::<()>().await;
        }
        match self.script.disconnect_error.take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn describe(&self) -> SessionInfo {
        SessionInfo {
            vin: self.vin.clone(),
            provider: "scripted".to_string(),
        }
    }
}
