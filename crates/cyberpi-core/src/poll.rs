//! Steady-state poll loop against one live session

use std::time::Duration;

use tracing::{debug, error};

use crate::bank::OutputBank;
use crate::config::PollConfig;
use crate::error::{FailureClass, PollError};
use crate::provider::VehicleSession;
use crate::shutdown::ShutdownSignal;
use crate::state::VehicleState;

/// A classified poll failure that ended a poll loop run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollFailure {
    pub class: FailureClass,
    pub error: PollError,
}

/// Why a poll loop run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollExit {
    Failed(PollFailure),
    Shutdown,
}

/// Result of one poll loop run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollReport {
    pub exit: PollExit,
    /// Vehicle states received and applied during the run
    pub successful_polls: u64,
}

/// Polls a session on a fixed cadence and drives the output bank
#[derive(Debug, Clone)]
pub struct PollLoop {
    interval: Duration,
    state_dump_every: u64,
}

impl PollLoop {
    pub fn new(config: &PollConfig) -> Self {
        Self {
            interval: config.interval(),
            state_dump_every: config.state_dump_every,
        }
    }

    /// Poll until the session fails or shutdown is requested.
    ///
    /// Exactly one failure classification ends a run; failures are never
    /// swallowed here.
    pub async fn run(
        &self,
        session: &mut dyn VehicleSession,
        bank: &mut OutputBank,
        shutdown: &mut ShutdownSignal,
    ) -> PollReport {
        let mut polls = 0u64;

        loop {
            if shutdown.is_triggered() {
                return Self::report(PollExit::Shutdown, polls);
            }

            let result = tokio::select! {
                biased;
                _ = shutdown.triggered() => None,
                result = session.poll_state() => Some(result),
            };
            let Some(result) = result else {
                return Self::report(PollExit::Shutdown, polls);
            };

            match result {
                Ok(state) => {
                    polls += 1;
                    let changed = bank.apply(&state);
                    debug!(poll = polls, changed, "Vehicle state applied");
                    if self.state_dump_every > 0 && polls % self.state_dump_every == 0 {
                        dump_state(polls, &state);
                    }
                }
                Err(err) => {
                    let class = err.classify();
                    error!(
                        class = %class,
                        error = %err,
                        polls,
                        "Error while fetching vehicle state"
                    );
                    return Self::report(PollExit::Failed(PollFailure { class, error: err }), polls);
                }
            }

            if self.interval.is_zero() {
                // Sessions may answer without suspending; other tasks on a
                // current-thread runtime still have to run
                tokio::task::yield_now().await;
            } else {
                tokio::select! {
                    biased;
                    _ = shutdown.triggered() => return Self::report(PollExit::Shutdown, polls),
                    _ = tokio::time::sleep(self.interval) => {}
                }
            }
        }
    }

    fn report(exit: PollExit, successful_polls: u64) -> PollReport {
        PollReport {
            exit,
            successful_polls,
        }
    }
}

fn dump_state(poll: u64, state: &VehicleState) {
    debug!(
        poll,
        driver_door_open = state.driver_door_open,
        passenger_door_open = state.passenger_door_open,
        locked = state.locked,
        awake = ?state.awake,
        "Vehicle state"
    );
}
