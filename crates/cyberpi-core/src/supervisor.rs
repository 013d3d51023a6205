//! Outermost control loop
//!
//! Holds the output bank for the life of the process, asks the lifecycle
//! manager for a session, runs the poll loop against it and feeds the
//! outcome back, until shutdown or an unrecoverable failure.

use std::sync::Arc;

use tracing::{error, info};

use crate::bank::OutputBank;
use crate::config::CyberPiConfig;
use crate::error::SupervisorError;
use crate::gpio::DigitalOutput;
use crate::lifecycle::{LinkState, SessionLifecycle};
use crate::poll::{PollExit, PollLoop};
use crate::provider::VehicleSessionProvider;
use crate::shutdown::ShutdownSignal;

/// How the supervisor stopped when it did not fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    /// A shutdown signal was received
    Shutdown,
}

pub struct Supervisor {
    lifecycle: SessionLifecycle,
    poll: PollLoop,
    bank: OutputBank,
}

impl Supervisor {
    pub fn new(lifecycle: SessionLifecycle, poll: PollLoop, bank: OutputBank) -> Self {
        Self {
            lifecycle,
            poll,
            bank,
        }
    }

    /// Wire a supervisor from configuration and the two external collaborators
    pub fn from_config(
        config: &CyberPiConfig,
        provider: Arc<dyn VehicleSessionProvider>,
        device: Box<dyn DigitalOutput>,
    ) -> Self {
        let bank = OutputBank::new(device, &config.outputs);
        let lifecycle =
            SessionLifecycle::new(provider, config.identity(), config.reconnect.clone());
        let poll = PollLoop::new(&config.poll);
        Self::new(lifecycle, poll, bank)
    }

    pub fn bank(&self) -> &OutputBank {
        &self.bank
    }

    pub fn link_state(&self) -> LinkState {
        self.lifecycle.state()
    }

    /// Run until shutdown is requested or the lifecycle aborts.
    ///
    /// On abort the live session (if any) has already been disconnected
    /// best-effort by the lifecycle manager.
    pub async fn run(&mut self, mut shutdown: ShutdownSignal) -> Result<ExitReason, SupervisorError> {
        info!("Supervisor started");

        loop {
            let session = match self.lifecycle.establish(&mut shutdown).await {
                Ok(Some(session)) => session,
                Ok(None) => break,
                Err(e) => {
                    error!(error = %e, "Session lifecycle aborted");
                    return Err(e.into());
                }
            };

            let report = self.poll.run(session, &mut self.bank, &mut shutdown).await;

            match report.exit {
                PollExit::Shutdown => break,
                PollExit::Failed(failure) => {
                    if let Err(e) = self
                        .lifecycle
                        .recover(&failure, report.successful_polls)
                        .await
                    {
                        error!(error = %e, "Unrecoverable failure, stopping");
                        return Err(e.into());
                    }
                }
            }
        }

        info!("Shutdown requested, releasing session");
        self.lifecycle.release().await;
        info!("Supervisor stopped");
        Ok(ExitReason::Shutdown)
    }
}
