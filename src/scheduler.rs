use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::matchmaking::MatchmakingEngine;
use crate::simulation::Simulation;

/// Fixed-period driver for the simulation tick and the matchmaking pass.
///
/// Each iteration runs `Simulation::tick` and exactly one
/// `MatchmakingEngine::process`, then sleeps for whatever remains of the
/// period. An iteration that overruns the period rolls straight into
/// the next one; skipped time is never replayed. The stop token is
/// consulted at iteration boundaries only, so a started iteration
/// always runs to completion.
pub struct SimulationScheduler {
    simulation: Arc<dyn Simulation>,
    engine: Arc<MatchmakingEngine>,
    period: Duration,
}

impl SimulationScheduler {
    /// `tick_rate` is in ticks per second; the default server
    /// configuration uses 120.
    pub fn new(
        simulation: Arc<dyn Simulation>,
        engine: Arc<MatchmakingEngine>,
        tick_rate: u32,
    ) -> Self {
        Self {
            simulation,
            engine,
            period: Duration::from_secs_f64(1.0 / f64::from(tick_rate.max(1))),
        }
    }

    /// Spawn the loop task. The returned handle owns the stop token.
    pub fn start(self) -> SchedulerHandle {
        let token = CancellationToken::new();
        let loop_token = token.clone();
        let handle = tokio::spawn(async move { self.run(loop_token).await });
        SchedulerHandle { token, handle }
    }

    async fn run(self, token: CancellationToken) {
        info!(
            period_us = self.period.as_micros() as u64,
            "simulation loop started"
        );

        loop {
            if token.is_cancelled() {
                break;
            }

            let started = Instant::now();
            self.simulation.tick().await;
            self.engine.process().await;

            let elapsed = started.elapsed();
            if elapsed < self.period {
                let remainder = self.period - elapsed;
                tokio::select! {
                    () = tokio::time::sleep(remainder) => {}
                    () = token.cancelled() => break,
                }
            } else {
                // Overran the period: start the next iteration at once.
                // Missed ticks are not replayed.
                debug!(
                    elapsed_us = elapsed.as_micros() as u64,
                    "iteration overran tick period"
                );
            }
        }

        info!("simulation loop stopped");
    }
}

/// Owner of a running scheduler task.
pub struct SchedulerHandle {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Request a cooperative stop and wait for the in-flight iteration
    /// to finish.
    pub async fn shutdown(self) {
        self.token.cancel();
        if let Err(err) = self.handle.await {
            warn!(%err, "simulation loop task failed to join");
        }
    }
}
