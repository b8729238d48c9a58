// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Producer state machine with typed state transitions.
//!
//! Implements the run lifecycle: Priming → Publishing → AwaitingCompletion →
//! {Done | TimedOut | Aborted}. The burst, the completion watcher, the
//! deadline and the interrupt run concurrently; the first of the last three
//! to resolve decides the outcome.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::task::JoinHandle;

use crate::config::Config;
use crate::error::{ProbeResult, StateTransitionError};
use crate::generator::Generator;
use crate::metric::Metric;
use crate::report::RunSummary;
use crate::scenario::Scenario;
use crate::transport::{Subscription, Transport};
use crate::types::{JobTotal, Subject};

/// Producer lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProducerState {
    /// Subscribed to the metric topic, start marker recorded.
    Priming,

    /// Job messages are being published.
    Publishing,

    /// Burst handed off; waiting for the completion metric.
    AwaitingCompletion,

    /// The consumer confirmed the job.
    Done,

    /// The deadline elapsed first.
    TimedOut,

    /// An external interrupt arrived first.
    Aborted,
}

impl ProducerState {
    /// Get the state name for error messages.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Priming => "Priming",
            Self::Publishing => "Publishing",
            Self::AwaitingCompletion => "AwaitingCompletion",
            Self::Done => "Done",
            Self::TimedOut => "TimedOut",
            Self::Aborted => "Aborted",
        }
    }

    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::TimedOut | Self::Aborted)
    }

    /// Check if transition to the target state is valid.
    pub fn can_transition_to(&self, target: ProducerState) -> bool {
        matches!(
            (self, target),
            (Self::Priming, Self::Publishing) |
            // the race is armed as soon as the burst starts
            (Self::Publishing, Self::AwaitingCompletion) |
            (Self::AwaitingCompletion, Self::Done) |
            (Self::AwaitingCompletion, Self::TimedOut) |
            (Self::AwaitingCompletion, Self::Aborted)
        )
    }
}

impl std::fmt::Display for ProducerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// State machine for one producer run.
#[derive(Debug)]
pub struct ProducerStateMachine {
    current_state: ProducerState,
    last_transition: Instant,
    transition_count: u64,
}

impl ProducerStateMachine {
    pub fn new() -> Self {
        Self {
            current_state: ProducerState::Priming,
            last_transition: Instant::now(),
            transition_count: 0,
        }
    }

    pub fn state(&self) -> ProducerState {
        self.current_state
    }

    pub fn transition_count(&self) -> u64 {
        self.transition_count
    }

    /// Attempt to transition to a new state.
    pub fn transition_to(&mut self, target: ProducerState) -> Result<(), StateTransitionError> {
        if self.current_state.is_terminal() {
            return Err(StateTransitionError::TerminalState {
                state: self.current_state.name(),
            });
        }

        if !self.current_state.can_transition_to(target) {
            return Err(StateTransitionError::InvalidTransition {
                from: self.current_state.name(),
                to: target.name(),
            });
        }

        tracing::debug!(
            from = self.current_state.name(),
            to = target.name(),
            elapsed_us = self.last_transition.elapsed().as_micros() as u64,
            "Producer state transition"
        );

        self.current_state = target;
        self.last_transition = Instant::now();
        self.transition_count += 1;

        Ok(())
    }
}

impl Default for ProducerStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

/// Terminal outcome of a producer run.
#[derive(Debug, Clone)]
pub enum ProducerOutcome {
    Done(RunSummary),
    TimedOut,
    Aborted,
}

impl ProducerOutcome {
    pub fn state(&self) -> ProducerState {
        match self {
            Self::Done(_) => ProducerState::Done,
            Self::TimedOut => ProducerState::TimedOut,
            Self::Aborted => ProducerState::Aborted,
        }
    }
}

/// Emits one job and waits for the consumer's completion metric.
pub struct ProducerDriver {
    transport: Arc<dyn Transport>,
    generator: Arc<dyn Generator>,
    subject: Subject,
    total: JobTotal,
    timeout: Duration,
}

impl ProducerDriver {
    pub fn new(
        transport: Arc<dyn Transport>,
        generator: Arc<dyn Generator>,
        subject: Subject,
        total: JobTotal,
        timeout: Duration,
    ) -> Self {
        Self {
            transport,
            generator,
            subject,
            total,
            timeout,
        }
    }

    /// Build a driver for `config`, constructing the scenario's generator.
    pub fn from_config(transport: Arc<dyn Transport>, config: &Config) -> ProbeResult<Self> {
        Ok(Self::new(
            transport,
            Scenario::build_generator(config)?,
            config.subject.clone(),
            config.total,
            config.timeout,
        ))
    }

    /// Run one job. `interrupt` resolving first yields [`ProducerOutcome::Aborted`].
    ///
    /// The transport is flushed before returning, whatever the outcome.
    pub async fn run<F>(&self, interrupt: F) -> ProbeResult<ProducerOutcome>
    where
        F: Future<Output = ()>,
    {
        let mut machine = ProducerStateMachine::new();
        let total = self.total.value();

        // subscribe before the first message goes out so the answer cannot be missed
        let metrics = self
            .transport
            .subscribe(&self.subject.metric_topic())
            .await?;
        let base = Metric::base(total);
        tracing::info!(
            subject = %self.subject,
            total,
            timeout_ms = self.timeout.as_millis() as u64,
            "Starting job"
        );

        machine.transition_to(ProducerState::Publishing)?;
        let burst = self.spawn_burst();

        machine.transition_to(ProducerState::AwaitingCompletion)?;
        let finished = tokio::select! {
            metric = wait_for_completion(metrics, total) => Some(metric),
            _ = tokio::time::sleep(self.timeout) => None,
            _ = interrupt => {
                burst.abort();
                tracing::info!("User abort");
                self.drain().await;
                machine.transition_to(ProducerState::Aborted)?;
                return Ok(ProducerOutcome::Aborted);
            }
        };

        let outcome = match finished {
            Some(metric) => {
                let duration = metric.time - base.time;
                RunSummary::measure(self.generator.as_ref(), duration, total)
                    .map(ProducerOutcome::Done)
            }
            None => {
                burst.abort();
                tracing::info!(
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Timeout! Increase timeout_ms in the config for longer runs"
                );
                Ok(ProducerOutcome::TimedOut)
            }
        };

        self.drain().await;
        let outcome = outcome?;
        machine.transition_to(outcome.state())?;
        if let ProducerOutcome::Done(summary) = &outcome {
            summary.log();
        }

        Ok(outcome)
    }

    /// Best-effort flush of the connection after a terminal state.
    async fn drain(&self) {
        if let Err(e) = self.transport.flush().await {
            tracing::warn!(error = %e, "Final flush failed");
        }
    }

    /// Publish `0..total` on the data topic without waiting for acknowledgements.
    fn spawn_burst(&self) -> JoinHandle<()> {
        let transport = Arc::clone(&self.transport);
        let generator = Arc::clone(&self.generator);
        let topic = self.subject.data_topic();
        let total = self.total.value();

        tokio::spawn(async move {
            for count in 0..total {
                let message = match generator.generate(count, total) {
                    Ok(message) => message,
                    Err(e) => {
                        tracing::error!(count, error = %e, "Message generation failed, stopping burst");
                        return;
                    }
                };
                if let Err(e) = transport.publish(&topic, message.into_bytes()).await {
                    tracing::error!(count, error = %e, "Publish failed, stopping burst");
                    return;
                }
            }
            if let Err(e) = transport.flush().await {
                tracing::warn!(error = %e, "Flush after burst failed");
            }
            tracing::debug!(total, "Burst published");
        })
    }
}

/// Wait for a `"received"` metric matching `total`.
///
/// If the metric feed closes this never resolves, leaving the outcome to
/// the deadline or the interrupt.
async fn wait_for_completion(mut metrics: Subscription, total: u64) -> Metric {
    while let Some(raw) = metrics.next().await {
        match Metric::from_json(&raw) {
            Ok(metric) if metric.completes(total) => return metric,
            Ok(metric) => {
                tracing::debug!(job = ?metric.job, count = metric.count, "Ignoring unrelated metric");
            }
            Err(e) => tracing::debug!(error = %e, "Ignoring unparseable metric"),
        }
    }
    tracing::warn!("Metric subscription closed before completion");
    std::future::pending().await
}
