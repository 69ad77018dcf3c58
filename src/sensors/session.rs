//! Telemetry session task.
//!
//! Owns the pipeline for one connected trainer. Notifications arrive on a
//! tokio channel from the transport layer; each one is turned into a sample,
//! fed to the workout engine when one is attached, and fanned out to sample
//! and guidance subscribers. The session ends when the notification channel
//! closes or shutdown is requested, and yields the ride summary.

use crate::broadcast::Broadcaster;
use crate::metrics::summary::{SessionSummary, SummaryAccumulator};
use crate::sensors::pipeline::{PipelineStats, TelemetryPipeline};
use crate::sensors::types::{RawNotification, TelemetrySample};
use crate::workouts::engine::WorkoutEngine;
use crate::workouts::types::Guidance;
use crossbeam::channel::Receiver;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

/// Default queue depth for sample subscribers.
pub const DEFAULT_SAMPLE_CAPACITY: usize = 256;
/// Default queue depth for guidance subscribers.
pub const DEFAULT_GUIDANCE_CAPACITY: usize = 64;

/// Errors from a running session.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The session task panicked or was cancelled
    #[error("Session task failed: {0}")]
    TaskFailed(String),
}

impl From<tokio::task::JoinError> for SessionError {
    fn from(e: tokio::task::JoinError) -> Self {
        SessionError::TaskFailed(e.to_string())
    }
}

/// One trainer connection's telemetry flow.
pub struct TelemetrySession {
    pipeline: TelemetryPipeline,
    samples: Arc<Broadcaster<TelemetrySample>>,
    guidance: Arc<Broadcaster<Guidance>>,
    workout: Option<Arc<Mutex<WorkoutEngine>>>,
    summary: SummaryAccumulator,
}

impl TelemetrySession {
    pub fn new(pipeline: TelemetryPipeline) -> Self {
        Self::with_capacity(pipeline, DEFAULT_SAMPLE_CAPACITY, DEFAULT_GUIDANCE_CAPACITY)
    }

    /// Create a session with explicit subscriber queue depths.
    pub fn with_capacity(
        pipeline: TelemetryPipeline,
        sample_capacity: usize,
        guidance_capacity: usize,
    ) -> Self {
        Self {
            pipeline,
            samples: Arc::new(Broadcaster::new("samples", sample_capacity)),
            guidance: Arc::new(Broadcaster::new("guidance", guidance_capacity)),
            workout: None,
            summary: SummaryAccumulator::new(),
        }
    }

    /// Drive a workout engine from this session's samples.
    pub fn with_workout(mut self, engine: Arc<Mutex<WorkoutEngine>>) -> Self {
        self.workout = Some(engine);
        self
    }

    pub fn subscribe_samples(&self) -> Receiver<TelemetrySample> {
        self.samples.subscribe()
    }

    pub fn subscribe_guidance(&self) -> Receiver<Guidance> {
        self.guidance.subscribe()
    }

    pub fn stats(&self) -> PipelineStats {
        self.pipeline.stats()
    }

    /// Summary of everything processed so far.
    pub fn summary(&self) -> SessionSummary {
        self.summary.summary()
    }

    /// Forget revolution history after the trainer reconnects.
    pub fn reset(&mut self) {
        self.pipeline.reset();
    }

    /// Process one notification synchronously.
    pub fn handle_notification(&mut self, raw: &RawNotification) -> TelemetrySample {
        let sample = self.pipeline.process(raw);
        self.summary.record(&sample);

        if let Some(engine) = &self.workout {
            let guidance = {
                let mut engine = match engine.lock() {
                    Ok(guard) => guard,
                    Err(poisoned) => poisoned.into_inner(),
                };
                engine.update(&sample)
            };
            if let Some(guidance) = guidance {
                self.summary.record_guidance(&guidance);
                self.guidance.publish(guidance);
            }
        }

        self.samples.publish(sample.clone());
        sample
    }

    /// Process notifications until the channel closes or shutdown fires.
    ///
    /// Notifications still queued when shutdown fires are discarded.
    pub async fn run(
        mut self,
        mut notifications: mpsc::Receiver<RawNotification>,
        mut shutdown: oneshot::Receiver<()>,
    ) -> SessionSummary {
        tracing::info!("Telemetry session started");

        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    tracing::info!("Telemetry session shutdown requested");
                    break;
                }
                next = notifications.recv() => match next {
                    Some(raw) => {
                        self.handle_notification(&raw);
                    }
                    None => {
                        tracing::info!("Notification channel closed");
                        break;
                    }
                },
            }
        }

        let stats = self.pipeline.stats();
        tracing::info!(
            "Telemetry session ended: {} frames, {} truncated, {} low confidence, {} power rejected",
            stats.frames,
            stats.truncated,
            stats.low_confidence,
            stats.power_rejected
        );
        self.summary.finish()
    }

    /// Run the session on the tokio runtime.
    pub fn spawn(self, notifications: mpsc::Receiver<RawNotification>) -> SessionHandle {
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let task = tokio::spawn(self.run(notifications, shutdown_rx));
        SessionHandle {
            shutdown_tx: Some(shutdown_tx),
            task,
        }
    }
}

/// Handle to a spawned session.
pub struct SessionHandle {
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: JoinHandle<SessionSummary>,
}

impl SessionHandle {
    /// Ask the session to stop and wait for its summary.
    pub async fn shutdown(mut self) -> Result<SessionSummary, SessionError> {
        if let Some(tx) = self.shutdown_tx.take() {
            // The task may already have finished on its own
            let _ = tx.send(());
        }
        Ok(self.task.await?)
    }

    /// Wait for the session to end on its own (channel closed).
    pub async fn join(self) -> Result<SessionSummary, SessionError> {
        let SessionHandle { shutdown_tx, task } = self;
        let summary = task.await?;
        drop(shutdown_tx);
        Ok(summary)
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}
