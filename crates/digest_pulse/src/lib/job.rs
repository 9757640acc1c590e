//! # Job state
//!
//! A batch job moves `Pending -> Running -> Succeeded | Failed`. The running
//! task owns a [`JobReporter`]; any number of [`JobHandle`]s read snapshots of
//! the current state without blocking it. Once terminal, the state never
//! changes again.

use std::fmt;

use serde::Serialize;
use tokio::sync::watch;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStage {
    CreateBatch,
    Search,
    ProcessVideo,
    Finalize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The batch could not be created or written
    Persistence,
    /// The job task panicked
    Internal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobProgress {
    pub stage: JobStage,
    pub status: String,
    pub current: Option<usize>,
    pub total: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobOutcome {
    pub batch_id: String,
    pub summary_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobFailure {
    pub stage: JobStage,
    pub kind: FailureKind,
    pub message: String,
}

impl JobFailure {
    pub fn new(stage: JobStage, kind: FailureKind, message: impl fmt::Display) -> Self {
        JobFailure {
            stage,
            kind,
            message: message.to_string(),
        }
    }
}

impl fmt::Display for JobFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} failure during {:?}: {}", self.kind, self.stage, self.message)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum JobState {
    Pending,
    Running(JobProgress),
    Succeeded(JobOutcome),
    Failed(JobFailure),
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Succeeded(_) | JobState::Failed(_))
    }
}

fn is_valid_transition(from: &JobState, to: &JobState) -> bool {
    matches!(
        (from, to),
        (JobState::Pending, JobState::Running(_) | JobState::Failed(_))
            | (
                JobState::Running(_),
                JobState::Running(_) | JobState::Succeeded(_) | JobState::Failed(_)
            )
    )
}

/// Write side of a job's state, held by the task running it
#[derive(Debug)]
pub struct JobReporter {
    tx: watch::Sender<JobState>,
}

impl JobReporter {
    pub fn channel() -> (JobReporter, JobHandle) {
        let (tx, rx) = watch::channel(JobState::Pending);
        (JobReporter { tx }, JobHandle { rx })
    }

    pub fn progress(
        &self,
        stage: JobStage,
        status: impl Into<String>,
        counter: Option<(usize, usize)>,
    ) {
        let status = status.into();
        tracing::info!(
            ?stage,
            %status,
            current = counter.map(|(c, _)| c),
            total = counter.map(|(_, t)| t),
            "Job progress"
        );
        self.transition(JobState::Running(JobProgress {
            stage,
            status,
            current: counter.map(|(c, _)| c),
            total: counter.map(|(_, t)| t),
        }));
    }

    pub fn finish(&self, state: JobState) {
        debug_assert!(state.is_terminal());
        self.transition(state);
    }

    /// Stage of the most recent progress update, if any
    pub fn current_stage(&self) -> Option<JobStage> {
        match &*self.tx.borrow() {
            JobState::Running(progress) => Some(progress.stage),
            _ => None,
        }
    }

    fn transition(&self, next: JobState) -> bool {
        // send_if_modified updates the value even when no handle is listening
        self.tx.send_if_modified(|current| {
            if !is_valid_transition(current, &next) {
                tracing::warn!(from = ?current, to = ?next, "Ignoring invalid job transition");
                return false;
            }
            *current = next;
            true
        })
    }
}

/// Read side of a job's state
#[derive(Debug, Clone)]
pub struct JobHandle {
    rx: watch::Receiver<JobState>,
}

impl JobHandle {
    /// Current state; never blocks
    pub fn state(&self) -> JobState {
        self.rx.borrow().clone()
    }

    /// Resolves once the job reaches a terminal state
    pub async fn wait(&mut self) -> JobState {
        let terminal = self
            .rx
            .wait_for(JobState::is_terminal)
            .await
            .map(|state| state.clone());

        match terminal {
            Ok(state) => state,
            Err(_) => {
                // reporter dropped without finishing; keep whatever it left
                let stage = match self.state() {
                    last @ (JobState::Succeeded(_) | JobState::Failed(_)) => return last,
                    JobState::Running(progress) => progress.stage,
                    JobState::Pending => JobStage::CreateBatch,
                };
                JobState::Failed(JobFailure::new(
                    stage,
                    FailureKind::Internal,
                    "job ended without reporting a result",
                ))
            }
        }
    }
}
