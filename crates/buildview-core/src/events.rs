//! Build events and how they drive the model.
//!
//! Events arrive as JSON objects of the form
//! `{"event": "<kind>", "data": {...}}`, already in order. Each one is
//! translated into the step operations of [`Model`]; none of them touch the
//! tree directly.

use std::fmt;

use jiff::Timestamp;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::{
    error::{Result, ViewError},
    model::Model,
    models::{MetadataField, StepStatus, Version},
};

/// Where an event came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Origin {
    /// Identifier of the step that emitted the event
    pub id: String,
    /// Output stream, e.g. `stdout` or `stderr`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

/// Overall status of a build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildStatus {
    Pending,
    Started,
    Succeeded,
    Failed,
    Errored,
    Aborted,
}

impl BuildStatus {
    /// Whether no further events will change the build.
    pub fn is_finished(&self) -> bool {
        matches!(
            self,
            BuildStatus::Succeeded | BuildStatus::Failed | BuildStatus::Errored | BuildStatus::Aborted
        )
    }
}

impl fmt::Display for BuildStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BuildStatus::Pending => "pending",
            BuildStatus::Started => "started",
            BuildStatus::Succeeded => "succeeded",
            BuildStatus::Failed => "failed",
            BuildStatus::Errored => "errored",
            BuildStatus::Aborted => "aborted",
        };
        write!(f, "{name}")
    }
}

/// Completion report of a resource step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceFinished {
    pub origin: Origin,
    pub exit_status: i32,
    #[serde(default)]
    pub version: Option<Version>,
    #[serde(default)]
    pub metadata: Vec<MetadataField>,
}

/// One event of a build's event stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum BuildEvent {
    InitializeTask {
        origin: Origin,
    },
    StartTask {
        origin: Origin,
    },
    FinishTask {
        origin: Origin,
        exit_status: i32,
    },
    FinishGet(ResourceFinished),
    FinishPut(ResourceFinished),
    Log {
        origin: Origin,
        payload: String,
        /// Unix seconds
        #[serde(default)]
        time: Option<i64>,
    },
    Error {
        #[serde(default)]
        origin: Option<Origin>,
        message: String,
    },
    Status {
        status: BuildStatus,
        #[serde(default)]
        time: Option<i64>,
    },
}

fn exit_status(code: i32) -> StepStatus {
    if code == 0 {
        StepStatus::Succeeded
    } else {
        StepStatus::Failed
    }
}

fn timestamp(seconds: i64) -> Result<Timestamp> {
    Timestamp::from_second(seconds).map_err(|e| {
        ViewError::invalid_input("time").with_reason(format!("{seconds}: {e}"))
    })
}

impl Model {
    /// Applies one build event.
    ///
    /// # Errors
    ///
    /// Returns `ViewError::UnknownStep` when the event names a step that is
    /// not in the plan and `ViewError::InvalidInput` for out-of-range times.
    pub fn apply_event(&mut self, event: &BuildEvent) -> Result<()> {
        match event {
            BuildEvent::InitializeTask { origin } | BuildEvent::StartTask { origin } => {
                self.set_status(&origin.id, StepStatus::Running)
            }
            BuildEvent::FinishTask {
                origin,
                exit_status: code,
            } => self.set_status(&origin.id, exit_status(*code)),
            BuildEvent::FinishGet(finished) | BuildEvent::FinishPut(finished) => {
                let id = &finished.origin.id;
                self.set_status(id, exit_status(finished.exit_status))?;
                if let Some(version) = &finished.version {
                    self.set_version(id, version.clone())?;
                }
                self.set_metadata(id, finished.metadata.clone())
            }
            BuildEvent::Log {
                origin,
                payload,
                time,
            } => {
                let time = time.map(timestamp).transpose()?;
                self.update_step(&origin.id, |step| step.append_output(payload, time))
            }
            BuildEvent::Error {
                origin: Some(origin),
                message,
            } => {
                self.set_error(&origin.id, message.as_str())?;
                self.set_status(&origin.id, StepStatus::Errored)
            }
            BuildEvent::Error {
                origin: None,
                message,
            } => {
                warn!("build error not attributed to a step: {message}");
                Ok(())
            }
            BuildEvent::Status { status, .. } => {
                debug!("build status is now {status}");
                if status.is_finished() {
                    self.mark_finished();
                }
                Ok(())
            }
        }
    }
}
