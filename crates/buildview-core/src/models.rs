//! Data models for individual build steps.
//!
//! A [`Step`] is the mutable record behind every leaf of the step tree
//! (task runs, resource gets and puts). All of its fields change as build
//! events arrive; its identifier and name are fixed by the build plan.

use std::{collections::BTreeMap, fmt, str::FromStr};

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

/// Resource version, as reported by a get or put.
pub type Version = BTreeMap<String, String>;

/// Type-safe enumeration of step statuses.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    /// Step has not started yet
    #[default]
    Pending,

    /// Step is executing
    Running,

    /// Step finished with a zero exit status
    Succeeded,

    /// Step finished with a non-zero exit status
    Failed,

    /// Step could not run to completion
    Errored,
}

impl FromStr for StepStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(StepStatus::Pending),
            "running" => Ok(StepStatus::Running),
            "succeeded" => Ok(StepStatus::Succeeded),
            "failed" => Ok(StepStatus::Failed),
            "errored" => Ok(StepStatus::Errored),
            _ => Err(format!("Invalid step status: {s}")),
        }
    }
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl StepStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StepStatus::Pending => "pending",
            StepStatus::Running => "running",
            StepStatus::Succeeded => "succeeded",
            StepStatus::Failed => "failed",
            StepStatus::Errored => "errored",
        }
    }

    /// Whether a step in this status has started doing anything.
    pub fn is_active(&self) -> bool {
        *self != StepStatus::Pending
    }

    /// Whether a step in this status is shown open when the user has not
    /// chosen otherwise.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use buildview_core::StepStatus;
    ///
    /// assert!(!StepStatus::Pending.expanded_by_default());
    /// assert!(StepStatus::Running.expanded_by_default());
    /// assert!(!StepStatus::Succeeded.expanded_by_default());
    /// assert!(StepStatus::Failed.expanded_by_default());
    /// ```
    pub fn expanded_by_default(&self) -> bool {
        !matches!(self, StepStatus::Pending | StepStatus::Succeeded)
    }
}

/// Explicit expansion override set by the user.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Expansion {
    /// Follow the status-derived default
    #[default]
    Unset,

    /// Pinned open
    Expanded,

    /// Pinned closed
    Collapsed,
}

/// A single name/value pair of resource metadata.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
pub struct MetadataField {
    pub name: String,
    pub value: String,
}

/// Represents a single executable step of a build.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Step {
    /// Identifier, unique across the whole build plan
    pub id: String,

    /// Name shown for the step (task name or resource name)
    pub name: String,

    /// Current status of the step
    pub status: StepStatus,

    /// Log lines received so far, oldest first
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub log: Vec<String>,

    /// Error reported for the step, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// User override of the expansion state
    #[serde(default)]
    pub expanded: Expansion,

    /// Resource version fetched or produced by this step
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<Version>,

    /// Resource metadata reported when the step finished
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub metadata: Vec<MetadataField>,

    /// Whether this is the first build to fetch the resource version
    #[serde(default)]
    pub first_occurrence: bool,

    /// Arrival time of log lines, keyed by 1-based line number
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub timestamps: BTreeMap<usize, Timestamp>,

    /// Whether the last log line is still waiting for its newline
    #[serde(skip)]
    pub open_line: bool,
}

impl Step {
    /// Creates a pending step with no output.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            status: StepStatus::Pending,
            log: Vec::new(),
            error: None,
            expanded: Expansion::Unset,
            version: None,
            metadata: Vec::new(),
            first_occurrence: false,
            timestamps: BTreeMap::new(),
            open_line: false,
        }
    }

    /// Effective expansion: the explicit override when set, otherwise the
    /// default for the current status.
    pub fn is_expanded(&self) -> bool {
        match self.expanded {
            Expansion::Unset => self.status.expanded_by_default(),
            Expansion::Expanded => true,
            Expansion::Collapsed => false,
        }
    }

    /// Pins the expansion override to the opposite of what is shown now.
    pub fn toggle_expanded(&mut self) {
        self.expanded = if self.is_expanded() {
            Expansion::Collapsed
        } else {
            Expansion::Expanded
        };
    }

    /// Appends log lines and records their arrival times.
    ///
    /// `timestamps` is keyed by 1-based line number of the whole log, so
    /// entries may refer to lines appended by earlier calls.
    pub fn append_log<I>(&mut self, lines: I, timestamps: BTreeMap<usize, Timestamp>)
    where
        I: IntoIterator<Item = String>,
    {
        self.log.extend(lines);
        self.timestamps.extend(timestamps);
        self.open_line = false;
    }

    /// Appends a chunk of raw output.
    ///
    /// A chunk may end in the middle of a line; the next chunk then continues
    /// that line instead of starting a new one. `time` is recorded only for
    /// lines this chunk starts.
    pub fn append_output(&mut self, payload: &str, time: Option<Timestamp>) {
        if payload.is_empty() {
            return;
        }

        let body = payload.strip_suffix('\n').unwrap_or(payload);
        for (i, segment) in body.split('\n').enumerate() {
            if i == 0 && self.open_line {
                if let Some(last) = self.log.last_mut() {
                    last.push_str(segment);
                    continue;
                }
            }
            self.log.push(segment.to_string());
            if let Some(time) = time {
                self.timestamps.insert(self.log.len(), time);
            }
        }
        self.open_line = !payload.ends_with('\n');
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip_through_str() {
        for status in [
            StepStatus::Pending,
            StepStatus::Running,
            StepStatus::Succeeded,
            StepStatus::Failed,
            StepStatus::Errored,
        ] {
            assert_eq!(status.as_str().parse::<StepStatus>(), Ok(status));
        }
        assert!("aborted".parse::<StepStatus>().is_err());
        assert_eq!("RUNNING".parse::<StepStatus>(), Ok(StepStatus::Running));
    }

    #[test]
    fn test_default_expansion_follows_status() {
        let mut step = Step::new("1", "unit");
        assert!(!step.is_expanded());

        step.status = StepStatus::Running;
        assert!(step.is_expanded());

        step.status = StepStatus::Succeeded;
        assert!(!step.is_expanded());

        step.status = StepStatus::Errored;
        assert!(step.is_expanded());
    }

    #[test]
    fn test_toggle_pins_expansion_across_status_changes() {
        let mut step = Step::new("1", "unit");
        step.status = StepStatus::Running;

        step.toggle_expanded();
        assert_eq!(step.expanded, Expansion::Collapsed);
        assert!(!step.is_expanded());

        step.status = StepStatus::Failed;
        assert!(!step.is_expanded());

        step.toggle_expanded();
        assert_eq!(step.expanded, Expansion::Expanded);
        step.status = StepStatus::Succeeded;
        assert!(step.is_expanded());
    }

    #[test]
    fn test_append_log_merges_timestamps() {
        let mut step = Step::new("1", "unit");
        let t1 = Timestamp::from_second(1_640_995_200).unwrap();
        let t2 = Timestamp::from_second(1_640_995_260).unwrap();

        step.append_log(vec!["one".to_string()], BTreeMap::from([(1, t1)]));
        step.append_log(
            vec!["two".to_string(), "three".to_string()],
            BTreeMap::from([(2, t2), (3, t2)]),
        );

        assert_eq!(step.log, vec!["one", "two", "three"]);
        assert_eq!(step.timestamps.get(&1), Some(&t1));
        assert_eq!(step.timestamps.get(&3), Some(&t2));
    }

    #[test]
    fn test_output_chunks_continue_open_lines() {
        let mut step = Step::new("1", "unit");
        let t1 = Timestamp::from_second(1_640_995_200).unwrap();
        let t2 = Timestamp::from_second(1_640_995_260).unwrap();

        step.append_output("fetch", Some(t1));
        assert!(step.open_line);
        step.append_output("ing\n\ndone", Some(t2));
        step.append_output("\n", None);
        step.append_output("", Some(t2));
        step.append_output("tail\n", None);

        assert_eq!(step.log, vec!["fetching", "", "done", "tail"]);
        assert!(!step.open_line);
        assert_eq!(step.timestamps.get(&1), Some(&t1));
        assert_eq!(step.timestamps.get(&2), Some(&t2));
        assert_eq!(step.timestamps.get(&3), Some(&t2));
        assert_eq!(step.timestamps.get(&4), None);
    }

    #[test]
    fn test_step_serializes_without_empty_fields() {
        let step = Step::new("1", "unit");
        let json = serde_json::to_value(&step).unwrap();
        assert_eq!(json["status"], "pending");
        assert!(json.get("log").is_none());
        assert!(json.get("error").is_none());
        assert_eq!(json["expanded"], "unset");
    }
}
