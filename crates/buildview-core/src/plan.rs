//! Declarative build plan input.
//!
//! The plan mirrors the shape of [`crate::StepTree`] one variant for one
//! variant and is what the build view is constructed from. In JSON every
//! node is a single-key object naming its kind:
//!
//! ```json
//! {"do": [
//!   {"get": {"id": "1", "name": "repo"}},
//!   {"retry": {"id": "2", "attempts": [
//!     {"task": {"id": "3", "name": "unit"}},
//!     {"task": {"id": "4", "name": "unit"}}
//!   ]}},
//!   {"ensure": {"step": {"put": {"id": "5", "name": "image"}},
//!               "hook": {"task": {"id": "6", "name": "cleanup"}}}}
//! ]}
//! ```

use std::{fs::File, io::BufReader, path::Path};

use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::{
    error::{Result, ViewError},
    models::Version,
};

/// A leaf step of the plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
pub struct LeafPlan {
    pub id: String,
    pub name: String,
}

/// A resource fetch, optionally pinned to a version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
pub struct GetPlan {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<Version>,
}

/// A step followed by a conditional hook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
pub struct HookedPlan {
    pub step: Box<PlanNode>,
    #[serde(alias = "next")]
    pub hook: Box<PlanNode>,
}

/// Attempts at the same step, run until one succeeds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
pub struct RetryPlan {
    pub id: String,
    pub attempts: Vec<PlanNode>,
}

/// A node of the declarative build plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
#[serde(rename_all = "snake_case")]
pub enum PlanNode {
    Task(LeafPlan),
    Get(GetPlan),
    Put(LeafPlan),
    DependentGet(LeafPlan),
    Aggregate(Vec<PlanNode>),
    Do(Vec<PlanNode>),
    OnSuccess(HookedPlan),
    OnFailure(HookedPlan),
    OnAbort(HookedPlan),
    Ensure(HookedPlan),
    Try(Box<PlanNode>),
    Timeout(Box<PlanNode>),
    Retry(RetryPlan),
}

/// A resource input of the build and whether this build is the first to
/// use its version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
pub struct ResourceInput {
    pub name: String,
    #[serde(default)]
    pub first_occurrence: bool,
}

/// First-occurrence flag of the first input named `name`; false when no
/// input matches.
pub fn first_occurrence(resources: &[ResourceInput], name: &str) -> bool {
    resources
        .iter()
        .find(|input| input.name == name)
        .is_some_and(|input| input.first_occurrence)
}

/// Reads and deserializes a JSON file.
///
/// # Errors
///
/// Returns `ViewError::FileSystem` if the file cannot be opened and
/// `ViewError::Serialization` if its contents do not deserialize into `T`.
pub fn read_json_file<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let file = File::open(path).map_err(|source| ViewError::FileSystem {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(serde_json::from_reader(BufReader::new(file))?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_json_shape() {
        let plan: PlanNode = serde_json::from_str(
            r#"{"do": [
                {"get": {"id": "1", "name": "repo", "version": {"ref": "abc"}}},
                {"try": {"task": {"id": "2", "name": "lint"}}},
                {"on_failure": {"step": {"task": {"id": "3", "name": "unit"}},
                                "next": {"put": {"id": "4", "name": "alert"}}}},
                {"retry": {"id": "5", "attempts": [{"dependent_get": {"id": "6", "name": "img"}}]}}
            ]}"#,
        )
        .unwrap();

        let PlanNode::Do(steps) = plan else {
            panic!("expected do");
        };
        assert_eq!(steps.len(), 4);
        assert!(matches!(&steps[0], PlanNode::Get(get) if get.version.as_ref().unwrap()["ref"] == "abc"));
        assert!(matches!(&steps[1], PlanNode::Try(inner) if matches!(**inner, PlanNode::Task(_))));
        assert!(matches!(&steps[2], PlanNode::OnFailure(hooked) if matches!(*hooked.hook, PlanNode::Put(_))));
        assert!(matches!(&steps[3], PlanNode::Retry(retry) if retry.attempts.len() == 1));
    }

    #[test]
    fn test_first_occurrence_takes_first_matching_name() {
        let resources = vec![
            ResourceInput {
                name: "y".to_string(),
                first_occurrence: true,
            },
            ResourceInput {
                name: "x".to_string(),
                first_occurrence: false,
            },
            ResourceInput {
                name: "x".to_string(),
                first_occurrence: true,
            },
        ];

        assert!(!first_occurrence(&resources, "x"));
        assert!(first_occurrence(&resources, "y"));
        assert!(!first_occurrence(&resources, "z"));
    }

    #[test]
    fn test_read_json_file_reports_missing_path() {
        let err = read_json_file::<PlanNode>(Path::new("/nonexistent/plan.json")).unwrap_err();
        assert!(matches!(err, ViewError::FileSystem { .. }));
    }
}
