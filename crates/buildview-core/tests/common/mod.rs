use buildview_core::{Model, ModelBuilder, PlanNode};

/// Parses a JSON build plan.
pub fn plan(json: &str) -> PlanNode {
    serde_json::from_str(json).expect("Failed to parse plan")
}

/// Builds a model from a JSON build plan with default options.
pub fn build(json: &str) -> Model {
    ModelBuilder::new()
        .build(&plan(json))
        .expect("Failed to build model")
}

/// A plan exercising every node kind.
pub const FULL_PLAN: &str = r#"{"do": [
    {"aggregate": [
        {"get": {"id": "g1", "name": "repo"}},
        {"get": {"id": "g2", "name": "tools", "version": {"ref": "v1"}}}
    ]},
    {"retry": {"id": "r", "attempts": [
        {"timeout": {"task": {"id": "t1", "name": "unit"}}},
        {"timeout": {"task": {"id": "t2", "name": "unit"}}},
        {"timeout": {"task": {"id": "t3", "name": "unit"}}}
    ]}},
    {"on_success": {
        "step": {"put": {"id": "p1", "name": "image"}},
        "hook": {"dependent_get": {"id": "d1", "name": "image"}}
    }},
    {"on_failure": {
        "step": {"try": {"task": {"id": "t4", "name": "flaky"}}},
        "hook": {"task": {"id": "t5", "name": "notify"}}
    }},
    {"on_abort": {
        "step": {"task": {"id": "t6", "name": "deploy"}},
        "hook": {"task": {"id": "t7", "name": "rollback"}}
    }},
    {"ensure": {
        "step": {"task": {"id": "t8", "name": "smoke"}},
        "hook": {"task": {"id": "t9", "name": "cleanup"}}
    }}
]}"#;

/// Identifiers of every leaf in [`FULL_PLAN`].
pub const FULL_PLAN_STEPS: &[&str] = &[
    "g1", "g2", "t1", "t2", "t3", "p1", "d1", "t4", "t5", "t6", "t7", "t8", "t9",
];
