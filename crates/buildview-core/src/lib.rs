//! Core library for the live view of a CI build.
//!
//! A build runs a plan: a tree of tasks, resource gets and puts, grouped in
//! parallel (`aggregate`) or in sequence (`do`), decorated with hooks,
//! wrapped in `try`/`timeout`, or retried. This crate keeps that tree and
//! updates its steps as the build reports progress.
//!
//! # Architecture
//!
//! - **Tree** ([`tree`], [`models`]): the recursive [`StepTree`] enum and the
//!   mutable [`Step`] record at each leaf.
//! - **Focus** ([`focus`]): composable accessors that read or update one node
//!   without touching its siblings.
//! - **Model** ([`model`], [`builder`]): the tree plus an index from step
//!   identifier to focus, built once from a [`PlanNode`].
//! - **Navigation** ([`highlight`], [`tree::RetryStep`]): retry tab
//!   selection and the log line highlight with its location fragment.
//! - **Events** ([`events`]): translation of the build's event stream into
//!   model updates.
//!
//! The tree's shape never changes after construction. Clones of a
//! [`Model`] share every subtree an update did not touch.
//!
//! # Quick Start
//!
//! ```rust
//! use buildview_core::{Highlight, Model, PlanNode, StepStatus};
//!
//! let plan: PlanNode = serde_json::from_str(
//!     r#"{"do": [{"get": {"id": "a", "name": "repo"}},
//!                {"task": {"id": "b", "name": "unit"}}]}"#,
//! )?;
//!
//! let mut model = Model::build(Highlight::None, Vec::new(), &plan)?;
//! model.set_status("b", StepStatus::Running)?;
//!
//! assert_eq!(model.step("b")?.status, StepStatus::Running);
//! assert_eq!(model.step("a")?.status, StepStatus::Pending);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod builder;
pub mod display;
pub mod error;
pub mod events;
pub mod focus;
pub mod highlight;
pub mod model;
pub mod models;
pub mod plan;
pub mod tree;

// Re-export commonly used types
pub use builder::ModelBuilder;
pub use display::Outline;
pub use error::{Result, ViewError};
pub use events::{BuildEvent, BuildStatus, Origin};
pub use focus::Focus;
pub use highlight::{Highlight, Navigator};
pub use model::Model;
pub use models::{Expansion, MetadataField, Step, StepStatus, Version};
pub use plan::{PlanNode, ResourceInput};
pub use tree::{HookSlot, HookedStep, RetryStep, StepTree, Tab, TabFocus};
