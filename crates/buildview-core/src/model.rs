//! The build view model and every operation that mutates it.
//!
//! A [`Model`] pairs the step tree with an index from identifier to
//! [`Focus`]. All step mutations go through [`Model::update_at`], which looks
//! the identifier up and updates the tree through its focus; nothing ever
//! walks the tree searching for an identifier.
//!
//! `Model` is cheap to clone. A clone is a snapshot: later updates to
//! either copy copy-on-write the nodes they touch and leave the other copy
//! as it was.

use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

use jiff::Timestamp;
use log::{debug, trace};
use serde::Serialize;

use crate::{
    builder::{Index, ModelBuilder},
    error::{Result, ViewError},
    focus::Focus,
    highlight::{Highlight, Navigator},
    models::{MetadataField, Step, StepStatus, Version},
    plan::{PlanNode, ResourceInput},
    tree::{RetryStep, StepTree, TabFocus},
};

/// Live state of one build view.
#[derive(Debug, Clone, Serialize)]
pub struct Model {
    tree: Arc<StepTree>,
    #[serde(skip)]
    index: Arc<HashMap<String, Focus>>,
    finished: bool,
    highlight: Highlight,
}

impl Model {
    /// Builds the model for `plan`.
    ///
    /// Shorthand for [`ModelBuilder`] with a highlight and resource inputs.
    ///
    /// # Errors
    ///
    /// Returns `ViewError::DuplicateStepId` if identifiers in `plan` are not
    /// unique.
    pub fn build(
        highlight: Highlight,
        resources: Vec<ResourceInput>,
        plan: &PlanNode,
    ) -> Result<Self> {
        ModelBuilder::new()
            .with_highlight(highlight)
            .with_resources(resources)
            .build(plan)
    }

    pub(crate) fn from_parts(tree: Arc<StepTree>, index: Index, highlight: Highlight) -> Self {
        Self {
            tree,
            index: Arc::new(index),
            finished: false,
            highlight,
        }
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub fn tree(&self) -> &StepTree {
        &self.tree
    }

    /// The shared root, for identity comparisons between snapshots.
    pub fn root(&self) -> &Arc<StepTree> {
        &self.tree
    }

    pub fn highlight(&self) -> &Highlight {
        &self.highlight
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Every addressable identifier, in no particular order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.index.keys().map(String::as_str)
    }

    /// The focus stored for `id`.
    ///
    /// # Errors
    ///
    /// Returns `ViewError::UnknownStep` if `id` was not part of the plan.
    pub fn focus(&self, id: &str) -> Result<&Focus> {
        self.index
            .get(id)
            .ok_or_else(|| ViewError::UnknownStep { id: id.to_string() })
    }

    /// The node addressed by `id`.
    ///
    /// # Errors
    ///
    /// Returns `ViewError::UnknownStep` if `id` was not part of the plan.
    pub fn get(&self, id: &str) -> Result<&StepTree> {
        self.focus(id)?.get(&self.tree)
    }

    /// The leaf step addressed by `id`.
    ///
    /// # Errors
    ///
    /// Returns `ViewError::UnknownStep` for unknown identifiers and
    /// `ViewError::NotAStep` when `id` names a retry.
    pub fn step(&self, id: &str) -> Result<&Step> {
        let node = self.get(id)?;
        node.as_step().ok_or_else(|| ViewError::NotAStep {
            id: id.to_string(),
            node: node.kind(),
        })
    }

    /// The retry node addressed by `id`.
    ///
    /// # Errors
    ///
    /// Returns `ViewError::UnknownStep` for unknown identifiers and
    /// `ViewError::NotARetry` when `id` names a leaf step.
    pub fn retry(&self, id: &str) -> Result<&RetryStep> {
        let node = self.get(id)?;
        node.as_retry().ok_or_else(|| ViewError::NotARetry {
            id: id.to_string(),
            node: node.kind(),
        })
    }

    // ------------------------------------------------------------------
    // Updates
    // ------------------------------------------------------------------

    /// Applies `f` to the node addressed by `id`.
    ///
    /// # Errors
    ///
    /// Returns `ViewError::UnknownStep` if `id` was not part of the plan.
    pub fn update_at<F>(&mut self, id: &str, f: F) -> Result<()>
    where
        F: FnOnce(&mut StepTree),
    {
        let focus = self
            .index
            .get(id)
            .ok_or_else(|| ViewError::UnknownStep { id: id.to_string() })?;
        trace!("updating {id} at depth {}", focus.depth());
        focus.update(&mut self.tree, f)
    }

    /// Applies `f` to the leaf step addressed by `id`.
    ///
    /// # Errors
    ///
    /// Returns `ViewError::UnknownStep` for unknown identifiers and
    /// `ViewError::NotAStep` when `id` names a retry.
    pub fn update_step<F>(&mut self, id: &str, f: F) -> Result<()>
    where
        F: FnOnce(&mut Step),
    {
        self.step(id)?;
        self.update_at(id, |node| {
            if let Some(step) = node.as_step_mut() {
                f(step);
            }
        })
    }

    pub fn set_status(&mut self, id: &str, status: StepStatus) -> Result<()> {
        self.update_step(id, |step| step.status = status)
    }

    /// Appends log lines to a step.
    ///
    /// `timestamps` maps 1-based line numbers to the time the line arrived.
    pub fn append_log(
        &mut self,
        id: &str,
        lines: Vec<String>,
        timestamps: BTreeMap<usize, Timestamp>,
    ) -> Result<()> {
        self.update_step(id, |step| step.append_log(lines, timestamps))
    }

    pub fn set_version(&mut self, id: &str, version: Version) -> Result<()> {
        self.update_step(id, |step| step.version = Some(version))
    }

    pub fn set_metadata(&mut self, id: &str, metadata: Vec<MetadataField>) -> Result<()> {
        self.update_step(id, |step| step.metadata = metadata)
    }

    pub fn set_error(&mut self, id: &str, message: impl Into<String>) -> Result<()> {
        let message = message.into();
        self.update_step(id, |step| step.error = Some(message))
    }

    /// Marks the whole build as finished.
    pub fn mark_finished(&mut self) {
        self.finished = true;
    }

    /// Flips the effective expansion of a step and pins it.
    pub fn toggle_expansion(&mut self, id: &str) -> Result<()> {
        self.update_step(id, Step::toggle_expanded)
    }

    /// Shows attempt `tab` (1-based) of a retry and stops following updates.
    ///
    /// # Errors
    ///
    /// Returns `ViewError::NotARetry` if `id` does not name a retry and
    /// `ViewError::NoSuchAttempt` if the retry has no attempt `tab`.
    pub fn switch_tab(&mut self, id: &str, tab: usize) -> Result<()> {
        let attempts = self.retry(id)?.attempts.len();
        if tab == 0 || tab > attempts {
            return Err(ViewError::NoSuchAttempt {
                id: id.to_string(),
                tab,
                attempts,
            });
        }

        debug!("retry {id} pinned to tab {tab}");
        self.update_at(id, |node| {
            if let StepTree::Retry(retry) = node {
                retry.tab = tab;
                retry.focus = TabFocus::User;
            }
        })
    }

    /// Highlights a single log line and publishes the new fragment.
    pub fn set_highlight<N>(&mut self, id: &str, line: u32, navigator: &mut N)
    where
        N: Navigator + ?Sized,
    {
        self.highlight = Highlight::line(id, line);
        navigator.set_fragment(&self.highlight.to_fragment());
    }

    /// Extends the highlight to `line` (see [`Highlight::extend`]) and
    /// publishes the new fragment.
    pub fn extend_highlight<N>(&mut self, id: &str, line: u32, navigator: &mut N)
    where
        N: Navigator + ?Sized,
    {
        self.highlight = std::mem::take(&mut self.highlight).extend(id, line);
        navigator.set_fragment(&self.highlight.to_fragment());
    }
}
