//! Builder turning a declarative plan into a [`Model`].

use std::{
    collections::{hash_map::Entry, HashMap},
    sync::Arc,
};

use log::debug;

use crate::{
    error::{Result, ViewError},
    focus::Focus,
    highlight::Highlight,
    model::Model,
    models::{Expansion, Step},
    plan::{first_occurrence, HookedPlan, PlanNode, ResourceInput},
    tree::{HookSlot, HookedStep, RetryStep, StepTree},
};

/// Identifier to focus, relative to the subtree being built.
pub(crate) type Index = HashMap<String, Focus>;

/// Builder for creating and configuring [`Model`] instances.
#[derive(Debug, Clone, Default)]
pub struct ModelBuilder {
    highlight: Highlight,
    resources: Vec<ResourceInput>,
}

impl ModelBuilder {
    /// Creates a new builder with no highlight and no resource inputs.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the initial highlight, typically parsed from the location
    /// fragment. The highlighted step starts expanded.
    pub fn with_highlight(mut self, highlight: Highlight) -> Self {
        self.highlight = highlight;
        self
    }

    /// Sets the build's resource inputs, consulted for the first-occurrence
    /// flag of `get` steps.
    pub fn with_resources(mut self, resources: Vec<ResourceInput>) -> Self {
        self.resources = resources;
        self
    }

    /// Builds the model for `plan`.
    ///
    /// # Errors
    ///
    /// Returns `ViewError::DuplicateStepId` if two steps (or a step and a
    /// retry) share an identifier, and `ViewError::InvalidInput` if an
    /// identifier is empty or contains `:`.
    pub fn build(self, plan: &PlanNode) -> Result<Model> {
        let (tree, index) = self.node(plan)?;
        debug!("built step tree with {} addressable nodes", index.len());
        Ok(Model::from_parts(Arc::new(tree), index, self.highlight))
    }

    fn node(&self, plan: &PlanNode) -> Result<(StepTree, Index)> {
        Ok(match plan {
            PlanNode::Task(leaf) => self.leaf(StepTree::Task, Step::new(&leaf.id, &leaf.name))?,
            PlanNode::Get(get) => {
                let mut step = Step::new(&get.id, &get.name);
                step.version = get.version.clone();
                step.first_occurrence = first_occurrence(&self.resources, &get.name);
                self.leaf(StepTree::Get, step)?
            }
            PlanNode::Put(leaf) => self.leaf(StepTree::Put, Step::new(&leaf.id, &leaf.name))?,
            PlanNode::DependentGet(leaf) => {
                self.leaf(StepTree::DependentGet, Step::new(&leaf.id, &leaf.name))?
            }
            PlanNode::Aggregate(plans) => {
                let (steps, index) = self.branches(plans)?;
                (StepTree::Aggregate(steps), index)
            }
            PlanNode::Do(plans) => {
                let (steps, index) = self.branches(plans)?;
                (StepTree::Do(steps), index)
            }
            PlanNode::OnSuccess(hooked) => self.hooked(StepTree::OnSuccess, hooked)?,
            PlanNode::OnFailure(hooked) => self.hooked(StepTree::OnFailure, hooked)?,
            PlanNode::OnAbort(hooked) => self.hooked(StepTree::OnAbort, hooked)?,
            PlanNode::Ensure(hooked) => self.hooked(StepTree::Ensure, hooked)?,
            PlanNode::Try(inner) => self.wrapped(StepTree::Try, inner)?,
            PlanNode::Timeout(inner) => self.wrapped(StepTree::Timeout, inner)?,
            PlanNode::Retry(retry) => {
                let (attempts, mut index) = self.branches(&retry.attempts)?;
                insert(&mut index, retry.id.clone(), Focus::identity())?;
                let node = StepTree::Retry(RetryStep {
                    attempts,
                    ..RetryStep::new(&retry.id, Vec::new())
                });
                (node, index)
            }
        })
    }

    fn leaf(&self, wrap: fn(Step) -> StepTree, mut step: Step) -> Result<(StepTree, Index)> {
        if self.highlight.step_id() == Some(step.id.as_str()) {
            step.expanded = Expansion::Expanded;
        }
        let mut index = Index::new();
        insert(&mut index, step.id.clone(), Focus::identity())?;
        Ok((wrap(step), index))
    }

    fn branches(&self, plans: &[PlanNode]) -> Result<(Vec<Arc<StepTree>>, Index)> {
        let mut steps = Vec::with_capacity(plans.len());
        let mut index = Index::new();
        for (i, plan) in plans.iter().enumerate() {
            let (tree, sub) = self.node(plan)?;
            absorb(&mut index, &Focus::branch(i), sub)?;
            steps.push(Arc::new(tree));
        }
        Ok((steps, index))
    }

    fn hooked(
        &self,
        wrap: fn(HookedStep) -> StepTree,
        plan: &HookedPlan,
    ) -> Result<(StepTree, Index)> {
        let (step, step_index) = self.node(&plan.step)?;
        let (hook, hook_index) = self.node(&plan.hook)?;

        let mut index = Index::new();
        absorb(&mut index, &Focus::hook_slot(HookSlot::Step), step_index)?;
        absorb(&mut index, &Focus::hook_slot(HookSlot::Hook), hook_index)?;
        Ok((wrap(HookedStep::new(step, hook)), index))
    }

    fn wrapped(
        &self,
        wrap: fn(Arc<StepTree>) -> StepTree,
        plan: &PlanNode,
    ) -> Result<(StepTree, Index)> {
        let (inner, inner_index) = self.node(plan)?;
        let mut index = Index::new();
        absorb(&mut index, &Focus::wrapped(), inner_index)?;
        Ok((wrap(Arc::new(inner)), index))
    }
}

/// Moves every entry of `sub` into `index`, behind `prefix`.
fn absorb(index: &mut Index, prefix: &Focus, sub: Index) -> Result<()> {
    for (id, focus) in sub {
        insert(index, id, prefix.clone().then(focus))?;
    }
    Ok(())
}

/// Identifiers end up in `#L<id>:<line>` fragments, so they must be
/// non-empty and free of `:`.
fn insert(index: &mut Index, id: String, focus: Focus) -> Result<()> {
    if id.is_empty() {
        return Err(ViewError::invalid_input("id").with_reason("step identifier is empty"));
    }
    if id.contains(':') {
        return Err(ViewError::invalid_input("id")
            .with_reason(format!("step identifier '{id}' contains ':'")));
    }

    match index.entry(id) {
        Entry::Occupied(entry) => Err(ViewError::DuplicateStepId {
            id: entry.key().clone(),
        }),
        Entry::Vacant(entry) => {
            entry.insert(focus);
            Ok(())
        }
    }
}
