//! The recursive step tree of a build.
//!
//! Children are held behind [`Arc`] so that an update copies only the nodes
//! on the path to the changed step. Every untouched subtree stays shared
//! with earlier clones of the tree.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::models::Step;

/// A step together with the hook that runs after it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HookedStep {
    pub step: Arc<StepTree>,
    pub hook: Arc<StepTree>,
}

/// Which half of a [`HookedStep`] to address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookSlot {
    Step,
    Hook,
}

impl HookedStep {
    pub fn new(step: StepTree, hook: StepTree) -> Self {
        Self {
            step: Arc::new(step),
            hook: Arc::new(hook),
        }
    }

    pub fn slot(&self, slot: HookSlot) -> &Arc<StepTree> {
        match slot {
            HookSlot::Step => &self.step,
            HookSlot::Hook => &self.hook,
        }
    }

    pub fn slot_mut(&mut self, slot: HookSlot) -> &mut Arc<StepTree> {
        match slot {
            HookSlot::Step => &mut self.step,
            HookSlot::Hook => &mut self.hook,
        }
    }
}

/// How a retry node chooses the attempt it displays.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TabFocus {
    /// Follow whichever attempt was updated last
    #[default]
    Auto,

    /// Stay on the tab the user picked
    User,
}

/// A group of attempts at the same step.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RetryStep {
    pub id: String,
    pub attempts: Vec<Arc<StepTree>>,
    /// Displayed attempt, 1-based
    pub tab: usize,
    pub focus: TabFocus,
}

/// One entry of a retry node's tab strip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tab {
    /// 1-based attempt number
    pub number: usize,
    pub selected: bool,
    /// Whether anything in the attempt has started
    pub active: bool,
}

impl RetryStep {
    pub fn new(id: impl Into<String>, attempts: Vec<StepTree>) -> Self {
        Self {
            id: id.into(),
            attempts: attempts.into_iter().map(Arc::new).collect(),
            tab: 1,
            focus: TabFocus::Auto,
        }
    }

    /// The attempt currently on display.
    pub fn selected(&self) -> Option<&StepTree> {
        self.tab
            .checked_sub(1)
            .and_then(|i| self.attempts.get(i))
            .map(Arc::as_ref)
    }

    /// Tab strip entries, one per attempt.
    pub fn tabs(&self) -> impl Iterator<Item = Tab> + '_ {
        self.attempts.iter().enumerate().map(move |(i, attempt)| Tab {
            number: i + 1,
            selected: i + 1 == self.tab,
            active: attempt.is_active(),
        })
    }
}

/// A node of the build's step tree.
///
/// `Aggregate` runs its children in parallel and `Do` runs them in sequence;
/// both are ordered lists of children. The hook variants run `hook` after
/// `step` under their respective condition. `Try` and `Timeout` wrap a single
/// child.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum StepTree {
    Task(Step),
    Get(Step),
    Put(Step),
    DependentGet(Step),
    Aggregate(Vec<Arc<StepTree>>),
    Do(Vec<Arc<StepTree>>),
    OnSuccess(HookedStep),
    OnFailure(HookedStep),
    OnAbort(HookedStep),
    Ensure(HookedStep),
    Try(Arc<StepTree>),
    Timeout(Arc<StepTree>),
    Retry(RetryStep),
}

impl StepTree {
    /// Short lowercase name of the node kind.
    pub fn kind(&self) -> &'static str {
        match self {
            StepTree::Task(_) => "task",
            StepTree::Get(_) => "get",
            StepTree::Put(_) => "put",
            StepTree::DependentGet(_) => "dependent get",
            StepTree::Aggregate(_) => "aggregate",
            StepTree::Do(_) => "do",
            StepTree::OnSuccess(_) => "on_success",
            StepTree::OnFailure(_) => "on_failure",
            StepTree::OnAbort(_) => "on_abort",
            StepTree::Ensure(_) => "ensure",
            StepTree::Try(_) => "try",
            StepTree::Timeout(_) => "timeout",
            StepTree::Retry(_) => "retry",
        }
    }

    /// The leaf step, if this node is one.
    pub fn as_step(&self) -> Option<&Step> {
        match self {
            StepTree::Task(step)
            | StepTree::Get(step)
            | StepTree::Put(step)
            | StepTree::DependentGet(step) => Some(step),
            _ => None,
        }
    }

    pub fn as_step_mut(&mut self) -> Option<&mut Step> {
        match self {
            StepTree::Task(step)
            | StepTree::Get(step)
            | StepTree::Put(step)
            | StepTree::DependentGet(step) => Some(step),
            _ => None,
        }
    }

    pub fn as_retry(&self) -> Option<&RetryStep> {
        match self {
            StepTree::Retry(retry) => Some(retry),
            _ => None,
        }
    }

    pub fn hooked(&self) -> Option<&HookedStep> {
        match self {
            StepTree::OnSuccess(hooked)
            | StepTree::OnFailure(hooked)
            | StepTree::OnAbort(hooked)
            | StepTree::Ensure(hooked) => Some(hooked),
            _ => None,
        }
    }

    pub fn hooked_mut(&mut self) -> Option<&mut HookedStep> {
        match self {
            StepTree::OnSuccess(hooked)
            | StepTree::OnFailure(hooked)
            | StepTree::OnAbort(hooked)
            | StepTree::Ensure(hooked) => Some(hooked),
            _ => None,
        }
    }

    /// The single child of a `Try` or `Timeout`.
    pub fn wrapped(&self) -> Option<&Arc<StepTree>> {
        match self {
            StepTree::Try(child) | StepTree::Timeout(child) => Some(child),
            _ => None,
        }
    }

    pub fn wrapped_mut(&mut self) -> Option<&mut Arc<StepTree>> {
        match self {
            StepTree::Try(child) | StepTree::Timeout(child) => Some(child),
            _ => None,
        }
    }

    /// Ordered children of an `Aggregate`, `Do` or `Retry`.
    pub fn branches(&self) -> Option<&[Arc<StepTree>]> {
        match self {
            StepTree::Aggregate(steps) | StepTree::Do(steps) => Some(steps),
            StepTree::Retry(retry) => Some(&retry.attempts),
            _ => None,
        }
    }

    pub fn branches_mut(&mut self) -> Option<&mut Vec<Arc<StepTree>>> {
        match self {
            StepTree::Aggregate(steps) | StepTree::Do(steps) => Some(steps),
            StepTree::Retry(retry) => Some(&mut retry.attempts),
            _ => None,
        }
    }

    /// Direct children in display order.
    pub fn children(&self) -> Vec<&Arc<StepTree>> {
        match self {
            StepTree::Task(_)
            | StepTree::Get(_)
            | StepTree::Put(_)
            | StepTree::DependentGet(_) => Vec::new(),
            StepTree::Aggregate(steps) | StepTree::Do(steps) => steps.iter().collect(),
            StepTree::Retry(retry) => retry.attempts.iter().collect(),
            StepTree::OnSuccess(hooked)
            | StepTree::OnFailure(hooked)
            | StepTree::OnAbort(hooked)
            | StepTree::Ensure(hooked) => vec![&hooked.step, &hooked.hook],
            StepTree::Try(child) | StepTree::Timeout(child) => vec![child],
        }
    }

    /// Leaf steps in depth-first order.
    pub fn steps(&self) -> Steps<'_> {
        Steps { stack: vec![self] }
    }

    /// True when any leaf below (or at) this node has left `Pending`.
    pub fn is_active(&self) -> bool {
        self.steps().any(|step| step.status.is_active())
    }
}

/// Depth-first iterator over the leaf steps of a tree.
pub struct Steps<'a> {
    stack: Vec<&'a StepTree>,
}

impl<'a> Iterator for Steps<'a> {
    type Item = &'a Step;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(node) = self.stack.pop() {
            if let Some(step) = node.as_step() {
                return Some(step);
            }
            self.stack
                .extend(node.children().into_iter().rev().map(Arc::as_ref));
        }
        None
    }
}
