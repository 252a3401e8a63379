//! Composable accessors into a [`StepTree`].
//!
//! A [`Focus`] addresses one node inside a tree and offers two operations:
//! [`Focus::get`] reads the addressed node and [`Focus::update`] replaces it
//! with a transformed copy. An update copies only the nodes between the root
//! and the target; all other subtrees stay shared (`Arc::ptr_eq`) with the
//! tree as it was before.
//!
//! Focuses are built from four primitives and composed with
//! [`Focus::then`]:
//!
//! | Primitive              | Addresses                                  |
//! |------------------------|--------------------------------------------|
//! | [`Focus::identity`]    | the node itself                            |
//! | [`Focus::hook_slot`]   | `step` or `hook` of a hooked node          |
//! | [`Focus::wrapped`]     | the only child of a `Try`/`Timeout`        |
//! | [`Focus::branch`]      | child `i` of an `Aggregate`/`Do`/`Retry`   |
//!
//! `outer.then(inner)` first moves through `outer`, then through `inner`,
//! so `get` chains both reads and `update` runs the inner update inside the
//! outer one.
//!
//! # Examples
//!
//! ```rust
//! use std::sync::Arc;
//! use buildview_core::{Focus, Step, StepTree};
//!
//! let mut tree = Arc::new(StepTree::Do(vec![
//!     Arc::new(StepTree::Task(Step::new("a", "lint"))),
//!     Arc::new(StepTree::Try(Arc::new(StepTree::Task(Step::new("b", "unit"))))),
//! ]));
//!
//! let focus = Focus::branch(1).then(Focus::wrapped());
//! assert_eq!(focus.get(&tree)?.as_step().map(|s| s.name.as_str()), Some("unit"));
//!
//! focus.update(&mut tree, |node| {
//!     if let Some(step) = node.as_step_mut() {
//!         step.name = "integration".to_string();
//!     }
//! })?;
//! assert_eq!(focus.get(&tree)?.as_step().map(|s| s.name.as_str()), Some("integration"));
//! # buildview_core::Result::<()>::Ok(())
//! ```

use std::{fmt, sync::Arc};

use log::trace;

use crate::{
    error::{Result, ViewError},
    tree::{HookSlot, StepTree, TabFocus},
};

/// One move from a node to one of its children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Lens {
    Hook(HookSlot),
    Wrapped,
    Branch(usize),
}

impl fmt::Display for Lens {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lens::Hook(HookSlot::Step) => write!(f, "hooked step"),
            Lens::Hook(HookSlot::Hook) => write!(f, "hook"),
            Lens::Wrapped => write!(f, "wrapped step"),
            Lens::Branch(i) => write!(f, "branch {i}"),
        }
    }
}

impl Lens {
    fn mismatch(self, node: &StepTree) -> ViewError {
        ViewError::FocusMismatch {
            lens: self.to_string(),
            node: node.kind(),
        }
    }

    fn child(self, node: &StepTree) -> Result<&Arc<StepTree>> {
        if let (Lens::Branch(index), StepTree::Retry(retry)) = (self, node) {
            return retry
                .attempts
                .get(index)
                .ok_or_else(|| ViewError::NoSuchAttempt {
                    id: retry.id.clone(),
                    tab: index + 1,
                    attempts: retry.attempts.len(),
                });
        }

        let child = match self {
            Lens::Hook(slot) => node.hooked().map(|hooked| hooked.slot(slot)),
            Lens::Wrapped => node.wrapped(),
            Lens::Branch(i) => node.branches().and_then(|branches| branches.get(i)),
        };
        child.ok_or_else(|| self.mismatch(node))
    }

    fn child_mut(self, node: &mut StepTree) -> Option<&mut Arc<StepTree>> {
        match self {
            Lens::Hook(slot) => node.hooked_mut().map(|hooked| hooked.slot_mut(slot)),
            Lens::Wrapped => node.wrapped_mut(),
            Lens::Branch(i) => node.branches_mut().and_then(|branches| branches.get_mut(i)),
        }
    }
}

/// A composed accessor addressing one node of a [`StepTree`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Focus {
    path: Vec<Lens>,
}

impl Focus {
    /// Addresses the whole tree.
    pub fn identity() -> Self {
        Self::default()
    }

    /// Addresses the `step` or `hook` half of a hooked node.
    pub fn hook_slot(slot: HookSlot) -> Self {
        Self {
            path: vec![Lens::Hook(slot)],
        }
    }

    /// Addresses the child of a `Try` or `Timeout`.
    pub fn wrapped() -> Self {
        Self {
            path: vec![Lens::Wrapped],
        }
    }

    /// Addresses child `index` (0-based) of an `Aggregate`, `Do` or `Retry`.
    ///
    /// Updating through a retry branch also moves the retry's displayed tab
    /// to that attempt while the retry is in [`TabFocus::Auto`].
    pub fn branch(index: usize) -> Self {
        Self {
            path: vec![Lens::Branch(index)],
        }
    }

    /// Composes `self` (outer) with `inner`.
    pub fn then(mut self, inner: Focus) -> Self {
        self.path.extend(inner.path);
        self
    }

    /// Number of moves from the root to the addressed node.
    pub fn depth(&self) -> usize {
        self.path.len()
    }

    /// Reads the addressed node.
    ///
    /// # Errors
    ///
    /// Returns `ViewError::FocusMismatch` if the tree does not have the
    /// shape this focus was built for, or `ViewError::NoSuchAttempt` for a
    /// retry branch past the last attempt.
    pub fn get<'a>(&self, root: &'a StepTree) -> Result<&'a StepTree> {
        self.path
            .iter()
            .try_fold(root, |node, lens| lens.child(node).map(Arc::as_ref))
    }

    /// Replaces the addressed node with `f` applied to it.
    ///
    /// Nodes on the path are copied only when shared with another tree, so
    /// clones of `root` taken before the call keep their old contents.
    ///
    /// # Errors
    ///
    /// Same as [`Focus::get`]. The tree is left unchanged in that case.
    pub fn update<F>(&self, root: &mut Arc<StepTree>, f: F) -> Result<()>
    where
        F: FnOnce(&mut StepTree),
    {
        self.get(root)?;
        update_node(root, &self.path, f)
    }
}

fn update_node<F>(node: &mut Arc<StepTree>, path: &[Lens], f: F) -> Result<()>
where
    F: FnOnce(&mut StepTree),
{
    let Some((&lens, rest)) = path.split_first() else {
        f(Arc::make_mut(node));
        return Ok(());
    };

    match (lens, Arc::make_mut(node)) {
        (Lens::Branch(index), StepTree::Retry(retry)) => {
            let attempts = retry.attempts.len();
            let attempt = retry
                .attempts
                .get_mut(index)
                .ok_or_else(|| ViewError::NoSuchAttempt {
                    id: retry.id.clone(),
                    tab: index + 1,
                    attempts,
                })?;
            update_node(attempt, rest, f)?;
            if retry.focus == TabFocus::Auto {
                trace!("retry {} follows update to attempt {}", retry.id, index + 1);
                retry.tab = index + 1;
            }
            Ok(())
        }
        (lens, tree) => {
            let kind = tree.kind();
            let child = lens
                .child_mut(tree)
                .ok_or_else(|| ViewError::FocusMismatch {
                    lens: lens.to_string(),
                    node: kind,
                })?;
            update_node(child, rest, f)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::{Step, StepStatus},
        tree::{HookedStep, RetryStep},
    };

    fn task(id: &str) -> StepTree {
        StepTree::Task(Step::new(id, id))
    }

    fn sample() -> Arc<StepTree> {
        Arc::new(StepTree::Aggregate(vec![
            Arc::new(StepTree::OnSuccess(HookedStep::new(task("a"), task("b")))),
            Arc::new(StepTree::Timeout(Arc::new(task("c")))),
            Arc::new(task("d")),
        ]))
    }

    fn id_at(focus: &Focus, tree: &StepTree) -> String {
        focus.get(tree).unwrap().as_step().unwrap().id.clone()
    }

    fn run(tree: &mut StepTree) {
        if let Some(step) = tree.as_step_mut() {
            step.status = StepStatus::Running;
        }
    }

    #[test]
    fn test_identity_addresses_root() {
        let tree = task("a");
        assert_eq!(id_at(&Focus::identity(), &tree), "a");
        assert_eq!(Focus::identity().depth(), 0);
    }

    #[test]
    fn test_composed_focus_reaches_nested_nodes() {
        let tree = sample();
        let hook = Focus::branch(0).then(Focus::hook_slot(HookSlot::Hook));
        let wrapped = Focus::branch(1).then(Focus::wrapped());

        assert_eq!(id_at(&hook, &tree), "b");
        assert_eq!(id_at(&wrapped, &tree), "c");
        assert_eq!(id_at(&Focus::branch(2), &tree), "d");
    }

    #[test]
    fn test_composition_is_associative_with_identity() {
        let a = Focus::branch(0);
        let b = Focus::hook_slot(HookSlot::Step);
        let c = Focus::identity();

        assert_eq!(
            a.clone().then(b.clone()).then(c.clone()),
            a.clone().then(b.clone().then(c.clone()))
        );
        assert_eq!(Focus::identity().then(a.clone()), a);
        assert_eq!(a.clone().then(Focus::identity()), a);
    }

    #[test]
    fn test_update_shares_untouched_subtrees() {
        let before = sample();
        let mut after = Arc::clone(&before);
        let focus = Focus::branch(1).then(Focus::wrapped());

        focus.update(&mut after, run).unwrap();

        let old = before.branches().unwrap();
        let new = after.branches().unwrap();
        assert!(!Arc::ptr_eq(&before, &after));
        assert!(Arc::ptr_eq(&old[0], &new[0]));
        assert!(!Arc::ptr_eq(&old[1], &new[1]));
        assert!(Arc::ptr_eq(&old[2], &new[2]));

        let status = |tree: &StepTree| focus.get(tree).unwrap().as_step().unwrap().status;
        assert_eq!(status(before.as_ref()), StepStatus::Pending);
        assert_eq!(status(after.as_ref()), StepStatus::Running);
    }

    #[test]
    fn test_mismatched_focus_is_an_error() {
        let mut tree = sample();
        let focus = Focus::branch(2).then(Focus::wrapped());

        let err = focus.get(&tree).unwrap_err();
        assert!(matches!(err, ViewError::FocusMismatch { node: "task", .. }));
        assert!(err.is_defect());

        let before = Arc::clone(&tree);
        assert!(focus.update(&mut tree, run).is_err());
        assert!(Arc::ptr_eq(&before, &tree));

        assert!(Focus::branch(7).get(&tree).is_err());
    }

    #[test]
    fn test_missing_retry_attempt_is_reported_by_get_and_update() {
        let mut tree = Arc::new(StepTree::Retry(RetryStep::new("r", vec![task("a"), task("b")])));
        let before = Arc::clone(&tree);

        let err = Focus::branch(2).get(&tree).unwrap_err();
        assert!(matches!(
            err,
            ViewError::NoSuchAttempt { ref id, tab: 3, attempts: 2 } if id == "r"
        ));
        assert!(err.is_defect());

        let err = Focus::branch(2).update(&mut tree, run).unwrap_err();
        assert!(matches!(err, ViewError::NoSuchAttempt { tab: 3, .. }));
        assert!(Arc::ptr_eq(&before, &tree));
        assert_eq!(tree.as_retry().unwrap().tab, 1);
    }

    #[test]
    fn test_retry_branch_update_moves_auto_tab() {
        let mut tree = Arc::new(StepTree::Retry(RetryStep::new("r", vec![task("a"), task("b")])));

        Focus::branch(1).update(&mut tree, run).unwrap();
        assert_eq!(tree.as_retry().unwrap().tab, 2);

        Focus::branch(0).update(&mut tree, run).unwrap();
        assert_eq!(tree.as_retry().unwrap().tab, 1);
    }

    #[test]
    fn test_retry_branch_update_keeps_user_tab() {
        let mut retry = RetryStep::new("r", vec![task("a"), task("b")]);
        retry.focus = TabFocus::User;
        let mut tree = Arc::new(StepTree::Retry(retry));

        Focus::branch(1).update(&mut tree, run).unwrap();
        assert_eq!(tree.as_retry().unwrap().tab, 1);
    }
}
