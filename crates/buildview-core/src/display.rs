//! Plain-text outline of a step tree.
//!
//! [`Outline`] wraps a tree and formats it as an indented list, one line per
//! node, for logs and terminal diagnostics:
//!
//! ```text
//! do
//!   get repo [succeeded] (first occurrence)
//!   retry 2 (tab 2 of 2, auto)
//!     attempt 1 [inactive]
//!       task unit [failed]
//! ```

use std::fmt;

use crate::{
    models::Step,
    tree::{StepTree, TabFocus},
};

/// Display wrapper rendering a [`StepTree`] as an indented outline.
pub struct Outline<'a>(pub &'a StepTree);

impl fmt::Display for Outline<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_node(f, self.0, 0)
    }
}

fn write_step(f: &mut fmt::Formatter<'_>, kind: &str, step: &Step, depth: usize) -> fmt::Result {
    write!(f, "{:indent$}{kind} {} [{}]", "", step.name, step.status, indent = depth * 2)?;
    if step.first_occurrence {
        write!(f, " (first occurrence)")?;
    }
    if let Some(error) = &step.error {
        write!(f, " error: {error}")?;
    }
    writeln!(f)
}

fn write_node(f: &mut fmt::Formatter<'_>, node: &StepTree, depth: usize) -> fmt::Result {
    if let Some(step) = node.as_step() {
        return write_step(f, node.kind(), step, depth);
    }

    let pad = depth * 2;
    match node {
        StepTree::Retry(retry) => {
            let focus = match retry.focus {
                TabFocus::Auto => "auto",
                TabFocus::User => "user",
            };
            writeln!(
                f,
                "{:pad$}retry {} (tab {} of {}, {focus})",
                "",
                retry.id,
                retry.tab,
                retry.attempts.len()
            )?;
            for (tab, attempt) in retry.tabs().zip(&retry.attempts) {
                let state = if tab.active { "" } else { " [inactive]" };
                writeln!(f, "{:indent$}attempt {}{state}", "", tab.number, indent = pad + 2)?;
                write_node(f, attempt, depth + 2)?;
            }
            Ok(())
        }
        _ => {
            writeln!(f, "{:pad$}{}", "", node.kind())?;
            for child in node.children() {
                write_node(f, child, depth + 1)?;
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        models::StepStatus,
        tree::{HookedStep, RetryStep},
    };

    #[test]
    fn test_outline_indents_children() {
        let mut get = Step::new("1", "repo");
        get.status = StepStatus::Succeeded;
        get.first_occurrence = true;
        let mut unit = Step::new("3", "unit");
        unit.status = StepStatus::Failed;

        let tree = StepTree::Do(vec![
            Arc::new(StepTree::Get(get)),
            Arc::new(StepTree::Retry(RetryStep::new(
                "2",
                vec![StepTree::Task(unit), StepTree::Task(Step::new("4", "unit"))],
            ))),
            Arc::new(StepTree::Ensure(HookedStep::new(
                StepTree::Put(Step::new("5", "image")),
                StepTree::Task(Step::new("6", "cleanup")),
            ))),
        ]);

        let expected = "\
do
  get repo [succeeded] (first occurrence)
  retry 2 (tab 1 of 2, auto)
    attempt 1
      task unit [failed]
    attempt 2 [inactive]
      task unit [pending]
  ensure
    put image [pending]
    task cleanup [pending]
";
        assert_eq!(Outline(&tree).to_string(), expected);
    }
}
