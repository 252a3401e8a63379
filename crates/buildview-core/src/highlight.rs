//! Log line highlighting and its location fragment encoding.
//!
//! A highlight selects one line, or a range of lines, in the log of one
//! step. It round-trips through the location fragment so that links to a
//! build can point at specific log output:
//!
//! ```text
//! #L<step id>:<line>           single line
//! #L<step id>:<start>:<end>    inclusive range
//! ```
//!
//! Line numbers are 1-based. Anything that does not match this grammar
//! parses to [`Highlight::None`].

use std::{cmp, fmt};

use serde::{Deserialize, Serialize};

/// The current log highlight of a build view.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Highlight {
    /// Nothing highlighted
    #[default]
    None,

    /// A single line
    Line { step_id: String, line: u32 },

    /// Lines `start..=end`
    Range {
        step_id: String,
        start: u32,
        end: u32,
    },
}

impl Highlight {
    /// The step whose log is highlighted.
    pub fn step_id(&self) -> Option<&str> {
        match self {
            Highlight::None => None,
            Highlight::Line { step_id, .. } | Highlight::Range { step_id, .. } => Some(step_id),
        }
    }

    /// Whether `line` of `step_id`'s log falls inside the highlight.
    pub fn contains(&self, step_id: &str, line: u32) -> bool {
        match self {
            Highlight::None => false,
            Highlight::Line { step_id: id, line: l } => id == step_id && *l == line,
            Highlight::Range {
                step_id: id,
                start,
                end,
            } => id == step_id && (*start..=*end).contains(&line),
        }
    }

    /// Highlight of a single line.
    pub fn line(step_id: impl Into<String>, line: u32) -> Self {
        Highlight::Line {
            step_id: step_id.into(),
            line,
        }
    }

    /// Extends the highlight to `line` of `step_id`.
    ///
    /// When nothing is highlighted, or another step is, this selects just
    /// `line`. Otherwise the first line of the current highlight is kept as
    /// the anchor and the result spans the anchor and `line`, whichever
    /// order they were clicked in.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use buildview_core::Highlight;
    ///
    /// let hl = Highlight::line("5", 10).extend("5", 3);
    /// assert_eq!(hl, Highlight::Range { step_id: "5".into(), start: 3, end: 10 });
    ///
    /// let hl = hl.extend("6", 4);
    /// assert_eq!(hl, Highlight::line("6", 4));
    /// ```
    pub fn extend(self, step_id: &str, line: u32) -> Self {
        match self {
            Highlight::Line {
                step_id: current,
                line: anchor,
            }
            | Highlight::Range {
                step_id: current,
                start: anchor,
                ..
            } if current == step_id => Highlight::Range {
                step_id: current,
                start: cmp::min(anchor, line),
                end: cmp::max(anchor, line),
            },
            _ => Highlight::line(step_id, line),
        }
    }

    /// Parses a location fragment, leading `#` included.
    ///
    /// Malformed input yields [`Highlight::None`]. Ranges are kept exactly
    /// as written; a reversed range is not reordered here.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use buildview_core::Highlight;
    ///
    /// assert_eq!(Highlight::parse("#L5:10"), Highlight::line("5", 10));
    /// assert_eq!(
    ///     Highlight::parse("#L9:4:2"),
    ///     Highlight::Range { step_id: "9".into(), start: 4, end: 2 }
    /// );
    /// assert_eq!(Highlight::parse("#garbage"), Highlight::None);
    /// ```
    pub fn parse(fragment: &str) -> Self {
        let Some(rest) = fragment.strip_prefix("#L") else {
            return Highlight::None;
        };

        let mut parts = rest.split(':');
        let (Some(step_id), Some(first)) = (parts.next(), parts.next()) else {
            return Highlight::None;
        };
        if step_id.is_empty() {
            return Highlight::None;
        }

        let second = parts.next();
        if parts.next().is_some() {
            return Highlight::None;
        }

        match (parse_line(first), second.map(parse_line)) {
            (Some(line), None) => Highlight::line(step_id, line),
            (Some(start), Some(Some(end))) => Highlight::Range {
                step_id: step_id.to_string(),
                start,
                end,
            },
            _ => Highlight::None,
        }
    }

    /// Serializes the highlight as a location fragment.
    ///
    /// [`Highlight::None`] serializes to the empty string.
    pub fn to_fragment(&self) -> String {
        self.to_string()
    }
}

fn parse_line(text: &str) -> Option<u32> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok().filter(|line| *line > 0)
}

impl fmt::Display for Highlight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Highlight::None => Ok(()),
            Highlight::Line { step_id, line } => write!(f, "#L{step_id}:{line}"),
            Highlight::Range {
                step_id,
                start,
                end,
            } => write!(f, "#L{step_id}:{start}:{end}"),
        }
    }
}

impl From<&str> for Highlight {
    fn from(fragment: &str) -> Self {
        Highlight::parse(fragment)
    }
}

/// Receives location fragment updates requested by the build view.
///
/// Any `FnMut(&str)` closure is a navigator, which keeps tests and simple
/// callers free of boilerplate.
pub trait Navigator {
    /// Replaces the location fragment with `fragment`.
    fn set_fragment(&mut self, fragment: &str);
}

impl<F> Navigator for F
where
    F: FnMut(&str),
{
    fn set_fragment(&mut self, fragment: &str) {
        self(fragment)
    }
}
