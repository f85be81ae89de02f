//! Tag scanner: the only place that reads directive tokens out of cell source.
//!
//! A directive line is the first source line of a cell when it is a comment
//! (`# ` prefix), e.g. `# dstrace_exclude_input dstrace_exclude_output`.

use std::collections::BTreeSet;

pub const INCLUDE_INPUT_TOKEN: &str = "dstrace_include_input";
pub const EXCLUDE_INPUT_TOKEN: &str = "dstrace_exclude_input";
pub const EXCLUDE_OUTPUT_TOKEN: &str = "dstrace_exclude_output";

/// Metadata tag (not source text) that forces a cell's input to be shown.
pub const FORCE_INCLUDE_INPUT_TAG: &str = "dstrace_confluence_force_include_input";

/// Tag the exporter reads to suppress rendering of a cell's source.
pub const NO_INPUT_TAG: &str = "noinput";

pub const COMMENT_MARKER: char = '#';

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Directive {
    IncludeInput,
    ExcludeInput,
    ExcludeOutput,
}

impl Directive {
    pub const ALL: [Directive; 3] = [
        Directive::IncludeInput,
        Directive::ExcludeInput,
        Directive::ExcludeOutput,
    ];

    pub fn token(self) -> &'static str {
        match self {
            Directive::IncludeInput => INCLUDE_INPUT_TOKEN,
            Directive::ExcludeInput => EXCLUDE_INPUT_TOKEN,
            Directive::ExcludeOutput => EXCLUDE_OUTPUT_TOKEN,
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.token() == token)
    }
}

/// Directives found on one cell's directive line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectiveSet(BTreeSet<Directive>);

impl DirectiveSet {
    pub fn contains(&self, directive: Directive) -> bool {
        self.0.contains(&directive)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Directive> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<Directive> for DirectiveSet {
    fn from_iter<I: IntoIterator<Item = Directive>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Scan a cell's source for directives. Only line 0 is inspected.
pub fn scan(source: &[String]) -> DirectiveSet {
    let Some(first) = source.first() else {
        return DirectiveSet::default();
    };
    let line = first.trim_end_matches('\n').trim_end_matches('\r');

    let mut chars = line.chars();
    if chars.next() != Some(COMMENT_MARKER) || chars.next() != Some(' ') {
        return DirectiveSet::default();
    }

    line.split(' ').filter_map(Directive::from_token).collect()
}
