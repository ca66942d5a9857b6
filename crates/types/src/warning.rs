//! Non-fatal diagnostics accumulated during compilation.
use crate::component::ComponentKind;
use serde::Serialize;
use thiserror::Error;

/// A problem that was worked around; compilation continued.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Warning {
    #[error("{kind} '{component}' (line {line}) dropped: parent '{parent}' not found")]
    UnresolvedParent {
        kind: ComponentKind,
        component: String,
        parent: String,
        line: usize,
    },

    #[error(
        "{kind} '{component}' (line {line}) dropped: '{parent}' is a {parent_kind}, which cannot contain a {kind}"
    )]
    IncompatibleParent {
        kind: ComponentKind,
        component: String,
        parent: String,
        parent_kind: ComponentKind,
        line: usize,
    },

    #[error("{kind} '{component}' (line {line}): parent name '{parent}' is ambiguous, using the one on line {chosen_line}")]
    AmbiguousParent {
        kind: ComponentKind,
        component: String,
        parent: String,
        chosen_line: usize,
        line: usize,
    },

    #[error("assertion '{assertion}' dropped: thread group '{thread_group}' has no HTTP requests")]
    DroppedAssertion {
        assertion: String,
        thread_group: String,
    },

    #[error("file '{filename}' referenced by '{referenced_by}' was not uploaded")]
    MissingAuxiliaryFile {
        filename: String,
        referenced_by: String,
    },

    #[error("file '{filename}' could not be processed: {reason}")]
    FileProcessing { filename: String, reason: String },

    #[error("{kind} '{component}' (line {line}): key '{key}' given more than once, last value kept")]
    DuplicateKey {
        kind: ComponentKind,
        component: String,
        key: String,
        line: usize,
    },

    #[error(
        "HTTP defaults '{component}' (line {line}) ignored: only one defaults block is allowed{}",
        discarded_note(.discarded_domain)
    )]
    DuplicateDefaults {
        component: String,
        line: usize,
        /// The server address the ignored block would have supplied.
        discarded_domain: Option<String>,
    },
}

fn discarded_note(domain: &Option<String>) -> String {
    match domain {
        Some(domain) => format!(" (its domain '{}' was discarded)", domain),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_defaults_names_discarded_domain() {
        let warning = Warning::DuplicateDefaults {
            component: "B".into(),
            line: 4,
            discarded_domain: Some("h.example".into()),
        };
        assert!(warning.to_string().ends_with("(its domain 'h.example' was discarded)"));

        let quiet = Warning::DuplicateDefaults {
            component: "B".into(),
            line: 4,
            discarded_domain: None,
        };
        assert!(quiet.to_string().ends_with("only one defaults block is allowed"));
    }
}
