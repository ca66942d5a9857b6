use loadplan_types::ComponentKind;
use thiserror::Error;

/// A template that cannot be compiled. Every variant that points at a
/// specific place carries the 1-based line number.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateParseError {
    #[error("line {line}: content before the first [Type: Name] block header")]
    ContentBeforeHeader { line: usize },

    #[error("line {line}: malformed block header '{text}', expected [Type: Name]")]
    MalformedHeader { line: usize, text: String },

    #[error("line {line}: unknown block type '{block_type}'")]
    UnknownBlockType { line: usize, block_type: String },

    #[error("line {line}: block name must not be empty")]
    EmptyBlockName { line: usize },

    #[error("line {line}: expected 'key = value', found '{text}'")]
    MalformedEntry { line: usize, text: String },

    #[error("line {line}: entry has an empty key")]
    EmptyKey { line: usize },

    #[error("line {line}: multi-line value opened with \"\"\" is never closed")]
    UnterminatedValue { line: usize },

    #[error("template has no TestPlan block")]
    MissingTestPlan,

    #[error("line {line}: second TestPlan block, the first one is on line {first_line}")]
    MultipleTestPlans { line: usize, first_line: usize },

    #[error("line {line}: {kind} '{component}' requires '{key}'")]
    MissingKey {
        line: usize,
        kind: ComponentKind,
        component: String,
        key: String,
    },

    #[error("line {line}: invalid value '{value}' for '{key}', expected {expected}")]
    InvalidValue {
        line: usize,
        key: String,
        value: String,
        expected: String,
    },

    #[error("line {line}: HttpRequest '{component}' sets both 'body' and 'bodyFile'")]
    ConflictingBody { line: usize, component: String },
}

impl TemplateParseError {
    /// The line the error points at, if it points at one.
    pub fn line(&self) -> Option<usize> {
        match self {
            Self::MissingTestPlan => None,
            Self::ContentBeforeHeader { line }
            | Self::MalformedHeader { line, .. }
            | Self::UnknownBlockType { line, .. }
            | Self::EmptyBlockName { line }
            | Self::MalformedEntry { line, .. }
            | Self::EmptyKey { line }
            | Self::UnterminatedValue { line }
            | Self::MultipleTestPlans { line, .. }
            | Self::MissingKey { line, .. }
            | Self::InvalidValue { line, .. }
            | Self::ConflictingBody { line, .. } => Some(*line),
        }
    }
}
