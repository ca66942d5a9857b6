use loadplan_dsl::TemplateParseError;
use loadplan_jmx::{AssemblyError, ValidationError};
use loadplan_param::ParameterizeError;
use std::fmt;
use thiserror::Error;

/// Problems found while joining a parsed template with its data files.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContextError {
    #[error(
        "HTTP request '{request}' in thread group '{thread_group}' has no server address and no HTTP defaults supply one"
    )]
    MissingServerAddress {
        request: String,
        thread_group: String,
    },
}

/// The stage of compilation an error came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Parse,
    ContextBuild,
    Parameterize,
    Assemble,
    Validate,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Phase::Parse => "parse",
            Phase::ContextBuild => "context-build",
            Phase::Parameterize => "parameterize",
            Phase::Assemble => "assemble",
            Phase::Validate => "validate",
        })
    }
}

/// A fatal compilation error. No document is produced.
#[derive(Error, Debug)]
pub enum CompileError {
    #[error("Template parsing failed: {0}")]
    Parse(#[from] TemplateParseError),

    #[error("Context building failed: {0}")]
    Context(#[from] ContextError),

    #[error("Body parameterization failed: {0}")]
    Parameterize(#[from] ParameterizeError),

    #[error("Document assembly failed: {0}")]
    Assemble(#[from] AssemblyError),

    #[error("Generated document is invalid: {0}")]
    Validate(#[from] ValidationError),
}

impl CompileError {
    pub fn phase(&self) -> Phase {
        match self {
            CompileError::Parse(_) => Phase::Parse,
            CompileError::Context(_) => Phase::ContextBuild,
            CompileError::Parameterize(_) => Phase::Parameterize,
            CompileError::Assemble(_) => Phase::Assemble,
            CompileError::Validate(_) => Phase::Validate,
        }
    }
}
