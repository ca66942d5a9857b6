use crate::config::CompilerConfig;
use crate::context::build_context;
use crate::error::CompileError;
use loadplan_datafiles::{AuxiliaryFile, process_files};
use loadplan_dsl::parse_template;
use loadplan_jmx::{assemble, validate};
use loadplan_types::{GenerationContext, Warning};

/// The result of a successful compilation.
#[derive(Debug, Clone, PartialEq)]
pub struct Compilation {
    /// The `.jmx` document text.
    pub document: String,
    /// File, template and context warnings, in that order.
    pub warnings: Vec<Warning>,
    /// The context the document was assembled from.
    pub context: GenerationContext,
}

/// Compiles templates into JMeter test plans.
///
/// A `Compiler` holds only its configuration, so one instance can serve any
/// number of threads.
#[derive(Debug, Clone, Default)]
pub struct Compiler {
    config: CompilerConfig,
}

impl Compiler {
    pub fn new(config: CompilerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    /// Runs the whole pipeline: file processing, template parsing, context
    /// building, assembly and validation.
    pub fn compile(&self, template: &str, files: &[AuxiliaryFile]) -> Result<Compilation, CompileError> {
        let processed = process_files(files, &self.config.processor_options());
        let parsed = parse_template(template)?;
        let (context, context_warnings) = build_context(parsed.context, &processed, &self.config)?;

        let document = assemble(&context)?;
        validate(&document)?;

        let mut warnings = processed.warnings();
        warnings.extend(parsed.warnings);
        warnings.extend(context_warnings);

        log::info!(
            "compiled '{}': {} bytes, {} warnings",
            context.test_plan_name,
            document.len(),
            warnings.len()
        );
        Ok(Compilation {
            document,
            warnings,
            context,
        })
    }
}

/// Compiles `template` with the default configuration.
pub fn compile(template: &str, files: &[AuxiliaryFile]) -> Result<Compilation, CompileError> {
    Compiler::default().compile(template, files)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn test_compiler_is_shareable() {
        assert_send_sync::<Compiler>();
    }

    #[test]
    fn test_parse_errors_stop_compilation() {
        let err = compile("[ThreadGroup: TG]\n", &[]).unwrap_err();
        assert_eq!(err.phase(), crate::Phase::Parse);
    }
}
