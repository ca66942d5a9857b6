use crate::compiler::Compiler;
use crate::config::CompilerConfig;

/// A builder for creating a [`Compiler`].
#[derive(Debug, Clone, Default)]
pub struct CompilerBuilder {
    config: CompilerConfig,
}

impl CompilerBuilder {
    /// Creates a new `CompilerBuilder` with default settings.
    pub fn new() -> Self {
        Default::default()
    }

    /// Uploads larger than `bytes` are skipped with a warning.
    pub fn with_max_file_size(mut self, bytes: usize) -> Self {
        self.config.max_file_size = bytes;
        self
    }

    pub fn with_sample_rows(mut self, rows: usize) -> Self {
        self.config.sample_rows = rows;
        self
    }

    /// Enables or disables pairing uploads with components by name.
    pub fn with_file_pairing(mut self, enabled: bool) -> Self {
        self.config.pair_files_by_name = enabled;
        self
    }

    pub fn build(self) -> Compiler {
        Compiler::new(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_overrides_defaults() {
        let compiler = CompilerBuilder::new()
            .with_max_file_size(1024)
            .with_sample_rows(2)
            .with_file_pairing(false)
            .build();
        assert_eq!(
            compiler.config(),
            &CompilerConfig {
                max_file_size: 1024,
                sample_rows: 2,
                pair_files_by_name: false,
            }
        );
        assert_eq!(CompilerBuilder::new().build().config(), &CompilerConfig::default());
    }
}
