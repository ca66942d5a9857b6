use loadplan_datafiles::{DEFAULT_MAX_FILE_SIZE, DEFAULT_SAMPLE_ROWS, ProcessorOptions};

/// Settings shared by every compilation a [`Compiler`](crate::Compiler) runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilerConfig {
    /// Uploaded files larger than this many bytes are skipped with a warning.
    pub max_file_size: usize,
    /// Data rows kept per tabular file for inspection.
    pub sample_rows: usize,
    /// Pair `<thread group>.csv` and `<request>.json` uploads with components
    /// that declare no data set or body of their own.
    pub pair_files_by_name: bool,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            sample_rows: DEFAULT_SAMPLE_ROWS,
            pair_files_by_name: true,
        }
    }
}

impl CompilerConfig {
    pub(crate) fn processor_options(&self) -> ProcessorOptions {
        ProcessorOptions {
            max_file_size: self.max_file_size,
            sample_rows: self.sample_rows,
        }
    }
}
