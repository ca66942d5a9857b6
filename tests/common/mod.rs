#![allow(dead_code)]

pub mod fixtures;
pub mod jmx_assertions;

use loadplan::{AuxiliaryFile, Compilation, CompileError, Compiler, CompilerBuilder};

pub type TestResult = Result<(), Box<dyn std::error::Error>>;

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Compiles with the default configuration.
pub fn compile_plan(template: &str, files: &[AuxiliaryFile]) -> Result<Compilation, CompileError> {
    init_logger();
    loadplan::compile(template, files)
}

/// A compiler that never pairs files by name.
pub fn unpaired_compiler() -> Compiler {
    CompilerBuilder::new().with_file_pairing(false).build()
}
