//! Foundation types shared by every stage of the loadplan compiler.
//!
//! - [`component`]: flat records produced by the template tokenizer
//! - [`plan`]: the resolved, hierarchical [`GenerationContext`]
//! - [`warning`]: non-fatal diagnostics

pub mod component;
pub mod plan;
pub mod warning;

pub use component::{Component, ComponentKind};
pub use plan::{
    AssertionSpec, BodySource, DataSetSpec, GenerationContext, HeaderPair, HttpDefaults,
    HttpRequestSpec, ListenerKind, ListenerSpec, MatchMode, RandomVarSpec, SampleErrorAction,
    ShareMode, TestField, ThreadGroupContext, normalize,
};
pub use warning::Warning;

/// Relative directory data files are expected in when the plan runs.
pub const TEST_DATA_DIR: &str = "test-data";

/// The path a data file is referenced by inside a generated plan.
///
/// Any directory part supplied by the template is discarded.
pub fn test_data_path(filename: &str) -> String {
    format!("{}/{}", TEST_DATA_DIR, basename(filename))
}

/// The final path segment of `filename`, accepting both separators.
pub fn basename(filename: &str) -> &str {
    filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(filename)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_test_data_path_drops_directories() {
        assert_eq!(test_data_path("users.csv"), "test-data/users.csv");
        assert_eq!(test_data_path("/tmp/upload/users.csv"), "test-data/users.csv");
        assert_eq!(test_data_path("C:\\data\\users.csv"), "test-data/users.csv");
    }
}
