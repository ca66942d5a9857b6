//! Flat component records produced by the template tokenizer.
use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;

/// The closed set of block types the template language understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ComponentKind {
    TestPlan,
    ThreadGroup,
    HttpRequest,
    HttpDefaults,
    HeaderManager,
    RandomVariable,
    CsvDataSet,
    Assertion,
    Listener,
}

impl ComponentKind {
    /// Kinds a component of this kind may be nested under.
    ///
    /// The root `TestPlan` has no legal parent.
    pub fn legal_parents(self) -> &'static [ComponentKind] {
        use ComponentKind::*;
        match self {
            TestPlan => &[],
            ThreadGroup | HttpDefaults => &[TestPlan],
            HeaderManager | RandomVariable | Listener => &[TestPlan, ThreadGroup],
            CsvDataSet | HttpRequest => &[ThreadGroup],
            Assertion => &[HttpRequest, ThreadGroup],
        }
    }

    pub fn accepts_parent(self, parent: ComponentKind) -> bool {
        self.legal_parents().contains(&parent)
    }

    pub fn is_root(self) -> bool {
        self == ComponentKind::TestPlan
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ComponentKind::TestPlan => "TestPlan",
            ComponentKind::ThreadGroup => "ThreadGroup",
            ComponentKind::HttpRequest => "HttpRequest",
            ComponentKind::HttpDefaults => "HttpDefaults",
            ComponentKind::HeaderManager => "HeaderManager",
            ComponentKind::RandomVariable => "RandomVariable",
            ComponentKind::CsvDataSet => "CsvDataSet",
            ComponentKind::Assertion => "Assertion",
            ComponentKind::Listener => "Listener",
        };
        f.write_str(name)
    }
}

/// One `[Type: Name]` block with its `key = value` entries.
///
/// Components are created once by the tokenizer and never mutated; the
/// resolution pass only records relationships between them by index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Component {
    pub kind: ComponentKind,
    pub name: String,
    /// Entries in declaration order, excluding `parent`.
    pub params: IndexMap<String, String>,
    pub parent_name: Option<String>,
    /// 1-based line of the block header.
    pub line: usize,
}

impl Component {
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assertion_accepts_request_and_group() {
        assert!(ComponentKind::Assertion.accepts_parent(ComponentKind::HttpRequest));
        assert!(ComponentKind::Assertion.accepts_parent(ComponentKind::ThreadGroup));
        assert!(!ComponentKind::Assertion.accepts_parent(ComponentKind::TestPlan));
    }

    #[test]
    fn test_root_has_no_parents() {
        assert!(ComponentKind::TestPlan.legal_parents().is_empty());
        assert!(ComponentKind::TestPlan.is_root());
    }

    #[test]
    fn test_request_only_under_thread_group() {
        assert_eq!(
            ComponentKind::HttpRequest.legal_parents(),
            &[ComponentKind::ThreadGroup]
        );
    }
}
