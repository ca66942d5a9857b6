//! JMeter `.jmx` output for the loadplan compiler.
//!
//! [`assemble`] turns a resolved [`GenerationContext`](loadplan_types::GenerationContext)
//! into document text and [`validate`] checks that text before it is handed out.

pub mod assembler;
pub mod error;
pub mod java_hash;
pub mod validator;
pub mod writer;

pub use assembler::{JMETER_VERSION, assemble, body_text};
pub use error::{AssemblyError, ValidationError};
pub use java_hash::java_string_hash;
pub use validator::validate;

#[cfg(test)]
mod tests {
    use super::*;
    use loadplan_types::{
        GenerationContext, HttpDefaults, ListenerKind, ListenerSpec, RandomVarSpec,
    };

    fn init_logger() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    #[test]
    fn test_assembled_documents_pass_validation() {
        init_logger();
        let context = GenerationContext {
            test_plan_name: "Smoke <1>".into(),
            comments: "quotes \" and & ampersands".into(),
            tear_down_on_shutdown: true,
            functional_mode: false,
            serialize_thread_groups: true,
            user_variables: Vec::new(),
            global_http_defaults: Some(HttpDefaults {
                name: "Defaults".into(),
                domain: "example.com".into(),
                ..HttpDefaults::default()
            }),
            global_headers: Vec::new(),
            global_random_vars: vec![RandomVarSpec {
                name: "Rand".into(),
                variable_name: "rand".into(),
                minimum: "1".into(),
                maximum: "10".into(),
                output_format: String::new(),
                per_thread: false,
                seed: String::new(),
            }],
            thread_groups: Vec::new(),
            global_listeners: vec![ListenerSpec {
                name: "Summary".into(),
                kind: ListenerKind::SummaryReport,
                filename: String::new(),
                error_logging: false,
            }],
        };
        let document = assemble(&context).unwrap();
        assert_eq!(validate(&document), Ok(()));
        assert!(document.contains("guiclass=\"SummaryReport\""));
        assert!(!document.contains("ResponseAssertion"));
    }
}
