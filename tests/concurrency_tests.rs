mod common;

use common::fixtures::*;
use common::{TestResult, init_logger};
use loadplan::Compiler;
use std::thread;

#[test]
fn test_shared_compiler_across_threads() -> TestResult {
    init_logger();
    let compiler = Compiler::default();
    let files = checkout_files();
    let expected = compiler.compile(CHECKOUT, &files)?.document;

    let documents: Vec<String> = thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let compiler = &compiler;
                let files = &files;
                scope.spawn(move || {
                    let template = if i % 2 == 0 { CHECKOUT } else { USER_SCENARIO };
                    compiler
                        .compile(template, files)
                        .map(|c| c.document)
                        .map_err(|e| e.to_string())
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().expect("compile thread panicked"))
            .collect::<Result<_, _>>()
    })?;

    for (i, document) in documents.iter().enumerate() {
        if i % 2 == 0 {
            assert_eq!(document, &expected);
        } else {
            assert!(document.contains("testname=\"TG1\""));
        }
    }
    Ok(())
}
