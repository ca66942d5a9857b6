mod common;

use common::fixtures::*;
use common::jmx_assertions::*;
use common::{TestResult, compile_plan};
use loadplan_jmx::{ValidationError, java_string_hash, validate};

#[test]
fn test_checkout_plan_structure() -> TestResult {
    let compilation = compile_plan(CHECKOUT, &checkout_files())?;
    assert!(compilation.warnings.is_empty(), "{:?}", compilation.warnings);

    let doc = roxmltree::Document::parse(&compilation.document)?;
    assert_paired_hash_trees(doc.root_element());

    let plan = test_element(&doc, "TestPlan", "Checkout").ok_or("no test plan")?;
    assert_eq!(prop(plan, "TestPlan.comments"), Some("nightly regression"));
    let plan_tree = subtree(plan).ok_or("test plan has no hashTree")?;
    assert_eq!(
        child_tags(plan_tree),
        vec![
            "ConfigTestElement",
            "HeaderManager",
            "RandomVariableConfig",
            "ThreadGroup",
            "ResultCollector",
        ]
    );

    let group = test_element(&doc, "ThreadGroup", "Shoppers").ok_or("no thread group")?;
    assert_eq!(prop(group, "ThreadGroup.num_threads"), Some("${__P(threads,20)}"));
    assert_eq!(prop(group, "ThreadGroup.scheduler"), Some("true"));
    assert_eq!(prop(group, "ThreadGroup.duration"), Some("300"));
    let group_tree = subtree(group).ok_or("thread group has no hashTree")?;
    assert_eq!(
        child_tags(group_tree),
        vec![
            "CSVDataSet",
            "HTTPSamplerProxy",
            "HTTPSamplerProxy",
            "HTTPSamplerProxy",
            "ResultCollector",
        ]
    );
    Ok(())
}

#[test]
fn test_group_assertion_is_hoisted_onto_every_request() -> TestResult {
    let compilation = compile_plan(CHECKOUT, &checkout_files())?;
    let doc = roxmltree::Document::parse(&compilation.document)?;

    for (request, expected) in [
        ("Browse", vec!["Healthy"]),
        ("Add to cart", vec!["Healthy", "Added"]),
        ("Pay", vec!["Healthy"]),
    ] {
        let sampler = test_element(&doc, "HTTPSamplerProxy", request).ok_or("missing sampler")?;
        let tree = subtree(sampler).ok_or("sampler has no hashTree")?;
        let names: Vec<&str> = tree
            .children()
            .filter(|n| n.has_tag_name("ResponseAssertion"))
            .filter_map(|n| n.attribute("testname"))
            .collect();
        assert_eq!(names, expected, "assertions under {}", request);
    }

    let added = test_element(&doc, "ResponseAssertion", "Added").ok_or("no assertion")?;
    assert_eq!(prop(added, "Assertion.or"), Some("true"));
    assert_eq!(prop(added, "Assertion.test_type"), Some("2"));
    let healthy = test_element(&doc, "ResponseAssertion", "Healthy").ok_or("no assertion")?;
    assert_eq!(prop(healthy, "Assertion.or"), None);
    assert_eq!(prop(healthy, "Assertion.test_field"), Some("Assertion.response_code"));
    Ok(())
}

#[test]
fn test_assertion_patterns_are_named_by_hash() -> TestResult {
    let compilation = compile_plan(CHECKOUT, &checkout_files())?;
    let doc = roxmltree::Document::parse(&compilation.document)?;
    let added = test_element(&doc, "ResponseAssertion", "Added").ok_or("no assertion")?;
    let strings = added
        .children()
        .find(|n| n.attribute("name") == Some("Asserion.test_strings"))
        .ok_or("no test strings")?;
    let named: Vec<(String, String)> = strings
        .children()
        .filter(|n| n.is_element())
        .map(|n| {
            (
                n.attribute("name").unwrap_or_default().to_string(),
                n.text().unwrap_or_default().to_string(),
            )
        })
        .collect();
    assert_eq!(
        named,
        vec![
            (java_string_hash("added").to_string(), "added".to_string()),
            (java_string_hash("cart").to_string(), "cart".to_string()),
        ]
    );
    Ok(())
}

#[test]
fn test_bodies_in_document() -> TestResult {
    let compilation = compile_plan(CHECKOUT, &checkout_files())?;
    let doc = roxmltree::Document::parse(&compilation.document)?;

    let body_of = |request: &str| -> Option<String> {
        test_element(&doc, "HTTPSamplerProxy", request)?
            .descendants()
            .find(|n| n.attribute("name") == Some("Argument.value"))
            .and_then(|n| n.text())
            .map(str::to_string)
    };

    let cart: serde_json::Value = serde_json::from_str(&body_of("Add to cart").ok_or("no body")?)?;
    assert_eq!(
        cart,
        serde_json::json!({
            "customer": "${customer}",
            "items": [{"sku": "A-1", "qty": 2}]
        })
    );
    assert_eq!(
        body_of("Pay").as_deref(),
        Some("${__FileToString(test-data/payment.json,UTF-8,)}")
    );
    assert_eq!(body_of("Browse"), None);

    let customers = test_element(&doc, "CSVDataSet", "Customers").ok_or("no data set")?;
    assert_eq!(prop(customers, "filename"), Some("test-data/customers.csv"));
    assert_eq!(prop(customers, "variableNames"), Some("customer,email"));
    assert_eq!(prop(customers, "ignoreFirstLine"), Some("true"));
    Ok(())
}

#[test]
fn test_user_variables_and_defaults() -> TestResult {
    let compilation = compile_plan(CHECKOUT, &checkout_files())?;
    let doc = roxmltree::Document::parse(&compilation.document)?;

    let variables = doc
        .descendants()
        .find(|n| n.attribute("name") == Some("TestPlan.user_defined_variables"))
        .ok_or("no user variables")?;
    let base = variables
        .descendants()
        .find(|n| n.has_tag_name("elementProp") && n.attribute("name") == Some("BASE"))
        .ok_or("no BASE variable")?;
    assert_eq!(prop(base, "Argument.value"), Some("/api"));

    let defaults = test_element(&doc, "ConfigTestElement", "Defaults").ok_or("no defaults")?;
    assert_eq!(prop(defaults, "HTTPSampler.domain"), Some("shop.example.com"));
    assert_eq!(prop(defaults, "HTTPSampler.protocol"), Some("https"));

    let stats = test_element(&doc, "ResultCollector", "Stats").ok_or("no listener")?;
    assert_eq!(stats.attribute("guiclass"), Some("SummaryReport"));
    let debug = test_element(&doc, "ResultCollector", "Debug").ok_or("no listener")?;
    assert_eq!(debug.attribute("guiclass"), Some("ViewResultsFullVisualizer"));
    Ok(())
}

#[test]
fn test_validator_gate_rejects_truncated_documents() -> TestResult {
    let compilation = compile_plan(USER_SCENARIO, &[users_csv()])?;
    assert_eq!(validate(&compilation.document), Ok(()));

    let truncated = compilation.document.trim_end_matches("</jmeterTestPlan>");
    assert_eq!(validate(truncated), Err(ValidationError::MissingRootClose));
    Ok(())
}
