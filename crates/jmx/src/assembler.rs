//! Walks a [`GenerationContext`] and writes the JMeter document.
//!
//! Every test element is followed by its `<hashTree>`, which holds the
//! element's children (or is empty for leaves).
use crate::error::AssemblyError;
use crate::java_hash::java_string_hash;
use crate::writer::JmxWriter;
use loadplan_types::{
    AssertionSpec, BodySource, DataSetSpec, GenerationContext, HeaderPair, HttpDefaults,
    HttpRequestSpec, ListenerSpec, RandomVarSpec, ThreadGroupContext, test_data_path,
};

type Result<T> = std::result::Result<T, AssemblyError>;

pub const JMX_VERSION: &str = "1.2";
pub const JMX_PROPERTIES: &str = "5.0";
pub const JMETER_VERSION: &str = "5.6.3";

/// Fields recorded by every result collector.
const SAVE_CONFIG: &[(&str, &str)] = &[
    ("time", "true"),
    ("latency", "true"),
    ("timestamp", "true"),
    ("success", "true"),
    ("label", "true"),
    ("code", "true"),
    ("message", "true"),
    ("threadName", "true"),
    ("dataType", "true"),
    ("encoding", "false"),
    ("assertions", "true"),
    ("subresults", "true"),
    ("responseData", "false"),
    ("samplerData", "false"),
    ("xml", "false"),
    ("fieldNames", "true"),
    ("responseHeaders", "false"),
    ("requestHeaders", "false"),
    ("responseDataOnError", "false"),
    ("saveAssertionResultsFailureMessage", "true"),
    ("assertionsResultsToSave", "0"),
    ("bytes", "true"),
    ("sentBytes", "true"),
    ("url", "true"),
    ("threadCounts", "true"),
    ("idleTime", "true"),
    ("connectTime", "true"),
];

/// Writes `context` as a complete `.jmx` document.
///
/// The output depends only on `context`, so equal contexts give
/// byte-identical documents.
pub fn assemble(context: &GenerationContext) -> Result<String> {
    let mut w = JmxWriter::new()?;
    w.start(
        "jmeterTestPlan",
        &[
            ("version", JMX_VERSION),
            ("properties", JMX_PROPERTIES),
            ("jmeter", JMETER_VERSION),
        ],
    )?;
    w.hash_tree(true, |w| {
        test_plan(w, context)?;
        w.hash_tree(true, |w| plan_children(w, context))
    })?;
    w.end("jmeterTestPlan")?;

    let document = w.finish()?;
    log::debug!(
        "assembled '{}': {} thread groups, {} bytes",
        context.test_plan_name,
        context.thread_groups.len(),
        document.len()
    );
    Ok(document)
}

fn test_element<'a>(gui: &'a str, class: &'a str, name: &'a str) -> [(&'a str, &'a str); 4] {
    [
        ("guiclass", gui),
        ("testclass", class),
        ("testname", name),
        ("enabled", "true"),
    ]
}

fn test_plan(w: &mut JmxWriter, context: &GenerationContext) -> Result<()> {
    w.start(
        "TestPlan",
        &test_element("TestPlanGui", "TestPlan", &context.test_plan_name),
    )?;
    w.string_prop("TestPlan.comments", &context.comments)?;
    w.bool_prop("TestPlan.functional_mode", context.functional_mode)?;
    w.bool_prop("TestPlan.tearDown_on_shutdown", context.tear_down_on_shutdown)?;
    w.bool_prop("TestPlan.serialize_threadgroups", context.serialize_thread_groups)?;
    w.start(
        "elementProp",
        &[
            ("name", "TestPlan.user_defined_variables"),
            ("elementType", "Arguments"),
            ("guiclass", "ArgumentsPanel"),
            ("testclass", "Arguments"),
            ("testname", "User Defined Variables"),
            ("enabled", "true"),
        ],
    )?;
    arguments(w, &context.user_variables)?;
    w.end("elementProp")?;
    w.start(
        "elementProp",
        &[
            ("name", "TestPlan.user_define_classpath"),
            ("elementType", "Arguments"),
            ("guiclass", "ArgumentsPanel"),
            ("testclass", "Arguments"),
            ("enabled", "true"),
        ],
    )?;
    w.empty("collectionProp", &[("name", "Arguments.arguments")])?;
    w.end("elementProp")?;
    w.end("TestPlan")
}

fn arguments(w: &mut JmxWriter, variables: &[(String, String)]) -> Result<()> {
    if variables.is_empty() {
        return w.empty("collectionProp", &[("name", "Arguments.arguments")]);
    }
    w.start("collectionProp", &[("name", "Arguments.arguments")])?;
    for (name, value) in variables {
        w.start("elementProp", &[("name", name.as_str()), ("elementType", "Argument")])?;
        w.string_prop("Argument.name", name)?;
        w.string_prop("Argument.value", value)?;
        w.string_prop("Argument.metadata", "=")?;
        w.end("elementProp")?;
    }
    w.end("collectionProp")
}

fn plan_children(w: &mut JmxWriter, context: &GenerationContext) -> Result<()> {
    if let Some(defaults) = &context.global_http_defaults {
        http_defaults(w, defaults)?;
        w.hash_tree(false, |_| Ok(()))?;
    }
    if !context.global_headers.is_empty() {
        header_manager(w, &context.global_headers)?;
        w.hash_tree(false, |_| Ok(()))?;
    }
    for var in &context.global_random_vars {
        random_variable(w, var)?;
        w.hash_tree(false, |_| Ok(()))?;
    }
    for group in &context.thread_groups {
        thread_group(w, group)?;
        w.hash_tree(has_children(group), |w| group_children(w, group))?;
    }
    for listener in &context.global_listeners {
        result_collector(w, listener)?;
        w.hash_tree(false, |_| Ok(()))?;
    }
    Ok(())
}

fn has_children(group: &ThreadGroupContext) -> bool {
    !(group.data_sets.is_empty()
        && group.headers.is_empty()
        && group.random_vars.is_empty()
        && group.http_requests.is_empty()
        && group.listeners.is_empty())
}

fn thread_group(w: &mut JmxWriter, group: &ThreadGroupContext) -> Result<()> {
    w.start(
        "ThreadGroup",
        &test_element("ThreadGroupGui", "ThreadGroup", &group.name),
    )?;
    w.string_prop("ThreadGroup.on_sample_error", group.on_sample_error.as_jmx())?;
    w.start(
        "elementProp",
        &[
            ("name", "ThreadGroup.main_controller"),
            ("elementType", "LoopController"),
            ("guiclass", "LoopControlPanel"),
            ("testclass", "LoopController"),
            ("testname", "Loop Controller"),
            ("enabled", "true"),
        ],
    )?;
    w.bool_prop("LoopController.continue_forever", false)?;
    w.string_prop("LoopController.loops", &group.loops_expr)?;
    w.end("elementProp")?;
    w.string_prop("ThreadGroup.num_threads", &group.num_threads_expr)?;
    w.string_prop("ThreadGroup.ramp_time", &group.ramp_time_expr)?;
    w.bool_prop("ThreadGroup.scheduler", group.use_scheduler)?;
    w.string_prop("ThreadGroup.duration", &group.duration_expr)?;
    w.string_prop("ThreadGroup.delay", &group.delay_expr)?;
    w.bool_prop("ThreadGroup.same_user_on_next_iteration", false)?;
    w.end("ThreadGroup")
}

fn group_children(w: &mut JmxWriter, group: &ThreadGroupContext) -> Result<()> {
    for data_set in &group.data_sets {
        csv_data_set(w, data_set)?;
        w.hash_tree(false, |_| Ok(()))?;
    }
    if !group.headers.is_empty() {
        header_manager(w, &group.headers)?;
        w.hash_tree(false, |_| Ok(()))?;
    }
    for var in &group.random_vars {
        random_variable(w, var)?;
        w.hash_tree(false, |_| Ok(()))?;
    }
    for request in &group.http_requests {
        http_sampler(w, request)?;
        w.hash_tree(!request.assertions.is_empty(), |w| {
            for assertion in &request.assertions {
                response_assertion(w, assertion)?;
                w.hash_tree(false, |_| Ok(()))?;
            }
            Ok(())
        })?;
    }
    for listener in &group.listeners {
        result_collector(w, listener)?;
        w.hash_tree(false, |_| Ok(()))?;
    }
    Ok(())
}

fn empty_http_arguments(w: &mut JmxWriter) -> Result<()> {
    w.start(
        "elementProp",
        &[
            ("name", "HTTPsampler.Arguments"),
            ("elementType", "Arguments"),
            ("guiclass", "HTTPArgumentsPanel"),
            ("testclass", "Arguments"),
            ("testname", "User Defined Variables"),
            ("enabled", "true"),
        ],
    )?;
    w.empty("collectionProp", &[("name", "Arguments.arguments")])?;
    w.end("elementProp")
}

fn http_defaults(w: &mut JmxWriter, defaults: &HttpDefaults) -> Result<()> {
    w.start(
        "ConfigTestElement",
        &test_element("HttpDefaultsGui", "ConfigTestElement", &defaults.name),
    )?;
    empty_http_arguments(w)?;
    w.string_prop("HTTPSampler.domain", &defaults.domain)?;
    w.string_prop("HTTPSampler.port", &defaults.port)?;
    w.string_prop("HTTPSampler.protocol", &defaults.protocol)?;
    w.string_prop("HTTPSampler.contentEncoding", &defaults.content_encoding)?;
    w.string_prop("HTTPSampler.path", &defaults.path)?;
    w.string_prop("HTTPSampler.connect_timeout", &defaults.connect_timeout)?;
    w.string_prop("HTTPSampler.response_timeout", &defaults.response_timeout)?;
    w.end("ConfigTestElement")
}

fn header_manager(w: &mut JmxWriter, headers: &[HeaderPair]) -> Result<()> {
    w.start(
        "HeaderManager",
        &test_element("HeaderPanel", "HeaderManager", "HTTP Header Manager"),
    )?;
    w.start("collectionProp", &[("name", "HeaderManager.headers")])?;
    for header in headers {
        w.start("elementProp", &[("name", ""), ("elementType", "Header")])?;
        w.string_prop("Header.name", &header.name)?;
        w.string_prop("Header.value", &header.value)?;
        w.end("elementProp")?;
    }
    w.end("collectionProp")?;
    w.end("HeaderManager")
}

fn random_variable(w: &mut JmxWriter, var: &RandomVarSpec) -> Result<()> {
    w.start(
        "RandomVariableConfig",
        &test_element("TestBeanGUI", "RandomVariableConfig", &var.name),
    )?;
    w.string_prop("maximumValue", &var.maximum)?;
    w.string_prop("minimumValue", &var.minimum)?;
    w.string_prop("outputFormat", &var.output_format)?;
    w.bool_prop("perThread", var.per_thread)?;
    w.string_prop("randomSeed", &var.seed)?;
    w.string_prop("variableName", &var.variable_name)?;
    w.end("RandomVariableConfig")
}

fn csv_data_set(w: &mut JmxWriter, data_set: &DataSetSpec) -> Result<()> {
    w.start(
        "CSVDataSet",
        &test_element("TestBeanGUI", "CSVDataSet", &data_set.name),
    )?;
    w.string_prop("delimiter", &data_set.delimiter)?;
    w.string_prop("fileEncoding", &data_set.file_encoding)?;
    w.string_prop("filename", &test_data_path(&data_set.filename))?;
    w.bool_prop("ignoreFirstLine", data_set.ignore_first_line)?;
    w.bool_prop("quotedData", data_set.quoted_data)?;
    w.bool_prop("recycle", data_set.recycle)?;
    w.string_prop("shareMode", data_set.share_mode.as_jmx())?;
    w.bool_prop("stopThread", data_set.stop_on_eof)?;
    w.string_prop("variableNames", &data_set.variable_names.join(","))?;
    w.end("CSVDataSet")
}

/// The raw post body for a request, if it has one.
pub fn body_text(body: &BodySource) -> String {
    match body {
        BodySource::Embedded(text) => text.clone(),
        BodySource::FileReference(file) => {
            format!("${{__FileToString({},UTF-8,)}}", test_data_path(file))
        }
    }
}

fn http_sampler(w: &mut JmxWriter, request: &HttpRequestSpec) -> Result<()> {
    w.start(
        "HTTPSamplerProxy",
        &test_element("HttpTestSampleGui", "HTTPSamplerProxy", &request.name),
    )?;
    match &request.body {
        Some(body) => {
            w.bool_prop("HTTPSampler.postBodyRaw", true)?;
            w.start(
                "elementProp",
                &[("name", "HTTPsampler.Arguments"), ("elementType", "Arguments")],
            )?;
            w.start("collectionProp", &[("name", "Arguments.arguments")])?;
            w.start("elementProp", &[("name", ""), ("elementType", "HTTPArgument")])?;
            w.bool_prop("HTTPArgument.always_encode", false)?;
            w.string_prop("Argument.value", &body_text(body))?;
            w.string_prop("Argument.metadata", "=")?;
            w.end("elementProp")?;
            w.end("collectionProp")?;
            w.end("elementProp")?;
        }
        None => empty_http_arguments(w)?,
    }
    w.string_prop("HTTPSampler.domain", &request.domain)?;
    w.string_prop("HTTPSampler.port", &request.port)?;
    w.string_prop("HTTPSampler.protocol", &request.protocol)?;
    w.string_prop("HTTPSampler.contentEncoding", &request.content_encoding)?;
    w.string_prop("HTTPSampler.path", &request.path)?;
    w.string_prop("HTTPSampler.method", &request.method)?;
    w.bool_prop("HTTPSampler.follow_redirects", request.follow_redirects)?;
    w.bool_prop("HTTPSampler.auto_redirects", false)?;
    w.bool_prop("HTTPSampler.use_keepalive", true)?;
    w.bool_prop("HTTPSampler.DO_MULTIPART_POST", false)?;
    w.string_prop("HTTPSampler.connect_timeout", &request.connect_timeout)?;
    w.string_prop("HTTPSampler.response_timeout", &request.response_timeout)?;
    w.end("HTTPSamplerProxy")
}

fn response_assertion(w: &mut JmxWriter, assertion: &AssertionSpec) -> Result<()> {
    w.start(
        "ResponseAssertion",
        &test_element("AssertionGui", "ResponseAssertion", &assertion.name),
    )?;
    // JMeter's own property name, misspelling included.
    if assertion.patterns.is_empty() {
        w.empty("collectionProp", &[("name", "Asserion.test_strings")])?;
    } else {
        w.start("collectionProp", &[("name", "Asserion.test_strings")])?;
        for pattern in &assertion.patterns {
            w.string_prop(&java_string_hash(pattern).to_string(), pattern)?;
        }
        w.end("collectionProp")?;
    }
    w.string_prop("Assertion.custom_message", "")?;
    w.string_prop("Assertion.test_field", assertion.test_field.as_jmx())?;
    w.bool_prop("Assertion.assume_success", assertion.assume_success)?;
    w.int_prop("Assertion.test_type", assertion.test_type())?;
    if assertion.is_or {
        w.bool_prop("Assertion.or", true)?;
    }
    if !assertion.scope_main_only {
        w.string_prop("Assertion.scope", "all")?;
    }
    w.end("ResponseAssertion")
}

fn result_collector(w: &mut JmxWriter, listener: &ListenerSpec) -> Result<()> {
    w.start(
        "ResultCollector",
        &test_element(listener.kind.gui_class(), "ResultCollector", &listener.name),
    )?;
    w.bool_prop("ResultCollector.error_logging", listener.error_logging)?;
    w.start("objProp", &[])?;
    w.text_element("name", &[], "saveConfig")?;
    w.start("value", &[("class", "SampleSaveConfiguration")])?;
    for (field, value) in SAVE_CONFIG {
        w.text_element(field, &[], value)?;
    }
    w.end("value")?;
    w.end("objProp")?;
    w.string_prop("filename", &listener.filename)?;
    w.end("ResultCollector")
}
