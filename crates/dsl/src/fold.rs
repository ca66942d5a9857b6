//! Typed conversion of resolved components into a [`GenerationContext`].
use crate::error::TemplateParseError;
use crate::resolve::Resolution;
use loadplan_types::{
    AssertionSpec, BodySource, Component, ComponentKind, DataSetSpec, GenerationContext,
    HeaderPair, HttpDefaults, HttpRequestSpec, ListenerKind, ListenerSpec, MatchMode,
    RandomVarSpec, SampleErrorAction, ShareMode, TestField, ThreadGroupContext, Warning,
    normalize,
};
use std::collections::HashMap;

type Result<T> = std::result::Result<T, TemplateParseError>;

/// Read access to a component's entries with key matching that ignores case
/// and separators.
struct Block<'a> {
    component: &'a Component,
}

impl<'a> Block<'a> {
    fn new(component: &'a Component) -> Self {
        Self { component }
    }

    /// The trimmed value for `key`, or `None` when absent or blank.
    fn get(&self, key: &str) -> Option<&'a str> {
        let wanted = normalize(key);
        self.component
            .params
            .iter()
            .find(|(k, _)| normalize(k) == wanted)
            .map(|(_, v)| v.trim())
            .filter(|v| !v.is_empty())
    }

    fn text(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or(default).to_string()
    }

    fn flag(&self, key: &str, default: bool) -> Result<bool> {
        match self.get(key) {
            None => Ok(default),
            Some(v) => match v.to_ascii_lowercase().as_str() {
                "true" | "yes" | "on" | "1" => Ok(true),
                "false" | "no" | "off" | "0" => Ok(false),
                _ => Err(self.invalid(key, v, "a boolean")),
            },
        }
    }

    /// An integer, or a `${...}` expression evaluated when the plan runs.
    fn count(&self, key: &str, default: &str) -> Result<String> {
        match self.get(key) {
            None => Ok(default.to_string()),
            Some(v) if v.parse::<i64>().is_ok() || v.contains("${") => Ok(v.to_string()),
            Some(v) => Err(self.invalid(key, v, "an integer or a ${...} expression")),
        }
    }

    fn choice<T>(
        &self,
        key: &str,
        default: T,
        parse: fn(&str) -> Option<T>,
        expected: &str,
    ) -> Result<T> {
        match self.get(key) {
            None => Ok(default),
            Some(v) => parse(v).ok_or_else(|| self.invalid(key, v, expected)),
        }
    }

    fn required(&self, key: &str) -> Result<&'a str> {
        self.get(key).ok_or_else(|| TemplateParseError::MissingKey {
            line: self.component.line,
            kind: self.component.kind,
            component: self.component.name.clone(),
            key: key.to_string(),
        })
    }

    fn invalid(&self, key: &str, value: &str, expected: &str) -> TemplateParseError {
        TemplateParseError::InvalidValue {
            line: self.component.line,
            key: key.to_string(),
            value: value.to_string(),
            expected: expected.to_string(),
        }
    }
}

struct PlanSettings {
    comments: String,
    tear_down_on_shutdown: bool,
    functional_mode: bool,
    serialize_thread_groups: bool,
    user_variables: Vec<(String, String)>,
}

enum Typed {
    Plan(PlanSettings),
    Defaults(HttpDefaults),
    Group(ThreadGroupContext),
    Headers(Vec<HeaderPair>),
    Random(RandomVarSpec),
    DataSet(DataSetSpec),
    Request(HttpRequestSpec),
    Assertion(AssertionSpec),
    Listener(ListenerSpec),
}

fn convert(component: &Component) -> Result<Typed> {
    let block = Block::new(component);
    let name = component.name.clone();
    Ok(match component.kind {
        ComponentKind::TestPlan => Typed::Plan(PlanSettings {
            comments: block.text("comments", ""),
            tear_down_on_shutdown: block.flag("tearDownOnShutdown", true)?,
            functional_mode: block.flag("functionalMode", false)?,
            serialize_thread_groups: block.flag("serializeThreadGroups", false)?,
            user_variables: component
                .params
                .iter()
                .filter_map(|(k, v)| {
                    let (prefix, var) = k.split_once('.')?;
                    prefix
                        .eq_ignore_ascii_case("var")
                        .then(|| (var.trim().to_string(), v.trim().to_string()))
                })
                .filter(|(var, _)| !var.is_empty())
                .collect(),
        }),
        ComponentKind::HttpDefaults => Typed::Defaults(HttpDefaults {
            name,
            protocol: block.text("protocol", ""),
            domain: block.text("domain", ""),
            port: block.count("port", "")?,
            path: block.text("path", ""),
            content_encoding: block.text("contentEncoding", "UTF-8"),
            connect_timeout: block.count("connectTimeout", "")?,
            response_timeout: block.count("responseTimeout", "")?,
        }),
        ComponentKind::HeaderManager => Typed::Headers(
            component
                .params
                .iter()
                .map(|(k, v)| HeaderPair {
                    name: k.clone(),
                    value: v.trim().to_string(),
                })
                .collect(),
        ),
        ComponentKind::RandomVariable => Typed::Random(RandomVarSpec {
            variable_name: block.text("variableName", &name),
            minimum: block.count("minimum", "1")?,
            maximum: block.count("maximum", "100")?,
            output_format: block.text("outputFormat", ""),
            per_thread: block.flag("perThread", false)?,
            seed: block.text("seed", ""),
            name,
        }),
        ComponentKind::ThreadGroup => {
            let duration_expr = block.count("duration", "")?;
            Typed::Group(ThreadGroupContext {
                name,
                num_threads_expr: block.count("numThreads", "1")?,
                ramp_time_expr: block.count("rampTime", "1")?,
                loops_expr: block.count("loops", "1")?,
                use_scheduler: block.flag("scheduler", !duration_expr.is_empty())?,
                duration_expr,
                delay_expr: block.count("delay", "")?,
                on_sample_error: block.choice(
                    "onSampleError",
                    SampleErrorAction::Continue,
                    SampleErrorAction::from_name,
                    "continue, startnextloop, stopthread, stoptest or stoptestnow",
                )?,
                headers: Vec::new(),
                random_vars: Vec::new(),
                data_sets: Vec::new(),
                http_requests: Vec::new(),
                listeners: Vec::new(),
            })
        }
        ComponentKind::HttpRequest => Typed::Request(request(&block, name)?),
        ComponentKind::CsvDataSet => Typed::DataSet(data_set(&block, name)?),
        ComponentKind::Assertion => Typed::Assertion(AssertionSpec {
            test_field: block.choice(
                "field",
                TestField::ResponseData,
                TestField::from_name,
                "response_data, response_code, response_message, response_headers, request_headers, url or document",
            )?,
            match_mode: block.choice(
                "match",
                MatchMode::Contains,
                MatchMode::from_name,
                "contains, matches, equals or substring",
            )?,
            patterns: component
                .params
                .iter()
                .filter(|(k, _)| is_pattern_key(k))
                .map(|(_, v)| v.trim().to_string())
                .collect(),
            is_or: block.flag("or", false)?,
            is_not: block.flag("not", false)?,
            scope_main_only: block.choice(
                "scope",
                true,
                |v| match normalize(v).as_str() {
                    "main" | "mainonly" | "parent" => Some(true),
                    "all" | "mainandsub" => Some(false),
                    _ => None,
                },
                "main or all",
            )?,
            assume_success: block.flag("assumeSuccess", false)?,
            name,
        }),
        ComponentKind::Listener => Typed::Listener(ListenerSpec {
            kind: block.choice(
                "kind",
                ListenerKind::ViewResultsTree,
                ListenerKind::from_name,
                "view_results_tree, summary_report or aggregate_report",
            )?,
            filename: block.text("filename", ""),
            error_logging: block.flag("errorLogging", false)?,
            name,
        }),
    })
}

fn is_pattern_key(key: &str) -> bool {
    let lower = key.to_ascii_lowercase();
    lower == "pattern" || lower.starts_with("pattern.")
}

fn request(block: &Block<'_>, name: String) -> Result<HttpRequestSpec> {
    let body = match (block.get("body"), block.get("bodyFile")) {
        (Some(_), Some(_)) => {
            return Err(TemplateParseError::ConflictingBody {
                line: block.component.line,
                component: name,
            });
        }
        (Some(text), None) => Some(BodySource::Embedded(text.to_string())),
        (None, Some(file)) => Some(BodySource::FileReference(file.to_string())),
        (None, None) => None,
    };
    let inline_body_file = block.choice(
        "bodyMode",
        false,
        |v| match normalize(v).as_str() {
            "reference" | "ref" => Some(false),
            "inline" => Some(true),
            _ => None,
        },
        "reference or inline",
    )?;
    let default_method = if body.is_some() { "POST" } else { "GET" };

    Ok(HttpRequestSpec {
        method: block.text("method", default_method).to_ascii_uppercase(),
        protocol: block.text("protocol", ""),
        domain: block.text("domain", ""),
        port: block.count("port", "")?,
        path: block.text("path", "/"),
        connect_timeout: block.count("connectTimeout", "")?,
        response_timeout: block.count("responseTimeout", "")?,
        content_encoding: block.text("contentEncoding", "UTF-8"),
        follow_redirects: block.flag("followRedirects", true)?,
        body,
        inline_body_file,
        assertions: Vec::new(),
        name,
    })
}

fn data_set(block: &Block<'_>, name: String) -> Result<DataSetSpec> {
    let filename = block.required("filename")?;
    let mut spec = DataSetSpec::for_file(name, filename);
    spec.variable_names = block
        .get("variableNames")
        .map(|v| {
            v.split(',')
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();
    // Left empty when unset so the file's detected delimiter can fill it in.
    spec.delimiter = match block.component.param("delimiter") {
        None => String::new(),
        Some(v) => match v {
            "\\t" | "\t" => "\t".to_string(),
            v if v.eq_ignore_ascii_case("tab") => "\t".to_string(),
            v if v.trim().is_empty() => String::new(),
            v => v.trim().to_string(),
        },
    };
    spec.file_encoding = block.text("fileEncoding", "UTF-8");
    spec.ignore_first_line = block.flag("ignoreFirstLine", false)?;
    spec.quoted_data = block.flag("quotedData", false)?;
    spec.recycle = block.flag("recycle", true)?;
    spec.stop_on_eof = block.flag("stopThread", false)?;
    spec.share_mode = block.choice(
        "shareMode",
        ShareMode::All,
        ShareMode::from_name,
        "all, group or thread",
    )?;
    Ok(spec)
}

/// Builds the context from surviving components.
///
/// `assertions` maps a request's index to the assertions attached to it.
pub fn fold(
    components: &[Component],
    resolution: &Resolution,
    assertions: &HashMap<usize, Vec<usize>>,
) -> Result<(GenerationContext, Vec<Warning>)> {
    let mut typed = Vec::with_capacity(components.len());
    for (i, component) in components.iter().enumerate() {
        typed.push(if resolution.alive[i] {
            Some(convert(component)?)
        } else {
            None
        });
    }

    let mut warnings = Vec::new();
    let mut context = GenerationContext {
        test_plan_name: String::new(),
        comments: String::new(),
        tear_down_on_shutdown: true,
        functional_mode: false,
        serialize_thread_groups: false,
        user_variables: Vec::new(),
        global_http_defaults: None,
        global_headers: Vec::new(),
        global_random_vars: Vec::new(),
        thread_groups: Vec::new(),
        global_listeners: Vec::new(),
    };

    // Root settings and thread groups first; children may name a group
    // declared after them.
    let mut group_slots: HashMap<usize, usize> = HashMap::new();
    for (i, slot) in typed.iter_mut().enumerate() {
        match slot.take() {
            Some(Typed::Plan(plan)) => {
                context.test_plan_name = components[i].name.clone();
                context.comments = plan.comments;
                context.tear_down_on_shutdown = plan.tear_down_on_shutdown;
                context.functional_mode = plan.functional_mode;
                context.serialize_thread_groups = plan.serialize_thread_groups;
                context.user_variables = plan.user_variables;
            }
            Some(Typed::Group(group)) => {
                group_slots.insert(i, context.thread_groups.len());
                context.thread_groups.push(group);
            }
            other => *slot = other,
        }
    }

    let mut assertion_specs: HashMap<usize, AssertionSpec> = HashMap::new();
    let mut request_slots: Vec<(usize, usize, usize)> = Vec::new();
    for (i, slot) in typed.into_iter().enumerate() {
        let Some(item) = slot else { continue };
        let group = resolution.parents[i].and_then(|p| group_slots.get(&p).copied());
        match (item, group) {
            (Typed::Defaults(defaults), _) => {
                if context.global_http_defaults.is_none() {
                    context.global_http_defaults = Some(defaults);
                } else {
                    let domain = defaults.domain.trim();
                    let warning = Warning::DuplicateDefaults {
                        discarded_domain: (!domain.is_empty()).then(|| domain.to_string()),
                        component: defaults.name,
                        line: components[i].line,
                    };
                    log::warn!("{}", warning);
                    warnings.push(warning);
                }
            }
            (Typed::Headers(headers), Some(g)) => context.thread_groups[g].headers.extend(headers),
            (Typed::Headers(headers), None) => context.global_headers.extend(headers),
            (Typed::Random(var), Some(g)) => context.thread_groups[g].random_vars.push(var),
            (Typed::Random(var), None) => context.global_random_vars.push(var),
            (Typed::Listener(listener), Some(g)) => context.thread_groups[g].listeners.push(listener),
            (Typed::Listener(listener), None) => context.global_listeners.push(listener),
            (Typed::DataSet(data_set), Some(g)) => context.thread_groups[g].data_sets.push(data_set),
            (Typed::Request(request), Some(g)) => {
                request_slots.push((i, g, context.thread_groups[g].http_requests.len()));
                context.thread_groups[g].http_requests.push(request);
            }
            (Typed::Assertion(assertion), _) => {
                assertion_specs.insert(i, assertion);
            }
            _ => log::debug!("'{}' has no place in the plan", components[i].name),
        }
    }

    for (i, g, r) in request_slots {
        let attached = assertions.get(&i).map(Vec::as_slice).unwrap_or_default();
        let request = &mut context.thread_groups[g].http_requests[r];
        request.assertions = attached
            .iter()
            .filter_map(|a| assertion_specs.get(a).cloned())
            .collect();
    }

    Ok((context, warnings))
}
