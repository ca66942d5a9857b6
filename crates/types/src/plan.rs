//! The resolved, hierarchical test plan consumed by the document assembler.
use serde::Serialize;

/// What a thread does when a sampler fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum SampleErrorAction {
    #[default]
    Continue,
    StartNextLoop,
    StopThread,
    StopTest,
    StopTestNow,
}

impl SampleErrorAction {
    pub fn from_name(name: &str) -> Option<Self> {
        match normalize(name).as_str() {
            "continue" => Some(Self::Continue),
            "startnextloop" | "startnextthreadloop" => Some(Self::StartNextLoop),
            "stopthread" => Some(Self::StopThread),
            "stoptest" => Some(Self::StopTest),
            "stoptestnow" => Some(Self::StopTestNow),
            _ => None,
        }
    }

    pub fn as_jmx(self) -> &'static str {
        match self {
            Self::Continue => "continue",
            Self::StartNextLoop => "startnextloop",
            Self::StopThread => "stopthread",
            Self::StopTest => "stoptest",
            Self::StopTestNow => "stoptestnow",
        }
    }
}

/// The part of a sample result an assertion inspects.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum TestField {
    #[default]
    ResponseData,
    ResponseCode,
    ResponseMessage,
    ResponseHeaders,
    RequestHeaders,
    Url,
    Document,
}

impl TestField {
    pub fn from_name(name: &str) -> Option<Self> {
        match normalize(name).as_str() {
            "responsedata" | "text" | "body" => Some(Self::ResponseData),
            "responsecode" | "code" => Some(Self::ResponseCode),
            "responsemessage" | "message" => Some(Self::ResponseMessage),
            "responseheaders" | "headers" => Some(Self::ResponseHeaders),
            "requestheaders" => Some(Self::RequestHeaders),
            "url" | "sampleurl" => Some(Self::Url),
            "document" => Some(Self::Document),
            _ => None,
        }
    }

    pub fn as_jmx(self) -> &'static str {
        match self {
            Self::ResponseData => "Assertion.response_data",
            Self::ResponseCode => "Assertion.response_code",
            Self::ResponseMessage => "Assertion.response_message",
            Self::ResponseHeaders => "Assertion.response_headers",
            Self::RequestHeaders => "Assertion.request_headers",
            Self::Url => "Assertion.sample_label",
            Self::Document => "Assertion.response_data_as_document",
        }
    }
}

/// How assertion patterns are compared against the tested field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum MatchMode {
    Matches,
    #[default]
    Contains,
    Equals,
    Substring,
}

impl MatchMode {
    /// Bit flag set on the `NOT` modifier of a response assertion.
    pub const NOT_FLAG: i32 = 4;

    pub fn from_name(name: &str) -> Option<Self> {
        match normalize(name).as_str() {
            "matches" | "match" | "regex" => Some(Self::Matches),
            "contains" => Some(Self::Contains),
            "equals" | "equal" => Some(Self::Equals),
            "substring" => Some(Self::Substring),
            _ => None,
        }
    }

    pub fn base_test_type(self) -> i32 {
        match self {
            Self::Matches => 1,
            Self::Contains => 2,
            Self::Equals => 8,
            Self::Substring => 16,
        }
    }
}

/// Which threads share one cursor over a data set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum ShareMode {
    #[default]
    All,
    Group,
    Thread,
}

impl ShareMode {
    pub fn from_name(name: &str) -> Option<Self> {
        let normalized = normalize(name);
        match normalized.trim_start_matches("sharemode") {
            "all" => Some(Self::All),
            "group" => Some(Self::Group),
            "thread" => Some(Self::Thread),
            _ => None,
        }
    }

    pub fn as_jmx(self) -> &'static str {
        match self {
            Self::All => "shareMode.all",
            Self::Group => "shareMode.group",
            Self::Thread => "shareMode.thread",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum ListenerKind {
    #[default]
    ViewResultsTree,
    SummaryReport,
    AggregateReport,
}

impl ListenerKind {
    pub fn from_name(name: &str) -> Option<Self> {
        match normalize(name).as_str() {
            "viewresultstree" | "resultstree" => Some(Self::ViewResultsTree),
            "summaryreport" | "summary" => Some(Self::SummaryReport),
            "aggregatereport" | "aggregate" => Some(Self::AggregateReport),
            _ => None,
        }
    }

    pub fn gui_class(self) -> &'static str {
        match self {
            Self::ViewResultsTree => "ViewResultsFullVisualizer",
            Self::SummaryReport => "SummaryReport",
            Self::AggregateReport => "StatVisualizer",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeaderPair {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RandomVarSpec {
    pub name: String,
    pub variable_name: String,
    pub minimum: String,
    pub maximum: String,
    pub output_format: String,
    pub per_thread: bool,
    pub seed: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HttpDefaults {
    pub name: String,
    pub protocol: String,
    pub domain: String,
    pub port: String,
    pub path: String,
    pub content_encoding: String,
    pub connect_timeout: String,
    pub response_timeout: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListenerSpec {
    pub name: String,
    pub kind: ListenerKind,
    pub filename: String,
    pub error_logging: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssertionSpec {
    pub name: String,
    pub test_field: TestField,
    pub match_mode: MatchMode,
    pub patterns: Vec<String>,
    pub is_or: bool,
    pub is_not: bool,
    pub scope_main_only: bool,
    pub assume_success: bool,
}

impl AssertionSpec {
    /// The integer written to `Assertion.test_type`.
    pub fn test_type(&self) -> i32 {
        let not = if self.is_not { MatchMode::NOT_FLAG } else { 0 };
        self.match_mode.base_test_type() | not
    }
}

/// Where a request body comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum BodySource {
    /// Body text inlined into the document.
    Embedded(String),
    /// Body read from a data file when the test runs.
    FileReference(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HttpRequestSpec {
    pub name: String,
    pub method: String,
    pub protocol: String,
    pub domain: String,
    pub port: String,
    pub path: String,
    pub connect_timeout: String,
    pub response_timeout: String,
    pub content_encoding: String,
    pub follow_redirects: bool,
    pub body: Option<BodySource>,
    /// Inline a referenced fragment instead of reading it at run time.
    pub inline_body_file: bool,
    pub assertions: Vec<AssertionSpec>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DataSetSpec {
    pub name: String,
    pub filename: String,
    pub variable_names: Vec<String>,
    pub delimiter: String,
    pub file_encoding: String,
    pub ignore_first_line: bool,
    pub quoted_data: bool,
    pub recycle: bool,
    pub stop_on_eof: bool,
    pub share_mode: ShareMode,
    /// File content, present once the data set was joined with an uploaded file.
    #[serde(skip)]
    pub raw_content: Option<String>,
}

impl DataSetSpec {
    /// A data set with the platform defaults for `filename`.
    pub fn for_file(name: impl Into<String>, filename: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            filename: filename.into(),
            variable_names: Vec::new(),
            delimiter: ",".to_string(),
            file_encoding: "UTF-8".to_string(),
            ignore_first_line: false,
            quoted_data: false,
            recycle: true,
            stop_on_eof: false,
            share_mode: ShareMode::All,
            raw_content: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ThreadGroupContext {
    pub name: String,
    pub num_threads_expr: String,
    pub ramp_time_expr: String,
    pub loops_expr: String,
    pub duration_expr: String,
    pub delay_expr: String,
    pub on_sample_error: SampleErrorAction,
    pub use_scheduler: bool,
    pub headers: Vec<HeaderPair>,
    pub random_vars: Vec<RandomVarSpec>,
    pub data_sets: Vec<DataSetSpec>,
    pub http_requests: Vec<HttpRequestSpec>,
    pub listeners: Vec<ListenerSpec>,
}

/// The root of a fully resolved test plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerationContext {
    pub test_plan_name: String,
    pub comments: String,
    pub tear_down_on_shutdown: bool,
    pub functional_mode: bool,
    pub serialize_thread_groups: bool,
    pub user_variables: Vec<(String, String)>,
    pub global_http_defaults: Option<HttpDefaults>,
    pub global_headers: Vec<HeaderPair>,
    pub global_random_vars: Vec<RandomVarSpec>,
    pub thread_groups: Vec<ThreadGroupContext>,
    pub global_listeners: Vec<ListenerSpec>,
}

impl GenerationContext {
    pub fn request_count(&self) -> usize {
        self.thread_groups.iter().map(|tg| tg.http_requests.len()).sum()
    }
}

/// Lowercases and strips separators so `Start Next Loop`, `start_next_loop`
/// and `startnextloop` compare equal.
pub fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(c, ' ' | '_' | '-' | '.'))
        .flat_map(char::to_lowercase)
        .collect()
}
