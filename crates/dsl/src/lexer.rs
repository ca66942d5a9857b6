//! A line-oriented tokenizer turning template text into flat [`Component`]s.
use crate::error::TemplateParseError;
use indexmap::IndexMap;
use loadplan_types::{Component, ComponentKind, ListenerKind, Warning, normalize};
use nom::{
    IResult, Parser,
    bytes::complete::{take_till, take_till1},
    character::complete::{char, space0},
    combinator::{eof, rest},
    sequence::{delimited, separated_pair, terminated},
};

const MULTILINE_FENCE: &str = "\"\"\"";
const PARENT_KEY: &str = "parent";

/// Components in declaration order plus the warnings raised while reading them.
#[derive(Debug, Clone, PartialEq)]
pub struct Tokens {
    pub components: Vec<Component>,
    pub warnings: Vec<Warning>,
}

/// Maps a block type as written in a header to its kind.
///
/// Listener aliases such as `Summary Report` also fix the listener kind.
pub fn block_kind(type_name: &str) -> Option<(ComponentKind, Option<ListenerKind>)> {
    use ComponentKind::*;
    let kind = match normalize(type_name).as_str() {
        "testplan" => TestPlan,
        "threadgroup" => ThreadGroup,
        "httprequest" | "httpsampler" | "httprequestsampler" => HttpRequest,
        "httpdefaults" | "httprequestdefaults" => HttpDefaults,
        "headermanager" | "httpheadermanager" | "headers" => HeaderManager,
        "randomvariable" => RandomVariable,
        "csvdataset" | "csvdatasetconfig" | "dataset" => CsvDataSet,
        "assertion" | "responseassertion" => Assertion,
        "listener" => Listener,
        "viewresultstree" => return Some((Listener, Some(ListenerKind::ViewResultsTree))),
        "summaryreport" => return Some((Listener, Some(ListenerKind::SummaryReport))),
        "aggregatereport" => return Some((Listener, Some(ListenerKind::AggregateReport))),
        _ => return None,
    };
    Some((kind, None))
}

/// Splits `src` into components and checks that exactly one `TestPlan` exists.
pub fn tokenize(src: &str) -> Result<Tokens, TemplateParseError> {
    let mut reader = Reader::default();
    let mut lines = src.lines().enumerate().map(|(i, l)| (i + 1, l));

    while let Some((line_no, raw)) = lines.next() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with("//") {
            continue;
        }
        if line.starts_with('[') {
            reader.open_block(line_no, line)?;
            continue;
        }

        let (key, value) = match entry(line) {
            Ok((_, (key, value))) => (key.trim(), value.trim()),
            Err(_) if reader.current.is_none() => {
                return Err(TemplateParseError::ContentBeforeHeader { line: line_no });
            }
            Err(_) => {
                return Err(TemplateParseError::MalformedEntry {
                    line: line_no,
                    text: line.to_string(),
                });
            }
        };
        if reader.current.is_none() {
            return Err(TemplateParseError::ContentBeforeHeader { line: line_no });
        }
        if key.is_empty() {
            return Err(TemplateParseError::EmptyKey { line: line_no });
        }

        let value = if value == MULTILINE_FENCE {
            let mut body = Vec::new();
            loop {
                match lines.next() {
                    Some((_, l)) if l.trim() == MULTILINE_FENCE => break,
                    Some((_, l)) => body.push(l),
                    None => return Err(TemplateParseError::UnterminatedValue { line: line_no }),
                }
            }
            dedent(&body)
        } else {
            value.to_string()
        };
        reader.add_entry(line_no, key, value);
    }
    reader.close_block();

    check_single_root(&reader.components)?;
    log::debug!(
        "tokenized {} components ({} warnings)",
        reader.components.len(),
        reader.warnings.len()
    );
    Ok(Tokens {
        components: reader.components,
        warnings: reader.warnings,
    })
}

#[derive(Default)]
struct Reader {
    components: Vec<Component>,
    warnings: Vec<Warning>,
    current: Option<(Component, Option<ListenerKind>)>,
}

impl Reader {
    fn open_block(&mut self, line: usize, text: &str) -> Result<(), TemplateParseError> {
        let malformed = || TemplateParseError::MalformedHeader {
            line,
            text: text.to_string(),
        };
        let (_, (type_name, name)) = header(text).map_err(|_| malformed())?;
        let (type_name, name) = (type_name.trim(), name.trim());
        if type_name.is_empty() {
            return Err(malformed());
        }
        let (kind, listener) =
            block_kind(type_name).ok_or_else(|| TemplateParseError::UnknownBlockType {
                line,
                block_type: type_name.to_string(),
            })?;
        if name.is_empty() {
            return Err(TemplateParseError::EmptyBlockName { line });
        }

        self.close_block();
        self.current = Some((
            Component {
                kind,
                name: name.to_string(),
                params: IndexMap::new(),
                parent_name: None,
                line,
            },
            listener,
        ));
        Ok(())
    }

    fn add_entry(&mut self, line: usize, key: &str, value: String) {
        let Some((component, _)) = self.current.as_mut() else {
            return;
        };
        let wanted = normalize(key);
        let duplicate = if wanted == PARENT_KEY {
            component.parent_name.replace(value).is_some()
        } else if let Some(existing) = component
            .params
            .iter_mut()
            .find(|(k, _)| normalize(k) == wanted)
            .map(|(_, v)| v)
        {
            *existing = value;
            true
        } else {
            component.params.insert(key.to_string(), value);
            false
        };

        if duplicate {
            log::warn!("{} '{}': duplicate key '{}' on line {}", component.kind, component.name, key, line);
            self.warnings.push(Warning::DuplicateKey {
                kind: component.kind,
                component: component.name.clone(),
                key: key.to_string(),
                line,
            });
        }
    }

    fn close_block(&mut self) {
        if let Some((mut component, listener)) = self.current.take() {
            if let Some(kind) = listener {
                let has_kind = component.params.keys().any(|k| normalize(k) == "kind");
                if !has_kind {
                    component
                        .params
                        .insert("kind".to_string(), format!("{:?}", kind));
                }
            }
            self.components.push(component);
        }
    }
}

fn check_single_root(components: &[Component]) -> Result<(), TemplateParseError> {
    let mut roots = components.iter().filter(|c| c.kind.is_root());
    let first = roots.next().ok_or(TemplateParseError::MissingTestPlan)?;
    match roots.next() {
        Some(second) => Err(TemplateParseError::MultipleTestPlans {
            line: second.line,
            first_line: first.line,
        }),
        None => Ok(()),
    }
}

/// Removes the indentation shared by every non-blank line.
fn dedent(lines: &[&str]) -> String {
    let indent = lines
        .iter()
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.len() - l.trim_start().len())
        .min()
        .unwrap_or(0);
    lines
        .iter()
        .map(|l| l.get(indent..).unwrap_or_else(|| l.trim_start()))
        .collect::<Vec<_>>()
        .join("\n")
}

// --- Combinators ---

fn header(input: &str) -> IResult<&str, (&str, &str)> {
    terminated(
        delimited(
            char('['),
            separated_pair(
                take_till1(|c: char| c == ':' || c == ']'),
                char(':'),
                take_till(|c: char| c == ']'),
            ),
            char(']'),
        ),
        (space0, eof),
    )
    .parse(input)
}

fn entry(input: &str) -> IResult<&str, (&str, &str)> {
    separated_pair(take_till(|c: char| c == '='), char('='), rest).parse(input)
}
