//! Joins a parsed template with the processed uploads.
//!
//! Data sets receive their file's headers and content, body files are
//! checked and optionally inlined, and embedded bodies are parameterized
//! against the data sets of their thread group.
use crate::config::CompilerConfig;
use crate::error::{CompileError, ContextError};
use loadplan_datafiles::ProcessedFiles;
use loadplan_param::parameterize;
use loadplan_types::{
    BodySource, DataSetSpec, GenerationContext, HttpRequestSpec, ThreadGroupContext, Warning,
};

/// Completes `context` against `files`.
pub fn build_context(
    mut context: GenerationContext,
    files: &ProcessedFiles,
    config: &CompilerConfig,
) -> Result<(GenerationContext, Vec<Warning>), CompileError> {
    let mut warnings = Vec::new();

    for group in &mut context.thread_groups {
        if config.pair_files_by_name {
            pair_by_name(group, files);
        }
        for data_set in &mut group.data_sets {
            join_data_set(data_set, files, &mut warnings);
        }
        for request in &mut group.http_requests {
            resolve_body_file(request, files, &mut warnings);
        }
    }

    check_server_addresses(&context)?;

    for group in &mut context.thread_groups {
        parameterize_bodies(group)?;
    }

    log::debug!(
        "context built: {} data sets joined, {} warnings",
        context
            .thread_groups
            .iter()
            .flat_map(|g| &g.data_sets)
            .filter(|d| d.raw_content.is_some())
            .count(),
        warnings.len()
    );
    Ok((context, warnings))
}

fn pair_by_name(group: &mut ThreadGroupContext, files: &ProcessedFiles) {
    if group.data_sets.is_empty() {
        if let Some(table) = files.tabular(&format!("{}.csv", group.name)) {
            log::info!("pairing '{}' with thread group '{}'", table.filename, group.name);
            let mut data_set =
                DataSetSpec::for_file(format!("{} Data", group.name), table.filename.clone());
            data_set.delimiter = String::new();
            group.data_sets.push(data_set);
        }
    }
    for request in &mut group.http_requests {
        if request.body.is_some() {
            continue;
        }
        if let Some(fragment) = files.fragment(&format!("{}.json", request.name)) {
            log::info!("pairing '{}' with request '{}'", fragment.filename, request.name);
            request.body = Some(BodySource::Embedded(fragment.raw_content.clone()));
        }
    }
}

fn join_data_set(data_set: &mut DataSetSpec, files: &ProcessedFiles, warnings: &mut Vec<Warning>) {
    match files.tabular(&data_set.filename) {
        Some(table) => {
            if data_set.variable_names.is_empty() {
                data_set.variable_names = table.headers.clone();
            }
            if data_set.delimiter.is_empty() {
                data_set.delimiter = table.delimiter.to_string();
            }
            data_set.raw_content = Some(table.raw_content.clone());
        }
        None => {
            log::warn!(
                "data set '{}' references '{}', which was not uploaded",
                data_set.name,
                data_set.filename
            );
            warnings.push(Warning::MissingAuxiliaryFile {
                filename: data_set.filename.clone(),
                referenced_by: data_set.name.clone(),
            });
            if data_set.delimiter.is_empty() {
                data_set.delimiter = ",".to_string();
            }
        }
    }
}

fn resolve_body_file(request: &mut HttpRequestSpec, files: &ProcessedFiles, warnings: &mut Vec<Warning>) {
    let Some(BodySource::FileReference(filename)) = &request.body else {
        return;
    };
    match files.fragment(filename) {
        Some(fragment) if request.inline_body_file => {
            request.body = Some(BodySource::Embedded(fragment.raw_content.clone()));
        }
        Some(_) => {}
        None => {
            log::warn!(
                "request '{}' references body file '{}', which was not uploaded",
                request.name,
                filename
            );
            warnings.push(Warning::MissingAuxiliaryFile {
                filename: filename.clone(),
                referenced_by: request.name.clone(),
            });
            request.body = None;
        }
    }
}

fn check_server_addresses(context: &GenerationContext) -> Result<(), ContextError> {
    let has_default = context
        .global_http_defaults
        .as_ref()
        .is_some_and(|d| !d.domain.trim().is_empty());
    if has_default {
        return Ok(());
    }
    for group in &context.thread_groups {
        if let Some(request) = group.http_requests.iter().find(|r| r.domain.trim().is_empty()) {
            return Err(ContextError::MissingServerAddress {
                request: request.name.clone(),
                thread_group: group.name.clone(),
            });
        }
    }
    Ok(())
}

fn parameterize_bodies(group: &mut ThreadGroupContext) -> Result<(), CompileError> {
    let mut used = vec![false; group.data_sets.len()];
    for request in &mut group.http_requests {
        let Some(BodySource::Embedded(body)) = &request.body else {
            continue;
        };
        let mut body = body.clone();
        for (i, data_set) in group.data_sets.iter().enumerate() {
            let result = parameterize(&body, data_set)?;
            if result.used {
                used[i] = true;
            }
            if !result.replacements.is_empty() {
                log::debug!(
                    "request '{}': {} values parameterized from '{}'",
                    request.name,
                    result.replacements.len(),
                    data_set.name
                );
            }
            body = result.body;
        }
        request.body = Some(BodySource::Embedded(body));
    }
    for (data_set, used) in group.data_sets.iter_mut().zip(used) {
        if used {
            data_set.ignore_first_line = true;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use loadplan_datafiles::{AuxiliaryFile, ProcessorOptions, process_files};
    use loadplan_dsl::parse_template;

    fn build(
        template: &str,
        uploads: &[AuxiliaryFile],
        config: &CompilerConfig,
    ) -> Result<(GenerationContext, Vec<Warning>), CompileError> {
        let files = process_files(uploads, &ProcessorOptions::default());
        let parsed = parse_template(template)?;
        build_context(parsed.context, &files, config)
    }

    const USERS: &str = "[TestPlan: P]\n[HttpDefaults: D]\ndomain = api.test\n\
                         [ThreadGroup: TG1]\n[CsvDataSet: Users]\nfilename = users.csv\n\
                         [HttpRequest: R1]\nmethod = POST\nbody = {\"uid\": \"u-1\"}\n";

    #[test]
    fn test_data_set_is_joined_and_used() {
        let uploads = [AuxiliaryFile::new("users.csv", "uid;name\nu-1;Ann\n")];
        let (context, warnings) = build(USERS, &uploads, &CompilerConfig::default()).unwrap();
        assert!(warnings.is_empty(), "{:?}", warnings);

        let group = &context.thread_groups[0];
        let data_set = &group.data_sets[0];
        assert_eq!(data_set.variable_names, vec!["uid", "name"]);
        assert_eq!(data_set.delimiter, ";");
        assert!(data_set.ignore_first_line);
        assert_eq!(
            group.http_requests[0].body,
            Some(BodySource::Embedded("{\n    \"uid\": \"${uid}\"\n}".into()))
        );
    }

    #[test]
    fn test_form_body_still_uses_data_set() {
        let template = USERS.replace("body = {\"uid\": \"u-1\"}", "body = uid=u-1&x=1");
        let uploads = [AuxiliaryFile::new("users.csv", "uid\nu-1\n")];
        let (context, _) = build(&template, &uploads, &CompilerConfig::default()).unwrap();
        let group = &context.thread_groups[0];
        assert!(group.data_sets[0].ignore_first_line);
        assert_eq!(
            group.http_requests[0].body,
            Some(BodySource::Embedded("uid=u-1&x=1".into()))
        );
    }

    #[test]
    fn test_missing_data_file_is_a_warning() {
        let (context, warnings) = build(USERS, &[], &CompilerConfig::default()).unwrap();
        assert_eq!(
            warnings,
            vec![Warning::MissingAuxiliaryFile {
                filename: "users.csv".into(),
                referenced_by: "Users".into(),
            }]
        );
        let group = &context.thread_groups[0];
        assert_eq!(group.data_sets[0].delimiter, ",");
        assert!(!group.data_sets[0].ignore_first_line);
        assert_eq!(
            group.http_requests[0].body,
            Some(BodySource::Embedded("{\"uid\": \"u-1\"}".into()))
        );
    }

    #[test]
    fn test_template_variable_names_win() {
        let template = USERS.replace("filename = users.csv", "filename = users.csv\nvariableNames = id,label");
        let uploads = [AuxiliaryFile::new("users.csv", "uid,name\nu-1,Ann\n")];
        let (context, _) = build(&template, &uploads, &CompilerConfig::default()).unwrap();
        let group = &context.thread_groups[0];
        assert_eq!(group.data_sets[0].variable_names, vec!["id", "label"]);
        assert_eq!(
            group.http_requests[0].body,
            Some(BodySource::Embedded("{\n    \"uid\": \"${id}\"\n}".into()))
        );
    }

    #[test]
    fn test_body_files() {
        let template = "[TestPlan: P]\n[ThreadGroup: TG]\n\
                        [HttpRequest: Ref]\ndomain = h\nbodyFile = order.json\n\
                        [HttpRequest: Inline]\ndomain = h\nbodyFile = order.json\nbodyMode = inline\n\
                        [HttpRequest: Lost]\ndomain = h\nbodyFile = gone.json\n";
        let uploads = [AuxiliaryFile::new("order.json", "{\"qty\": 1}")];
        let (context, warnings) = build(template, &uploads, &CompilerConfig::default()).unwrap();
        let requests = &context.thread_groups[0].http_requests;
        assert_eq!(requests[0].body, Some(BodySource::FileReference("order.json".into())));
        assert_eq!(requests[1].body, Some(BodySource::Embedded("{\"qty\": 1}".into())));
        assert_eq!(requests[2].body, None);
        assert_eq!(
            warnings,
            vec![Warning::MissingAuxiliaryFile {
                filename: "gone.json".into(),
                referenced_by: "Lost".into(),
            }]
        );
    }

    #[test]
    fn test_files_paired_by_name() {
        let template = "[TestPlan: P]\n[ThreadGroup: Shoppers]\n[HttpRequest: Login]\ndomain = h\nmethod = POST\n";
        let uploads = [
            AuxiliaryFile::new("Shoppers.csv", "user\tpass\nann\tsecret\n"),
            AuxiliaryFile::new("Login.json", "{\"user\": \"ann\"}"),
        ];

        let (context, _) = build(template, &uploads, &CompilerConfig::default()).unwrap();
        let group = &context.thread_groups[0];
        assert_eq!(group.data_sets.len(), 1);
        assert_eq!(group.data_sets[0].name, "Shoppers Data");
        assert_eq!(group.data_sets[0].delimiter, "\t");
        assert_eq!(
            group.http_requests[0].body,
            Some(BodySource::Embedded("{\n    \"user\": \"${user}\"\n}".into()))
        );

        let unpaired = CompilerConfig {
            pair_files_by_name: false,
            ..CompilerConfig::default()
        };
        let (context, _) = build(template, &uploads, &unpaired).unwrap();
        assert!(context.thread_groups[0].data_sets.is_empty());
        assert_eq!(context.thread_groups[0].http_requests[0].body, None);
    }

    #[test]
    fn test_missing_server_address() {
        let template = "[TestPlan: P]\n[ThreadGroup: TG]\n[HttpRequest: R]\npath = /x\n";
        let err = build(template, &[], &CompilerConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            CompileError::Context(ContextError::MissingServerAddress { ref request, ref thread_group })
                if request == "R" && thread_group == "TG"
        ));
    }
}
