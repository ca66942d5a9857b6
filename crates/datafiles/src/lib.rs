//! Auxiliary file processing for the loadplan compiler.
//!
//! Uploaded files are dispatched on their extension:
//!
//! - `.csv` / `.tsv`: [`TabularFile`] (headers, sample rows, raw text)
//! - `.json`: [`FragmentFile`] (parsed body and its `${name}` variables)
//! - `.txt` / `.log`: [`TextFile`] summaries
//!
//! A file that cannot be used yields a [`FileIssue`] and never stops the
//! remaining files from being processed.

pub mod decode;
pub mod error;
pub mod fragment;
pub mod tabular;
pub mod text;

pub use error::FileError;
pub use fragment::{FragmentFile, scan_variables};
pub use tabular::{TabularFile, first_data_row, parse_records, sniff_delimiter};
pub use text::TextFile;

use indexmap::IndexMap;
use loadplan_types::{Warning, basename};
use serde::Serialize;

/// Default upper bound on the size of a single upload.
pub const DEFAULT_MAX_FILE_SIZE: usize = 10 * 1024 * 1024;
/// Default number of data rows kept in [`TabularFile::sample_rows`].
pub const DEFAULT_SAMPLE_ROWS: usize = 5;

/// A file uploaded next to the template, as raw bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuxiliaryFile {
    pub filename: String,
    pub content: Vec<u8>,
}

impl AuxiliaryFile {
    pub fn new(filename: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: filename.into(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessorOptions {
    pub max_file_size: usize,
    pub sample_rows: usize,
}

impl Default for ProcessorOptions {
    fn default() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            sample_rows: DEFAULT_SAMPLE_ROWS,
        }
    }
}

/// A file that was skipped, and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileIssue {
    pub filename: String,
    pub reason: String,
}

/// Everything learned from the uploaded files, keyed by filename in upload order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProcessedFiles {
    pub tabular: IndexMap<String, TabularFile>,
    pub fragments: IndexMap<String, FragmentFile>,
    pub texts: IndexMap<String, TextFile>,
    pub issues: Vec<FileIssue>,
}

impl ProcessedFiles {
    /// Looks up a tabular file by exact name, then by basename.
    pub fn tabular(&self, filename: &str) -> Option<&TabularFile> {
        lookup(&self.tabular, filename)
    }

    /// Looks up a fragment by exact name, then by basename.
    pub fn fragment(&self, filename: &str) -> Option<&FragmentFile> {
        lookup(&self.fragments, filename)
    }

    /// One [`Warning::FileProcessing`] per issue.
    pub fn warnings(&self) -> Vec<Warning> {
        self.issues
            .iter()
            .map(|issue| Warning::FileProcessing {
                filename: issue.filename.clone(),
                reason: issue.reason.clone(),
            })
            .collect()
    }
}

fn lookup<'a, T>(map: &'a IndexMap<String, T>, filename: &str) -> Option<&'a T> {
    if let Some(found) = map.get(filename) {
        return Some(found);
    }
    let wanted = basename(filename);
    map.iter()
        .find(|(name, _)| basename(name) == wanted)
        .map(|(_, file)| file)
}

enum FileKind {
    Tabular(Option<char>),
    Fragment,
    Text,
}

fn classify(filename: &str) -> Result<FileKind, FileError> {
    let extension = basename(filename)
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "csv" => Ok(FileKind::Tabular(None)),
        "tsv" => Ok(FileKind::Tabular(Some('\t'))),
        "json" => Ok(FileKind::Fragment),
        "txt" | "log" => Ok(FileKind::Text),
        _ => Err(FileError::Unsupported(extension)),
    }
}

/// Processes every upload. Failures are recorded per file in
/// [`ProcessedFiles::issues`].
pub fn process_files(files: &[AuxiliaryFile], options: &ProcessorOptions) -> ProcessedFiles {
    let mut processed = ProcessedFiles::default();
    for file in files {
        if let Err(e) = process_one(file, options, &mut processed) {
            log::warn!("skipping '{}': {}", file.filename, e);
            processed.issues.push(FileIssue {
                filename: file.filename.clone(),
                reason: e.to_string(),
            });
        }
    }
    log::debug!(
        "processed {} files: {} tabular, {} fragments, {} text, {} issues",
        files.len(),
        processed.tabular.len(),
        processed.fragments.len(),
        processed.texts.len(),
        processed.issues.len()
    );
    processed
}

fn process_one(
    file: &AuxiliaryFile,
    options: &ProcessorOptions,
    processed: &mut ProcessedFiles,
) -> Result<(), FileError> {
    let kind = classify(&file.filename)?;
    if file.content.len() > options.max_file_size {
        return Err(FileError::TooLarge {
            size: file.content.len(),
            limit: options.max_file_size,
        });
    }
    let text = decode::decode_text(&file.filename, &file.content);
    if text.trim().is_empty() {
        return Err(FileError::Empty);
    }

    let name = file.filename.clone();
    match kind {
        FileKind::Tabular(delimiter) => {
            let delimiter = delimiter.unwrap_or_else(|| sniff_delimiter(&text));
            let table = TabularFile::parse(&name, &text, delimiter, options.sample_rows)?;
            processed.tabular.insert(name, table);
        }
        FileKind::Fragment => {
            processed
                .fragments
                .insert(name.clone(), FragmentFile::parse(&name, &text));
        }
        FileKind::Text => {
            let text = decode::strip_control_chars(&text);
            processed
                .texts
                .insert(name.clone(), TextFile::summarize(&name, &text));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn process(files: &[AuxiliaryFile]) -> ProcessedFiles {
        process_files(files, &ProcessorOptions::default())
    }

    #[test]
    fn test_dispatch_by_extension() {
        let processed = process(&[
            AuxiliaryFile::new("users.CSV", "uid\nabc\n"),
            AuxiliaryFile::new("scores.tsv", "a\tb\n1\t2\n"),
            AuxiliaryFile::new("body.json", "{\"uid\": \"${uid}\"}"),
            AuxiliaryFile::new("notes.txt", "hello\n"),
        ]);
        assert!(processed.issues.is_empty());
        assert_eq!(processed.tabular.len(), 2);
        assert_eq!(processed.tabular["scores.tsv"].headers, vec!["a", "b"]);
        assert_eq!(processed.fragments["body.json"].variables, vec!["uid"]);
        assert_eq!(processed.texts["notes.txt"].line_count, 1);
    }

    #[test]
    fn test_one_bad_file_does_not_stop_the_rest() {
        let processed = process(&[
            AuxiliaryFile::new("image.png", vec![0x89, 0x50]),
            AuxiliaryFile::new("empty.csv", ""),
            AuxiliaryFile::new("broken.csv", "a,b\n\"open,1\n"),
            AuxiliaryFile::new("users.csv", "uid\nabc\n"),
        ]);
        assert_eq!(processed.issues.len(), 3);
        assert!(processed.issues[0].reason.contains("unsupported"));
        assert_eq!(processed.issues[1].reason, "file is empty");
        assert!(processed.tabular.contains_key("users.csv"));
        assert_eq!(processed.warnings().len(), 3);
    }

    #[test]
    fn test_size_limit() {
        let options = ProcessorOptions {
            max_file_size: 4,
            ..ProcessorOptions::default()
        };
        let processed = process_files(&[AuxiliaryFile::new("a.csv", "uid\nabc\n")], &options);
        assert!(processed.tabular.is_empty());
        assert!(processed.issues[0].reason.contains("larger than"));
    }

    #[test]
    fn test_lookup_falls_back_to_basename() {
        let processed = process(&[AuxiliaryFile::new("uploads/users.csv", "uid\nabc\n")]);
        assert!(processed.tabular("uploads/users.csv").is_some());
        assert!(processed.tabular("users.csv").is_some());
        assert!(processed.tabular("data/users.csv").is_some());
        assert!(processed.tabular("other.csv").is_none());
    }

    #[test]
    fn test_csv_delimiter_is_sniffed() {
        let processed = process(&[AuxiliaryFile::new("semi.csv", "id;name\n1;x\n")]);
        let table = &processed.tabular["semi.csv"];
        assert_eq!(table.delimiter, ';');
        assert_eq!(table.headers, vec!["id", "name"]);
    }
}
