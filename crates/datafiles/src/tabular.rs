//! A `nom`-based reader for delimited tables with RFC 4180 style quoting.
use crate::error::FileError;
use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{tag, take_while},
    character::complete::{char, none_of},
    combinator::{eof, map, value},
    multi::fold_many0,
    sequence::delimited,
};
use serde::Serialize;

/// Delimiters tried when sniffing a header line, in order of preference.
const CANDIDATE_DELIMITERS: [char; 4] = [',', ';', '\t', '|'];

/// A parsed tabular parameter file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TabularFile {
    pub filename: String,
    pub headers: Vec<String>,
    pub sample_rows: Vec<Vec<String>>,
    pub total_rows: usize,
    #[serde(skip)]
    pub raw_content: String,
    pub delimiter: char,
}

impl TabularFile {
    /// Parses `text` into headers and rows.
    ///
    /// At most `sample_limit` rows are kept; `total_rows` counts all of them.
    pub fn parse(
        filename: &str,
        text: &str,
        delimiter: char,
        sample_limit: usize,
    ) -> Result<Self, FileError> {
        let mut records = parse_records(text, delimiter)?.into_iter();
        let headers = records
            .next()
            .map(|header| {
                header
                    .into_iter()
                    .map(|h| h.trim().to_string())
                    .filter(|h| !h.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        let mut sample_rows = Vec::new();
        let mut total_rows = 0;
        for row in records {
            if sample_rows.len() < sample_limit {
                sample_rows.push(row);
            }
            total_rows += 1;
        }

        Ok(Self {
            filename: filename.to_string(),
            headers,
            sample_rows,
            total_rows,
            raw_content: text.to_string(),
            delimiter,
        })
    }
}

/// Picks the delimiter of a `.csv` file from its first line.
///
/// Falls back to `,` when none of the candidates appear.
pub fn sniff_delimiter(text: &str) -> char {
    let header = text.lines().next().unwrap_or_default();
    let mut best = (',', 0);
    for candidate in CANDIDATE_DELIMITERS {
        let count = header.matches(candidate).count();
        if count > best.1 {
            best = (candidate, count);
        }
    }
    best.0
}

/// The first record after the header line, if there is one.
pub fn first_data_row(text: &str, delimiter: char) -> Option<Vec<String>> {
    parse_records(text, delimiter).ok()?.into_iter().nth(1)
}

/// Splits `text` into records. Blank lines are skipped.
pub fn parse_records(text: &str, delimiter: char) -> Result<Vec<Vec<String>>, FileError> {
    let mut records = Vec::new();
    let mut input = text;
    while !input.is_empty() {
        let (rest, fields) = record(input, delimiter).map_err(|_| malformed(text, input))?;
        let (rest, _) = line_end(rest).map_err(|_| malformed(text, rest))?;
        if !is_blank(&fields) {
            records.push(fields);
        }
        input = rest;
    }
    Ok(records)
}

fn is_blank(fields: &[String]) -> bool {
    fields.iter().all(|f| f.trim().is_empty())
}

fn malformed(text: &str, at: &str) -> FileError {
    let offset = text.len() - at.len();
    let line = text[..offset].matches('\n').count() + 1;
    let message = if at.starts_with('"') {
        "unterminated quoted field".to_string()
    } else {
        "unexpected input".to_string()
    };
    FileError::MalformedTable { line, message }
}

// --- Combinators ---

fn record(input: &str, delimiter: char) -> IResult<&str, Vec<String>> {
    let (mut input, first) = field(input, delimiter)?;
    let mut fields = vec![first];
    while let Some(rest) = input.strip_prefix(delimiter) {
        let (next, f) = field(rest, delimiter)?;
        fields.push(f);
        input = next;
    }
    Ok((input, fields))
}

fn field(input: &str, delimiter: char) -> IResult<&str, String> {
    let plain = move |c: char| c != delimiter && c != '\n' && c != '\r';
    if input.starts_with('"') {
        // Text after the closing quote is kept, as lenient CSV readers do.
        let (rest, quoted) = quoted_field(input)?;
        let (rest, tail) = take_while(plain).parse(rest)?;
        return Ok((rest, quoted + tail));
    }
    map(take_while(plain), str::to_string).parse(input)
}

fn quoted_field(input: &str) -> IResult<&str, String> {
    delimited(
        char('"'),
        fold_many0(
            alt((value('"', tag("\"\"")), none_of("\""))),
            String::new,
            |mut acc, c| {
                acc.push(c);
                acc
            },
        ),
        char('"'),
    )
    .parse(input)
}

fn line_end(input: &str) -> IResult<&str, &str> {
    alt((tag("\r\n"), tag("\n"), tag("\r"), eof)).parse(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headers_and_rows() {
        let table = TabularFile::parse("users.csv", " uid , name ,\nabc,Alice\ndef,Bob\n", ',', 5)
            .unwrap();
        assert_eq!(table.headers, vec!["uid", "name"]);
        assert_eq!(table.total_rows, 2);
        assert_eq!(table.sample_rows[0], vec!["abc", "Alice"]);
    }

    #[test]
    fn test_header_only_file() {
        let table = TabularFile::parse("empty.csv", "uid,name\n", ',', 5).unwrap();
        assert_eq!(table.headers, vec!["uid", "name"]);
        assert!(table.sample_rows.is_empty());
        assert_eq!(table.total_rows, 0);
    }

    #[test]
    fn test_sample_rows_are_capped() {
        let mut text = String::from("n\n");
        for i in 0..12 {
            text.push_str(&format!("{}\n", i));
        }
        let table = TabularFile::parse("n.csv", &text, ',', 5).unwrap();
        assert_eq!(table.sample_rows.len(), 5);
        assert_eq!(table.total_rows, 12);
    }

    #[test]
    fn test_quoted_fields() {
        let records = parse_records("a,b\n\"x, y\",\"say \"\"hi\"\"\"\r\n", ',').unwrap();
        assert_eq!(records[1], vec!["x, y", "say \"hi\""]);
    }

    #[test]
    fn test_quoted_field_spans_lines() {
        let records = parse_records("a,b\n\"line1\nline2\",z\n", ',').unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1][0], "line1\nline2");
    }

    #[test]
    fn test_blank_lines_are_skipped() {
        let records = parse_records("a\n\n1\n   \n2", ',').unwrap();
        assert_eq!(records, vec![vec!["a"], vec!["1"], vec!["2"]]);
    }

    #[test]
    fn test_unterminated_quote_is_reported_with_line() {
        let err = parse_records("a,b\n1,\"oops\n", ',').unwrap_err();
        assert!(matches!(err, FileError::MalformedTable { line: 2, .. }));
    }

    #[test]
    fn test_sniff_delimiter() {
        assert_eq!(sniff_delimiter("a;b;c\n1;2;3"), ';');
        assert_eq!(sniff_delimiter("a\tb\n"), '\t');
        assert_eq!(sniff_delimiter("single"), ',');
    }

    #[test]
    fn test_first_data_row() {
        assert_eq!(first_data_row("uid\nabc\n", ','), Some(vec!["abc".to_string()]));
        assert_eq!(first_data_row("uid\n", ','), None);
    }
}
