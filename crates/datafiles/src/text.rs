use serde::Serialize;

const PREVIEW_LINES: usize = 10;

/// A summary of a plain text or log upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextFile {
    pub filename: String,
    pub line_count: usize,
    pub non_empty_lines: usize,
    pub preview_lines: Vec<String>,
}

impl TextFile {
    pub fn summarize(filename: &str, text: &str) -> Self {
        let mut line_count = 0;
        let mut non_empty_lines = 0;
        let mut preview_lines = Vec::new();
        for line in text.lines() {
            line_count += 1;
            if !line.trim().is_empty() {
                non_empty_lines += 1;
            }
            if preview_lines.len() < PREVIEW_LINES {
                preview_lines.push(line.to_string());
            }
        }
        Self {
            filename: filename.to_string(),
            line_count,
            non_empty_lines,
            preview_lines,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_counts() {
        let text = (1..=15).map(|i| if i % 4 == 0 { String::new() } else { format!("line {}", i) });
        let text: Vec<String> = text.collect();
        let summary = TextFile::summarize("run.log", &text.join("\n"));
        assert_eq!(summary.line_count, 15);
        assert_eq!(summary.non_empty_lines, 12);
        assert_eq!(summary.preview_lines.len(), 10);
        assert_eq!(summary.preview_lines[0], "line 1");
    }
}
