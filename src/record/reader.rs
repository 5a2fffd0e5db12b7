use super::LogRecord;
use crate::filter::FilterError;
use std::io::BufRead;

/// Lazily read records from a JSON-lines source.
///
/// Blank lines are skipped. A line that fails to decode yields
/// `FilterError::InvalidRecord` naming the 1-indexed line; reading continues
/// if the consumer keeps pulling.
///
/// Records that carry no `source` get `source`, and records that carry no
/// `lineNumber` get their physical line, so every record read here has a
/// distinct identity.
pub fn read_json_lines<R: BufRead>(
    source: impl Into<String>,
    reader: R,
) -> impl Iterator<Item = Result<LogRecord, FilterError>> {
    let source = source.into();
    reader
        .lines()
        .enumerate()
        .filter_map(move |(idx, line)| {
            let line_number = idx + 1;
            match line {
                Ok(line) if line.trim().is_empty() => None,
                Ok(line) => Some(
                    serde_json::from_str::<LogRecord>(&line)
                        .map(|mut record| {
                            if record.source.is_empty() {
                                record.source = source.clone();
                            }
                            if record.line_number == 0 {
                                record.line_number = line_number;
                            }
                            record
                        })
                        .map_err(|e| FilterError::InvalidRecord {
                            line: line_number,
                            reason: e.to_string(),
                        }),
                ),
                Err(e) => Some(Err(FilterError::InvalidRecord {
                    line: line_number,
                    reason: e.to_string(),
                })),
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_reads_records_and_skips_blank_lines() {
        let input = concat!(
            r#"{"source":"app.log","lineNumber":1,"timestamp":"2026-01-01T00:00:00Z","level":"INFO","message":"started","node":"web-1"}"#,
            "\n\n",
            r#"{"source":"app.log","lineNumber":2,"timestamp":"2026-01-01T00:00:01Z","level":"ERROR","message":"boom","processId":42}"#,
            "\n"
        );

        let records: Vec<_> = read_json_lines("app.log", Cursor::new(input))
            .collect::<Result<_, _>>()
            .expect("valid records");

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].node, "web-1");
        assert_eq!(records[1].process_id, Some(42));
        assert_eq!(records[1].username, None);
    }

    #[test]
    fn test_malformed_line_reports_line_number() {
        let input = "{\"not\": \"a record\"}\n";
        let err = read_json_lines("app.log", Cursor::new(input))
            .next()
            .expect("one item")
            .expect_err("should fail");

        match err {
            FilterError::InvalidRecord { line, .. } => assert_eq!(line, 1),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_fills_missing_identity_from_source_and_line() {
        let input = concat!(
            r#"{"timestamp":"2026-01-01T00:00:00Z","level":"INFO","message":"a"}"#,
            "\n\n",
            r#"{"timestamp":"2026-01-01T00:00:01Z","level":"INFO","message":"b"}"#,
            "\n",
            r#"{"source":"other.log","lineNumber":7,"timestamp":"2026-01-01T00:00:02Z","level":"INFO","message":"c"}"#,
            "\n"
        );

        let records: Vec<_> = read_json_lines("input.jsonl", Cursor::new(input))
            .collect::<Result<_, _>>()
            .expect("valid records");

        let keys: Vec<String> = records.iter().map(|r| r.key().to_string()).collect();
        assert_eq!(keys, vec!["input.jsonl:1", "input.jsonl:3", "other.log:7"]);
    }
}
