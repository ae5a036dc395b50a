use anyhow::{Context, Result};
use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};

/// Read a pulse-count sequence from a file.
///
/// One integer per line; lines whose first character is `#` are skipped.
pub fn read_counts<P: AsRef<Path>>(file: P) -> Result<Vec<i64>> {
    let file = file.as_ref();
    let file = File::open(file).with_context(|| format!("failed to open {file:?}"))?;
    let reader = BufReader::new(file);

    parse_counts(reader)
}

/// Parse a pulse-count sequence from any buffered reader.
///
/// Comment detection inspects only the first character of a line, so
/// inline comments after a value are not supported.
pub fn parse_counts<R: BufRead>(reader: R) -> Result<Vec<i64>> {
    let mut counts = Vec::new();

    for (i_line, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("failed to read line {}", i_line + 1))?;
        if line.starts_with('#') {
            continue;
        }

        let count = line
            .trim()
            .parse()
            .with_context(|| format!("invalid pulse count on line {}", i_line + 1))?;
        counts.push(count);
    }

    Ok(counts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn comment_lines_are_skipped() {
        let input = "#comment\n10\n20\n#skip\n30\n";
        let counts = parse_counts(Cursor::new(input)).expect("failed to parse counts");
        assert_eq!(counts, vec![10, 20, 30]);
    }

    #[test]
    fn trailing_whitespace_is_tolerated() {
        let input = "10 \n20\t\n30\n";
        let counts = parse_counts(Cursor::new(input)).expect("failed to parse counts");
        assert_eq!(counts, vec![10, 20, 30]);
    }

    #[test]
    fn non_integer_line_is_an_error() {
        let input = "10\nforty\n30\n";
        let error = parse_counts(Cursor::new(input)).unwrap_err();
        assert!(error.to_string().contains("line 2"));
    }

    #[test]
    fn inline_comments_are_not_supported() {
        let input = "10 # ten\n";
        assert!(parse_counts(Cursor::new(input)).is_err());
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(read_counts("no_such_file.txt").is_err());
    }
}
