//! `name=value` line files shared by the output and state stores
//!
//! Values containing a newline use the heredoc form
//! `name<<DELIM\nvalue\nDELIM`, the same convention CI runners use for
//! their output and state files.

use crate::error::StateError;

pub(crate) fn format_entry(name: &str, value: &str) -> Result<String, StateError> {
    if name.is_empty() || name.contains('=') || name.contains('\n') || name.contains("<<") {
        return Err(StateError::Format(format!("invalid entry name '{}'", name)));
    }

    if !value.contains('\n') && !value.contains('\r') {
        return Ok(format!("{}={}\n", name, value));
    }

    let delimiter = format!("ghadelimiter_{}", uuid::Uuid::new_v4());
    Ok(format!("{}<<{}\n{}\n{}\n", name, delimiter, value, delimiter))
}

pub(crate) fn parse_entries(text: &str) -> Result<Vec<(String, String)>, StateError> {
    let mut entries = Vec::new();
    let mut lines = text.lines();

    while let Some(line) = lines.next() {
        if line.trim().is_empty() {
            continue;
        }

        if let Some((name, delimiter)) = heredoc_header(line) {
            let mut body: Vec<&str> = Vec::new();
            let mut closed = false;
            for next in lines.by_ref() {
                if next == delimiter {
                    closed = true;
                    break;
                }
                body.push(next);
            }
            if !closed {
                return Err(StateError::Format(format!(
                    "unterminated value for '{}' (missing delimiter {})",
                    name, delimiter
                )));
            }
            entries.push((name.to_string(), body.join("\n")));
            continue;
        }

        match line.split_once('=') {
            Some((name, value)) => entries.push((name.to_string(), value.to_string())),
            None => {
                return Err(StateError::Format(format!("malformed line: '{}'", line)));
            }
        }
    }

    Ok(entries)
}

fn heredoc_header(line: &str) -> Option<(&str, &str)> {
    let (name, delimiter) = line.split_once("<<")?;
    if name.contains('=') || delimiter.is_empty() {
        return None;
    }
    Some((name, delimiter))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_line_entry() {
        assert_eq!(format_entry("service_id", "abc").unwrap(), "service_id=abc\n");
    }

    #[test]
    fn test_multiline_entry_uses_heredoc() {
        let entry = format_entry("note", "line one\nline two").unwrap();
        assert!(entry.starts_with("note<<ghadelimiter_"));
        let parsed = parse_entries(&entry).unwrap();
        assert_eq!(parsed, vec![("note".to_string(), "line one\nline two".to_string())]);
    }

    #[test]
    fn test_invalid_names_are_rejected() {
        assert!(format_entry("", "v").is_err());
        assert!(format_entry("a=b", "v").is_err());
    }

    #[test]
    fn test_value_may_contain_equals() {
        let parsed = parse_entries("api_key=pk:sk==\n").unwrap();
        assert_eq!(parsed, vec![("api_key".to_string(), "pk:sk==".to_string())]);
    }

    #[test]
    fn test_malformed_line_is_an_error() {
        assert!(parse_entries("just some text\n").is_err());
        assert!(parse_entries("x<<EOF\nno end\n").is_err());
    }
}
