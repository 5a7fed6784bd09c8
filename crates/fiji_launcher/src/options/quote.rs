//! Quote-aware splitting of option strings
//!
//! Both `'` and `"` open a quoted segment. Inside a segment a quote of the
//! other kind opens a nested segment which is kept literally, so
//! `"run('a b')"` unquotes to `run('a b')`.

use crate::error::LaunchError;

fn is_quote(c: u8) -> bool {
    c == b'\'' || c == b'"'
}

fn is_space(c: u8) -> bool {
    matches!(c, b' ' | b'\t' | b'\n' | b'\r')
}

/// Index of the quote closing the segment opened just before `start`.
///
/// Nested segments are tracked on a stack of pending quotes, innermost
/// last; an unclosed segment is reported at its opening quote.
fn find_closing_quote(text: &str, quote: u8, start: usize) -> Result<usize, LaunchError> {
    let bytes = text.as_bytes();
    let mut pending = vec![(quote, start - 1)];
    for (i, &c) in bytes.iter().enumerate().skip(start) {
        match pending.last() {
            Some(&(open, _)) if c == open => {
                pending.pop();
                if pending.is_empty() {
                    return Ok(i);
                }
            }
            _ if is_quote(c) => pending.push((c, i)),
            _ => {}
        }
    }
    let opening = pending.last().map_or(start - 1, |&(_, at)| at);
    Err(LaunchError::UnclosedQuote {
        text: text.to_string(),
        column: text[..opening].chars().count(),
    })
}

/// Scan `text`, stripping one level of quotes. `split` decides whether
/// unquoted whitespace separates options.
fn scan(text: &str, split: bool) -> Result<Vec<String>, LaunchError> {
    let bytes = text.as_bytes();
    let mut options = Vec::new();
    let mut current: Vec<u8> = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let c = bytes[i];
        if is_quote(c) {
            let end = find_closing_quote(text, c, i + 1)?;
            current.extend_from_slice(&bytes[i + 1..end]);
            i = end + 1;
            continue;
        }
        if split && is_space(c) {
            if !current.is_empty() {
                options.push(String::from_utf8_lossy(&current).into_owned());
                current.clear();
            }
        } else {
            current.push(c);
        }
        i += 1;
    }
    if !current.is_empty() || !split {
        options.push(String::from_utf8_lossy(&current).into_owned());
    }
    Ok(options)
}

/// Split a settings string into options on unquoted whitespace
pub fn split_options(text: &str) -> Result<Vec<String>, LaunchError> {
    scan(text, true)
}

/// Remove one level of quoting from a single value
pub fn unquote(text: &str) -> Result<String, LaunchError> {
    Ok(scan(text, false)?.pop().unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_on_whitespace() {
        let options = split_options("  -Xss4m\t-Dfoo=bar\n\n-verbose ").unwrap();
        assert_eq!(options, ["-Xss4m", "-Dfoo=bar", "-verbose"]);
    }

    #[test]
    fn test_quoted_segment_keeps_spaces() {
        let options = split_options("-Dname=\"a b\" 'c d'").unwrap();
        assert_eq!(options, ["-Dname=a b", "c d"]);
    }

    #[test]
    fn test_nested_quotes_kept_literally() {
        let options = split_options("\"run('Gaussian Blur', 'sigma=2')\"").unwrap();
        assert_eq!(options, ["run('Gaussian Blur', 'sigma=2')"]);
    }

    #[test]
    fn test_empty_quotes_produce_no_option() {
        assert!(split_options("\"\"").unwrap().is_empty());
    }

    #[test]
    fn test_unquote() {
        assert_eq!(unquote("\"Gaussian Blur\"").unwrap(), "Gaussian Blur");
        assert_eq!(unquote("plain").unwrap(), "plain");
        assert_eq!(unquote("a \"b c\" d").unwrap(), "a b c d");
        assert_eq!(unquote("").unwrap(), "");
    }

    #[test]
    fn test_unclosed_quote_reports_opening_column() {
        match unquote("ab\"cd") {
            Err(LaunchError::UnclosedQuote { text, column }) => {
                assert_eq!(text, "ab\"cd");
                assert_eq!(column, 2);
            }
            other => panic!("expected unclosed quote, got {other:?}"),
        }
    }

    #[test]
    fn test_unclosed_quote_column_counts_characters() {
        match unquote("été \"x") {
            Err(LaunchError::UnclosedQuote { column, .. }) => assert_eq!(column, 4),
            other => panic!("expected unclosed quote, got {other:?}"),
        }
    }

    #[test]
    fn test_deeply_nested_quotes() {
        let text = "\"'".repeat(200_000);
        match split_options(&text) {
            Err(LaunchError::UnclosedQuote { column, .. }) => assert_eq!(column, text.len() - 1),
            other => panic!("expected unclosed quote, got {:?}", other.map(|o| o.len())),
        }

        let closed = format!("{}{}", "\"'".repeat(1000), "'\"".repeat(1000));
        let options = split_options(&closed).unwrap();
        assert_eq!(options.len(), 1);
        assert_eq!(options[0].len(), closed.len() - 2);
    }

    #[test]
    fn test_unclosed_nested_quote() {
        assert!(matches!(
            split_options("\"a 'b\""),
            Err(LaunchError::UnclosedQuote { .. })
        ));
    }
}
