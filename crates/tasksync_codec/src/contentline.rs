//! Content-line lexing shared by iCalendar (RFC 5545) and vCard (RFC 6350).
//!
//! A payload is first unfolded into logical lines, then each logical line is
//! split into `NAME *(;PARAM=VALUE) : VALUE`. Names are case-insensitive and
//! are normalized to upper case here.

use crate::error::{CodecError, CodecResult};

/// A parameter attached to a content line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    /// Upper-cased parameter name.
    pub name: String,
    /// Parameter values, with surrounding quotes removed.
    pub values: Vec<String>,
}

/// One logical content line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentLine {
    /// Upper-cased property name, without any vCard group prefix.
    pub name: String,
    /// Parameters in the order they appeared.
    pub params: Vec<Parameter>,
    /// Raw (still escaped) value.
    pub value: String,
}

impl ContentLine {
    /// Returns the first value of the named parameter.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
            .and_then(|p| p.values.first())
            .map(String::as_str)
    }

    /// Returns the value with TEXT escapes resolved.
    pub fn text(&self) -> String {
        unescape_text(&self.value)
    }
}

/// Unfolds a payload into logical lines.
///
/// Returns `(line_number, line)` pairs where `line_number` is the 1-based
/// physical line the logical line started on. Blank lines are dropped.
pub fn unfold(input: &str) -> Vec<(usize, String)> {
    let mut lines: Vec<(usize, String)> = Vec::new();

    for (idx, raw) in input.split('\n').enumerate() {
        let raw = raw.strip_suffix('\r').unwrap_or(raw);

        if let Some(rest) = raw.strip_prefix(|c: char| c == ' ' || c == '\t') {
            if let Some((_, last)) = lines.last_mut() {
                last.push_str(rest);
                continue;
            }
        }

        lines.push((idx + 1, raw.to_string()));
    }

    lines.retain(|(_, line)| !line.trim().is_empty());
    lines
}

/// Parses one logical line.
pub fn parse_line(line: &str, line_no: usize) -> CodecResult<ContentLine> {
    let bytes = line.as_bytes();
    let mut pos = 0;

    while pos < bytes.len() && bytes[pos] != b';' && bytes[pos] != b':' {
        pos += 1;
    }
    if pos == bytes.len() {
        return Err(CodecError::malformed_line(line_no, "missing ':' separator"));
    }

    let raw_name = line[..pos].trim();
    if raw_name.is_empty() {
        return Err(CodecError::malformed_line(line_no, "empty property name"));
    }
    // vCard groups ("item1.EMAIL") carry no meaning for us.
    let name = raw_name
        .rsplit('.')
        .next()
        .unwrap_or(raw_name)
        .to_ascii_uppercase();

    let mut params = Vec::new();
    while bytes[pos] == b';' {
        pos += 1;
        let start = pos;
        while pos < bytes.len() && !matches!(bytes[pos], b'=' | b';' | b':') {
            pos += 1;
        }
        if pos == bytes.len() {
            return Err(CodecError::malformed_line(line_no, "unterminated parameter"));
        }

        let param_name = line[start..pos].trim().to_ascii_uppercase();
        if bytes[pos] != b'=' {
            // vCard 2.1 bare parameter, e.g. "TEL;CELL:..."
            if !param_name.is_empty() {
                params.push(Parameter {
                    name: "TYPE".to_string(),
                    values: vec![param_name],
                });
            }
            continue;
        }
        pos += 1;

        let mut values = Vec::new();
        loop {
            if pos < bytes.len() && bytes[pos] == b'"' {
                let start = pos + 1;
                let end = line[start..]
                    .find('"')
                    .map(|i| start + i)
                    .ok_or_else(|| {
                        CodecError::malformed_line(line_no, "unterminated quoted parameter value")
                    })?;
                values.push(line[start..end].to_string());
                pos = end + 1;
            } else {
                let start = pos;
                while pos < bytes.len() && !matches!(bytes[pos], b',' | b';' | b':') {
                    pos += 1;
                }
                values.push(line[start..pos].to_string());
            }

            if pos >= bytes.len() {
                return Err(CodecError::malformed_line(line_no, "unterminated parameter"));
            }
            if bytes[pos] == b',' {
                pos += 1;
                continue;
            }
            break;
        }

        params.push(Parameter {
            name: param_name,
            values,
        });
    }

    if bytes[pos] != b':' {
        return Err(CodecError::malformed_line(
            line_no,
            format!("unexpected character '{}' after parameter", bytes[pos] as char),
        ));
    }

    Ok(ContentLine {
        name,
        params,
        value: line[pos + 1..].to_string(),
    })
}

/// Resolves TEXT escapes (`\n`, `\N`, `\,`, `\;`, `\\`).
pub fn unescape_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') | Some('N') => out.push('\n'),
            Some(',') => out.push(','),
            Some(';') => out.push(';'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }

    out
}

/// Splits a TEXT list on unescaped commas and unescapes each element.
pub fn split_list(value: &str) -> Vec<String> {
    let mut items = Vec::new();
    let mut current = String::new();
    let mut escaped = false;

    for c in value.chars() {
        if escaped {
            current.push('\\');
            current.push(c);
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == ',' {
            items.push(unescape_text(&current));
            current.clear();
        } else {
            current.push(c);
        }
    }
    if escaped {
        current.push('\\');
    }
    items.push(unescape_text(&current));

    items.retain(|s| !s.is_empty());
    items
}
