//! Component tree built from BEGIN/END content lines.

use crate::contentline::{parse_line, unfold, ContentLine};
use crate::error::{CodecError, CodecResult};

/// A parsed component such as `VCALENDAR`, `VTODO` or `VCARD`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Component {
    /// Upper-cased component name.
    pub name: String,
    /// Properties in document order.
    pub properties: Vec<ContentLine>,
    /// Nested components.
    pub children: Vec<Component>,
}

impl Component {
    /// Parses every top-level component of a payload.
    ///
    /// An empty (or whitespace-only) payload yields an empty list.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload is not UTF-8, if a line is malformed,
    /// or if BEGIN/END lines do not nest.
    pub fn parse_all(payload: &[u8]) -> CodecResult<Vec<Component>> {
        let text = std::str::from_utf8(payload).map_err(|_| CodecError::InvalidUtf8)?;
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);

        let mut roots = Vec::new();
        let mut stack: Vec<Component> = Vec::new();

        for (line_no, raw) in unfold(text) {
            let line = parse_line(&raw, line_no)?;

            match line.name.as_str() {
                "BEGIN" => {
                    let name = line.value.trim().to_ascii_uppercase();
                    if name.is_empty() {
                        return Err(CodecError::malformed_line(line_no, "BEGIN without name"));
                    }
                    stack.push(Component {
                        name,
                        ..Component::default()
                    });
                }
                "END" => {
                    let name = line.value.trim().to_ascii_uppercase();
                    let finished = stack.pop().ok_or_else(|| {
                        CodecError::invalid_structure(format!("END:{} without BEGIN", name))
                    })?;
                    if finished.name != name {
                        return Err(CodecError::invalid_structure(format!(
                            "END:{} closes BEGIN:{}",
                            name, finished.name
                        )));
                    }
                    match stack.last_mut() {
                        Some(parent) => parent.children.push(finished),
                        None => roots.push(finished),
                    }
                }
                _ => {
                    let current = stack.last_mut().ok_or_else(|| {
                        CodecError::invalid_structure(format!(
                            "property {} outside of any component",
                            line.name
                        ))
                    })?;
                    current.properties.push(line);
                }
            }
        }

        if let Some(open) = stack.last() {
            return Err(CodecError::invalid_structure(format!(
                "unterminated {}",
                open.name
            )));
        }

        Ok(roots)
    }

    /// Returns the first property with the given name.
    pub fn property(&self, name: &str) -> Option<&ContentLine> {
        self.properties
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
    }

    /// Returns all properties with the given name.
    pub fn properties_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a ContentLine> {
        self.properties
            .iter()
            .filter(move |p| p.name.eq_ignore_ascii_case(name))
    }

    /// Returns the unescaped text of the first property with the given name,
    /// or `None` if it is missing or blank.
    pub fn text(&self, name: &str) -> Option<String> {
        self.property(name)
            .map(ContentLine::text)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    /// Collects this component and all descendants with the given name.
    pub fn find_all<'a>(&'a self, name: &str, out: &mut Vec<&'a Component>) {
        if self.name == name {
            out.push(self);
        }
        for child in &self.children {
            child.find_all(name, out);
        }
    }
}
