//! Diagnostics - Non-fatal findings reported alongside a result

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub summary: String,
    pub detail: String,
    /// Attribute the diagnostic refers to, if any
    pub attribute: Option<String>,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.attribute {
            Some(attr) => write!(f, "{} ({}): {}", self.summary, attr, self.detail),
            None => write!(f, "{}: {}", self.summary, self.detail),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_warning(
        &mut self,
        summary: impl Into<String>,
        detail: impl Into<String>,
        attribute: Option<&str>,
    ) {
        self.push(Severity::Warning, summary.into(), detail.into(), attribute);
    }

    pub fn add_error(
        &mut self,
        summary: impl Into<String>,
        detail: impl Into<String>,
        attribute: Option<&str>,
    ) {
        self.push(Severity::Error, summary.into(), detail.into(), attribute);
    }

    fn push(&mut self, severity: Severity, summary: String, detail: String, attribute: Option<&str>) {
        self.items.push(Diagnostic {
            severity,
            summary,
            detail,
            attribute: attribute.map(str::to_string),
        });
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.items.extend(other.items);
    }

    pub fn has_errors(&self) -> bool {
        self.items.iter().any(|d| d.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items
            .iter()
            .filter(|d| d.severity == Severity::Warning)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn warnings_are_not_errors() {
        let mut diags = Diagnostics::new();
        diags.add_warning("Mismatched value", "expected 10 s, got 11 s", Some("connect_timeout"));
        assert!(!diags.has_errors());
        assert_eq!(diags.warnings().count(), 1);

        diags.add_error("Request failed", "status 500", None);
        assert!(diags.has_errors());
        assert_eq!(diags.iter().count(), 2);
    }

    #[test]
    fn extend_merges() {
        let mut a = Diagnostics::new();
        a.add_warning("a", "first", None);
        let mut b = Diagnostics::new();
        b.add_warning("b", "second", None);
        a.extend(b);
        let summaries: Vec<&str> = a.iter().map(|d| d.summary.as_str()).collect();
        assert_eq!(summaries, vec!["a", "b"]);
    }

    #[test]
    fn display_includes_attribute() {
        let mut diags = Diagnostics::new();
        diags.add_warning("Mismatched value", "detail", Some("smtp_timeout"));
        let d = diags.iter().next().unwrap();
        assert_eq!(d.to_string(), "Mismatched value (smtp_timeout): detail");
    }
}
