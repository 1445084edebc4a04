//! The conformance issue log.
//!
//! Every violation the middleware observes becomes a [`ValidationIssue`]
//! appended here. The log is the only mutable state shared across
//! exchanges; a single mutex guards appends so concurrent exchanges never
//! lose or tear records.

use std::fmt;

use parking_lot::Mutex;

/// One observed conformance violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    /// HTTP method of the exchange.
    pub method: String,
    /// Request URI of the exchange.
    pub uri: String,
    /// What went wrong.
    pub description: String,
}

impl ValidationIssue {
    /// Creates an issue for one exchange.
    pub fn new(method: &http::Method, uri: &http::Uri, description: impl Into<String>) -> Self {
        Self {
            method: method.to_string(),
            uri: uri.to_string(),
            description: description.into(),
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}: {}", self.method, self.uri, self.description)
    }
}

/// An append-only, concurrency-safe log of conformance issues.
///
/// Insertion order reflects detection order; concurrent exchanges may
/// interleave, but each append is atomic.
#[derive(Debug, Default)]
pub struct IssueLog {
    entries: Mutex<Vec<ValidationIssue>>,
}

impl IssueLog {
    /// Creates an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one issue.
    pub fn append(&self, issue: ValidationIssue) {
        self.entries.lock().push(issue);
    }

    /// Number of recorded issues.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Returns true if no issues were recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Clones out the current issues, in log order.
    pub fn snapshot(&self) -> Vec<ValidationIssue> {
        self.entries.lock().clone()
    }

    /// Collapses the log into a single aggregate failure.
    ///
    /// Returns `None` when the log is empty. The report is built from a
    /// snapshot; appends during formatting are not blocked.
    pub fn summarize(&self) -> Option<ConformanceReport> {
        let issues = self.snapshot();
        if issues.is_empty() {
            None
        } else {
            Some(ConformanceReport { issues })
        }
    }
}

/// Aggregate failure describing every issue found, in log order.
#[derive(Debug, Clone)]
pub struct ConformanceReport {
    issues: Vec<ValidationIssue>,
}

impl ConformanceReport {
    /// The issues behind this report.
    pub fn issues(&self) -> &[ValidationIssue] {
        &self.issues
    }
}

impl fmt::Display for ConformanceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Errors were found validating the API specification:")?;
        let mut first = true;
        for issue in &self.issues {
            if !first {
                write!(f, "\n---\n")?;
            }
            write!(f, "{issue}")?;
            first = false;
        }
        Ok(())
    }
}

impl std::error::Error for ConformanceReport {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn issue(description: &str) -> ValidationIssue {
        ValidationIssue {
            method: "GET".to_string(),
            uri: "/pets".to_string(),
            description: description.to_string(),
        }
    }

    #[test]
    fn test_empty_log_summarizes_to_none() {
        let log = IssueLog::new();
        assert!(log.is_empty());
        assert!(log.summarize().is_none());
    }

    #[test]
    fn test_append_preserves_order() {
        let log = IssueLog::new();
        log.append(issue("first"));
        log.append(issue("second"));

        let snapshot = log.snapshot();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[0].description, "first");
        assert_eq!(snapshot[1].description, "second");
    }

    #[test]
    fn test_report_format() {
        let log = IssueLog::new();
        log.append(issue("Invalid request: body missing"));
        log.append(issue("Invalid response: wrong type"));

        let report = log.summarize().unwrap();
        assert_eq!(
            report.to_string(),
            "Errors were found validating the API specification:\n\
             GET /pets: Invalid request: body missing\n\
             ---\n\
             GET /pets: Invalid response: wrong type"
        );
    }

    #[tokio::test]
    async fn test_concurrent_appends_lose_nothing() {
        let log = Arc::new(IssueLog::new());

        let mut handles = Vec::new();
        for i in 0..64 {
            let log = log.clone();
            handles.push(tokio::spawn(async move {
                log.append(issue(&format!("issue-{i}")));
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(log.len(), 64);
        let report = log.summarize().unwrap();
        assert_eq!(report.issues().len(), 64);
    }
}
