use serde::{Deserialize, Serialize};

/// One path submitted to a link run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkItem {
    pub path: String,
    /// Directory linked recursively (needs confirmation)
    pub is_container: bool,
}

impl WorkItem {
    pub fn leaf(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            is_container: false,
        }
    }

    pub fn container(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            is_container: true,
        }
    }

    /// Last path component, ignoring trailing slashes
    pub fn base_name(&self) -> &str {
        super::paths::base_name(&self.path)
    }
}

/// Tally of one run, returned once when the last item has resolved
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionOutcome {
    pub items_created: u64,
    pub failures: Vec<String>,
    /// Containers the user declined; neither created nor failed
    pub skipped: Vec<String>,
}

impl ExecutionOutcome {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn summary(&self) -> String {
        let mut summary = format!("Hardlink creation finished: {} created", self.items_created);
        if !self.failures.is_empty() {
            summary.push_str(&format!(", errors: {}", self.failures.len()));
        }
        summary
    }

    pub(crate) fn record_failure(&mut self, name: &str, error: impl std::fmt::Display) {
        self.failures.push(format!("{}: {}", name, error));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_work_item_constructors() {
        let leaf = WorkItem::leaf("/a/f1");
        let dir = WorkItem::container("/a/dir/");

        assert!(!leaf.is_container);
        assert!(dir.is_container);
        assert_eq!(leaf.base_name(), "f1");
        assert_eq!(dir.base_name(), "dir");
    }

    #[test]
    fn test_summary() {
        let mut outcome = ExecutionOutcome {
            items_created: 4,
            ..Default::default()
        };
        assert_eq!(outcome.summary(), "Hardlink creation finished: 4 created");
        assert!(outcome.is_clean());

        outcome.record_failure("f2", "Destination already exists");
        assert_eq!(
            outcome.summary(),
            "Hardlink creation finished: 4 created, errors: 1"
        );
        assert_eq!(outcome.failures[0], "f2: Destination already exists");
        assert!(!outcome.is_clean());
    }
}
