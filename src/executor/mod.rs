//! Sequential link executor.
//!
//! Runs a selection of paths against a destination one item at a time. Leaf
//! items become one `link` call; containers need confirmation and become one
//! `link_subtree` call. Failures are collected and the run always continues.

mod paths;
mod types;

pub use paths::{base_name, join_destination};
pub use types::{ExecutionOutcome, WorkItem};

use crate::api::LinkApi;
use crate::confirm::{ConfirmationGate, Decision};
use tracing::{debug, error, info, trace, warn};

const UNKNOWN_ERROR: &str = "unknown error";

pub struct SequentialExecutor<L, G> {
    api: L,
    gate: G,
}

impl<L: LinkApi, G: ConfirmationGate> SequentialExecutor<L, G> {
    pub fn new(api: L, gate: G) -> Self {
        Self { api, gate }
    }

    /// Process `items` in order against `destination`.
    ///
    /// At most one remote call is in flight: item `i + 1` starts only after
    /// item `i` (and its confirmation prompt) has resolved. Failed items are
    /// not retried.
    pub async fn run(&mut self, items: &[WorkItem], destination: &str) -> ExecutionOutcome {
        let mut outcome = ExecutionOutcome::default();
        debug!(
            component = "executor",
            items = items.len(),
            destination,
            "Starting hardlink creation"
        );

        for item in items {
            if item.is_container {
                self.process_container(item, destination, &mut outcome).await;
            } else {
                self.process_leaf(item, destination, &mut outcome).await;
            }
        }

        if outcome.is_clean() {
            info!(component = "executor", created = outcome.items_created, "{}", outcome.summary());
        } else {
            error!(
                component = "executor",
                created = outcome.items_created,
                errors = outcome.failures.len(),
                "{}",
                outcome.summary()
            );
        }
        outcome
    }

    async fn process_leaf(&self, item: &WorkItem, destination: &str, outcome: &mut ExecutionOutcome) {
        let name = item.base_name();
        let dest = join_destination(destination, name);
        trace!(component = "executor", source = %item.path, dest = %dest, "Linking file");

        match self.api.link(&item.path, &dest).await {
            Ok(response) if response.ok => {
                outcome.items_created += 1;
                debug!(component = "executor", name, "File linked");
            }
            Ok(response) => {
                let reason = response.error.as_deref().unwrap_or(UNKNOWN_ERROR);
                error!(component = "executor", name, error = reason, "File link failed");
                outcome.record_failure(name, reason);
            }
            Err(e) => {
                error!(component = "executor", name, error = %e, "File link request failed");
                outcome.record_failure(name, &e);
            }
        }
    }

    async fn process_container(
        &mut self,
        item: &WorkItem,
        destination: &str,
        outcome: &mut ExecutionOutcome,
    ) {
        let name = item.base_name();
        let dest_root = join_destination(destination, name);
        trace!(component = "executor", source = %item.path, dest_root = %dest_root, "Folder selected");

        let message = format!(
            "Create hardlinks for the whole folder:\n{}\ninto:\n{} ?",
            item.path, dest_root
        );
        if self.gate.confirm("Create hardlinks", &message).await == Decision::Decline {
            debug!(component = "executor", source = %item.path, "Folder skipped by user");
            outcome.skipped.push(item.path.clone());
            return;
        }

        match self.api.link_subtree(&item.path, &dest_root).await {
            Ok(response) if response.ok => {
                outcome.items_created += response.created;
                if !response.errors.is_empty() {
                    warn!(
                        component = "executor",
                        name,
                        errors = response.errors.len(),
                        "Folder linked with errors"
                    );
                }
                for sub_error in &response.errors {
                    trace!(component = "executor", name, error = %sub_error, "Folder entry failed");
                    outcome.record_failure(name, sub_error);
                }
                debug!(component = "executor", name, created = response.created, "Folder processed");
            }
            Ok(response) => {
                let reason = response.error.as_deref().unwrap_or(UNKNOWN_ERROR);
                error!(component = "executor", name, error = reason, "Folder link failed");
                outcome.record_failure(name, reason);
            }
            Err(e) => {
                error!(component = "executor", name, error = %e, "Folder link request failed");
                outcome.record_failure(name, &e);
            }
        }
    }
}
