//! Payload extraction
//!
//! Turns the free-text binary field of a bug into a `WorkItemPayload`:
//! `sanitizer` splits the field into tokens, `classifier` sorts each token
//! into binaries and components using the Windows path rules in `winpath`
//! and the placeholder table in `escape`.

pub mod classifier;
pub mod escape;
pub mod sanitizer;
pub mod winpath;

use futures::stream::{self, StreamExt};
use tracing::{debug, warn};
use wis_common::models::{BugPayloadRecord, WorkItemPayload};
use wis_common::WorkItemId;

/// Extracts payloads from bug records
///
/// Extraction never fails: anything unusable degrades to fewer entries, or to
/// an empty payload, with a diagnostic.
#[derive(Debug, Clone)]
pub struct PayloadExtractor {
    max_concurrency: usize,
}

impl PayloadExtractor {
    pub fn new(max_concurrency: usize) -> Self {
        Self {
            max_concurrency: max_concurrency.max(1),
        }
    }

    /// Extract the payload of a single work item
    pub fn extract_one(
        &self,
        id: WorkItemId,
        binary_files: Option<&str>,
        repro_steps: Option<&str>,
        release: Option<String>,
    ) -> WorkItemPayload {
        extract(id, binary_files, repro_steps, release)
    }

    pub fn extract_record(&self, record: &BugPayloadRecord) -> WorkItemPayload {
        self.extract_one(
            record.id,
            record.binary_files.as_deref(),
            record.repro_steps.as_deref(),
            record.release.clone(),
        )
    }

    /// Extract every record on a bounded pool of blocking workers
    ///
    /// Results come back in completion order; callers sort them.
    pub async fn extract_many(&self, records: Vec<BugPayloadRecord>) -> Vec<WorkItemPayload> {
        debug!(
            records = records.len(),
            workers = self.max_concurrency,
            "Extracting payloads"
        );

        stream::iter(records)
            .map(|record| async move {
                let id = record.id;
                let release = record.release.clone();
                let handle = tokio::task::spawn_blocking(move || {
                    extract(
                        record.id,
                        record.binary_files.as_deref(),
                        record.repro_steps.as_deref(),
                        record.release.clone(),
                    )
                });

                match handle.await {
                    Ok(payload) => payload,
                    Err(e) => {
                        warn!(work_item_id = id, error = %e, "Payload extraction worker failed");
                        WorkItemPayload::empty(id, release)
                    }
                }
            })
            .buffer_unordered(self.max_concurrency)
            .collect()
            .await
    }
}

fn extract(
    id: WorkItemId,
    binary_files: Option<&str>,
    repro_steps: Option<&str>,
    release: Option<String>,
) -> WorkItemPayload {
    let mut payload = WorkItemPayload::empty(id, release);

    payload.payload_items = sanitizer::sanitize(binary_files, repro_steps);
    if payload.payload_items.is_empty() {
        return payload;
    }

    let classification = classifier::classify_tokens(id, &payload.payload_items);
    payload.binaries = classification.binaries;
    payload.components = classification.components;
    payload
}
