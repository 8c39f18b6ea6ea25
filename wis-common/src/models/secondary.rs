//! Records recovered from the legacy issue tracker (the secondary backend)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::WorkItemId;

/// Work item read from the legacy tracker, already lifted out of its field bag
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyWorkItem {
    pub id: WorkItemId,
    /// Tracker type label, e.g. "Bug"
    pub work_item_type: Option<String>,
    pub is_bug: bool,
    pub is_release_ticket: bool,
    pub title: Option<String>,
    pub kb_article_number: i32,
    pub product: Option<String>,
    pub release_type: Option<String>,
    pub update_type: Option<String>,
    pub release: Option<String>,
    pub branch: Option<String>,
    pub build: Option<String>,
    pub state: Option<String>,
    pub assigned_to: String,
    pub modified_date: Option<DateTime<Utc>>,
    pub target_date: Option<DateTime<Utc>>,
    pub triage: String,
    pub issue_type: Option<String>,
    pub keywords: Option<String>,
    pub binary_files: Option<String>,
    pub repro_steps: Option<String>,
}

/// The payload-relevant slice of a tracker bug
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BugPayloadRecord {
    pub id: WorkItemId,
    pub binary_files: Option<String>,
    pub repro_steps: Option<String>,
    pub release: Option<String>,
}

impl From<&LegacyWorkItem> for BugPayloadRecord {
    fn from(item: &LegacyWorkItem) -> Self {
        Self {
            id: item.id,
            binary_files: item.binary_files.clone(),
            repro_steps: item.repro_steps.clone(),
            release: item.release.clone(),
        }
    }
}
