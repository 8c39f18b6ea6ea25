//! Response models surfaced to service callers
//!
//! Field names serialize in camelCase and absent optionals are omitted,
//! matching the wire contract consumers of the service already parse.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::WorkItemId;

/// Kind of work item, which decides the populated optional fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkItemKind {
    Bug,
    ReleaseTicket,
    /// Any other tracker type; carried through without kind-specific fields
    Other,
}

impl WorkItemKind {
    pub fn is_bug(self) -> bool {
        self == WorkItemKind::Bug
    }

    pub fn is_release_ticket(self) -> bool {
        self == WorkItemKind::ReleaseTicket
    }
}

/// Canonical work item, built once per request from either backend
///
/// Bug-only fields: `issue_type`, `binary_files`, `repro_steps`.
/// Release-ticket-only fields: `update_type`, `branch`, `build`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalWorkItem {
    pub id: WorkItemId,
    /// Tracker type label, e.g. "Bug" or "Release Ticket"
    #[serde(rename = "type")]
    pub work_item_type: String,
    pub kind: WorkItemKind,
    pub is_bug: bool,
    pub is_release_ticket: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(rename = "kbArticleNumber")]
    pub kb_article_number: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hotpatch_product: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hotpatch_branch: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub build: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    pub assigned_to: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified_date: Option<DateTime<Utc>>,
    /// TTGL for release tickets
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_date: Option<DateTime<Utc>>,
    #[serde(rename = "keyWords", skip_serializing_if = "Option::is_none")]
    pub keywords: Option<String>,
    pub triage: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issue_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub binary_files: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repro_steps: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload_query: Option<String>,
    pub is_baseline: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_version: Option<String>,
}

/// Release tickets matching a release month and product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackagingWorkItems {
    pub release_month: String,
    pub product: String,
    pub packaging_work_item_list: Vec<CanonicalWorkItem>,
}

/// A payload entry classified as a binary file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkItemBinary {
    pub name: String,
    /// Directory with a trailing `\`, or empty
    pub path: String,
}

/// A payload entry classified as a component
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkItemComponent {
    pub name: String,
}

/// Parsed payload of one contributing work item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkItemPayload {
    pub id: WorkItemId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release: Option<String>,
    pub binaries: Vec<WorkItemBinary>,
    pub components: Vec<WorkItemComponent>,
    pub payload_items: Vec<String>,
}

impl WorkItemPayload {
    /// Payload with no binaries, components or items
    pub fn empty(id: WorkItemId, release: Option<String>) -> Self {
        Self {
            id,
            release,
            binaries: Vec::new(),
            components: Vec::new(),
            payload_items: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.binaries.is_empty() && self.components.is_empty() && self.payload_items.is_empty()
    }
}

/// Payloads for a requested work item, ordered by ascending contributor id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkItemPayloads {
    pub id: WorkItemId,
    pub payloads: Vec<WorkItemPayload>,
}

/// Latest rebase baseline declared before a release ticket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaselineInfo {
    pub release_ticket_id: WorkItemId,
    /// Job id of the LatestCumulativeUpdate package, 0 when none is recorded
    pub lcu_job_id: i32,
    pub virtual_build_name: String,
}

/// Baseline set by the last cold package in the hotpatch lineage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HotpatchBaseline {
    pub release_ticket_id: WorkItemId,
    pub lcu_job_id: i32,
}
