//! Field access for legacy tracker work items
//!
//! Tracker work items arrive as an id plus a bag of fields keyed by reference
//! name. The accessors below are grouped by the work item kind that owns the
//! field and lift the bag into `LegacyWorkItem` / `BugPayloadRecord`.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{Map, Value};
use wis_common::models::{labels, BugPayloadRecord, LegacyWorkItem};
use wis_common::time::parse_timestamp;
use wis_common::WorkItemId;

/// Work item as returned by the tracker's REST API
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TrackerWorkItem {
    pub id: WorkItemId,
    #[serde(default)]
    pub fields: Map<String, Value>,
}

pub mod names {
    pub const ID: &str = "NetCore.Id";
    pub const TITLE: &str = "NetCore.Title";
    pub const WORK_ITEM_TYPE: &str = "NetCore.WorkItemType";
    pub const STATE: &str = "NetCore.State";
    pub const ASSIGNED_TO: &str = "NetCore.AssignedTo";
    pub const TAGS: &str = "NetCore.Tags";
    pub const PRODUCT: &str = "NetCore.Product";
    pub const KB_ARTICLE: &str = "NetCore.KBArticleNumber";

    pub const BINARY_FILENAME: &str = "NetCore.BinaryFilename";
    pub const SDL_SEVERITY: &str = "NetCore.SDLSeverity";
    pub const HOW_FOUND: &str = "NetCore.VSTS.CMMI.HowFound";
    pub const RELEASE: &str = "NetCore.VSTS.Common.Release";
    pub const TRIAGE: &str = "NetCore.VSTS.Common.Triage";
    pub const REPRO_STEPS: &str = "NetCore.VSTS.TCM.ReproSteps";
    pub const CHANGED_DATE: &str = "NetCore.ChangedDate";

    pub const RELEASE_CYCLE: &str = "NetCore.ReleaseCycle";
    pub const RELEASE_MONTH: &str = "NetCore.ReleaseMonth";
    pub const UPDATE_TYPE: &str = "NetCore.UpdateType";
    pub const SERVICING_BRANCH: &str = "NetCore.VSTS.Branch.Servicing";
    pub const TARGET_DATE: &str = "NetCore.VSTS.Scheduling.TargetDate";
    pub const BUILD: &str = "NetCore.VSTS.Common.CustomString05";

    /// Fields fetched for payload extraction
    pub const PAYLOAD_FIELDS: [&str; 4] = [ID, BINARY_FILENAME, REPRO_STEPS, RELEASE];
}

const SERVICING_GDR_SECURITY: &str = "Servicing GDR Security";
const SERVICING_GDR_NON_SECURITY: &str = "Servicing GDR Non-Security";
const NOT_A_SECURITY_BUG: &str = "Not A Security Bug";
const SECURITY_PATTERN: &str = "security";

fn string_field(item: &TrackerWorkItem, name: &str) -> Option<String> {
    match item.fields.get(name)? {
        Value::String(s) => Some(s.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

/// A field that must carry non-blank text to count
fn non_blank_field(item: &TrackerWorkItem, name: &str) -> Option<String> {
    string_field(item, name).filter(|s| !s.trim().is_empty())
}

fn date_field(item: &TrackerWorkItem, name: &str) -> Option<DateTime<Utc>> {
    item.fields
        .get(name)
        .and_then(Value::as_str)
        .and_then(parse_timestamp)
}

pub mod common {
    use super::*;

    pub fn work_item_type(item: &TrackerWorkItem) -> Option<String> {
        string_field(item, names::WORK_ITEM_TYPE)
    }

    pub fn title(item: &TrackerWorkItem) -> Option<String> {
        string_field(item, names::TITLE)
    }

    /// KB article number, 0 when missing or not numeric
    pub fn kb_number(item: &TrackerWorkItem) -> i32 {
        match item.fields.get(names::KB_ARTICLE) {
            Some(Value::Number(n)) => n.as_i64().and_then(|n| i32::try_from(n).ok()).unwrap_or(0),
            Some(Value::String(s)) => s.trim().parse().unwrap_or(0),
            _ => 0,
        }
    }

    pub fn product(item: &TrackerWorkItem) -> Option<String> {
        non_blank_field(item, names::PRODUCT)
    }

    pub fn state(item: &TrackerWorkItem) -> Option<String> {
        string_field(item, names::STATE)
    }

    pub fn keywords(item: &TrackerWorkItem) -> Option<String> {
        string_field(item, names::TAGS)
    }

    /// Unique name of the assignee identity, empty when unassigned
    pub fn assigned_to(item: &TrackerWorkItem) -> String {
        item.fields
            .get(names::ASSIGNED_TO)
            .and_then(|identity| identity.get("uniqueName"))
            .and_then(Value::as_str)
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_default()
            .to_string()
    }

    pub fn is_bug(item: &TrackerWorkItem) -> bool {
        work_item_type(item).map_or(false, |t| t.eq_ignore_ascii_case(labels::TYPE_BUG))
    }

    pub fn is_release_ticket(item: &TrackerWorkItem) -> bool {
        work_item_type(item).map_or(false, |t| {
            t.eq_ignore_ascii_case(labels::TYPE_RELEASE_TICKET)
                || t.eq_ignore_ascii_case(labels::TYPE_RELEASE_TICKET_PROTO)
        })
    }
}

pub mod bug {
    use super::*;

    /// Issue type as recorded by the how-found field
    pub fn issue_type(item: &TrackerWorkItem) -> Option<String> {
        string_field(item, names::HOW_FOUND)
    }

    pub fn binary_files(item: &TrackerWorkItem) -> Option<String> {
        string_field(item, names::BINARY_FILENAME)
    }

    pub fn release(item: &TrackerWorkItem) -> Option<String> {
        string_field(item, names::RELEASE)
    }

    pub fn repro_steps(item: &TrackerWorkItem) -> Option<String> {
        string_field(item, names::REPRO_STEPS)
    }

    pub fn modified_date(item: &TrackerWorkItem) -> Option<DateTime<Utc>> {
        date_field(item, names::CHANGED_DATE)
    }

    /// Triage status; untriaged items count as approved
    pub fn triage(item: &TrackerWorkItem) -> String {
        non_blank_field(item, names::TRIAGE).unwrap_or_else(|| labels::TRIAGE_APPROVED.to_string())
    }

    pub fn sdl_severity(item: &TrackerWorkItem) -> Option<String> {
        non_blank_field(item, names::SDL_SEVERITY)
    }
}

pub mod release_ticket {
    use super::*;

    pub fn release_month(item: &TrackerWorkItem) -> String {
        string_field(item, names::RELEASE_MONTH).unwrap_or_default()
    }

    pub fn release_cycle(item: &TrackerWorkItem) -> String {
        string_field(item, names::RELEASE_CYCLE).unwrap_or_default()
    }

    pub fn update_type(item: &TrackerWorkItem) -> Option<String> {
        string_field(item, names::UPDATE_TYPE)
    }

    pub fn branch(item: &TrackerWorkItem) -> Option<String> {
        string_field(item, names::SERVICING_BRANCH)
    }

    pub fn build(item: &TrackerWorkItem) -> Option<String> {
        string_field(item, names::BUILD)
    }

    pub fn target_date(item: &TrackerWorkItem) -> Option<DateTime<Utc>> {
        date_field(item, names::TARGET_DATE)
    }
}

/// Release of the item; release tickets without one fall back to "<month> <cycle>"
pub fn release(item: &TrackerWorkItem, is_release_ticket: bool) -> Option<String> {
    let release = bug::release(item);
    if release.as_deref().map_or(false, |r| !r.trim().is_empty()) || !is_release_ticket {
        return release;
    }

    Some(format!(
        "{} {}",
        release_ticket::release_month(item),
        release_ticket::release_cycle(item)
    ))
}

/// Release type: a ticket's update type, or the servicing class of a bug
pub fn release_type(item: &TrackerWorkItem, is_release_ticket: bool, is_bug: bool) -> Option<String> {
    if is_release_ticket {
        if let Some(update_type) = release_ticket::update_type(item).filter(|t| !t.trim().is_empty()) {
            return Some(update_type);
        }
    }

    if !is_bug {
        return None;
    }

    let security_severity = bug::sdl_severity(item)
        .map_or(false, |severity| !severity.eq_ignore_ascii_case(NOT_A_SECURITY_BUG));
    let found_by_security = bug::issue_type(item)
        .map_or(false, |how_found| how_found.to_lowercase().contains(SECURITY_PATTERN));

    Some(if security_severity || found_by_security {
        SERVICING_GDR_SECURITY.to_string()
    } else {
        SERVICING_GDR_NON_SECURITY.to_string()
    })
}

/// Lift a tracker work item into a `LegacyWorkItem`
pub fn to_legacy_work_item(item: &TrackerWorkItem) -> LegacyWorkItem {
    let is_bug = common::is_bug(item);
    let is_release_ticket = common::is_release_ticket(item);

    let mut legacy = LegacyWorkItem {
        id: item.id,
        work_item_type: common::work_item_type(item),
        is_bug,
        is_release_ticket,
        title: common::title(item),
        kb_article_number: common::kb_number(item),
        product: common::product(item),
        state: common::state(item),
        keywords: common::keywords(item),
        assigned_to: common::assigned_to(item),
        modified_date: bug::modified_date(item),
        triage: bug::triage(item),
        release: release(item, is_release_ticket),
        release_type: release_type(item, is_release_ticket, is_bug),
        ..Default::default()
    };

    if is_bug {
        legacy.issue_type = bug::issue_type(item);
        legacy.binary_files = bug::binary_files(item);
        legacy.repro_steps = bug::repro_steps(item);
    }

    if is_release_ticket {
        legacy.update_type = release_ticket::update_type(item);
        legacy.branch = release_ticket::branch(item);
        legacy.build = release_ticket::build(item);
        legacy.target_date = release_ticket::target_date(item);
    }

    legacy
}

pub fn to_bug_payload_record(item: &TrackerWorkItem) -> BugPayloadRecord {
    BugPayloadRecord {
        id: item.id,
        binary_files: bug::binary_files(item),
        repro_steps: bug::repro_steps(item),
        release: bug::release(item),
    }
}
