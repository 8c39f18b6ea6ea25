//! Conversions from backend records to `CanonicalWorkItem`

use super::external::{CanonicalWorkItem, WorkItemKind};
use super::labels;
use super::primary::ReleaseTicket;
use super::secondary::LegacyWorkItem;
use crate::resolution::ResolutionError;
use crate::time::parse_timestamp;

impl TryFrom<&ReleaseTicket> for CanonicalWorkItem {
    type Error = ResolutionError;

    fn try_from(ticket: &ReleaseTicket) -> Result<Self, Self::Error> {
        let id = ticket.id.trim().parse().map_err(|_| {
            ResolutionError::internal(format!(
                "Release ticket returned a non-numeric id: {:?}",
                ticket.id
            ))
        })?;

        let kb_article_number = ticket
            .kb_article
            .as_deref()
            .and_then(|kb| kb.trim().parse().ok())
            .unwrap_or_default();

        let keywords = ticket
            .tags
            .as_ref()
            .map(|tags| tags.join(";"))
            .unwrap_or_default();

        Ok(CanonicalWorkItem {
            id,
            work_item_type: labels::TYPE_RELEASE_TICKET.to_string(),
            kind: WorkItemKind::ReleaseTicket,
            is_bug: false,
            is_release_ticket: true,
            title: ticket.title.clone(),
            kb_article_number,
            product: ticket.origin_product.clone().or_else(|| ticket.product.clone()),
            hotpatch_product: ticket.hotpatch_product.clone(),
            release_type: ticket.update_type.clone(),
            update_type: ticket.update_type.clone(),
            release: ticket.release.clone(),
            branch: ticket.branch.clone(),
            hotpatch_branch: ticket.hotpatch_branch.clone(),
            build: Some(String::new()),
            state: ticket.publishing_status.clone(),
            assigned_to: String::new(),
            modified_date: ticket.modified_on,
            target_date: ticket.ttgl.as_deref().and_then(parse_timestamp),
            keywords: Some(keywords),
            triage: labels::TRIAGE_APPROVED.to_string(),
            issue_type: Some(labels::ISSUE_TYPE_CODE_DEFECT.to_string()),
            binary_files: Some(String::new()),
            repro_steps: None,
            payload_query: ticket.payload_query.clone(),
            is_baseline: ticket.is_baseline,
            product_version: ticket.product_version.clone(),
        })
    }
}

impl From<LegacyWorkItem> for CanonicalWorkItem {
    fn from(item: LegacyWorkItem) -> Self {
        let kind = if item.is_bug {
            WorkItemKind::Bug
        } else if item.is_release_ticket {
            WorkItemKind::ReleaseTicket
        } else {
            WorkItemKind::Other
        };

        CanonicalWorkItem {
            id: item.id,
            work_item_type: item.work_item_type.unwrap_or_default(),
            kind,
            is_bug: item.is_bug,
            is_release_ticket: item.is_release_ticket,
            title: item.title,
            kb_article_number: item.kb_article_number,
            product: item.product,
            hotpatch_product: None,
            release_type: item.release_type,
            update_type: item.update_type,
            release: item.release,
            branch: item.branch,
            hotpatch_branch: None,
            build: item.build,
            state: item.state,
            assigned_to: item.assigned_to,
            modified_date: item.modified_date,
            target_date: item.target_date,
            keywords: item.keywords,
            triage: item.triage,
            issue_type: item.issue_type,
            binary_files: item.binary_files,
            repro_steps: item.repro_steps,
            payload_query: None,
            // Baseline flag and product version exist only on primary tickets
            is_baseline: false,
            product_version: None,
        }
    }
}
