//! Source resolution
//!
//! The release ticket service is authoritative for current release tickets;
//! the legacy tracker holds historical bugs. Every lookup asks the primary
//! first and falls back to the secondary only when the primary confirms the
//! record does not exist. A primary failure is surfaced as-is.

use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;
use wis_common::config::ProductConfig;
use wis_common::models::{
    BaselineInfo, BugPayloadRecord, CanonicalWorkItem, HotpatchBaseline, LegacyWorkItem,
    PackagingWorkItems, ReleaseTicket, WorkItemPayload, WorkItemPayloads,
};
use wis_common::{Resolution, ResolutionError, WorkItemId};

use crate::baseline;
use crate::clients::{PrimaryBackend, SecondaryBackend};
use crate::payload::PayloadExtractor;

static QUERY_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\?id=([0-9a-f-]{36})").expect("valid query id pattern"));

/// Update types of cumulative update release tickets
const LCU_UPDATE_TYPES: &[&str] = &[
    "CUMULATIVE NON-SECURITY (CATALOG ONLY)",
    "CUMULATIVE NON-SECURITY (CRITICAL)",
    "CUMULATIVE NON-SECURITY (CRITICAL) DCAT",
    "CUMULATIVE NON-SECURITY (UPDATE)",
    "CUMULATIVE NON-SECURITY (UPDATE) DCAT",
];

/// Reject ids that no backend can hold
pub fn validate_id(id: i64) -> Resolution<WorkItemId> {
    if id < 1 {
        return Err(ResolutionError::bad_request(format!(
            "WorkItem Id must be an integer greater than 0 but was {}.",
            id
        )));
    }
    WorkItemId::try_from(id).map_err(|_| {
        ResolutionError::bad_request(format!("WorkItem Id {} is out of range.", id))
    })
}

/// Saved query id embedded in a bug list link (`...?id=<uuid>`)
pub fn parse_query_id(payload_query: Option<&str>) -> Option<Uuid> {
    let caps = QUERY_ID.captures(payload_query?)?;
    Uuid::parse_str(&caps[1]).ok()
}

pub fn is_lcu_update_type(update_type: Option<&str>) -> bool {
    update_type.map_or(false, |t| {
        let t = t.trim();
        LCU_UPDATE_TYPES.iter().any(|lcu| lcu.eq_ignore_ascii_case(t))
    })
}

/// Resolves work items, payloads and baselines across both backends
pub struct SourceResolver {
    primary: Arc<dyn PrimaryBackend>,
    secondary: Arc<dyn SecondaryBackend>,
    extractor: PayloadExtractor,
    products: ProductConfig,
}

impl SourceResolver {
    pub fn new(
        primary: Arc<dyn PrimaryBackend>,
        secondary: Arc<dyn SecondaryBackend>,
        extractor: PayloadExtractor,
        products: ProductConfig,
    ) -> Self {
        Self {
            primary,
            secondary,
            extractor,
            products,
        }
    }

    /// Canonical work item from whichever backend holds it
    pub async fn resolve_work_item(
        &self,
        id: WorkItemId,
        cancel: &CancellationToken,
    ) -> Resolution<CanonicalWorkItem> {
        validate_id(id.into())?;

        if let Some(ticket) = self.primary.get_ticket(id, cancel).await? {
            debug!(work_item_id = id, "Resolved work item from release ticket service");
            return CanonicalWorkItem::try_from(&ticket);
        }

        let item = self.legacy_work_item(id, cancel).await?;
        debug!(work_item_id = id, "Resolved work item from legacy tracker");
        Ok(CanonicalWorkItem::from(item))
    }

    /// Payloads of a work item
    ///
    /// `include_children` takes precedence over `include_bug_list`.
    pub async fn resolve_payloads(
        &self,
        id: WorkItemId,
        include_children: bool,
        include_bug_list: bool,
        cancel: &CancellationToken,
    ) -> Resolution<WorkItemPayloads> {
        validate_id(id.into())?;

        match self.primary.get_ticket(id, cancel).await? {
            Some(ticket) => {
                self.release_ticket_payloads(id, &ticket, include_children, include_bug_list, cancel)
                    .await
            }
            None => {
                let item = self.legacy_work_item(id, cancel).await?;
                self.legacy_payloads(id, &item, include_children, cancel).await
            }
        }
    }

    /// Latest rebase baseline of a release ticket; `None` when it has none
    pub async fn latest_baseline(
        &self,
        release_ticket_id: WorkItemId,
        cancel: &CancellationToken,
    ) -> Resolution<Option<BaselineInfo>> {
        validate_id(release_ticket_id.into())?;

        let history = self
            .primary
            .get_rebase_baselines(release_ticket_id, cancel)
            .await?;
        let candidates = history.and_then(|h| h.baselines).unwrap_or_default();

        Ok(baseline::select_baseline(release_ticket_id, &candidates))
    }

    /// Hotpatch baseline of a release ticket; `None` when absent or unset
    pub async fn hotpatch_baseline(
        &self,
        release_ticket_id: WorkItemId,
        cancel: &CancellationToken,
    ) -> Resolution<Option<HotpatchBaseline>> {
        validate_id(release_ticket_id.into())?;

        let candidate = self
            .primary
            .get_hotpatch_baseline(release_ticket_id, cancel)
            .await?;

        Ok(baseline::select_hotpatch_baseline(
            release_ticket_id,
            candidate.as_ref(),
        ))
    }

    /// Active cumulative update release tickets of one release month and product
    pub async fn release_month(
        &self,
        release_month: &str,
        product: &str,
        cancel: &CancellationToken,
    ) -> Resolution<PackagingWorkItems> {
        let tickets = self.primary.get_all_active_tickets(cancel).await?;

        let lcu_tickets: Vec<&ReleaseTicket> = tickets
            .iter()
            .filter(|t| is_lcu_update_type(t.update_type.as_deref()))
            .collect();
        if lcu_tickets.is_empty() {
            return Err(ResolutionError::not_found("No release tickets provided"));
        }

        let month = release_month.to_lowercase();
        let packaging_work_item_list = lcu_tickets
            .into_iter()
            .filter(|t| {
                t.release
                    .as_deref()
                    .map_or(false, |r| r.to_lowercase().contains(&month))
                    && t.product
                        .as_deref()
                        .map_or(false, |p| p.eq_ignore_ascii_case(product))
            })
            .map(CanonicalWorkItem::try_from)
            .collect::<Resolution<Vec<_>>>()?;

        if packaging_work_item_list.is_empty() {
            return Err(ResolutionError::not_found(format!(
                "Release tickets are not found for release month {} and product {}",
                release_month, product
            )));
        }

        info!(
            release_month,
            product,
            count = packaging_work_item_list.len(),
            "Resolved release month tickets"
        );

        Ok(PackagingWorkItems {
            release_month: release_month.to_string(),
            product: product.to_string(),
            packaging_work_item_list,
        })
    }

    async fn legacy_work_item(
        &self,
        id: WorkItemId,
        cancel: &CancellationToken,
    ) -> Resolution<LegacyWorkItem> {
        self.secondary
            .get_work_item(id, cancel)
            .await?
            .ok_or_else(|| ResolutionError::not_found(format!("WorkItem Id: {} not found!", id)))
    }

    async fn release_ticket_payloads(
        &self,
        id: WorkItemId,
        ticket: &ReleaseTicket,
        include_children: bool,
        include_bug_list: bool,
        cancel: &CancellationToken,
    ) -> Resolution<WorkItemPayloads> {
        if include_children {
            return self
                .all_bug_payloads(id, ticket.product.as_deref(), ticket.release.as_deref(), cancel)
                .await;
        }

        if include_bug_list {
            if let Some(query_id) = parse_query_id(ticket.payload_query.as_deref()) {
                match self.secondary.get_payloads_by_query(query_id, cancel).await {
                    Ok(records) => return Ok(self.construct_payloads(id, records).await),
                    Err(e) => {
                        warn!(work_item_id = id, query_id = %query_id, error = %e, "Could not get payloads from bug list");
                    }
                }
            }
        }

        Ok(WorkItemPayloads {
            id,
            payloads: vec![WorkItemPayload::empty(id, ticket.release.clone())],
        })
    }

    async fn legacy_payloads(
        &self,
        id: WorkItemId,
        item: &LegacyWorkItem,
        include_children: bool,
        cancel: &CancellationToken,
    ) -> Resolution<WorkItemPayloads> {
        if include_children {
            return self
                .all_bug_payloads(id, item.product.as_deref(), item.release.as_deref(), cancel)
                .await;
        }

        let payload = self.extractor.extract_record(&BugPayloadRecord::from(item));
        Ok(WorkItemPayloads {
            id,
            payloads: vec![payload],
        })
    }

    /// Payloads of every bug filed against the product (and its aliases) and release
    async fn all_bug_payloads(
        &self,
        id: WorkItemId,
        product: Option<&str>,
        release: Option<&str>,
        cancel: &CancellationToken,
    ) -> Resolution<WorkItemPayloads> {
        let (product, release) = match (product, release) {
            (Some(p), Some(r)) if !p.trim().is_empty() && !r.trim().is_empty() => (p, r),
            _ => {
                let message = "Invalid WorkItem! Product and Release Field value cannot be empty.";
                warn!(work_item_id = id, "{}", message);
                return Err(ResolutionError::bad_request(message));
            }
        };

        let products = self.products.products_for(product);
        let releases = vec![release.to_string()];

        let records = self
            .secondary
            .get_bugs_for_products_and_releases(&products, &releases, cancel)
            .await?;

        Ok(self.construct_payloads(id, records).await)
    }

    async fn construct_payloads(
        &self,
        id: WorkItemId,
        records: Vec<BugPayloadRecord>,
    ) -> WorkItemPayloads {
        let mut payloads = self.extractor.extract_many(records).await;
        payloads.sort_by_key(|payload| payload.id);

        debug!(work_item_id = id, payloads = payloads.len(), "Constructed payloads");
        WorkItemPayloads { id, payloads }
    }
}
