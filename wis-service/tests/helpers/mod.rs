//! In-memory backends for resolver and HTTP tests
//!
//! Each fake counts its calls so tests can assert which backend was touched.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;
use wis_common::config::ProductConfig;
use wis_common::models::{
    BaselinePackage, BugPayloadRecord, HotpatchCandidate, LegacyWorkItem, RebaseBaseline,
    RebaseBaselines, ReleaseTicket,
};
use wis_common::WorkItemId;
use wis_service::clients::{BackendError, PrimaryBackend, SecondaryBackend};
use wis_service::payload::PayloadExtractor;
use wis_service::SourceResolver;

#[derive(Default)]
pub struct FakePrimary {
    pub tickets: HashMap<WorkItemId, ReleaseTicket>,
    pub active: Vec<ReleaseTicket>,
    pub rebase: HashMap<WorkItemId, RebaseBaselines>,
    pub hotpatch: HashMap<WorkItemId, HotpatchCandidate>,
    /// Every call fails with this upstream status
    pub fail_status: Option<u16>,
    pub calls: AtomicUsize,
}

impl FakePrimary {
    pub fn with_ticket(mut self, ticket: ReleaseTicket) -> Self {
        let id = ticket.id.parse().unwrap();
        self.tickets.insert(id, ticket);
        self
    }

    pub fn failing(status: u16) -> Self {
        Self {
            fail_status: Some(status),
            ..Default::default()
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn enter(&self, route: &str) -> Result<(), BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.fail_status {
            Some(status) => Err(BackendError::Status {
                route: route.to_string(),
                status,
                body: "primary unavailable".to_string(),
            }),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl PrimaryBackend for FakePrimary {
    async fn get_ticket(
        &self,
        id: WorkItemId,
        _cancel: &CancellationToken,
    ) -> Result<Option<ReleaseTicket>, BackendError> {
        self.enter("releasetickets")?;
        Ok(self.tickets.get(&id).cloned())
    }

    async fn get_all_active_tickets(
        &self,
        _cancel: &CancellationToken,
    ) -> Result<Vec<ReleaseTicket>, BackendError> {
        self.enter("releasetickets/active")?;
        Ok(self.active.clone())
    }

    async fn get_rebase_baselines(
        &self,
        ticket_id: WorkItemId,
        _cancel: &CancellationToken,
    ) -> Result<Option<RebaseBaselines>, BackendError> {
        self.enter("baseline/rebase")?;
        Ok(self.rebase.get(&ticket_id).cloned())
    }

    async fn get_hotpatch_baseline(
        &self,
        ticket_id: WorkItemId,
        _cancel: &CancellationToken,
    ) -> Result<Option<HotpatchCandidate>, BackendError> {
        self.enter("baseline/hotpatch")?;
        Ok(self.hotpatch.get(&ticket_id).cloned())
    }
}

#[derive(Default)]
pub struct FakeSecondary {
    pub items: HashMap<WorkItemId, LegacyWorkItem>,
    pub queries: HashMap<Uuid, Vec<BugPayloadRecord>>,
    /// Returned for every product/release query
    pub bugs: Vec<BugPayloadRecord>,
    pub fail_queries: bool,
    pub calls: AtomicUsize,
    pub last_products: Mutex<Vec<String>>,
    pub last_releases: Mutex<Vec<String>>,
}

impl FakeSecondary {
    pub fn with_item(mut self, item: LegacyWorkItem) -> Self {
        self.items.insert(item.id, item);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn products_queried(&self) -> Vec<String> {
        self.last_products.lock().unwrap().clone()
    }

    pub fn releases_queried(&self) -> Vec<String> {
        self.last_releases.lock().unwrap().clone()
    }
}

#[async_trait]
impl SecondaryBackend for FakeSecondary {
    async fn get_work_item(
        &self,
        id: WorkItemId,
        _cancel: &CancellationToken,
    ) -> Result<Option<LegacyWorkItem>, BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.items.get(&id).cloned())
    }

    async fn get_payloads_by_query(
        &self,
        query_id: Uuid,
        _cancel: &CancellationToken,
    ) -> Result<Vec<BugPayloadRecord>, BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_queries {
            return Err(BackendError::Forbidden {
                resource: format!("Query: {}", query_id),
            });
        }
        self.queries
            .get(&query_id)
            .cloned()
            .ok_or_else(|| BackendError::Status {
                route: format!("wiql/{}", query_id),
                status: 404,
                body: String::new(),
            })
    }

    async fn get_bugs_for_products_and_releases(
        &self,
        products: &[String],
        releases: &[String],
        _cancel: &CancellationToken,
    ) -> Result<Vec<BugPayloadRecord>, BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_products.lock().unwrap() = products.to_vec();
        *self.last_releases.lock().unwrap() = releases.to_vec();
        if self.fail_queries {
            return Err(BackendError::Transport {
                route: "wiql".to_string(),
                message: "connection reset".to_string(),
            });
        }
        Ok(self.bugs.clone())
    }
}

pub fn resolver(
    primary: Arc<FakePrimary>,
    secondary: Arc<FakeSecondary>,
    products: ProductConfig,
) -> SourceResolver {
    SourceResolver::new(primary, secondary, PayloadExtractor::new(4), products)
}

pub fn release_ticket(id: WorkItemId) -> ReleaseTicket {
    ReleaseTicket {
        id: id.to_string(),
        title: Some(format!("Release ticket {}", id)),
        product: Some("Windows 10 1809".to_string()),
        origin_product: Some("Windows 10 1809".to_string()),
        update_type: Some("Cumulative Non-Security (Update)".to_string()),
        release: Some("2023.03 B".to_string()),
        kb_article: Some("5023702".to_string()),
        ..Default::default()
    }
}

pub fn legacy_bug(id: WorkItemId, binary_files: &str) -> LegacyWorkItem {
    LegacyWorkItem {
        id,
        work_item_type: Some("Bug".to_string()),
        is_bug: true,
        title: Some(format!("Bug {}", id)),
        product: Some("Windows 10 1809".to_string()),
        release: Some("2023.03 B".to_string()),
        triage: "Approved".to_string(),
        issue_type: Some("Code Defect".to_string()),
        binary_files: Some(binary_files.to_string()),
        ..Default::default()
    }
}

pub fn bug_record(id: WorkItemId, binary_files: &str) -> BugPayloadRecord {
    BugPayloadRecord {
        id,
        binary_files: Some(binary_files.to_string()),
        repro_steps: None,
        release: Some("2023.03 B".to_string()),
    }
}

pub fn lcu_package(job_id: i32) -> BaselinePackage {
    BaselinePackage {
        package_type: Some("LatestCumulativeUpdate".to_string()),
        package_job_id: job_id,
        ..Default::default()
    }
}

pub fn rebase_candidate(ttgl: &str, build: &str, packages: Vec<BaselinePackage>) -> RebaseBaseline {
    RebaseBaseline {
        ttgl: wis_common::time::parse_timestamp(ttgl),
        virtual_build_string: Some(build.to_string()),
        baseline_package_job_infos: Some(packages),
        ..Default::default()
    }
}
