//! Records returned by the release ticket service (the primary backend)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Release ticket as served by the primary backend
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReleaseTicket {
    /// Numeric id rendered as a string
    pub id: String,
    pub title: Option<String>,
    pub product_family: Option<String>,
    pub product: Option<String>,
    pub hotpatch_product: Option<String>,
    pub origin_product: Option<String>,
    pub update_type: Option<String>,
    pub release: Option<String>,
    pub publishing_status: Option<String>,
    pub msrc_severity: Option<String>,
    pub kb_article: Option<String>,
    pub branch: Option<String>,
    pub hotpatch_branch: Option<String>,
    /// Target-to-go-live, free text
    pub ttgl: Option<String>,
    #[serde(deserialize_with = "crate::time::deserialize_optional")]
    pub created_on: Option<DateTime<Utc>>,
    #[serde(deserialize_with = "crate::time::deserialize_optional")]
    pub modified_on: Option<DateTime<Utc>>,
    pub tags: Option<Vec<String>>,
    /// Link to a saved bug-list query (`...?id=<uuid>`)
    pub payload_query: Option<String>,
    pub is_pre_rtm: bool,
    pub branch_type: Option<String>,
    pub is_baseline: bool,
    pub product_version: Option<String>,
}

/// Rebase baseline history of a release ticket
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RebaseBaselines {
    pub product: Option<String>,
    pub baselines: Option<Vec<RebaseBaseline>>,
}

/// One candidate in the rebase baseline history
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RebaseBaseline {
    pub release: Option<String>,
    pub baseline_package_job_infos: Option<Vec<BaselinePackage>>,
    pub is_baseline_live: bool,
    #[serde(deserialize_with = "crate::time::deserialize_optional")]
    pub ttgl: Option<DateTime<Utc>>,
    pub virtual_build_string: Option<String>,
}

/// Package job recorded against a rebase baseline
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BaselinePackage {
    /// e.g. "LatestCumulativeUpdate"
    pub package_type: Option<String>,
    pub package_job_id: i32,
    pub package_version: Option<String>,
    pub package_os_version: Option<String>,
}

/// Hotpatch baseline candidate of a release ticket
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HotpatchCandidate {
    pub product: Option<String>,
    pub build_string: Option<String>,
    pub lcu_kb_number: Option<i32>,
    /// Zero means no valid job
    pub lcu_package_job_id: i32,
    pub lcu_package_version: Option<String>,
    pub release: Option<String>,
    pub is_baseline_live: bool,
    #[serde(deserialize_with = "crate::time::deserialize_optional")]
    pub ttgl: Option<DateTime<Utc>>,
}
