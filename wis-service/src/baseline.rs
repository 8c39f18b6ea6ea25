//! Baseline selection
//!
//! Picks the baseline a release ticket builds on out of its rebase history,
//! and validates the hotpatch lineage record.

use tracing::{debug, info};
use wis_common::models::{BaselineInfo, HotpatchBaseline, HotpatchCandidate, RebaseBaseline};
use wis_common::WorkItemId;

/// Package type holding the cumulative update job
pub const LCU_PACKAGE_TYPE: &str = "LatestCumulativeUpdate";

/// Latest baseline out of `candidates`, by target-to-go-live date
///
/// Ties keep the earliest candidate. Returns `None` for an empty history.
pub fn select_baseline(
    release_ticket_id: WorkItemId,
    candidates: &[RebaseBaseline],
) -> Option<BaselineInfo> {
    let latest = candidates
        .iter()
        .reduce(|best, candidate| if candidate.ttgl > best.ttgl { candidate } else { best });

    let Some(latest) = latest else {
        info!(release_ticket_id, "No rebase baselines recorded");
        return None;
    };

    let virtual_build_name = latest
        .virtual_build_string
        .as_deref()
        .map(str::trim)
        .unwrap_or_default()
        .to_string();

    let lcu_job_id = latest
        .baseline_package_job_infos
        .iter()
        .flatten()
        .find(|package| {
            package
                .package_type
                .as_deref()
                .map_or(false, |t| t.eq_ignore_ascii_case(LCU_PACKAGE_TYPE))
        })
        .map(|package| package.package_job_id)
        .unwrap_or(0);

    debug!(
        release_ticket_id,
        lcu_job_id,
        release = ?latest.release,
        "Selected rebase baseline"
    );

    Some(BaselineInfo {
        release_ticket_id,
        lcu_job_id,
        virtual_build_name,
    })
}

/// Hotpatch baseline, present only when it names a cumulative update job
pub fn select_hotpatch_baseline(
    release_ticket_id: WorkItemId,
    candidate: Option<&HotpatchCandidate>,
) -> Option<HotpatchBaseline> {
    let candidate = candidate?;
    if candidate.lcu_package_job_id == 0 {
        info!(release_ticket_id, "Hotpatch baseline has no LCU package job");
        return None;
    }

    Some(HotpatchBaseline {
        release_ticket_id,
        lcu_job_id: candidate.lcu_package_job_id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use wis_common::models::BaselinePackage;

    fn package(package_type: &str, job_id: i32) -> BaselinePackage {
        BaselinePackage {
            package_type: Some(package_type.to_string()),
            package_job_id: job_id,
            ..Default::default()
        }
    }

    fn candidate(month: u32, build: &str, packages: Vec<BaselinePackage>) -> RebaseBaseline {
        RebaseBaseline {
            release: Some(format!("2023.{:02} B", month)),
            baseline_package_job_infos: Some(packages),
            is_baseline_live: true,
            ttgl: Some(Utc.with_ymd_and_hms(2023, month, 1, 0, 0, 0).unwrap()),
            virtual_build_string: Some(build.to_string()),
        }
    }

    #[test]
    fn test_empty_history_is_absent() {
        assert_eq!(select_baseline(1, &[]), None);
    }

    #[test]
    fn test_latest_ttgl_wins() {
        let candidates = vec![
            candidate(1, "19041.2486", vec![package("LatestCumulativeUpdate", 100)]),
            candidate(3, " 19041.2673 ", vec![package("latestcumulativeupdate", 300)]),
        ];

        let baseline = select_baseline(55, &candidates).unwrap();
        assert_eq!(baseline.release_ticket_id, 55);
        assert_eq!(baseline.lcu_job_id, 300);
        assert_eq!(baseline.virtual_build_name, "19041.2673");
    }

    #[test]
    fn test_missing_lcu_package_defaults_to_zero() {
        let candidates = vec![candidate(2, "b", vec![package("ServicingStack", 7)])];
        assert_eq!(select_baseline(1, &candidates).unwrap().lcu_job_id, 0);

        let mut no_packages = candidate(2, "b", Vec::new());
        no_packages.baseline_package_job_infos = None;
        no_packages.virtual_build_string = None;
        let baseline = select_baseline(1, &[no_packages]).unwrap();
        assert_eq!(baseline.lcu_job_id, 0);
        assert_eq!(baseline.virtual_build_name, "");
    }

    #[test]
    fn test_hotpatch_zero_job_is_absent() {
        let candidate = HotpatchCandidate {
            lcu_package_job_id: 0,
            ..Default::default()
        };
        assert_eq!(select_hotpatch_baseline(9, Some(&candidate)), None);
        assert_eq!(select_hotpatch_baseline(9, None), None);
    }

    #[test]
    fn test_hotpatch_present() {
        let candidate = HotpatchCandidate {
            lcu_package_job_id: 4242,
            ..Default::default()
        };
        assert_eq!(
            select_hotpatch_baseline(9, Some(&candidate)),
            Some(HotpatchBaseline {
                release_ticket_id: 9,
                lcu_job_id: 4242
            })
        );
    }
}
