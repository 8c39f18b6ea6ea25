//! Data models
//!
//! - `primary`: wire records of the release ticket service
//! - `secondary`: records recovered from the legacy tracker
//! - `external`: canonical shapes returned to callers
//! - `convert`: source record → canonical work item

pub mod convert;
pub mod external;
pub mod primary;
pub mod secondary;

pub use external::{
    BaselineInfo, CanonicalWorkItem, HotpatchBaseline, PackagingWorkItems, WorkItemBinary,
    WorkItemComponent, WorkItemKind, WorkItemPayload, WorkItemPayloads,
};
pub use primary::{BaselinePackage, HotpatchCandidate, RebaseBaseline, RebaseBaselines, ReleaseTicket};
pub use secondary::{BugPayloadRecord, LegacyWorkItem};

/// Fixed labels shared by both backends
pub mod labels {
    pub const TYPE_BUG: &str = "Bug";
    pub const TYPE_RELEASE_TICKET: &str = "Release Ticket";
    pub const TYPE_RELEASE_TICKET_PROTO: &str = "Release Ticket-Proto";
    pub const TRIAGE_APPROVED: &str = "Approved";
    pub const ISSUE_TYPE_CODE_DEFECT: &str = "Code Defect";
}
