//! HTTP API handlers for wis-service

pub mod health;
pub mod workitems;

pub use health::health_routes;
pub use workitems::{
    get_baseline, get_hotpatch_baseline, get_payloads, get_release_month, get_work_item,
};
