//! Logistics - moving resources between producers and consumers
//!
//! - `requests`: per-tick blackboard of what each object needs or offers
//! - `network`: boundary to the external acquisition layer
//! - `roads`: road upkeep and paver assignment

pub mod network;
pub mod requests;
pub mod roads;

pub use network::{RequestLog, ResourceNetwork, ResourceRequest};
pub use requests::{RequestKind, RequestSpec, TransportRequest, TransportRequestGroup};
pub use roads::RoadLogistics;
