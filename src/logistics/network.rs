//! Boundary to the external resource acquisition layer (terminal network, market)

use crate::core::types::ObjectId;
use crate::world::resources::ResourceType;
use ahash::AHashMap;
use serde::{Deserialize, Serialize};

/// Fire-and-forget resource acquisition
pub trait ResourceNetwork {
    /// Ask the network to deliver `amount` of `resource` to `receiver`
    ///
    /// `tolerance` is how far below `amount` the receiver can still be
    /// considered satisfied; `None` lets the network decide.
    fn request_resource(
        &mut self,
        receiver: ObjectId,
        resource: ResourceType,
        amount: u32,
        urgent: bool,
        tolerance: Option<u32>,
    );

    /// Amount of `resource` held across the network
    fn assets(&self, _resource: ResourceType) -> u32 {
        0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceRequest {
    pub receiver: ObjectId,
    pub resource: ResourceType,
    pub amount: u32,
    pub urgent: bool,
    pub tolerance: Option<u32>,
}

/// Network that records every request for the caller to fulfil later
#[derive(Debug, Clone, Default)]
pub struct RequestLog {
    requests: Vec<ResourceRequest>,
    assets: AHashMap<ResourceType, u32>,
}

impl RequestLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report `amount` of `resource` as held elsewhere in the network
    pub fn with_assets(mut self, resource: ResourceType, amount: u32) -> Self {
        self.assets.insert(resource, amount);
        self
    }

    pub fn requests(&self) -> &[ResourceRequest] {
        &self.requests
    }

    /// Total requested for `resource` across every receiver
    pub fn requested(&self, resource: ResourceType) -> u32 {
        self.requests
            .iter()
            .filter(|r| r.resource == resource)
            .map(|r| r.amount)
            .sum()
    }

    pub fn drain(&mut self) -> Vec<ResourceRequest> {
        std::mem::take(&mut self.requests)
    }
}

impl ResourceNetwork for RequestLog {
    fn request_resource(
        &mut self,
        receiver: ObjectId,
        resource: ResourceType,
        amount: u32,
        urgent: bool,
        tolerance: Option<u32>,
    ) {
        self.requests.push(ResourceRequest {
            receiver,
            resource,
            amount,
            urgent,
            tolerance,
        });
    }

    fn assets(&self, resource: ResourceType) -> u32 {
        self.assets.get(&resource).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_log_records_and_drains() {
        let mut log = RequestLog::new();
        log.request_resource(ObjectId(1), ResourceType::Hydrogen, 100, true, Some(0));
        log.request_resource(ObjectId(1), ResourceType::Hydrogen, 20, false, None);
        log.request_resource(ObjectId(1), ResourceType::Oxygen, 5, false, None);

        assert_eq!(log.requested(ResourceType::Hydrogen), 120);
        assert!(log.requests()[0].urgent);
        assert_eq!(log.drain().len(), 3);
        assert!(log.requests().is_empty());
    }
}
