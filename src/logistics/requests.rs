//! Per-tick transport request registry
//!
//! Subsystems register what each target needs brought in (inputs) or carried
//! away (outputs). Transport agents poll the group; it never moves anything
//! itself. The group is cleared at the start of every tick, so nothing
//! registered on one tick survives to the next.

use crate::core::types::{ObjectId, Position};
use crate::priorities::Priority;
use crate::world::entity::Entity;
use crate::world::resources::ResourceType;
use ahash::AHashMap;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RequestKind {
    /// Target wants the resource delivered
    Input,
    /// Target has the resource to give away
    Output,
}

/// What to request; a missing amount is derived from the target's state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestSpec {
    pub resource: ResourceType,
    pub amount: Option<u32>,
}

impl RequestSpec {
    pub fn new(resource: ResourceType) -> Self {
        Self {
            resource,
            amount: None,
        }
    }

    pub fn with_amount(mut self, amount: u32) -> Self {
        self.amount = Some(amount);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransportRequest {
    pub target: ObjectId,
    pub pos: Position,
    pub priority: Priority,
    pub kind: RequestKind,
    pub resource: ResourceType,
    pub amount: u32,
    /// Registration order within the tick
    pub seq: u64,
}

type RequestKey = (ObjectId, RequestKind, ResourceType);

/// All transport requests of one colony for the current tick
///
/// At most one request exists per (target, kind, resource); registering the
/// same triple again replaces the earlier request.
#[derive(Debug, Clone, Default)]
pub struct TransportRequestGroup {
    requests: AHashMap<RequestKey, TransportRequest>,
    next_seq: u64,
}

impl TransportRequestGroup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask for `spec.resource` to be delivered to `target`
    ///
    /// Without an explicit amount the target's free capacity is requested.
    /// Returns false when nothing is requested; a zero-amount call still
    /// removes an earlier request for the same resource.
    pub fn request_input(&mut self, target: &Entity, priority: Priority, spec: RequestSpec) -> bool {
        let amount = spec
            .amount
            .unwrap_or_else(|| target.free_capacity(spec.resource));
        self.register(target, priority, RequestKind::Input, spec.resource, amount)
    }

    /// Ask for `spec.resource` to be carried away from `target`
    ///
    /// Without an explicit amount everything the target holds is requested.
    pub fn request_output(&mut self, target: &Entity, priority: Priority, spec: RequestSpec) -> bool {
        let amount = spec.amount.unwrap_or_else(|| target.amount_of(spec.resource));
        self.register(target, priority, RequestKind::Output, spec.resource, amount)
    }

    fn register(
        &mut self,
        target: &Entity,
        priority: Priority,
        kind: RequestKind,
        resource: ResourceType,
        amount: u32,
    ) -> bool {
        let key = (target.id, kind, resource);
        if amount == 0 {
            self.requests.remove(&key);
            return false;
        }
        let seq = self.next_seq;
        self.next_seq += 1;
        self.requests.insert(
            key,
            TransportRequest {
                target: target.id,
                pos: target.pos,
                priority,
                kind,
                resource,
                amount,
                seq,
            },
        );
        true
    }

    /// Input requests, most urgent tier first, then in registration order
    pub fn inputs(&self) -> Vec<&TransportRequest> {
        self.sorted(RequestKind::Input)
    }

    /// Output requests, most urgent tier first, then in registration order
    pub fn outputs(&self) -> Vec<&TransportRequest> {
        self.sorted(RequestKind::Output)
    }

    /// Input requests, most urgent tier first, then closest to `from`
    pub fn inputs_by_distance(&self, from: Position) -> Vec<&TransportRequest> {
        self.sorted_by_distance(RequestKind::Input, from)
    }

    pub fn outputs_by_distance(&self, from: Position) -> Vec<&TransportRequest> {
        self.sorted_by_distance(RequestKind::Output, from)
    }

    /// Everything `target` still needs this tick
    pub fn pending_inputs(&self, target: ObjectId) -> Vec<&TransportRequest> {
        self.for_target(target, RequestKind::Input)
    }

    /// Everything `target` has to give away this tick
    pub fn pending_outputs(&self, target: ObjectId) -> Vec<&TransportRequest> {
        self.for_target(target, RequestKind::Output)
    }

    pub fn needs_input(&self, target: ObjectId, resource: ResourceType) -> bool {
        self.requests
            .contains_key(&(target, RequestKind::Input, resource))
    }

    pub fn get(
        &self,
        target: ObjectId,
        kind: RequestKind,
        resource: ResourceType,
    ) -> Option<&TransportRequest> {
        self.requests.get(&(target, kind, resource))
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    /// Start a new tick
    pub fn clear(&mut self) {
        self.requests.clear();
        self.next_seq = 0;
    }

    fn sorted(&self, kind: RequestKind) -> Vec<&TransportRequest> {
        let mut requests: Vec<&TransportRequest> =
            self.requests.values().filter(|r| r.kind == kind).collect();
        requests.sort_by_key(|r| (r.priority, r.seq));
        requests
    }

    fn sorted_by_distance(&self, kind: RequestKind, from: Position) -> Vec<&TransportRequest> {
        let mut requests: Vec<&TransportRequest> =
            self.requests.values().filter(|r| r.kind == kind).collect();
        requests.sort_by_key(|r| (r.priority, r.pos.range_to(&from), r.seq));
        requests
    }

    fn for_target(&self, target: ObjectId, kind: RequestKind) -> Vec<&TransportRequest> {
        let mut requests: Vec<&TransportRequest> = self
            .requests
            .values()
            .filter(|r| r.target == target && r.kind == kind)
            .collect();
        requests.sort_by_key(|r| r.seq);
        requests
    }
}
