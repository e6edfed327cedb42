//! Colony Core - tick-driven scheduling for a colony of cooperating agents

pub mod agents;
pub mod cache;
pub mod colony;
pub mod core;
pub mod events;
pub mod logistics;
pub mod priorities;
pub mod production;
pub mod stats;
pub mod tasks;
pub mod world;
