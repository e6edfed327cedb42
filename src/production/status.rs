//! Pipeline stages

use crate::core::config::StageTimeouts;
use crate::core::types::Tick;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stage of the production pipeline, persisted as its `u8` value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum PipelineStatus {
    Idle = 0,
    AcquiringInputs = 1,
    Loading = 2,
    Processing = 3,
    Unloading = 4,
}

impl PipelineStatus {
    /// Maximum ticks the pipeline may stay in this stage; `None` is unbounded
    pub fn timeout(self, timeouts: &StageTimeouts) -> Option<Tick> {
        match self {
            PipelineStatus::Idle => timeouts.idle,
            PipelineStatus::AcquiringInputs => timeouts.acquiring_inputs,
            PipelineStatus::Loading => timeouts.loading,
            PipelineStatus::Processing => timeouts.processing,
            PipelineStatus::Unloading => timeouts.unloading,
        }
    }
}

impl TryFrom<u8> for PipelineStatus {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(PipelineStatus::Idle),
            1 => Ok(PipelineStatus::AcquiringInputs),
            2 => Ok(PipelineStatus::Loading),
            3 => Ok(PipelineStatus::Processing),
            4 => Ok(PipelineStatus::Unloading),
            other => Err(other),
        }
    }
}

impl From<PipelineStatus> for u8 {
    fn from(status: PipelineStatus) -> Self {
        status as u8
    }
}

impl fmt::Display for PipelineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineStatus::Idle => "idle",
            PipelineStatus::AcquiringInputs => "acquiring inputs",
            PipelineStatus::Loading => "loading",
            PipelineStatus::Processing => "processing",
            PipelineStatus::Unloading => "unloading",
        };
        f.write_str(name)
    }
}
