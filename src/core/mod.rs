//! Core orchestration logic.
//!
//! This module contains:
//! - Error: the pipeline error taxonomy
//! - Limits: tunable ingestion bounds
//! - Prompts and Transform: model prompt sequencing and output parsing
//! - Dispatch: classification of inbound items
//! - Orchestrator: main execution engine with the fallback policy

pub mod dispatch;
pub mod error;
pub mod limits;
pub mod orchestrator;
pub mod prompts;
pub mod transform;

// Re-export commonly used types
pub use dispatch::{classify, Capabilities, Route};
pub use error::{PipelineError, PipelineResult};
pub use limits::IngestLimits;
pub use orchestrator::{Orchestrator, OrchestratorBuilder, Outcome};
pub use transform::{SummaryRegister, TransformPipeline};
