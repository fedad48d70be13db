// flow/src/lib.rs

//! Named-step asynchronous pipelines for the storefront.
//!
//! A pipeline is an ordered list of named steps. Each step carries `before`,
//! `on` and `after` handlers that operate on a shared [`ContextData`]. Handlers
//! may stop the pipeline early, fail it with the pipeline's error type, or let
//! it continue. Steps can be optional (no handler is fine) or skipped by a
//! condition evaluated against the context.
//!
//! The [`FlowRegistry`] stores one pipeline per context type so callers only
//! need to build the context and ask the registry to run it.

pub mod core;
pub mod error;
pub mod pipeline;
pub mod registry;

pub use crate::core::context::Handler;
pub use crate::core::context_data::ContextData;
pub use crate::core::control::{PipelineControl, PipelineResult};
pub use crate::core::step::{SkipCondition, StepDef};

pub use crate::pipeline::definition::Pipeline;

pub use crate::error::{FlowError, FlowResult};

pub use crate::registry::FlowRegistry;
