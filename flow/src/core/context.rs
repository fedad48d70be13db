// flow/src/core/context.rs

use crate::core::context_data::ContextData;
use crate::core::control::PipelineControl;
use std::future::Future;
use std::pin::Pin;

/// A boxed step handler.
///
/// Handlers receive a clone of the pipeline's `ContextData<TData>` and return a
/// `Send` future. Lock guards taken on the context must be released before the
/// handler awaits anything.
pub type Handler<TData, Err> = Box<
  dyn Fn(ContextData<TData>) -> Pin<Box<dyn Future<Output = Result<PipelineControl, Err>> + Send>>
    + Send
    + Sync,
>;
