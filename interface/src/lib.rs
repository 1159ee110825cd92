//! Abstract seams the rest of the engine is built against: what a task
//! *does* (`Action`) and where its span events go (`Tracer`). Neither type
//! knows anything about graphs, scheduling, or retries — that lives in
//! `taskforge-graph` and `taskforge-runtime`.

mod action;
mod tracer;

pub use action::{fn_action, value_action, Action, ActionError, ActionResult, Artifact};
pub use tracer::{NullTracer, SpanId, Tracer, TracingTracer};
