use std::{any::Any, fmt, future::Future, pin::Pin, sync::Arc};

use async_trait::async_trait;
use thiserror::Error;

/// The dynamically-typed value a task produces and its children consume.
/// Actions are statically unaware of each other's concrete types, so the
/// slot is a type-erased `Any`; a task that wants a concrete type downcasts
/// it back out (see `Artifact::downcast_ref`-style access on `Arc<dyn Any>`).
pub type Artifact = Arc<dyn Any + Send + Sync>;

#[derive(Error, Debug, Clone)]
#[error("{message}")]
pub struct ActionError {
    pub message: String,
}

impl ActionError {
    pub fn new(message: impl Into<String>) -> Self {
        ActionError {
            message: message.into(),
        }
    }
}

pub type ActionResult = Result<Artifact, ActionError>;

/// One task's executable body. Called once per attempt with the parent
/// artifacts in parent-declaration order; must tolerate being called more
/// than once if the descriptor's retry count is non-zero.
#[async_trait]
pub trait Action: Send + Sync {
    async fn call(&self, inputs: Vec<Artifact>) -> ActionResult;
}

impl fmt::Debug for dyn Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Action{{}}")
    }
}

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Adapts a plain async closure `Fn(Vec<Artifact>) -> impl Future<Output = ActionResult>`
/// into an `Action`, so callers do not need a dedicated struct for simple
/// tasks. Mirrors the teacher's habit of providing a couple of concrete,
/// ready-to-use task implementations (`CommandTask`, `NoopTask`) next to the
/// bare trait.
pub struct FnAction<F> {
    f: F,
}

impl<F> FnAction<F> {
    pub fn new(f: F) -> Self {
        FnAction { f }
    }
}

#[async_trait]
impl<F> Action for FnAction<F>
where
    F: for<'a> Fn(Vec<Artifact>) -> BoxFuture<'a, ActionResult> + Send + Sync,
{
    async fn call(&self, inputs: Vec<Artifact>) -> ActionResult {
        (self.f)(inputs).await
    }
}

/// Builds an `Arc<dyn Action>` from an async closure, boxing its returned
/// future for you. Typical use:
/// ```ignore
/// fn_action(|inputs| Box::pin(async move { Ok(Arc::new(42i64) as Artifact) }))
/// ```
pub fn fn_action<F>(f: F) -> Arc<dyn Action>
where
    F: for<'a> Fn(Vec<Artifact>) -> BoxFuture<'a, ActionResult> + Send + Sync + 'static,
{
    Arc::new(FnAction::new(f))
}

/// An action that ignores its inputs and resolves immediately to a fixed
/// artifact. Useful for root tasks and in tests.
struct ValueAction {
    value: Artifact,
}

#[async_trait]
impl Action for ValueAction {
    async fn call(&self, _inputs: Vec<Artifact>) -> ActionResult {
        Ok(self.value.clone())
    }
}

pub fn value_action<T: Any + Send + Sync>(value: T) -> Arc<dyn Action> {
    Arc::new(ValueAction {
        value: Arc::new(value),
    })
}
