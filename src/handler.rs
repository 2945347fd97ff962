//! Handler trait, type erasure, and the per-request [`Call`].
//!
//! # How async handlers are stored
//!
//! A resource holds operations whose handlers all have *different* types.
//! Each one is erased behind `dyn ErasedHandler` so the operation list stays a
//! single `Vec`:
//!
//! ```text
//! async fn update(call: Call) -> Reply { … }       ← user writes this
//!        ↓ resource.route(op, update)
//! update.into_boxed_handler()                      ← Handler blanket impl
//!        ↓
//! Arc::new(FnHandler(update))                      ← stored as BoxedHandler
//!        ↓
//! handler.call(call)  at request time              ← one vtable dispatch
//!        ↓
//! Box::pin(async { update(call).await.into_reply() })
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use tokio::sync::oneshot;

use crate::coerce::Value;
use crate::error::BoxError;
use crate::reply::{IntoReply, Reply};
use crate::request::Request;
use crate::response::Response;

// ── Call ──────────────────────────────────────────────────────────────────────

/// Everything a handler receives: the coerced arguments, in declared order,
/// and the request they came from.
pub struct Call {
    request: Request,
    names: Arc<[String]>,
    args: Vec<Value>,
    responder: Option<oneshot::Sender<Response>>,
}

impl Call {
    pub(crate) fn new(
        request: Request,
        names: Arc<[String]>,
        args: Vec<Value>,
        responder: oneshot::Sender<Response>,
    ) -> Self {
        Self { request, names, args, responder: Some(responder) }
    }

    pub fn request(&self) -> &Request {
        &self.request
    }

    /// Arguments in handler-parameter order. Absent query arguments are
    /// [`Value::Null`].
    pub fn args(&self) -> &[Value] {
        &self.args
    }

    pub fn arg(&self, index: usize) -> Option<&Value> {
        self.args.get(index)
    }

    /// Argument bound to the handler parameter `name`.
    pub fn get(&self, name: &str) -> Option<&Value> {
        let index = self.names.iter().position(|n| n == name)?;
        self.args.get(index)
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    pub fn int(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(Value::as_i64)
    }

    pub fn float(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(Value::as_f64)
    }

    pub fn boolean(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(Value::as_bool)
    }

    /// Parses the request body as JSON.
    pub fn json_body<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(self.request.body())
    }

    /// Writes the response directly, bypassing reply serialization.
    ///
    /// Only the first call takes effect; later ones return `false`.
    pub fn respond(&mut self, response: Response) -> bool {
        match self.responder.take() {
            Some(tx) => tx.send(response).is_ok(),
            None => false,
        }
    }
}

// ── Internal types ────────────────────────────────────────────────────────────

pub(crate) type BoxFuture =
    Pin<Box<dyn Future<Output = Result<Reply, BoxError>> + Send + 'static>>;

#[doc(hidden)]
pub trait ErasedHandler {
    fn call(&self, call: Call) -> BoxFuture;
}

#[doc(hidden)]
pub type BoxedHandler = Arc<dyn ErasedHandler + Send + Sync + 'static>;

// ── Public Handler trait ──────────────────────────────────────────────────────

/// Implemented for every valid operation handler.
///
/// Automatically satisfied by any `async fn` with the signature:
///
/// ```text
/// async fn name(call: Call) -> impl IntoReply
/// ```
///
/// The trait is sealed; only the blanket impl below can satisfy it.
pub trait Handler: private::Sealed + Send + Sync + 'static {
    #[doc(hidden)]
    fn into_boxed_handler(self) -> BoxedHandler;
}

mod private {
    pub trait Sealed {}
}

// ── Blanket implementations ───────────────────────────────────────────────────

impl<F, Fut, R> private::Sealed for F
where
    F: Fn(Call) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoReply + Send + 'static,
{
}

impl<F, Fut, R> Handler for F
where
    F: Fn(Call) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoReply + Send + 'static,
{
    fn into_boxed_handler(self) -> BoxedHandler {
        Arc::new(FnHandler(self))
    }
}

struct FnHandler<F>(F);

impl<F, Fut, R> ErasedHandler for FnHandler<F>
where
    F: Fn(Call) -> Fut + Send + Sync,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoReply + Send + 'static,
{
    fn call(&self, call: Call) -> BoxFuture {
        let fut = (self.0)(call);
        Box::pin(async move { fut.await.into_reply() })
    }
}
