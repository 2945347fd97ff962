//! Resources and the per-request dispatch algorithm.
//!
//! A [`Resource`] is an ordered list of compiled [`Route`]s sharing one
//! responsibility (`customer`, `order`, …). The host router hands it every
//! request whose path belongs to it, and [`Resource::dispatch`] does the rest:
//!
//! 1. `405` if no route of the resource declares the request verb.
//! 2. Pick the first route, in declaration order, whose verb matches, whose
//!    literals all appear in the path, and whose literal count plus path
//!    parameter count equals the number of path segments. `404` if none.
//! 3. `415` if the route consumes a type the request body is not.
//! 4. Bind path values, then named arguments; coerce each to its kind.
//! 5. Invoke the handler and encode its reply per `produces`.
//!
//! Failures in 4 and 5 answer `500`. With `catch_fire` they are also handed
//! back as an escalation for the host to act on.

use std::collections::HashSet;

use tokio::sync::oneshot;
use tracing::{debug, error, warn};

use crate::coerce::{self, Value};
use crate::error::{ConfigError, DispatchError, Error};
use crate::handler::{Call, Handler};
use crate::method::Method;
use crate::operation::{Operation, Route};
use crate::request::Request;
use crate::response::Response;
use crate::status::Status;
use crate::template;

/// A named, ordered collection of operations.
#[derive(Debug)]
pub struct Resource {
    name: String,
    routes: Vec<Route>,
}

/// Outcome of dispatching one request.
#[derive(Debug)]
pub struct Dispatched {
    /// What the client gets. Always present, failures included.
    pub response: Response,
    /// Set when a `catch_fire` operation failed.
    pub escalation: Option<Error>,
}

impl From<Response> for Dispatched {
    fn from(response: Response) -> Self {
        Self { response, escalation: None }
    }
}

impl Resource {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), routes: Vec::new() }
    }

    /// Compiles `operation` and appends it. Declaration order is match order.
    pub fn route(mut self, operation: Operation, handler: impl Handler) -> Result<Self, ConfigError> {
        let route = operation.compile(handler.into_boxed_handler())?;
        debug!(resource = %self.name, operation = route.label(), "operation declared");
        self.routes.push(route);
        Ok(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// Every declared path template, in declaration order.
    pub fn paths(&self) -> Vec<&str> {
        self.routes.iter().map(|r| r.template().as_str()).collect()
    }

    /// `(router pattern, resource name)` for each distinct template.
    pub fn handlers(&self) -> Vec<(String, &str)> {
        let mut seen = HashSet::new();
        self.routes
            .iter()
            .filter(|r| seen.insert(r.template().as_str()))
            .map(|r| (r.template().pattern().to_owned(), self.name.as_str()))
            .collect()
    }

    /// Verbs declared by at least one operation.
    pub fn methods(&self) -> HashSet<Method> {
        self.routes.iter().map(Route::method).collect()
    }

    /// Routes, binds, invokes, and encodes one request.
    pub async fn dispatch(&self, request: Request) -> Dispatched {
        let method = request.method();

        if !self.routes.iter().any(|r| r.method() == method) {
            warn!(resource = %self.name, %method, path = request.path(), "verb not supported");
            return Response::html_error(
                Status::MethodNotAllowed,
                &format!("The service does not have {method} verb"),
            )
            .into();
        }

        let route = {
            let segments = template::segments(request.path());
            self.routes.iter().find(|r| r.matches(method, &segments))
        };
        let Some(route) = route else {
            warn!(resource = %self.name, %method, path = request.path(), "no operation matches");
            return Response::html_error(
                Status::NotFound,
                &format!("No operation of {} matches {method} {}", self.name, request.path()),
            )
            .into();
        };

        if let Some(expected) = route.consumes() {
            let declared = request.header("content-type");
            if !request.body().is_empty() && declared.is_some_and(|ct| !expected.accepts(ct)) {
                warn!(operation = route.label(), content_type = ?declared, "unsupported media type");
                return Response::html_error(
                    Status::UnsupportedMediaType,
                    &format!("The service consumes {expected}"),
                )
                .into();
            }
        }

        debug!(resource = %self.name, operation = route.label(), "dispatching");

        match invoke(route, request).await {
            Ok(response) => response.into(),
            Err(e) => {
                error!(operation = route.label(), error = %e, "dispatch failed");
                let response = Response::html_error(
                    Status::InternalServerError,
                    &format!("Internal Server Error : {e}"),
                );
                let escalation = route.catch_fire().then(|| Error::Escalated {
                    operation: route.label().to_owned(),
                    source: e,
                });
                Dispatched { response, escalation }
            }
        }
    }
}

/// Raw values in handler order: path values left to right, then each
/// remaining parameter looked up by name among the request arguments.
pub(crate) fn bind_arguments(
    route: &Route,
    segments: &[&str],
    request: &Request,
) -> Result<Vec<Value>, DispatchError> {
    let path_params = route.template().path_params();

    let mut raw: Vec<Option<&str>> = route
        .template()
        .path_values(segments)
        .into_iter()
        .map(Some)
        .collect();
    raw.extend(
        route
            .params()
            .iter()
            .filter(|p| !path_params.contains(*p))
            .map(|p| request.argument(p)),
    );

    if raw.len() != route.types().len() {
        return Err(DispatchError::ArgumentCount {
            expected: route.types().len(),
            found: raw.len(),
        });
    }

    raw.into_iter()
        .zip(route.types())
        .map(|(value, &kind)| match value {
            Some(v) => coerce::convert(v, kind).map_err(DispatchError::from),
            None => Ok(Value::Null),
        })
        .collect()
}

async fn invoke(route: &Route, request: Request) -> Result<Response, DispatchError> {
    let args = {
        let segments = template::segments(request.path());
        bind_arguments(route, &segments, &request)?
    };

    let (tx, mut rx) = oneshot::channel();
    let call = Call::new(request, route.shared_params(), args, tx);
    let reply = route.handler.call(call).await.map_err(DispatchError::Handler)?;

    // A response the handler wrote itself has already been committed.
    if let Ok(written) = rx.try_recv() {
        if !route.manual_response() {
            debug!(operation = route.label(), "handler wrote its own response");
        }
        return Ok(match route.produces() {
            Some(media) => written.default_content_type(media),
            None => written,
        });
    }

    if reply.is_empty() {
        return Ok(Response::status(Status::Ok));
    }

    if route.manual_response() {
        let response = Response::status(Status::Ok);
        return Ok(match route.produces() {
            Some(media) => response.default_content_type(media),
            None => response,
        });
    }

    let (media, body) = reply.encode(route.produces())?;
    Ok(Response::builder().bytes(media.as_str(), body))
}
