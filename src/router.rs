//! Host routing table: which resource owns a request path.
//!
//! Every resource publishes `(pattern, resource)` pairs through
//! [`Resource::handlers`]. The router loads them into one radix tree, looks
//! the request path up in O(path-length), and hands the request to the owning
//! resource, which picks the operation itself.

use std::collections::HashMap;

use matchit::Router as MatchitRouter;
use tracing::{info, warn};

use crate::error::ConfigError;
use crate::request::Request;
use crate::resource::{Dispatched, Resource};
use crate::response::Response;
use crate::status::Status;
use crate::template;

/// The application router.
///
/// Build it once at startup; pass it to [`Server::serve`](crate::Server::serve).
pub struct Router {
    tree: MatchitRouter<usize>,
    owners: HashMap<String, usize>,
    resources: Vec<Resource>,
}

impl Router {
    pub fn new() -> Self {
        Self { tree: MatchitRouter::new(), owners: HashMap::new(), resources: Vec::new() }
    }

    /// Registers every pattern of `resource`.
    ///
    /// Templates of one resource that normalize to the same pattern share a
    /// single entry. The same pattern claimed by two resources is an error.
    pub fn resource(mut self, resource: Resource) -> Result<Self, ConfigError> {
        let index = self.resources.len();

        for (pattern, name) in resource.handlers() {
            if self.owners.get(&pattern) == Some(&index) {
                continue;
            }
            self.tree
                .insert(pattern.as_str(), index)
                .map_err(|source| ConfigError::RouteConflict {
                    pattern: pattern.clone(),
                    resource: name.to_owned(),
                    source,
                })?;
            info!(resource = name, %pattern, "route registered");
            self.owners.insert(pattern, index);
        }

        self.resources.push(resource);
        Ok(self)
    }

    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }

    /// The resource owning `path`. Empty segments are ignored.
    pub fn lookup(&self, path: &str) -> Option<&Resource> {
        let normalized = format!("/{}", template::segments(path).join("/"));
        let matched = self.tree.at(&normalized).ok()?;
        self.resources.get(*matched.value)
    }

    /// Routes `request` to its resource and dispatches it.
    pub async fn handle(&self, request: Request) -> Dispatched {
        match self.lookup(request.path()) {
            Some(resource) => resource.dispatch(request).await,
            None => {
                warn!(method = %request.method(), path = request.path(), "no resource");
                Response::html_error(
                    Status::NotFound,
                    &format!("No resource at {}", request.path()),
                )
                .into()
            }
        }
    }
}

impl Default for Router {
    fn default() -> Self { Self::new() }
}
