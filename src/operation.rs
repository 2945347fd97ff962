//! Operation declarations and the compiled route descriptors built from them.
//!
//! ```rust
//! use restive::{Operation, ParamKind};
//!
//! Operation::put("/customer/{id_customer}")
//!     .params(["id_customer", "name_customer", "address_customer"])
//!     .types([ParamKind::Integer])
//!     .produces("application/json");
//! ```
//!
//! Nothing is checked until the operation is attached to a resource with
//! [`Resource::route`](crate::Resource::route); that is where every
//! configuration error surfaces.

use std::sync::Arc;

use crate::coerce::ParamKind;
use crate::error::ConfigError;
use crate::handler::BoxedHandler;
use crate::media::MediaType;
use crate::method::Method;
use crate::template::PathTemplate;

/// Declaration of one REST operation: verb, path template, parameters, and
/// content-type contract.
#[derive(Clone, Debug)]
pub struct Operation {
    method: Method,
    template: String,
    name: Option<String>,
    params: Option<Vec<String>>,
    types: Vec<ParamKind>,
    produces: Option<String>,
    consumes: Option<String>,
    manual_response: bool,
    catch_fire: bool,
}

impl Operation {
    pub fn new(method: Method, template: impl Into<String>) -> Self {
        Self {
            method,
            template: template.into(),
            name: None,
            params: None,
            types: Vec::new(),
            produces: None,
            consumes: None,
            manual_response: false,
            catch_fire: false,
        }
    }

    pub fn get(template: impl Into<String>) -> Self { Self::new(Method::Get, template) }
    pub fn post(template: impl Into<String>) -> Self { Self::new(Method::Post, template) }
    pub fn put(template: impl Into<String>) -> Self { Self::new(Method::Put, template) }
    pub fn patch(template: impl Into<String>) -> Self { Self::new(Method::Patch, template) }
    pub fn delete(template: impl Into<String>) -> Self { Self::new(Method::Delete, template) }

    /// Name used in logs and error messages. Defaults to `"VERB template"`.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Handler parameter names, in order.
    ///
    /// Must begin with the template's `{path}` parameters in template order;
    /// every later name is read from the request arguments. Defaults to the
    /// path parameters followed by the `<query>` parameters.
    pub fn params<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.params = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Declared parameter kinds. Missing trailing kinds default to text.
    pub fn types(mut self, kinds: impl IntoIterator<Item = ParamKind>) -> Self {
        self.types = kinds.into_iter().collect();
        self
    }

    pub fn produces(mut self, media: impl Into<String>) -> Self {
        self.produces = Some(media.into());
        self
    }

    pub fn consumes(mut self, media: impl Into<String>) -> Self {
        self.consumes = Some(media.into());
        self
    }

    /// The handler writes its own response through
    /// [`Call::respond`](crate::Call::respond); its return value is not
    /// serialized.
    pub fn manual_response(mut self, on: bool) -> Self {
        self.manual_response = on;
        self
    }

    /// After answering a failed request with `500`, also report the failure
    /// to the hosting process.
    pub fn catch_fire(mut self, on: bool) -> Self {
        self.catch_fire = on;
        self
    }

    pub(crate) fn compile(self, handler: BoxedHandler) -> Result<Route, ConfigError> {
        let label = self
            .name
            .unwrap_or_else(|| format!("{} {}", self.method, self.template));

        let media = |value: Option<String>| -> Result<Option<MediaType>, ConfigError> {
            value
                .map(|v| {
                    v.parse().map_err(|()| ConfigError::UnknownMediaType {
                        operation: label.clone(),
                        value: v,
                    })
                })
                .transpose()
        };
        let produces = media(self.produces)?;
        let consumes = media(self.consumes)?;

        let template = PathTemplate::compile(&self.template)?;

        let mismatch = |reason: String| ConfigError::ParamMismatch {
            operation: label.clone(),
            reason,
        };

        let params = match self.params {
            Some(params) => {
                let leading = params.get(..template.path_params().len());
                if leading != Some(template.path_params()) {
                    return Err(mismatch(format!(
                        "handler parameters {params:?} must start with path parameters {:?}",
                        template.path_params()
                    )));
                }
                if let Some(dup) = params.iter().enumerate().find_map(|(i, p)| params[..i].contains(p).then_some(p)) {
                    return Err(mismatch(format!("handler parameter `{dup}` declared twice")));
                }
                params
            }
            None => template
                .path_params()
                .iter()
                .chain(template.query_params())
                .cloned()
                .collect(),
        };

        if self.types.len() > params.len() {
            return Err(mismatch(format!(
                "{} types declared for {} parameters",
                self.types.len(),
                params.len()
            )));
        }
        let mut types = self.types;
        types.resize(params.len(), ParamKind::Text);

        Ok(Route {
            label,
            method: self.method,
            template,
            params: params.into(),
            types,
            produces,
            consumes,
            manual_response: self.manual_response,
            catch_fire: self.catch_fire,
            handler,
        })
    }
}

/// A compiled, immutable route descriptor.
pub struct Route {
    label: String,
    method: Method,
    template: PathTemplate,
    params: Arc<[String]>,
    types: Vec<ParamKind>,
    produces: Option<MediaType>,
    consumes: Option<MediaType>,
    manual_response: bool,
    catch_fire: bool,
    pub(crate) handler: BoxedHandler,
}

impl Route {
    pub fn label(&self) -> &str { &self.label }
    pub fn method(&self) -> Method { self.method }
    pub fn template(&self) -> &PathTemplate { &self.template }
    pub fn params(&self) -> &[String] { &self.params }
    pub fn types(&self) -> &[ParamKind] { &self.types }
    pub fn produces(&self) -> Option<MediaType> { self.produces }
    pub fn consumes(&self) -> Option<MediaType> { self.consumes }
    pub fn manual_response(&self) -> bool { self.manual_response }
    pub fn catch_fire(&self) -> bool { self.catch_fire }

    pub(crate) fn shared_params(&self) -> Arc<[String]> {
        Arc::clone(&self.params)
    }

    /// Verb, literal set, and segment count all agree with the request.
    pub fn matches(&self, method: Method, segments: &[&str]) -> bool {
        self.method == method && self.template.matches(segments)
    }
}

impl std::fmt::Debug for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Route")
            .field("label", &self.label)
            .field("method", &self.method)
            .field("template", &self.template.as_str())
            .field("params", &self.params)
            .field("types", &self.types)
            .field("produces", &self.produces)
            .field("consumes", &self.consumes)
            .field("manual_response", &self.manual_response)
            .field("catch_fire", &self.catch_fire)
            .finish_non_exhaustive()
    }
}
