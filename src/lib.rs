//! # restive
//!
//! Declarative REST resources on hyper. An operation states its verb, path
//! template, parameter kinds, and content types once, at startup. restive
//! matches each request to one operation, binds and coerces its arguments,
//! calls the handler, and encodes what it returns.
//!
//! ## Templates
//!
//! `/customer/{id_customer}/orders?<status>` has `customer` and `orders` as
//! its service name, one path parameter bound by position, and one query
//! parameter bound by name. An operation matches a request when the verb
//! is the same, every literal appears in the path, and the path has exactly
//! as many segments as literals plus path parameters.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use restive::{Call, Operation, ParamKind, Resource, Router, Server};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), restive::Error> {
//!     let customers = Resource::new("customer")
//!         .route(
//!             Operation::get("/customer/{id_customer}")
//!                 .types([ParamKind::Integer])
//!                 .produces("application/json"),
//!             get_customer,
//!         )?
//!         .route(
//!             Operation::put("/customer/{id_customer}")
//!                 .params(["id_customer", "name_customer", "address_customer"])
//!                 .produces("application/json"),
//!             update_customer,
//!         )?;
//!
//!     let app = Router::new().resource(customers)?;
//!     Server::bind("0.0.0.0:8080").serve(app).await
//! }
//!
//! async fn get_customer(call: Call) -> serde_json::Value {
//!     json!({ "id": call.int("id_customer") })
//! }
//!
//! async fn update_customer(call: Call) -> serde_json::Value {
//!     json!({
//!         "id": call.text("id_customer"),
//!         "name": call.text("name_customer"),
//!         "address": call.text("address_customer"),
//!     })
//! }
//! ```
//!
//! ## Failures
//!
//! Bad declarations fail at startup with [`ConfigError`]. Failures inside a
//! request are answered with an HTML error page (`405`, `404`, `415`, `500`)
//! and never abort the server, unless the operation opted into `catch_fire`.

mod coerce;
mod error;
mod handler;
mod media;
mod method;
mod operation;
mod reply;
mod request;
mod resource;
mod response;
mod router;
mod server;
mod status;
mod template;
mod xml;

pub use coerce::{convert, ParamKind, Value};
pub use error::{BoxError, ConfigError, ConversionError, DispatchError, Error};
pub use handler::{Call, Handler};
pub use media::MediaType;
pub use method::{Method, UnknownMethod};
pub use operation::{Operation, Route};
pub use reply::{IntoReply, Reply};
pub use request::Request;
pub use resource::{Dispatched, Resource};
pub use response::{Response, ResponseBuilder};
pub use router::Router;
pub use server::Server;
pub use status::Status;
pub use template::PathTemplate;
pub use xml::{Element, Node, XmlDocument};
