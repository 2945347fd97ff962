//! Customer CRUD resource backed by an in-memory map.
//!
//! Run with:
//!   RUST_LOG=debug cargo run --example customer
//!
//! Try:
//!   curl http://localhost:8080/customer
//!   curl -X POST http://localhost:8080/customer \
//!        -d 'name_customer=Alice&address_customer=Elm+St'
//!   curl -X PUT http://localhost:8080/customer/1 \
//!        -d 'name_customer=Bob&address_customer=Main+St'
//!   curl http://localhost:8080/customer/xml/1
//!   curl http://localhost:8080/customer/export
//!   curl -X DELETE http://localhost:8080/customer/1

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use restive::{
    Call, Element, Operation, ParamKind, Resource, Response, Router, Server, XmlDocument,
};
use serde::Serialize;
use serde_json::json;
use tracing_subscriber::EnvFilter;

const JSON: &str = "application/json";

#[derive(Clone, Debug, Serialize)]
struct Customer {
    id: i64,
    name: String,
    address: String,
}

#[derive(Default)]
struct Store {
    next_id: i64,
    customers: BTreeMap<i64, Customer>,
}

type Shared = Arc<Mutex<Store>>;

#[tokio::main]
async fn main() -> Result<(), restive::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let store: Shared = Arc::default();
    let addr = std::env::var("RESTIVE_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_owned());

    Server::bind(&addr).serve(Router::new().resource(customers(store)?)?).await
}

fn customers(store: Shared) -> Result<Resource, restive::ConfigError> {
    let with = |f: fn(Shared, Call) -> Result<serde_json::Value, String>| {
        let store = Arc::clone(&store);
        move |call: Call| {
            let store = Arc::clone(&store);
            async move { f(store, call) }
        }
    };

    let xml_store = Arc::clone(&store);
    let export_store = Arc::clone(&store);

    Resource::new("customer")
        // Declared before `/customer/{id_customer}` so `export` is not read as an id.
        .route(
            Operation::get("/customer/export").name("export").manual_response(true),
            move |call: Call| export(Arc::clone(&export_store), call),
        )?
        .route(Operation::get("/customer").name("list").produces(JSON), with(list))?
        .route(
            Operation::get("/customer/{id_customer}")
                .name("get")
                .types([ParamKind::Integer])
                .produces(JSON),
            with(get),
        )?
        .route(
            Operation::get("/customer/xml/{id_customer}")
                .name("get_xml")
                .types([ParamKind::Integer])
                .produces("application/xml"),
            move |call: Call| get_xml(Arc::clone(&xml_store), call),
        )?
        .route(
            Operation::post("/customer")
                .name("create")
                .params(["name_customer", "address_customer"])
                .produces(JSON),
            with(create),
        )?
        .route(
            Operation::put("/customer/{id_customer}")
                .name("update")
                .params(["id_customer", "name_customer", "address_customer"])
                .types([ParamKind::Integer])
                .produces(JSON),
            with(update),
        )?
        .route(
            Operation::delete("/customer/{id_customer}")
                .name("delete")
                .types([ParamKind::Integer])
                .produces(JSON),
            with(delete),
        )
}

fn list(store: Shared, _call: Call) -> Result<serde_json::Value, String> {
    let store = store.lock().map_err(|e| e.to_string())?;
    let all: Vec<&Customer> = store.customers.values().collect();
    serde_json::to_value(all).map_err(|e| e.to_string())
}

fn get(store: Shared, call: Call) -> Result<serde_json::Value, String> {
    let id = call.int("id_customer").ok_or("missing id")?;
    let store = store.lock().map_err(|e| e.to_string())?;
    let customer = store.customers.get(&id).ok_or(format!("customer {id} not found"))?;
    serde_json::to_value(customer).map_err(|e| e.to_string())
}

fn create(store: Shared, call: Call) -> Result<serde_json::Value, String> {
    let mut store = store.lock().map_err(|e| e.to_string())?;
    store.next_id += 1;
    let customer = Customer {
        id: store.next_id,
        name: call.text("name_customer").unwrap_or_default().to_owned(),
        address: call.text("address_customer").unwrap_or_default().to_owned(),
    };
    store.customers.insert(customer.id, customer.clone());
    serde_json::to_value(customer).map_err(|e| e.to_string())
}

fn update(store: Shared, call: Call) -> Result<serde_json::Value, String> {
    let id = call.int("id_customer").ok_or("missing id")?;
    let mut store = store.lock().map_err(|e| e.to_string())?;
    let customer = store.customers.get_mut(&id).ok_or(format!("customer {id} not found"))?;
    if let Some(name) = call.text("name_customer") {
        customer.name = name.to_owned();
    }
    if let Some(address) = call.text("address_customer") {
        customer.address = address.to_owned();
    }
    serde_json::to_value(&*customer).map_err(|e| e.to_string())
}

fn delete(store: Shared, call: Call) -> Result<serde_json::Value, String> {
    let id = call.int("id_customer").ok_or("missing id")?;
    let mut store = store.lock().map_err(|e| e.to_string())?;
    match store.customers.remove(&id) {
        Some(c) => Ok(json!({ "deleted": c.id })),
        None => Err(format!("customer {id} not found")),
    }
}

async fn get_xml(store: Shared, call: Call) -> Result<Option<XmlDocument>, String> {
    let id = call.int("id_customer").ok_or("missing id")?;
    let store = store.lock().map_err(|e| e.to_string())?;
    Ok(store.customers.get(&id).map(|c| {
        XmlDocument::new(
            Element::new("customer")
                .attr("id", c.id.to_string())
                .child(Element::leaf("name", c.name.as_str()))
                .child(Element::leaf("address", c.address.as_str())),
        )
    }))
}

async fn export(store: Shared, mut call: Call) -> Result<(), String> {
    let csv = {
        let store = store.lock().map_err(|e| e.to_string())?;
        store
            .customers
            .values()
            .map(|c| format!("{},{},{}\n", c.id, c.name, c.address))
            .collect::<String>()
    };
    call.respond(
        Response::builder()
            .header("content-disposition", "attachment; filename=customers.csv")
            .bytes("text/csv", csv.into_bytes()),
    );
    Ok(())
}
