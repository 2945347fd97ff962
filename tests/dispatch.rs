//! End-to-end dispatch through `Router::handle`, no sockets involved.

use std::sync::{Arc, Mutex};

use restive::{
    Call, ConfigError, DispatchError, Element, Error, Method, Operation, ParamKind, Request,
    Resource, Response, Router, Status, Value, XmlDocument,
};
use serde_json::json;

const JSON: &str = "application/json";

type Seen = Arc<Mutex<Vec<Vec<Value>>>>;

/// Handler that records its arguments and echoes them back as JSON.
fn recorder(seen: &Seen) -> impl Fn(Call) -> std::future::Ready<serde_json::Value> + Send + Sync + use<> {
    let seen = Arc::clone(seen);
    move |call: Call| {
        seen.lock().unwrap().push(call.args().to_vec());
        std::future::ready(json!({ "args": call.args() }))
    }
}

fn request(method: Method, target: &str) -> Request {
    Request::new(method, target, vec![], vec![])
}

fn form(method: Method, target: &str, body: &str) -> Request {
    Request::new(
        method,
        target,
        vec![("Content-Type".into(), "application/x-www-form-urlencoded".into())],
        body.as_bytes().to_vec(),
    )
}

fn body(response: &Response) -> &str {
    std::str::from_utf8(response.body()).unwrap()
}

fn customers(seen: &Seen) -> Router {
    let resource = Resource::new("customer")
        .route(Operation::get("/customer").produces(JSON), recorder(seen))
        .unwrap()
        .route(
            Operation::delete("/customer/{id_customer}").produces(JSON),
            recorder(seen),
        )
        .unwrap()
        .route(
            Operation::put("/customer/{id_customer}")
                .params(["id_customer", "name_customer", "address_customer"])
                .produces(JSON),
            recorder(seen),
        )
        .unwrap();
    Router::new().resource(resource).unwrap()
}

#[tokio::test]
async fn delete_binds_path_parameter() {
    let seen = Seen::default();
    let out = customers(&seen).handle(request(Method::Delete, "/customer/42")).await;

    assert_eq!(out.response.status_code(), 200);
    assert_eq!(*seen.lock().unwrap(), [vec![Value::from("42")]]);
    assert!(out.escalation.is_none());
}

#[tokio::test]
async fn put_binds_path_then_form_arguments() {
    let seen = Seen::default();
    let out = customers(&seen)
        .handle(form(Method::Put, "/customer/42", "name_customer=Bob&address_customer=Main+St"))
        .await;

    assert_eq!(out.response.status_code(), 200);
    assert_eq!(out.response.header("content-type"), Some(JSON));
    let doc: serde_json::Value = serde_json::from_slice(out.response.body()).unwrap();
    assert_eq!(doc, json!({ "args": ["42", "Bob", "Main St"] }));
}

#[tokio::test]
async fn put_without_arguments_gets_nulls() {
    let seen = Seen::default();
    customers(&seen).handle(request(Method::Put, "/customer/7")).await;
    assert_eq!(
        *seen.lock().unwrap(),
        [vec![Value::from("7"), Value::Null, Value::Null]]
    );
}

#[tokio::test]
async fn unsupported_verb_is_405() {
    let seen = Seen::default();
    let resource = Resource::new("customer")
        .route(Operation::get("/customer/{id_customer}"), recorder(&seen))
        .unwrap()
        .route(Operation::delete("/customer/{id_customer}"), recorder(&seen))
        .unwrap();
    let router = Router::new().resource(resource).unwrap();

    let out = router.handle(form(Method::Put, "/customer/42", "name_customer=Bob")).await;

    assert_eq!(out.response.status_code(), 405);
    assert!(body(&out.response).starts_with("<html><body>"));
    assert!(body(&out.response).contains("PUT"));
    assert!(seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn supported_verb_with_wrong_arity_is_404() {
    let seen = Seen::default();
    let router = customers(&seen);

    for target in ["/customer/42/extra", "/customer"] {
        let out = router.handle(request(Method::Delete, target)).await;
        assert_eq!(out.response.status_code(), 404, "{target}");
    }
    assert!(seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn segment_count_selects_among_shared_literals() {
    let seen = Seen::default();
    let resource = Resource::new("task")
        .route(Operation::get("/api/{instance}/task").name("tasks"), recorder(&seen))
        .unwrap()
        .route(Operation::get("/api/{instance}/task/{task}").name("task"), recorder(&seen))
        .unwrap();

    resource.dispatch(request(Method::Get, "/api/i1/task")).await;
    resource.dispatch(request(Method::Get, "/api/i1/task/t9")).await;
    // Literal positions are not significant to the resource.
    resource.dispatch(request(Method::Get, "/task/i2/api")).await;

    assert_eq!(
        *seen.lock().unwrap(),
        [
            vec![Value::from("i1")],
            vec![Value::from("i1"), Value::from("t9")],
            vec![Value::from("i2")],
        ]
    );
}

#[tokio::test]
async fn first_declared_match_wins() {
    let hits = Arc::new(Mutex::new(Vec::new()));
    let tag = |name: &'static str| {
        let hits = Arc::clone(&hits);
        move |_call: Call| {
            hits.lock().unwrap().push(name);
            std::future::ready(())
        }
    };
    let resource = Resource::new("c")
        .route(Operation::get("/c/{a}"), tag("first"))
        .unwrap()
        .route(Operation::get("/c/{b}"), tag("second"))
        .unwrap();

    resource.dispatch(request(Method::Get, "/c/1")).await;
    assert_eq!(*hits.lock().unwrap(), ["first"]);
}

#[tokio::test]
async fn coercion_by_declared_kind() {
    let seen = Seen::default();
    let resource = Resource::new("flag")
        .route(
            Operation::get("/flag/{id}?<on>&<ratio>")
                .types([ParamKind::Long, ParamKind::Boolean, ParamKind::Float])
                .produces(JSON),
            recorder(&seen),
        )
        .unwrap();

    let out = resource.dispatch(request(Method::Get, "/flag/3?on=TRUE&ratio=0.5")).await;

    assert_eq!(out.response.status_code(), 200);
    assert_eq!(
        *seen.lock().unwrap(),
        [vec![Value::Integer(3), Value::Boolean(true), Value::Float(0.5)]]
    );
}

#[tokio::test]
async fn non_literal_boolean_is_500() {
    let seen = Seen::default();
    let resource = Resource::new("flag")
        .route(
            Operation::get("/flag?<on>").types([ParamKind::Boolean]).produces(JSON),
            recorder(&seen),
        )
        .unwrap();

    let out = resource.dispatch(request(Method::Get, "/flag?on=7")).await;

    assert_eq!(out.response.status_code(), 500);
    assert!(body(&out.response).starts_with("<html><body>Internal Server Error : "));
    assert!(seen.lock().unwrap().is_empty());
    assert!(out.escalation.is_none());
}

#[tokio::test]
async fn manual_response_is_sent_as_written() {
    async fn export(mut call: Call) -> serde_json::Value {
        call.respond(
            Response::builder()
                .status(Status::Accepted)
                .bytes("text/csv", b"1,Bob\n".to_vec()),
        );
        json!({ "ignored": true })
    }
    let resource = Resource::new("export")
        .route(Operation::get("/export").manual_response(true).produces(JSON), export)
        .unwrap();

    let out = resource.dispatch(request(Method::Get, "/export")).await;

    assert_eq!(out.response.status_code(), 202);
    assert_eq!(out.response.header("content-type"), Some("text/csv"));
    assert_eq!(body(&out.response), "1,Bob\n");
}

#[tokio::test]
async fn manual_response_without_writing_is_empty() {
    async fn silent(_call: Call) -> serde_json::Value {
        json!({ "ignored": true })
    }
    let resource = Resource::new("m")
        .route(Operation::get("/m").manual_response(true).produces(JSON), silent)
        .unwrap();

    let out = resource.dispatch(request(Method::Get, "/m")).await;

    assert_eq!(out.response.status_code(), 200);
    assert_eq!(out.response.header("content-type"), Some(JSON));
    assert!(out.response.body().is_empty());
}

#[tokio::test]
async fn empty_reply_writes_nothing() {
    async fn nothing(_call: Call) -> Option<serde_json::Value> {
        None
    }
    let resource = Resource::new("n")
        .route(Operation::get("/n").produces(JSON), nothing)
        .unwrap();

    let out = resource.dispatch(request(Method::Get, "/n")).await;

    assert_eq!(out.response.status_code(), 200);
    assert!(out.response.body().is_empty());
    assert!(out.response.header("content-type").is_none());
}

#[tokio::test]
async fn falsy_json_replies_end_silently() {
    for falsy in [json!({}), json!([]), json!(false), json!(""), json!(0)] {
        let reply = falsy.clone();
        let resource = Resource::new("f")
            .route(Operation::get("/f").produces(JSON), move |_call: Call| {
                std::future::ready(reply.clone())
            })
            .unwrap();

        let out = resource.dispatch(request(Method::Get, "/f")).await;

        assert_eq!(out.response.status_code(), 200, "{falsy}");
        assert!(out.response.body().is_empty(), "{falsy}");
    }
}

#[tokio::test]
async fn xml_reply_for_xml_operation() {
    async fn doc(call: Call) -> XmlDocument {
        XmlDocument::new(Element::new("customer").attr("id", call.text("id").unwrap_or("?")))
    }
    let resource = Resource::new("x")
        .route(Operation::get("/x/{id}").produces("text/xml"), doc)
        .unwrap();

    let out = resource.dispatch(request(Method::Get, "/x/5")).await;

    assert_eq!(out.response.status_code(), 200);
    assert_eq!(out.response.header("content-type"), Some("text/xml"));
    assert_eq!(body(&out.response), r#"<?xml version="1.0" ?><customer id="5"/>"#);
}

#[tokio::test]
async fn reply_shape_mismatch_is_500() {
    async fn scalar(_call: Call) -> serde_json::Value {
        json!(42)
    }
    let resource = Resource::new("s")
        .route(Operation::get("/s").produces(JSON), scalar)
        .unwrap();

    let out = resource.dispatch(request(Method::Get, "/s")).await;

    assert_eq!(out.response.status_code(), 500);
    assert_eq!(
        body(&out.response),
        "<html><body>Internal Server Error : response is not application/json document</body></html>"
    );
}

#[tokio::test]
async fn handler_error_is_500() {
    async fn failing(_call: Call) -> Result<serde_json::Value, String> {
        Err("database unavailable".into())
    }
    let resource = Resource::new("f")
        .route(Operation::get("/f").produces(JSON), failing)
        .unwrap();

    let out = resource.dispatch(request(Method::Get, "/f")).await;

    assert_eq!(out.response.status_code(), 500);
    assert!(body(&out.response).contains("database unavailable"));
    assert!(out.escalation.is_none());
}

#[tokio::test]
async fn catch_fire_escalates_after_answering() {
    async fn scalar(_call: Call) -> serde_json::Value {
        json!("not a document")
    }
    let resource = Resource::new("hot")
        .route(
            Operation::get("/hot").name("hot").produces(JSON).catch_fire(true),
            scalar,
        )
        .unwrap();

    let out = resource.dispatch(request(Method::Get, "/hot")).await;

    assert_eq!(out.response.status_code(), 500);
    match out.escalation {
        Some(Error::Escalated { operation, source }) => {
            assert_eq!(operation, "hot");
            assert!(matches!(source, DispatchError::Serialization { .. }));
        }
        other => panic!("expected escalation, got {other:?}"),
    }
}

#[tokio::test]
async fn consumes_rejects_other_body_types() {
    async fn create(call: Call) -> serde_json::Value {
        call.json_body().unwrap_or(serde_json::Value::Null)
    }
    let resource = Resource::new("c")
        .route(Operation::post("/c").consumes(JSON).produces(JSON), create)
        .unwrap();

    let xml = Request::new(
        Method::Post,
        "/c",
        vec![("content-type".into(), "application/xml".into())],
        b"<a/>".to_vec(),
    );
    assert_eq!(resource.dispatch(xml).await.response.status_code(), 415);

    let json_req = Request::new(
        Method::Post,
        "/c",
        vec![("content-type".into(), "application/json; charset=utf-8".into())],
        br#"{"name":"Bob"}"#.to_vec(),
    );
    let out = resource.dispatch(json_req).await;
    assert_eq!(out.response.status_code(), 200);
    assert_eq!(body(&out.response), r#"{"name":"Bob"}"#);
}

#[test]
fn registration_round_trip() {
    let seen = Seen::default();
    let resource = Resource::new("api")
        .route(Operation::get("/api/{instance_id}/task/{task_id}"), recorder(&seen))
        .unwrap()
        .route(Operation::get("/api/{instance_id}?<verbose>"), recorder(&seen))
        .unwrap();

    assert_eq!(
        resource.paths(),
        ["/api/{instance_id}/task/{task_id}", "/api/{instance_id}?<verbose>"]
    );
    assert_eq!(
        resource.handlers(),
        [("/api/{p0}/task/{p1}".to_owned(), "api"), ("/api/{p0}".to_owned(), "api")]
    );

    let route = &resource.routes()[1];
    assert_eq!(route.template().service_name(), ["api"]);
    assert_eq!(route.template().path_params(), ["instance_id"]);
    assert_eq!(route.template().query_params(), ["verbose"]);
}

#[test]
fn configuration_errors_surface_at_registration() {
    let seen = Seen::default();
    let err = Resource::new("bad")
        .route(Operation::get("/bad").produces("text/plain"), recorder(&seen))
        .unwrap_err();
    assert!(matches!(err, ConfigError::UnknownMediaType { .. }));

    let err = Resource::new("bad")
        .route(Operation::get("/bad/{id"), recorder(&seen))
        .unwrap_err();
    assert!(matches!(err, ConfigError::MalformedTemplate { .. }));

    let as_error: Error = err.into();
    assert!(as_error.to_string().starts_with("configuration: malformed path template"));
}
