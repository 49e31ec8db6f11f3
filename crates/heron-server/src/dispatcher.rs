//! Request dispatch.
//!
//! The [`Dispatcher`] is the boundary between the transport and the
//! component model. For every request it matches a route, resolves the
//! handler's arguments, invokes the handler and translates the reply. All
//! failures stop here: the caller only ever sees a response.
//!
//! | outcome | status | body |
//! |---------|--------|------|
//! | no route for verb and path | 404 | empty |
//! | conversion, handler or encode failure, or a panic | 500 | empty |
//! | `ResponseEntity` | its status | encoded entity body |
//! | any other value | 200 | its text form |

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use http::header::{HeaderValue, CONTENT_TYPE};
use http::{HeaderMap, Method, Response, StatusCode};

use heron_core::{HandlerError, Reply, RequestId, RouteDescriptor, RouteTable, REQUEST_ID_HEADER};
use heron_router::Params;
use heron_telemetry::logging::fields::{
    DURATION_MS, ERROR, HTTP_METHOD, HTTP_PATH, HTTP_STATUS, REQUEST_ID, ROUTE,
};
use heron_telemetry::metrics::record_request;

/// Content type added to entity responses that carry a body but set none.
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Routes requests through a compiled table.
///
/// Cheap to clone; clones share the table. Safe to call from many threads at
/// once.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    routes: Arc<RouteTable>,
}

impl Dispatcher {
    /// Creates a dispatcher over a compiled table.
    #[must_use]
    pub fn new(routes: impl Into<Arc<RouteTable>>) -> Self {
        Self {
            routes: routes.into(),
        }
    }

    /// Returns the routing table.
    #[must_use]
    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    /// Handles one request and produces exactly one response.
    ///
    /// Verbs outside the supported set never match and yield 404.
    pub fn dispatch(
        &self,
        method: &Method,
        path: &str,
        headers: &HeaderMap,
        body: &[u8],
    ) -> Response<Bytes> {
        let started = Instant::now();
        let request_id = RequestId::from_header(
            headers
                .get(REQUEST_ID_HEADER)
                .and_then(|value| value.to_str().ok()),
        );

        let Some(found) = self.routes.match_method(method, path) else {
            tracing::debug!(
                { REQUEST_ID } = %request_id,
                { HTTP_METHOD } = %method,
                { HTTP_PATH } = path,
                "no route matched"
            );
            record_request(method.as_str(), StatusCode::NOT_FOUND.as_u16(), started.elapsed());
            return empty(StatusCode::NOT_FOUND);
        };

        let route = found.target();
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| call(route, &found.params, body)));

        let response = match outcome {
            Ok(Ok(reply)) => into_response(reply),
            Ok(Err(error)) => {
                tracing::error!(
                    { REQUEST_ID } = %request_id,
                    { HTTP_METHOD } = %method,
                    { HTTP_PATH } = path,
                    { ROUTE } = %route.handler_name(),
                    { ERROR } = %error,
                    "handler failed"
                );
                empty(StatusCode::INTERNAL_SERVER_ERROR)
            }
            Err(payload) => {
                tracing::error!(
                    { REQUEST_ID } = %request_id,
                    { HTTP_METHOD } = %method,
                    { HTTP_PATH } = path,
                    { ROUTE } = %route.handler_name(),
                    { ERROR } = panic_message(payload.as_ref()),
                    "handler panicked"
                );
                empty(StatusCode::INTERNAL_SERVER_ERROR)
            }
        };

        let elapsed = started.elapsed();
        tracing::debug!(
            { REQUEST_ID } = %request_id,
            { HTTP_METHOD } = %method,
            { HTTP_PATH } = path,
            { ROUTE } = %route.handler_name(),
            { HTTP_STATUS } = response.status().as_u16(),
            { DURATION_MS } = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
            "request dispatched"
        );
        record_request(method.as_str(), response.status().as_u16(), elapsed);
        response
    }
}

fn call(route: &RouteDescriptor, params: &Params, body: &[u8]) -> Result<Reply, HandlerError> {
    let args = heron_extract::resolve(route.method(), params, body)?;
    route.invoke(args)
}

fn into_response(reply: Reply) -> Response<Bytes> {
    match reply {
        Reply::Text(text) => Response::new(Bytes::from(text)),
        Reply::Entity {
            status,
            mut headers,
            body,
        } => {
            if body.is_some() && !headers.contains_key(CONTENT_TYPE) {
                headers.insert(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));
            }
            let mut response = Response::new(body.unwrap_or_default());
            *response.status_mut() = status;
            *response.headers_mut() = headers;
            response
        }
    }
}

fn empty(status: StatusCode) -> Response<Bytes> {
    let mut response = Response::new(Bytes::new());
    *response.status_mut() = status;
    response
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&'static str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}

#[cfg(test)]
mod tests {
    use super::*;
    use heron_core::meta::{
        ComponentDescriptor, Mapping, MethodDescriptor, ParamDescriptor, ParamKind,
    };
    use heron_core::{
        compile, Arguments, CompileOptions, Component, IntoReply, Registry, ResponseEntity,
    };

    #[derive(Default)]
    struct Probe;

    impl Component for Probe {
        fn descriptor() -> ComponentDescriptor {
            ComponentDescriptor::controller("Probe")
                .base_path("/probe")
                .method(
                    MethodDescriptor::new("echo")
                        .mapping(Mapping::get("/echo/{word}"))
                        .param(ParamDescriptor::path_variable("word", ParamKind::Text)),
                )
                .method(MethodDescriptor::new("boom").mapping(Mapping::get("/boom")))
                .method(MethodDescriptor::new("fail").mapping(Mapping::get("/fail")))
                .method(MethodDescriptor::new("typed").mapping(Mapping::get("/typed")))
                .method(MethodDescriptor::new("raw").mapping(Mapping::get("/raw")))
        }

        fn invoke(&self, method: &str, mut args: Arguments) -> Result<Reply, HandlerError> {
            match method {
                "echo" => args.take::<String>(0)?.into_reply(),
                "boom" => panic!("kaboom"),
                "fail" => Err(HandlerError::new("nope")),
                "typed" => ResponseEntity::ok(vec![1, 2, 3]).into_reply(),
                "raw" => ResponseEntity::ok("plain")
                    .header("content-type", "text/plain")
                    .into_reply(),
                other => Err(HandlerError::new(format!("no method {other}"))),
            }
        }
    }

    fn dispatcher() -> Dispatcher {
        let mut registry = Registry::new();
        registry.register::<Probe>();
        Dispatcher::new(compile(&registry, CompileOptions::default()).unwrap())
    }

    fn get(dispatcher: &Dispatcher, path: &str) -> Response<Bytes> {
        dispatcher.dispatch(&Method::GET, path, &HeaderMap::new(), b"")
    }

    #[test]
    fn test_text_reply() {
        let response = get(&dispatcher(), "/probe/echo/hello");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.body(), "hello");
        assert!(response.headers().is_empty());
    }

    #[test]
    fn test_not_found() {
        let dispatcher = dispatcher();
        let response = get(&dispatcher, "/probe/missing");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(response.body().is_empty());

        let response = dispatcher.dispatch(&Method::POST, "/probe/echo/x", &HeaderMap::new(), b"");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_unsupported_verb_is_not_found() {
        let response = dispatcher().dispatch(&Method::OPTIONS, "/probe/boom", &HeaderMap::new(), b"");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_handler_error_is_500() {
        let response = get(&dispatcher(), "/probe/fail");
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(response.body().is_empty());
    }

    #[test]
    fn test_panic_is_contained() {
        let dispatcher = dispatcher();
        let response = get(&dispatcher, "/probe/boom");
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(response.body().is_empty());

        let response = get(&dispatcher, "/probe/echo/again");
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[test]
    fn test_entity_gets_json_content_type() {
        let response = get(&dispatcher(), "/probe/typed");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[CONTENT_TYPE], JSON_CONTENT_TYPE);
        assert_eq!(response.body(), "[1,2,3]");
    }

    #[test]
    fn test_entity_content_type_is_kept() {
        let response = get(&dispatcher(), "/probe/raw");
        assert_eq!(response.headers()[CONTENT_TYPE], "text/plain");
        assert_eq!(response.headers().get_all(CONTENT_TYPE).iter().count(), 1);
    }

    #[test]
    fn test_empty_entity_has_no_content_type() {
        let response = into_response(ResponseEntity::<()>::no_content().into_reply().unwrap());
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(response.headers().get(CONTENT_TYPE).is_none());
        assert!(response.body().is_empty());
    }

    #[derive(Clone, Default)]
    struct Capture(Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for Capture {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn logged_fields(run: impl FnOnce()) -> Vec<serde_json::Value> {
        let capture = Capture::default();
        let writer = capture.clone();
        let subscriber = tracing_subscriber::fmt()
            .json()
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(move || writer.clone())
            .finish();
        tracing::subscriber::with_default(subscriber, run);

        let raw = capture.0.lock().unwrap().clone();
        String::from_utf8(raw)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str::<serde_json::Value>(line).unwrap())
            .map(|event| event["fields"].clone())
            .collect()
    }

    #[test]
    fn test_failure_log_uses_standard_fields() {
        let dispatcher = dispatcher();
        let events = logged_fields(|| {
            get(&dispatcher, "/probe/fail");
        });

        let failure = events
            .iter()
            .find(|fields| fields["message"] == "handler failed")
            .unwrap();
        assert!(failure[REQUEST_ID].is_string());
        assert_eq!(failure[HTTP_METHOD], "GET");
        assert_eq!(failure[HTTP_PATH], "/probe/fail");
        assert_eq!(failure[ROUTE], "Probe#fail");
        assert_eq!(failure[ERROR], "nope");
    }

    #[test]
    fn test_success_log_carries_status_and_duration() {
        let dispatcher = dispatcher();
        let events = logged_fields(|| {
            get(&dispatcher, "/probe/echo/hi");
        });

        let done = events
            .iter()
            .find(|fields| fields["message"] == "request dispatched")
            .unwrap();
        assert_eq!(done[HTTP_STATUS], 200);
        assert!(done[DURATION_MS].is_u64());
    }

    #[test]
    fn test_panic_message() {
        let payload: Box<dyn Any + Send> = Box::new("static");
        assert_eq!(panic_message(payload.as_ref()), "static");
        let payload: Box<dyn Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(payload.as_ref()), "owned");
        let payload: Box<dyn Any + Send> = Box::new(7_u8);
        assert_eq!(panic_message(payload.as_ref()), "non-string panic payload");
    }
}
