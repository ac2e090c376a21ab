//! Dispatch through the Thrift router.

use std::sync::Arc;

use request_router::error::{DispatchError, RouterError};
use request_router::exception::{Exception, Failure};
use request_router::filter::LoggingFilter;
use request_router::thrift::{ThriftController, ThriftMethod, ThriftRequest, ThriftResponse, ThriftRouter};

mod common;
use common::{entries, thrift_recording_filter as recording_filter, Log};

#[derive(Debug, thiserror::Error)]
#[error("user {0} not found")]
struct UserNotFound(String);

impl Exception for UserNotFound {}

struct UserService {
    log: Log,
}

impl ThriftController for UserService {
    fn service_name(&self) -> &str {
        "UserService"
    }

    fn methods(self: Arc<Self>) -> Vec<ThriftMethod> {
        let log = self.log.clone();
        vec![
            ThriftMethod::new("getUser", move |req: ThriftRequest| {
                let log = log.clone();
                async move {
                    log.lock().unwrap().push("T".to_string());
                    if req.payload.is_empty() {
                        Err(Failure::from(UserNotFound("<empty>".into())))
                    } else {
                        Ok::<_, Failure>(ThriftResponse::reply(req.payload))
                    }
                }
            })
            .filter(recording_filter("M", self.log.clone())),
            ThriftMethod::new("ping", |_req: ThriftRequest| async move {
                Ok::<_, Failure>(ThriftResponse::reply("pong"))
            }),
        ]
    }
}

fn router(log: &Log) -> ThriftRouter {
    let mut builder = ThriftRouter::builder();
    builder
        .filter(recording_filter("F1", log.clone()))
        .unwrap()
        .filter(recording_filter("F2", log.clone()))
        .unwrap()
        .filter(LoggingFilter)
        .unwrap()
        .exception_mapper::<UserNotFound, _>(|f: &Failure| ThriftResponse::exception("UserNotFound", f.to_string()))
        .unwrap()
        .default_exception_mapper(|f: &Failure| ThriftResponse::exception("TApplicationException", f.to_string()))
        .unwrap()
        .add_controller(UserService { log: log.clone() })
        .unwrap();
    builder.freeze().unwrap()
}

#[tokio::test]
async fn test_dispatch_by_method_name() {
    let log: Log = Arc::default();
    let router = router(&log);

    assert_eq!(router.service_name(), Some("UserService"));
    assert_eq!(router.method_names(), ["getUser", "ping"]);

    let response = router.dispatch(ThriftRequest::new("getUser", "alice")).await.unwrap();
    assert_eq!(response, ThriftResponse::reply("alice"));
    assert_eq!(entries(&log), ["F1.pre", "F2.pre", "M.pre", "T", "M.post", "F2.post", "F1.post"]);

    let pong = router.dispatch(ThriftRequest::new("ping", "")).await.unwrap();
    assert_eq!(pong.payload().map(|p| p.as_ref()), Some(&b"pong"[..]));
}

#[tokio::test]
async fn test_failures_map_to_exceptions() {
    let log: Log = Arc::default();
    let router = router(&log);

    let response = router.dispatch(ThriftRequest::new("getUser", "")).await.unwrap();
    assert!(response.is_exception());
    assert_eq!(
        response,
        ThriftResponse::exception("UserNotFound", "user <empty> not found")
    );
}

#[tokio::test]
async fn test_unknown_method() {
    let log: Log = Arc::default();
    let router = router(&log);

    match router.dispatch(ThriftRequest::new("deleteUser", "")).await {
        Err(DispatchError::MethodNotFound { method }) => assert_eq!(method, "deleteUser"),
        other => panic!("expected MethodNotFound, got {other:?}"),
    }
    assert!(entries(&log).is_empty());
}

#[tokio::test]
async fn test_bypass_filters() {
    let log: Log = Arc::default();
    let router = router(&log);

    let response = router
        .dispatch_with(ThriftRequest::new("getUser", "bob"), true)
        .await
        .unwrap();
    assert_eq!(response, ThriftResponse::reply("bob"));
    assert_eq!(entries(&log), ["T"]);

    let unmapped = router.dispatch_with(ThriftRequest::new("getUser", ""), true).await;
    assert!(matches!(unmapped, Err(DispatchError::Unhandled(f)) if f.is::<UserNotFound>()));
}

#[test]
fn test_ordering_violations() {
    let log: Log = Arc::default();
    let mut builder = ThriftRouter::builder();
    builder.add_controller(UserService { log: log.clone() }).unwrap();

    assert!(matches!(
        builder.filter(LoggingFilter),
        Err(RouterError::FilterAfterController { controller }) if controller == "UserService"
    ));
    assert!(matches!(
        builder.add_controller(UserService { log }),
        Err(RouterError::MultipleControllers { .. })
    ));
}

struct Duplicated;

impl ThriftController for Duplicated {
    fn service_name(&self) -> &str {
        "Duplicated"
    }

    fn methods(self: Arc<Self>) -> Vec<ThriftMethod> {
        let method = || {
            ThriftMethod::new("ping", |_req: ThriftRequest| async move {
                Ok::<_, Failure>(ThriftResponse::reply("pong"))
            })
        };
        vec![method(), method()]
    }
}

#[test]
fn test_duplicate_method_rejected() {
    let mut builder = ThriftRouter::builder();
    assert!(matches!(
        builder.add_controller(Duplicated),
        Err(RouterError::DuplicateMethod { method }) if method == "ping"
    ));
}
