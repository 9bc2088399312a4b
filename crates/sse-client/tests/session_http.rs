//! Integration tests for the SSE session over real HTTP.
//!
//! A mock hyper server serves scripted responses and records the request
//! headers it sees, exercising the connect → parse → dispatch pipeline end to
//! end.

use std::{
    collections::VecDeque,
    convert::Infallible,
    net::SocketAddr,
    sync::{Arc, Mutex},
    time::Duration,
};

use http_body_util::Full;
use hyper::{
    HeaderMap, Request, Response,
    body::{Bytes, Incoming},
    server::conn::http1,
    service::service_fn,
};
use hyper_util::rt::TokioIo;
use sse_client::{ConnectionStatus, Event, Session, SessionConfig, SessionError};
use tokio::{net::TcpListener, time::timeout};

// ---------------------------------------------------------------------------
// Mock SSE server helpers
// ---------------------------------------------------------------------------

#[derive(Clone, Copy)]
struct Scripted {
    body: &'static str,
    content_type: &'static str,
    status: u16,
}

fn sse(body: &'static str) -> Scripted {
    Scripted {
        body,
        content_type: "text/event-stream",
        status: 200,
    }
}

#[derive(Default)]
struct ServerState {
    responses: VecDeque<Scripted>,
    requests: Vec<HeaderMap>,
}

type SharedState = Arc<Mutex<ServerState>>;

/// Start a mock server that answers requests with `responses` in order and
/// records each request's headers.
async fn start_server(responses: Vec<Scripted>) -> (SocketAddr, SharedState) {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind mock server");
    let addr = listener.local_addr().expect("local addr");
    let state: SharedState = Arc::new(Mutex::new(ServerState {
        responses: responses.into(),
        requests: Vec::new(),
    }));

    let server_state = Arc::clone(&state);
    tokio::spawn(async move {
        loop {
            let Ok((stream, _)) = listener.accept().await else {
                break;
            };
            let state = Arc::clone(&server_state);
            tokio::spawn(async move {
                let io = TokioIo::new(stream);
                let _ = http1::Builder::new()
                    .serve_connection(
                        io,
                        service_fn(move |req: Request<Incoming>| {
                            let next = {
                                let mut state = state.lock().expect("server state");
                                state.requests.push(req.headers().clone());
                                state.responses.pop_front()
                            };
                            let resp = match next {
                                Some(scripted) => Response::builder()
                                    .status(scripted.status)
                                    .header("content-type", scripted.content_type)
                                    .body(Full::new(Bytes::from(scripted.body))),
                                None => Response::builder()
                                    .status(404)
                                    .body(Full::new(Bytes::new())),
                            }
                            .expect("build response");
                            async move { Ok::<_, Infallible>(resp) }
                        }),
                    )
                    .await;
            });
        }
    });

    (addr, state)
}

fn url(addr: SocketAddr) -> String {
    format!("http://{addr}/stream")
}

fn recorded(state: &SharedState) -> Vec<HeaderMap> {
    state.lock().expect("server state").requests.clone()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_events_over_http() {
    let (addr, _) = start_server(vec![sse(
        "event: thing.beep\r\ndata: {\"id\":\"1\"}\r\n\r\n\
         event: thing.bop\r\nid: 2\r\ndata: {\"id\":\"2\"}\r\n\r\n\
         : keep-alive\r\n\r\n",
    )])
    .await;

    let content_types = Arc::new(Mutex::new(Vec::new()));
    let seen = Arc::clone(&content_types);
    let session = Session::builder(SessionConfig::new(url(addr)))
        .on_event(|_| {})
        .on_open(move |response| {
            seen.lock()
                .expect("lock")
                .push(response.content_type().unwrap_or_default().to_string());
        })
        .build()
        .expect("build session");

    let events = timeout(Duration::from_secs(5), session.collect())
        .await
        .expect("stream ended in time")
        .expect("collect");

    assert_eq!(
        events,
        vec![
            Event::new(None, "thing.beep", vec![r#"{"id":"1"}"#.to_string()]),
            Event::new(
                Some("2".to_string()),
                "thing.bop",
                vec![r#"{"id":"2"}"#.to_string()]
            ),
        ]
    );
    assert_eq!(session.status(), ConnectionStatus::Opened);
    assert_eq!(session.last_event_id().as_deref(), Some("2"));
    assert_eq!(
        *content_types.lock().expect("lock"),
        vec!["text/event-stream".to_string()]
    );
}

#[tokio::test]
async fn test_rejected_status_closes_session() {
    let (addr, _) = start_server(vec![Scripted {
        body: "forbidden",
        content_type: "text/plain",
        status: 403,
    }])
    .await;

    let closed = Arc::new(Mutex::new(Vec::new()));
    let seen = Arc::clone(&closed);
    let session = Session::builder(SessionConfig::new(url(addr)))
        .on_event(|_| {})
        .on_close(move |response| seen.lock().expect("lock").push(response.is_some()))
        .build()
        .expect("build session");

    let err = session.listen().await.expect_err("403 rejected");
    match err {
        SessionError::InvalidStatus { status } => assert_eq!(status.as_u16(), 403),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(session.status(), ConnectionStatus::Closed);
    assert_eq!(*closed.lock().expect("lock"), vec![false]);
}

#[tokio::test]
async fn test_wrong_content_type_rejected() {
    let (addr, _) = start_server(vec![Scripted {
        body: "data: hi\n\n",
        content_type: "application/json",
        status: 200,
    }])
    .await;

    let session = Session::builder(SessionConfig::new(url(addr)))
        .on_event(|_| {})
        .build()
        .expect("build session");

    let err = session.listen().await.expect_err("content type rejected");
    assert!(matches!(err, SessionError::InvalidContentType { .. }));
    assert_eq!(session.status(), ConnectionStatus::Closed);
}

#[tokio::test]
async fn test_content_type_check_can_be_disabled() {
    let (addr, _) = start_server(vec![Scripted {
        body: "data: hi\n\n",
        content_type: "text/plain",
        status: 200,
    }])
    .await;

    let config = SessionConfig::new(url(addr)).require_event_stream_content_type(false);
    let session = Session::builder(config)
        .on_event(|_| {})
        .build()
        .expect("build session");

    let events = session.collect().await.expect("collect");
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].text(), "hi");
}

#[tokio::test]
async fn test_reconnect_sends_last_event_id() {
    let (addr, state) = start_server(vec![
        sse("id: 42\ndata: first\n\nretry: 250\n\n"),
        sse("data: second\n\n"),
    ])
    .await;

    let received = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&received);
    let mut headers = HeaderMap::new();
    headers.insert("authorization", "Bearer token".parse().expect("header"));
    let session = Session::builder(SessionConfig::new(url(addr)).headers(headers))
        .on_event(move |event| sink.lock().expect("lock").push(event.text()))
        .build()
        .expect("build session");

    session.listen().await.expect("first attempt");
    assert_eq!(session.retry_interval(), Duration::from_millis(250));

    // The caller drives reconnection.
    tokio::time::sleep(session.retry_interval()).await;
    let handle = session.listen_async().await.expect("second attempt");
    timeout(Duration::from_secs(5), handle)
        .await
        .expect("drain finished")
        .expect("task joined");

    assert_eq!(
        *received.lock().expect("lock"),
        vec!["first".to_string(), "second".to_string()]
    );

    let requests = recorded(&state);
    assert_eq!(requests.len(), 2);
    for request in &requests {
        assert_eq!(request["accept"], "text/event-stream");
        assert_eq!(request["authorization"], "Bearer token");
        assert!(request.contains_key("user-agent"));
    }
    assert!(requests[0].get("last-event-id").is_none());
    assert_eq!(requests[1]["last-event-id"], "42");
}

#[tokio::test]
async fn test_connection_refused() {
    let addr = {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        listener.local_addr().expect("local addr")
    };

    let session = Session::builder(SessionConfig::new(url(addr)))
        .on_event(|_| {})
        .build()
        .expect("build session");

    let err = session.listen().await.expect_err("nothing listening");
    assert!(err.is_connect_error(), "unexpected error: {err}");
    assert_eq!(session.status(), ConnectionStatus::Closed);
}

#[tokio::test]
async fn test_build_validates_config() {
    let err = Session::builder(SessionConfig::new("ftp://example.com/stream"))
        .on_event(|_| {})
        .build()
        .expect_err("scheme rejected");
    assert!(err.is_config_error());
}
