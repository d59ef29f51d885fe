//! Session router
//!
//! Classifies every request on the MCP endpoint as continuing, new or
//! invalid, and routes it to the owning protocol handler.

use std::sync::Arc;

use axum::response::Response;
use log::{debug, info};
use serde_json::Value;

use crate::error::handlers::{protocol_error_response, session_error_response};
use crate::error::SessionError;
use crate::protocol::InitiationClassifier;
use crate::protocol::responses::{invalid_or_missing_session, no_valid_session};
use crate::session::events::{self, SessionEventSender};
use crate::session::store::{Session, SessionStore};
use crate::session::{SessionId, SharedIdGenerator};
use crate::transport::{HandlerFactory, HandlerRequest, ProtocolHandler, SessionHeader};

/// How the router treats one request.
pub enum Disposition {
    /// The header names a live session.
    Continuing(Arc<Session>),
    /// No header and an initiation body.
    New,
    /// Anything else.
    Invalid,
}

/// Owns the session table and every write to it.
///
/// Insertions happen on the initiation path once a handler confirms its id;
/// removals happen only through the close-event listener spawned by
/// [`SessionRouter::new`].
pub struct SessionRouter {
    store: Arc<dyn SessionStore>,
    factory: Arc<dyn HandlerFactory>,
    classifier: Arc<dyn InitiationClassifier>,
    id_generator: SharedIdGenerator,
    events: SessionEventSender,
}

impl SessionRouter {
    /// Builds the router and spawns its close-event listener.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new(
        store: Arc<dyn SessionStore>,
        factory: Arc<dyn HandlerFactory>,
        classifier: Arc<dyn InitiationClassifier>,
        id_generator: SharedIdGenerator,
    ) -> Self {
        let (events, receiver) = events::channel();
        tokio::spawn(events::run_close_listener(Arc::clone(&store), receiver));

        Self {
            store,
            factory,
            classifier,
            id_generator,
            events,
        }
    }

    /// Looks up a live session. A handler that already reports itself
    /// closed counts as absent even before its entry is removed.
    pub async fn resolve(&self, id: &str) -> Result<Option<Arc<Session>>, SessionError> {
        let session = self.store.get(&SessionId::from(id)).await?;
        Ok(session.filter(|s| !s.handler().is_closed()))
    }

    /// An unreadable header names no session, so it is never treated as
    /// absent.
    pub async fn classify(
        &self,
        session_header: SessionHeader<'_>,
        body: Option<&Value>,
    ) -> Result<Disposition, SessionError> {
        match session_header {
            SessionHeader::Present(id) => Ok(match self.resolve(id).await? {
                Some(session) => Disposition::Continuing(session),
                None => Disposition::Invalid,
            }),
            SessionHeader::Unreadable => Ok(Disposition::Invalid),
            SessionHeader::Absent if body.is_some_and(|b| self.classifier.is_initiation(b)) => {
                Ok(Disposition::New)
            }
            SessionHeader::Absent => Ok(Disposition::Invalid),
        }
    }

    /// Entry point for POST.
    pub async fn handle_post(&self, request: HandlerRequest) -> Response {
        let disposition = self
            .classify(request.session_header(), request.parsed_body.as_ref())
            .await;

        match disposition {
            Ok(Disposition::Continuing(session)) => delegate(session.handler(), request).await,
            Ok(Disposition::New) => self.create_session(request).await,
            Ok(Disposition::Invalid) => {
                debug!(
                    "Rejecting POST without a valid session (header: {:?})",
                    request.session_header()
                );
                no_valid_session()
            }
            Err(e) => session_error_response(&e),
        }
    }

    /// Entry point for GET and DELETE: the session must already exist.
    pub async fn handle_session_request(&self, request: HandlerRequest) -> Response {
        let SessionHeader::Present(id) = request.session_header() else {
            debug!("Rejecting {} without a readable session header", request.method);
            return invalid_or_missing_session();
        };
        let id = id.to_owned();

        match self.resolve(&id).await {
            Ok(Some(session)) => delegate(session.handler(), request.into_bodyless()).await,
            Ok(None) => {
                debug!("Rejecting {} for unknown session {}", request.method, id);
                invalid_or_missing_session()
            }
            Err(e) => session_error_response(&e),
        }
    }

    /// Number of sessions currently in the table.
    pub async fn session_count(&self) -> usize {
        self.store.len().await
    }

    async fn create_session(&self, request: HandlerRequest) -> Response {
        let handler = self
            .factory
            .create(Arc::clone(&self.id_generator), self.events.clone());

        let outcome = match handler.handle_request(request).await {
            Ok(outcome) => outcome,
            Err(e) => return protocol_error_response(&e),
        };

        // Publish before the response, and with it the id, leaves the server.
        if let Some(id) = outcome.confirmed_session {
            let session = Session::new(id.clone(), Arc::clone(&handler));
            if let Err(e) = self.store.insert(session).await {
                return session_error_response(&e);
            }
            info!(
                "Session {} initialized ({} active)",
                id,
                self.store.len().await
            );
        }

        outcome.response
    }
}

async fn delegate(handler: &Arc<dyn ProtocolHandler>, request: HandlerRequest) -> Response {
    match handler.handle_request(request).await {
        Ok(outcome) => outcome.response,
        Err(e) => protocol_error_response(&e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProtocolError;
    use crate::protocol::McpInitializeClassifier;
    use crate::protocol::responses::{SESSION_ID_HEADER, with_session_header};
    use crate::session::{InMemorySessionStore, SessionEvent, SessionIdGenerator};
    use crate::transport::HandlerOutcome;
    use async_trait::async_trait;
    use axum::body::Bytes;
    use axum::http::{HeaderMap, HeaderValue, Method, StatusCode};
    use axum::response::IntoResponse;
    use serde_json::json;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Sequential ids so tests can predict them.
    struct CountingGenerator(AtomicUsize);

    impl SessionIdGenerator for CountingGenerator {
        fn generate(&self) -> SessionId {
            SessionId::from(format!("s-{}", self.0.fetch_add(1, Ordering::SeqCst)))
        }
    }

    /// Confirms on its first request, closes on DELETE, fails on `X-Fail`.
    struct ScriptedHandler {
        ids: SharedIdGenerator,
        events: SessionEventSender,
        id: Mutex<Option<SessionId>>,
        closed: Mutex<bool>,
        confirm: bool,
        calls: AtomicUsize,
    }

    impl ScriptedHandler {
        fn session_id(&self) -> Option<SessionId> {
            self.id.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ProtocolHandler for ScriptedHandler {
        fn is_closed(&self) -> bool {
            *self.closed.lock().unwrap()
        }

        async fn handle_request(
            &self,
            request: HandlerRequest,
        ) -> Result<HandlerOutcome, ProtocolError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if request.headers.contains_key("x-fail") {
                return Err(ProtocolError::Handler("scripted failure".into()));
            }

            let existing = self.session_id();
            match existing {
                None if self.confirm => {
                    let id = self.ids.generate();
                    *self.id.lock().unwrap() = Some(id.clone());
                    let response = with_session_header(StatusCode::OK.into_response(), &id);
                    Ok(HandlerOutcome::confirmed(response, id))
                }
                None => Ok(HandlerOutcome::respond(StatusCode::BAD_REQUEST.into_response())),
                Some(id) if request.method == Method::DELETE => {
                    *self.closed.lock().unwrap() = true;
                    self.events
                        .send(SessionEvent::Closed { session_id: id })
                        .unwrap();
                    Ok(HandlerOutcome::respond(StatusCode::OK.into_response()))
                }
                Some(_) => Ok(HandlerOutcome::respond(StatusCode::ACCEPTED.into_response())),
            }
        }
    }

    struct ScriptedFactory {
        confirm: bool,
        created: Mutex<Vec<Arc<ScriptedHandler>>>,
    }

    impl HandlerFactory for ScriptedFactory {
        fn create(
            &self,
            ids: SharedIdGenerator,
            events: SessionEventSender,
        ) -> Arc<dyn ProtocolHandler> {
            let handler = Arc::new(ScriptedHandler {
                ids,
                events,
                id: Mutex::new(None),
                closed: Mutex::new(false),
                confirm: self.confirm,
                calls: AtomicUsize::new(0),
            });
            self.created.lock().unwrap().push(Arc::clone(&handler));
            handler
        }
    }

    fn router(confirm: bool) -> (SessionRouter, Arc<ScriptedFactory>) {
        let factory = Arc::new(ScriptedFactory {
            confirm,
            created: Mutex::new(Vec::new()),
        });
        let router = SessionRouter::new(
            Arc::new(InMemorySessionStore::new()),
            Arc::clone(&factory) as Arc<dyn HandlerFactory>,
            Arc::new(McpInitializeClassifier),
            Arc::new(CountingGenerator(AtomicUsize::new(0))),
        );
        (router, factory)
    }

    fn initialize_body() -> Bytes {
        Bytes::from(
            json!({
                "jsonrpc": "2.0",
                "id": 1,
                "method": "initialize",
                "params": {
                    "protocolVersion": "2025-03-26",
                    "capabilities": {},
                    "clientInfo": {"name": "test", "version": "1.0"}
                }
            })
            .to_string(),
        )
    }

    fn headers_with_session(id: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(SESSION_ID_HEADER, HeaderValue::from_str(id).unwrap());
        headers
    }

    async fn wait_for_count(router: &SessionRouter, expected: usize) {
        for _ in 0..100 {
            if router.session_count().await == expected {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("session count never reached {expected}");
    }

    #[tokio::test]
    async fn test_initiation_creates_and_publishes_session() {
        let (router, factory) = router(true);
        let resp = router
            .handle_post(HandlerRequest::with_body(
                Method::POST,
                HeaderMap::new(),
                initialize_body(),
            ))
            .await;

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()[SESSION_ID_HEADER], "s-0");
        assert_eq!(router.session_count().await, 1);
        assert_eq!(factory.created.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_continuing_session_reuses_handler() {
        let (router, factory) = router(true);
        router
            .handle_post(HandlerRequest::with_body(
                Method::POST,
                HeaderMap::new(),
                initialize_body(),
            ))
            .await;

        for _ in 0..3 {
            let resp = router
                .handle_post(HandlerRequest::with_body(
                    Method::POST,
                    headers_with_session("s-0"),
                    Bytes::from_static(br#"{"jsonrpc":"2.0","id":2,"method":"ping"}"#),
                ))
                .await;
            assert_eq!(resp.status(), StatusCode::ACCEPTED);
        }

        let session = router.resolve("s-0").await.unwrap().unwrap();
        let created = factory.created.lock().unwrap();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].calls.load(Ordering::SeqCst), 4);

        let expected: Arc<dyn ProtocolHandler> = created[0].clone();
        assert!(Arc::ptr_eq(session.handler(), &expected));
    }

    #[tokio::test]
    async fn test_rejected_initiation_publishes_nothing() {
        let (router, factory) = router(false);
        let resp = router
            .handle_post(HandlerRequest::with_body(
                Method::POST,
                HeaderMap::new(),
                initialize_body(),
            ))
            .await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert!(resp.headers().get(SESSION_ID_HEADER).is_none());
        assert_eq!(router.session_count().await, 0);
        assert_eq!(factory.created.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_non_initiation_without_header_is_invalid() {
        let (router, factory) = router(true);
        for _ in 0..3 {
            let resp = router
                .handle_post(HandlerRequest::with_body(
                    Method::POST,
                    HeaderMap::new(),
                    Bytes::from_static(br#"{"jsonrpc":"2.0","id":1,"method":"tools/list"}"#),
                ))
                .await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        }
        assert_eq!(router.session_count().await, 0);
        assert!(factory.created.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_session_header_is_invalid() {
        let (router, factory) = router(true);
        let resp = router
            .handle_post(HandlerRequest::with_body(
                Method::POST,
                headers_with_session("never-issued"),
                initialize_body(),
            ))
            .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert!(factory.created.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unreadable_session_header_is_invalid() {
        let (router, factory) = router(true);
        let mut headers = HeaderMap::new();
        headers.insert(
            SESSION_ID_HEADER,
            HeaderValue::from_bytes(b"stale\xff").unwrap(),
        );

        let resp = router
            .handle_post(HandlerRequest::with_body(
                Method::POST,
                headers.clone(),
                initialize_body(),
            ))
            .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert!(resp.headers().get(SESSION_ID_HEADER).is_none());
        assert!(factory.created.lock().unwrap().is_empty());
        assert_eq!(router.session_count().await, 0);

        let resp = router
            .handle_session_request(HandlerRequest::without_body(Method::DELETE, headers))
            .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_session_request_requires_live_session() {
        let (router, _factory) = router(true);

        let resp = router
            .handle_session_request(HandlerRequest::without_body(Method::GET, HeaderMap::new()))
            .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = router
            .handle_session_request(HandlerRequest::without_body(
                Method::GET,
                headers_with_session("nope"),
            ))
            .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_close_removes_session_once() {
        let (router, _factory) = router(true);
        router
            .handle_post(HandlerRequest::with_body(
                Method::POST,
                HeaderMap::new(),
                initialize_body(),
            ))
            .await;

        let resp = router
            .handle_session_request(HandlerRequest::without_body(
                Method::DELETE,
                headers_with_session("s-0"),
            ))
            .await;
        assert_eq!(resp.status(), StatusCode::OK);

        // Closed handlers are unreachable before the listener catches up.
        assert!(router.resolve("s-0").await.unwrap().is_none());
        wait_for_count(&router, 0).await;

        let resp = router
            .handle_session_request(HandlerRequest::without_body(
                Method::DELETE,
                headers_with_session("s-0"),
            ))
            .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_handler_failure_leaves_table_intact() {
        let (router, _factory) = router(true);
        router
            .handle_post(HandlerRequest::with_body(
                Method::POST,
                HeaderMap::new(),
                initialize_body(),
            ))
            .await;

        let mut headers = headers_with_session("s-0");
        headers.insert("x-fail", HeaderValue::from_static("1"));
        let resp = router
            .handle_post(HandlerRequest::with_body(
                Method::POST,
                headers,
                Bytes::from_static(br#"{"jsonrpc":"2.0","id":2,"method":"ping"}"#),
            ))
            .await;

        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(router.session_count().await, 1);
        assert!(router.resolve("s-0").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_distinct_initiations_get_distinct_sessions() {
        let (router, factory) = router(true);
        let router = Arc::new(router);

        let a = {
            let router = Arc::clone(&router);
            tokio::spawn(async move {
                router
                    .handle_post(HandlerRequest::with_body(
                        Method::POST,
                        HeaderMap::new(),
                        initialize_body(),
                    ))
                    .await
            })
        };
        let b = {
            let router = Arc::clone(&router);
            tokio::spawn(async move {
                router
                    .handle_post(HandlerRequest::with_body(
                        Method::POST,
                        HeaderMap::new(),
                        initialize_body(),
                    ))
                    .await
            })
        };

        let a = a.await.unwrap();
        let b = b.await.unwrap();
        assert_ne!(a.headers()[SESSION_ID_HEADER], b.headers()[SESSION_ID_HEADER]);
        assert_eq!(router.session_count().await, 2);
        assert_eq!(factory.created.lock().unwrap().len(), 2);
    }
}
