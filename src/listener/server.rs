//! axum server hosting the vote webhook route.

use std::any::Any;
use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer};

use crate::time::{Clock, SystemClock};
use crate::unwind::panic_message;
use crate::vote::Vote;

use super::{ListenerConfig, ListenerError, VoteHandler, WebhookRejection};

/// Webhook server that turns `POST /` requests into [`VoteHandler`] calls.
///
/// Cheap to clone; clones share the handler.
#[derive(Clone)]
pub struct VoteListener {
    config: ListenerConfig,
    handler: Arc<dyn VoteHandler>,
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for VoteListener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VoteListener")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl VoteListener {
    /// Creates a listener dispatching to `handler`.
    pub fn new(config: ListenerConfig, handler: impl VoteHandler + 'static) -> Self {
        Self::from_shared(config, Arc::new(handler))
    }

    /// Creates a listener from an already shared handler.
    #[must_use]
    pub fn from_shared(config: ListenerConfig, handler: Arc<dyn VoteHandler>) -> Self {
        Self {
            config,
            handler,
            clock: Arc::new(SystemClock),
        }
    }

    /// Replaces the clock used to anchor `since_vote` payloads.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Returns the listener settings.
    #[must_use]
    pub const fn config(&self) -> &ListenerConfig {
        &self.config
    }

    /// Builds the router serving the webhook route.
    ///
    /// Exposed so the route can be mounted elsewhere or driven directly.
    /// A panicking handler is answered with a 500.
    pub fn router(&self) -> Router {
        let state = Arc::new(ListenerState {
            verify_code: self.config.verify_code.clone(),
            silent: self.config.silent,
            handler: Arc::clone(&self.handler),
            clock: Arc::clone(&self.clock),
        });

        let silent = self.config.silent;
        let router = Router::new()
            .route("/", post(receive_vote))
            .with_state(state)
            .layer(CatchPanicLayer::custom(
                move |panic: Box<dyn Any + Send + 'static>| -> Response {
                    if !silent {
                        let message = panic_message(panic.as_ref());
                        tracing::error!("Vote handler panicked: {message}");
                    }
                    StatusCode::INTERNAL_SERVER_ERROR.into_response()
                },
            ));

        if silent {
            return router;
        }

        let level = self.config.log_level;
        router.layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(level))
                .on_request(DefaultOnRequest::new().level(level))
                .on_response(DefaultOnResponse::new().level(level)),
        )
    }

    /// Binds the socket and serves in a background task.
    ///
    /// # Errors
    ///
    /// Returns [`ListenerError::Bind`] if the address cannot be bound.
    pub async fn start(&self) -> Result<ListenerHandle, ListenerError> {
        self.start_with_token(CancellationToken::new()).await
    }

    /// Like [`start`](Self::start), but stops when `token` is cancelled.
    ///
    /// # Errors
    ///
    /// Returns [`ListenerError::Bind`] if the address cannot be bound.
    pub async fn start_with_token(
        &self,
        token: CancellationToken,
    ) -> Result<ListenerHandle, ListenerError> {
        let addr = self.config.socket_addr();
        let bind_error = |source| ListenerError::Bind { addr, source };

        let listener = TcpListener::bind(addr).await.map_err(bind_error)?;
        let local_addr = listener.local_addr().map_err(bind_error)?;

        let router = self.router();
        let shutdown = token.clone();
        let task = tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async move { shutdown.cancelled().await })
                .await
        });

        if !self.config.silent {
            tracing::info!("Webhook listener running on {local_addr}");
        }

        Ok(ListenerHandle {
            local_addr,
            token,
            task,
        })
    }
}

/// A running listener.
///
/// Dropping the handle leaves the server running until its token is cancelled.
#[derive(Debug)]
pub struct ListenerHandle {
    local_addr: SocketAddr,
    token: CancellationToken,
    task: JoinHandle<std::io::Result<()>>,
}

impl ListenerHandle {
    /// The address actually bound (resolves port 0).
    #[must_use]
    pub const fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Returns true once the server task has exited.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Stops accepting, drains in-flight requests and closes the socket.
    ///
    /// # Errors
    ///
    /// Returns [`ListenerError::Serve`] if the server failed, or
    /// [`ListenerError::Task`] if its task panicked.
    pub async fn shutdown(self) -> Result<(), ListenerError> {
        self.token.cancel();
        self.task.await?.map_err(ListenerError::Serve)
    }
}

struct ListenerState {
    verify_code: Option<String>,
    silent: bool,
    handler: Arc<dyn VoteHandler>,
    clock: Arc<dyn Clock>,
}

async fn receive_vote(
    State(state): State<Arc<ListenerState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, WebhookRejection> {
    if let Some(expected) = &state.verify_code {
        let provided = headers.get(AUTHORIZATION).map(HeaderValue::as_bytes);
        if provided != Some(expected.as_bytes()) {
            if !state.silent {
                tracing::warn!("Rejected vote webhook: missing or wrong Authorization header");
            }
            return Err(WebhookRejection::Unauthorized);
        }
    }

    let vote = Vote::from_json(&body, state.clock.as_ref()).map_err(|e| {
        if !state.silent {
            tracing::warn!("Rejected vote webhook: {e}");
        }
        WebhookRejection::from(e)
    })?;

    if !state.silent {
        tracing::debug!(
            "Received vote {} from user {} (test: {})",
            vote.vote_id(),
            vote.user_id(),
            vote.is_test()
        );
    }

    state.handler.handle_vote(vote).await.map_err(|e| {
        if !state.silent {
            tracing::error!("Vote handler failed: {e:#}");
        }
        WebhookRejection::HandlerFailed(e)
    })?;

    Ok(StatusCode::OK)
}
