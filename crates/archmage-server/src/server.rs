//! [`ArchmageServer`] – HTTP + WebSocket front end for the session registry.
//!
//! Listens on `0.0.0.0:5001` (configurable via [`ArchmageServer::with_port`]).
//!
//! * Every [`Route`] is mounted at its path for both `GET` and `POST` and
//!   answers with JSON. Permissive CORS covers browser clients, including
//!   `OPTIONS` preflights.
//! * `GET /ws` upgrades to a WebSocket exchanging [`WsMessage`] frames; each
//!   reply is the route's JSON with the `op` echoed back.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use archmage_runtime::{DEFAULT_SESSION, SessionRegistry, TickInput, TickOutcome};
use archmage_types::{ArchmageError, HandPose};
use axum::body::Bytes;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{FromRequest, Query, Request, State};
use axum::http::{StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::{MethodRouter, get};
use axum::{Json, Router};
use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::protocol::{Ack, ErrorReply, RequestBody, Route, SessionQuery, WsMessage};

/// Default TCP port.
pub const DEFAULT_PORT: u16 = 5001;

/// Path of the WebSocket endpoint.
pub const WS_PATH: &str = "/ws";

// ---------------------------------------------------------------------------
// ArchmageServer
// ---------------------------------------------------------------------------

/// # Example
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use archmage_perception::RuleClassifier;
/// use archmage_runtime::{GameConfig, SessionRegistry};
/// use archmage_server::ArchmageServer;
///
/// #[tokio::main]
/// async fn main() {
///     let registry = Arc::new(SessionRegistry::new(GameConfig::default(), Arc::new(RuleClassifier)));
///     ArchmageServer::new(registry)
///         .run()
///         .await
///         .expect("server failed");
/// }
/// ```
pub struct ArchmageServer {
    registry: Arc<SessionRegistry>,
    port: u16,
}

impl ArchmageServer {
    pub fn new(registry: Arc<SessionRegistry>) -> Self {
        Self {
            registry,
            port: DEFAULT_PORT,
        }
    }

    /// Override the listening port (builder-style).
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Serve forever.
    pub async fn run(self) -> Result<(), ArchmageError> {
        self.run_until(std::future::pending::<()>()).await
    }

    /// Serve until `shutdown` resolves.
    ///
    /// # Errors
    ///
    /// [`ArchmageError::Transport`] if the listener cannot bind or the
    /// server loop fails.
    pub async fn run_until<F>(self, shutdown: F) -> Result<(), ArchmageError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = SocketAddr::from(([0, 0, 0, 0], self.port));
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ArchmageError::Transport(format!("bind error on {addr}: {e}")))?;
        info!(%addr, "archmage server listening");
        serve(listener, self.registry, shutdown).await
    }
}

/// Build the axum router: one endpoint per [`Route`] plus the WebSocket.
pub fn router(registry: Arc<SessionRegistry>) -> Router {
    let mut router = Router::new().route(WS_PATH, get(ws_upgrade));
    for route in Route::ALL {
        router = router.route(route.path(), endpoint(route));
    }
    router
        .fallback(not_found)
        .layer(CorsLayer::permissive())
        .with_state(registry)
}

/// Serve [`router`] over an already-bound listener until `shutdown` resolves.
pub async fn serve<F>(
    listener: TcpListener,
    registry: Arc<SessionRegistry>,
    shutdown: F,
) -> Result<(), ArchmageError>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, router(registry))
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| ArchmageError::Transport(format!("server error: {e}")))?;
    info!("archmage server shutting down");
    Ok(())
}

// ---------------------------------------------------------------------------
// Routing
// ---------------------------------------------------------------------------

/// Run `route` against session `session` and return its JSON reply.
pub fn dispatch(
    registry: &SessionRegistry,
    route: Route,
    session: &str,
    body: &RequestBody,
) -> Result<Value, ArchmageError> {
    let value = match route {
        Route::GetCommand => {
            let outcome = registry.with_session(session, |s| s.tick(TickInput::Held));
            to_json(&outcome)?
        }
        Route::Tick => {
            let input = tick_input(body)?;
            let outcome = registry.with_session(session, |s| s.tick(input));
            to_json(&outcome)?
        }
        Route::SetGesture => {
            let gesture = body
                .gesture_label()
                .ok_or_else(|| ArchmageError::Protocol("missing field `gesture`".into()))?;
            registry.with_session(session, |s| s.set_gesture(gesture));
            to_json(&Ack {
                gesture: Some(gesture),
                ..Ack::ok(session)
            })?
        }
        Route::AddMana => {
            let amount = body
                .amount
                .ok_or_else(|| ArchmageError::Protocol("missing field `amount`".into()))?;
            let mana = registry.with_session(session, |s| s.add_mana(amount));
            to_json(&Ack {
                mana: Some(mana),
                ..Ack::ok(session)
            })?
        }
        Route::SetTutorialMode => {
            let enabled = body.enabled.unwrap_or(true);
            let mana = registry.with_session(session, |s| s.set_tutorial_mode(enabled));
            to_json(&Ack {
                mana: Some(mana),
                tutorial_mode: Some(enabled),
                ..Ack::ok(session)
            })?
        }
        Route::ResetCombo => {
            registry.with_session(session, |s| s.reset_combo());
            to_json(&Ack {
                combo: Some(0),
                ..Ack::ok(session)
            })?
        }
        Route::ResetSpellStats => {
            registry.with_session(session, |s| s.reset_spell_stats());
            to_json(&Ack::ok(session))?
        }
        Route::GetSpellStats => {
            let stats = registry.with_session(session, |s| s.spell_stats());
            to_json(&stats)?
        }
        Route::Schema => to_json(&schemars::schema_for!(TickOutcome))?,
    };
    debug!(route = route.name(), session, "dispatched");
    Ok(value)
}

fn tick_input(body: &RequestBody) -> Result<TickInput, ArchmageError> {
    if let Some(landmarks) = &body.landmarks {
        if landmarks.is_empty() {
            return Ok(TickInput::Pose(None));
        }
        let pose = HandPose::new(landmarks.clone())?;
        return Ok(TickInput::Pose(Some(pose)));
    }
    Ok(match body.gesture_label() {
        Some(label) => TickInput::Gesture(label),
        None => TickInput::Held,
    })
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<Value, ArchmageError> {
    serde_json::to_value(value).map_err(|e| ArchmageError::Protocol(format!("encode error: {e}")))
}

fn error_status(err: &ArchmageError) -> StatusCode {
    match err {
        ArchmageError::InvalidPose(_)
        | ArchmageError::UnknownToken(_)
        | ArchmageError::Protocol(_) => StatusCode::BAD_REQUEST,
        ArchmageError::ModelArtifact(_) | ArchmageError::Transport(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn error_json(err: &ArchmageError) -> Value {
    serde_json::to_value(ErrorReply {
        error: err.to_string(),
    })
    .unwrap_or(Value::Null)
}

// ---------------------------------------------------------------------------
// HTTP
// ---------------------------------------------------------------------------

/// [`ArchmageError`] rendered as a JSON `{"error": ...}` response.
struct ApiError(ArchmageError);

impl From<ArchmageError> for ApiError {
    fn from(err: ArchmageError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (error_status(&self.0), Json(error_json(&self.0))).into_response()
    }
}

/// JSON request body where an empty body reads as [`RequestBody::default`].
///
/// Browser clients `POST` side-channel routes with a JSON content type and
/// no body at all.
struct JsonBody(RequestBody);

impl<S: Send + Sync> FromRequest<S> for JsonBody {
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|e| ArchmageError::Protocol(format!("unreadable body: {e}")))?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(JsonBody(RequestBody::default()));
        }
        let body = serde_json::from_slice(&bytes)
            .map_err(|e| ArchmageError::Protocol(format!("invalid JSON body: {e}")))?;
        Ok(JsonBody(body))
    }
}

/// `GET` + `POST` handler for one route. The body's `session` wins over the
/// query's; both fall back to [`DEFAULT_SESSION`].
fn endpoint(route: Route) -> MethodRouter<Arc<SessionRegistry>> {
    let handler = move |State(registry): State<Arc<SessionRegistry>>,
                        Query(query): Query<SessionQuery>,
                        JsonBody(body): JsonBody| async move {
        let session = body
            .session
            .clone()
            .or(query.session)
            .unwrap_or_else(|| DEFAULT_SESSION.to_string());
        dispatch(&registry, route, &session, &body)
            .map(Json)
            .map_err(ApiError)
    };
    get(handler.clone()).post(handler)
}

async fn not_found(uri: Uri) -> (StatusCode, Json<ErrorReply>) {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorReply {
            error: format!("no route for {}", uri.path()),
        }),
    )
}

// ---------------------------------------------------------------------------
// WebSocket
// ---------------------------------------------------------------------------

async fn ws_upgrade(
    State(registry): State<Arc<SessionRegistry>>,
    ws: WebSocketUpgrade,
) -> Response {
    ws.on_upgrade(move |socket| handle_ws(socket, registry))
}

/// Serve one connection. Its generated session lives as long as the socket.
async fn handle_ws(socket: WebSocket, registry: Arc<SessionRegistry>) {
    let (mut ws_tx, mut ws_rx) = socket.split();
    let connection_session = Uuid::new_v4().to_string();
    info!(session = %connection_session, "websocket connected");

    while let Some(msg) = ws_rx.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                let reply = handle_ws_message(text.as_str(), &registry, &connection_session);
                if let Err(e) = ws_tx.send(Message::Text(reply.to_string().into())).await {
                    warn!(session = %connection_session, error = %e, "websocket send error");
                    break;
                }
            }
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                warn!(session = %connection_session, error = %e, "websocket receive error");
                break;
            }
        }
    }

    registry.remove(&connection_session);
    info!(session = %connection_session, "websocket closed");
}

/// Decode one WebSocket text frame, dispatch it and build the reply.
///
/// Messages without a `session` use the connection's own session.
pub(crate) fn handle_ws_message(text: &str, registry: &SessionRegistry, connection_session: &str) -> Value {
    let result = serde_json::from_str::<WsMessage>(text)
        .map_err(|e| ArchmageError::Protocol(format!("invalid message: {e}")))
        .and_then(|msg| {
            let route = Route::from_op(&msg.op)
                .ok_or_else(|| ArchmageError::Protocol(format!("unknown op `{}`", msg.op)))?;
            let session = msg.body.session.as_deref().unwrap_or(connection_session);
            let mut reply = dispatch(registry, route, session, &msg.body)?;
            if let Value::Object(map) = &mut reply {
                map.insert("op".into(), Value::String(msg.op.clone()));
            }
            Ok(reply)
        });

    result.unwrap_or_else(|e| error_json(&e))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
