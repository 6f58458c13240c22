use axum::{
    RequestExt, Router,
    extract::{Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};

use std::{net::SocketAddr, sync::Arc, time::Duration};

use crate::{PasswordHasher, ServerError, coins, identity};
use engine::{CallContext, Engine};

/// Listener address, per-request limits and password hashing.
#[derive(Clone, Debug)]
pub struct ServerOptions {
    pub addr: SocketAddr,
    pub request_timeout: Duration,
    pub passwords: PasswordHasher,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            request_timeout: Duration::from_secs(5),
            passwords: PasswordHasher::default(),
        }
    }
}

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
    pub request_timeout: Duration,
    pub passwords: PasswordHasher,
}

impl ServerState {
    /// A fresh context for one request, expiring after the configured timeout.
    pub(crate) fn call_context(&self) -> CallContext {
        CallContext::new().with_timeout(self.request_timeout)
    }
}

/// Resolve the bearer token to an account and hand it to the handler as a
/// request extension.
async fn auth(
    State(state): State<ServerState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ServerError> {
    let TypedHeader(Authorization(bearer)) = request
        .extract_parts::<TypedHeader<Authorization<Bearer>>>()
        .await
        .map_err(|_| ServerError::Unauthorized)?;
    if bearer.token().is_empty() {
        return Err(ServerError::Unauthorized);
    }

    let digest = identity::token_digest(bearer.token());
    let Some(account) = state.engine.session_account(&digest).await? else {
        tracing::warn!("rejected unknown bearer token");
        return Err(ServerError::Unauthorized);
    };

    request.extensions_mut().insert(account);
    Ok(next.run(request).await)
}

async fn health() -> StatusCode {
    StatusCode::OK
}

pub fn router(state: ServerState) -> Router {
    let protected = Router::new()
        .route("/api/info", get(coins::info))
        .route("/api/sendCoin", post(coins::send_coin))
        .route("/api/buy/{item}", get(coins::buy))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth));

    Router::new()
        .route("/health", get(health))
        .route("/api/auth", post(identity::login))
        .merge(protected)
        .with_state(state)
}

pub async fn run(engine: Engine, options: ServerOptions) {
    let listener = match tokio::net::TcpListener::bind(options.addr).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("failed to bind server listener on {}: {err}", options.addr);
            return;
        }
    };
    if let Err(err) =
        run_with_listener(engine, options.request_timeout, options.passwords, listener).await
    {
        tracing::error!("server failed: {err}");
    }
}

pub async fn run_with_listener(
    engine: Engine,
    request_timeout: Duration,
    passwords: PasswordHasher,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    let state = ServerState {
        engine: Arc::new(engine),
        request_timeout,
        passwords,
    };

    axum::serve(listener, router(state)).await
}

pub fn spawn_with_listener(
    engine: Engine,
    request_timeout: Duration,
    passwords: PasswordHasher,
    listener: tokio::net::TcpListener,
) -> Result<SocketAddr, std::io::Error> {
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(err) = run_with_listener(engine, request_timeout, passwords, listener).await {
            tracing::error!("server failed: {err}");
        }
    });

    Ok(addr)
}
