use axum::{Json, http::StatusCode, response::IntoResponse};
use engine::{EngineError, ErrorKind};

pub use identity::{DEFAULT_BCRYPT_COST, PasswordError, PasswordHasher};
pub use server::{ServerOptions, ServerState, router, run, run_with_listener, spawn_with_listener};

mod coins;
mod identity;
mod server;

pub mod types {
    pub mod auth {
        pub use api_types::auth::{AuthRequest, AuthResponse};
    }

    pub mod coins {
        pub use api_types::coins::{
            CoinHistory, InfoResponse, InventoryItem, ReceivedCoins, SendCoinRequest, SentCoins,
            SentKind,
        };
    }

    pub use api_types::ErrorResponse;
}

#[derive(Debug)]
pub enum ServerError {
    Engine(EngineError),
    Unauthorized,
    Internal(String),
    Generic(String),
}

fn status_for_engine_error(err: &EngineError) -> StatusCode {
    match (err.kind(), err) {
        (ErrorKind::Client, EngineError::UserNotFound(_)) => StatusCode::NOT_FOUND,
        (ErrorKind::Client, EngineError::ExistingKey(_)) => StatusCode::CONFLICT,
        (ErrorKind::Client, _) => StatusCode::BAD_REQUEST,
        (ErrorKind::Cancelled, _) => StatusCode::SERVICE_UNAVAILABLE,
        (ErrorKind::Internal, _) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn message_for_engine_error(err: EngineError) -> String {
    match err.kind() {
        ErrorKind::Internal => {
            tracing::error!("internal error: {err} (cause: {})", err.root_cause());
            "internal server error".to_string()
        }
        _ => err.to_string(),
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        let (status, error) = match self {
            ServerError::Engine(err) => (status_for_engine_error(&err), message_for_engine_error(err)),
            ServerError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized".to_string()),
            ServerError::Internal(err) => {
                tracing::error!("internal error: {err}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
            ServerError::Generic(err) => (StatusCode::BAD_REQUEST, err),
        };

        (status, Json(api_types::ErrorResponse { error })).into_response()
    }
}

impl From<EngineError> for ServerError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine::AccountId;

    #[test]
    fn client_errors_map_to_400() {
        for err in [
            EngineError::InvalidAmount("x".to_string()),
            EngineError::InsufficientFunds("x".to_string()),
            EngineError::ReceiverNotFound("x".to_string()),
            EngineError::MerchNotFound("x".to_string()),
        ] {
            let res = ServerError::from(err).into_response();
            assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        }
    }

    #[test]
    fn unknown_user_maps_to_404() {
        let res = ServerError::from(EngineError::UserNotFound("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn engine_conflict_maps_to_409() {
        let res = ServerError::from(EngineError::ExistingKey("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn commit_failures_map_to_500() {
        let err = EngineError::CommitFailed {
            operation: "send_coin",
            accounts: AccountId::new().to_string(),
            source: Box::new(EngineError::KeyNotFound("x".to_string())),
        };
        let res = ServerError::from(err).into_response();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn cancelled_maps_to_503() {
        let res = ServerError::from(EngineError::DeadlineExceeded).into_response();
        assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn unauthorized_maps_to_401() {
        let res = ServerError::Unauthorized.into_response();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn internal_maps_to_500() {
        let res = ServerError::Internal("hashing failed".to_string()).into_response();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn generic_maps_to_400() {
        let res = ServerError::Generic("bad".to_string()).into_response();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }
}
