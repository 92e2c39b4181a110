//! Account endpoints backed by the identity provider.

use api_types::user::{Me, Session, User};
use axum::{
    Extension, Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};
use serde_json::Value;

use crate::{
    ServerError,
    identity::{AuthSession, AuthUser},
    server::ServerState,
};

const MIN_PASSWORD_LEN: usize = 6;

fn user_view(user: AuthUser) -> User {
    User {
        id: user.id,
        email: user.email,
    }
}

fn session_view(session: AuthSession) -> Session {
    Session {
        user: user_view(session.user),
        token: session.token,
    }
}

/// Pulls `email` (trimmed, lowercased) and `password` out of a login body.
fn credentials(body: &Value) -> Result<(String, String), ServerError> {
    let email = body.get("email").filter(|v| !v.is_null());
    let password = body.get("password").filter(|v| !v.is_null());
    let (Some(email), Some(password)) = (email, password) else {
        return Err(ServerError::Generic("Email and password are required".to_string()));
    };
    let (Some(email), Some(password)) = (email.as_str(), password.as_str()) else {
        return Err(ServerError::Generic("Invalid input".to_string()));
    };

    let email = email.trim().to_lowercase();
    if email.is_empty() || password.is_empty() {
        return Err(ServerError::Generic("Email and password are required".to_string()));
    }
    Ok((email, password.to_string()))
}

/// Creates an account and returns a session for it
pub async fn register(
    State(state): State<ServerState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<Session>), ServerError> {
    let Json(body) = payload?;
    let (email, password) = credentials(&body)?;
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ServerError::Generic(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }

    let session = state.identity()?.register(&email, &password).await?;
    tracing::info!(user_id = %session.user.id, "account registered");
    Ok((StatusCode::CREATED, Json(session_view(session))))
}

pub async fn login(
    State(state): State<ServerState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Session>, ServerError> {
    let Json(body) = payload?;
    let (email, password) = credentials(&body)?;
    let session = state.identity()?.login(&email, &password).await?;
    Ok(Json(session_view(session)))
}

/// Returns the caller resolved from the bearer credential
pub async fn me(Extension(user): Extension<AuthUser>) -> Json<Me> {
    Json(Me {
        user: user_view(user),
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn credentials_are_normalized() {
        let body = json!({"email": "  Alice@Example.COM ", "password": "secret1"});
        let (email, password) = credentials(&body).ok().unwrap();
        assert_eq!(email, "alice@example.com");
        assert_eq!(password, "secret1");
    }

    #[test]
    fn missing_or_mistyped_credentials_are_rejected() {
        assert!(credentials(&json!({"email": "a@b.c"})).is_err());
        assert!(credentials(&json!({"email": 5, "password": "secret1"})).is_err());
        assert!(credentials(&json!({"email": "   ", "password": "secret1"})).is_err());
    }
}
