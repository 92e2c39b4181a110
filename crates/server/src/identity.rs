//! Bearer credential verification and account management.
//!
//! The server never stores passwords. Registration, login and token checks are
//! delegated to an [`IdentityProvider`]; [`SupabaseIdentity`] talks to a
//! Supabase GoTrue instance, [`StaticIdentity`] keeps accounts in memory.

use std::collections::HashMap;

use reqwest::{StatusCode, Url};
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::HTTP_TIMEOUT;

/// Authenticated caller, inserted into request extensions by the auth layer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthUser {
    pub id: String,
    pub email: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthSession {
    pub user: AuthUser,
    pub token: String,
}

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("Authentication service not configured")]
    NotConfigured,
    #[error("Missing or invalid authorization header")]
    MissingToken,
    #[error("Invalid or expired token")]
    InvalidToken,
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("An account with this email already exists")]
    AlreadyRegistered,
    #[error("identity provider unreachable: {0}")]
    Unavailable(String),
    #[error("identity provider error: {0}")]
    Provider(String),
}

impl From<reqwest::Error> for IdentityError {
    fn from(value: reqwest::Error) -> Self {
        if value.is_decode() {
            Self::Provider(value.to_string())
        } else {
            Self::Unavailable(value.to_string())
        }
    }
}

#[async_trait::async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Resolves a bearer token to its user.
    async fn verify(&self, token: &str) -> Result<AuthUser, IdentityError>;

    /// Creates a confirmed account and signs it in.
    async fn register(&self, email: &str, password: &str) -> Result<AuthSession, IdentityError>;

    async fn login(&self, email: &str, password: &str) -> Result<AuthSession, IdentityError>;
}

/// Supabase GoTrue over HTTP, authenticated with the service role key.
#[derive(Clone, Debug)]
pub struct SupabaseIdentity {
    base_url: Url,
    service_role_key: String,
    http: reqwest::Client,
}

#[derive(Deserialize)]
struct GoTrueUser {
    id: String,
    email: Option<String>,
}

#[derive(Deserialize)]
struct GoTrueSession {
    access_token: String,
    user: GoTrueUser,
}

#[derive(Default, Deserialize)]
struct GoTrueError {
    msg: Option<String>,
    message: Option<String>,
    error_code: Option<String>,
}

impl GoTrueError {
    fn text(&self) -> String {
        self.msg
            .clone()
            .or_else(|| self.message.clone())
            .unwrap_or_else(|| "unknown error".to_string())
    }
}

impl From<GoTrueUser> for AuthUser {
    fn from(value: GoTrueUser) -> Self {
        Self {
            id: value.id,
            email: value.email,
        }
    }
}

impl SupabaseIdentity {
    pub fn new(base_url: &str, service_role_key: &str) -> Result<Self, IdentityError> {
        let base_url = Url::parse(base_url)
            .map_err(|err| IdentityError::Provider(format!("invalid supabase_url: {err}")))?;
        let http = reqwest::Client::builder().timeout(HTTP_TIMEOUT).build()?;
        Ok(Self {
            base_url,
            service_role_key: service_role_key.to_string(),
            http,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, IdentityError> {
        self.base_url
            .join(path)
            .map_err(|err| IdentityError::Provider(format!("invalid supabase_url: {err}")))
    }
}

#[async_trait::async_trait]
impl IdentityProvider for SupabaseIdentity {
    async fn verify(&self, token: &str) -> Result<AuthUser, IdentityError> {
        let res = self
            .http
            .get(self.endpoint("auth/v1/user")?)
            .header("apikey", &self.service_role_key)
            .bearer_auth(token)
            .send()
            .await?;

        match res.status() {
            status if status.is_success() => Ok(res.json::<GoTrueUser>().await?.into()),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(IdentityError::InvalidToken),
            status => Err(IdentityError::Provider(format!("user lookup returned {status}"))),
        }
    }

    async fn register(&self, email: &str, password: &str) -> Result<AuthSession, IdentityError> {
        let res = self
            .http
            .post(self.endpoint("auth/v1/admin/users")?)
            .header("apikey", &self.service_role_key)
            .bearer_auth(&self.service_role_key)
            .json(&json!({
                "email": email,
                "password": password,
                "email_confirm": true,
            }))
            .send()
            .await?;

        if !res.status().is_success() {
            let status = res.status();
            let body = res.json::<GoTrueError>().await.unwrap_or_default();
            let text = body.text();
            let exists = body.error_code.as_deref() == Some("email_exists")
                || text.contains("already been registered")
                || text.contains("already exists");
            if exists {
                return Err(IdentityError::AlreadyRegistered);
            }
            return Err(IdentityError::Provider(format!("register returned {status}: {text}")));
        }

        self.login(email, password).await
    }

    async fn login(&self, email: &str, password: &str) -> Result<AuthSession, IdentityError> {
        let mut endpoint = self.endpoint("auth/v1/token")?;
        endpoint.set_query(Some("grant_type=password"));
        let res = self
            .http
            .post(endpoint)
            .header("apikey", &self.service_role_key)
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;

        match res.status() {
            status if status.is_success() => {
                let session = res.json::<GoTrueSession>().await?;
                Ok(AuthSession {
                    user: session.user.into(),
                    token: session.access_token,
                })
            }
            StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED => {
                Err(IdentityError::InvalidCredentials)
            }
            status => Err(IdentityError::Provider(format!("login returned {status}"))),
        }
    }
}

#[derive(Clone)]
struct Account {
    id: String,
    password: String,
}

#[derive(Default)]
struct Accounts {
    by_email: HashMap<String, Account>,
    sessions: HashMap<String, AuthUser>,
}

/// In-memory accounts and opaque session tokens.
///
/// Used for local runs without a Supabase project and as the identity double
/// in tests.
#[derive(Default)]
pub struct StaticIdentity {
    accounts: RwLock<Accounts>,
}

impl StaticIdentity {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a token that resolves to `user` without going through login.
    pub async fn insert_token(&self, token: &str, user: AuthUser) {
        self.accounts
            .write()
            .await
            .sessions
            .insert(token.to_string(), user);
    }

    fn open_session(accounts: &mut Accounts, email: &str, id: &str) -> AuthSession {
        let user = AuthUser {
            id: id.to_string(),
            email: Some(email.to_string()),
        };
        let token = Uuid::new_v4().simple().to_string();
        accounts.sessions.insert(token.clone(), user.clone());
        AuthSession { user, token }
    }
}

#[async_trait::async_trait]
impl IdentityProvider for StaticIdentity {
    async fn verify(&self, token: &str) -> Result<AuthUser, IdentityError> {
        self.accounts
            .read()
            .await
            .sessions
            .get(token)
            .cloned()
            .ok_or(IdentityError::InvalidToken)
    }

    async fn register(&self, email: &str, password: &str) -> Result<AuthSession, IdentityError> {
        let mut accounts = self.accounts.write().await;
        if accounts.by_email.contains_key(email) {
            return Err(IdentityError::AlreadyRegistered);
        }
        let id = Uuid::new_v4().to_string();
        accounts.by_email.insert(
            email.to_string(),
            Account {
                id: id.clone(),
                password: password.to_string(),
            },
        );
        Ok(Self::open_session(&mut accounts, email, &id))
    }

    async fn login(&self, email: &str, password: &str) -> Result<AuthSession, IdentityError> {
        let mut accounts = self.accounts.write().await;
        let account = accounts
            .by_email
            .get(email)
            .filter(|account| account.password == password)
            .cloned()
            .ok_or(IdentityError::InvalidCredentials)?;
        Ok(Self::open_session(&mut accounts, email, &account.id))
    }
}
