use axum::{
    Router,
    extract::{Request, State},
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
    typed_header::TypedHeaderRejection,
};

use std::sync::Arc;

use crate::{
    ServerError, entries, health,
    identity::{IdentityError, IdentityProvider},
    preferences,
    rates::{self, RateProvider},
    settings, statistics, user,
};
use engine::{Engine, TypeSet};

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
    /// `None` when no identity provider is configured; every authenticated
    /// route then answers 503.
    pub identity: Option<Arc<dyn IdentityProvider>>,
    pub rates: Arc<dyn RateProvider>,
    /// Utility labels accepted by this deployment.
    pub types: Arc<TypeSet>,
}

impl ServerState {
    pub(crate) fn identity(&self) -> Result<&Arc<dyn IdentityProvider>, ServerError> {
        self.identity
            .as_ref()
            .ok_or(ServerError::Identity(IdentityError::NotConfigured))
    }
}

async fn auth(
    State(state): State<ServerState>,
    auth_header: Result<TypedHeader<Authorization<Bearer>>, TypedHeaderRejection>,
    mut request: Request,
    next: Next,
) -> Result<Response, ServerError> {
    let identity = state.identity()?;
    // Absent, non-bearer and unparsable headers all answer the same 401.
    let Ok(TypedHeader(Authorization(bearer))) = auth_header else {
        return Err(IdentityError::MissingToken.into());
    };
    if bearer.token().is_empty() {
        return Err(IdentityError::MissingToken.into());
    }

    let user = identity.verify(bearer.token()).await?;

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

pub fn router(state: ServerState) -> Router {
    Router::new()
        .route("/entries", post(entries::create).get(entries::list))
        .route("/entries/stats", get(statistics::get_stats))
        .route("/entries/breakdown/{type}", get(statistics::breakdown))
        .route("/entries/{id}", axum::routing::delete(entries::delete))
        .route(
            "/settings/{type}",
            get(settings::get_unit_price).put(settings::put_unit_price),
        )
        .route(
            "/preferences/currency",
            get(preferences::get_currency).put(preferences::put_currency),
        )
        .route("/rates", get(rates::get_rates))
        .route("/rates/convert", get(rates::convert))
        .route("/auth/me", get(user::me))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth))
        .route("/health", get(health::get))
        .route("/auth/register", post(user::register))
        .route("/auth/login", post(user::login))
        .with_state(state)
}

pub async fn run(state: ServerState, bind: &str) {
    let listener = match tokio::net::TcpListener::bind(bind).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("failed to bind server listener on {bind}: {err}");
            return;
        }
    };
    if let Err(err) = run_with_listener(state, listener, std::future::pending()).await {
        tracing::error!("server failed: {err}");
    }
}

/// Serves until `shutdown` resolves, then drains in-flight requests.
pub async fn run_with_listener(
    state: ServerState,
    listener: tokio::net::TcpListener,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
}

pub fn spawn_with_listener(
    state: ServerState,
    listener: tokio::net::TcpListener,
) -> Result<std::net::SocketAddr, std::io::Error> {
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(err) = run_with_listener(state, listener, std::future::pending()).await {
            tracing::error!("server failed: {err}");
        }
    });

    Ok(addr)
}
