//! Mock API server setup.
//!
//! # Responsibilities
//! - Create the Axum router with every blog, user, auth and debug route
//! - Wire up middleware (CORS, request ID, tracing, timeout, body limit)
//! - Serve on a listener until the shutdown signal fires

use axum::extract::{DefaultBodyLimit, Request};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::api::{BLOGS_PATH, DEBUG_PATH, LOGIN_PATH, ME_PATH, REGISTER_PATH, USERS_PATH};
use crate::config::ServerConfig;
use crate::http::cors::{cors_middleware, CorsPolicy};
use crate::http::error::ServerError;
use crate::http::handlers::{auth, blogs, debug, method_not_allowed, not_found, users};
use crate::http::store::MockStore;
use crate::observability::metrics;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<MockStore>,
    pub environment: Arc<str>,
    pub started: Instant,
}

/// In-memory blog API used for local development and tests.
pub struct MockApiServer {
    router: Router,
    store: Arc<MockStore>,
}

impl MockApiServer {
    pub fn new(config: &ServerConfig) -> Result<Self, ServerError> {
        Self::with_store(config, Arc::new(MockStore::new()))
    }

    /// Serve an existing store (pre-seeded in tests).
    pub fn with_store(config: &ServerConfig, store: Arc<MockStore>) -> Result<Self, ServerError> {
        let cors = Arc::new(CorsPolicy::new(&config.allowed_origin)?);
        let state = AppState {
            store: store.clone(),
            environment: Arc::from(config.environment.as_str()),
            started: Instant::now(),
        };
        let router = Self::layered(Self::routes(state), config, cors);
        Ok(Self { router, store })
    }

    fn routes(state: AppState) -> Router {
        let blog_path = format!("{BLOGS_PATH}/{{id}}");
        let user_path = format!("{USERS_PATH}/{{id}}");

        Router::new()
            .route(
                BLOGS_PATH,
                get(blogs::list_blogs)
                    .post(blogs::create_blog)
                    .fallback(method_not_allowed),
            )
            .route(
                &blog_path,
                get(blogs::get_blog)
                    .put(blogs::update_blog)
                    .delete(blogs::delete_blog)
                    .fallback(method_not_allowed),
            )
            .route(USERS_PATH, get(users::list_users).fallback(method_not_allowed))
            .route(&user_path, get(users::get_user).fallback(method_not_allowed))
            .route(LOGIN_PATH, post(auth::login).fallback(method_not_allowed))
            .route(REGISTER_PATH, post(auth::register).fallback(method_not_allowed))
            .route(ME_PATH, get(auth::me).fallback(method_not_allowed))
            .route(DEBUG_PATH, get(debug::diagnostics).fallback(method_not_allowed))
            .fallback(not_found)
            .with_state(state)
    }

    /// Wrap `routes` in the middleware stack.
    ///
    /// CORS sits outside the timeout and body limit so their error
    /// responses still carry the CORS headers.
    #[allow(deprecated)]
    fn layered(routes: Router, config: &ServerConfig, cors: Arc<CorsPolicy>) -> Router {
        routes
            .layer(DefaultBodyLimit::max(config.max_body_bytes))
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                    .layer(TraceLayer::new_for_http())
                    .layer(PropagateRequestIdLayer::x_request_id())
                    .layer(TimeoutLayer::new(Duration::from_secs(config.request_timeout_secs))),
            )
            .layer(middleware::from_fn_with_state(cors, cors_middleware))
            .layer(middleware::from_fn(record_request))
    }

    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn store(&self) -> Arc<MockStore> {
        self.store.clone()
    }

    /// Serve until `shutdown` fires or its sender is dropped.
    pub async fn run(self, listener: TcpListener, mut shutdown: broadcast::Receiver<()>) -> Result<(), ServerError> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "Mock API server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("Mock API server stopped");
        Ok(())
    }
}

async fn record_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let response = next.run(request).await;
    metrics::record_mock_request(method.as_str(), response.status().as_u16());
    response
}
