/// Application state and router builder
///
/// # Example
///
/// ```no_run
/// use taskhub_api::{app::AppState, config::Config};
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let state = AppState::from_config(pool, config)?;
/// let app = taskhub_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{
    config::{Config, MailTransport},
    middleware::security::SecurityHeadersLayer,
};
use axum::{
    extract::{DefaultBodyLimit, Request, State},
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::Response,
    routing::{get, post, put},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use taskhub_shared::{
    auth::middleware::authenticate,
    mail::{ConsoleMailer, Mailer, SmtpMailer, SmtpSettings},
    services::accounts::AccountSettings,
    storage::{FileStore, LocalFileStore},
};
use tower_http::{
    cors::CorsLayer,
    services::ServeDir,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// Cloned for each request handler via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,

    /// Outgoing mail transport
    pub mailer: Arc<dyn Mailer>,

    /// Profile image storage
    pub storage: Arc<dyn FileStore>,

    /// Token and login settings derived from `config`
    pub accounts: Arc<AccountSettings>,
}

impl AppState {
    /// Creates state with explicit mail and storage backends
    pub fn new(
        db: PgPool,
        config: Config,
        mailer: Arc<dyn Mailer>,
        storage: Arc<dyn FileStore>,
    ) -> Self {
        let accounts = AccountSettings {
            jwt_secret: config.jwt.secret.clone(),
            access_token_ttl: chrono::Duration::hours(config.jwt.access_ttl_hours),
            public_url: config.api.public_url.clone(),
            require_verified_login: config.jwt.require_verified_login,
        };

        Self {
            db,
            config: Arc::new(config),
            mailer,
            storage,
            accounts: Arc::new(accounts),
        }
    }

    /// Creates state with the backends selected by configuration
    pub fn from_config(db: PgPool, config: Config) -> anyhow::Result<Self> {
        let mailer: Arc<dyn Mailer> = match &config.mail.transport {
            MailTransport::Console => Arc::new(ConsoleMailer),
            MailTransport::Smtp {
                host,
                port,
                username,
                password,
            } => Arc::new(SmtpMailer::new(SmtpSettings {
                host: host.clone(),
                port: *port,
                username: username.clone(),
                password: password.clone(),
                from: config.mail.from.clone(),
            })?),
        };

        let storage: Arc<dyn FileStore> = Arc::new(LocalFileStore::new(
            config.uploads.dir.clone(),
            config.uploads_url(),
            config.uploads.max_bytes,
        ));

        Ok(Self::new(db, config, mailer, storage))
    }

    /// Gets JWT secret for token operations
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── GET  /health
/// ├── /auth/
/// │   ├── POST /register
/// │   ├── GET  /verify-email?token=
/// │   └── POST /login
/// ├── /projects/                        (authenticated)
/// │   ├── GET    /
/// │   ├── POST   /
/// │   ├── PUT    /:id                   OWNER
/// │   ├── DELETE /:id                   OWNER
/// │   └── POST   /:id/add-user          OWNER
/// ├── /tasks/                           (authenticated)
/// │   ├── GET    /:project_id           any member
/// │   ├── POST   /:project_id           OWNER/WORKER
/// │   ├── PUT    /:task_id              OWNER/WORKER
/// │   ├── DELETE /:task_id              OWNER/WORKER
/// │   └── POST   /asign-user-to/:task_id OWNER/WORKER
/// ├── /user/                            (authenticated)
/// │   ├── GET / PUT / DELETE /
/// │   └── PUT /profile-image
/// └── /uploads/*                        static profile images
/// ```
///
/// # Middleware Stack
///
/// Applied in order (bottom to top):
/// 1. Security headers
/// 2. CORS (tower-http CorsLayer)
/// 3. Logging (tower-http TraceLayer)
/// 4. Authentication (per router)
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    let auth_routes = Router::new()
        .route("/register", post(routes::auth::register))
        .route("/verify-email", get(routes::auth::verify_email))
        .route("/login", post(routes::auth::login));

    let project_routes = Router::new()
        .route(
            "/",
            get(routes::projects::list_projects).post(routes::projects::create_project),
        )
        .route(
            "/:id",
            put(routes::projects::update_project).delete(routes::projects::delete_project),
        )
        .route("/:id/add-user", post(routes::projects::add_user))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    let task_routes = Router::new()
        .route(
            "/:id",
            get(routes::tasks::list_tasks)
                .post(routes::tasks::create_task)
                .put(routes::tasks::update_task)
                .delete(routes::tasks::delete_task),
        )
        .route("/asign-user-to/:id", post(routes::tasks::assign_task))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    let user_routes = Router::new()
        .route(
            "/",
            get(routes::users::get_profile)
                .put(routes::users::update_profile)
                .delete(routes::users::delete_account),
        )
        .route(
            "/profile-image",
            put(routes::users::upload_profile_image).layer(DefaultBodyLimit::max(
                state.config.uploads.max_bytes + 64 * 1024,
            )),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    let cors = if state.config.api.cors_origins.iter().any(|o| o == "*") {
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    Router::new()
        .merge(health_routes)
        .nest("/auth", auth_routes)
        .nest("/projects", project_routes)
        .nest("/tasks", task_routes)
        .nest("/user", user_routes)
        .nest_service("/uploads", ServeDir::new(&state.config.uploads.dir))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}

/// Resolves the bearer token to an account and injects `AuthContext`
async fn jwt_auth_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, crate::error::ApiError> {
    let auth_context = authenticate(&state.db, state.jwt_secret(), req.headers()).await?;

    req.extensions_mut().insert(auth_context);

    Ok(next.run(req).await)
}
