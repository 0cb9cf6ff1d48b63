//! Server initialization and routing

use crate::api;
use crate::config::Config;
use crate::jwt::JwtManager;
use crate::middleware::RequestMetricsLayer;
use crate::repository::{
    access_policy::AccessPolicyRepositoryImpl, import::ImportRepositoryImpl,
    organization_user::OrganizationUserRepositoryImpl, project::ProjectRepositoryImpl,
    secret::SecretRepositoryImpl,
};
use crate::service::{AccessPolicyService, PortingService};
use crate::state::HasServices;
use anyhow::Result;
use axum::{
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use sqlx::{mysql::MySqlPoolOptions, MySqlPool};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db_pool: MySqlPool,
    pub jwt_manager: JwtManager,
    pub access_policy_service: Arc<
        AccessPolicyService<
            ProjectRepositoryImpl,
            AccessPolicyRepositoryImpl,
            OrganizationUserRepositoryImpl,
        >,
    >,
    pub porting_service: Arc<
        PortingService<
            ProjectRepositoryImpl,
            SecretRepositoryImpl,
            OrganizationUserRepositoryImpl,
            ImportRepositoryImpl,
        >,
    >,
    pub prometheus_handle: Option<PrometheusHandle>,
}

impl AppState {
    pub fn new(
        db_pool: MySqlPool,
        jwt_manager: JwtManager,
        prometheus_handle: Option<PrometheusHandle>,
    ) -> Self {
        let project_repo = Arc::new(ProjectRepositoryImpl::new(db_pool.clone()));
        let org_user_repo = Arc::new(OrganizationUserRepositoryImpl::new(db_pool.clone()));
        let access_policy_repo = Arc::new(AccessPolicyRepositoryImpl::new(db_pool.clone()));
        let secret_repo = Arc::new(SecretRepositoryImpl::new(db_pool.clone()));
        let import_repo = Arc::new(ImportRepositoryImpl::new(db_pool.clone()));

        let access_policy_service = Arc::new(AccessPolicyService::new(
            project_repo.clone(),
            access_policy_repo,
            org_user_repo.clone(),
        ));
        let porting_service = Arc::new(PortingService::new(
            project_repo,
            secret_repo,
            org_user_repo,
            import_repo,
        ));

        Self {
            db_pool,
            jwt_manager,
            access_policy_service,
            porting_service,
            prometheus_handle,
        }
    }
}

impl HasServices for AppState {
    type ProjectRepo = ProjectRepositoryImpl;
    type AccessPolicyRepo = AccessPolicyRepositoryImpl;
    type OrganizationUserRepo = OrganizationUserRepositoryImpl;
    type SecretRepo = SecretRepositoryImpl;
    type ImportRepo = ImportRepositoryImpl;

    fn jwt_manager(&self) -> &JwtManager {
        &self.jwt_manager
    }

    fn access_policy_service(
        &self,
    ) -> &AccessPolicyService<
        ProjectRepositoryImpl,
        AccessPolicyRepositoryImpl,
        OrganizationUserRepositoryImpl,
    > {
        &self.access_policy_service
    }

    fn porting_service(
        &self,
    ) -> &PortingService<
        ProjectRepositoryImpl,
        SecretRepositoryImpl,
        OrganizationUserRepositoryImpl,
        ImportRepositoryImpl,
    > {
        &self.porting_service
    }

    fn prometheus_handle(&self) -> Option<&PrometheusHandle> {
        self.prometheus_handle.as_ref()
    }

    async fn check_ready(&self) -> bool {
        sqlx::query("SELECT 1")
            .execute(&self.db_pool)
            .await
            .is_ok()
    }
}

/// Connect to the database and serve HTTP until a shutdown signal.
pub async fn run(config: Config, prometheus_handle: Option<PrometheusHandle>) -> Result<()> {
    let db_pool = MySqlPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .connect(&config.database.url)
        .await?;

    info!("Connected to database");

    let jwt_manager = JwtManager::new(config.jwt.clone());
    let state = AppState::new(db_pool, jwt_manager, prometheus_handle);
    let app = build_router(state);

    let http_addr = config.http_addr();
    let listener = TcpListener::bind(&http_addr).await?;
    info!("HTTP server started on {}", http_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("HTTP server stopped");
    Ok(())
}

/// Resolves on ctrl-c or SIGTERM. A handler that cannot be installed never
/// resolves.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for ctrl-c: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received ctrl-c, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}

/// Build the HTTP router
pub fn build_router<S: HasServices>(state: S) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(api::health::health))
        .route("/ready", get(api::health::ready::<S>))
        .route("/metrics", get(api::metrics::metrics_handler::<S>))
        .route(
            "/api/v1/projects/{project_id}/access-policies",
            post(api::access_policy::create::<S>),
        )
        .route(
            "/api/v1/sm/{organization_id}/export",
            get(api::porting::export::<S>),
        )
        .route(
            "/api/v1/sm/{organization_id}/import",
            post(api::porting::import::<S>),
        )
        .layer(TraceLayer::new_for_http())
        .layer(RequestMetricsLayer)
        .layer(cors)
        .with_state(state)
}
