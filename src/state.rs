//! Application state trait for dependency injection
//!
//! Handlers are generic over `HasServices`, so the production `AppState` and
//! test states backed by in-memory repositories share the same router.

use crate::jwt::JwtManager;
use crate::repository::{
    AccessPolicyRepository, ImportRepository, OrganizationUserRepository, ProjectRepository,
    SecretRepository,
};
use crate::service::{AccessPolicyService, PortingService};
use metrics_exporter_prometheus::PrometheusHandle;

pub trait HasServices: Clone + Send + Sync + 'static {
    type ProjectRepo: ProjectRepository;
    type AccessPolicyRepo: AccessPolicyRepository;
    type OrganizationUserRepo: OrganizationUserRepository;
    type SecretRepo: SecretRepository;
    type ImportRepo: ImportRepository;

    fn jwt_manager(&self) -> &JwtManager;

    fn access_policy_service(
        &self,
    ) -> &AccessPolicyService<Self::ProjectRepo, Self::AccessPolicyRepo, Self::OrganizationUserRepo>;

    fn porting_service(
        &self,
    ) -> &PortingService<
        Self::ProjectRepo,
        Self::SecretRepo,
        Self::OrganizationUserRepo,
        Self::ImportRepo,
    >;

    /// Present when metrics are enabled
    fn prometheus_handle(&self) -> Option<&PrometheusHandle>;

    /// Whether backing storage is reachable
    fn check_ready(&self) -> impl std::future::Future<Output = bool> + Send;
}
