//! Shared test infrastructure: an in-memory store standing in for every
//! repository, a `HasServices` state over it, and HTTP helpers.
//!
//! No database is required.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use sm_access_core::config::JwtConfig;
use sm_access_core::domain::{
    AccessClientType, AccessPolicy, ClientType, ImportSummary, OrganizationUser,
    OrganizationUserType, Project, Secret, SmImport, StringUuid,
};
use sm_access_core::error::Result;
use sm_access_core::jwt::JwtManager;
use sm_access_core::repository::{
    AccessPolicyRepository, ImportRepository, OrganizationUserRepository, ProjectRepository,
    SecretRepository,
};
use sm_access_core::server::build_router;
use sm_access_core::service::{AccessPolicyService, PortingService};
use sm_access_core::state::HasServices;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower::ServiceExt;

// ============================================================================
// In-memory store
// ============================================================================

#[derive(Default)]
pub struct TestStore {
    sm_enabled: RwLock<HashSet<StringUuid>>,
    memberships: RwLock<Vec<OrganizationUser>>,
    projects: RwLock<Vec<Project>>,
    /// (project, user) pairs holding a write grant
    write_grants: RwLock<HashSet<(StringUuid, StringUuid)>>,
    /// (project, caller) pairs able to list the project
    read_grants: RwLock<HashSet<(StringUuid, StringUuid)>>,
    policies: RwLock<Vec<AccessPolicy>>,
    secrets: RwLock<Vec<Secret>>,
    create_many_calls: AtomicUsize,
    import_calls: AtomicUsize,
}

impl TestStore {
    pub async fn enable_secrets_manager(&self, organization_id: StringUuid) {
        self.sm_enabled.write().await.insert(organization_id);
    }

    pub async fn add_member(
        &self,
        organization_id: StringUuid,
        user_id: StringUuid,
        user_type: OrganizationUserType,
    ) {
        self.memberships.write().await.push(OrganizationUser {
            organization_id,
            user_id,
            user_type,
            ..Default::default()
        });
    }

    pub async fn add_project(&self, organization_id: StringUuid, name: &str) -> Project {
        let project = Project {
            organization_id,
            name: name.to_string(),
            ..Default::default()
        };
        self.projects.write().await.push(project.clone());
        project
    }

    pub async fn add_secret(&self, organization_id: StringUuid, key: &str) -> Secret {
        let secret = Secret {
            organization_id,
            key: key.to_string(),
            value: "value".to_string(),
            ..Default::default()
        };
        self.secrets.write().await.push(secret.clone());
        secret
    }

    pub async fn grant_write(&self, project_id: StringUuid, user_id: StringUuid) {
        self.write_grants.write().await.insert((project_id, user_id));
        self.grant_read(project_id, user_id).await;
    }

    pub async fn grant_read(&self, project_id: StringUuid, caller_id: StringUuid) {
        self.read_grants.write().await.insert((project_id, caller_id));
    }

    pub async fn add_policy(&self, policy: AccessPolicy) {
        self.policies.write().await.push(policy);
    }

    pub async fn policy_count(&self) -> usize {
        self.policies.read().await.len()
    }

    pub async fn project_count(&self, organization_id: StringUuid) -> usize {
        self.projects
            .read()
            .await
            .iter()
            .filter(|p| p.organization_id == organization_id)
            .count()
    }

    pub fn create_many_calls(&self) -> usize {
        self.create_many_calls.load(Ordering::SeqCst)
    }

    pub fn import_calls(&self) -> usize {
        self.import_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProjectRepository for TestStore {
    async fn find_by_id(&self, id: StringUuid) -> Result<Option<Project>> {
        let projects = self.projects.read().await;
        Ok(projects.iter().find(|p| p.id == id).cloned())
    }

    async fn user_has_write_access_to_project(
        &self,
        project_id: StringUuid,
        user_id: StringUuid,
    ) -> Result<bool> {
        Ok(self
            .write_grants
            .read()
            .await
            .contains(&(project_id, user_id)))
    }

    async fn find_many_by_organization(
        &self,
        organization_id: StringUuid,
        user_id: StringUuid,
        access_client: AccessClientType,
    ) -> Result<Option<Vec<Project>>> {
        if !self.sm_enabled.read().await.contains(&organization_id) {
            return Ok(None);
        }

        let read_grants = self.read_grants.read().await;
        let projects = self
            .projects
            .read()
            .await
            .iter()
            .filter(|p| p.organization_id == organization_id)
            .filter(|p| match access_client {
                AccessClientType::NoAccessCheck => true,
                AccessClientType::User | AccessClientType::ServiceAccount => {
                    read_grants.contains(&(p.id, user_id))
                }
            })
            .cloned()
            .collect();
        Ok(Some(projects))
    }
}

#[async_trait]
impl OrganizationUserRepository for TestStore {
    async fn find_by_organization_and_user(
        &self,
        organization_id: StringUuid,
        user_id: StringUuid,
    ) -> Result<Option<OrganizationUser>> {
        let memberships = self.memberships.read().await;
        Ok(memberships
            .iter()
            .find(|m| m.organization_id == organization_id && m.user_id == user_id)
            .cloned())
    }
}

#[async_trait]
impl AccessPolicyRepository for TestStore {
    async fn access_policy_exists(&self, policy: &AccessPolicy) -> Result<bool> {
        let key = policy.key();
        Ok(self.policies.read().await.iter().any(|p| p.key() == key))
    }

    async fn create_many(&self, policies: Vec<AccessPolicy>) -> Result<Vec<AccessPolicy>> {
        self.create_many_calls.fetch_add(1, Ordering::SeqCst);
        self.policies.write().await.extend(policies.iter().cloned());
        Ok(policies)
    }
}

#[async_trait]
impl SecretRepository for TestStore {
    async fn find_many_by_organization(
        &self,
        organization_id: StringUuid,
    ) -> Result<Option<Vec<Secret>>> {
        if !self.sm_enabled.read().await.contains(&organization_id) {
            return Ok(None);
        }
        let secrets = self.secrets.read().await;
        Ok(Some(
            secrets
                .iter()
                .filter(|s| s.organization_id == organization_id)
                .cloned()
                .collect(),
        ))
    }
}

#[async_trait]
impl ImportRepository for TestStore {
    async fn import(
        &self,
        organization_id: StringUuid,
        import: SmImport,
    ) -> Result<ImportSummary> {
        self.import_calls.fetch_add(1, Ordering::SeqCst);
        for project in &import.projects {
            self.add_project(organization_id, &project.name).await;
        }
        for secret in &import.secrets {
            self.add_secret(organization_id, &secret.key).await;
        }
        Ok(ImportSummary {
            projects_imported: import.projects.len() as u64,
            secrets_imported: import.secrets.len() as u64,
        })
    }
}

// ============================================================================
// Test state
// ============================================================================

pub fn test_jwt_config() -> JwtConfig {
    JwtConfig {
        secret: "test-secret-key-for-api-testing-purposes".to_string(),
        issuer: "https://identity.sm.test".to_string(),
    }
}

#[derive(Clone)]
pub struct TestAppState {
    pub store: Arc<TestStore>,
    pub jwt_manager: JwtManager,
    access_policy_service: Arc<AccessPolicyService<TestStore, TestStore, TestStore>>,
    porting_service: Arc<PortingService<TestStore, TestStore, TestStore, TestStore>>,
}

impl TestAppState {
    pub fn new() -> Self {
        let store = Arc::new(TestStore::default());
        Self {
            access_policy_service: Arc::new(AccessPolicyService::new(
                store.clone(),
                store.clone(),
                store.clone(),
            )),
            porting_service: Arc::new(PortingService::new(
                store.clone(),
                store.clone(),
                store.clone(),
                store.clone(),
            )),
            jwt_manager: JwtManager::new(test_jwt_config()),
            store,
        }
    }

    pub fn token_for(&self, caller_id: StringUuid, client_type: ClientType) -> String {
        self.jwt_manager
            .create_access_token(*caller_id, client_type)
            .expect("Failed to create test token")
    }

    pub fn router(&self) -> Router {
        build_router(self.clone())
    }
}

impl HasServices for TestAppState {
    type ProjectRepo = TestStore;
    type AccessPolicyRepo = TestStore;
    type OrganizationUserRepo = TestStore;
    type SecretRepo = TestStore;
    type ImportRepo = TestStore;

    fn jwt_manager(&self) -> &JwtManager {
        &self.jwt_manager
    }

    fn access_policy_service(&self) -> &AccessPolicyService<TestStore, TestStore, TestStore> {
        &self.access_policy_service
    }

    fn porting_service(&self) -> &PortingService<TestStore, TestStore, TestStore, TestStore> {
        &self.porting_service
    }

    fn prometheus_handle(&self) -> Option<&PrometheusHandle> {
        None
    }

    async fn check_ready(&self) -> bool {
        true
    }
}

// ============================================================================
// HTTP helpers
// ============================================================================

/// Send a request and parse the JSON response body (`Null` when empty or not JSON)
pub async fn send(
    app: &Router,
    method: Method,
    path: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let mut builder = Request::builder().method(method).uri(path);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap_or_default();

    let json = serde_json::from_slice(&body_bytes).unwrap_or(serde_json::Value::Null);
    (status, json)
}
