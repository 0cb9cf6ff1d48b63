//! Authorization checks for Secrets Manager commands
//!
//! Nothing here is cached: every command re-reads memberships and grants so a
//! revoked privilege takes effect on the next call.

use crate::domain::{AccessClientType, ClientType, Project, StringUuid};
use crate::error::{AppError, Result};
use crate::repository::{OrganizationUserRepository, ProjectRepository};
use std::sync::Arc;

/// Outcome of checking whether an identity may author policies on a project
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    /// Organization owner/admin; no per-project grant needed
    AdminOverride,
    /// Explicit write grant on the project
    ExplicitGrant,
    Denied,
}

impl AccessDecision {
    pub fn resolve(is_org_admin: bool, has_write_grant: bool) -> Self {
        match (is_org_admin, has_write_grant) {
            (true, _) => AccessDecision::AdminOverride,
            (false, true) => AccessDecision::ExplicitGrant,
            (false, false) => AccessDecision::Denied,
        }
    }

    pub fn is_allowed(&self) -> bool {
        !matches!(self, AccessDecision::Denied)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AccessDecision::AdminOverride => "admin_override",
            AccessDecision::ExplicitGrant => "explicit_grant",
            AccessDecision::Denied => "denied",
        }
    }
}

/// Listing scope for a caller
pub fn to_access_client(client_type: ClientType, is_org_admin: bool) -> Result<AccessClientType> {
    match client_type {
        ClientType::User if is_org_admin => Ok(AccessClientType::NoAccessCheck),
        ClientType::User => Ok(AccessClientType::User),
        ClientType::ServiceAccount => Ok(AccessClientType::ServiceAccount),
        ClientType::Organization => Err(AppError::BadRequest(
            "Organization clients are not supported".to_string(),
        )),
    }
}

pub struct AuthorizationService<O: OrganizationUserRepository, P: ProjectRepository> {
    org_user_repo: Arc<O>,
    project_repo: Arc<P>,
}

impl<O: OrganizationUserRepository, P: ProjectRepository> AuthorizationService<O, P> {
    pub fn new(org_user_repo: Arc<O>, project_repo: Arc<P>) -> Self {
        Self {
            org_user_repo,
            project_repo,
        }
    }

    pub async fn is_org_admin(
        &self,
        organization_id: StringUuid,
        user_id: StringUuid,
    ) -> Result<bool> {
        Ok(self
            .org_user_repo
            .find_by_organization_and_user(organization_id, user_id)
            .await?
            .is_some_and(|membership| membership.is_admin()))
    }

    /// Confirmed member of any type
    pub async fn is_org_member(
        &self,
        organization_id: StringUuid,
        user_id: StringUuid,
    ) -> Result<bool> {
        Ok(self
            .org_user_repo
            .find_by_organization_and_user(organization_id, user_id)
            .await?
            .is_some_and(|membership| membership.is_confirmed()))
    }

    pub async fn has_write_access_to_project(
        &self,
        project_id: StringUuid,
        user_id: StringUuid,
    ) -> Result<bool> {
        self.project_repo
            .user_has_write_access_to_project(project_id, user_id)
            .await
    }

    /// Decide whether `user_id` may change access to `project`. The grant
    /// lookup is skipped for organization admins.
    pub async fn project_write_access(
        &self,
        project: &Project,
        user_id: StringUuid,
    ) -> Result<AccessDecision> {
        if self.is_org_admin(project.organization_id, user_id).await? {
            return Ok(AccessDecision::AdminOverride);
        }

        let has_grant = self.has_write_access_to_project(project.id, user_id).await?;
        Ok(AccessDecision::resolve(false, has_grant))
    }

    /// Listing scope of the caller within an organization
    pub async fn access_client(
        &self,
        organization_id: StringUuid,
        caller_id: StringUuid,
        client_type: ClientType,
    ) -> Result<AccessClientType> {
        let is_admin = match client_type {
            ClientType::User => self.is_org_admin(organization_id, caller_id).await?,
            ClientType::ServiceAccount | ClientType::Organization => false,
        };
        to_access_client(client_type, is_admin)
    }
}
