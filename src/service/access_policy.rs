//! Access policy creation command

use crate::domain::{AccessPolicy, PolicyKey, PrincipalKind, Project, StringUuid};
use crate::error::{AppError, Result};
use crate::repository::{AccessPolicyRepository, OrganizationUserRepository, ProjectRepository};
use crate::service::authorization::{AccessDecision, AuthorizationService};
use crate::telemetry::metrics as sm_metrics;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, warn};

/// A batch that passed every creation check for one project.
///
/// Only [`AccessPolicyService::validate`] hands these out, so the write path
/// cannot be reached with an unchecked batch.
#[derive(Debug)]
pub struct ValidatedBatch {
    project_id: StringUuid,
    policies: Vec<AccessPolicy>,
}

/// Reject a batch in which two policies share kind, principal and granted
/// project, wherever they sit in the batch.
pub fn ensure_batch_unique(policies: &[AccessPolicy]) -> Result<()> {
    let mut seen: HashSet<PolicyKey> = HashSet::with_capacity(policies.len());
    for policy in policies {
        let key = policy.key();
        if !seen.insert(key) {
            return Err(AppError::Conflict(format!(
                "These access policies contain duplicate entries: {}",
                key
            )));
        }
    }
    Ok(())
}

fn count_by_kind(policies: &[AccessPolicy]) -> (usize, usize, usize) {
    policies
        .iter()
        .fold((0, 0, 0), |(users, groups, service_accounts), policy| {
            match policy.kind() {
                PrincipalKind::User => (users + 1, groups, service_accounts),
                PrincipalKind::Group => (users, groups + 1, service_accounts),
                PrincipalKind::ServiceAccount => (users, groups, service_accounts + 1),
            }
        })
}

pub struct AccessPolicyService<
    P: ProjectRepository,
    A: AccessPolicyRepository,
    O: OrganizationUserRepository,
> {
    project_repo: Arc<P>,
    access_policy_repo: Arc<A>,
    authorization: AuthorizationService<O, P>,
}

impl<P: ProjectRepository, A: AccessPolicyRepository, O: OrganizationUserRepository>
    AccessPolicyService<P, A, O>
{
    pub fn new(project_repo: Arc<P>, access_policy_repo: Arc<A>, org_user_repo: Arc<O>) -> Self {
        Self {
            authorization: AuthorizationService::new(org_user_repo, project_repo.clone()),
            project_repo,
            access_policy_repo,
        }
    }

    /// Create `policies` on a project on behalf of `acting_user_id`.
    ///
    /// Checks run in order: project lookup, authorization, batch uniqueness,
    /// uniqueness against stored policies. The first failure is returned and
    /// nothing is written; otherwise the whole batch is inserted at once.
    pub async fn create_for_project(
        &self,
        project_id: StringUuid,
        policies: Vec<AccessPolicy>,
        acting_user_id: StringUuid,
    ) -> Result<Vec<AccessPolicy>> {
        let result = self
            .try_create_for_project(project_id, policies, acting_user_id)
            .await;

        match &result {
            Ok(_) => sm_metrics::record_access_policy_create("created"),
            Err(e) => {
                warn!(
                    project_id = %project_id,
                    acting_user_id = %acting_user_id,
                    reason = e.kind(),
                    "Access policy creation rejected: {}",
                    e
                );
                sm_metrics::record_access_policy_create(e.kind());
            }
        }

        result
    }

    async fn try_create_for_project(
        &self,
        project_id: StringUuid,
        policies: Vec<AccessPolicy>,
        acting_user_id: StringUuid,
    ) -> Result<Vec<AccessPolicy>> {
        let project = self
            .project_repo
            .find_by_id(project_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Project {} not found", project_id)))?;

        let decision = self
            .authorization
            .project_write_access(&project, acting_user_id)
            .await?;
        if !decision.is_allowed() {
            return Err(AppError::Unauthorized(
                "Write access to the project is required".to_string(),
            ));
        }

        let batch = self.validate(&project, policies).await?;
        self.write(batch, decision, acting_user_id).await
    }

    /// Run every uniqueness check for `policies` against `project`.
    pub async fn validate(
        &self,
        project: &Project,
        policies: Vec<AccessPolicy>,
    ) -> Result<ValidatedBatch> {
        ensure_batch_unique(&policies)?;

        for policy in &policies {
            if self.access_policy_repo.access_policy_exists(policy).await? {
                return Err(AppError::Conflict(format!(
                    "Access policy for {} already exists",
                    policy.key()
                )));
            }
        }

        Ok(ValidatedBatch {
            project_id: project.id,
            policies,
        })
    }

    async fn write(
        &self,
        batch: ValidatedBatch,
        decision: AccessDecision,
        acting_user_id: StringUuid,
    ) -> Result<Vec<AccessPolicy>> {
        let project_id = batch.project_id;
        let (users, groups, service_accounts) = count_by_kind(&batch.policies);

        let created = self.access_policy_repo.create_many(batch.policies).await?;

        info!(
            project_id = %project_id,
            acting_user_id = %acting_user_id,
            authorized_by = decision.as_str(),
            users,
            groups,
            service_accounts,
            "Created access policies"
        );

        Ok(created)
    }
}
