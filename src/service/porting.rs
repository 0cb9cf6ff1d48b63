//! Secrets Manager import/export

use crate::domain::{
    ClientType, ImportSummary, SmExport, SmImport, StringUuid, SUPPORTED_EXPORT_FORMATS,
};
use crate::error::{AppError, Result};
use crate::repository::{
    ImportRepository, OrganizationUserRepository, ProjectRepository, SecretRepository,
};
use crate::service::authorization::AuthorizationService;
use std::sync::Arc;
use tracing::{debug, info};
use validator::Validate;

/// Exports list every secret of the organization; per-secret access is not
/// checked yet, only projects are scoped to the caller.
pub const SECRET_ACCESS_FILTERING_ENFORCED: bool = false;

pub struct PortingService<
    P: ProjectRepository,
    S: SecretRepository,
    O: OrganizationUserRepository,
    I: ImportRepository,
> {
    project_repo: Arc<P>,
    secret_repo: Arc<S>,
    import_repo: Arc<I>,
    authorization: AuthorizationService<O, P>,
}

impl<P, S, O, I> PortingService<P, S, O, I>
where
    P: ProjectRepository,
    S: SecretRepository,
    O: OrganizationUserRepository,
    I: ImportRepository,
{
    pub fn new(
        project_repo: Arc<P>,
        secret_repo: Arc<S>,
        org_user_repo: Arc<O>,
        import_repo: Arc<I>,
    ) -> Self {
        Self {
            authorization: AuthorizationService::new(org_user_repo, project_repo.clone()),
            project_repo,
            secret_repo,
            import_repo,
        }
    }

    pub async fn export(
        &self,
        organization_id: StringUuid,
        caller_id: StringUuid,
        client_type: ClientType,
        format: &str,
    ) -> Result<SmExport> {
        if !SUPPORTED_EXPORT_FORMATS.contains(&format) {
            return Err(AppError::BadRequest(format!(
                "Export format '{}' is not supported",
                format
            )));
        }

        let access_client = self
            .authorization
            .access_client(organization_id, caller_id, client_type)
            .await?;

        let projects = self
            .project_repo
            .find_many_by_organization(organization_id, caller_id, access_client)
            .await?;

        if !SECRET_ACCESS_FILTERING_ENFORCED {
            debug!(
                organization_id = %organization_id,
                access_client = ?access_client,
                "Exporting secrets without per-secret access filtering"
            );
        }
        let secrets = self
            .secret_repo
            .find_many_by_organization(organization_id)
            .await?;

        if projects.is_none() && secrets.is_none() {
            return Err(AppError::NotFound(format!(
                "No Secrets Manager data found for organization {}",
                organization_id
            )));
        }

        let export = SmExport::new(projects.unwrap_or_default(), secrets.unwrap_or_default());
        info!(
            organization_id = %organization_id,
            projects = export.projects.len(),
            secrets = export.secrets.len(),
            "Exported Secrets Manager data"
        );

        Ok(export)
    }

    pub async fn import(
        &self,
        organization_id: StringUuid,
        user_id: StringUuid,
        import: SmImport,
    ) -> Result<ImportSummary> {
        if !self
            .authorization
            .is_org_member(organization_id, user_id)
            .await?
        {
            return Err(AppError::Unauthorized(
                "Organization membership is required to import".to_string(),
            ));
        }

        import.validate()?;

        let summary = self.import_repo.import(organization_id, import).await?;
        info!(
            organization_id = %organization_id,
            projects = summary.projects_imported,
            secrets = summary.secrets_imported,
            "Imported Secrets Manager data"
        );

        Ok(summary)
    }
}
