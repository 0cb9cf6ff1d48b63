//! Secret repository

use crate::domain::{Secret, StringUuid};
use crate::error::Result;
use crate::repository::secrets_manager_enabled;
use async_trait::async_trait;
use sqlx::MySqlPool;
use std::collections::HashMap;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SecretRepository: Send + Sync {
    /// All live secrets of the organization with their project links.
    /// `None` when the organization has no Secrets Manager data to list.
    async fn find_many_by_organization(
        &self,
        organization_id: StringUuid,
    ) -> Result<Option<Vec<Secret>>>;
}

pub struct SecretRepositoryImpl {
    pool: MySqlPool,
}

impl SecretRepositoryImpl {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SecretRepository for SecretRepositoryImpl {
    async fn find_many_by_organization(
        &self,
        organization_id: StringUuid,
    ) -> Result<Option<Vec<Secret>>> {
        if !secrets_manager_enabled(&self.pool, organization_id).await? {
            return Ok(None);
        }

        let mut secrets = sqlx::query_as::<_, Secret>(
            r#"
            SELECT id, organization_id, `key`, value, note,
                   creation_date, revision_date, deleted_date
            FROM secrets
            WHERE organization_id = ? AND deleted_date IS NULL
            ORDER BY revision_date DESC
            "#,
        )
        .bind(organization_id)
        .fetch_all(&self.pool)
        .await?;

        let links: Vec<(StringUuid, StringUuid)> = sqlx::query_as(
            r#"
            SELECT ps.secret_id, ps.project_id
            FROM project_secrets ps
            JOIN secrets s ON s.id = ps.secret_id
            WHERE s.organization_id = ? AND s.deleted_date IS NULL
            "#,
        )
        .bind(organization_id)
        .fetch_all(&self.pool)
        .await?;

        let mut by_secret: HashMap<StringUuid, Vec<StringUuid>> = HashMap::new();
        for (secret_id, project_id) in links {
            by_secret.entry(secret_id).or_default().push(project_id);
        }
        for secret in &mut secrets {
            secret.project_ids = by_secret.remove(&secret.id).unwrap_or_default();
        }

        Ok(Some(secrets))
    }
}
