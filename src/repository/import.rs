//! Bulk import of projects and secrets

use crate::domain::{ImportSummary, SmImport, StringUuid};
use crate::error::Result;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::MySqlPool;
use std::collections::HashMap;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ImportRepository: Send + Sync {
    /// Create every project and secret of `import` under `organization_id`
    /// in one transaction. Imported entities get fresh ids; secret-to-project
    /// links are remapped onto the new project ids. `import` must already have
    /// passed `SmImport::validate`, so project ids are unique and every link
    /// names a project of the payload.
    async fn import(&self, organization_id: StringUuid, import: SmImport)
        -> Result<ImportSummary>;
}

pub struct ImportRepositoryImpl {
    pool: MySqlPool,
}

impl ImportRepositoryImpl {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ImportRepository for ImportRepositoryImpl {
    async fn import(
        &self,
        organization_id: StringUuid,
        import: SmImport,
    ) -> Result<ImportSummary> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;
        let mut project_ids: HashMap<StringUuid, StringUuid> = HashMap::new();

        for project in &import.projects {
            let id = StringUuid::new_v4();
            sqlx::query(
                r#"
                INSERT INTO projects (id, organization_id, name, creation_date, revision_date)
                VALUES (?, ?, ?, ?, ?)
                "#,
            )
            .bind(id)
            .bind(organization_id)
            .bind(&project.name)
            .bind(now)
            .bind(now)
            .execute(&mut *tx)
            .await?;
            project_ids.insert(project.id, id);
        }

        for secret in &import.secrets {
            let id = StringUuid::new_v4();
            sqlx::query(
                r#"
                INSERT INTO secrets (id, organization_id, `key`, value, note, creation_date, revision_date)
                VALUES (?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(id)
            .bind(organization_id)
            .bind(&secret.key)
            .bind(&secret.value)
            .bind(&secret.note)
            .bind(now)
            .bind(now)
            .execute(&mut *tx)
            .await?;

            let linked = secret
                .project_ids
                .iter()
                .filter_map(|source_project_id| project_ids.get(source_project_id));
            for project_id in linked {
                sqlx::query("INSERT INTO project_secrets (project_id, secret_id) VALUES (?, ?)")
                    .bind(project_id)
                    .bind(id)
                    .execute(&mut *tx)
                    .await?;
            }
        }

        tx.commit().await?;

        Ok(ImportSummary {
            projects_imported: import.projects.len() as u64,
            secrets_imported: import.secrets.len() as u64,
        })
    }
}
