//! Project repository

use crate::domain::{AccessClientType, Project, StringUuid};
use crate::error::Result;
use crate::repository::secrets_manager_enabled;
use async_trait::async_trait;
use sqlx::MySqlPool;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProjectRepository: Send + Sync {
    async fn find_by_id(&self, id: StringUuid) -> Result<Option<Project>>;

    /// True when the user holds a write grant on the project, directly or
    /// through one of their groups.
    async fn user_has_write_access_to_project(
        &self,
        project_id: StringUuid,
        user_id: StringUuid,
    ) -> Result<bool>;

    /// Projects of the organization visible under `access_client`.
    /// `None` when the organization has no Secrets Manager data to list.
    async fn find_many_by_organization(
        &self,
        organization_id: StringUuid,
        user_id: StringUuid,
        access_client: AccessClientType,
    ) -> Result<Option<Vec<Project>>>;
}

pub struct ProjectRepositoryImpl {
    pool: MySqlPool,
}

impl ProjectRepositoryImpl {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProjectRepository for ProjectRepositoryImpl {
    async fn find_by_id(&self, id: StringUuid) -> Result<Option<Project>> {
        let project = sqlx::query_as::<_, Project>(
            r#"
            SELECT id, organization_id, name, creation_date, revision_date, deleted_date
            FROM projects
            WHERE id = ? AND deleted_date IS NULL
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(project)
    }

    async fn user_has_write_access_to_project(
        &self,
        project_id: StringUuid,
        user_id: StringUuid,
    ) -> Result<bool> {
        let row: (i64,) = sqlx::query_as(
            r#"
            SELECT EXISTS(
                SELECT 1
                FROM access_policies ap
                JOIN organization_users ou ON ou.id = ap.organization_user_id
                WHERE ap.granted_project_id = ? AND ou.user_id = ?
                  AND ou.status = 'confirmed' AND ap.`write` = TRUE
                UNION ALL
                SELECT 1
                FROM access_policies ap
                JOIN group_users gu ON gu.group_id = ap.group_id
                JOIN organization_users ou ON ou.id = gu.organization_user_id
                WHERE ap.granted_project_id = ? AND ou.user_id = ?
                  AND ou.status = 'confirmed' AND ap.`write` = TRUE
            )
            "#,
        )
        .bind(project_id)
        .bind(user_id)
        .bind(project_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.0 != 0)
    }

    async fn find_many_by_organization(
        &self,
        organization_id: StringUuid,
        user_id: StringUuid,
        access_client: AccessClientType,
    ) -> Result<Option<Vec<Project>>> {
        if !secrets_manager_enabled(&self.pool, organization_id).await? {
            return Ok(None);
        }

        let projects = match access_client {
            AccessClientType::NoAccessCheck => {
                sqlx::query_as::<_, Project>(
                    r#"
                    SELECT id, organization_id, name, creation_date, revision_date, deleted_date
                    FROM projects
                    WHERE organization_id = ? AND deleted_date IS NULL
                    ORDER BY revision_date DESC
                    "#,
                )
                .bind(organization_id)
                .fetch_all(&self.pool)
                .await?
            }
            AccessClientType::User => {
                sqlx::query_as::<_, Project>(
                    r#"
                    SELECT DISTINCT p.id, p.organization_id, p.name, p.creation_date,
                           p.revision_date, p.deleted_date
                    FROM projects p
                    JOIN access_policies ap ON ap.granted_project_id = p.id
                    LEFT JOIN group_users gu ON gu.group_id = ap.group_id
                    JOIN organization_users ou
                      ON ou.id = ap.organization_user_id OR ou.id = gu.organization_user_id
                    WHERE p.organization_id = ? AND p.deleted_date IS NULL
                      AND ou.user_id = ? AND ou.organization_id = p.organization_id
                      AND ou.status = 'confirmed' AND ap.`read` = TRUE
                    ORDER BY p.revision_date DESC
                    "#,
                )
                .bind(organization_id)
                .bind(user_id)
                .fetch_all(&self.pool)
                .await?
            }
            AccessClientType::ServiceAccount => {
                sqlx::query_as::<_, Project>(
                    r#"
                    SELECT p.id, p.organization_id, p.name, p.creation_date,
                           p.revision_date, p.deleted_date
                    FROM projects p
                    JOIN access_policies ap ON ap.granted_project_id = p.id
                    WHERE p.organization_id = ? AND p.deleted_date IS NULL
                      AND ap.service_account_id = ? AND ap.`read` = TRUE
                    ORDER BY p.revision_date DESC
                    "#,
                )
                .bind(organization_id)
                .bind(user_id)
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(Some(projects))
    }
}
