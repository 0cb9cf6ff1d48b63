//! Organization membership repository

use crate::domain::{OrganizationUser, StringUuid};
use crate::error::Result;
use async_trait::async_trait;
use sqlx::MySqlPool;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OrganizationUserRepository: Send + Sync {
    async fn find_by_organization_and_user(
        &self,
        organization_id: StringUuid,
        user_id: StringUuid,
    ) -> Result<Option<OrganizationUser>>;
}

pub struct OrganizationUserRepositoryImpl {
    pool: MySqlPool,
}

impl OrganizationUserRepositoryImpl {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OrganizationUserRepository for OrganizationUserRepositoryImpl {
    async fn find_by_organization_and_user(
        &self,
        organization_id: StringUuid,
        user_id: StringUuid,
    ) -> Result<Option<OrganizationUser>> {
        let membership = sqlx::query_as::<_, OrganizationUser>(
            r#"
            SELECT id, organization_id, user_id, type, status
            FROM organization_users
            WHERE organization_id = ? AND user_id = ?
            "#,
        )
        .bind(organization_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(membership)
    }
}
