//! Access policy repository

use crate::domain::AccessPolicy;
use crate::error::{AppError, Result};
use async_trait::async_trait;
use sqlx::MySqlPool;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccessPolicyRepository: Send + Sync {
    /// Whether a policy with the same principal kind, principal and granted
    /// project is already stored. Only principals of the project's own
    /// organization can match.
    async fn access_policy_exists(&self, policy: &AccessPolicy) -> Result<bool>;

    /// Insert the whole batch in one transaction.
    async fn create_many(&self, policies: Vec<AccessPolicy>) -> Result<Vec<AccessPolicy>>;
}

const DISCRIMINATOR_USER: &str = "user_project";
const DISCRIMINATOR_GROUP: &str = "group_project";
const DISCRIMINATOR_SERVICE_ACCOUNT: &str = "service_account_project";

fn discriminator(policy: &AccessPolicy) -> &'static str {
    match policy {
        AccessPolicy::User(_) => DISCRIMINATOR_USER,
        AccessPolicy::Group(_) => DISCRIMINATOR_GROUP,
        AccessPolicy::ServiceAccount(_) => DISCRIMINATOR_SERVICE_ACCOUNT,
    }
}

pub struct AccessPolicyRepositoryImpl {
    pool: MySqlPool,
}

impl AccessPolicyRepositoryImpl {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccessPolicyRepository for AccessPolicyRepositoryImpl {
    async fn access_policy_exists(&self, policy: &AccessPolicy) -> Result<bool> {
        // The principal must belong to the granted project's organization, so
        // ids reused across organizations never collide.
        let sql = match policy {
            AccessPolicy::User(_) => {
                r#"
                SELECT COUNT(*)
                FROM access_policies ap
                JOIN projects p ON p.id = ap.granted_project_id
                JOIN organization_users ou ON ou.id = ap.organization_user_id
                WHERE ap.organization_user_id = ? AND ap.granted_project_id = ?
                  AND ou.organization_id = p.organization_id
                "#
            }
            AccessPolicy::Group(_) => {
                r#"
                SELECT COUNT(*)
                FROM access_policies ap
                JOIN projects p ON p.id = ap.granted_project_id
                JOIN `groups` g ON g.id = ap.group_id
                WHERE ap.group_id = ? AND ap.granted_project_id = ?
                  AND g.organization_id = p.organization_id
                "#
            }
            AccessPolicy::ServiceAccount(_) => {
                r#"
                SELECT COUNT(*)
                FROM access_policies ap
                JOIN projects p ON p.id = ap.granted_project_id
                JOIN service_accounts sa ON sa.id = ap.service_account_id
                WHERE ap.service_account_id = ? AND ap.granted_project_id = ?
                  AND sa.organization_id = p.organization_id
                "#
            }
        };

        let row: (i64,) = sqlx::query_as(sql)
            .bind(policy.principal_id())
            .bind(policy.granted_project_id())
            .fetch_one(&self.pool)
            .await?;

        Ok(row.0 > 0)
    }

    async fn create_many(&self, policies: Vec<AccessPolicy>) -> Result<Vec<AccessPolicy>> {
        let mut tx = self.pool.begin().await?;

        for policy in &policies {
            let (organization_user_id, group_id, service_account_id) = match policy {
                AccessPolicy::User(p) => (Some(p.organization_user_id), None, None),
                AccessPolicy::Group(p) => (None, Some(p.group_id), None),
                AccessPolicy::ServiceAccount(p) => (None, None, Some(p.service_account_id)),
            };

            sqlx::query(
                r#"
                INSERT INTO access_policies
                    (id, discriminator, organization_user_id, group_id, service_account_id,
                     granted_project_id, `read`, `write`, creation_date, revision_date)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(policy.id())
            .bind(discriminator(policy))
            .bind(organization_user_id)
            .bind(group_id)
            .bind(service_account_id)
            .bind(policy.granted_project_id())
            .bind(policy.read())
            .bind(policy.write())
            .bind(policy.creation_date())
            .bind(policy.revision_date())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_insert_error(e, policy))?;
        }

        tx.commit().await?;

        Ok(policies)
    }
}

/// A concurrent writer may insert the same grant between the existence check
/// and this insert; the unique index turns that into a conflict.
fn map_insert_error(err: sqlx::Error, policy: &AccessPolicy) -> AppError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => AppError::Conflict(format!(
            "Access policy for {} already exists",
            policy.key()
        )),
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => AppError::BadRequest(
            format!("Access policy for {} references an unknown principal", policy.key()),
        ),
        _ => AppError::Database(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        GroupProjectAccessPolicy, ServiceAccountProjectAccessPolicy, StringUuid,
        UserProjectAccessPolicy,
    };

    #[test]
    fn test_discriminator_matches_variant() {
        let principal = StringUuid::new_v4();
        let project = StringUuid::new_v4();
        let cases: Vec<(AccessPolicy, &str)> = vec![
            (
                UserProjectAccessPolicy::new(principal, project, true, true).into(),
                DISCRIMINATOR_USER,
            ),
            (
                GroupProjectAccessPolicy::new(principal, project, true, true).into(),
                DISCRIMINATOR_GROUP,
            ),
            (
                ServiceAccountProjectAccessPolicy::new(principal, project, true, true).into(),
                DISCRIMINATOR_SERVICE_ACCOUNT,
            ),
        ];

        for (policy, expected) in cases {
            assert_eq!(discriminator(&policy), expected);
        }
    }
}
