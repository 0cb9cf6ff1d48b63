//! Data access layer (Repository pattern)

pub mod access_policy;
pub mod import;
pub mod organization_user;
pub mod project;
pub mod secret;

pub use access_policy::AccessPolicyRepository;
pub use import::ImportRepository;
pub use organization_user::OrganizationUserRepository;
pub use project::ProjectRepository;
pub use secret::SecretRepository;

use crate::domain::StringUuid;
use crate::error::Result;
use sqlx::MySqlPool;

/// Whether the organization exists and has Secrets Manager enabled.
///
/// Organization-wide listings return `None` (rather than an empty list) when
/// this is false, so callers can tell "nothing visible" from "nothing there".
pub(crate) async fn secrets_manager_enabled(
    pool: &MySqlPool,
    organization_id: StringUuid,
) -> Result<bool> {
    let row: Option<(bool,)> =
        sqlx::query_as("SELECT use_secrets_manager FROM organizations WHERE id = ?")
            .bind(organization_id)
            .fetch_optional(pool)
            .await?;

    Ok(matches!(row, Some((true,))))
}
