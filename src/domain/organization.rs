//! Organization membership and caller classification

use super::common::StringUuid;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Role of a member within an organization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrganizationUserType {
    Owner,
    Admin,
    #[default]
    User,
    Manager,
    Custom,
}

impl OrganizationUserType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrganizationUserType::Owner => "owner",
            OrganizationUserType::Admin => "admin",
            OrganizationUserType::User => "user",
            OrganizationUserType::Manager => "manager",
            OrganizationUserType::Custom => "custom",
        }
    }
}

impl std::str::FromStr for OrganizationUserType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "owner" => Ok(OrganizationUserType::Owner),
            "admin" => Ok(OrganizationUserType::Admin),
            "user" => Ok(OrganizationUserType::User),
            "manager" => Ok(OrganizationUserType::Manager),
            "custom" => Ok(OrganizationUserType::Custom),
            _ => Err(format!("Unknown organization user type: {}", s)),
        }
    }
}

/// Lifecycle state of a membership; only confirmed members hold privileges
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrganizationUserStatus {
    #[default]
    Invited,
    Accepted,
    Confirmed,
    Revoked,
}

impl OrganizationUserStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrganizationUserStatus::Invited => "invited",
            OrganizationUserStatus::Accepted => "accepted",
            OrganizationUserStatus::Confirmed => "confirmed",
            OrganizationUserStatus::Revoked => "revoked",
        }
    }
}

impl std::str::FromStr for OrganizationUserStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "invited" => Ok(OrganizationUserStatus::Invited),
            "accepted" => Ok(OrganizationUserStatus::Accepted),
            "confirmed" => Ok(OrganizationUserStatus::Confirmed),
            "revoked" => Ok(OrganizationUserStatus::Revoked),
            _ => Err(format!("Unknown organization user status: {}", s)),
        }
    }
}

macro_rules! mysql_string_enum {
    ($ty:ty) => {
        impl sqlx::Type<sqlx::MySql> for $ty {
            fn type_info() -> sqlx::mysql::MySqlTypeInfo {
                <String as sqlx::Type<sqlx::MySql>>::type_info()
            }

            fn compatible(ty: &sqlx::mysql::MySqlTypeInfo) -> bool {
                <String as sqlx::Type<sqlx::MySql>>::compatible(ty)
            }
        }

        impl<'r> sqlx::Decode<'r, sqlx::MySql> for $ty {
            fn decode(
                value: sqlx::mysql::MySqlValueRef<'r>,
            ) -> std::result::Result<Self, sqlx::error::BoxDynError> {
                let s: String = sqlx::Decode::<'r, sqlx::MySql>::decode(value)?;
                s.parse().map_err(|e: String| e.into())
            }
        }
    };
}

mysql_string_enum!(OrganizationUserType);
mysql_string_enum!(OrganizationUserStatus);

/// Membership of a user in an organization
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct OrganizationUser {
    pub id: StringUuid,
    pub organization_id: StringUuid,
    pub user_id: StringUuid,
    #[sqlx(rename = "type")]
    pub user_type: OrganizationUserType,
    pub status: OrganizationUserStatus,
}

impl Default for OrganizationUser {
    fn default() -> Self {
        Self {
            id: StringUuid::new_v4(),
            organization_id: StringUuid::nil(),
            user_id: StringUuid::nil(),
            user_type: OrganizationUserType::User,
            status: OrganizationUserStatus::Confirmed,
        }
    }
}

impl OrganizationUser {
    pub fn is_confirmed(&self) -> bool {
        self.status == OrganizationUserStatus::Confirmed
    }

    /// Owners and admins hold blanket authority over the organization
    pub fn is_admin(&self) -> bool {
        self.is_confirmed()
            && matches!(
                self.user_type,
                OrganizationUserType::Owner | OrganizationUserType::Admin
            )
    }
}

/// Kind of authenticated caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ClientType {
    #[default]
    User,
    ServiceAccount,
    Organization,
}

/// Scope applied when listing resources on behalf of a caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessClientType {
    /// Organization admins see everything
    NoAccessCheck,
    /// Users see what their own or their groups' policies grant
    User,
    /// Service accounts see what their policies grant
    ServiceAccount,
}
