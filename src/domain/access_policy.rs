//! Access policy domain models
//!
//! An access policy grants one principal (an organization user, a group or a
//! service account) read and/or write capability on a project. The principal
//! kinds form a closed set: adding a new one means adding an `AccessPolicy`
//! variant, and every exhaustive `match` over it must then be revisited.

use super::common::StringUuid;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// Kind of principal a policy is granted to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrincipalKind {
    User,
    Group,
    ServiceAccount,
}

impl PrincipalKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PrincipalKind::User => "user",
            PrincipalKind::Group => "group",
            PrincipalKind::ServiceAccount => "service_account",
        }
    }
}

impl std::fmt::Display for PrincipalKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structural identity of a policy: two policies with the same key describe
/// the same grant, whatever their ids or capability flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PolicyKey {
    pub kind: PrincipalKind,
    pub principal_id: StringUuid,
    pub granted_project_id: StringUuid,
}

impl std::fmt::Display for PolicyKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} on project {}",
            self.kind, self.principal_id, self.granted_project_id
        )
    }
}

/// Grants a single organization member access to a project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProjectAccessPolicy {
    pub id: StringUuid,
    pub organization_user_id: StringUuid,
    pub granted_project_id: StringUuid,
    pub read: bool,
    pub write: bool,
    pub creation_date: DateTime<Utc>,
    pub revision_date: DateTime<Utc>,
}

/// Grants every member of a group access to a project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupProjectAccessPolicy {
    pub id: StringUuid,
    pub group_id: StringUuid,
    pub granted_project_id: StringUuid,
    pub read: bool,
    pub write: bool,
    pub creation_date: DateTime<Utc>,
    pub revision_date: DateTime<Utc>,
}

/// Grants a service account (non-human principal) access to a project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceAccountProjectAccessPolicy {
    pub id: StringUuid,
    pub service_account_id: StringUuid,
    pub granted_project_id: StringUuid,
    pub read: bool,
    pub write: bool,
    pub creation_date: DateTime<Utc>,
    pub revision_date: DateTime<Utc>,
}

impl UserProjectAccessPolicy {
    pub fn new(
        organization_user_id: StringUuid,
        granted_project_id: StringUuid,
        read: bool,
        write: bool,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: StringUuid::new_v4(),
            organization_user_id,
            granted_project_id,
            read,
            write,
            creation_date: now,
            revision_date: now,
        }
    }
}

impl GroupProjectAccessPolicy {
    pub fn new(
        group_id: StringUuid,
        granted_project_id: StringUuid,
        read: bool,
        write: bool,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: StringUuid::new_v4(),
            group_id,
            granted_project_id,
            read,
            write,
            creation_date: now,
            revision_date: now,
        }
    }
}

impl ServiceAccountProjectAccessPolicy {
    pub fn new(
        service_account_id: StringUuid,
        granted_project_id: StringUuid,
        read: bool,
        write: bool,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: StringUuid::new_v4(),
            service_account_id,
            granted_project_id,
            read,
            write,
            creation_date: now,
            revision_date: now,
        }
    }
}

/// An access policy of any principal kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AccessPolicy {
    User(UserProjectAccessPolicy),
    Group(GroupProjectAccessPolicy),
    ServiceAccount(ServiceAccountProjectAccessPolicy),
}

impl AccessPolicy {
    pub fn kind(&self) -> PrincipalKind {
        match self {
            AccessPolicy::User(_) => PrincipalKind::User,
            AccessPolicy::Group(_) => PrincipalKind::Group,
            AccessPolicy::ServiceAccount(_) => PrincipalKind::ServiceAccount,
        }
    }

    pub fn id(&self) -> StringUuid {
        match self {
            AccessPolicy::User(p) => p.id,
            AccessPolicy::Group(p) => p.id,
            AccessPolicy::ServiceAccount(p) => p.id,
        }
    }

    /// Id of the organization user, group or service account being granted
    pub fn principal_id(&self) -> StringUuid {
        match self {
            AccessPolicy::User(p) => p.organization_user_id,
            AccessPolicy::Group(p) => p.group_id,
            AccessPolicy::ServiceAccount(p) => p.service_account_id,
        }
    }

    pub fn granted_project_id(&self) -> StringUuid {
        match self {
            AccessPolicy::User(p) => p.granted_project_id,
            AccessPolicy::Group(p) => p.granted_project_id,
            AccessPolicy::ServiceAccount(p) => p.granted_project_id,
        }
    }

    pub fn read(&self) -> bool {
        match self {
            AccessPolicy::User(p) => p.read,
            AccessPolicy::Group(p) => p.read,
            AccessPolicy::ServiceAccount(p) => p.read,
        }
    }

    pub fn write(&self) -> bool {
        match self {
            AccessPolicy::User(p) => p.write,
            AccessPolicy::Group(p) => p.write,
            AccessPolicy::ServiceAccount(p) => p.write,
        }
    }

    pub fn creation_date(&self) -> DateTime<Utc> {
        match self {
            AccessPolicy::User(p) => p.creation_date,
            AccessPolicy::Group(p) => p.creation_date,
            AccessPolicy::ServiceAccount(p) => p.creation_date,
        }
    }

    pub fn revision_date(&self) -> DateTime<Utc> {
        match self {
            AccessPolicy::User(p) => p.revision_date,
            AccessPolicy::Group(p) => p.revision_date,
            AccessPolicy::ServiceAccount(p) => p.revision_date,
        }
    }

    pub fn key(&self) -> PolicyKey {
        PolicyKey {
            kind: self.kind(),
            principal_id: self.principal_id(),
            granted_project_id: self.granted_project_id(),
        }
    }
}

impl From<UserProjectAccessPolicy> for AccessPolicy {
    fn from(policy: UserProjectAccessPolicy) -> Self {
        AccessPolicy::User(policy)
    }
}

impl From<GroupProjectAccessPolicy> for AccessPolicy {
    fn from(policy: GroupProjectAccessPolicy) -> Self {
        AccessPolicy::Group(policy)
    }
}

impl From<ServiceAccountProjectAccessPolicy> for AccessPolicy {
    fn from(policy: ServiceAccountProjectAccessPolicy) -> Self {
        AccessPolicy::ServiceAccount(policy)
    }
}

/// One grant request: the grantee's id plus the requested capabilities
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessPolicyRequest {
    pub grantee_id: Uuid,
    #[serde(default)]
    pub read: bool,
    #[serde(default)]
    pub write: bool,
}

/// Input for creating access policies on a project
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_has_requests"))]
pub struct CreateAccessPoliciesInput {
    pub user_access_policy_requests: Option<Vec<AccessPolicyRequest>>,
    pub group_access_policy_requests: Option<Vec<AccessPolicyRequest>>,
    pub service_account_access_policy_requests: Option<Vec<AccessPolicyRequest>>,
}

fn validate_has_requests(input: &CreateAccessPoliciesInput) -> Result<(), ValidationError> {
    if input.request_count() == 0 {
        let mut err = ValidationError::new("no_creation_requests");
        err.message = Some("No creation requests provided".into());
        return Err(err);
    }
    Ok(())
}

impl CreateAccessPoliciesInput {
    pub fn request_count(&self) -> usize {
        [
            &self.user_access_policy_requests,
            &self.group_access_policy_requests,
            &self.service_account_access_policy_requests,
        ]
        .iter()
        .map(|requests| requests.as_ref().map_or(0, Vec::len))
        .sum()
    }

    /// Expand the request into policies granting `project_id`, preserving the
    /// submitted order (users, then groups, then service accounts).
    pub fn into_policies(self, project_id: StringUuid) -> Vec<AccessPolicy> {
        let users = self
            .user_access_policy_requests
            .unwrap_or_default()
            .into_iter()
            .map(|r| {
                UserProjectAccessPolicy::new(r.grantee_id.into(), project_id, r.read, r.write)
                    .into()
            });
        let groups = self
            .group_access_policy_requests
            .unwrap_or_default()
            .into_iter()
            .map(|r| {
                GroupProjectAccessPolicy::new(r.grantee_id.into(), project_id, r.read, r.write)
                    .into()
            });
        let service_accounts = self
            .service_account_access_policy_requests
            .unwrap_or_default()
            .into_iter()
            .map(|r| {
                ServiceAccountProjectAccessPolicy::new(
                    r.grantee_id.into(),
                    project_id,
                    r.read,
                    r.write,
                )
                .into()
            });

        users.chain(groups).chain(service_accounts).collect()
    }
}
