//! Project domain model

use super::common::StringUuid;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A project groups secrets and is the resource access policies grant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Project {
    pub id: StringUuid,
    pub organization_id: StringUuid,
    pub name: String,
    pub creation_date: DateTime<Utc>,
    pub revision_date: DateTime<Utc>,
    pub deleted_date: Option<DateTime<Utc>>,
}

impl Default for Project {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            id: StringUuid::new_v4(),
            organization_id: StringUuid::nil(),
            name: String::new(),
            creation_date: now,
            revision_date: now,
            deleted_date: None,
        }
    }
}
