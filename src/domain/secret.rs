//! Secret domain model

use super::common::StringUuid;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// An organization secret; may belong to any number of projects
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Secret {
    pub id: StringUuid,
    pub organization_id: StringUuid,
    pub key: String,
    pub value: String,
    pub note: Option<String>,
    /// Loaded from `project_secrets`, not a column of `secrets`
    #[sqlx(skip)]
    #[serde(default)]
    pub project_ids: Vec<StringUuid>,
    pub creation_date: DateTime<Utc>,
    pub revision_date: DateTime<Utc>,
    pub deleted_date: Option<DateTime<Utc>>,
}

impl Default for Secret {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            id: StringUuid::new_v4(),
            organization_id: StringUuid::nil(),
            key: String::new(),
            value: String::new(),
            note: None,
            project_ids: vec![],
            creation_date: now,
            revision_date: now,
            deleted_date: None,
        }
    }
}
