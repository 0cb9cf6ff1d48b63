//! Secrets Manager import/export payloads

use super::common::StringUuid;
use super::project::Project;
use super::secret::Secret;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use validator::{Validate, ValidationError};

/// Export formats the porting endpoint understands
pub const SUPPORTED_EXPORT_FORMATS: &[&str] = &["json"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportProject {
    pub id: StringUuid,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportSecret {
    pub id: StringUuid,
    pub key: String,
    pub value: String,
    pub note: Option<String>,
    pub project_ids: Vec<StringUuid>,
}

impl From<Project> for ExportProject {
    fn from(project: Project) -> Self {
        Self {
            id: project.id,
            name: project.name,
        }
    }
}

impl From<Secret> for ExportSecret {
    fn from(secret: Secret) -> Self {
        Self {
            id: secret.id,
            key: secret.key,
            value: secret.value,
            note: secret.note,
            project_ids: secret.project_ids,
        }
    }
}

/// Projects and secrets of one organization
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SmExport {
    pub projects: Vec<ExportProject>,
    pub secrets: Vec<ExportSecret>,
}

impl SmExport {
    pub fn new(projects: Vec<Project>, secrets: Vec<Secret>) -> Self {
        Self {
            projects: projects.into_iter().map(Into::into).collect(),
            secrets: secrets.into_iter().map(Into::into).collect(),
        }
    }
}

/// A project to import. `id` is the id it had in the source organization and
/// is only used to resolve secret references.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct ImportProject {
    pub id: StringUuid,
    #[validate(length(min = 1, max = 500))]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct ImportSecret {
    pub id: StringUuid,
    #[validate(length(min = 1, max = 500))]
    pub key: String,
    pub value: String,
    pub note: Option<String>,
    #[serde(default)]
    pub project_ids: Vec<StringUuid>,
}

/// Import payload; secrets may only reference projects carried in the same payload
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_project_references"))]
pub struct SmImport {
    #[serde(default)]
    #[validate(nested)]
    pub projects: Vec<ImportProject>,
    #[serde(default)]
    #[validate(nested)]
    pub secrets: Vec<ImportSecret>,
}

fn validate_project_references(import: &SmImport) -> Result<(), ValidationError> {
    let mut known: HashSet<StringUuid> = HashSet::with_capacity(import.projects.len());
    if !import.projects.iter().all(|p| known.insert(p.id)) {
        let mut err = ValidationError::new("duplicate_project_id");
        err.message = Some("Import contains duplicate project ids".into());
        return Err(err);
    }

    let dangling = import
        .secrets
        .iter()
        .flat_map(|s| s.project_ids.iter())
        .any(|id| !known.contains(id));

    if dangling {
        let mut err = ValidationError::new("unknown_project_reference");
        err.message = Some("Secret references a project that is not part of the import".into());
        return Err(err);
    }
    Ok(())
}

/// Outcome of a bulk import
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSummary {
    pub projects_imported: u64,
    pub secrets_imported: u64,
}
