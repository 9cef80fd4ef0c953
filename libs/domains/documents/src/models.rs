use axum_helpers::auth::Role;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use utoipa::ToSchema;
use uuid::Uuid;

/// Review state of a paperwork bundle
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum BundleStatus {
    Pending,
    Approved,
    Rejected,
}

/// One user's submitted paperwork, reviewed by admins before activation
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DocumentBundle {
    /// Unique identifier (stored as _id in MongoDB)
    #[serde(rename = "_id", alias = "id")]
    pub id: Uuid,
    /// Owning user; unique across bundles
    pub user_id: Uuid,
    /// Role at submission time, decides how many documents are required
    pub role: Role,
    /// Stored file names, in upload order
    pub files: Vec<String>,
    pub status: BundleStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DocumentBundle {
    pub fn new(user_id: Uuid, role: Role, files: Vec<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            user_id,
            role,
            files,
            status: BundleStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }
}

/// How many documents a bundle must carry for a given role. Admins never
/// submit paperwork.
pub fn required_documents(role: Role) -> Option<usize> {
    match role {
        Role::Client => Some(1),
        Role::Supplier => Some(3),
        Role::Admin => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_counts_per_role() {
        assert_eq!(required_documents(Role::Client), Some(1));
        assert_eq!(required_documents(Role::Supplier), Some(3));
        assert_eq!(required_documents(Role::Admin), None);
    }

    #[test]
    fn status_wire_names_are_lowercase() {
        assert_eq!(
            serde_json::to_string(&BundleStatus::Pending).unwrap(),
            "\"pending\""
        );
        assert_eq!(
            serde_json::to_string(&BundleStatus::Approved).unwrap(),
            "\"approved\""
        );
    }

    #[test]
    fn new_bundle_starts_pending() {
        let bundle = DocumentBundle::new(
            Uuid::new_v4(),
            Role::Supplier,
            vec!["a.pdf".into(), "b.pdf".into(), "c.pdf".into()],
        );
        assert_eq!(bundle.status, BundleStatus::Pending);
        assert_eq!(bundle.files.len(), 3);
    }
}
