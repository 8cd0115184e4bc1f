use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// One row of the version formset sent with a product.
///
/// Without `id` the row creates a version; with `id` it edits (or, with
/// `delete`, removes) an existing version of the same product.
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
pub struct VersionEdit {
    pub id: Option<Uuid>,
    pub version_number: Option<String>,
    pub version_name: Option<String>,
    pub is_current: Option<bool>,
    #[serde(default)]
    pub delete: bool,
}

impl VersionEdit {
    pub fn new_version(number: &str, name: &str, is_current: bool) -> Self {
        Self {
            id: None,
            version_number: Some(number.to_string()),
            version_name: Some(name.to_string()),
            is_current: Some(is_current),
            delete: false,
        }
    }

    pub fn set_current(id: Uuid, is_current: bool) -> Self {
        Self {
            id: Some(id),
            is_current: Some(is_current),
            ..Self::default()
        }
    }

    pub fn remove(id: Uuid) -> Self {
        Self {
            id: Some(id),
            delete: true,
            ..Self::default()
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateVersionRequest {
    pub product_id: Uuid,
    pub version_number: String,
    pub version_name: String,
    #[serde(default)]
    pub is_current: bool,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateVersionRequest {
    pub version_number: Option<String>,
    pub version_name: Option<String>,
    pub is_current: Option<bool>,
}
