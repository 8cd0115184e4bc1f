//! Field sets of the product form.
//!
//! Which product fields a user may see and submit is decided by one
//! capability table, [`FIELD_GRANTS`]. The same [`ProductForm`] is used to
//! describe the form to the client and to check a submission server-side.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    error::{AppError, AppResult},
    permissions::{Permission, PermissionSet},
};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum ProductField {
    Name,
    Description,
    Preview,
    Price,
    Category,
    IsPublished,
}

impl ProductField {
    pub fn as_str(self) -> &'static str {
        match self {
            ProductField::Name => "name",
            ProductField::Description => "description",
            ProductField::Preview => "preview",
            ProductField::Price => "price",
            ProductField::Category => "category",
            ProductField::IsPublished => "is_published",
        }
    }
}

pub const EDIT_BASE_FIELDS: [ProductField; 3] =
    [ProductField::Name, ProductField::Preview, ProductField::Price];

pub const CREATE_BASE_FIELDS: [ProductField; 5] = [
    ProductField::Name,
    ProductField::Description,
    ProductField::Preview,
    ProductField::Category,
    ProductField::Price,
];

/// Permission → the extra field it unlocks.
pub const FIELD_GRANTS: [(Permission, ProductField); 3] = [
    (Permission::CanCancelPublication, ProductField::IsPublished),
    (Permission::CanChangeDescription, ProductField::Description),
    (Permission::CanChangeCategory, ProductField::Category),
];

/// Permissions that let a non-owner edit someone else's product.
pub fn moderation_permissions() -> [Permission; 3] {
    FIELD_GRANTS.map(|(perm, _)| perm)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum FormMode {
    Create,
    Edit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductForm {
    mode: FormMode,
    fields: BTreeSet<ProductField>,
}

impl ProductForm {
    pub fn for_edit(perms: &PermissionSet) -> Self {
        Self::build(FormMode::Edit, &EDIT_BASE_FIELDS, perms)
    }

    pub fn for_create(perms: &PermissionSet) -> Self {
        Self::build(FormMode::Create, &CREATE_BASE_FIELDS, perms)
    }

    fn build(mode: FormMode, base: &[ProductField], perms: &PermissionSet) -> Self {
        let mut fields: BTreeSet<ProductField> = base.iter().copied().collect();
        for (perm, field) in FIELD_GRANTS {
            if perms.has(perm) {
                fields.insert(field);
            }
        }
        Self { mode, fields }
    }

    pub fn mode(&self) -> FormMode {
        self.mode
    }

    pub fn allows(&self, field: ProductField) -> bool {
        self.fields.contains(&field)
    }

    pub fn fields(&self) -> Vec<ProductField> {
        self.fields.iter().copied().collect()
    }

    /// Rejects a submission carrying any field outside this form.
    pub fn check_submitted(
        &self,
        submitted: impl IntoIterator<Item = ProductField>,
    ) -> AppResult<()> {
        match submitted.into_iter().find(|field| !self.allows(*field)) {
            Some(field) => Err(AppError::FieldNotAllowed(field.as_str().to_string())),
            None => Ok(()),
        }
    }
}
