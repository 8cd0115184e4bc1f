use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    dto::versions::VersionEdit,
    forms::{FormMode, ProductField},
    models::ProductWithVersion,
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateProductRequest {
    pub name: String,
    pub description: Option<String>,
    pub preview: Option<String>,
    pub price: Decimal,
    pub category_id: Uuid,
    pub is_published: Option<bool>,
    #[serde(default)]
    pub versions: Vec<VersionEdit>,
}

impl CreateProductRequest {
    pub fn submitted_fields(&self) -> Vec<ProductField> {
        let mut fields = vec![ProductField::Name, ProductField::Price, ProductField::Category];
        if self.description.is_some() {
            fields.push(ProductField::Description);
        }
        if self.preview.is_some() {
            fields.push(ProductField::Preview);
        }
        if self.is_published.is_some() {
            fields.push(ProductField::IsPublished);
        }
        fields
    }
}

/// Absent fields are left untouched; an empty `description` or `preview`
/// clears the value.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub preview: Option<String>,
    pub price: Option<Decimal>,
    pub category_id: Option<Uuid>,
    pub is_published: Option<bool>,
    #[serde(default)]
    pub versions: Vec<VersionEdit>,
}

impl UpdateProductRequest {
    pub fn submitted_fields(&self) -> Vec<ProductField> {
        [
            (self.name.is_some(), ProductField::Name),
            (self.description.is_some(), ProductField::Description),
            (self.preview.is_some(), ProductField::Preview),
            (self.price.is_some(), ProductField::Price),
            (self.category_id.is_some(), ProductField::Category),
            (self.is_published.is_some(), ProductField::IsPublished),
        ]
        .into_iter()
        .filter_map(|(present, field)| present.then_some(field))
        .collect()
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ProductFormQuery {
    #[serde(default)]
    pub create: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductFormSchema {
    pub mode: FormMode,
    pub fields: Vec<ProductField>,
}

#[derive(Serialize, ToSchema)]
#[serde(transparent)]
pub struct ProductList {
    #[schema(value_type = Vec<ProductWithVersion>)]
    pub items: Vec<ProductWithVersion>,
}
