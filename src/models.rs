use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entity::{blogs, categories, contacts, product_versions, products, users};

/// Public view of an account; the password hash never leaves the service.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub avatar: Option<String>,
    pub phone: Option<String>,
    pub country: Option<String>,
    pub is_active: bool,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub preview: Option<String>,
    pub price: Decimal,
    pub category_id: Uuid,
    pub owner_id: Option<Uuid>,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ProductVersion {
    pub id: Uuid,
    pub product_id: Uuid,
    pub version_number: String,
    pub version_name: String,
    pub is_current: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ProductWithVersion {
    pub product: Product,
    pub current_version: Option<ProductVersion>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProductDetail {
    pub product: Product,
    pub current_version: Option<ProductVersion>,
    pub versions: Vec<ProductVersion>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Contact {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct Blog {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub preview: Option<String>,
    pub created_at: DateTime<Utc>,
    pub is_published: bool,
    pub views_count: i32,
    pub author_email: Option<String>,
}

impl From<users::Model> for User {
    fn from(model: users::Model) -> Self {
        Self {
            id: model.id,
            email: model.email,
            avatar: model.avatar,
            phone: model.phone,
            country: model.country,
            is_active: model.is_active,
            is_staff: model.is_staff,
            is_superuser: model.is_superuser,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

impl From<categories::Model> for Category {
    fn from(model: categories::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            description: model.description,
        }
    }
}

impl From<products::Model> for Product {
    fn from(model: products::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            description: model.description,
            preview: model.preview,
            price: model.price,
            category_id: model.category_id,
            owner_id: model.owner_id,
            is_published: model.is_published,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

impl From<product_versions::Model> for ProductVersion {
    fn from(model: product_versions::Model) -> Self {
        Self {
            id: model.id,
            product_id: model.product_id,
            version_number: model.version_number,
            version_name: model.version_name,
            is_current: model.is_current,
        }
    }
}

impl From<contacts::Model> for Contact {
    fn from(model: contacts::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            email: model.email,
            phone: model.phone,
            address: model.address,
        }
    }
}

impl From<blogs::Model> for Blog {
    fn from(model: blogs::Model) -> Self {
        Self {
            id: model.id,
            title: model.title,
            slug: model.slug,
            content: model.content,
            preview: model.preview,
            created_at: model.created_at.with_timezone(&Utc),
            is_published: model.is_published,
            views_count: model.views_count,
            author_email: model.author_email,
        }
    }
}
