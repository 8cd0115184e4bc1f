use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::Blog;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateBlogRequest {
    pub title: String,
    /// Derived from the title when absent.
    pub slug: Option<String>,
    pub content: String,
    pub preview: Option<String>,
    pub is_published: Option<bool>,
    /// Defaults to the creator's email.
    pub author_email: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateBlogRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub preview: Option<String>,
    pub is_published: Option<bool>,
    pub author_email: Option<String>,
}

#[derive(Serialize, ToSchema)]
#[serde(transparent)]
pub struct BlogList {
    #[schema(value_type = Vec<Blog>)]
    pub items: Vec<Blog>,
}
