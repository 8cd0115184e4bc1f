use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::Contact;

#[derive(Debug, Deserialize, ToSchema)]
pub struct ContactMessageRequest {
    pub name: String,
    pub phone: String,
    pub message: String,
}

#[derive(Serialize, ToSchema)]
#[serde(transparent)]
pub struct ContactList {
    #[schema(value_type = Vec<Contact>)]
    pub items: Vec<Contact>,
}
