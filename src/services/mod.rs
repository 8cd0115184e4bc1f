pub mod admin_service;
pub mod auth_service;
pub mod blog_service;
pub mod category_service;
pub mod contact_service;
pub mod permission_service;
pub mod product_service;
pub mod user_service;
pub mod version_service;
