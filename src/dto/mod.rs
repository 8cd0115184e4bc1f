pub mod admin;
pub mod auth;
pub mod blog;
pub mod categories;
pub mod contacts;
pub mod products;
pub mod users;
pub mod versions;
