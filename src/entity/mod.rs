pub mod blogs;
pub mod categories;
pub mod contacts;
pub mod group_permissions;
pub mod groups;
pub mod product_versions;
pub mod products;
pub mod user_groups;
pub mod users;

pub use blogs::Entity as Blogs;
pub use categories::Entity as Categories;
pub use contacts::Entity as Contacts;
pub use group_permissions::Entity as GroupPermissions;
pub use groups::Entity as Groups;
pub use product_versions::Entity as ProductVersions;
pub use products::Entity as Products;
pub use user_groups::Entity as UserGroups;
pub use users::Entity as Users;
