use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        admin::{AssignGroupRequest, UserGroups},
        auth::{LoginRequest, LoginResponse, RegisterRequest},
        blog::{BlogList, CreateBlogRequest, UpdateBlogRequest},
        categories::{CategoryList, CreateCategoryRequest},
        contacts::{ContactList, ContactMessageRequest},
        products::{
            CreateProductRequest, ProductFormSchema, ProductList, UpdateProductRequest,
        },
        users::{PasswordResetRequest, ProfileUpdateRequest},
        versions::{CreateVersionRequest, UpdateVersionRequest, VersionEdit},
    },
    forms::{FormMode, ProductField},
    models::{
        Blog, Category, Contact, Product, ProductDetail, ProductVersion, ProductWithVersion, User,
    },
    response::{ApiResponse, Meta, Notice},
    routes::{
        admin, blog, categories, contacts, health, params, products as product_routes, users,
        versions,
    },
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        product_routes::list_products,
        product_routes::get_product,
        product_routes::product_form,
        product_routes::create_product,
        product_routes::update_product,
        product_routes::delete_product,
        categories::list_categories,
        categories::create_category,
        categories::delete_category,
        contacts::list_contacts,
        contacts::submit_message,
        blog::list_posts,
        blog::view_post,
        blog::create_post,
        blog::update_post,
        blog::delete_post,
        versions::create_version,
        versions::update_version,
        versions::delete_version,
        users::register,
        users::verify_email,
        users::login,
        users::password_reset,
        users::get_profile,
        users::update_profile,
        admin::add_user_to_group,
        admin::remove_user_from_group
    ),
    components(
        schemas(
            User,
            Category,
            Product,
            ProductVersion,
            ProductWithVersion,
            ProductDetail,
            Contact,
            Blog,
            FormMode,
            ProductField,
            ProductFormSchema,
            ProductList,
            CreateProductRequest,
            UpdateProductRequest,
            VersionEdit,
            CreateVersionRequest,
            UpdateVersionRequest,
            CategoryList,
            CreateCategoryRequest,
            ContactList,
            ContactMessageRequest,
            BlogList,
            CreateBlogRequest,
            UpdateBlogRequest,
            RegisterRequest,
            LoginRequest,
            LoginResponse,
            PasswordResetRequest,
            ProfileUpdateRequest,
            AssignGroupRequest,
            UserGroups,
            Notice,
            params::Pagination,
            Meta,
            ApiResponse<ProductDetail>,
            ApiResponse<ProductList>,
            ApiResponse<Blog>,
            ApiResponse<User>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Products", description = "Product catalog endpoints"),
        (name = "Versions", description = "Product version endpoints"),
        (name = "Categories", description = "Category endpoints"),
        (name = "Contacts", description = "Contact page endpoints"),
        (name = "Blog", description = "Blog endpoints"),
        (name = "Users", description = "Registration, login and profile endpoints"),
        (name = "Admin", description = "Group membership endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
