mod common;

use rust_decimal::Decimal;
use storefront_api::{
    dto::{
        categories::CreateCategoryRequest,
        products::{CreateProductRequest, UpdateProductRequest},
        versions::{CreateVersionRequest, VersionEdit},
    },
    error::AppError,
    permissions::Role,
    routes::params::Pagination,
    services::{
        category_service, product_service,
        version_service::{self, SINGLE_CURRENT_MESSAGE},
    },
    validation::FieldErrors,
};
use uuid::Uuid;

async fn books_category(state: &storefront_api::state::AppState) -> anyhow::Result<Uuid> {
    let staff = common::create_user(state, "staff", true, false).await?;
    let category = category_service::create_category(
        state,
        &staff,
        CreateCategoryRequest {
            name: "Books".into(),
            description: Some("Printed books".into()),
        },
    )
    .await?
    .data
    .unwrap();
    Ok(category.id)
}

fn novel(category_id: Uuid, versions: Vec<VersionEdit>) -> CreateProductRequest {
    CreateProductRequest {
        name: "Novel".into(),
        description: Some("A bestselling novel".into()),
        preview: None,
        price: Decimal::new(30000, 2),
        category_id,
        is_published: None,
        versions,
    }
}

fn assert_single_current_rejected(err: AppError) {
    match err {
        AppError::Validation(errors) => assert_eq!(
            errors.get(FieldErrors::NON_FIELD),
            Some(&[SINGLE_CURRENT_MESSAGE.to_string()][..])
        ),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn update_with_two_current_versions_stores_nothing() -> anyhow::Result<()> {
    let Some((state, _mailer)) = common::setup_state().await? else {
        return Ok(());
    };
    let category_id = books_category(&state).await?;
    let owner = common::create_user(&state, "owner", false, false).await?;

    let created = product_service::create_product(&state, &owner, novel(category_id, vec![]))
        .await?
        .data
        .unwrap();
    assert_eq!(created.product.price, Decimal::new(30000, 2));
    assert!(created.product.is_published);
    assert_eq!(created.product.owner_id, Some(owner.user_id));

    let err = product_service::update_product(
        &state,
        &owner,
        created.product.id,
        UpdateProductRequest {
            name: Some("Novel, second edition".into()),
            versions: vec![
                VersionEdit::new_version("1.0", "First", true),
                VersionEdit::new_version("2.0", "Second", true),
            ],
            ..Default::default()
        },
    )
    .await
    .expect_err("two current versions");
    assert_single_current_rejected(err);

    let detail = product_service::get_product(&state, created.product.id)
        .await?
        .data
        .unwrap();
    assert_eq!(detail.product.name, "Novel");
    assert!(detail.versions.is_empty());
    assert!(detail.current_version.is_none());
    Ok(())
}

#[tokio::test]
async fn current_version_can_be_swapped_in_one_update() -> anyhow::Result<()> {
    let Some((state, _mailer)) = common::setup_state().await? else {
        return Ok(());
    };
    let category_id = books_category(&state).await?;
    let owner = common::create_user(&state, "owner", false, false).await?;

    let created = product_service::create_product(
        &state,
        &owner,
        novel(
            category_id,
            vec![
                VersionEdit::new_version("1.0", "First", true),
                VersionEdit::new_version("2.0", "Second", false),
            ],
        ),
    )
    .await?
    .data
    .unwrap();
    let v1 = created.current_version.clone().expect("v1 is current");
    let v2 = created
        .versions
        .iter()
        .find(|v| !v.is_current)
        .cloned()
        .expect("v2");

    // Promoting v2 while v1 stays current is refused, and v1 keeps the flag.
    let err = product_service::update_product(
        &state,
        &owner,
        created.product.id,
        UpdateProductRequest {
            versions: vec![VersionEdit::set_current(v2.id, true)],
            ..Default::default()
        },
    )
    .await
    .expect_err("v1 still current");
    assert_single_current_rejected(err);

    let detail = product_service::update_product(
        &state,
        &owner,
        created.product.id,
        UpdateProductRequest {
            versions: vec![
                VersionEdit::set_current(v2.id, true),
                VersionEdit::set_current(v1.id, false),
            ],
            ..Default::default()
        },
    )
    .await?
    .data
    .unwrap();

    assert_eq!(detail.current_version.map(|v| v.id), Some(v2.id));
    assert_eq!(detail.versions.iter().filter(|v| v.is_current).count(), 1);
    Ok(())
}

#[tokio::test]
async fn standalone_version_endpoint_keeps_one_current() -> anyhow::Result<()> {
    let Some((state, _mailer)) = common::setup_state().await? else {
        return Ok(());
    };
    let category_id = books_category(&state).await?;
    let owner = common::create_user(&state, "owner", false, false).await?;
    let created = product_service::create_product(
        &state,
        &owner,
        novel(category_id, vec![VersionEdit::new_version("1.0", "First", true)]),
    )
    .await?
    .data
    .unwrap();

    let err = version_service::create_version(
        &state,
        &owner,
        CreateVersionRequest {
            product_id: created.product.id,
            version_number: "2.0".into(),
            version_name: "Second".into(),
            is_current: true,
        },
    )
    .await
    .expect_err("already has a current version");
    assert_single_current_rejected(err);

    let stranger = common::create_user(&state, "stranger", false, false).await?;
    let err = version_service::create_version(
        &state,
        &stranger,
        CreateVersionRequest {
            product_id: created.product.id,
            version_number: "2.0".into(),
            version_name: "Second".into(),
            is_current: false,
        },
    )
    .await
    .expect_err("not the owner");
    assert!(matches!(err, AppError::Forbidden));
    Ok(())
}

#[tokio::test]
async fn forbidden_words_and_foreign_fields_are_rejected() -> anyhow::Result<()> {
    let Some((state, _mailer)) = common::setup_state().await? else {
        return Ok(());
    };
    let category_id = books_category(&state).await?;
    let owner = common::create_user(&state, "owner", false, false).await?;

    let mut request = novel(category_id, vec![]);
    request.name = "Cheap novel".into();
    request.description = Some("Win at the Casino".into());
    let err = product_service::create_product(&state, &owner, request)
        .await
        .expect_err("forbidden words");
    match err {
        AppError::Validation(errors) => {
            assert_eq!(
                errors.get("name"),
                Some(&["Forbidden word in name: cheap".to_string()][..])
            );
            assert_eq!(
                errors.get("description"),
                Some(&["Forbidden word in description: casino".to_string()][..])
            );
        }
        other => panic!("unexpected error: {other:?}"),
    }

    let created = product_service::create_product(&state, &owner, novel(category_id, vec![]))
        .await?
        .data
        .unwrap();

    let err = product_service::update_product(
        &state,
        &owner,
        created.product.id,
        UpdateProductRequest {
            is_published: Some(false),
            ..Default::default()
        },
    )
    .await
    .expect_err("owner lacks can_cancel_publication");
    assert!(matches!(err, AppError::FieldNotAllowed(field) if field == "is_published"));

    let moderator = common::create_user(&state, "moderator", false, false).await?;
    common::grant_role(&state, &moderator, Role::Moderator).await?;
    let updated = product_service::update_product(
        &state,
        &moderator,
        created.product.id,
        UpdateProductRequest {
            is_published: Some(false),
            ..Default::default()
        },
    )
    .await?
    .data
    .unwrap();
    assert!(!updated.product.is_published);
    Ok(())
}

#[tokio::test]
async fn writes_invalidate_the_product_listing() -> anyhow::Result<()> {
    let Some((state, _mailer)) = common::setup_state().await? else {
        return Ok(());
    };
    let category_id = books_category(&state).await?;
    let owner = common::create_user(&state, "owner", false, false).await?;

    product_service::list_products(&state, Pagination::default()).await?;
    let created = product_service::create_product(&state, &owner, novel(category_id, vec![]))
        .await?
        .data
        .unwrap();

    let cached = state
        .product_cache
        .get_or_load(|| product_service::load_catalog(&state.orm))
        .await?;
    assert!(cached.iter().any(|entry| entry.product.id == created.product.id));

    let staff = common::create_user(&state, "staff", true, false).await?;
    category_service::delete_category(&state, &staff, category_id).await?;

    let cached = state
        .product_cache
        .get_or_load(|| product_service::load_catalog(&state.orm))
        .await?;
    assert!(!cached.iter().any(|entry| entry.product.id == created.product.id));
    assert!(matches!(
        product_service::get_product(&state, created.product.id).await,
        Err(AppError::NotFound)
    ));
    Ok(())
}

#[tokio::test]
async fn unpublished_products_stay_out_of_the_public_list() -> anyhow::Result<()> {
    let Some((state, _mailer)) = common::setup_state().await? else {
        return Ok(());
    };
    let category_id = books_category(&state).await?;
    let admin = common::create_user(&state, "admin", true, true).await?;

    let mut draft = novel(category_id, vec![]);
    draft.name = "Unreleased novel".into();
    draft.is_published = Some(false);
    let created = product_service::create_product(&state, &admin, draft)
        .await?
        .data
        .unwrap();
    assert!(!created.product.is_published);

    let cached = state
        .product_cache
        .get_or_load(|| product_service::load_catalog(&state.orm))
        .await?;
    assert!(cached.iter().any(|entry| entry.product.id == created.product.id));

    let mut page = 1;
    loop {
        let listing = product_service::list_products(
            &state,
            Pagination {
                page: Some(page),
                per_page: Some(100),
            },
        )
        .await?
        .data
        .unwrap();
        if listing.items.is_empty() {
            break;
        }
        assert!(listing.items.iter().all(|entry| entry.product.is_published));
        assert!(!listing.items.iter().any(|entry| entry.product.id == created.product.id));
        page += 1;
    }

    let detail = product_service::get_product(&state, created.product.id)
        .await?
        .data
        .unwrap();
    assert_eq!(detail.product.id, created.product.id);
    Ok(())
}
