use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use crate::{
    db::is_unique_violation,
    dto::blog::{BlogList, CreateBlogRequest, UpdateBlogRequest},
    entity::blogs::{self, ActiveModel as BlogActive, Column, Entity as Blogs},
    error::{AppError, AppResult},
    mail::milestone_mail,
    middleware::auth::AuthUser,
    models::Blog,
    permissions::Permission,
    response::{ApiResponse, Meta},
    routes::params::Pagination,
    services::permission_service::load_permissions,
    slug::{slugify, unique_slug},
    state::AppState,
    validation::{FieldErrors, check_email, check_required},
};

pub const POSTS_PER_PAGE: i64 = 10;
pub const MILESTONE_VIEWS: i32 = 100;
const FALLBACK_SLUG: &str = "post";

pub async fn list_published(
    state: &AppState,
    pagination: Pagination,
) -> AppResult<ApiResponse<BlogList>> {
    let (page, limit, offset) = pagination.normalize(POSTS_PER_PAGE);
    let finder = Blogs::find()
        .filter(Column::IsPublished.eq(true))
        .order_by_desc(Column::CreatedAt);

    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Blog::from)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Posts", BlogList { items }, Some(meta)))
}

/// Counts one read and returns the post. The increment is a single
/// `UPDATE ... RETURNING`, so every concurrent read sees its own count and
/// only the read that lands on [`MILESTONE_VIEWS`] mails the author.
/// Drafts are only visible to users allowed to edit posts.
pub async fn view_post(
    state: &AppState,
    user: &AuthUser,
    slug: &str,
) -> AppResult<ApiResponse<Blog>> {
    let perms = load_permissions(&state.orm, user).await?;
    let include_drafts = perms.has(Permission::ChangeBlog);

    let post = sqlx::query_as::<_, Blog>(
        r#"
        UPDATE blogs
        SET views_count = views_count + 1
        WHERE slug = $1 AND (is_published OR $2)
        RETURNING id, title, slug, content, preview, created_at, is_published, views_count, author_email
        "#,
    )
    .bind(slug)
    .bind(include_drafts)
    .fetch_optional(&state.pool)
    .await?
    .ok_or(AppError::NotFound)?;

    if post.views_count == MILESTONE_VIEWS {
        notify_milestone(state, &post).await;
    }

    Ok(ApiResponse::success("Post", post, None))
}

async fn notify_milestone(state: &AppState, post: &Blog) {
    let Some(author_email) = post.author_email.as_deref() else {
        return;
    };
    let mail = milestone_mail(&state.config.mail_from, author_email, &post.title, post.views_count);
    match state.mailer.send(mail).await {
        Ok(()) => tracing::info!(slug = %post.slug, views = post.views_count, "milestone mail sent"),
        Err(err) => tracing::warn!(error = %err, slug = %post.slug, "milestone mail failed"),
    }
}

pub async fn create_post(
    state: &AppState,
    user: &AuthUser,
    payload: CreateBlogRequest,
) -> AppResult<ApiResponse<Blog>> {
    load_permissions(&state.orm, user)
        .await?
        .require(Permission::AddBlog)?;

    let mut errors = FieldErrors::new();
    let title = payload.title.trim().to_string();
    check_required("title", &title, 150, &mut errors);
    check_required("content", &payload.content, usize::MAX, &mut errors);
    let author_email = match payload.author_email.as_deref().map(str::trim) {
        Some("") => None,
        Some(raw) => check_email("author_email", raw, &mut errors),
        None => Some(user.email.clone()),
    };
    errors.into_result()?;

    let base = payload
        .slug
        .as_deref()
        .map(slugify)
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| slugify(&title));
    let base = if base.is_empty() {
        FALLBACK_SLUG.to_string()
    } else {
        base
    };
    let slug = free_slug(&state.orm, &base).await?;

    let post = BlogActive {
        id: Set(Uuid::new_v4()),
        title: Set(title),
        slug: Set(slug),
        content: Set(payload.content),
        preview: Set(payload.preview.filter(|p| !p.trim().is_empty())),
        is_published: Set(payload.is_published.unwrap_or(true)),
        views_count: Set(0),
        author_email: Set(author_email),
        ..Default::default()
    }
    .insert(&state.orm)
    .await
    .map_err(|err| {
        if is_unique_violation(&err) {
            AppError::Conflict("slug is already taken".into())
        } else {
            AppError::OrmError(err)
        }
    })?;

    tracing::info!(slug = %post.slug, "post created");
    Ok(ApiResponse::success(
        "Post created",
        Blog::from(post),
        Some(Meta::empty()),
    ))
}

/// The slug stays stable across title changes.
pub async fn update_post(
    state: &AppState,
    user: &AuthUser,
    slug: &str,
    payload: UpdateBlogRequest,
) -> AppResult<ApiResponse<Blog>> {
    load_permissions(&state.orm, user)
        .await?
        .require(Permission::ChangeBlog)?;
    let existing = find_by_slug(&state.orm, slug).await?;

    let mut errors = FieldErrors::new();
    let title = payload.title.as_deref().map(str::trim);
    if let Some(title) = title {
        check_required("title", title, 150, &mut errors);
    }
    if let Some(content) = payload.content.as_deref() {
        check_required("content", content, usize::MAX, &mut errors);
    }
    let author_email = match payload.author_email.as_deref().map(str::trim) {
        Some("") => Some(None),
        Some(raw) => check_email("author_email", raw, &mut errors).map(Some),
        None => None,
    };
    errors.into_result()?;

    let mut active: BlogActive = existing.into();
    if let Some(title) = title {
        active.title = Set(title.to_string());
    }
    if let Some(content) = payload.content {
        active.content = Set(content);
    }
    if let Some(preview) = payload.preview {
        active.preview = Set(Some(preview).filter(|p| !p.trim().is_empty()));
    }
    if let Some(is_published) = payload.is_published {
        active.is_published = Set(is_published);
    }
    if let Some(author_email) = author_email {
        active.author_email = Set(author_email);
    }

    let post = active.update(&state.orm).await?;
    Ok(ApiResponse::success(
        "Updated",
        Blog::from(post),
        Some(Meta::empty()),
    ))
}

pub async fn delete_post(
    state: &AppState,
    user: &AuthUser,
    slug: &str,
) -> AppResult<ApiResponse<serde_json::Value>> {
    load_permissions(&state.orm, user)
        .await?
        .require(Permission::DeleteBlog)?;

    let result = Blogs::delete_many()
        .filter(Column::Slug.eq(slug))
        .exec(&state.orm)
        .await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

async fn find_by_slug<C: ConnectionTrait>(db: &C, slug: &str) -> AppResult<blogs::Model> {
    Blogs::find()
        .filter(Column::Slug.eq(slug))
        .one(db)
        .await?
        .ok_or(AppError::NotFound)
}

async fn free_slug<C: ConnectionTrait>(db: &C, base: &str) -> AppResult<String> {
    let taken: Vec<String> = Blogs::find()
        .select_only()
        .column(Column::Slug)
        .filter(Column::Slug.starts_with(base))
        .into_tuple()
        .all(db)
        .await?;
    Ok(unique_slug(base, &taken))
}
