mod common;

use storefront_api::{
    dto::blog::CreateBlogRequest,
    error::AppError,
    middleware::auth::AuthUser,
    models::Blog,
    permissions::Role,
    services::blog_service,
    state::AppState,
};
use uuid::Uuid;

async fn publish_post(
    state: &AppState,
    author_email: &str,
    is_published: bool,
) -> anyhow::Result<(AuthUser, Blog)> {
    let manager = common::create_user(state, "manager", false, false).await?;
    common::grant_role(state, &manager, Role::ContentManager).await?;
    let post = blog_service::create_post(
        state,
        &manager,
        CreateBlogRequest {
            title: format!("Milestones {}", Uuid::new_v4().simple()),
            slug: None,
            content: "Counting reads.".into(),
            preview: None,
            is_published: Some(is_published),
            author_email: Some(author_email.to_string()),
        },
    )
    .await?
    .data
    .unwrap();
    Ok((manager, post))
}

async fn set_views(state: &AppState, slug: &str, views: i32) -> anyhow::Result<()> {
    sqlx::query("UPDATE blogs SET views_count = $1 WHERE slug = $2")
        .bind(views)
        .bind(slug)
        .execute(&state.pool)
        .await?;
    Ok(())
}

#[tokio::test]
async fn hundredth_view_mails_the_author_once() -> anyhow::Result<()> {
    let Some((state, mailer)) = common::setup_state().await? else {
        return Ok(());
    };
    let author = common::unique_email("author");
    let (_, post) = publish_post(&state, &author, true).await?;
    assert!(post.slug.starts_with("milestones-"));
    assert_eq!(post.views_count, 0);

    let reader = common::create_user(&state, "reader", false, false).await?;
    set_views(&state, &post.slug, 98).await?;

    let mut seen = Vec::new();
    for _ in 0..3 {
        let read = blog_service::view_post(&state, &reader, &post.slug)
            .await?
            .data
            .unwrap();
        seen.push(read.views_count);
    }

    assert_eq!(seen, vec![99, 100, 101]);
    let mails = mailer.sent_to(&author);
    assert_eq!(mails.len(), 1);
    assert_eq!(mails[0].subject, "Congratulations!");
    Ok(())
}

#[tokio::test]
async fn concurrent_reads_cross_the_milestone_once() -> anyhow::Result<()> {
    let Some((state, mailer)) = common::setup_state().await? else {
        return Ok(());
    };
    let author = common::unique_email("author");
    let (_, post) = publish_post(&state, &author, true).await?;
    let reader = common::create_user(&state, "reader", false, false).await?;
    set_views(&state, &post.slug, 90).await?;

    let mut handles = Vec::new();
    for _ in 0..20 {
        let state = state.clone();
        let reader = reader.clone();
        let slug = post.slug.clone();
        handles.push(tokio::spawn(async move {
            blog_service::view_post(&state, &reader, &slug).await
        }));
    }

    let mut counts = Vec::new();
    for handle in handles {
        counts.push(handle.await??.data.unwrap().views_count);
    }
    counts.sort_unstable();

    assert_eq!(counts, (91..=110).collect::<Vec<i32>>());
    assert_eq!(mailer.sent_to(&author).len(), 1);
    Ok(())
}

#[tokio::test]
async fn milestone_mail_failure_does_not_fail_the_read() -> anyhow::Result<()> {
    let Some((state, mailer)) = common::setup_state().await? else {
        return Ok(());
    };
    let author = common::unique_email("author");
    let (_, post) = publish_post(&state, &author, true).await?;
    let reader = common::create_user(&state, "reader", false, false).await?;
    set_views(&state, &post.slug, 99).await?;

    mailer.set_failing(true);
    let read = blog_service::view_post(&state, &reader, &post.slug)
        .await?
        .data
        .unwrap();
    mailer.set_failing(false);

    assert_eq!(read.views_count, 100);
    assert!(mailer.sent_to(&author).is_empty());
    Ok(())
}

#[tokio::test]
async fn drafts_and_blog_writes_need_permissions() -> anyhow::Result<()> {
    let Some((state, _mailer)) = common::setup_state().await? else {
        return Ok(());
    };
    let (manager, draft) = publish_post(&state, &common::unique_email("author"), false).await?;
    let reader = common::create_user(&state, "reader", false, false).await?;

    assert!(matches!(
        blog_service::view_post(&state, &reader, &draft.slug).await,
        Err(AppError::NotFound)
    ));
    let read = blog_service::view_post(&state, &manager, &draft.slug)
        .await?
        .data
        .unwrap();
    assert_eq!(read.views_count, 1);

    let err = blog_service::create_post(
        &state,
        &reader,
        CreateBlogRequest {
            title: "Not allowed".into(),
            slug: None,
            content: "Nope".into(),
            preview: None,
            is_published: None,
            author_email: None,
        },
    )
    .await
    .expect_err("reader lacks add_blog");
    assert!(matches!(err, AppError::Forbidden));

    assert!(matches!(
        blog_service::delete_post(&state, &reader, &draft.slug).await,
        Err(AppError::Forbidden)
    ));
    blog_service::delete_post(&state, &manager, &draft.slug).await?;
    Ok(())
}
