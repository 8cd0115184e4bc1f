mod common;

use storefront_api::{
    dto::{
        admin::AssignGroupRequest,
        auth::{LoginRequest, RegisterRequest},
        users::{PasswordResetRequest, ProfileUpdateRequest},
    },
    error::AppError,
    middleware::auth::decode_token,
    services::{admin_service, auth_service, user_service},
    state::AppState,
};

async fn login(
    state: &AppState,
    email: &str,
    password: &str,
) -> Result<String, AppError> {
    let resp = auth_service::login_user(
        state,
        LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        },
    )
    .await?;
    Ok(resp.data.unwrap().token)
}

#[tokio::test]
async fn registered_user_logs_in_only_after_verification() -> anyhow::Result<()> {
    let Some((state, mailer)) = common::setup_state().await? else {
        return Ok(());
    };
    let email = common::unique_email("new");

    let user = auth_service::register_user(
        &state,
        RegisterRequest {
            email: email.clone(),
            password1: common::PASSWORD.into(),
            password2: common::PASSWORD.into(),
        },
    )
    .await?
    .data
    .unwrap();
    assert!(!user.is_active);

    let mails = mailer.sent_to(&email);
    assert_eq!(mails.len(), 1);
    assert!(mails[0].body.contains(&format!("/users/verify/{}", user.id)));

    assert!(matches!(
        login(&state, &email, common::PASSWORD).await,
        Err(AppError::BadRequest(_))
    ));

    auth_service::verify_email(&state, user.id).await?;
    let token = login(&state, &email, common::PASSWORD).await?;
    let bearer = token.strip_prefix("Bearer ").expect("bearer prefix");
    assert_eq!(decode_token(&state.config.jwt_secret, bearer)?, user.id);
    Ok(())
}

#[tokio::test]
async fn registration_rolls_back_when_mail_fails() -> anyhow::Result<()> {
    let Some((state, mailer)) = common::setup_state().await? else {
        return Ok(());
    };
    let email = common::unique_email("unlucky");

    mailer.set_failing(true);
    let err = auth_service::register_user(
        &state,
        RegisterRequest {
            email: email.clone(),
            password1: common::PASSWORD.into(),
            password2: common::PASSWORD.into(),
        },
    )
    .await
    .expect_err("mail transport down");
    mailer.set_failing(false);

    assert!(matches!(err, AppError::Mail(_)));
    assert!(auth_service::find_user_by_email(&state.orm, &email).await?.is_none());
    Ok(())
}

#[tokio::test]
async fn mismatched_passwords_are_rejected() -> anyhow::Result<()> {
    let Some((state, _mailer)) = common::setup_state().await? else {
        return Ok(());
    };
    let err = auth_service::register_user(
        &state,
        RegisterRequest {
            email: common::unique_email("typo"),
            password1: "first password".into(),
            password2: "second password".into(),
        },
    )
    .await
    .expect_err("mismatch");
    assert!(matches!(err, AppError::Validation(errors) if errors.contains("password2")));
    Ok(())
}

#[tokio::test]
async fn password_reset_mails_a_working_password() -> anyhow::Result<()> {
    let Some((state, mailer)) = common::setup_state().await? else {
        return Ok(());
    };
    let user = common::create_user(&state, "forgetful", false, false).await?;

    let notice = user_service::reset_password(
        &state,
        PasswordResetRequest {
            email: user.email.clone(),
        },
    )
    .await?
    .data
    .unwrap();

    let mails = mailer.sent_to(&user.email);
    assert_eq!(mails.len(), 1);
    let new_password = mails[0]
        .body
        .rsplit(' ')
        .next()
        .expect("password at the end")
        .to_string();
    assert_eq!(new_password.len(), 12);

    assert!(login(&state, &user.email, common::PASSWORD).await.is_err());
    login(&state, &user.email, &new_password).await?;

    let unknown = user_service::reset_password(
        &state,
        PasswordResetRequest {
            email: common::unique_email("nobody"),
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(unknown.detail, notice.detail);
    Ok(())
}

#[tokio::test]
async fn profile_edit_changes_password_with_old_one() -> anyhow::Result<()> {
    let Some((state, _mailer)) = common::setup_state().await? else {
        return Ok(());
    };
    let user = common::create_user(&state, "profile", false, false).await?;

    let err = user_service::update_profile(
        &state,
        &user,
        ProfileUpdateRequest {
            old_password: Some("wrong password".into()),
            new_password1: Some("brand new password".into()),
            new_password2: Some("brand new password".into()),
            ..Default::default()
        },
    )
    .await
    .expect_err("old password is wrong");
    assert!(matches!(err, AppError::Validation(errors) if errors.contains("old_password")));

    let updated = user_service::update_profile(
        &state,
        &user,
        ProfileUpdateRequest {
            country: Some("Portugal".into()),
            old_password: Some(common::PASSWORD.into()),
            new_password1: Some("brand new password".into()),
            new_password2: Some("brand new password".into()),
            ..Default::default()
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(updated.country.as_deref(), Some("Portugal"));
    login(&state, &user.email, "brand new password").await?;
    Ok(())
}

#[tokio::test]
async fn only_superusers_manage_group_membership() -> anyhow::Result<()> {
    let Some((state, _mailer)) = common::setup_state().await? else {
        return Ok(());
    };
    let admin = common::create_user(&state, "root", true, true).await?;
    let member = common::create_user(&state, "member", false, false).await?;
    // Makes sure the group exists.
    common::grant_role(&state, &admin, storefront_api::permissions::Role::Moderator).await?;

    let err = admin_service::add_user_to_group(
        &state,
        &member,
        member.user_id,
        AssignGroupRequest {
            group: "moderator".into(),
        },
    )
    .await
    .expect_err("not a superuser");
    assert!(matches!(err, AppError::Forbidden));

    let groups = admin_service::add_user_to_group(
        &state,
        &admin,
        member.user_id,
        AssignGroupRequest {
            group: "moderator".into(),
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(groups.groups, vec!["moderator".to_string()]);

    let groups = admin_service::remove_user_from_group(&state, &admin, member.user_id, "moderator")
        .await?
        .data
        .unwrap();
    assert!(groups.groups.is_empty());
    Ok(())
}
