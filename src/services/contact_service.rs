use chrono::{DateTime, Local};
use sea_orm::{EntityTrait, QueryOrder};
use tokio::{fs::OpenOptions, io::AsyncWriteExt};

use crate::{
    dto::contacts::{ContactList, ContactMessageRequest},
    entity::contacts::{Column, Entity as Contacts},
    error::{AppError, AppResult},
    models::Contact,
    response::{ApiResponse, Meta},
    state::AppState,
    validation::{FieldErrors, check_required},
};

pub async fn list_contacts(state: &AppState) -> AppResult<ApiResponse<ContactList>> {
    let items = load_contacts(state).await?;
    Ok(ApiResponse::success(
        "Contacts",
        ContactList { items },
        Some(Meta::empty()),
    ))
}

/// Appends the message to the contact log and answers with the contact
/// records, like the contact page itself.
pub async fn submit_message(
    state: &AppState,
    payload: ContactMessageRequest,
) -> AppResult<ApiResponse<ContactList>> {
    let mut errors = FieldErrors::new();
    check_required("name", &payload.name, 100, &mut errors);
    check_required("phone", &payload.phone, 20, &mut errors);
    check_required("message", &payload.message, 5000, &mut errors);
    errors.into_result()?;

    let line = format_contact_line(
        Local::now(),
        payload.name.trim(),
        payload.phone.trim(),
        payload.message.trim(),
    );
    append_line(&state.config.contact_log_path, &line).await?;
    tracing::info!(path = %state.config.contact_log_path, "contact message stored");

    let items = load_contacts(state).await?;
    Ok(ApiResponse::success(
        "Message received",
        ContactList { items },
        Some(Meta::empty()),
    ))
}

/// One log entry per line; line breaks inside the message are flattened.
pub fn format_contact_line(at: DateTime<Local>, name: &str, phone: &str, message: &str) -> String {
    let message = message.replace(['\r', '\n'], " ");
    format!(
        "{} - {name} ({phone}): {message}\n",
        at.format("%Y-%m-%d %H:%M:%S%.6f")
    )
}

pub async fn append_line(path: &str, line: &str) -> AppResult<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("cannot open {path}: {e}")))?;
    file.write_all(line.as_bytes())
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("cannot write {path}: {e}")))?;
    Ok(())
}

async fn load_contacts(state: &AppState) -> AppResult<Vec<Contact>> {
    Ok(Contacts::find()
        .order_by_asc(Column::Name)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Contact::from)
        .collect())
}
