use std::sync::{
    Arc, Mutex,
    atomic::{AtomicBool, Ordering},
};

use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, header::ContentType},
    transport::smtp::authentication::Credentials,
};
use thiserror::Error;

use crate::config::{AppConfig, MailBackend, SmtpSecurity, SmtpSettings};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[derive(Debug, Error)]
pub enum MailError {
    #[error("invalid recipient `{0}`")]
    InvalidRecipient(String),

    #[error("mail transport failed: {0}")]
    Transport(String),

    #[error("mail backend is not configured: {0}")]
    Config(String),
}

/// Outbound plain-text mail transport. Sending is awaited inline by the
/// request that triggers it.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, mail: OutgoingMail) -> Result<(), MailError>;
}

pub fn mailer_from_config(config: &AppConfig) -> Result<Arc<dyn Mailer>, MailError> {
    let mailer: Arc<dyn Mailer> = match config.mail_backend {
        MailBackend::Smtp => {
            let settings = config
                .smtp
                .as_ref()
                .ok_or_else(|| MailError::Config("SMTP_HOST is not set".into()))?;
            Arc::new(SmtpMailer::new(settings)?)
        }
        MailBackend::Log => {
            tracing::warn!("MAIL_BACKEND=log: outgoing mail is not delivered");
            Arc::new(LogMailer)
        }
        MailBackend::Memory => Arc::new(MemoryMailer::default()),
    };
    Ok(mailer)
}

/// Delivers plain-text mail through an SMTP relay.
#[derive(Clone)]
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailer {
    pub fn new(settings: &SmtpSettings) -> Result<Self, MailError> {
        let builder = match settings.security {
            SmtpSecurity::Tls => AsyncSmtpTransport::<Tokio1Executor>::relay(&settings.host)
                .map_err(|e| MailError::Config(e.to_string()))?,
            SmtpSecurity::StartTls => {
                AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.host)
                    .map_err(|e| MailError::Config(e.to_string()))?
            }
            SmtpSecurity::None => {
                AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&settings.host)
            }
        };
        let builder = builder.port(settings.port);
        let builder = match (&settings.username, &settings.password) {
            (Some(user), Some(password)) => {
                builder.credentials(Credentials::new(user.clone(), password.clone()))
            }
            _ => builder,
        };
        Ok(Self {
            transport: builder.build(),
        })
    }
}

fn build_message(mail: OutgoingMail) -> Result<Message, MailError> {
    check_recipient(&mail.to)?;
    let from: Mailbox = mail
        .from
        .parse()
        .map_err(|_| MailError::Config(format!("invalid sender `{}`", mail.from)))?;
    let to: Mailbox = mail
        .to
        .parse()
        .map_err(|_| MailError::InvalidRecipient(mail.to.clone()))?;
    Message::builder()
        .from(from)
        .to(to)
        .subject(mail.subject)
        .header(ContentType::TEXT_PLAIN)
        .body(mail.body)
        .map_err(|e| MailError::Transport(e.to_string()))
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, mail: OutgoingMail) -> Result<(), MailError> {
        let to = mail.to.clone();
        let subject = mail.subject.clone();
        let message = build_message(mail)?;
        self.transport
            .send(message)
            .await
            .map_err(|e| MailError::Transport(e.to_string()))?;
        tracing::info!(to = %to, subject = %subject, "mail delivered");
        Ok(())
    }
}

/// Development stand-in: records that a mail would have gone out. Bodies
/// carry links and passwords, so only the envelope is logged.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, mail: OutgoingMail) -> Result<(), MailError> {
        check_recipient(&mail.to)?;
        tracing::info!(
            to = %mail.to,
            from = %mail.from,
            subject = %mail.subject,
            "mail not delivered (log backend)"
        );
        Ok(())
    }
}

/// Keeps every delivered message; can be switched into a failing mode.
#[derive(Debug, Default, Clone)]
pub struct MemoryMailer {
    outbox: Arc<Mutex<Vec<OutgoingMail>>>,
    failing: Arc<AtomicBool>,
}

impl MemoryMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<OutgoingMail> {
        self.outbox
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn sent_to(&self, address: &str) -> Vec<OutgoingMail> {
        self.sent()
            .into_iter()
            .filter(|mail| mail.to == address)
            .collect()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl Mailer for MemoryMailer {
    async fn send(&self, mail: OutgoingMail) -> Result<(), MailError> {
        check_recipient(&mail.to)?;
        if self.failing.load(Ordering::SeqCst) {
            return Err(MailError::Transport("memory mailer is failing".into()));
        }
        self.outbox
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(mail);
        Ok(())
    }
}

fn check_recipient(address: &str) -> Result<(), MailError> {
    match address.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(()),
        _ => Err(MailError::InvalidRecipient(address.to_string())),
    }
}

pub fn verification_mail(from: &str, base_url: &str, to: &str, user_id: uuid::Uuid) -> OutgoingMail {
    OutgoingMail {
        from: from.to_string(),
        to: to.to_string(),
        subject: "Verify your email".to_string(),
        body: format!(
            "Please verify your email by clicking the following link:\n{base_url}/users/verify/{user_id}"
        ),
    }
}

pub fn new_password_mail(from: &str, to: &str, new_password: &str) -> OutgoingMail {
    OutgoingMail {
        from: from.to_string(),
        to: to.to_string(),
        subject: "Your new password".to_string(),
        body: format!("Your new password is: {new_password}"),
    }
}

pub fn milestone_mail(from: &str, to: &str, title: &str, views: i32) -> OutgoingMail {
    OutgoingMail {
        from: from.to_string(),
        to: to.to_string(),
        subject: "Congratulations!".to_string(),
        body: format!("Your article \"{title}\" has reached {views} views."),
    }
}
