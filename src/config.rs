use std::{env, str::FromStr, time::Duration};

use anyhow::Context;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MailBackend {
    /// Delivers through the SMTP relay in `SMTP_*`.
    Smtp,
    /// Logs recipient and subject only; for local development.
    Log,
    /// Keeps outgoing mail in process memory.
    Memory,
}

impl FromStr for MailBackend {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> anyhow::Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "smtp" => Ok(MailBackend::Smtp),
            "log" => Ok(MailBackend::Log),
            "memory" => Ok(MailBackend::Memory),
            other => anyhow::bail!("unknown MAIL_BACKEND `{other}`"),
        }
    }
}

/// How the SMTP connection is secured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmtpSecurity {
    /// Implicit TLS, usually port 465.
    Tls,
    /// Plain connection upgraded with STARTTLS, usually port 587.
    StartTls,
    /// No encryption; only for a local relay or mail catcher.
    None,
}

impl SmtpSecurity {
    pub fn default_port(self) -> u16 {
        match self {
            SmtpSecurity::Tls => 465,
            SmtpSecurity::StartTls => 587,
            SmtpSecurity::None => 25,
        }
    }
}

impl FromStr for SmtpSecurity {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> anyhow::Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "tls" | "ssl" => Ok(SmtpSecurity::Tls),
            "starttls" => Ok(SmtpSecurity::StartTls),
            "none" | "plain" => Ok(SmtpSecurity::None),
            other => anyhow::bail!("unknown SMTP_SECURITY `{other}`"),
        }
    }
}

#[derive(Clone)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub security: SmtpSecurity,
}

impl std::fmt::Debug for SmtpSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("security", &self.security)
            .finish()
    }
}

impl SmtpSettings {
    fn from_env() -> anyhow::Result<Self> {
        let host = env::var("SMTP_HOST").context("SMTP_HOST is not set")?;
        let security = match env::var("SMTP_SECURITY") {
            Ok(value) => value.parse()?,
            Err(_) => SmtpSecurity::StartTls,
        };
        let port = match env::var("SMTP_PORT") {
            Ok(value) => value
                .parse::<u16>()
                .with_context(|| format!("invalid SMTP_PORT `{value}`"))?,
            Err(_) => security.default_port(),
        };
        Ok(Self {
            host,
            port,
            username: env::var("SMTP_USERNAME").ok().filter(|v| !v.is_empty()),
            password: env::var("SMTP_PASSWORD").ok().filter(|v| !v.is_empty()),
            security,
        })
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub public_base_url: String,
    pub mail_from: String,
    pub mail_backend: MailBackend,
    pub smtp: Option<SmtpSettings>,
    pub contact_log_path: String,
    pub cache_enabled: bool,
    pub product_cache_ttl: Duration,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL").context("DATABASE_URL is not set")?;
        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET is not set")?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(3000);
        let public_base_url = env::var("PUBLIC_BASE_URL")
            .unwrap_or_else(|_| format!("http://{host}:{port}"))
            .trim_end_matches('/')
            .to_string();
        let mail_from = env::var("MAIL_FROM").unwrap_or_else(|_| "noreply@localhost".to_string());
        // Without an explicit backend, SMTP is used as soon as a relay is configured.
        let mail_backend = match env::var("MAIL_BACKEND") {
            Ok(value) => value.parse()?,
            Err(_) if env::var("SMTP_HOST").is_ok() => MailBackend::Smtp,
            Err(_) => MailBackend::Log,
        };
        let smtp = match mail_backend {
            MailBackend::Smtp => Some(SmtpSettings::from_env()?),
            MailBackend::Log | MailBackend::Memory => None,
        };
        let contact_log_path =
            env::var("CONTACT_LOG_PATH").unwrap_or_else(|_| "messages.txt".to_string());
        let cache_enabled = env::var("CACHE_ENABLED")
            .map(|v| parse_flag(&v))
            .unwrap_or(true);
        let product_cache_ttl = env::var("PRODUCT_CACHE_TTL_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(300));

        Ok(Self {
            database_url,
            host,
            port,
            jwt_secret,
            public_base_url,
            mail_from,
            mail_backend,
            smtp,
            contact_log_path,
            cache_enabled,
            product_cache_ttl,
        })
    }

    /// Settings for tests and tooling that never read the environment.
    pub fn for_database(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            host: "127.0.0.1".to_string(),
            port: 3000,
            jwt_secret: "test-secret".to_string(),
            public_base_url: "http://127.0.0.1:3000".to_string(),
            mail_from: "noreply@localhost".to_string(),
            mail_backend: MailBackend::Memory,
            smtp: None,
            contact_log_path: "messages.txt".to_string(),
            cache_enabled: true,
            product_cache_ttl: Duration::from_secs(300),
        }
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
