//! Transactional email.
//!
//! A message is produced by rendering a named template from the `email/`
//! template directory, inlining its CSS into element styles and deriving a
//! plain-text alternative. The result is handed to a [`MailTransport`] once;
//! failures are returned to the caller and never retried.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use serde::Serialize;
use tera::{Context, Tera};

use crate::config::MailConfig;
use crate::errors::AppError;

/// Wrap width for the plain-text alternative.
const TEXT_WIDTH: usize = 80;

/// Recipient of a templated email.
#[derive(Debug, Clone, Serialize)]
pub struct MailRecipient {
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Everything needed to produce one templated email.
///
/// The whole struct, including the flattened `data`, is the template context.
#[derive(Debug, Clone, Serialize)]
pub struct MailOptions {
    /// Template name without extension, looked up as `email/<filename>.html`
    pub filename: String,
    pub user: MailRecipient,
    pub subject: String,
    #[serde(flatten)]
    pub data: serde_json::Map<String, serde_json::Value>,
}

/// A fully rendered message.
#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingMail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub html: String,
    pub text: String,
}

/// Outbound mail delivery.
#[async_trait]
pub trait MailTransport: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    async fn submit(&self, mail: &OutgoingMail) -> Result<(), AppError>;
}

/// SMTP delivery through lettre.
pub struct SmtpMailTransport {
    inner: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailTransport {
    pub fn from_config(config: &MailConfig) -> Result<Self, AppError> {
        let host = config
            .host
            .as_deref()
            .ok_or_else(|| AppError::Internal("MAIL_HOST is not configured".to_string()))?;

        let mut builder = if config.starttls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host)
        }
        .port(config.port);

        if let (Some(user), Some(password)) = (&config.user, &config.password) {
            builder = builder.credentials(Credentials::new(user.clone(), password.clone()));
        }

        Ok(Self {
            inner: builder.build(),
        })
    }
}

#[async_trait]
impl MailTransport for SmtpMailTransport {
    fn name(&self) -> &'static str {
        "smtp"
    }

    async fn submit(&self, mail: &OutgoingMail) -> Result<(), AppError> {
        let message = Message::builder()
            .from(mail.from.parse::<Mailbox>()?)
            .to(mail.to.parse::<Mailbox>()?)
            .subject(mail.subject.clone())
            .multipart(MultiPart::alternative_plain_html(
                mail.text.clone(),
                mail.html.clone(),
            ))?;

        let response = self.inner.send(message).await?;
        tracing::debug!("SMTP accepted message: {:?}", response.code());
        Ok(())
    }
}

/// Development transport that only logs what would have been sent.
pub struct LogMailTransport;

#[async_trait]
impl MailTransport for LogMailTransport {
    fn name(&self) -> &'static str {
        "log"
    }

    async fn submit(&self, mail: &OutgoingMail) -> Result<(), AppError> {
        tracing::info!(
            to = %mail.to,
            subject = %mail.subject,
            "Mail transport not configured, message not sent:\n{}",
            mail.text
        );
        Ok(())
    }
}

/// Captures messages in memory.
#[cfg(test)]
#[derive(Default)]
pub struct MemoryMailTransport {
    sent: tokio::sync::Mutex<Vec<OutgoingMail>>,
}

#[cfg(test)]
impl MemoryMailTransport {
    pub async fn sent(&self) -> Vec<OutgoingMail> {
        self.sent.lock().await.clone()
    }
}

#[cfg(test)]
#[async_trait]
impl MailTransport for MemoryMailTransport {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn submit(&self, mail: &OutgoingMail) -> Result<(), AppError> {
        self.sent.lock().await.push(mail.clone());
        Ok(())
    }
}

/// Pick the transport the configuration asks for.
pub fn transport_from_config(config: &MailConfig) -> Result<Arc<dyn MailTransport>, AppError> {
    if config.host.is_some() {
        Ok(Arc::new(SmtpMailTransport::from_config(config)?))
    } else {
        Ok(Arc::new(LogMailTransport))
    }
}

/// Renders templated emails and submits them.
pub struct Mailer {
    templates: Tera,
    from: String,
    transport: Arc<dyn MailTransport>,
}

impl Mailer {
    /// Load every template under `<template_dir>/email/`.
    pub fn new(
        template_dir: &Path,
        from: impl Into<String>,
        transport: Arc<dyn MailTransport>,
    ) -> Result<Self, AppError> {
        let glob = format!("{}/email/**/*.html", template_dir.display());
        let templates = Tera::new(&glob)?;
        tracing::debug!(
            "Loaded {} email templates from {}",
            templates.get_template_names().count(),
            glob
        );

        Ok(Self {
            templates,
            from: from.into(),
            transport,
        })
    }

    pub fn transport_name(&self) -> &'static str {
        self.transport.name()
    }

    /// Render a template and inline its styles.
    fn generate_html(&self, filename: &str, context: &Context) -> Result<String, AppError> {
        let html = self
            .templates
            .render(&format!("{}.html", filename), context)?;
        css_inline::inline(&html)
            .map_err(|e| AppError::Template(format!("Failed to inline styles: {}", e)))
    }

    /// Build the message for `options` without sending it.
    pub fn compose(&self, options: &MailOptions) -> Result<OutgoingMail, AppError> {
        let context = Context::from_serialize(options)?;
        let html = self.generate_html(&options.filename, &context)?;
        let text = html2text::config::plain()
            .string_from_read(html.as_bytes(), TEXT_WIDTH)
            .map_err(|e| AppError::Template(format!("Failed to derive plain text: {}", e)))?;

        Ok(OutgoingMail {
            from: self.from.clone(),
            to: options.user.email.clone(),
            subject: options.subject.clone(),
            html,
            text,
        })
    }

    /// Render and submit a password reset email in a single attempt.
    pub async fn send_reset_password_email(&self, options: &MailOptions) -> Result<(), AppError> {
        let mail = self.compose(options)?;
        self.transport.submit(&mail).await?;
        tracing::info!(to = %mail.to, template = %options.filename, "Sent email");
        Ok(())
    }
}
