//! # Mail Relay Client
//!
//! Pooled SMTPS transport behind the [`Mailer`] seam. The transport is
//! verified before first use by the bootstrapper; sending composes a
//! multipart message with an HTML body and any best-effort attachments.

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::PoolConfig;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::debug;

use crate::config::MailSettings;
use crate::error::{RegistrationError, Result};

/// A composed message ready for the relay.
#[derive(Debug, Clone)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub html_body: String,
    pub attachments: Vec<EmailAttachment>,
}

#[derive(Debug, Clone)]
pub struct EmailAttachment {
    pub filename: String,
    pub content_type: String,
    pub content: String,
}

/// Operations the notifier needs from the mail relay.
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Configured sender address.
    fn from_address(&self) -> &str;

    /// Configured bcc address; doubles as the calendar organizer.
    fn bcc_address(&self) -> &str;

    /// Send a message; returns the relay's acknowledgement.
    async fn send(&self, email: OutgoingEmail) -> Result<String>;
}

/// Pooled SMTPS implementation of [`Mailer`].
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    settings: MailSettings,
}

impl SmtpMailer {
    /// Open and verify a pooled TLS session against the configured relay.
    pub async fn connect(settings: MailSettings) -> Result<Self> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&settings.smtp_hostname)
            .map_err(|e| RegistrationError::mail(format!("invalid relay host: {e}")))?
            .credentials(Credentials::new(
                settings.smtp_username.clone(),
                settings.smtp_password.clone(),
            ))
            .pool_config(PoolConfig::new())
            .build();

        let verified = transport
            .test_connection()
            .await
            .map_err(|e| RegistrationError::mail(e.to_string()))?;
        if !verified {
            return Err(RegistrationError::mail("relay refused the verification probe"));
        }

        Ok(Self { transport, settings })
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox> {
    address
        .parse::<Mailbox>()
        .map_err(|e| RegistrationError::mail(format!("invalid address {address:?}: {e}")))
}

#[async_trait]
impl Mailer for SmtpMailer {
    fn from_address(&self) -> &str {
        &self.settings.mail_from_address
    }

    fn bcc_address(&self) -> &str {
        &self.settings.mail_bcc_address
    }

    async fn send(&self, email: OutgoingEmail) -> Result<String> {
        let mut body = MultiPart::mixed().singlepart(SinglePart::html(email.html_body));
        for attachment in email.attachments {
            let content_type = attachment.content_type.parse::<ContentType>().map_err(|e| {
                RegistrationError::mail(format!(
                    "invalid attachment content type {:?}: {e}",
                    attachment.content_type
                ))
            })?;
            body = body.singlepart(
                Attachment::new(attachment.filename).body(attachment.content, content_type),
            );
        }

        debug!(to = %email.to, subject = %email.subject, "handing message to relay");
        let message = Message::builder()
            .from(parse_mailbox(self.from_address())?)
            .to(parse_mailbox(&email.to)?)
            .subject(email.subject)
            .multipart(body)
            .map_err(|e| RegistrationError::mail(format!("failed to build message: {e}")))?;
        let response = self
            .transport
            .send(message)
            .await
            .map_err(|e| RegistrationError::mail(e.to_string()))?;
        Ok(response.code().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mailbox_parsing() {
        assert!(parse_mailbox("jane@example.com").is_ok());
        assert!(parse_mailbox("Jane Doe <jane@example.com>").is_ok());
        assert!(parse_mailbox("not an address").is_err());
    }
}
