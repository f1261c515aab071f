/// Outgoing email
///
/// Registration sends a verification link through a [`Mailer`]. Three
/// transports exist:
///
/// - [`ConsoleMailer`]: writes the message to the log (development)
/// - [`SmtpMailer`]: STARTTLS SMTP relay via `lettre`
/// - [`MemoryMailer`]: keeps messages in memory (tests)
///
/// # Example
///
/// ```no_run
/// use taskhub_shared::mail::{verification_email, ConsoleMailer, Mailer};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let mailer = ConsoleMailer;
/// let link = "http://localhost:8080/auth/verify-email?token=...";
/// let mail = verification_email("a@x.com", "A", link);
/// mailer.send(mail).await?;
/// # Ok(())
/// # }
/// ```

use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use std::sync::Mutex;

/// Error type for mail delivery
#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("Invalid address '{address}': {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("Failed to build message: {0}")]
    Build(String),

    #[error("SMTP error: {0}")]
    Transport(String),
}

/// A plain-text message ready to send
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Mail transport
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, mail: OutgoingMail) -> Result<(), MailError>;
}

/// Builds the account verification message
pub fn verification_email(to: &str, name: &str, link: &str) -> OutgoingMail {
    OutgoingMail {
        to: to.to_string(),
        subject: "Verify your TaskHub account".to_string(),
        body: format!(
            "Hello {name},\n\n\
             Confirm your email address by opening the link below.\n\
             The link expires in 1 hour.\n\n\
             {link}\n"
        ),
    }
}

/// Logs messages instead of sending them
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleMailer;

#[async_trait]
impl Mailer for ConsoleMailer {
    async fn send(&self, mail: OutgoingMail) -> Result<(), MailError> {
        tracing::info!(to = %mail.to, subject = %mail.subject, body = %mail.body, "Outgoing mail");
        Ok(())
    }
}

/// SMTP settings for [`SmtpMailer`]
#[derive(Debug, Clone)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub from: String,
}

/// Sends messages through an SMTP relay with STARTTLS
#[derive(Clone)]
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

fn parse_mailbox(address: &str) -> Result<Mailbox, MailError> {
    address.parse::<Mailbox>().map_err(|e| MailError::InvalidAddress {
        address: address.to_string(),
        reason: e.to_string(),
    })
}

impl SmtpMailer {
    /// Builds the transport; no connection is opened until the first send
    pub fn new(settings: SmtpSettings) -> Result<Self, MailError> {
        let from = parse_mailbox(&settings.from)?;

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.host)
            .map_err(|e| MailError::Transport(e.to_string()))?
            .port(settings.port);

        if let (Some(username), Some(password)) = (settings.username, settings.password) {
            builder = builder.credentials(Credentials::new(username, password));
        }

        Ok(Self {
            transport: builder.build(),
            from,
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, mail: OutgoingMail) -> Result<(), MailError> {
        let message = Message::builder()
            .from(self.from.clone())
            .to(parse_mailbox(&mail.to)?)
            .subject(mail.subject)
            .header(ContentType::TEXT_PLAIN)
            .body(mail.body)
            .map_err(|e| MailError::Build(e.to_string()))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| MailError::Transport(e.to_string()))?;

        tracing::debug!(to = %mail.to, "Mail delivered to relay");
        Ok(())
    }
}

/// Collects messages in memory
#[derive(Debug, Default)]
pub struct MemoryMailer {
    sent: Mutex<Vec<OutgoingMail>>,
}

impl MemoryMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages sent so far, oldest first
    pub fn sent(&self) -> Vec<OutgoingMail> {
        self.sent
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[async_trait]
impl Mailer for MemoryMailer {
    async fn send(&self, mail: OutgoingMail) -> Result<(), MailError> {
        self.sent
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(mail);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verification_email() {
        let mail = verification_email("a@x.com", "A", "http://h/auth/verify-email?token=t");

        assert_eq!(mail.to, "a@x.com");
        assert!(mail.subject.contains("Verify"));
        assert!(mail.body.contains("Hello A"));
        assert!(mail.body.contains("http://h/auth/verify-email?token=t"));
    }

    #[tokio::test]
    async fn test_memory_mailer_records_messages() {
        let mailer = MemoryMailer::new();
        mailer
            .send(verification_email("a@x.com", "A", "link-1"))
            .await
            .unwrap();
        mailer
            .send(verification_email("b@x.com", "B", "link-2"))
            .await
            .unwrap();

        let sent = mailer.sent();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].to, "a@x.com");
        assert_eq!(sent[1].to, "b@x.com");
    }

    #[tokio::test]
    async fn test_console_mailer_never_fails() {
        assert!(ConsoleMailer.send(verification_email("a@x.com", "A", "l")).await.is_ok());
    }

    #[test]
    fn test_smtp_mailer_rejects_bad_sender() {
        let result = SmtpMailer::new(SmtpSettings {
            host: "smtp.example.com".to_string(),
            port: 587,
            username: None,
            password: None,
            from: "not an address".to_string(),
        });

        assert!(matches!(result, Err(MailError::InvalidAddress { .. })));
    }
}
