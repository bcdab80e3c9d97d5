use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use std::fmt;

use crate::config::SmtpConfig;

/// A message to deliver to one recipient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reminder {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[derive(Debug)]
pub struct NotifyError(pub String);

impl fmt::Display for NotifyError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Notification failed: {}", self.0)
    }
}

impl std::error::Error for NotifyError {}

impl From<lettre::address::AddressError> for NotifyError {
    fn from(error: lettre::address::AddressError) -> Self {
        NotifyError(format!("invalid address: {}", error))
    }
}

impl From<lettre::error::Error> for NotifyError {
    fn from(error: lettre::error::Error) -> Self {
        NotifyError(error.to_string())
    }
}

impl From<lettre::transport::smtp::Error> for NotifyError {
    fn from(error: lettre::transport::smtp::Error) -> Self {
        NotifyError(error.to_string())
    }
}

/// Outbound delivery of reminders.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, reminder: &Reminder) -> Result<(), NotifyError>;
}

/// Sends reminders as plain-text email over SMTP.
pub struct SmtpNotifier {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpNotifier {
    pub fn from_config(config: &SmtpConfig) -> Result<Self, NotifyError> {
        let from: Mailbox = config.from.parse()?;

        let builder = if config.tls {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host)
        }
        .port(config.port);

        let builder = match (&config.username, &config.password) {
            (Some(username), Some(password)) => {
                builder.credentials(Credentials::new(username.clone(), password.clone()))
            }
            _ => builder,
        };

        Ok(Self {
            mailer: builder.build(),
            from,
        })
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn notify(&self, reminder: &Reminder) -> Result<(), NotifyError> {
        let to: Mailbox = reminder.to.parse()?;
        let email = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(reminder.subject.clone())
            .header(ContentType::TEXT_PLAIN)
            .body(reminder.body.clone())?;

        self.mailer.send(email).await?;
        Ok(())
    }
}

/// Writes reminders to the log. Used when no SMTP host is configured.
#[derive(Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, reminder: &Reminder) -> Result<(), NotifyError> {
        log::info!(
            "Reminder for {} (email disabled): {}",
            reminder.to,
            reminder.subject
        );
        Ok(())
    }
}
