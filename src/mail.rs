//! Outbound email.
//!
//! Replies to contact messages are sent fire-and-forget: the request handler
//! hands the email to the [`Outbox`] and answers immediately, delivery runs on
//! the IO task pool and its outcome is only logged.

use bevy_log::{error, info, warn};
use bevy_tasks::{IoTaskPool, TaskPool};
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{SmtpTransport, Transport};
use std::sync::Arc;
use std::time::Duration;

use crate::config::MailConfig;
use crate::tracker::ActivityTracker;
use crate::{PortfolioError, PortfolioResult};

const SMTP_TIMEOUT_SECONDS: u64 = 10;

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

pub trait Mailer: Send + Sync {
    fn is_configured(&self) -> bool;

    fn send(&self, email: &OutgoingEmail) -> PortfolioResult<()>;
}

/// STARTTLS SMTP relay, Gmail by default.
pub struct SmtpMailer {
    config: MailConfig,
}

impl SmtpMailer {
    pub fn new(config: MailConfig) -> Self {
        Self { config }
    }

    fn build_message(&self, email: &OutgoingEmail) -> PortfolioResult<lettre::Message> {
        let from = self
            .config
            .user
            .parse::<Mailbox>()
            .map_err(|e| PortfolioError::mail_error(format!("invalid sender address: {}", e)))?;
        let to = email
            .to
            .parse::<Mailbox>()
            .map_err(|e| PortfolioError::mail_error(format!("invalid recipient address: {}", e)))?;

        lettre::Message::builder()
            .from(from)
            .to(to)
            .subject(email.subject.as_str())
            .header(ContentType::TEXT_PLAIN)
            .body(email.body.clone())
            .map_err(PortfolioError::mail_error)
    }
}

impl Mailer for SmtpMailer {
    fn is_configured(&self) -> bool {
        self.config.is_configured()
    }

    fn send(&self, email: &OutgoingEmail) -> PortfolioResult<()> {
        if !self.is_configured() {
            return Err(PortfolioError::mail_error("credentials not configured"));
        }

        let message = self.build_message(email)?;
        let transport = SmtpTransport::starttls_relay(&self.config.host)
            .map_err(PortfolioError::mail_error)?
            .port(self.config.port)
            .credentials(Credentials::new(
                self.config.user.clone(),
                self.config.password.clone(),
            ))
            .timeout(Some(Duration::from_secs(SMTP_TIMEOUT_SECONDS)))
            .build();

        info!("Connecting to {}:{} to deliver mail", self.config.host, self.config.port);
        transport.send(&message).map_err(|e| {
            if e.is_permanent() {
                PortfolioError::mail_error(format!(
                    "{} (check that an app password is used for the sender account)",
                    e
                ))
            } else {
                PortfolioError::mail_error(e)
            }
        })?;
        Ok(())
    }
}

/// Fire-and-forget delivery queue in front of a [`Mailer`].
#[derive(Clone)]
pub struct Outbox {
    mailer: Arc<dyn Mailer>,
    deliveries: ActivityTracker,
}

impl Outbox {
    pub fn new(mailer: Arc<dyn Mailer>) -> Self {
        Self {
            mailer,
            deliveries: ActivityTracker::default(),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.mailer.is_configured()
    }

    /// Queues `email` and returns without waiting for delivery.
    pub fn enqueue(&self, email: OutgoingEmail) {
        let mailer = Arc::clone(&self.mailer);
        let guard = self.deliveries.begin();

        IoTaskPool::get_or_init(TaskPool::new)
            .spawn(async move {
                let _guard = guard;
                match mailer.send(&email) {
                    Ok(()) => info!("Email sent to {}", email.to),
                    Err(err) => error!("Failed to send email to {}: {}", email.to, err),
                }
            })
            .detach();
    }

    /// Deliveries queued but not finished yet.
    pub fn pending(&self) -> usize {
        self.deliveries.active()
    }

    pub fn total_queued(&self) -> usize {
        self.deliveries.total()
    }
}

/// Logs whether mail credentials are present without revealing them.
pub fn log_mail_setup(config: &MailConfig) {
    let state = |value: &str| if value.is_empty() { "NOT SET" } else { "SET" };
    if config.is_configured() {
        info!(
            "Outbound mail via {}:{} as {}",
            config.host, config.port, config.user
        );
    } else {
        warn!(
            "Outbound mail disabled: GMAIL_USER {}, GMAIL_PASS {}",
            state(&config.user),
            state(&config.password)
        );
    }
}
