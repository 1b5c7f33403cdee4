//! Order notification emails.
//!
//! Uses SMTP via lettre for delivery with Askama templates. Notifications are
//! best effort: [`dispatch`] runs them on a detached task and only logs
//! failures.

use std::sync::Arc;
use std::time::Duration;

use askama::Template;
use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, MultiPart, SinglePart, header::ContentType},
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use secrecy::ExposeSecret;
use thiserror::Error;

use comic_claim_core::Order;

use crate::config::EmailConfig;

const SMTP_TIMEOUT: Duration = Duration::from_secs(15);

/// HTML template for the order notification.
#[derive(Template)]
#[template(path = "email/order_notification.html")]
struct OrderNotificationHtml<'a> {
    summary: &'a OrderSummary<'a>,
}

/// Plain text template for the order notification.
#[derive(Template)]
#[template(path = "email/order_notification.txt")]
struct OrderNotificationText<'a> {
    summary: &'a OrderSummary<'a>,
}

/// Order fields as rendered in the notification.
struct OrderSummary<'a> {
    id: i32,
    account: &'a str,
    delivery_address: &'a str,
    count: i32,
    notes: &'a str,
    date_created: String,
}

impl<'a> OrderSummary<'a> {
    fn new(order: &'a Order) -> Self {
        Self {
            id: order.id.as_i32(),
            account: order.account.as_str(),
            delivery_address: &order.delivery_address,
            count: order.count,
            notes: order.notes.as_deref().unwrap_or("(none)"),
            date_created: order.date_created.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        }
    }
}

/// Errors that can occur when sending a notification.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// SMTP transport error.
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    /// Failed to build email message.
    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// Template rendering error.
    #[error("Template error: {0}")]
    Template(#[from] askama::Error),
}

/// Something that wants to hear about placed orders.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Announce a newly placed order.
    async fn order_placed(&self, order: &Order) -> Result<(), NotifyError>;
}

/// Notifier used when no mail relay is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledNotifier;

#[async_trait]
impl Notifier for DisabledNotifier {
    async fn order_placed(&self, order: &Order) -> Result<(), NotifyError> {
        tracing::debug!(order_id = %order.id, "Order notifications disabled, skipping");
        Ok(())
    }
}

/// Sends order notifications through an SMTP relay.
#[derive(Clone)]
pub struct EmailNotifier {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Mailbox,
}

impl EmailNotifier {
    /// Create a new email notifier from configuration.
    ///
    /// No connection is made until the first notification is sent.
    ///
    /// # Errors
    ///
    /// Returns an error if either address is invalid or the relay host cannot
    /// be used for STARTTLS.
    pub fn new(config: &EmailConfig) -> Result<Self, NotifyError> {
        let from = parse_mailbox(&config.from_address)?;
        let to = parse_mailbox(&config.notify_address)?;

        let credentials = Credentials::new(
            config.smtp_username.clone(),
            config.smtp_password.expose_secret().to_string(),
        );

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port)
            .credentials(credentials)
            .timeout(Some(SMTP_TIMEOUT))
            .build();

        Ok(Self { mailer, from, to })
    }

    /// Build the notification message for an order.
    fn build_message(&self, order: &Order) -> Result<Message, NotifyError> {
        let summary = OrderSummary::new(order);
        let html = OrderNotificationHtml { summary: &summary }.render()?;
        let text = OrderNotificationText { summary: &summary }.render()?;

        let message = Message::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .subject(format!(
                "New comic order #{} from {}",
                summary.id, summary.account
            ))
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(text),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(html),
                    ),
            )?;

        Ok(message)
    }
}

#[async_trait]
impl Notifier for EmailNotifier {
    async fn order_placed(&self, order: &Order) -> Result<(), NotifyError> {
        let message = self.build_message(order)?;
        self.mailer.send(message).await?;

        tracing::info!(order_id = %order.id, to = %self.to, "Order notification sent");
        Ok(())
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox, NotifyError> {
    address
        .parse()
        .map_err(|_| NotifyError::InvalidAddress(address.to_string()))
}

/// Send an order notification on a detached task.
///
/// The caller never waits on delivery; failures are logged and dropped.
pub fn dispatch(notifier: Arc<dyn Notifier>, order: Order) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        if let Err(e) = notifier.order_placed(&order).await {
            tracing::warn!(
                order_id = %order.id,
                account = %order.account,
                error = %e,
                "Failed to send order notification"
            );
        }
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use chrono::TimeZone;
    use chrono::Utc;
    use comic_claim_core::{Account, OrderId};
    use secrecy::SecretString;

    use super::*;

    fn email_config() -> EmailConfig {
        EmailConfig {
            smtp_host: "smtp.mailrelay.net".to_string(),
            smtp_port: 587,
            smtp_username: "orders".to_string(),
            smtp_password: SecretString::from("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6"),
            from_address: "orders@gumcomics.net".to_string(),
            notify_address: "fulfillment@gumcomics.net".to_string(),
        }
    }

    fn order() -> Order {
        Order {
            id: OrderId::new(7),
            account: Account::parse("A1").unwrap(),
            delivery_address: "1 Main St".to_string(),
            count: 3,
            notes: Some("<b>fragile</b>".to_string()),
            date_created: Utc.with_ymd_and_hms(2021, 9, 1, 12, 0, 0).unwrap(),
        }
    }

    struct FailingNotifier {
        attempts: AtomicUsize,
    }

    #[async_trait]
    impl Notifier for FailingNotifier {
        async fn order_placed(&self, _order: &Order) -> Result<(), NotifyError> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            Err(NotifyError::InvalidAddress("relay unreachable".to_string()))
        }
    }

    #[test]
    fn test_summary_fills_missing_notes() {
        let mut order = order();
        order.notes = None;
        let summary = OrderSummary::new(&order);
        assert_eq!(summary.notes, "(none)");
        assert_eq!(summary.date_created, "2021-09-01 12:00:00 UTC");
    }

    #[test]
    fn test_text_template_renders_order() {
        let order = order();
        let summary = OrderSummary::new(&order);
        let text = OrderNotificationText { summary: &summary }.render().unwrap();

        assert!(text.contains("Order #7"));
        assert!(text.contains("1 Main St"));
        assert!(text.contains("<b>fragile</b>"));
    }

    #[test]
    fn test_html_template_escapes_notes() {
        let order = order();
        let summary = OrderSummary::new(&order);
        let html = OrderNotificationHtml { summary: &summary }.render().unwrap();

        assert!(html.contains("&lt;b&gt;fragile&lt;/b&gt;") || html.contains("&#60;b&#62;fragile&#60;/b&#62;"));
        assert!(!html.contains("<b>fragile</b>"));
    }

    #[tokio::test]
    async fn test_build_message_subject() {
        let notifier = EmailNotifier::new(&email_config()).unwrap();
        let message = notifier.build_message(&order()).unwrap();
        let formatted = String::from_utf8(message.formatted()).unwrap();

        assert!(formatted.contains("Subject: New comic order #7 from A1"));
        assert!(formatted.contains("fulfillment@gumcomics.net"));
    }

    #[tokio::test]
    async fn test_invalid_recipient_rejected() {
        let mut config = email_config();
        config.notify_address = "not an address".to_string();
        let result = EmailNotifier::new(&config);
        assert!(matches!(result, Err(NotifyError::InvalidAddress(_))));
    }

    #[tokio::test]
    async fn test_disabled_notifier_succeeds() {
        assert!(DisabledNotifier.order_placed(&order()).await.is_ok());
    }

    #[tokio::test]
    async fn test_dispatch_swallows_failure() {
        let notifier = Arc::new(FailingNotifier {
            attempts: AtomicUsize::new(0),
        });

        dispatch(notifier.clone(), order()).await.unwrap();
        assert_eq!(notifier.attempts.load(Ordering::SeqCst), 1);
    }
}
