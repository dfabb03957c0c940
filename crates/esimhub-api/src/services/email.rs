//! Email notifications via SMTP (plain text).
//!
//! No-op when email is disabled or SMTP is not configured; order flows never
//! fail because of a mail problem.

use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::sync::Arc;

use esimhub_core::models::{Esim, Order};
use esimhub_core::Config;

#[derive(Clone)]
pub struct EmailService {
    mailer: Arc<AsyncSmtpTransport<Tokio1Executor>>,
    from: String,
}

impl EmailService {
    /// Create the service from config. Returns `None` if disabled or SMTP
    /// is not configured.
    pub fn from_config(config: &Config) -> Option<Self> {
        if !config.email_enabled {
            tracing::debug!("Email notifications disabled (EMAIL_ENABLED=false)");
            return None;
        }
        let host = config.smtp_host.as_deref()?;
        let from = config.smtp_from.clone()?;
        let port = config.smtp_port.unwrap_or(587);

        let mailer = if config.smtp_tls {
            let b = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host).ok()?;
            let b = b.port(port);
            let b = if let (Some(u), Some(p)) = (&config.smtp_user, &config.smtp_password) {
                b.credentials(Credentials::new(u.clone(), p.clone()))
            } else {
                b
            };
            tracing::info!(host = %host, port = port, "Email service initialized (SMTP with STARTTLS)");
            b.build()
        } else {
            let b = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host).port(port);
            let b = if let (Some(u), Some(p)) = (&config.smtp_user, &config.smtp_password) {
                b.credentials(Credentials::new(u.clone(), p.clone()))
            } else {
                b
            };
            tracing::info!(host = %host, port = port, "Email service initialized (SMTP)");
            b.build()
        };

        Some(Self {
            mailer: Arc::new(mailer),
            from,
        })
    }

    async fn send(&self, to: &str, subject: &str, body_plain: String) -> Result<(), String> {
        let to_addr: Mailbox = to
            .parse()
            .map_err(|e| format!("Invalid recipient address: {}", e))?;
        let from_addr: Mailbox = self
            .from
            .parse()
            .map_err(|e| format!("Invalid SMTP_FROM: {}", e))?;

        let email = Message::builder()
            .from(from_addr)
            .to(to_addr)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body_plain)
            .map_err(|e| e.to_string())?;

        self.mailer.send(email).await.map_err(|e| e.to_string())?;
        Ok(())
    }

    /// Acknowledgement sent right after order creation.
    pub async fn send_order_received(&self, to: &str, order: &Order) -> Result<(), String> {
        let body = format!(
            "Thank you for your order.\n\n\
             Order number: {}\n\
             Amount: {} {}\n\n\
             You will receive your eSIM activation code once payment completes.\n",
            order.order_number, order.amount, order.currency
        );
        self.send(to, &format!("Order received: {}", order.order_number), body)
            .await
    }

    /// Reset token delivery. The token is only valid for a short window
    /// and is never persisted in the clear.
    pub async fn send_password_reset(&self, to: &str, token: &str) -> Result<(), String> {
        let body = format!(
            "A password reset was requested for your account.\n\n\
             Reset token: {}\n\n\
             The token expires in one hour. If you did not request this,\n\
             you can ignore this message.\n",
            token
        );
        self.send(to, "Password reset request", body).await
    }

    /// Activation details sent after a successful allocation.
    pub async fn send_esim_qr_code(
        &self,
        to: &str,
        order: &Order,
        esim: &Esim,
    ) -> Result<(), String> {
        let body = format!(
            "Your eSIM is ready.\n\n\
             Order number: {}\n\
             Phone number: {}\n\
             ICCID: {}\n\
             Activation code: {}\n\n\
             Valid until: {}\n",
            order.order_number,
            esim.phone_number,
            esim.iccid,
            esim.qr_code,
            order.expiry_date.format("%Y-%m-%d")
        );
        self.send(to, &format!("Your eSIM for order {}", order.order_number), body)
            .await
    }
}
