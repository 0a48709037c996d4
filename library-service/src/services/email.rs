use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lettre::{
    message::header::ContentType,
    transport::smtp::authentication::Credentials,
    Message,
    SmtpTransport,
    Transport,
};
use service_core::error::AppError;
use std::time::Duration;

use crate::config::EmailConfig;

#[async_trait]
pub trait EmailProvider: Send + Sync {
    /// Pre-check consulted by issuance before attempting delivery at all.
    fn is_configured(&self) -> bool;

    async fn send_invitation_email(
        &self,
        to_email: &str,
        invite_link: &str,
        expiry_utc: DateTime<Utc>,
    ) -> Result<(), AppError>;
}

#[derive(Clone)]
pub struct SmtpEmailService {
    mailer: SmtpTransport,
    from_email: String,
}

impl SmtpEmailService {
    pub fn new(config: &EmailConfig) -> Result<Self, AppError> {
        let creds = Credentials::new(config.user.clone(), config.pass.clone());

        let mailer = SmtpTransport::starttls_relay(&config.host)
            .map_err(|e| AppError::InternalError(anyhow::anyhow!(e.to_string())))?
            .credentials(creds)
            .port(config.port)
            .timeout(Some(Duration::from_secs(10)))
            .build();

        tracing::info!(host = %config.host, "Email service initialized");

        Ok(Self {
            mailer,
            from_email: config.from.clone(),
        })
    }

    async fn send_email(
        &self,
        to_email: &str,
        subject: &str,
        plain_body: &str,
        html_body: &str,
    ) -> Result<(), AppError> {
        let email = Message::builder()
            .from(self.from_email.parse().map_err(
                |e: lettre::address::AddressError| AppError::InternalError(e.into()),
            )?)
            .to(to_email.parse().map_err(
                |e: lettre::address::AddressError| AppError::InternalError(e.into()),
            )?)
            .subject(subject)
            .multipart(
                lettre::message::MultiPart::alternative()
                    .singlepart(
                        lettre::message::SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(plain_body.to_string()),
                    )
                    .singlepart(
                        lettre::message::SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(html_body.to_string()),
                    ),
            )
            .map_err(|e| AppError::InternalError(e.into()))?;

        // Send email in blocking thread pool to avoid blocking async runtime
        let mailer = self.mailer.clone();
        let result = tokio::task::spawn_blocking(move || mailer.send(&email))
            .await
            .map_err(|e| AppError::InternalError(e.into()))?;

        match result {
            Ok(_) => {
                tracing::info!(
                    to = %to_email,
                    subject = %subject,
                    "Email sent successfully"
                );
                Ok(())
            }
            Err(e) => {
                tracing::error!(
                    error = %e.to_string(),
                    to = %to_email,
                    "Failed to send email"
                );
                Err(AppError::EmailError(e.to_string()))
            }
        }
    }
}

#[async_trait]
impl EmailProvider for SmtpEmailService {
    fn is_configured(&self) -> bool {
        true
    }

    async fn send_invitation_email(
        &self,
        to_email: &str,
        invite_link: &str,
        expiry_utc: DateTime<Utc>,
    ) -> Result<(), AppError> {
        let expiry_date = expiry_utc.format("%B %d, %Y").to_string();

        let html_body = format!(
            r###"            <html>
                <body style="font-family: Arial, sans-serif; color: #333; max-width: 600px; margin: 0 auto; padding: 20px;">
                    <h1 style="color: #2563eb;">Welcome to Secret Library</h1>
                    <p>You have been invited to join Secret Library - a shared library for EPUB and PDF files.</p>
                    <p>
                        <a href="{}" style="display: inline-block; background-color: #2563eb; color: white; padding: 12px 30px; text-decoration: none; border-radius: 5px; font-weight: bold;">
                            Accept Invitation
                        </a>
                    </p>
                    <p style="font-size: 14px; color: #666;">Or copy and paste this link into your browser:</p>
                    <p style="font-size: 14px; word-break: break-all;">{}</p>
                    <p style="font-size: 14px; color: #666;">
                        <strong>Note:</strong> This invitation will expire on <strong>{}</strong>.
                    </p>
                    <p style="font-size: 12px; color: #999;">
                        If you did not expect this invitation, you can safely ignore this email.
                    </p>
                </body>
            </html>
            "###,
            invite_link, invite_link, expiry_date
        );

        let plain_body = format!(
            "Hello,\n\n            You have been invited to join Secret Library - a shared library for EPUB and PDF files.\n\n            Click the link below to accept your invitation:\n            {}

            This invitation will expire on {}.

            If you did not expect this invitation, you can safely ignore this email.

            Best regards,
            Secret Library Team",
            invite_link, expiry_date
        );

        self.send_email(
            to_email,
            "You are invited to Secret Library",
            &plain_body,
            &html_body,
        )
        .await
    }
}

#[derive(Clone)]
pub struct MockEmailService;

#[async_trait]
impl EmailProvider for MockEmailService {
    fn is_configured(&self) -> bool {
        false
    }

    async fn send_invitation_email(
        &self,
        _to_email: &str,
        _invite_link: &str,
        _expiry_utc: DateTime<Utc>,
    ) -> Result<(), AppError> {
        Ok(())
    }
}
