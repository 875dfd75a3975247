//! Email service for overdue reminder notifications

use lettre::{
    message::{header::ContentType, Mailbox, Message, MultiPart, SinglePart},
    transport::smtp::authentication::Credentials,
    SmtpTransport, Transport,
};
use rust_decimal::Decimal;
use std::str::FromStr;

use crate::{
    config::EmailConfig,
    error::{AppError, AppResult},
};

#[derive(Clone)]
pub struct EmailService {
    config: EmailConfig,
}

impl EmailService {
    pub fn new(config: EmailConfig) -> Self {
        Self { config }
    }

    /// Send an overdue reminder listing the borrower's overdue books and the
    /// accrued fine. Callers fire this without awaiting the outcome.
    pub async fn send_overdue_reminder(
        &self,
        to: &str,
        borrower_name: &str,
        overdue_books: &[String],
        penalty: Option<Decimal>,
    ) -> AppResult<()> {
        let subject = "Overdue Book Reminder";
        let penalty_line = match penalty {
            Some(amount) => format!("Accrued penalty: {:.2}", amount),
            None => "No penalties recorded yet.".to_string(),
        };
        let body = format!(
            r#"
Dear {name},

This is a friendly reminder that you have overdue books. Please return them
as soon as possible to avoid additional fines.

Overdue books:
{books}

{penalty}

Best regards,
The ShelfMaster Support
"#,
            name = borrower_name,
            books = overdue_books.join("\n"),
            penalty = penalty_line,
        );

        self.send_email(to, subject, &body).await
    }

    /// Generic email sending function
    async fn send_email(&self, to: &str, subject: &str, body: &str) -> AppResult<()> {
        let from_name = self
            .config
            .smtp_from_name
            .as_deref()
            .unwrap_or("ShelfMaster");
        let from_mailbox = Mailbox::from_str(&format!("{} <{}>", from_name, self.config.smtp_from))
            .map_err(|e| AppError::Internal(format!("Invalid from address: {}", e)))?;

        let to_mailbox = Mailbox::from_str(to)
            .map_err(|e| AppError::Internal(format!("Invalid to address: {}", e)))?;

        let email = Message::builder()
            .from(from_mailbox)
            .to(to_mailbox)
            .subject(subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(body.to_string()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(format!(
                                r#"<html><body><pre>{}</pre></body></html>"#,
                                body.replace("\n", "<br>")
                            )),
                    ),
            )
            .map_err(|e| AppError::Internal(format!("Failed to build email: {}", e)))?;

        let mailer_builder = if self.config.smtp_use_tls {
            SmtpTransport::starttls_relay(&self.config.smtp_host)
                .map_err(|e| AppError::Upstream(format!("Failed to create SMTP transport: {}", e)))?
        } else {
            SmtpTransport::builder_dangerous(&self.config.smtp_host)
        }
        .port(self.config.smtp_port);

        let mailer_builder = if let (Some(username), Some(password)) = (
            &self.config.smtp_username,
            &self.config.smtp_password,
        ) {
            mailer_builder.credentials(Credentials::new(
                username.clone(),
                password.clone(),
            ))
        } else {
            mailer_builder
        };

        let mailer = mailer_builder.build();

        mailer
            .send(&email)
            .map_err(|e| AppError::Upstream(format!("Failed to send email: {}", e)))?;

        Ok(())
    }
}
