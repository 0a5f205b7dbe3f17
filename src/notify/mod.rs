use lettre::{
    message::header::ContentType,
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

use crate::config::Config;

/// Best-effort mail dispatcher for share notifications.
/// Failures are logged and swallowed; the triggering request never sees them.
pub struct Mailer {
    config: Config,
}

impl Mailer {
    pub fn new(config: &Config) -> Self {
        Self {
            config: config.clone(),
        }
    }

    fn is_configured(&self) -> bool {
        self.config.mail.username.is_some() && self.config.mail.password.is_some()
    }

    /// Notify the bound recipient that a file was shared with them.
    pub async fn send_share_notice(
        &self,
        recipient_email: &str,
        sender_name: &str,
        filename: &str,
        share_token: &str,
        expires_at: Option<&str>,
    ) {
        if !self.is_configured() {
            tracing::warn!("Email not configured - skipping share notification");
            return;
        }

        if let Err(e) = self
            .deliver(recipient_email, sender_name, filename, share_token, expires_at)
            .await
        {
            tracing::warn!("Failed to send share notification to {}: {}", recipient_email, e);
        } else {
            tracing::info!("Sent share notification to {}", recipient_email);
        }
    }

    async fn deliver(
        &self,
        recipient_email: &str,
        sender_name: &str,
        filename: &str,
        share_token: &str,
        expires_at: Option<&str>,
    ) -> anyhow::Result<()> {
        let download_url = format!(
            "{}/share/{}?email={}",
            self.config.app.public_base_url.trim_end_matches('/'),
            share_token,
            urlencoding::encode(recipient_email),
        );

        let expiration_text = expires_at
            .map(|e| format!("<p><em>This link will expire on {}.</em></p>", e))
            .unwrap_or_default();

        let html = format!(
            r#"<div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;">
  <h2>You've received a file share!</h2>
  <p><strong>{sender_name}</strong> has shared a file with you:</p>
  <p><strong>{filename}</strong></p>
  <p><a href="{download_url}">Download File</a></p>
  {expiration_text}
  <hr>
  <p style="color: #666; font-size: 12px;">
    This is an automated message. If you didn't expect this file,
    you can safely ignore it.
  </p>
</div>"#,
        );

        let message = Message::builder()
            .from(self.config.mail.from.parse()?)
            .to(recipient_email.parse()?)
            .subject(format!("{} shared a file with you: {}", sender_name, filename))
            .header(ContentType::TEXT_HTML)
            .body(html)?;

        let creds = Credentials::new(
            self.config.mail.username.clone().unwrap_or_default(),
            self.config.mail.password.clone().unwrap_or_default(),
        );

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.config.mail.host)?
            .port(self.config.mail.port)
            .credentials(creds)
            .build();

        transport.send(message).await?;
        Ok(())
    }
}
