use anyhow::Context;
use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};

use crate::config::MailConfig;

/// Outbound message handed to the transport. The body is HTML.
#[derive(Debug, Clone)]
pub struct Mail {
    pub to: String,
    pub subject: String,
    pub html_body: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, mail: Mail) -> anyhow::Result<()>;
}

/// SMTP delivery over an implicit-TLS relay (port 465).
#[derive(Clone)]
pub struct SmtpMailer {
    transport: SmtpTransport,
    from: String,
    reply_to: String,
}

impl SmtpMailer {
    pub fn new(config: &MailConfig) -> anyhow::Result<Self> {
        let transport = SmtpTransport::relay(&config.host)
            .context("smtp relay setup")?
            .credentials(Credentials::new(config.user.clone(), config.pass.clone()))
            .build();
        Ok(Self {
            transport,
            from: config.from.clone(),
            reply_to: config.reply_to.clone(),
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, mail: Mail) -> anyhow::Result<()> {
        let message = Message::builder()
            .from(self.from.parse().context("invalid from address")?)
            .reply_to(self.reply_to.parse().context("invalid reply-to address")?)
            .to(mail.to.parse().context("invalid to address")?)
            .subject(mail.subject)
            .header(ContentType::TEXT_HTML)
            .body(mail.html_body)
            .context("build email")?;

        // lettre's SmtpTransport is synchronous; keep it off the async workers.
        let transport = self.transport.clone();
        tokio::task::spawn_blocking(move || transport.send(&message))
            .await
            .context("smtp send task")?
            .context("smtp send")?;
        Ok(())
    }
}
