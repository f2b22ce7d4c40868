use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::info;

use crate::config::EmailConfig;
use crate::notify::Notifier;
use crate::report::Report;

/// Authenticated STARTTLS submission to a fixed recipient list.
pub struct SmtpNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    sender: Mailbox,
    receivers: Vec<Mailbox>,
}

impl SmtpNotifier {
    pub fn new(config: &EmailConfig) -> Result<Self> {
        let sender = parse_mailbox(&config.sender).context("invalid email sender (EMAIL_SENDER)")?;
        if config.receivers.is_empty() {
            return Err(anyhow!("no email receivers configured (EMAIL_RECEIVERS)"));
        }
        let receivers = config
            .receivers
            .iter()
            .map(|raw| parse_mailbox(raw))
            .collect::<Result<Vec<_>>>()
            .context("invalid email receiver (EMAIL_RECEIVERS)")?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
            .with_context(|| format!("failed configuring SMTP relay {}", config.smtp_host))?
            .port(config.smtp_port)
            .credentials(Credentials::new(
                config.sender.clone(),
                config.password.clone(),
            ))
            .build();

        Ok(Self {
            transport,
            sender,
            receivers,
        })
    }

    fn build_message(&self, report: &Report) -> Result<Message> {
        build_message(&self.sender, &self.receivers, report)
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn send(&self, report: &Report) -> Result<()> {
        let message = self.build_message(report)?;
        self.transport
            .send(message)
            .await
            .context("SMTP submission failed")?;
        info!("report mailed to {} receivers", self.receivers.len());
        Ok(())
    }
}

fn parse_mailbox(raw: &str) -> Result<Mailbox> {
    raw.trim()
        .parse::<Mailbox>()
        .with_context(|| format!("not a mailbox: {raw:?}"))
}

fn build_message(sender: &Mailbox, receivers: &[Mailbox], report: &Report) -> Result<Message> {
    let mut builder = Message::builder()
        .from(sender.clone())
        .subject(report.subject.clone())
        .header(ContentType::TEXT_HTML);
    for receiver in receivers {
        builder = builder.to(receiver.clone());
    }
    builder
        .body(report.html.clone())
        .context("failed building report email")
}
