//! Outbound transports for release messages and their plain-text rendering.

use std::time::Duration;

use serde::Serialize;
use tracing::{info, warn};
use vigil_core::{
  mail::{Mailer, ReleaseMessage},
  obligation::Obligation,
};

use crate::{MailConfig, MailMode, error::Error};

// ─── Transports ──────────────────────────────────────────────────────────────

/// JSON body POSTed to the relay.
#[derive(Debug, Serialize)]
struct Envelope<'a> {
  to:        &'a str,
  to_name:   &'a str,
  from_name: &'a str,
  subject:   String,
  text:      String,
}

/// Hands messages to an HTTP mail relay.
///
/// Any non-2xx answer or transport failure is reported as `Ok(false)`; only a
/// request that cannot be built at all is an `Err`.
pub struct WebhookMailer {
  client:    reqwest::Client,
  url:       String,
  from_name: String,
}

impl WebhookMailer {
  pub fn new(
    url: impl Into<String>,
    from_name: impl Into<String>,
    timeout: Duration,
  ) -> Result<Self, Error> {
    let url = url.into();
    reqwest::Url::parse(&url)
      .map_err(|e| Error::MailConfig(format!("invalid webhook_url {url:?}: {e}")))?;
    let client = reqwest::Client::builder()
      .timeout(timeout)
      .build()
      .map_err(Error::Relay)?;
    Ok(Self { client, url, from_name: from_name.into() })
  }
}

impl Mailer for WebhookMailer {
  type Error = Error;

  async fn send(&self, message: &ReleaseMessage) -> Result<bool, Error> {
    let envelope = Envelope {
      to:        &message.recipient_email,
      to_name:   &message.recipient_name,
      from_name: &self.from_name,
      subject:   message.subject(),
      text:      render_text(message),
    };

    let response = match self.client.post(&self.url).json(&envelope).send().await {
      Ok(response) => response,
      Err(e) if e.is_builder() => return Err(Error::Relay(e)),
      Err(e) => {
        warn!(error = %e, "mail relay unreachable");
        return Ok(false);
      }
    };

    let status = response.status();
    if status.is_success() {
      Ok(true)
    } else {
      warn!(%status, "mail relay refused message");
      Ok(false)
    }
  }
}

/// Records deliveries in the log instead of sending them. Content stays out
/// of the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogMailer;

impl Mailer for LogMailer {
  type Error = Error;

  async fn send(&self, message: &ReleaseMessage) -> Result<bool, Error> {
    info!(
      to = %message.recipient_email,
      subject = %message.subject(),
      items = message.items.len(),
      obligations = message.obligations.as_ref().map_or(0, Vec::len),
      "release message logged",
    );
    Ok(true)
  }
}

/// The transport chosen by `mail.mode`.
pub enum Outbox {
  Log(LogMailer),
  Webhook(WebhookMailer),
}

impl Outbox {
  pub fn from_config(config: &MailConfig) -> Result<Self, Error> {
    match config.mode {
      MailMode::Log => Ok(Self::Log(LogMailer)),
      MailMode::Webhook => {
        let url = config.webhook_url.as_deref().ok_or_else(|| {
          Error::MailConfig("mail.webhook_url is required in webhook mode".into())
        })?;
        let timeout = Duration::from_secs(config.timeout_secs);
        Ok(Self::Webhook(WebhookMailer::new(url, config.from_name.as_str(), timeout)?))
      }
    }
  }
}

impl Mailer for Outbox {
  type Error = Error;

  async fn send(&self, message: &ReleaseMessage) -> Result<bool, Error> {
    match self {
      Self::Log(m) => m.send(message).await,
      Self::Webhook(m) => m.send(message).await,
    }
  }
}

// ─── Rendering ───────────────────────────────────────────────────────────────

const WIDTH: usize = 60;

/// Plain-text body of a release message.
pub fn render_text(message: &ReleaseMessage) -> String {
  let sender = &message.sender_display_name;
  let rule = "=".repeat(WIDTH);
  let days = message.days_overdue;
  let unit = if days == 1 { "day" } else { "days" };

  let mut lines = vec![
    format!("A MESSAGE FROM {}", sender.to_uppercase()),
    rule.clone(),
    String::new(),
    format!("Dear {},", message.recipient_name),
    String::new(),
    format!("{sender} asked that this reach you if they ever stopped checking in."),
    format!("They have not checked in for {days} {unit}. What follows is what they"),
    "wanted you to have.".to_owned(),
    String::new(),
    rule.clone(),
    "THEIR MESSAGES TO YOU".to_owned(),
    rule.clone(),
    String::new(),
  ];

  for item in &message.items {
    let fill = (WIDTH - 4).saturating_sub(item.title.chars().count());
    lines.push(format!("┌─ {} {}", item.title, "─".repeat(fill)));
    lines.push("│".to_owned());
    lines.extend(item.content.split('\n').map(|line| format!("│ {line}")));
    lines.push("│".to_owned());
    lines.push(format!("└─ {sender}"));
    lines.push(String::new());
  }

  if let Some(obligations) = message.obligations.as_deref().filter(|o| !o.is_empty()) {
    lines.extend([
      rule.clone(),
      "OUTSTANDING OBLIGATIONS".to_owned(),
      rule.clone(),
      String::new(),
      format!("{sender} wanted you to know about these financial matters."),
      String::new(),
    ]);
    for obligation in obligations {
      lines.push(format!("• {}: {}", obligation.creditor_name, amount(obligation)));
      if let Some(due) = obligation.due_date {
        lines.push(format!("  Due: {}", due.format("%Y-%m-%d")));
      }
      if let Some(details) = &obligation.description {
        lines.push(format!("  Details: {details}"));
      }
      lines.push(String::new());
    }
  }

  lines.extend([
    rule,
    String::new(),
    format!("Delivered by Vigil on behalf of {sender}."),
    String::new(),
  ]);

  lines.join("\n")
}

fn amount(obligation: &Obligation) -> String {
  match obligation.currency.as_str() {
    "USD" => format!("${}", obligation.amount_display()),
    other => format!("{} {other}", obligation.amount_display()),
  }
}
