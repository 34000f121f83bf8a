//! Scheduled email records.

use serde::{Deserialize, Serialize};

/// Delivery state as stored by the campaign application.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeliveryStatus {
    #[default]
    #[serde(rename = "pendente")]
    Pending,
    #[serde(rename = "enviado")]
    Sent,
    #[serde(rename = "erro")]
    Failed,
}

impl DeliveryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryStatus::Pending => "pendente",
            DeliveryStatus::Sent => "enviado",
            DeliveryStatus::Failed => "erro",
        }
    }
}

impl std::fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledEmail {
    pub id: String,
    pub to: String,
    pub subject: String,
    #[serde(default)]
    pub html: String,
    /// Unix seconds. `None` means send on the next pass.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduled_at: Option<u64>,
    #[serde(default)]
    pub status: DeliveryStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_message_id: Option<String>,
    /// Set when the provider refused the message outright; such emails are
    /// not put back in the queue by [`retry_failed`](super::retry_failed).
    #[serde(default, skip_serializing_if = "is_false")]
    pub permanent_failure: bool,
}

fn is_false(b: &bool) -> bool {
    !*b
}

impl ScheduledEmail {
    pub fn new(id: impl Into<String>, to: impl Into<String>, subject: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            to: to.into(),
            subject: subject.into(),
            html: String::new(),
            scheduled_at: None,
            status: DeliveryStatus::Pending,
            last_error: None,
            provider_message_id: None,
            permanent_failure: false,
        }
    }
    pub fn with_html(mut self, html: impl Into<String>) -> Self {
        self.html = html.into();
        self
    }
    pub fn scheduled_at(mut self, unix_secs: u64) -> Self {
        self.scheduled_at = Some(unix_secs);
        self
    }

    pub fn is_due(&self, now: u64) -> bool {
        self.scheduled_at.map_or(true, |at| at <= now)
    }

    pub fn is_pending(&self) -> bool {
        self.status == DeliveryStatus::Pending
    }

    pub(crate) fn mark_sent(&mut self, message_id: String) {
        self.status = DeliveryStatus::Sent;
        self.provider_message_id = Some(message_id);
        self.last_error = None;
        self.permanent_failure = false;
    }

    pub(crate) fn mark_failed(&mut self, error: String, permanent: bool) {
        self.status = DeliveryStatus::Failed;
        self.last_error = Some(error);
        self.permanent_failure = permanent;
    }
}
