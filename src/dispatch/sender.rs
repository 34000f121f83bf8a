//! Provider seam for sending a single email.

use super::email::ScheduledEmail;
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use thiserror::Error;
use tracing::info;

/// Provider failure. The text before the first `:` of the rendered message
/// is the category used by run summaries.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SendError {
    #[error("NetworkError: {0}")]
    Network(String),

    #[error("RateLimited: {0}")]
    RateLimited(String),

    #[error("Rejected: {0}")]
    Rejected(String),

    #[error("Provider: HTTP {status}: {message}")]
    Provider { status: u16, message: String },
}

impl SendError {
    /// Whether resetting the email to pending is likely to help.
    pub fn is_transient(&self) -> bool {
        match self {
            SendError::Network(_) | SendError::RateLimited(_) => true,
            SendError::Rejected(_) => false,
            SendError::Provider { status, .. } => *status >= 500,
        }
    }
}

/// Something that can deliver one email (SMTP relay, Resend API, ...).
#[async_trait]
pub trait EmailSender: Send + Sync {
    /// Deliver `email`, returning the provider's message id.
    async fn send(&self, email: &ScheduledEmail) -> Result<String, SendError>;
}

/// Sender that only logs. Recipients registered with
/// [`DryRunSender::reject`] fail with [`SendError::Rejected`].
#[derive(Debug, Default)]
pub struct DryRunSender {
    rejected: HashSet<String>,
    sent: AtomicUsize,
}

impl DryRunSender {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reject(mut self, recipient: impl Into<String>) -> Self {
        self.rejected.insert(recipient.into());
        self
    }

    pub fn sent_count(&self) -> usize {
        self.sent.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl EmailSender for DryRunSender {
    async fn send(&self, email: &ScheduledEmail) -> Result<String, SendError> {
        if self.rejected.contains(&email.to) {
            return Err(SendError::Rejected(format!("recipient {} refused", email.to)));
        }
        let n = self.sent.fetch_add(1, Ordering::Relaxed) + 1;
        info!(id = %email.id, to = %email.to, subject = %email.subject, "dry-run send");
        Ok(format!("dry-run-{}-{}", email.id, n))
    }
}
