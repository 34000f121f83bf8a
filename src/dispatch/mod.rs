//! 定时发送模块：基于批处理执行器发送到期的营销邮件并回写状态。
//!
//! # Scheduled Dispatch Module
//!
//! The periodic processor of the campaign application: pick pending emails
//! whose send time has arrived, deliver them through an [`EmailSender`] using
//! the [`BatchRunner`](crate::batch::BatchRunner), and record the outcome as
//! one of three stored statuses.
//!
//! | Status | Stored as | Meaning |
//! |--------|-----------|---------|
//! | [`DeliveryStatus::Pending`] | `pendente` | Waiting for its send time |
//! | [`DeliveryStatus::Sent`] | `enviado` | Accepted by the provider |
//! | [`DeliveryStatus::Failed`] | `erro` | Provider call failed |
//!
//! Retrying is a manual reset from `erro` back to `pendente`
//! ([`retry_failed`]); there is no automatic backoff. Emails the provider
//! refused outright stay in `erro`.

mod dispatcher;
mod email;
mod sender;

pub use dispatcher::{retry_failed, DispatchReport, Dispatcher};
pub use email::{DeliveryStatus, ScheduledEmail};
pub use sender::{DryRunSender, EmailSender, SendError};
