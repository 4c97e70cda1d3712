//! Monitoring event exposure (3GPP TS 29.122 MonitoringEvent API).
//!
//! A POST resolves the UE, answers with an immediate report built from the
//! current snapshot and, unless only one report was asked for, keeps a
//! [`NotificationRelay`] running that forwards later core network updates
//! to the AF's notification destination.

pub mod error;
pub mod handlers;
pub mod relay;
pub mod report;
pub mod service;
pub mod subscription;

pub use error::{MonitoringError, MonitoringResult, ReportError};
pub use relay::{NotificationRelay, RelayState};
pub use report::{RelayTarget, ReportDispatch, core_network_channel, immediate_report};
pub use service::{CreatedSubscription, SubscriptionService};
pub use subscription::SubscriptionContext;
