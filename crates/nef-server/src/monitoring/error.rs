//! Monitoring event error types.

use std::fmt;

use nef_api::ApiError;
use nef_api::monitoring::MonitoringType;
use nef_core::CoreError;

use crate::connectors::ConnectorError;
use crate::registry::RegistryError;

/// Result type for monitoring event operations.
pub type MonitoringResult<T> = Result<T, MonitoringError>;

/// Errors that can occur while building a report.
#[derive(Debug)]
pub enum ReportError {
    /// No report can be built for this monitoring type
    Unsupported(MonitoringType),

    /// Core network payload could not be decoded
    Malformed(CoreError),

    /// Payload decoded but a required attribute is absent
    MissingField(&'static str),
}

impl fmt::Display for ReportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unsupported(t) => write!(f, "monitoring event type {t:?} is not supported"),
            Self::Malformed(e) => write!(f, "malformed core network event data: {e}"),
            Self::MissingField(field) => {
                write!(f, "malformed core network event data: missing {field}")
            }
        }
    }
}

impl std::error::Error for ReportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Malformed(e) => Some(e),
            _ => None,
        }
    }
}

impl From<CoreError> for ReportError {
    fn from(e: CoreError) -> Self {
        Self::Malformed(e)
    }
}

/// Errors returned by the monitoring event service.
#[derive(Debug)]
pub enum MonitoringError {
    /// None of supi, externalId or externalGroupId was given
    MissingIdentifier,

    /// Group subscriptions are not handled
    GroupNotSupported,

    /// External identifier could not be resolved
    IdentityResolution(ConnectorError),

    /// UE snapshot could not be fetched
    Snapshot(ConnectorError),

    /// Immediate report could not be built
    ImmediateReport(ReportError),

    /// Payload rejected when creating the subscription context
    InvalidSubscription,

    /// Monitoring type has no core network channel
    UnsupportedMonitoringType(MonitoringType),

    /// Listener on the core network channel could not be opened
    Listener(ConnectorError),

    /// Relay could not be started or stopped
    Relay(String),

    /// Unknown AF or subscription
    NotFound(String),

    /// Registry rejected a mutation
    Registry(RegistryError),

    /// Operation not offered by this gateway
    NotImplemented(&'static str),
}

impl fmt::Display for MonitoringError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingIdentifier => {
                write!(f, "one of supi, externalId or externalGroupId is required")
            }
            Self::GroupNotSupported => write!(f, "group based subscriptions are not supported"),
            Self::IdentityResolution(e) => write!(f, "could not resolve external identifier: {e}"),
            Self::Snapshot(e) => write!(f, "could not fetch UE state: {e}"),
            Self::ImmediateReport(e) => write!(f, "could not build immediate report: {e}"),
            Self::InvalidSubscription => write!(
                f,
                "subscription requires notificationDestination and monitoringType"
            ),
            Self::UnsupportedMonitoringType(t) => {
                write!(f, "monitoring type {t:?} is not supported")
            }
            Self::Listener(e) => write!(f, "could not listen for core network events: {e}"),
            Self::Relay(msg) => write!(f, "notification relay error: {msg}"),
            Self::NotFound(msg) => write!(f, "{msg}"),
            Self::Registry(e) => write!(f, "registry error: {e}"),
            Self::NotImplemented(op) => write!(f, "{op} is not implemented"),
        }
    }
}

impl std::error::Error for MonitoringError {}

impl From<RegistryError> for MonitoringError {
    fn from(e: RegistryError) -> Self {
        Self::Registry(e)
    }
}

impl From<MonitoringError> for ApiError {
    fn from(e: MonitoringError) -> Self {
        let detail = e.to_string();
        match e {
            MonitoringError::MissingIdentifier | MonitoringError::InvalidSubscription => {
                ApiError::bad_request(detail)
            }
            MonitoringError::IdentityResolution(ConnectorError::NotFound(_))
            | MonitoringError::NotFound(_) => ApiError::not_found(detail),
            MonitoringError::GroupNotSupported
            | MonitoringError::UnsupportedMonitoringType(_)
            | MonitoringError::NotImplemented(_) => ApiError::not_implemented(detail),
            MonitoringError::Snapshot(_)
            | MonitoringError::ImmediateReport(_)
            | MonitoringError::IdentityResolution(_)
            | MonitoringError::Listener(_)
            | MonitoringError::Relay(_)
            | MonitoringError::Registry(_) => ApiError::internal(detail),
        }
    }
}
