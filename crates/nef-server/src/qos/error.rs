use nef_api::ApiError;

use crate::connectors::ConnectorError;
use crate::registry::RegistryError;

pub type QosResult<T> = Result<T, QosError>;

#[derive(Debug, thiserror::Error)]
pub enum QosError {
    /// Mandatory attribute missing or empty
    #[error("{0}")]
    Validation(&'static str),

    #[error("invalid QoS reference")]
    UnknownQosReference(String),

    #[error("group based QoS sessions are not supported")]
    GroupNotSupported,

    #[error("not in the single or multiple UE cases")]
    NoTargetUe,

    #[error("could not create policy authorization context: {0}")]
    PolicyCreate(ConnectorError),

    #[error("could not remove policy authorization context: {0}")]
    PolicyDelete(ConnectorError),

    #[error("could not store the QoS session")]
    Storage,

    /// The task running the create did not finish
    #[error("QoS session request aborted: {0}")]
    Aborted(String),

    #[error("{0}")]
    NotFound(String),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("{0} is not implemented")]
    NotImplemented(&'static str),
}

impl From<QosError> for ApiError {
    fn from(e: QosError) -> Self {
        let detail = e.to_string();
        match e {
            QosError::Validation(_) | QosError::UnknownQosReference(_) => {
                ApiError::bad_request(detail)
            }
            QosError::NotFound(_) => ApiError::not_found(detail),
            QosError::GroupNotSupported | QosError::NoTargetUe | QosError::NotImplemented(_) => {
                ApiError::not_implemented(detail)
            }
            QosError::PolicyCreate(_)
            | QosError::PolicyDelete(_)
            | QosError::Storage
            | QosError::Aborted(_)
            | QosError::Registry(_) => ApiError::internal(detail),
        }
    }
}
