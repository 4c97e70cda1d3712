//! AS session with QoS exposure (3GPP TS 29.122 AsSessionWithQoS API).

pub mod error;
pub mod handlers;
pub mod service;

pub use error::{QosError, QosResult};
pub use service::{QosReference, QosService, QosSessionRecord};
