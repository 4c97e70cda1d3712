pub mod error;
pub mod id;
pub mod time;
pub mod types;
pub mod ue_state;

pub use error::{CoreError, Result};
pub use id::generate_id;
pub use time::{age_seconds, from_unix, now_utc};
pub use types::{
    DlDataDeliveryStatus, GeographicArea, GeographicalCoordinates, Ncgi, NrLocation, PlmnId,
    Snssai, SupportedGadShape, Tai, UserLocation,
};
pub use ue_state::{
    ConnectivityRecord, CoreNetworkEvent, DownlinkDeliveryRecord, LocationRecord, LossOfConnectivityRecord,
    PduSessionEstablishment, PduSessionRelease, RegistrationRecord, RmInfo, UeState,
    UeStateUpdate, snapshot_key,
};
