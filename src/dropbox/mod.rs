//! Drop-box protocol: single-use inbound upload links that mint a
//! password-protected share on the requester's behalf.

pub mod store;

pub use store::{
    create_request, fulfill, get_request, sweep_expired, CreatedRequest, UploadPayload,
};
