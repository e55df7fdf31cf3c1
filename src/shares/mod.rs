//! Share entity lifecycle: creation, metadata lookup, guarded decryption
//! with view accounting, deletion, and expiry sweep.

pub mod blobs;
pub mod store;

pub use store::{
    create_file_share, create_text_share, delete_share, get_metadata, sweep_expired, view_share,
    view_url, CreateFileShare, CreateTextShare, CreatedShare, ShareContent,
};
