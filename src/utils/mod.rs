//! Utilities shared by the binary and the server.

pub mod bootstrap;
pub mod image;

pub use bootstrap::ensure_bundle;
pub use self::image::{black_probe_payload, encode_jpeg, encode_payload, load_image};
