pub mod error;
pub mod pinning;
pub mod policy;
pub mod types;
pub mod verify;
