// OpenSSL-backed platform trust primitives

mod server_trust;

pub use server_trust::*;
