// Platform-specific implementations behind the domain traits

#[cfg(feature = "bundle")]
pub mod bundle;
pub mod openssl;
