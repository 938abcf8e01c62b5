pub mod client;
pub mod valkey;

pub use client::CacheClient;
pub use valkey::ValkeyClient;
