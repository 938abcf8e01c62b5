pub mod appwrite;
pub mod cached;
pub mod factory;
pub mod verifier;

pub use appwrite::AppwriteTokenService;
pub use cached::CachingVerifier;
pub use factory::build_token_verifier;
pub use verifier::TokenVerifier;
