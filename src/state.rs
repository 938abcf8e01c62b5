/*
 * Responsibility
 * - Router に紐づける共有コンテキスト (AppState)
 *   - users: UserRepo, verifier: TokenVerifier, locations: LocationHub
 * - Clone 前提で持つ (内部は Arc/Clone cheap)
 */
use std::sync::Arc;

use crate::repos::UserRepo;
use crate::services::{auth::TokenVerifier, realtime::LocationHub};

#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserRepo>,
    pub verifier: Arc<dyn TokenVerifier>,
    pub locations: LocationHub,
}

impl AppState {
    pub fn new(
        users: Arc<dyn UserRepo>,
        verifier: Arc<dyn TokenVerifier>,
        locations: LocationHub,
    ) -> Self {
        Self {
            users,
            verifier,
            locations,
        }
    }
}

#[cfg(test)]
impl AppState {
    pub fn for_tests(
        users: crate::repos::user_repo::memory::MemoryUserRepo,
        verifier: Arc<dyn TokenVerifier>,
    ) -> Self {
        Self::new(Arc::new(users), verifier, LocationHub::new(16))
    }
}
