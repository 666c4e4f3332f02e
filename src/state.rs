use std::sync::Arc;

use crate::auth::Credentials;
use crate::github::GithubClient;
use crate::service::post::PostService;
use crate::service::profile::ProfileService;
use crate::store::Stores;

/// Shared handles installed on the router as an `Extension`.
#[derive(Clone)]
pub struct AppState {
    pub stores: Stores,
    pub credentials: Arc<Credentials>,
    pub github: Arc<GithubClient>,
}

impl AppState {
    pub fn new(stores: Stores, credentials: Credentials, github: GithubClient) -> Self {
        Self {
            stores,
            credentials: Arc::new(credentials),
            github: Arc::new(github),
        }
    }

    pub fn profiles(&self) -> ProfileService {
        ProfileService::new(self.stores.clone())
    }

    pub fn posts(&self) -> PostService {
        PostService::new(self.stores.clone())
    }
}
