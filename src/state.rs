use std::sync::Arc;

use crate::{config::Config, services::session::SessionManager, store::UserStore};

/// Shared handles constructed once at startup and passed in as state;
/// nothing in the crate reaches for globals.
#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<SessionManager>,
    pub store: Arc<dyn UserStore>,
    pub config: Config,
}

impl AppState {
    pub fn new(sessions: Arc<SessionManager>, store: Arc<dyn UserStore>, config: Config) -> Self {
        Self {
            sessions,
            store,
            config,
        }
    }

    pub fn cookie_options(&self) -> crate::utils::cookies::CookieOptions {
        crate::utils::cookies::CookieOptions {
            secure: self.config.cookie_secure,
        }
    }
}
