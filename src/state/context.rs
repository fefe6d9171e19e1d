//! Application context
//!
//! Everything a request handler needs, shared immutably behind `Arc`s.

use std::sync::Arc;

use crate::config::Settings;
use crate::i18n::I18n;
use crate::services::ServiceFactory;
use crate::state::guard::ActionGuard;
use crate::utils::errors::Result;

/// Application-wide context containing services and settings
#[derive(Debug, Clone)]
pub struct AppContext {
    pub settings: Arc<Settings>,
    pub services: Arc<ServiceFactory>,
    pub i18n: Arc<I18n>,
    /// In-flight registration changes, keyed by action and caller
    pub actions: ActionGuard,
}

impl AppContext {
    /// Create a new AppContext from parts
    pub fn new(settings: Settings, services: ServiceFactory, i18n: I18n) -> Self {
        Self {
            settings: Arc::new(settings),
            services: Arc::new(services),
            i18n: Arc::new(i18n),
            actions: ActionGuard::new(),
        }
    }

    /// Build services and load translations from settings
    pub async fn from_settings(settings: Settings) -> Result<Self> {
        let services = ServiceFactory::new(&settings)?;

        let mut i18n = I18n::with_builtin(&settings.i18n)?;
        i18n.load_translations().await?;

        Ok(Self::new(settings, services, i18n))
    }
}
