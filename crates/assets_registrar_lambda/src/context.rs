use assets_registrar_core::config::Config;

use crate::adapters::catalog_search::{CatalogSearch, SearchRequest};
use crate::adapters::state_store::StateStore;
use crate::handlers::registrar::{register_assets, RegistrarError, RegistrarSummary};

/// Process-wide state: resolved configuration and client handles. Built once
/// at cold start and shared by every invocation the process serves.
#[derive(Debug, Clone)]
pub struct RegistrarContext<S, W> {
    pub config: Config,
    pub search: S,
    pub store: W,
}

impl<S, W> RegistrarContext<S, W>
where
    S: CatalogSearch,
    W: StateStore,
{
    pub fn new(config: Config, search: S, store: W) -> Self {
        Self {
            config,
            search,
            store,
        }
    }

    pub fn search_request(&self) -> SearchRequest {
        SearchRequest::assets(&self.config.domain_id, &self.config.project_id)
    }

    /// Runs one registration pass. The trigger payload is not consulted.
    pub fn handle_invocation(&self) -> Result<RegistrarSummary, RegistrarError> {
        tracing::info!(
            domain_id = %self.config.domain_id,
            project_id = %self.config.project_id,
            table_name = %self.config.state_store_table.table_name,
            "starting asset registration"
        );
        register_assets(&self.search_request(), &self.search, &self.store)
    }
}
