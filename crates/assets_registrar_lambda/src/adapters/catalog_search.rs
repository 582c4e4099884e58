use assets_registrar_core::asset::AssetRecord;

/// Result kinds the catalog search can be restricted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchScope {
    Asset,
}

/// Parameters shared by every page request of one search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub domain_id: String,
    pub project_id: String,
    pub scope: SearchScope,
}

impl SearchRequest {
    pub fn assets(domain_id: impl Into<String>, project_id: impl Into<String>) -> Self {
        Self {
            domain_id: domain_id.into(),
            project_id: project_id.into(),
            scope: SearchScope::Asset,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchItem {
    Asset(AssetRecord),
    /// Any result kind other than an asset, named for diagnostics.
    Other { kind: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SearchPage {
    pub items: Vec<SearchItem>,
    pub next_token: Option<String>,
}

/// One page of a paginated catalog search. `next_token` is `None` for the
/// first page.
///
/// Pages are fetched one call at a time rather than through the SDK
/// paginator stream, so the handler can log and write each page before
/// requesting the next one and tests can script page sequences directly.
pub trait CatalogSearch {
    fn search_page(
        &self,
        request: &SearchRequest,
        next_token: Option<&str>,
    ) -> Result<SearchPage, String>;
}
