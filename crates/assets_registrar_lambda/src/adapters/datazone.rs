use assets_registrar_core::asset::{timestamp_from_epoch, AssetRecord, ProjectionError};
use aws_sdk_datazone::error::DisplayErrorContext;
use aws_sdk_datazone::primitives::DateTime;
use aws_sdk_datazone::types::{AssetItem, InventorySearchScope, SearchInventoryResultItem};

use crate::adapters::catalog_search::{
    CatalogSearch, SearchItem, SearchPage, SearchRequest, SearchScope,
};

/// Catalog search backed by the DataZone `Search` API.
#[derive(Debug, Clone)]
pub struct DataZoneCatalogSearch {
    client: aws_sdk_datazone::Client,
}

impl DataZoneCatalogSearch {
    pub fn new(client: aws_sdk_datazone::Client) -> Self {
        Self { client }
    }
}

impl CatalogSearch for DataZoneCatalogSearch {
    fn search_page(
        &self,
        request: &SearchRequest,
        next_token: Option<&str>,
    ) -> Result<SearchPage, String> {
        let client = self.client.clone();
        let domain_id = request.domain_id.clone();
        let project_id = request.project_id.clone();
        let scope = inventory_scope(request.scope);
        let next_token = next_token.map(str::to_string);

        let output = tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                client
                    .search()
                    .domain_identifier(domain_id)
                    .owning_project_identifier(project_id)
                    .search_scope(scope)
                    .set_next_token(next_token)
                    .send()
                    .await
                    .map_err(|error| {
                        format!("datazone search failed: {}", DisplayErrorContext(&error))
                    })
            })
        })?;

        let items = output
            .items()
            .iter()
            .map(search_item_from_sdk)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|error| format!("malformed search result: {error}"))?;

        Ok(SearchPage {
            items,
            next_token: output.next_token().map(str::to_string),
        })
    }
}

fn inventory_scope(scope: SearchScope) -> InventorySearchScope {
    match scope {
        SearchScope::Asset => InventorySearchScope::Asset,
    }
}

fn search_item_from_sdk(
    item: &SearchInventoryResultItem,
) -> Result<SearchItem, ProjectionError> {
    let kind = match item {
        SearchInventoryResultItem::AssetItem(asset) => {
            return asset_record_from_sdk(asset).map(SearchItem::Asset);
        }
        SearchInventoryResultItem::DataProductItem(_) => "dataProductItem",
        SearchInventoryResultItem::GlossaryItem(_) => "glossaryItem",
        SearchInventoryResultItem::GlossaryTermItem(_) => "glossaryTermItem",
        _ => "unknown",
    };
    Ok(SearchItem::Other {
        kind: kind.to_string(),
    })
}

pub fn asset_record_from_sdk(asset: &AssetItem) -> Result<AssetRecord, ProjectionError> {
    let identifier = asset.identifier();
    let convert = |field: &'static str, value: Option<&DateTime>| {
        value
            .map(|timestamp| {
                timestamp_from_epoch(
                    identifier,
                    field,
                    timestamp.secs(),
                    timestamp.subsec_nanos(),
                )
            })
            .transpose()
    };

    Ok(AssetRecord {
        identifier: identifier.to_string(),
        type_identifier: asset.type_identifier().to_string(),
        name: asset.name().to_string(),
        external_identifier: asset.external_identifier().map(str::to_string),
        created_at: convert("createdAt", asset.created_at())?,
        first_revision_created_at: convert(
            "firstRevisionCreatedAt",
            asset.first_revision_created_at(),
        )?,
    })
}
