use assets_registrar_core::asset::{project_asset, AssetRecord, ProjectionError, StateStoreRecord};
use serde::{Deserialize, Serialize};

use crate::adapters::catalog_search::{CatalogSearch, SearchItem, SearchRequest};
use crate::adapters::state_store::StateStore;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistrarError {
    #[error("catalog search failed: {0}")]
    Search(String),
    #[error("catalog search returned a non-asset result item ({kind})")]
    UnexpectedItem { kind: String },
    #[error(transparent)]
    Projection(#[from] ProjectionError),
    #[error("failed to write asset {asset_id} to state store: {message}")]
    Write { asset_id: String, message: String },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RegistrarSummary {
    pub status: String,
    pub pages_processed: usize,
    pub assets_registered: usize,
}

/// Pages through every asset-scoped search result and writes each asset to
/// the state store, in page order.
///
/// The first failure aborts the run. Records written before it stay in place.
#[tracing::instrument(
    skip_all,
    fields(domain_id = %request.domain_id, project_id = %request.project_id)
)]
pub fn register_assets(
    request: &SearchRequest,
    search: &impl CatalogSearch,
    store: &impl StateStore,
) -> Result<RegistrarSummary, RegistrarError> {
    match paginate_and_register(request, search, store) {
        Ok(summary) => {
            tracing::info!(
                total_assets = summary.assets_registered,
                pages = summary.pages_processed,
                "total assets found"
            );
            Ok(summary)
        }
        Err(error) => {
            tracing::error!(error = %error, "error during pagination");
            Err(error)
        }
    }
}

fn paginate_and_register(
    request: &SearchRequest,
    search: &impl CatalogSearch,
    store: &impl StateStore,
) -> Result<RegistrarSummary, RegistrarError> {
    let mut pages_processed = 0usize;
    let mut assets_registered = 0usize;
    let mut next_token: Option<String> = None;

    loop {
        let page = search
            .search_page(request, next_token.as_deref())
            .map_err(RegistrarError::Search)?;
        pages_processed += 1;

        if page.items.is_empty() {
            tracing::warn!(
                page = pages_processed,
                results = 0,
                "no search results found in page"
            );
        } else {
            tracing::info!(
                page = pages_processed,
                results = page.items.len(),
                "found results in this page"
            );
            for item in page.items {
                let asset = match item {
                    SearchItem::Asset(asset) => asset,
                    SearchItem::Other { kind } => {
                        return Err(RegistrarError::UnexpectedItem { kind });
                    }
                };
                write_to_state_store(store, &asset)?;
                assets_registered += 1;
            }
        }

        // An empty page may still carry a token; only its absence ends the search.
        match page.next_token {
            Some(token) if !token.is_empty() => next_token = Some(token),
            _ => break,
        }
    }

    Ok(RegistrarSummary {
        status: "completed".to_string(),
        pages_processed,
        assets_registered,
    })
}

#[tracing::instrument(skip_all, fields(asset_id = %asset.identifier))]
pub fn write_to_state_store(
    store: &impl StateStore,
    asset: &AssetRecord,
) -> Result<StateStoreRecord, RegistrarError> {
    tracing::debug!(asset_name = %asset.name, "writing asset to state store");

    let result = project_asset(asset)
        .map_err(RegistrarError::from)
        .and_then(|record| {
            store
                .put_record(&record)
                .map(|()| record)
                .map_err(|message| RegistrarError::Write {
                    asset_id: asset.identifier.clone(),
                    message,
                })
        });

    match &result {
        Ok(record) => {
            tracing::info!(asset_id = %record.key(), "successfully wrote asset to state store");
        }
        Err(error) => {
            tracing::error!(error = %error, "error writing asset to state store");
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, VecDeque};
    use std::io;
    use std::sync::{Arc, Mutex};

    use chrono::{TimeZone, Utc};
    use serde_json::Value;
    use tracing_subscriber::fmt::MakeWriter;

    use super::*;
    use crate::adapters::catalog_search::SearchPage;

    struct ScriptedSearch {
        pages: Mutex<VecDeque<Result<SearchPage, String>>>,
        tokens_seen: Mutex<Vec<Option<String>>>,
    }

    impl ScriptedSearch {
        fn new(pages: Vec<Result<SearchPage, String>>) -> Self {
            Self {
                pages: Mutex::new(pages.into()),
                tokens_seen: Mutex::new(Vec::new()),
            }
        }

        fn tokens_seen(&self) -> Vec<Option<String>> {
            self.tokens_seen.lock().expect("poisoned mutex").clone()
        }
    }

    impl CatalogSearch for ScriptedSearch {
        fn search_page(
            &self,
            _request: &SearchRequest,
            next_token: Option<&str>,
        ) -> Result<SearchPage, String> {
            self.tokens_seen
                .lock()
                .expect("poisoned mutex")
                .push(next_token.map(str::to_string));
            self.pages
                .lock()
                .expect("poisoned mutex")
                .pop_front()
                .unwrap_or_else(|| Err("search called past the last page".to_string()))
        }
    }

    #[derive(Default)]
    struct MemoryStore {
        records: Mutex<BTreeMap<String, StateStoreRecord>>,
        write_order: Mutex<Vec<String>>,
        failing_key: Option<&'static str>,
    }

    impl MemoryStore {
        fn failing_on(key: &'static str) -> Self {
            Self {
                failing_key: Some(key),
                ..Self::default()
            }
        }

        fn record(&self, key: &str) -> Option<StateStoreRecord> {
            self.records.lock().expect("poisoned mutex").get(key).cloned()
        }

        fn len(&self) -> usize {
            self.records.lock().expect("poisoned mutex").len()
        }

        fn write_order(&self) -> Vec<String> {
            self.write_order.lock().expect("poisoned mutex").clone()
        }
    }

    impl StateStore for MemoryStore {
        fn put_record(&self, record: &StateStoreRecord) -> Result<(), String> {
            if self.failing_key == Some(record.key()) {
                return Err(format!("simulated throughput exceeded for {}", record.key()));
            }
            self.write_order
                .lock()
                .expect("poisoned mutex")
                .push(record.key().to_string());
            self.records
                .lock()
                .expect("poisoned mutex")
                .insert(record.key().to_string(), record.clone());
            Ok(())
        }
    }

    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl CapturedLogs {
        fn events(&self) -> Vec<Value> {
            let bytes = self.0.lock().expect("poisoned mutex").clone();
            String::from_utf8(bytes)
                .expect("logs should be utf-8")
                .lines()
                .map(|line| serde_json::from_str(line).expect("log line should be json"))
                .collect()
        }
    }

    impl io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().expect("poisoned mutex").extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for CapturedLogs {
        type Writer = CapturedLogs;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    fn asset(id: &str, name: &str) -> AssetRecord {
        AssetRecord {
            identifier: id.to_string(),
            type_identifier: "t".to_string(),
            name: name.to_string(),
            external_identifier: Some(format!("ext-{id}")),
            created_at: Some(Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap()),
            first_revision_created_at: Some(Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 6).unwrap()),
        }
    }

    fn page(ids: &[&str], next_token: Option<&str>) -> Result<SearchPage, String> {
        Ok(SearchPage {
            items: ids
                .iter()
                .map(|id| SearchItem::Asset(asset(id, &format!("name-{id}"))))
                .collect(),
            next_token: next_token.map(str::to_string),
        })
    }

    fn request() -> SearchRequest {
        SearchRequest::assets("d1", "p1")
    }

    #[test]
    fn processes_every_item_across_pages_in_order() {
        let search = ScriptedSearch::new(vec![
            page(&["a1", "a2"], Some("t1")),
            page(&[], Some("t2")),
            page(&["a3"], Some("t3")),
            page(&["a4", "a5", "a6"], None),
        ]);
        let store = MemoryStore::default();

        let summary = register_assets(&request(), &search, &store).expect("run should succeed");

        assert_eq!(summary.assets_registered, 6);
        assert_eq!(summary.pages_processed, 4);
        assert_eq!(store.write_order(), vec!["a1", "a2", "a3", "a4", "a5", "a6"]);
        assert_eq!(
            search.tokens_seen(),
            vec![
                None,
                Some("t1".to_string()),
                Some("t2".to_string()),
                Some("t3".to_string())
            ]
        );
    }

    #[test]
    fn empty_first_page_does_not_stop_pagination() {
        let search = ScriptedSearch::new(vec![page(&[], Some("t1")), page(&["a1"], None)]);
        let store = MemoryStore::default();

        let summary = register_assets(&request(), &search, &store).expect("run should succeed");

        assert_eq!(summary.assets_registered, 1);
        assert!(store.record("a1").is_some());
    }

    #[test]
    fn every_page_logs_its_result_count() {
        let search = ScriptedSearch::new(vec![
            page(&["a1", "a2"], Some("t1")),
            page(&[], Some("t2")),
            page(&["a3"], None),
        ]);
        let store = MemoryStore::default();
        let logs = CapturedLogs::default();
        let subscriber = tracing_subscriber::fmt()
            .json()
            .flatten_event(true)
            .with_writer(logs.clone())
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            register_assets(&request(), &search, &store).expect("run should succeed")
        });

        let page_counts: Vec<(u64, u64)> = logs
            .events()
            .iter()
            .filter(|event| event.get("page").is_some() && event.get("results").is_some())
            .map(|event| {
                (
                    event["page"].as_u64().expect("page should be numeric"),
                    event["results"].as_u64().expect("results should be numeric"),
                )
            })
            .collect();
        assert_eq!(page_counts, vec![(1, 2), (2, 0), (3, 1)]);

        let total = logs
            .events()
            .into_iter()
            .find(|event| event["message"] == "total assets found")
            .expect("total should be logged");
        assert_eq!(total["total_assets"], 3);
    }

    #[test]
    fn empty_token_ends_pagination() {
        let search = ScriptedSearch::new(vec![page(&["a1"], Some(""))]);
        let store = MemoryStore::default();

        let summary = register_assets(&request(), &search, &store).expect("run should succeed");
        assert_eq!(summary.pages_processed, 1);
    }

    #[test]
    fn write_failure_aborts_and_keeps_earlier_writes() {
        let search = ScriptedSearch::new(vec![
            page(&["a1", "a2", "a3"], Some("t1")),
            page(&["a4"], None),
        ]);
        let store = MemoryStore::failing_on("a2");

        let error = register_assets(&request(), &search, &store).expect_err("write should fail");

        assert!(matches!(error, RegistrarError::Write { ref asset_id, .. } if asset_id == "a2"));
        assert!(error.to_string().contains("simulated throughput exceeded"));
        assert_eq!(store.write_order(), vec!["a1"]);
        assert_eq!(search.tokens_seen().len(), 1);
    }

    #[test]
    fn search_failure_propagates() {
        let search = ScriptedSearch::new(vec![
            page(&["a1"], Some("t1")),
            Err("AccessDeniedException".to_string()),
        ]);
        let store = MemoryStore::default();

        let error = register_assets(&request(), &search, &store).expect_err("search should fail");

        assert_eq!(
            error,
            RegistrarError::Search("AccessDeniedException".to_string())
        );
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn non_asset_item_is_an_upstream_fault() {
        let search = ScriptedSearch::new(vec![Ok(SearchPage {
            items: vec![
                SearchItem::Asset(asset("a1", "n1")),
                SearchItem::Other {
                    kind: "glossaryItem".to_string(),
                },
            ],
            next_token: None,
        })]);
        let store = MemoryStore::default();

        let error = register_assets(&request(), &search, &store).expect_err("should fail");

        assert_eq!(
            error,
            RegistrarError::UnexpectedItem {
                kind: "glossaryItem".to_string()
            }
        );
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn missing_timestamp_fails_before_writing() {
        let store = MemoryStore::default();
        let mut incomplete = asset("a1", "n1");
        incomplete.first_revision_created_at = None;

        let error = write_to_state_store(&store, &incomplete).expect_err("should fail");

        assert!(matches!(error, RegistrarError::Projection(_)));
        assert_eq!(store.len(), 0);
    }

    #[test]
    fn registering_twice_is_idempotent() {
        let store = MemoryStore::default();
        let record = asset("a1", "n1");

        let first = write_to_state_store(&store, &record).expect("write should succeed");
        let second = write_to_state_store(&store, &record).expect("write should succeed");

        assert_eq!(first, second);
        assert_eq!(store.len(), 1);
        assert_eq!(store.record("a1"), Some(first));
    }

    #[test]
    fn later_registration_overwrites_earlier_one() {
        let store = MemoryStore::default();

        write_to_state_store(&store, &asset("a1", "before")).expect("write should succeed");
        write_to_state_store(&store, &asset("a1", "after")).expect("write should succeed");

        assert_eq!(store.len(), 1);
        assert_eq!(
            store.record("a1").map(|record| record.asset_name),
            Some("after".to_string())
        );
    }
}
