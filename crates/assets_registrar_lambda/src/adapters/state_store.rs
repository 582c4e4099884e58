use assets_registrar_core::asset::StateStoreRecord;

/// Insert-or-replace of a single record keyed by its asset identifier.
pub trait StateStore {
    fn put_record(&self, record: &StateStoreRecord) -> Result<(), String>;
}
