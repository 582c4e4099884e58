use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Partition key attribute of the state store table.
pub const STATE_STORE_KEY_ATTRIBUTE: &str = "AssetId";

/// Asset metadata as returned by the catalog search, reduced to the fields
/// the registrar consults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AssetRecord {
    pub identifier: String,
    pub type_identifier: String,
    pub name: String,
    pub external_identifier: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub first_revision_created_at: Option<DateTime<Utc>>,
}

/// Flattened projection of an [`AssetRecord`] as persisted in the state store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct StateStoreRecord {
    pub asset_id: String,
    pub asset_type: String,
    pub asset_name: String,
    pub external_identifier: String,
    pub creation_date: String,
    pub first_revision_created_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProjectionError {
    #[error("asset {asset_id} is missing required field '{field}'")]
    MissingField {
        asset_id: String,
        field: &'static str,
    },
    #[error("asset {asset_id} has an out of range timestamp in '{field}'")]
    InvalidTimestamp {
        asset_id: String,
        field: &'static str,
    },
}

impl StateStoreRecord {
    pub fn key(&self) -> &str {
        &self.asset_id
    }
}

impl TryFrom<&AssetRecord> for StateStoreRecord {
    type Error = ProjectionError;

    fn try_from(asset: &AssetRecord) -> Result<Self, Self::Error> {
        project_asset(asset)
    }
}

/// Projects a catalog asset onto the state store shape.
///
/// The external identifier and both timestamps are optional upstream but
/// required in the stored record; a missing value is a projection fault.
pub fn project_asset(asset: &AssetRecord) -> Result<StateStoreRecord, ProjectionError> {
    let missing = |field: &'static str| ProjectionError::MissingField {
        asset_id: asset.identifier.clone(),
        field,
    };

    let external_identifier = asset
        .external_identifier
        .clone()
        .ok_or_else(|| missing("externalIdentifier"))?;
    let created_at = asset.created_at.ok_or_else(|| missing("createdAt"))?;
    let first_revision_created_at = asset
        .first_revision_created_at
        .ok_or_else(|| missing("firstRevisionCreatedAt"))?;

    Ok(StateStoreRecord {
        asset_id: asset.identifier.clone(),
        asset_type: asset.type_identifier.clone(),
        asset_name: asset.name.clone(),
        external_identifier,
        creation_date: render_timestamp(&created_at),
        first_revision_created_at: render_timestamp(&first_revision_created_at),
    })
}

/// RFC 3339 in UTC with an explicit `+00:00` offset. Sub-second precision is
/// always six digits (truncated to microseconds) and omitted when the
/// microsecond part is zero, so rows written by other producers of the same
/// table compare equal.
pub fn render_timestamp(timestamp: &DateTime<Utc>) -> String {
    let format = if timestamp.timestamp_subsec_micros() == 0 {
        SecondsFormat::Secs
    } else {
        SecondsFormat::Micros
    };
    timestamp.to_rfc3339_opts(format, false)
}

/// Converts epoch seconds plus sub-second nanos, the shape SDK timestamps
/// expose, into a UTC timestamp.
pub fn timestamp_from_epoch(
    asset_id: &str,
    field: &'static str,
    secs: i64,
    subsec_nanos: u32,
) -> Result<DateTime<Utc>, ProjectionError> {
    DateTime::<Utc>::from_timestamp(secs, subsec_nanos).ok_or_else(|| {
        ProjectionError::InvalidTimestamp {
            asset_id: asset_id.to_string(),
            field,
        }
    })
}
