use std::collections::HashMap;

use assets_registrar_core::asset::StateStoreRecord;
use aws_sdk_dynamodb::error::DisplayErrorContext;
use aws_sdk_dynamodb::types::AttributeValue;

use crate::adapters::state_store::StateStore;

/// State store backed by a DynamoDB table keyed on `AssetId`.
#[derive(Debug, Clone)]
pub struct DynamoDbStateStore {
    table_name: String,
    client: aws_sdk_dynamodb::Client,
}

impl DynamoDbStateStore {
    pub fn new(client: aws_sdk_dynamodb::Client, table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            client,
        }
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }
}

impl StateStore for DynamoDbStateStore {
    fn put_record(&self, record: &StateStoreRecord) -> Result<(), String> {
        let item = record_to_item(record)?;
        let client = self.client.clone();
        let table_name = self.table_name.clone();

        // No condition expression: an existing item under the same key is
        // replaced whole.
        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                client
                    .put_item()
                    .table_name(table_name)
                    .set_item(Some(item))
                    .send()
                    .await
                    .map(|_| ())
                    .map_err(|error| {
                        format!("dynamodb put_item failed: {}", DisplayErrorContext(&error))
                    })
            })
        })
    }
}

pub fn record_to_item(
    record: &StateStoreRecord,
) -> Result<HashMap<String, AttributeValue>, String> {
    serde_dynamo::to_item(record)
        .map_err(|error| format!("failed to convert state store record: {error}"))
}
