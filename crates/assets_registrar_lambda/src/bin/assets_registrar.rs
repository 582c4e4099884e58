use std::sync::Arc;

use assets_registrar_core::config::{observability_from_lookup, Config};
use assets_registrar_lambda::adapters::datazone::DataZoneCatalogSearch;
use assets_registrar_lambda::adapters::dynamodb::DynamoDbStateStore;
use assets_registrar_lambda::context::RegistrarContext;
use assets_registrar_lambda::handlers::registrar::RegistrarSummary;
use assets_registrar_lambda::telemetry;
use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde_json::Value;

type Context = RegistrarContext<DataZoneCatalogSearch, DynamoDbStateStore>;

async fn handle_request(
    context: &Context,
    event: LambdaEvent<Value>,
) -> Result<RegistrarSummary, Error> {
    tracing::debug!(request_id = %event.context.request_id, "invocation received");
    context.handle_invocation().map_err(Error::from)
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    let (log_level, tracer_disabled) =
        observability_from_lookup(&|key: &str| std::env::var(key).ok())?;
    telemetry::init(log_level, tracer_disabled)?;

    let config = Config::from_env()?;
    tracing::info!(
        table_reference = %config.state_store_table.reference,
        table_name = %config.state_store_table.table_name,
        "resolved state store table"
    );

    let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let search = DataZoneCatalogSearch::new(aws_sdk_datazone::Client::new(&aws_config));
    let store = DynamoDbStateStore::new(
        aws_sdk_dynamodb::Client::new(&aws_config),
        config.state_store_table.table_name.clone(),
    );
    let context = Arc::new(RegistrarContext::new(config, search, store));

    lambda_runtime::run(service_fn(move |event: LambdaEvent<Value>| {
        let context = context.clone();
        async move { handle_request(&context, event).await }
    }))
    .await
}
