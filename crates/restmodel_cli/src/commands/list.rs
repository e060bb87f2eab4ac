//! List command implementation.

use super::{model_json, parse_query, CommandResult, Context};
use restmodel_core::Collection;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// Loads a collection and returns every member's attributes.
///
/// `endpoint` overrides the resource root for nested listings.
pub async fn run(ctx: &Context, endpoint: Option<&str>, query: &[String]) -> CommandResult<Value> {
    let mut builder = Collection::builder()
        .resource(Arc::clone(&ctx.resource))
        .client(Arc::clone(&ctx.client));
    if let Some(endpoint) = endpoint {
        builder = builder.endpoint(endpoint);
    }
    let collection = builder.build()?;

    let pairs = query
        .iter()
        .map(|raw| parse_query(raw))
        .collect::<Result<Vec<_>, _>>()?;
    collection.query(pairs);

    debug!(
        endpoint = %collection.endpoint(),
        query = %collection.query_string(),
        "listing collection"
    );
    collection.load().await?;

    Ok(Value::Array(
        collection.models().iter().map(model_json).collect(),
    ))
}
