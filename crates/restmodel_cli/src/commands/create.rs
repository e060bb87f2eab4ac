//! Create command implementation.

use super::{model_json, parse_data, CommandResult, Context};
use restmodel_core::SyncOptions;
use serde_json::Value;
use tracing::info;

/// Creates an entity from a JSON object and returns the stored attributes.
pub async fn run(ctx: &Context, data: &str) -> CommandResult<Value> {
    let attributes = parse_data(data)?;
    let model = ctx.new_model();
    for (key, value) in attributes {
        model.set(key, value);
    }
    model.save(SyncOptions::default()).await?;

    if let Some(id) = model.id() {
        info!(%id, resource = model.resource().name(), "created");
    }
    Ok(model_json(&model))
}
