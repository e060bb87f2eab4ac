//! Get command implementation.

use super::{model_json, CommandResult, Context};
use restmodel_core::SyncOptions;
use serde_json::Value;

/// Loads one entity and returns its attributes.
pub async fn run(ctx: &Context, id: &str) -> CommandResult<Value> {
    let model = ctx.model(id);
    model.load(SyncOptions::default()).await?;
    Ok(model_json(&model))
}
