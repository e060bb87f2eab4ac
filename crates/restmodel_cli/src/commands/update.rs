//! Update command implementation.

use super::{model_json, parse_data, CommandResult, Context};
use restmodel_core::SyncOptions;
use serde_json::Value;

/// Applies a JSON object to an entity and saves it.
///
/// The entity is loaded first so the PUT carries the full record, unless
/// `replace` is set.
pub async fn run(ctx: &Context, id: &str, data: &str, replace: bool) -> CommandResult<Value> {
    let patch = parse_data(data)?;
    let model = ctx.model(id);
    if !replace {
        model.load(SyncOptions::default()).await?;
    }
    for (key, value) in patch {
        model.set(key, value);
    }
    model.save(SyncOptions::default()).await?;
    Ok(model_json(&model))
}
