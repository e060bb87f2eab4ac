//! Delete command implementation.

use super::{CommandResult, Context};
use restmodel_core::SyncOptions;
use serde_json::{json, Value};

/// Deletes an entity.
pub async fn run(ctx: &Context, id: &str) -> CommandResult<Value> {
    let model = ctx.model(id);
    let target = model.id().map(|id| id.to_value()).unwrap_or(Value::Null);
    model.delete(SyncOptions::default()).await?;
    Ok(json!({ "deleted": target }))
}
