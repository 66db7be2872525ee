use anyhow::Result;
use gateway_core::ModelResolver;
use serde_json::json;

/// Print the resolved descriptor and backend family of `model` as JSON.
pub fn run_resolve(model: &str) -> Result<()> {
    let descriptor = ModelResolver::new().resolve(model);
    let output = json!({
        "requestedId": descriptor.requested_id,
        "resolvedId": descriptor.resolved_id,
        "region": descriptor.region,
        "family": descriptor.family(),
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
