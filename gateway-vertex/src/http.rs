use gateway_core::{GatewayError, ModelDescriptor, Result};
use reqwest::{Client, Response};
use serde::Serialize;
use serde_json::Value;

/// `{base}/v1/projects/…/models/{id}:{method}`
pub(crate) fn model_method_url(
    api_base: &str,
    descriptor: &ModelDescriptor,
    project_id: &str,
    method: &str,
) -> String {
    format!("{api_base}/v1/{}:{method}", descriptor.resource_path(project_id))
}

async fn check_response(response: Response) -> Result<Response> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(GatewayError::upstream(status.as_u16(), body));
    }
    Ok(response)
}

/// POST a JSON body with a bearer token and decode the JSON reply.
pub(crate) async fn post_json<B: Serialize + ?Sized>(
    http: &Client,
    url: &str,
    token: &str,
    body: &B,
) -> Result<Value> {
    let response = http
        .post(url)
        .bearer_auth(token)
        .json(body)
        .send()
        .await
        .map_err(|e| GatewayError::request(format!("failed to perform request to '{url}': {e}")))?;

    let response = check_response(response).await?;
    response
        .json::<Value>()
        .await
        .map_err(|e| GatewayError::request(format!("failed to decode response from '{url}': {e}")))
}
