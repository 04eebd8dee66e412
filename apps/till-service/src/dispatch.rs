//! # Command Dispatcher
//!
//! JSON-lines protocol: one request per input line, one response per
//! output line, in order.
//!
//! ## Wire Format
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Request   {"id": 7, "command": "record_sale",                          │
//! │             "args": {"productId": 1, "quantity": 3}}                    │
//! │                                                                         │
//! │  Success   {"id": 7, "ok": true, "data": {...}}                         │
//! │                                                                         │
//! │  Failure   {"id": 7, "ok": false,                                       │
//! │             "error": {"code": "NOT_FOUND", "status": 404,               │
//! │                       "message": "...", "retryable": false}}            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `id` is echoed verbatim and may be any JSON value. A line that is not
//! valid JSON gets an `INVALID_INPUT` response with a `null` id. Blank
//! lines are ignored.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Instant;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, info_span, Instrument};
use uuid::Uuid;

use crate::commands::{health, product, sale, settings};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Commands that never write. Only these may report a retryable error.
const READ_ONLY_COMMANDS: &[&str] = &[
    "list_products",
    "get_product",
    "get_sale",
    "list_sales",
    "sales_summary",
    "get_receipt",
    "get_settings",
    "health",
];

/// One request line.
#[derive(Debug, Clone, Deserialize)]
pub struct Request {
    #[serde(default)]
    pub id: Value,
    pub command: String,
    #[serde(default)]
    pub args: Value,
}

/// One response line.
#[derive(Debug, Clone, Serialize)]
pub struct Response {
    pub id: Value,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,
}

impl Response {
    pub fn success(id: Value, data: Value) -> Self {
        Response {
            id,
            ok: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(id: Value, error: ApiError) -> Self {
        Response {
            id,
            ok: false,
            data: None,
            error: Some(error),
        }
    }
}

pub fn is_read_only(command: &str) -> bool {
    READ_ONLY_COMMANDS.contains(&command)
}

/// Decodes command arguments; a missing `args` reads as `{}`.
fn args<T: DeserializeOwned>(value: Value) -> ApiResult<T> {
    let value = match value {
        Value::Null => Value::Object(Default::default()),
        other => other,
    };
    Ok(serde_json::from_value(value)?)
}

fn data<T: Serialize>(value: T) -> ApiResult<Value> {
    serde_json::to_value(value).map_err(|e| {
        tracing::error!(error = %e, "Failed to serialize response");
        ApiError::internal("Internal error")
    })
}

/// Runs one request against the state.
pub async fn dispatch(state: &AppState, request: Request) -> Response {
    let request_id = Uuid::new_v4();
    let span = info_span!("request", %request_id, command = %request.command);

    async move {
        let start = Instant::now();
        let read_only = is_read_only(&request.command);

        let result = route(state, &request.command, request.args).await;

        info!(
            ok = result.is_ok(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Command finished"
        );

        match result {
            Ok(value) => Response::success(request.id, value),
            Err(err) => Response::failure(request.id, err.retryable_if_read_only(read_only)),
        }
    }
    .instrument(span)
    .await
}

async fn route(state: &AppState, command: &str, raw: Value) -> ApiResult<Value> {
    match command {
        // Products
        "create_product" => data(product::create_product(state, args(raw)?).await?),
        "list_products" => data(product::list_products(state, args(raw)?).await?),
        "get_product" => data(product::get_product(state, args(raw)?).await?),
        "update_product" => data(product::update_product(state, args(raw)?).await?),
        "retire_product" => data(product::retire_product(state, args(raw)?).await?),
        "reinstate_product" => data(product::reinstate_product(state, args(raw)?).await?),
        "delete_product" => data(product::delete_product(state, args(raw)?).await?),
        // Sales
        "record_sale" => data(sale::record_sale(state, args(raw)?).await?),
        "get_sale" => data(sale::get_sale(state, args(raw)?).await?),
        "list_sales" => data(sale::list_sales(state, args(raw)?).await?),
        "sales_summary" => data(sale::sales_summary(state, args(raw)?).await?),
        "reverse_sale" => data(sale::reverse_sale(state, args(raw)?).await?),
        "replace_sale" => data(sale::replace_sale(state, args(raw)?).await?),
        "get_receipt" => data(sale::get_receipt(state, args(raw)?).await?),
        // Settings
        "get_settings" => data(settings::get_settings(state).await?),
        "put_settings" => data(settings::put_settings(state, args(raw)?).await?),
        // Diagnostics
        "health" => data(health::health(state).await?),
        other => Err(ApiError::unknown_command(other)),
    }
}

/// Decodes one input line and dispatches it.
///
/// ## Returns
/// `None` for blank lines, otherwise the serialized response.
pub async fn handle_line(state: &AppState, line: &str) -> Option<String> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    let response = match serde_json::from_str::<Request>(line) {
        Ok(request) => dispatch(state, request).await,
        Err(e) => {
            debug!(error = %e, "Malformed request line");
            Response::failure(
                Value::Null,
                ApiError::invalid_input(format!("Malformed request: {}", e)),
            )
        }
    };

    match serde_json::to_string(&response) {
        Ok(json) => Some(json),
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode response");
            Some(r#"{"id":null,"ok":false,"error":{"code":"INTERNAL","status":500,"message":"Internal error","retryable":false}}"#.to_string())
        }
    }
}

/// Serves requests from `reader` until end of input.
///
/// Requests are handled one at a time, so responses come back in request
/// order.
pub async fn serve<R, W>(state: &AppState, reader: R, mut writer: W) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = reader.lines();
    let mut handled: u64 = 0;

    while let Some(line) = lines.next_line().await? {
        if let Some(response) = handle_line(state, &line).await {
            writer.write_all(response.as_bytes()).await?;
            writer.write_all(b"\n").await?;
            writer.flush().await?;
            handled += 1;
        }
    }

    info!(handled, "Input closed");
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use till_db::{Database, DbConfig};

    async fn state() -> AppState {
        AppState::new(Database::new(DbConfig::in_memory()).await.unwrap())
    }

    async fn call(state: &AppState, request: Value) -> Value {
        let line = handle_line(state, &request.to_string()).await.unwrap();
        serde_json::from_str(&line).unwrap()
    }

    #[tokio::test]
    async fn test_round_trip_through_commands() {
        let state = state().await;

        let created = call(
            &state,
            json!({"id": "a", "command": "create_product",
                   "args": {"name": "Coffee", "price": "100.00", "cgstRate": "5", "sgstRate": "5"}}),
        )
        .await;
        assert_eq!(created["id"], "a");
        assert_eq!(created["ok"], true);
        let product_id = created["data"]["id"].as_i64().unwrap();

        let sale = call(
            &state,
            json!({"id": 2, "command": "record_sale",
                   "args": {"productId": product_id, "quantity": 3}}),
        )
        .await;
        assert_eq!(sale["data"]["lineTotal"], "330.00");
        assert!(sale.get("error").is_none());
    }

    #[tokio::test]
    async fn test_error_envelopes() {
        let state = state().await;

        let missing = call(
            &state,
            json!({"id": 1, "command": "record_sale", "args": {"productId": 999, "quantity": 1}}),
        )
        .await;
        assert_eq!(missing["ok"], false);
        assert_eq!(missing["error"]["code"], "NOT_FOUND");
        assert_eq!(missing["error"]["status"], 404);
        assert_eq!(missing["error"]["retryable"], false);

        let unknown = call(&state, json!({"id": 2, "command": "teleport"})).await;
        assert_eq!(unknown["error"]["code"], "UNKNOWN_COMMAND");

        let bad_args = call(&state, json!({"id": 3, "command": "get_sale", "args": {"id": "x"}})).await;
        assert_eq!(bad_args["error"]["code"], "INVALID_INPUT");

        let line = handle_line(&state, "{not json").await.unwrap();
        let malformed: Value = serde_json::from_str(&line).unwrap();
        assert_eq!(malformed["id"], Value::Null);
        assert_eq!(malformed["error"]["status"], 400);

        assert!(handle_line(&state, "   ").await.is_none());
    }

    #[tokio::test]
    async fn test_non_positive_ids_are_invalid_input() {
        let state = state().await;

        for request in [
            json!({"id": 1, "command": "get_product", "args": {"id": 0}}),
            json!({"id": 2, "command": "delete_product", "args": {"id": -3}}),
            json!({"id": 3, "command": "get_receipt", "args": {"id": 0}}),
            json!({"id": 4, "command": "record_sale", "args": {"productId": 0, "quantity": 1}}),
            json!({"id": 5, "command": "replace_sale",
                   "args": {"id": 1, "productId": -1, "quantity": 1}}),
        ] {
            let response = call(&state, request).await;
            assert_eq!(response["error"]["code"], "INVALID_INPUT", "{}", response);
            assert_eq!(response["error"]["status"], 400);
        }

        let missing = call(&state, json!({"id": 6, "command": "get_product", "args": {"id": 1}})).await;
        assert_eq!(missing["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_serve_answers_in_order() {
        let state = state().await;
        let input = concat!(
            r#"{"id":1,"command":"health"}"#,
            "\n\n",
            r#"{"id":2,"command":"get_settings"}"#,
            "\n",
            r#"{"id":3,"command":"get_product","args":{"id":1}}"#,
            "\n",
        );

        let mut output = Vec::new();
        serve(&state, input.as_bytes(), &mut output).await.unwrap();

        let responses: Vec<Value> = String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(responses.len(), 3);
        assert_eq!(responses[0]["data"]["status"], "ok");
        assert_eq!(responses[1]["data"], json!({}));
        assert_eq!(responses[2]["error"]["code"], "NOT_FOUND");
    }

    #[test]
    fn test_read_only_classification() {
        assert!(is_read_only("list_sales"));
        assert!(!is_read_only("record_sale"));
        assert!(!is_read_only("put_settings"));
    }
}
