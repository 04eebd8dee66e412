//! End-to-end session over the JSON-lines protocol against a file-backed
//! database, including a restart.

use serde_json::{json, Value};
use till_service::{serve, AppState, ServiceConfig};

fn config(dir: &tempfile::TempDir) -> ServiceConfig {
    ServiceConfig {
        database_path: dir.path().join("data").join("till.db"),
        max_connections: 2,
        storage_timeout_ms: 2_000,
    }
}

async fn run(state: &AppState, requests: &[Value]) -> Vec<Value> {
    let input: String = requests.iter().map(|r| format!("{}\n", r)).collect();
    let mut output = Vec::new();
    serve(state, input.as_bytes(), &mut output).await.unwrap();

    String::from_utf8(output)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

#[tokio::test]
async fn session_survives_restart_with_identical_receipt() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(&dir);

    let state = AppState::open(&config).await.unwrap();
    let first = run(
        &state,
        &[
            json!({"id": 1, "command": "create_product",
                   "args": {"name": "Coffee", "price": "100.00", "cgstRate": "5%", "sgstRate": "5%"}}),
            json!({"id": 2, "command": "record_sale", "args": {"productId": 1, "quantity": 3}}),
            json!({"id": 3, "command": "get_receipt", "args": {"id": 1}}),
            json!({"id": 4, "command": "update_product",
                   "args": {"id": 1, "name": "Coffee", "price": "150.00", "cgstRate": "9", "sgstRate": "9"}}),
            json!({"id": 5, "command": "delete_product", "args": {"id": 1}}),
        ],
    )
    .await;

    assert!(first[..4].iter().all(|r| r["ok"] == true));
    assert_eq!(first[1]["data"]["lineTotal"], "330.00");
    assert_eq!(first[4]["error"]["code"], "REFERENCED_BY_HISTORY");
    assert_eq!(first[4]["error"]["status"], 409);
    let receipt_before = first[2]["data"]["text"].clone();
    state.db.close().await;

    let state = AppState::open(&config).await.unwrap();
    let second = run(
        &state,
        &[
            json!({"id": 6, "command": "get_receipt", "args": {"id": 1}}),
            json!({"id": 7, "command": "sales_summary"}),
            json!({"id": 8, "command": "health"}),
        ],
    )
    .await;

    assert_eq!(second[0]["data"]["text"], receipt_before);
    assert_eq!(second[1]["data"]["total"], "330.00");
    assert_eq!(second[2]["data"]["status"], "ok");
    state.db.close().await;
}
