//! # Request Loop
//!
//! One JSON request per line in, one JSON response per line out.
//!
//! ## Wire Format
//! ```text
//! → {"id": 7, "channel": "orders:create", "args": [{ "items": [...], ... }]}
//! ← {"id": 7, "success": true, "data": {"orderId": 12, "orderNo": "ORD-000012", "change": 3.0}}
//!
//! → {"id": 8, "channel": "products:getByBarcode", "args": ["HOT-001"]}
//! ← {"id": 8, "success": false, "code": "NOT_FOUND", "error": "Product not found: HOT-001"}
//! ```
//!
//! `args` are positional, like the arguments of an IPC `invoke`. `id` is
//! echoed back untouched so the caller can match responses.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, warn};

use crate::commands::{order, product, report, settings, user};
use crate::error::{ApiError, ErrorCode};
use crate::state::AppState;

// =============================================================================
// Envelope
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct Request {
    #[serde(default)]
    pub id: Option<Value>,
    pub channel: String,
    #[serde(default)]
    pub args: Vec<Value>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Response {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<ErrorCode>,
}

impl Response {
    pub fn ok(id: Option<Value>, data: Value) -> Self {
        Response {
            id,
            success: true,
            data: Some(data),
            error: None,
            code: None,
        }
    }

    pub fn err(id: Option<Value>, err: ApiError) -> Self {
        Response {
            id,
            success: false,
            data: None,
            error: Some(err.message),
            code: Some(err.code),
        }
    }
}

// =============================================================================
// Positional Arguments
// =============================================================================

/// Positional request arguments.
#[derive(Debug, Clone, Default)]
pub struct Args(Vec<Value>);

impl Args {
    pub fn new(args: Vec<Value>) -> Self {
        Args(args)
    }

    /// The raw argument at `index`, if present.
    pub fn raw(&self, index: usize) -> Option<&Value> {
        self.0.get(index)
    }

    /// Deserializes a required argument.
    pub fn required<T: DeserializeOwned>(&self, index: usize, name: &str) -> Result<T, ApiError> {
        match self.optional(index, name)? {
            Some(value) => Ok(value),
            None => Err(ApiError::validation(format!("{} is required", name))),
        }
    }

    /// Deserializes an optional argument; missing and `null` are `None`.
    pub fn optional<T: DeserializeOwned>(
        &self,
        index: usize,
        name: &str,
    ) -> Result<Option<T>, ApiError> {
        match self.0.get(index) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => serde_json::from_value(value.clone())
                .map(Some)
                .map_err(|e| ApiError::validation(format!("Invalid {}: {}", name, e))),
        }
    }
}

// =============================================================================
// Dispatch
// =============================================================================

/// Runs the command registered for `channel`.
pub async fn dispatch(state: &AppState, channel: &str, args: Args) -> Result<Value, ApiError> {
    let db = &state.db;

    match channel {
        "test:ping" => Ok(Value::String("pong".to_string())),

        "users:login" => to_json(user::login(db, &state.sessions, args.required(0, "credentials")?).await?),
        "users:logout" => to_json(user::logout(&state.sessions, &args.required::<String>(0, "token")?)),
        "users:session" => to_json(user::session(&state.sessions, &args.required::<String>(0, "token")?)?),
        "users:list" => to_json(user::list(db).await?),
        "users:create" => to_json(user::create(db, args.required(0, "user")?).await?),
        "users:update" => to_json(
            user::update(db, &state.sessions, args.required(0, "id")?, args.required(1, "user")?)
                .await?,
        ),
        "users:delete" => to_json(user::delete(db, &state.sessions, args.required(0, "id")?).await?),

        "products:list" => to_json(product::list(db, args.optional(0, "filters")?.unwrap_or_default()).await?),
        "products:getById" => to_json(product::get_by_id(db, args.required(0, "id")?).await?),
        "products:create" => to_json(product::create(db, args.required(0, "product")?).await?),
        "products:update" => to_json(
            product::update(db, args.required(0, "id")?, args.required(1, "product")?).await?,
        ),
        "products:delete" => to_json(product::delete(db, args.required(0, "id")?).await?),
        "products:updateStock" => to_json(
            product::update_stock(db, args.required(0, "id")?, args.required(1, "quantity")?)
                .await?,
        ),
        "products:getByBarcode" => to_json(product::get_by_barcode(db, &args.required::<String>(0, "sku")?).await?),
        "products:generateSKU" => to_json(product::generate_sku()),

        "orders:create" => to_json(order::create(db, args.raw(0)).await?),
        "orders:print" => to_json(order::print(db, &state.config, args.required(0, "orderId")?).await?),
        "orders:list" => to_json(order::list(db, args.optional(0, "filters")?.unwrap_or_default()).await?),
        "orders:getById" => to_json(order::get_by_id(db, args.required(0, "id")?).await?),
        "orders:generateOrderNumber" => to_json(order::generate_order_number(db).await?),
        "orders:resetCounter" => to_json(order::reset_counter(db).await?),
        "orders:cleanOldOrders" => to_json(order::clean_old_orders(db).await?),

        "settings:get" => to_json(settings::get(db).await?),
        "settings:set" => to_json(settings::set(db, args.required(0, "settings")?).await?),
        "settings:reset" => to_json(settings::reset(db).await?),

        "reports:dailySummary" => to_json(report::daily_summary(db, args.optional(0, "date")?).await?),
        "reports:topProducts" => to_json(report::top_products(db, args.optional(0, "limit")?).await?),
        "reports:sales" => to_json(report::sales(db, args.required(0, "query")?).await?),
        "reports:overview" => to_json(
            report::overview(db, args.optional(0, "dateRange")?.unwrap_or_default()).await?,
        ),

        _ => Err(ApiError::new(
            ErrorCode::NotFound,
            format!("Unknown channel: {}", channel),
        )),
    }
}

fn to_json<T: Serialize>(value: T) -> Result<Value, ApiError> {
    serde_json::to_value(value).map_err(|e| ApiError::internal(format!("Serialization failed: {}", e)))
}

/// Parses and handles one request line.
pub async fn handle_line(state: &AppState, line: &str) -> Response {
    let request: Request = match serde_json::from_str(line) {
        Ok(request) => request,
        Err(e) => {
            warn!(error = %e, "Malformed request");
            return Response::err(None, ApiError::validation(format!("Malformed request: {}", e)));
        }
    };

    debug!(channel = %request.channel, args = request.args.len(), "Request");

    match dispatch(state, &request.channel, Args::new(request.args)).await {
        Ok(data) => Response::ok(request.id, data),
        Err(err) => {
            debug!(channel = %request.channel, code = ?err.code, "Request failed");
            Response::err(request.id, err)
        }
    }
}

/// Serves requests until the reader hits end of input.
///
/// Requests are answered in order. Blank lines are ignored.
pub async fn serve<R, W>(state: &AppState, reader: R, mut writer: W) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = reader.lines();
    let mut handled: u64 = 0;

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let response = handle_line(state, line).await;
        let mut out = serde_json::to_vec(&response)?;
        out.push(b'\n');
        writer.write_all(&out).await?;
        writer.flush().await?;
        handled += 1;
    }

    info!(handled, "Input closed, stopping request loop");
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::RegisterConfig;
    use cafe_db::{Database, DbConfig};
    use serde_json::json;

    async fn state() -> AppState {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.settings().seed_defaults().await.unwrap();
        db.users().ensure_default_admin("admin123").await.unwrap();
        AppState::new(db, RegisterConfig::default())
    }

    async fn call(state: &AppState, channel: &str, args: Value) -> Response {
        let line = json!({"id": 1, "channel": channel, "args": args}).to_string();
        handle_line(state, &line).await
    }

    async fn data(state: &AppState, channel: &str, args: Value) -> Value {
        let response = call(state, channel, args).await;
        assert!(response.success, "{channel} failed: {:?}", response.error);
        response.data.unwrap()
    }

    async fn add_product(state: &AppState, name: &str, sku: &str, price: f64, stock: i64) -> i64 {
        let product = data(
            state,
            "products:create",
            json!([{"name": name, "price": price, "category": "Menu", "sku": sku, "stock": stock}]),
        )
        .await;
        product["id"].as_i64().unwrap()
    }

    #[tokio::test]
    async fn test_ping_and_unknown_channel() {
        let state = state().await;
        assert_eq!(data(&state, "test:ping", json!([])).await, json!("pong"));

        let response = call(&state, "fs:selectImage", json!([])).await;
        assert!(!response.success);
        assert_eq!(response.code, Some(ErrorCode::NotFound));
        assert_eq!(response.id, Some(json!(1)));
    }

    #[tokio::test]
    async fn test_malformed_request() {
        let state = state().await;
        let response = handle_line(&state, "{not json").await;
        assert!(!response.success);
        assert_eq!(response.code, Some(ErrorCode::ValidationError));
        assert_eq!(response.id, None);
    }

    #[tokio::test]
    async fn test_checkout_over_the_wire() {
        let state = state().await;
        let latte = add_product(&state, "Latte", "HOT-001", 10.0, 5).await;

        let order = json!([{
            "items": [{"product_id": latte, "qty": 2, "unit_price": 10}],
            "total": "20",
            "paid": 25,
            "payment_method": "cash",
            "user_id": 1
        }]);
        let result = data(&state, "orders:create", order).await;
        assert_eq!(result["orderNo"], "ORD-000001");
        assert_eq!(result["change"], 5.0);
        assert!(result["orderId"].as_i64().is_some());

        let next = data(&state, "orders:generateOrderNumber", json!([])).await;
        assert_eq!(next["orderNo"], "ORD-000002");

        let product = data(&state, "products:getByBarcode", json!(["HOT-001"])).await;
        assert_eq!(product["stock"], 3);
    }

    #[tokio::test]
    async fn test_checkout_errors_carry_codes() {
        let state = state().await;
        let cake = add_product(&state, "Cake", "PST-001", 30.0, 1).await;

        let response = call(
            &state,
            "orders:create",
            json!([{"items": [], "total": 0, "paid": 0, "payment_method": "cash", "user_id": 1}]),
        )
        .await;
        assert_eq!(response.code, Some(ErrorCode::EmptyCart));

        let response = call(
            &state,
            "orders:create",
            json!([{
                "items": [{"product_id": cake, "qty": 3, "unit_price": 30}],
                "total": 90,
                "paid": 100,
                "payment_method": "card",
                "user_id": 1
            }]),
        )
        .await;
        assert_eq!(response.code, Some(ErrorCode::InsufficientStock));
        assert_eq!(
            response.error.as_deref(),
            Some("Cake (available: 1, requested: 3)")
        );

        let response = call(
            &state,
            "orders:create",
            json!([{
                "items": [{"product_id": cake, "qty": 1, "unit_price": 30}],
                "total": 30,
                "paid": 10,
                "payment_method": "cash",
                "user_id": 1
            }]),
        )
        .await;
        assert_eq!(response.code, Some(ErrorCode::InsufficientPayment));
    }

    #[tokio::test]
    async fn test_overview_channel() {
        let state = state().await;
        add_product(&state, "Latte", "HOT-001", 10.0, 5).await;

        let report = data(&state, "reports:overview", json!([])).await;
        assert_eq!(report["totals"]["orders_count"], 0);
        assert_eq!(report["products"]["total_products"], 1);

        let report = data(
            &state,
            "reports:overview",
            json!([{"from": "2024-03-01", "to": "2024-03-31"}]),
        )
        .await;
        assert_eq!(report["from"], "2024-03-01");
        assert_eq!(report["categories"][0]["category"], "Menu");
    }

    #[tokio::test]
    async fn test_missing_argument() {
        let state = state().await;
        let response = call(&state, "orders:getById", json!([])).await;
        assert_eq!(response.code, Some(ErrorCode::ValidationError));
        assert_eq!(response.error.as_deref(), Some("id is required"));
    }

    #[tokio::test]
    async fn test_serve_answers_each_line() {
        let state = state().await;
        let input = concat!(
            "{\"id\":\"a\",\"channel\":\"test:ping\"}\n",
            "\n",
            "{\"id\":\"b\",\"channel\":\"settings:get\",\"args\":[]}\n",
        );
        let mut output = Vec::new();

        serve(&state, input.as_bytes(), &mut output).await.unwrap();

        let text = String::from_utf8(output).unwrap();
        let responses: Vec<Value> = text
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0]["id"], "a");
        assert_eq!(responses[0]["data"], "pong");
        assert_eq!(responses[1]["id"], "b");
        assert_eq!(responses[1]["data"]["currency_symbol"], "EGP");
    }
}
