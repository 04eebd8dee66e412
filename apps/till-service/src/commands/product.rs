//! # Product Commands
//!
//! Catalog maintenance: create, look up, update, retire and delete.
//!
//! ## Lookup Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    list_products                                        │
//! │                                                                         │
//! │  args.name set?  ──YES──► exact lookup (case-insensitive) ──► [0..1]    │
//! │       │                                                                 │
//! │       NO                                                                │
//! │       ▼                                                                 │
//! │  args.query set? ──YES──► LIKE '%query%' on active products, limited    │
//! │       │                                                                 │
//! │       NO                                                                │
//! │       ▼                                                                 │
//! │  full catalog by name (retired only with includeRetired)               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info};

use super::{checked_id, IdArgs};
use crate::error::ApiResult;
use crate::state::AppState;
use till_core::{Money, Product, ProductDraft, TaxRate};

/// Product DTO for callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDto {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    /// Decimal price, e.g. `"100.00"`
    pub price: String,
    pub price_cents: i64,
    /// Percentage, e.g. `"2.5%"`
    pub cgst_rate: String,
    pub sgst_rate: String,
    pub cgst_rate_bps: u32,
    pub sgst_rate_bps: u32,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Product> for ProductDto {
    fn from(p: Product) -> Self {
        ProductDto {
            id: p.id,
            price: p.price().to_string(),
            price_cents: p.price_cents,
            cgst_rate: p.cgst_rate().to_string(),
            sgst_rate: p.sgst_rate().to_string(),
            cgst_rate_bps: p.cgst_rate_bps,
            sgst_rate_bps: p.sgst_rate_bps,
            is_active: p.is_active,
            created_at: p.created_at.to_rfc3339(),
            updated_at: p.updated_at.to_rfc3339(),
            name: p.name,
            description: p.description,
        }
    }
}

/// Writable product fields as sent by callers.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductInput {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Decimal price, e.g. `"100.00"`
    pub price: String,
    /// Percentage, e.g. `"5"` or `"2.5%"`
    pub cgst_rate: String,
    pub sgst_rate: String,
}

impl ProductInput {
    fn into_draft(self) -> ApiResult<ProductDraft> {
        let price: Money = self.price.parse()?;
        let cgst: TaxRate = self.cgst_rate.parse()?;
        let sgst: TaxRate = self.sgst_rate.parse()?;

        let mut draft = ProductDraft::new(self.name, price, cgst, sgst);
        draft.description = self.description;
        Ok(draft)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductArgs {
    pub id: i64,
    #[serde(flatten)]
    pub product: ProductInput,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ListProductsArgs {
    /// Exact name match (case-insensitive)
    pub name: Option<String>,
    /// Name fragment
    pub query: Option<String>,
    pub include_retired: bool,
    /// Result cap for `query` searches (default: 20, max: 100)
    pub limit: Option<u32>,
}

/// Creates a catalog product.
pub async fn create_product(state: &AppState, input: ProductInput) -> ApiResult<ProductDto> {
    debug!(name = %input.name, "create_product command");

    let draft = input.into_draft()?;
    let product = state.db.products().create(&draft).await?;
    Ok(product.into())
}

/// Lists products by exact name, by fragment, or the whole catalog.
pub async fn list_products(state: &AppState, args: ListProductsArgs) -> ApiResult<Vec<ProductDto>> {
    let start = Instant::now();
    debug!(?args, "list_products command");

    let products = if let Some(name) = args.name.as_deref() {
        state
            .db
            .products()
            .get_by_name(name)
            .await?
            .filter(|p| args.include_retired || p.is_active)
            .into_iter()
            .collect()
    } else if let Some(query) = args.query.as_deref() {
        let limit = args.limit.unwrap_or(20);
        state.db.products().search(query, limit).await?
    } else {
        state.db.products().list_all(args.include_retired).await?
    };

    info!(
        count = products.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "list_products completed"
    );

    Ok(products.into_iter().map(ProductDto::from).collect())
}

/// Gets one product, retired or not.
pub async fn get_product(state: &AppState, args: IdArgs) -> ApiResult<ProductDto> {
    debug!(id = args.id, "get_product command");
    let id = args.checked()?;

    let product = state
        .db
        .products()
        .get_by_id(id)
        .await?
        .ok_or(till_core::CoreError::ProductNotFound(id))?;

    Ok(product.into())
}

/// Replaces a product's writable fields. Past sales keep their snapshot.
pub async fn update_product(state: &AppState, args: UpdateProductArgs) -> ApiResult<ProductDto> {
    debug!(id = args.id, "update_product command");

    let id = checked_id("id", args.id)?;
    let draft = args.product.into_draft()?;
    let product = state.db.products().update(id, &draft).await?;
    Ok(product.into())
}

pub async fn retire_product(state: &AppState, args: IdArgs) -> ApiResult<ProductDto> {
    debug!(id = args.id, "retire_product command");
    let id = args.checked()?;
    Ok(state.db.products().retire(id).await?.into())
}

pub async fn reinstate_product(state: &AppState, args: IdArgs) -> ApiResult<ProductDto> {
    debug!(id = args.id, "reinstate_product command");
    let id = args.checked()?;
    Ok(state.db.products().reinstate(id).await?.into())
}

/// Hard-deletes a product that no sale references.
pub async fn delete_product(state: &AppState, args: IdArgs) -> ApiResult<DeletedDto> {
    debug!(id = args.id, "delete_product command");
    let id = args.checked()?;
    state.db.products().delete(id).await?;
    Ok(DeletedDto {
        id,
        deleted: true,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletedDto {
    pub id: i64,
    pub deleted: bool,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use till_db::{Database, DbConfig};

    async fn state() -> AppState {
        AppState::new(Database::new(DbConfig::in_memory()).await.unwrap())
    }

    fn coffee() -> ProductInput {
        ProductInput {
            name: "Coffee".to_string(),
            description: None,
            price: "100.00".to_string(),
            cgst_rate: "5%".to_string(),
            sgst_rate: "5".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let state = state().await;
        let created = create_product(&state, coffee()).await.unwrap();
        assert_eq!(created.price, "100.00");
        assert_eq!(created.price_cents, 10_000);
        assert_eq!(created.cgst_rate, "5%");
        assert_eq!(created.sgst_rate_bps, 500);

        let fetched = get_product(&state, IdArgs { id: created.id }).await.unwrap();
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn test_bad_price_is_invalid_input() {
        let state = state().await;
        let mut input = coffee();
        input.price = "ten".to_string();

        let err = create_product(&state, input).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidInput);
        assert_eq!(err.status, 400);
    }

    #[tokio::test]
    async fn test_duplicate_name_is_conflict() {
        let state = state().await;
        create_product(&state, coffee()).await.unwrap();

        let mut again = coffee();
        again.name = "  COFFEE ".to_string();
        let err = create_product(&state, again).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::DuplicateName);
        assert_eq!(err.status, 409);
    }

    #[tokio::test]
    async fn test_list_modes() {
        let state = state().await;
        let coffee = create_product(&state, coffee()).await.unwrap();
        let mut tea = self::coffee();
        tea.name = "Tea".to_string();
        let tea = create_product(&state, tea).await.unwrap();
        retire_product(&state, IdArgs { id: tea.id }).await.unwrap();

        let all = list_products(&state, ListProductsArgs::default()).await.unwrap();
        assert_eq!(all.len(), 1);

        let with_retired = list_products(
            &state,
            ListProductsArgs {
                include_retired: true,
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(with_retired.len(), 2);

        let by_name = list_products(
            &state,
            ListProductsArgs {
                name: Some("coffee".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(by_name.len(), 1);
        assert_eq!(by_name[0].id, coffee.id);

        let hidden = list_products(
            &state,
            ListProductsArgs {
                name: Some("tea".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert!(hidden.is_empty());

        let by_query = list_products(
            &state,
            ListProductsArgs {
                query: Some("off".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(by_query.len(), 1);
    }

    #[tokio::test]
    async fn test_update_missing_is_not_found() {
        let state = state().await;
        let err = update_product(
            &state,
            UpdateProductArgs {
                id: 42,
                product: coffee(),
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }
}
