//! Flash-sale route handlers.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use oceanfood_core::{DiscountPercent, FlashSaleId, ProductId};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::instrument;

use super::parse_id;
use super::response::{ApiJson, ApiResponse};
use crate::error::{AppError, Result};
use crate::models::FlashSaleView;
use crate::services::flash_sale::{FlashSaleChanges, NewFlashSale, parse_date};
use crate::state::AppState;

/// Body of `POST /api/flash-sale`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFlashSale {
    #[serde(alias = "productId")]
    pub product: String,
    pub start_date: String,
    pub end_date: String,
    pub discount_percentage: Decimal,
}

/// Body of `PUT /api/flash-sale/{id}`; absent fields are left unchanged.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateFlashSale {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub discount_percentage: Option<Decimal>,
    pub is_active: Option<bool>,
}

/// Body of `PATCH /api/flash-sale/{id}/active`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetActive {
    pub is_active: bool,
}

fn discount(raw: Decimal) -> Result<DiscountPercent> {
    DiscountPercent::new(raw).map_err(|e| AppError::BadRequest(format!("discountPercentage: {e}")))
}

impl UpdateFlashSale {
    fn into_changes(self) -> Result<FlashSaleChanges> {
        Ok(FlashSaleChanges {
            start_date: self
                .start_date
                .map(|raw| parse_date("startDate", &raw))
                .transpose()?,
            end_date: self
                .end_date
                .map(|raw| parse_date("endDate", &raw))
                .transpose()?,
            discount_percentage: self.discount_percentage.map(discount).transpose()?,
            is_active: self.is_active,
        })
    }
}

/// `GET /api/flash-sale`
#[instrument(skip(state))]
pub async fn list(State(state): State<AppState>) -> Result<ApiResponse<Arc<Vec<FlashSaleView>>>> {
    let sales = state.flash_sales().list_active().await?;
    let message = if sales.is_empty() {
        "No flash sales are active"
    } else {
        "Active flash sales"
    };
    Ok(ApiResponse::ok(sales).with_message(message))
}

/// `POST /api/flash-sale`
#[instrument(skip(state, body))]
pub async fn create(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<CreateFlashSale>,
) -> Result<(StatusCode, ApiResponse<FlashSaleView>)> {
    let input = NewFlashSale {
        product: parse_id::<ProductId>("product", &body.product)?,
        start_date: parse_date("startDate", &body.start_date)?,
        end_date: parse_date("endDate", &body.end_date)?,
        discount_percentage: discount(body.discount_percentage)?,
    };
    let sale = state.flash_sales().create(input).await?;
    Ok((
        StatusCode::CREATED,
        ApiResponse::ok(sale).with_message("Product added to flash sale"),
    ))
}

/// `PUT /api/flash-sale/{id}`
#[instrument(skip(state, body))]
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<UpdateFlashSale>,
) -> Result<ApiResponse<FlashSaleView>> {
    let id = parse_id::<FlashSaleId>("flash sale ID", &id)?;
    let sale = state.flash_sales().update(id, body.into_changes()?).await?;
    Ok(ApiResponse::ok(sale).with_message("Flash sale updated"))
}

/// `PATCH /api/flash-sale/{id}/active`
#[instrument(skip(state, body))]
pub async fn set_active(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<SetActive>,
) -> Result<ApiResponse<FlashSaleView>> {
    let id = parse_id::<FlashSaleId>("flash sale ID", &id)?;
    let changes = FlashSaleChanges {
        is_active: Some(body.is_active),
        ..FlashSaleChanges::default()
    };
    let sale = state.flash_sales().update(id, changes).await?;
    let message = if body.is_active {
        "Flash sale activated"
    } else {
        "Flash sale deactivated"
    };
    Ok(ApiResponse::ok(sale).with_message(message))
}

/// `DELETE /api/flash-sale/{id}`
#[instrument(skip(state))]
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<ApiResponse<()>> {
    let id = parse_id::<FlashSaleId>("flash sale ID", &id)?;
    state.flash_sales().delete(id).await?;
    Ok(ApiResponse::done("Product removed from flash sale"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_create_body_accepts_product_id_alias() {
        let body: CreateFlashSale = serde_json::from_str(
            r#"{"productId": "x", "startDate": "2026-01-01", "endDate": "2026-01-02", "discountPercentage": 30}"#,
        )
        .unwrap();
        assert_eq!(body.product, "x");
        assert_eq!(body.discount_percentage, Decimal::from(30));
    }

    #[test]
    fn test_out_of_range_discount_is_bad_request() {
        assert!(matches!(discount(Decimal::from(101)), Err(AppError::BadRequest(_))));
        assert!(matches!(discount(Decimal::from(-1)), Err(AppError::BadRequest(_))));
        assert!(discount(Decimal::from(100)).is_ok());
    }

    #[test]
    fn test_partial_update_parses_only_present_fields() {
        let body: UpdateFlashSale =
            serde_json::from_str(r#"{"endDate": "2026-02-01T12:00:00Z"}"#).unwrap();
        let changes = body.into_changes().unwrap();
        assert!(changes.start_date.is_none());
        assert!(changes.end_date.is_some());
        assert!(changes.discount_percentage.is_none());
        assert!(changes.is_active.is_none());
    }

    #[test]
    fn test_malformed_date_is_bad_request() {
        let body = UpdateFlashSale {
            start_date: Some("next tuesday".into()),
            ..UpdateFlashSale::default()
        };
        assert!(matches!(body.into_changes(), Err(AppError::BadRequest(_))));
    }
}
