//! Product catalog route handlers.

use axum::extract::{Path, State};
use oceanfood_core::{BrandId, ProductId};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::instrument;

use super::parse_id;
use super::response::{ApiPage, ApiQuery, ApiResponse};
use crate::catalog::{PageRequest, PriceBucket, ProductFilter, Sort};
use crate::error::{AppError, Result};
use crate::models::ProductView;
use crate::state::AppState;

/// Default size of the featured and new-arrival strips.
const DEFAULT_STRIP_LIMIT: u32 = 8;

/// Query string accepted by the listing endpoints.
///
/// Everything arrives as text so that malformed numbers are reported through
/// the envelope instead of a bare rejection. Empty values count as absent.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductQuery {
    category: Option<String>,
    #[serde(rename = "type")]
    product_type: Option<String>,
    types: Option<String>,
    brand: Option<String>,
    min_price: Option<String>,
    max_price: Option<String>,
    in_stock: Option<String>,
    is_new: Option<String>,
    is_featured: Option<String>,
    search: Option<String>,
    price_range: Option<String>,
    origins: Option<String>,
    sort: Option<String>,
    page: Option<String>,
    limit: Option<String>,
}

fn present(value: Option<&String>) -> Option<&str> {
    value.map(|v| v.trim()).filter(|v| !v.is_empty())
}

fn split_list(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(',').map(str::trim).filter(|v| !v.is_empty())
}

/// The literal `true` is true; any other value is false.
fn flag(value: Option<&String>) -> Option<bool> {
    present(value).map(|v| v == "true")
}

fn number<T: std::str::FromStr>(field: &str, value: Option<&String>) -> Result<Option<T>> {
    present(value)
        .map(|raw| {
            raw.parse::<T>()
                .map_err(|_| AppError::BadRequest(format!("{field} must be a number, got {raw:?}")))
        })
        .transpose()
}

impl ProductQuery {
    /// Build the facet set.
    ///
    /// # Errors
    ///
    /// `BadRequest` for an unparseable price bound or brand ID.
    pub fn filter(&self) -> Result<ProductFilter> {
        let mut types: Vec<String> = present(self.product_type.as_ref())
            .map(str::to_owned)
            .into_iter()
            .collect();
        if let Some(raw) = present(self.types.as_ref()) {
            types.extend(split_list(raw).map(str::to_owned));
        }

        let brand = present(self.brand.as_ref())
            .map(|raw| parse_id::<BrandId>("brand", raw))
            .transpose()?;

        let mut filter = ProductFilter {
            category: present(self.category.as_ref()).map(str::to_owned),
            types,
            brand,
            min_price: number::<Decimal>("minPrice", self.min_price.as_ref())?,
            max_price: number::<Decimal>("maxPrice", self.max_price.as_ref())?,
            in_stock: flag(self.in_stock.as_ref()),
            is_new: flag(self.is_new.as_ref()),
            is_featured: flag(self.is_featured.as_ref()),
            price_range: present(self.price_range.as_ref()).and_then(PriceBucket::parse),
            ..ProductFilter::default()
        };
        if let Some(search) = present(self.search.as_ref()) {
            filter = filter.with_search(search);
        }
        if let Some(raw) = present(self.origins.as_ref()) {
            filter = filter.with_origins(split_list(raw));
        }
        Ok(filter)
    }

    /// Requested sort order, newest first by default.
    ///
    /// # Errors
    ///
    /// `BadRequest` for an unknown sort field.
    pub fn sort(&self) -> Result<Sort> {
        present(self.sort.as_ref()).map_or_else(|| Ok(Sort::default()), |raw| Ok(Sort::parse(raw)?))
    }

    /// Requested page, `page=1&limit=10` by default.
    ///
    /// # Errors
    ///
    /// `BadRequest` for a non-numeric or zero page or limit.
    pub fn page(&self) -> Result<PageRequest> {
        let defaults = PageRequest::default();
        let page = number::<u32>("page", self.page.as_ref())?.unwrap_or(defaults.page());
        let limit = number::<u32>("limit", self.limit.as_ref())?.unwrap_or(defaults.limit());
        Ok(PageRequest::new(page, limit)?)
    }

    fn strip_limit(&self) -> Result<u32> {
        Ok(number::<u32>("limit", self.limit.as_ref())?.unwrap_or(DEFAULT_STRIP_LIMIT))
    }
}

/// `GET /api/products` and `GET /api/products/filter`.
#[instrument(skip(state))]
pub async fn list(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ProductQuery>,
) -> Result<ApiPage<ProductView>> {
    let filter = query.filter()?;
    let page = state
        .catalog()
        .list(&filter, query.sort()?, query.page()?)
        .await?;
    Ok(page.into())
}

/// `GET /api/products/featured?limit=8`.
#[instrument(skip(state))]
pub async fn featured(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ProductQuery>,
) -> Result<ApiResponse<Vec<ProductView>>> {
    let products = state.catalog().featured(query.strip_limit()?).await?;
    Ok(ApiResponse::ok(products))
}

/// `GET /api/products/new?limit=8`.
#[instrument(skip(state))]
pub async fn new_arrivals(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ProductQuery>,
) -> Result<ApiResponse<Vec<ProductView>>> {
    let products = state.catalog().new_arrivals(query.strip_limit()?).await?;
    Ok(ApiResponse::ok(products))
}

/// `GET /api/products/category/{category}`.
#[instrument(skip(state))]
pub async fn by_category(
    State(state): State<AppState>,
    Path(category): Path<String>,
    ApiQuery(query): ApiQuery<ProductQuery>,
) -> Result<ApiPage<ProductView>> {
    let page = state
        .catalog()
        .by_category(&category, query.sort()?, query.page()?)
        .await?;
    Ok(page.into())
}

/// `GET /api/products/{id}`.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<ApiResponse<ProductView>> {
    let id = parse_id::<ProductId>("product ID", &id)?;
    Ok(ApiResponse::ok(state.catalog().get(id).await?))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::catalog::SortField;

    fn query(pairs: &str) -> ProductQuery {
        serde_json::from_value(
            serde_json::Value::Object(
                pairs
                    .split('&')
                    .filter_map(|pair| pair.split_once('='))
                    .map(|(k, v)| (k.to_owned(), serde_json::Value::String(v.to_owned())))
                    .collect(),
            ),
        )
        .unwrap()
    }

    #[test]
    fn test_flags_follow_literal_true() {
        let filter = query("inStock=true&isNew=false&isFeatured=yes").filter().unwrap();
        assert_eq!(filter.in_stock, Some(true));
        assert_eq!(filter.is_new, Some(false));
        assert_eq!(filter.is_featured, Some(false));
    }

    #[test]
    fn test_empty_values_are_absent() {
        let filter = query("category=&minPrice=&inStock=").filter().unwrap();
        assert_eq!(filter.category, None);
        assert_eq!(filter.min_price, None);
        assert_eq!(filter.in_stock, None);
    }

    #[test]
    fn test_lists_are_comma_separated() {
        let filter = query("type=fresh&types=frozen, dried&origins=Phú Quốc,Nha Trang")
            .filter()
            .unwrap();
        assert_eq!(filter.types, ["fresh", "frozen", "dried"]);
        assert_eq!(filter.origins(), ["phú-quốc", "nha-trang"]);
    }

    #[test]
    fn test_unknown_bucket_means_no_bucket() {
        let filter = query("priceRange=cheap").filter().unwrap();
        assert_eq!(filter.price_range, None);
        let filter = query("priceRange=1m-3m").filter().unwrap();
        assert_eq!(filter.price_range, Some(PriceBucket::From1mTo3m));
    }

    #[test]
    fn test_bad_numbers_are_rejected() {
        assert!(matches!(query("minPrice=abc").filter(), Err(AppError::BadRequest(_))));
        assert!(matches!(query("page=0").page(), Err(AppError::BadRequest(_))));
        assert!(matches!(query("limit=-1").page(), Err(AppError::BadRequest(_))));
        assert!(matches!(query("sort=colour").sort(), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn test_defaults() {
        let q = ProductQuery::default();
        let page = q.page().unwrap();
        assert_eq!((page.page(), page.limit()), (1, 10));
        assert_eq!(q.sort().unwrap().field, SortField::CreatedAt);
        assert_eq!(q.strip_limit().unwrap(), DEFAULT_STRIP_LIMIT);
    }
}
