//! Product filter engine: facets, sorting and pagination.
//!
//! Facets are AND-combined. Free-text search is a case-insensitive substring
//! match OR-combined across name, description and tags. Price buckets compare
//! against the effective price; `min_price`/`max_price` compare against the
//! raw stored price.

use std::cmp::Ordering;

use oceanfood_core::{BrandId, Price};
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

use crate::catalog::pricing::effective_price;
use crate::models::Product;

/// Largest page size a caller may request.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Page size used when the caller does not supply one.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Invalid listing parameters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterError {
    #[error("unknown sort field: {0}")]
    UnknownSortField(String),
    #[error("page must be at least 1")]
    InvalidPage,
    #[error("limit must be at least 1")]
    InvalidLimit,
}

// =============================================================================
// Price buckets
// =============================================================================

/// Named effective-price intervals, lower bound inclusive, upper exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PriceBucket {
    Under500k,
    From500kTo1m,
    From1mTo3m,
    From3mTo5m,
    From5mTo7m,
    Over7m,
}

impl PriceBucket {
    /// Every bucket in ascending order.
    pub const ALL: [Self; 6] = [
        Self::Under500k,
        Self::From500kTo1m,
        Self::From1mTo3m,
        Self::From3mTo5m,
        Self::From5mTo7m,
        Self::Over7m,
    ];

    /// Look up a bucket by its query key. Unrecognized keys yield `None`,
    /// which callers treat as "no price filtering".
    #[must_use]
    pub fn parse(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|bucket| bucket.key() == key)
    }

    /// The query key for this bucket.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Under500k => "under-500k",
            Self::From500kTo1m => "500k-1m",
            Self::From1mTo3m => "1m-3m",
            Self::From3mTo5m => "3m-5m",
            Self::From5mTo7m => "5m-7m",
            Self::Over7m => "over-7m",
        }
    }

    /// `(min, max)` bounds; `max` is `None` for the open-ended top bucket.
    #[must_use]
    pub fn bounds(self) -> (Decimal, Option<Decimal>) {
        let (min, max) = match self {
            Self::Under500k => (0, Some(500_000)),
            Self::From500kTo1m => (500_000, Some(1_000_000)),
            Self::From1mTo3m => (1_000_000, Some(3_000_000)),
            Self::From3mTo5m => (3_000_000, Some(5_000_000)),
            Self::From5mTo7m => (5_000_000, Some(7_000_000)),
            Self::Over7m => (7_000_000, None),
        };
        (Decimal::from(min), max.map(Decimal::from))
    }

    /// Whether `price` falls inside this bucket.
    #[must_use]
    pub fn contains(self, price: Price) -> bool {
        let (min, max) = self.bounds();
        let amount = price.amount();
        amount >= min && max.is_none_or(|max| amount < max)
    }
}

/// Normalize an origin for matching: lower-case, whitespace runs become `-`.
///
/// ```
/// use oceanfood_storefront::catalog::normalize_origin;
///
/// assert_eq!(normalize_origin("Phú Quốc"), "phú-quốc");
/// assert_eq!(normalize_origin("  Na   Uy "), "na-uy");
/// ```
#[must_use]
pub fn normalize_origin(origin: &str) -> String {
    origin
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}

// =============================================================================
// Facets
// =============================================================================

/// Optional, AND-combined product facets. The default matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductFilter {
    pub category: Option<String>,
    /// Any-of match on the product type. Empty means unrestricted.
    pub types: Vec<String>,
    pub brand: Option<BrandId>,
    /// Inclusive lower bound on the raw price.
    pub min_price: Option<Decimal>,
    /// Inclusive upper bound on the raw price.
    pub max_price: Option<Decimal>,
    pub in_stock: Option<bool>,
    pub is_new: Option<bool>,
    pub is_featured: Option<bool>,
    /// Lower-cased search needle. Set through [`Self::with_search`].
    pub(crate) search: Option<String>,
    pub price_range: Option<PriceBucket>,
    /// Normalized origins (see [`normalize_origin`]). Empty means unrestricted.
    /// Set through [`Self::with_origins`].
    pub(crate) origins: Vec<String>,
}

impl ProductFilter {
    /// Products flagged as featured.
    #[must_use]
    pub fn featured() -> Self {
        Self {
            is_featured: Some(true),
            ..Self::default()
        }
    }

    /// Products flagged as new arrivals.
    #[must_use]
    pub fn new_arrivals() -> Self {
        Self {
            is_new: Some(true),
            ..Self::default()
        }
    }

    /// Products in one category.
    #[must_use]
    pub fn in_category(category: impl Into<String>) -> Self {
        Self {
            category: Some(category.into()),
            ..Self::default()
        }
    }

    /// Set the free-text search. Blank input clears it.
    #[must_use]
    pub fn with_search(mut self, search: &str) -> Self {
        let needle = search.trim().to_lowercase();
        self.search = (!needle.is_empty()).then_some(needle);
        self
    }

    /// Restrict to the given origins, normalizing each one.
    #[must_use]
    pub fn with_origins<I, S>(mut self, origins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.origins = origins
            .into_iter()
            .map(|origin| normalize_origin(origin.as_ref()))
            .filter(|origin| !origin.is_empty())
            .collect();
        self
    }

    /// The normalized search needle, if any.
    #[must_use]
    pub fn search(&self) -> Option<&str> {
        self.search.as_deref()
    }

    /// The normalized origins filter.
    #[must_use]
    pub fn origins(&self) -> &[String] {
        &self.origins
    }

    /// Whether `product` satisfies every facet.
    #[must_use]
    pub fn matches(&self, product: &Product) -> bool {
        self.category.as_ref().is_none_or(|c| &product.category == c)
            && (self.types.is_empty() || self.types.contains(&product.product_type))
            && self.brand.is_none_or(|b| product.brand == Some(b))
            && self.min_price.is_none_or(|min| product.price.amount() >= min)
            && self.max_price.is_none_or(|max| product.price.amount() <= max)
            && self.in_stock.is_none_or(|v| product.in_stock == v)
            && self.is_new.is_none_or(|v| product.is_new == v)
            && self.is_featured.is_none_or(|v| product.is_featured == v)
            && self
                .price_range
                .is_none_or(|bucket| bucket.contains(effective_price(product)))
            && (self.origins.is_empty()
                || self.origins.contains(&normalize_origin(&product.origin)))
            && self.search.as_deref().is_none_or(|needle| matches_search(product, needle))
    }
}

fn matches_search(product: &Product, needle: &str) -> bool {
    let hit = |text: &str| text.to_lowercase().contains(needle);
    hit(&product.name) || product.description_text().any(hit) || product.tags.iter().any(|t| hit(t))
}

// =============================================================================
// Sorting
// =============================================================================

/// Fields a listing can be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    CreatedAt,
    UpdatedAt,
    Price,
    CurrentPrice,
    Name,
    Rating,
    Discount,
}

impl SortField {
    fn parse(name: &str) -> Option<Self> {
        Some(match name {
            "createdAt" => Self::CreatedAt,
            "updatedAt" => Self::UpdatedAt,
            "price" => Self::Price,
            "currentPrice" => Self::CurrentPrice,
            "name" => Self::Name,
            "rating" => Self::Rating,
            "discount" => Self::Discount,
            _ => return None,
        })
    }
}

/// A signed sort key; `-field` is descending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sort {
    pub field: SortField,
    pub descending: bool,
}

impl Default for Sort {
    /// Most recently created first.
    fn default() -> Self {
        Self {
            field: SortField::CreatedAt,
            descending: true,
        }
    }
}

impl Sort {
    /// Parse `field` or `-field`.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::UnknownSortField`] for unsupported fields.
    pub fn parse(spec: &str) -> Result<Self, FilterError> {
        let spec = spec.trim();
        let (descending, name) = spec
            .strip_prefix('-')
            .map_or((false, spec), |rest| (true, rest));
        let field = SortField::parse(name)
            .ok_or_else(|| FilterError::UnknownSortField(spec.to_owned()))?;
        Ok(Self { field, descending })
    }

    /// Order two products by this key, then by id ascending.
    #[must_use]
    pub fn compare(&self, a: &Product, b: &Product) -> Ordering {
        let primary = match self.field {
            SortField::CreatedAt => a.created_at.cmp(&b.created_at),
            SortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
            SortField::Price => a.price.cmp(&b.price),
            SortField::CurrentPrice => effective_price(a).cmp(&effective_price(b)),
            SortField::Name => a.name.cmp(&b.name),
            SortField::Rating => a.rating.cmp(&b.rating),
            SortField::Discount => a.discount.cmp(&b.discount),
        };
        let primary = if self.descending {
            primary.reverse()
        } else {
            primary
        };
        primary.then_with(|| a.id.cmp(&b.id))
    }
}

// =============================================================================
// Pagination
// =============================================================================

/// A validated page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    limit: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PageRequest {
    /// Build a page request; `limit` is capped at [`MAX_PAGE_SIZE`].
    ///
    /// # Errors
    ///
    /// Returns an error if `page` or `limit` is zero.
    pub fn new(page: u32, limit: u32) -> Result<Self, FilterError> {
        if page == 0 {
            return Err(FilterError::InvalidPage);
        }
        if limit == 0 {
            return Err(FilterError::InvalidLimit);
        }
        Ok(Self {
            page,
            limit: limit.min(MAX_PAGE_SIZE),
        })
    }

    /// 1-based page number.
    #[must_use]
    pub const fn page(&self) -> u32 {
        self.page
    }

    /// Items per page.
    #[must_use]
    pub const fn limit(&self) -> u32 {
        self.limit
    }

    /// Number of items before this page.
    #[must_use]
    pub const fn skip(&self) -> u64 {
        (self.page as u64 - 1) * self.limit as u64
    }
}

/// One page of results plus pagination metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub pagination: Pagination,
}

/// Pagination metadata as returned to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current_page: u32,
    pub total_pages: u64,
    pub total_items: u64,
    pub items_per_page: u32,
}

impl<T> Page<T> {
    /// Map the items, keeping the metadata.
    #[must_use]
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            pagination: self.pagination,
        }
    }
}

/// Run the filter engine over candidate products.
///
/// Candidates may already be narrowed by the store; the full predicate is
/// applied again here so the result does not depend on how much the store
/// pushed down.
#[must_use]
pub fn apply(
    mut products: Vec<Product>,
    filter: &ProductFilter,
    sort: Sort,
    page: PageRequest,
) -> Page<Product> {
    products.retain(|product| filter.matches(product));
    products.sort_by(|a, b| sort.compare(a, b));

    let total_items = products.len() as u64;
    let skip = usize::try_from(page.skip()).unwrap_or(usize::MAX);
    let items: Vec<Product> = products
        .into_iter()
        .skip(skip)
        .take(page.limit() as usize)
        .collect();

    Page {
        items,
        pagination: Pagination {
            current_page: page.page(),
            total_pages: total_items.div_ceil(u64::from(page.limit())),
            total_items,
            items_per_page: page.limit(),
        },
    }
}
