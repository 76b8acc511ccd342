//! Seed the catalog from a JSON file.
//!
//! The file holds an array of products in the API's camelCase shape; only
//! `name` and `price` are required:
//!
//! ```json
//! [
//!   { "name": "Cua hoàng đế", "price": 1200000, "originalPrice": 1500000,
//!     "discount": 20, "category": "crab", "origin": "Na Uy", "isFeatured": true }
//! ]
//! ```

use std::path::Path;

use chrono::Utc;
use oceanfood_storefront::db::{self, postgres::PgCatalog};
use oceanfood_storefront::models::NewProduct;
use tracing::{error, info};

use super::{CommandError, database_url};

/// Parse and validate a seed file's contents.
///
/// # Errors
///
/// `InvalidSeed` if the JSON does not parse or any product has a blank name.
pub fn parse_products(content: &str) -> Result<Vec<NewProduct>, CommandError> {
    let products: Vec<NewProduct> =
        serde_json::from_str(content).map_err(|e| CommandError::InvalidSeed(e.to_string()))?;

    let blank: Vec<String> = products
        .iter()
        .enumerate()
        .filter(|(_, product)| product.name.trim().is_empty())
        .map(|(index, _)| index.to_string())
        .collect();
    if !blank.is_empty() {
        return Err(CommandError::InvalidSeed(format!(
            "products at positions {} have no name",
            blank.join(", ")
        )));
    }
    Ok(products)
}

/// Insert every product in `file_path` into the catalog.
///
/// With `dry_run` the file is only validated.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is invalid, or if the
/// database is unreachable. Individual insert failures are logged and
/// counted, not fatal.
pub async fn products(file_path: &str, dry_run: bool) -> Result<(), CommandError> {
    let path = Path::new(file_path);
    info!(path = %file_path, "Loading products from file");

    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| CommandError::Io {
            path: file_path.to_owned(),
            source,
        })?;
    let products = parse_products(&content)?;
    info!(count = products.len(), "Seed file validated");

    if dry_run {
        info!("Dry run, nothing written");
        return Ok(());
    }

    let pool = db::create_pool(&database_url()?).await?;
    let catalog = PgCatalog::new(pool);
    info!("Connected to database");

    let mut inserted = 0_usize;
    let mut failed = 0_usize;
    for input in products {
        let name = input.name.clone();
        match catalog.insert(&input.into_product(Utc::now())).await {
            Ok(()) => inserted += 1,
            Err(e) => {
                failed += 1;
                error!(product = %name, error = %e, "Insert failed");
            }
        }
    }

    info!("Seeding complete!");
    info!("  Products inserted: {inserted}");
    if failed > 0 {
        error!("  Failed: {failed}");
    }
    Ok(())
}
