//! Domain models for the storefront.
//!
//! - [`product`] - Catalog records (read-only to this service) and their API view
//! - [`cart`] - Per-user cart documents with price snapshots
//! - [`favorite`] - Per-user favorite product sets
//! - [`flash_sale`] - Time-boxed discount associations

pub mod cart;
pub mod favorite;
pub mod flash_sale;
pub mod product;

pub use cart::{Cart, CartItem, CartLineView, CartView};
pub use favorite::Favorite;
pub use flash_sale::{FlashSale, FlashSaleProduct, FlashSaleView};
pub use product::{DescriptionSection, NewProduct, Product, ProductView};
