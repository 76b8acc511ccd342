//! Core types for OceanFood.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod price;
pub mod user;

pub use id::*;
pub use price::{DiscountPercent, Price, PriceError};
pub use user::{UserId, UserIdError};
