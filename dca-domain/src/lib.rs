//! DCA Bot Domain Layer
//!
//! Pure domain logic with zero I/O dependencies.
//! Contains the product catalog lookup, amount normalization, order types
//! and exchange credentials.

#![warn(missing_docs)]
#![warn(clippy::all)]

// Public modules
pub mod amount;
pub mod credentials;
pub mod order;
pub mod product;
pub mod value_objects;

// Re-export commonly used types
pub use amount::normalize_amount;
pub use credentials::{ApiCredentials, Environment};
pub use order::{Order, OrderQuantity, OrderRequest, OrderStatus};
pub use product::{resolve_market, MarketSelection, Product};
pub use value_objects::{Denomination, DomainError, Increment, OrderSide};
