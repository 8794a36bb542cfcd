//! Orders: pricing, validation and lifecycle.

mod ledger;
mod pricing;
mod sqlite_store;
mod store;
mod types;

pub use ledger::OrderLedger;
pub use pricing::{PhysicalPricingConfig, PricingConfig};
pub use sqlite_store::SqliteOrderStore;
pub use store::{CreateOrderRequest, OrderError, OrderFilter, OrderStore};
pub use types::{Order, OrderEvent, OrderStatus, ProductType, SizeTier};
