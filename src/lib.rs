//! Production order tracking on top of a local SQLite database.
//!
//! # Intention
//!
//! - Record products with their initial material stock.
//! - Register production orders, update their status and report on them.
//! - Drive everything from a numbered text menu.
//!
//! # Architectural Boundaries
//!
//! - All SQL lives in [`sqlite`]; the menu only talks to [`ProductionStore`].
//! - No networking, no concurrent writers.

pub mod error;
pub mod menu;
pub mod model;
pub mod sqlite;

pub use error::{MenuError, StoreError};
pub use menu::{run_session, Menu, MenuOption};
pub use model::{Availability, OrderStatus, Product, ProductionOrder, ProductionReport};
pub use sqlite::{ProductionStore, StoreConfig, DEFAULT_DB_PATH};
