use std::path::PathBuf;

use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::{debug, info, warn};

use crate::error::StoreError;
use crate::model::{Availability, OrderStatus, Product, ProductionOrder, ProductionReport};

/// Default database file, relative to the working directory.
pub const DEFAULT_DB_PATH: &str = "production_orders.db";

pub const PRODUCTS_TABLE: &str = "products";
pub const ORDERS_TABLE: &str = "production_orders";

/// Schema definition for the SQLite database
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schema {
    pub tables: Vec<TableDefinition>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn add_table(mut self, table: TableDefinition) -> Self {
        self.tables.push(table);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableDefinition {
    pub name: String,
    pub columns: Vec<ColumnDefinition>,
    pub indexes: Vec<IndexDefinition>,
}

impl TableDefinition {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            columns: Vec::new(),
            indexes: Vec::new(),
        }
    }
    pub fn with_column(mut self, column: ColumnDefinition) -> Self {
        self.columns.push(column);
        self
    }
    pub fn with_index(mut self, index: IndexDefinition) -> Self {
        self.indexes.push(index);
        self
    }

    /// Idempotent `CREATE TABLE` statement for this table.
    pub fn create_statement(&self) -> String {
        let columns: Vec<String> = self.columns.iter().map(|c| c.to_sql()).collect();
        format!(
            "CREATE TABLE IF NOT EXISTS {} ({})",
            self.name,
            columns.join(", ")
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDefinition {
    pub name: String,
    pub data_type: DataType,
    pub constraints: Vec<ColumnConstraint>,
    pub default_value: Option<DefaultValue>,
}

impl ColumnDefinition {
    pub fn new(name: &str, data_type: DataType) -> Self {
        Self {
            name: name.to_string(),
            data_type,
            constraints: Vec::new(),
            default_value: None,
        }
    }
    pub fn with_constraint(mut self, constraint: ColumnConstraint) -> Self {
        self.constraints.push(constraint);
        self
    }
    pub fn with_default(mut self, value: DefaultValue) -> Self {
        self.default_value = Some(value);
        self
    }

    fn to_sql(&self) -> String {
        let mut sql = format!("{} {}", self.name, self.data_type.as_sql());
        for constraint in &self.constraints {
            sql.push(' ');
            sql.push_str(constraint.as_sql());
        }
        if let Some(default) = &self.default_value {
            sql.push_str(" DEFAULT ");
            sql.push_str(&default.to_sql());
        }
        sql
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DataType {
    Integer,
    Text,
}

impl DataType {
    fn as_sql(&self) -> &'static str {
        match self {
            DataType::Integer => "INTEGER",
            DataType::Text => "TEXT",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ColumnConstraint {
    PrimaryKey,
    AutoIncrement,
    NotNull,
}

impl ColumnConstraint {
    fn as_sql(&self) -> &'static str {
        match self {
            ColumnConstraint::PrimaryKey => "PRIMARY KEY",
            ColumnConstraint::AutoIncrement => "AUTOINCREMENT",
            ColumnConstraint::NotNull => "NOT NULL",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DefaultValue {
    Text(String),
}

impl DefaultValue {
    fn to_sql(&self) -> String {
        match self {
            DefaultValue::Text(s) => format!("'{}'", s.replace('\'', "''")),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndexDefinition {
    pub name: String,
    pub columns: Vec<String>,
}

impl IndexDefinition {
    fn create_statement(&self, table: &str) -> String {
        format!(
            "CREATE INDEX IF NOT EXISTS {} ON {} ({})",
            self.name,
            table,
            self.columns.join(", ")
        )
    }
}

/// Tables used by the tracker.
///
/// `production_orders.product_name` carries no foreign key to
/// `products.name`.
pub fn tracker_schema() -> Schema {
    let id = || {
        ColumnDefinition::new("id", DataType::Integer)
            .with_constraint(ColumnConstraint::PrimaryKey)
            .with_constraint(ColumnConstraint::AutoIncrement)
    };
    let required = |name: &str, data_type| {
        ColumnDefinition::new(name, data_type).with_constraint(ColumnConstraint::NotNull)
    };

    Schema::new()
        .add_table(
            TableDefinition::new(PRODUCTS_TABLE)
                .with_column(id())
                .with_column(required("name", DataType::Text))
                .with_column(required("initial_quantity", DataType::Integer))
                .with_index(IndexDefinition {
                    name: "idx_products_name".to_string(),
                    columns: vec!["name".to_string()],
                }),
        )
        .add_table(
            TableDefinition::new(ORDERS_TABLE)
                .with_column(id())
                .with_column(required("product_name", DataType::Text))
                .with_column(required("quantity", DataType::Integer))
                .with_column(required("delivery_date", DataType::Text))
                .with_column(
                    required("status", DataType::Text).with_default(DefaultValue::Text(
                        OrderStatus::InProgress.as_str().to_string(),
                    )),
                ),
        )
}

/// Store configuration
#[derive(Debug, Clone, PartialEq)]
pub struct StoreConfig {
    /// Path to the SQLite database file
    pub db_path: PathBuf,
}

impl StoreConfig {
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::new(DEFAULT_DB_PATH)
    }
}

/// Products and production orders persisted in a single SQLite connection.
///
/// The connection lives as long as the store; call [`ProductionStore::close`]
/// to release it and observe close errors.
pub struct ProductionStore {
    conn: Connection,
}

impl ProductionStore {
    /// Open (or create) the database file and make sure the schema exists.
    pub fn open(config: &StoreConfig) -> Result<Self, StoreError> {
        let path = config.db_path.as_path();
        info!(path = %path.display(), "opening production database");
        let conn = Connection::open(path).map_err(|source| StoreError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_connection(conn)
    }

    /// In-memory database, mostly for tests.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(|source| StoreError::Open {
            path: PathBuf::from(":memory:"),
            source,
        })?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        let store = Self { conn };
        store.ensure_schema()?;
        Ok(store)
    }

    pub fn close(self) -> Result<(), StoreError> {
        debug!("closing production database");
        self.conn.close().map_err(|(_, e)| StoreError::Close(e))
    }

    /// Create the tracker tables and indexes if they are missing.
    pub fn ensure_schema(&self) -> Result<(), StoreError> {
        for table in tracker_schema().tables {
            let schema_err = |source: rusqlite::Error| StoreError::Schema {
                table: table.name.clone(),
                source,
            };
            self.conn
                .execute_batch(&table.create_statement())
                .map_err(schema_err)?;
            for index in &table.indexes {
                self.conn
                    .execute_batch(&index.create_statement(&table.name))
                    .map_err(schema_err)?;
            }
        }
        Ok(())
    }

    pub fn add_product(&self, name: &str, initial_quantity: i64) -> Result<Product, StoreError> {
        self.conn.execute(
            "INSERT INTO products (name, initial_quantity) VALUES (?1, ?2)",
            params![name, initial_quantity],
        )?;
        let product = Product {
            id: self.conn.last_insert_rowid(),
            name: name.to_string(),
            initial_quantity,
        };
        debug!(id = product.id, name, initial_quantity, "product registered");
        Ok(product)
    }

    pub fn list_products(&self) -> Result<Vec<Product>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, initial_quantity FROM products ORDER BY id")?;
        let products = stmt
            .query_map([], product_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(products)
    }

    /// Register an order. New orders always start in progress.
    pub fn add_order(
        &self,
        product_name: &str,
        quantity: i64,
        delivery_date: &str,
    ) -> Result<ProductionOrder, StoreError> {
        let status = OrderStatus::InProgress;
        self.conn.execute(
            "INSERT INTO production_orders (product_name, quantity, delivery_date, status) \
             VALUES (?1, ?2, ?3, ?4)",
            params![product_name, quantity, delivery_date, status],
        )?;
        let order = ProductionOrder {
            id: self.conn.last_insert_rowid(),
            product_name: product_name.to_string(),
            quantity,
            delivery_date: delivery_date.to_string(),
            status,
        };
        debug!(id = order.id, product_name, quantity, "production order registered");
        Ok(order)
    }

    pub fn list_orders(&self) -> Result<Vec<ProductionOrder>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, product_name, quantity, delivery_date, status \
             FROM production_orders ORDER BY id",
        )?;
        let orders = stmt
            .query_map([], order_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(orders)
    }

    pub fn get_order(&self, id: i64) -> Result<Option<ProductionOrder>, StoreError> {
        let order = self
            .conn
            .query_row(
                "SELECT id, product_name, quantity, delivery_date, status \
                 FROM production_orders WHERE id = ?1",
                [id],
                order_from_row,
            )
            .optional()?;
        Ok(order)
    }

    /// Compare the stock of the first product named `product_name` against
    /// `required_quantity`.
    pub fn check_availability(
        &self,
        product_name: &str,
        required_quantity: i64,
    ) -> Result<Availability, StoreError> {
        let available: Option<i64> = self
            .conn
            .query_row(
                "SELECT initial_quantity FROM products WHERE name = ?1 ORDER BY id LIMIT 1",
                [product_name],
                |row| row.get(0),
            )
            .optional()?;

        Ok(match available {
            None => Availability::NotFound,
            Some(available) if available >= required_quantity => Availability::Producible {
                available,
                required: required_quantity,
            },
            Some(available) => Availability::Insufficient {
                available,
                required: required_quantity,
            },
        })
    }

    /// Set the status of order `order_id`, returning the number of rows changed.
    ///
    /// An unknown id is not an error; it simply changes nothing.
    pub fn update_order_status(
        &self,
        order_id: i64,
        status: OrderStatus,
    ) -> Result<usize, StoreError> {
        let changed = self.conn.execute(
            "UPDATE production_orders SET status = ?1 WHERE id = ?2",
            params![status, order_id],
        )?;
        if changed == 0 {
            warn!(order_id, %status, "status update matched no production order");
        } else {
            debug!(order_id, %status, "production order status updated");
        }
        Ok(changed)
    }

    pub fn production_report(&self) -> Result<ProductionReport, StoreError> {
        Ok(ProductionReport {
            in_progress: self.orders_with_status(OrderStatus::InProgress)?,
            completed: self.orders_with_status(OrderStatus::Completed)?,
        })
    }

    fn orders_with_status(&self, status: OrderStatus) -> Result<Vec<ProductionOrder>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, product_name, quantity, delivery_date, status \
             FROM production_orders WHERE status = ?1 ORDER BY id",
        )?;
        let orders = stmt
            .query_map([status], order_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(orders)
    }
}

fn product_from_row(row: &Row<'_>) -> rusqlite::Result<Product> {
    Ok(Product {
        id: row.get(0)?,
        name: row.get(1)?,
        initial_quantity: row.get(2)?,
    })
}

fn order_from_row(row: &Row<'_>) -> rusqlite::Result<ProductionOrder> {
    Ok(ProductionOrder {
        id: row.get(0)?,
        product_name: row.get(1)?,
        quantity: row.get(2)?,
        delivery_date: row.get(3)?,
        status: row.get(4)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_products_table() {
        let schema = tracker_schema();
        assert_eq!(
            schema.tables[0].create_statement(),
            "CREATE TABLE IF NOT EXISTS products (id INTEGER PRIMARY KEY AUTOINCREMENT, \
             name TEXT NOT NULL, initial_quantity INTEGER NOT NULL)"
        );
    }

    #[test]
    fn renders_status_default_and_index() {
        let schema = tracker_schema();
        let orders = &schema.tables[1];
        assert!(orders
            .create_statement()
            .ends_with("status TEXT NOT NULL DEFAULT 'In progress')"));

        let products = &schema.tables[0];
        assert_eq!(
            products.indexes[0].create_statement(&products.name),
            "CREATE INDEX IF NOT EXISTS idx_products_name ON products (name)"
        );
    }

    #[test]
    fn renders_orders_table() {
        let schema = tracker_schema();
        assert_eq!(schema.tables.len(), 2);
        assert_eq!(
            schema.tables[1].create_statement(),
            "CREATE TABLE IF NOT EXISTS production_orders (\
             id INTEGER PRIMARY KEY AUTOINCREMENT, product_name TEXT NOT NULL, \
             quantity INTEGER NOT NULL, delivery_date TEXT NOT NULL, \
             status TEXT NOT NULL DEFAULT 'In progress')"
        );
        assert!(schema.tables[1].indexes.is_empty());
    }

    #[test]
    fn escapes_text_defaults() {
        assert_eq!(DefaultValue::Text("it's".to_string()).to_sql(), "'it''s'");
    }

    #[test]
    fn ensure_schema_is_idempotent() {
        let store = ProductionStore::open_in_memory().unwrap();
        store.ensure_schema().unwrap();
        store.ensure_schema().unwrap();
        assert!(store.list_products().unwrap().is_empty());
        assert!(store.list_orders().unwrap().is_empty());
    }

    #[test]
    fn first_matching_product_wins() {
        let store = ProductionStore::open_in_memory().unwrap();
        store.add_product("Widget", 3).unwrap();
        store.add_product("Widget", 50).unwrap();
        assert_eq!(
            store.check_availability("Widget", 5).unwrap(),
            Availability::Insufficient {
                available: 3,
                required: 5
            }
        );
    }

    #[test]
    fn unknown_stored_status_is_a_query_error() {
        let store = ProductionStore::open_in_memory().unwrap();
        store
            .conn
            .execute(
                "INSERT INTO production_orders (product_name, quantity, delivery_date, status) \
                 VALUES ('Chair', 1, '2024-01-01', 'Done')",
                [],
            )
            .unwrap();
        assert!(matches!(store.list_orders(), Err(StoreError::Query(_))));
        // Excluded from both report buckets rather than failing the report.
        let report = store.production_report().unwrap();
        assert!(report.in_progress.is_empty());
        assert!(report.completed.is_empty());
    }
}
