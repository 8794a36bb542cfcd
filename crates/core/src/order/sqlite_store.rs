//! SQLite-backed order store implementation.

use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};

use super::{
    Order, OrderError, OrderFilter, OrderStatus, OrderStore, ProductType, SizeTier,
};

const SELECT_COLUMNS: &str = "id, artwork_id, palette_id, product_type, size_tier, amount_cents, currency, status, download_ref, tracking_ref, created_at, updated_at";

/// SQLite-backed order store.
pub struct SqliteOrderStore {
    conn: Mutex<Connection>,
}

impl SqliteOrderStore {
    /// Create a new SQLite order store, creating the database file and tables if needed.
    pub fn new(path: &Path) -> Result<Self, OrderError> {
        let conn = Connection::open(path).map_err(|e| OrderError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory SQLite order store (useful for testing).
    pub fn in_memory() -> Result<Self, OrderError> {
        let conn = Connection::open_in_memory().map_err(|e| OrderError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), OrderError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS orders (
                id TEXT PRIMARY KEY,
                artwork_id TEXT NOT NULL,
                palette_id INTEGER NOT NULL,
                product_type TEXT NOT NULL,
                size_tier TEXT,
                amount_cents INTEGER NOT NULL,
                currency TEXT NOT NULL,
                status TEXT NOT NULL,
                download_ref TEXT,
                tracking_ref TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_orders_artwork_id ON orders(artwork_id);
            CREATE INDEX IF NOT EXISTS idx_orders_status ON orders(status);
            CREATE INDEX IF NOT EXISTS idx_orders_created_at ON orders(created_at);
            "#,
        )
        .map_err(|e| OrderError::Database(e.to_string()))?;

        Ok(())
    }

    fn build_where_clause(filter: &OrderFilter) -> (String, Vec<Box<dyn rusqlite::ToSql>>) {
        let mut conditions = Vec::new();
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(ref artwork_id) = filter.artwork_id {
            conditions.push("artwork_id = ?");
            params.push(Box::new(artwork_id.clone()));
        }

        if let Some(ref status) = filter.status {
            conditions.push("status = ?");
            params.push(Box::new(status.clone()));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        (where_clause, params)
    }

    fn parse_status(status: &str) -> OrderStatus {
        match status {
            "paid" => OrderStatus::Paid,
            "fulfilled" => OrderStatus::Fulfilled,
            "shipped" => OrderStatus::Shipped,
            "cancelled" => OrderStatus::Cancelled,
            _ => OrderStatus::Pending,
        }
    }

    fn parse_product_type(product: &str) -> ProductType {
        match product {
            "physical" => ProductType::Physical,
            _ => ProductType::Digital,
        }
    }

    fn parse_size_tier(tier: Option<String>) -> Option<SizeTier> {
        match tier.as_deref() {
            Some("small") => Some(SizeTier::Small),
            Some("medium") => Some(SizeTier::Medium),
            Some("large") => Some(SizeTier::Large),
            _ => None,
        }
    }

    fn row_to_order(row: &rusqlite::Row) -> rusqlite::Result<Order> {
        let id: String = row.get(0)?;
        let artwork_id: String = row.get(1)?;
        let palette_id: u32 = row.get(2)?;
        let product_type: String = row.get(3)?;
        let size_tier: Option<String> = row.get(4)?;
        let amount_cents: i64 = row.get(5)?;
        let currency: String = row.get(6)?;
        let status: String = row.get(7)?;
        let download_ref: Option<String> = row.get(8)?;
        let tracking_ref: Option<String> = row.get(9)?;
        let created_at_str: String = row.get(10)?;
        let updated_at_str: String = row.get(11)?;

        let created_at = DateTime::parse_from_rfc3339(&created_at_str)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now());

        let updated_at = DateTime::parse_from_rfc3339(&updated_at_str)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now());

        Ok(Order {
            id,
            artwork_id,
            palette_id,
            product_type: Self::parse_product_type(&product_type),
            size_tier: Self::parse_size_tier(size_tier),
            amount_cents,
            currency,
            status: Self::parse_status(&status),
            download_ref,
            tracking_ref,
            created_at,
            updated_at,
        })
    }

    fn get_locked(conn: &Connection, id: &str) -> Result<Order, OrderError> {
        let result = conn.query_row(
            &format!("SELECT {} FROM orders WHERE id = ?", SELECT_COLUMNS),
            params![id],
            Self::row_to_order,
        );

        match result {
            Ok(order) => Ok(order),
            Err(rusqlite::Error::QueryReturnedNoRows) => Err(OrderError::NotFound(id.to_string())),
            Err(e) => Err(OrderError::Database(e.to_string())),
        }
    }
}

impl OrderStore for SqliteOrderStore {
    fn insert(&self, order: &Order) -> Result<(), OrderError> {
        let conn = self.conn.lock().unwrap();

        conn.execute(
            "INSERT INTO orders (id, artwork_id, palette_id, product_type, size_tier, amount_cents, currency, status, download_ref, tracking_ref, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                order.id,
                order.artwork_id,
                order.palette_id,
                order.product_type.as_str(),
                order.size_tier.map(|t| t.as_str()),
                order.amount_cents,
                order.currency,
                order.status.as_str(),
                order.download_ref,
                order.tracking_ref,
                order.created_at.to_rfc3339(),
                order.updated_at.to_rfc3339(),
            ],
        )
        .map_err(|e| OrderError::Database(e.to_string()))?;

        Ok(())
    }

    fn get(&self, id: &str) -> Result<Order, OrderError> {
        let conn = self.conn.lock().unwrap();
        Self::get_locked(&conn, id)
    }

    fn list(&self, filter: &OrderFilter) -> Result<Vec<Order>, OrderError> {
        let conn = self.conn.lock().unwrap();

        let (where_clause, params) = Self::build_where_clause(filter);

        let sql = format!(
            "SELECT {} FROM orders {} ORDER BY created_at DESC LIMIT ? OFFSET ?",
            SELECT_COLUMNS, where_clause
        );

        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| OrderError::Database(e.to_string()))?;

        let mut all_params: Vec<Box<dyn rusqlite::ToSql>> = params;
        all_params.push(Box::new(filter.limit.unwrap_or(100)));
        all_params.push(Box::new(filter.offset.unwrap_or(0)));

        let param_refs: Vec<&dyn rusqlite::ToSql> = all_params.iter().map(|p| p.as_ref()).collect();

        let rows = stmt
            .query_map(param_refs.as_slice(), Self::row_to_order)
            .map_err(|e| OrderError::Database(e.to_string()))?;

        let mut orders = Vec::new();
        for row_result in rows {
            let order = row_result.map_err(|e| OrderError::Database(e.to_string()))?;
            orders.push(order);
        }

        Ok(orders)
    }

    fn update(
        &self,
        id: &str,
        from_status: OrderStatus,
        status: OrderStatus,
        download_ref: Option<&str>,
        tracking_ref: Option<&str>,
    ) -> Result<Order, OrderError> {
        // One lock span covers the status check and the write, so two
        // transitions validated against the same snapshot cannot both land.
        let conn = self.conn.lock().unwrap();

        let current = Self::get_locked(&conn, id)?;

        if current.status != from_status {
            return Err(OrderError::StatusConflict {
                order_id: id.to_string(),
                expected: from_status.as_str().to_string(),
                actual: current.status.as_str().to_string(),
            });
        }

        let download_ref = download_ref
            .map(String::from)
            .or(current.download_ref.clone());
        let tracking_ref = tracking_ref
            .map(String::from)
            .or(current.tracking_ref.clone());

        let now = Utc::now();
        conn.execute(
            "UPDATE orders SET status = ?, download_ref = ?, tracking_ref = ?, updated_at = ? WHERE id = ?",
            params![status.as_str(), download_ref, tracking_ref, now.to_rfc3339(), id],
        )
        .map_err(|e| OrderError::Database(e.to_string()))?;

        Ok(Order {
            status,
            download_ref,
            tracking_ref,
            updated_at: now,
            ..current
        })
    }
}
