use log::trace;
use sqlx::SqliteConnection;

use crate::{
    db::sqlite::SqliteDatabaseError,
    db_types::{NewProduct, Product},
};

const PRODUCT_COLUMNS: &str = "id, name, price, stock, is_active, created_at, updated_at";

pub async fn insert_product(product: NewProduct, conn: &mut SqliteConnection) -> Result<Product, SqliteDatabaseError> {
    if product.stock < 0 {
        return Err(SqliteDatabaseError::QueryError(format!("Stock cannot be negative. Got {}", product.stock)));
    }
    let sql = format!("INSERT INTO products (name, price, stock) VALUES ($1, $2, $3) RETURNING {PRODUCT_COLUMNS}");
    let product = sqlx::query_as::<_, Product>(&sql)
        .bind(product.name)
        .bind(product.price)
        .bind(product.stock)
        .fetch_one(conn)
        .await?;
    trace!("🗃️ Product #{} ({}) added with {} in stock", product.id, product.name, product.stock);
    Ok(product)
}

pub async fn fetch_product(id: i64, conn: &mut SqliteConnection) -> Result<Option<Product>, SqliteDatabaseError> {
    let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1");
    let product = sqlx::query_as::<_, Product>(&sql).bind(id).fetch_optional(conn).await?;
    Ok(product)
}

/// Takes `quantity` items from the product's stock in a single conditional update. Returns `false`, and changes
/// nothing, if the product does not exist or has fewer than `quantity` items left.
pub async fn decrement_stock(
    product_id: i64,
    quantity: i64,
    conn: &mut SqliteConnection,
) -> Result<bool, SqliteDatabaseError> {
    let result = sqlx::query(
        "UPDATE products SET stock = stock - $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2 AND stock >= $3",
    )
    .bind(quantity)
    .bind(product_id)
    .bind(quantity)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() > 0)
}
