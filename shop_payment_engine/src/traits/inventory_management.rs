use crate::{
    db_types::{NewProduct, Product},
    traits::LedgerError,
};

/// Read and seed access to the Inventory Ledger. Settlement-driven stock decrements happen during reconciliation only.
#[allow(async_fn_in_trait)]
pub trait InventoryManagement {
    async fn insert_product(&self, product: NewProduct) -> Result<Product, LedgerError>;

    async fn fetch_product(&self, id: i64) -> Result<Option<Product>, LedgerError>;
}
