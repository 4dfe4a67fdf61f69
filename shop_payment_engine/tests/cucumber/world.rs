use cucumber::World;
use log::*;
use shop_payment_engine::{
    events::EventProducers,
    test_utils::prepare_env::{create_database, random_db_path, run_migrations},
    LedgerApi,
    ReconcileOutcome,
    ReconciliationApi,
    SqliteDatabase,
};

#[derive(Default, Debug, World)]
pub struct LedgerWorld {
    pub system: Option<ShopSystem>,
    pub last_outcome: Option<ReconcileOutcome>,
}

#[derive(Debug)]
pub struct ShopSystem {
    pub db_path: String,
    pub reconciler: ReconciliationApi<SqliteDatabase>,
    pub ledger: LedgerApi<SqliteDatabase>,
}

impl LedgerWorld {
    pub fn reconciler(&self) -> &ReconciliationApi<SqliteDatabase> {
        &self.system.as_ref().expect("System not initialised").reconciler
    }

    pub fn ledger(&self) -> &LedgerApi<SqliteDatabase> {
        &self.system.as_ref().expect("System not initialised").ledger
    }

    pub fn last_outcome(&self) -> &ReconcileOutcome {
        self.last_outcome.as_ref().expect("No reconciliation has run yet")
    }
}

impl ShopSystem {
    pub async fn new() -> Self {
        let url = random_db_path();
        create_database(&url).await;
        run_migrations(&url).await;
        let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating connection to database");
        debug!("🚀️ Created database: {url}");
        let reconciler = ReconciliationApi::new(db.clone(), EventProducers::default());
        let ledger = LedgerApi::new(db);
        Self { db_path: url, reconciler, ledger }
    }
}
