use sea_orm::DatabaseConnection;

mod accounts;
mod balances;
mod history;
mod process;

pub use balances::AssetBalance;
pub use history::{HistoryDirection, HistoryEntry};
pub use process::{ProcessCmd, ProcessOutcome, TransactionResult};

/// Run a block inside a DB transaction, committing on success and rolling
/// back on error (an uncommitted transaction rolls back on drop).
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

/// The ledger engine.
///
/// Holds the process-wide storage handle; all coordination between concurrent
/// operations is delegated to the storage engine's transactions and row
/// locks. There is no application-level mutex or queue.
#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Construct `Engine`
    pub fn build(self) -> Engine {
        Engine {
            database: self.database,
        }
    }
}
