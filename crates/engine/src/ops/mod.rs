use sea_orm::DatabaseConnection;

use crate::{EngineError, ResultEngine};

mod entries;
mod preferences;
mod stats;
mod unit_prices;

/// Run a block inside a DB transaction, committing on success and rolling back on error.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.db()?.begin().await?;
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

/// Store client for entries, unit prices and preferences.
///
/// Built once at startup and shared by the request handlers. An engine built
/// without a database answers every store call with
/// [`EngineError::Unavailable`], as does one whose connection was closed.
#[derive(Clone, Debug)]
pub struct Engine {
    database: Option<DatabaseConnection>,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    /// Whether a database was configured at startup.
    pub fn is_configured(&self) -> bool {
        self.database.is_some()
    }

    /// Round-trips to the database.
    pub async fn ping(&self) -> ResultEngine<()> {
        self.db()?.ping().await?;
        Ok(())
    }

    /// Closes the connection pool. Every later call reports the store as
    /// unavailable.
    pub async fn close(&self) -> ResultEngine<()> {
        if let Some(db) = &self.database {
            db.clone().close().await?;
            tracing::info!("database connection closed");
        }
        Ok(())
    }

    fn db(&self) -> ResultEngine<&DatabaseConnection> {
        self.database
            .as_ref()
            .ok_or_else(|| EngineError::Unavailable("Database not configured".to_string()))
    }
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: Option<DatabaseConnection>,
}

impl EngineBuilder {
    /// Pass the database. Leaving it out builds an engine whose store is
    /// unavailable.
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = Some(db);
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        Ok(Engine {
            database: self.database,
        })
    }
}
