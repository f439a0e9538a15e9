//! Transactions on a [`Db`] handle.
//!
//! [`Db::begin`] issues `BEGIN` on the handle's connection and returns a [`Tx`] that
//! dereferences to the handle, so every record operation is available inside the transaction.
//! Finish it with [`Tx::commit`] or [`Tx::rollback`].
//!
//! For ergonomic commit/rollback handling, use the [`transaction!`](crate::transaction!) macro.
//!
//! # Example
//!
//! ```ignore
//! let mut db = Db::new(SqliteClient::open_in_memory()?);
//!
//! rowmap::transaction!(db, tx, {
//!     tx.insert(&apple).await?;
//!     tx.insert(&msft).await?;
//!     Ok(())
//! })?;
//! ```

use crate::client::GenericClient;
use crate::config::StmtOptions;
use crate::db::Db;
use crate::error::OrmResult;
use std::ops::Deref;

/// Runs the given block inside a database transaction.
///
/// - Begins a transaction via `$db.begin().await`.
/// - Commits on `Ok(_)`.
/// - Rolls back on `Err(_)`.
///
/// The block must evaluate to `rowmap::OrmResult<T>`.
#[macro_export]
macro_rules! transaction {
    ($db:expr, $tx:ident, $body:block) => {{
        let $tx = ($db).begin().await?;

        let __rowmap_tx_body_result = async { $body }.await;
        match __rowmap_tx_body_result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(error) => match $tx.rollback().await {
                Ok(()) => Err(error),
                Err(rollback_err) => Err($crate::OrmError::Other(format!(
                    "{error} (rollback failed: {rollback_err})"
                ))),
            },
        }
    }};
}

/// An open transaction borrowing its [`Db`].
///
/// Dropping a `Tx` without finishing it leaves the transaction open on the connection; a warning
/// is emitted on target `rowmap.sql` when that happens.
#[must_use = "a transaction must be committed or rolled back"]
pub struct Tx<'a, C: GenericClient> {
    db: &'a mut Db<C>,
    finished: bool,
}

impl<C: GenericClient> Db<C> {
    /// Start a transaction.
    ///
    /// Takes the handle mutably so no statement can run outside the transaction while it is
    /// open.
    pub async fn begin(&mut self) -> OrmResult<Tx<'_, C>> {
        self.exec("BEGIN", &[], &StmtOptions::NONE).await?;
        Ok(Tx {
            db: self,
            finished: false,
        })
    }
}

impl<C: GenericClient> Tx<'_, C> {
    /// Make every statement of the transaction durable.
    pub async fn commit(mut self) -> OrmResult<()> {
        self.finished = true;
        self.db.exec("COMMIT", &[], &StmtOptions::NONE).await?;
        Ok(())
    }

    /// Discard every statement of the transaction.
    pub async fn rollback(mut self) -> OrmResult<()> {
        self.finished = true;
        self.db.exec("ROLLBACK", &[], &StmtOptions::NONE).await?;
        Ok(())
    }
}

impl<C: GenericClient> Deref for Tx<'_, C> {
    type Target = Db<C>;

    fn deref(&self) -> &Db<C> {
        self.db
    }
}

impl<C: GenericClient> Drop for Tx<'_, C> {
    fn drop(&mut self) {
        if !self.finished {
            tracing::warn!(
                target: "rowmap.sql",
                "transaction dropped without commit or rollback"
            );
        }
    }
}
