/*!
 * Transaction Helper Utilities
 *
 * Scoped acquisition for multi-statement operations: the transaction commits
 * when the callback returns `Ok` and rolls back on `Err` or on drop.
 */

use sea_orm::{DatabaseConnection, DatabaseTransaction, DbErr, TransactionError, TransactionTrait};
use std::future::Future;
use std::pin::Pin;
use tracing::{debug, warn};

/// Type alias for boxed future used in transactions
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Execute a function within a database transaction
///
/// The callback's own error type is preserved, so a `ServiceError::Conflict`
/// raised inside the transaction reaches the caller unchanged.
///
/// ```rust,ignore
/// let order_id = with_transaction(&db, |txn| {
///     Box::pin(async move {
///         let order = order::ActiveModel { .. }.insert(txn).await?;
///         order_detail::ActiveModel { .. }.insert(txn).await?;
///         Ok::<_, ServiceError>(order.id)
///     })
/// })
/// .await?;
/// ```
pub async fn with_transaction<F, T, E>(db: &DatabaseConnection, f: F) -> Result<T, E>
where
    F: for<'c> FnOnce(&'c DatabaseTransaction) -> BoxFuture<'c, Result<T, E>> + Send,
    T: Send,
    E: From<DbErr> + std::error::Error + Send,
{
    let start = std::time::Instant::now();
    debug!("Starting database transaction");

    let result = db.transaction::<F, T, E>(f).await;

    match &result {
        Ok(_) => debug!("Transaction committed in {:?}", start.elapsed()),
        Err(e) => warn!("Transaction rolled back after {:?}: {}", start.elapsed(), e),
    }

    result.map_err(|e| match e {
        TransactionError::Connection(db_err) => E::from(db_err),
        TransactionError::Transaction(err) => err,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{ensure_schema, establish_connection};
    use crate::entities::category;
    use crate::errors::ServiceError;
    use sea_orm::{ActiveModelTrait, EntityTrait, PaginatorTrait, Set};

    #[tokio::test]
    async fn commits_on_ok_and_rolls_back_on_err() {
        let db = establish_connection("sqlite::memory:").await.unwrap();
        ensure_schema(&db).await.unwrap();

        with_transaction(&db, |txn| {
            Box::pin(async move {
                category::ActiveModel {
                    name: Set("Boots".to_string()),
                    description: Set(None),
                    ..Default::default()
                }
                .insert(txn)
                .await?;
                Ok::<_, ServiceError>(())
            })
        })
        .await
        .unwrap();

        let err = with_transaction(&db, |txn| {
            Box::pin(async move {
                category::ActiveModel {
                    name: Set("Clogs".to_string()),
                    description: Set(None),
                    ..Default::default()
                }
                .insert(txn)
                .await?;
                Err::<(), _>(ServiceError::conflict("abort"))
            })
        })
        .await
        .unwrap_err();

        assert!(matches!(err, ServiceError::Conflict(_)));
        assert_eq!(category::Entity::find().count(&db).await.unwrap(), 1);
    }
}
