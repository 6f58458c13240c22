//! Scoped, all-or-nothing execution of a unit of work.

use async_trait::async_trait;
use sea_orm::{DatabaseConnection, DatabaseTransaction, TransactionTrait};

use crate::{
    CallContext, ResultEngine,
    ports::{TransactionManager, UnitFuture},
};

/// Run `unit` inside a fresh scope of `manager`.
///
/// The scope is committed when the unit returns `Ok` and the context is still
/// live; it is rolled back when the unit fails, the context is cancelled or
/// its deadline passes. A rollback failure is logged and the unit's own error
/// is returned. Nesting is not supported: `unit` must not call `run_atomic`.
pub async fn run_atomic<M, T, F>(manager: &M, ctx: &CallContext, unit: F) -> ResultEngine<T>
where
    M: TransactionManager + ?Sized,
    T: Send,
    F: for<'s> FnOnce(&'s M::Scope) -> UnitFuture<'s, T> + Send,
{
    let scope = ctx.guard(manager.begin()).await??;

    let outcome = match ctx.guard(unit(&scope)).await {
        Ok(Ok(value)) => ctx.check().map(|()| value),
        Ok(Err(err)) | Err(err) => Err(err),
    };

    match outcome {
        Ok(value) => {
            manager.commit(scope).await?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = manager.rollback(scope).await {
                tracing::error!("rollback failed: {rollback_err} (unit error: {err})");
            }
            Err(err)
        }
    }
}

/// [`TransactionManager`] over a sea-orm connection.
///
/// Dropping a [`DatabaseTransaction`] without committing rolls it back, so an
/// abandoned operation future never leaves a half-applied unit behind.
#[derive(Clone, Debug)]
pub struct DbTransactionManager {
    database: DatabaseConnection,
}

impl DbTransactionManager {
    pub fn new(database: DatabaseConnection) -> Self {
        Self { database }
    }
}

#[async_trait]
impl TransactionManager for DbTransactionManager {
    type Scope = DatabaseTransaction;

    async fn begin(&self) -> ResultEngine<DatabaseTransaction> {
        Ok(self.database.begin().await?)
    }

    async fn commit(&self, scope: DatabaseTransaction) -> ResultEngine<()> {
        Ok(scope.commit().await?)
    }

    async fn rollback(&self, scope: DatabaseTransaction) -> ResultEngine<()> {
        Ok(scope.rollback().await?)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Mutex,
        atomic::{AtomicBool, Ordering},
    };

    use super::*;
    use crate::EngineError;

    #[derive(Default)]
    struct RecordingManager {
        events: Mutex<Vec<&'static str>>,
        fail_commit: AtomicBool,
    }

    impl RecordingManager {
        fn events(&self) -> Vec<&'static str> {
            self.events.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl TransactionManager for RecordingManager {
        type Scope = ();

        async fn begin(&self) -> ResultEngine<()> {
            self.events.lock().unwrap().push("begin");
            Ok(())
        }

        async fn commit(&self, _scope: ()) -> ResultEngine<()> {
            self.events.lock().unwrap().push("commit");
            if self.fail_commit.load(Ordering::SeqCst) {
                return Err(EngineError::KeyNotFound("commit".to_string()));
            }
            Ok(())
        }

        async fn rollback(&self, _scope: ()) -> ResultEngine<()> {
            self.events.lock().unwrap().push("rollback");
            Ok(())
        }
    }

    #[tokio::test]
    async fn commits_on_success() {
        let manager = RecordingManager::default();
        let value = run_atomic(&manager, &CallContext::new(), |_| Box::pin(async { Ok(5) }))
            .await
            .unwrap();

        assert_eq!(value, 5);
        assert_eq!(manager.events(), vec!["begin", "commit"]);
    }

    #[tokio::test]
    async fn rolls_back_on_error() {
        let manager = RecordingManager::default();
        let err = run_atomic(&manager, &CallContext::new(), |_| {
            Box::pin(async { Err::<(), _>(EngineError::InvalidAmount("x".to_string())) })
        })
        .await
        .unwrap_err();

        assert!(matches!(err, EngineError::InvalidAmount(_)));
        assert_eq!(manager.events(), vec!["begin", "rollback"]);
    }

    #[tokio::test]
    async fn commit_failure_is_reported() {
        let manager = RecordingManager::default();
        manager.fail_commit.store(true, Ordering::SeqCst);

        let err = run_atomic(&manager, &CallContext::new(), |_| Box::pin(async { Ok(()) }))
            .await
            .unwrap_err();

        assert!(matches!(err, EngineError::KeyNotFound(_)));
        assert_eq!(manager.events(), vec!["begin", "commit"]);
    }

    #[tokio::test]
    async fn cancellation_inside_unit_rolls_back() {
        let manager = RecordingManager::default();
        let (ctx, handle) = CallContext::cancellable();

        let err = run_atomic(&manager, &ctx, move |_| {
            Box::pin(async move {
                handle.cancel();
                Ok(())
            })
        })
        .await
        .unwrap_err();

        assert!(matches!(err, EngineError::Cancelled(_)));
        assert_eq!(manager.events(), vec!["begin", "rollback"]);
    }

    #[tokio::test]
    async fn cancelled_context_never_begins() {
        let manager = RecordingManager::default();
        let (ctx, handle) = CallContext::cancellable();
        handle.cancel();

        let err = run_atomic(&manager, &ctx, |_| Box::pin(async { Ok(()) }))
            .await
            .unwrap_err();

        assert!(matches!(err, EngineError::Cancelled(_)));
        assert!(manager.events().is_empty());
    }
}
