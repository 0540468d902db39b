use std::future::Future;

use repokit_core::Error;

use super::keeper::SessionKeeper;
use super::session::Session;

/// Runs `fut` as a unit of work on the current context's session.
///
/// Commits when `fut` succeeds. When it fails the session is rolled back and
/// the original error returned; a failing rollback is only logged. In
/// unit-test mode `fut` runs bare so the test can inspect or discard the
/// pending writes itself.
///
/// There are no savepoints: a nested call commits everything staged on the
/// session so far.
pub async fn transactional<Fut, T, E>(keeper: &SessionKeeper, fut: Fut) -> Result<T, E>
where
    Fut: Future<Output = Result<T, E>>,
    E: From<Error>,
{
    if keeper.unit_testing() {
        return fut.await;
    }
    let session = keeper.session()?;
    with_transaction(&session, fut).await
}

/// Commit-or-rollback around `fut` on an explicit session.
pub async fn with_transaction<Fut, T, E>(session: &Session, fut: Fut) -> Result<T, E>
where
    Fut: Future<Output = Result<T, E>>,
    E: From<Error>,
{
    match fut.await {
        Ok(value) => {
            session.commit().await?;
            Ok(value)
        }
        Err(e) => {
            if let Err(rollback_err) = session.rollback().await {
                tracing::warn!(
                    session = %session.id(),
                    error = %rollback_err,
                    "Rollback failed; returning the original error"
                );
            }
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use repokit_core::Error;

    use super::*;
    use crate::db::session_scope;
    use crate::models::UserRepository;
    use crate::testing::{attrs, TestDatabase};

    #[tokio::test]
    async fn test_success_commits() {
        let db = TestDatabase::new().await;
        let keeper = Arc::clone(&db.keeper);
        session_scope(&db.keeper, |session| async move {
            let users = UserRepository::new(Arc::clone(&session));
            transactional(&keeper, users.create(attrs([("name", "Alice".into())]), false))
                .await?;
            assert!(!session.has_pending_writes().await);
            assert_eq!(users.count(vec![], vec![], vec![]).await?, 1);
            Ok::<_, Error>(())
        })
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_failure_rolls_back_and_keeps_the_error() {
        let db = TestDatabase::new().await;
        let keeper = Arc::clone(&db.keeper);
        session_scope(&db.keeper, |session| async move {
            let users = UserRepository::new(Arc::clone(&session));
            let err = transactional(&keeper, async {
                users
                    .create(attrs([("name", "Alice".into())]), false)
                    .await?;
                Err::<(), _>(Error::validation("boom"))
            })
            .await
            .unwrap_err();

            assert_eq!(err, Error::validation("boom"));
            assert!(!session.has_pending_writes().await);
            assert_eq!(users.count(vec![], vec![], vec![]).await?, 0);
            Ok::<_, Error>(())
        })
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_nested_calls_share_the_session() {
        let db = TestDatabase::new().await;
        let keeper = Arc::clone(&db.keeper);
        session_scope(&db.keeper, |session| async move {
            let users = UserRepository::new(session);
            transactional(&keeper, async {
                users
                    .create(attrs([("name", "Alice".into())]), false)
                    .await?;
                transactional(&keeper, users.create(attrs([("name", "Bob".into())]), false))
                    .await?;
                Ok::<_, Error>(())
            })
            .await?;
            assert_eq!(users.count(vec![], vec![], vec![]).await?, 2);
            Ok::<_, Error>(())
        })
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_outside_any_scope_is_a_configuration_error() {
        let db = TestDatabase::new().await;
        let err = transactional(&db.keeper, async { Ok::<_, Error>(()) })
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }
}
