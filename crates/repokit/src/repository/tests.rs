use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use repokit_core::{Column, Error, OrderSpec, QueryOptions, Record, Value};
use tokio::sync::oneshot;

use super::SynchronizeSession;
use crate::db::session_scope;
use crate::models::{Post, PostRepository, User, UserRepository};
use crate::testing::{attrs, TestDatabase};

fn joins(names: &[&str]) -> BTreeSet<String> {
    names.iter().map(|name| name.to_string()).collect()
}

async fn seed(users: &UserRepository, names: &[&str]) -> Vec<User> {
    let rows = names
        .iter()
        .map(|name| attrs([("name", (*name).into())]))
        .collect();
    users.create_many(rows, true).await.unwrap()
}

#[tokio::test]
async fn test_create_returns_the_stored_record() {
    let db = TestDatabase::new().await;
    session_scope(&db.keeper, |session| async move {
        let users = UserRepository::new(session);
        let alice = users
            .create(attrs([("name", "Alice".into())]), true)
            .await?;

        assert!(alice.id > 0);
        assert_eq!(alice.name, "Alice");
        assert_eq!(alice.email, None);
        assert_eq!(alice.updated_at, None);
        assert_eq!(users.count(vec![], vec![], vec![]).await?, 1);
        Ok::<_, Error>(())
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn test_create_rejects_unknown_columns() {
    let db = TestDatabase::new().await;
    session_scope(&db.keeper, |session| async move {
        let users = UserRepository::new(session);
        let err = users
            .create(attrs([("name", "Alice".into()), ("age", 30.into())]), true)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        Ok::<_, Error>(())
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn test_create_many_with_empty_list_is_a_no_op() {
    let db = TestDatabase::new().await;
    session_scope(&db.keeper, |session| async move {
        let users = UserRepository::new(Arc::clone(&session));
        assert!(users.create_many(vec![], true).await?.is_empty());
        assert!(!session.has_pending_writes().await);
        Ok::<_, Error>(())
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn test_create_many_rejects_ragged_rows() {
    let db = TestDatabase::new().await;
    session_scope(&db.keeper, |session| async move {
        let users = UserRepository::new(session);
        let rows = vec![
            attrs([("name", "Alice".into())]),
            attrs([("name", "Bob".into()), ("email", "bob@example.com".into())]),
        ];
        let err = users.create_many(rows, true).await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        Ok::<_, Error>(())
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn test_reads_see_own_uncommitted_writes() {
    let db = TestDatabase::new().await;
    session_scope(&db.keeper, |session| async move {
        let users = UserRepository::new(Arc::clone(&session));
        users.create(attrs([("name", "Alice".into())]), false).await?;

        assert!(session.has_pending_writes().await);
        let found = users
            .first_by("name", "Alice", QueryOptions::new())
            .await?;
        assert!(found.is_some());
        Ok::<_, Error>(())
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn test_ordering_and_pagination() {
    let db = TestDatabase::new().await;
    session_scope(&db.keeper, |session| async move {
        let users = UserRepository::new(session);
        seed(&users, &["Alice", "Bob", "Carol"]).await;

        let page = users
            .get_many(
                &QueryOptions::new()
                    .order(OrderSpec::desc(["name"]))
                    .skip(1)
                    .limit(1),
            )
            .await?;
        let names: Vec<&str> = page.iter().map(|u| u.name.as_str()).collect();
        assert_eq!(names, ["Bob"]);

        let all = users
            .get_all(BTreeSet::new(), Some(OrderSpec::asc(["name"])), vec![])
            .await?;
        let names: Vec<&str> = all.iter().map(|u| u.name.as_str()).collect();
        assert_eq!(names, ["Alice", "Bob", "Carol"]);

        let tail = users
            .get_many(&QueryOptions::new().order(OrderSpec::asc(["id"])).skip(2))
            .await?;
        assert_eq!(tail.len(), 1);
        assert_eq!(tail[0].name, "Carol");
        Ok::<_, Error>(())
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn test_unknown_order_field_is_a_validation_error() {
    let db = TestDatabase::new().await;
    session_scope(&db.keeper, |session| async move {
        let users = UserRepository::new(session);
        let err = users
            .get_many(&QueryOptions::new().order(OrderSpec::asc(["age"])))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        Ok::<_, Error>(())
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn test_update_returns_first_updated_record() {
    let db = TestDatabase::new().await;
    session_scope(&db.keeper, |session| async move {
        let users = UserRepository::new(session);
        let alice = users
            .create(attrs([("name", "Alice".into())]), true)
            .await?;

        let updated = users
            .update(
                vec![User::column("id").eq(alice.id)],
                attrs([("email", "alice@example.com".into())]),
                true,
            )
            .await?
            .unwrap();
        assert_eq!(updated.email.as_deref(), Some("alice@example.com"));

        let missing = users
            .update(
                vec![User::column("id").eq(alice.id + 100)],
                attrs([("email", "nobody@example.com".into())]),
                true,
            )
            .await?;
        assert!(missing.is_none());

        let err = users
            .update(vec![], attrs([]), true)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        Ok::<_, Error>(())
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn test_upsert_replaces_every_offered_attribute() {
    let db = TestDatabase::new().await;
    session_scope(&db.keeper, |session| async move {
        let users = UserRepository::new(session);
        let eager = BTreeSet::new();

        let first = users
            .upsert(
                &["name"],
                attrs([
                    ("name", "Alice".into()),
                    ("email", "alice@example.com".into()),
                    ("nickname", "Al".into()),
                ]),
                true,
                &eager,
            )
            .await?
            .unwrap();
        assert_eq!(first.email.as_deref(), Some("alice@example.com"));
        assert!(first.updated_at.is_some());

        // Attributes not offered keep their stored value.
        let second = users
            .upsert(&["name"], attrs([("name", "Alice".into())]), true, &eager)
            .await?
            .unwrap();
        assert_eq!(second.id, first.id);
        assert_eq!(second.email.as_deref(), Some("alice@example.com"));

        // Offered attributes overwrite, nulls included.
        let third = users
            .upsert(
                &["name"],
                attrs([("name", "Alice".into()), ("email", Value::Null)]),
                true,
                &eager,
            )
            .await?
            .unwrap();
        assert_eq!(third.id, first.id);
        assert_eq!(third.email, None);

        assert_eq!(users.count(vec![], vec![], vec![]).await?, 1);
        Ok::<_, Error>(())
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn test_upsert_reads_back_through_first_by() {
    let db = TestDatabase::new().await;
    session_scope(&db.keeper, |session| async move {
        let users = UserRepository::new(session);
        for email in ["alice@example.com", "alice@work.test"] {
            let offered = attrs([("name", "Alice".into()), ("email", email.into())]);
            users
                .upsert(&["name"], offered.clone(), true, &BTreeSet::new())
                .await?;

            let stored = users
                .get_rows(&QueryOptions::new().filter(User::column("name").eq("Alice")))
                .await?;
            assert_eq!(stored.len(), 1);
            for (column, value) in &offered {
                assert_eq!(stored[0].value(column), Some(value), "{column}");
            }

            let alice = users
                .first_by("name", "Alice", QueryOptions::new())
                .await?
                .unwrap();
            assert_eq!(alice.email.as_deref(), Some(email));
        }
        Ok::<_, Error>(())
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn test_upsert_rejects_unknown_conflict_keys() {
    let db = TestDatabase::new().await;
    session_scope(&db.keeper, |session| async move {
        let users = UserRepository::new(session);
        let err = users
            .upsert(
                &["nickname"],
                attrs([("name", "Alice".into())]),
                true,
                &BTreeSet::new(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        Ok::<_, Error>(())
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn test_upsert_many_updates_conflicting_rows() {
    let db = TestDatabase::new().await;
    session_scope(&db.keeper, |session| async move {
        let users = UserRepository::new(session);
        let rows = |domain: &str| {
            vec![
                attrs([("name", "Alice".into()), ("email", format!("alice@{domain}").into())]),
                attrs([("name", "Bob".into()), ("email", format!("bob@{domain}").into())]),
            ]
        };

        let inserted = users.upsert_many(&["name"], rows("one.test"), true).await?;
        assert_eq!(inserted.len(), 2);

        let updated = users.upsert_many(&["name"], rows("two.test"), true).await?;
        assert_eq!(updated.len(), 2);
        assert!(updated
            .iter()
            .all(|u| u.email.as_deref().is_some_and(|e| e.ends_with("@two.test"))));

        assert_eq!(users.count(vec![], vec![], vec![]).await?, 2);
        assert!(users.upsert_many(&["name"], vec![], true).await?.is_empty());
        Ok::<_, Error>(())
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn test_delete_returns_the_deleted_records_in_every_mode() {
    let db = TestDatabase::new().await;
    session_scope(&db.keeper, |session| async move {
        let users = UserRepository::new(session);
        seed(&users, &["Alice", "Bob", "Carol", "Dave"]).await;

        for (name, mode) in [
            ("Alice", SynchronizeSession::False),
            ("Bob", SynchronizeSession::Fetch),
            ("Carol", SynchronizeSession::Evaluate),
        ] {
            let deleted = users
                .delete(vec![User::column("name").eq(name)], mode)
                .await?;
            assert_eq!(deleted.len(), 1, "{mode:?}");
            assert_eq!(deleted[0].name, name);
            assert!(!users.exists(vec![User::column("name").eq(name)]).await?);
        }

        let nothing = users
            .delete(
                vec![User::column("name").eq("Zed")],
                SynchronizeSession::Evaluate,
            )
            .await?;
        assert!(nothing.is_empty());

        users.commit().await?;
        assert_eq!(users.count(vec![], vec![], vec![]).await?, 1);
        Ok::<_, Error>(())
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn test_delete_snapshot_includes_rows_committed_by_a_concurrent_writer() {
    let db = TestDatabase::new().await;
    session_scope(&db.keeper, |session| async move {
        seed(&UserRepository::new(session), &["Alice1"]).await;
        Ok::<_, Error>(())
    })
    .await
    .unwrap();

    // The other session holds the write lock until it commits a second match.
    let (inserted_tx, inserted_rx) = oneshot::channel::<()>();
    let writer_keeper = Arc::clone(&db.keeper);
    let writer = tokio::spawn(async move {
        session_scope(&writer_keeper, |session| async move {
            let users = UserRepository::new(session);
            users
                .create(attrs([("name", "Alice2".into())]), false)
                .await?;
            let _ = inserted_tx.send(());
            tokio::time::sleep(Duration::from_millis(300)).await;
            users.commit().await?;
            Ok::<_, Error>(())
        })
        .await
    });

    inserted_rx.await.unwrap();
    let victims = session_scope(&db.keeper, |session| async move {
        let users = UserRepository::new(session);
        let victims = users
            .delete(
                vec![User::column("name").like("Alice%")],
                SynchronizeSession::False,
            )
            .await?;
        users.commit().await?;
        Ok::<_, Error>(victims)
    })
    .await
    .unwrap();
    writer.await.unwrap().unwrap();

    let mut names: Vec<String> = victims.into_iter().map(|user| user.name).collect();
    names.sort();
    assert_eq!(names, ["Alice1", "Alice2"]);

    let left = session_scope(&db.keeper, |session| async move {
        UserRepository::new(session)
            .count(vec![], vec![], vec![])
            .await
    })
    .await
    .unwrap();
    assert_eq!(left, 0);
}

#[tokio::test]
async fn test_delete_record_by_primary_key() {
    let db = TestDatabase::new().await;
    session_scope(&db.keeper, |session| async move {
        let users = UserRepository::new(session);
        let alice = users
            .create(attrs([("name", "Alice".into())]), true)
            .await?;

        assert!(users.delete_record(&alice).await?);
        assert!(!users.delete_record(&alice).await?);
        Ok::<_, Error>(())
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn test_exists() {
    let db = TestDatabase::new().await;
    session_scope(&db.keeper, |session| async move {
        let users = UserRepository::new(session);
        assert!(!users.exists(vec![]).await?);

        seed(&users, &["Alice"]).await;
        assert!(users.exists(vec![]).await?);
        assert!(users.exists(vec![User::column("name").like("A%")]).await?);
        assert!(!users.exists(vec![User::column("name").eq("Bob")]).await?);
        Ok::<_, Error>(())
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn test_get_by_and_first_by() {
    let db = TestDatabase::new().await;
    session_scope(&db.keeper, |session| async move {
        let users = UserRepository::new(session);
        seed(&users, &["Alice", "Bob"]).await;

        let found = users
            .get_by("name", "Bob", None, None, BTreeSet::new())
            .await?;
        assert_eq!(found.len(), 1);

        let first = users
            .first(&QueryOptions::new().order(OrderSpec::desc(["name"])))
            .await?
            .unwrap();
        assert_eq!(first.name, "Bob");

        assert!(users
            .first_by("name", "Nobody", QueryOptions::new())
            .await?
            .is_none());

        let err = users
            .first_by("age", 3, QueryOptions::new())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        Ok::<_, Error>(())
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn test_count_with_distinct_columns() {
    let db = TestDatabase::new().await;
    session_scope(&db.keeper, |session| async move {
        let users = UserRepository::new(session);
        let rows = vec![
            attrs([("name", "Alice".into()), ("email", "shared@example.com".into())]),
            attrs([("name", "Bob".into()), ("email", "shared@example.com".into())]),
            attrs([("name", "Carol".into()), ("email", "carol@example.com".into())]),
        ];
        users.create_many(rows, true).await?;

        assert_eq!(users.count(vec![], vec![], vec![]).await?, 3);
        assert_eq!(
            users
                .count(vec![], vec![], vec![User::column("email")])
                .await?,
            2
        );
        assert_eq!(
            users
                .count(vec![User::column("name").ne("Alice")], vec![], vec![])
                .await?,
            2
        );
        Ok::<_, Error>(())
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn test_get_rows_projects_fields() {
    let db = TestDatabase::new().await;
    session_scope(&db.keeper, |session| async move {
        let users = UserRepository::new(session);
        seed(&users, &["Alice"]).await;

        let rows = users
            .get_rows(&QueryOptions::new().fields(vec![User::column("name")]))
            .await?;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].columns(), ["name".to_string()]);
        assert_eq!(rows[0].get::<String>("name")?, "Alice");
        Ok::<_, Error>(())
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn test_named_join_fills_joined_columns() {
    let db = TestDatabase::new().await;
    session_scope(&db.keeper, |session| async move {
        let users = UserRepository::new(Arc::clone(&session));
        let posts = PostRepository::new(session);

        let alice = users
            .create(attrs([("name", "Alice".into())]), true)
            .await?;
        posts
            .create(
                attrs([("user_id", alice.id.into()), ("title", "Hello".into())]),
                true,
            )
            .await?;

        let plain: Vec<Post> = posts.get_all(BTreeSet::new(), None, vec![]).await?;
        assert_eq!(plain[0].author_name, None);

        let joined = posts.get_all(joins(&["author"]), None, vec![]).await?;
        assert_eq!(joined[0].author_name.as_deref(), Some("Alice"));

        let ordered = posts
            .get_many(
                &QueryOptions::new()
                    .join("author")
                    .order(OrderSpec::asc([repokit_core::OrderEntry::related(
                        "users", "name",
                    )]))
                    .filter(Column::new("users", "name").eq("Alice")),
            )
            .await?;
        assert_eq!(ordered.len(), 1);

        let err = posts
            .get_all(joins(&["comments"]), None, vec![])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
        Ok::<_, Error>(())
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn test_upsert_with_eager_join_reloads_record() {
    let db = TestDatabase::new().await;
    session_scope(&db.keeper, |session| async move {
        let users = UserRepository::new(Arc::clone(&session));
        let posts = PostRepository::new(session);

        let alice = users
            .create(attrs([("name", "Alice".into())]), true)
            .await?;
        let post = posts
            .upsert(
                &["id"],
                attrs([("user_id", alice.id.into()), ("title", "Hello".into())]),
                true,
                &joins(&["author"]),
            )
            .await?
            .unwrap();
        assert_eq!(post.author_name.as_deref(), Some("Alice"));
        Ok::<_, Error>(())
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn test_failed_statement_surfaces_as_system_error() {
    let db = TestDatabase::new().await;
    session_scope(&db.keeper, |session| async move {
        let users = UserRepository::new(session);
        seed(&users, &["Alice"]).await;
        let err = users
            .create(attrs([("name", "Alice".into())]), true)
            .await
            .unwrap_err();
        assert!(err.is_system());
        assert!(err.to_string().contains("UNIQUE"));
        Ok::<_, Error>(())
    })
    .await
    .unwrap();
}
