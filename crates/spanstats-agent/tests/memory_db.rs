//! In-memory backend semantics and client views.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::sync::Arc;

use spanstats_agent::db::instrumented::{COMPLETED_CALLS_VIEW, ROUNDTRIP_LATENCY_VIEW};
use spanstats_agent::db::{
    players_table, register_client_views, Database, InstrumentedDatabase, MemoryDatabase, Mutation,
};
use spanstats_agent::driver::player_mutation;
use spanstats_core::error::DbErrorKind;
use spanstats_core::Telemetry;

mod test_db;
use test_db::db_id;

#[test]
fn players_ddl_matches_schema() {
    let ddl = players_table().ddl();
    assert_eq!(
        ddl,
        "CREATE TABLE Players (\n  first_name STRING(1024),\n  last_name STRING(1024),\n  email STRING(1024),\n  uuid STRING(1024)\n) PRIMARY KEY (email)"
    );
}

#[tokio::test]
async fn insert_then_read_back() {
    let db = MemoryDatabase::new();
    db.create_database(&db_id(), &[players_table()]).await.unwrap();

    assert!(db
        .read_row(&db_id(), "Players", "a@b.c", &["email"])
        .await
        .unwrap()
        .is_none());

    db.write(&db_id(), vec![player_mutation("A", "B", "a@b.c", "u-1")])
        .await
        .unwrap();
    let row = db
        .read_row(&db_id(), "Players", "a@b.c", &["email", "uuid"])
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.get("uuid").map(String::as_str), Some("u-1"));
    assert!(row.get("first_name").is_none(), "projection drops unrequested columns");
}

#[tokio::test]
async fn batches_are_atomic() {
    let db = MemoryDatabase::new();
    db.create_database(&db_id(), &[players_table()]).await.unwrap();

    let err = db
        .write(
            &db_id(),
            vec![
                player_mutation("A", "B", "dup@x", "u-1"),
                player_mutation("C", "D", "dup@x", "u-2"),
            ],
        )
        .await
        .unwrap_err();
    assert_eq!(err.db_kind(), Some(DbErrorKind::AlreadyExists));
    assert_eq!(db.row_count(&db_id(), "Players"), 0);

    let too_long = "x".repeat(1025);
    let err = db
        .write(&db_id(), vec![player_mutation(&too_long, "B", "ok@x", "u")])
        .await
        .unwrap_err();
    assert_eq!(err.db_kind(), Some(DbErrorKind::InvalidArgument));

    let err = db
        .write(&db_id(), vec![Mutation::insert("Players").set("first_name", "no key")])
        .await
        .unwrap_err();
    assert_eq!(err.db_kind(), Some(DbErrorKind::InvalidArgument));

    let err = db
        .write(&db_id(), vec![Mutation::insert("Nope").set("email", "k")])
        .await
        .unwrap_err();
    assert_eq!(err.db_kind(), Some(DbErrorKind::NotFound));
}

#[tokio::test]
async fn closed_client_is_unavailable() {
    let db = MemoryDatabase::new();
    db.close();
    let err = db.create_database(&db_id(), &[players_table()]).await.unwrap_err();
    assert_eq!(err.db_kind(), Some(DbErrorKind::Unavailable));
    assert_eq!(db.close_calls(), 1);
}

#[tokio::test]
async fn instrumented_client_records_calls_by_method_and_status() {
    let t = Telemetry::default();
    let measures = register_client_views(&t).unwrap();
    let db = InstrumentedDatabase::new(Arc::new(MemoryDatabase::new()), t.clone(), measures);

    db.create_database(&db_id(), &[players_table()]).await.unwrap();
    assert!(db.create_database(&db_id(), &[players_table()]).await.is_err());
    db.write(&db_id(), vec![player_mutation("A", "B", "a@b", "u")]).await.unwrap();

    let calls = t.views().view_data(COMPLETED_CALLS_VIEW).unwrap();
    assert_eq!(calls.row(&["CreateDatabase", "OK"]).unwrap().count(), 1);
    assert_eq!(calls.row(&["CreateDatabase", "ALREADY_EXISTS"]).unwrap().count(), 1);
    assert_eq!(calls.row(&["Commit", "OK"]).unwrap().count(), 1);

    let latency = t.views().view_data(ROUNDTRIP_LATENCY_VIEW).unwrap();
    assert_eq!(latency.total_count(), 3);
}
