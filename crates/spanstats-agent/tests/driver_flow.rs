//! Operation driver: recording, failure handling and client release.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::sync::Arc;

use spanstats_agent::db::{players_table, Database, MemoryDatabase};
use spanstats_agent::driver::{self, player_batch, uniqueness_token};
use spanstats_agent::obs::measures::{
    READ_LATENCY_VIEW, TRANSACTION_SETS_VIEW, WRITE_LATENCY_VIEW,
};
use spanstats_agent::obs::register_metric_views;
use spanstats_agent::shutdown::{interrupt_pair, Interrupt};
use spanstats_core::error::{DbErrorKind, ErrorCode};
use spanstats_core::Telemetry;

mod test_db;
use test_db::{db_id, FlakyDatabase, HangingDatabase};

#[tokio::test]
async fn three_iterations_record_three_transaction_sets() {
    let t = Telemetry::default();
    let measures = register_metric_views(&t).unwrap();
    let db = FlakyDatabase::new(None);

    let report = driver::run_operations(&t, &measures, db.clone(), &db_id(), 3, &Interrupt::never()).await;

    assert!(report.is_ok(), "{:?}", report.error);
    assert_eq!(report.transactions, 3);
    assert!(report.read_latency_ms.unwrap() >= 0.0);

    let tx = t.views().view_data(TRANSACTION_SETS_VIEW).unwrap();
    assert_eq!(tx.total_count(), 3);
    // recorded without tags: one row with an empty tag value
    assert_eq!(tx.row(&[""]).unwrap().count(), 3);

    for view in [READ_LATENCY_VIEW, WRITE_LATENCY_VIEW] {
        let data = t.views().view_data(view).unwrap();
        let d = data.row(&[""]).unwrap().as_distribution().unwrap();
        assert_eq!(d.count, 3);
        assert!(d.min >= 0.0);
    }

    assert_eq!(db.inner.row_count(&db_id(), "Players"), 9);
    assert_eq!(db.closes(), 1);
}

#[tokio::test]
async fn failure_midway_stops_recording_and_closes_once() {
    let t = Telemetry::default();
    let measures = register_metric_views(&t).unwrap();
    let db = FlakyDatabase::new(Some(2));

    let report = driver::run_operations(&t, &measures, db.clone(), &db_id(), 3, &Interrupt::never()).await;

    let err = report.error.as_ref().expect("second write fails");
    assert_eq!(err.db_kind(), Some(DbErrorKind::Unavailable));
    assert_eq!(report.transactions, 1);
    assert_eq!(t.views().view_data(TRANSACTION_SETS_VIEW).unwrap().total_count(), 1);
    assert_eq!(db.closes(), 1);
}

#[tokio::test]
async fn existing_database_surfaces_the_underlying_cause() {
    let t = Telemetry::default();
    let measures = register_metric_views(&t).unwrap();
    let db = FlakyDatabase::new(None);
    db.create_database(&db_id(), &[players_table()]).await.unwrap();

    let report = driver::run_operations(&t, &measures, db.clone(), &db_id(), 3, &Interrupt::never()).await;

    let err = report.error.expect("create must fail");
    assert_eq!(err.code(), ErrorCode::Database);
    assert_eq!(err.db_kind(), Some(DbErrorKind::AlreadyExists));
    assert_eq!(report.transactions, 0);
    assert!(report.read_latency_ms.is_none());
    assert_eq!(t.views().view_data(TRANSACTION_SETS_VIEW).unwrap().total_count(), 0);
    assert_eq!(db.closes(), 1);
}

#[tokio::test]
async fn interrupted_create_reports_interrupt() {
    let (trigger, interrupt) = interrupt_pair();
    trigger.trigger();

    let err = driver::create_database(&HangingDatabase, &db_id(), &interrupt)
        .await
        .expect_err("must be interrupted");
    assert_eq!(err.code(), ErrorCode::Interrupted);
}

#[tokio::test]
async fn create_error_wins_over_untriggered_interrupt() {
    let db = MemoryDatabase::new();
    db.create_database(&db_id(), &[players_table()]).await.unwrap();

    let (_trigger, interrupt) = interrupt_pair();
    let err = driver::create_database(&db, &db_id(), &interrupt)
        .await
        .expect_err("already exists");
    assert_eq!(err.db_kind(), Some(DbErrorKind::AlreadyExists));
}

#[tokio::test]
async fn create_error_wins_over_pending_interrupt() {
    let db = MemoryDatabase::new();
    db.create_database(&db_id(), &[players_table()]).await.unwrap();

    let (trigger, interrupt) = interrupt_pair();
    trigger.trigger();
    for _ in 0..200 {
        let err = driver::create_database(&db, &db_id(), &interrupt)
            .await
            .expect_err("already exists");
        assert_eq!(err.db_kind(), Some(DbErrorKind::AlreadyExists));
    }
}

#[tokio::test(start_paused = true)]
async fn final_wait_swallows_interrupts() {
    let (trigger, interrupt) = interrupt_pair();
    let waiter = tokio::spawn(async move {
        driver::wait_for_export(std::time::Duration::from_secs(3600), &interrupt).await;
    });
    tokio::task::yield_now().await;
    trigger.trigger();
    waiter.await.unwrap();
}

#[test]
fn batches_carry_a_unique_token() {
    assert_eq!(uniqueness_token(2, 1_700_000_000), "2-1700000000.");

    let batch = player_batch("0-1.");
    assert_eq!(batch.len(), 3);
    assert_eq!(batch[0].get("email"), Some("0-1.poke.mon@example.org"));
    assert!(batch.iter().all(|m| m.table == "Players"));
}

#[tokio::test]
async fn client_guard_closes_on_drop_without_release() {
    let db = FlakyDatabase::new(None);
    {
        let _guard = spanstats_agent::db::ClientGuard::new(db.clone() as Arc<dyn Database>);
    }
    assert_eq!(db.closes(), 1);
}
