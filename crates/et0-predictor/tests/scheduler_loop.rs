//! The scheduler loop driven by a scripted clock.

mod common;

use chrono::TimeDelta;
use common::{at, predictor, seed, temp_store, ScriptedClock};
use et0_predictor::scheduler::run_scheduler;
use et0_predictor::{Pipeline, Reading, SqliteStore};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

const LIMIT: Duration = Duration::from_secs(5);

async fn wait_for_rows(store: &SqliteStore, window: chrono::DateTime<chrono::Utc>) -> usize {
    for _ in 0..100 {
        let n = store.predictions_for_window(window).await.unwrap().len();
        if n > 0 {
            return n;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    0
}

#[tokio::test]
async fn first_cycle_runs_immediately_and_shutdown_stops_the_loop() {
    let (store, _dir) = temp_store();
    seed(&store, &[Reading::complete(at(10, 30, 0), 22.0, 45.0, 280.0)]).await;
    let pipeline = Arc::new(Pipeline::new(store, predictor(), LIMIT));
    let clock = ScriptedClock::fixed(at(11, 0, 5));
    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(());

    let handle = {
        let pipeline = pipeline.clone();
        tokio::spawn(async move {
            run_scheduler(&*pipeline, &clock, Duration::from_secs(5), shutdown_rx).await
        })
    };

    assert_eq!(wait_for_rows(pipeline.store(), at(10, 0, 0)).await, 1);

    shutdown_tx.send(()).unwrap();
    timeout(Duration::from_secs(5), handle)
        .await
        .expect("scheduler did not stop on shutdown")
        .unwrap();
}

#[tokio::test]
async fn failed_cycle_does_not_stop_the_loop() {
    let (store, _dir) = temp_store();
    seed(
        &store,
        &[
            // Humidity out of range: the 10:00 cycle fails at inference.
            Reading::complete(at(10, 30, 0), 22.0, 180.0, 280.0),
            Reading::complete(at(11, 30, 0), 23.0, 40.0, 320.0),
        ],
    )
    .await;
    let pipeline = Arc::new(Pipeline::new(store, predictor(), LIMIT));

    // First cycle at 11:00:05, then the wait is computed 100ms before the
    // 12:00 boundary, so the second cycle starts almost immediately.
    let clock = ScriptedClock::new([
        at(11, 0, 5),
        at(12, 0, 0) - TimeDelta::milliseconds(100),
        at(12, 0, 0),
    ]);
    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(());

    let handle = {
        let pipeline = pipeline.clone();
        tokio::spawn(async move {
            run_scheduler(&*pipeline, &clock, Duration::ZERO, shutdown_rx).await
        })
    };

    assert_eq!(wait_for_rows(pipeline.store(), at(11, 0, 0)).await, 1);
    assert!(pipeline
        .store()
        .predictions_for_window(at(10, 0, 0))
        .await
        .unwrap()
        .is_empty());

    shutdown_tx.send(()).unwrap();
    timeout(Duration::from_secs(5), handle)
        .await
        .expect("scheduler did not stop on shutdown")
        .unwrap();
}
