//! Integration tests for the simulation driver task.
//!
//! These run on a paused tokio clock, so a `sleep` of a minute completes
//! instantly while the driver's interval still fires every tick.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::time::Duration;

use groundops_core::{MonotonicClock, NotificationBus, Scheduler, SimulationDriver};
use groundops_types::RunState;

const TWO_EVENT_SCENARIO: &str = r#"{
    "id": "two-events",
    "name": "Two alerts",
    "timeline": [
        {"id": "early", "timestamp": 30000, "type": "alert-trigger", "parameters": {"message": "a"}},
        {"id": "late", "timestamp": 60000, "type": "alert-trigger", "parameters": {"message": "b"}}
    ]
}"#;

fn spawn() -> (groundops_core::SchedulerHandle, tokio::task::JoinHandle<Scheduler>) {
    let scheduler = Scheduler::new(Arc::new(MonotonicClock::new()), NotificationBus::default());
    SimulationDriver::spawn(scheduler, 100, 16)
}

#[tokio::test(start_paused = true)]
async fn driver_processes_scenario_in_real_time() {
    let (handle, join) = spawn();
    handle
        .load_scenario_json(TWO_EVENT_SCENARIO.to_owned())
        .await
        .unwrap()
        .unwrap();
    handle.start().await.unwrap();

    tokio::time::sleep(Duration::from_millis(60_500)).await;

    let status = handle.status().await.unwrap();
    assert_eq!(status.queue_length, 0);
    assert_eq!(status.events_processed, 2);
    assert!(status.current_time.abs_diff(60_500) <= 100);

    handle.shutdown().await.unwrap();
    let scheduler = join.await.unwrap();
    assert_eq!(scheduler.world().alerts.len(), 2);
}

#[tokio::test(start_paused = true)]
async fn paused_driver_holds_time() {
    let (handle, _join) = spawn();
    handle.start().await.unwrap();
    tokio::time::sleep(Duration::from_millis(1_000)).await;
    let paused = handle.pause().await.unwrap();
    assert_eq!(paused.state, RunState::Paused);

    tokio::time::sleep(Duration::from_millis(10_000)).await;
    let status = handle.status().await.unwrap();
    assert_eq!(status.current_time, paused.current_time);
}

#[tokio::test(start_paused = true)]
async fn unknown_scenario_is_reported_not_fatal() {
    let (handle, _join) = spawn();
    let result = handle.load_scenario("nope".to_owned()).await.unwrap();
    assert!(result.is_err());
    // The driver keeps serving requests.
    assert_eq!(handle.status().await.unwrap().state, RunState::Stopped);
}

#[tokio::test(start_paused = true)]
async fn dropping_every_handle_stops_the_driver() {
    let (handle, join) = spawn();
    drop(handle);
    let scheduler = join.await.unwrap();
    assert_eq!(scheduler.run_state(), RunState::Stopped);
}
