//! End-to-end tests for `/api/smart` against scripted upstreams.

use std::sync::atomic::Ordering;
use std::time::{Duration, Instant};

use axum::http::StatusCode;
use serde_json::{json, Value};

use common::Step;

mod common;

#[tokio::test]
async fn test_third_attempt_wins_after_two_failures() {
    let (upstream, hits) = common::start_scripted_backend(vec![
        Step::status(0, 500),
        Step::invalid_json(0),
        Step::ok(50, 42),
    ])
    .await;
    let (addr, shutdown) = common::start_dispatcher(common::config_for(upstream)).await;

    let start = Instant::now();
    let res = common::client()
        .get(format!("http://{}/api/smart?timeout=1000", addr))
        .send()
        .await
        .expect("dispatcher unreachable");
    let elapsed = start.elapsed();

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()["content-type"], "application/json");
    assert_eq!(res.json::<Value>().await.unwrap(), json!({ "time": 42 }));
    assert!(elapsed >= Duration::from_millis(640), "elapsed {:?}", elapsed);
    assert_eq!(hits.load(Ordering::SeqCst), 3);

    shutdown.trigger();
}

#[tokio::test]
async fn test_all_attempts_fail_reports_exhaustion() {
    let (upstream, hits) = common::start_scripted_backend(vec![Step::status(0, 500)]).await;
    let mut config = common::config_for(upstream);
    config.hedging.stagger_ms = 50;
    let (addr, shutdown) = common::start_dispatcher(config).await;

    let res = common::client()
        .get(format!("http://{}/api/smart", addr))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        res.text().await.unwrap(),
        "No successful response out of 3 attempts."
    );
    assert_eq!(hits.load(Ordering::SeqCst), 3);

    shutdown.trigger();
}

#[tokio::test]
async fn test_unreachable_upstream_reports_exhaustion() {
    let mut config = common::config_for(common::closed_addr());
    config.hedging.fan_out = 2;
    config.hedging.stagger_ms = 20;
    config.hedging.default_timeout_ms = 5000;
    let (addr, shutdown) = common::start_dispatcher(config).await;

    let res = common::client()
        .get(format!("http://{}/api/smart", addr))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        res.text().await.unwrap(),
        "No successful response out of 2 attempts."
    );

    shutdown.trigger();
}

#[tokio::test]
async fn test_deadline_elapses_before_upstream_answers() {
    let (upstream, hits) = common::start_scripted_backend(vec![Step::ok(500, 500)]).await;
    let (addr, shutdown) = common::start_dispatcher(common::config_for(upstream)).await;

    let start = Instant::now();
    let res = common::client()
        .get(format!("http://{}/api/smart?timeout=10", addr))
        .send()
        .await
        .unwrap();
    let elapsed = start.elapsed();

    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        res.text().await.unwrap(),
        "No successful response within timeout (10ms)."
    );
    assert!(elapsed < Duration::from_millis(300), "elapsed {:?}", elapsed);
    assert_eq!(hits.load(Ordering::SeqCst), 1);

    // The late success lands after the response; the server keeps serving.
    tokio::time::sleep(Duration::from_millis(600)).await;
    let res = common::client()
        .get(format!("http://{}/api/smart?timeout=10", addr))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);

    shutdown.trigger();
}

#[tokio::test]
async fn test_path_form_timeout() {
    let (upstream, _hits) = common::start_scripted_backend(vec![Step::ok(400, 400)]).await;
    let (addr, shutdown) = common::start_dispatcher(common::config_for(upstream)).await;

    let res = common::client()
        .get(format!("http://{}/api/smart/20", addr))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        res.text().await.unwrap(),
        "No successful response within timeout (20ms)."
    );

    shutdown.trigger();
}

#[tokio::test]
async fn test_fast_first_answer_sends_one_request() {
    let (upstream, hits) = common::start_scripted_backend(vec![Step::ok(100, 100)]).await;
    let (addr, shutdown) = common::start_dispatcher(common::config_for(upstream)).await;

    let res = common::client()
        .get(format!("http://{}/api/smart?timeout=not-a-number", addr))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.json::<Value>().await.unwrap(), json!({ "time": 100 }));

    // Wait past the remaining stagger slots.
    tokio::time::sleep(Duration::from_millis(700)).await;
    assert_eq!(hits.load(Ordering::SeqCst), 1);

    shutdown.trigger();
}

#[tokio::test]
async fn test_root_is_not_found() {
    let (addr, shutdown) = common::start_dispatcher(common::config_for(common::closed_addr())).await;

    let res = common::client()
        .get(format!("http://{}/", addr))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert!(res.headers().contains_key("x-request-id"));
    assert_eq!(
        res.text().await.unwrap(),
        "Not a valid path. Try '/api/smart' or /api/smart?timeout=MILLISECONDS."
    );

    shutdown.trigger();
}

#[tokio::test]
async fn test_admission_rejects_then_recovers() {
    let (upstream, _hits) = common::start_scripted_backend(vec![Step::ok(300, 7)]).await;
    let mut config = common::config_for(upstream);
    config.admission.max_in_flight = 0;
    let (addr, shutdown) = common::start_dispatcher(config).await;
    let url = format!("http://{}/api/smart", addr);

    let client = common::client();
    let first = {
        let client = client.clone();
        let url = url.clone();
        tokio::spawn(async move { client.get(&url).send().await })
    };
    tokio::time::sleep(Duration::from_millis(100)).await;

    let rejected = client.get(&url).send().await.unwrap();
    assert_eq!(rejected.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(rejected.text().await.unwrap(), "");

    let first = first.await.unwrap().unwrap();
    assert_eq!(first.status(), StatusCode::OK);

    let again = client.get(&url).send().await.unwrap();
    assert_eq!(again.status(), StatusCode::OK);

    shutdown.trigger();
}
