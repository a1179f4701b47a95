//! Request metrics as seen through the scrape endpoint.
//!
//! Kept in its own test binary: the Prometheus recorder is process-global and
//! other tests would otherwise bump the same counters.

use reqwest::StatusCode;

mod common;

async fn scrape(client: &reqwest::Client, server: &common::TestServer) -> String {
    let res = client.get(server.url("/metrics")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.headers()["content-type"]
        .to_str()
        .unwrap()
        .starts_with("text/plain"));
    res.text().await.unwrap()
}

#[tokio::test]
async fn test_health_counter_increments_once_per_call() {
    let server = common::start_server().await;
    let client = common::client();

    let before = common::requests_total(&scrape(&client, &server).await, "GET", "/health", "200");

    for expected in 1..=3 {
        let res = client.get(server.url("/health")).send().await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);

        let now = common::requests_total(&scrape(&client, &server).await, "GET", "/health", "200");
        assert_eq!(now - before, expected as f64);
    }

    let res = client.patch(server.url("/tasks/424242/done")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let rendered = scrape(&client, &server).await;
    assert_eq!(
        common::requests_total(&rendered, "PATCH", "/tasks/424242/done", "404"),
        1.0
    );
    assert!(rendered.contains("http_request_duration_seconds_bucket"));

    server.stop();
}
