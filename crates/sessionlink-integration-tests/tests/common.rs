//! Common test utilities for integration tests

use serde_json::Value;

/// Session token used across the workflow tests
#[allow(dead_code)]
pub const SESSION_ID: &str = "oyT4SvXfQXWQEbOH54crEQ%3D%3D";

/// Same token, decoded
#[allow(dead_code)]
pub const DECODED_SESSION_ID: &str = "oyT4SvXfQXWQEbOH54crEQ==";

/// POST a JSON body and return the status with the parsed response
#[allow(dead_code)]
pub async fn post_json(client: &reqwest::Client, url: &str, body: &Value) -> (u16, Value) {
    let response = client
        .post(url)
        .json(body)
        .send()
        .await
        .expect("request should reach the test server");
    let status = response.status().as_u16();
    let body = response
        .json::<Value>()
        .await
        .expect("response body should be JSON");
    (status, body)
}

/// Install a test subscriber once; later calls are no-ops
#[allow(dead_code)]
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("sessionlink_ingress=debug")
        .with_test_writer()
        .try_init();
}
