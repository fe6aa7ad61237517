use std::time::Duration;

use fixture_pics::test_support::MemoryStore;
use fixture_pics::{AvatarFetcher, FetchError, NoProgress, ProvisionOptions, Provisioner};
use fixture_pics_http::{PravatarClient, PravatarConfig};
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const JPEG: &[u8] = b"\xff\xd8\xff\xe0\0\x10JFIF\0\x01\x01";

fn client_for(server: &MockServer) -> PravatarClient {
    PravatarClient::new(PravatarConfig {
        base_url: Some(server.uri()),
        size: 200,
        timeout: Duration::from_millis(500),
    })
    .unwrap()
}

async fn mount_avatar(server: &MockServer, index: u32, template: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path("/200"))
        .and(query_param("img", index.to_string()))
        .respond_with(template)
        .mount(server)
        .await;
}

#[tokio::test]
async fn fetch_returns_raw_bytes() {
    let server = MockServer::start().await;
    mount_avatar(
        &server,
        1,
        ResponseTemplate::new(200).set_body_raw(JPEG, "image/jpeg"),
    )
    .await;

    let bytes = client_for(&server).fetch(1).await.unwrap();
    assert_eq!(bytes, JPEG);
}

#[tokio::test]
async fn fetch_does_not_care_about_content_type() {
    let server = MockServer::start().await;
    mount_avatar(
        &server,
        4,
        ResponseTemplate::new(200).set_body_raw(b"<svg/>".to_vec(), "image/svg+xml"),
    )
    .await;

    let bytes = client_for(&server).fetch(4).await.unwrap();
    assert_eq!(bytes, b"<svg/>");
}

#[tokio::test]
async fn fetch_reports_http_status() {
    let server = MockServer::start().await;
    mount_avatar(
        &server,
        2,
        ResponseTemplate::new(503).set_body_string("try later"),
    )
    .await;

    let err = client_for(&server).fetch(2).await.unwrap_err();
    assert_eq!(
        err,
        FetchError::Status {
            status: 503,
            body: "try later".into()
        }
    );
    assert!(err.is_retryable());
}

#[tokio::test]
async fn fetch_rejects_empty_body() {
    let server = MockServer::start().await;
    mount_avatar(&server, 3, ResponseTemplate::new(200)).await;

    let err = client_for(&server).fetch(3).await.unwrap_err();
    assert_eq!(err, FetchError::EmptyBody);
}

#[tokio::test]
async fn slow_response_times_out() {
    let server = MockServer::start().await;
    mount_avatar(
        &server,
        5,
        ResponseTemplate::new(200)
            .set_body_raw(JPEG, "image/jpeg")
            .set_delay(Duration::from_secs(3)),
    )
    .await;

    let err = client_for(&server).fetch(5).await.unwrap_err();
    assert_eq!(err, FetchError::Timeout);
}

#[tokio::test]
async fn unreachable_service_is_network_error() {
    let client = PravatarClient::new(PravatarConfig {
        base_url: Some("http://127.0.0.1:9".into()),
        timeout: Duration::from_secs(2),
        ..Default::default()
    })
    .unwrap();

    let err = client.fetch(1).await.unwrap_err();
    assert!(matches!(err, FetchError::Network(_) | FetchError::Timeout));
}

#[tokio::test]
async fn provision_against_mock_service() {
    let server = MockServer::start().await;
    for index in [1, 3] {
        mount_avatar(
            &server,
            index,
            ResponseTemplate::new(200).set_body_raw(JPEG, "image/jpeg"),
        )
        .await;
    }
    mount_avatar(&server, 2, ResponseTemplate::new(500)).await;

    let store = MemoryStore::with_files(["0.png", "old.jfif"]);
    let provisioner = Provisioner::new(store, client_for(&server)).with_options(ProvisionOptions {
        concurrency: 2,
        retries: 0,
        retry_delay: Duration::ZERO,
    });

    let outcome = provisioner
        .provision(3, &NoProgress, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(outcome.downloaded, 2);
    assert_eq!(outcome.failed_indices(), vec![2]);
    assert_eq!(
        provisioner.store().names(),
        vec!["0.png", "1.jfif", "3.jfif"]
    );
    assert_eq!(provisioner.store().contents("3.jfif").as_deref(), Some(JPEG));
}
