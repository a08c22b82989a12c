//! Provider tests with HTTP mocking.

use crate::config::Config;
use crate::error::DdnsError;
use crate::providers::{DnsProvider, LinodeProvider};
use std::net::IpAddr;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_config() -> Config {
    let mut config = Config::default();
    config.linode.api_key = "test-token".to_string();
    config.linode.domain_id = "1111".to_string();
    config.linode.record_id = "2222".to_string();
    config.dns.fqdn = "home.example.com".to_string();
    config
}

#[tokio::test]
async fn test_push_ipv4_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/v4/domains/1111/records/2222"))
        .and(header("Accept", "application/json"))
        .and(header("Content-Type", "application/json"))
        .and(header("Authorization", "Bearer test-token"))
        .and(body_json(serde_json::json!({
            "target": "192.0.2.10",
            "name": "home.example.com",
            "type": "A",
            "ttl": 300
        })))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"id":2222}"#))
        .expect(1)
        .mount(&mock_server)
        .await;

    let provider = LinodeProvider::with_base_url(&test_config(), mock_server.uri());

    let ip: IpAddr = "192.0.2.10".parse().unwrap();
    assert!(provider.push_address(ip).await.is_ok());
}

#[tokio::test]
async fn test_push_ipv6_uses_aaaa() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/v4/domains/1111/records/2222"))
        .and(body_json(serde_json::json!({
            "target": "2001:db8::1",
            "name": "home.example.com",
            "type": "AAAA",
            "ttl": 300
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let provider = LinodeProvider::with_base_url(&test_config(), mock_server.uri());

    let ip: IpAddr = "2001:db8::1".parse().unwrap();
    assert!(provider.push_address(ip).await.is_ok());
}

#[tokio::test]
async fn test_push_rejected_on_auth_failure() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&mock_server)
        .await;

    let provider = LinodeProvider::with_base_url(&test_config(), mock_server.uri());

    let ip: IpAddr = "192.0.2.10".parse().unwrap();
    let result = provider.push_address(ip).await;

    assert!(matches!(result, Err(DdnsError::UpdateRejected(_))));
}

#[tokio::test]
async fn test_push_rejected_on_any_non_200_status() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&mock_server)
        .await;

    let provider = LinodeProvider::with_base_url(&test_config(), mock_server.uri());

    let ip: IpAddr = "192.0.2.10".parse().unwrap();
    let result = provider.push_address(ip).await;

    assert!(matches!(result, Err(DdnsError::UpdateRejected(_))));
}

#[tokio::test]
async fn test_push_transport_error() {
    // Nothing listens on the discard port.
    let provider =
        LinodeProvider::with_base_url(&test_config(), "http://127.0.0.1:9".to_string());

    let ip: IpAddr = "192.0.2.10".parse().unwrap();
    let result = provider.push_address(ip).await;

    assert!(matches!(result, Err(DdnsError::Network(_))));
}

#[tokio::test]
async fn test_repushing_same_address_sends_identical_requests() {
    let mock_server = MockServer::start().await;

    // Both pushes must match the exact same payload shape.
    Mock::given(method("PUT"))
        .and(path("/v4/domains/1111/records/2222"))
        .and(body_json(serde_json::json!({
            "target": "203.0.113.5",
            "name": "home.example.com",
            "type": "A",
            "ttl": 300
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(2)
        .mount(&mock_server)
        .await;

    let provider = LinodeProvider::with_base_url(&test_config(), mock_server.uri());

    let ip: IpAddr = "203.0.113.5".parse().unwrap();
    assert!(provider.push_address(ip).await.is_ok());
    assert!(provider.push_address(ip).await.is_ok());
}

#[tokio::test]
async fn test_api_version_in_path() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/v5beta/domains/1111/records/2222"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut config = test_config();
    config.linode.api_version = "v5beta".to_string();
    let provider = LinodeProvider::with_base_url(&config, mock_server.uri());

    let ip: IpAddr = "192.0.2.10".parse().unwrap();
    assert!(provider.push_address(ip).await.is_ok());
}

#[test]
fn test_record_name() {
    let provider = LinodeProvider::new(&test_config());
    assert_eq!(provider.record_name(), "home.example.com");
}
