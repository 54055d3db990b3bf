// tests/http_collaborators.rs
//
// HttpFetcher and DiscordWebhook against a local mock server.
// Run with: cargo test --test http_collaborators

use gold_rate_bot::errors::RateBotError;
use gold_rate_bot::scrapers::{Fetcher, HttpFetcher, LiveChennaiSource, RateSource};
use gold_rate_bot::services::{DiscordWebhook, Embed, Message, Notifier};
use serde_json::{json, Value};
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::test]
async fn fetch_returns_body_and_sends_source_headers() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/gold_silverrate.asp"))
        .and(header("user-agent", "Mozilla/5.0"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<td>Silver 1 Gm</td><td>190</td>"))
        .expect(1)
        .mount(&server)
        .await;

    let url = format!("{}/gold_silverrate.asp", server.uri());
    let source = LiveChennaiSource::with_url(&url).unwrap();
    let fetcher = HttpFetcher::new().unwrap();

    let response = fetcher.fetch(source.url(), &source.headers(), TIMEOUT).await.unwrap();
    assert_eq!(response.status, 200);
    assert!(response.body.contains("Silver 1 Gm"));
}

#[tokio::test]
async fn fetch_rejects_error_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let fetcher = HttpFetcher::new().unwrap();
    let result = fetcher.fetch(&server.uri(), &[], TIMEOUT).await;
    assert!(matches!(result, Err(RateBotError::NetworkError(_))));
}

#[tokio::test]
async fn fetch_times_out_as_network_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
        .mount(&server)
        .await;

    let fetcher = HttpFetcher::new().unwrap();
    let result = fetcher.fetch(&server.uri(), &[], Duration::from_millis(200)).await;
    assert!(matches!(result, Err(RateBotError::NetworkError(_))));
}

#[tokio::test]
async fn webhook_posts_text_as_content() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hook"))
        .and(body_json(json!({ "content": "🧈 Gold: ₹13069.00" })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let webhook = DiscordWebhook::new(Some(format!("{}/hook", server.uri())), TIMEOUT).unwrap();
    webhook
        .deliver(&Message::Text("🧈 Gold: ₹13069.00".to_string()))
        .await
        .unwrap();
}

#[tokio::test]
async fn webhook_splits_long_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let line = "• 1 gram → ₹13069.00 (⚪ no previous data)";
    let text = vec![line; 120].join("\n");
    let webhook = DiscordWebhook::new(Some(server.uri()), TIMEOUT).unwrap();
    webhook.deliver(&Message::Text(text.clone())).await.unwrap();

    let requests = server.received_requests().await.unwrap();
    assert!(requests.len() > 1);

    let parts: Vec<String> = requests
        .iter()
        .map(|r| {
            let body: Value = serde_json::from_slice(&r.body).unwrap();
            body["content"].as_str().unwrap().to_string()
        })
        .collect();
    assert!(parts.iter().all(|p| p.chars().count() <= 2000));
    assert_eq!(parts.join("\n"), text);
}

#[tokio::test]
async fn webhook_keeps_block_spacing_across_parts() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    // 每个块约 850 字符，三块必须拆成多条
    let block = |name: &str| format!("{}:\n{}", name, "• 1 gram → ₹13069.00\n".repeat(40).trim_end());
    let text = [block("Gold"), block("Silver"), block("Platinum")].join("\n\n");
    let webhook = DiscordWebhook::new(Some(server.uri()), TIMEOUT).unwrap();
    webhook.deliver(&Message::Text(text.clone())).await.unwrap();

    let requests = server.received_requests().await.unwrap();
    assert!(requests.len() > 1);
    let parts: Vec<String> = requests
        .iter()
        .map(|r| {
            let body: Value = serde_json::from_slice(&r.body).unwrap();
            body["content"].as_str().unwrap().to_string()
        })
        .collect();
    assert!(parts.iter().all(|p| !p.trim().is_empty()));
    assert_eq!(parts.join("\n"), text);
}

#[tokio::test]
async fn webhook_posts_embeds() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let embed = Embed {
        title: "🇮🇳 Indian Gold & Silver Rates".to_string(),
        description: None,
        color: 0xF1C40F,
        fields: Vec::new(),
        footer: None,
        timestamp: None,
    };
    let webhook = DiscordWebhook::new(Some(server.uri()), TIMEOUT).unwrap();
    webhook.deliver(&Message::Embed(embed)).await.unwrap();

    let requests = server.received_requests().await.unwrap();
    let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body["embeds"][0]["title"], "🇮🇳 Indian Gold & Silver Rates");
    assert_eq!(body["embeds"][0]["color"], 0xF1C40F);
    assert!(body["embeds"][0].get("description").is_none());
}

#[tokio::test]
async fn webhook_error_status_is_delivery_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let webhook = DiscordWebhook::new(Some(server.uri()), TIMEOUT).unwrap();
    let result = webhook.deliver(&Message::Text("hello".to_string())).await;
    match result {
        Err(RateBotError::DeliveryError(msg)) => assert!(msg.contains("500")),
        other => panic!("expected delivery error, got {:?}", other),
    }
}

#[tokio::test]
async fn webhook_without_endpoint_fails() {
    let webhook = DiscordWebhook::new(None, TIMEOUT).unwrap();
    let result = webhook.deliver(&Message::Text("hello".to_string())).await;
    assert!(matches!(result, Err(RateBotError::DeliveryError(_))));
}
