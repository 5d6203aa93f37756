//! Integration tests for the HTTP transports, end to end through a handler

use std::time::Duration;

use mockito::Matcher;
use sensu_handlers::{
    config::{AppConfig, DeliveryPolicy},
    handler::{EventHandler, HandleOutcome},
    http_client::HttpClientPool,
    models::{EventAction, HandlerConfig},
    test_helpers::{EventBuilder, HandlerBuilder},
};
use serde_json::json;

fn app_config() -> AppConfig {
    AppConfig {
        dashboard_link: Some("https://sensu.example.com".to_string()),
        datacenter: Some("uswest1".to_string()),
        delivery: DeliveryPolicy {
            attempts: 2,
            attempt_timeout_secs: Duration::from_secs(5),
            backoff_secs: Duration::ZERO,
        },
        ..Default::default()
    }
}

fn critical_event() -> EventBuilder {
    EventBuilder::new()
        .client_name("web1")
        .client_address("10.0.0.1")
        .check_name("disk_free")
        .status(2)
        .output("DISK CRITICAL - 2% free")
        .team("ops")
        .interval(60)
}

async fn handle(handler: HandlerConfig, event: EventBuilder) -> HandleOutcome {
    let config = app_config();
    let pool = HttpClientPool::default();
    let handler = EventHandler::from_config(handler, &config, &pool).await.unwrap();
    handler.handle(&event.build()).await.unwrap()
}

#[tokio::test]
async fn test_slack_delivery() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/services/T/B/X")
        .match_header("content-type", "application/json")
        .match_body(Matcher::PartialJson(json!({
            "channel": "#ops",
            "username": "Sensu",
            "attachments": [{ "color": "danger" }]
        })))
        .with_status(200)
        .create_async()
        .await;

    let handler = HandlerBuilder::new("slack")
        .slack(&format!("{}/services/T/B/X", server.url()))
        .team_json("ops", json!({"slack_channels": "#ops"}))
        .build();

    let outcome = handle(handler, critical_event()).await;

    assert!(matches!(outcome, HandleOutcome::Dispatched(ref r) if r.delivered == ["#ops"]));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_hipchat_delivery_per_room() {
    let mut server = mockito::Server::new_async().await;
    let pages = server
        .mock("POST", "/v2/room/ops-pages/notification")
        .match_query(Matcher::UrlEncoded("auth_token".into(), "hc-key".into()))
        .match_body(Matcher::PartialJson(json!({ "notify": true, "color": "red" })))
        .with_status(204)
        .create_async()
        .await;
    let room = server
        .mock("POST", "/v2/room/Operations/notification")
        .match_query(Matcher::Any)
        .with_status(204)
        .create_async()
        .await;

    let handler = HandlerBuilder::new("hipchat")
        .hipchat_at(Some(&format!("{}/v2/", server.url())), "hc-key")
        .team_json("ops", json!({"hipchat_room": "Operations"}))
        .build();

    let outcome = handle(handler, critical_event().page(true)).await;

    let HandleOutcome::Dispatched(report) = outcome else {
        panic!("expected dispatch, got {outcome:?}");
    };
    assert_eq!(report.delivered, vec!["ops-pages", "Operations"]);
    pages.assert_async().await;
    room.assert_async().await;
}

#[tokio::test]
async fn test_pagerduty_trigger() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/v2/enqueue")
        .match_body(Matcher::PartialJson(json!({
            "routing_key": "pd-routing-key",
            "event_action": "trigger",
            "dedup_key": "web1/disk_free",
            "payload": { "severity": "critical", "source": "web1" }
        })))
        .with_status(202)
        .create_async()
        .await;

    let handler = HandlerBuilder::new("pagerduty")
        .pagerduty_at(Some(&format!("{}/v2/enqueue", server.url())))
        .team_json("ops", json!({"pagerduty_api_key": "pd-routing-key"}))
        .build();

    let outcome = handle(handler, critical_event().page(true)).await;

    assert!(matches!(outcome, HandleOutcome::Dispatched(ref r) if r.is_complete()));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_webhook_failure_is_reported_per_channel() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/hook")
        .with_status(400)
        .with_body("bad request")
        .expect(2)
        .create_async()
        .await;

    let handler = HandlerBuilder::new("hook")
        .webhook(&format!("{}/hook", server.url()))
        .team_json("ops", json!({"channel": "ops"}))
        .build();

    let outcome = handle(handler, critical_event()).await;

    let HandleOutcome::Dispatched(report) = outcome else {
        panic!("expected dispatch, got {outcome:?}");
    };
    assert!(report.delivered.is_empty());
    assert_eq!(report.failed[0].0, "ops");
    assert!(report.failed[0].1.contains("400"));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_suppressed_event_sends_nothing() {
    let mut server = mockito::Server::new_async().await;
    let mock = server.mock("POST", Matcher::Any).expect(0).create_async().await;

    let handler = HandlerBuilder::new("slack")
        .slack(&format!("{}/services/T/B/X", server.url()))
        .team_json("ops", json!({"slack_channels": "#ops"}))
        .build();

    let outcome = handle(handler, critical_event().alert_after(600).occurrences(2)).await;

    assert!(matches!(outcome, HandleOutcome::Suppressed { .. }));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_opsgenie_create_then_close() {
    let mut server = mockito::Server::new_async().await;
    let create = server
        .mock("POST", "/v1/json/alert")
        .match_body(Matcher::PartialJson(json!({
            "alias": "web1/disk_free",
            "customerKey": "og-key",
            "recipients": "ops_team",
            "tags": "critical"
        })))
        .with_status(200)
        .create_async()
        .await;
    let close = server
        .mock("POST", "/v1/json/alert/close")
        .match_body(Matcher::PartialJson(json!({
            "alias": "web1/disk_free",
            "customerKey": "og-key"
        })))
        .with_status(200)
        .create_async()
        .await;

    let handler = || {
        HandlerBuilder::new("opsgenie")
            .opsgenie_at(Some(&format!("{}/v1/json/alert", server.url())))
            .team_json("ops", json!({"opsgenie_api_key": "og-key", "opsgenie_recipients": "ops_team"}))
            .build()
    };

    let outcome = handle(handler(), critical_event().page(true)).await;
    assert!(matches!(outcome, HandleOutcome::Dispatched(ref r) if r.delivered == ["og-key"]));

    let resolve = critical_event().page(true).status(0).action(EventAction::Resolve);
    let outcome = handle(handler(), resolve).await;
    assert!(matches!(outcome, HandleOutcome::Dispatched(ref r) if r.delivered == ["og-key"]));

    create.assert_async().await;
    close.assert_async().await;
}

#[tokio::test]
async fn test_pagerduty_unknown_status_is_skipped_not_delivered() {
    let mut server = mockito::Server::new_async().await;
    let mock = server.mock("POST", Matcher::Any).expect(0).create_async().await;

    let handler = HandlerBuilder::new("pagerduty")
        .pagerduty_at(Some(&format!("{}/v2/enqueue", server.url())))
        .team_json("ops", json!({"pagerduty_api_key": "pd-routing-key"}))
        .build();

    let outcome = handle(handler, critical_event().page(true).status(3)).await;

    let HandleOutcome::Dispatched(report) = outcome else {
        panic!("expected dispatch, got {outcome:?}");
    };
    assert!(report.delivered.is_empty());
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].0, "pd-routing-key");
    assert!(report.is_complete());
    mock.assert_async().await;
}
