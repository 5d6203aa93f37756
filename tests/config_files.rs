//! The shipped configuration files load and validate

use std::{path::PathBuf, time::Duration};

use sensu_handlers::{
    config::{AppConfig, HandlerLoader},
    filtering::FilterVariant,
    models::TransportConfig,
};

#[test]
fn test_shipped_app_config() {
    let config = AppConfig::new(Some("configs")).unwrap();
    assert_eq!(config.datacenter.as_deref(), Some("uswest1"));
    assert_eq!(config.delivery.backoff_secs, Duration::from_secs(3));
    assert_eq!(config.handler_config_path, PathBuf::from("configs/handlers.yaml"));
}

#[test]
fn test_shipped_handlers() {
    let handlers = HandlerLoader::new(PathBuf::from("configs/handlers.yaml")).load().unwrap();
    let kinds: Vec<&str> = handlers.iter().map(|h| h.transport.kind()).collect();
    assert_eq!(kinds, ["slack", "nodebot", "pagerduty", "stdout"]);

    let slack = &handlers[0];
    let TransportConfig::Slack(slack_config) = &slack.transport else {
        panic!("expected a slack handler");
    };
    assert_eq!(slack_config.retry_policy.max_retries, 3);
    assert_eq!(slack.teams.team_data("databases").use_default_pager, Some(false));

    assert_eq!(handlers[2].filter_variant(), FilterVariant::Paging);
    assert!(handlers[3].message.is_some());
}
