//! Tests for building clients from agent names.

use cvx_error::{CvxErrorKind, ProviderErrorKind};
use cvx_models::connect;
use cvx_rate_limit::CvxConfig;

fn provider_kind(agent: &str) -> ProviderErrorKind {
    let err = match connect(agent, &CvxConfig::default()) {
        Ok(_) => panic!("{} should not connect", agent),
        Err(err) => err,
    };
    match err.kind() {
        CvxErrorKind::Provider(e) => e.kind.clone(),
        other => panic!("expected provider error, got {:?}", other),
    }
}

#[test]
fn test_unknown_agent() {
    assert_eq!(
        provider_kind("gpt-4"),
        ProviderErrorKind::UnknownAgent("gpt-4".to_string())
    );
}

#[test]
fn test_cli_agents_are_not_api_clients() {
    for agent in ["claude", "claude:sonnet-4.5", "gemini", "gemini:flash"] {
        assert!(
            matches!(provider_kind(agent), ProviderErrorKind::Unsupported(_)),
            "{}",
            agent
        );
    }
}
