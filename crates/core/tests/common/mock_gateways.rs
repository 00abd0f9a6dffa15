//! Scripted gateways for end-to-end scenarios.

use sf_core::gateway::{GatewayError, MockGateway};
use sf_protocol::project_models::Stage;

pub const PROSE_FENCED_DEVELOPMENT: &str =
    "Here you go:\n```tsx\nexport default function App(){return null}\n```\nEnjoy!";

pub const TRUNCATED_REQUIREMENTS: &str = r#"{"userStories": ["Add item""#;

/// The demo script with the Naming call failing at the transport level.
pub fn failing_naming_gateway() -> MockGateway {
    MockGateway::demo().with_failure(
        Stage::Naming,
        GatewayError::Transport("connection refused".to_string()),
    )
}

/// The demo script with a truncated Requirements reply.
pub fn truncated_requirements_gateway() -> MockGateway {
    MockGateway::demo().with_reply(Stage::Requirement, TRUNCATED_REQUIREMENTS)
}

/// The demo script with a Development reply wrapped in prose.
pub fn prose_development_gateway() -> MockGateway {
    MockGateway::demo().with_reply(Stage::Development, PROSE_FENCED_DEVELOPMENT)
}

/// The demo script with the Design call rejected by the server.
pub fn failing_design_gateway() -> MockGateway {
    MockGateway::demo().with_failure(
        Stage::Design,
        GatewayError::Status {
            status: 503,
            body: "overloaded".to_string(),
        },
    )
}
