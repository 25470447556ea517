/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Invite code generation.
pub mod invite_code;
/// Outbound invitation email queue.
pub mod mailer;
/// Core team formation and invitation workflow.
pub mod team_service;
