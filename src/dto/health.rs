use serde::Serialize;
use utoipa::ToSchema;

/// Payload returned by the `/healthcheck` route.
///
/// `degraded` means the MongoDB-backed team store is currently not installed;
/// team operations answer 503 until the connection supervisor brings it back.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// `"ok"` while the team store is reachable, `"degraded"` otherwise.
    pub status: &'static str,
}

impl HealthResponse {
    /// Team store installed and answering pings.
    pub fn ok() -> Self {
        Self { status: "ok" }
    }

    /// Team store unavailable; mutating operations are refused.
    pub fn degraded() -> Self {
        Self { status: "degraded" }
    }
}
