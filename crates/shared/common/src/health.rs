//! Dependency health reporting for `/health` endpoints.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use axum::{http::StatusCode, Json};
use serde::Serialize;

use crate::session::SessionCache;

/// A dependency the service cannot work without.
#[async_trait]
pub trait HealthCheck: Send + Sync {
    fn name(&self) -> &'static str;

    async fn check(&self) -> Result<(), String>;
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub checks: BTreeMap<&'static str, CheckStatus>,
}

/// Individual dependency status
#[derive(Debug, Serialize)]
pub struct CheckStatus {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Run every check and build the response. Any failure yields 503.
pub async fn report(
    service: &'static str,
    checks: &[Arc<dyn HealthCheck>],
) -> (StatusCode, Json<HealthResponse>) {
    let mut results = BTreeMap::new();
    let mut all_healthy = true;

    for check in checks {
        let status = match check.check().await {
            Ok(()) => CheckStatus {
                status: "healthy",
                error: None,
            },
            Err(e) => {
                all_healthy = false;
                tracing::warn!(dependency = check.name(), error = %e, "Health check failed");
                CheckStatus {
                    status: "unhealthy",
                    error: Some(e),
                }
            }
        };
        results.insert(check.name(), status);
    }

    let response = HealthResponse {
        status: if all_healthy { "healthy" } else { "degraded" },
        service,
        checks: results,
    };

    let code = if all_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (code, Json(response))
}

/// Health check over the session cache.
pub struct CacheHealth(pub Arc<dyn SessionCache>);

#[async_trait]
impl HealthCheck for CacheHealth {
    fn name(&self) -> &'static str {
        "session_cache"
    }

    async fn check(&self) -> Result<(), String> {
        self.0.ping().await.map_err(|e| e.to_string())
    }
}
