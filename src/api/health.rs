// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Liveness and readiness probes.

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::models::HealthResponse;
use crate::state::AppState;
use crate::storage::StoreError;

/// Never stored: longer than any valid alias.
const PROBE_ALIAS: &str = "__health_probe_alias_that_cannot_be_created_by_clients_0000000000";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ComponentStatus {
    Ok,
    Unavailable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Readiness {
    Ok,
    Degraded,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ComponentChecks {
    pub service: ComponentStatus,
    /// Whether the link store answered a lookup.
    pub store: ComponentStatus,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReadinessReport {
    pub status: Readiness,
    pub checks: ComponentChecks,
}

impl ReadinessReport {
    fn from_checks(checks: ComponentChecks) -> Self {
        let status = match checks.store {
            ComponentStatus::Ok => Readiness::Ok,
            ComponentStatus::Unavailable => Readiness::Degraded,
        };
        Self { status, checks }
    }

    fn http_status(&self) -> StatusCode {
        match self.status {
            Readiness::Ok => StatusCode::OK,
            Readiness::Degraded => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

async fn probe_store(state: &AppState) -> ComponentStatus {
    match state.links.lookup(PROBE_ALIAS).await {
        Ok(_) | Err(StoreError::NotFound(_)) => ComponentStatus::Ok,
        Err(err) => {
            tracing::warn!(error = %err, "link store probe failed");
            ComponentStatus::Unavailable
        }
    }
}

/// Answers as long as the process serves requests.
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses((status = 200, body = HealthResponse))
)]
pub async fn liveness() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
    })
}

/// Probes the link store. The identity authority is not probed.
#[utoipa::path(
    get,
    path = "/health/ready",
    tag = "Health",
    responses(
        (status = 200, body = ReadinessReport, description = "Link store reachable"),
        (status = 503, body = ReadinessReport, description = "Link store unreachable")
    )
)]
pub async fn readiness(State(state): State<AppState>) -> (StatusCode, Json<ReadinessReport>) {
    let report = ReadinessReport::from_checks(ComponentChecks {
        service: ComponentStatus::Ok,
        store: probe_store(&state).await,
    });
    (report.http_status(), Json(report))
}
