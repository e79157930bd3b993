// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    body::Body,
    http::Request,
    middleware,
    routing::{delete, get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    auth::authorize,
    models::{
        DeleteLinkResponse, ErrorResponse, HealthResponse, LoginRequest, LoginResponse,
        RegisterRequest, RegisterResponse, ResponseStatus, SaveLinkRequest, SaveLinkResponse,
    },
    state::AppState,
};

pub mod accounts;
pub mod health;
pub mod links;

fn request_span(request: &Request<Body>) -> tracing::Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-");
    tracing::info_span!(
        "http_request",
        method = %request.method(),
        path = %request.uri().path(),
        request_id = %request_id,
    )
}

pub fn router(state: AppState) -> Router {
    // Every alias route carries an authorization outcome.
    let link_routes = Router::new()
        .route("/url", post(links::save_link))
        .route("/url/{alias}", delete(links::delete_link))
        .route("/{alias}", get(links::redirect))
        .route_layer(middleware::from_fn_with_state(state.clone(), authorize));

    let public_routes = Router::new()
        .route("/register", post(accounts::register))
        .route("/login", post(accounts::login))
        .route("/health", get(health::liveness))
        .route("/health/ready", get(health::readiness));

    Router::new()
        .merge(link_routes)
        .merge(public_routes)
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http().make_span_with(request_span))
                .layer(PropagateRequestIdLayer::x_request_id()),
        )
        .layer(CorsLayer::permissive())
}

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        links::save_link,
        links::delete_link,
        links::redirect,
        accounts::register,
        accounts::login,
        health::liveness,
        health::readiness
    ),
    components(
        schemas(
            ResponseStatus,
            ErrorResponse,
            SaveLinkRequest,
            SaveLinkResponse,
            DeleteLinkResponse,
            RegisterRequest,
            RegisterResponse,
            LoginRequest,
            LoginResponse,
            HealthResponse,
            health::ReadinessReport,
            health::ComponentChecks,
            health::ComponentStatus,
            health::Readiness
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "Links", description = "Alias management and redirects"),
        (name = "Accounts", description = "Registration and login via the identity authority"),
        (name = "Health", description = "Liveness and readiness probes")
    )
)]
struct ApiDoc;
