// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{header::LOCATION, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use url::Url;

use crate::{
    alias,
    auth::{AdminOnly, PublicAccess},
    config::AliasPolicy,
    error::ApiError,
    models::{DeleteLinkResponse, ErrorResponse, ResponseStatus, SaveLinkRequest, SaveLinkResponse},
    state::AppState,
    storage::{LinkId, LinkStore, StoreError},
};

/// Validated form of [`SaveLinkRequest`].
struct NewLink {
    url: String,
    alias: Option<String>,
}

impl SaveLinkRequest {
    fn validate(self) -> Result<NewLink, ApiError> {
        if self.url.trim().is_empty() {
            return Err(ApiError::bad_request("field url is a required field"));
        }
        let url = match Url::parse(self.url.trim()) {
            Ok(url) if matches!(url.scheme(), "http" | "https") && url.has_host() => url,
            _ => return Err(ApiError::bad_request("field url is not a valid URL")),
        };

        let alias = self.alias.filter(|a| !a.is_empty());
        if let Some(alias) = &alias {
            alias::validate(alias)
                .map_err(|e| ApiError::bad_request(format!("field alias is not valid: {e}")))?;
        }

        Ok(NewLink {
            url: url.into(),
            alias,
        })
    }
}

/// Insert under freshly generated aliases until one is free.
pub(crate) async fn create_with_generated_alias(
    store: &dyn LinkStore,
    url: &str,
    policy: AliasPolicy,
) -> Result<(String, LinkId), ApiError> {
    insert_candidates(store, url, policy, alias::allocate).await
}

async fn insert_candidates<G>(
    store: &dyn LinkStore,
    url: &str,
    policy: AliasPolicy,
    mut generate: G,
) -> Result<(String, LinkId), ApiError>
where
    G: FnMut(usize) -> String,
{
    for attempt in 1..=policy.max_attempts {
        let candidate = generate(policy.length);
        if let Err(e) = alias::validate(&candidate) {
            tracing::debug!(attempt, alias = %candidate, error = %e, "generated alias rejected, regenerating");
            continue;
        }
        match store.create(url, &candidate).await {
            Ok(id) => return Ok((candidate, id)),
            Err(StoreError::AliasConflict(_)) => {
                tracing::debug!(attempt, alias = %candidate, "generated alias taken, regenerating");
            }
            Err(err) => return Err(err.into()),
        }
    }

    tracing::error!(
        attempts = policy.max_attempts,
        length = policy.length,
        "failed to allocate a free alias"
    );
    Err(ApiError::internal())
}

#[utoipa::path(
    post,
    path = "/url",
    request_body = SaveLinkRequest,
    tag = "Links",
    security(("bearer" = [])),
    responses(
        (status = 200, body = SaveLinkResponse),
        (status = 400, body = ErrorResponse, description = "Malformed body, URL or alias"),
        (status = 403, body = ErrorResponse, description = "Caller is not a verified admin"),
        (status = 409, body = ErrorResponse, description = "Alias already exists")
    )
)]
pub async fn save_link(
    State(state): State<AppState>,
    AdminOnly { uid }: AdminOnly,
    body: Result<Json<SaveLinkRequest>, JsonRejection>,
) -> Result<Json<SaveLinkResponse>, ApiError> {
    let Json(request) = body.map_err(|rejection| {
        tracing::warn!(error = %rejection.body_text(), "failed to decode request body");
        ApiError::bad_request("failed to decode request body")
    })?;

    let link = request.validate()?;

    let (alias, id) = match link.alias {
        Some(alias) => {
            let id = state.links.create(&link.url, &alias).await.map_err(|err| {
                if let StoreError::AliasConflict(_) = err {
                    tracing::info!(alias = %alias, "alias already exists");
                }
                ApiError::from(err)
            })?;
            (alias, id)
        }
        None => create_with_generated_alias(state.links.as_ref(), &link.url, state.alias).await?,
    };

    tracing::info!(id, uid, alias = %alias, "url added");
    Ok(Json(SaveLinkResponse {
        status: ResponseStatus::Ok,
        alias,
    }))
}

#[utoipa::path(
    delete,
    path = "/url/{alias}",
    params(
        ("alias" = String, Path, description = "Alias of the link to delete")
    ),
    tag = "Links",
    security(("bearer" = [])),
    responses(
        (status = 200, body = DeleteLinkResponse),
        (status = 403, body = ErrorResponse, description = "Caller is not a verified admin"),
        (status = 404, body = ErrorResponse, description = "Alias not found")
    )
)]
pub async fn delete_link(
    State(state): State<AppState>,
    AdminOnly { uid }: AdminOnly,
    Path(alias): Path<String>,
) -> Result<Json<DeleteLinkResponse>, ApiError> {
    let id = state.links.delete(&alias).await?;

    tracing::info!(id, uid, alias = %alias, "url deleted");
    Ok(Json(DeleteLinkResponse {
        status: ResponseStatus::Ok,
        id,
    }))
}

#[utoipa::path(
    get,
    path = "/{alias}",
    params(
        ("alias" = String, Path, description = "Alias to resolve")
    ),
    tag = "Links",
    responses(
        (status = 302, description = "Redirect to the stored URL"),
        (status = 403, body = ErrorResponse, description = "Presented token is invalid"),
        (status = 404, body = ErrorResponse, description = "Alias not found")
    )
)]
pub async fn redirect(
    State(state): State<AppState>,
    PublicAccess(outcome): PublicAccess,
    Path(alias): Path<String>,
) -> Result<Response, ApiError> {
    let url = state.links.lookup(&alias).await?;

    let location = HeaderValue::try_from(url.as_str()).map_err(|e| {
        tracing::error!(alias = %alias, error = %e, "stored url is not a valid header value");
        ApiError::internal()
    })?;

    tracing::info!(alias = %alias, caller = outcome.kind(), uid = ?outcome.uid(), "redirecting");
    Ok((StatusCode::FOUND, [(LOCATION, location)]).into_response())
}
