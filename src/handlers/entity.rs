//! Entity handlers: list, count, create, read, replace, merge-patch, delete.
//! Generic over the entity type; each router instance is bound to one `EntityService`.

use crate::criteria::parse_criteria;
use crate::entity::{Entity, Key};
use crate::error::{AppError, ValidationKind};
use crate::response::{success_count, success_one, success_one_ok, success_page};
use crate::service::pagination::parse_page_request;
use crate::service::{EntityService, PageLinks, RequestValidator, Window};
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        OriginalUri, Path, Query, State,
    },
    http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

const X_TOTAL_COUNT: &str = "x-total-count";
const X_ALERT: &str = "x-entityaccess-alert";
const X_PARAMS: &str = "x-entityaccess-params";
const ALERT_PREFIX: &str = "entityAccess";

fn parse_id(entity: &'static str, id_str: &str) -> Result<Key, AppError> {
    id_str.parse().map_err(|_| {
        AppError::field_validation(ValidationKind::InvalidValue, entity, "id", format!("invalid id '{}'", id_str))
    })
}

fn body_to_map(entity: &'static str, value: Value) -> Result<Map<String, Value>, AppError> {
    match value {
        Value::Object(m) => Ok(m),
        _ => Err(AppError::validation(
            ValidationKind::InvalidValue,
            entity,
            "body must be a JSON object",
        )),
    }
}

/// Unwrap the JSON body extractor; syntax and content-type rejections become `invalidvalue`.
fn json_body(entity: &'static str, body: Result<Json<Value>, JsonRejection>) -> Result<Map<String, Value>, AppError> {
    match body {
        Ok(Json(value)) => body_to_map(entity, value),
        Err(rejection) => Err(AppError::validation(
            ValidationKind::InvalidValue,
            entity,
            rejection.body_text(),
        )),
    }
}

fn from_body<T: DeserializeOwned>(entity: &'static str, body: Map<String, Value>) -> Result<T, AppError> {
    serde_json::from_value(Value::Object(body))
        .map_err(|e| AppError::validation(ValidationKind::InvalidValue, entity, e.to_string()))
}

fn header_value(s: &str) -> Result<HeaderValue, AppError> {
    HeaderValue::from_str(s).map_err(|e| AppError::Internal(format!("bad header value: {}", e)))
}

/// Entity alert headers: `entityAccess.<entity>.<action>` plus the affected key.
fn alert_headers(entity: &'static str, action: &str, key: Key) -> Result<HeaderMap, AppError> {
    let mut headers = HeaderMap::new();
    let alert = format!("{}.{}.{}", ALERT_PREFIX, entity, action);
    headers.insert(HeaderName::from_static(X_ALERT), header_value(&alert)?);
    headers.insert(HeaderName::from_static(X_PARAMS), HeaderValue::from(key));
    Ok(headers)
}

/// RFC 8288 `Link` header. Filter parameters of the request are carried over unchanged.
fn link_header(path: &str, raw_query: Option<&str>, links: &PageLinks) -> String {
    let kept: Vec<&str> = raw_query
        .unwrap_or("")
        .split('&')
        .filter(|p| {
            let key = p.split('=').next().unwrap_or("");
            !p.is_empty() && key != "offset" && key != "limit"
        })
        .collect();
    let href = |w: &Window| {
        let mut q = kept.join("&");
        if !q.is_empty() {
            q.push('&');
        }
        format!("<{}?{}offset={}&limit={}>", path, q, w.offset, w.limit)
    };
    let mut parts = Vec::with_capacity(4);
    if let Some(next) = &links.next {
        parts.push(format!("{}; rel=\"next\"", href(next)));
    }
    if let Some(prev) = &links.prev {
        parts.push(format!("{}; rel=\"prev\"", href(prev)));
    }
    parts.push(format!("{}; rel=\"last\"", href(&links.last)));
    parts.push(format!("{}; rel=\"first\"", href(&links.first)));
    parts.join(",")
}

pub async fn list<E: Entity>(
    State(svc): State<EntityService<E>>,
    OriginalUri(uri): OriginalUri,
    params: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Query(params) =
        params.map_err(|r| AppError::validation(ValidationKind::InvalidValue, E::NAME, r.body_text()))?;
    let pairs = || params.iter().map(|(k, v)| (k.as_str(), v.as_str()));
    let criteria = parse_criteria::<E, _>(pairs())?;
    let request = parse_page_request::<E, _>(pairs())?;
    let page = svc.list(criteria, request).await?;

    let mut headers = HeaderMap::new();
    headers.insert(HeaderName::from_static(X_TOTAL_COUNT), HeaderValue::from(page.total));
    let link = link_header(uri.path(), uri.query(), &page.links());
    headers.insert(header::LINK, header_value(&link)?);
    Ok((headers, success_page(page)))
}

pub async fn count<E: Entity>(State(svc): State<EntityService<E>>) -> Result<impl IntoResponse, AppError> {
    Ok(success_count(svc.count_all().await?))
}

pub async fn create<E: Entity>(
    State(svc): State<EntityService<E>>,
    OriginalUri(uri): OriginalUri,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let body = json_body(E::NAME, body)?;
    RequestValidator::validate::<E>(&body)?;
    let entity: E = from_body(E::NAME, body)?;
    let created = svc.create(entity).await?;
    let key = created
        .key()
        .ok_or_else(|| AppError::Internal(format!("{} saved without a key", E::NAME)))?;
    let mut headers = alert_headers(E::NAME, "created", key)?;
    let location = format!("{}/{}", uri.path().trim_end_matches('/'), key);
    headers.insert(header::LOCATION, header_value(&location)?);
    Ok((headers, success_one(created)))
}

pub async fn read<E: Entity>(
    State(svc): State<EntityService<E>>,
    Path(id_str): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let key = parse_id(E::NAME, &id_str)?;
    let found = svc
        .get_one(key)
        .await?
        .ok_or(AppError::NotFound { entity: E::NAME, key })?;
    Ok(success_one_ok(found))
}

pub async fn replace<E: Entity>(
    State(svc): State<EntityService<E>>,
    Path(id_str): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let key = parse_id(E::NAME, &id_str)?;
    let body = json_body(E::NAME, body)?;
    RequestValidator::validate::<E>(&body)?;
    let entity: E = from_body(E::NAME, body)?;
    let updated = svc.replace(key, entity).await?;
    Ok((alert_headers(E::NAME, "updated", key)?, success_one_ok(updated)))
}

pub async fn patch<E: Entity>(
    State(svc): State<EntityService<E>>,
    Path(id_str): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let key = parse_id(E::NAME, &id_str)?;
    let body = json_body(E::NAME, body)?;
    RequestValidator::validate_partial::<E>(&body)?;
    let partial: E::Patch = from_body(E::NAME, body)?;
    let updated = svc.merge_patch(key, partial).await?;
    Ok((alert_headers(E::NAME, "updated", key)?, success_one_ok(updated)))
}

pub async fn delete<E: Entity>(
    State(svc): State<EntityService<E>>,
    Path(id_str): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let key = parse_id(E::NAME, &id_str)?;
    svc.remove(key).await?;
    Ok((StatusCode::NO_CONTENT, alert_headers(E::NAME, "deleted", key)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::page_links;

    #[test]
    fn link_header_keeps_filters_and_replaces_window() {
        let links = page_links(2, 2, 5);
        let link = link_header("/api/bs", Some("aId.specified=false&offset=2&limit=2"), &links);
        assert_eq!(
            link,
            "</api/bs?aId.specified=false&offset=4&limit=2>; rel=\"next\",\
             </api/bs?aId.specified=false&offset=0&limit=2>; rel=\"prev\",\
             </api/bs?aId.specified=false&offset=4&limit=2>; rel=\"last\",\
             </api/bs?aId.specified=false&offset=0&limit=2>; rel=\"first\""
        );
    }

    #[test]
    fn alert_headers_name_entity_action_and_key() {
        let headers = alert_headers("b", "deleted", 12).unwrap();
        assert_eq!(headers[X_ALERT], "entityAccess.b.deleted");
        assert_eq!(headers[X_PARAMS], "12");
    }

    #[test]
    fn ids_must_be_integers() {
        assert_eq!(parse_id("a", "42").unwrap(), 42);
        let err = parse_id("a", "forty-two").unwrap_err();
        assert_eq!(err.validation_kind(), Some(ValidationKind::InvalidValue));
    }
}
