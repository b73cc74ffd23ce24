mod common;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use common::{app, body_json, get, harness, json_request};
use serde_json::json;
use tower::ServiceExt;

#[tokio::test]
async fn create_read_and_list_over_http() {
    let h = harness();
    let router = app(h.services.clone());

    let resp = router
        .clone()
        .oneshot(json_request("POST", "/api/as", json!({ "test": "testing" })))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    assert_eq!(resp.headers()[header::LOCATION], "/api/as/1");
    assert_eq!(resp.headers()["x-entityaccess-alert"], "entityAccess.a.created");
    assert_eq!(resp.headers()["x-entityaccess-params"], "1");
    let body = body_json(resp).await;
    assert_eq!(body["data"], json!({ "id": 1, "test": "testing" }));

    let resp = router.clone().oneshot(get("/api/as/1")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = router.clone().oneshot(get("/api/as?limit=5")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()["x-total-count"], "1");
    assert!(resp.headers()[header::LINK]
        .to_str()
        .unwrap()
        .contains("</api/as?offset=0&limit=5>; rel=\"first\""));
    let body = body_json(resp).await;
    assert_eq!(body["meta"]["total"], 1);
    assert_eq!(body["meta"]["limit"], 5);
    assert_eq!(body["data"][0]["test"], "testing");

    let resp = router.oneshot(get("/api/as/count")).await.unwrap();
    assert_eq!(body_json(resp).await["data"]["count"], 1);
}

#[tokio::test]
async fn create_with_id_is_rejected_with_code() {
    let h = harness();
    let resp = app(h.services)
        .oneshot(json_request("POST", "/api/as", json!({ "id": 7, "test": "x" })))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = body_json(resp).await;
    assert_eq!(body["error"]["code"], "idexists");
}

#[tokio::test]
async fn missing_required_field_names_the_field() {
    let h = harness();
    let resp = app(h.services)
        .oneshot(json_request("POST", "/api/as", json!({ "test": null })))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = body_json(resp).await;
    assert_eq!(body["error"]["code"], "required");
    assert_eq!(body["error"]["details"]["field"], "test");
}

#[tokio::test]
async fn malformed_bodies_get_an_error_code() {
    let h = harness();
    let router = app(h.services.clone());

    let request = Request::builder()
        .method("POST")
        .uri("/api/as")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let resp = router.clone().oneshot(request).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(resp).await["error"]["code"], "invalidvalue");

    let request = Request::builder()
        .method("POST")
        .uri("/api/as")
        .body(Body::from(json!({ "test": "x" }).to_string()))
        .unwrap();
    let resp = router.clone().oneshot(request).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(resp).await["error"]["code"], "invalidvalue");

    let resp = router
        .clone()
        .oneshot(json_request("PUT", "/api/as/1", json!([1, 2])))
        .await
        .unwrap();
    assert_eq!(body_json(resp).await["error"]["code"], "invalidvalue");
    assert_eq!(h.services.a.count_all().await.unwrap(), 0);
}

#[tokio::test]
async fn put_classifies_key_problems() {
    let h = harness();
    let router = app(h.services.clone());
    router
        .clone()
        .oneshot(json_request("POST", "/api/as", json!({ "test": "one" })))
        .await
        .unwrap();

    let resp = router
        .clone()
        .oneshot(json_request("PUT", "/api/as/1", json!({ "test": "two" })))
        .await
        .unwrap();
    assert_eq!(body_json(resp).await["error"]["code"], "idnull");

    let resp = router
        .clone()
        .oneshot(json_request("PUT", "/api/as/1", json!({ "id": 2, "test": "two" })))
        .await
        .unwrap();
    assert_eq!(body_json(resp).await["error"]["code"], "idinvalid");

    let resp = router
        .clone()
        .oneshot(json_request("PUT", "/api/as/9", json!({ "id": 9, "test": "two" })))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(resp).await["error"]["code"], "idnotfound");

    let resp = router
        .oneshot(json_request("PUT", "/api/as/1", json!({ "id": 1, "test": "two" })))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()["x-entityaccess-alert"], "entityAccess.a.updated");
    assert_eq!(body_json(resp).await["data"]["test"], "two");
}

#[tokio::test]
async fn merge_patch_json_clears_association_only() {
    let h = harness();
    let router = app(h.services.clone());
    router
        .clone()
        .oneshot(json_request("POST", "/api/as", json!({ "test": "parent" })))
        .await
        .unwrap();
    router
        .clone()
        .oneshot(json_request("POST", "/api/bs", json!({ "aId": 1 })))
        .await
        .unwrap();

    let request = Request::builder()
        .method("PATCH")
        .uri("/api/bs/1")
        .header("content-type", "application/merge-patch+json")
        .body(Body::from(json!({ "id": 1, "aId": null }).to_string()))
        .unwrap();
    let resp = router.clone().oneshot(request).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["data"], json!({ "id": 1, "aId": null }));

    let resp = router.oneshot(get("/api/bs?aId.specified=false")).await.unwrap();
    assert_eq!(resp.headers()["x-total-count"], "1");
}

#[tokio::test]
async fn patch_cannot_null_a_required_field() {
    let h = harness();
    let router = app(h.services.clone());
    router
        .clone()
        .oneshot(json_request("POST", "/api/as", json!({ "test": "keep" })))
        .await
        .unwrap();
    let resp = router
        .clone()
        .oneshot(json_request("PATCH", "/api/as/1", json!({ "id": 1, "test": null })))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let resp = router.oneshot(get("/api/as/1")).await.unwrap();
    assert_eq!(body_json(resp).await["data"]["test"], "keep");
}

#[tokio::test]
async fn delete_then_read_is_not_found() {
    let h = harness();
    let router = app(h.services.clone());
    router
        .clone()
        .oneshot(json_request("POST", "/api/cs", json!({})))
        .await
        .unwrap();
    let delete = || Request::builder().method("DELETE").uri("/api/cs/1").body(Body::empty()).unwrap();
    let resp = router.clone().oneshot(delete()).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert_eq!(resp.headers()["x-entityaccess-alert"], "entityAccess.c.deleted");
    let resp = router.clone().oneshot(delete()).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let resp = router.oneshot(get("/api/cs/1")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn bad_query_parameters_are_rejected() {
    let h = harness();
    let router = app(h.services.clone());
    let resp = router.clone().oneshot(get("/api/bs?offset=-1")).await.unwrap();
    assert_eq!(body_json(resp).await["error"]["code"], "badoffset");
    let resp = router.clone().oneshot(get("/api/bs?colour=red")).await.unwrap();
    assert_eq!(body_json(resp).await["error"]["code"], "unknownfield");
    let resp = router.oneshot(get("/api/as/abc")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unavailable_store_is_503() {
    let h = harness();
    h.a.set_available(false);
    let resp = app(h.services).oneshot(get("/api/as")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body_json(resp).await["error"]["code"], "store_unavailable");
}

#[tokio::test]
async fn health_and_version() {
    let router = entity_access::common_routes();
    let resp = router.clone().oneshot(get("/health")).await.unwrap();
    assert_eq!(body_json(resp).await["status"], "ok");
    let resp = router.oneshot(get("/version")).await.unwrap();
    assert_eq!(body_json(resp).await["name"], "entity-access");
}
