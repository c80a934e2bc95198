use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use distrimap_api::{build_router, AppState, ServerConfig};
use distrimap_core::db::open_db_in_memory;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

const TOKEN: &str = "s3cret";

fn app(admin_token: Option<&str>) -> Router {
    let config = ServerConfig {
        admin_token: admin_token.map(str::to_string),
        ..ServerConfig::default()
    };
    build_router(AppState::try_new(open_db_in_memory().unwrap(), config).unwrap())
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    send(app, Request::get(uri).body(Body::empty()).unwrap()).await
}

async fn admin(
    app: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {TOKEN}"));
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    send(app, request).await
}

fn payload(nom: &str, kind: &str, ville: &str, latitude: f64, longitude: f64) -> Value {
    json!({
        "nom": nom,
        "type": kind,
        "ville": ville,
        "latitude": latitude,
        "longitude": longitude,
    })
}

async fn seed(app: &Router) -> Vec<String> {
    let mut ids = Vec::new();
    for body in [
        payload("Akwa Cash", "billets", "Douala", 4.0511, 9.7679),
        payload("Bonabéri Boissons", "boissons", "Douala", 4.0486, 9.7043),
        payload("Bastos Cash", "billets", "Yaoundé", 3.8900, 11.5100),
    ] {
        let (status, created) =
            admin(app, Method::POST, "/api/admin/distributeurs", Some(body)).await;
        assert_eq!(status, StatusCode::CREATED, "{created}");
        ids.push(created["data"]["id"].as_str().unwrap().to_string());
    }
    ids
}

fn names(body: &Value) -> Vec<&str> {
    body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["nom"].as_str().unwrap())
        .collect()
}

#[tokio::test]
async fn health_reports_up() {
    let (status, body) = get(&app(None), "/api/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["status"], "up");
}

#[tokio::test]
async fn listing_without_location_has_no_distance() {
    let app = app(Some(TOKEN));
    seed(&app).await;

    let (status, body) = get(&app, "/api/distributeurs").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 3);
    assert_eq!(
        names(&body),
        vec!["Bastos Cash", "Bonabéri Boissons", "Akwa Cash"]
    );
    assert!(body["data"][0].get("distance").is_none());
}

#[tokio::test]
async fn listing_with_location_filters_and_ranks() {
    let app = app(Some(TOKEN));
    seed(&app).await;

    let (status, body) = get(&app, "/api/distributeurs?lat=4.0511&lng=9.7679&radius=5").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(names(&body), vec!["Akwa Cash"]);
    assert_eq!(body["data"][0]["distance"], 0.0);

    let (_, body) = get(&app, "/api/distributeurs?lat=4.0511&lng=9.7679&radius=10").await;
    assert_eq!(names(&body), vec!["Akwa Cash", "Bonabéri Boissons"]);
    let distance = body["data"][1]["distance"].as_f64().unwrap();
    assert!((distance - 7.1).abs() < 0.1, "got {distance}");

    let (_, body) = get(&app, "/api/distributeurs?lat=4.0511&lng=9.7679").await;
    assert_eq!(names(&body), vec!["Akwa Cash"]);
}

#[tokio::test]
async fn listing_filters_by_type_and_ville() {
    let app = app(Some(TOKEN));
    seed(&app).await;

    let (_, body) = get(&app, "/api/distributeurs?type=billets&ville=douala").await;
    assert_eq!(names(&body), vec!["Akwa Cash"]);

    let (_, body) = get(&app, "/api/distributeurs?q=cash&limit=1&offset=1").await;
    assert_eq!(names(&body), vec!["Akwa Cash"]);
}

#[tokio::test]
async fn invalid_query_is_a_json_bad_request() {
    let app = app(None);
    for uri in [
        "/api/distributeurs?lat=4.05",
        "/api/distributeurs?lat=abc&lng=9.7",
        "/api/distributeurs?lat=4.05&lng=9.7&radius=-2",
        "/api/distributeurs?statut=ferme",
        "/api/distributeurs/nearest",
        "/api/distributeurs/not-a-uuid",
    ] {
        let (status, body) = get(&app, uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(body["success"], false, "{uri}");
        assert!(body["message"].is_string(), "{uri}");
    }
}

#[tokio::test]
async fn repeated_query_key_is_a_json_bad_request() {
    let app = app(None);
    for uri in [
        "/api/distributeurs?lat=1&lat=2&lng=9",
        "/api/distributeurs/nearest?lat=1&lat=2&lng=9",
    ] {
        let (status, body) = get(&app, uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(body["success"], false, "{uri}");
        assert!(body["message"].is_string(), "{uri}");
    }
}

#[tokio::test]
async fn radius_without_location_is_ignored() {
    let app = app(None);
    for uri in [
        "/api/distributeurs?radius=abc",
        "/api/distributeurs?radius=-1",
    ] {
        let (status, body) = get(&app, uri).await;
        assert_eq!(status, StatusCode::OK, "{uri}");
        assert_eq!(body["success"], true, "{uri}");
    }
}

#[tokio::test]
async fn nearest_ignores_radius() {
    let app = app(Some(TOKEN));
    seed(&app).await;

    let uri = "/api/distributeurs/nearest?lat=3.848&lng=11.5021&limit=2";
    let (status, body) = get(&app, uri).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(names(&body), vec!["Bastos Cash", "Akwa Cash"]);
    assert!(body["data"][1]["distance"].as_f64().unwrap() > 150.0);
}

#[tokio::test]
async fn get_by_id_and_lookups() {
    let app = app(Some(TOKEN));
    let ids = seed(&app).await;

    let (status, body) = get(&app, &format!("/api/distributeurs/{}", ids[0])).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["nom"], "Akwa Cash");
    assert_eq!(body["data"]["type"], "billets");
    assert_eq!(body["data"]["statut"], "actif");

    let (status, body) = get(
        &app,
        "/api/distributeurs/00000000-0000-4000-8000-000000000000",
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);

    let (_, body) = get(&app, "/api/villes").await;
    assert_eq!(body["data"], json!(["Douala", "Yaoundé"]));
    let (_, body) = get(&app, "/api/types").await;
    assert_eq!(body["data"], json!(["billets", "boissons"]));
}

#[tokio::test]
async fn admin_routes_require_configured_token() {
    let disabled = app(None);
    let (status, _) = get(&disabled, "/api/admin/stats").await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let guarded = app(Some(TOKEN));
    let (status, body) = get(&guarded, "/api/admin/stats").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);

    let request = Request::get("/api/admin/stats")
        .header(header::AUTHORIZATION, "Bearer wrong")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&guarded, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = admin(&guarded, Method::GET, "/api/admin/stats", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 0);
}

#[tokio::test]
async fn admin_crud_roundtrip() {
    let app = app(Some(TOKEN));
    let ids = seed(&app).await;
    let uri = format!("/api/admin/distributeurs/{}", ids[1]);

    let mut body = payload("Bonabéri Boissons", "boissons", "Douala", 4.0486, 9.7043);
    body["statut"] = json!("maintenance");
    body["images"] = json!(["https://img.example/a.jpg"]);
    let (status, updated) = admin(&app, Method::PUT, &uri, Some(body)).await;
    assert_eq!(status, StatusCode::OK, "{updated}");
    assert_eq!(updated["data"]["statut"], "maintenance");
    assert_eq!(updated["data"]["images"][0]["url"], "https://img.example/a.jpg");

    let (_, stats) = admin(&app, Method::GET, "/api/admin/stats", None).await;
    assert_eq!(stats["data"]["total"], 3);
    assert_eq!(stats["data"]["by_statut"]["maintenance"], 1);

    let (status, _) = admin(&app, Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = admin(&app, Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn admin_rejects_invalid_bodies() {
    let app = app(Some(TOKEN));

    let (status, body) = admin(
        &app,
        Method::POST,
        "/api/admin/distributeurs",
        Some(payload("  ", "billets", "Douala", 4.0, 9.7)),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let (status, _) = admin(
        &app,
        Method::POST,
        "/api/admin/distributeurs",
        Some(payload("Akwa", "billets", "Douala", 95.0, 9.7)),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = admin(
        &app,
        Method::POST,
        "/api/admin/distributeurs",
        Some(json!({ "nom": "Akwa" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = admin(
        &app,
        Method::PUT,
        "/api/admin/distributeurs/00000000-0000-4000-8000-000000000000",
        Some(payload("Akwa", "billets", "Douala", 4.0, 9.7)),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unknown_route_is_json_not_found() {
    let (status, body) = get(&app(None), "/api/nowhere").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
}
