mod common;

use axum::http::StatusCode;
use common::{TestApp, read_json};
use http_helpers::{authed_json_request, authed_request, get};
use recordkeeper::model::Officer;
use roster_authz::Rank;
use serde_json::json;
use tower::ServiceExt;

fn refs(officers: &[&Officer]) -> serde_json::Value {
    officers
        .iter()
        .map(|o| json!({ "id": o.id.to_string(), "fullName": o.full_name }))
        .collect()
}

fn involved(body: &serde_json::Value) -> Vec<String> {
    body["officersEnvolved"]
        .as_array()
        .expect("officers")
        .iter()
        .map(|o| o["fullName"].as_str().expect("name").to_string())
        .collect()
}

async fn report(harness: &TestApp, number: i64) -> serde_json::Value {
    let response = harness
        .app
        .clone()
        .oneshot(get(&format!("/v1/reports?reportNumber={number}")))
        .await
        .expect("list");
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    body["data"].get(0).cloned().unwrap_or(serde_json::Value::Null)
}

#[tokio::test]
async fn report_lifecycle_keeps_associations_in_sync() {
    let harness = TestApp::new();
    let (ana, token) = harness.officer("Ana Alves", "100-001", Rank::Pilot).await;
    let (bia, _) = harness.officer("Bia Borges", "100-002", Rank::Pilot).await;
    let (caio, _) = harness.officer("Caio Costa", "100-003", Rank::Pilot).await;
    let (davi, _) = harness.officer("Davi Dias", "100-004", Rank::Pilot).await;
    let (_, command) = harness.officer("Cora Command", "300-000", Rank::Command).await;

    let response = harness
        .app
        .clone()
        .oneshot(authed_json_request(
            "POST",
            "/v1/reports",
            &token,
            json!({
                "reportNumber": 10,
                "title": "Hangar fire",
                "description": "Fire in hangar two",
                "officersEnvolved": refs(&[&caio, &ana, &bia])
            }),
        ))
        .await
        .expect("create");
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = report(&harness, 10).await;
    assert_eq!(involved(&created), ["Ana Alves", "Bia Borges", "Caio Costa"]);

    let response = harness
        .app
        .clone()
        .oneshot(authed_json_request(
            "PATCH",
            "/v1/reports/10",
            &token,
            json!({
                "title": "Hangar fire (contained)",
                "description": "Fire in hangar two, contained",
                "officersEnvolved": refs(&[&bia, &caio, &davi])
            }),
        ))
        .await
        .expect("update");
    assert_eq!(response.status(), StatusCode::OK);
    let updated = report(&harness, 10).await;
    assert_eq!(updated["title"], "Hangar fire (contained)");
    assert_eq!(involved(&updated), ["Bia Borges", "Caio Costa", "Davi Dias"]);

    let response = harness
        .app
        .clone()
        .oneshot(get("/v1/officers"))
        .await
        .expect("officers");
    let roster = read_json(response).await;
    let davi_entry = roster["data"]
        .as_array()
        .expect("data")
        .iter()
        .find(|o| o["fullName"] == "Davi Dias")
        .expect("davi")
        .clone();
    assert_eq!(davi_entry["lastReport"]["reportNumber"], 10);

    let response = harness
        .app
        .clone()
        .oneshot(authed_request("DELETE", "/v1/reports/10", &token))
        .await
        .expect("delete");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = harness
        .app
        .clone()
        .oneshot(authed_request("DELETE", "/v1/reports/10", &command))
        .await
        .expect("delete");
    assert_eq!(response.status(), StatusCode::OK);
    assert!(report(&harness, 10).await.is_null());
}

#[tokio::test]
async fn renumbering_onto_existing_report_conflicts_without_changes() {
    let harness = TestApp::new();
    let (ana, token) = harness.officer("Ana Alves", "100-001", Rank::Pilot).await;
    let (bia, _) = harness.officer("Bia Borges", "100-002", Rank::Pilot).await;
    for (number, officer) in [(1, &ana), (2, &bia)] {
        let response = harness
            .app
            .clone()
            .oneshot(authed_json_request(
                "POST",
                "/v1/reports",
                &token,
                json!({
                    "reportNumber": number,
                    "title": "Routine patrol",
                    "description": "Nothing to report",
                    "officersEnvolved": refs(&[officer])
                }),
            ))
            .await
            .expect("create");
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let response = harness
        .app
        .clone()
        .oneshot(authed_json_request(
            "PATCH",
            "/v1/reports/1",
            &token,
            json!({
                "reportNumber": 2,
                "title": "Renumbered patrol",
                "description": "Nothing to report",
                "officersEnvolved": refs(&[&bia])
            }),
        ))
        .await
        .expect("update");
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = read_json(response).await;
    assert_eq!(body["code"], "report_exists");

    let first = report(&harness, 1).await;
    assert_eq!(first["title"], "Routine patrol");
    assert_eq!(involved(&first), ["Ana Alves"]);
}

#[tokio::test]
async fn duplicate_and_missing_reports_conflict() {
    let harness = TestApp::new();
    let (_, token) = harness.officer("Ana Alves", "100-001", Rank::Pilot).await;
    let payload = json!({
        "reportNumber": 5,
        "title": "Routine patrol",
        "description": "Nothing to report",
        "officersEnvolved": []
    });

    let response = harness
        .app
        .clone()
        .oneshot(authed_json_request("POST", "/v1/reports", &token, payload.clone()))
        .await
        .expect("create");
    assert_eq!(response.status(), StatusCode::CREATED);
    let response = harness
        .app
        .clone()
        .oneshot(authed_json_request("POST", "/v1/reports", &token, payload.clone()))
        .await
        .expect("duplicate");
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = harness
        .app
        .clone()
        .oneshot(authed_json_request("PATCH", "/v1/reports/77", &token, payload))
        .await
        .expect("missing");
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = read_json(response).await;
    assert_eq!(body["code"], "report_not_found");
}

#[tokio::test]
async fn unknown_officer_reference_fails_without_partial_writes() {
    let harness = TestApp::new();
    let (_, token) = harness.officer("Ana Alves", "100-001", Rank::Pilot).await;
    let response = harness
        .app
        .clone()
        .oneshot(authed_json_request(
            "POST",
            "/v1/reports",
            &token,
            json!({
                "reportNumber": 8,
                "title": "Routine patrol",
                "description": "Nothing to report",
                "officersEnvolved": [{ "id": uuid::Uuid::new_v4().to_string(), "fullName": "Ghost" }]
            }),
        ))
        .await
        .expect("create");
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(report(&harness, 8).await.is_null());
}

#[tokio::test]
async fn report_creation_requires_a_resolvable_caller() {
    let harness = TestApp::new();
    let response = harness
        .app
        .clone()
        .oneshot(authed_json_request(
            "POST",
            "/v1/reports",
            "Bearer expired-or-forged",
            json!({
                "reportNumber": 3,
                "title": "Routine patrol",
                "description": "Nothing to report",
                "officersEnvolved": []
            }),
        ))
        .await
        .expect("create");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(report(&harness, 3).await.is_null());
}

#[tokio::test]
async fn report_listing_filters_and_pages() {
    let harness = TestApp::with_page_size(2);
    let (ana, token) = harness.officer("Ana Alves", "100-001", Rank::Pilot).await;
    let (bia, _) = harness.officer("Bia Borges", "100-002", Rank::Pilot).await;
    for (number, officers) in [(1, vec![&ana]), (2, vec![&bia]), (3, vec![&ana, &bia])] {
        let response = harness
            .app
            .clone()
            .oneshot(authed_json_request(
                "POST",
                "/v1/reports",
                &token,
                json!({
                    "reportNumber": number,
                    "title": "Routine patrol",
                    "description": "Nothing to report",
                    "officersEnvolved": refs(&officers)
                }),
            ))
            .await
            .expect("create");
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let response = harness
        .app
        .clone()
        .oneshot(get("/v1/reports?officerId=all"))
        .await
        .expect("list");
    let body = read_json(response).await;
    assert_eq!(body["totalCount"], 3);
    assert_eq!(body["totalPages"], 2);
    assert_eq!(body["data"].as_array().expect("data").len(), 2);
    assert_eq!(body["data"][0]["reportNumber"], 3);

    let response = harness
        .app
        .clone()
        .oneshot(get(&format!("/v1/reports?officerId={}&itemsPerPage=10", bia.id)))
        .await
        .expect("list");
    let body = read_json(response).await;
    assert_eq!(body["totalCount"], 2);
    assert_eq!(body["totalPages"], 1);
    let numbers: Vec<i64> = body["data"]
        .as_array()
        .expect("data")
        .iter()
        .map(|r| r["reportNumber"].as_i64().expect("number"))
        .collect();
    assert_eq!(numbers, [3, 2]);

    let response = harness
        .app
        .clone()
        .oneshot(get("/v1/reports?officerId=not-a-uuid"))
        .await
        .expect("list");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
