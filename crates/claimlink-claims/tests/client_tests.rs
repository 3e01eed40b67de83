//! Claims API client tests against a mocked FHIR endpoint.

use std::time::Duration;

use serde_json::json;
use url::Url;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use claimlink_claims::{ClaimType, ClaimsClient, ClaimsClientConfig, ClaimsError, classify};

fn client(server: &MockServer) -> ClaimsClient {
    let base_url = Url::parse(&format!("{}/v2/fhir/", server.uri())).unwrap();
    ClaimsClient::new(
        ClaimsClientConfig::new(base_url).with_request_timeout(Duration::from_secs(5)),
    )
    .unwrap()
}

fn eob_entry(id: &str, code: &str) -> serde_json::Value {
    json!({ "resource": {
        "resourceType": "ExplanationOfBenefit",
        "id": id,
        "type": { "coding": [
            { "system": "https://bluebutton.cms.gov/resources/codesystem/eob-type", "code": code }
        ]}
    }})
}

fn searchset(entries: Vec<serde_json::Value>) -> serde_json::Value {
    json!({ "resourceType": "Bundle", "type": "searchset",
            "total": entries.len(), "entry": entries })
}

#[tokio::test]
async fn fan_out_merges_per_type_responses() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v2/fhir/ExplanationOfBenefit"))
        .and(query_param("patient", "-20140000008325"))
        .and(query_param("type", "CARRIER"))
        .and(query_param("_summary", "true"))
        .and(header("authorization", "Bearer at-1"))
        .and(header("accept", "application/fhir+json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(searchset(vec![
            eob_entry("c-1", "CARRIER"),
            eob_entry("c-2", "CARRIER"),
        ])))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v2/fhir/ExplanationOfBenefit"))
        .and(query_param("type", "PDE"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(searchset(vec![eob_entry("p-1", "PDE")])),
        )
        .mount(&server)
        .await;

    let bundle = client(&server)
        .explanation_of_benefit("at-1", "-20140000008325", &[ClaimType::Carrier, ClaimType::Pde])
        .await
        .unwrap();

    assert_eq!(bundle.len(), 3);
    // Relative order within each per-type response is preserved.
    let carrier_ids: Vec<&str> = bundle
        .entry
        .iter()
        .filter_map(|e| e.resource["id"].as_str())
        .filter(|id| id.starts_with("c-"))
        .collect();
    assert_eq!(carrier_ids, ["c-1", "c-2"]);
}

#[tokio::test]
async fn empty_type_list_issues_one_untyped_request() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v2/fhir/ExplanationOfBenefit"))
        .and(query_param("patient", "-20140000008325"))
        .and(query_param("_summary", "true"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(searchset(vec![eob_entry("c-1", "CARRIER")])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let bundle = client(&server)
        .explanation_of_benefit("at-1", "-20140000008325", &[])
        .await
        .unwrap();

    assert_eq!(bundle.len(), 1);
    assert_eq!(bundle.bundle_type.as_deref(), Some("searchset"));
}

#[tokio::test]
async fn any_failed_sub_fetch_fails_the_whole_fetch() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v2/fhir/ExplanationOfBenefit"))
        .and(query_param("type", "CARRIER"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(searchset(vec![eob_entry("c-1", "CARRIER")])),
        )
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v2/fhir/ExplanationOfBenefit"))
        .and(query_param("type", "INPATIENT"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let result = client(&server)
        .explanation_of_benefit("at-1", "-20140000008325", &[ClaimType::Carrier, ClaimType::Inpatient])
        .await;

    match result {
        Err(ClaimsError::Api { status, .. }) => assert_eq!(status, 502),
        other => panic!("expected Api error, got {other:?}"),
    }
}

#[tokio::test]
async fn fetched_bundle_classifies_end_to_end() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v2/fhir/ExplanationOfBenefit"))
        .respond_with(ResponseTemplate::new(200).set_body_json(searchset(vec![
            eob_entry("c-1", "CARRIER"),
            json!({ "resource": { "resourceType": "ExplanationOfBenefit", "id": "u-1" } }),
        ])))
        .mount(&server)
        .await;

    let bundle = client(&server)
        .explanation_of_benefit("at-1", "-20140000008325", &[])
        .await
        .unwrap();
    let categorized = classify(&bundle);

    assert_eq!(categorized.carrier.len(), 1);
    assert_eq!(categorized.other.len(), 1);
    assert_eq!(categorized.len(), bundle.len());
}

#[tokio::test]
async fn patient_and_coverage_requests_hit_their_resources() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v2/fhir/Patient"))
        .and(header("authorization", "Bearer at-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(searchset(vec![
            json!({ "resource": { "resourceType": "Patient", "id": "-20140000008325" } }),
        ])))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v2/fhir/Patient/-20140000008325"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "resourceType": "Patient", "id": "-20140000008325"
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v2/fhir/Coverage"))
        .respond_with(ResponseTemplate::new(200).set_body_json(searchset(vec![])))
        .mount(&server)
        .await;

    let client = client(&server);

    let patients = client.patient("at-1").await.unwrap();
    assert_eq!(patients.len(), 1);

    let patient = client.patient_by_id("at-1", "-20140000008325").await.unwrap();
    assert_eq!(patient["id"], "-20140000008325");

    let coverage = client.coverage("at-1").await.unwrap();
    assert!(coverage.is_empty());
}

#[tokio::test]
async fn unauthorized_response_surfaces_status() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v2/fhir/ExplanationOfBenefit"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "resourceType": "OperationOutcome"
        })))
        .mount(&server)
        .await;

    let result = client(&server)
        .explanation_of_benefit("expired-token", "-20140000008325", &[])
        .await;

    match result {
        Err(err @ ClaimsError::Api { status: 401, .. }) => assert!(err.is_transport_error()),
        other => panic!("expected Api error, got {other:?}"),
    }
}
