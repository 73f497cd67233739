use super::*;

fn test_client(base_url: &str) -> PriceApiClient {
    PriceApiClient::with_base_url("tok", 30, base_url).expect("client construction should not fail")
}

#[test]
fn jobs_url_keeps_version_prefix() {
    let client = test_client("https://api.priceapi.com/v2");
    assert_eq!(
        client.join("jobs").unwrap().as_str(),
        "https://api.priceapi.com/v2/jobs"
    );
}

#[test]
fn download_url_carries_token() {
    let client = test_client("https://api.priceapi.com/v2/");
    assert_eq!(
        client.download_url("abc123").unwrap().as_str(),
        "https://api.priceapi.com/v2/jobs/abc123/download.json?token=tok"
    );
}

#[test]
fn invalid_base_url_is_rejected() {
    let err = PriceApiClient::with_base_url("tok", 30, "not a url").unwrap_err();
    assert!(matches!(err, PriceApiError::InvalidBaseUrl { .. }));
}

#[test]
fn debug_hides_token() {
    let client = test_client("https://api.priceapi.com/v2/").with_market("us", "amazon");
    let rendered = format!("{client:?}");
    assert!(!rendered.contains("tok\""));
    assert!(rendered.contains("amazon"));
}

#[test]
fn specs_outcomes_render_expected_bodies() {
    let found = SpecsOutcome::Found(json!({"brand": "Acme"})).to_body();
    assert_eq!(found["status"], "success");
    assert_eq!(found["data"]["brand"], "Acme");

    let timed_out = SpecsOutcome::TimedOut {
        job_id: "j1".to_owned(),
    }
    .to_body();
    assert_eq!(timed_out["error"], "Job did not finish in time");
    assert_eq!(timed_out["job_id"], "j1");

    let failed = SpecsOutcome::JobCreationFailed(json!({"reason": "bad token"})).to_body();
    assert_eq!(failed["error"], "Job creation failed");
    assert_eq!(failed["details"]["reason"], "bad token");
}
