// Drives the real blocking client against a local mock server.

use std::time::Duration;

use httpmock::prelude::*;
use yelp_api_cli::api::SignatureTransport;
use yelp_api_cli::{query_api, ApiClient, Config, HttpError, QueryError, SearchQuery};

fn config() -> Config {
    Config::from_json(
        r#"{
            "consumer_key": "ck",
            "consumer_secret": "cs",
            "token": "tk",
            "token_secret": "ts",
            "search_endpoint": "/v2/search",
            "business_endpoint": "/v2/business",
            "default_search_results": "5",
            "api_host": "unused.example.com"
        }"#,
    )
    .unwrap()
}

fn client(server: &MockServer) -> ApiClient {
    ApiClient::with_base_url(&config(), server.base_url()).unwrap()
}

fn dinner() -> SearchQuery {
    SearchQuery::new("dinner", "San Francisco, CA", "5")
}

#[test]
fn search_then_detail_for_each_business_in_order() {
    let server = MockServer::start();
    let search = server.mock(|when, then| {
        when.method(GET)
            .path("/v2/search")
            .query_param("term", "dinner")
            .query_param("location", "San Francisco, CA")
            .query_param("limit", "5")
            .header_exists("authorization");
        then.status(200)
            .header("content-type", "application/json")
            .body(r#"{"businesses":[{"id":"abc"},{"id":"def"}]}"#);
    });
    let abc = server.mock(|when, then| {
        when.method(GET)
            .path("/v2/business/abc")
            .header_exists("authorization");
        then.status(200).body(r#"{"id":"abc","name":"Alpha"}"#);
    });
    let def = server.mock(|when, then| {
        when.method(GET).path("/v2/business/def");
        then.status(200).body(r#"{"id":"def","name":"Delta"}"#);
    });

    let mut out = Vec::new();
    let summary = query_api(&client(&server), &dinner(), &mut out).unwrap();
    let output = String::from_utf8(out).unwrap();

    search.assert();
    abc.assert();
    def.assert();
    assert_eq!(summary.fetched, vec!["abc", "def"]);

    let alpha = output.find(r#"{"id":"abc","name":"Alpha"}"#).unwrap();
    let delta = output.find(r#"{"id":"def","name":"Delta"}"#).unwrap();
    assert!(alpha < delta);
    assert!(output.contains("Result for business \"abc\" found:"));
}

#[test]
fn header_transport_keeps_oauth_params_out_of_the_query() {
    let server = MockServer::start();
    let detail = server.mock(|when, then| {
        when.method(GET)
            .path("/v2/business/abc")
            .header_exists("authorization");
        then.status(200).body("{}");
    });
    let leaked = server.mock(|when, then| {
        when.method(GET)
            .path("/v2/business/abc")
            .query_param_exists("oauth_signature");
        then.status(500);
    });

    client(&server).get_business_detail("abc").unwrap();
    detail.assert();
    leaked.assert_hits(0);
}

#[test]
fn query_string_transport_carries_oauth_params() {
    let server = MockServer::start();
    let detail = server.mock(|when, then| {
        when.method(GET)
            .path("/v2/business/abc")
            .query_param("oauth_consumer_key", "ck")
            .query_param("oauth_token", "tk")
            .query_param_exists("oauth_signature")
            .query_param_exists("oauth_nonce");
        then.status(200).body("{}");
    });

    client(&server)
        .with_transport(SignatureTransport::QueryString)
        .get_business_detail("abc")
        .unwrap();
    detail.assert();
}

#[test]
fn non_json_search_body_stops_before_any_detail_fetch() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/v2/search");
        then.status(200).body("Service temporarily unavailable");
    });
    let detail = server.mock(|when, then| {
        when.method(GET).path("/v2/business/abc");
        then.status(200).body("{}");
    });

    let mut out = Vec::new();
    let err = query_api(&client(&server), &dinner(), &mut out).unwrap_err();

    match err {
        QueryError::Parse { body, .. } => assert_eq!(body, "Service temporarily unavailable"),
        other => panic!("expected parse error, got {other:?}"),
    }
    detail.assert_hits(0);
}

#[test]
fn empty_or_absent_businesses_make_no_detail_calls() {
    for body in [r#"{"businesses":[]}"#, r#"{"region":{}}"#] {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/v2/search");
            then.status(200).body(body);
        });
        let detail = server.mock(|when, then| {
            when.method(GET).path("/v2/business/abc");
            then.status(200).body("{}");
        });

        let mut out = Vec::new();
        let summary = query_api(&client(&server), &dinner(), &mut out).unwrap();

        assert_eq!(summary.attempted(), 0);
        assert!(out.is_empty());
        detail.assert_hits(0);
    }
}

#[test]
fn non_2xx_is_status_error_with_body() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/v2/search");
        then.status(400)
            .body(r#"{"error":{"id":"INVALID_SIGNATURE"}}"#);
    });

    let err = client(&server)
        .search_businesses("dinner", "San Francisco, CA", "5")
        .unwrap_err();
    match err {
        HttpError::Status { status, body, .. } => {
            assert_eq!(status, 400);
            assert!(body.contains("INVALID_SIGNATURE"));
        }
        other => panic!("expected status error, got {other:?}"),
    }
}

#[test]
fn failing_detail_does_not_stop_the_rest() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/v2/search");
        then.status(200)
            .body(r#"{"businesses":[{"id":"gone"},{"id":"here"}]}"#);
    });
    server.mock(|when, then| {
        when.method(GET).path("/v2/business/gone");
        then.status(404).body(r#"{"error":"not found"}"#);
    });
    let here = server.mock(|when, then| {
        when.method(GET).path("/v2/business/here");
        then.status(200).body(r#"{"id":"here"}"#);
    });

    let mut out = Vec::new();
    let summary = query_api(&client(&server), &dinner(), &mut out).unwrap();

    here.assert();
    assert_eq!(summary.fetched, vec!["here"]);
    assert_eq!(summary.failed.len(), 1);
    assert_eq!(summary.failed[0].0, "gone");
}

#[test]
fn detail_fetch_is_repeatable() {
    let server = MockServer::start();
    let detail = server.mock(|when, then| {
        when.method(GET).path("/v2/business/abc");
        then.status(200).body(r#"{"id":"abc","rating":4.5}"#);
    });

    let api = client(&server);
    let first = api.get_business_detail("abc").unwrap();
    let second = api.get_business_detail("abc").unwrap();

    assert_eq!(first, second);
    detail.assert_hits(2);
}

#[test]
fn slow_server_hits_the_timeout() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/v2/business/slow");
        then.status(200)
            .delay(Duration::from_secs(3))
            .body("{}");
    });

    let api = client(&server)
        .with_timeout(Duration::from_millis(200))
        .unwrap();
    let err = api.get_business_detail("slow").unwrap_err();
    assert!(matches!(err, HttpError::Transport { .. }));
}
