use httpmock::prelude::*;
use profit_engine::{
    CommissionBracketResolver, EngineError, HttpBracketResolver, ProfitabilitySolver, RoleId,
};
use profit_engine::core::solver::SolverInput;
use rust_decimal_macros::dec;
use std::time::Duration;

#[tokio::test]
async fn test_resolve_found_bracket() {
    let server = MockServer::start();
    let api_mock = server.mock(|when, then| {
        when.method(GET)
            .path("/brackets/resolve")
            .query_param("margin", "76.2")
            .query_param("role", "sales")
            .header("Authorization", "Bearer token");
        then.status(200)
            .header("Content-Type", "application/json")
            .json_body(serde_json::json!({"commission_percent": 5}));
    });

    let mut headers = std::collections::HashMap::new();
    headers.insert("Authorization".to_string(), "Bearer token".to_string());
    let resolver = HttpBracketResolver::new(server.url("/brackets/resolve")).with_headers(headers);

    let result = resolver.resolve(dec!(76.2), &RoleId::new("sales")).await.unwrap();

    api_mock.assert();
    assert_eq!(result, Some(dec!(5)));
}

#[tokio::test]
async fn test_resolve_accepts_string_percentages() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/brackets/resolve");
        then.status(200)
            .json_body(serde_json::json!({"commission_percent": "2.5"}));
    });

    let resolver = HttpBracketResolver::new(server.url("/brackets/resolve"));
    let result = resolver.resolve(dec!(40), &RoleId::new("sales")).await.unwrap();

    assert_eq!(result, Some(dec!(2.5)));
}

#[tokio::test]
async fn test_resolve_fractional_percentage_is_exact() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/brackets/resolve");
        then.status(200)
            .header("Content-Type", "application/json")
            .body(r#"{"commission_percent": 7.35}"#);
    });

    let resolver = HttpBracketResolver::new(server.url("/brackets/resolve"));
    let result = resolver.resolve(dec!(80), &RoleId::new("sales")).await.unwrap();

    assert_eq!(result, Some(dec!(7.35)));
}

#[tokio::test]
async fn test_resolve_404_is_not_found() {
    let server = MockServer::start();
    let api_mock = server.mock(|when, then| {
        when.method(GET).path("/brackets/resolve");
        then.status(404);
    });

    let resolver = HttpBracketResolver::new(server.url("/brackets/resolve"));
    let result = resolver.resolve(dec!(10), &RoleId::new("sales")).await.unwrap();

    api_mock.assert();
    assert!(result.is_none());
}

#[tokio::test]
async fn test_resolve_server_error_is_resolver_error() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/brackets/resolve");
        then.status(500);
    });

    let resolver = HttpBracketResolver::new(server.url("/brackets/resolve"));
    let err = resolver
        .resolve(dec!(10), &RoleId::new("sales"))
        .await
        .unwrap_err();

    assert!(matches!(err, EngineError::ResolverError { .. }));
}

#[tokio::test]
async fn test_resolve_timeout_is_transport_error() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/brackets/resolve");
        then.status(200)
            .delay(Duration::from_millis(500))
            .json_body(serde_json::json!({"commission_percent": 5}));
    });

    let resolver = HttpBracketResolver::new(server.url("/brackets/resolve"))
        .with_timeout(Duration::from_millis(50));
    let err = resolver
        .resolve(dec!(10), &RoleId::new("sales"))
        .await
        .unwrap_err();

    assert!(matches!(err, EngineError::HttpError(_)));
}

#[tokio::test]
async fn test_solver_over_http_converges_in_two_passes() {
    let server = MockServer::start();
    let first_pass = server.mock(|when, then| {
        when.method(GET)
            .path("/brackets/resolve")
            .query_param("margin", "76.2");
        then.status(200)
            .json_body(serde_json::json!({"commission_percent": 5}));
    });
    let second_pass = server.mock(|when, then| {
        when.method(GET)
            .path("/brackets/resolve")
            .query_param("margin", "71.2");
        then.status(200)
            .json_body(serde_json::json!({"commission_percent": 5}));
    });

    let solver = ProfitabilitySolver::new(HttpBracketResolver::new(
        server.url("/brackets/resolve"),
    ));
    let out = solver
        .solve(&SolverInput {
            revenue: dec!(1000000),
            costs_excluding_commission: dec!(238000),
            role_id: Some(RoleId::new("sales")),
            manual_commission_percent: None,
        })
        .await;

    first_pass.assert_hits(1);
    second_pass.assert_hits(1);
    assert!(out.converged);
    assert_eq!(out.iterations, 2);
    assert_eq!(out.commission_amount, dec!(50000));
    assert_eq!(out.net_margin_percent, dec!(71.2));
}

#[tokio::test]
async fn test_solver_degrades_when_service_is_down() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/brackets/resolve");
        then.status(503);
    });

    let solver = ProfitabilitySolver::new(HttpBracketResolver::new(
        server.url("/brackets/resolve"),
    ));
    let out = solver
        .solve(&SolverInput {
            revenue: dec!(1000),
            costs_excluding_commission: dec!(100),
            role_id: Some(RoleId::new("sales")),
            manual_commission_percent: None,
        })
        .await;

    assert!(out.converged);
    assert!(out.resolver_degraded);
    assert_eq!(out.commission_percent, dec!(0));
    assert_eq!(out.net_margin_percent, dec!(90));
}
