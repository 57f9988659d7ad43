use utoipa::OpenApi;
use walletd::ApiDoc;

#[test]
fn openapi_spec_covers_every_route() {
    let spec = ApiDoc::openapi();

    for expected in [
        "/health",
        "/api/v1/wallets",
        "/api/v1/wallets/{name}",
        "/api/v1/wallets/{name}/balance",
        "/api/v1/wallets/{name}/history",
        "/api/v1/wallets/{name}/sync",
    ] {
        assert!(
            spec.paths.paths.contains_key(expected),
            "OpenAPI spec is missing {expected}"
        );
    }
}

#[test]
fn openapi_spec_serializes_to_json() {
    let json = ApiDoc::openapi().to_pretty_json().unwrap();

    assert!(json.contains("\"openapi\""));
    assert!(json.contains("WalletResponse"));
    assert!(json.contains("SyncReport"));
}
