//! The runtime client reading artifacts published by a generation run.

use std::fs;
use std::sync::Arc;

use pretty_assertions::assert_eq;
use serde_json::Value;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use atlas_client::{AtlasClient, HttpFetcher, ResolverConfig, VariantResolver};
use atlas_pipeline::Step;
use atlas_types::{
    CooccurrenceArtifact, Manifest, ProjectionArtifact, CLUSTER_COOCCURRENCE_FILE,
    PROJECTION_FILE, SPEAKER_COOCCURRENCE_FILE,
};
use e2e_tests::{read_json, TestHarness};

/// Serve the published copies of `files` for each variant, plus the
/// manifest, under `prefix`.
async fn serve_public(
    server: &MockServer,
    harness: &TestHarness,
    prefix: &str,
    variants: &[&str],
    files: &[&str],
) {
    let manifest = fs::read(harness.path("frontend/public/topics/manifest.json")).unwrap();
    Mock::given(method("GET"))
        .and(path(format!("{prefix}/topics/manifest.json")))
        .respond_with(ResponseTemplate::new(200).set_body_raw(manifest, "application/json"))
        .mount(server)
        .await;

    for variant in variants {
        for file in files {
            let body = fs::read(harness.public(variant, file)).unwrap();
            Mock::given(method("GET"))
                .and(path(format!("{prefix}/topics/{variant}/{file}")))
                .respond_with(ResponseTemplate::new(200).set_body_raw(body, "application/json"))
                .mount(server)
                .await;
        }
    }
}

fn client(server: &MockServer, config: ResolverConfig) -> AtlasClient {
    let fetcher = HttpFetcher::new(Some(server.uri())).unwrap();
    AtlasClient::new(VariantResolver::new(config), Arc::new(fetcher))
}

#[tokio::test]
async fn test_client_reads_published_artifacts() {
    let harness = TestHarness::new();
    harness.run("auto-v2.1", &Step::ALL);

    let server = MockServer::start().await;
    serve_public(
        &server,
        &harness,
        "",
        &["auto-v2.1"],
        &[CLUSTER_COOCCURRENCE_FILE, PROJECTION_FILE],
    )
    .await;

    let client = client(&server, ResolverConfig::default());
    let manifest = client.manifest().await;
    let on_disk: Manifest = read_json(&harness.manifest_path());
    assert_eq!(manifest, on_disk);
    assert_eq!(client.resolver().active_variant(), "auto-v2.1");

    let clusters = client
        .load_cooccurrence(CLUSTER_COOCCURRENCE_FILE, None)
        .await
        .unwrap();
    let expected: CooccurrenceArtifact =
        read_json(&harness.canonical("auto-v2.1", CLUSTER_COOCCURRENCE_FILE));
    assert_eq!(clusters, expected);

    let projection = client.load_projection(None).await.unwrap();
    let expected: ProjectionArtifact = read_json(&harness.canonical("auto-v2.1", PROJECTION_FILE));
    assert_eq!(projection.points.len(), expected.points.len());
    assert_eq!(projection, expected);
}

#[tokio::test]
async fn test_switching_variants_changes_artifact_paths() {
    let harness = TestHarness::new();
    harness.run("auto-v2.1", &[Step::SpeakerCooccurrence]);
    harness.run("experimental", &[Step::SpeakerCooccurrence]);

    let server = MockServer::start().await;
    serve_public(
        &server,
        &harness,
        "",
        &["auto-v2.1", "experimental"],
        &[SPEAKER_COOCCURRENCE_FILE],
    )
    .await;

    let client = client(&server, ResolverConfig::default());
    let manifest = client.manifest().await;
    assert!(manifest.contains("experimental"));

    assert!(client.resolver().set_variant("experimental"));
    assert_eq!(client.resolver().active_variant(), "experimental");
    let loaded = client
        .load_cooccurrence(SPEAKER_COOCCURRENCE_FILE, None)
        .await
        .unwrap();
    let expected: CooccurrenceArtifact =
        read_json(&harness.canonical("experimental", SPEAKER_COOCCURRENCE_FILE));
    assert_eq!(loaded, expected);

    // Reloading the manifest does not override an explicit choice.
    client.manifest().await;
    assert_eq!(client.resolver().active_variant(), "experimental");
}

#[tokio::test]
async fn test_locked_deployment_ignores_variant_changes() {
    let harness = TestHarness::new();
    harness.run("auto-v2.1", &[Step::ClusterCooccurrence]);
    harness.run("experimental", &[Step::ClusterCooccurrence]);

    let server = MockServer::start().await;
    serve_public(
        &server,
        &harness,
        "",
        &["experimental"],
        &[CLUSTER_COOCCURRENCE_FILE],
    )
    .await;

    let client = client(
        &server,
        ResolverConfig::default().with_locked_variant("experimental"),
    );
    client.manifest().await;
    assert!(!client.resolver().set_variant("auto-v2.1"));
    assert_eq!(client.resolver().active_variant(), "experimental");

    // Even an explicit per-call variant resolves to the locked one.
    let loaded = client
        .load_cooccurrence(CLUSTER_COOCCURRENCE_FILE, Some("auto-v2.1"))
        .await
        .unwrap();
    let expected: CooccurrenceArtifact =
        read_json(&harness.canonical("experimental", CLUSTER_COOCCURRENCE_FILE));
    assert_eq!(loaded, expected);
}

#[tokio::test]
async fn test_cdn_mode_fetches_from_mirror() {
    let harness = TestHarness::new();
    harness.run("auto-v2.1", &[Step::ClusterCooccurrence]);

    let server = MockServer::start().await;
    serve_public(
        &server,
        &harness,
        "/cdn",
        &["auto-v2.1"],
        &[CLUSTER_COOCCURRENCE_FILE],
    )
    .await;

    // No origin: every request must be absolute through the mirror.
    let fetcher = HttpFetcher::new(None).unwrap();
    let config = ResolverConfig::default().with_cdn(format!("{}/cdn/", server.uri()));
    let client = AtlasClient::new(VariantResolver::new(config), Arc::new(fetcher));

    let manifest = client.manifest().await;
    assert!(manifest.contains("auto-v2.1"));
    assert!(manifest.last_updated.is_some());

    let loaded = client
        .load_cooccurrence(CLUSTER_COOCCURRENCE_FILE, None)
        .await
        .unwrap();
    assert_eq!(loaded.statistics.total_entities, 4);
}

#[tokio::test]
async fn test_missing_manifest_falls_back_to_default_variant() {
    let server = MockServer::start().await;
    let client = client(&server, ResolverConfig::default());

    let manifest = client.manifest().await;
    assert_eq!(manifest, Manifest::single("auto-v2.1"));
    assert_eq!(client.resolver().active_variant(), "auto-v2.1");
}

#[tokio::test]
async fn test_load_all_reports_each_file() {
    let harness = TestHarness::new();
    harness.run("auto-v2.1", &[Step::ClusterCooccurrence]);

    let server = MockServer::start().await;
    serve_public(
        &server,
        &harness,
        "",
        &["auto-v2.1"],
        &[CLUSTER_COOCCURRENCE_FILE],
    )
    .await;

    let client = client(&server, ResolverConfig::default());
    let results = client
        .load_all(&[CLUSTER_COOCCURRENCE_FILE, "missing.json"], None)
        .await;

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].0, CLUSTER_COOCCURRENCE_FILE);
    let value: &Value = results[0].1.as_ref().unwrap();
    assert_eq!(value["statistics"]["totalEntities"], 4);

    assert_eq!(results[1].0, "missing.json");
    let err = results[1].1.as_ref().unwrap_err();
    assert!(err.to_string().contains("404"), "unexpected error: {err}");
}
