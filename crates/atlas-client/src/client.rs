//! `AtlasClient`: a resolver bundled with an artifact source.

use std::sync::Arc;

use futures::future::join_all;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use atlas_types::{
    ClientSettings, CooccurrenceArtifact, Manifest, ProjectionArtifact, PROJECTION_FILE,
};

use crate::error::FetchError;
use crate::fetcher::{fetch_artifact, ArtifactSource, HttpFetcher};
use crate::resolver::{ResolverConfig, VariantResolver};

/// Client for the published artifact tree.
pub struct AtlasClient {
    resolver: VariantResolver,
    source: Arc<dyn ArtifactSource>,
}

impl AtlasClient {
    pub fn new(resolver: VariantResolver, source: Arc<dyn ArtifactSource>) -> Self {
        Self { resolver, source }
    }

    /// HTTP client configured from settings.
    pub fn from_settings(settings: &ClientSettings) -> Result<Self, FetchError> {
        let fetcher = HttpFetcher::new(settings.origin.clone())?;
        Ok(Self::new(
            VariantResolver::new(ResolverConfig::from(settings)),
            Arc::new(fetcher),
        ))
    }

    pub fn resolver(&self) -> &VariantResolver {
        &self.resolver
    }

    /// Fetch the manifest (or its fallback) and adopt its default variant
    /// when nothing else has been chosen.
    pub async fn manifest(&self) -> Manifest {
        let manifest = self.resolver.get_manifest(self.source.as_ref()).await;
        let active = self.resolver.adopt_manifest_default(&manifest);
        debug!(active = %active, "Active variant after manifest load");
        manifest
    }

    /// Load a variant-scoped artifact.
    pub async fn load<T: DeserializeOwned>(
        &self,
        file_name: &str,
        variant: Option<&str>,
    ) -> Result<T, FetchError> {
        let path = self.resolver.resolve_path(file_name, variant);
        fetch_artifact(self.source.as_ref(), &path).await
    }

    /// Load podcast-scoped raw data.
    pub async fn load_podcast<T: DeserializeOwned>(
        &self,
        podcast_id: &str,
        file_name: &str,
    ) -> Result<T, FetchError> {
        let path = self.resolver.podcast_path(podcast_id, file_name);
        fetch_artifact(self.source.as_ref(), &path).await
    }

    pub async fn load_cooccurrence(
        &self,
        file_name: &str,
        variant: Option<&str>,
    ) -> Result<CooccurrenceArtifact, FetchError> {
        self.load(file_name, variant).await
    }

    pub async fn load_projection(
        &self,
        variant: Option<&str>,
    ) -> Result<ProjectionArtifact, FetchError> {
        self.load(PROJECTION_FILE, variant).await
    }

    /// Load several artifacts concurrently. Each request is independent and
    /// its outcome is reported on its own, in input order.
    pub async fn load_all(
        &self,
        file_names: &[&str],
        variant: Option<&str>,
    ) -> Vec<(String, Result<Value, FetchError>)> {
        let requests = file_names.iter().map(|name| async move {
            let result = self.load::<Value>(name, variant).await;
            (name.to_string(), result)
        });
        join_all(requests).await
    }
}
