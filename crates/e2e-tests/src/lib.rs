//! End-to-end test infrastructure for Podcast Atlas.
//!
//! Provides a `TestHarness` that lays out a small but complete input corpus
//! (embeddings, taxonomy, episode metadata, variant registry) in a temp
//! directory, plus helpers to run the generator and read its output.

use std::fs;
use std::path::{Path, PathBuf};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use atlas_pipeline::{Generator, RunReport, Step, TOPICS_DIR};
use atlas_types::{EpisodeId, Settings, MANIFEST_FILE};

pub const EMBEDDING_DIM: usize = 16;
pub const EPISODE_COUNT: EpisodeId = 24;
/// Episode published without a date
pub const UNDATED_EPISODE: EpisodeId = 23;

/// `(label, embedding group, episodes)` for every fixture topic.
pub fn fixture_topics() -> Vec<(&'static str, usize, Vec<EpisodeId>)> {
    vec![
        ("iPhone", 0, vec![1, 2, 3, 4, 5, 6]),
        ("iPad", 0, vec![2, 4, 6, 8]),
        ("macOS", 0, vec![1, 3, 5, 7, 9]),
        ("Apple Watch", 0, vec![10, 11]),
        ("Browser", 1, vec![7, 8, 9, 10]),
        ("JavaScript", 1, vec![8, 12, 13]),
        ("HTTP/2", 1, vec![14]),
        ("Mikrofone", 2, vec![15, 16, 17, 18]),
        ("Podlove", 2, vec![16, 18, 20]),
        ("Auphonic", 2, vec![19, 20, 21]),
        ("Wetter", 3, vec![22]),
        ("Kaffee", 3, vec![23, 24]),
        ("Intro", 3, vec![1, 2, 3]),
        ("Sendung", 3, (1..=EPISODE_COUNT).collect()),
    ]
}

/// Taxonomy with one collision: "iPad" is claimed by `apple` and `audio`.
pub fn fixture_taxonomy() -> Value {
    json!({
        "createdAt": "2025-01-02T10:00:00Z",
        "method": "hdbscan-v2",
        "clusters": [
            {"id": "apple", "name": "Apple", "description": "Apple hardware and software",
             "isOutlier": false, "sampleTopics": ["iPhone", "iPad", "macOS", "Apple Watch"]},
            {"id": "web", "name": "Web", "isOutlier": false,
             "sampleTopics": ["Browser", "JavaScript", "HTTP/2"]},
            {"id": "audio", "name": "Podcasting", "isOutlier": false,
             "sampleTopics": ["Mikrofone", "Podlove", "Auphonic", "iPad"]},
            {"id": "misc", "name": "Sonstiges", "isOutlier": true, "sampleTopics": ["Wetter"]}
        ]
    })
}

pub fn fixture_variants() -> Value {
    json!({
        "variants": {
            "auto-v2.1": {
                "version": "2.1",
                "name": "Auto V2.1",
                "settings": {"nNeighbors": 5, "nEpochs": 60, "seed": 7}
            },
            "experimental": {
                "version": "0.1",
                "name": "Experimental",
                "settings": {"nNeighbors": 4, "minDist": 0.3, "nEpochs": 40}
            }
        }
    })
}

/// Speakers of episode `n`.
pub fn fixture_speakers(n: EpisodeId) -> Vec<&'static str> {
    let mut speakers = vec![if n == EPISODE_COUNT {
        "tim pritlove"
    } else {
        "Tim Pritlove"
    }];
    if n % 2 == 0 {
        speakers.push("Clemens Schrimpf");
    }
    if n % 3 == 0 {
        speakers.push("roddi");
    }
    if n >= 20 {
        speakers.push("Letty");
    }
    speakers
}

/// Release year of episode `n`: six episodes per year from 2015.
pub fn fixture_year(n: EpisodeId) -> i32 {
    2015 + ((n - 1) / 6) as i32
}

fn embedding(group: usize, rng: &mut StdRng) -> Vec<f32> {
    (0..EMBEDDING_DIM)
        .map(|d| {
            let base = if d / 4 == group { 1.0 } else { 0.0 };
            base + rng.random_range(-0.05..0.05)
        })
        .collect()
}

/// Shared test harness for E2E tests.
pub struct TestHarness {
    /// Keeps temp dir alive for the lifetime of the harness
    pub _temp_dir: tempfile::TempDir,
    pub root: PathBuf,
    pub settings: Settings,
}

impl TestHarness {
    /// Harness with every input file and an existing public directory.
    pub fn new() -> Self {
        let temp_dir = tempfile::TempDir::new().expect("Failed to create temp dir");
        let root = temp_dir.path().to_path_buf();

        let mut rng = StdRng::seed_from_u64(2024);
        let topics: Vec<Value> = fixture_topics()
            .into_iter()
            .map(|(label, group, episodes)| {
                json!({
                    "topic": label,
                    "keywords": [label.to_lowercase()],
                    "count": episodes.len(),
                    "episodes": episodes,
                    "embedding": embedding(group, &mut rng),
                })
            })
            .collect();
        write_json(
            &root.join("db/topic-embeddings.json"),
            &json!({
                "embeddingModel": "test-embedding",
                "createdAt": "2025-01-01T00:00:00Z",
                "embeddingDimensions": EMBEDDING_DIM,
                "totalTopicsRaw": topics.len(),
                "topics": topics,
            }),
        );
        write_json(&root.join("topic-taxonomy.json"), &fixture_taxonomy());
        write_json(&root.join("variants.json"), &fixture_variants());

        for n in 1..=EPISODE_COUNT {
            let mut episode = json!({
                "number": n,
                "title": format!("FS{n:03}"),
                "speakers": fixture_speakers(n),
            });
            if n != UNDATED_EPISODE {
                let month = (n - 1) % 6 + 1;
                episode["date"] = json!(format!("{}-{month:02}-10", fixture_year(n)));
            }
            write_json(
                &root.join(format!("podcasts/freakshow/episodes/{n}.json")),
                &episode,
            );
        }

        fs::create_dir_all(root.join("frontend/public")).expect("Failed to create public dir");

        let settings = Settings {
            data_dir: root.to_string_lossy().to_string(),
            ..Default::default()
        };

        Self {
            _temp_dir: temp_dir,
            root,
            settings,
        }
    }

    /// Harness whose public directory does not exist.
    pub fn without_public_dir() -> Self {
        let harness = Self::new();
        fs::remove_dir_all(harness.root.join("frontend/public"))
            .expect("Failed to remove public dir");
        harness
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.root.join(relative)
    }

    /// Run the generator for `variant`.
    pub fn run(&self, variant: &str, steps: &[Step]) -> RunReport {
        self.try_run(variant, steps).expect("Generation run failed")
    }

    pub fn try_run(
        &self,
        variant: &str,
        steps: &[Step],
    ) -> Result<RunReport, atlas_pipeline::PipelineError> {
        let settings = Settings {
            variant: variant.to_string(),
            ..self.settings.clone()
        };
        Generator::new(settings).run(steps)
    }

    /// Canonical location of a variant artifact.
    pub fn canonical(&self, variant: &str, file: &str) -> PathBuf {
        self.path("db").join(TOPICS_DIR).join(variant).join(file)
    }

    /// Client-servable location of a variant artifact.
    pub fn public(&self, variant: &str, file: &str) -> PathBuf {
        self.path("frontend/public")
            .join(TOPICS_DIR)
            .join(variant)
            .join(file)
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.path("db").join(TOPICS_DIR).join(MANIFEST_FILE)
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

pub fn write_json(path: &Path, value: &Value) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("Failed to create parent dir");
    }
    let bytes = serde_json::to_vec_pretty(value).expect("Failed to serialize fixture");
    fs::write(path, bytes).expect("Failed to write fixture");
}

pub fn read_json<T: DeserializeOwned>(path: &Path) -> T {
    let bytes = fs::read(path).expect("Failed to read artifact");
    serde_json::from_slice(&bytes).expect("Failed to decode artifact")
}
