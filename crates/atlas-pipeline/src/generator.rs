//! Generation runs: load inputs, derive artifacts, publish the manifest.

use std::fmt;
use std::time::{Duration, Instant};

use chrono::Utc;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{info, instrument};

use atlas_types::{
    EpisodeMetadata, Manifest, Settings, Taxonomy, TopicWithEmbedding, CLUSTER_COOCCURRENCE_FILE,
    CLUSTER_TIMELINE_FILE, PROJECTION_FILE, SPEAKER_COOCCURRENCE_FILE, SPEAKER_TIMELINE_FILE,
};

use crate::cooccurrence::build_cooccurrence;
use crate::entities::{cluster_entities, speaker_entities};
use crate::error::PipelineError;
use crate::filter::{filter_boilerplate_topics, FilterReport};
use crate::inputs::{load_embeddings, load_episodes, load_taxonomy};
use crate::projection::{annotate_points, build_projection_artifact, project};
use crate::taxonomy_index::{build_topic_cluster_index, TopicClusterIndex};
use crate::timeline::{build_timeline, episode_years};
use crate::variants::{load_manifest, publish_manifest, resolve_variant, ResolvedVariant};
use crate::writer::{ArtifactWriter, WriteReport};

/// Directory under both roots that holds the manifest and variant folders.
pub const TOPICS_DIR: &str = "topics";

/// One unit of work in a generation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Step {
    ClusterCooccurrence,
    SpeakerCooccurrence,
    Projection,
    Timelines,
}

impl Step {
    pub const ALL: [Step; 4] = [
        Step::ClusterCooccurrence,
        Step::SpeakerCooccurrence,
        Step::Projection,
        Step::Timelines,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Step::ClusterCooccurrence => "cluster-cooccurrence",
            Step::SpeakerCooccurrence => "speaker-cooccurrence",
            Step::Projection => "projection",
            Step::Timelines => "timelines",
        }
    }

    fn needs_taxonomy(&self) -> bool {
        !matches!(self, Step::SpeakerCooccurrence)
    }

    fn needs_episodes(&self) -> bool {
        matches!(self, Step::SpeakerCooccurrence | Step::Timelines)
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one step.
#[derive(Debug, Clone)]
pub struct StepReport {
    pub step: Step,
    /// Entities or points produced
    pub items: usize,
    pub elapsed: Duration,
}

/// Outcome of a generation run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub variant: String,
    pub steps: Vec<StepReport>,
    pub files: Vec<WriteReport>,
    pub filter: Option<FilterReport>,
    pub manifest: Manifest,
    pub elapsed: Duration,
}

impl RunReport {
    pub fn file_names(&self) -> Vec<&str> {
        self.files.iter().map(|f| f.name.as_str()).collect()
    }
}

/// Inputs loaded once per run.
struct Inputs {
    taxonomy: Taxonomy,
    index: TopicClusterIndex,
    topics: Vec<TopicWithEmbedding>,
    episodes: Vec<EpisodeMetadata>,
}

/// Runs the offline derivation pipeline for one variant.
pub struct Generator {
    settings: Settings,
    seed_override: Option<u64>,
}

impl Generator {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            seed_override: None,
        }
    }

    /// Seed that takes precedence over configured and variant seeds.
    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed_override = seed;
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Run `steps` (deduplicated, in declaration order), then publish the
    /// manifest. Any error aborts the run.
    #[instrument(skip(self, steps), fields(variant = %self.settings.variant))]
    pub fn run(&self, steps: &[Step]) -> Result<RunReport, PipelineError> {
        let started = Instant::now();
        let mut steps = steps.to_vec();
        steps.sort();
        steps.dedup();

        let mut variant = resolve_variant(
            &self.settings.variants_file(),
            &self.settings.variant,
            &self.settings.projection,
        )?;
        if let Some(seed) = self.seed_override {
            variant.projection.seed = Some(seed);
        }

        let topics_writer =
            ArtifactWriter::new(self.settings.output_root(), Some(self.settings.public_root()))
                .scoped(TOPICS_DIR);

        // Everything that can reject the run is read before the first write.
        let inputs = self.load_inputs(&steps)?;
        let existing_manifest = load_manifest(&topics_writer)?;
        let variant_writer = topics_writer.scoped(&variant.name);

        let mut files = Vec::new();
        let mut reports = Vec::new();
        let mut filter = None;

        for step in &steps {
            let step_started = Instant::now();
            let items = match step {
                Step::ClusterCooccurrence => {
                    self.cluster_cooccurrence(&inputs, &variant_writer, &mut files)?
                }
                Step::SpeakerCooccurrence => {
                    self.speaker_cooccurrence(&inputs, &variant_writer, &mut files)?
                }
                Step::Projection => {
                    let (items, report) =
                        self.projection(&inputs, &variant, &variant_writer, &mut files)?;
                    filter = Some(report);
                    items
                }
                Step::Timelines => self.timelines(&inputs, &variant_writer, &mut files)?,
            };
            let elapsed = step_started.elapsed();
            info!(
                step = %step,
                items,
                elapsed_ms = elapsed.as_millis() as u64,
                "Step complete"
            );
            reports.push(StepReport {
                step: *step,
                items,
                elapsed,
            });
        }

        let (manifest, manifest_report) =
            publish_manifest(&topics_writer, existing_manifest, &variant, Utc::now())?;
        files.push(manifest_report);

        let elapsed = started.elapsed();
        info!(
            variant = %variant.name,
            files = files.len(),
            elapsed_ms = elapsed.as_millis() as u64,
            "Generation run complete"
        );

        Ok(RunReport {
            variant: variant.name,
            steps: reports,
            files,
            filter,
            manifest,
            elapsed,
        })
    }

    fn load_inputs(&self, steps: &[Step]) -> Result<Inputs, PipelineError> {
        let (taxonomy, topics) = if steps.iter().any(Step::needs_taxonomy) {
            let taxonomy = load_taxonomy(&self.settings.taxonomy_file())?;
            let db = load_embeddings(&self.settings.embeddings_file())?;
            (taxonomy, db.topics)
        } else {
            (Taxonomy::default(), Vec::new())
        };

        let episodes = if steps.iter().any(Step::needs_episodes) {
            load_episodes(&self.settings.episodes_directory())?
        } else {
            Vec::new()
        };

        let index = build_topic_cluster_index(&taxonomy);
        Ok(Inputs {
            taxonomy,
            index,
            topics,
            episodes,
        })
    }

    fn cluster_cooccurrence(
        &self,
        inputs: &Inputs,
        writer: &ArtifactWriter,
        files: &mut Vec<WriteReport>,
    ) -> Result<usize, PipelineError> {
        let entities = cluster_entities(&inputs.taxonomy, &inputs.topics, &inputs.index);
        let matrix = build_cooccurrence(&entities, self.settings.cooccurrence.cluster_top_k)?;
        let items = matrix.statistics.total_entities;
        let artifact =
            matrix.into_artifact("Topic clusters that appear together in the same episodes");
        files.push(writer.write_artifact(CLUSTER_COOCCURRENCE_FILE, &artifact)?);
        Ok(items)
    }

    fn speaker_cooccurrence(
        &self,
        inputs: &Inputs,
        writer: &ArtifactWriter,
        files: &mut Vec<WriteReport>,
    ) -> Result<usize, PipelineError> {
        let entities = speaker_entities(&inputs.episodes);
        let matrix = build_cooccurrence(&entities, self.settings.cooccurrence.speaker_top_k)?;
        let items = matrix.statistics.total_entities;
        let artifact = matrix.into_artifact("Speakers that appear together in the same episodes");
        files.push(writer.write_artifact(SPEAKER_COOCCURRENCE_FILE, &artifact)?);
        Ok(items)
    }

    fn projection(
        &self,
        inputs: &Inputs,
        variant: &ResolvedVariant,
        writer: &ArtifactWriter,
        files: &mut Vec<WriteReport>,
    ) -> Result<(usize, FilterReport), PipelineError> {
        let (topics, report) =
            filter_boilerplate_topics(inputs.topics.clone(), &self.settings.filter);
        let embeddings: Vec<Vec<f32>> = topics.iter().map(|t| t.embedding.clone()).collect();

        let mut rng = match variant.projection.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let coords = project(&embeddings, &variant.projection, &mut rng)?;

        let points = annotate_points(&topics, &coords, &inputs.index);
        let items = points.len();
        let artifact =
            build_projection_artifact(points, &variant.projection, inputs.taxonomy.clusters.len());
        files.push(writer.write_artifact(PROJECTION_FILE, &artifact)?);
        Ok((items, report))
    }

    fn timelines(
        &self,
        inputs: &Inputs,
        writer: &ArtifactWriter,
        files: &mut Vec<WriteReport>,
    ) -> Result<usize, PipelineError> {
        let years = episode_years(&inputs.episodes);

        let clusters = cluster_entities(&inputs.taxonomy, &inputs.topics, &inputs.index);
        let cluster_timeline = build_timeline(&clusters, &years);
        let mut items = cluster_timeline.entities.len();
        files.push(writer.write_artifact(
            CLUSTER_TIMELINE_FILE,
            &cluster_timeline.into_artifact("Episodes per year for each topic cluster"),
        )?);

        let speakers = speaker_entities(&inputs.episodes);
        let speaker_timeline = build_timeline(&speakers, &years);
        items += speaker_timeline.entities.len();
        files.push(writer.write_artifact(
            SPEAKER_TIMELINE_FILE,
            &speaker_timeline.into_artifact("Episodes per year for each speaker"),
        )?);

        Ok(items)
    }
}
