//! Intake session and profile generation.
//!
//! A [`Session`] holds everything one intake run collects: the raw form
//! payload, the uploads per category, and the profile once one has been
//! generated. [`generate_profile`] is the single path from a filled session
//! to a persisted [`Profile`].

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;

use herd_intake_core::form::{
    FormData, FARMER_NAME, HERD_VALUE, LIVESTOCK_COUNT, SELECTED_MODULES, SPECIES, USE_CASE,
};
use herd_intake_core::insights::aggregate_insights;
use herd_intake_core::models::{
    Category, DocumentSet, InsightsSummary, Livestock, Profile, ProfilePayload,
};
use herd_intake_core::scoring::{Assessment, RandomScorer, Scorer};
use herd_intake_core::store::{KvBackend, ProfileStore, StoreError};

use crate::config::Config;
use crate::db;
use crate::ingest::{Pipeline, UploadedFile};

#[derive(Debug, Default)]
pub struct Session {
    pub form: FormData,
    pub uploads: BTreeMap<Category, Vec<UploadedFile>>,
    pub profile: Option<Profile>,
}

impl Session {
    pub fn new(form: FormData) -> Self {
        Self {
            form,
            ..Self::default()
        }
    }

    pub fn add_upload(&mut self, category: Category, file: UploadedFile) {
        self.uploads.entry(category).or_default().push(file);
    }

    pub fn uploads_for(&self, category: Category) -> &[UploadedFile] {
        self.uploads
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// Runs every category through the pipeline in the fixed order id, bank, herd, health.
///
/// Every category gets an entry, even when nothing was uploaded for it.
pub async fn ingest_session(session: &Session, pipeline: &Pipeline) -> DocumentSet {
    let mut documents = DocumentSet::new();
    for category in Category::ALL {
        let results = pipeline
            .ingest(session.uploads_for(category), category)
            .await;
        documents.insert(category, results);
    }
    documents
}

/// Assembles the profile payload from the form, the ingested documents and the assessment.
pub fn build_payload(
    form: &FormData,
    documents: DocumentSet,
    insights: InsightsSummary,
    assessment: Assessment,
) -> ProfilePayload {
    let count = form
        .number(LIVESTOCK_COUNT)
        .map(|n| n.max(0.0).round() as u64)
        .unwrap_or(0);

    ProfilePayload {
        farmer_name: form.text(FARMER_NAME).unwrap_or_default(),
        livestock: Livestock {
            species: form.text(SPECIES).unwrap_or_default(),
            count,
            value: form.number(HERD_VALUE).unwrap_or(0.0),
        },
        data_points: form.filled_fields() + insights.extracted_fields,
        modules: form.list(SELECTED_MODULES),
        risk_rating: assessment.risk_rating,
        valuation: assessment.valuation,
        confidence: assessment.confidence,
        use_case: form.text(USE_CASE).unwrap_or_default(),
        documents,
        insights,
        form_data: form.clone(),
    }
}

/// Ingests the session's uploads, scores the result, and persists a new profile.
///
/// The profile is also stored on the session. When the backend write fails
/// the error is returned, but the session still carries the in-memory profile.
pub async fn generate_profile<B: KvBackend>(
    session: &mut Session,
    pipeline: &Pipeline,
    scorer: &mut dyn Scorer,
    store: &mut ProfileStore<B>,
) -> Result<Profile, StoreError> {
    let documents = ingest_session(session, pipeline).await;
    let insights = aggregate_insights(&documents);
    let assessment = scorer.assess(&session.form, &insights);
    let payload = build_payload(&session.form, documents, insights, assessment);

    match store.create(payload).await {
        Ok(profile) => {
            session.profile = Some(profile.clone());
            Ok(profile)
        }
        Err(e) => {
            if let StoreError::PersistenceFailed { id, .. } = &e {
                session.profile = store.get(id).cloned();
            }
            Err(e)
        }
    }
}

/// Reads a form payload: a JSON object of field name to value.
pub fn load_form(path: &Path) -> Result<FormData> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read form file: {}", path.display()))?;
    let form: FormData = serde_json::from_str(&content)
        .with_context(|| format!("Form file is not a JSON object: {}", path.display()))?;
    Ok(form)
}

/// CLI entry point for `intake create`.
pub async fn run_create(
    config: &Config,
    form_path: &Path,
    uploads: &[(Category, PathBuf)],
    seed: Option<u64>,
) -> Result<()> {
    let mut session = Session::new(load_form(form_path)?);
    for (category, path) in uploads {
        session.add_upload(*category, UploadedFile::from_path(path, *category));
    }

    let pipeline = Pipeline::from_config(&config.ingest);
    let mut scorer = match seed.or(config.scoring.seed) {
        Some(seed) => RandomScorer::seeded(seed),
        None => RandomScorer::new(),
    };
    let mut store = db::open_store(config).await?;

    let profile = generate_profile(&mut session, &pipeline, &mut scorer, &mut store).await?;
    info!(id = %profile.id, "intake complete");

    println!("{}", profile.id);
    println!(
        "  farmer: {}  livestock: {} x {}",
        profile.farmer_name, profile.livestock.count, profile.livestock.species
    );
    println!(
        "  risk: {}  valuation: {:.0}  confidence: {:.2}",
        profile.risk_rating, profile.valuation, profile.confidence
    );
    println!(
        "  documents: {} ({} parsed)  data points: {}",
        profile.insights.total_files,
        profile
            .insights
            .categories
            .values()
            .map(|s| s.parsed_successfully)
            .sum::<usize>(),
        profile.data_points
    );
    Ok(())
}
