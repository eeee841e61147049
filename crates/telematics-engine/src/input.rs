//! Telemetry and demographic input files
//!
//! A telemetry file is either a JSON array of records for one subject or an
//! object mapping subject ids to record arrays. A demographics file maps
//! subject ids to profiles.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use telematics_common::{DemographicProfile, TelemetryRecord};
use telematics_pricing::InMemoryDemographics;
use telematics_scoring::InMemoryTelemetrySource;
use tracing::debug;

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum TelemetryFile {
    Single(Vec<TelemetryRecord>),
    BySubject(BTreeMap<String, Vec<TelemetryRecord>>),
}

impl TelemetryFile {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("telemetry file is neither a record array nor a subject map")
    }

    /// Load every subject into `source`; a bare array is filed under `default_subject`
    pub fn load_into(self, source: &InMemoryTelemetrySource, default_subject: &str) -> usize {
        match self {
            TelemetryFile::Single(records) => {
                let count = records.len();
                source.insert(default_subject, records);
                count
            }
            TelemetryFile::BySubject(subjects) => subjects
                .into_iter()
                .map(|(subject, records)| {
                    let count = records.len();
                    source.insert(subject, records);
                    count
                })
                .sum(),
        }
    }
}

pub fn read_telemetry(
    path: &Path,
    source: &InMemoryTelemetrySource,
    default_subject: &str,
) -> Result<usize> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read telemetry file {}", path.display()))?;
    let count = TelemetryFile::from_json(&json)?.load_into(source, default_subject);
    debug!(path = %path.display(), records = count, "Loaded telemetry");
    Ok(count)
}

pub fn read_demographics(path: &Path, directory: &InMemoryDemographics) -> Result<usize> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read demographics file {}", path.display()))?;
    let profiles: BTreeMap<String, DemographicProfile> =
        serde_json::from_str(&json).context("demographics file must map subject ids to profiles")?;

    let count = profiles.len();
    for (subject, profile) in profiles {
        directory.insert(subject, profile);
    }
    Ok(count)
}
