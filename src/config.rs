use crate::errors::SubmissionError;
use anyhow::{Context, Result};
use chrono::Datelike;
use serde::Deserialize;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Run-wide lab configuration, loaded once per invocation and read-only for
/// the rest of the run.
///
/// Every output field that encodes site policy (submitter identity, lab
/// names and addresses, platform, assembly method, authors) comes from here
/// verbatim, so the same transform serves any submitting site. Fields with
/// serde defaults are biology constants or portal conventions that rarely
/// change between sites; a config file only needs to override them when they
/// do.
#[derive(Debug, Clone, Deserialize)]
pub struct LabConfig {
    /// GISAID submitter account name.
    pub submitter: String,

    /// Virus name prefix used in FASTA headers, e.g. `hCoV-19`.
    #[serde(default = "default_virus")]
    pub virus: String,

    #[serde(default = "default_virus_type")]
    pub virus_type: String,

    pub continent: String,
    pub country: String,
    pub province: String,

    /// Short region code prefixed onto sample ids in FASTA headers,
    /// e.g. `ON` for `ON-sampleA`.
    pub region_code: String,

    /// Collection year used in FASTA headers. Defaults to the current year.
    #[serde(default = "default_year")]
    pub year: String,

    #[serde(default = "default_unknown")]
    pub passage: String,

    #[serde(default = "default_host")]
    pub host: String,

    /// Sequencing platform, e.g. `Oxford Nanopore GridION`.
    pub platform: String,

    /// Assembly pipeline and version, e.g. `ARTIC-nanopolish 1.1.2`.
    pub assembly_method: String,

    pub originating_lab: String,
    pub originating_lab_address: String,
    pub submitting_lab: String,
    pub submitting_lab_address: String,

    /// Comma-separated author list, reproduced verbatim in the metadata.
    pub authors: String,

    #[serde(default)]
    pub study_id: String,

    #[serde(default = "default_organism")]
    pub organism: String,

    #[serde(default = "default_host_scientific_name")]
    pub host_scientific_name: String,

    #[serde(default = "default_host_disease")]
    pub host_disease: String,

    #[serde(default = "default_purpose_of_sampling")]
    pub purpose_of_sampling: String,

    #[serde(default = "default_specimen_type")]
    pub specimen_type: String,

    #[serde(default)]
    pub consensus_software: String,

    #[serde(default)]
    pub consensus_software_version: String,

    #[serde(default = "default_reference_accession")]
    pub reference_accession: String,

    #[serde(default)]
    pub bioinformatics_protocol: String,
}

impl LabConfig {
    /// Loads a configuration document from a JSON file.
    pub fn from_path(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(SubmissionError::InputNotFound {
                path: path.to_path_buf(),
            }
            .into());
        }

        let file = File::open(path)
            .with_context(|| format!("could not open config {}", path.display()))?;
        let config = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("could not parse config {}", path.display()))?;

        Ok(config)
    }

    /// The GISAID `Location` field: `continent / country / province`.
    pub fn location(&self) -> String {
        format!("{} / {} / {}", self.continent, self.country, self.province)
    }
}

fn default_virus() -> String {
    String::from("hCoV-19")
}

fn default_virus_type() -> String {
    String::from("betacoronavirus")
}

fn default_year() -> String {
    chrono::Local::now().year().to_string()
}

fn default_unknown() -> String {
    String::from("unknown")
}

fn default_host() -> String {
    String::from("Human")
}

fn default_organism() -> String {
    String::from("Severe acute respiratory syndrome coronavirus 2")
}

fn default_host_scientific_name() -> String {
    String::from("Homo sapiens")
}

fn default_host_disease() -> String {
    String::from("COVID-19")
}

fn default_purpose_of_sampling() -> String {
    String::from("Diagnostic testing")
}

fn default_specimen_type() -> String {
    String::from("Nucleic acid")
}

fn default_reference_accession() -> String {
    String::from("MN908947.3")
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL_CONFIG: &str = r#"{
        "submitter": "jdoe",
        "continent": "North America",
        "country": "Canada",
        "province": "Ontario",
        "region_code": "ON",
        "platform": "Oxford Nanopore",
        "assembly_method": "ARTIC-nanopolish 1.1.2",
        "originating_lab": "Unity Health Toronto",
        "originating_lab_address": "30 Bond Street, Toronto, ON, M5B 1W8",
        "submitting_lab": "Ontario Institute for Cancer Research",
        "submitting_lab_address": "661 University Avenue, Toronto, ON, M5G 1M1",
        "authors": "A. Author,B. Author"
    }"#;

    #[test]
    fn defaults_fill_omitted_fields() {
        let config: LabConfig = serde_json::from_str(MINIMAL_CONFIG).unwrap();
        assert_eq!(config.virus, "hCoV-19");
        assert_eq!(config.virus_type, "betacoronavirus");
        assert_eq!(config.host, "Human");
        assert_eq!(config.reference_accession, "MN908947.3");
        assert_eq!(config.study_id, "");
    }

    #[test]
    fn location_joins_geography() {
        let config: LabConfig = serde_json::from_str(MINIMAL_CONFIG).unwrap();
        assert_eq!(config.location(), "North America / Canada / Ontario");
    }

    #[test]
    fn missing_config_is_input_not_found() {
        let err = LabConfig::from_path(Path::new("does/not/exist.json")).unwrap_err();
        assert!(err.to_string().contains("input not found"));
    }
}
