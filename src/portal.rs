use crate::config::LabConfig;
use crate::metadata::{SubmissionRecord, UNKNOWN};
use anyhow::{ensure, Result};

/// One column of a portal schema: the machine field code and the
/// human-readable name shown in the portal's spreadsheet template.
pub struct Column {
    pub code: &'static str,
    pub name: &'static str,
}

const fn col(code: &'static str, name: &'static str) -> Column {
    Column { code, name }
}

/// A portal's metadata-file contract: the ordered column list, the field
/// delimiter, and whether a second human-readable header row is emitted
/// after the field-code row.
///
/// The column order is consumed by spreadsheet-import tooling positionally,
/// so it must be reproduced exactly.
pub struct PortalSchema {
    pub portal: &'static str,
    pub delimiter: u8,
    pub name_row: bool,
    pub columns: &'static [Column],
}

impl PortalSchema {
    /// The machine column-header row (portal field codes).
    pub fn header_row(&self) -> Result<String> {
        self.join(self.columns.iter().map(|c| c.code))
    }

    /// The human-readable column-name row, where the portal uses one.
    pub fn header_name_row(&self) -> Result<String> {
        self.join(self.columns.iter().map(|c| c.name))
    }

    /// Serializes one metadata row. The value count must equal the schema
    /// width; every value must already be rendered (the joiner substitutes
    /// sentinels for missing data, so there are no nulls at this point).
    pub fn format_row(&self, values: &[String]) -> Result<String> {
        ensure!(
            values.len() == self.columns.len(),
            "{} row has {} fields, schema defines {}",
            self.portal,
            values.len(),
            self.columns.len()
        );
        self.join(values.iter().map(String::as_str))
    }

    // Field values containing the delimiter (or quotes, or newlines) are
    // quoted per standard delimited-text escaping.
    fn join<'a>(&self, fields: impl Iterator<Item = &'a str>) -> Result<String> {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(self.delimiter)
            .quote_style(csv::QuoteStyle::Necessary)
            .from_writer(Vec::new());
        writer.write_record(fields)?;

        let bytes = writer.into_inner().map_err(|e| e.into_error())?;
        let mut line = String::from_utf8(bytes)?;
        line.truncate(line.trim_end_matches(['\r', '\n']).len());
        Ok(line)
    }
}

/// Target submission portal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Portal {
    Gisaid,
    Virusseq,
}

impl Portal {
    pub fn schema(&self) -> &'static PortalSchema {
        match self {
            Portal::Gisaid => &GISAID,
            Portal::Virusseq => &VIRUSSEQ,
        }
    }

    /// Maps a normalized submission record onto the portal's column order.
    pub fn row(&self, record: &SubmissionRecord, config: &LabConfig) -> Vec<String> {
        match self {
            Portal::Gisaid => gisaid_row(record, config),
            Portal::Virusseq => virusseq_row(record, config),
        }
    }
}

/// GISAID bulk-upload schema: 28 columns, tab delimited, with a second
/// human-readable header row. The `covv_speciment` code spelling is part of
/// the upstream template and is reproduced verbatim.
pub static GISAID: PortalSchema = PortalSchema {
    portal: "GISAID",
    delimiter: b'\t',
    name_row: true,
    columns: &[
        col("submitter", "Submitter"),
        col("fn", "FASTA filename"),
        col("covv_virus_name", "Virus name"),
        col("covv_type", "Type"),
        col("covv_passage", "Passage details/history"),
        col("covv_collection_date", "Collection date"),
        col("covv_location", "Location"),
        col("covv_add_location", "Additional location information"),
        col("covv_host", "Host"),
        col("covv_add_host_info", "Additional host information"),
        col("covv_gender", "Gender"),
        col("covv_patient_age", "Patient age"),
        col("covv_patient_status", "Patient status"),
        col("covv_speciment", "Specimen source"),
        col("covv_outbreak", "Outbreak"),
        col("covv_last_vaccinated", "Last vaccinated"),
        col("covv_treatment", "Treatment"),
        col("covv_seq_technology", "Sequencing technology"),
        col("covv_assembly_method", "Assembly method"),
        col("covv_coverage", "Coverage"),
        col("covv_orig_lab", "Originating lab"),
        col("covv_orig_lab_addr", "Address"),
        col("covv_provider_sample_id", "Sample ID given by the sample provider"),
        col("covv_subm_lab", "Submitting lab"),
        col("covv_subm_lab_addr", "Address"),
        col("covv_subm_sample_id", "Sample ID given by the submitting laboratory"),
        col("covv_authors", "Authors"),
        col("covv_comment", "Comment"),
    ],
};

/// VirusSeq data-portal schema: 40 columns, tab delimited, single header
/// row of field names.
pub static VIRUSSEQ: PortalSchema = PortalSchema {
    portal: "VirusSeq",
    delimiter: b'\t',
    name_row: false,
    columns: &[
        col("specimen collector sample ID", "specimen collector sample ID"),
        col("sample collected by", "sample collected by"),
        col("sequence submitted by", "sequence submitted by"),
        col("sample collection date", "sample collection date"),
        col("sample collection date precision", "sample collection date precision"),
        col("geo_loc_name (country)", "geo_loc_name (country)"),
        col("geo_loc_name (state/province/territory)", "geo_loc_name (state/province/territory)"),
        col("geo_loc_name (city)", "geo_loc_name (city)"),
        col("organism", "organism"),
        col("isolate", "isolate"),
        col("purpose of sampling", "purpose of sampling"),
        col("purpose of sampling details", "purpose of sampling details"),
        col("NML submitted specimen type", "NML submitted specimen type"),
        col("collection device", "collection device"),
        col("collection method", "collection method"),
        col("host (scientific name)", "host (scientific name)"),
        col("host disease", "host disease"),
        col("host age", "host age"),
        col("host age unit", "host age unit"),
        col("host age bin", "host age bin"),
        col("host gender", "host gender"),
        col("purpose of sequencing", "purpose of sequencing"),
        col("purpose of sequencing details", "purpose of sequencing details"),
        col("sequencing date", "sequencing date"),
        col("library ID", "library ID"),
        col("sequencing instrument", "sequencing instrument"),
        col("sequencing protocol name", "sequencing protocol name"),
        col("raw sequence data processing method", "raw sequence data processing method"),
        col("dehosting method", "dehosting method"),
        col("consensus sequence software name", "consensus sequence software name"),
        col("consensus sequence software version", "consensus sequence software version"),
        col("breadth of coverage value", "breadth of coverage value"),
        col("depth of coverage value", "depth of coverage value"),
        col("consensus genome length", "consensus genome length"),
        col("Ns per 100 kbp", "Ns per 100 kbp"),
        col("reference genome accession", "reference genome accession"),
        col("bioinformatics protocol", "bioinformatics protocol"),
        col("lineage/clade name", "lineage/clade name"),
        col("lineage/clade analysis software name", "lineage/clade analysis software name"),
        col("study_id", "study_id"),
    ],
};

fn or_unknown(value: &Option<String>) -> String {
    value.clone().unwrap_or_else(|| UNKNOWN.to_string())
}

fn gisaid_row(record: &SubmissionRecord, config: &LabConfig) -> Vec<String> {
    vec![
        config.submitter.clone(),
        record.consensus_filename(),
        record.virus_name().to_string(),
        config.virus_type.clone(),
        config.passage.clone(),
        or_unknown(&record.collection_date),
        config.location(),
        String::new(),
        config.host.clone(),
        String::new(),
        UNKNOWN.to_string(),
        UNKNOWN.to_string(),
        UNKNOWN.to_string(),
        String::new(),
        String::new(),
        String::new(),
        String::new(),
        config.platform.clone(),
        config.assembly_method.clone(),
        or_unknown(&record.mean_depth),
        config.originating_lab.clone(),
        config.originating_lab_address.clone(),
        record.sample_id.clone(),
        config.submitting_lab.clone(),
        config.submitting_lab_address.clone(),
        record.sample_id.clone(),
        config.authors.clone(),
        String::new(),
    ]
}

fn virusseq_row(record: &SubmissionRecord, config: &LabConfig) -> Vec<String> {
    vec![
        record.sample_id.clone(),
        config.originating_lab.clone(),
        config.submitting_lab.clone(),
        or_unknown(&record.collection_date),
        date_precision(&record.collection_date),
        config.country.clone(),
        config.province.clone(),
        String::new(),
        config.organism.clone(),
        record.virus_name().to_string(),
        config.purpose_of_sampling.clone(),
        String::new(),
        config.specimen_type.clone(),
        String::new(),
        String::new(),
        config.host_scientific_name.clone(),
        config.host_disease.clone(),
        UNKNOWN.to_string(),
        String::new(),
        String::new(),
        UNKNOWN.to_string(),
        String::new(),
        String::new(),
        String::new(),
        String::new(),
        config.platform.clone(),
        String::new(),
        String::new(),
        String::new(),
        config.consensus_software.clone(),
        config.consensus_software_version.clone(),
        String::new(),
        or_unknown(&record.mean_depth),
        String::new(),
        String::new(),
        config.reference_accession.clone(),
        config.bioinformatics_protocol.clone(),
        String::new(),
        String::new(),
        config.study_id.clone(),
    ]
}

/// Collection-date precision for VirusSeq, derived from the date shape:
/// `2020` is year precision, `2020-04` month, `2020-04-15` day. Unknown
/// dates have no precision.
fn date_precision(date: &Option<String>) -> String {
    let Some(date) = date else {
        return String::new();
    };
    match date.split('-').count() {
        1 => String::from("year"),
        2 => String::from("month"),
        _ => String::from("day"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn test_config() -> LabConfig {
        serde_json::from_str(
            r#"{
                "submitter": "jdoe",
                "continent": "North America",
                "country": "Canada",
                "province": "Ontario",
                "region_code": "ON",
                "year": "2020",
                "platform": "Oxford Nanopore",
                "assembly_method": "ARTIC-nanopolish 1.1.2",
                "originating_lab": "Unity Health Toronto",
                "originating_lab_address": "30 Bond Street, Toronto, ON, M5B 1W8",
                "submitting_lab": "Ontario Institute for Cancer Research",
                "submitting_lab_address": "661 University Avenue, Toronto, ON, M5G 1M1",
                "authors": "A. Author,B. Author",
                "study_id": "UHTC-ON"
            }"#,
        )
        .unwrap()
    }

    fn test_record() -> SubmissionRecord {
        SubmissionRecord {
            sample_id: "sampleA".to_string(),
            consensus_path: PathBuf::from("data/sampleA.consensus.fasta"),
            fasta_header: ">hCoV-19/Canada/ON-sampleA/2020".to_string(),
            collection_date: None,
            mean_depth: None,
            ct: None,
        }
    }

    #[test]
    fn gisaid_row_matches_schema_width() {
        let row = Portal::Gisaid.row(&test_record(), &test_config());
        assert_eq!(row.len(), 28);
        assert_eq!(row.len(), GISAID.columns.len());
    }

    #[test]
    fn virusseq_row_matches_schema_width() {
        let row = Portal::Virusseq.row(&test_record(), &test_config());
        assert_eq!(row.len(), 40);
        assert_eq!(row.len(), VIRUSSEQ.columns.len());
    }

    #[test]
    fn missing_qc_fields_render_as_unknown() {
        let row = Portal::Gisaid.row(&test_record(), &test_config());
        // covv_collection_date and covv_coverage
        assert_eq!(row[5], UNKNOWN);
        assert_eq!(row[19], UNKNOWN);
    }

    #[test]
    fn gisaid_header_rows_are_aligned() {
        let codes = GISAID.header_row().unwrap();
        let names = GISAID.header_name_row().unwrap();
        assert_eq!(codes.split('\t').count(), 28);
        assert_eq!(names.split('\t').count(), 28);
        assert!(codes.starts_with("submitter\tfn\tcovv_virus_name"));
        assert!(names.starts_with("Submitter\tFASTA filename\tVirus name"));
    }

    #[test]
    fn formatted_row_has_schema_width() {
        let config = test_config();
        let row = Portal::Gisaid.row(&test_record(), &config);
        let line = GISAID.format_row(&row).unwrap();
        assert_eq!(line.split('\t').count(), 28);
    }

    #[test]
    fn wrong_field_count_is_rejected() {
        let err = GISAID.format_row(&[String::from("only one")]).unwrap_err();
        assert!(err.to_string().contains("schema defines 28"));
    }

    #[test]
    fn comma_delimited_values_are_quoted() {
        let comma_schema = PortalSchema {
            portal: "GISAID",
            delimiter: b',',
            name_row: true,
            columns: GISAID.columns,
        };
        let row = Portal::Gisaid.row(&test_record(), &test_config());
        let line = comma_schema.format_row(&row).unwrap();

        // lab addresses contain commas and must arrive quote-wrapped
        assert!(line.contains("\"30 Bond Street, Toronto, ON, M5B 1W8\""));
        // tab output leaves the same value unquoted
        let tab_line = GISAID.format_row(&row).unwrap();
        assert!(tab_line.contains("30 Bond Street, Toronto, ON, M5B 1W8"));
        assert!(!tab_line.contains('"'));
    }

    #[test]
    fn date_precision_follows_date_shape() {
        assert_eq!(date_precision(&Some("2020".to_string())), "year");
        assert_eq!(date_precision(&Some("2020-04".to_string())), "month");
        assert_eq!(date_precision(&Some("2020-04-15".to_string())), "day");
        assert_eq!(date_precision(&None), "");
    }
}
