//! Structural triage of a freshly extracted document

use serde::{Deserialize, Serialize};

use crate::analysis::AnalysisKind;

/// First-pass structural read of a document: what it is, what it covers,
/// and which analyses are worth running on it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentProfile {
    /// Specific document type as judged by the model (contract, report,
    /// presentation, manual, ...)
    pub document_type: String,
    pub main_topic: String,
    /// Confidence in the triage, 0-100
    pub confidence: u8,
    pub structure: DocumentStructure,
    pub suggested_analyses: Vec<AnalysisKind>,
    pub priority_analysis: AnalysisKind,
    pub key_entities: Vec<String>,
}

/// Structural observations from the triage pass
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentStructure {
    pub estimated_pages: Option<usize>,
    pub main_sections: Vec<String>,
    pub has_numerical_data: bool,
    pub has_dates: bool,
    pub has_financial_info: bool,
    pub language: Option<String>,
}

impl DocumentProfile {
    /// Pick suggested analyses from the judged document type.
    ///
    /// Contracts lead with clause analysis, reports with the executive
    /// summary, presentations add the timeline; anything else gets the
    /// standard first four kinds.
    pub fn suggestions_for(document_type: &str) -> Vec<AnalysisKind> {
        let lowered = document_type.to_lowercase();
        if lowered.contains("contract") || lowered.contains("legal") {
            vec![
                AnalysisKind::Clauses,
                AnalysisKind::ExecutiveSummary,
                AnalysisKind::DataExtraction,
            ]
        } else if lowered.contains("report") {
            vec![
                AnalysisKind::ExecutiveSummary,
                AnalysisKind::Topics,
                AnalysisKind::DataExtraction,
            ]
        } else if lowered.contains("presentation") {
            vec![
                AnalysisKind::ExecutiveSummary,
                AnalysisKind::Topics,
                AnalysisKind::Timeline,
            ]
        } else {
            vec![
                AnalysisKind::ExecutiveSummary,
                AnalysisKind::Topics,
                AnalysisKind::DataExtraction,
                AnalysisKind::Clauses,
            ]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contract_suggestions_lead_with_clauses() {
        let suggestions = DocumentProfile::suggestions_for("Service Contract");
        assert_eq!(suggestions[0], AnalysisKind::Clauses);
    }

    #[test]
    fn test_unknown_type_gets_standard_set() {
        let suggestions = DocumentProfile::suggestions_for("Poem");
        assert_eq!(suggestions.len(), 4);
        assert_eq!(suggestions[0], AnalysisKind::ExecutiveSummary);
    }
}
