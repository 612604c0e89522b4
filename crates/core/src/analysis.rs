//! Analysis kinds and their typed results.
//!
//! Every analysis strategy produces one struct here; the orchestrator's
//! return type is the [`AnalysisResult`] union over all of them. The
//! structs are plain data so the rendering layer can serialize them
//! without knowing which strategy ran.

use serde::{Deserialize, Serialize};

/// The analysis strategy a caller requests
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisKind {
    ExecutiveSummary,
    Topics,
    DataExtraction,
    Clauses,
    Timeline,
    /// Free-form analysis carrying a caller-supplied label
    General(String),
}

impl AnalysisKind {
    /// Parse a CLI-style selector. Unknown selectors become a custom
    /// [`AnalysisKind::General`] analysis labelled with the raw input.
    pub fn from_selector(selector: &str) -> Self {
        match selector.trim().to_lowercase().as_str() {
            "summary" | "executive" | "executive-summary" => Self::ExecutiveSummary,
            "topics" | "topic" => Self::Topics,
            "data" | "extraction" | "data-extraction" => Self::DataExtraction,
            "clauses" | "clause" => Self::Clauses,
            "timeline" | "events" => Self::Timeline,
            _ => Self::General(selector.trim().to_string()),
        }
    }
}

impl std::fmt::Display for AnalysisKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ExecutiveSummary => write!(f, "Executive Summary"),
            Self::Topics => write!(f, "Topic Analysis"),
            Self::DataExtraction => write!(f, "Data Extraction"),
            Self::Clauses => write!(f, "Clause Analysis"),
            Self::Timeline => write!(f, "Event Timeline"),
            Self::General(label) => write!(f, "{}", label),
        }
    }
}

/// The result of one analysis run, tagged by strategy
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "analysis_type", rename_all = "snake_case")]
pub enum AnalysisResult {
    ExecutiveSummary(ExecutiveSummary),
    Topics(TopicAnalysis),
    DataExtraction(ExtractedData),
    Clauses(ClauseAnalysis),
    Timeline(Timeline),
    General(GeneralAnalysis),
}

impl AnalysisResult {
    pub fn kind(&self) -> AnalysisKind {
        match self {
            Self::ExecutiveSummary(_) => AnalysisKind::ExecutiveSummary,
            Self::Topics(_) => AnalysisKind::Topics,
            Self::DataExtraction(_) => AnalysisKind::DataExtraction,
            Self::Clauses(_) => AnalysisKind::Clauses,
            Self::Timeline(_) => AnalysisKind::Timeline,
            Self::General(general) => AnalysisKind::General(general.label.clone()),
        }
    }

    /// Serialize for the rendering collaborator.
    pub fn to_json_pretty(&self) -> crate::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Consolidated executive summary of a whole document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutiveSummary {
    pub summary: String,
    pub key_findings: Vec<String>,
    pub important_metrics: Vec<String>,
    pub recommendations: Vec<String>,
    pub main_conclusions: Vec<String>,
    /// True when the consolidation request failed and the fields were
    /// synthesized from the raw per-section results instead.
    pub consolidation_degraded: bool,
}

/// Topic breakdown with one report per discovered main topic
#[derive(Debug, Clone, Serialize)]
pub struct TopicAnalysis {
    pub main_topics: Vec<String>,
    pub hierarchy: Vec<TopicBranch>,
    /// Reports in `main_topics` order
    pub reports: Vec<TopicReport>,
}

/// A main topic and its subtopics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicBranch {
    pub topic: String,
    pub subtopics: Vec<String>,
}

/// Detailed findings for one main topic
#[derive(Debug, Clone, Serialize)]
pub struct TopicReport {
    pub topic: String,
    pub summary: String,
    pub key_points: Vec<String>,
    pub details: Vec<String>,
    pub related_data: Vec<String>,
    /// True when the per-topic request failed and only the placeholder
    /// summary is present.
    pub degraded: bool,
}

/// Structured data pulled out of a document, by category.
///
/// Doubles as the wire shape of each per-chunk extraction response;
/// missing categories deserialize as empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractedData {
    #[serde(default)]
    pub dates: Vec<String>,
    #[serde(default)]
    pub numbers: Vec<String>,
    #[serde(default)]
    pub percentages: Vec<String>,
    #[serde(default)]
    pub currencies: Vec<String>,
    #[serde(default)]
    pub names: Vec<String>,
    #[serde(default)]
    pub locations: Vec<String>,
    #[serde(default)]
    pub organizations: Vec<String>,
}

impl ExtractedData {
    /// Append another extraction's values onto this one.
    pub fn merge(&mut self, other: ExtractedData) {
        self.dates.extend(other.dates);
        self.numbers.extend(other.numbers);
        self.percentages.extend(other.percentages);
        self.currencies.extend(other.currencies);
        self.names.extend(other.names);
        self.locations.extend(other.locations);
        self.organizations.extend(other.organizations);
    }

    /// Drop repeated values in every category, keeping first occurrences.
    pub fn dedup(&mut self) {
        for category in [
            &mut self.dates,
            &mut self.numbers,
            &mut self.percentages,
            &mut self.currencies,
            &mut self.names,
            &mut self.locations,
            &mut self.organizations,
        ] {
            let mut seen = std::collections::HashSet::new();
            category.retain(|value| seen.insert(value.clone()));
        }
    }
}

/// Clause findings across a document, one record per contributing chunk
#[derive(Debug, Clone, Serialize)]
pub struct ClauseAnalysis {
    pub sections: Vec<ClauseRecord>,
}

/// Clause findings for one chunk of the document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClauseRecord {
    /// 1-based position of the source chunk
    #[serde(default)]
    pub section: usize,
    #[serde(default)]
    pub clauses_found: Vec<String>,
    #[serde(default)]
    pub key_terms: Vec<String>,
    #[serde(default)]
    pub obligations: Vec<String>,
    #[serde(default)]
    pub important_conditions: Vec<String>,
}

/// Chronology of events found in a document.
///
/// Events are ordered by their raw date string (plain lexical order, not
/// calendar-aware), so mixed date formats may interleave.
#[derive(Debug, Clone, Serialize)]
pub struct Timeline {
    pub events: Vec<TimelineEvent>,
}

/// One dated event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineEvent {
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub event: String,
    #[serde(default)]
    pub importance: Importance,
}

/// How significant an event is
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Importance {
    High,
    Medium,
    Low,
    #[default]
    #[serde(other)]
    Unspecified,
}

/// Free-form analysis output, returned verbatim from the model
#[derive(Debug, Clone, Serialize)]
pub struct GeneralAnalysis {
    pub label: String,
    pub content: String,
}
