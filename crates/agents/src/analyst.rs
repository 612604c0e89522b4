//! Analyst Agent - Orchestrates the per-chunk analysis strategies
//!
//! Each strategy issues one structured request per chunk (or one over
//! the concatenated text), parses the response into a typed record and
//! absorbs per-element failures so a single bad chunk never aborts the
//! whole analysis. Requests run one at a time in document order.

use std::collections::HashMap;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

use doclens_core::{
    AnalysisKind, AnalysisResult, Chunk, ClauseAnalysis, ClauseRecord, DocumentProfile,
    DocumentStructure, DocumentText, ExecutiveSummary, ExtractedData, GeneralAnalysis, Timeline,
    TimelineEvent, TopicAnalysis, TopicBranch, TopicReport,
};

use crate::error::Result;
use crate::llm::{parse_structured, ChatOptions, ChatProvider};

/// Character budget for the topic-discovery request.
const TOPIC_DISCOVERY_CHARS: usize = 5000;
/// Character budget for each per-topic detail request.
const TOPIC_DETAIL_CHARS: usize = 4000;
/// Character budget for the free-form analysis request.
const GENERAL_ANALYSIS_CHARS: usize = 8000;
/// Sample size for the structural triage pass.
const TRIAGE_SAMPLE_CHARS: usize = 3000;

/// The Analyst agent turns a chunk set into one consolidated analysis.
pub struct AnalystAgent {
    provider: Arc<dyn ChatProvider>,
}

impl AnalystAgent {
    pub fn new(provider: Arc<dyn ChatProvider>) -> Self {
        Self { provider }
    }

    /// Run the requested analysis strategy over a document's chunks.
    ///
    /// Per-chunk and per-topic failures are absorbed inside each
    /// strategy; only a failure of a strategy's single mandatory
    /// request (topic discovery, free-form analysis) surfaces as `Err`.
    #[instrument(skip(self, chunks))]
    pub async fn analyze(&self, chunks: &[Chunk], kind: &AnalysisKind) -> Result<AnalysisResult> {
        info!("Running {} over {} chunks", kind, chunks.len());

        match kind {
            AnalysisKind::ExecutiveSummary => Ok(AnalysisResult::ExecutiveSummary(
                self.executive_summary(chunks).await,
            )),
            AnalysisKind::Topics => Ok(AnalysisResult::Topics(self.topic_analysis(chunks).await?)),
            AnalysisKind::DataExtraction => Ok(AnalysisResult::DataExtraction(
                self.data_extraction(chunks).await,
            )),
            AnalysisKind::Clauses => Ok(AnalysisResult::Clauses(self.clause_analysis(chunks).await)),
            AnalysisKind::Timeline => Ok(AnalysisResult::Timeline(self.timeline(chunks).await)),
            AnalysisKind::General(label) => {
                Ok(AnalysisResult::General(self.general(chunks, label).await?))
            }
        }
    }

    /// Structural triage of a freshly extracted document.
    ///
    /// Never fails: if the model is unreachable or returns junk, a
    /// profile derived from the extraction metadata is returned instead.
    #[instrument(skip(self, doc))]
    pub async fn profile_document(&self, doc: &DocumentText, filename: &str) -> DocumentProfile {
        let sample = truncate_chars(&doc.full_text, TRIAGE_SAMPLE_CHARS);
        let metadata = serde_json::to_string_pretty(&doc.metadata).unwrap_or_default();
        let prompt = triage_prompt(filename, &doc.metadata.kind.to_string(), &metadata, &sample);

        match self
            .request::<ProfileWire>(&prompt, ChatOptions::fast(0.3, 1000))
            .await
        {
            Ok(wire) => Self::validate_profile(wire, doc),
            Err(e) => {
                warn!("Document triage failed ({}); using fallback profile", e);
                Self::fallback_profile(doc)
            }
        }
    }

    async fn request<T: DeserializeOwned>(&self, prompt: &str, options: ChatOptions) -> Result<T> {
        let raw = self.provider.complete(prompt, options).await?;
        parse_structured(&raw)
    }

    // ==========================================
    // EXECUTIVE SUMMARY
    // ==========================================

    async fn executive_summary(&self, chunks: &[Chunk]) -> ExecutiveSummary {
        let mut sections = Vec::with_capacity(chunks.len());

        for (i, chunk) in chunks.iter().enumerate() {
            let position = i + 1;
            let summary = match self
                .request::<SectionSummary>(
                    &section_summary_prompt(position, chunk),
                    ChatOptions::capable(0.2, 800),
                )
                .await
            {
                Ok(summary) => summary,
                Err(e) => {
                    debug!("Section {} summary failed ({}); using placeholder", position, e);
                    SectionSummary {
                        main_points: vec![format!("Summary of section {}", position)],
                        ..Default::default()
                    }
                }
            };
            sections.push(summary);
        }

        self.consolidate(sections).await
    }

    /// Merge per-section results with one final consolidation request.
    /// A consolidation failure degrades to a synthesis of the raw
    /// section results, never to an error.
    async fn consolidate(&self, sections: Vec<SectionSummary>) -> ExecutiveSummary {
        let mut all_points = Vec::new();
        let mut all_data = Vec::new();
        let mut all_conclusions = Vec::new();
        for section in sections {
            all_points.extend(section.main_points);
            all_data.extend(section.important_data);
            all_conclusions.extend(section.conclusions);
        }

        let prompt = consolidation_prompt(&all_points, &all_data, &all_conclusions);
        match self
            .request::<ConsolidatedSummary>(&prompt, ChatOptions::capable(0.2, 1000))
            .await
        {
            Ok(consolidated) => ExecutiveSummary {
                summary: consolidated.executive_summary,
                key_findings: consolidated.key_findings,
                important_metrics: consolidated.important_metrics,
                recommendations: consolidated.recommendations,
                main_conclusions: consolidated.main_conclusions,
                consolidation_degraded: false,
            },
            Err(e) => {
                warn!("Consolidation failed ({}); synthesizing from section results", e);
                ExecutiveSummary {
                    summary: "Consolidated summary unavailable due to a processing error"
                        .to_string(),
                    key_findings: all_points.into_iter().take(5).collect(),
                    important_metrics: all_data.into_iter().take(5).collect(),
                    recommendations: Vec::new(),
                    main_conclusions: all_conclusions.into_iter().take(3).collect(),
                    consolidation_degraded: true,
                }
            }
        }
    }

    // ==========================================
    // TOPIC ANALYSIS
    // ==========================================

    async fn topic_analysis(&self, chunks: &[Chunk]) -> Result<TopicAnalysis> {
        let full_text = join_chunks(chunks);
        let prompt = topic_discovery_prompt(&truncate_chars(&full_text, TOPIC_DISCOVERY_CHARS));
        let structure: TopicsWire = self.request(&prompt, ChatOptions::fast(0.3, 600)).await?;

        let mut reports = Vec::with_capacity(structure.main_topics.len());
        for topic in &structure.main_topics {
            reports.push(self.analyze_single_topic(chunks, topic).await);
        }

        let hierarchy = structure
            .main_topics
            .iter()
            .map(|topic| TopicBranch {
                topic: topic.clone(),
                subtopics: structure
                    .topic_hierarchy
                    .get(topic)
                    .cloned()
                    .unwrap_or_default(),
            })
            .collect();

        Ok(TopicAnalysis {
            main_topics: structure.main_topics,
            hierarchy,
            reports,
        })
    }

    /// Chunk selection is plain substring containment on lower-cased
    /// text; topics that match nothing fall back to the first two
    /// chunks.
    async fn analyze_single_topic(&self, chunks: &[Chunk], topic: &str) -> TopicReport {
        let lowered = topic.to_lowercase();
        let mut relevant: Vec<&Chunk> = chunks
            .iter()
            .filter(|chunk| chunk.text.to_lowercase().contains(&lowered))
            .collect();
        if relevant.is_empty() {
            relevant = chunks.iter().take(2).collect();
        }

        let combined = relevant
            .iter()
            .map(|chunk| chunk.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        let prompt = topic_detail_prompt(topic, &truncate_chars(&combined, TOPIC_DETAIL_CHARS));

        match self
            .request::<TopicWire>(&prompt, ChatOptions::capable(0.3, 600))
            .await
        {
            Ok(wire) => TopicReport {
                topic: topic.to_string(),
                summary: wire.summary,
                key_points: wire.key_points,
                details: wire.details,
                related_data: wire.related_data,
                degraded: false,
            },
            Err(e) => {
                debug!("Topic \"{}\" analysis failed: {}", topic, e);
                TopicReport {
                    topic: topic.to_string(),
                    summary: format!("Analysis of topic {}", topic),
                    key_points: Vec::new(),
                    details: Vec::new(),
                    related_data: Vec::new(),
                    degraded: true,
                }
            }
        }
    }

    // ==========================================
    // DATA EXTRACTION
    // ==========================================

    async fn data_extraction(&self, chunks: &[Chunk]) -> ExtractedData {
        let mut extracted = ExtractedData::default();

        for (i, chunk) in chunks.iter().enumerate() {
            match self
                .request::<ExtractedData>(
                    &data_extraction_prompt(chunk),
                    ChatOptions::capable(0.1, 500),
                )
                .await
            {
                Ok(data) => extracted.merge(data),
                Err(e) => {
                    debug!("Extraction failed for chunk {}: {}", i + 1, e);
                    continue;
                }
            }
        }

        extracted.dedup();
        extracted
    }

    // ==========================================
    // CLAUSE ANALYSIS
    // ==========================================

    async fn clause_analysis(&self, chunks: &[Chunk]) -> ClauseAnalysis {
        let mut sections = Vec::new();

        for (i, chunk) in chunks.iter().enumerate() {
            match self
                .request::<ClauseRecord>(&clause_prompt(chunk), ChatOptions::capable(0.2, 600))
                .await
            {
                Ok(mut record) => {
                    record.section = i + 1;
                    sections.push(record);
                }
                Err(e) => debug!("Clause analysis skipped chunk {}: {}", i + 1, e),
            }
        }

        ClauseAnalysis { sections }
    }

    // ==========================================
    // TIMELINE
    // ==========================================

    async fn timeline(&self, chunks: &[Chunk]) -> Timeline {
        let mut events: Vec<TimelineEvent> = Vec::new();

        for (i, chunk) in chunks.iter().enumerate() {
            match self
                .request::<TimelineWire>(&timeline_prompt(chunk), ChatOptions::capable(0.2, 500))
                .await
            {
                Ok(wire) => events.extend(wire.events),
                Err(e) => debug!("Timeline extraction skipped chunk {}: {}", i + 1, e),
            }
        }

        // Raw string order; mixed date formats are not normalised.
        events.sort_by(|a, b| a.date.cmp(&b.date));
        Timeline { events }
    }

    // ==========================================
    // FREE-FORM ANALYSIS
    // ==========================================

    async fn general(&self, chunks: &[Chunk], label: &str) -> Result<GeneralAnalysis> {
        let full_text = join_chunks(chunks);
        let prompt = general_prompt(label, &truncate_chars(&full_text, GENERAL_ANALYSIS_CHARS));
        let content = self
            .provider
            .complete(&prompt, ChatOptions::capable(0.3, 1500))
            .await?;

        Ok(GeneralAnalysis {
            label: label.to_string(),
            content,
        })
    }

    // ==========================================
    // TRIAGE VALIDATION
    // ==========================================

    fn validate_profile(wire: ProfileWire, doc: &DocumentText) -> DocumentProfile {
        let document_type = wire
            .document_type
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| doc.metadata.kind.to_string());
        let structure = wire.structure.unwrap_or_default();
        let suggested = DocumentProfile::suggestions_for(&document_type);

        DocumentProfile {
            priority_analysis: suggested[0].clone(),
            suggested_analyses: suggested,
            main_topic: wire
                .main_topic
                .filter(|t| !t.trim().is_empty())
                .unwrap_or_else(|| "Topic not identified".to_string()),
            confidence: value_to_usize(wire.confidence_score.as_ref())
                .map(|c| c.min(100) as u8)
                .unwrap_or(50),
            structure: DocumentStructure {
                estimated_pages: value_to_usize(structure.estimated_pages.as_ref())
                    .or(doc.metadata.pages),
                main_sections: structure.main_sections,
                has_numerical_data: structure.has_numerical_data,
                has_dates: structure.has_dates,
                has_financial_info: structure.has_financial_info,
                language: structure.language,
            },
            key_entities: wire.key_entities,
            document_type,
        }
    }

    fn fallback_profile(doc: &DocumentText) -> DocumentProfile {
        DocumentProfile {
            document_type: doc.metadata.kind.to_string(),
            main_topic: "Automatic analysis".to_string(),
            confidence: 50,
            structure: DocumentStructure {
                estimated_pages: doc.metadata.pages,
                main_sections: Vec::new(),
                has_numerical_data: true,
                has_dates: true,
                has_financial_info: false,
                language: doc.metadata.language.clone(),
            },
            suggested_analyses: vec![
                AnalysisKind::ExecutiveSummary,
                AnalysisKind::Topics,
                AnalysisKind::DataExtraction,
            ],
            priority_analysis: AnalysisKind::ExecutiveSummary,
            key_entities: Vec::new(),
        }
    }
}

// ==========================================
// WIRE TYPES
// ==========================================

#[derive(Debug, Default, Deserialize)]
struct SectionSummary {
    #[serde(default)]
    main_points: Vec<String>,
    #[serde(default)]
    important_data: Vec<String>,
    #[serde(default)]
    conclusions: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ConsolidatedSummary {
    #[serde(default)]
    executive_summary: String,
    #[serde(default)]
    key_findings: Vec<String>,
    #[serde(default)]
    important_metrics: Vec<String>,
    #[serde(default)]
    recommendations: Vec<String>,
    #[serde(default)]
    main_conclusions: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
struct TopicsWire {
    #[serde(default)]
    main_topics: Vec<String>,
    #[serde(default)]
    topic_hierarchy: HashMap<String, Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
struct TopicWire {
    #[serde(default)]
    summary: String,
    #[serde(default)]
    key_points: Vec<String>,
    #[serde(default)]
    details: Vec<String>,
    #[serde(default)]
    related_data: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
struct TimelineWire {
    #[serde(default)]
    events: Vec<TimelineEvent>,
}

#[derive(Debug, Default, Deserialize)]
struct ProfileWire {
    #[serde(default)]
    document_type: Option<String>,
    #[serde(default)]
    main_topic: Option<String>,
    #[serde(default)]
    confidence_score: Option<serde_json::Value>,
    #[serde(default)]
    structure: Option<StructureWire>,
    #[serde(default)]
    key_entities: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
struct StructureWire {
    #[serde(default)]
    estimated_pages: Option<serde_json::Value>,
    #[serde(default)]
    main_sections: Vec<String>,
    #[serde(default)]
    has_numerical_data: bool,
    #[serde(default)]
    has_dates: bool,
    #[serde(default)]
    has_financial_info: bool,
    #[serde(default)]
    language: Option<String>,
}

/// Accept numbers the model wrote either as JSON numbers or strings.
fn value_to_usize(value: Option<&serde_json::Value>) -> Option<usize> {
    match value? {
        serde_json::Value::Number(n) => n.as_u64().map(|n| n as usize),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn join_chunks(chunks: &[Chunk]) -> String {
    chunks
        .iter()
        .map(|chunk| chunk.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

fn bullets(items: &[String]) -> String {
    if items.is_empty() {
        return "(none)".to_string();
    }
    items
        .iter()
        .map(|item| format!("- {}", item))
        .collect::<Vec<_>>()
        .join("\n")
}

// ==========================================
// PROMPTS
// ==========================================

fn section_summary_prompt(position: usize, chunk: &Chunk) -> String {
    format!(
        "Analyze this document section and write an executive summary focused on the main points:\n\n\
         SECTION {}:\n{}\n\n\
         Respond with:\n\
         - Main points (at most 3)\n\
         - Important data (numbers, dates, percentages)\n\
         - Conclusions or recommendations\n\n\
         JSON format:\n\
         {{\"main_points\": [\"point1\", \"point2\", \"point3\"], \"important_data\": [\"item1\", \"item2\"], \"conclusions\": [\"conclusion1\", \"conclusion2\"]}}",
        position, chunk.text
    )
}

fn consolidation_prompt(points: &[String], data: &[String], conclusions: &[String]) -> String {
    format!(
        "Consolidate these analysis results into one final summary:\n\n\
         MAIN POINTS:\n{}\n\n\
         IMPORTANT DATA:\n{}\n\n\
         CONCLUSIONS:\n{}\n\n\
         Write a consolidated executive summary as JSON:\n\
         {{\"executive_summary\": \"two or three paragraphs\", \"key_findings\": [\"finding1\", \"finding2\"], \"important_metrics\": [\"metric1\"], \"recommendations\": [\"recommendation1\"], \"main_conclusions\": [\"conclusion1\"]}}",
        bullets(points),
        bullets(data),
        bullets(conclusions)
    )
}

fn topic_discovery_prompt(sample: &str) -> String {
    format!(
        "Analyze this document and identify the main topics it covers:\n\n\
         DOCUMENT:\n{}\n\n\
         Respond with JSON:\n\
         {{\"main_topics\": [\"topic1\", \"topic2\", \"topic3\", \"topic4\", \"topic5\"], \"topic_hierarchy\": {{\"topic1\": [\"subtopic1\", \"subtopic2\"], \"topic2\": [\"subtopic1\"]}}}}",
        sample
    )
}

fn topic_detail_prompt(topic: &str, content: &str) -> String {
    format!(
        "Analyze this content focusing specifically on the topic \"{}\":\n\n\
         CONTENT:\n{}\n\n\
         Respond with JSON:\n\
         {{\"summary\": \"topic summary\", \"key_points\": [\"point1\", \"point2\"], \"details\": [\"detail1\"], \"related_data\": [\"item1\"]}}",
        topic, content
    )
}

fn data_extraction_prompt(chunk: &Chunk) -> String {
    format!(
        "Extract structured data from this text:\n\n\
         TEXT:\n{}\n\n\
         Respond with JSON:\n\
         {{\"dates\": [], \"numbers\": [], \"percentages\": [], \"currencies\": [], \"names\": [], \"locations\": [], \"organizations\": []}}",
        chunk.text
    )
}

fn clause_prompt(chunk: &Chunk) -> String {
    format!(
        "Analyze this text looking for clauses, key terms and obligations:\n\n\
         SECTION:\n{}\n\n\
         Respond with JSON:\n\
         {{\"clauses_found\": [\"clause1\"], \"key_terms\": [\"term1\"], \"obligations\": [\"obligation1\"], \"important_conditions\": [\"condition1\"]}}",
        chunk.text
    )
}

fn timeline_prompt(chunk: &Chunk) -> String {
    format!(
        "Extract dated events from this text:\n\n\
         TEXT:\n{}\n\n\
         Respond with JSON:\n\
         {{\"events\": [{{\"date\": \"date\", \"event\": \"event description\", \"importance\": \"high|medium|low\"}}]}}",
        chunk.text
    )
}

fn general_prompt(label: &str, content: &str) -> String {
    format!(
        "Perform a \"{}\" analysis of this document:\n\n\
         DOCUMENT:\n{}\n\n\
         Provide a structured, detailed analysis.",
        label, content
    )
}

fn triage_prompt(filename: &str, kind: &str, metadata: &str, sample: &str) -> String {
    format!(
        "Analyze this document and provide a structural profile as JSON:\n\n\
         FILENAME: {}\n\
         TYPE: {}\n\
         METADATA: {}\n\n\
         TEXT SAMPLE:\n{}\n\n\
         Respond ONLY with valid JSON:\n\
         {{\"document_type\": \"specific type (contract, report, presentation, manual, ...)\", \"main_topic\": \"main topic\", \"confidence_score\": 0, \"structure\": {{\"estimated_pages\": 0, \"main_sections\": [\"section1\"], \"has_numerical_data\": false, \"has_dates\": false, \"has_financial_info\": false, \"language\": \"language\"}}, \"key_entities\": [\"entity1\", \"entity2\"]}}",
        filename, kind, metadata, sample
    )
}
