use crate::{CompanyDetailsPayload, PromptPayload, TopicAssessmentPayload};

pub const GRI_TOPICS_TITLE: &str = "GRI Topics";
pub const UN_SDG_TITLE: &str = "UN Sustainable Development Goals";

#[derive(Debug, Clone, PartialEq)]
/// One unit of the report as the reviewer sees it.
pub enum TranscriptEntry {
    CompanyProfile {
        sector: String,
        industry_group: String,
        industry: String,
        description: String,
    },
    TopicList {
        title: String,
        items: Vec<String>,
    },
    TopicAssessment {
        topic: String,
        requirements: String,
        assessment: String,
        source_texts: Vec<String>,
    },
    PendingPrompt {
        payload: PromptPayload,
    },
    FreeformNote(String),
}

impl TranscriptEntry {
    pub fn note(text: impl Into<String>) -> Self {
        Self::FreeformNote(text.into())
    }

    pub fn topic_list(title: &str, items: Vec<String>) -> Self {
        Self::TopicList {
            title: title.to_string(),
            items,
        }
    }

    pub fn is_pending_prompt(&self) -> bool {
        matches!(self, Self::PendingPrompt { .. })
    }
}

impl From<CompanyDetailsPayload> for TranscriptEntry {
    fn from(payload: CompanyDetailsPayload) -> Self {
        Self::CompanyProfile {
            sector: payload.gics_sector,
            industry_group: payload.gics_industry_group,
            industry: payload.gics_industry,
            description: payload.company_description,
        }
    }
}

impl From<TopicAssessmentPayload> for TranscriptEntry {
    fn from(payload: TopicAssessmentPayload) -> Self {
        Self::TopicAssessment {
            topic: payload.gri_topic,
            requirements: payload.reporting_requirements,
            assessment: payload.assessment,
            source_texts: payload.source_texts,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
/// Append-only report log. Entries are never edited; the only removal is from
/// the tail when a reviewer answers a prompt.
pub struct Transcript {
    entries: Vec<TranscriptEntry>,
}

impl Transcript {
    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last(&self) -> Option<&TranscriptEntry> {
        self.entries.last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TranscriptEntry> {
        self.entries.iter()
    }

    pub fn pending_prompt_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.is_pending_prompt())
            .count()
    }

    pub(crate) fn append(&mut self, entry: TranscriptEntry) {
        self.entries.push(entry);
    }

    /// Removes up to `count` trailing entries and returns how many were removed.
    pub(crate) fn truncate_tail(&mut self, count: usize) -> usize {
        let keep = self.entries.len().saturating_sub(count);
        let removed = self.entries.len() - keep;
        self.entries.truncate(keep);
        removed
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }
}
