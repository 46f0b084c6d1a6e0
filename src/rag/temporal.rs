// Drops passages that mention already-elapsed calendar dates
use chrono::NaiveDate;
use regex::Regex;

use crate::rag::retrieval::Passage;

/// Date mentions are matched as "Month Day, Year" (e.g. "January 5, 2024").
/// Loosening this pattern changes which passages count as dated and thus
/// droppable, so it is kept to the one literal format.
const DATE_MENTION_PATTERN: &str = r"([A-Za-z]+ \d{1,2}, \d{4})";
const DATE_FORMAT: &str = "%B %d, %Y";

/// Order-preserving filter removing passages with expired date mentions.
///
/// A passage with no parseable date is always kept; a passage is dropped if
/// any date in it is strictly earlier than the reference date, even when
/// other dates in the same passage are still valid. A stale deadline shown
/// to an applicant is a worse failure than a missing passage.
pub struct TemporalFilter {
    pattern: Regex,
}

impl TemporalFilter {
    pub fn new() -> Self {
        Self {
            // Pattern is a checked literal; compilation cannot fail
            pattern: Regex::new(DATE_MENTION_PATTERN).unwrap(),
        }
    }

    /// Filter out passages mentioning dates before `reference_date`
    pub fn filter(&self, passages: Vec<Passage>, reference_date: NaiveDate) -> Vec<Passage> {
        passages
            .into_iter()
            .filter(|passage| self.keep(&passage.content, reference_date))
            .collect()
    }

    fn keep(&self, text: &str, reference_date: NaiveDate) -> bool {
        for mention in self.pattern.find_iter(text) {
            // Date-like substrings that fail to parse are ignored, not errors
            if let Ok(date) = NaiveDate::parse_from_str(mention.as_str(), DATE_FORMAT) {
                if date < reference_date {
                    return false;
                }
            }
        }
        true
    }
}

impl Default for TemporalFilter {
    fn default() -> Self {
        Self::new()
    }
}
