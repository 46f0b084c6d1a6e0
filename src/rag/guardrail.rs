// Safety gate over sensitive admissions topics
use serde::{Deserialize, Serialize};

use crate::rag::retrieval::Passage;

/// Ordered category -> synonym table. Sensitive, time-bound facts carry
/// asymmetric risk: a wrong deadline is worse than a missed answer.
///
/// Iteration order is part of the contract - the first category whose
/// synonyms appear in the query decides the verdict.
const SENSITIVE_CATEGORIES: &[(&str, &[&str])] = &[
    ("deadline", &["deadline", "due date", "closes", "cutoff", "round"]),
    ("tuition", &["fee", "tuition", "cost", "price"]),
    ("requirement", &["requirement", "criteria", "prerequisite", "gpa"]),
];

/// Outcome of the guardrail check for one query/passage-set pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GuardrailVerdict {
    /// No sensitive category touched; answer normally
    Pass,
    /// Evidence exists but completeness cannot be confirmed
    Warn { advisory: String },
    /// No supporting evidence for a sensitive question; withhold the answer
    Abstain { advisory: String },
}

impl GuardrailVerdict {
    pub fn advisory(&self) -> Option<&str> {
        match self {
            GuardrailVerdict::Pass => None,
            GuardrailVerdict::Warn { advisory } => Some(advisory),
            GuardrailVerdict::Abstain { advisory } => Some(advisory),
        }
    }

    pub fn is_abstain(&self) -> bool {
        matches!(self, GuardrailVerdict::Abstain { .. })
    }
}

/// Keyword guardrail over the query and the surviving passage set
pub struct GuardrailClassifier {
    contact_email: String,
}

impl GuardrailClassifier {
    pub fn new(contact_email: impl Into<String>) -> Self {
        Self {
            contact_email: contact_email.into(),
        }
    }

    /// Classify a query against the passages that survived filtering.
    ///
    /// Only the first matching category determines the verdict; categories
    /// are not combined.
    pub fn classify(&self, query: &str, passages: &[Passage]) -> GuardrailVerdict {
        let query_lower = query.to_lowercase();
        let combined: String = passages
            .iter()
            .map(|p| p.content.to_lowercase())
            .collect::<Vec<_>>()
            .join(" ");

        for (category, synonyms) in SENSITIVE_CATEGORIES {
            if !synonyms.iter().any(|kw| query_lower.contains(kw)) {
                continue;
            }

            if !synonyms.iter().any(|kw| combined.contains(kw)) {
                return GuardrailVerdict::Abstain {
                    advisory: format!(
                        "I can't verify that from the official program pages. \
                         Please contact admissions at {}.",
                        self.contact_email
                    ),
                };
            }

            return GuardrailVerdict::Warn {
                advisory: format!(
                    "This answer is based on retrieved information about {}, \
                     but please confirm with admissions for the most up-to-date details.",
                    category
                ),
            };
        }

        GuardrailVerdict::Pass
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn passage(content: &str) -> Passage {
        Passage {
            content: content.to_string(),
            source_id: "test".to_string(),
            score: None,
        }
    }

    fn classifier() -> GuardrailClassifier {
        GuardrailClassifier::new("admissions@example.edu")
    }

    #[test]
    fn test_deadline_query_without_evidence_abstains() {
        let verdict = classifier().classify(
            "What is the application deadline?",
            &[passage("The program offers six core courses.")],
        );
        assert!(verdict.is_abstain());
        assert!(verdict.advisory().unwrap().contains("admissions@example.edu"));
    }

    #[test]
    fn test_deadline_query_with_evidence_warns() {
        let verdict = classifier().classify(
            "What is the application deadline?",
            &[passage("Round 1 deadline: January 5, 2024")],
        );
        assert!(matches!(verdict, GuardrailVerdict::Warn { .. }));
        assert!(verdict.advisory().unwrap().contains("deadline"));
    }

    #[test]
    fn test_unrestricted_query_passes() {
        let verdict = classifier().classify(
            "What electives does the program offer?",
            &[passage("Electives include machine learning and big data.")],
        );
        assert_eq!(verdict, GuardrailVerdict::Pass);
        assert!(verdict.advisory().is_none());
    }

    #[test]
    fn test_matching_is_case_insensitive() {
        let verdict = classifier().classify(
            "How much is the TUITION?",
            &[passage("Tuition for the program is posted each spring.")],
        );
        assert!(matches!(verdict, GuardrailVerdict::Warn { .. }));
    }

    #[test]
    fn test_first_matching_category_wins() {
        // Query touches both deadline and tuition; only deadline is reported
        let verdict = classifier().classify(
            "What is the deadline and the tuition?",
            &[passage("Round 2 closes soon. Tuition is listed online.")],
        );
        match verdict {
            GuardrailVerdict::Warn { advisory } => assert!(advisory.contains("deadline")),
            other => panic!("expected warn, got {:?}", other),
        }
    }

    #[test]
    fn test_synonyms_only_in_passages_still_pass() {
        // The query drives category detection, not the passages
        let verdict = classifier().classify(
            "Tell me about the capstone project.",
            &[passage("The deadline for capstone proposals is flexible.")],
        );
        assert_eq!(verdict, GuardrailVerdict::Pass);
    }

    #[test]
    fn test_empty_passage_set_with_sensitive_query_abstains() {
        let verdict = classifier().classify("What does it cost?", &[]);
        assert!(verdict.is_abstain());
    }
}
