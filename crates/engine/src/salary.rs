//! Numeric claim guard for compensation answers.
//!
//! Compensation questions invite invented numbers. For such queries the
//! engine collects the numeric facts actually present in the retrieved
//! context (salary ranges, percentages, rent figures) and drops any answer
//! line that claims a figure outside that set. Intentionally strict: with no
//! ranges in context, no currency claim with digits survives at all.

use std::collections::BTreeSet;

use advisor_core::{AppError, AppResult};
use regex::Regex;

/// Returned when every line of a compensation answer was unsupported.
pub const SALARY_FALLBACK: &str = "Salary ranges vary by city, company tier, and skills. \
     Tell me your city and years of experience for a grounded estimate.";

/// Numeric facts extracted from retrieved context, normalized.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SalaryFacts {
    /// Normalized "a-b LPA" ranges present in context
    ranges: BTreeSet<String>,

    /// Every allowed normalized fact (ranges, percents, rents)
    allowed: BTreeSet<String>,
}

impl SalaryFacts {
    /// Whether the context carried no numeric compensation facts.
    pub fn is_empty(&self) -> bool {
        self.allowed.is_empty()
    }
}

/// Matches compensation queries and filters unsupported numeric claims.
/// Read-only after construction.
pub struct SalaryGuard {
    query_terms: Regex,
    lpa_range: Regex,
    percent: Regex,
    rent: Regex,
    currency_term: Regex,
}

impl SalaryGuard {
    /// Compile the matcher set.
    pub fn new() -> AppResult<Self> {
        Ok(Self {
            query_terms: pattern(r"(?i)\b(salary|ctc|package|lpa|inr|compensation|pay)\b")?,
            lpa_range: pattern(r"(?i)\b(\d{1,2})\s*(?:-|to)\s*(\d{1,2})\s*(?:lpa|lakhs?\b)")?,
            percent: pattern(r"(?i)\b(\d{1,2})\s*(?:%|percent\b)")?,
            rent: pattern(r"(?i)\binr\s*(\d{1,3})\s*k\s*/\s*month\b")?,
            currency_term: pattern(r"(?i)\b(lpa|ctc|package|inr|rs\.?)\b")?,
        })
    }

    /// Whether a query is about compensation.
    pub fn is_salary_query(&self, query: &str) -> bool {
        self.query_terms.is_match(query)
    }

    /// Collect the numeric facts present in the retrieved chunk texts.
    pub fn extract_facts<'a>(&self, context: impl IntoIterator<Item = &'a str>) -> SalaryFacts {
        let mut facts = SalaryFacts::default();

        for text in context {
            for caps in self.lpa_range.captures_iter(text) {
                let normalized = format!("{}-{} LPA", &caps[1], &caps[2]);
                facts.ranges.insert(normalized.clone());
                facts.allowed.insert(normalized);
            }
            for caps in self.percent.captures_iter(text) {
                facts.allowed.insert(format!("{}%", &caps[1]));
            }
            for caps in self.rent.captures_iter(text) {
                facts.allowed.insert(format!("INR {}k/month", &caps[1]));
            }
        }

        facts
    }

    /// Drop answer lines whose numeric compensation claims are not in the
    /// allowed fact set. Never returns an empty answer.
    pub fn scrub_answer(&self, answer: &str, facts: &SalaryFacts) -> String {
        let mut kept: Vec<&str> = Vec::new();

        for line in answer.lines() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                kept.push(line);
                continue;
            }

            // With no ranges in context, any currency talk with digits is an
            // invented figure.
            if facts.ranges.is_empty()
                && self.currency_term.is_match(trimmed)
                && trimmed.chars().any(|c| c.is_ascii_digit())
            {
                continue;
            }

            if let Some(caps) = self.lpa_range.captures(trimmed) {
                let normalized = format!("{}-{} LPA", &caps[1], &caps[2]);
                if !facts.allowed.contains(&normalized) {
                    continue;
                }
            }

            if let Some(caps) = self.percent.captures(trimmed) {
                let normalized = format!("{}%", &caps[1]);
                if !facts.allowed.contains(&normalized) {
                    continue;
                }
            }

            kept.push(line);
        }

        let cleaned = kept.join("\n").trim().to_string();
        if cleaned.is_empty() {
            tracing::debug!("salary answer carried only unsupported figures, using fallback");
            SALARY_FALLBACK.to_string()
        } else {
            cleaned
        }
    }
}

fn pattern(source: &str) -> AppResult<Regex> {
    Regex::new(source).map_err(|e| AppError::Other(format!("Invalid guard pattern: {}", e)))
}
