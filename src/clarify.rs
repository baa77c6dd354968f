//! "Please be more specific" replies.
//!
//! The clarifier never answers a question. It either asks the model to pick
//! from a fixed option list, or returns the same list verbatim. Model output
//! that strays from the list is discarded in favour of the static text.

use std::fmt::Write;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::deadline::{Bounded, RequestDeadline};
use crate::llm::CompletionBackend;
use crate::models::{Classification, Query};

const MIN_OPTIONS: usize = 4;
const MAX_OPTIONS: usize = 7;
/// Longest model reply accepted before falling back.
const MAX_CLARIFY_CHARS: usize = 600;
/// Longest non-list line a model clarification may carry.
const MAX_QUESTION_CHARS: usize = 120;

/// Tenant-specific vocabulary: phrases that mark a query as too generic to
/// search, and the categories a user is asked to choose from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClarifyTable {
    pub generic_phrases: Vec<String>,
    pub options: Vec<String>,
}

impl Default for ClarifyTable {
    fn default() -> Self {
        let generic_phrases = [
            "how to work a lead",
            "how do i work a lead",
            "how to work leads",
            "how do i work leads",
            "what do i do with a lead",
            "what do i do with a new lead",
            "where do i start with a lead",
        ];
        let options = [
            "Zillow Premier Agent leads",
            "Realtor.com leads",
            "Open house sign-ins",
            "Sphere and past-client referrals",
            "Facebook or Instagram ad leads",
            "Expired and FSBO listings",
        ];
        Self {
            generic_phrases: generic_phrases.iter().map(|s| s.to_string()).collect(),
            options: options.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl ClarifyTable {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.generic_phrases.iter().all(|p| normalize(p).is_empty()) {
            anyhow::bail!("at least one generic phrase is required");
        }
        if !(MIN_OPTIONS..=MAX_OPTIONS).contains(&self.options.len()) {
            anyhow::bail!(
                "expected {MIN_OPTIONS}-{MAX_OPTIONS} options, found {}",
                self.options.len()
            );
        }
        if self.options.iter().any(|o| o.trim().is_empty()) {
            anyhow::bail!("options must not be blank");
        }
        Ok(())
    }

    /// Case-insensitive, word-boundary match against the generic phrases.
    pub fn classify(&self, query: &Query) -> Classification {
        let haystack = format!(" {} ", normalize(query.as_str()));
        let generic = self.generic_phrases.iter().any(|phrase| {
            let needle = normalize(phrase);
            !needle.is_empty() && haystack.contains(&format!(" {needle} "))
        });
        if generic {
            Classification::Generic
        } else {
            Classification::Specific
        }
    }

    /// The static clarification message: a fixed question plus the numbered options.
    pub fn fallback_text(&self) -> String {
        let mut text = String::from("Can you be more specific? Which of these are you asking about?\n");
        for (i, option) in self.options.iter().enumerate() {
            let _ = writeln!(text, "{}. {}", i + 1, option);
        }
        text.push_str("Try `/ask` again with one of these and what you need.");
        text
    }

    fn system_prompt(&self) -> String {
        let mut list = String::new();
        for option in &self.options {
            let _ = writeln!(list, "- {option}");
        }
        format!(
            "You route questions to internal documents. Never answer the question and never \
             use outside knowledge. Do not state any facts. Your only job is to ask the user \
             which of the following categories they mean, and you may use no information \
             beyond this list:\n{list}\n\
             Reply with one short question followed by a numbered list of {MIN_OPTIONS} to \
             {MAX_OPTIONS} options copied exactly from the list, with nothing added to any \
             option. Keep the whole reply under {MAX_CLARIFY_CHARS} characters."
        )
    }

    /// True when `reply` is at most one short question plus a numbered or
    /// bulleted list of 4-7 distinct options copied from the table. Any other
    /// prose, or an option with extra words attached, fails the check.
    fn is_grounded(&self, reply: &str) -> bool {
        if reply.chars().count() > MAX_CLARIFY_CHARS {
            return false;
        }
        let options: Vec<String> = self.options.iter().map(|o| normalize(o)).collect();
        let mut items: Vec<String> = Vec::new();
        let mut questions = 0;

        for line in reply.lines().map(str::trim).filter(|l| !l.is_empty()) {
            match list_item(line) {
                Some(item) => {
                    let item = normalize(item);
                    if !options.contains(&item) || items.contains(&item) {
                        return false;
                    }
                    items.push(item);
                }
                None => {
                    questions += 1;
                    if questions > 1 || !is_plain_question(line) {
                        return false;
                    }
                }
            }
        }

        (MIN_OPTIONS..=MAX_OPTIONS).contains(&items.len())
    }
}

/// One short sentence ending in `?`, with no figures and no earlier sentence
/// break that could smuggle in a claim.
fn is_plain_question(line: &str) -> bool {
    let Some(body) = line.strip_suffix('?') else {
        return false;
    };
    line.chars().count() <= MAX_QUESTION_CHARS
        && !body
            .chars()
            .any(|c| c.is_ascii_digit() || matches!(c, '.' | '!' | '?' | ':' | ';'))
}

/// Lowercase, keep alphanumerics, collapse everything else to single spaces.
fn normalize(text: &str) -> String {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Body of a `1. foo`, `2) foo`, `- foo`, `* foo` or `• foo` line.
fn list_item(line: &str) -> Option<&str> {
    let line = line.trim();
    if let Some(rest) = line
        .strip_prefix("- ")
        .or_else(|| line.strip_prefix("* "))
        .or_else(|| line.strip_prefix("• "))
    {
        return Some(rest.trim());
    }
    let digits = line.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits == 0 {
        return None;
    }
    let rest = &line[digits..];
    rest.strip_prefix('.')
        .or_else(|| rest.strip_prefix(')'))
        .map(str::trim)
}

/// Produces the clarification text for generic or unmatched queries.
#[derive(Clone)]
pub struct Clarifier {
    llm: Option<Arc<dyn CompletionBackend>>,
    table: Arc<ClarifyTable>,
    budget: Duration,
}

impl Clarifier {
    /// `llm` is `None` when no model credential is configured; the clarifier
    /// then always uses the static text.
    pub fn new(
        llm: Option<Arc<dyn CompletionBackend>>,
        table: Arc<ClarifyTable>,
        budget: Duration,
    ) -> Self {
        Self { llm, table, budget }
    }

    pub fn table(&self) -> &ClarifyTable {
        &self.table
    }

    pub async fn clarify(&self, query: &Query, deadline: &RequestDeadline) -> String {
        let Some(llm) = &self.llm else {
            tracing::debug!("No model configured, using static clarification");
            return self.table.fallback_text();
        };

        let system = self.table.system_prompt();
        match deadline.run(self.budget, llm.complete(&system, query.as_str())).await {
            Bounded::Completed(Ok(reply)) if self.table.is_grounded(&reply) => reply,
            Bounded::Completed(Ok(reply)) => {
                tracing::warn!(
                    "Model clarification strayed from the option list, using static text ({} chars)",
                    reply.chars().count()
                );
                self.table.fallback_text()
            }
            Bounded::Completed(Err(e)) => {
                tracing::warn!("Model clarification failed, using static text: {e:#}");
                self.table.fallback_text()
            }
            Bounded::TimedOut => {
                tracing::warn!("Model clarification timed out, using static text");
                self.table.fallback_text()
            }
        }
    }
}
