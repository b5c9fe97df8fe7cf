//! Per-record selection workflow over a batch of target records.
//!
//! Each record moves through
//!
//! ```text
//! Pending -> Fetching -> AwaitingChoice -> Applied | Skipped
//!    |           |             |
//!    |           |             +--------> Aborted (halts the batch)
//!    |           +--> FailedNoResults
//!    +--> FailedEmptyTitle
//! ```
//!
//! Records after an abort stay `Pending`. Records whose title is blank or
//! that produced no results are reported together once the batch ends.

use async_trait::async_trait;

use super::aggregate::aggregate;
use super::reconcile::{reconcile, UpdateStrategy};
use crate::config::Preferences;
use crate::models::SearchResult;
use crate::providers::{ProviderConfig, ProviderRegistry};
use crate::store::TargetRecord;

/// Outcome of the selection step
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    /// Apply this result to the record
    Chosen(SearchResult),
    /// Leave the record untouched and continue
    Skip,
    /// Stop the whole batch
    Abort,
}

/// Where the workflow is when it asks for a selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionContext<'a> {
    /// Zero-based position of the record in the batch
    pub index: usize,
    pub total: usize,
    pub title: &'a str,
}

/// Collects the choice for one record, from a person or a policy
#[async_trait]
pub trait SelectionSurface: Send + Sync {
    async fn choose(&self, results: &[SearchResult], context: &SelectionContext<'_>) -> Selection;
}

/// Receives user-facing notices
pub trait Reporter: Send + Sync {
    /// A single notice about one record
    fn notify(&self, title: &str, message: &str);

    /// Titles that failed during the batch, each listed once
    fn report_failures(&self, titles: &[String]);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordState {
    Pending,
    Fetching,
    AwaitingChoice,
    Applied,
    Skipped,
    FailedEmptyTitle,
    FailedNoResults,
    /// The chosen result could not be saved
    FailedSave,
    Aborted,
}

impl RecordState {
    /// Whether this state ends processing of its record
    pub fn is_terminal(&self) -> bool {
        !matches!(
            self,
            RecordState::Pending | RecordState::Fetching | RecordState::AwaitingChoice
        )
    }

    /// Whether this state belongs in the end-of-batch failure summary
    pub fn is_reported_failure(&self) -> bool {
        matches!(self, RecordState::FailedEmptyTitle | RecordState::FailedNoResults)
    }
}

/// Result of one workflow run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchReport {
    /// Final state of every record, in input order
    pub states: Vec<RecordState>,
    /// Titles of records that had no title or no results, without duplicates
    pub failed_titles: Vec<String>,
    pub aborted: bool,
}

impl BatchReport {
    fn untouched(len: usize) -> Self {
        Self {
            states: vec![RecordState::Pending; len],
            failed_titles: Vec::new(),
            aborted: false,
        }
    }

    /// Number of records that ended in `state`
    pub fn count(&self, state: RecordState) -> usize {
        self.states.iter().filter(|s| **s == state).count()
    }
}

/// State owned by a single run
#[derive(Debug, Default)]
struct BatchState {
    index: usize,
    failures: Vec<String>,
    aborted: bool,
}

impl BatchState {
    fn record_failure(&mut self, title: String) {
        if !self.failures.contains(&title) {
            self.failures.push(title);
        }
    }
}

/// Drives fetch, selection and reconciliation over a batch of records
pub struct BatchWorkflow<'a> {
    registry: &'a ProviderRegistry,
    prefs: &'a dyn Preferences,
    selector: &'a dyn SelectionSurface,
    reporter: &'a dyn Reporter,
    strategy: UpdateStrategy,
}

impl<'a> BatchWorkflow<'a> {
    /// Create a workflow; the merge strategy is read from `prefs`
    pub fn new(
        registry: &'a ProviderRegistry,
        prefs: &'a dyn Preferences,
        selector: &'a dyn SelectionSurface,
        reporter: &'a dyn Reporter,
    ) -> Self {
        Self {
            registry,
            prefs,
            selector,
            reporter,
            strategy: UpdateStrategy::from_preferences(prefs),
        }
    }

    /// Override the merge strategy
    pub fn with_strategy(mut self, strategy: UpdateStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn strategy(&self) -> UpdateStrategy {
        self.strategy
    }

    /// Process every record in order until the batch ends or is aborted
    pub async fn run<R: TargetRecord>(&self, records: &mut [R]) -> BatchReport {
        let report = self.run_records(records).await;
        if !report.failed_titles.is_empty() {
            self.reporter.report_failures(&report.failed_titles);
        }
        report
    }

    /// Process one record; failures are announced as a single notice
    pub async fn run_single<R: TargetRecord>(&self, record: &mut R) -> BatchReport {
        let report = self.run_records(std::slice::from_mut(record)).await;
        match report.states.first() {
            Some(RecordState::FailedEmptyTitle) => {
                self.reporter.notify("", "Selected item has no title.")
            }
            Some(RecordState::FailedNoResults) => {
                let title = report.failed_titles.first().map(String::as_str).unwrap_or("");
                self.reporter.notify(title, "No results found.")
            }
            _ => {}
        }
        report
    }

    async fn run_records<R: TargetRecord>(&self, records: &mut [R]) -> BatchReport {
        let mut report = BatchReport::untouched(records.len());

        let configs = self.registry.enabled_configs(self.prefs);
        if configs.is_empty() {
            tracing::debug!("No metadata providers are enabled");
            self.reporter.notify("", "No metadata providers are enabled.");
            return report;
        }

        let mut state = BatchState::default();
        let total = records.len();

        for (index, record) in records.iter_mut().enumerate() {
            state.index = index;
            let outcome = self
                .process(record, index, total, &configs, &mut report.states)
                .await;

            match outcome {
                RecordState::FailedEmptyTitle => {
                    state.record_failure(format!("(untitled record #{})", index + 1))
                }
                RecordState::FailedNoResults => {
                    state.record_failure(record.get_field("title").trim().to_string())
                }
                RecordState::Aborted => state.aborted = true,
                _ => {}
            }

            if state.aborted {
                tracing::info!("Batch aborted at record {} of {}", state.index + 1, total);
                break;
            }
        }

        report.failed_titles = state.failures;
        report.aborted = state.aborted;
        report
    }

    async fn process<R: TargetRecord>(
        &self,
        record: &mut R,
        index: usize,
        total: usize,
        configs: &[ProviderConfig],
        states: &mut [RecordState],
    ) -> RecordState {
        let title = record.get_field("title").trim().to_string();
        if title.is_empty() {
            return transition(states, index, RecordState::FailedEmptyTitle);
        }

        transition(states, index, RecordState::Fetching);
        let results = aggregate(&title, configs, self.prefs).await;
        if results.is_empty() {
            return transition(states, index, RecordState::FailedNoResults);
        }

        transition(states, index, RecordState::AwaitingChoice);
        let context = SelectionContext {
            index,
            total,
            title: &title,
        };

        match self.selector.choose(&results, &context).await {
            Selection::Chosen(result) => {
                match reconcile(record, &result.metadata, self.strategy).await {
                    Ok(outcome) => {
                        tracing::info!(
                            "Updated \"{}\" with metadata from {} ({} fields changed)",
                            title,
                            result.provider_name,
                            outcome.changed_fields.len()
                        );
                        transition(states, index, RecordState::Applied)
                    }
                    Err(e) => {
                        tracing::warn!("Failed to save \"{}\": {}", title, e);
                        self.reporter
                            .notify(&title, &format!("Failed to save record: {}", e));
                        transition(states, index, RecordState::FailedSave)
                    }
                }
            }
            Selection::Skip => transition(states, index, RecordState::Skipped),
            Selection::Abort => transition(states, index, RecordState::Aborted),
        }
    }
}

fn transition(states: &mut [RecordState], index: usize, next: RecordState) -> RecordState {
    tracing::trace!("record {}: {:?} -> {:?}", index, states[index], next);
    states[index] = next;
    next
}
