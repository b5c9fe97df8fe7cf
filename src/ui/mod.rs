//! Terminal UI: styled output, spinners, and the interactive selection and
//! reporting surfaces used by the CLI.

use async_trait::async_trait;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use owo_colors::OwoColorize;
use std::io::{IsTerminal, Write};
use std::time::Duration;

use crate::engine::{Reporter, Selection, SelectionContext, SelectionSurface};
use crate::models::SearchResult;

/// Check if stdout is a terminal.
pub fn is_terminal() -> bool {
    std::io::stdout().is_terminal()
}

/// Provider icons for different metadata providers.
pub fn provider_icon(provider: &str) -> &'static str {
    match provider.to_lowercase().as_str() {
        "dblp" => "📋",
        _ => "📄",
    }
}

/// Status icons for different operations.
pub fn status_icon(status: Status) -> &'static str {
    match status {
        Status::Success => "✓",
        Status::Error => "✗",
        Status::Warning => "⚠",
        Status::Info => "ℹ",
        Status::Skipped => "○",
        Status::Search => "🔍",
    }
}

/// Status types for colored output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Success,
    Error,
    Warning,
    Info,
    Skipped,
    Search,
}

/// Print a styled status line.
pub fn print_status(status: Status, msg: &str) {
    let icon = status_icon(status);
    match status {
        Status::Success => println!("{} {}", icon.green().bold(), msg),
        Status::Error => println!("{} {}", icon.red().bold(), msg),
        Status::Warning => println!("{} {}", icon.yellow().bold(), msg),
        Status::Info => println!("{} {}", icon.cyan().bold(), msg),
        Status::Skipped => println!("{} {}", icon.white().dimmed(), msg),
        Status::Search => println!("{} {}", icon.yellow(), msg),
    }
}

/// Print a section header.
pub fn print_section(title: &str) {
    println!();
    println!("{}", format!("━━━ {} ━━━", title).bold().cyan());
}

/// Truncate text to fit within the specified width using unicode-aware truncation.
pub fn truncate_with_ellipsis(text: &str, max_width: usize) -> String {
    if max_width <= 3 {
        return "...".to_string();
    }

    let total_width: usize = text
        .chars()
        .map(|c| unicode_width::UnicodeWidthChar::width(c).unwrap_or(1))
        .sum();

    if total_width <= max_width {
        return text.to_string();
    }

    let mut current_width = 0;
    let mut truncated = String::new();
    for c in text.chars() {
        let w = unicode_width::UnicodeWidthChar::width(c).unwrap_or(1);
        if current_width + w > max_width - 3 {
            break;
        }
        current_width += w;
        truncated.push(c);
    }

    format!("{}...", truncated)
}

/// Render provenance-tagged results as a numbered table.
pub fn results_table(results: &[SearchResult]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["#", "Title", "Creators", "Venue", "Year", "Source"]);

    for (i, result) in results.iter().enumerate() {
        let m = &result.metadata;
        table.add_row(vec![
            (i + 1).to_string(),
            truncate_with_ellipsis(&m.title, 70),
            truncate_with_ellipsis(&m.creator_summary(), 40),
            truncate_with_ellipsis(m.publication_title.as_deref().unwrap_or(""), 25),
            m.date.clone().unwrap_or_default(),
            format!("{} {}", provider_icon(&result.provider_key), result.provider_name),
        ]);
    }

    table
}

/// Spinner shown while providers are being queried.
pub struct Spinner {
    pb: indicatif::ProgressBar,
}

impl Spinner {
    /// Create a new spinner with the given message.
    pub fn new(msg: &str) -> Self {
        let pb = indicatif::ProgressBar::new_spinner();
        if let Ok(style) = indicatif::ProgressStyle::with_template("{spinner:.cyan} {msg}") {
            pb.set_style(style.tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ "));
        }
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));

        Self { pb }
    }

    /// Clear the spinner line.
    pub fn finish(&self) {
        self.pb.finish_and_clear();
    }
}

/// What a typed answer at the selection prompt means
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptAnswer {
    /// Zero-based result index
    Pick(usize),
    Skip,
    Abort,
}

/// Parse a prompt answer: a 1-based number, `s`/`skip`, or `a`/`abort`/`q`.
pub fn parse_answer(input: &str, count: usize) -> Option<PromptAnswer> {
    let input = input.trim().to_lowercase();
    match input.as_str() {
        "s" | "skip" => Some(PromptAnswer::Skip),
        "a" | "abort" | "q" | "quit" => Some(PromptAnswer::Abort),
        _ => input
            .parse::<usize>()
            .ok()
            .filter(|n| (1..=count).contains(n))
            .map(|n| PromptAnswer::Pick(n - 1)),
    }
}

/// Asks on stdin which result to apply.
#[derive(Debug, Default)]
pub struct PromptSelector;

#[async_trait]
impl SelectionSurface for PromptSelector {
    async fn choose(&self, results: &[SearchResult], context: &SelectionContext<'_>) -> Selection {
        print_section(&format!(
            "Record {}/{}: {}",
            context.index + 1,
            context.total,
            context.title
        ));
        println!("{}", results_table(results));

        loop {
            print!(
                "Choose 1-{}, {} to skip, {} to abort: ",
                results.len(),
                "s".yellow(),
                "a".red()
            );
            let _ = std::io::stdout().flush();

            let line = tokio::task::spawn_blocking(|| {
                let mut line = String::new();
                std::io::stdin().read_line(&mut line).map(|read| (read, line))
            })
            .await;

            let line = match line {
                Ok(Ok((read, line))) if read > 0 => line,
                // EOF or a broken stdin ends the batch
                _ => return Selection::Abort,
            };

            match parse_answer(&line, results.len()) {
                Some(PromptAnswer::Pick(i)) => return Selection::Chosen(results[i].clone()),
                Some(PromptAnswer::Skip) => return Selection::Skip,
                Some(PromptAnswer::Abort) => return Selection::Abort,
                None => print_status(Status::Warning, "Not a valid choice"),
            }
        }
    }
}

/// Non-interactive selection policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum AutoPolicy {
    /// Apply the first result
    First,
    /// Skip every record
    Skip,
}

/// Applies a fixed policy without asking.
#[derive(Debug, Clone, Copy)]
pub struct AutoSelector {
    policy: AutoPolicy,
}

impl AutoSelector {
    pub fn new(policy: AutoPolicy) -> Self {
        Self { policy }
    }
}

#[async_trait]
impl SelectionSurface for AutoSelector {
    async fn choose(&self, results: &[SearchResult], context: &SelectionContext<'_>) -> Selection {
        match (self.policy, results.first()) {
            (AutoPolicy::First, Some(first)) => {
                tracing::debug!(
                    "Auto-selecting \"{}\" for record {}",
                    first.metadata.title,
                    context.index + 1
                );
                Selection::Chosen(first.clone())
            }
            _ => Selection::Skip,
        }
    }
}

/// Prints notices and the failure summary to the terminal.
#[derive(Debug, Default)]
pub struct ConsoleReporter {
    quiet: bool,
}

impl ConsoleReporter {
    /// A quiet reporter prints nothing
    pub fn new(quiet: bool) -> Self {
        Self { quiet }
    }

    /// Text of a notice, or `None` when quiet
    pub fn notice_line(&self, title: &str, message: &str) -> Option<String> {
        if self.quiet {
            return None;
        }
        if title.is_empty() {
            Some(message.to_string())
        } else {
            Some(format!("{}: {}", title.bold(), message))
        }
    }

    /// Whether the failure summary is printed
    pub fn shows_failures(&self) -> bool {
        !self.quiet
    }
}

impl Reporter for ConsoleReporter {
    fn notify(&self, title: &str, message: &str) {
        if let Some(line) = self.notice_line(title, message) {
            print_status(Status::Warning, &line);
        }
    }

    fn report_failures(&self, titles: &[String]) {
        if !self.shows_failures() {
            return;
        }
        print_section("No metadata found");
        for title in titles {
            print_status(Status::Error, title);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CanonicalMetadata, Creator, ItemType, MetadataBuilder};

    fn result(title: &str) -> SearchResult {
        SearchResult::new("dblp", "DBLP", CanonicalMetadata::new(ItemType::Book, title))
    }

    #[test]
    fn test_provider_icon() {
        assert_eq!(provider_icon("dblp"), "📋");
        assert_eq!(provider_icon("DBLP"), "📋");
        assert_eq!(provider_icon("unknown"), "📄");
    }

    #[test]
    fn test_status_icon() {
        assert_eq!(status_icon(Status::Success), "✓");
        assert_eq!(status_icon(Status::Error), "✗");
        assert_eq!(status_icon(Status::Search), "🔍");
    }

    #[test]
    fn test_quiet_reporter_prints_nothing() {
        let quiet = ConsoleReporter::new(true);
        assert_eq!(quiet.notice_line("", "No results found."), None);
        assert!(!quiet.shows_failures());
        quiet.notify("Some Title", "No results found.");
        quiet.report_failures(&["Some Title".to_string()]);

        let loud = ConsoleReporter::new(false);
        assert_eq!(
            loud.notice_line("", "No metadata providers are enabled."),
            Some("No metadata providers are enabled.".to_string())
        );
        assert!(loud
            .notice_line("Deep Learning", "No results found.")
            .is_some_and(|line| line.contains("Deep Learning") && line.contains("No results found.")));
        assert!(loud.shows_failures());
    }

    #[test]
    fn test_truncate_with_ellipsis() {
        assert_eq!(truncate_with_ellipsis("Hello", 10), "Hello");
        assert_eq!(truncate_with_ellipsis("Hello World", 8), "Hello...");
        assert_eq!(truncate_with_ellipsis("", 10), "");
        assert_eq!(truncate_with_ellipsis("Hello", 3), "...");
    }

    #[test]
    fn test_parse_answer() {
        assert_eq!(parse_answer("1\n", 3), Some(PromptAnswer::Pick(0)));
        assert_eq!(parse_answer(" 3 ", 3), Some(PromptAnswer::Pick(2)));
        assert_eq!(parse_answer("4", 3), None);
        assert_eq!(parse_answer("0", 3), None);
        assert_eq!(parse_answer("S", 3), Some(PromptAnswer::Skip));
        assert_eq!(parse_answer("abort", 3), Some(PromptAnswer::Abort));
        assert_eq!(parse_answer("maybe", 3), None);
    }

    #[test]
    fn test_results_table_lists_every_result() {
        let mut first = result("Deep Learning");
        first.metadata = MetadataBuilder::new(ItemType::Book, "Deep Learning")
            .creator(Creator::author("Jane", "Doe"))
            .date(Some("2021".to_string()))
            .build();

        let rendered = results_table(&[first, result("Other")]).to_string();
        assert!(rendered.contains("Deep Learning"));
        assert!(rendered.contains("Doe, Jane"));
        assert!(rendered.contains("Other"));
        assert!(rendered.contains("DBLP"));
    }

    #[tokio::test]
    async fn test_auto_selector() {
        let results = vec![result("A"), result("B")];
        let context = SelectionContext {
            index: 0,
            total: 1,
            title: "A",
        };

        let first = AutoSelector::new(AutoPolicy::First)
            .choose(&results, &context)
            .await;
        assert_eq!(first, Selection::Chosen(results[0].clone()));

        let skip = AutoSelector::new(AutoPolicy::Skip)
            .choose(&results, &context)
            .await;
        assert_eq!(skip, Selection::Skip);
    }
}
