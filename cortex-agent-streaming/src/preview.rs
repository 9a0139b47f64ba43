//! Live progress previews.
//!
//! While a stream is in flight the caller can show the latest planning steps
//! and a short excerpt of the current thinking. Previews must stay under a
//! display budget, so long content is cut at sentence or word boundaries
//! with [`smart_truncate`].

use serde::{Deserialize, Serialize};

use crate::aggregator::AggregatedResult;

/// Suffix appended to truncated text.
pub const ELLIPSIS: &str = "...";

const BULLET: &str = "• ";

/// Budgets for progress previews.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewConfig {
    /// Status lines shown normally.
    pub max_status_lines: usize,
    /// Status lines shown once the display budget is exceeded.
    pub reduced_status_lines: usize,
    /// Thinking excerpt length, in chars.
    pub thinking_budget: usize,
    /// Thinking excerpt length in reduced mode.
    pub reduced_thinking_budget: usize,
    /// Maximum rendered preview length, header included.
    pub display_budget: usize,
    /// Header shown above the preview lines.
    pub header: String,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            max_status_lines: 8,
            reduced_status_lines: 4,
            thinking_budget: 300,
            reduced_thinking_budget: 200,
            display_budget: 2900,
            header: "Thinking...".to_string(),
        }
    }
}

impl PreviewConfig {
    /// Create the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the header.
    #[must_use]
    pub fn with_header(mut self, header: impl Into<String>) -> Self {
        self.header = header.into();
        self
    }

    /// Set the display budget.
    #[must_use]
    pub fn with_display_budget(mut self, budget: usize) -> Self {
        self.display_budget = budget;
        self
    }

    /// Set the normal thinking excerpt budget.
    #[must_use]
    pub fn with_thinking_budget(mut self, budget: usize) -> Self {
        self.thinking_budget = budget;
        self
    }
}

/// Truncate `text` to at most `max_len` chars, preferring to cut after a
/// sentence, then after a word, and only then mid-word.
///
/// Returns `text` unchanged when it already fits; otherwise the result ends
/// with [`ELLIPSIS`].
#[must_use]
pub fn smart_truncate(text: &str, max_len: usize) -> String {
    if char_len(text) <= max_len {
        return text.to_string();
    }

    let suffix_len = char_len(ELLIPSIS);
    if max_len < suffix_len {
        return text.chars().take(max_len).collect();
    }

    let sentences: Vec<&str> = text.split(". ").collect();
    if sentences.len() > 1 {
        let kept = fill(sentences.into_iter(), ". ", max_len - suffix_len);
        if !kept.trim().is_empty() {
            return format!("{}{ELLIPSIS}", kept.trim());
        }
    }

    let kept = fill(text.split_whitespace(), " ", max_len - suffix_len);
    if !kept.trim().is_empty() {
        return format!("{}{ELLIPSIS}", kept.trim());
    }

    let mut cut: String = text.chars().take(max_len - suffix_len).collect();
    cut.push_str(ELLIPSIS);
    cut
}

/// Greedily join `pieces`, each followed by `sep`, while the total fits.
fn fill<'a>(pieces: impl Iterator<Item = &'a str>, sep: &str, budget: usize) -> String {
    let mut kept = String::new();
    let mut kept_len = 0;
    for piece in pieces {
        let next = char_len(piece) + char_len(sep);
        if kept_len + next > budget {
            break;
        }
        kept.push_str(piece);
        kept.push_str(sep);
        kept_len += next;
    }
    kept
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// A snapshot of in-flight progress.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preview {
    /// Most recent status messages, oldest first.
    pub status_lines: Vec<String>,
    /// Excerpt of the latest thinking.
    pub thinking_excerpt: Option<String>,
    /// Whether the reduced budgets were applied.
    pub reduced: bool,
}

impl Preview {
    /// Check if there is nothing to show.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.status_lines.is_empty() && self.thinking_excerpt.is_none()
    }

    /// Bullet lines, statuses first.
    pub fn lines(&self) -> impl Iterator<Item = String> + '_ {
        self.status_lines
            .iter()
            .chain(self.thinking_excerpt.iter())
            .map(|line| format!("{BULLET}{line}"))
    }

    /// Render under `header`.
    #[must_use]
    pub fn render(&self, header: &str) -> String {
        if self.is_empty() {
            return format!("{header} Processing...");
        }
        let body: Vec<String> = self.lines().collect();
        format!("{header}\n\n{}", body.join("\n"))
    }
}

/// Builds budgeted previews from an [`AggregatedResult`].
#[derive(Debug, Clone, Default)]
pub struct ProgressNotifier {
    config: PreviewConfig,
}

impl ProgressNotifier {
    /// Create a notifier with the given budgets.
    #[must_use]
    pub fn new(config: PreviewConfig) -> Self {
        Self { config }
    }

    /// Get the configuration.
    #[must_use]
    pub fn config(&self) -> &PreviewConfig {
        &self.config
    }

    /// Build the preview for the current state.
    #[must_use]
    pub fn preview(&self, result: &AggregatedResult) -> Preview {
        let config = &self.config;
        let full = Self::snapshot(result, config.max_status_lines, config.thinking_budget);
        if self.fits(&full) {
            return full;
        }

        let mut reduced = Self::snapshot(
            result,
            config.reduced_status_lines,
            config.reduced_thinking_budget,
        );
        reduced.reduced = true;
        if !self.fits(&reduced) {
            self.squeeze_statuses(&mut reduced);
        }
        reduced
    }

    /// Build and render the preview for the current state.
    #[must_use]
    pub fn render(&self, result: &AggregatedResult) -> String {
        self.preview(result).render(&self.config.header)
    }

    fn snapshot(result: &AggregatedResult, max_status: usize, thinking_budget: usize) -> Preview {
        let skip = result.status_messages.len().saturating_sub(max_status);
        Preview {
            status_lines: result.status_messages[skip..].to_vec(),
            thinking_excerpt: result
                .thinking
                .latest()
                .map(|(_, text)| text.trim())
                .filter(|text| !text.is_empty())
                .map(|text| smart_truncate(text, thinking_budget)),
            reduced: false,
        }
    }

    fn fits(&self, preview: &Preview) -> bool {
        char_len(&preview.render(&self.config.header)) <= self.config.display_budget
    }

    /// Give every status line an equal share of what the thinking excerpt
    /// leaves of the budget.
    fn squeeze_statuses(&self, preview: &mut Preview) {
        if preview.status_lines.is_empty() {
            return;
        }
        let fixed = char_len(&Preview {
            status_lines: Vec::new(),
            thinking_excerpt: preview.thinking_excerpt.clone(),
            reduced: true,
        }
        .render(&self.config.header));
        let count = preview.status_lines.len();
        let per_line_overhead = char_len(BULLET) + 1;
        let available = self.config.display_budget.saturating_sub(fixed + 2);
        let share = (available / count).saturating_sub(per_line_overhead);

        for line in &mut preview.status_lines {
            *line = smart_truncate(line, share);
        }
    }
}
