//! Terminal rendering of workflow states
//!
//! Everything here returns strings so the layout can be tested without a
//! terminal. Styling comes from `console` and degrades to plain text when
//! colors are off.

use console::style;
use dermassist::client::AnalysisResult;
use dermassist::state::{Selection, WorkflowState};
use std::fmt::Write as _;

/// Shown once when the CLI starts
pub const DISCLAIMER: &str = "Medical disclaimer: This app provides educational information only \
and is not a medical diagnosis or treatment. If you have concerns, seek advice from a qualified \
healthcare professional.";

/// Shown while nothing is selected
pub const TIP: &str =
    "Tip: Good lighting and a steady close-up help the model give clearer results.";

/// Shown while there is no result yet
pub const RESULTS_PLACEHOLDER: &str = "Your analysis will appear here with the most likely \
condition, confidence, and care suggestions.";

/// Cells in the confidence bar
pub const BAR_WIDTH: usize = 20;

/// Renders the full view for one state
#[must_use]
pub fn render_state(state: &WorkflowState) -> String {
    let mut out = String::new();

    match state {
        WorkflowState::Empty => {
            let _ = writeln!(out, "{}", style(TIP).dim());
            let _ = writeln!(out, "{}", style(RESULTS_PLACEHOLDER).dim());
        }
        WorkflowState::Selected { selection } => {
            out.push_str(&render_selection(selection));
            let _ = writeln!(out, "{}", style(RESULTS_PLACEHOLDER).dim());
        }
        WorkflowState::Invalid { error } => {
            let _ = writeln!(out, "{}", style(TIP).dim());
            let _ = writeln!(out, "{}", style(error).red());
        }
        WorkflowState::Analyzing { selection, .. } => {
            out.push_str(&render_selection(selection));
            let _ = writeln!(out, "{}", style("Running analysis...").cyan());
        }
        WorkflowState::Succeeded { selection, result } => {
            out.push_str(&render_selection(selection));
            out.push_str(&render_result(result));
        }
        WorkflowState::Failed { selection, error } => {
            out.push_str(&render_selection(selection));
            let _ = writeln!(out, "{}", style(error).red());
        }
    }

    out
}

/// Filename, size and preview link of a selection
#[must_use]
pub fn render_selection(selection: &Selection) -> String {
    let file = selection.file();
    let mut out = format!(
        "{} {} ({})\n",
        style("Selected").green().bold(),
        style(&file.filename).bold(),
        format_size(file.size()),
    );

    if let Some(preview) = selection.preview() {
        let dims = preview
            .dimensions()
            .map(|(w, h)| format!(" {w}x{h}"))
            .unwrap_or_default();
        let _ = writeln!(out, "  {}{} {}", style("Preview").dim(), dims, style(preview.url()).cyan());
    }

    out
}

/// The result card: condition, confidence, metadata, description, suggestions
#[must_use]
pub fn render_result(result: &AnalysisResult) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "{}", style("MOST LIKELY CONDITION").dim());
    let _ = writeln!(out, "  {}", style(&result.condition).bold());
    let _ = writeln!(
        out,
        "{} {} {}%",
        style("Confidence").dim(),
        style(confidence_bar(result.confidence)).green(),
        result.confidence
    );
    let _ = writeln!(out, "  {}", style(result_meta(result)).dim());

    if !result.description.is_empty() {
        let _ = writeln!(out, "{}", result.description);
    }

    if !result.suggestions.is_empty() {
        let _ = writeln!(out, "{}", style("CARE SUGGESTIONS").dim());
        for (i, suggestion) in result.suggestions.iter().enumerate() {
            let _ = writeln!(out, "  {}. {suggestion}", i + 1);
        }
    }

    out
}

/// `~<size_kb> KB • <filename> • <latency_ms> ms`
#[must_use]
pub fn result_meta(result: &AnalysisResult) -> String {
    format!(
        "~{} KB • {} • {} ms",
        result.size_kb, result.filename, result.latency_ms
    )
}

/// A fixed-width bar filled in proportion to `confidence`, clamped to 0–100
#[must_use]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn confidence_bar(confidence: f64) -> String {
    let clamped = if confidence.is_nan() {
        0.0
    } else {
        confidence.clamp(0.0, 100.0)
    };
    let filled = ((clamped / 100.0) * BAR_WIDTH as f64).round() as usize;
    format!("{}{}", "█".repeat(filled), "░".repeat(BAR_WIDTH - filled))
}

/// Human-readable byte count
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn format_size(bytes: u64) -> String {
    const KIB: f64 = 1024.0;
    let bytes_f = bytes as f64;
    if bytes_f < KIB {
        format!("{bytes} B")
    } else if bytes_f < KIB * KIB {
        format!("{:.1} KB", bytes_f / KIB)
    } else {
        format!("{:.1} MB", bytes_f / (KIB * KIB))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result() -> AnalysisResult {
        AnalysisResult {
            condition: "Eczema".into(),
            confidence: 87.0,
            description: "Dry, itchy patches.".into(),
            suggestions: vec!["Moisturize".into(), "See a dermatologist".into()],
            filename: "skin.jpg".into(),
            size_kb: 2048.0,
            latency_ms: 340.5,
        }
    }

    #[test]
    fn test_confidence_bar_is_clamped() {
        assert_eq!(confidence_bar(0.0), "░".repeat(BAR_WIDTH));
        assert_eq!(confidence_bar(100.0), "█".repeat(BAR_WIDTH));
        assert_eq!(confidence_bar(250.0), "█".repeat(BAR_WIDTH));
        assert_eq!(confidence_bar(-3.0), "░".repeat(BAR_WIDTH));
        assert_eq!(confidence_bar(f64::NAN), "░".repeat(BAR_WIDTH));
        assert_eq!(confidence_bar(50.0).chars().filter(|c| *c == '█').count(), 10);
    }

    #[test]
    fn test_result_meta_line() {
        assert_eq!(result_meta(&result()), "~2048 KB • skin.jpg • 340.5 ms");
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(2048), "2.0 KB");
        assert_eq!(format_size(2 * 1024 * 1024), "2.0 MB");
    }

    #[test]
    fn test_render_result_lists_numbered_suggestions() {
        let text = console::strip_ansi_codes(&render_result(&result())).into_owned();
        assert!(text.contains("Eczema"));
        assert!(text.contains("87%"));
        assert!(text.contains("  1. Moisturize"));
        assert!(text.contains("  2. See a dermatologist"));
    }

    #[test]
    fn test_render_result_without_suggestions() {
        let mut bare = result();
        bare.suggestions.clear();
        let text = console::strip_ansi_codes(&render_result(&bare)).into_owned();
        assert!(!text.contains("CARE SUGGESTIONS"));
    }

    #[test]
    fn test_render_empty_shows_tip() {
        let text = console::strip_ansi_codes(&render_state(&WorkflowState::Empty)).into_owned();
        assert!(text.contains(TIP));
    }
}
