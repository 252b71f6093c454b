use crate::engine::{ScoreReport, SourceResult, SourceStatus};
use crate::mapping::UserMapping;
use crate::scorer::{Comparison, EntryOutcome};
use colored::Colorize;
use serde_json::{Map, Value, json};

const RULE_WIDTH: usize = 60;

#[derive(Debug, Clone, Copy)]
pub struct RenderOptions {
    pub color: bool,
    pub verbose: bool,
    pub precision: usize,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            color: false,
            verbose: false,
            precision: 3,
        }
    }
}

fn heading(text: &str, color: bool) -> String {
    if color {
        text.bold().cyan().to_string()
    } else {
        text.to_string()
    }
}

fn format_score(score: f64, precision: usize) -> String {
    let percent_precision = precision.saturating_sub(2);
    format!(
        "{:.p$} ({:.q$}%)",
        score,
        score * 100.0,
        p = precision,
        q = percent_precision
    )
}

fn user_summary(user: &UserMapping) -> String {
    user.iter()
        .map(|(label, color)| format!("{}={}", label, color))
        .collect::<Vec<_>>()
        .join(", ")
}

/// One line per user entry describing how it matched.
pub fn render_entries(comparison: &Comparison, options: RenderOptions, out: &mut String) {
    for entry in &comparison.entries {
        let line = match &entry.outcome {
            EntryOutcome::Exact => {
                let mark = if options.color {
                    "✓".green().to_string()
                } else {
                    "✓".to_string()
                };
                format!("{} {}: {} - EXACT MATCH", mark, entry.label, entry.color)
            }
            EntryOutcome::Partial {
                reference_color,
                similarity,
            } => {
                let mark = if options.color {
                    "✗".yellow().to_string()
                } else {
                    "✗".to_string()
                };
                format!(
                    "{} {}: {} vs {} - Color similarity: {:.p$}",
                    mark,
                    entry.label,
                    entry.color,
                    reference_color,
                    similarity,
                    p = options.precision
                )
            }
            EntryOutcome::Missing => {
                let mark = if options.color {
                    "?".red().to_string()
                } else {
                    "?".to_string()
                };
                format!("{} {}: {} - NOT FOUND", mark, entry.label, entry.color)
            }
        };
        out.push_str("\n    ");
        out.push_str(&line);
    }
}

fn render_source(result: &SourceResult, options: RenderOptions, out: &mut String) {
    out.push_str(&format!("\n\nProcessing: {}", result.identifier));
    match &result.status {
        SourceStatus::Unusable(reason) => {
            let note = format!("{} - {}", format_score(0.0, options.precision), reason);
            out.push_str("\n  Score: ");
            if options.color {
                out.push_str(&note.red().to_string());
            } else {
                out.push_str(&note);
            }
        }
        SourceStatus::Scored => {
            out.push_str("\n  Score: ");
            out.push_str(&format_score(result.score(), options.precision));
            let labels: Vec<&str> = result.reference.colors.labels().collect();
            out.push_str(&format!("\n  Reference objects: {}", labels.join(", ")));
            out.push_str(&format!(
                "\n  Reference colors: {}",
                result.reference.colors.distinct_colors().join(", ")
            ));
            render_entries(&result.comparison, options, out);
        }
    }
}

/// Human readable report for a directory scoring run.
pub fn render_human(report: &ScoreReport, user: &UserMapping, options: RenderOptions) -> String {
    let mut out = String::new();

    if options.verbose {
        out.push_str(&format!("Found {} reference file(s)", report.results.len()));
        out.push_str(&format!("\nUser mapping: {}", user_summary(user)));
        out.push('\n');
        out.push_str(&"=".repeat(RULE_WIDTH));
        for result in &report.results {
            render_source(result, options, &mut out);
        }
        out.push_str("\n\n");
    }

    out.push_str(&heading("Similarity scores:", options.color));
    if report.is_empty() {
        out.push_str(" none");
    }
    for (identifier, score) in report.scores() {
        out.push_str(&format!(
            "\n  {}: {}",
            identifier,
            format_score(score, options.precision)
        ));
    }
    if let Some(best) = report.best() {
        out.push_str(&format!(
            "\n{} {}",
            heading("Best match:", options.color),
            best.identifier
        ));
    }
    out
}

/// Human readable report for a single reference comparison.
pub fn render_comparison(comparison: &Comparison, options: RenderOptions) -> String {
    let mut out = heading("Score:", options.color);
    out.push(' ');
    out.push_str(&format_score(comparison.score, options.precision));
    render_entries(comparison, options, &mut out);
    if options.verbose {
        out.push_str(&format!(
            "\n  Reverse bonuses: {} ({:.p$} / {:.p$})",
            comparison.reverse_bonuses,
            comparison.numerator,
            comparison.denominator,
            p = options.precision
        ));
    }
    out
}

fn user_json(user: &UserMapping) -> Value {
    let mut map = Map::new();
    for (label, color) in user.iter() {
        map.insert(label.to_string(), Value::String(color.to_string()));
    }
    Value::Object(map)
}

fn source_json(result: &SourceResult) -> Value {
    let reference: Map<String, Value> = result
        .reference
        .colors
        .iter()
        .map(|(label, color)| (label.to_string(), Value::String(color.to_string())))
        .collect();
    let rgb: Map<String, Value> = result
        .reference
        .rgb
        .iter()
        .map(|(label, rgb)| (label.clone(), json!(rgb)))
        .collect();
    let (status, reason) = match &result.status {
        SourceStatus::Scored => ("scored", Value::Null),
        SourceStatus::Unusable(reason) => ("unusable", Value::String(reason.clone())),
    };
    json!({
        "identifier": result.identifier,
        "status": status,
        "reason": reason,
        "score": result.score(),
        "reference": reference,
        "rgb": rgb,
        "comparison": result.comparison,
    })
}

/// Machine readable report; `details` is included when verbose.
pub fn report_json(report: &ScoreReport, user: &UserMapping, verbose: bool) -> Value {
    let mut v = json!({
        "user": user_json(user),
        "scores": report.scores(),
        "best": report.best().map(|b| b.identifier.clone()),
    });
    if verbose && let Value::Object(map) = &mut v {
        let details: Vec<Value> = report.results.iter().map(source_json).collect();
        map.insert("details".to_string(), Value::Array(details));
    }
    v
}
