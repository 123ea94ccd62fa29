//! Prometheus text exposition of view data.
//!
//! Distribution views render as histograms: each boundary becomes an `le`
//! bucket holding the cumulative count of values below it, plus `+Inf`.
//! Buckets are half-open `[lower, upper)`, so a value equal to a boundary is
//! counted from the next `le` up, not under its own boundary as Prometheus
//! `<=` would.
//! Count views render as counters. View names are sanitized into metric names.

use std::fmt::Write;

use spanstats_core::stats::{AggregationData, ViewData};

/// Helper to escape label values.
fn escape_label(v: &str) -> String {
    v.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n")
}

/// `dbappmetrics/read_latency` -> `dbappmetrics_read_latency`.
pub fn metric_name(view: &str) -> String {
    let mut out: String = view
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == ':' { c } else { '_' })
        .collect();
    if out.starts_with(|c: char| c.is_ascii_digit()) {
        out.insert(0, '_');
    }
    out
}

fn label_str(keys: &[String], values: &[String]) -> String {
    keys.iter()
        .zip(values.iter())
        .map(|(k, v)| format!("{}=\"{}\"", metric_name(k), escape_label(v)))
        .collect::<Vec<_>>()
        .join(",")
}

fn braces(labels: &str) -> String {
    if labels.is_empty() {
        String::new()
    } else {
        format!("{{{labels}}}")
    }
}

/// Render one view.
fn render_view(view: &ViewData, out: &mut String) {
    let name = metric_name(&view.view);
    let keys: Vec<String> = view.tag_keys.iter().map(|k| k.as_str().to_string()).collect();

    let _ = writeln!(out, "# HELP {} {}", name, view.description.replace('\n', " "));
    match view.aggregation {
        "distribution" => {
            let _ = writeln!(out, "# TYPE {} histogram", name);
        }
        _ => {
            let _ = writeln!(out, "# TYPE {} counter", name);
        }
    }

    for row in &view.rows {
        let labels = label_str(&keys, &row.tag_values);
        match &row.data {
            AggregationData::Count { count } => {
                let _ = writeln!(out, "{}{} {}", name, braces(&labels), count);
            }
            AggregationData::Distribution(d) => {
                let prefix = if labels.is_empty() {
                    String::new()
                } else {
                    format!("{labels},")
                };
                let mut cumulative = 0u64;
                for (i, le) in d.bucket_boundaries.iter().enumerate() {
                    cumulative += d.bucket_counts.get(i).copied().unwrap_or(0);
                    let _ = writeln!(out, "{}_bucket{{{}le=\"{}\"}} {}", name, prefix, le, cumulative);
                }
                let _ = writeln!(out, "{}_bucket{{{}le=\"+Inf\"}} {}", name, prefix, d.count);
                let _ = writeln!(out, "{}_sum{} {}", name, braces(&labels), d.sum);
                let _ = writeln!(out, "{}_count{} {}", name, braces(&labels), d.count);
            }
        }
    }
}

/// Render every view plus any extra gauge lines provided by callers.
pub fn render(views: &[ViewData], extra: &[(&str, u64)]) -> String {
    let mut out = String::new();
    for v in views {
        render_view(v, &mut out);
    }
    for (k, v) in extra {
        let _ = writeln!(out, "{} {}", k, v);
    }
    out
}
