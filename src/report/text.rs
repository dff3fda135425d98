use crate::model::state::ChatResult;
use crate::report::ReportSummary;

pub fn render_answer_text(result: &ChatResult) -> String {
    let mut out = String::new();
    out.push_str(result.answer.trim_end());
    out.push_str("\n\n");

    out.push_str(&format!(
        "Confidence: {}/100 ({})\n",
        result.confidence, result.confidence_explanation
    ));
    if let Some(metric) = &result.metric_key {
        out.push_str(&format!("Metric: {metric}\n"));
    }
    if !result.citations.is_empty() {
        out.push_str(&format!("Sources: {}\n", result.citations.join(", ")));
    }
    if !result.notes.is_empty() {
        out.push_str("Notes:\n");
        for note in &result.notes {
            out.push_str(&format!("  - {note}\n"));
        }
    }
    out
}

pub fn render_summary_text(summary: &ReportSummary) -> String {
    let mut out = String::new();
    out.push_str(&format!("QC report for run {}\n", summary.run_id));
    out.push_str(&format!(
        "Samples: {}  Metrics: {}  Panels: {}\n\n",
        summary.samples.len(),
        summary.metric_count,
        summary.panel_count
    ));

    if summary.samples.is_empty() {
        out.push_str("No per-sample data found.\n");
        return out;
    }

    out.push_str("Samples:\n");
    for sample in &summary.samples {
        match summary.status_counts.get(sample) {
            Some(c) => out.push_str(&format!(
                "  {sample}  pass={} warn={} fail={}\n",
                c.pass, c.warn, c.fail
            )),
            None => out.push_str(&format!("  {sample}\n")),
        }
    }

    if !summary.metric_keys.is_empty() {
        out.push_str("\nMetric keys:\n");
        for key in &summary.metric_keys {
            out.push_str(&format!("  {key}\n"));
        }
    }
    out
}
