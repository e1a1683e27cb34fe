//! Replay command implementation.

use postfeed_testkit::{Scenario, ScenarioReport, ViewSnapshot};
use std::path::Path;

/// Runs the replay command.
pub fn run(file: &Path, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let scenario = Scenario::from_file(file)?;
    let report = scenario.run()?;

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&report)?),
        _ => print!("{}", render_text(&report)),
    }
    Ok(())
}

/// Renders a report for the terminal.
pub fn render_text(report: &ScenarioReport) -> String {
    let mut out = String::new();
    if !report.description.is_empty() {
        out.push_str(&format!("Scenario: {}\n", report.description));
    }
    out.push_str(&format!("initial load -> {}\n", view_line(&report.initial)));

    for step in &report.steps {
        out.push_str(&format!("#{} {}: {}", step.index, step.op, step.outcome));
        if let Some(error) = &step.error {
            out.push_str(&format!(" ({})", error));
        }
        if step.events > 0 {
            out.push_str(&format!(", {} event(s)", step.events));
        }
        out.push_str(&format!("\n    -> {}\n", view_line(&step.view)));
    }

    let stats = &report.stats;
    out.push_str(&format!(
        "pages loaded: {}, events applied: {}, ignored: {}, reloads: {}, submissions: {}, failures: {}\n",
        stats.pages_loaded,
        stats.events_applied,
        stats.events_ignored,
        stats.reloads_triggered,
        stats.submissions,
        stats.failures
    ));
    out
}

fn view_line(view: &ViewSnapshot) -> String {
    let mut line = format!(
        "page {}/{} total {} [{}]",
        view.page,
        view.last_page,
        view.total,
        view.ids().join(", ")
    );
    if let Some(error) = &view.page_error {
        line.push_str(&format!(" page error: {}", error));
    }
    if let Some(notice) = &view.notice {
        line.push_str(&format!(" notice: {}", notice));
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use postfeed_testkit::CREATE_THEN_DELETE;

    #[test]
    fn renders_walkthrough() {
        let report = Scenario::from_json(CREATE_THEN_DELETE).unwrap().run().unwrap();
        let text = render_text(&report);

        assert!(text.contains("initial load -> page 1/1 total 2 [2, 1]"));
        assert!(text.contains("#0 remote_create: created 3, 1 event(s)"));
        assert!(text.contains("-> page 1/2 total 3 [3, 2, 1]"));
        assert!(text.contains("#1 remote_delete: deleted 1, 1 event(s)"));
        assert!(text.ends_with("submissions: 0, failures: 0\n"));
    }
}
