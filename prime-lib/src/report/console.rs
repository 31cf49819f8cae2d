use super::Report;
use super::common::{format_bound, format_metric_value, table_lines};
use crate::Result;
use crate::engine::SourceStatus;
use crate::metrics::{MetricOutcome, MetricResult, MetricValue};
use core::fmt::Write;
use owo_colors::OwoColorize;

pub fn generate<W: Write>(report: &Report, use_colors: bool, writer: &mut W) -> Result<()> {
    let heading = |text: &str| if use_colors { text.bold().to_string() } else { text.to_string() };

    writeln!(writer, "{}", heading("Activity report"))?;
    let window = report.window();
    writeln!(writer, "  Window    : {} .. {}", format_bound(window.since), format_bound(window.until))?;
    writeln!(writer, "  Generated : {}", format_bound(Some(report.generated_at())))?;

    let kinds = report.kinds_present().iter().map(ToString::to_string).collect::<Vec<_>>().join(", ");
    if kinds.is_empty() {
        writeln!(writer, "  Events    : {}", report.event_count())?;
    } else {
        writeln!(writer, "  Events    : {} ({kinds})", report.event_count())?;
    }

    writeln!(writer)?;
    writeln!(writer, "{}", heading("Sources"))?;
    if report.sources().is_empty() {
        writeln!(writer, "  none configured")?;
    }

    for source in report.sources() {
        let attempts = if source.attempts == 1 {
            "1 attempt".to_string()
        } else {
            format!("{} attempts", source.attempts)
        };

        match &source.status {
            SourceStatus::Succeeded => {
                let mark = if use_colors { "✔".green().to_string() } else { "✔".to_string() };
                writeln!(
                    writer,
                    "  {mark} {} ({}): {} events, {} rejected, {attempts}",
                    source.name, source.family, source.events_accepted, source.events_rejected
                )?;
            }
            SourceStatus::Failed { reason } => {
                let mark = if use_colors { "🗙".red().to_string() } else { "🗙".to_string() };
                writeln!(
                    writer,
                    "  {mark} {} ({}): failed after {attempts}, kept {} events: {reason}",
                    source.name, source.family, source.events_accepted
                )?;
            }
        }
    }

    writeln!(writer)?;
    writeln!(writer, "{}", heading("Metrics"))?;
    if report.metrics().next().is_none() {
        writeln!(writer, "  none configured")?;
    }

    for metric in report.metrics() {
        write_metric(writer, metric, use_colors)?;
    }

    Ok(())
}

fn write_metric<W: Write>(writer: &mut W, metric: &MetricResult, use_colors: bool) -> Result<()> {
    match &metric.outcome {
        MetricOutcome::Computed { value, .. } => match value {
            MetricValue::Map(map) => {
                writeln!(writer, "  {}", metric.name)?;
                let width = map.keys().map(|k| k.len()).max().unwrap_or(0);
                for (key, value) in map {
                    writeln!(writer, "      {key:<width$} : {}", format_metric_value(value))?;
                }
            }
            MetricValue::Table(table) => {
                writeln!(writer, "  {}", metric.name)?;
                if table.rows.is_empty() {
                    writeln!(writer, "      (no rows)")?;
                } else {
                    for line in table_lines(table) {
                        writeln!(writer, "      {line}")?;
                    }
                }
            }
            scalar => writeln!(writer, "  {} : {}", metric.name, format_metric_value(scalar))?,
        },

        MetricOutcome::Skipped(warning) => {
            let kinds = warning.missing_kinds.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ");
            let text = format!("skipped, no {kinds} events");
            let text = if use_colors { text.yellow().to_string() } else { text };
            writeln!(writer, "  {} : {text}", metric.name)?;
        }

        MetricOutcome::Failed(error) => {
            let text = format!("failed: {error}");
            let text = if use_colors { text.red().to_string() } else { text };
            writeln!(writer, "  {} : {text}", metric.name)?;
        }
    }

    Ok(())
}
