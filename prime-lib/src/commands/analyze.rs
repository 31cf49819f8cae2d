use super::Host;
use super::common::{ColorMode, LogLevel, init_logging};
use super::config::Config;
use crate::Result;
use crate::engine::run_analysis;
use crate::metrics::Metric;
use crate::report::{Report, generate_console, generate_json};
use crate::sources::{Source, SourceFamily, SourceSpec};
use camino::{Utf8Path, Utf8PathBuf};
use chrono::{DateTime, NaiveDate, Utc};
use clap::Parser;
use compact_str::format_compact;
use core::time::Duration;
use ohno::{IntoAppError, bail};
use std::fs;
use std::io::Write;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

const LOG_TARGET: &str = "   analyze";

#[derive(Parser, Debug)]
pub struct AnalyzeArgs {
    /// Path to configuration file (default is `prime.toml`)
    #[arg(long, short = 'c', value_name = "PATH")]
    pub config: Option<Utf8PathBuf>,

    /// Only analyze activity at or after this date (YYYY-MM-DD or RFC 3339)
    #[arg(long, value_name = "DATE", value_parser = parse_since)]
    pub since: Option<DateTime<Utc>>,

    /// Only analyze activity at or before this date (YYYY-MM-DD or RFC 3339)
    #[arg(long, value_name = "DATE", value_parser = parse_until)]
    pub until: Option<DateTime<Utc>>,

    /// Local git repository to mine commits from
    #[arg(long = "git", value_name = "PATH", help_heading = "Sources")]
    pub git: Vec<Utf8PathBuf>,

    /// GitHub repository to mine issues from
    #[arg(long, value_name = "OWNER/NAME", help_heading = "Sources")]
    pub github_issues: Vec<String>,

    /// GitHub repository to mine pull requests from
    #[arg(long, value_name = "OWNER/NAME", help_heading = "Sources")]
    pub github_pulls: Vec<String>,

    /// JSON export of events, tagged with the family of system that produced it
    #[arg(long, value_name = "FAMILY=PATH", value_parser = parse_events_file, help_heading = "Sources")]
    pub events_file: Vec<(SourceFamily, Utf8PathBuf)>,

    /// Base URL of the GitHub API, for GitHub Enterprise installations
    #[arg(long, value_name = "URL", help_heading = "Sources")]
    pub github_api_url: Option<String>,

    /// GitHub personal access token
    #[arg(long, value_name = "TOKEN", env = "GITHUB_TOKEN", hide_env_values = true, help_heading = "Sources")]
    pub github_token: Option<String>,

    /// Control when to use colored output
    #[arg(long, value_name = "WHEN", default_value = "auto")]
    pub color: ColorMode,

    /// Set the logging level for diagnostic output
    #[arg(long, value_name = "LEVEL", default_value = "none")]
    pub log_level: LogLevel,

    /// Output the report to a JSON file
    #[arg(long, value_name = "PATH", help_heading = "Report Output")]
    pub json: Option<Utf8PathBuf>,

    /// Output the report to the console. If omitted, console output is shown only when no JSON report is generated.
    #[arg(long, help_heading = "Report Output")]
    pub console: bool,

    /// Exit with an error when a source failed or a metric was skipped or failed
    #[arg(long)]
    pub error_if_incomplete: bool,
}

fn parse_timestamp(s: &str, end_of_day: bool) -> Result<DateTime<Utc>, String> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Ok(ts.with_timezone(&Utc));
    }

    let date = NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|e| format!("'{s}' is neither a YYYY-MM-DD date nor an RFC 3339 timestamp: {e}"))?;

    let ts = if end_of_day {
        date.and_hms_nano_opt(23, 59, 59, 999_999_999)
    } else {
        date.and_hms_opt(0, 0, 0)
    };

    ts.map(|t| t.and_utc()).ok_or_else(|| format!("'{s}' is out of range"))
}

fn parse_since(s: &str) -> Result<DateTime<Utc>, String> {
    parse_timestamp(s, false)
}

// a bare date includes the whole day
fn parse_until(s: &str) -> Result<DateTime<Utc>, String> {
    parse_timestamp(s, true)
}

fn parse_events_file(s: &str) -> Result<(SourceFamily, Utf8PathBuf), String> {
    let (family, path) = s
        .split_once('=')
        .ok_or_else(|| format!("'{s}' must be in the form FAMILY=PATH"))?;

    let family = family
        .parse::<SourceFamily>()
        .map_err(|e| format!("unknown source family '{family}': {e}"))?;

    if path.is_empty() {
        return Err(format!("'{s}' is missing a path"));
    }

    Ok((family, Utf8PathBuf::from(path)))
}

/// Folds the sources and window given on the command line into the configuration.
fn apply_args(config: &mut Config, args: &AnalyzeArgs) {
    if args.since.is_some() {
        config.since = args.since;
    }

    if args.until.is_some() {
        config.until = args.until;
    }

    config.sources.extend(args.git.iter().map(|path| SourceSpec::Git {
        name: None,
        path: path.clone(),
    }));

    config.sources.extend(args.github_issues.iter().map(|repo| SourceSpec::GithubIssues {
        name: None,
        repo: repo.as_str().into(),
        base_url: None,
    }));

    config.sources.extend(args.github_pulls.iter().map(|repo| SourceSpec::GithubPulls {
        name: None,
        repo: repo.as_str().into(),
        base_url: None,
    }));

    config.sources.extend(args.events_file.iter().map(|(family, path)| SourceSpec::EventsFile {
        name: format_compact!("file:{path}"),
        family: *family,
        path: path.clone(),
    }));

    if let Some(url) = &args.github_api_url {
        for source in &mut config.sources {
            if let SourceSpec::GithubIssues { base_url, .. } | SourceSpec::GithubPulls { base_url, .. } = source
                && base_url.is_none()
            {
                *base_url = Some(url.clone());
            }
        }
    }
}

/// Cancels the run on Ctrl-C or once the configured timeout elapses.
fn spawn_cancellation_watcher(cancel: CancellationToken, run_timeout: Option<Duration>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let interrupted = async {
            if tokio::signal::ctrl_c().await.is_err() {
                core::future::pending::<()>().await;
            }
        };

        let timed_out = async {
            match run_timeout {
                Some(timeout) => tokio::time::sleep(timeout).await,
                None => core::future::pending().await,
            }
        };

        tokio::select! {
            biased;

            () = cancel.cancelled() => {}
            () = interrupted => {
                log::warn!(target: LOG_TARGET, "Interrupted, cancelling the analysis");
                cancel.cancel();
            }
            () = timed_out => {
                log::warn!(target: LOG_TARGET, "Run timeout elapsed, cancelling the analysis");
                cancel.cancel();
            }
        }
    })
}

fn write_reports<H: Host>(host: &mut H, report: &Report, args: &AnalyzeArgs) -> Result<()> {
    if args.console || args.json.is_none() {
        let mut console_output = String::new();
        generate_console(report, args.color.use_colors(), &mut console_output)?;
        let _ = write!(host.output(), "{console_output}");
    }

    if let Some(path) = &args.json {
        let mut json_output = String::new();
        generate_json(report, &mut json_output)?;
        write_file(path, &json_output)?;
        log::info!(target: LOG_TARGET, "Wrote JSON report to '{path}'");
    }

    Ok(())
}

fn write_file(path: &Utf8Path, contents: &str) -> Result<()> {
    fs::write(path, contents).into_app_err_with(|| format!("writing report to '{path}'"))
}

async fn analyze<H: Host>(host: &mut H, args: &AnalyzeArgs) -> Result<()> {
    let mut config = Config::load(Utf8Path::new("."), args.config.as_ref())?;
    apply_args(&mut config, args);
    config.validate()?;

    if config.sources.is_empty() {
        bail!("no sources to analyze; list them in the configuration file or pass --git, --github-issues, --github-pulls or --events-file");
    }

    let has_github = config
        .sources
        .iter()
        .any(|s| matches!(s, SourceSpec::GithubIssues { .. } | SourceSpec::GithubPulls { .. }));
    if has_github && args.github_token.is_none() {
        log::warn!(target: LOG_TARGET, "No GitHub token provided, requests will be subject to strict rate limits");
    }

    let sources = config
        .sources
        .iter()
        .map(|spec| spec.build(args.github_token.as_deref()))
        .collect::<Result<Vec<Arc<dyn Source>>>>()?;
    let metrics: Vec<Arc<dyn Metric>> = config.metrics.iter().map(|spec| spec.build()).collect();

    let cancel = CancellationToken::new();
    let watcher = spawn_cancellation_watcher(cancel.clone(), config.run_timeout);

    let result = run_analysis(&sources, &metrics, &config.analysis_config(), Utc::now(), &cancel).await;
    watcher.abort();
    let report = result?;

    write_reports(host, &report, args)?;

    if args.error_if_incomplete && !report.is_complete() {
        bail!("the analysis is incomplete: a source failed or a metric could not be computed");
    }

    Ok(())
}

/// Runs an analysis and writes the requested reports.
pub async fn process_analyze<H: Host>(host: &mut H, args: &AnalyzeArgs) -> Result<()> {
    init_logging(args.log_level);

    match analyze(host, args).await {
        Ok(()) => Ok(()),
        Err(e) => {
            let _ = writeln!(host.error(), "❌ {e:#}");
            host.exit(1);
            Err(e)
        }
    }
}
