//! Manual approval gate executable
//!
//! Opens a tracking issue in the configured repository and blocks the
//! calling workflow until the designated approvers respond, the timeout
//! elapses or the run is cancelled. Every flag can also be provided through
//! the corresponding GitHub Actions environment variable.

use approval_core::{
    config, dedupe_approvers, parse_labels, ApprovalSession, GateConfig, GithubTracker, Reporter,
    SessionState, Vocabulary,
};
use clap::{Arg, ArgAction, Command};
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::watch;

const DEFAULT_POLL_INTERVAL_SECONDS: u64 = 10;
const DEFAULT_TIMEOUT_MINUTES: u64 = 60;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Initialize logging with INFO as default if RUST_LOG not set
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let matches = Command::new("approval-gate")
        .version("1.0.0")
        .about("Manual approval gate for automated workflows")
        .arg(
            Arg::new("approvers")
                .long("approvers")
                .env("INPUT_APPROVERS")
                .value_name("LOGINS")
                .help("Comma-separated list of approver logins")
                .required(true),
        )
        .arg(
            Arg::new("minimum-approvals")
                .long("minimum-approvals")
                .env("INPUT_MINIMUM_APPROVALS")
                .value_name("COUNT")
                .help("Number of approvals required; 0 requires all approvers")
                .default_value("0"),
        )
        .arg(
            Arg::new("issue-title")
                .long("issue-title")
                .env("INPUT_ISSUE_TITLE")
                .value_name("TITLE")
                .help("Title of the tracking issue"),
        )
        .arg(
            Arg::new("issue-body")
                .long("issue-body")
                .env("INPUT_ISSUE_BODY")
                .value_name("BODY")
                .help("Body of the tracking issue"),
        )
        .arg(
            Arg::new("labels")
                .long("labels")
                .env("INPUT_LABELS")
                .value_name("LABELS")
                .help("Comma-separated labels for the tracking issue")
                .default_value(""),
        )
        .arg(
            Arg::new("exclude-initiator")
                .long("exclude-workflow-initiator-as-approver")
                .env("INPUT_EXCLUDE_WORKFLOW_INITIATOR_AS_APPROVER")
                .help("Remove the workflow initiator from the approver list")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("repo")
                .long("repo")
                .env("GITHUB_REPOSITORY")
                .value_name("OWNER/REPO")
                .help("Repository whose workflow is waiting for approval")
                .required(true),
        )
        .arg(
            Arg::new("target-repo")
                .long("target-repo")
                .env("INPUT_TARGET_REPOSITORY")
                .value_name("OWNER/REPO")
                .help("Repository the tracking issue is created in (defaults to --repo)"),
        )
        .arg(
            Arg::new("actor")
                .long("actor")
                .env("GITHUB_ACTOR")
                .value_name("LOGIN")
                .help("Login that initiated the workflow run")
                .default_value(""),
        )
        .arg(
            Arg::new("run-id")
                .long("run-id")
                .env("GITHUB_RUN_ID")
                .value_name("ID")
                .help("Workflow run identifier")
                .default_value("0"),
        )
        .arg(
            Arg::new("token")
                .long("token")
                .env("GITHUB_TOKEN")
                .value_name("TOKEN")
                .help("API token used for issue operations")
                .required(true),
        )
        .arg(
            Arg::new("api-url")
                .long("api-url")
                .env("GITHUB_API_URL")
                .value_name("URL")
                .help("Base URL of the issue tracker API")
                .default_value("https://api.github.com"),
        )
        .arg(
            Arg::new("poll-interval-seconds")
                .long("poll-interval-seconds")
                .env("INPUT_POLL_INTERVAL_SECONDS")
                .value_name("SECONDS")
                .help("Seconds between comment polls")
                .default_value("10"),
        )
        .arg(
            Arg::new("timeout-minutes")
                .long("timeout-minutes")
                .env("INPUT_TIMEOUT_MINUTES")
                .value_name("MINUTES")
                .help("Minutes to wait for a decision before timing out")
                .default_value("60"),
        )
        .arg(
            Arg::new("approve-word")
                .long("approve-word")
                .env("INPUT_ADDITIONAL_APPROVE_WORDS")
                .value_name("WORD")
                .help("Additional approval word, may be repeated")
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new("deny-word")
                .long("deny-word")
                .env("INPUT_ADDITIONAL_DENY_WORDS")
                .value_name("WORD")
                .help("Additional denial word, may be repeated")
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new("output-file")
                .long("output-file")
                .env("GITHUB_OUTPUT")
                .value_name("FILE")
                .help("File the structured outputs are written to"),
        )
        .get_matches();

    let repo_full_name = matches.get_one::<String>("repo").unwrap().clone();
    let target_full_name = matches
        .get_one::<String>("target-repo")
        .unwrap_or(&repo_full_name)
        .clone();
    let (target_owner, target_repo) = split_full_name(&target_full_name)?;

    let actor = matches.get_one::<String>("actor").unwrap();
    let exclude_initiator = matches.get_flag("exclude-initiator");

    let mut approvers: Vec<String> =
        parse_labels(matches.get_one::<String>("approvers").unwrap());
    if exclude_initiator {
        log::info!("Excluding workflow initiator {} from approvers", actor);
        approvers.retain(|a| !a.eq_ignore_ascii_case(actor));
    }
    let approvers = dedupe_approvers(approvers);

    let minimum_approvals: usize = matches
        .get_one::<String>("minimum-approvals")
        .unwrap()
        .parse()?;
    let run_id: u64 = matches.get_one::<String>("run-id").unwrap().parse()?;
    let poll_interval_seconds: u64 = matches
        .get_one::<String>("poll-interval-seconds")
        .unwrap()
        .parse()?;
    let timeout_minutes: u64 = matches
        .get_one::<String>("timeout-minutes")
        .unwrap()
        .parse()?;

    let issue_title = matches
        .get_one::<String>("issue-title")
        .cloned()
        .filter(|title| !title.is_empty())
        .unwrap_or_else(|| config::default_issue_title(run_id));
    let issue_body = matches
        .get_one::<String>("issue-body")
        .cloned()
        .filter(|body| !body.is_empty())
        .unwrap_or_else(|| config::default_issue_body(&repo_full_name, run_id, &approvers));

    let gate_config = GateConfig {
        repo_full_name,
        target_owner: target_owner.clone(),
        target_repo: target_repo.clone(),
        run_id,
        approvers,
        minimum_approvals,
        issue_title,
        issue_body,
        labels: parse_labels(matches.get_one::<String>("labels").unwrap()),
        poll_interval: Duration::from_secs(if poll_interval_seconds > 0 {
            poll_interval_seconds
        } else {
            DEFAULT_POLL_INTERVAL_SECONDS
        }),
        timeout: Duration::from_secs(
            60 * if timeout_minutes > 0 {
                timeout_minutes
            } else {
                DEFAULT_TIMEOUT_MINUTES
            },
        ),
    };

    let mut vocabulary = Vocabulary::default();
    if let Some(words) = matches.get_many::<String>("approve-word") {
        for word in words {
            vocabulary = vocabulary.with_approval_word(word.trim());
        }
    }
    if let Some(words) = matches.get_many::<String>("deny-word") {
        for word in words {
            vocabulary = vocabulary.with_denial_word(word.trim());
        }
    }

    let tracker = GithubTracker::new(
        matches.get_one::<String>("api-url").unwrap(),
        target_owner,
        target_repo,
        matches.get_one::<String>("token").unwrap(),
        Duration::from_secs(30),
    );

    let mut session = ApprovalSession::new(gate_config, vocabulary, tracker)?;

    // Cooperative cancellation: Ctrl-C (workflow cancellation) flips the
    // watch channel and the session stops at its next suspension point.
    let (cancel_tx, cancel_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::warn!("Received interrupt signal, requesting cancellation");
            let _ = cancel_tx.send(true);
        }
    });

    let outcome = match session.run(cancel_rx).await {
        Ok(outcome) => outcome,
        Err(e) => {
            log::error!("Approval gate failed: {}", e);
            std::process::exit(1);
        }
    };

    let output_path = matches
        .get_one::<String>("output-file")
        .filter(|path| !path.is_empty())
        .map(PathBuf::from);
    let reporter = Reporter::new(output_path);
    let gate_outcome = reporter.report(outcome.state, &outcome.issue);

    match reporter.write_outputs(&gate_outcome) {
        Ok(true) => {}
        Ok(false) => log::debug!("Structured outputs skipped"),
        Err(e) => {
            log::error!("Failed to write structured outputs: {}", e);
            std::process::exit(1);
        }
    }

    match outcome.state {
        SessionState::Approved => {
            log::info!("Workflow run approved, continuing");
            Ok(())
        }
        state => {
            log::error!(
                "Workflow run not approved (final status: {})",
                approval_core::report::status_token(state)
            );
            std::process::exit(1);
        }
    }
}

fn split_full_name(full_name: &str) -> Result<(String, String), String> {
    match full_name.split_once('/') {
        Some((owner, repo)) if !owner.is_empty() && !repo.is_empty() => {
            Ok((owner.to_string(), repo.to_string()))
        }
        _ => Err(format!(
            "repository must be in 'owner/repo' format, got {:?}",
            full_name
        )),
    }
}
