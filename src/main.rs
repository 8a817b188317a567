use clap::Parser;
use log::*;
use std::sync::Arc;

use mark_issues::{
    Result,
    cli::{self, Args},
    config::Config,
    event::{filter_event, tasks_for},
    notifier::{slack::SlackWebhook, traits::Notifier},
    source_control::{github::Github, manager::SourceControlManager},
    task::{RetryPolicy, Task, TaskRunner},
    tracker::{jira::Jira, manager::TrackerManager},
    workflow::Workflows,
};

fn initialize_logger(debug: bool) -> Result<()> {
    let filter = if debug {
        simplelog::LevelFilter::Debug
    } else {
        simplelog::LevelFilter::Info
    };

    let config = simplelog::ConfigBuilder::new()
        .add_filter_allow_str("mark_issues")
        .build();

    simplelog::TermLogger::init(
        filter,
        config,
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )?;

    Ok(())
}

fn build_runner(args: &Args, config: Config) -> Result<TaskRunner> {
    args.require_tracker_credentials()?;

    let timeout = config.http.timeout();

    let github = Github::new(&config.github, &args.github_token(), timeout)?;

    let jira = Jira::new(
        &config.tracker.url,
        args.jira_username.as_str(),
        args.jira_password(),
        timeout,
    )?;

    let slack = SlackWebhook::new(&args.slack_webhook, timeout)?;

    let policy = RetryPolicy::from(&config.retry);
    let batch_size = config.tracker.batch_size;

    let workflows = Workflows::builder()
        .config(Arc::new(config))
        .source_control(Arc::new(SourceControlManager::new(Box::new(github))))
        .tracker(Arc::new(TrackerManager::new(Box::new(jira), batch_size)))
        .notifier(Arc::new(slack) as Arc<dyn Notifier>)
        .build()?;

    Ok(TaskRunner::new(Arc::new(workflows), policy))
}

async fn run_tasks(runner: &TaskRunner, tasks: &[Task]) -> Result<()> {
    let mut failure = None;

    for (task, result) in tasks.iter().zip(runner.execute_all(tasks).await) {
        if let Err(err) = result {
            error!("{task} gave up: {err}");
            if failure.is_none() {
                failure = Some(err);
            }
        }
    }

    match failure {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli_args = Args::parse();

    initialize_logger(cli_args.debug)?;

    let mut config = Config::load(cli_args.config.as_deref()).await?;
    cli_args.apply_overrides(&mut config);

    let tasks = match &cli_args.command {
        cli::Command::MarkDeployed(pr) => vec![Task::MarkDeployed(pr.into())],
        cli::Command::Changelog(pr) => vec![Task::SendChangelog(pr.into())],
        cli::Command::HandleEvent { event, payload } => {
            let content = tokio::fs::read_to_string(payload).await?;
            let payload = serde_json::from_str(&content)?;

            match filter_event(event, &payload, &config)? {
                Some(pr) => tasks_for(&pr),
                None => return Ok(()),
            }
        }
    };

    let runner = build_runner(&cli_args, config)?;

    run_tasks(&runner, &tasks).await
}
