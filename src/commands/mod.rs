mod builds;
mod jobs;
mod nodes;

use clap::Parser;
use regex::Regex;
use snafu::ResultExt;

use crate::jenkins::{Jenkins, Job};
use crate::{Error, JenkinsSnafu};

#[derive(Parser, Debug)]
pub enum Command {
    /// List all nodes
    NodesList(nodes::ListCommand),

    /// Mark a node temporarily offline
    NodesOffline(nodes::OfflineCommand),

    /// Bring an offline node back online
    NodesOnline(nodes::OnlineCommand),

    /// List the given job(s)
    JobsList(jobs::ListCommand),

    /// Disable the given job(s)
    JobsDisable(jobs::DisableCommand),

    /// Delete the given job(s)
    JobsDelete(jobs::DeleteCommand),

    /// Get config(s) for the given job(s)
    JobsConfig(jobs::ConfigCommand),

    /// Copy the given job(s)
    JobsCopy(jobs::CopyCommand),

    /// List failing jobs
    JobsFailing(jobs::FailingCommand),

    /// List unstable jobs
    JobsUnstable(jobs::UnstableCommand),

    /// List running builds
    BuildsRunning(builds::RunningCommand),
}

impl Command {
    pub async fn run(self, jenkins: &Jenkins) -> Result<(), Error> {
        match self {
            Self::NodesList(cmd) => cmd.run(jenkins).await,
            Self::NodesOffline(cmd) => cmd.run(jenkins).await,
            Self::NodesOnline(cmd) => cmd.run(jenkins).await,
            Self::JobsList(cmd) => cmd.run(jenkins).await,
            Self::JobsDisable(cmd) => cmd.run(jenkins).await,
            Self::JobsDelete(cmd) => cmd.run(jenkins).await,
            Self::JobsConfig(cmd) => cmd.run(jenkins).await,
            Self::JobsCopy(cmd) => cmd.run(jenkins).await,
            Self::JobsFailing(cmd) => cmd.run(jenkins).await,
            Self::JobsUnstable(cmd) => cmd.run(jenkins).await,
            Self::BuildsRunning(cmd) => cmd.run(jenkins).await,
        }
    }
}

/// Job name arguments must match from the first character of the name.
pub(crate) fn prefix_pattern(pattern: &str) -> Result<Regex, Error> {
    compile(pattern, &format!("^(?:{pattern})"))
}

/// Patterns that may match anywhere in the name.
pub(crate) fn search_pattern(pattern: &str) -> Result<Regex, Error> {
    compile(pattern, pattern)
}

fn compile(pattern: &str, regex: &str) -> Result<Regex, Error> {
    Regex::new(regex).map_err(|err| {
        // regex syntax errors span several lines, the last one says what is wrong
        let rendered = err.to_string();
        let reason = rendered
            .lines()
            .rev()
            .find(|line| !line.trim().is_empty())
            .unwrap_or_default()
            .trim_start_matches("error: ")
            .to_string();

        Error::InvalidPattern {
            pattern: pattern.to_string(),
            reason,
        }
    })
}

pub(crate) async fn matching_jobs(jenkins: &Jenkins, regex: &Regex) -> Result<Vec<Job>, Error> {
    let jobs = jenkins.list_jobs().await.context(JenkinsSnafu)?;

    Ok(jobs
        .into_iter()
        .filter(|job| regex.is_match(&job.name))
        .collect())
}
