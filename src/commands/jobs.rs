use clap::Parser;
use snafu::ResultExt;

use super::{matching_jobs, prefix_pattern, search_pattern};
use crate::jenkins::{Jenkins, JobInfo};
use crate::utils::Table;
use crate::{Error, StepSnafu};

#[derive(Parser, Debug)]
pub struct ListCommand {
    /// The Jenkins job name(s) (regex).
    #[arg(value_name = "JOB_NAME")]
    job_name: String,
}

impl ListCommand {
    pub async fn run(self, jenkins: &Jenkins) -> Result<(), Error> {
        let regex = prefix_pattern(&self.job_name)?;

        for job in matching_jobs(jenkins, &regex).await? {
            println!("{}", job.name);
        }

        Ok(())
    }
}

#[derive(Parser, Debug)]
pub struct DisableCommand {
    /// The Jenkins job name(s) (regex).
    #[arg(value_name = "JOB_NAME")]
    job_name: String,
}

impl DisableCommand {
    pub async fn run(self, jenkins: &Jenkins) -> Result<(), Error> {
        let regex = prefix_pattern(&self.job_name)?;

        for job in matching_jobs(jenkins, &regex).await? {
            println!("Disable job {}", job.name);
            jenkins
                .disable_job(&job.name)
                .await
                .context(StepSnafu {
                    step: format!("disable job {}", job.name),
                })?;
        }

        Ok(())
    }
}

#[derive(Parser, Debug)]
pub struct DeleteCommand {
    /// The Jenkins job name(s) (regex).
    #[arg(value_name = "JOB_NAME")]
    job_name: String,

    /// Only delete disabled jobs.
    #[arg(long)]
    disabled_only: bool,
}

impl DeleteCommand {
    pub async fn run(self, jenkins: &Jenkins) -> Result<(), Error> {
        let regex = prefix_pattern(&self.job_name)?;

        for job in matching_jobs(jenkins, &regex).await? {
            if self.disabled_only {
                let info = jenkins.job_info(&job.name).await.context(StepSnafu {
                    step: format!("get info for job {}", job.name),
                })?;
                if !info.disabled {
                    log::debug!("job {} is enabled, keeping it", job.name);
                    continue;
                }
            }

            jenkins.delete_job(&job.name).await.context(StepSnafu {
                step: format!("delete job {}", job.name),
            })?;
            println!("Deleted job {}", job.name);
        }

        Ok(())
    }
}

#[derive(Parser, Debug)]
pub struct ConfigCommand {
    /// The Jenkins job name(s) (regex).
    #[arg(value_name = "JOB_NAME")]
    job_name: String,
}

impl ConfigCommand {
    pub async fn run(self, jenkins: &Jenkins) -> Result<(), Error> {
        let regex = prefix_pattern(&self.job_name)?;

        for job in matching_jobs(jenkins, &regex).await? {
            let config = jenkins.job_config(&job.name).await.context(StepSnafu {
                step: format!("get config for job {}", job.name),
            })?;
            println!("{config}");
        }

        Ok(())
    }
}

#[derive(Parser, Debug)]
pub struct CopyCommand {
    /// The Jenkins job name(s) (regex).
    #[arg(value_name = "JOB_NAME")]
    job_name: String,

    /// The Jenkins job name search pattern (regex).
    #[arg(value_name = "JOB_NAME_PATTERN")]
    job_name_pattern: String,

    /// The Jenkins job name replacement. Refer to capture groups as $1 or ${name}.
    #[arg(value_name = "JOB_NAME_REPL")]
    job_name_repl: String,
}

impl CopyCommand {
    pub async fn run(self, jenkins: &Jenkins) -> Result<(), Error> {
        let regex = prefix_pattern(&self.job_name)?;
        let rename = search_pattern(&self.job_name_pattern)?;

        for job in matching_jobs(jenkins, &regex).await? {
            let new_name = rename
                .replace_all(&job.name, self.job_name_repl.as_str())
                .into_owned();
            if new_name == job.name {
                continue;
            }

            let exists = jenkins.job_exists(&new_name).await.context(StepSnafu {
                step: format!("look up job {new_name}"),
            })?;
            if exists {
                println!("Job {new_name} already exists. skipping copy ...");
                continue;
            }

            println!("Copy job {:60} -> {}", job.name, new_name);
            jenkins
                .copy_job(&job.name, &new_name)
                .await
                .context(StepSnafu {
                    step: format!("copy job {} to {}", job.name, new_name),
                })?;
        }

        Ok(())
    }
}

#[derive(Parser, Debug)]
pub struct FailingCommand {
    /// The Jenkins job name(s) (regex).
    pattern: String,

    /// The maximum health score to look for.
    #[arg(short, long, default_value_t = 0)]
    max_score: i64,
}

impl FailingCommand {
    pub async fn run(self, jenkins: &Jenkins) -> Result<(), Error> {
        let regex = search_pattern(&self.pattern)?;

        let mut table = Table::new(["Name", "Score", "URL"]);
        for info in job_infos(jenkins, &regex).await? {
            if !info.is_failing(self.max_score) {
                continue;
            }

            let score = info
                .health_score()
                .map(|score| score.to_string())
                .unwrap_or_default();
            table.add_row([info.name, score, info.url]);
        }

        print!("{table}");

        Ok(())
    }
}

#[derive(Parser, Debug)]
pub struct UnstableCommand {
    /// The Jenkins job name(s) (regex).
    pattern: String,
}

impl UnstableCommand {
    pub async fn run(self, jenkins: &Jenkins) -> Result<(), Error> {
        let regex = search_pattern(&self.pattern)?;

        let mut table = Table::new(["Name", "URL"]);
        for info in job_infos(jenkins, &regex).await? {
            if info.is_unstable() {
                table.add_row([info.name, info.url]);
            }
        }

        print!("{table}");

        Ok(())
    }
}

async fn job_infos(jenkins: &Jenkins, regex: &regex::Regex) -> Result<Vec<JobInfo>, Error> {
    let mut infos = Vec::new();

    for job in matching_jobs(jenkins, regex).await? {
        let info = jenkins.job_info(&job.name).await.context(StepSnafu {
            step: format!("get info for job {}", job.name),
        })?;
        infos.push(info);
    }

    Ok(infos)
}
