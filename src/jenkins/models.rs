use std::collections::BTreeSet;

use serde::{Deserialize, Deserializer};

/// A build agent as reported by `computer/api/json`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NodeInfo {
    #[serde(alias = "displayName")]
    pub name: String,

    #[serde(default)]
    pub offline: bool,

    #[serde(default, rename = "numExecutors")]
    pub executors: u32,

    #[serde(default, rename = "assignedLabels", deserialize_with = "label_names")]
    pub labels: BTreeSet<String>,
}

#[derive(Deserialize)]
struct Label {
    name: String,
}

fn label_names<'de, D>(deserializer: D) -> Result<BTreeSet<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let labels = Vec::<Label>::deserialize(deserializer)?;
    Ok(labels.into_iter().map(|label| label.name).collect())
}

/// Jenkins wraps the node list in `{"computer": [...]}`, simpler fronts
/// hand back the bare array.
#[derive(Deserialize)]
#[serde(untagged)]
pub(crate) enum NodeList {
    Computers { computer: Vec<NodeInfo> },
    Bare(Vec<NodeInfo>),
}

impl NodeList {
    /// Each node carries an implicit label equal to its own name; drop it.
    pub(crate) fn into_nodes(self) -> Vec<NodeInfo> {
        let mut nodes = match self {
            NodeList::Computers { computer } => computer,
            NodeList::Bare(nodes) => nodes,
        };

        for node in &mut nodes {
            node.labels.remove(&node.name);
        }

        nodes
    }
}

#[derive(Deserialize)]
pub(crate) struct NodeState {
    #[serde(default)]
    pub offline: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Job {
    pub name: String,
}

#[derive(Deserialize)]
pub(crate) struct JobList {
    #[serde(default)]
    pub jobs: Vec<Job>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HealthReport {
    pub score: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct BuildRef {
    pub number: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobInfo {
    pub name: String,

    #[serde(default)]
    pub url: String,

    pub color: Option<String>,

    #[serde(default)]
    pub disabled: bool,

    #[serde(default)]
    pub health_report: Vec<HealthReport>,

    pub last_build: Option<BuildRef>,

    pub last_unstable_build: Option<BuildRef>,
}

impl JobInfo {
    /// The first health report is the one Jenkins shows as the job's weather.
    pub fn health_score(&self) -> Option<i64> {
        self.health_report.first().map(|report| report.score)
    }

    pub fn is_failing(&self, max_score: i64) -> bool {
        self.color.as_deref() == Some("red")
            && self.health_score().is_some_and(|score| score <= max_score)
    }

    pub fn is_unstable(&self) -> bool {
        match (self.last_unstable_build, self.last_build) {
            (Some(unstable), Some(last)) => unstable.number == last.number,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunningBuild {
    pub name: String,
    pub number: u64,
    pub url: String,
    pub started_at_ms: i64,
    pub worker: String,
}

#[derive(Deserialize)]
pub(crate) struct ComputerSet {
    #[serde(default)]
    pub computer: Vec<Computer>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Computer {
    pub display_name: String,

    #[serde(default)]
    pub executors: Vec<Executor>,

    #[serde(default)]
    pub one_off_executors: Vec<Executor>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Executor {
    pub current_executable: Option<Executable>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Executable {
    pub number: u64,

    #[serde(default)]
    pub url: String,

    pub full_display_name: String,

    pub timestamp: i64,

    pub built_on: Option<String>,
}

impl ComputerSet {
    /// Flatten every busy executor into a build. Pipeline runs report an
    /// empty `builtOn`, so the executing node stands in for it.
    pub(crate) fn into_running_builds(self) -> Vec<RunningBuild> {
        let mut builds = Vec::new();

        for computer in self.computer {
            let executables = computer
                .executors
                .into_iter()
                .chain(computer.one_off_executors)
                .filter_map(|executor| executor.current_executable);

            for executable in executables {
                let worker = executable
                    .built_on
                    .filter(|built_on| !built_on.is_empty())
                    .unwrap_or_else(|| computer.display_name.clone());

                builds.push(RunningBuild {
                    name: executable.full_display_name,
                    number: executable.number,
                    url: executable.url,
                    started_at_ms: executable.timestamp,
                    worker,
                });
            }
        }

        builds
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Crumb {
    pub crumb: String,
    pub crumb_request_field: String,
}
