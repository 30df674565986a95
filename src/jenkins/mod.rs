mod models;

use std::time::Duration;

use reqwest::{Method, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use snafu::{ResultExt, Snafu};
use tokio::sync::OnceCell;

use crate::config::Profile;
use models::{ComputerSet, Crumb, JobList, NodeList, NodeState};

pub use models::{Job, JobInfo, NodeInfo, RunningBuild};

const NODES_TREE: &str = "computer[displayName,offline,numExecutors,assignedLabels[name]]";
const JOBS_TREE: &str = "jobs[name]";
const EXECUTABLE_TREE: &str = "currentExecutable[number,url,fullDisplayName,timestamp,builtOn]";

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("invalid Jenkins url {}: {}", url, reason))]
    InvalidUrl { url: String, reason: String },

    #[snafu(display("failed to set up the HTTP client: {}", source))]
    HttpClient { source: reqwest::Error },

    #[snafu(display("authentication failed for {} (HTTP {})", url, status.as_u16()))]
    Auth { url: Url, status: StatusCode },

    #[snafu(display("{} not found", url))]
    NotFound { url: Url },

    #[snafu(display("server error from {} (HTTP {})", url, status.as_u16()))]
    Server { url: Url, status: StatusCode },

    #[snafu(display("unexpected HTTP {} from {}", status.as_u16(), url))]
    UnexpectedStatus { url: Url, status: StatusCode },

    #[snafu(display(
        "request to {} failed: {}{}",
        url,
        source,
        if source.is_timeout() { " (timed out)" } else { "" }
    ))]
    Network { url: Url, source: reqwest::Error },

    #[snafu(display("invalid response from {}: {}", url, source))]
    Decode {
        url: Url,
        source: serde_json::Error,
    },
}

/// Authenticated access to one Jenkins server.
///
/// Every call issues its requests one after another and makes a single
/// attempt; failures surface to the caller untouched.
pub struct Jenkins {
    http: reqwest::Client,
    base_url: Url,
    user: String,
    password: String,
    crumb: OnceCell<Option<Crumb>>,
}

impl Jenkins {
    pub fn new(profile: &Profile, timeout: Duration) -> Result<Self, Error> {
        let base_url = base_url(&profile.url)?;

        // crumbs are bound to the web session that requested them
        let http = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(timeout)
            .user_agent(concat!("jentool/", env!("CARGO_PKG_VERSION")))
            .build()
            .context(HttpClientSnafu)?;

        Ok(Self {
            http,
            base_url,
            user: profile.user.clone(),
            password: profile.password.clone(),
            crumb: OnceCell::new(),
        })
    }

    pub async fn list_nodes(&self) -> Result<Vec<NodeInfo>, Error> {
        let url = self.url(&["computer", "api", "json"], Some(&tree(NODES_TREE)));
        let nodes: NodeList = self.get_json(url).await?;

        Ok(nodes.into_nodes())
    }

    pub async fn node_offline(&self, name: &str) -> Result<bool, Error> {
        let url = self.node_url(name, &["api", "json"], Some("tree=offline"));
        let state: NodeState = self.get_json(url).await?;

        Ok(state.offline)
    }

    /// Take a node temporarily offline. Jenkins only exposes a toggle, so
    /// the current state is checked first.
    pub async fn set_node_offline(&self, name: &str, reason: &str) -> Result<(), Error> {
        if self.node_offline(name).await? {
            log::info!("node {name} is already offline");
            return Ok(());
        }

        let mut url = self.node_url(name, &["toggleOffline"], None);
        url.query_pairs_mut().append_pair("offlineMessage", reason);

        self.post(url).await
    }

    pub async fn set_node_online(&self, name: &str) -> Result<(), Error> {
        if !self.node_offline(name).await? {
            log::info!("node {name} is already online");
            return Ok(());
        }

        let url = self.node_url(name, &["toggleOffline"], None);

        self.post(url).await
    }

    pub async fn list_jobs(&self) -> Result<Vec<Job>, Error> {
        let url = self.url(&["api", "json"], Some(&tree(JOBS_TREE)));
        let jobs: JobList = self.get_json(url).await?;

        Ok(jobs.jobs)
    }

    pub async fn job_info(&self, name: &str) -> Result<JobInfo, Error> {
        let url = self.job_url(name, &["api", "json"], Some("depth=0"));

        self.get_json(url).await
    }

    pub async fn job_exists(&self, name: &str) -> Result<bool, Error> {
        let url = self.job_url(name, &["api", "json"], Some("tree=name"));

        match self.send(Method::GET, url).await {
            Ok(_) => Ok(true),
            Err(Error::NotFound { .. }) => Ok(false),
            Err(err) => Err(err),
        }
    }

    pub async fn job_config(&self, name: &str) -> Result<String, Error> {
        let url = self.job_url(name, &["config.xml"], None);
        let response = self.send(Method::GET, url.clone()).await?;

        response.text().await.context(NetworkSnafu { url })
    }

    pub async fn disable_job(&self, name: &str) -> Result<(), Error> {
        self.post(self.job_url(name, &["disable"], None)).await
    }

    pub async fn delete_job(&self, name: &str) -> Result<(), Error> {
        self.post(self.job_url(name, &["doDelete"], None)).await
    }

    pub async fn copy_job(&self, from: &str, to: &str) -> Result<(), Error> {
        let mut url = self.url(&["createItem"], None);
        url.query_pairs_mut()
            .append_pair("name", to)
            .append_pair("mode", "copy")
            .append_pair("from", from);

        self.post(url).await
    }

    pub async fn running_builds(&self) -> Result<Vec<RunningBuild>, Error> {
        let query = tree(&format!(
            "computer[displayName,executors[{EXECUTABLE_TREE}],oneOffExecutors[{EXECUTABLE_TREE}]]"
        ));
        let url = self.url(&["computer", "api", "json"], Some(&query));
        let computers: ComputerSet = self.get_json(url).await?;

        Ok(computers.into_running_builds())
    }

    fn url(&self, segments: &[&str], query: Option<&str>) -> Url {
        let mut url = self.base_url.clone();

        // base_url() rejects urls that cannot be a base, so this always applies
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url.set_query(query);

        url
    }

    fn job_url(&self, name: &str, rest: &[&str], query: Option<&str>) -> Url {
        let mut segments = job_segments(name);
        segments.extend_from_slice(rest);

        self.url(&segments, query)
    }

    fn node_url(&self, name: &str, rest: &[&str], query: Option<&str>) -> Url {
        let mut segments = vec!["computer", node_segment(name)];
        segments.extend_from_slice(rest);

        self.url(&segments, query)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, Error> {
        let response = self.send(Method::GET, url.clone()).await?;
        let body = response
            .text()
            .await
            .context(NetworkSnafu { url: url.clone() })?;

        serde_json::from_str(&body).context(DecodeSnafu { url })
    }

    async fn post(&self, url: Url) -> Result<(), Error> {
        let mut request = self.request(Method::POST, url.clone());
        if let Some(crumb) = self.crumb().await? {
            request = request.header(crumb.crumb_request_field.as_str(), crumb.crumb.as_str());
        }

        let response = request.send().await.context(NetworkSnafu { url })?;
        check_status(response)?;

        Ok(())
    }

    async fn send(&self, method: Method, url: Url) -> Result<Response, Error> {
        let response = self
            .request(method, url.clone())
            .send()
            .await
            .context(NetworkSnafu { url })?;

        check_status(response)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        log::debug!("{method} {url}");

        self.http
            .request(method, url)
            .basic_auth(&self.user, Some(&self.password))
    }

    /// Jenkins' CSRF protection wants a crumb on every POST made with a
    /// password. Servers with the crumb issuer disabled answer 404.
    async fn crumb(&self) -> Result<Option<&Crumb>, Error> {
        let crumb = self
            .crumb
            .get_or_try_init(|| async {
                let url = self.url(&["crumbIssuer", "api", "json"], None);
                match self.get_json::<Crumb>(url).await {
                    Ok(crumb) => Ok(Some(crumb)),
                    Err(Error::NotFound { .. }) => {
                        log::debug!("crumb issuer disabled");
                        Ok(None)
                    }
                    Err(err) => Err(err),
                }
            })
            .await?;

        Ok(crumb.as_ref())
    }
}

fn base_url(raw: &str) -> Result<Url, Error> {
    let url = Url::parse(raw).map_err(|err| Error::InvalidUrl {
        url: raw.to_string(),
        reason: err.to_string(),
    })?;

    if url.cannot_be_a_base() {
        return InvalidUrlSnafu {
            url: raw,
            reason: "not a base url",
        }
        .fail();
    }

    Ok(url)
}

fn tree(tree: &str) -> String {
    format!("tree={tree}")
}

/// `folder/job` lives at `job/folder/job/job`.
fn job_segments(name: &str) -> Vec<&str> {
    name.split('/')
        .filter(|segment| !segment.is_empty())
        .flat_map(|segment| ["job", segment])
        .collect()
}

/// The built-in node is addressed by a reserved name rather than its
/// display name.
fn node_segment(name: &str) -> &str {
    match name {
        "master" => "(master)",
        "Built-In Node" => "(built-in)",
        _ => name,
    }
}

fn check_status(response: Response) -> Result<Response, Error> {
    let status = response.status();
    let url = response.url().clone();

    match status {
        _ if status.is_success() || status.is_redirection() => Ok(response),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => AuthSnafu { url, status }.fail(),
        StatusCode::NOT_FOUND => NotFoundSnafu { url }.fail(),
        _ if status.is_server_error() => ServerSnafu { url, status }.fail(),
        _ => UnexpectedStatusSnafu { url, status }.fail(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jenkins(url: &str) -> Jenkins {
        let profile = Profile {
            name: "ci".to_string(),
            url: url.to_string(),
            user: "u".to_string(),
            password: "p".to_string(),
        };

        Jenkins::new(&profile, Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn job_urls_nest_folders() {
        let jenkins = jenkins("https://ci.example.com/jenkins/");

        assert_eq!(
            jenkins.job_url("team/app build", &["api", "json"], Some("depth=0")).as_str(),
            "https://ci.example.com/jenkins/job/team/job/app%20build/api/json?depth=0"
        );
    }

    #[test]
    fn urls_without_trailing_slash_keep_their_path() {
        let jenkins = jenkins("http://h/jenkins");

        assert_eq!(
            jenkins.url(&["computer", "api", "json"], Some("tree=offline")).as_str(),
            "http://h/jenkins/computer/api/json?tree=offline"
        );
    }

    #[test]
    fn built_in_node_uses_reserved_name() {
        let jenkins = jenkins("http://h");

        assert_eq!(
            jenkins.node_url("Built-In Node", &["toggleOffline"], None).as_str(),
            "http://h/computer/(built-in)/toggleOffline"
        );
        assert_eq!(
            jenkins.node_url("agent 1", &["api", "json"], None).as_str(),
            "http://h/computer/agent%201/api/json"
        );
    }

    #[test]
    fn rejects_unusable_urls() {
        let profile = Profile {
            name: "ci".to_string(),
            url: "not a url".to_string(),
            user: "u".to_string(),
            password: "p".to_string(),
        };

        let err = Jenkins::new(&profile, Duration::from_secs(5))
            .err()
            .unwrap();

        assert!(matches!(err, Error::InvalidUrl { .. }));
        assert!(base_url("mailto:ci@example.com").is_err());
    }
}
