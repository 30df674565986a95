use clap::Parser;
use snafu::ResultExt;

use crate::jenkins::Jenkins;
use crate::utils::{Style, StyledStr, Table};
use crate::{Error, JenkinsSnafu};

#[derive(Parser, Debug)]
pub struct ListCommand {}

impl ListCommand {
    pub async fn run(self, jenkins: &Jenkins) -> Result<(), Error> {
        let nodes = jenkins.list_nodes().await.context(JenkinsSnafu)?;

        let mut table = Table::new(["Name", "Labels", "Executors", "Offline"]);
        for node in nodes {
            let labels = node.labels.into_iter().collect::<Vec<_>>().join(", ");
            table.add_row([
                node.name,
                labels,
                node.executors.to_string(),
                node.offline.to_string(),
            ]);
        }

        print!("{table}");

        Ok(())
    }
}

#[derive(Parser, Debug)]
pub struct OfflineCommand {
    /// The node name as shown by nodes-list.
    node: String,

    /// The message shown on the node while it is offline.
    #[arg(long, default_value = "")]
    reason: String,
}

impl OfflineCommand {
    pub async fn run(self, jenkins: &Jenkins) -> Result<(), Error> {
        jenkins
            .set_node_offline(&self.node, &self.reason)
            .await
            .context(JenkinsSnafu)?;

        success(format!("Node {} is offline.", self.node));

        Ok(())
    }
}

#[derive(Parser, Debug)]
pub struct OnlineCommand {
    /// The node name as shown by nodes-list.
    node: String,
}

impl OnlineCommand {
    pub async fn run(self, jenkins: &Jenkins) -> Result<(), Error> {
        jenkins
            .set_node_online(&self.node)
            .await
            .context(JenkinsSnafu)?;

        success(format!("Node {} is online.", self.node));

        Ok(())
    }
}

fn success(message: String) {
    let mut msg = StyledStr::new();
    msg.push_str(Some(Style::Success), "success: ".to_string());
    msg.push_str(None, message);

    if let Err(err) = msg.print_err() {
        log::warn!("could not write to stderr: {err}");
    }
}
