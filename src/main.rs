mod commands;
mod config;
mod jenkins;
mod utils;

use std::fmt;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Args, Parser};
use snafu::{ResultExt, Snafu};

use crate::jenkins::Jenkins;
use crate::utils::{Style, StyledStr};

#[derive(Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("{}", source))]
    Config { source: config::Error },

    #[snafu(display("{}", source))]
    Jenkins { source: jenkins::Error },

    #[snafu(display("{} failed: {}", step, source))]
    Step {
        step: String,
        source: jenkins::Error,
    },

    #[snafu(display("invalid pattern {:?}: {}", pattern, reason))]
    InvalidPattern { pattern: String, reason: String },
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self)
    }
}

impl Error {
    /// 2 for bad input on the command line, 1 for everything that went
    /// wrong at runtime.
    pub(crate) fn exit_code(&self) -> u8 {
        match self {
            Error::InvalidPattern { .. } => 2,
            Error::Config { .. } | Error::Jenkins { .. } | Error::Step { .. } => 1,
        }
    }
}

#[derive(Args, Debug)]
pub struct GlobalOptions {
    /// Path to the configuration file. [default: ~/.config/jentool.ini]
    #[arg(short, long, env = "JENTOOL_CONFIG_FILE", global = true)]
    config_file: Option<PathBuf>,

    /// The profile (section) to use in the config file.
    #[arg(
        short,
        long,
        env = "JENTOOL_PROFILE",
        default_value = config::DEFAULT_PROFILE,
        global = true
    )]
    profile: String,

    /// Timeout in seconds for each request to Jenkins.
    #[arg(short, long, env = "JENTOOL_TIMEOUT", default_value_t = 30, global = true)]
    timeout: u64,

    /// Print debug logs to stderr.
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Parser, Debug)]
#[command(name = "jentool", version = env!("JENTOOL_VERSION"), about = "Jenkins tool")]
struct Program {
    #[command(flatten)]
    global_options: GlobalOptions,

    #[command(subcommand)]
    command: commands::Command,
}

impl Program {
    async fn run(self) -> Result<(), Error> {
        let options = self.global_options;

        let path = config::config_path(options.config_file.as_deref()).context(ConfigSnafu)?;
        let profile = config::load_profile(&path, &options.profile).context(ConfigSnafu)?;
        let jenkins =
            Jenkins::new(&profile, Duration::from_secs(options.timeout)).context(JenkinsSnafu)?;

        self.command.run(&jenkins).await
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose { "warn,jentool=debug" } else { "warn" };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter)).init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let program = Program::parse();
    init_logging(program.global_options.verbose);

    match program.run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let mut msg = StyledStr::new();
            msg.push_str(Some(Style::Error), "error: ".to_string());
            msg.push_str(None, err.to_string());
            if msg.print_err().is_err() {
                log::error!("{err}");
            }

            ExitCode::from(err.exit_code())
        }
    }
}
