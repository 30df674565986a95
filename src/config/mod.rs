use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use ini::{Ini, ParseOption};
use snafu::{OptionExt, ResultExt, Snafu};

pub const DEFAULT_PROFILE: &str = "default";

const CONFIG_FILE_NAME: &str = "jentool.ini";

const DEFAULT_SECTION: &str = "DEFAULT";

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("jentool configuration file {} does not exist", path.display()))]
    ConfigNotFound { path: PathBuf },

    #[snafu(display("can not read {}: {}", path.display(), source))]
    ConfigRead { path: PathBuf, source: io::Error },

    #[snafu(display("can not parse {}: {}", path.display(), source))]
    ConfigParse {
        path: PathBuf,
        source: ini::ParseError,
    },

    #[snafu(display("can not find section {} in {}", profile, path.display()))]
    ProfileNotFound { profile: String, path: PathBuf },

    #[snafu(display("{} not in profile {}", key, profile))]
    ConfigMalformed { profile: String, key: &'static str },

    #[snafu(display("can not determine the home directory, pass --config-file"))]
    NoHomeDirectory,
}

/// Credentials for one Jenkins server, read from a section of the config file.
#[derive(Clone, PartialEq, Eq)]
pub struct Profile {
    pub name: String,
    pub url: String,
    pub user: String,
    pub password: String,
}

// Keep the password out of `{:?}` output so debug logging can't leak it.
impl std::fmt::Debug for Profile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Profile")
            .field("name", &self.name)
            .field("url", &self.url)
            .field("user", &self.user)
            .field("password", &"***")
            .finish()
    }
}

/// Resolve the config file location.
///
/// An explicit path wins (with `~` expanded). Otherwise the file lives in
/// `.config/jentool.ini` under the real home directory: snaps point `$HOME`
/// into the snap's own data directory and export the real one as
/// `SNAP_REAL_HOME`.
pub fn config_path(explicit: Option<&Path>) -> Result<PathBuf, Error> {
    if let Some(path) = explicit {
        let expanded = shellexpand::tilde(&path.to_string_lossy()).into_owned();
        return Ok(PathBuf::from(expanded));
    }

    let home = std::env::var_os("SNAP_REAL_HOME")
        .filter(|home| !home.is_empty())
        .map(PathBuf::from)
        .or_else(dirs::home_dir)
        .context(NoHomeDirectorySnafu)?;

    Ok(home.join(".config").join(CONFIG_FILE_NAME))
}

/// Load the profile `name` from the ini file at `path`.
pub fn load_profile(path: &Path, name: &str) -> Result<Profile, Error> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            return ConfigNotFoundSnafu { path }.fail()
        }
        Err(err) => return Err(err).context(ConfigReadSnafu { path }),
    };

    // values are taken verbatim: passwords may contain quotes and backslashes
    let options = ParseOption {
        enabled_quote: false,
        enabled_escape: false,
        ..ParseOption::default()
    };
    let ini = Ini::load_from_str_opt(&contents, options).context(ConfigParseSnafu { path })?;

    let section = ini.section(Some(name)).context(ProfileNotFoundSnafu {
        profile: name,
        path,
    })?;

    // like configparser, keys in [DEFAULT] apply to every section
    let defaults = ini.section(Some(DEFAULT_SECTION));
    let get = |key: &'static str| {
        section
            .get(key)
            .or_else(|| defaults.and_then(|defaults| defaults.get(key)))
            .map(str::to_string)
            .context(ConfigMalformedSnafu { profile: name, key })
    };

    let profile = Profile {
        name: name.to_string(),
        url: get("url")?,
        user: get("user")?,
        password: get("password")?,
    };

    log::debug!("loaded profile {:?} from {}", profile, path.display());

    Ok(profile)
}
