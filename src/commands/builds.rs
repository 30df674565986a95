use clap::Parser;
use snafu::ResultExt;
use time::macros::format_description;
use time::OffsetDateTime;

use crate::jenkins::Jenkins;
use crate::utils::Table;
use crate::{Error, JenkinsSnafu};

#[derive(Parser, Debug)]
pub struct RunningCommand {
    /// Only builds running longer than X seconds.
    #[arg(long, default_value_t = 0)]
    longer_than: u64,
}

impl RunningCommand {
    pub async fn run(self, jenkins: &Jenkins) -> Result<(), Error> {
        let builds = jenkins.running_builds().await.context(JenkinsSnafu)?;
        let now = OffsetDateTime::now_utc();

        let mut table = Table::new(["Name", "Started at", "Url", "Worker"]);
        for build in builds {
            if !running_longer_than(build.started_at_ms, now, self.longer_than) {
                log::debug!("skipping {} #{}", build.name, build.number);
                continue;
            }

            table.add_row([
                build.name,
                started_at(build.started_at_ms, now),
                build.url,
                build.worker,
            ]);
        }

        print!("{table}");

        Ok(())
    }
}

fn unix_millis(at: OffsetDateTime) -> i128 {
    at.unix_timestamp_nanos() / 1_000_000
}

fn running_longer_than(started_at_ms: i64, now: OffsetDateTime, seconds: u64) -> bool {
    unix_millis(now) - i128::from(started_at_ms) > i128::from(seconds) * 1000
}

/// `2023-11-14 22:13:20 (1 days, 3 hours)`, in UTC.
fn started_at(started_at_ms: i64, now: OffsetDateTime) -> String {
    let Ok(started) =
        OffsetDateTime::from_unix_timestamp_nanos(i128::from(started_at_ms) * 1_000_000)
    else {
        return started_at_ms.to_string();
    };

    let timestamp = started
        .format(format_description!(
            "[year]-[month]-[day] [hour]:[minute]:[second]"
        ))
        .unwrap_or_else(|_| started_at_ms.to_string());

    let elapsed = (now - started).max(time::Duration::ZERO);

    format!(
        "{} ({} days, {} hours)",
        timestamp,
        elapsed.whole_days(),
        elapsed.whole_hours() % 24
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn start_time_with_elapsed_days_and_hours() {
        let now = datetime!(2023-11-16 01:13:20 UTC);

        assert_eq!(
            started_at(1_700_000_000_000, now),
            "2023-11-14 22:13:20 (1 days, 3 hours)"
        );
    }

    #[test]
    fn future_start_is_clamped() {
        let now = datetime!(2023-11-14 22:00:00 UTC);

        assert_eq!(
            started_at(1_700_000_000_000, now),
            "2023-11-14 22:13:20 (0 days, 0 hours)"
        );
    }

    #[test]
    fn longer_than_is_strict() {
        let now = datetime!(2023-11-14 22:14:20 UTC);

        assert!(running_longer_than(1_700_000_000_000, now, 59));
        assert!(!running_longer_than(1_700_000_000_000, now, 60));
        assert!(running_longer_than(1_700_000_000_000, now, 0));
    }
}
