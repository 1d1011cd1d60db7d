use crate::{channels::ChannelDefinition, fetch::Fetcher, xmltv::write_channel_file};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use log::{error, info, warn};
use std::{fs, path::Path};

#[derive(Debug, Default, PartialEq)]
pub(crate) struct RunSummary {
    pub(crate) written: usize,
    pub(crate) skipped: usize,
    pub(crate) failed: usize,
}

enum Outcome {
    Written,
    NoShows,
}

async fn process_channel<F: Fetcher>(
    fetcher: &F,
    def: &ChannelDefinition,
    output_dir: &Path,
    now: DateTime<Utc>,
) -> Result<Outcome> {
    let Some(programmes) = def
        .fetch_programmes(fetcher, now)
        .await
        .with_context(|| format!("channel '{}'", def.channel.id))?
    else {
        return Ok(Outcome::NoShows);
    };
    if programmes.is_empty() {
        warn!("No programmes for {}; writing an empty guide", def.channel.id);
    }
    info!(
        "Generating {} programme(s) into {} ...",
        programmes.len(),
        def.channel.output_file_name
    );
    write_channel_file(output_dir, &def.channel, &programmes)?;
    Ok(Outcome::Written)
}

/// Builds every channel in order. One channel failing never stops the rest.
pub(crate) async fn run<F: Fetcher>(
    fetcher: &F,
    channels: &[ChannelDefinition],
    output_dir: &Path,
    now: DateTime<Utc>,
) -> Result<RunSummary> {
    fs::create_dir_all(output_dir)
        .with_context(|| format!("creating {}", output_dir.display()))?;

    let mut summary = RunSummary::default();
    for def in channels {
        info!("Processing channel {}", def.channel.id);
        match process_channel(fetcher, def, output_dir, now).await {
            Ok(Outcome::Written) => summary.written += 1,
            Ok(Outcome::NoShows) => {
                warn!("No shows for {}; leaving its guide untouched", def.channel.id);
                summary.skipped += 1;
            }
            Err(e) => {
                error!("Error processing channel {}: {e:#}", def.channel.id);
                summary.failed += 1;
            }
        }
    }
    info!(
        "Done: {} written, {} skipped, {} failed",
        summary.written, summary.skipped, summary.failed
    );
    Ok(summary)
}
