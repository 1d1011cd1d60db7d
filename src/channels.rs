use crate::{
    error::EpgError,
    fetch::Fetcher,
    programme::{ChannelConfig, Programme},
    sources::{
        grid::{self, GridSource},
        json_api::{self, JsonApiSource},
        script::{self, ScriptSource},
    },
};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use chrono_tz::America::{Chicago, New_York};
use serde::Deserialize;
use std::{fs, path::Path};

const AFTERMATH_URL: &str = "https://api.toonamiaftermath.com/media?scheduleName=Toonami%20Aftermath%20EST&dateString={date}T11%3A00%3A00Z&count=100";
const REWIND_CSV_URL: &str = "https://docs.google.com/spreadsheets/d/e/2PACX-1vTyuFJJk4PhKqIy6n8hiEVwpGGk6tKLdXIZ_jkamqgcTrXnRMPavZcHmH-Lbm_BjsyamV9fjEqLFWDN/pub?gid=0&single=true&output=csv";

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub(crate) enum SourceConfig {
    JsonApi(JsonApiSource),
    Grid(GridSource),
    Script(ScriptSource),
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ChannelDefinition {
    #[serde(flatten)]
    pub(crate) channel: ChannelConfig,
    #[serde(flatten)]
    pub(crate) source: SourceConfig,
}

impl ChannelDefinition {
    /// `None` means there is nothing to publish and the old guide stays.
    /// Grid and script sources always produce a guide, even an empty one.
    pub(crate) async fn fetch_programmes<F: Fetcher>(
        &self,
        fetcher: &F,
        now: DateTime<Utc>,
    ) -> Result<Option<Vec<Programme>>, EpgError> {
        match &self.source {
            SourceConfig::JsonApi(source) => json_api::fetch_programmes(fetcher, source, now).await,
            SourceConfig::Grid(source) => {
                grid::fetch_programmes(fetcher, source, now).await.map(Some)
            }
            SourceConfig::Script(source) => {
                script::fetch_programmes(fetcher, source, now).await.map(Some)
            }
        }
    }
}

/// Channels built when no channel file is given.
pub(crate) fn default_channels() -> Vec<ChannelDefinition> {
    vec![
        ChannelDefinition {
            channel: ChannelConfig {
                id: "rewind".to_string(),
                display_name: "Rewind".to_string(),
                output_file_name: "rewind.xml".to_string(),
            },
            source: SourceConfig::Grid(GridSource {
                url: REWIND_CSV_URL.to_string(),
                source_tz: Chicago,
                output_tz: New_York,
                days: 3,
                header_scan_rows: 20,
            }),
        },
        ChannelDefinition {
            channel: ChannelConfig {
                id: "toonami".to_string(),
                display_name: "Toonami".to_string(),
                output_file_name: "toonami.xml".to_string(),
            },
            source: SourceConfig::JsonApi(JsonApiSource {
                url: AFTERMATH_URL.to_string(),
                output_tz: chrono_tz::UTC,
                fallback_minutes: 12,
            }),
        },
    ]
}

/// Reads a JSON array of channel definitions.
pub(crate) fn load_channels(path: &Path) -> Result<Vec<ChannelDefinition>> {
    let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}
