use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Icon theme for menu entries, matched to the launcher host's appearance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_dir(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }

    /// Themed icon path, relative to the extension's asset root.
    pub fn icon(self, name: &str) -> PathBuf {
        PathBuf::from(format!("images/{}/{name}.svg", self.as_dir()))
    }
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "light" => Ok(Self::Light),
            "dark" => Ok(Self::Dark),
            other => Err(format!("invalid theme: {other}")),
        }
    }
}
