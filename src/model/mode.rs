//! Sync mode and scope enumerations.
//!
//! These are stored as snake_case strings in the database and accepted
//! case-insensitively (with a few synonyms) on the command line.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Direction and shape of a sync run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Bidirectional.
    Full,
    /// Remote to local.
    Pull,
    /// Abbreviated pull that skips expensive enrichment.
    FastPull,
    /// Local to remote, optionally scoped to one library section.
    Push,
}

impl Mode {
    /// Every mode, in menu order.
    pub const ALL: [Self; 4] = [Self::Full, Self::Pull, Self::FastPull, Self::Push];

    /// Get the string representation for storage.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Pull => "pull",
            Self::FastPull => "fast_pull",
            Self::Push => "push",
        }
    }

    /// Human title shown in menus and status lines.
    #[must_use]
    pub const fn title(&self) -> &'static str {
        match self {
            Self::Full => "Synchronize",
            Self::Pull => "Pull",
            Self::FastPull => "Quick Pull",
            Self::Push => "Push",
        }
    }

    /// Whether runs in this mode may be scoped to a single section.
    #[must_use]
    pub const fn accepts_target(&self) -> bool {
        matches!(self, Self::Push)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "full" | "sync" | "synchronize" => Ok(Self::Full),
            "pull" => Ok(Self::Pull),
            "fast_pull" | "fastpull" | "quick" | "quick_pull" => Ok(Self::FastPull),
            "push" => Ok(Self::Push),
            other => Err(Error::InvalidArgument(format!(
                "unknown mode '{other}' (expected full, pull, fast_pull or push)"
            ))),
        }
    }
}

/// Category of library data a run covers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataScope {
    #[default]
    All,
    Collection,
    Playback,
    Ratings,
    Watched,
    Watchlist,
    Lists,
}

impl DataScope {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Collection => "collection",
            Self::Playback => "playback",
            Self::Ratings => "ratings",
            Self::Watched => "watched",
            Self::Watchlist => "watchlist",
            Self::Lists => "lists",
        }
    }

    #[must_use]
    pub const fn title(&self) -> &'static str {
        match self {
            Self::All => "All",
            Self::Collection => "Collection",
            Self::Playback => "Playback Progress",
            Self::Ratings => "Ratings",
            Self::Watched => "Watched",
            Self::Watchlist => "Watchlist",
            Self::Lists => "Lists",
        }
    }
}

impl fmt::Display for DataScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataScope {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "all" => Ok(Self::All),
            "collection" | "collected" => Ok(Self::Collection),
            "playback" | "progress" => Ok(Self::Playback),
            "ratings" | "rating" => Ok(Self::Ratings),
            "watched" | "history" => Ok(Self::Watched),
            "watchlist" => Ok(Self::Watchlist),
            "lists" | "list" => Ok(Self::Lists),
            other => Err(Error::InvalidArgument(format!("unknown data scope '{other}'"))),
        }
    }
}

/// Media types a run covers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaScope {
    #[default]
    All,
    Movies,
    Shows,
}

impl MediaScope {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Movies => "movies",
            Self::Shows => "shows",
        }
    }
}

impl fmt::Display for MediaScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaScope {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "all" => Ok(Self::All),
            "movies" | "movie" => Ok(Self::Movies),
            "shows" | "show" | "tv" => Ok(Self::Shows),
            other => Err(Error::InvalidArgument(format!("unknown media scope '{other}'"))),
        }
    }
}
