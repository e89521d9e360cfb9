use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::error::RunnerError;
use super::telemetry::SessionSummary;

pub(crate) const LEADERBOARD_FILE_NAME: &str = "leaderboard.json";
pub(crate) const LEADERBOARD_CAPACITY: usize = 10;
const STAGING_PREFIX: &str = ".babuland-";

/// Serializes `value` next to `path` under a staging name, then persists it
/// over `path` so readers never observe a half-written file.
fn write_json_atomic<T: Serialize>(
    path: &Path,
    value: &T,
    what: &'static str,
) -> Result<(), RunnerError> {
    let mut bytes =
        serde_json::to_vec_pretty(value).map_err(|source| RunnerError::Encode { what, source })?;
    bytes.push(b'\n');

    let write_error = |source: io::Error| RunnerError::Write {
        path: path.to_path_buf(),
        source,
    };
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).map_err(write_error)?;

    let mut staged = tempfile::Builder::new()
        .prefix(STAGING_PREFIX)
        .suffix(".json.tmp")
        .tempfile_in(dir)
        .map_err(write_error)?;
    staged.write_all(&bytes).map_err(write_error)?;
    staged.persist(path).map_err(|error| write_error(error.error))?;
    Ok(())
}

/// `player_name` comes from config; anything but `[A-Za-z0-9_-]` becomes `_`
/// so the file always lands inside the log directory.
pub(crate) fn session_file_name(summary: &SessionSummary) -> String {
    let player: String = summary
        .player_name
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' {
                ch
            } else {
                '_'
            }
        })
        .collect();
    format!("session_seed{}_{}.json", summary.seed, player)
}

/// Writes the summary as pretty JSON into `dir` and returns the final path.
pub(crate) fn write_session_summary(
    dir: &Path,
    summary: &SessionSummary,
) -> Result<PathBuf, RunnerError> {
    let path = dir.join(session_file_name(summary));
    write_json_atomic(&path, summary, "session summary")?;
    Ok(path)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct LeaderboardEntry {
    pub(crate) name: String,
    pub(crate) score: u32,
    pub(crate) rounds: u32,
    pub(crate) skill: u32,
    pub(crate) seed: u64,
}

impl LeaderboardEntry {
    pub(crate) fn from_summary(summary: &SessionSummary) -> Self {
        Self {
            name: summary.player_name.clone(),
            score: summary.score,
            rounds: summary.rounds_played,
            skill: summary.skill,
            seed: summary.seed,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub(crate) struct Leaderboard {
    entries: Vec<LeaderboardEntry>,
}

impl Leaderboard {
    /// A missing file is an empty board.
    pub(crate) fn load(path: &Path) -> Result<Self, RunnerError> {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(RunnerError::ReadLeaderboard {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        let mut board: Self =
            serde_json::from_str(&raw).map_err(|source| RunnerError::ParseLeaderboard {
                path: path.to_path_buf(),
                source,
            })?;
        board.normalize();
        Ok(board)
    }

    pub(crate) fn save(&self, path: &Path) -> Result<(), RunnerError> {
        write_json_atomic(path, self, "leaderboard")
    }

    /// Inserts the entry and returns its rank (0-based) if it made the board.
    pub(crate) fn insert(&mut self, entry: LeaderboardEntry) -> Option<usize> {
        let rank = self
            .entries
            .iter()
            .position(|existing| existing.score < entry.score)
            .unwrap_or(self.entries.len());
        if rank >= LEADERBOARD_CAPACITY {
            return None;
        }
        self.entries.insert(rank, entry);
        self.entries.truncate(LEADERBOARD_CAPACITY);
        Some(rank)
    }

    pub(crate) fn best_score(&self) -> u32 {
        self.entries.first().map_or(0, |entry| entry.score)
    }

    pub(crate) fn entries(&self) -> &[LeaderboardEntry] {
        &self.entries
    }

    fn normalize(&mut self) {
        // Stable sort keeps earlier entries ahead on ties.
        self.entries.sort_by(|a, b| b.score.cmp(&a.score));
        self.entries.truncate(LEADERBOARD_CAPACITY);
    }
}
