use serde::{Deserialize, Serialize};

/// Pipeline stage, in the fixed order the spec prescribes. `PartialOrd`/`Ord` follow declaration
/// order so callers can assert `scan <= parse <= embed <= symbols <= done`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Scan,
    Parse,
    Embed,
    Symbols,
    Done,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Stage::Scan => "scan",
            Stage::Parse => "parse",
            Stage::Embed => "embed",
            Stage::Symbols => "symbols",
            Stage::Done => "done",
        };
        write!(f, "{s}")
    }
}

/// A streaming progress event emitted by the indexing pipeline. `percent` is monotone
/// non-decreasing within a run, piecewise over stage per the allocation 0->0.6 parse, 0.6->0.95
/// embed, 0.95->1.0 symbols.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexProgress {
    stage: Stage,
    total_files: usize,
    files_done: usize,
    current_file: Option<String>,
    percent: f32,
    message: String,
}

impl IndexProgress {
    pub fn new(
        stage: Stage,
        total_files: usize,
        files_done: usize,
        current_file: Option<String>,
        percent: f32,
        message: impl Into<String>,
    ) -> Self {
        Self {
            stage,
            total_files,
            files_done,
            current_file,
            percent: percent.clamp(0.0, 1.0),
            message: message.into(),
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn total_files(&self) -> usize {
        self.total_files
    }

    pub fn files_done(&self) -> usize {
        self.files_done
    }

    pub fn current_file(&self) -> Option<&str> {
        self.current_file.as_deref()
    }

    pub fn percent(&self) -> f32 {
        self.percent
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Computes the piecewise percent allocation described in the data model: parse covers
/// `0.0..0.6`, embed `0.6..0.95`, symbols `0.95..1.0`, proportional to `done/total` within the
/// stage's band.
pub fn piecewise_percent(stage: Stage, done: usize, total: usize) -> f32 {
    let frac = if total == 0 {
        1.0
    } else {
        (done as f32 / total as f32).clamp(0.0, 1.0)
    };
    match stage {
        Stage::Scan => 0.0,
        Stage::Parse => 0.6 * frac,
        Stage::Embed => 0.6 + 0.35 * frac,
        Stage::Symbols => 0.95 + 0.05 * frac,
        Stage::Done => 1.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_order() {
        assert!(Stage::Scan <= Stage::Parse);
        assert!(Stage::Parse <= Stage::Embed);
        assert!(Stage::Embed <= Stage::Symbols);
        assert!(Stage::Symbols <= Stage::Done);
    }

    #[test]
    fn percent_bands() {
        assert_eq!(piecewise_percent(Stage::Parse, 0, 10), 0.0);
        assert_eq!(piecewise_percent(Stage::Parse, 10, 10), 0.6);
        assert_eq!(piecewise_percent(Stage::Embed, 10, 10), 0.95);
        assert_eq!(piecewise_percent(Stage::Symbols, 1, 1), 1.0);
        assert_eq!(piecewise_percent(Stage::Done, 0, 0), 1.0);
    }
}
