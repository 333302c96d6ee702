use super::interaction::PendingInteractionSpec;
use crate::core::selection::SelectionSyntax;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

/// Contact distance, in Ångström, for atomistic agents.
pub const DEFAULT_DISTANCE_CUTOFF: f64 = 5.0;
/// Minimum fraction of frames in contact for an interaction to be accepted.
pub const DEFAULT_INTERACTION_CUTOFF: f64 = 0.1;
/// Maximum number of frames evaluated per interaction.
pub const DEFAULT_FRAMES_LIMIT: usize = 200;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
    #[error("Invalid value for '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

/// Strategy for generating interactions automatically.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutoMode {
    /// Every pair of eligible chains.
    Greedy,
    /// The single pair formed by exactly two eligible chains.
    Humble,
    /// Every ligand copy against every chain of a different kind.
    Ligands,
    /// The given chain against every other eligible chain.
    Chain(char),
}

impl FromStr for AutoMode {
    type Err = ConfigError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim();
        match token.to_lowercase().as_str() {
            "greedy" | "autogreedy" | "true" => Ok(AutoMode::Greedy),
            "humble" | "autohumble" => Ok(AutoMode::Humble),
            "ligands" => Ok(AutoMode::Ligands),
            _ => {
                let mut chars = token.chars();
                match (chars.next(), chars.next()) {
                    (Some(chain), None) => Ok(AutoMode::Chain(chain)),
                    _ => Err(ConfigError::InvalidParameter {
                        name: "auto",
                        reason: format!(
                            "'{s}' is not a valid mode. Please select \"greedy\", \"humble\", \"ligands\" or the letter of the chain to be used"
                        ),
                    }),
                }
            }
        }
    }
}

impl fmt::Display for AutoMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AutoMode::Greedy => write!(f, "greedy"),
            AutoMode::Humble => write!(f, "humble"),
            AutoMode::Ligands => write!(f, "ligands"),
            AutoMode::Chain(chain) => write!(f, "{chain}"),
        }
    }
}

/// Quality checks of the wider workflow. Granting mercy for a flag downgrades its
/// failures from fatal errors to warnings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TestFlag {
    StableBonds,
    CoherentBonds,
    TrajectoryIntegrity,
    ReferenceSequence,
    StableInteractions,
}

impl TestFlag {
    pub const ALL: [TestFlag; 5] = [
        TestFlag::StableBonds,
        TestFlag::CoherentBonds,
        TestFlag::TrajectoryIntegrity,
        TestFlag::ReferenceSequence,
        TestFlag::StableInteractions,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TestFlag::StableBonds => "stabonds",
            TestFlag::CoherentBonds => "cohbonds",
            TestFlag::TrajectoryIntegrity => "intrajrity",
            TestFlag::ReferenceSequence => "refseq",
            TestFlag::StableInteractions => "interact",
        }
    }
}

impl FromStr for TestFlag {
    type Err = ConfigError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TestFlag::ALL
            .into_iter()
            .find(|flag| flag.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ConfigError::InvalidParameter {
                name: "mercy",
                reason: format!("unknown test flag '{s}'"),
            })
    }
}

impl fmt::Display for TestFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One ligand of the system, possibly present in several physical copies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LigandMapEntry {
    pub name: String,
    pub residue_indices: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InteractionConfig {
    pub interactions: Vec<PendingInteractionSpec>,
    pub auto: Option<AutoMode>,
    pub ligand_map: Vec<LigandMapEntry>,
    pub mercy: Vec<TestFlag>,
    pub interaction_cutoff: f64,
    pub frames_limit: usize,
    pub backup_path: PathBuf,
    pub pbc_selection: Option<String>,
    pub selection_syntax: SelectionSyntax,
}

impl InteractionConfig {
    pub fn has_mercy(&self, flag: TestFlag) -> bool {
        self.mercy.contains(&flag)
    }
}

#[derive(Default)]
pub struct InteractionConfigBuilder {
    interactions: Vec<PendingInteractionSpec>,
    auto: Option<AutoMode>,
    ligand_map: Vec<LigandMapEntry>,
    mercy: Vec<TestFlag>,
    interaction_cutoff: Option<f64>,
    frames_limit: Option<usize>,
    backup_path: Option<PathBuf>,
    pbc_selection: Option<String>,
    selection_syntax: SelectionSyntax,
}

impl InteractionConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn interactions(mut self, interactions: Vec<PendingInteractionSpec>) -> Self {
        self.interactions = interactions;
        self
    }
    pub fn auto(mut self, mode: AutoMode) -> Self {
        self.auto = Some(mode);
        self
    }
    pub fn ligand_map(mut self, ligands: Vec<LigandMapEntry>) -> Self {
        self.ligand_map = ligands;
        self
    }
    pub fn mercy(mut self, flags: Vec<TestFlag>) -> Self {
        self.mercy = flags;
        self
    }
    pub fn interaction_cutoff(mut self, cutoff: f64) -> Self {
        self.interaction_cutoff = Some(cutoff);
        self
    }
    pub fn frames_limit(mut self, limit: usize) -> Self {
        self.frames_limit = Some(limit);
        self
    }
    pub fn backup_path(mut self, path: PathBuf) -> Self {
        self.backup_path = Some(path);
        self
    }
    pub fn pbc_selection(mut self, selection: String) -> Self {
        self.pbc_selection = Some(selection);
        self
    }
    pub fn selection_syntax(mut self, syntax: SelectionSyntax) -> Self {
        self.selection_syntax = syntax;
        self
    }

    pub fn build(self) -> Result<InteractionConfig, ConfigError> {
        let interaction_cutoff = self
            .interaction_cutoff
            .unwrap_or(DEFAULT_INTERACTION_CUTOFF);
        if !(0.0..=1.0).contains(&interaction_cutoff) {
            return Err(ConfigError::InvalidParameter {
                name: "interaction_cutoff",
                reason: format!("{interaction_cutoff} is not a fraction between 0 and 1"),
            });
        }

        let frames_limit = self.frames_limit.unwrap_or(DEFAULT_FRAMES_LIMIT);
        if frames_limit == 0 {
            return Err(ConfigError::InvalidParameter {
                name: "frames_limit",
                reason: "at least one frame must be analysed".to_string(),
            });
        }

        for spec in &self.interactions {
            if let Some(cutoff) = spec.distance_cutoff {
                if !(cutoff.is_finite() && cutoff > 0.0) {
                    return Err(ConfigError::InvalidParameter {
                        name: "distance_cutoff",
                        reason: format!("{cutoff} in interaction '{}' must be positive", spec.name),
                    });
                }
            }
        }

        let mut mercy: Vec<TestFlag> = Vec::with_capacity(self.mercy.len());
        for flag in self.mercy {
            if !mercy.contains(&flag) {
                mercy.push(flag);
            }
        }

        Ok(InteractionConfig {
            interactions: self.interactions,
            auto: self.auto,
            ligand_map: self.ligand_map,
            mercy,
            interaction_cutoff,
            frames_limit,
            backup_path: self
                .backup_path
                .ok_or(ConfigError::MissingParameter("backup_path"))?,
            pbc_selection: self.pbc_selection,
            selection_syntax: self.selection_syntax,
        })
    }
}
