use crate::cli::{InteractionsArgs, SyntaxArg};
use crate::error::{CliError, Result};
use mdcontacts::engine::config as core_config;
use mdcontacts::engine::interaction::PendingInteractionSpec;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

const DEFAULT_OUTPUT_FILE: &str = "interactions.json";

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct PartialInteractionSpec {
    name: String,
    agent_1: String,
    agent_2: String,
    selection_1: String,
    selection_2: String,
    distance_cutoff: Option<f64>,
    #[serde(rename = "type")]
    interaction_type: Option<String>,
}

impl From<PartialInteractionSpec> for PendingInteractionSpec {
    fn from(p: PartialInteractionSpec) -> Self {
        let mut spec =
            PendingInteractionSpec::new(p.name, p.agent_1, p.agent_2, p.selection_1, p.selection_2);
        if let Some(cutoff) = p.distance_cutoff {
            spec = spec.with_distance_cutoff(cutoff);
        }
        if let Some(interaction_type) = p.interaction_type {
            spec = spec.with_declared_type(interaction_type);
        }
        spec
    }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
struct PartialLigandEntry {
    name: String,
    residues: Vec<usize>,
}

impl From<PartialLigandEntry> for core_config::LigandMapEntry {
    fn from(p: PartialLigandEntry) -> Self {
        Self {
            name: p.name,
            residue_indices: p.residues,
        }
    }
}

/// The `interactions` section of a configuration file, before CLI overrides.
#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct PartialInteractionsConfig {
    auto: Option<String>,
    #[serde(default)]
    mercy: Vec<String>,
    interaction_cutoff: Option<f64>,
    frames_limit: Option<usize>,
    pbc_selection: Option<String>,
    selection_syntax: Option<SyntaxArg>,
    output: Option<PathBuf>,
    #[serde(default)]
    interactions: Vec<PartialInteractionSpec>,
    #[serde(default)]
    ligands: Vec<PartialLigandEntry>,
}

impl PartialInteractionsConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }

    pub fn merge_with_cli(mut self, args: &InteractionsArgs) -> Result<core_config::InteractionConfig> {
        self.apply_set_values(&args.set_values)?;

        let mut builder = core_config::InteractionConfigBuilder::new()
            .interactions(self.interactions.into_iter().map(Into::into).collect())
            .ligand_map(self.ligands.into_iter().map(Into::into).collect())
            .backup_path(
                args.output
                    .clone()
                    .or(self.output)
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_FILE)),
            );

        if let Some(auto) = args.auto.as_ref().or(self.auto.as_ref()) {
            builder = builder.auto(Self::parse_config_value(auto)?);
        }

        let mercy = if args.mercy.is_empty() {
            self.mercy
        } else {
            args.mercy.clone()
        };
        builder = builder.mercy(Self::parse_mercy(&mercy)?);

        if let Some(cutoff) = args.interaction_cutoff.or(self.interaction_cutoff) {
            builder = builder.interaction_cutoff(cutoff);
        }
        if let Some(limit) = args.frames_limit.or(self.frames_limit) {
            builder = builder.frames_limit(limit);
        }
        if let Some(selection) = args.pbc_selection.clone().or(self.pbc_selection) {
            builder = builder.pbc_selection(selection);
        }
        if let Some(syntax) = args.syntax.or(self.selection_syntax) {
            builder = builder.selection_syntax(syntax.into());
        }

        builder.build().map_err(|e| CliError::Config(e.to_string()))
    }

    fn parse_config_value<T>(value: &str) -> Result<T>
    where
        T: FromStr<Err = core_config::ConfigError>,
    {
        value.parse().map_err(|e: core_config::ConfigError| CliError::Config(e.to_string()))
    }

    fn parse_mercy(values: &[String]) -> Result<Vec<core_config::TestFlag>> {
        if values.iter().any(|value| value.trim().eq_ignore_ascii_case("all")) {
            return Ok(core_config::TestFlag::ALL.to_vec());
        }
        values
            .iter()
            .map(|value| Self::parse_config_value(value))
            .collect()
    }

    fn apply_set_values(&mut self, set_values: &[String]) -> Result<()> {
        for kv_pair in set_values {
            let Some((key, value_str)) = kv_pair.split_once('=') else {
                return Err(CliError::Config(format!(
                    "Invalid --set format: '{}'. Expected KEY=VALUE.",
                    kv_pair
                )));
            };

            match key {
                "auto" => self.auto = Some(value_str.to_string()),
                "mercy" => {
                    self.mercy = value_str.split(',').map(str::to_string).collect();
                }
                "interaction-cutoff" => {
                    self.interaction_cutoff = Some(value_str.parse().map_err(|_| {
                        CliError::Config(format!("Invalid float value for {}: {}", key, value_str))
                    })?);
                }
                "frames-limit" => {
                    self.frames_limit = Some(value_str.parse().map_err(|_| {
                        CliError::Config(format!(
                            "Invalid integer value for {}: {}",
                            key, value_str
                        ))
                    })?);
                }
                "pbc-selection" => self.pbc_selection = Some(value_str.to_string()),
                "selection-syntax" => {
                    self.selection_syntax = Some(
                        <SyntaxArg as clap::ValueEnum>::from_str(value_str, true).map_err(|_| {
                            CliError::Config(format!(
                                "Invalid selection syntax for {}: {}",
                                key, value_str
                            ))
                        })?,
                    );
                }
                "output" => self.output = Some(PathBuf::from(value_str)),
                _ => {
                    return Err(CliError::Config(format!(
                        "Unsupported configuration key for --set: '{}'",
                        key
                    )));
                }
            }
        }
        Ok(())
    }
}
