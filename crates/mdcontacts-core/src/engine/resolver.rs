use super::config::{AutoMode, LigandMapEntry};
use super::context::RunContext;
use super::error::EngineError;
use super::interaction::{PendingInteractionSpec, SpecOrigin, ValidatedInteractionSpec};
use crate::core::models::chain::{Chain, Classification};
use crate::core::models::structure::{Structure, StructureError};
use crate::core::selection::{Selection, SelectionSyntax};
use itertools::Itertools;
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// Builds and validates the list of interactions to evaluate.
pub struct InteractionSpecResolver<'a> {
    structure: &'a Structure,
    syntax: SelectionSyntax,
    pbc: Selection,
    ligand_map: &'a [LigandMapEntry],
}

impl<'a> InteractionSpecResolver<'a> {
    /// Creates a resolver for the structure and configuration of `context`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Input`] if the periodic-boundary selection is malformed.
    pub fn new(context: &RunContext<'a>) -> Result<Self, EngineError> {
        let syntax = context.config.selection_syntax;
        let pbc = match &context.config.pbc_selection {
            Some(expression) => context.structure.select(expression, syntax).map_err(|e| {
                EngineError::Input(format!("Invalid PBC selection '{expression}': {e}"))
            })?,
            None => Selection::empty(),
        };
        Ok(Self {
            structure: context.structure,
            syntax,
            pbc,
            ligand_map: &context.config.ligand_map,
        })
    }

    /// Produces the validated interaction list: explicit specifications first, followed
    /// by those generated by `auto`.
    pub fn resolve(
        &self,
        explicit: &[PendingInteractionSpec],
        auto: Option<AutoMode>,
    ) -> Result<Vec<ValidatedInteractionSpec>, EngineError> {
        let mut pending: Vec<(PendingInteractionSpec, SpecOrigin)> = explicit
            .iter()
            .cloned()
            .map(|spec| (spec, SpecOrigin::Explicit))
            .collect();

        if let Some(mode) = auto {
            info!("Processing interactions automatically. Option \"{}\" is selected", mode);
            pending.extend(
                self.generate(mode)?
                    .into_iter()
                    .map(|spec| (spec, SpecOrigin::Generated)),
            );
        }

        if pending.is_empty() {
            return Ok(Vec::new());
        }
        self.validate(pending)
    }

    /// Protein and nucleic chains that are not entirely inside the PBC selection, in
    /// structure order.
    pub fn eligible_chains(&self) -> Result<Vec<&'a Chain>, EngineError> {
        let structure = self.structure;
        let mut eligible = Vec::new();
        for chain in structure.chains() {
            if !chain.classification.is_polymer() {
                continue;
            }
            let selection = structure
                .chain_selection(chain.index)
                .map_err(|e| EngineError::Internal(e.to_string()))?;
            if selection.difference(&self.pbc).is_empty() {
                debug!("Chain {} lies entirely in the PBC selection, skipping", chain.name);
                continue;
            }
            eligible.push(chain);
        }
        Ok(eligible)
    }

    pub fn generate(&self, mode: AutoMode) -> Result<Vec<PendingInteractionSpec>, EngineError> {
        let chains = self.eligible_chains()?;
        match mode {
            AutoMode::Greedy => chains
                .iter()
                .tuple_combinations()
                .map(|(a, b)| self.chain_pair(a, b))
                .collect(),
            AutoMode::Humble => match chains.as_slice() {
                [a, b] => Ok(vec![self.chain_pair(a, b)?]),
                _ => Err(EngineError::Input(format!(
                    "With input \"humble\" there must be exactly 2 chains in the structure but {} were found. If not, use \"greedy\" or select the interactions manually",
                    chains.len()
                ))),
            },
            AutoMode::Chain(name) => {
                let selected = chains
                    .iter()
                    .find(|chain| chain.name == name)
                    .ok_or_else(|| {
                        EngineError::Input(format!(
                            "Selected chain \"{name}\" is not present in the structure"
                        ))
                    })?;
                chains
                    .iter()
                    .filter(|chain| chain.index != selected.index)
                    .map(|chain| self.chain_pair(selected, chain))
                    .collect()
            }
            AutoMode::Ligands => self.ligand_pairs(&chains),
        }
    }

    fn ligand_pairs(&self, chains: &[&Chain]) -> Result<Vec<PendingInteractionSpec>, EngineError> {
        if self.ligand_map.is_empty() {
            return Err(EngineError::Input(
                "No ligand map is detected. Skipping ligand interactions".to_string(),
            ));
        }

        let mut specs = Vec::new();
        for ligand in self.ligand_map {
            let selection = self
                .structure
                .select_residue_indices(&ligand.residue_indices)
                .map_err(|e| match e {
                    StructureError::ResidueOutOfBounds { index, .. } => EngineError::Input(format!(
                        "Ligand \"{}\" references residue {index}, which is not in the structure",
                        ligand.name
                    )),
                    other => EngineError::Internal(other.to_string()),
                })?;

            for (number, fragment) in self.structure.find_fragments(&selection).iter().enumerate() {
                let number = number + 1;
                let ligand_chains = self.structure.chains_containing(fragment);
                let ligand_classes: HashSet<Classification> = ligand_chains
                    .iter()
                    .map(|&index| self.structure.chains()[index].classification)
                    .collect();

                let agent = format!("ligand {} {}", ligand.name, number);
                for chain in chains {
                    if ligand_chains.contains(&chain.index)
                        || ligand_classes.contains(&chain.classification)
                    {
                        continue;
                    }
                    specs.push(PendingInteractionSpec::new(
                        format!("{agent}-{} interaction", chain.label()),
                        agent.clone(),
                        chain.label(),
                        self.export(fragment),
                        self.chain_expression(chain)?,
                    ));
                }
            }
        }
        Ok(specs)
    }

    fn chain_pair(&self, a: &Chain, b: &Chain) -> Result<PendingInteractionSpec, EngineError> {
        let (label_a, label_b) = (a.label(), b.label());
        Ok(PendingInteractionSpec::new(
            format!("{label_a}-{label_b} interaction"),
            label_a,
            label_b,
            self.chain_expression(a)?,
            self.chain_expression(b)?,
        ))
    }

    fn chain_expression(&self, chain: &Chain) -> Result<String, EngineError> {
        match self.syntax {
            SelectionSyntax::Vmd => Ok(chain.label()),
            SelectionSyntax::Mask => self
                .structure
                .chain_selection(chain.index)
                .map(|selection| selection.to_mask())
                .map_err(|e| EngineError::Internal(e.to_string())),
        }
    }

    fn export(&self, selection: &Selection) -> String {
        match self.syntax {
            SelectionSyntax::Vmd => selection.to_vmd(),
            SelectionSyntax::Mask => selection.to_mask(),
        }
    }

    /// Checks every specification and computes its interaction type.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Input`] for duplicate names, identical agents, invalid or
    /// empty selections, and agents sharing atoms.
    pub fn validate(
        &self,
        pending: Vec<(PendingInteractionSpec, SpecOrigin)>,
    ) -> Result<Vec<ValidatedInteractionSpec>, EngineError> {
        let unique = {
            let mut names = HashSet::new();
            pending.iter().all(|(spec, _)| names.insert(spec.name.as_str()))
        };
        if !unique {
            return Err(EngineError::Input(
                "Interactions must have unique names".to_string(),
            ));
        }

        pending
            .into_iter()
            .map(|(spec, origin)| self.validate_one(spec, origin))
            .collect()
    }

    fn validate_one(
        &self,
        spec: PendingInteractionSpec,
        origin: SpecOrigin,
    ) -> Result<ValidatedInteractionSpec, EngineError> {
        let name = &spec.name;
        if spec.agent_1 == spec.agent_2 {
            return Err(EngineError::Input(format!(
                "Interaction agents must have different names at {name}"
            )));
        }
        if spec.selection_1 == spec.selection_2 {
            return Err(EngineError::Input(format!(
                "Interaction agents must have different selections at {name}"
            )));
        }

        let selection_1 = self.agent_selection(name, 1, &spec.agent_1, &spec.selection_1)?;
        let selection_2 = self.agent_selection(name, 2, &spec.agent_2, &spec.selection_2)?;

        let overlap = selection_1.intersect(&selection_2);
        if !overlap.is_empty() {
            return Err(EngineError::Input(format!(
                "Agents in interaction \"{name}\" have {} overlapping atoms",
                overlap.len()
            )));
        }

        let interaction_type = [
            self.structure.get_selection_classification(&selection_1),
            self.structure.get_selection_classification(&selection_2),
        ]
        .iter()
        .map(Classification::as_str)
        .sorted()
        .join("-");

        if let Some(declared) = &spec.declared_type {
            warn!(
                "Interaction \"{}\" declares type \"{}\", which is ignored. The type is computed as \"{}\"",
                name, declared, interaction_type
            );
        }

        Ok(ValidatedInteractionSpec {
            distance_cutoff: spec.distance_cutoff(),
            name: spec.name,
            agent_1: spec.agent_1,
            agent_2: spec.agent_2,
            selection_1: spec.selection_1,
            selection_2: spec.selection_2,
            interaction_type,
            origin,
        })
    }

    fn agent_selection(
        &self,
        name: &str,
        agent_number: u8,
        agent: &str,
        expression: &str,
    ) -> Result<Selection, EngineError> {
        let invalid = |reason: String| {
            EngineError::Input(format!(
                "Interaction \"{name}\" has a non valid (or empty) selection for agent {agent_number} ({agent}): {expression} ({reason})"
            ))
        };
        let selection = self
            .structure
            .select(expression, self.syntax)
            .map_err(|e| invalid(e.to_string()))?;
        if selection.is_empty() {
            return Err(invalid("no atoms selected".to_string()));
        }
        Ok(selection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::builder::StructureBuilder;
    use crate::engine::config::{InteractionConfig, InteractionConfigBuilder};
    use crate::engine::context::WarningRegister;
    use crate::engine::progress::ProgressReporter;
    use std::path::PathBuf;

    fn add_polymer(builder: &mut StructureBuilder, name: char, residue: &str, count: isize) {
        let chain = builder.add_chain(name);
        for number in 1..=count {
            let res = builder.add_residue(chain, number, residue).unwrap();
            builder.add_atom(res, "X", "C").unwrap();
        }
    }

    // Residue layout of the ligand test structure:
    // A (protein): 0, 1 | B (protein): 2, 3 | N (nucleic): 4, 5
    // L (ligand chain): 6, 7 as two unbonded LIG copies | A also holds HEM at residue 8.
    fn create_ligand_structure() -> Structure {
        let mut builder = StructureBuilder::new();
        add_polymer(&mut builder, 'A', "ALA", 2);
        add_polymer(&mut builder, 'B', "GLY", 2);
        add_polymer(&mut builder, 'N', "DA", 2);
        let l = builder.add_chain('L');
        for number in 1..=2 {
            let res = builder.add_residue(l, number, "LIG").unwrap();
            let c1 = builder.add_atom(res, "C1", "C").unwrap();
            let c2 = builder.add_atom(res, "C2", "C").unwrap();
            builder.add_bond(c1, c2).unwrap();
        }
        let a = builder.add_chain('A');
        let hem = builder.add_residue(a, 100, "HEM").unwrap();
        builder.add_atom(hem, "FE", "Fe").unwrap();
        builder.build()
    }

    fn create_chains_structure(names: &[char]) -> Structure {
        let mut builder = StructureBuilder::new();
        for &name in names {
            add_polymer(&mut builder, name, "ALA", 2);
        }
        builder.build()
    }

    fn config_with(ligands: Vec<LigandMapEntry>, pbc: Option<&str>) -> InteractionConfig {
        let mut builder = InteractionConfigBuilder::new()
            .backup_path(PathBuf::from("interactions.json"))
            .ligand_map(ligands);
        if let Some(pbc) = pbc {
            builder = builder.pbc_selection(pbc.to_string());
        }
        builder.build().unwrap()
    }

    fn resolve(
        structure: &Structure,
        config: &InteractionConfig,
        explicit: &[PendingInteractionSpec],
        auto: Option<AutoMode>,
    ) -> Result<Vec<ValidatedInteractionSpec>, EngineError> {
        let register = WarningRegister::new();
        let reporter = ProgressReporter::new();
        let context = RunContext::new(structure, config, &register, &reporter);
        InteractionSpecResolver::new(&context)?.resolve(explicit, auto)
    }

    fn names(specs: &[ValidatedInteractionSpec]) -> Vec<&str> {
        specs.iter().map(|spec| spec.name.as_str()).collect()
    }

    #[test]
    fn greedy_pairs_every_eligible_chain_once() {
        let structure = create_chains_structure(&['A', 'B', 'C', 'D']);
        let config = config_with(vec![], None);
        let specs = resolve(&structure, &config, &[], Some(AutoMode::Greedy)).unwrap();

        assert_eq!(specs.len(), 4 * 3 / 2);
        let unique: HashSet<_> = names(&specs).into_iter().collect();
        assert_eq!(unique.len(), specs.len());
        assert_eq!(specs[0].name, "chain A-chain B interaction");
        assert_eq!(specs[0].selection_1, "chain A");
        assert_eq!(specs[0].interaction_type, "protein-protein");
        assert!(specs.iter().all(|s| s.origin == SpecOrigin::Generated));
    }

    #[test]
    fn greedy_skips_chains_inside_pbc_selection() {
        let structure = create_chains_structure(&['A', 'B', 'C']);
        let config = config_with(vec![], Some("chain C"));
        let specs = resolve(&structure, &config, &[], Some(AutoMode::Greedy)).unwrap();
        assert_eq!(names(&specs), vec!["chain A-chain B interaction"]);
    }

    #[test]
    fn humble_requires_exactly_two_chains() {
        let config = config_with(vec![], None);

        let three = create_chains_structure(&['A', 'B', 'C']);
        assert!(matches!(
            resolve(&three, &config, &[], Some(AutoMode::Humble)),
            Err(EngineError::Input(_))
        ));

        let two = create_chains_structure(&['A', 'B']);
        let specs = resolve(&two, &config, &[], Some(AutoMode::Humble)).unwrap();
        assert_eq!(names(&specs), vec!["chain A-chain B interaction"]);
    }

    #[test]
    fn single_chain_pairs_against_all_others() {
        let structure = create_chains_structure(&['A', 'B', 'C']);
        let config = config_with(vec![], None);
        let specs = resolve(&structure, &config, &[], Some(AutoMode::Chain('B'))).unwrap();
        assert_eq!(
            names(&specs),
            vec!["chain B-chain A interaction", "chain B-chain C interaction"]
        );

        assert!(matches!(
            resolve(&structure, &config, &[], Some(AutoMode::Chain('Z'))),
            Err(EngineError::Input(message)) if message.contains("\"Z\"")
        ));
    }

    #[test]
    fn ligands_mode_requires_a_ligand_map() {
        let structure = create_ligand_structure();
        let config = config_with(vec![], None);
        assert!(matches!(
            resolve(&structure, &config, &[], Some(AutoMode::Ligands)),
            Err(EngineError::Input(_))
        ));
    }

    #[test]
    fn ligands_mode_splits_copies_into_fragments() {
        let structure = create_ligand_structure();
        let ligands = vec![LigandMapEntry {
            name: "LIG".to_string(),
            residue_indices: vec![6, 7],
        }];
        let config = config_with(ligands, None);
        let specs = resolve(&structure, &config, &[], Some(AutoMode::Ligands)).unwrap();

        assert_eq!(
            names(&specs),
            vec![
                "ligand LIG 1-chain A interaction",
                "ligand LIG 1-chain B interaction",
                "ligand LIG 1-chain N interaction",
                "ligand LIG 2-chain A interaction",
                "ligand LIG 2-chain B interaction",
                "ligand LIG 2-chain N interaction",
            ]
        );
        assert_eq!(specs[0].agent_1, "ligand LIG 1");
        assert_eq!(specs[0].selection_1, "index 6 7");
        assert_eq!(specs[3].selection_1, "index 8 9");
        assert_eq!(specs[0].interaction_type, "ligand-protein");
        assert_eq!(specs[2].interaction_type, "ligand-nucleic");
    }

    #[test]
    fn ligands_mode_skips_chains_sharing_the_ligand_classification() {
        // HEM sits inside protein chain A, so every protein chain is skipped and only the
        // nucleic chain is paired.
        let structure = create_ligand_structure();
        let ligands = vec![LigandMapEntry {
            name: "HEM".to_string(),
            residue_indices: vec![8],
        }];
        let config = config_with(ligands, None);
        let specs = resolve(&structure, &config, &[], Some(AutoMode::Ligands)).unwrap();
        assert_eq!(names(&specs), vec!["ligand HEM 1-chain N interaction"]);
    }

    #[test]
    fn ligands_mode_rejects_unknown_residues() {
        let structure = create_ligand_structure();
        let ligands = vec![LigandMapEntry {
            name: "LIG".to_string(),
            residue_indices: vec![42],
        }];
        let config = config_with(ligands, None);
        assert!(matches!(
            resolve(&structure, &config, &[], Some(AutoMode::Ligands)),
            Err(EngineError::Input(message)) if message.contains("42")
        ));
    }

    #[test]
    fn explicit_specs_come_before_generated_ones() {
        let structure = create_chains_structure(&['A', 'B']);
        let config = config_with(vec![], None);
        let explicit = vec![PendingInteractionSpec::new(
            "custom",
            "first residue",
            "last residue",
            "resid 1 and chain A",
            "resid 2 and chain B",
        )];
        let specs = resolve(&structure, &config, &explicit, Some(AutoMode::Greedy)).unwrap();
        assert_eq!(names(&specs), vec!["custom", "chain A-chain B interaction"]);
        assert_eq!(specs[0].origin, SpecOrigin::Explicit);
        assert_eq!(specs[1].origin, SpecOrigin::Generated);
    }

    #[test]
    fn no_specs_resolve_to_an_empty_list() {
        let structure = create_chains_structure(&['A']);
        let config = config_with(vec![], None);
        assert!(resolve(&structure, &config, &[], None).unwrap().is_empty());
    }

    #[test]
    fn overlapping_selections_are_rejected_with_count() {
        let mut builder = StructureBuilder::new();
        add_polymer(&mut builder, 'A', "ALA", 15);
        let long = builder.build();
        let config = config_with(vec![], None);
        let explicit = vec![PendingInteractionSpec::new(
            "overlap", "a", "b", "resid 1-10", "resid 5-15",
        )];
        assert!(matches!(
            resolve(&long, &config, &explicit, None),
            Err(EngineError::Input(message)) if message.contains("6 overlapping atoms")
        ));
    }

    #[test]
    fn validation_rejects_malformed_specs() {
        let structure = create_chains_structure(&['A', 'B']);
        let config = config_with(vec![], None);
        let check = |spec: PendingInteractionSpec| {
            matches!(
                resolve(&structure, &config, &[spec], None),
                Err(EngineError::Input(_))
            )
        };

        assert!(check(PendingInteractionSpec::new("x", "same", "same", "chain A", "chain B")));
        assert!(check(PendingInteractionSpec::new("x", "a", "b", "chain A", "chain A")));
        assert!(check(PendingInteractionSpec::new("x", "a", "b", "chain (", "chain B")));
        assert!(check(PendingInteractionSpec::new("x", "a", "b", "chain A", "chain Z")));
        assert!(check(PendingInteractionSpec::new("x", "a", "b", "", "chain B")));
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let structure = create_chains_structure(&['A', 'B', 'C']);
        let config = config_with(vec![], None);
        let explicit = vec![
            PendingInteractionSpec::new("dup", "a", "b", "chain A", "chain B"),
            PendingInteractionSpec::new("dup", "a", "c", "chain A", "chain C"),
        ];
        assert!(matches!(
            resolve(&structure, &config, &explicit, None),
            Err(EngineError::Input(message)) if message.contains("unique")
        ));
    }

    #[test]
    fn declared_type_is_replaced_by_computed_type() {
        let structure = create_chains_structure(&['A', 'B']);
        let config = config_with(vec![], None);
        let explicit = vec![
            PendingInteractionSpec::new("x", "a", "b", "chain A", "chain B")
                .with_declared_type("dna-rna"),
        ];
        let specs = resolve(&structure, &config, &explicit, None).unwrap();
        assert_eq!(specs[0].interaction_type, "protein-protein");
    }

    #[test]
    fn mask_syntax_generates_mask_expressions() {
        let structure = create_chains_structure(&['A', 'B']);
        let config = InteractionConfigBuilder::new()
            .backup_path(PathBuf::from("interactions.json"))
            .selection_syntax(SelectionSyntax::Mask)
            .build()
            .unwrap();
        let specs = resolve(&structure, &config, &[], Some(AutoMode::Greedy)).unwrap();
        assert_eq!(specs[0].selection_1, "@1-2");
        assert_eq!(specs[0].selection_2, "@3-4");

        let specs = resolve(&structure, &config, &[], Some(AutoMode::Humble)).unwrap();
        assert_eq!(specs[0].selection_2, "@3-4");
    }

    #[test]
    fn chain_pair_propagates_mask_export_failures() {
        let structure = create_chains_structure(&['A', 'B']);
        let foreign = create_chains_structure(&['A', 'B', 'C']);
        let config = InteractionConfigBuilder::new()
            .backup_path(PathBuf::from("interactions.json"))
            .selection_syntax(SelectionSyntax::Mask)
            .build()
            .unwrap();
        let register = WarningRegister::new();
        let reporter = ProgressReporter::new();
        let context = RunContext::new(&structure, &config, &register, &reporter);
        let resolver = InteractionSpecResolver::new(&context).unwrap();

        let pair = resolver.chain_pair(&structure.chains()[0], &structure.chains()[1]).unwrap();
        assert_eq!(pair.selection_1, "@1-2");
        assert!(matches!(
            resolver.chain_pair(&structure.chains()[0], &foreign.chains()[2]),
            Err(EngineError::Internal(_))
        ));
    }
}
