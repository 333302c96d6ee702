use crate::core::models::builder::StructureBuilder;
use crate::core::models::structure::{Structure, StructureError};
use crate::core::models::trajectory::{Frame, Trajectory};
use nalgebra::Point3;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Malformed snapshot JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Inconsistent topology: {0}")]
    Structure(#[from] StructureError),
    #[error("Frame {frame} has {found} positions but the topology has {expected} atoms")]
    FrameSize {
        frame: usize,
        expected: usize,
        found: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChainRecord {
    pub name: char,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResidueRecord {
    pub name: String,
    pub number: isize,
    /// Index into `chains`.
    pub chain: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AtomRecord {
    pub name: String,
    pub element: String,
    /// Index into `residues`.
    pub residue: usize,
}

/// A serialized molecular system: topology plus coordinate frames.
///
/// ```json
/// {
///   "chains": [{ "name": "A" }],
///   "residues": [{ "name": "ALA", "number": 1, "chain": 0 }],
///   "atoms": [{ "name": "CA", "element": "C", "residue": 0 }],
///   "bonds": [],
///   "frames": [[[0.0, 0.0, 0.0]]]
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SystemSnapshot {
    pub chains: Vec<ChainRecord>,
    pub residues: Vec<ResidueRecord>,
    pub atoms: Vec<AtomRecord>,
    #[serde(default)]
    pub bonds: Vec<[usize; 2]>,
    #[serde(default)]
    pub frames: Vec<Vec<[f64; 3]>>,
}

impl SystemSnapshot {
    pub fn read_from(reader: &mut impl BufRead) -> Result<Self, SnapshotError> {
        Ok(serde_json::from_reader(reader)?)
    }

    pub fn read_from_path(path: impl AsRef<Path>) -> Result<Self, SnapshotError> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        Self::read_from(&mut reader)
    }

    pub fn write_to(&self, writer: &mut impl Write) -> Result<(), SnapshotError> {
        serde_json::to_writer(&mut *writer, self)?;
        writer.flush()?;
        Ok(())
    }

    pub fn write_to_path(&self, path: impl AsRef<Path>) -> Result<(), SnapshotError> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        self.write_to(&mut writer)
    }

    /// Captures an existing structure and trajectory.
    pub fn from_system(structure: &Structure, trajectory: &Trajectory) -> Self {
        Self {
            chains: structure
                .chains()
                .iter()
                .map(|chain| ChainRecord { name: chain.name })
                .collect(),
            residues: structure
                .residues()
                .iter()
                .map(|residue| ResidueRecord {
                    name: residue.name.clone(),
                    number: residue.number,
                    chain: residue.chain_index,
                })
                .collect(),
            atoms: structure
                .atoms()
                .iter()
                .map(|atom| AtomRecord {
                    name: atom.name.clone(),
                    element: atom.element.clone(),
                    residue: atom.residue_index,
                })
                .collect(),
            bonds: structure.bonds().iter().map(|bond| bond.as_pair()).collect(),
            frames: trajectory
                .frames()
                .iter()
                .map(|frame| frame.iter().map(|p| [p.x, p.y, p.z]).collect())
                .collect(),
        }
    }

    /// Builds the structure and trajectory described by this snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError::Structure`] when a record references a missing chain,
    /// residue or atom, and [`SnapshotError::FrameSize`] when a frame does not hold
    /// exactly one position per atom.
    pub fn into_system(self) -> Result<(Structure, Trajectory), SnapshotError> {
        let mut builder = StructureBuilder::new();
        let chain_indices: Vec<usize> = self
            .chains
            .iter()
            .map(|chain| builder.add_chain(chain.name))
            .collect();

        for residue in &self.residues {
            let chain_index = *chain_indices.get(residue.chain).ok_or(
                StructureError::ChainOutOfBounds {
                    index: residue.chain,
                    count: chain_indices.len(),
                },
            )?;
            builder.add_residue(chain_index, residue.number, &residue.name)?;
        }
        for atom in &self.atoms {
            builder.add_atom(atom.residue, &atom.name, &atom.element)?;
        }
        for &[a, b] in &self.bonds {
            builder.add_bond(a, b)?;
        }
        let structure = builder.build();

        let expected = structure.atom_count();
        let frames = self
            .frames
            .into_iter()
            .enumerate()
            .map(|(frame, positions)| {
                if positions.len() != expected {
                    return Err(SnapshotError::FrameSize {
                        frame,
                        expected,
                        found: positions.len(),
                    });
                }
                Ok(positions
                    .into_iter()
                    .map(|[x, y, z]| Point3::new(x, y, z))
                    .collect())
            })
            .collect::<Result<Vec<Frame>, _>>()?;

        Ok((structure, Trajectory::new(frames)))
    }
}
