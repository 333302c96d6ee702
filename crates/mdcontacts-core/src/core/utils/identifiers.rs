use phf::{Set, phf_set};

static AMINO_ACID_NAMES: Set<&'static str> = phf_set! {
    "ALA", "ARG", "ASN", "ASP", "CYS", "GLN", "GLU", "GLY", "HIS", "ILE",
    "LEU", "LYS", "MET", "PHE", "PRO", "SER", "THR", "TRP", "TYR", "VAL",
    "HID", "HIE", "HIP", "HSD", "HSE", "HSP", "CYX", "CYM", "ASH", "GLH",
    "LYN", "ACE", "NME", "NMA", "SEC", "PYL", "MSE",
};

static NUCLEOTIDE_NAMES: Set<&'static str> = phf_set! {
    "A", "C", "G", "T", "U", "I",
    "DA", "DC", "DG", "DT", "DU", "DI",
    "RA", "RC", "RG", "RU",
    "A3", "A5", "C3", "C5", "G3", "G5", "U3", "U5",
    "DA3", "DA5", "DC3", "DC5", "DG3", "DG5", "DT3", "DT5",
};

static WATER_NAMES: Set<&'static str> = phf_set! {
    "HOH", "WAT", "SOL", "H2O", "DOD", "TIP", "TIP3", "TIP4", "TIP5", "T3P", "T4P", "SPC",
};

static ION_NAMES: Set<&'static str> = phf_set! {
    "NA", "CL", "K", "MG", "CA", "ZN", "MN", "FE", "CU", "NI", "CO", "CD", "LI", "RB", "CS",
    "NA+", "CL-", "K+", "SOD", "CLA", "POT", "CAL", "MG2", "ZN2",
};

/// Chemical family of a residue, derived from its name alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResidueKind {
    AminoAcid,
    Nucleotide,
    Water,
    Ion,
    Other,
}

impl ResidueKind {
    pub fn is_amino_acid(self) -> bool {
        self == ResidueKind::AminoAcid
    }

    pub fn is_nucleotide(self) -> bool {
        self == ResidueKind::Nucleotide
    }

    /// Water and ions, which never form a ligand on their own.
    pub fn is_solvent(self) -> bool {
        matches!(self, ResidueKind::Water | ResidueKind::Ion)
    }
}

pub fn classify_residue_name(residue_name: &str) -> ResidueKind {
    let name = residue_name.trim().to_ascii_uppercase();
    let name = name.as_str();
    if AMINO_ACID_NAMES.contains(name) {
        ResidueKind::AminoAcid
    } else if NUCLEOTIDE_NAMES.contains(name) {
        ResidueKind::Nucleotide
    } else if WATER_NAMES.contains(name) {
        ResidueKind::Water
    } else if ION_NAMES.contains(name) {
        ResidueKind::Ion
    } else {
        ResidueKind::Other
    }
}
