//! Keyword selection language.
//!
//! - `all`, `none`
//! - `protein`, `nucleic`, `water`, `ion`, `ligand` (residue families)
//! - `name CA CB`, `element C N`, `resname ALA GLY`
//! - `resid 1-10 15 20:25 30 to 40` (author residue numbers, negatives allowed)
//! - `residue 0 to 4` (zero-based residue indices)
//! - `index 0 5-9` (zero-based atom indices)
//! - `chain A B`
//!
//! Combinators: `and`, `or`, `not`, parentheses. Keywords are case-insensitive.

use super::{Selection, SelectionError};
use crate::core::models::atom::Atom;
use crate::core::models::structure::Structure;
use crate::core::utils::identifiers::ResidueKind;

// Tokens that end a value list. Selector keywords are not among them, so `resname ION`
// reads `ION` as a residue name.
const SEPARATORS: &[&str] = &["and", "or", "not", "(", ")", "to"];

#[derive(Debug, Clone, PartialEq)]
enum Selector {
    All,
    None,
    Kind(ResidueKind),
    Name(Vec<String>),
    Element(Vec<String>),
    ResName(Vec<String>),
    ResId(Vec<(isize, isize)>),
    Residue(Vec<(usize, usize)>),
    Index(Vec<(usize, usize)>),
    Chain(Vec<char>),
    Not(Box<Selector>),
    And(Box<Selector>, Box<Selector>),
    Or(Box<Selector>, Box<Selector>),
}

impl Selector {
    fn matches(&self, structure: &Structure, atom: &Atom) -> bool {
        let residue = &structure.residues()[atom.residue_index];
        match self {
            Self::All => true,
            Self::None => false,
            Self::Kind(kind) => residue.kind() == *kind,
            Self::Name(names) => names.iter().any(|n| n.eq_ignore_ascii_case(&atom.name)),
            Self::Element(elements) => elements
                .iter()
                .any(|e| e.eq_ignore_ascii_case(&atom.element)),
            Self::ResName(names) => names.iter().any(|n| n.eq_ignore_ascii_case(&residue.name)),
            Self::ResId(ranges) => in_ranges(ranges, residue.number),
            Self::Residue(ranges) => in_ranges(ranges, residue.index),
            Self::Index(ranges) => in_ranges(ranges, atom.index),
            Self::Chain(names) => names.contains(&structure.chains()[residue.chain_index].name),
            Self::Not(inner) => !inner.matches(structure, atom),
            Self::And(l, r) => l.matches(structure, atom) && r.matches(structure, atom),
            Self::Or(l, r) => l.matches(structure, atom) || r.matches(structure, atom),
        }
    }
}

fn in_ranges<T: PartialOrd + Copy>(ranges: &[(T, T)], value: T) -> bool {
    ranges
        .iter()
        .any(|&(start, end)| value >= start && value <= end)
}

pub(super) fn evaluate(structure: &Structure, expression: &str) -> Result<Selection, SelectionError> {
    let selector = parse(expression)?;
    Ok(Selection::from_sorted_unique(
        structure
            .atoms()
            .iter()
            .filter(|atom| selector.matches(structure, atom))
            .map(|atom| atom.index)
            .collect(),
    ))
}

fn parse(expression: &str) -> Result<Selector, SelectionError> {
    let tokens = tokenize(expression);
    if tokens.is_empty() {
        return Err(SelectionError::Empty);
    }
    let mut parser = Parser { tokens, pos: 0 };
    let selector = parser.parse_or()?;
    match parser.peek() {
        None => Ok(selector),
        Some(")") => Err(SelectionError::UnbalancedParentheses),
        Some(token) => Err(SelectionError::UnexpectedToken {
            token: token.to_string(),
            position: parser.pos,
        }),
    }
}

fn tokenize(input: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut word = String::new();
    for ch in input.chars() {
        if ch.is_whitespace() || ch == '(' || ch == ')' {
            if !word.is_empty() {
                tokens.push(std::mem::take(&mut word));
            }
            if ch == '(' || ch == ')' {
                tokens.push(ch.to_string());
            }
        } else {
            word.push(ch);
        }
    }
    if !word.is_empty() {
        tokens.push(word);
    }
    tokens
}

fn is_separator(token: &str) -> bool {
    SEPARATORS.iter().any(|k| k.eq_ignore_ascii_case(token))
}

struct Parser {
    tokens: Vec<String>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&str> {
        self.tokens.get(self.pos).map(String::as_str)
    }

    fn peek_is(&self, keyword: &str) -> bool {
        self.peek().is_some_and(|t| t.eq_ignore_ascii_case(keyword))
    }

    fn advance(&mut self) -> Option<String> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn parse_or(&mut self) -> Result<Selector, SelectionError> {
        let mut left = self.parse_and()?;
        while self.peek_is("or") {
            self.advance();
            let right = self.parse_and()?;
            left = Selector::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Selector, SelectionError> {
        let mut left = self.parse_not()?;
        while self.peek_is("and") {
            self.advance();
            let right = self.parse_not()?;
            left = Selector::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_not(&mut self) -> Result<Selector, SelectionError> {
        if self.peek_is("not") {
            self.advance();
            let inner = self.parse_not()?;
            Ok(Selector::Not(Box::new(inner)))
        } else {
            self.parse_primary()
        }
    }

    fn parse_primary(&mut self) -> Result<Selector, SelectionError> {
        let position = self.pos;
        let token = self.advance().ok_or(SelectionError::UnexpectedEnd)?;
        let keyword = token.to_ascii_lowercase();

        let selector = match keyword.as_str() {
            "(" => {
                let inner = self.parse_or()?;
                return match self.advance().as_deref() {
                    Some(")") => Ok(inner),
                    _ => Err(SelectionError::UnbalancedParentheses),
                };
            }
            ")" => return Err(SelectionError::UnbalancedParentheses),
            "all" => Selector::All,
            "none" => Selector::None,
            "protein" => Selector::Kind(ResidueKind::AminoAcid),
            "nucleic" => Selector::Kind(ResidueKind::Nucleotide),
            "water" => Selector::Kind(ResidueKind::Water),
            "ion" => Selector::Kind(ResidueKind::Ion),
            "ligand" => Selector::Kind(ResidueKind::Other),
            "name" => Selector::Name(self.parse_words(&keyword)?),
            "element" => Selector::Element(self.parse_words(&keyword)?),
            "resname" => Selector::ResName(self.parse_words(&keyword)?),
            "chain" => Selector::Chain(self.parse_chain_names(&keyword)?),
            "resid" => Selector::ResId(self.parse_ranges(&keyword)?),
            "residue" => Selector::Residue(self.parse_ranges(&keyword)?),
            "index" => Selector::Index(self.parse_ranges(&keyword)?),
            _ => return Err(SelectionError::UnexpectedToken { token, position }),
        };
        Ok(selector)
    }

    fn parse_words(&mut self, keyword: &str) -> Result<Vec<String>, SelectionError> {
        let mut values = Vec::new();
        while let Some(token) = self.peek() {
            if is_separator(token) {
                break;
            }
            values.push(token.to_string());
            self.pos += 1;
        }
        if values.is_empty() {
            return Err(SelectionError::MissingValue(keyword.to_string()));
        }
        Ok(values)
    }

    fn parse_chain_names(&mut self, keyword: &str) -> Result<Vec<char>, SelectionError> {
        let words = self.parse_words(keyword)?;
        words
            .into_iter()
            .map(|word| {
                let mut chars = word.chars();
                match (chars.next(), chars.next()) {
                    (Some(name), None) => Ok(name),
                    _ => Err(SelectionError::UnexpectedToken {
                        token: word,
                        position: self.pos,
                    }),
                }
            })
            .collect()
    }

    fn parse_ranges<T>(&mut self, keyword: &str) -> Result<Vec<(T, T)>, SelectionError>
    where
        T: std::str::FromStr + PartialOrd + Copy,
    {
        let mut ranges = Vec::new();
        while let Some(token) = self.peek() {
            if is_separator(token) {
                break;
            }
            let token = token.to_string();
            self.pos += 1;

            let (start, mut end) = parse_range::<T>(&token)?;
            if self.peek_is("to") {
                self.advance();
                let bound = self
                    .advance()
                    .ok_or(SelectionError::MissingValue("to".to_string()))?;
                end = parse_number::<T>(&bound)?;
            }
            ranges.push((start, end));
        }
        if ranges.is_empty() {
            return Err(SelectionError::MissingValue(keyword.to_string()));
        }
        Ok(ranges)
    }
}

fn parse_number<T: std::str::FromStr>(token: &str) -> Result<T, SelectionError> {
    token
        .parse()
        .map_err(|_| SelectionError::InvalidNumber(token.to_string()))
}

// Accepts `5`, `-3`, `1-10`, `1:10` and `-5--2`.
fn parse_range<T: std::str::FromStr + Copy>(token: &str) -> Result<(T, T), SelectionError> {
    if let Ok(value) = token.parse::<T>() {
        return Ok((value, value));
    }
    let separator = token
        .find(':')
        .or_else(|| token.char_indices().skip(1).find(|&(_, c)| c == '-').map(|(i, _)| i))
        .ok_or_else(|| SelectionError::InvalidNumber(token.to_string()))?;
    let start = parse_number(&token[..separator])?;
    let end = parse_number(&token[separator + 1..])?;
    Ok((start, end))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::builder::StructureBuilder;

    // Chain A: ALA(5) GLY(6); chain B: DA(-1); chain W: HOH(1) NA(2); chain L: ATP(1).
    fn create_test_structure() -> Structure {
        let mut builder = StructureBuilder::new();
        let a = builder.add_chain('A');
        let ala = builder.add_residue(a, 5, "ALA").unwrap();
        builder.add_atom(ala, "N", "N").unwrap(); // 0
        builder.add_atom(ala, "CA", "C").unwrap(); // 1
        let gly = builder.add_residue(a, 6, "GLY").unwrap();
        builder.add_atom(gly, "CA", "C").unwrap(); // 2
        let b = builder.add_chain('B');
        let da = builder.add_residue(b, -1, "DA").unwrap();
        builder.add_atom(da, "P", "P").unwrap(); // 3
        let w = builder.add_chain('W');
        let hoh = builder.add_residue(w, 1, "HOH").unwrap();
        builder.add_atom(hoh, "O", "O").unwrap(); // 4
        let na = builder.add_residue(w, 2, "NA").unwrap();
        builder.add_atom(na, "NA", "Na").unwrap(); // 5
        let l = builder.add_chain('L');
        let atp = builder.add_residue(l, 1, "ATP").unwrap();
        builder.add_atom(atp, "PG", "P").unwrap(); // 6
        builder.build()
    }

    fn select(expression: &str) -> Vec<usize> {
        evaluate(&create_test_structure(), expression)
            .unwrap()
            .indices()
            .to_vec()
    }

    #[test]
    fn macros_select_residue_families() {
        assert_eq!(select("all"), vec![0, 1, 2, 3, 4, 5, 6]);
        assert!(select("none").is_empty());
        assert_eq!(select("protein"), vec![0, 1, 2]);
        assert_eq!(select("nucleic"), vec![3]);
        assert_eq!(select("water"), vec![4]);
        assert_eq!(select("ion"), vec![5]);
        assert_eq!(select("ligand"), vec![6]);
    }

    #[test]
    fn attribute_keywords_match_case_insensitively() {
        assert_eq!(select("name ca"), vec![1, 2]);
        assert_eq!(select("NAME N P"), vec![0, 3]);
        assert_eq!(select("element p"), vec![3, 6]);
        assert_eq!(select("resname gly atp"), vec![2, 6]);
        assert_eq!(select("chain A L"), vec![0, 1, 2, 6]);
    }

    #[test]
    fn resid_supports_ranges_and_negative_numbers() {
        assert_eq!(select("resid 5"), vec![0, 1]);
        assert_eq!(select("resid 5-6"), vec![0, 1, 2]);
        assert_eq!(select("resid 5:6"), vec![0, 1, 2]);
        assert_eq!(select("resid -1"), vec![3]);
        assert_eq!(select("resid -2--1"), vec![3]);
        assert_eq!(select("resid 1 to 2"), vec![4, 5, 6]);
    }

    #[test]
    fn residue_and_index_are_zero_based() {
        assert_eq!(select("residue 0"), vec![0, 1]);
        assert_eq!(select("residue 1 to 2"), vec![2, 3]);
        assert_eq!(select("index 0 4-5"), vec![0, 4, 5]);
    }

    #[test]
    fn boolean_combinators_and_parentheses() {
        assert_eq!(select("chain A and name CA"), vec![1, 2]);
        assert_eq!(select("protein or water"), vec![0, 1, 2, 4]);
        assert_eq!(select("not chain A"), vec![3, 4, 5, 6]);
        assert_eq!(select("not (chain A or chain W)"), vec![3, 6]);
        assert_eq!(select("(chain A or chain B) and not name N"), vec![1, 2, 3]);
        assert_eq!(select("chain W or chain A and name N"), vec![0, 4, 5]);
    }

    #[test]
    fn valid_expression_matching_nothing_is_empty_not_an_error() {
        assert!(select("resname XYZ").is_empty());
        assert!(select("index 100").is_empty());
    }

    #[test]
    fn selector_keywords_are_accepted_as_values() {
        let mut builder = StructureBuilder::new();
        let i = builder.add_chain('I');
        let ion = builder.add_residue(i, 1, "ION").unwrap();
        builder.add_atom(ion, "NONE", "Cl").unwrap();
        let ca = builder.add_residue(i, 2, "CA").unwrap();
        builder.add_atom(ca, "ALL", "Ca").unwrap();
        let structure = builder.build();
        let select = |expr: &str| evaluate(&structure, expr).unwrap().indices().to_vec();

        assert_eq!(select("resname ION"), vec![0]);
        assert_eq!(select("name NONE ALL"), vec![0, 1]);
        assert_eq!(select("resname ion and not name all"), vec![0]);
        assert_eq!(select("(resname CA) or chain I"), vec![0, 1]);
    }

    #[test]
    fn malformed_expressions_are_rejected() {
        let structure = create_test_structure();
        let err = |expr: &str| evaluate(&structure, expr).unwrap_err();

        assert_eq!(err(""), SelectionError::Empty);
        assert_eq!(err("   "), SelectionError::Empty);
        assert_eq!(err("chain A and"), SelectionError::UnexpectedEnd);
        assert_eq!(err("name"), SelectionError::MissingValue("name".to_string()));
        assert_eq!(err("resid abc"), SelectionError::InvalidNumber("abc".to_string()));
        assert_eq!(err("(chain A"), SelectionError::UnbalancedParentheses);
        assert_eq!(err("chain A)"), SelectionError::UnbalancedParentheses);
        assert!(matches!(
            err("banana"),
            SelectionError::UnexpectedToken { position: 0, .. }
        ));
        assert!(matches!(
            err("chain AB"),
            SelectionError::UnexpectedToken { .. }
        ));
    }
}
