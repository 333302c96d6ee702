//! Amber-style atom masks.
//!
//! - `*` every atom
//! - `@1-3,7` one-based atom numbers, `@CA,CB` atom names
//! - `:1-10` one-based residue ordinals, `:ALA,GLY` residue names
//! - `!term` negation, `a & b` intersection, `a | b` union, parentheses
//!
//! `&` binds tighter than `|`.

use super::{Selection, SelectionError};
use crate::core::models::atom::Atom;
use crate::core::models::structure::Structure;

#[derive(Debug, Clone, PartialEq)]
enum Item {
    Range(usize, usize),
    Name(String),
}

#[derive(Debug, Clone, PartialEq)]
enum Mask {
    All,
    Atoms(Vec<Item>),
    Residues(Vec<Item>),
    Not(Box<Mask>),
    And(Box<Mask>, Box<Mask>),
    Or(Box<Mask>, Box<Mask>),
}

impl Mask {
    fn matches(&self, structure: &Structure, atom: &Atom) -> bool {
        match self {
            Self::All => true,
            Self::Atoms(items) => items.iter().any(|item| match item {
                Item::Range(start, end) => (*start..=*end).contains(&(atom.index + 1)),
                Item::Name(name) => name.eq_ignore_ascii_case(&atom.name),
            }),
            Self::Residues(items) => {
                let residue = &structure.residues()[atom.residue_index];
                items.iter().any(|item| match item {
                    Item::Range(start, end) => (*start..=*end).contains(&(residue.index + 1)),
                    Item::Name(name) => name.eq_ignore_ascii_case(&residue.name),
                })
            }
            Self::Not(inner) => !inner.matches(structure, atom),
            Self::And(l, r) => l.matches(structure, atom) && r.matches(structure, atom),
            Self::Or(l, r) => l.matches(structure, atom) || r.matches(structure, atom),
        }
    }
}

pub(super) fn evaluate(structure: &Structure, expression: &str) -> Result<Selection, SelectionError> {
    let mask = parse(expression)?;
    Ok(Selection::from_sorted_unique(
        structure
            .atoms()
            .iter()
            .filter(|atom| mask.matches(structure, atom))
            .map(|atom| atom.index)
            .collect(),
    ))
}

fn parse(expression: &str) -> Result<Mask, SelectionError> {
    let chars: Vec<char> = expression.chars().filter(|c| !c.is_whitespace()).collect();
    if chars.is_empty() {
        return Err(SelectionError::Empty);
    }
    let mut parser = Parser { chars, pos: 0 };
    let mask = parser.parse_or()?;
    match parser.peek() {
        None => Ok(mask),
        Some(')') => Err(SelectionError::UnbalancedParentheses),
        Some(c) => Err(SelectionError::UnexpectedToken {
            token: c.to_string(),
            position: parser.pos,
        }),
    }
}

struct Parser {
    chars: Vec<char>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn parse_or(&mut self) -> Result<Mask, SelectionError> {
        let mut left = self.parse_and()?;
        while self.eat('|') {
            let right = self.parse_and()?;
            left = Mask::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Mask, SelectionError> {
        let mut left = self.parse_term()?;
        while self.eat('&') {
            let right = self.parse_term()?;
            left = Mask::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_term(&mut self) -> Result<Mask, SelectionError> {
        let position = self.pos;
        let c = self.peek().ok_or(SelectionError::UnexpectedEnd)?;
        self.pos += 1;
        match c {
            '!' => Ok(Mask::Not(Box::new(self.parse_term()?))),
            '*' => Ok(Mask::All),
            '@' => Ok(Mask::Atoms(self.parse_items('@')?)),
            ':' => Ok(Mask::Residues(self.parse_items(':')?)),
            '(' => {
                let inner = self.parse_or()?;
                if self.eat(')') {
                    Ok(inner)
                } else {
                    Err(SelectionError::UnbalancedParentheses)
                }
            }
            ')' => Err(SelectionError::UnbalancedParentheses),
            other => Err(SelectionError::UnexpectedToken {
                token: other.to_string(),
                position,
            }),
        }
    }

    fn parse_items(&mut self, sigil: char) -> Result<Vec<Item>, SelectionError> {
        let mut items = Vec::new();
        loop {
            let start = self.pos;
            while self
                .peek()
                .is_some_and(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '\'' | '+' | '*'))
            {
                self.pos += 1;
            }
            let word: String = self.chars[start..self.pos].iter().collect();
            if word.is_empty() {
                return Err(SelectionError::MissingValue(sigil.to_string()));
            }
            items.push(parse_item(&word)?);
            if !self.eat(',') {
                break;
            }
        }
        Ok(items)
    }
}

fn parse_item(word: &str) -> Result<Item, SelectionError> {
    if !word.starts_with(|c: char| c.is_ascii_digit()) {
        return Ok(Item::Name(word.to_string()));
    }
    let number = |text: &str| -> Result<usize, SelectionError> {
        match text.parse::<usize>() {
            Ok(value) if value > 0 => Ok(value),
            _ => Err(SelectionError::InvalidNumber(word.to_string())),
        }
    };
    match word.split_once('-') {
        Some((start, end)) => Ok(Item::Range(number(start)?, number(end)?)),
        None => {
            let value = number(word)?;
            Ok(Item::Range(value, value))
        }
    }
}
