//! The unit catalog: registry, reserved words, classes and conversion table
//!
//! Built once from a [`UnitsDescription`] and read-only afterwards. Every
//! validation problem in the description is fatal and surfaces as a
//! [`UnitsError`].

use std::collections::{HashMap, HashSet};

use thiserror::Error;
use tracing::debug;

use super::description::{ClassDecl, CompoundTerm, ConversionDecl, UnitDecl, UnitDefinition};
use super::graph::{ConversionEdge, ConversionGraph, ConversionTable};
use super::{Dimension, Unit, UnitsDescription};
use crate::common::{Span, UnitsError, UnitsResult};

/// Name of the built-in dimensionless unit
pub const NUMBER: &str = "number";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConversionError {
    #[error("cannot convert from '{from}' to '{to}'")]
    NotConvertible { from: String, to: String },
}

#[derive(Debug)]
pub struct UnitCatalog {
    units: Vec<Unit>,
    by_name: HashMap<String, usize>,
    by_symbol: HashMap<String, usize>,
    /// Index of the coherent unit each unit is defined against
    coherent: Vec<usize>,
    /// First declared coherent unit per dimension vector
    by_dimension: HashMap<Dimension, usize>,
    base_symbols: Vec<String>,
    classes: HashMap<String, Vec<usize>>,
    reserved: HashSet<String>,
    table: ConversionTable,
}

impl UnitCatalog {
    pub fn from_description(description: &UnitsDescription) -> UnitsResult<Self> {
        let arity = description
            .units
            .iter()
            .filter(|u| u.definition == UnitDefinition::Base)
            .count();

        let mut builder = CatalogBuilder::new(arity);
        for decl in &description.units {
            builder.declare_unit(decl)?;
        }
        for conversion in &description.conversions {
            builder.declare_conversion(conversion)?;
        }
        for class in &description.classes {
            builder.declare_class(class)?;
        }
        builder.finish()
    }

    /// Find a unit by name or symbol
    pub fn lookup(&self, name_or_symbol: &str) -> Option<&Unit> {
        self.index_of(name_or_symbol).map(|i| &self.units[i])
    }

    fn index_of(&self, name_or_symbol: &str) -> Option<usize> {
        self.by_name
            .get(name_or_symbol)
            .or_else(|| self.by_symbol.get(name_or_symbol))
            .copied()
    }

    /// The built-in dimensionless unit
    pub fn number(&self) -> &Unit {
        &self.units[0]
    }

    pub fn arity(&self) -> usize {
        self.base_symbols.len()
    }

    /// Symbols of the base units, one per dimension slot
    pub fn base_symbols(&self) -> &[String] {
        &self.base_symbols
    }

    /// Declared units in declaration order, `number` first
    pub fn units(&self) -> impl Iterator<Item = &Unit> {
        self.units.iter()
    }

    pub fn table(&self) -> &ConversionTable {
        &self.table
    }

    /// Table factor between two declared units
    pub fn factor(&self, from: &str, to: &str) -> Option<f64> {
        let from = self.lookup(from)?;
        let to = self.lookup(to)?;
        self.table.factor(&from.name, &to.name)
    }

    /// Express `value` (in `from`) in `to` using the conversion table
    pub fn convert(&self, value: f64, from: &Unit, to: &Unit) -> Result<f64, ConversionError> {
        if from == to {
            return Ok(value);
        }
        self.factor(&from.name, &to.name)
            .map(|factor| value * factor)
            .ok_or_else(|| ConversionError::NotConvertible {
                from: from.name.clone(),
                to: to.name.clone(),
            })
    }

    pub fn is_reserved(&self, identifier: &str) -> bool {
        self.reserved.contains(identifier)
    }

    pub fn reserved_words(&self) -> impl Iterator<Item = &str> {
        self.reserved.iter().map(String::as_str)
    }

    /// The coherent unit `unit` is defined against. Coherent and anonymous
    /// units map to themselves.
    pub fn coherent_unit(&self, unit: &Unit) -> Unit {
        match self.by_name.get(&unit.name) {
            Some(&i) => self.units[self.coherent[i]].clone(),
            None => unit.clone(),
        }
    }

    /// First declared coherent unit with this dimension, else an anonymous one
    pub fn unit_for_dimension(&self, dimension: &Dimension) -> Unit {
        match self.by_dimension.get(dimension) {
            Some(&i) => self.units[i].clone(),
            None => Unit::anonymous(
                dimension.display_with(&self.base_symbols).to_string(),
                dimension.clone(),
            ),
        }
    }

    /// Members of a unit class
    pub fn class(&self, name: &str) -> Option<Vec<&Unit>> {
        self.classes
            .get(name)
            .map(|members| members.iter().map(|&i| &self.units[i]).collect())
    }
}

/// Accumulates validated declarations before the table is computed
struct CatalogBuilder {
    arity: usize,
    next_slot: usize,
    units: Vec<Unit>,
    by_name: HashMap<String, usize>,
    by_symbol: HashMap<String, usize>,
    coherent: Vec<usize>,
    by_dimension: HashMap<Dimension, usize>,
    base_symbols: Vec<String>,
    classes: HashMap<String, Vec<usize>>,
    graph: ConversionGraph,
}

impl CatalogBuilder {
    fn new(arity: usize) -> Self {
        let mut builder = Self {
            arity,
            next_slot: 0,
            units: Vec::new(),
            by_name: HashMap::new(),
            by_symbol: HashMap::new(),
            coherent: Vec::new(),
            by_dimension: HashMap::new(),
            base_symbols: Vec::with_capacity(arity),
            classes: HashMap::new(),
            graph: ConversionGraph::new(),
        };
        builder.insert(Unit::new(NUMBER, "", Dimension::dimensionless(arity)), None);
        builder
    }

    fn lookup(&self, name_or_symbol: &str, span: Span) -> UnitsResult<usize> {
        self.by_name
            .get(name_or_symbol)
            .or_else(|| self.by_symbol.get(name_or_symbol))
            .copied()
            .ok_or_else(|| UnitsError::unknown_unit(name_or_symbol, span))
    }

    fn is_taken(&self, word: &str) -> bool {
        self.by_name.contains_key(word)
            || self.by_symbol.contains_key(word)
            || self.classes.contains_key(word)
    }

    /// Register a unit; `coherent` is `None` when the unit is its own
    fn insert(&mut self, unit: Unit, coherent: Option<usize>) -> usize {
        let index = self.units.len();
        self.graph.add_unit(&unit.name);
        self.by_name.insert(unit.name.clone(), index);
        if !unit.symbol.is_empty() {
            self.by_symbol.insert(unit.symbol.clone(), index);
        }
        if coherent.is_none() {
            self.by_dimension
                .entry(unit.dimension.clone())
                .or_insert(index);
        }
        self.coherent.push(coherent.unwrap_or(index));
        self.units.push(unit);
        index
    }

    fn declare_unit(&mut self, decl: &UnitDecl) -> UnitsResult<()> {
        if self.is_taken(&decl.name) {
            return Err(UnitsError::duplicate(&decl.name, decl.span));
        }
        if decl.symbol != decl.name && self.is_taken(&decl.symbol) {
            return Err(UnitsError::duplicate(&decl.symbol, decl.span));
        }

        match &decl.definition {
            UnitDefinition::Base => {
                let dimension = Dimension::base(self.arity, self.next_slot);
                self.next_slot += 1;
                self.base_symbols.push(decl.symbol.clone());
                self.insert(Unit::base(&decl.name, &decl.symbol, dimension), None);
            }
            UnitDefinition::Scaled {
                parent,
                factor,
                direction,
            } => {
                let parent = self.lookup(parent, decl.span)?;
                let edge = ConversionEdge::new(
                    &decl.name,
                    &self.units[parent].name,
                    *factor,
                    *direction,
                    decl.span,
                )?;
                let dimension = self.units[parent].dimension.clone();
                let coherent = self.coherent[parent];
                self.insert(Unit::new(&decl.name, &decl.symbol, dimension), Some(coherent));
                self.graph.add_edge(&edge, decl.span)?;
            }
            UnitDefinition::Compound { terms } => {
                let dimension = self.compound_dimension(&decl.name, terms, decl.span)?;
                self.insert(Unit::new(&decl.name, &decl.symbol, dimension), None);
            }
        }
        Ok(())
    }

    fn compound_dimension(
        &self,
        name: &str,
        terms: &[CompoundTerm],
        span: Span,
    ) -> UnitsResult<Dimension> {
        let mut dimension = Dimension::dimensionless(self.arity);
        for term in terms {
            let index = self.lookup(&term.unit, span)?;
            if self.coherent[index] != index {
                return Err(UnitsError::IncoherentCompound {
                    unit: name.to_string(),
                    term: term.unit.clone(),
                    span,
                });
            }
            dimension = dimension.mul(&self.units[index].dimension.pow(term.exponent));
        }
        Ok(dimension)
    }

    fn declare_conversion(&mut self, decl: &ConversionDecl) -> UnitsResult<()> {
        let child = self.lookup(&decl.child, decl.span)?;
        let parent = self.lookup(&decl.parent, decl.span)?;
        let (child, parent) = (&self.units[child], &self.units[parent]);

        if child.dimension != parent.dimension {
            return Err(UnitsError::DimensionMismatch {
                from: child.name.clone(),
                to: parent.name.clone(),
                span: decl.span,
            });
        }

        let edge = ConversionEdge::new(
            &child.name,
            &parent.name,
            decl.factor,
            decl.direction,
            decl.span,
        )?;
        self.graph.add_edge(&edge, decl.span)
    }

    fn declare_class(&mut self, decl: &ClassDecl) -> UnitsResult<()> {
        if self.is_taken(&decl.name) {
            return Err(UnitsError::duplicate(&decl.name, decl.span));
        }
        let members = decl
            .members
            .iter()
            .map(|member| self.lookup(member, decl.span))
            .collect::<UnitsResult<Vec<_>>>()?;
        self.classes.insert(decl.name.clone(), members);
        Ok(())
    }

    fn finish(self) -> UnitsResult<UnitCatalog> {
        let table = self.graph.build_table()?;

        let reserved: HashSet<String> = self
            .by_name
            .keys()
            .chain(self.by_symbol.keys())
            .chain(self.classes.keys())
            .cloned()
            .collect();

        debug!(
            units = self.units.len(),
            base_units = self.arity,
            classes = self.classes.len(),
            reserved = reserved.len(),
            "unit catalog ready"
        );

        Ok(UnitCatalog {
            units: self.units,
            by_name: self.by_name,
            by_symbol: self.by_symbol,
            coherent: self.coherent,
            by_dimension: self.by_dimension,
            base_symbols: self.base_symbols,
            classes: self.classes,
            reserved,
            table,
        })
    }
}
