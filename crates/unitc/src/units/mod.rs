//! Units engine: dimension algebra, units files, conversion graph, catalog

pub mod algebra;
mod catalog;
mod description;
mod dimension;
mod graph;
mod lexer;
mod parser;
mod unit;

pub use catalog::{ConversionError, UnitCatalog, NUMBER};
pub use description::{
    ClassDecl, CompoundTerm, ConversionDecl, Direction, UnitDecl, UnitDefinition,
    UnitsDescription,
};
pub use dimension::{Dimension, DimensionDisplay};
pub use graph::{ConversionEdge, ConversionGraph, ConversionTable, CYCLE_TOLERANCE};
pub use lexer::{Lexer, Token, TokenKind};
pub use parser::{load_units_file, parse_units, Parser};
pub use unit::Unit;
