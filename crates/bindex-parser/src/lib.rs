//! Bindex parser crate.
//!
//! Turns binding-expression text into an immutable AST:
//! - A rewindable source cursor with sub-range limits
//! - An ordered, pluggable token-parser component chain
//! - Expression nodes with structural equality and allocation identity
//! - A rewriting visitor that preserves untouched subtrees
//!
//! # Example
//!
//! ```
//! use bindex_core::Metadata;
//! use bindex_parser::ExpressionParser;
//!
//! let parser = ExpressionParser::new();
//! let results = parser
//!     .parse("Target.Text, Source.Name, Converter=Foo", &Metadata::new())
//!     .unwrap();
//! assert_eq!(results.len(), 1);
//! assert_eq!(results[0].target.to_string(), "Target.Text");
//! ```

pub mod ast;
pub mod components;
pub mod cursor;
pub mod parser;

pub use ast::visitor::{rewrite, ExprVisitor, TraversalOrder};
pub use ast::{
    BinaryExpr, ConditionExpr, ConstantExpr, ExprNode, IndexExpr, LambdaExpr, MemberAccessExpr,
    MethodCallExpr, UnaryExpr,
};
pub use cursor::Cursor;
pub use parser::{ExpressionParser, ExpressionResult, ParserContext, TokenParserComponent};
