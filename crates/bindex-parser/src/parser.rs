//! The token-parser component chain and the statement-level driver.
//!
//! Parsing is an ordered chain of pluggable recognizers. Each pass runs
//! the chain top-down with the AST built so far; the first component that
//! consumes input wins the pass, and the driver loops until no component
//! advances. Prefix forms fire when no previous node exists, postfix forms
//! (member access, indexing, operators) when one does.

use bindex_core::error::{ParseError, ParseErrorKind, TokenWindow};
use bindex_core::metadata::Metadata;

use crate::ast::ExprNode;
use crate::cursor::Cursor;

/// Chain priorities. Higher runs first; `parse_operand` cuts the chain
/// at [`priority::OPERAND_MIN`] so operator components never run while a
/// component is gathering an operand.
pub mod priority {
    pub const CONSTANT: i32 = 1000;
    pub const LAMBDA: i32 = 995;
    pub const PAREN: i32 = 990;
    pub const MACRO: i32 = 980;
    pub const UNARY: i32 = 970;
    pub const METHOD_CALL: i32 = 965;
    pub const MEMBER: i32 = 960;
    pub const INDEXER: i32 = 955;
    pub const OPERAND_MIN: i32 = 150;
    pub const BINARY: i32 = 100;
    pub const CONDITION: i32 = 50;
}

/// A pluggable expression recognizer.
///
/// `try_parse` either consumes input and returns a node, or leaves the
/// cursor where it found it and returns `Ok(None)`. Errors are terminal.
pub trait TokenParserComponent: Send + Sync {
    fn name(&self) -> &'static str;

    fn priority(&self) -> i32;

    fn try_parse(
        &self,
        ctx: &mut ParserContext<'_, '_>,
        previous: Option<&ExprNode>,
    ) -> Result<Option<ExprNode>, ParseError>;
}

/// Mutable parse state threaded through the chain.
pub struct ParserContext<'p, 'src> {
    pub cursor: Cursor<'src>,
    components: &'p [Box<dyn TokenParserComponent>],
    metadata: &'p Metadata,
}

impl<'p, 'src> ParserContext<'p, 'src> {
    fn new(
        source: &'src str,
        components: &'p [Box<dyn TokenParserComponent>],
        metadata: &'p Metadata,
    ) -> Self {
        Self {
            cursor: Cursor::new(source),
            components,
            metadata,
        }
    }

    pub fn metadata(&self) -> &Metadata {
        self.metadata
    }

    /// Run one chain pass: the first component (at or above
    /// `min_priority`) that consumes input wins.
    fn try_next(
        &mut self,
        previous: Option<&ExprNode>,
        min_priority: i32,
    ) -> Result<Option<ExprNode>, ParseError> {
        self.cursor.skip_whitespace();
        if self.cursor.is_eof() {
            return Ok(None);
        }
        let start = self.cursor.position();
        // The chain outlives the context, so iterating it does not hold
        // a borrow of `self`.
        let components = self.components;
        for component in components {
            if component.priority() < min_priority {
                break;
            }
            match component.try_parse(self, previous)? {
                Some(node) => return Ok(Some(node)),
                None => self.cursor.set_position(start)?,
            }
        }
        Ok(None)
    }

    /// Parse a full expression: operands, postfix forms, operators,
    /// ternaries. Stops before a statement delimiter.
    pub fn parse_expression(&mut self) -> Result<ExprNode, ParseError> {
        self.parse_at_least(i32::MIN)
    }

    /// Parse an operand for an operator component: a primary expression
    /// plus its postfix continuations, but no binary/ternary operators.
    pub fn parse_operand(&mut self) -> Result<ExprNode, ParseError> {
        self.parse_at_least(priority::OPERAND_MIN)
    }

    fn parse_at_least(&mut self, min_priority: i32) -> Result<ExprNode, ParseError> {
        let mut node: Option<ExprNode> = None;
        while let Some(next) = self.try_next(node.as_ref(), min_priority)? {
            node = Some(next);
        }
        node.ok_or_else(|| self.error(ParseErrorKind::ExpectedExpression, "expected an expression"))
    }

    /// A terminal error located at the current position, with the
    /// surrounding token window filled in.
    pub fn error(&self, kind: ParseErrorKind, message: impl Into<String>) -> ParseError {
        let position = self.cursor.position();
        let source = self.cursor.source();

        let fragment = |range: &str| -> String {
            range.split_whitespace().next().unwrap_or("").chars().take(16).collect()
        };
        let before: String = source[..position]
            .split_whitespace()
            .next_back()
            .unwrap_or("")
            .chars()
            .rev()
            .take(16)
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect();
        let after = &source[position..];
        let current = fragment(after);
        let next = fragment(after.get(current.len()..).unwrap_or("").trim_start());

        ParseError::new(kind, position as u32, message).with_window(TokenWindow {
            previous: before,
            current,
            next,
        })
    }
}

/// One parsed binding statement: a target, an optional source, and any
/// number of parameter expressions.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpressionResult {
    pub target: ExprNode,
    pub source: Option<ExprNode>,
    pub parameters: Vec<ExprNode>,
    pub metadata: Metadata,
}

/// The statement-level parser owning the component chain.
///
/// Statements follow `target [, source] [, param]* [;]`, repeated.
/// Commas and semicolons inside argument lists belong to the sub-parsers
/// and never split statements.
pub struct ExpressionParser {
    components: Vec<Box<dyn TokenParserComponent>>,
}

impl ExpressionParser {
    /// A parser with the standard component chain.
    pub fn new() -> Self {
        Self::with_components(crate::components::standard_chain())
    }

    /// A parser with a custom chain; components are ordered by priority.
    pub fn with_components(mut components: Vec<Box<dyn TokenParserComponent>>) -> Self {
        components.sort_by_key(|c| std::cmp::Reverse(c.priority()));
        Self { components }
    }

    pub fn parse(
        &self,
        source: &str,
        metadata: &Metadata,
    ) -> Result<Vec<ExpressionResult>, ParseError> {
        let mut ctx = ParserContext::new(source, &self.components, metadata);
        let mut results = Vec::new();

        loop {
            ctx.cursor.skip_whitespace();
            if ctx.cursor.is_eof() {
                break;
            }

            let target = ctx.parse_expression()?;
            let mut source_node: Option<ExprNode> = None;
            let mut parameters = Vec::new();

            loop {
                ctx.cursor.skip_whitespace();
                if ctx.cursor.is_eof() || ctx.cursor.eat(';') {
                    break;
                }
                if !ctx.cursor.eat(',') {
                    return Err(ctx.error(
                        ParseErrorKind::UnexpectedToken,
                        "expected ',', ';', or end of expression",
                    ));
                }
                let expr = ctx.parse_expression()?;
                // Assignment-shaped items are parameters regardless of
                // position, so `Target, Converter=Foo` has no source.
                let is_assignment = matches!(
                    &expr,
                    ExprNode::Binary(b) if b.token.symbol == "="
                );
                if source_node.is_none() && parameters.is_empty() && !is_assignment {
                    source_node = Some(expr);
                } else {
                    parameters.push(expr);
                }
            }

            results.push(ExpressionResult {
                target,
                source: source_node,
                parameters,
                metadata: metadata.clone(),
            });
        }

        if results.is_empty() {
            let ctx = ParserContext::new(source, &self.components, metadata);
            return Err(ctx.error(ParseErrorKind::ExpectedExpression, "empty expression"));
        }
        Ok(results)
    }
}

impl Default for ExpressionParser {
    fn default() -> Self {
        Self::new()
    }
}
