//! Grouping parens. Returns the inner node directly; grouping leaves no
//! trace in the tree.

use bindex_core::error::{ParseError, ParseErrorKind};

use crate::ast::ExprNode;
use crate::parser::{priority, ParserContext, TokenParserComponent};

pub struct ParenParser;

impl TokenParserComponent for ParenParser {
    fn name(&self) -> &'static str {
        "paren"
    }

    fn priority(&self) -> i32 {
        priority::PAREN
    }

    fn try_parse(
        &self,
        ctx: &mut ParserContext<'_, '_>,
        previous: Option<&ExprNode>,
    ) -> Result<Option<ExprNode>, ParseError> {
        if previous.is_some() || !ctx.cursor.eat('(') {
            return Ok(None);
        }
        let inner = ctx.parse_expression()?;
        ctx.cursor.skip_whitespace();
        if !ctx.cursor.eat(')') {
            return Err(ctx.error(ParseErrorKind::UnexpectedToken, "expected ')'"));
        }
        Ok(Some(inner))
    }
}
