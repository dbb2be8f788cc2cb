//! Member access: a bare identifier, or `.Name` after an operand.

use bindex_core::error::ParseError;

use crate::ast::ExprNode;
use crate::parser::{priority, ParserContext, TokenParserComponent};

pub struct MemberParser;

impl TokenParserComponent for MemberParser {
    fn name(&self) -> &'static str {
        "member"
    }

    fn priority(&self) -> i32 {
        priority::MEMBER
    }

    fn try_parse(
        &self,
        ctx: &mut ParserContext<'_, '_>,
        previous: Option<&ExprNode>,
    ) -> Result<Option<ExprNode>, ParseError> {
        if previous.is_some() && !ctx.cursor.eat('.') {
            return Ok(None);
        }
        let Some(name) = ctx.cursor.eat_identifier() else {
            return Ok(None);
        };
        Ok(Some(ExprNode::member(previous.cloned(), name)))
    }
}
