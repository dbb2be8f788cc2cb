//! Prefix operators `- + ! ~`. The operand includes postfix access, so
//! `-a.B` negates the member value.

use bindex_core::error::ParseError;
use bindex_core::token_type::unary_tokens;

use crate::ast::ExprNode;
use crate::parser::{priority, ParserContext, TokenParserComponent};

pub struct UnaryParser;

impl TokenParserComponent for UnaryParser {
    fn name(&self) -> &'static str {
        "unary"
    }

    fn priority(&self) -> i32 {
        priority::UNARY
    }

    fn try_parse(
        &self,
        ctx: &mut ParserContext<'_, '_>,
        previous: Option<&ExprNode>,
    ) -> Result<Option<ExprNode>, ParseError> {
        if previous.is_some() {
            return Ok(None);
        }
        let token = [
            unary_tokens::MINUS,
            unary_tokens::PLUS,
            unary_tokens::NOT,
            unary_tokens::BIT_NOT,
        ]
        .into_iter()
        .find(|t| ctx.cursor.check_str(t.symbol));
        let Some(token) = token else {
            return Ok(None);
        };
        ctx.cursor.eat_str(token.symbol);
        let operand = ctx.parse_operand()?;
        Ok(Some(ExprNode::unary(token, operand)))
    }
}
