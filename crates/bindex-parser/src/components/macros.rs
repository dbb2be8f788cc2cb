//! Resource macros: `$Name` resolves at invocation time, `$$Name` at
//! compile time. The operand is the resource name, optionally a call.

use bindex_core::error::{ParseError, ParseErrorKind};
use bindex_core::token_type::unary_tokens;

use crate::ast::ExprNode;
use crate::components::parse_argument_list;
use crate::parser::{priority, ParserContext, TokenParserComponent};

pub struct MacroParser;

impl TokenParserComponent for MacroParser {
    fn name(&self) -> &'static str {
        "macro"
    }

    fn priority(&self) -> i32 {
        priority::MACRO
    }

    fn try_parse(
        &self,
        ctx: &mut ParserContext<'_, '_>,
        previous: Option<&ExprNode>,
    ) -> Result<Option<ExprNode>, ParseError> {
        if previous.is_some() {
            return Ok(None);
        }
        let token = if ctx.cursor.eat_str("$$") {
            unary_tokens::STATIC_MACRO
        } else if ctx.cursor.eat('$') {
            unary_tokens::MACRO
        } else {
            return Ok(None);
        };

        let Some(name) = ctx.cursor.eat_identifier().map(str::to_owned) else {
            return Err(ctx.error(
                ParseErrorKind::UnexpectedToken,
                "expected a resource name after the macro prefix",
            ));
        };
        let operand = if ctx.cursor.check(|c| c == '(') {
            let args = parse_argument_list(ctx, '(', ')')?;
            ExprNode::method_call(None, name, Vec::new(), args)
        } else {
            ExprNode::member(None, name)
        };
        Ok(Some(ExprNode::unary(token, operand)))
    }
}
