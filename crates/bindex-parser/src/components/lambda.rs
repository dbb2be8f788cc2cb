//! Lambda recognizer: `x => body`, `() => body`, `(a, b) => body`.
//!
//! Runs before the paren component and speculates: anything that is not
//! a parameter list followed by `=>` is rewound and left for the others.

use bindex_core::error::ParseError;

use crate::ast::ExprNode;
use crate::parser::{priority, ParserContext, TokenParserComponent};

pub struct LambdaParser;

impl TokenParserComponent for LambdaParser {
    fn name(&self) -> &'static str {
        "lambda"
    }

    fn priority(&self) -> i32 {
        priority::LAMBDA
    }

    fn try_parse(
        &self,
        ctx: &mut ParserContext<'_, '_>,
        previous: Option<&ExprNode>,
    ) -> Result<Option<ExprNode>, ParseError> {
        if previous.is_some() {
            return Ok(None);
        }
        let start = ctx.cursor.position();

        let Some(params) = scan_parameters(ctx)? else {
            ctx.cursor.set_position(start)?;
            return Ok(None);
        };
        ctx.cursor.skip_whitespace();
        if !ctx.cursor.eat_str("=>") {
            ctx.cursor.set_position(start)?;
            return Ok(None);
        }
        let body = ctx.parse_expression()?;
        Ok(Some(ExprNode::lambda(params, body)))
    }
}

fn scan_parameters(ctx: &mut ParserContext<'_, '_>) -> Result<Option<Vec<String>>, ParseError> {
    if let Some(ident) = ctx.cursor.eat_identifier() {
        return Ok(Some(vec![ident.to_owned()]));
    }
    if !ctx.cursor.eat('(') {
        return Ok(None);
    }
    let mut params = Vec::new();
    ctx.cursor.skip_whitespace();
    if ctx.cursor.eat(')') {
        return Ok(Some(params));
    }
    loop {
        ctx.cursor.skip_whitespace();
        let Some(ident) = ctx.cursor.eat_identifier() else {
            return Ok(None);
        };
        params.push(ident.to_owned());
        ctx.cursor.skip_whitespace();
        if ctx.cursor.eat(')') {
            return Ok(Some(params));
        }
        if !ctx.cursor.eat(',') {
            return Ok(None);
        }
    }
}
