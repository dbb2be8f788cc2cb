//! Method calls: `Name(args)`, `target.Name(args)`, with optional
//! explicit generic arguments `Name<T1, T2>(args)`.
//!
//! Speculates up to the opening paren. `a.Foo < b` rewinds cleanly and
//! parses as member access plus a comparison.

use bindex_core::error::ParseError;

use crate::ast::ExprNode;
use crate::components::parse_argument_list;
use crate::parser::{priority, ParserContext, TokenParserComponent};

pub struct MethodCallParser;

impl TokenParserComponent for MethodCallParser {
    fn name(&self) -> &'static str {
        "method-call"
    }

    fn priority(&self) -> i32 {
        priority::METHOD_CALL
    }

    fn try_parse(
        &self,
        ctx: &mut ParserContext<'_, '_>,
        previous: Option<&ExprNode>,
    ) -> Result<Option<ExprNode>, ParseError> {
        if previous.is_some() {
            // Postfix form needs a dot; `?.` continuations arrive as a
            // binary token instead.
            if !ctx.cursor.eat('.') {
                return Ok(None);
            }
        }
        let Some(name) = ctx.cursor.eat_identifier().map(str::to_owned) else {
            return Ok(None);
        };
        let type_args = scan_type_args(ctx)?.unwrap_or_default();
        if !ctx.cursor.check(|c| c == '(') {
            return Ok(None);
        }
        let args = parse_argument_list(ctx, '(', ')')?;
        Ok(Some(ExprNode::method_call(
            previous.cloned(),
            name,
            type_args,
            args,
        )))
    }
}

/// Scan `<T1, T2>` if present. Returns `None` (with the cursor restored)
/// when the angle bracket turns out to be a comparison instead.
fn scan_type_args(ctx: &mut ParserContext<'_, '_>) -> Result<Option<Vec<String>>, ParseError> {
    let start = ctx.cursor.position();
    if !ctx.cursor.eat('<') {
        return Ok(None);
    }
    let mut names = Vec::new();
    loop {
        ctx.cursor.skip_whitespace();
        let Some(ident) = ctx.cursor.eat_identifier() else {
            ctx.cursor.set_position(start)?;
            return Ok(None);
        };
        names.push(ident.to_owned());
        ctx.cursor.skip_whitespace();
        if ctx.cursor.eat('>') {
            return Ok(Some(names));
        }
        if !ctx.cursor.eat(',') {
            ctx.cursor.set_position(start)?;
            return Ok(None);
        }
    }
}
