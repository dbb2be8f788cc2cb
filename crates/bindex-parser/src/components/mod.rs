//! The standard recognizer chain.

mod binary;
mod condition;
mod constant;
mod indexer;
mod lambda;
mod macros;
mod member;
mod method_call;
mod paren;
mod unary;

pub use binary::BinaryParser;
pub use condition::ConditionParser;
pub use constant::ConstantParser;
pub use indexer::IndexerParser;
pub use lambda::LambdaParser;
pub use macros::MacroParser;
pub use member::MemberParser;
pub use method_call::MethodCallParser;
pub use paren::ParenParser;
pub use unary::UnaryParser;

use bindex_core::error::{ParseError, ParseErrorKind};

use crate::ast::ExprNode;
use crate::parser::{ParserContext, TokenParserComponent};

/// Every standard component, in declaration order; the parser sorts by
/// priority.
pub fn standard_chain() -> Vec<Box<dyn TokenParserComponent>> {
    vec![
        Box::new(ConstantParser),
        Box::new(LambdaParser),
        Box::new(ParenParser),
        Box::new(MacroParser),
        Box::new(UnaryParser),
        Box::new(MethodCallParser),
        Box::new(MemberParser),
        Box::new(IndexerParser),
        Box::new(BinaryParser),
        Box::new(ConditionParser),
    ]
}

/// Parse a delimited argument list. The cursor must sit on `open`;
/// consumes through the matching `close`. Commas in here belong to the
/// list, not to the statement.
pub(crate) fn parse_argument_list(
    ctx: &mut ParserContext<'_, '_>,
    open: char,
    close: char,
) -> Result<Vec<ExprNode>, ParseError> {
    if !ctx.cursor.eat(open) {
        return Err(ctx.error(
            ParseErrorKind::UnexpectedToken,
            format!("expected '{open}'"),
        ));
    }
    let mut args = Vec::new();
    ctx.cursor.skip_whitespace();
    if ctx.cursor.eat(close) {
        return Ok(args);
    }
    loop {
        args.push(ctx.parse_expression()?);
        ctx.cursor.skip_whitespace();
        if ctx.cursor.eat(close) {
            break;
        }
        if !ctx.cursor.eat(',') {
            return Err(ctx.error(
                ParseErrorKind::UnexpectedToken,
                format!("expected ',' or '{close}'"),
            ));
        }
    }
    Ok(args)
}
