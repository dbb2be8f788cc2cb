//! Ternary conditional, the lowest-priority component.
//!
//! On seeing `?`, scans ahead for the matching `:` (skipping strings,
//! bracketed ranges, `?.`, `??`, and nested ternaries), parses the true
//! branch under a cursor limit ending at the colon, then the false
//! branch after it.

use bindex_core::error::{ParseError, ParseErrorKind};

use crate::ast::ExprNode;
use crate::parser::{priority, ParserContext, TokenParserComponent};

pub struct ConditionParser;

impl TokenParserComponent for ConditionParser {
    fn name(&self) -> &'static str {
        "condition"
    }

    fn priority(&self) -> i32 {
        priority::CONDITION
    }

    fn try_parse(
        &self,
        ctx: &mut ParserContext<'_, '_>,
        previous: Option<&ExprNode>,
    ) -> Result<Option<ExprNode>, ParseError> {
        let Some(condition) = previous else {
            return Ok(None);
        };
        // Bare `?` only; `?.` and `??` belong to the binary component.
        if ctx.cursor.peek() != Some('?') || matches!(ctx.cursor.peek_nth(1), Some('.' | '?')) {
            return Ok(None);
        }
        ctx.cursor.advance();

        let Some(colon) = find_branch_colon(ctx) else {
            return Err(ctx.error(
                ParseErrorKind::UnexpectedToken,
                "conditional is missing its ':'",
            ));
        };

        let outer_limit = ctx.cursor.limit();
        ctx.cursor.set_limit(colon)?;
        let if_true = ctx.parse_expression()?;
        ctx.cursor.skip_whitespace();
        if !ctx.cursor.is_eof() {
            return Err(ctx.error(
                ParseErrorKind::UnexpectedToken,
                "unexpected input before ':'",
            ));
        }
        ctx.cursor.set_limit(outer_limit)?;
        ctx.cursor.set_position(colon + 1)?;
        let if_false = ctx.parse_expression()?;

        Ok(Some(ExprNode::condition(
            condition.clone(),
            if_true,
            if_false,
        )))
    }
}

/// Absolute offset of the colon that closes the ternary opened just
/// before the cursor, or `None` if the range runs out first.
fn find_branch_colon(ctx: &ParserContext<'_, '_>) -> Option<usize> {
    let base = ctx.cursor.position();
    let bytes = ctx.cursor.rest().as_bytes();
    let mut depth = 0usize; // parens and brackets
    let mut nested = 0usize; // inner ternaries
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'"' => {
                i += 1;
                while i < bytes.len() && bytes[i] != b'"' {
                    if bytes[i] == b'\\' {
                        i += 1;
                    }
                    i += 1;
                }
            }
            b'(' | b'[' => depth += 1,
            b')' | b']' => depth = depth.saturating_sub(1),
            b'?' => match bytes.get(i + 1) {
                Some(b'.') | Some(b'?') => i += 1,
                _ => {
                    if depth == 0 {
                        nested += 1;
                    }
                }
            },
            b':' if depth == 0 => {
                if nested == 0 {
                    return Some(base + i);
                }
                nested -= 1;
            }
            _ => {}
        }
        i += 1;
    }
    None
}
