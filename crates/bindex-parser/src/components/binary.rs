//! Binary operators via precedence climbing over the fixed catalog.
//!
//! Null-conditional access is a binary token here: `?.` sits at the top
//! of the precedence table and the compiler gives it its short-circuit
//! meaning. Word aliases (`mod`, `and`, `or`) only match on whole words.

use bindex_core::error::ParseError;
use bindex_core::token_type::{binary_tokens, BinaryTokenType};

use crate::ast::ExprNode;
use crate::cursor::Cursor;
use crate::parser::{priority, ParserContext, TokenParserComponent};

pub struct BinaryParser;

impl TokenParserComponent for BinaryParser {
    fn name(&self) -> &'static str {
        "binary"
    }

    fn priority(&self) -> i32 {
        priority::BINARY
    }

    fn try_parse(
        &self,
        ctx: &mut ParserContext<'_, '_>,
        previous: Option<&ExprNode>,
    ) -> Result<Option<ExprNode>, ParseError> {
        let Some(left) = previous else {
            return Ok(None);
        };
        let parsed = parse_binary(ctx, left.clone(), i32::MIN)?;
        if parsed.same_node(left) {
            Ok(None)
        } else {
            Ok(Some(parsed))
        }
    }
}

/// The climbing loop. Consumes operators at or above `min_precedence`,
/// folding left-associatively except where the token says otherwise.
fn parse_binary(
    ctx: &mut ParserContext<'_, '_>,
    mut lhs: ExprNode,
    min_precedence: i32,
) -> Result<ExprNode, ParseError> {
    loop {
        let save = ctx.cursor.position();
        ctx.cursor.skip_whitespace();
        let Some(op) = scan_token(&mut ctx.cursor) else {
            ctx.cursor.set_position(save)?;
            break;
        };
        if op.precedence < min_precedence {
            ctx.cursor.set_position(save)?;
            break;
        }

        let mut rhs = ctx.parse_operand()?;
        loop {
            let save_peek = ctx.cursor.position();
            ctx.cursor.skip_whitespace();
            let next = scan_token(&mut ctx.cursor);
            ctx.cursor.set_position(save_peek)?;
            let Some(next) = next else {
                break;
            };
            let climbs = next.precedence > op.precedence
                || (next.is_right_associative() && next.precedence == op.precedence);
            if !climbs {
                break;
            }
            let next_min = if next.precedence > op.precedence {
                op.precedence + 1
            } else {
                op.precedence
            };
            rhs = parse_binary(ctx, rhs, next_min)?;
        }

        lhs = ExprNode::binary(op, lhs, rhs);
    }
    Ok(lhs)
}

/// Consume the binary token at the cursor, if any. Longest symbol wins,
/// so `<<` beats `<` and `==` beats `=`.
fn scan_token(cursor: &mut Cursor<'_>) -> Option<BinaryTokenType> {
    for token in binary_tokens::ALL {
        for alias in token.aliases {
            if cursor.check_str(alias)
                && !cursor.is_identifier_char_at(cursor.position() + alias.len())
            {
                cursor.eat_str(alias);
                return Some(*token);
            }
        }
    }

    let mut best: Option<BinaryTokenType> = None;
    for token in binary_tokens::ALL {
        if cursor.check_str(token.symbol)
            && best.is_none_or(|b| token.symbol.len() > b.symbol.len())
        {
            best = Some(*token);
        }
    }
    let token = best?;
    // `=` followed by `>` is a lambda arrow, not assignment.
    if token.symbol == "=" && cursor.peek_nth(1) == Some('>') {
        return None;
    }
    cursor.eat_str(token.symbol);
    Some(token)
}
