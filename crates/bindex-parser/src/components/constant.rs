//! Literal recognizer: numbers, quoted strings, `true`/`false`/`null`.

use bindex_core::error::{ParseError, ParseErrorKind};
use bindex_core::value::Value;

use crate::ast::ExprNode;
use crate::parser::{priority, ParserContext, TokenParserComponent};

pub struct ConstantParser;

impl TokenParserComponent for ConstantParser {
    fn name(&self) -> &'static str {
        "constant"
    }

    fn priority(&self) -> i32 {
        priority::CONSTANT
    }

    fn try_parse(
        &self,
        ctx: &mut ParserContext<'_, '_>,
        previous: Option<&ExprNode>,
    ) -> Result<Option<ExprNode>, ParseError> {
        if previous.is_some() {
            return Ok(None);
        }
        if ctx.cursor.check(|c| c.is_ascii_digit()) {
            return parse_number(ctx).map(Some);
        }
        if ctx.cursor.check(|c| c == '"') {
            return parse_string(ctx).map(Some);
        }
        for (keyword, value) in [
            ("true", Value::TRUE),
            ("false", Value::FALSE),
            ("null", Value::Null),
        ] {
            if ctx.cursor.check_str(keyword)
                && !ctx
                    .cursor
                    .is_identifier_char_at(ctx.cursor.position() + keyword.len())
            {
                ctx.cursor.eat_str(keyword);
                return Ok(Some(ExprNode::constant(value)));
            }
        }
        Ok(None)
    }
}

fn parse_number(ctx: &mut ParserContext<'_, '_>) -> Result<ExprNode, ParseError> {
    let start = ctx.cursor.position();
    ctx.cursor.eat_while(|c| c.is_ascii_digit());

    let mut is_float = false;
    // A dot only belongs to the literal when a digit follows; `1.Foo`
    // is member access on the integer.
    if ctx.cursor.peek() == Some('.') && ctx.cursor.peek_nth(1).is_some_and(|c| c.is_ascii_digit())
    {
        ctx.cursor.advance();
        ctx.cursor.eat_while(|c| c.is_ascii_digit());
        is_float = true;
    }
    if ctx.cursor.check(|c| c == 'e' || c == 'E') {
        let exp_start = ctx.cursor.position();
        ctx.cursor.advance();
        if ctx.cursor.check(|c| c == '+' || c == '-') {
            ctx.cursor.advance();
        }
        if ctx.cursor.check(|c| c.is_ascii_digit()) {
            ctx.cursor.eat_while(|c| c.is_ascii_digit());
            is_float = true;
        } else {
            // `12e` with no digits is `12` followed by an identifier.
            ctx.cursor.set_position(exp_start)?;
        }
    }

    let digits = ctx.cursor.slice(start, ctx.cursor.position()).to_owned();

    // Suffix, if any.
    let suffix = ctx
        .cursor
        .eat_while(|c| matches!(c, 'f' | 'F' | 'd' | 'D' | 'l' | 'L' | 'u' | 'U'))
        .to_ascii_lowercase();

    let invalid = |ctx: &ParserContext<'_, '_>| {
        ctx.error(
            ParseErrorKind::InvalidNumber,
            format!("cannot parse numeric literal '{digits}{suffix}'"),
        )
    };

    let value = match suffix.as_str() {
        "f" => Value::F32(digits.parse().map_err(|_| invalid(ctx))?),
        "d" => Value::F64(digits.parse().map_err(|_| invalid(ctx))?),
        "" if is_float => Value::F64(digits.parse().map_err(|_| invalid(ctx))?),
        "" => {
            if let Ok(v) = digits.parse::<i32>() {
                Value::I32(v)
            } else if let Ok(v) = digits.parse::<i64>() {
                Value::I64(v)
            } else {
                Value::U64(digits.parse().map_err(|_| invalid(ctx))?)
            }
        }
        "l" if !is_float => Value::I64(digits.parse().map_err(|_| invalid(ctx))?),
        "u" if !is_float => {
            if let Ok(v) = digits.parse::<u32>() {
                Value::U32(v)
            } else {
                Value::U64(digits.parse().map_err(|_| invalid(ctx))?)
            }
        }
        "ul" | "lu" if !is_float => Value::U64(digits.parse().map_err(|_| invalid(ctx))?),
        _ => return Err(invalid(ctx)),
    };
    Ok(ExprNode::constant(value))
}

fn parse_string(ctx: &mut ParserContext<'_, '_>) -> Result<ExprNode, ParseError> {
    ctx.cursor.advance(); // opening quote
    let mut text = String::new();
    loop {
        let Some(ch) = ctx.cursor.advance() else {
            return Err(ctx.error(
                ParseErrorKind::UnterminatedString,
                "string literal is missing its closing '\"'",
            ));
        };
        match ch {
            '"' => break,
            '\\' => {
                let Some(escape) = ctx.cursor.advance() else {
                    return Err(ctx.error(
                        ParseErrorKind::UnterminatedString,
                        "string literal ends in a bare '\\'",
                    ));
                };
                match escape {
                    'n' => text.push('\n'),
                    'r' => text.push('\r'),
                    't' => text.push('\t'),
                    '0' => text.push('\0'),
                    '\\' => text.push('\\'),
                    '"' => text.push('"'),
                    '\'' => text.push('\''),
                    'u' => {
                        let mut code = 0u32;
                        for _ in 0..4 {
                            let digit = ctx
                                .cursor
                                .advance()
                                .and_then(|c| c.to_digit(16))
                                .ok_or_else(|| {
                                    ctx.error(
                                        ParseErrorKind::UnexpectedToken,
                                        "\\u escape needs four hex digits",
                                    )
                                })?;
                            code = code * 16 + digit;
                        }
                        text.push(char::from_u32(code).ok_or_else(|| {
                            ctx.error(
                                ParseErrorKind::UnexpectedToken,
                                "\\u escape is not a valid character",
                            )
                        })?);
                    }
                    other => {
                        return Err(ctx.error(
                            ParseErrorKind::UnexpectedToken,
                            format!("unknown escape '\\{other}'"),
                        ));
                    }
                }
            }
            ch => text.push(ch),
        }
    }
    Ok(ExprNode::constant(Value::string(text)))
}
