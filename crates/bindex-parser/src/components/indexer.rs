//! Indexing: `target[args]`, or `[args]` rooted on the implicit
//! receiver at the head of an expression.

use bindex_core::error::ParseError;

use crate::ast::ExprNode;
use crate::components::parse_argument_list;
use crate::parser::{priority, ParserContext, TokenParserComponent};

pub struct IndexerParser;

impl TokenParserComponent for IndexerParser {
    fn name(&self) -> &'static str {
        "indexer"
    }

    fn priority(&self) -> i32 {
        priority::INDEXER
    }

    fn try_parse(
        &self,
        ctx: &mut ParserContext<'_, '_>,
        previous: Option<&ExprNode>,
    ) -> Result<Option<ExprNode>, ParseError> {
        if !ctx.cursor.check(|c| c == '[') {
            return Ok(None);
        }
        let args = parse_argument_list(ctx, '[', ']')?;
        Ok(Some(ExprNode::index(previous.cloned(), args)))
    }
}
