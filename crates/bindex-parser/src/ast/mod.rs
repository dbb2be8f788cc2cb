//! Expression AST.
//!
//! Nodes are immutable and `Arc`-shared: the compiler caches compiled
//! accessors by node identity, and the visitor driver rebuilds a node only
//! when a child actually changed, so an untouched subtree keeps its
//! identity (and its cache entry) across rewrites.

pub mod visitor;

use std::fmt;
use std::sync::{Arc, LazyLock};

use bindex_core::token_type::{BinaryTokenType, UnaryTokenType};
use bindex_core::value::Value;

pub use visitor::{ExprVisitor, TraversalOrder};

/// A literal value.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstantExpr {
    pub value: Value,
}

/// `target.Name`, or a bare `Name` when `target` is absent.
#[derive(Debug, Clone, PartialEq)]
pub struct MemberAccessExpr {
    pub target: Option<ExprNode>,
    pub name: String,
}

/// `target[args]`, or `[args]` at the head of an expression.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexExpr {
    pub target: Option<ExprNode>,
    pub args: Vec<ExprNode>,
}

/// `target.Name<T1, T2>(args)`, or a bare call when `target` is absent.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodCallExpr {
    pub target: Option<ExprNode>,
    pub name: String,
    /// Explicit generic arguments, as written; empty when inferred.
    pub type_args: Vec<String>,
    pub args: Vec<ExprNode>,
}

/// `left op right`. Null-conditional access (`a?.b`) is a binary node
/// whose right side is the un-targeted access.
#[derive(Debug, Clone, PartialEq)]
pub struct BinaryExpr {
    pub token: BinaryTokenType,
    pub left: ExprNode,
    pub right: ExprNode,
}

/// `op operand`, including the `$`/`$$` resource macros.
#[derive(Debug, Clone, PartialEq)]
pub struct UnaryExpr {
    pub token: UnaryTokenType,
    pub operand: ExprNode,
}

/// `condition ? if_true : if_false`.
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionExpr {
    pub condition: ExprNode,
    pub if_true: ExprNode,
    pub if_false: ExprNode,
}

/// `(a, b) => body` or `x => body`.
#[derive(Debug, Clone, PartialEq)]
pub struct LambdaExpr {
    pub params: Vec<String>,
    pub body: ExprNode,
}

/// Any expression node. Cheap to clone; equality is structural.
#[derive(Debug, Clone, PartialEq)]
pub enum ExprNode {
    Constant(Arc<ConstantExpr>),
    Member(Arc<MemberAccessExpr>),
    Index(Arc<IndexExpr>),
    MethodCall(Arc<MethodCallExpr>),
    Binary(Arc<BinaryExpr>),
    Unary(Arc<UnaryExpr>),
    Condition(Arc<ConditionExpr>),
    Lambda(Arc<LambdaExpr>),
}

static TRUE_NODE: LazyLock<ExprNode> = LazyLock::new(|| {
    ExprNode::Constant(Arc::new(ConstantExpr {
        value: Value::TRUE,
    }))
});
static FALSE_NODE: LazyLock<ExprNode> = LazyLock::new(|| {
    ExprNode::Constant(Arc::new(ConstantExpr {
        value: Value::FALSE,
    }))
});
static NULL_NODE: LazyLock<ExprNode> =
    LazyLock::new(|| ExprNode::Constant(Arc::new(ConstantExpr { value: Value::Null })));

impl ExprNode {
    /// Identity of this node's allocation. Stable for the node's
    /// lifetime and shared by clones.
    pub fn node_id(&self) -> usize {
        match self {
            ExprNode::Constant(n) => Arc::as_ptr(n) as usize,
            ExprNode::Member(n) => Arc::as_ptr(n) as usize,
            ExprNode::Index(n) => Arc::as_ptr(n) as usize,
            ExprNode::MethodCall(n) => Arc::as_ptr(n) as usize,
            ExprNode::Binary(n) => Arc::as_ptr(n) as usize,
            ExprNode::Unary(n) => Arc::as_ptr(n) as usize,
            ExprNode::Condition(n) => Arc::as_ptr(n) as usize,
            ExprNode::Lambda(n) => Arc::as_ptr(n) as usize,
        }
    }

    /// Whether two handles point at the same allocation.
    pub fn same_node(&self, other: &ExprNode) -> bool {
        self.node_id() == other.node_id()
    }

    pub fn constant(value: Value) -> ExprNode {
        match value {
            Value::Bool(true) => TRUE_NODE.clone(),
            Value::Bool(false) => FALSE_NODE.clone(),
            Value::Null => NULL_NODE.clone(),
            value => ExprNode::Constant(Arc::new(ConstantExpr { value })),
        }
    }

    pub fn member(target: Option<ExprNode>, name: impl Into<String>) -> ExprNode {
        ExprNode::Member(Arc::new(MemberAccessExpr {
            target,
            name: name.into(),
        }))
    }

    pub fn index(target: Option<ExprNode>, args: Vec<ExprNode>) -> ExprNode {
        ExprNode::Index(Arc::new(IndexExpr { target, args }))
    }

    pub fn method_call(
        target: Option<ExprNode>,
        name: impl Into<String>,
        type_args: Vec<String>,
        args: Vec<ExprNode>,
    ) -> ExprNode {
        ExprNode::MethodCall(Arc::new(MethodCallExpr {
            target,
            name: name.into(),
            type_args,
            args,
        }))
    }

    pub fn binary(token: BinaryTokenType, left: ExprNode, right: ExprNode) -> ExprNode {
        ExprNode::Binary(Arc::new(BinaryExpr { token, left, right }))
    }

    pub fn unary(token: UnaryTokenType, operand: ExprNode) -> ExprNode {
        ExprNode::Unary(Arc::new(UnaryExpr { token, operand }))
    }

    pub fn condition(condition: ExprNode, if_true: ExprNode, if_false: ExprNode) -> ExprNode {
        ExprNode::Condition(Arc::new(ConditionExpr {
            condition,
            if_true,
            if_false,
        }))
    }

    pub fn lambda(params: Vec<String>, body: ExprNode) -> ExprNode {
        ExprNode::Lambda(Arc::new(LambdaExpr { params, body }))
    }

    /// The constant value, if this is a constant node.
    pub fn as_constant(&self) -> Option<&Value> {
        match self {
            ExprNode::Constant(n) => Some(&n.value),
            _ => None,
        }
    }

    /// The bare identifier name, if this is an un-targeted member access.
    pub fn as_identifier(&self) -> Option<&str> {
        match self {
            ExprNode::Member(n) if n.target.is_none() => Some(&n.name),
            _ => None,
        }
    }
}

fn write_string_literal(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    f.write_str("\"")?;
    for ch in s.chars() {
        match ch {
            '"' => f.write_str("\\\"")?,
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            '\r' => f.write_str("\\r")?,
            '\t' => f.write_str("\\t")?,
            ch => write!(f, "{ch}")?,
        }
    }
    f.write_str("\"")
}

impl fmt::Display for ConstantExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Value::Str(s) => write_string_literal(f, s),
            // Keep a float literal a float literal on re-parse.
            Value::F64(v) if v.fract() == 0.0 && v.is_finite() => write!(f, "{v:.1}"),
            value => write!(f, "{value}"),
        }
    }
}

fn write_target(f: &mut fmt::Formatter<'_>, target: &Option<ExprNode>) -> fmt::Result {
    if let Some(target) = target {
        write!(f, "{target}")?;
        f.write_str(".")?;
    }
    Ok(())
}

fn write_args(f: &mut fmt::Formatter<'_>, args: &[ExprNode]) -> fmt::Result {
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{arg}")?;
    }
    Ok(())
}

impl fmt::Display for ExprNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExprNode::Constant(n) => write!(f, "{n}"),
            ExprNode::Member(n) => {
                write_target(f, &n.target)?;
                f.write_str(&n.name)
            }
            ExprNode::Index(n) => {
                if let Some(target) = &n.target {
                    write!(f, "{target}")?;
                }
                f.write_str("[")?;
                write_args(f, &n.args)?;
                f.write_str("]")
            }
            ExprNode::MethodCall(n) => {
                write_target(f, &n.target)?;
                f.write_str(&n.name)?;
                if !n.type_args.is_empty() {
                    write!(f, "<{}>", n.type_args.join(", "))?;
                }
                f.write_str("(")?;
                write_args(f, &n.args)?;
                f.write_str(")")
            }
            ExprNode::Binary(n) => {
                if n.token.symbol == "?." {
                    write!(f, "{}?.{}", n.left, n.right)
                } else {
                    write!(f, "({} {} {})", n.left, n.token.symbol, n.right)
                }
            }
            ExprNode::Unary(n) => write!(f, "{}{}", n.token.symbol, n.operand),
            ExprNode::Condition(n) => {
                write!(f, "({} ? {} : {})", n.condition, n.if_true, n.if_false)
            }
            ExprNode::Lambda(n) => {
                if n.params.len() == 1 {
                    write!(f, "{} => {}", n.params[0], n.body)
                } else {
                    write!(f, "({}) => {}", n.params.join(", "), n.body)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bindex_core::token_type::binary_tokens;

    #[test]
    fn shared_constants_keep_identity() {
        let a = ExprNode::constant(Value::TRUE);
        let b = ExprNode::constant(Value::TRUE);
        assert!(a.same_node(&b));

        let x = ExprNode::constant(Value::I32(7));
        let y = ExprNode::constant(Value::I32(7));
        assert!(!x.same_node(&y));
        assert_eq!(x, y);
    }

    #[test]
    fn display_round_shapes() {
        let expr = ExprNode::binary(
            binary_tokens::ADD,
            ExprNode::member(Some(ExprNode::member(None, "Source")), "Age"),
            ExprNode::constant(Value::I32(1)),
        );
        assert_eq!(expr.to_string(), "(Source.Age + 1)");

        let call = ExprNode::method_call(
            Some(ExprNode::member(None, "Items")),
            "Where",
            vec!["T".into()],
            vec![ExprNode::lambda(
                vec!["x".into()],
                ExprNode::member(Some(ExprNode::member(None, "x")), "Active"),
            )],
        );
        assert_eq!(call.to_string(), "Items.Where<T>(x => x.Active)");
    }

    #[test]
    fn string_and_float_literals_stay_re_parseable() {
        let s = ExprNode::constant(Value::string("say \"hi\"\n"));
        assert_eq!(s.to_string(), "\"say \\\"hi\\\"\\n\"");

        let f = ExprNode::constant(Value::F64(2.0));
        assert_eq!(f.to_string(), "2.0");
    }

    #[test]
    fn null_conditional_renders_without_parens() {
        let expr = ExprNode::binary(
            binary_tokens::NULL_CONDITIONAL,
            ExprNode::member(None, "Source"),
            ExprNode::member(None, "Name"),
        );
        assert_eq!(expr.to_string(), "Source?.Name");
    }
}
