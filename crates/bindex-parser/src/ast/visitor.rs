//! Rewriting visitor over the expression tree.
//!
//! The driver walks the tree in the visitor's declared order and rebuilds
//! a node only when one of its children was actually replaced, so untouched
//! subtrees keep their allocation identity. A visited set guards against
//! re-entering a node a visitor produced that still contains the original.

use rustc_hash::FxHashSet;

use super::ExprNode;

/// When the visitor sees a node relative to that node's children.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraversalOrder {
    /// Parent first, then the (possibly replaced) node's children.
    Pre,
    /// Children first, then the reconstructed parent.
    Post,
}

/// A tree-rewriting pass.
///
/// Return `None` from [`visit`](ExprVisitor::visit) to leave a node
/// unchanged, or `Some` with the replacement.
pub trait ExprVisitor {
    fn traversal_order(&self) -> TraversalOrder {
        TraversalOrder::Post
    }

    fn visit(&mut self, node: &ExprNode) -> Option<ExprNode>;
}

/// Rewrite a tree with the given visitor.
pub fn rewrite(root: &ExprNode, visitor: &mut dyn ExprVisitor) -> ExprNode {
    let mut visited = FxHashSet::default();
    rewrite_inner(root, visitor, &mut visited)
}

fn rewrite_inner(
    node: &ExprNode,
    visitor: &mut dyn ExprVisitor,
    visited: &mut FxHashSet<usize>,
) -> ExprNode {
    match visitor.traversal_order() {
        TraversalOrder::Pre => {
            let current = apply(node, visitor, visited);
            rewrite_children(&current, visitor, visited)
        }
        TraversalOrder::Post => {
            let current = rewrite_children(node, visitor, visited);
            apply(&current, visitor, visited)
        }
    }
}

fn apply(
    node: &ExprNode,
    visitor: &mut dyn ExprVisitor,
    visited: &mut FxHashSet<usize>,
) -> ExprNode {
    // A node already seen in this pass is left alone, even if a visitor
    // replacement re-introduced it.
    if !visited.insert(node.node_id()) {
        return node.clone();
    }
    match visitor.visit(node) {
        Some(replacement) => replacement,
        None => node.clone(),
    }
}

fn rewrite_option(
    target: &Option<ExprNode>,
    visitor: &mut dyn ExprVisitor,
    visited: &mut FxHashSet<usize>,
    changed: &mut bool,
) -> Option<ExprNode> {
    target.as_ref().map(|node| {
        let rewritten = rewrite_inner(node, visitor, visited);
        *changed |= !rewritten.same_node(node);
        rewritten
    })
}

fn rewrite_list(
    nodes: &[ExprNode],
    visitor: &mut dyn ExprVisitor,
    visited: &mut FxHashSet<usize>,
    changed: &mut bool,
) -> Vec<ExprNode> {
    nodes
        .iter()
        .map(|node| {
            let rewritten = rewrite_inner(node, visitor, visited);
            *changed |= !rewritten.same_node(node);
            rewritten
        })
        .collect()
}

fn rewrite_children(
    node: &ExprNode,
    visitor: &mut dyn ExprVisitor,
    visited: &mut FxHashSet<usize>,
) -> ExprNode {
    let mut changed = false;
    match node {
        ExprNode::Constant(_) => node.clone(),
        ExprNode::Member(n) => {
            let target = rewrite_option(&n.target, visitor, visited, &mut changed);
            if changed {
                ExprNode::member(target, n.name.clone())
            } else {
                node.clone()
            }
        }
        ExprNode::Index(n) => {
            let target = rewrite_option(&n.target, visitor, visited, &mut changed);
            let args = rewrite_list(&n.args, visitor, visited, &mut changed);
            if changed {
                ExprNode::index(target, args)
            } else {
                node.clone()
            }
        }
        ExprNode::MethodCall(n) => {
            let target = rewrite_option(&n.target, visitor, visited, &mut changed);
            let args = rewrite_list(&n.args, visitor, visited, &mut changed);
            if changed {
                ExprNode::method_call(target, n.name.clone(), n.type_args.clone(), args)
            } else {
                node.clone()
            }
        }
        ExprNode::Binary(n) => {
            let left = rewrite_inner(&n.left, visitor, visited);
            let right = rewrite_inner(&n.right, visitor, visited);
            if left.same_node(&n.left) && right.same_node(&n.right) {
                node.clone()
            } else {
                ExprNode::binary(n.token, left, right)
            }
        }
        ExprNode::Unary(n) => {
            let operand = rewrite_inner(&n.operand, visitor, visited);
            if operand.same_node(&n.operand) {
                node.clone()
            } else {
                ExprNode::unary(n.token, operand)
            }
        }
        ExprNode::Condition(n) => {
            let condition = rewrite_inner(&n.condition, visitor, visited);
            let if_true = rewrite_inner(&n.if_true, visitor, visited);
            let if_false = rewrite_inner(&n.if_false, visitor, visited);
            if condition.same_node(&n.condition)
                && if_true.same_node(&n.if_true)
                && if_false.same_node(&n.if_false)
            {
                node.clone()
            } else {
                ExprNode::condition(condition, if_true, if_false)
            }
        }
        ExprNode::Lambda(n) => {
            let body = rewrite_inner(&n.body, visitor, visited);
            if body.same_node(&n.body) {
                node.clone()
            } else {
                ExprNode::lambda(n.params.clone(), body)
            }
        }
    }
}
