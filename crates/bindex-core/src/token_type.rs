//! Fixed operator token catalogs.
//!
//! Binary and unary tokens are immutable catalog entries: a symbol, a
//! numeric precedence, and optional textual aliases (`mod` for `%`).
//! Equality is by symbol, so AST structural comparison ignores everything
//! but the operator identity.
//!
//! The precedence numbers reproduce the reference table exactly, including
//! the unusual placement of `?.` as a binary token at the top of the chain
//! (1000). `??` is the only right-associative operator.

use std::fmt;
use std::hash::{Hash, Hasher};

/// A binary operator token: symbol, precedence, aliases.
#[derive(Clone, Copy, Eq)]
pub struct BinaryTokenType {
    pub symbol: &'static str,
    pub precedence: i32,
    pub aliases: &'static [&'static str],
}

impl BinaryTokenType {
    const fn new(symbol: &'static str, precedence: i32, aliases: &'static [&'static str]) -> Self {
        Self {
            symbol,
            precedence,
            aliases,
        }
    }

    /// Whether operands at equal precedence fold to the right.
    ///
    /// Only `??` folds right; everything else is left-associative.
    pub fn is_right_associative(&self) -> bool {
        self.symbol == "??"
    }
}

impl PartialEq for BinaryTokenType {
    fn eq(&self, other: &Self) -> bool {
        self.symbol == other.symbol
    }
}

impl Hash for BinaryTokenType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.symbol.hash(state);
    }
}

impl fmt::Debug for BinaryTokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BinaryTokenType({})", self.symbol)
    }
}

impl fmt::Display for BinaryTokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol)
    }
}

/// A unary prefix operator token.
#[derive(Clone, Copy, Eq)]
pub struct UnaryTokenType {
    pub symbol: &'static str,
}

impl UnaryTokenType {
    const fn new(symbol: &'static str) -> Self {
        Self { symbol }
    }
}

impl PartialEq for UnaryTokenType {
    fn eq(&self, other: &Self) -> bool {
        self.symbol == other.symbol
    }
}

impl Hash for UnaryTokenType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.symbol.hash(state);
    }
}

impl fmt::Debug for UnaryTokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UnaryTokenType({})", self.symbol)
    }
}

impl fmt::Display for UnaryTokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol)
    }
}

/// The fixed binary operator catalog.
pub mod binary_tokens {
    use super::BinaryTokenType;

    pub const NULL_CONDITIONAL: BinaryTokenType = BinaryTokenType::new("?.", 1000, &[]);
    pub const MULTIPLY: BinaryTokenType = BinaryTokenType::new("*", 990, &[]);
    pub const DIVIDE: BinaryTokenType = BinaryTokenType::new("/", 990, &[]);
    pub const REMAINDER: BinaryTokenType = BinaryTokenType::new("%", 990, &["mod"]);
    pub const ADD: BinaryTokenType = BinaryTokenType::new("+", 980, &[]);
    pub const SUBTRACT: BinaryTokenType = BinaryTokenType::new("-", 980, &[]);
    pub const LEFT_SHIFT: BinaryTokenType = BinaryTokenType::new("<<", 970, &[]);
    pub const RIGHT_SHIFT: BinaryTokenType = BinaryTokenType::new(">>", 970, &[]);
    pub const LESS: BinaryTokenType = BinaryTokenType::new("<", 960, &[]);
    pub const GREATER: BinaryTokenType = BinaryTokenType::new(">", 960, &[]);
    pub const LESS_EQUAL: BinaryTokenType = BinaryTokenType::new("<=", 960, &[]);
    pub const GREATER_EQUAL: BinaryTokenType = BinaryTokenType::new(">=", 960, &[]);
    pub const EQUAL: BinaryTokenType = BinaryTokenType::new("==", 950, &[]);
    pub const NOT_EQUAL: BinaryTokenType = BinaryTokenType::new("!=", 950, &[]);
    pub const BIT_AND: BinaryTokenType = BinaryTokenType::new("&", 940, &[]);
    pub const BIT_XOR: BinaryTokenType = BinaryTokenType::new("^", 930, &[]);
    pub const BIT_OR: BinaryTokenType = BinaryTokenType::new("|", 920, &[]);
    pub const LOGICAL_AND: BinaryTokenType = BinaryTokenType::new("&&", 910, &["and"]);
    pub const LOGICAL_OR: BinaryTokenType = BinaryTokenType::new("||", 900, &["or"]);
    pub const COALESCE: BinaryTokenType = BinaryTokenType::new("??", 890, &[]);
    /// Binding-parameter assignment (`Converter=Foo`); below every
    /// expression tier so it only binds at the parameter level.
    pub const ASSIGN: BinaryTokenType = BinaryTokenType::new("=", 100, &[]);

    /// Every registered binary token.
    pub const ALL: &[BinaryTokenType] = &[
        NULL_CONDITIONAL,
        MULTIPLY,
        DIVIDE,
        REMAINDER,
        ADD,
        SUBTRACT,
        LEFT_SHIFT,
        RIGHT_SHIFT,
        LESS,
        GREATER,
        LESS_EQUAL,
        GREATER_EQUAL,
        EQUAL,
        NOT_EQUAL,
        BIT_AND,
        BIT_XOR,
        BIT_OR,
        LOGICAL_AND,
        LOGICAL_OR,
        COALESCE,
        ASSIGN,
    ];
}

/// The fixed unary operator catalog.
pub mod unary_tokens {
    use super::UnaryTokenType;

    pub const MINUS: UnaryTokenType = UnaryTokenType::new("-");
    pub const PLUS: UnaryTokenType = UnaryTokenType::new("+");
    pub const NOT: UnaryTokenType = UnaryTokenType::new("!");
    pub const BIT_NOT: UnaryTokenType = UnaryTokenType::new("~");
    /// Dynamic macro prefix: the resource is read at invocation time.
    pub const MACRO: UnaryTokenType = UnaryTokenType::new("$");
    /// Static macro prefix: the resource is read at compile time.
    pub const STATIC_MACRO: UnaryTokenType = UnaryTokenType::new("$$");

    /// Every registered unary token. `$$` precedes `$` so longest-match
    /// scanning stays a simple front-to-back pass.
    pub const ALL: &[UnaryTokenType] = &[STATIC_MACRO, MACRO, MINUS, PLUS, NOT, BIT_NOT];
}
