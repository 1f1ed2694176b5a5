use std::fmt;

/// Number of faces on a die. Fate dice land on -1, 0 or +1 and render as
/// glyphs instead of digits.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DieSides {
    Faces(u32),
    Fate,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Subtract,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompareOp {
    GreaterEqual,
    Equal,
}

/// Parsed dice expression. The tree is derived once from the source string
/// and never mutated afterwards.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DiceExpr {
    Literal(i32),
    DieRoll { count: u32, sides: DieSides },
    BinaryOp { op: BinOp, left: Box<DiceExpr>, right: Box<DiceExpr> },
    Explode(Box<DiceExpr>),
    Group(Box<DiceExpr>),
    ThresholdCompare { inner: Box<DiceExpr>, op: CompareOp, target: i32 },
}

impl DiceExpr {
    /// The die roll backing this node, looking through grouping brackets.
    pub(crate) fn underlying_die(&self) -> Option<(u32, DieSides)> {
        match self {
            Self::DieRoll { count, sides } => Some((*count, *sides)),
            Self::Group(inner) => inner.underlying_die(),
            _ => None,
        }
    }

    /// True when the whole expression is a single fate roll, which switches
    /// the detail rendering to glyphs.
    pub(crate) fn is_fate_roll(&self) -> bool {
        matches!(self.underlying_die(), Some((_, DieSides::Fate)))
    }
}

impl fmt::Display for DieSides {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Faces(faces) => write!(f, "{faces}"),
            Self::Fate => write!(f, "F"),
        }
    }
}

impl fmt::Display for BinOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Add => write!(f, "+"),
            Self::Subtract => write!(f, "-"),
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GreaterEqual => write!(f, "\u{2265}"),
            Self::Equal => write!(f, "="),
        }
    }
}

impl fmt::Display for DiceExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(value) => write!(f, "{value}"),
            Self::DieRoll { count, sides } => write!(f, "{count}d{sides}"),
            Self::BinaryOp { op: BinOp::Subtract, left, right }
                if **left == Self::Literal(0) =>
            {
                write!(f, "-{right}")
            }
            Self::BinaryOp { op, left, right } => write!(f, "{left}{op}{right}"),
            Self::Explode(inner) => write!(f, "{inner}!!"),
            Self::Group(inner) => write!(f, "[{inner}]"),
            Self::ThresholdCompare { inner, op, target } => write!(f, "{inner}{op}{target}"),
        }
    }
}
