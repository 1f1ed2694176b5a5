use super::ast::{BinOp, CompareOp, DiceExpr, DieSides};
use super::random::RandomSource;

/// Hard stop for appended re-rolls in one exploding node, so a rigged
/// random source cannot grow the roll without bound.
pub const EXPLOSION_CAP: usize = 100;

const FATE_NEGATIVE: &str = "\u{2212}";
const FATE_ZERO: &str = "\u{25A2}";
const FATE_POSITIVE: &str = "\u{FF0B}";

/// One evaluated roll: the individual die values in roll order, the derived
/// aggregate (sum or qualifying count) and the rendered title/detail pair.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RollOutcome {
    pub values: Vec<i32>,
    pub aggregate: i32,
    pub title: String,
    pub detail: String,
}

/// Chat-markup bold, used to mark qualifying dice.
pub fn make_bold(value: i32) -> String {
    format!("**{value}**")
}

pub fn evaluate(expr: &DiceExpr, random: &mut dyn RandomSource) -> RollOutcome {
    let rolled = roll_node(expr, random);
    let (title, detail) = format_outcome(expr, &rolled);
    RollOutcome { values: rolled.values, aggregate: rolled.aggregate, title, detail }
}

struct Rolled {
    values: Vec<i32>,
    aggregate: i32,
}

fn roll_node(expr: &DiceExpr, random: &mut dyn RandomSource) -> Rolled {
    match expr {
        DiceExpr::Literal(value) => Rolled { values: Vec::new(), aggregate: *value },
        DiceExpr::DieRoll { count, sides } => roll_dice(*count, *sides, random),
        DiceExpr::BinaryOp { op, left, right } => {
            let mut lhs = roll_node(left, random);
            let rhs = roll_node(right, random);
            let aggregate = match op {
                BinOp::Add => lhs.aggregate + rhs.aggregate,
                BinOp::Subtract => lhs.aggregate - rhs.aggregate,
            };
            lhs.values.extend(rhs.values);
            Rolled { values: lhs.values, aggregate }
        }
        DiceExpr::Explode(inner) => roll_exploding(inner, random),
        DiceExpr::Group(inner) => roll_node(inner, random),
        DiceExpr::ThresholdCompare { inner, op, target } => {
            let rolled = roll_node(inner, random);
            let aggregate =
                rolled.values.iter().filter(|value| compare(**value, *op, *target)).count();
            Rolled { values: rolled.values, aggregate: aggregate as i32 }
        }
    }
}

fn roll_dice(count: u32, sides: DieSides, random: &mut dyn RandomSource) -> Rolled {
    let values: Vec<i32> = match sides {
        DieSides::Faces(faces) => {
            (0..count).map(|_| random.uniform(1, faces as i32)).collect()
        }
        DieSides::Fate => (0..count).map(|_| random.uniform(1, 3) - 2).collect(),
    };
    let aggregate = values.iter().sum();
    Rolled { values, aggregate }
}

fn roll_exploding(inner: &DiceExpr, random: &mut dyn RandomSource) -> Rolled {
    let Some((count, DieSides::Faces(faces))) = inner.underlying_die() else {
        return roll_node(inner, random);
    };
    let max = faces as i32;
    let mut values = Vec::new();
    let mut appended = 0usize;
    for _ in 0..count {
        let mut value = random.uniform(1, max);
        values.push(value);
        while value == max && appended < EXPLOSION_CAP {
            value = random.uniform(1, max);
            values.push(value);
            appended += 1;
        }
    }
    let aggregate = values.iter().sum();
    Rolled { values, aggregate }
}

fn compare(value: i32, op: CompareOp, target: i32) -> bool {
    match op {
        CompareOp::GreaterEqual => value >= target,
        CompareOp::Equal => value == target,
    }
}

fn format_outcome(expr: &DiceExpr, rolled: &Rolled) -> (String, String) {
    match expr {
        DiceExpr::ThresholdCompare { inner, op, target } => {
            let marked: Vec<String> = rolled
                .values
                .iter()
                .map(|value| {
                    if compare(*value, *op, *target) {
                        make_bold(*value)
                    } else {
                        value.to_string()
                    }
                })
                .collect();
            let title = format!("{inner} = {}", rolled.aggregate);
            let detail = format!("[{}] {op}{target} = {}", marked.join(","), rolled.aggregate);
            (title, detail)
        }
        _ if expr.is_fate_roll() => {
            let glyphs: Vec<&str> =
                rolled.values.iter().map(|value| fate_glyph(*value)).collect();
            let title = format!("{expr} = {}", rolled.aggregate);
            let detail = format!("[{}]", glyphs.join(","));
            (title, detail)
        }
        _ => {
            let listed: Vec<String> = rolled.values.iter().map(ToString::to_string).collect();
            let title = format!("{expr} = {}", rolled.aggregate);
            let detail = format!("[{}] = {}", listed.join(","), rolled.aggregate);
            (title, detail)
        }
    }
}

fn fate_glyph(value: i32) -> &'static str {
    if value < 0 {
        FATE_NEGATIVE
    } else if value > 0 {
        FATE_POSITIVE
    } else {
        FATE_ZERO
    }
}
