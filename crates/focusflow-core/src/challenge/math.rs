//! Mental arithmetic challenge: two 2-digit operands, plus or minus.

use rand::Rng;
use serde::{Deserialize, Serialize};

pub const OPERAND_MIN: u32 = 10;
pub const OPERAND_MAX: u32 = 99;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operator {
    Add,
    Subtract,
}

impl Operator {
    pub fn symbol(self) -> char {
        match self {
            Operator::Add => '+',
            Operator::Subtract => '-',
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MathChallenge {
    lhs: u32,
    rhs: u32,
    op: Operator,
    #[serde(default)]
    answer: Option<i64>,
}

impl MathChallenge {
    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let a = rng.gen_range(OPERAND_MIN..=OPERAND_MAX);
        let b = rng.gen_range(OPERAND_MIN..=OPERAND_MAX);
        let op = if rng.gen_bool(0.5) {
            Operator::Add
        } else {
            Operator::Subtract
        };
        Self::new(a, b, op)
    }

    /// Build a fixed problem. Subtraction operands are ordered so the result
    /// is never negative.
    pub fn new(a: u32, b: u32, op: Operator) -> Self {
        let (lhs, rhs) = match op {
            Operator::Subtract if b > a => (b, a),
            _ => (a, b),
        };
        Self {
            lhs,
            rhs,
            op,
            answer: None,
        }
    }

    pub fn operands(&self) -> (u32, u32) {
        (self.lhs, self.rhs)
    }

    pub fn operator(&self) -> Operator {
        self.op
    }

    pub fn question(&self) -> String {
        format!("{} {} {}", self.lhs, self.op.symbol(), self.rhs)
    }

    pub fn result(&self) -> i64 {
        match self.op {
            Operator::Add => self.lhs as i64 + self.rhs as i64,
            Operator::Subtract => self.lhs as i64 - self.rhs as i64,
        }
    }

    /// Record the user's current input. Anything that is not an integer
    /// simply leaves the challenge unsatisfied.
    pub fn set_input(&mut self, text: &str) {
        self.answer = text.trim().parse::<i64>().ok();
    }

    pub fn is_satisfied(&self) -> bool {
        self.answer == Some(self.result())
    }
}
