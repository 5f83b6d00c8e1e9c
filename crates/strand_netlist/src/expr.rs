//! Behavioral expression trees.
//!
//! Expressions arrive from elaboration already width- and type-checked; the
//! netlist core only needs enough structure to synthesize them and to fold
//! the constants synthesis depends on (case guards, shift distances, select
//! bases).

use crate::design::Design;
use crate::ids::SignalId;
use serde::{Deserialize, Serialize};
use strand_common::{Logic, LogicVec};
use strand_source::Span;

/// Unary operators.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum UnaryOp {
    /// Arithmetic negation `-`.
    Neg,
    /// Bitwise inversion `~`.
    Not,
    /// Logical negation `!`; result is 1 bit.
    LogicNot,
    /// Reduction AND `&`; result is 1 bit.
    ReduceAnd,
    /// Reduction OR `|`; result is 1 bit.
    ReduceOr,
    /// Reduction XOR `^`; result is 1 bit.
    ReduceXor,
    /// Reduction NAND `~&`; result is 1 bit.
    ReduceNand,
    /// Reduction NOR `~|`; result is 1 bit.
    ReduceNor,
    /// Reduction XNOR `~^`; result is 1 bit.
    ReduceXnor,
}

impl UnaryOp {
    /// Returns `true` if the result is always a single bit.
    pub fn is_reduction(self) -> bool {
        !matches!(self, UnaryOp::Neg | UnaryOp::Not)
    }
}

/// Binary operators.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum BinaryOp {
    /// Addition.
    Add,
    /// Subtraction.
    Sub,
    /// Bitwise AND.
    And,
    /// Bitwise OR.
    Or,
    /// Bitwise XOR.
    Xor,
    /// Bitwise XNOR `~^`.
    Xnor,
    /// Logical AND `&&`; result is 1 bit.
    LogicAnd,
    /// Logical OR `||`; result is 1 bit.
    LogicOr,
    /// Equality `==`.
    Eq,
    /// Inequality `!=`.
    Ne,
    /// Case equality `===` (X/Z compare as themselves).
    CaseEq,
    /// Case inequality `!==`.
    CaseNe,
    /// Less-than.
    Lt,
    /// Less-or-equal.
    Le,
    /// Greater-than.
    Gt,
    /// Greater-or-equal.
    Ge,
    /// Logical shift left `<<`.
    ShiftL,
    /// Logical shift right `>>`.
    ShiftR,
    /// Arithmetic shift right `>>>`.
    ShiftRS,
}

impl BinaryOp {
    /// Returns `true` if the result is always a single bit.
    pub fn is_compare(self) -> bool {
        matches!(
            self,
            BinaryOp::LogicAnd
                | BinaryOp::LogicOr
                | BinaryOp::Eq
                | BinaryOp::Ne
                | BinaryOp::CaseEq
                | BinaryOp::CaseNe
                | BinaryOp::Lt
                | BinaryOp::Le
                | BinaryOp::Gt
                | BinaryOp::Ge
        )
    }

    /// Returns `true` for the shift operators.
    pub fn is_shift(self) -> bool {
        matches!(self, BinaryOp::ShiftL | BinaryOp::ShiftR | BinaryOp::ShiftRS)
    }
}

/// A behavioral expression.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum Expr {
    /// A bit-vector literal.
    Const {
        /// The literal value.
        value: LogicVec,
        /// Declared signed.
        signed: bool,
        /// Source location.
        span: Span,
    },
    /// A real-valued literal.
    ConstReal {
        /// The literal value.
        value: f64,
        /// Source location.
        span: Span,
    },
    /// A signal read, optionally indexed into an array word.
    Signal {
        /// The signal being read.
        sig: SignalId,
        /// Array word index, if the signal is a memory.
        word: Option<Box<Expr>>,
        /// Source location.
        span: Span,
    },
    /// A unary operation.
    Unary {
        /// The operator.
        op: UnaryOp,
        /// The operand.
        operand: Box<Expr>,
        /// Source location.
        span: Span,
    },
    /// A binary operation.
    Binary {
        /// The operator.
        op: BinaryOp,
        /// Left operand.
        l: Box<Expr>,
        /// Right operand.
        r: Box<Expr>,
        /// Source location.
        span: Span,
    },
    /// The ternary `?:` operator.
    Ternary {
        /// The 1-bit condition.
        cond: Box<Expr>,
        /// Value when the condition is true.
        t: Box<Expr>,
        /// Value when the condition is false.
        f: Box<Expr>,
        /// Source location.
        span: Span,
    },
    /// Concatenation with optional replication; `parts[0]` is the most
    /// significant part. The result is always unsigned.
    Concat {
        /// The concatenated parts, MSB first.
        parts: Vec<Expr>,
        /// Replication count; 1 for a plain concatenation.
        repeat: u32,
        /// Source location.
        span: Span,
    },
    /// A bit/part select `base[index +: width]` (canonical ascending form).
    Select {
        /// The expression being selected from.
        base: Box<Expr>,
        /// The index of the first selected bit.
        index: Box<Expr>,
        /// Number of selected bits.
        width: u32,
        /// Source location.
        span: Span,
    },
    /// A `$signed`/`$unsigned` cast; the bits pass through unchanged and
    /// only the static signedness of the result differs.
    Cast {
        /// `true` for `$signed`, `false` for `$unsigned`.
        signed: bool,
        /// The cast operand.
        operand: Box<Expr>,
        /// Source location.
        span: Span,
    },
}

impl Expr {
    /// The source location of this expression.
    pub fn span(&self) -> Span {
        match self {
            Expr::Const { span, .. }
            | Expr::ConstReal { span, .. }
            | Expr::Signal { span, .. }
            | Expr::Unary { span, .. }
            | Expr::Binary { span, .. }
            | Expr::Ternary { span, .. }
            | Expr::Concat { span, .. }
            | Expr::Select { span, .. }
            | Expr::Cast { span, .. } => *span,
        }
    }

    /// The bit width of this expression's value.
    ///
    /// Real-valued expressions report width 1; the synthesis engine treats
    /// them separately.
    pub fn width(&self, design: &Design) -> u32 {
        match self {
            Expr::Const { value, .. } => value.width(),
            Expr::ConstReal { .. } => 1,
            Expr::Signal { sig, .. } => design.signals[*sig].width(),
            Expr::Unary { op, operand, .. } => {
                if op.is_reduction() {
                    1
                } else {
                    operand.width(design)
                }
            }
            Expr::Binary { op, l, r, .. } => {
                if op.is_compare() {
                    1
                } else if op.is_shift() {
                    l.width(design)
                } else {
                    l.width(design).max(r.width(design))
                }
            }
            Expr::Ternary { t, f, .. } => t.width(design).max(f.width(design)),
            Expr::Concat { parts, repeat, .. } => {
                parts.iter().map(|p| p.width(design)).sum::<u32>() * repeat
            }
            Expr::Select { width, .. } => *width,
            Expr::Cast { operand, .. } => operand.width(design),
        }
    }

    /// Whether the expression's value is statically signed.
    pub fn signed(&self, design: &Design) -> bool {
        match self {
            Expr::Const { signed, .. } => *signed,
            Expr::ConstReal { .. } => true,
            Expr::Signal { sig, .. } => design.signals[*sig].signed,
            Expr::Unary { op, operand, .. } => {
                matches!(op, UnaryOp::Neg | UnaryOp::Not) && operand.signed(design)
            }
            Expr::Binary { op, l, r, .. } => match op {
                BinaryOp::Add | BinaryOp::Sub => l.signed(design) && r.signed(design),
                BinaryOp::ShiftL | BinaryOp::ShiftR | BinaryOp::ShiftRS => l.signed(design),
                _ => false,
            },
            Expr::Ternary { t, f, .. } => t.signed(design) && f.signed(design),
            // Concatenation is defined unsigned; selects likewise.
            Expr::Concat { .. } | Expr::Select { .. } => false,
            Expr::Cast { signed, .. } => *signed,
        }
    }

    /// Returns `true` for a real-valued expression.
    pub fn is_real(&self, design: &Design) -> bool {
        match self {
            Expr::ConstReal { .. } => true,
            Expr::Signal { sig, .. } => {
                design.signals[*sig].data_type == crate::signal::DataType::Real
            }
            Expr::Binary { op, l, r, .. } => {
                matches!(op, BinaryOp::Add | BinaryOp::Sub)
                    && (l.is_real(design) || r.is_real(design))
            }
            Expr::Cast { operand, .. } => operand.is_real(design),
            _ => false,
        }
    }

    /// Folds the expression to a compile-time constant vector, if possible.
    ///
    /// This is the minimal folding the synthesis engine depends on (case
    /// guards, shift distances, select bases); signal reads never fold.
    pub fn eval_const(&self, design: &Design) -> Option<LogicVec> {
        match self {
            Expr::Const { value, .. } => Some(value.clone()),
            Expr::ConstReal { .. } | Expr::Signal { .. } => None,
            Expr::Unary { op, operand, .. } => {
                let v = operand.eval_const(design)?;
                eval_unary(*op, &v)
            }
            Expr::Binary { op, l, r, .. } => {
                let lv = l.eval_const(design)?;
                let rv = r.eval_const(design)?;
                let signed = l.signed(design);
                eval_binary(*op, &lv, &rv, signed)
            }
            Expr::Ternary { cond, t, f, .. } => {
                let c = cond.eval_const(design)?;
                let width = self.width(design);
                match c.to_u64() {
                    Some(0) => Some(f.eval_const(design)?.zero_extend(width)),
                    Some(_) => Some(t.eval_const(design)?.zero_extend(width)),
                    None => None,
                }
            }
            Expr::Concat { parts, repeat, .. } => {
                let mut acc = LogicVec::new(0);
                // parts are MSB first; build LSB first.
                for part in parts.iter().rev() {
                    acc = acc.concat(&part.eval_const(design)?);
                }
                Some(acc.repeat(*repeat))
            }
            Expr::Select {
                base, index, width, ..
            } => {
                let bv = base.eval_const(design)?;
                let idx = index.eval_const(design)?.to_u64()?;
                Some(bv.slice(u32::try_from(idx).ok()?, *width))
            }
            Expr::Cast { operand, .. } => operand.eval_const(design),
        }
    }
}

fn eval_unary(op: UnaryOp, v: &LogicVec) -> Option<LogicVec> {
    match op {
        UnaryOp::Not => Some(!v),
        UnaryOp::Neg => {
            let n = v.to_u64()?;
            Some(LogicVec::from_u64(n.wrapping_neg(), v.width()))
        }
        UnaryOp::LogicNot => {
            let n = v.to_u64()?;
            Some(LogicVec::from_bool(n == 0))
        }
        UnaryOp::ReduceAnd => Some(LogicVec::from_bool(v.is_all_one())),
        UnaryOp::ReduceNand => Some(LogicVec::from_bool(!v.is_all_one())),
        UnaryOp::ReduceOr => Some(LogicVec::from_bool(v.to_u64()? != 0)),
        UnaryOp::ReduceNor => Some(LogicVec::from_bool(v.to_u64()? == 0)),
        UnaryOp::ReduceXor => {
            let ones = v.iter().filter(|b| *b == Logic::One).count();
            if !v.is_fully_defined() {
                return None;
            }
            Some(LogicVec::from_bool(ones % 2 == 1))
        }
        UnaryOp::ReduceXnor => {
            let ones = v.iter().filter(|b| *b == Logic::One).count();
            if !v.is_fully_defined() {
                return None;
            }
            Some(LogicVec::from_bool(ones % 2 == 0))
        }
    }
}

fn eval_binary(op: BinaryOp, l: &LogicVec, r: &LogicVec, l_signed: bool) -> Option<LogicVec> {
    let width = l.width().max(r.width());
    match op {
        BinaryOp::And => Some(&l.zero_extend(width) & &r.zero_extend(width)),
        BinaryOp::Or => Some(&l.zero_extend(width) | &r.zero_extend(width)),
        BinaryOp::Xor => Some(&l.zero_extend(width) ^ &r.zero_extend(width)),
        BinaryOp::Xnor => Some(!&(&l.zero_extend(width) ^ &r.zero_extend(width))),
        BinaryOp::Add | BinaryOp::Sub => {
            if width > 64 {
                return None;
            }
            let a = l.to_u64()?;
            let b = r.to_u64()?;
            let sum = if op == BinaryOp::Add {
                a.wrapping_add(b)
            } else {
                a.wrapping_sub(b)
            };
            Some(LogicVec::from_u64(sum, width))
        }
        BinaryOp::ShiftL => {
            let dist = u32::try_from(r.to_u64()?).ok()?;
            let w = l.width();
            if dist >= w {
                return Some(LogicVec::new(w));
            }
            Some(LogicVec::new(dist).concat(&l.slice(0, w - dist)))
        }
        BinaryOp::ShiftR | BinaryOp::ShiftRS => {
            let dist = u32::try_from(r.to_u64()?).ok()?;
            let w = l.width();
            let fill = if op == BinaryOp::ShiftRS && l_signed {
                l.sign_bit()
            } else {
                Logic::Zero
            };
            if dist >= w {
                return Some(LogicVec::filled(fill, w));
            }
            Some(l.slice(dist, w - dist).concat(&LogicVec::filled(fill, dist)))
        }
        BinaryOp::LogicAnd => Some(LogicVec::from_bool(l.to_u64()? != 0 && r.to_u64()? != 0)),
        BinaryOp::LogicOr => Some(LogicVec::from_bool(l.to_u64()? != 0 || r.to_u64()? != 0)),
        BinaryOp::Eq | BinaryOp::Ne => {
            let equal = l.to_u64()? == r.to_u64()?;
            Some(LogicVec::from_bool(equal == (op == BinaryOp::Eq)))
        }
        BinaryOp::CaseEq | BinaryOp::CaseNe => {
            let equal = l.zero_extend(width) == r.zero_extend(width);
            Some(LogicVec::from_bool(equal == (op == BinaryOp::CaseEq)))
        }
        BinaryOp::Lt => Some(LogicVec::from_bool(l.to_u64()? < r.to_u64()?)),
        BinaryOp::Le => Some(LogicVec::from_bool(l.to_u64()? <= r.to_u64()?)),
        BinaryOp::Gt => Some(LogicVec::from_bool(l.to_u64()? > r.to_u64()?)),
        BinaryOp::Ge => Some(LogicVec::from_bool(l.to_u64()? >= r.to_u64()?)),
    }
}

/// Convenience constructor for an unsigned constant expression.
pub fn const_expr(value: LogicVec, span: Span) -> Expr {
    Expr::Const {
        value,
        signed: false,
        span,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::design::Design;
    use crate::signal::NetType;

    fn c(bits: &str) -> Expr {
        const_expr(LogicVec::from_binary_str(bits).unwrap(), Span::DUMMY)
    }

    fn bin(op: BinaryOp, l: Expr, r: Expr) -> Expr {
        Expr::Binary {
            op,
            l: Box::new(l),
            r: Box::new(r),
            span: Span::DUMMY,
        }
    }

    #[test]
    fn const_folds_to_itself() {
        let design = Design::new();
        let e = c("1010");
        assert_eq!(e.eval_const(&design).unwrap().to_u64(), Some(0b1010));
        assert_eq!(e.width(&design), 4);
    }

    #[test]
    fn add_and_sub_fold() {
        let design = Design::new();
        let e = bin(BinaryOp::Add, c("0011"), c("0001"));
        assert_eq!(e.eval_const(&design).unwrap().to_u64(), Some(4));
        let e = bin(BinaryOp::Sub, c("0000"), c("0001"));
        assert_eq!(e.eval_const(&design).unwrap().to_u64(), Some(0xF));
    }

    #[test]
    fn shift_fold() {
        let design = Design::new();
        let e = bin(BinaryOp::ShiftL, c("0011"), c("10"));
        assert_eq!(e.eval_const(&design).unwrap().to_u64(), Some(0b1100));
        let e = bin(BinaryOp::ShiftR, c("1100"), c("10"));
        assert_eq!(e.eval_const(&design).unwrap().to_u64(), Some(0b0011));
    }

    #[test]
    fn arithmetic_shift_keeps_sign() {
        let design = Design::new();
        let l = Expr::Const {
            value: LogicVec::from_binary_str("1000").unwrap(),
            signed: true,
            span: Span::DUMMY,
        };
        let e = bin(BinaryOp::ShiftRS, l, c("10"));
        assert_eq!(e.eval_const(&design).unwrap().to_u64(), Some(0b1110));
    }

    #[test]
    fn signal_reads_never_fold() {
        let mut design = Design::new();
        let scope = design.new_root_scope("top");
        let sig = design.new_signal(scope, "a", NetType::Wire, 3, 0);
        let e = Expr::Signal {
            sig,
            word: None,
            span: Span::DUMMY,
        };
        assert!(e.eval_const(&design).is_none());
        assert_eq!(e.width(&design), 4);
    }

    #[test]
    fn xz_operands_do_not_fold_arithmetic() {
        let design = Design::new();
        let e = bin(BinaryOp::Add, c("00X1"), c("0001"));
        assert!(e.eval_const(&design).is_none());
    }

    #[test]
    fn concat_folds_msb_first() {
        let design = Design::new();
        let e = Expr::Concat {
            parts: vec![c("11"), c("00")],
            repeat: 1,
            span: Span::DUMMY,
        };
        let v = e.eval_const(&design).unwrap();
        assert_eq!(format!("{v}"), "1100");
        assert_eq!(e.width(&design), 4);
        assert!(!e.signed(&design));
    }

    #[test]
    fn ternary_folds_on_const_cond() {
        let design = Design::new();
        let e = Expr::Ternary {
            cond: Box::new(c("1")),
            t: Box::new(c("1010")),
            f: Box::new(c("0101")),
            span: Span::DUMMY,
        };
        assert_eq!(e.eval_const(&design).unwrap().to_u64(), Some(0b1010));
    }

    #[test]
    fn select_folds_const_base() {
        let design = Design::new();
        let e = Expr::Select {
            base: Box::new(c("110010")),
            index: Box::new(c("001")),
            width: 3,
            span: Span::DUMMY,
        };
        let v = e.eval_const(&design).unwrap();
        assert_eq!(format!("{v}"), "001");
    }

    #[test]
    fn compare_width_is_one() {
        let design = Design::new();
        let e = bin(BinaryOp::Eq, c("1010"), c("1010"));
        assert_eq!(e.width(&design), 1);
        assert_eq!(e.eval_const(&design).unwrap().to_u64(), Some(1));
    }

    #[test]
    fn cast_changes_signedness_only() {
        let design = Design::new();
        let e = Expr::Cast {
            signed: true,
            operand: Box::new(c("1000")),
            span: Span::DUMMY,
        };
        assert!(e.signed(&design));
        assert_eq!(e.width(&design), 4);
        assert_eq!(e.eval_const(&design).unwrap().to_u64(), Some(0b1000));
    }

    #[test]
    fn reduction_width_is_one() {
        let design = Design::new();
        let e = Expr::Unary {
            op: UnaryOp::ReduceOr,
            operand: Box::new(c("0010")),
            span: Span::DUMMY,
        };
        assert_eq!(e.width(&design), 1);
        assert_eq!(e.eval_const(&design).unwrap().to_u64(), Some(1));
    }
}
