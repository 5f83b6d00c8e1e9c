//! Structural device nodes and the closed device taxonomy.
//!
//! Every structural device is a [`Node`] whose behavior is one variant of
//! [`NodeKind`]. The set of device kinds is closed and known at compile
//! time, so a tagged enum with pattern matching replaces a virtual class
//! hierarchy and gains exhaustiveness checking.
//!
//! Pin layout convention: for value-producing kinds, **pin 0 is the
//! output**. The per-kind layouts are documented on each variant.

use crate::ids::ScopeId;
use crate::link::Link;
use crate::scope::Attributes;
use serde::{Deserialize, Serialize};
use strand_common::{Ident, LogicVec};
use strand_source::Span;

/// Logic gate operations for [`NodeKind::Gate`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum GateOp {
    /// Bitwise AND of all inputs.
    And,
    /// Bitwise OR of all inputs.
    Or,
    /// Bitwise XOR of all inputs.
    Xor,
    /// Bitwise NAND of all inputs.
    Nand,
    /// Bitwise NOR of all inputs.
    Nor,
    /// Bitwise XNOR of all inputs.
    Xnor,
    /// Bitwise inverter; exactly one input.
    Not,
    /// Non-inverting buffer; exactly one input.
    Buf,
    /// Tri-state-capable buffer. Carries Z through; elided by the `nobufz`
    /// pass where strength semantics are not needed.
    Bufz,
}

/// Arithmetic operation for [`NodeKind::AddSub`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum ArithOp {
    /// Addition.
    Add,
    /// Subtraction (a - b).
    Sub,
}

/// Comparison operation for [`NodeKind::Compare`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum CmpOp {
    /// Equality.
    Eq,
    /// Inequality.
    Ne,
    /// Less-than.
    Lt,
    /// Less-or-equal.
    Le,
    /// Greater-than.
    Gt,
    /// Greater-or-equal.
    Ge,
}

/// Kind of 4-state-aware comparison for [`NodeKind::CaseCmp`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum CaseCmpKind {
    /// `===`: X and Z compare as themselves.
    Eq,
    /// `!==`.
    Ne,
    /// `casez`-style: Z bits in the guard are wildcards.
    EqZ,
    /// `casex`-style: X and Z bits in the guard are wildcards.
    EqX,
}

/// Shift direction for [`NodeKind::Shift`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum ShiftDir {
    /// Shift toward the MSB.
    Left,
    /// Shift toward the LSB.
    Right,
}

/// Direction of a part select.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum SelDir {
    /// Vector-to-part: read a slice out of a wider vector.
    VP,
    /// Part-to-vector: drive a slice of a wider vector.
    PV,
}

/// The behavior of a structural device node.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum NodeKind {
    /// A constant driver. Pins: `[out(width)]`.
    Const {
        /// The driven value; the output width equals `value.width()`.
        value: LogicVec,
    },
    /// A real-valued constant driver. Pins: `[out(1)]`.
    ConstReal {
        /// The driven real value.
        value: f64,
    },
    /// A multi-input logic gate applied bitwise over `width` bits.
    /// Pins: `[out(width), in0(width), in1(width), ...]`.
    Gate {
        /// The gate operation.
        op: GateOp,
        /// Bit width of the output and every input.
        width: u32,
    },
    /// Adder/subtractor. Pins: `[out(width), a(width), b(width)]`.
    AddSub {
        /// Add or subtract.
        op: ArithOp,
        /// Operand and result width.
        width: u32,
    },
    /// Magnitude/equality comparator. Pins: `[out(1), a(width), b(width)]`.
    Compare {
        /// The relational operation.
        op: CmpOp,
        /// Operand width.
        width: u32,
        /// Signed comparison; set only when both operands are signed.
        signed: bool,
    },
    /// 4-state-aware comparator for `===`-class operators and case guards.
    /// Pins: `[out(1), a(width), b(width)]`; for the wildcard kinds pin 2
    /// is the guard.
    CaseCmp {
        /// Exact or wildcard comparison.
        kind: CaseCmpKind,
        /// Operand width.
        width: u32,
    },
    /// N-way multiplexer.
    /// Pins: `[out(width), sel(sel_width), in0(width) .. in(inputs-1)(width)]`.
    Mux {
        /// Data width.
        width: u32,
        /// Selector width.
        sel_width: u32,
        /// Number of data inputs.
        inputs: u32,
    },
    /// Barrel shifter for non-constant shift distances only; constant
    /// distances are rewired statically and never build one.
    /// Pins: `[out(width), data(width), dist(dist_width)]`.
    Shift {
        /// Shift direction.
        dir: ShiftDir,
        /// Data width.
        width: u32,
        /// Fill vacated bits with the sign bit (arithmetic right shift).
        signed_pad: bool,
    },
    /// Concatenation of the input pins, pin 1 lowest.
    /// Pins: `[out(width), part0, part1, ...]` (parts of varying widths).
    Concat {
        /// Total output width.
        width: u32,
    },
    /// Replication of the input `count` times.
    /// Pins: `[out(width * count), in(width)]`.
    Replicate {
        /// Width of one copy.
        width: u32,
        /// Number of copies.
        count: u32,
    },
    /// Part select. Pins: `[part(width), vector(vec_width)]` plus
    /// `index(idx_width)` as pin 2 when `base` is `None` (dynamic index).
    /// For `VP` the part side is the output; for `PV` the vector side is.
    PartSelect {
        /// Read a part out, or drive a part in.
        dir: SelDir,
        /// Width of the part.
        width: u32,
        /// Constant base bit, or `None` for a dynamic index pin.
        base: Option<u32>,
    },
    /// Splices a narrower value into a wider vector: the output equals the
    /// vector input with bits `base .. base+sub_width` replaced by the sub
    /// input. Pins: `[out(width), vector(width), sub(sub_width)]`.
    Substitute {
        /// Full vector width.
        width: u32,
        /// First replaced bit.
        base: u32,
        /// Width of the replaced range.
        sub_width: u32,
    },
    /// Edge-triggered flip-flop bank.
    /// Pins: `[q(width), d(width), clk(1), ce(1), aset(1), aclr(1)]`;
    /// unused control pins stay unconnected.
    Dff {
        /// Data width.
        width: u32,
        /// Clock on the negative edge.
        neg_clock: bool,
        /// Value loaded on asynchronous set, if an aset input is wired.
        aset_value: Option<LogicVec>,
        /// Value loaded on asynchronous clear, if an aclr input is wired.
        aclr_value: Option<LogicVec>,
    },
    /// Level-sensitive latch. Pins: `[q(width), d(width), en(1)]`.
    Latch {
        /// Data width.
        width: u32,
    },
    /// Anonymous pin junction used by the synthesis engine to carry partial
    /// results. Pins: one passive pin per tracked output, each with its own
    /// width. Never survives into the finished netlist.
    Bus {
        /// Number of pins.
        pin_count: u32,
    },
    /// Sign extension. Pins: `[out(width), in(in_width)]`.
    SignExt {
        /// Output width.
        width: u32,
    },
}

impl NodeKind {
    /// A short lowercase tag for the kind, used in generated names and
    /// debug output.
    pub fn tag(&self) -> &'static str {
        match self {
            NodeKind::Const { .. } => "const",
            NodeKind::ConstReal { .. } => "constreal",
            NodeKind::Gate { .. } => "gate",
            NodeKind::AddSub { .. } => "addsub",
            NodeKind::Compare { .. } => "cmp",
            NodeKind::CaseCmp { .. } => "casecmp",
            NodeKind::Mux { .. } => "mux",
            NodeKind::Shift { .. } => "shift",
            NodeKind::Concat { .. } => "concat",
            NodeKind::Replicate { .. } => "repl",
            NodeKind::PartSelect { .. } => "part",
            NodeKind::Substitute { .. } => "subst",
            NodeKind::Dff { .. } => "dff",
            NodeKind::Latch { .. } => "latch",
            NodeKind::Bus { .. } => "bus",
            NodeKind::SignExt { .. } => "signext",
        }
    }
}

/// A structural device in the netlist graph.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Node {
    /// The scope containing this node.
    pub scope: ScopeId,
    /// Permanent name, unique within the scope.
    pub name: Ident,
    /// The device behavior.
    pub kind: NodeKind,
    /// Fixed pin array; layout is determined by `kind`.
    pub pins: Vec<Link>,
    /// Per-node attributes.
    pub attributes: Attributes,
    /// Source location this device was synthesized from.
    pub span: Span,
}

impl Node {
    /// Creates a node with an explicit pin array.
    pub fn new(scope: ScopeId, name: Ident, kind: NodeKind, pins: Vec<Link>, span: Span) -> Self {
        Self {
            scope,
            name,
            kind,
            pins,
            attributes: Attributes::new(),
            span,
        }
    }

    /// Number of pins.
    pub fn pin_count(&self) -> u32 {
        self.pins.len() as u32
    }

    /// The link at pin index `pin`.
    pub fn pin(&self, pin: u32) -> &Link {
        &self.pins[pin as usize]
    }

    /// Mutable link at pin index `pin`.
    pub fn pin_mut(&mut self, pin: u32) -> &mut Link {
        &mut self.pins[pin as usize]
    }
}
