//! Named signals: wires, regs, tri nets, and supply rails.

use crate::ids::ScopeId;
use crate::link::Link;
use serde::{Deserialize, Serialize};
use strand_source::Span;

/// The net type of a signal.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum NetType {
    /// Plain wire.
    Wire,
    /// Tri-state net.
    Tri,
    /// Tri-state net that pulls to 0 when undriven.
    Tri0,
    /// Tri-state net that pulls to 1 when undriven.
    Tri1,
    /// Constant 0 power rail.
    Supply0,
    /// Constant 1 power rail.
    Supply1,
    /// Variable (procedural assignment target).
    Reg,
}

/// Whether and how a signal is a port of its scope.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum PortType {
    /// Not a port.
    NotAPort,
    /// Input port.
    Input,
    /// Output port.
    Output,
    /// Bidirectional port.
    Inout,
}

/// Element data type of a signal.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum DataType {
    /// 4-state logic.
    Logic,
    /// 2-state bool.
    Bool,
    /// Real-valued; carries no bit vector.
    Real,
}

/// A named signal in the design.
///
/// A signal has exactly one pin, always passive: it carries the value of
/// its nexus and never drives it (drivers are nodes). Reference counts
/// forbid deletion while behavioral code still mentions the signal:
/// `eref` counts expression (read) references, `lref` counts l-value
/// (write) references.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Signal {
    /// The scope owning this signal.
    pub scope: ScopeId,
    /// The signal's name, unique within its scope.
    pub name: strand_common::Ident,
    /// Net type.
    pub net_type: NetType,
    /// Port classification.
    pub port_type: PortType,
    /// Element data type.
    pub data_type: DataType,
    /// Declared signed.
    pub signed: bool,
    /// MSB of the packed range.
    pub msb: i32,
    /// LSB of the packed range.
    pub lsb: i32,
    /// Synthesis-generated temporary; candidate for cleanup passes.
    pub local: bool,
    /// Expression (read) reference count.
    pub eref: u32,
    /// L-value (write) reference count.
    pub lref: u32,
    /// The single passive pin.
    pub pin: Link,
    /// Source location of the declaration.
    pub span: Span,
}

impl Signal {
    /// Creates a wire signal with the packed range `[msb:lsb]`.
    pub fn new(
        scope: ScopeId,
        name: strand_common::Ident,
        net_type: NetType,
        msb: i32,
        lsb: i32,
        span: Span,
    ) -> Self {
        let width = msb.abs_diff(lsb) + 1;
        Self {
            scope,
            name,
            net_type,
            port_type: PortType::NotAPort,
            data_type: DataType::Logic,
            signed: false,
            msb,
            lsb,
            local: false,
            eref: 0,
            lref: 0,
            pin: Link::passive(width),
            span,
        }
    }

    /// Width of the packed vector in bits.
    pub fn width(&self) -> u32 {
        self.msb.abs_diff(self.lsb) + 1
    }

    /// Converts a bit number from the declared range to a canonical offset
    /// from the LSB, or `None` if out of range.
    pub fn sb_to_idx(&self, sb: i32) -> Option<u32> {
        let (lo, hi) = if self.msb >= self.lsb {
            (self.lsb, self.msb)
        } else {
            (self.msb, self.lsb)
        };
        if sb < lo || sb > hi {
            return None;
        }
        Some(if self.msb >= self.lsb {
            (sb - self.lsb) as u32
        } else {
            (self.lsb - sb) as u32
        })
    }

    /// Returns `true` if the signal may not be deleted because behavioral
    /// code still references it.
    pub fn referenced(&self) -> bool {
        self.eref > 0 || self.lref > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strand_common::Ident;

    fn sig(msb: i32, lsb: i32) -> Signal {
        Signal::new(
            ScopeId::from_raw(0),
            Ident::from_raw(0),
            NetType::Wire,
            msb,
            lsb,
            Span::DUMMY,
        )
    }

    #[test]
    fn width_from_range() {
        assert_eq!(sig(7, 0).width(), 8);
        assert_eq!(sig(0, 0).width(), 1);
        assert_eq!(sig(0, 7).width(), 8);
        assert_eq!(sig(-1, -4).width(), 4);
    }

    #[test]
    fn pin_matches_width() {
        let s = sig(7, 0);
        assert_eq!(s.pin.width, 8);
        assert_eq!(s.pin.dir, crate::link::PinDir::Passive);
    }

    #[test]
    fn sb_to_idx_normal_range() {
        let s = sig(7, 0);
        assert_eq!(s.sb_to_idx(0), Some(0));
        assert_eq!(s.sb_to_idx(7), Some(7));
        assert_eq!(s.sb_to_idx(8), None);
        assert_eq!(s.sb_to_idx(-1), None);
    }

    #[test]
    fn sb_to_idx_reversed_range() {
        let s = sig(0, 7);
        assert_eq!(s.sb_to_idx(7), Some(0));
        assert_eq!(s.sb_to_idx(0), Some(7));
    }

    #[test]
    fn reference_counts() {
        let mut s = sig(3, 0);
        assert!(!s.referenced());
        s.eref += 1;
        assert!(s.referenced());
        s.eref -= 1;
        s.lref += 1;
        assert!(s.referenced());
    }
}
