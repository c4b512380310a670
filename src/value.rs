//! Relocatable values: displacements, immediates, jump targets.
//!
//! A `Value` is an expression plus the metadata the object writer needs:
//! size in bits, signedness, whether the value is position-relative, and
//! the instruction-geometry offsets that let a PC-relative fixup find the
//! end of its instruction. Sizes in bits are 0/8/16/32/64 only.

use crate::diag::{EncodeResult, Error, ErrorKind, SourceLoc};
use crate::expr::{Expr, SymbolId, SymbolTable, Term};

/// A value to be emitted into the instruction stream.
#[derive(Clone, Debug)]
pub struct Value {
    /// The absolute portion. After [`Value::finalize`] this contains only
    /// constants; registers are consumed by the effective-address analyser
    /// before emission.
    expr: Expr,
    /// The symbolic portion: the value is `rel + expr`.
    pub rel: Option<SymbolId>,
    /// Size in bits.
    pub size: u16,
    /// Emit sign-extended.
    pub signed: bool,
    /// The value is relative to its own position in the section.
    pub curpos_rel: bool,
    /// The value is an IP-relative displacement (RIP addressing).
    pub ip_rel: bool,
    /// The value is a jump target.
    pub jump_target: bool,
    /// The segment portion of the address is wanted, not the offset.
    pub seg_of: bool,
    /// Offset from the start of the instruction to this value.
    pub insn_start: u32,
    /// Offset from the end of this value to the end of the instruction;
    /// 0 for jumps.
    pub next_insn: u32,
    pub loc: SourceLoc,
}

impl Value {
    pub fn new(size: u16, expr: Expr, loc: SourceLoc) -> Self {
        Self {
            expr,
            rel: None,
            size,
            signed: false,
            curpos_rel: false,
            ip_rel: false,
            jump_target: false,
            seg_of: false,
            insn_start: 0,
            next_insn: 0,
            loc,
        }
    }

    /// An empty, zero-sized value.
    pub fn empty(loc: SourceLoc) -> Self {
        Self::new(0, Expr::new(), loc)
    }

    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    pub fn expr_mut(&mut self) -> &mut Expr {
        &mut self.expr
    }

    /// Drop the expression entirely (a displacement that turned out to be
    /// zero emits nothing).
    pub fn clear(&mut self) {
        self.expr = Expr::new();
        self.rel = None;
        self.size = 0;
    }

    pub fn has_abs(&self) -> bool {
        !self.expr.is_empty() || self.rel.is_some()
    }

    /// Add a constant to the absolute portion.
    pub fn add_abs(&mut self, v: i64) {
        self.expr.add_const(v);
    }

    /// Mark as relative to the value's own position.
    pub fn set_curpos_rel(&mut self, ip_rel: bool) {
        self.curpos_rel = true;
        self.ip_rel = self.ip_rel || ip_rel;
    }

    /// Expand equates, pull out a `SEG` wrapper, and split the expression
    /// into symbolic and constant portions. More than one symbol, or a
    /// leftover register, has no encoding.
    pub fn finalize(
        &mut self,
        symtab: &SymbolTable,
        circular: ErrorKind,
    ) -> EncodeResult<()> {
        let loc = self.loc;
        // A `SEG expr` wrapper applies to the whole value.
        let seg_inner = match self.expr.terms.as_slice() {
            [Term::SegOf(inner)] => Some((**inner).clone()),
            _ => None,
        };
        if let Some(inner) = seg_inner {
            self.expr = inner;
            self.seg_of = true;
        }
        self.expr.expand_equates(symtab, circular, loc)?;
        self.expr.distribute(loc)?;
        self.expr.simplify();

        let mut kept = Expr::new();
        for term in self.expr.terms.drain(..) {
            match term {
                Term::Sym(id) => {
                    if self.rel.is_some() {
                        return Err(Error::new(ErrorKind::EaTooComplex, loc));
                    }
                    self.rel = Some(id);
                }
                other => kept.terms.push(other),
            }
        }
        self.expr = kept;
        Ok(())
    }

    /// The numeric value, if it is known without symbol resolution.
    pub fn get_intnum(&self) -> Option<i64> {
        if self.rel.is_some() {
            return None;
        }
        if self.expr.is_empty() {
            return Some(0);
        }
        self.expr.intnum()
    }

    /// The numeric value with same-section labels resolved against
    /// `label_offsets`; `None` when the value needs a relocation.
    ///
    /// For a position-relative value at section offset `pos`, the result
    /// is relative to the end of the instruction (the encoder pre-adjusts
    /// the absolute portion by the value's own size, this accounts for the
    /// position and any trailing instruction bytes).
    pub fn resolve(
        &self,
        symtab: &SymbolTable,
        label_offsets: &[u32],
        pos: u32,
    ) -> Option<i64> {
        let abs = self.expr.intnum()?;
        match self.rel {
            None => Some(abs),
            Some(id) => {
                if self.seg_of {
                    return None;
                }
                let target = match symtab.get(id).kind {
                    crate::expr::SymbolKind::Label(bc) => {
                        i64::from(*label_offsets.get(bc as usize)?)
                    }
                    _ => return None,
                };
                let num = target.wrapping_add(abs);
                if self.curpos_rel {
                    Some(num - i64::from(pos) - i64::from(self.next_insn))
                } else {
                    // Absolute reference to a label still needs the section
                    // base; only the linker knows it.
                    None
                }
            }
        }
    }

    /// Write `num` into `bytes` at this value's size, little-endian.
    pub fn write_number(&self, num: i64, bytes: &mut Vec<u8>) {
        let le = num.to_le_bytes();
        bytes.extend_from_slice(&le[..usize::from(self.size / 8)]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::SymbolTable;

    #[test]
    fn finalize_splits_symbol() {
        let mut symtab = SymbolTable::new();
        let s = symtab.intern("target");
        let mut v = Value::new(
            32,
            Expr::from_sym(s).with_const(8),
            SourceLoc::default(),
        );
        v.finalize(&symtab, ErrorKind::EquCircularImm).unwrap();
        assert_eq!(v.rel, Some(s));
        assert_eq!(v.expr().intnum(), Some(8));
        assert_eq!(v.get_intnum(), None);
    }

    #[test]
    fn two_symbols_too_complex() {
        let mut symtab = SymbolTable::new();
        let a = symtab.intern("a");
        let b = symtab.intern("b");
        let mut v = Value::new(
            32,
            Expr::from_sym(a).with_sym(b),
            SourceLoc::default(),
        );
        let err = v.finalize(&symtab, ErrorKind::EquCircularImm).unwrap_err();
        assert_eq!(err.kind, ErrorKind::EaTooComplex);
    }

    #[test]
    fn resolve_curpos_relative() {
        let mut symtab = SymbolTable::new();
        let s = symtab.intern("target");
        symtab.define_label(s, 1);
        let mut v = Value::new(8, Expr::from_sym(s), SourceLoc::default());
        v.finalize(&symtab, ErrorKind::EquCircularImm).unwrap();
        v.set_curpos_rel(false);
        // Value emitted at offset 1; label 1 is at offset 2; the encoder
        // already subtracted the value's own size (1 byte).
        v.add_abs(-1);
        assert_eq!(v.resolve(&symtab, &[0, 2], 1), Some(0));
    }

    #[test]
    fn write_little_endian() {
        let v = Value::new(32, Expr::from_const(1), SourceLoc::default());
        let mut bytes = Vec::new();
        v.write_number(-7, &mut bytes);
        assert_eq!(bytes, vec![0xF9, 0xFF, 0xFF, 0xFF]);
    }
}
