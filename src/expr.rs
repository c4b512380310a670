//! Flattened address expressions and the symbol model.
//!
//! Expressions are kept in a post-order simplified form: a sum of terms,
//! where each term is a constant, a `register * multiplier` product, a
//! symbol reference, a scaled sub-sum, or a `WRT` marker. The effective
//! address analyser walks the terms directly; the only non-trivial rewrite
//! is distributing `int * (reg + reg + ...)` so every register sits at the
//! top level with a single integer multiplier, done in one pass.

use crate::diag::{EncodeResult, Error, ErrorKind, SourceLoc};
use crate::regs::Reg;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

/// An opaque reference to a symbol in a [`SymbolTable`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SymbolId(u32);

impl SymbolId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// What a symbol resolves to.
#[derive(Clone, Debug)]
pub enum SymbolKind {
    /// Defined elsewhere; always emitted as a relocation.
    External,
    /// An equated expression, expanded wherever the symbol is used.
    Equ(Expr),
    /// A label on the bytecode with the given index in its section.
    Label(u32),
}

#[derive(Clone, Debug)]
pub struct Symbol {
    pub name: String,
    pub kind: SymbolKind,
}

/// Interned symbols for one assembly session.
///
/// The encoder only reads the table; the parser (or test driver) is the
/// sole mutator via `intern` and the `define_*` methods.
#[derive(Debug, Default)]
pub struct SymbolTable {
    syms: Vec<Symbol>,
    names: FxHashMap<String, SymbolId>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get or create the symbol named `name`. New symbols start external.
    pub fn intern(&mut self, name: &str) -> SymbolId {
        if let Some(&id) = self.names.get(name) {
            return id;
        }
        let id = SymbolId(u32::try_from(self.syms.len()).unwrap());
        self.syms.push(Symbol {
            name: name.to_owned(),
            kind: SymbolKind::External,
        });
        self.names.insert(name.to_owned(), id);
        id
    }

    pub fn define_equ(&mut self, id: SymbolId, expr: Expr) {
        self.syms[id.index()].kind = SymbolKind::Equ(expr);
    }

    pub fn define_label(&mut self, id: SymbolId, bc_index: u32) {
        self.syms[id.index()].kind = SymbolKind::Label(bc_index);
    }

    pub fn get(&self, id: SymbolId) -> &Symbol {
        &self.syms[id.index()]
    }
}

/// One term of a flattened expression.
#[derive(Clone, Debug, PartialEq)]
pub enum Term {
    /// A plain integer.
    Const(i64),
    /// `register * multiplier`.
    Reg(Reg, i32),
    /// A symbol reference.
    Sym(SymbolId),
    /// `multiplier * (sum of terms)`, produced by the parser for inputs
    /// like `4*(rax+rbx)`; eliminated by [`Expr::distribute`].
    Scaled(i64, Box<Expr>),
    /// A `WRT reg` marker attached to the whole expression.
    Wrt(Reg),
    /// `SEG expr`: the segment portion of the address of `expr`.
    SegOf(Box<Expr>),
}

/// A flattened expression: the sum of its terms.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Expr {
    pub terms: SmallVec<[Term; 4]>,
}

// Recursion guard for equate expansion; anything deeper is circular for
// any practical input.
const MAX_EQU_DEPTH: u32 = 32;

impl Expr {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_const(v: i64) -> Self {
        let mut e = Self::new();
        e.terms.push(Term::Const(v));
        e
    }

    pub fn from_reg(reg: Reg) -> Self {
        let mut e = Self::new();
        e.terms.push(Term::Reg(reg, 1));
        e
    }

    pub fn from_sym(sym: SymbolId) -> Self {
        let mut e = Self::new();
        e.terms.push(Term::Sym(sym));
        e
    }

    #[must_use]
    pub fn with_const(mut self, v: i64) -> Self {
        self.terms.push(Term::Const(v));
        self
    }

    #[must_use]
    pub fn with_reg(mut self, reg: Reg, mult: i32) -> Self {
        self.terms.push(Term::Reg(reg, mult));
        self
    }

    #[must_use]
    pub fn with_sym(mut self, sym: SymbolId) -> Self {
        self.terms.push(Term::Sym(sym));
        self
    }

    #[must_use]
    pub fn with_scaled(mut self, mult: i64, inner: Expr) -> Self {
        self.terms.push(Term::Scaled(mult, Box::new(inner)));
        self
    }

    #[must_use]
    pub fn with_wrt(mut self, reg: Reg) -> Self {
        self.terms.push(Term::Wrt(reg));
        self
    }

    pub fn add_const(&mut self, v: i64) {
        self.terms.push(Term::Const(v));
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// The constant value of the expression, if it contains nothing else.
    pub fn intnum(&self) -> Option<i64> {
        let mut sum = 0i64;
        for term in &self.terms {
            match term {
                Term::Const(v) => sum = sum.wrapping_add(*v),
                _ => return None,
            }
        }
        Some(sum)
    }

    /// True if any register appears anywhere in the expression.
    pub fn contains_reg(&self) -> bool {
        self.terms.iter().any(|t| match t {
            Term::Reg(..) | Term::Wrt(_) => true,
            Term::Scaled(_, inner) => inner.contains_reg(),
            Term::SegOf(inner) => inner.contains_reg(),
            Term::Const(_) | Term::Sym(_) => false,
        })
    }

    /// If the expression is exactly one register with multiplier 1, return
    /// it. Used by the `MemrAX`-style operand checks.
    pub fn single_reg(&self) -> Option<Reg> {
        match self.terms.as_slice() {
            [Term::Reg(reg, 1)] => Some(*reg),
            _ => None,
        }
    }

    /// Expand equated symbols in place, failing on circular references.
    pub fn expand_equates(
        &mut self,
        symtab: &SymbolTable,
        circular: ErrorKind,
        loc: SourceLoc,
    ) -> EncodeResult<()> {
        self.expand_equates_depth(symtab, &circular, loc, 0)
    }

    fn expand_equates_depth(
        &mut self,
        symtab: &SymbolTable,
        circular: &ErrorKind,
        loc: SourceLoc,
        depth: u32,
    ) -> EncodeResult<()> {
        if depth > MAX_EQU_DEPTH {
            return Err(Error::new(circular.clone(), loc));
        }
        let mut expanded: SmallVec<[Term; 4]> = SmallVec::new();
        for term in self.terms.drain(..) {
            match term {
                Term::Sym(id) => {
                    if let SymbolKind::Equ(expr) = &symtab.get(id).kind {
                        let mut sub = expr.clone();
                        sub.expand_equates_depth(symtab, circular, loc, depth + 1)?;
                        expanded.extend(sub.terms);
                    } else {
                        expanded.push(Term::Sym(id));
                    }
                }
                Term::Scaled(mult, mut inner) => {
                    inner.expand_equates_depth(symtab, circular, loc, depth + 1)?;
                    expanded.push(Term::Scaled(mult, inner));
                }
                Term::SegOf(mut inner) => {
                    inner.expand_equates_depth(symtab, circular, loc, depth + 1)?;
                    expanded.push(Term::SegOf(inner));
                }
                other => expanded.push(other),
            }
        }
        self.terms = expanded;
        Ok(())
    }

    /// Extract a `WRT reg` marker, if present. More than one is too
    /// complex to mean anything.
    pub fn extract_wrt(&mut self, loc: SourceLoc) -> EncodeResult<Option<Reg>> {
        let mut found = None;
        let mut kept: SmallVec<[Term; 4]> = SmallVec::new();
        for term in self.terms.drain(..) {
            if let Term::Wrt(reg) = term {
                if found.is_some() {
                    return Err(Error::new(ErrorKind::EaTooComplex, loc));
                }
                found = Some(reg);
            } else {
                kept.push(term);
            }
        }
        self.terms = kept;
        Ok(found)
    }

    /// Distribute scaled sub-sums so that every register sits at the top
    /// level with a single integer multiplier. Scaled sums that contain no
    /// register fold to a constant; a symbol under a multiplier has no
    /// encoding.
    pub fn distribute(&mut self, loc: SourceLoc) -> EncodeResult<()> {
        let mut out: SmallVec<[Term; 4]> = SmallVec::new();
        for term in self.terms.drain(..) {
            match term {
                Term::Scaled(mult, mut inner) => {
                    inner.distribute(loc)?;
                    for sub in inner.terms.drain(..) {
                        match sub {
                            Term::Const(v) => out.push(Term::Const(mult.wrapping_mul(v))),
                            Term::Reg(reg, m) => {
                                let m = i32::try_from(mult)
                                    .ok()
                                    .and_then(|mult| m.checked_mul(mult))
                                    .ok_or_else(|| Error::new(ErrorKind::EaTooComplex, loc))?;
                                out.push(Term::Reg(reg, m));
                            }
                            // A scaled symbol cannot be represented in a
                            // displacement or relocation.
                            _ => return Err(Error::new(ErrorKind::EaTooComplex, loc)),
                        }
                    }
                }
                other => out.push(other),
            }
        }
        self.terms = out;
        Ok(())
    }

    /// Combine constants and duplicate registers; drop zero terms.
    pub fn simplify(&mut self) {
        let mut consts = 0i64;
        let mut has_const = false;
        let mut out: SmallVec<[Term; 4]> = SmallVec::new();
        for term in self.terms.drain(..) {
            match term {
                Term::Const(v) => {
                    consts = consts.wrapping_add(v);
                    has_const = true;
                }
                Term::Reg(reg, mult) => {
                    if let Some(Term::Reg(_, m)) = out
                        .iter_mut()
                        .find(|t| matches!(t, Term::Reg(r, _) if *r == reg))
                    {
                        *m += mult;
                    } else {
                        out.push(Term::Reg(reg, mult));
                    }
                }
                other => out.push(other),
            }
        }
        out.retain(|t| !matches!(t, Term::Reg(_, 0)));
        if consts != 0 || (has_const && out.is_empty()) {
            out.push(Term::Const(consts));
        }
        self.terms = out;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regs::gpr;

    #[test]
    fn intnum_of_consts() {
        let e = Expr::from_const(4).with_const(-1);
        assert_eq!(e.intnum(), Some(3));
        let e = Expr::from_reg(gpr::RAX);
        assert_eq!(e.intnum(), None);
    }

    #[test]
    fn distribute_scaled_regs() {
        // 2*(rax+rbx+1) => 2*rax + 2*rbx + 2
        let inner = Expr::from_reg(gpr::RAX).with_reg(gpr::RBX, 1).with_const(1);
        let mut e = Expr::new().with_scaled(2, inner);
        e.distribute(SourceLoc::default()).unwrap();
        e.simplify();
        assert!(e.terms.contains(&Term::Reg(gpr::RAX, 2)));
        assert!(e.terms.contains(&Term::Reg(gpr::RBX, 2)));
        assert!(e.terms.contains(&Term::Const(2)));
    }

    #[test]
    fn simplify_merges_regs() {
        // rax + rax*2 => rax*3
        let mut e = Expr::from_reg(gpr::RAX).with_reg(gpr::RAX, 2);
        e.simplify();
        assert_eq!(e.terms.as_slice(), &[Term::Reg(gpr::RAX, 3)]);
    }

    #[test]
    fn equ_expansion_and_circularity() {
        let mut symtab = SymbolTable::new();
        let a = symtab.intern("a");
        let b = symtab.intern("b");
        symtab.define_equ(a, Expr::from_sym(b).with_const(1));
        symtab.define_equ(b, Expr::from_const(2));

        let mut e = Expr::from_sym(a);
        e.expand_equates(&symtab, ErrorKind::EquCircularImm, SourceLoc::default())
            .unwrap();
        e.simplify();
        assert_eq!(e.intnum(), Some(3));

        // Tie the knot: a -> b -> a.
        symtab.define_equ(b, Expr::from_sym(a));
        let mut e = Expr::from_sym(a);
        let err = e
            .expand_equates(&symtab, ErrorKind::EquCircularImm, SourceLoc::default())
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::EquCircularImm);
    }

    #[test]
    fn wrt_extraction() {
        let mut e = Expr::from_sym(SymbolId(0)).with_wrt(gpr::RIP);
        let reg = e.extract_wrt(SourceLoc::default()).unwrap();
        assert_eq!(reg, Some(gpr::RIP));
        assert!(e.extract_wrt(SourceLoc::default()).unwrap().is_none());
    }
}
