//! Parsed instructions and the operand-to-form matcher.
//!
//! A mnemonic resolves to a group of candidate forms; matching walks the
//! group in table order and the first form whose gates and operand
//! patterns all accept wins. When nothing matches, the search is re-run
//! with increasing "bypass" levels, each of which waives one check; the
//! first level at which a form appears tells us which operand (or which
//! gate) to blame.

use crate::diag::{
    Diagnostics, EncodeResult, Error, ErrorKind, SourceLoc, Warning,
};
use crate::effaddr::EffAddr;
use crate::encode;
use crate::expr::{Expr, SymbolTable};
use crate::features::{CpuFeature, CpuMask, MissingFeatures};
use crate::jmp;
use crate::prefix::Prefix;
use crate::regs::{Reg, RegClass, SegReg, TargetMod};
use crate::tables::{
    gas, misc, size_lookup, Action, InsnForm, OpSize, OpType, OperandPattern,
    TmodGate,
};
use crate::container::Section;
use log::debug;
use smallvec::SmallVec;

/// Which assembler dialect the instruction was parsed under.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Dialect {
    Nasm,
    Gas,
}

/// Session-level configuration, copied into each instruction at
/// construction time so encoding never reads shared state.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    pub mode_bits: u8,
    pub cpu: CpuMask,
    pub dialect: Dialect,
    /// Never optimise immediate sizes.
    pub force_strict: bool,
    /// Promote register-less addresses to RIP-relative.
    pub default_rel: bool,
}

impl Config {
    pub fn new(mode_bits: u8) -> Self {
        Self {
            mode_bits,
            cpu: if mode_bits == 64 {
                CpuMask::baseline_64()
            } else {
                CpuMask::baseline_32()
            },
            dialect: Dialect::Nasm,
            force_strict: false,
            default_rel: false,
        }
    }
}

/// The payload of a parsed operand.
#[derive(Clone, Debug)]
pub enum OperandKind {
    Reg(Reg),
    SegReg(SegReg),
    Mem(EffAddr),
    Imm(Expr),
}

/// A parsed operand with its attributes.
#[derive(Clone, Debug)]
pub struct Operand {
    pub kind: OperandKind,
    /// `SEG expr` attached to the operand (far jumps).
    pub seg: Option<Expr>,
    pub tmod: Option<TargetMod>,
    /// Explicit size in bits; 0 when unspecified.
    pub size: u16,
    /// The dialect saw an explicit dereference (`*` in AT&T).
    pub deref: bool,
    /// The user demanded no size optimisation.
    pub strict: bool,
    pub loc: SourceLoc,
}

impl Operand {
    pub fn reg(reg: Reg) -> Self {
        Self::from_kind(OperandKind::Reg(reg))
    }

    pub fn segreg(segreg: SegReg) -> Self {
        Self::from_kind(OperandKind::SegReg(segreg))
    }

    pub fn mem(ea: EffAddr) -> Self {
        Self::from_kind(OperandKind::Mem(ea))
    }

    pub fn imm(expr: Expr) -> Self {
        Self::from_kind(OperandKind::Imm(expr))
    }

    fn from_kind(kind: OperandKind) -> Self {
        Self {
            kind,
            seg: None,
            tmod: None,
            size: 0,
            deref: false,
            strict: false,
            loc: SourceLoc::default(),
        }
    }

    #[must_use]
    pub fn with_size(mut self, bits: u16) -> Self {
        self.size = bits;
        self
    }

    #[must_use]
    pub fn with_tmod(mut self, tmod: TargetMod) -> Self {
        self.tmod = Some(tmod);
        self
    }

    #[must_use]
    pub fn with_seg(mut self, seg: Expr) -> Self {
        self.seg = Some(seg);
        self
    }

    #[must_use]
    pub fn with_loc(mut self, loc: SourceLoc) -> Self {
        self.loc = loc;
        self
    }

    #[must_use]
    pub fn strict(mut self) -> Self {
        self.strict = true;
        self
    }

    #[must_use]
    pub fn deref(mut self) -> Self {
        self.deref = true;
        self
    }

    fn get_reg(&self) -> Option<Reg> {
        match &self.kind {
            OperandKind::Reg(reg) => Some(*reg),
            _ => None,
        }
    }

    fn get_segreg(&self) -> Option<SegReg> {
        match &self.kind {
            OperandKind::SegReg(segreg) => Some(*segreg),
            _ => None,
        }
    }

    fn get_mem(&self) -> Option<&EffAddr> {
        match &self.kind {
            OperandKind::Mem(ea) => Some(ea),
            _ => None,
        }
    }

    fn get_imm(&self) -> Option<&Expr> {
        match &self.kind {
            OperandKind::Imm(expr) => Some(expr),
            _ => None,
        }
    }
}

/// A parsed instruction, ready to encode. Consumed exactly once.
#[derive(Clone, Debug)]
pub struct Insn {
    pub(crate) group: &'static [InsnForm],
    pub(crate) mod_data: [u8; 3],
    pub(crate) cpu: CpuMask,
    pub(crate) operands: SmallVec<[Operand; 3]>,
    pub(crate) prefixes: SmallVec<[(Prefix, SourceLoc); 2]>,
    pub(crate) segreg: Option<(SegReg, SourceLoc)>,
    pub(crate) mode_bits: u8,
    /// GAS suffix flags for this spelling; 0 outside GAS.
    pub(crate) suffix: u16,
    pub(crate) misc_flags: u8,
    pub(crate) dialect: Dialect,
    pub(crate) force_strict: bool,
    pub(crate) default_rel: bool,
    pub(crate) loc: SourceLoc,
}

impl Insn {
    pub fn new(
        group: &'static [InsnForm],
        mod_data: [u8; 3],
        misc_flags: u8,
        suffix: u16,
        config: &Config,
        loc: SourceLoc,
    ) -> Self {
        Self {
            group,
            mod_data,
            cpu: config.cpu,
            operands: SmallVec::new(),
            prefixes: SmallVec::new(),
            segreg: None,
            mode_bits: config.mode_bits,
            suffix,
            misc_flags,
            dialect: config.dialect,
            force_strict: config.force_strict,
            default_rel: config.default_rel,
            loc,
        }
    }

    pub fn push_operand(&mut self, op: Operand) {
        self.operands.push(op);
    }

    pub fn push_prefix(&mut self, prefix: Prefix, loc: SourceLoc) {
        self.prefixes.push((prefix, loc));
    }

    pub fn set_segreg(&mut self, segreg: SegReg, loc: SourceLoc) {
        self.segreg = Some((segreg, loc));
    }

    /// Encode into `section`. On error nothing is appended; the caller
    /// reports the error and moves to the next statement.
    pub fn encode(
        mut self,
        section: &mut Section,
        symtab: &SymbolTable,
        diags: &mut Diagnostics,
    ) -> EncodeResult<()> {
        let sizes = size_lookup(self.mode_bits);

        if self.operands.len() > 5 {
            return Err(Error::new(ErrorKind::TooManyOperands, self.loc));
        }

        // In GAS mode a relative jump's target is written without a
        // dereference marker; memory operands that are not dereferenced
        // are really immediates.
        if self.dialect == Dialect::Gas
            && !self.group.is_empty()
            && self.group[0]
                .operands
                .first()
                .is_some_and(|p| p.action == Action::JmpRel)
        {
            self.fixup_gas_jumps(diags);
        }

        let Some(form) = self.find_match(&sizes, 0) else {
            return Err(self.match_error(&sizes));
        };
        debug!(
            "matched form with opcode {:02x?} for {} operand(s)",
            &form.opcode[..usize::from(form.opcode_len)],
            self.operands.len()
        );

        if let Some(first) = form.operands.first() {
            match first.action {
                Action::JmpRel => {
                    return jmp::append_jmp(&self, form, section, symtab, diags)
                }
                Action::JmpFar => {
                    return jmp::append_jmpfar(&self, form, section, symtab, diags)
                }
                _ => {}
            }
        }
        encode::append_general(&self, form, &sizes, section, symtab, diags)
    }

    fn fixup_gas_jumps(&mut self, diags: &mut Diagnostics) {
        for op in &mut self.operands {
            let is_reg = matches!(op.kind, OperandKind::Reg(_));
            let strong_mem =
                matches!(&op.kind, OperandKind::Mem(ea) if ea.strong);
            if !op.deref && (is_reg || strong_mem) {
                diags.warn(op.loc, Warning::IndirectCallNoDeref);
            }
            if !op.deref && !strong_mem {
                if let OperandKind::Mem(ea) = &op.kind {
                    if ea.segreg.is_some() {
                        diags.warn(op.loc, Warning::PrefixesSkipped);
                    }
                    let expr = ea.disp.expr().clone();
                    op.kind = OperandKind::Imm(expr);
                }
            }
        }
    }

    /// The order operands are matched and applied in: reversed for GAS
    /// unless the form opts out.
    pub(crate) fn operand_order(&self, form: &InsnForm) -> SmallVec<[usize; 5]> {
        let mut order: SmallVec<[usize; 5]> = (0..self.operands.len()).collect();
        if self.dialect == Dialect::Gas && form.gas_flags & gas::GAS_NO_REV == 0 {
            order.reverse();
        }
        order
    }

    pub(crate) fn find_match(
        &self,
        sizes: &[u16; 9],
        bypass: u8,
    ) -> Option<&'static InsnForm> {
        self.group
            .iter()
            .find(|form| self.match_form(form, sizes, bypass))
    }

    fn match_form(&self, form: &InsnForm, sizes: &[u16; 9], bypass: u8) -> bool {
        // Mode gate.
        if self.mode_bits != 64 && form.misc_flags & misc::ONLY_64 != 0 {
            return false;
        }
        if self.mode_bits == 64 && form.misc_flags & misc::NOT_64 != 0 {
            return false;
        }
        // CPU gate.
        if bypass != 8 && !self.cpu.satisfies(&form.cpu) {
            return false;
        }
        // Operand count.
        if self.operands.len() != form.operands.len() {
            return false;
        }
        // AVX gate.
        if self.misc_flags & misc::ONLY_AVX == 0
            && form.misc_flags & misc::ONLY_AVX != 0
        {
            return false;
        }
        if self.misc_flags & misc::ONLY_AVX != 0
            && form.misc_flags & misc::NOT_AVX != 0
        {
            return false;
        }
        // Dialect gate.
        if form.gas_flags & gas::GAS_ONLY != 0 && self.dialect != Dialect::Gas {
            return false;
        }
        if form.gas_flags & gas::GAS_ILLEGAL != 0 && self.dialect == Dialect::Gas {
            return false;
        }
        // Suffix gate.
        if self.suffix != 0
            && self.suffix != gas::WEAK
            && (self.suffix & gas::SUF_MASK) & (form.gas_flags & gas::SUF_MASK)
                == 0
        {
            return false;
        }

        if self.operands.is_empty() {
            return true;
        }

        let order = self.operand_order(form);
        let first = &self.operands[order[0]];
        order.iter().enumerate().all(|(slot, &idx)| {
            self.match_operand(
                &self.operands[idx],
                &form.operands[slot],
                first,
                slot,
                sizes,
                bypass,
            )
        })
    }

    #[allow(clippy::too_many_lines)]
    fn match_operand(
        &self,
        op: &Operand,
        pattern: &OperandPattern,
        op0: &Operand,
        slot: usize,
        sizes: &[u16; 9],
        bypass: u8,
    ) -> bool {
        let reg = op.get_reg();
        let segreg = op.get_segreg();
        let ea = op.get_mem();

        // Operand type.
        let type_ok = match pattern.typ {
            OpType::Imm => op.get_imm().is_some(),
            OpType::Rm | OpType::Reg => {
                let reg_ok = reg.is_some_and(|r| {
                    matches!(
                        r.class(),
                        RegClass::Reg8
                            | RegClass::Reg8x
                            | RegClass::Reg16
                            | RegClass::Reg32
                            | RegClass::Reg64
                            | RegClass::Fpu
                    )
                });
                reg_ok || (pattern.typ == OpType::Rm && ea.is_some())
            }
            OpType::Mem => ea.is_some(),
            OpType::SimdRm | OpType::SimdReg | OpType::SimdRegMatch0 => {
                let reg_ok = reg.is_some_and(|r| {
                    matches!(
                        r.class(),
                        RegClass::Mmx | RegClass::Xmm | RegClass::Ymm
                    )
                });
                let match0_ok = pattern.typ != OpType::SimdRegMatch0
                    || bypass == 7
                    || reg == op0.get_reg();
                (reg_ok && match0_ok)
                    || (pattern.typ == OpType::SimdRm && ea.is_some())
            }
            OpType::SegReg => segreg.is_some(),
            OpType::CrReg => reg.is_some_and(|r| r.class() == RegClass::Cr),
            OpType::DrReg => reg.is_some_and(|r| r.class() == RegClass::Dr),
            OpType::TrReg => reg.is_some_and(|r| r.class() == RegClass::Tr),
            OpType::St0 => {
                reg.is_some_and(|r| r.class() == RegClass::Fpu && r.num() == 0)
            }
            OpType::Areg => self.match_numbered_gpr(reg, pattern, 0),
            OpType::Creg => self.match_numbered_gpr(reg, pattern, 1),
            OpType::Dreg => self.match_numbered_gpr(reg, pattern, 2),
            OpType::Cs => segreg == Some(SegReg::Cs),
            OpType::Ds => segreg == Some(SegReg::Ds),
            OpType::Es => segreg == Some(SegReg::Es),
            OpType::Fs => segreg == Some(SegReg::Fs),
            OpType::Gs => segreg == Some(SegReg::Gs),
            OpType::Ss => segreg == Some(SegReg::Ss),
            OpType::Cr4 => {
                reg.is_some_and(|r| r.class() == RegClass::Cr && r.num() == 4)
            }
            OpType::MemOffs => ea.is_some_and(|ea| {
                !ea.disp.expr().contains_reg()
                    && !ea.pc_rel
                    && (ea.not_pc_rel
                        || !(self.default_rel && ea.disp.size != 64))
            }),
            OpType::Imm1 => op
                .get_imm()
                .is_some_and(|expr| expr.intnum() == Some(1)),
            OpType::ImmNotSegOff => {
                op.get_imm().is_some() && op.tmod.is_none() && op.seg.is_none()
            }
            OpType::Xmm0 => {
                reg.is_some_and(|r| r.class() == RegClass::Xmm && r.num() == 0)
            }
            OpType::MemRax => ea.is_some_and(|ea| {
                ea.disp.expr().single_reg().is_some_and(|r| {
                    r.num() == 0
                        && matches!(
                            r.class(),
                            RegClass::Reg16 | RegClass::Reg32 | RegClass::Reg64
                        )
                })
            }),
            OpType::MemEax => ea.is_some_and(|ea| {
                ea.disp.expr().single_reg()
                    == Some(Reg::new(RegClass::Reg32, 0))
            }),
            OpType::MemDx => ea.is_some_and(|ea| {
                ea.disp.expr().single_reg()
                    == Some(Reg::new(RegClass::Reg16, 2))
            }),
            OpType::MemXmmIndex | OpType::MemYmmIndex => ea.is_some(),
        };
        if !type_ok {
            return false;
        }

        // Operand size.
        let size = sizes[pattern.size as usize];
        if self.suffix != 0 {
            // GAS mode: per-operand sizing is not available, the suffix
            // decides. Register sizes still must match exactly.
            if let (Some(reg), 0) = (reg, op.size) {
                if reg.size() != size {
                    return false;
                }
            } else if matches!(
                pattern.typ,
                OpType::Imm | OpType::ImmNotSegOff | OpType::Imm1
            ) && !pattern.relaxed
                && pattern.action != Action::JmpRel
            {
                return false;
            }
        } else if let (Some(reg), 0) = (reg, op.size) {
            let bypassed = (bypass == 4 && slot == 0)
                || (bypass == 5 && slot == 1)
                || (bypass == 6 && slot == 2);
            if !bypassed && reg.size() != size {
                return false;
            }
        } else {
            let bypassed = (bypass == 1 && slot == 0)
                || (bypass == 2 && slot == 1)
                || (bypass == 3 && slot == 2);
            if !bypassed {
                if pattern.relaxed {
                    if size != 0 && op.size != size && op.size != 0 {
                        return false;
                    }
                } else if op.size != size {
                    return false;
                }
            }
        }

        // 64-bit effective-address size gate.
        if self.suffix == 0 {
            if let Some(ea) = ea {
                if pattern.eas64 {
                    if ea.disp.size != 64 {
                        return false;
                    }
                } else if ea.disp.size == 64 {
                    return false;
                }
            }
        }

        // Target modifier.
        match pattern.tmod {
            TmodGate::None => op.tmod.is_none(),
            TmodGate::Near => op.tmod == Some(TargetMod::Near),
            TmodGate::Short => op.tmod == Some(TargetMod::Short),
            // A SEG:OFF immediate is inherently far.
            TmodGate::Far => {
                op.tmod == Some(TargetMod::Far) || op.seg.is_some()
            }
            TmodGate::To => op.tmod == Some(TargetMod::To),
        }
    }

    fn match_numbered_gpr(
        &self,
        reg: Option<Reg>,
        pattern: &OperandPattern,
        num: u8,
    ) -> bool {
        let Some(reg) = reg else { return false };
        if reg.num() != num {
            return false;
        }
        match pattern.size {
            OpSize::S8 => {
                matches!(reg.class(), RegClass::Reg8 | RegClass::Reg8x)
            }
            OpSize::S16 => reg.class() == RegClass::Reg16,
            OpSize::S32 => reg.class() == RegClass::Reg32,
            OpSize::S64 => reg.class() == RegClass::Reg64,
            _ => true,
        }
    }

    /// Figure out what to blame when no form matched.
    fn match_error(&self, sizes: &[u16; 9]) -> Error {
        // Operand count first.
        if !self.group.iter().any(|i| i.operands.len() == self.operands.len()) {
            return Error::new(ErrorKind::BadNumOperands, self.loc);
        }
        for bypass in 1..9 {
            let Some(form) = self.find_match(sizes, bypass) else {
                continue;
            };
            let kind = match bypass {
                1 | 4 => ErrorKind::BadOperandSize(1),
                2 | 5 => ErrorKind::BadOperandSize(2),
                3 | 6 => ErrorKind::BadOperandSize(3),
                7 => ErrorKind::DestNotSrc1OrSrc3,
                8 => ErrorKind::RequiresCpu(
                    MissingFeatures(form.cpu).to_string(),
                ),
                _ => unreachable!(),
            };
            return Error::new(kind, self.loc);
        }
        Error::new(ErrorKind::BadInsnOperands, self.loc)
    }
}

/// Keyword-table gates for a mnemonic, applied at recognition time.
pub(crate) fn check_insn_gates(
    misc_flags: u8,
    cpu: &[CpuFeature; 3],
    config: &Config,
    loc: SourceLoc,
) -> EncodeResult<()> {
    if config.mode_bits != 64 && misc_flags & misc::ONLY_64 != 0 {
        return Err(Error::new(ErrorKind::InsnIn64Mode, loc));
    }
    if config.mode_bits == 64 && misc_flags & misc::NOT_64 != 0 {
        return Err(Error::new(ErrorKind::InsnInvalid64Mode, loc));
    }
    if !config.cpu.satisfies(cpu) {
        return Err(Error::new(
            ErrorKind::RequiresCpu(MissingFeatures(*cpu).to_string()),
            loc,
        ));
    }
    Ok(())
}
