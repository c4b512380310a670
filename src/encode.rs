//! The general encoder: modifier application, operand routing, prefix
//! folding, and the span-dependent general bytecode.

use crate::common::InsnCommon;
use crate::container::{BcKind, Bytecode, Contents, OutputContext, Section};
use crate::diag::{
    Diagnostics, EncodeResult, Error, ErrorKind, SourceLoc, Warning,
};
use crate::effaddr::{EffAddr, NeedSib, VsibMode};
use crate::expr::{Expr, SymbolTable};
use crate::insn::{Insn, Operand, OperandKind};
use crate::opcode::Opcode;
use crate::regs::{Reg, RegClass, SegReg};
use crate::rex::{Rex, RexBit};
use crate::tables::{Action, InsnForm, Modifier, OpSize, OpType, PostAction};
use crate::value::Value;
use crate::vex;
use log::trace;

/// Deferred rewrites that depend on expression values.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum PostOp {
    None,
    SignextImm8,
    ShortMov,
    Address16,
    SImm32Avail,
}

/// Encode a matched non-jump form into `section`.
pub(crate) fn append_general(
    insn: &Insn,
    form: &'static InsnForm,
    sizes: &[u16; 9],
    section: &mut Section,
    symtab: &SymbolTable,
    diags: &mut Diagnostics,
) -> EncodeResult<()> {
    let mut build = GeneralBuilder::new(insn, form, sizes);
    build.apply_modifiers(form, &insn.mod_data);
    build.update_rex();
    build.apply_operands(insn, form)?;
    build.apply_segreg(insn, diags)?;
    build.finish(insn, section, symtab, diags)
}

struct GeneralBuilder {
    mode_bits: u8,
    sizes: [u16; 9],
    force_strict: bool,
    default_rel: bool,
    loc: SourceLoc,

    opcode: Opcode,
    ea: Option<EffAddr>,
    imm: Option<Expr>,
    im_len: u16,
    im_sign: bool,
    /// Pending is4 byte parts (VEX register and selector immediate).
    is4_reg: Option<u8>,
    is4_imm: Option<Expr>,
    def_opersize_64: u8,
    special_prefix: u8,
    spare: u8,
    postop: PostOp,
    rex: Rex,
    vexdata: u8,
    vexreg: u8,
    opersize: u8,
    addrsize: u8,
}

impl GeneralBuilder {
    fn new(insn: &Insn, form: &InsnForm, sizes: &[u16; 9]) -> Self {
        let mut special_prefix = form.special_prefix;
        let mut vexdata = 0;
        // VEX/XOP tags live in the special-prefix slot; move them aside so
        // modifiers can still override the literal prefix.
        if vex::is_vex_xop_tag(special_prefix) {
            vexdata = special_prefix;
            special_prefix = 0;
        }
        Self {
            mode_bits: insn.mode_bits,
            sizes: *sizes,
            force_strict: insn.force_strict,
            default_rel: insn.default_rel,
            loc: insn.loc,
            opcode: Opcode::new(form.opcode_len, form.opcode),
            ea: None,
            imm: None,
            im_len: 0,
            im_sign: false,
            is4_reg: None,
            is4_imm: None,
            def_opersize_64: form.def_opersize_64,
            special_prefix,
            spare: form.spare,
            postop: PostOp::None,
            rex: Rex::none(),
            vexdata,
            vexreg: 0,
            opersize: form.opersize,
            addrsize: 0,
        }
    }

    fn apply_modifiers(&mut self, form: &InsnForm, mod_data: &[u8; 3]) {
        for (i, modifier) in form.modifiers.iter().enumerate() {
            let data = mod_data[i];
            match modifier {
                Modifier::None | Modifier::Gap => {}
                Modifier::PreAdd => {
                    self.special_prefix = self.special_prefix.wrapping_add(data);
                }
                Modifier::Op0Add => self.opcode.add(0, data),
                Modifier::Op1Add => self.opcode.add(1, data),
                Modifier::Op2Add => self.opcode.add(2, data),
                Modifier::SpAdd => self.spare = self.spare.wrapping_add(data),
                Modifier::OpSizeR => self.opersize = data,
                Modifier::Imm8 => {
                    self.imm = Some(Expr::from_const(i64::from(data)));
                    self.im_len = 8;
                }
                Modifier::AdSizeR => self.addrsize = data,
                Modifier::DOpS64R => self.def_opersize_64 = data,
                Modifier::Op1AddSp => self.opcode.add(1, data << 3),
                Modifier::SetVex => self.vexdata = data,
            }
        }
    }

    fn update_rex(&mut self) {
        // 64-bit operand size must be opted into by the prefix unless it
        // is already the form's default.
        if self.mode_bits == 64 && self.opersize == 64 && self.def_opersize_64 != 64
        {
            self.rex.force_w();
        }
    }

    fn apply_operands(
        &mut self,
        insn: &Insn,
        form: &'static InsnForm,
    ) -> EncodeResult<()> {
        let order = insn.operand_order(form);
        for (slot, &idx) in order.iter().enumerate() {
            let op = insn.operands[idx].clone();
            self.apply_operand(&form.operands[slot], op)?;
        }
        Ok(())
    }

    #[allow(clippy::too_many_lines)]
    fn apply_operand(
        &mut self,
        pattern: &crate::tables::OperandPattern,
        op: Operand,
    ) -> EncodeResult<()> {
        let loc = op.loc;
        let internal =
            || Error::new(ErrorKind::Internal("invalid operand conversion"), loc);

        match pattern.action {
            Action::None => {}
            Action::Ea => match op.kind {
                OperandKind::Reg(reg) => {
                    self.ea = Some(EffAddr::from_reg(
                        reg,
                        &mut self.rex,
                        self.mode_bits,
                        loc,
                    )?);
                }
                OperandKind::Mem(mut ea) => {
                    if op.seg.is_some() {
                        return Err(Error::new(ErrorKind::InvalidEaSegment, loc));
                    }
                    match pattern.typ {
                        // Special-case for the MOV direct-offset forms.
                        OpType::MemOffs => ea.set_disponly(),
                        OpType::MemXmmIndex => ea.vsib_mode = VsibMode::Xmm,
                        OpType::MemYmmIndex => ea.vsib_mode = VsibMode::Ymm,
                        _ => {
                            // Enable default PC-relative addressing when no
                            // registers are used and the segment is not
                            // FS or GS.
                            let seg_blocks = matches!(
                                ea.segreg,
                                Some(SegReg::Fs | SegReg::Gs)
                            );
                            if self.default_rel
                                && !ea.not_pc_rel
                                && !seg_blocks
                                && !ea.disp.expr().contains_reg()
                            {
                                ea.pc_rel = true;
                            }
                        }
                    }
                    self.ea = Some(ea);
                }
                OperandKind::Imm(expr) => {
                    self.ea = Some(EffAddr::from_imm(
                        expr,
                        self.sizes[pattern.size as usize],
                        loc,
                    ));
                }
                OperandKind::SegReg(_) => return Err(internal()),
            },
            Action::EaVex => {
                let OperandKind::Reg(reg) = op.kind else {
                    return Err(internal());
                };
                self.ea = Some(EffAddr::from_reg(
                    reg,
                    &mut self.rex,
                    self.mode_bits,
                    loc,
                )?);
                self.vexreg = reg.num() & 0xF;
            }
            Action::Imm | Action::SImm => {
                if op.seg.is_some() {
                    return Err(Error::new(ErrorKind::ImmSegmentOverride, loc));
                }
                let OperandKind::Imm(expr) = op.kind else {
                    return Err(internal());
                };
                self.imm = Some(expr);
                self.im_len = self.sizes[pattern.size as usize];
                self.im_sign = pattern.action == Action::SImm;
            }
            Action::Spare => match op.kind {
                OperandKind::SegReg(segreg) => self.spare = segreg.num(),
                OperandKind::Reg(reg) => {
                    self.spare = self.rex.set_from_reg(
                        reg,
                        self.mode_bits,
                        RexBit::R,
                        loc,
                    )?;
                }
                _ => return Err(internal()),
            },
            Action::SpareVex => {
                let OperandKind::Reg(reg) = op.kind else {
                    return Err(internal());
                };
                self.spare =
                    self.rex.set_from_reg(reg, self.mode_bits, RexBit::R, loc)?;
                self.vexreg = reg.num() & 0xF;
            }
            Action::Op0Add | Action::Op1Add => {
                let OperandKind::Reg(reg) = op.kind else {
                    return Err(internal());
                };
                let opadd =
                    self.rex.set_from_reg(reg, self.mode_bits, RexBit::B, loc)?;
                let byte = usize::from(pattern.action == Action::Op1Add);
                self.opcode.add(byte, opadd);
            }
            Action::SpareEa => {
                let OperandKind::Reg(reg) = op.kind else {
                    return Err(internal());
                };
                self.ea = Some(EffAddr::from_reg(
                    reg,
                    &mut self.rex,
                    self.mode_bits,
                    loc,
                )?);
                self.spare =
                    self.rex.set_from_reg(reg, self.mode_bits, RexBit::R, loc)?;
            }
            Action::AdSizeEa => {
                // Only the [ax]/[eax]/[rax] operand types reach this.
                let OperandKind::Mem(ea) = &op.kind else {
                    return Err(internal());
                };
                let Some(reg) = ea.disp.expr().single_reg() else {
                    return Err(internal());
                };
                self.addrsize = match (reg.class(), reg.num()) {
                    (RegClass::Reg16, 0) => {
                        if self.mode_bits == 64 {
                            return Err(Error::new(
                                ErrorKind::Addr16In64Mode,
                                loc,
                            ));
                        }
                        16
                    }
                    (RegClass::Reg32, 0) => 32,
                    (RegClass::Reg64, 0) if self.mode_bits == 64 => 64,
                    _ => return Err(Error::new(ErrorKind::BadAddressSize, loc)),
                };
            }
            Action::Vex => {
                let OperandKind::Reg(reg) = op.kind else {
                    return Err(internal());
                };
                self.vexreg = reg.num() & 0xF;
            }
            Action::VexImmSrc => {
                let OperandKind::Reg(reg) = op.kind else {
                    return Err(internal());
                };
                self.is4_reg = Some(reg.num() & 0xF);
                self.im_len = 8;
            }
            Action::VexImm => {
                let OperandKind::Imm(expr) = op.kind else {
                    return Err(internal());
                };
                self.is4_imm = Some(expr);
                self.im_len = 8;
            }
            Action::JmpRel | Action::JmpFar | Action::AdSizeR => {
                return Err(Error::new(
                    ErrorKind::Internal("jump action in general encoder"),
                    loc,
                ))
            }
        }

        if pattern.size == OpSize::SBits {
            self.opersize = self.mode_bits;
        }

        match pattern.post {
            PostAction::None => {}
            PostAction::SImm8 => {
                // Strict non-8-bit immediates expand to the alternate
                // opcode right away; everything else is optimised later.
                if !(self.force_strict || op.strict) || op.size == 0 {
                    self.postop = PostOp::SignextImm8;
                } else if op.size != 8 {
                    self.opcode.make_alt_1();
                }
            }
            PostAction::ShortMov => self.postop = PostOp::ShortMov,
            PostAction::A16 => self.postop = PostOp::Address16,
            PostAction::SImm32Avail => self.postop = PostOp::SImm32Avail,
        }
        Ok(())
    }

    fn apply_segreg(
        &mut self,
        insn: &Insn,
        diags: &mut Diagnostics,
    ) -> EncodeResult<()> {
        if let Some(ea) = &mut self.ea {
            ea.init_spare(self.spare);
            if let Some((segreg, loc)) = insn.segreg {
                ea.set_segreg(segreg, self.mode_bits, diags, loc);
            }
        } else if let Some((segreg, loc)) = insn.segreg {
            if self.special_prefix == 0 {
                self.special_prefix = segreg.prefix();
            } else {
                return Err(Error::new(
                    ErrorKind::Internal("unhandled segment prefix"),
                    loc,
                ));
            }
        }
        Ok(())
    }

    fn finish(
        mut self,
        insn: &Insn,
        section: &mut Section,
        symtab: &SymbolTable,
        diags: &mut Diagnostics,
    ) -> EncodeResult<()> {
        // Assemble a pending is4 byte from its register and selector
        // parts; both must be known now.
        if self.is4_reg.is_some() || self.is4_imm.is_some() {
            let reg = self.is4_reg.unwrap_or(0) << 4;
            let sel = match self.is4_imm.take() {
                None => 0,
                Some(expr) => {
                    let mut expr = expr;
                    expr.expand_equates(symtab, ErrorKind::EquCircularImm, self.loc)?;
                    expr.simplify();
                    expr.intnum()
                        .ok_or_else(|| Error::new(ErrorKind::EaTooComplex, self.loc))?
                }
            };
            #[allow(clippy::cast_sign_loss)]
            let byte = reg | (sel as u8 & 0x0F);
            self.imm = Some(Expr::from_const(i64::from(byte)));
            self.im_len = 8;
        }

        let imm = self.imm.take().map(|expr| {
            let mut value = Value::new(self.im_len, expr, self.loc);
            value.signed = self.im_sign;
            value
        });

        let mut common = InsnCommon::new(self.mode_bits);
        common.addrsize = self.addrsize;
        common.opersize = self.opersize;
        common.apply_prefixes(
            self.def_opersize_64,
            &insn.prefixes,
            Some(&mut self.rex),
            diags,
        );
        common.finish();

        // Convert to VEX/XOP now that the opcode bytes are final.
        if self.vexdata != 0 {
            vex::build(
                &mut self.opcode,
                &mut self.special_prefix,
                self.vexdata,
                self.vexreg,
                self.loc,
            )?;
        }

        let mut bc = Bytecode::new(self.loc);
        if self.postop == PostOp::None && self.ea.is_none() {
            // Nothing span-dependent: emit fixed bytes now.
            let mut bytes = Vec::new();
            general_tobytes(
                &mut bytes,
                &common,
                self.opcode,
                None,
                self.special_prefix,
                self.rex,
            )?;
            bc.fixed_mut().extend_from_slice(&bytes);
            if let Some(mut imm) = imm {
                imm.finalize(symtab, ErrorKind::EquCircularImm)?;
                bc.append_fixed_value(imm);
            }
            section.append(bc);
            return Ok(());
        }

        trace!(
            "deferred general bytecode, postop {:?}, ea {}",
            self.postop,
            self.ea.is_some()
        );
        bc.set_contents(BcKind::General(GeneralBc {
            common,
            opcode: self.opcode,
            ea: self.ea,
            imm,
            special_prefix: self.special_prefix,
            rex: self.rex,
            postop: self.postop,
            default_rel: self.default_rel,
            loc: self.loc,
        }));
        section.append(bc);
        Ok(())
    }
}

/// Write prefixes, VEX/XOP or REX, and opcode bytes.
fn general_tobytes(
    bytes: &mut Vec<u8>,
    common: &InsnCommon,
    mut opcode: Opcode,
    ea: Option<&EffAddr>,
    mut special_prefix: u8,
    rex: Rex,
) -> EncodeResult<()> {
    vex::optimize(&mut opcode, &mut special_prefix, rex);

    common.to_bytes(bytes, ea.and_then(|ea| ea.segreg));
    if special_prefix != 0 {
        bytes.push(special_prefix);
    }
    match special_prefix {
        0xC4 | 0x8F => {
            // Three-byte VEX/XOP: merge the ones' complement of
            // REX.R/X/B, and W.
            opcode.mask(0, 0x1F);
            if !rex.is_forbidden() {
                opcode.merge(0, ((!rex.raw()) & 0x07) << 5);
                if rex.raw() & 0x8 != 0 {
                    opcode.merge(1, 0x80);
                }
            } else {
                opcode.merge(0, 0xE0);
            }
        }
        0xC5 => {
            // Two-byte VEX: merge the ones' complement of REX.R.
            opcode.mask(0, 0x7F);
            if rex.is_forbidden() || rex.raw() & 0x4 == 0 {
                opcode.merge(0, 0x80);
            }
            if !rex.is_forbidden() && rex.raw() & 0x0B != 0 {
                return Err(Error::new(
                    ErrorKind::Internal("REX.WXB set, but 2-byte VEX"),
                    SourceLoc::default(),
                ));
            }
        }
        _ => {
            if let Some(byte) = rex.byte() {
                if common.mode_bits != 64 {
                    return Err(Error::new(
                        ErrorKind::Internal("REX prefix in non-64-bit mode"),
                        SourceLoc::default(),
                    ));
                }
                bytes.push(byte);
            }
        }
    }
    opcode.to_bytes(bytes);
    Ok(())
}

/// A deferred general instruction participating in span resolution.
#[derive(Debug)]
pub struct GeneralBc {
    common: InsnCommon,
    opcode: Opcode,
    ea: Option<EffAddr>,
    imm: Option<Value>,
    special_prefix: u8,
    rex: Rex,
    postop: PostOp,
    default_rel: bool,
    loc: SourceLoc,
}

impl Contents for GeneralBc {
    fn finalize(
        &mut self,
        symtab: &SymbolTable,
        diags: &mut Diagnostics,
    ) -> EncodeResult<()> {
        if let Some(ea) = &mut self.ea {
            ea.disp.finalize(symtab, ErrorKind::EquCircularMem)?;
        }
        if let Some(imm) = &mut self.imm {
            imm.finalize(symtab, ErrorKind::EquCircularImm)?;
        }

        match self.postop {
            PostOp::Address16 => {
                if self.common.addrsize != 0 {
                    diags.warn(self.loc, Warning::AddressSizeIgnored);
                    self.common.addrsize = 0;
                }
            }
            PostOp::ShortMov => {
                // A mov through a 32-bit address override in 64-bit mode
                // with a register-less address shrinks to the direct
                // offset form, unless default-rel addressing is on.
                let ea = self
                    .ea
                    .as_mut()
                    .expect("short-mov postop without an address");
                if !self.default_rel
                    && self.common.mode_bits == 64
                    && self.common.addrsize == 32
                    && !ea.disp.expr().contains_reg()
                {
                    ea.set_disponly();
                    self.opcode.make_alt_1();
                }
                self.postop = PostOp::None;
            }
            PostOp::SImm32Avail => {
                // 64-bit mov immediate: shrink to the sign-extended
                // 32-bit form when the value is known to fit.
                let imm = self
                    .imm
                    .as_mut()
                    .expect("simm32 postop without an immediate");
                let fits = match imm.get_intnum() {
                    Some(n) => i32::try_from(n).is_ok(),
                    None => false,
                };
                if fits {
                    // Rebuild the ModR/M from the register already added
                    // into the opcode byte; its REX.B contribution is
                    // already accounted for.
                    let regnum = self.opcode.get(0).wrapping_sub(0xB8) & 7;
                    let mut scratch_rex = Rex::none();
                    self.ea = Some(EffAddr::from_reg(
                        Reg::new(RegClass::Reg64, regnum),
                        &mut scratch_rex,
                        64,
                        self.loc,
                    )?);
                    self.ea.as_mut().expect("just set").init_spare(0);
                    self.opcode.make_alt_1();
                    imm.size = 32;
                    imm.signed = true;
                }
                self.postop = PostOp::None;
            }
            PostOp::None | PostOp::SignextImm8 => {}
        }

        // Analyse the effective address now; displacement spans are
        // registered by calc_len.
        if let Some(ea) = &mut self.ea {
            let address16 = self.postop == PostOp::Address16;
            ea.check(
                &mut self.common.addrsize,
                self.common.mode_bits,
                address16,
                &mut self.rex,
                diags,
                self.loc,
            )?;
            if self.postop == PostOp::Address16 {
                self.common.addrsize = 0;
                self.postop = PostOp::None;
            }
        }
        Ok(())
    }

    fn calc_len(
        &mut self,
        add_span: &mut dyn FnMut(u32, &Value, i64, i64),
    ) -> EncodeResult<u32> {
        let mut len = 0u32;

        if let Some(ea) = &mut self.ea {
            if ea.disp.size == 0 && ea.need_nonzero_len {
                // Unknown displacement: byte-sized until a span says
                // otherwise.
                ea.disp.size = 8;
                add_span(1, &ea.disp, -128, 127);
            }
            len += u32::from(ea.disp.size / 8);
            len += u32::from(ea.need_modrm);
            len += u32::from(ea.need_sib == NeedSib::Yes);
            len += u32::from(ea.segreg.is_some());
        }

        if let Some(imm) = &mut self.imm {
            let mut immlen = imm.size;
            if self.postop == PostOp::SignextImm8 {
                match imm.get_intnum() {
                    None => {
                        // Unknown: byte form plus a span.
                        immlen = 8;
                        add_span(2, imm, -128, 127);
                    }
                    Some(n) if (-128..=127).contains(&n) => {
                        imm.size = 8;
                        imm.signed = true;
                        immlen = 8;
                        self.postop = PostOp::None;
                    }
                    Some(_) => {
                        self.opcode.make_alt_1();
                        self.postop = PostOp::None;
                    }
                }
            }
            len += u32::from(immlen / 8);
        }

        // The three-byte VEX form may shorten now that REX is known.
        vex::optimize(&mut self.opcode, &mut self.special_prefix, self.rex);
        if self.rex.byte().is_some()
            && !matches!(self.special_prefix, 0xC4 | 0xC5 | 0x8F)
        {
            len += 1;
        }
        len += u32::try_from(self.opcode.len()).unwrap();
        len += self.common.len();
        len += u32::from(self.special_prefix != 0);
        Ok(len)
    }

    fn expand(
        &mut self,
        len: &mut u32,
        span: u32,
        _old_val: i64,
        _new_val: i64,
        _neg_thres: &mut i64,
        _pos_thres: &mut i64,
    ) -> EncodeResult<bool> {
        if span == 1 {
            let ea = self
                .ea
                .as_mut()
                .expect("displacement span without an address");
            if ea.disp.size == 8 {
                ea.disp.size = if self.common.addrsize == 16 { 16 } else { 32 };
                ea.modrm &= !0xC0;
                ea.modrm |= 0x80;
                *len -= 1;
                *len += u32::from(ea.disp.size / 8);
            }
        } else if span == 2 && self.postop == PostOp::SignextImm8 {
            let imm = self
                .imm
                .as_mut()
                .expect("immediate span without an immediate");
            *len -= u32::try_from(self.opcode.len()).unwrap();
            *len += u32::from(imm.size / 8);
            self.opcode.make_alt_1();
            self.postop = PostOp::None;
        }
        Ok(false)
    }

    fn output(&mut self, out: &mut OutputContext) -> EncodeResult<()> {
        let mut bytes = Vec::new();
        general_tobytes(
            &mut bytes,
            &self.common,
            self.opcode,
            self.ea.as_ref(),
            self.special_prefix,
            self.rex,
        )?;
        if let Some(ea) = &self.ea {
            if ea.need_modrm {
                if !ea.valid_modrm {
                    return Err(Error::new(
                        ErrorKind::Internal("invalid ModR/M at output"),
                        self.loc,
                    ));
                }
                bytes.push(ea.modrm);
            }
            if ea.need_sib == NeedSib::Yes {
                if !ea.valid_sib {
                    return Err(Error::new(
                        ErrorKind::Internal("invalid SIB at output"),
                        self.loc,
                    ));
                }
                bytes.push(ea.sib);
            }
        }
        let head_len = u32::try_from(bytes.len()).unwrap();
        out.extend(&bytes);

        let imm_bytes = self.imm.as_ref().map_or(0, |imm| {
            if self.postop == PostOp::SignextImm8 {
                1
            } else {
                u32::from(imm.size / 8)
            }
        });

        let mut disp_bytes = 0u32;
        if let Some(ea) = &mut self.ea {
            if ea.need_disp {
                let disp_len = ea.disp.size / 8;
                disp_bytes = u32::from(disp_len);
                if ea.disp.ip_rel {
                    // Adjust the relative displacement to the end of the
                    // instruction.
                    ea.disp.add_abs(-i64::from(disp_len));
                }
                ea.disp.insn_start = head_len;
                ea.disp.next_insn = imm_bytes;
                out.output_value(&ea.disp)?;
            }
        }

        if let Some(imm) = &mut self.imm {
            if self.postop == PostOp::SignextImm8 {
                // Still set here means the span never forced the wide
                // form.
                imm.size = 8;
                imm.signed = true;
            }
            imm.insn_start = head_len + disp_bytes;
            imm.next_insn = 0;
            out.output_value(imm)?;
        }
        Ok(())
    }
}
