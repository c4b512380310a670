//! Relative and far jump encoding.
//!
//! Relative jumps pick between a short (8-bit) and near (16/32-bit)
//! displacement. When the user forces one with `SHORT`/`NEAR` the bytes
//! are fixed immediately; otherwise both candidate opcodes ride in a
//! deferred bytecode that starts short and is upgraded by span
//! resolution. Far jumps are always fixed: offset then 16-bit segment.

use crate::common::InsnCommon;
use crate::container::{BcKind, Bytecode, Contents, OutputContext, Section};
use crate::diag::{
    Diagnostics, EncodeResult, Error, ErrorKind, SourceLoc,
};
use crate::expr::{Expr, SymbolKind, SymbolTable, Term};
use crate::insn::{Insn, OperandKind};
use crate::opcode::Opcode;
use crate::tables::{misc, size_lookup, Action, InsnForm, Modifier, TmodGate};
use crate::value::Value;
use log::trace;

/// Which opcode a relative jump is using.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum JmpSel {
    /// Not yet decided; span resolution picks.
    None,
    Short,
    Near,
}

/// Scan a sibling form for short/near opcode bytes matching `opersize`.
fn match_jmp_info(
    insn: &Insn,
    candidate: &InsnForm,
    opersize: u8,
    shortop: &mut Opcode,
    nearop: &mut Opcode,
) -> bool {
    if insn.mode_bits != 64 && candidate.misc_flags & misc::ONLY_64 != 0 {
        return false;
    }
    if insn.mode_bits == 64 && candidate.misc_flags & misc::NOT_64 != 0 {
        return false;
    }
    if !insn.cpu.satisfies(&candidate.cpu) {
        return false;
    }
    let Some(first) = candidate.operands.first() else {
        return false;
    };
    if first.action != Action::JmpRel {
        return false;
    }
    if candidate.opersize != opersize {
        return false;
    }
    match first.tmod {
        TmodGate::Short => {
            *shortop = Opcode::new(candidate.opcode_len, candidate.opcode);
            for (i, modifier) in candidate.modifiers.iter().enumerate() {
                if *modifier == Modifier::Op0Add {
                    shortop.add(0, insn.mod_data[i]);
                }
            }
            if !nearop.is_empty() {
                return true;
            }
        }
        TmodGate::Near => {
            *nearop = Opcode::new(candidate.opcode_len, candidate.opcode);
            for (i, modifier) in candidate.modifiers.iter().enumerate() {
                if *modifier == Modifier::Op1Add {
                    nearop.add(1, insn.mod_data[i]);
                }
            }
            if !shortop.is_empty() {
                return true;
            }
        }
        _ => {}
    }
    false
}

/// Encode a matched relative-jump form.
pub(crate) fn append_jmp(
    insn: &Insn,
    form: &'static InsnForm,
    section: &mut Section,
    symtab: &SymbolTable,
    diags: &mut Diagnostics,
) -> EncodeResult<()> {
    let sizes = size_lookup(insn.mode_bits);
    let order = insn.operand_order(form);
    let op = &insn.operands[order[0]];
    let OperandKind::Imm(target_expr) = op.kind.clone() else {
        return Err(Error::new(
            ErrorKind::Internal("relative jump without immediate target"),
            op.loc,
        ));
    };

    // Explicit SHORT/NEAR request, if any, comes from the matched form.
    let forced = match form.operands[0].tmod {
        TmodGate::Short => JmpSel::Short,
        TmodGate::Near => JmpSel::Near,
        _ => JmpSel::None,
    };

    // Collect the short and near opcodes from sibling forms.
    let mut shortop = Opcode::empty();
    let mut nearop = Opcode::empty();
    for candidate in insn.group {
        if match_jmp_info(insn, candidate, form.opersize, &mut shortop, &mut nearop)
        {
            break;
        }
    }

    if forced == JmpSel::Short && shortop.is_empty() {
        return Err(Error::new(ErrorKind::MissingJumpForm, insn.loc));
    }
    if forced == JmpSel::Near && nearop.is_empty() {
        return Err(Error::new(ErrorKind::MissingJumpForm, insn.loc));
    }

    let mut common = InsnCommon::new(insn.mode_bits);
    common.opersize = form.opersize;
    // An address-size pin can come from a second operand (`loop ecx`) or
    // a keyword modifier (`jecxz`).
    if let Some(second) = form.operands.get(1) {
        if second.action == Action::AdSizeR {
            common.addrsize =
                u8::try_from(sizes[second.size as usize]).unwrap_or(0);
        }
    }
    for (i, modifier) in form.modifiers.iter().enumerate() {
        if *modifier == Modifier::AdSizeR {
            common.addrsize = insn.mod_data[i];
        }
    }
    common.apply_prefixes(form.def_opersize_64, &insn.prefixes, None, diags);
    common.finish();

    let mut target = Value::new(0, target_expr, op.loc);
    target.jump_target = true;
    target.signed = true;

    // With only one form available there is nothing to resolve.
    let mut sel = forced;
    if sel == JmpSel::None {
        if shortop.is_empty() {
            sel = JmpSel::Near;
        }
        if nearop.is_empty() {
            sel = JmpSel::Short;
        }
    }

    let mut bc = Bytecode::new(insn.loc);
    if sel == JmpSel::None {
        bc.set_contents(BcKind::Jmp(JmpBc {
            common,
            shortop,
            nearop,
            target,
            sel: JmpSel::None,
            loc: insn.loc,
        }));
        section.append(bc);
        return Ok(());
    }

    // Forced size: generate the bytes directly.
    target.finalize(symtab, ErrorKind::EquCircularImm)?;
    target.set_curpos_rel(false);
    let bytes = bc.fixed_mut();
    common.to_bytes(bytes, None);
    let prefix_len = u32::try_from(bytes.len()).unwrap();
    let size: u16 = if sel == JmpSel::Short {
        shortop.to_bytes(bytes);
        1
    } else {
        nearop.to_bytes(bytes);
        if common.opersize == 16 {
            2
        } else {
            4
        }
    };
    target.add_abs(-i64::from(size));
    target.size = size * 8;
    target.insn_start = prefix_len;
    bc.append_fixed_value(target);
    section.append(bc);
    Ok(())
}

/// Encode a matched far-jump form: offset then segment, both fixed.
pub(crate) fn append_jmpfar(
    insn: &Insn,
    form: &'static InsnForm,
    section: &mut Section,
    symtab: &SymbolTable,
    diags: &mut Diagnostics,
) -> EncodeResult<()> {
    let order = insn.operand_order(form);
    let op = &insn.operands[order[0]];
    let OperandKind::Imm(offset_expr) = op.kind.clone() else {
        return Err(Error::new(
            ErrorKind::Internal("far jump without immediate target"),
            op.loc,
        ));
    };
    let seg_expr = match op.seg.clone() {
        Some(expr) => expr,
        // A plain `FAR imm` target becomes `SEG imm : imm`.
        None => {
            let mut expr = Expr::new();
            expr.terms.push(Term::SegOf(Box::new(offset_expr.clone())));
            expr
        }
    };

    let mut common = InsnCommon::new(insn.mode_bits);
    common.opersize = form.opersize;
    common.apply_prefixes(form.def_opersize_64, &insn.prefixes, None, diags);
    common.finish();

    let mut bc = Bytecode::new(insn.loc);
    let bytes = bc.fixed_mut();
    common.to_bytes(bytes, None);
    Opcode::new(form.opcode_len, form.opcode).to_bytes(bytes);

    let size: u16 = if common.opersize == 16 { 2 } else { 4 };
    let mut offset = Value::new(size * 8, offset_expr, op.loc);
    offset.finalize(symtab, ErrorKind::EquCircularImm)?;
    bc.append_fixed_value(offset);

    let mut segment = Value::new(16, seg_expr, op.loc);
    segment.finalize(symtab, ErrorKind::EquCircularImm)?;
    bc.append_fixed_value(segment);

    section.append(bc);
    Ok(())
}

/// A deferred relative jump participating in span resolution.
#[derive(Debug)]
pub struct JmpBc {
    common: InsnCommon,
    shortop: Opcode,
    nearop: Opcode,
    target: Value,
    sel: JmpSel,
    loc: SourceLoc,
}

impl JmpBc {
    fn near_disp_bytes(&self) -> u32 {
        if self.common.opersize == 16 {
            2
        } else {
            4
        }
    }
}

impl Contents for JmpBc {
    fn finalize(
        &mut self,
        symtab: &SymbolTable,
        _diags: &mut Diagnostics,
    ) -> EncodeResult<()> {
        self.target.finalize(symtab, ErrorKind::EquCircularImm)?;
        if self.target.seg_of {
            return Err(Error::new(ErrorKind::EaTooComplex, self.loc));
        }
        self.target.set_curpos_rel(false);

        // External targets can't be distance-checked; default to near.
        // Everything else starts short and may be grown.
        self.sel = match self.target.rel {
            Some(sym) => match symtab.get(sym).kind {
                SymbolKind::Label(_) => JmpSel::Short,
                _ => JmpSel::Near,
            },
            None => JmpSel::Short,
        };
        Ok(())
    }

    fn calc_len(
        &mut self,
        add_span: &mut dyn FnMut(u32, &Value, i64, i64),
    ) -> EncodeResult<u32> {
        let mut len = self.common.len();
        if self.sel == JmpSel::Near {
            len += u32::try_from(self.nearop.len()).unwrap();
            len += self.near_disp_bytes();
        } else {
            // Short, or still undecided: try short and let the span
            // resolver upgrade.
            len += u32::try_from(self.shortop.len()).unwrap() + 1;
            add_span(
                1,
                &self.target,
                -128 + i64::from(len),
                127 + i64::from(len),
            );
        }
        Ok(len)
    }

    fn expand(
        &mut self,
        len: &mut u32,
        span: u32,
        _old_val: i64,
        new_val: i64,
        _neg_thres: &mut i64,
        _pos_thres: &mut i64,
    ) -> EncodeResult<bool> {
        if span != 1 {
            return Err(Error::new(
                ErrorKind::Internal("unrecognized span id"),
                self.loc,
            ));
        }
        if self.sel == JmpSel::Near {
            return Err(Error::new(
                ErrorKind::Internal("trying to expand an already-near jump"),
                self.loc,
            ));
        }
        trace!("upgrading short jump to near, target {new_val:#x}");
        self.sel = JmpSel::Near;
        *len -= u32::try_from(self.shortop.len()).unwrap() + 1;
        *len += u32::try_from(self.nearop.len()).unwrap();
        *len += self.near_disp_bytes();
        Ok(false)
    }

    fn output(&mut self, out: &mut OutputContext) -> EncodeResult<()> {
        let mut bytes = Vec::new();
        self.common.to_bytes(&mut bytes, None);
        let prefix_len = u32::try_from(bytes.len()).unwrap();
        let size: u16 = if self.sel == JmpSel::Short {
            self.shortop.to_bytes(&mut bytes);
            1
        } else {
            self.nearop.to_bytes(&mut bytes);
            u16::try_from(self.near_disp_bytes()).unwrap()
        };
        out.extend(&bytes);

        // The displacement is relative to the end of the instruction.
        self.target.add_abs(-i64::from(size));
        self.target.size = size * 8;
        self.target.insn_start = prefix_len;
        self.target.next_insn = 0;
        out.output_value(&self.target)
    }
}
