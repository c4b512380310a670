//! End-to-end encoding checks: byte-exact expectations per instruction,
//! including span resolution across a whole section.

use assembler_x86::lookup::parse_insn;
use assembler_x86::regs::gpr;
use assembler_x86::{
    define_label_here, Config, Diagnostics, Dialect, EffAddr, ErrorKind, Expr,
    Insn, Operand, Prefix, Reg, RegClass, Reloc, Section, SegReg, SourceLoc,
    SymbolTable, TargetMod,
};

struct Asm {
    config: Config,
    section: Section,
    symtab: SymbolTable,
    diags: Diagnostics,
    line: u32,
}

impl Asm {
    fn new(mode_bits: u8) -> Self {
        let _ = env_logger::builder().is_test(true).try_init();
        Self {
            config: Config::new(mode_bits),
            section: Section::new(),
            symtab: SymbolTable::new(),
            diags: Diagnostics::new(),
            line: 0,
        }
    }

    fn insn(&mut self, name: &str) -> Insn {
        self.line += 1;
        parse_insn(name, &self.config, SourceLoc::new(self.line))
            .expect("mnemonic gates")
            .expect("known mnemonic")
    }

    fn encode(&mut self, insn: Insn) {
        insn.encode(&mut self.section, &self.symtab, &mut self.diags)
            .expect("instruction encodes");
    }

    fn encode_err(&mut self, insn: Insn) -> ErrorKind {
        insn.encode(&mut self.section, &self.symtab, &mut self.diags)
            .expect_err("instruction must fail")
            .kind
    }

    fn label(&mut self, name: &str) {
        define_label_here(&mut self.symtab, &self.section, name);
    }

    fn finish(mut self) -> (Vec<u8>, Vec<Reloc>) {
        self.section
            .resolve(&self.symtab, &mut self.diags)
            .expect("span resolution");
        self.section.to_bytes(&self.symtab).expect("output")
    }

    fn bytes(self) -> Vec<u8> {
        self.finish().0
    }
}

fn mem(expr: Expr) -> Operand {
    Operand::mem(EffAddr::from_expr(expr, false, SourceLoc::default()))
}

fn imm(v: i64) -> Operand {
    Operand::imm(Expr::from_const(v))
}

/// Encode one instruction and return its bytes.
fn one(mode_bits: u8, name: &str, ops: Vec<Operand>) -> Vec<u8> {
    let mut asm = Asm::new(mode_bits);
    let mut insn = asm.insn(name);
    for op in ops {
        insn.push_operand(op);
    }
    asm.encode(insn);
    asm.bytes()
}

#[test]
fn mov_eax_imm32() {
    assert_eq!(
        one(64, "mov", vec![Operand::reg(gpr::EAX), imm(1)]),
        vec![0xB8, 0x01, 0x00, 0x00, 0x00]
    );
}

#[test]
fn mov_rax_imm_shrinks_to_simm32() {
    assert_eq!(
        one(64, "mov", vec![Operand::reg(gpr::RAX), imm(1)]),
        vec![0x48, 0xC7, 0xC0, 0x01, 0x00, 0x00, 0x00]
    );
    assert_eq!(
        one(64, "mov", vec![Operand::reg(gpr::RAX), imm(-1)]),
        vec![0x48, 0xC7, 0xC0, 0xFF, 0xFF, 0xFF, 0xFF]
    );
}

#[test]
fn mov_rax_imm64_stays_wide() {
    assert_eq!(
        one(64, "mov", vec![Operand::reg(gpr::RAX), imm(0x1122_3344_5566)]),
        vec![0x48, 0xB8, 0x66, 0x55, 0x44, 0x33, 0x22, 0x11, 0x00, 0x00]
    );
}

#[test]
fn mov_rip_relative_store() {
    // The target sits at the start of this very instruction, so the
    // 32-bit displacement is -7 after the seven instruction bytes.
    let mut asm = Asm::new(64);
    asm.label("target");
    let sym = asm.symtab.intern("target");
    let mut insn = asm.insn("mov");
    insn.push_operand(mem(Expr::from_sym(sym).with_wrt(gpr::RIP)));
    insn.push_operand(Operand::reg(gpr::RAX));
    asm.encode(insn);
    assert_eq!(
        asm.bytes(),
        vec![0x48, 0x89, 0x05, 0xF9, 0xFF, 0xFF, 0xFF]
    );
}

#[test]
fn jmp_short_plus_two() {
    let mut asm = Asm::new(64);
    let sym = asm.symtab.intern("after");
    let mut insn = asm.insn("jmp");
    insn.push_operand(
        Operand::imm(Expr::from_sym(sym)).with_tmod(TargetMod::Short),
    );
    asm.encode(insn);
    asm.label("after");
    assert_eq!(asm.bytes(), vec![0xEB, 0x00]);
}

#[test]
fn jmp_span_upgrades_to_near() {
    // jmp $+130: the distance exceeds a short displacement once the jump
    // itself is accounted for, so the span resolver grows it.
    let mut asm = Asm::new(64);
    asm.label("here");
    let sym = asm.symtab.intern("here");
    let mut insn = asm.insn("jmp");
    insn.push_operand(Operand::imm(Expr::from_sym(sym).with_const(130)));
    asm.encode(insn);
    assert_eq!(asm.bytes(), vec![0xE9, 0x7D, 0x00, 0x00, 0x00]);
}

#[test]
fn jmp_span_ripples_through_labels() {
    // The same upgrade, driven by real instructions between the jump and
    // its target; every label shifts as the jump grows.
    let mut asm = Asm::new(64);
    let sym = asm.symtab.intern("far_away");
    let mut insn = asm.insn("jmp");
    insn.push_operand(Operand::imm(Expr::from_sym(sym)));
    asm.encode(insn);
    for _ in 0..128 {
        let nop = asm.insn("nop");
        asm.encode(nop);
    }
    asm.label("far_away");
    let bytes = asm.bytes();
    assert_eq!(&bytes[..5], &[0xE9, 0x80, 0x00, 0x00, 0x00]);
    assert_eq!(bytes.len(), 133);
}

#[test]
fn jmp_backward_stays_short() {
    let mut asm = Asm::new(64);
    asm.label("top");
    let sym = asm.symtab.intern("top");
    let nop = asm.insn("nop");
    asm.encode(nop);
    let mut insn = asm.insn("jmp");
    insn.push_operand(Operand::imm(Expr::from_sym(sym)));
    asm.encode(insn);
    assert_eq!(asm.bytes(), vec![0x90, 0xEB, 0xFD]);
}

#[test]
fn add_rax_rsp_disp8() {
    assert_eq!(
        one(
            64,
            "add",
            vec![
                Operand::reg(gpr::RAX),
                mem(Expr::from_reg(gpr::RSP).with_const(8)),
            ]
        ),
        vec![0x48, 0x03, 0x44, 0x24, 0x08]
    );
}

#[test]
fn mov_16bit_bx_si_disp8() {
    assert_eq!(
        one(
            16,
            "mov",
            vec![
                mem(Expr::from_reg(gpr::BX).with_reg(gpr::SI, 1).with_const(4)),
                Operand::reg(gpr::AX),
            ]
        ),
        vec![0x89, 0x40, 0x04]
    );
}

#[test]
fn vaddps_ymm_two_byte_vex() {
    assert_eq!(
        one(
            64,
            "vaddps",
            vec![
                Operand::reg(gpr::ymm(1)),
                Operand::reg(gpr::ymm(2)),
                Operand::reg(gpr::ymm(3)),
            ]
        ),
        vec![0xC5, 0xEC, 0x58, 0xCB]
    );
}

#[test]
fn vaddps_xmm() {
    assert_eq!(
        one(
            64,
            "vaddps",
            vec![
                Operand::reg(gpr::xmm(1)),
                Operand::reg(gpr::xmm(2)),
                Operand::reg(gpr::xmm(3)),
            ]
        ),
        vec![0xC5, 0xE8, 0x58, 0xCB]
    );
}

#[test]
fn vex_keeps_three_bytes_with_rex_b() {
    // An extended rm register sets REX.B, which the two-byte VEX cannot
    // carry.
    let mut asm = Asm::new(64);
    let mut insn = asm.insn("vaddps");
    insn.push_operand(Operand::reg(gpr::xmm(1)));
    insn.push_operand(Operand::reg(gpr::xmm(2)));
    insn.push_operand(Operand::reg(Reg::new(RegClass::Xmm, 9)));
    asm.encode(insn);
    // C4 C1 68 58 C9: RXB = 110 (B set), mmmmm = 1.
    assert_eq!(asm.bytes(), vec![0xC4, 0xC1, 0x68, 0x58, 0xC9]);
}

#[test]
fn vgatherdps_vsib() {
    assert_eq!(
        one(
            64,
            "vgatherdps",
            vec![
                Operand::reg(gpr::xmm(1)),
                mem(Expr::from_reg(gpr::RAX).with_reg(gpr::xmm(2), 4)),
                Operand::reg(gpr::xmm(7)),
            ]
        ),
        vec![0xC4, 0xE2, 0x41, 0x92, 0x0C, 0x90]
    );
}

#[test]
fn vblendvps_is4() {
    assert_eq!(
        one(
            64,
            "vblendvps",
            vec![
                Operand::reg(gpr::xmm(1)),
                Operand::reg(gpr::xmm(2)),
                Operand::reg(gpr::xmm(3)),
                Operand::reg(gpr::xmm(4)),
            ]
        ),
        vec![0xC4, 0xE3, 0x69, 0x4A, 0xCB, 0x40]
    );
}

#[test]
fn avx_two_operand_alias_shares_destination() {
    // vaddps xmm1, xmm2 encodes as vaddps xmm1, xmm1, xmm2: the
    // destination goes into both ModR/M.reg and VEX.vvvv.
    assert_eq!(
        one(
            64,
            "vaddps",
            vec![Operand::reg(gpr::xmm(1)), Operand::reg(gpr::xmm(2))]
        ),
        vec![0xC5, 0xF0, 0x58, 0xCA]
    );
    assert_eq!(
        one(
            64,
            "vaddps",
            vec![Operand::reg(gpr::ymm(1)), Operand::reg(gpr::ymm(2))]
        ),
        vec![0xC5, 0xF4, 0x58, 0xCA]
    );
}

#[test]
fn vpshift_immediate_three_operand() {
    // The destination rides in VEX.vvvv, the source in ModR/M.rm.
    assert_eq!(
        one(
            64,
            "vpsrlw",
            vec![
                Operand::reg(gpr::xmm(1)),
                Operand::reg(gpr::xmm(2)),
                imm(5),
            ]
        ),
        vec![0xC5, 0xF1, 0x71, 0xD2, 0x05]
    );
}

#[test]
fn vpshift_immediate_two_operand_alias() {
    // One register in both ModR/M.rm and VEX.vvvv.
    assert_eq!(
        one(64, "vpsrlw", vec![Operand::reg(gpr::xmm(4)), imm(5)]),
        vec![0xC5, 0xD9, 0x71, 0xD4, 0x05]
    );
    assert_eq!(
        one(64, "vpslld", vec![Operand::reg(gpr::ymm(2)), imm(1)]),
        vec![0xC5, 0xED, 0x72, 0xF2, 0x01]
    );
}

#[test]
fn vzeroupper_and_vzeroall() {
    assert_eq!(one(64, "vzeroupper", vec![]), vec![0xC5, 0xF8, 0x77]);
    assert_eq!(one(64, "vzeroall", vec![]), vec![0xC5, 0xFC, 0x77]);
}

#[test]
fn xop_vfrczps() {
    assert_eq!(
        one(
            64,
            "vfrczps",
            vec![Operand::reg(gpr::xmm(1)), Operand::reg(gpr::xmm(2))]
        ),
        vec![0x8F, 0xE9, 0x78, 0x80, 0xCA]
    );
}

#[test]
fn arith_imm8_sign_extension() {
    assert_eq!(
        one(64, "add", vec![Operand::reg(gpr::RBX), imm(4)]),
        vec![0x48, 0x83, 0xC3, 0x04]
    );
    // Out of imm8 range: the alternate opcode takes over.
    assert_eq!(
        one(64, "add", vec![Operand::reg(gpr::EBX), imm(1000)]),
        vec![0x81, 0xC3, 0xE8, 0x03, 0x00, 0x00]
    );
    // The A-register form wins for eax.
    assert_eq!(
        one(64, "add", vec![Operand::reg(gpr::EAX), imm(1000)]),
        vec![0x05, 0xE8, 0x03, 0x00, 0x00]
    );
}

#[test]
fn arith_rm_forms() {
    assert_eq!(
        one(
            32,
            "sub",
            vec![mem(Expr::from_reg(gpr::EBX)), Operand::reg(gpr::ECX)]
        ),
        vec![0x29, 0x0B]
    );
    assert_eq!(
        one(
            32,
            "cmp",
            vec![Operand::reg(gpr::ECX), mem(Expr::from_reg(gpr::EBX))]
        ),
        vec![0x3B, 0x0B]
    );
}

#[test]
fn lock_prefix_and_lockable_op() {
    let mut asm = Asm::new(64);
    let mut insn = asm.insn("add");
    insn.push_prefix(Prefix::LOCK, SourceLoc::new(1));
    insn.push_operand(mem(Expr::from_reg(gpr::RAX)));
    insn.push_operand(Operand::reg(gpr::EBX));
    asm.encode(insn);
    assert_eq!(asm.bytes(), vec![0xF0, 0x01, 0x18]);
}

#[test]
fn rep_string() {
    let mut asm = Asm::new(64);
    let mut insn = asm.insn("movsb");
    insn.push_prefix(Prefix::REP, SourceLoc::new(1));
    asm.encode(insn);
    assert_eq!(asm.bytes(), vec![0xF3, 0xA4]);
}

#[test]
fn segment_override_in_ea() {
    let mut asm = Asm::new(64);
    let mut insn = asm.insn("mov");
    insn.push_operand(Operand::reg(gpr::EAX));
    let mut ea = EffAddr::from_expr(
        Expr::from_reg(gpr::RBX).with_const(0x10),
        false,
        SourceLoc::default(),
    );
    ea.segreg = Some(SegReg::Fs);
    insn.push_operand(Operand::mem(ea));
    asm.encode(insn);
    assert_eq!(asm.bytes(), vec![0x64, 0x8B, 0x43, 0x10]);
}

#[test]
fn instruction_level_segment_override() {
    let mut asm = Asm::new(64);
    let mut insn = asm.insn("mov");
    insn.set_segreg(SegReg::Gs, SourceLoc::new(1));
    insn.push_operand(Operand::reg(gpr::EAX));
    insn.push_operand(mem(Expr::from_reg(gpr::RBX)));
    asm.encode(insn);
    assert_eq!(asm.bytes(), vec![0x65, 0x8B, 0x03]);
}

#[test]
fn push_pop() {
    assert_eq!(one(64, "push", vec![Operand::reg(gpr::RBX)]), vec![0x53]);
    assert_eq!(
        one(64, "push", vec![Operand::reg(gpr::reg64(12))]),
        vec![0x41, 0x54]
    );
    assert_eq!(one(64, "pop", vec![Operand::reg(gpr::RBP)]), vec![0x5D]);
    assert_eq!(one(64, "push", vec![imm(3)]), vec![0x6A, 0x03]);
    assert_eq!(
        one(32, "push", vec![imm(0x1234)]),
        vec![0x68, 0x34, 0x12, 0x00, 0x00]
    );
}

#[test]
fn inc_dec_mode_dependent() {
    assert_eq!(one(32, "inc", vec![Operand::reg(gpr::EAX)]), vec![0x40]);
    assert_eq!(
        one(64, "inc", vec![Operand::reg(gpr::EAX)]),
        vec![0xFF, 0xC0]
    );
    assert_eq!(
        one(64, "dec", vec![mem(Expr::from_reg(gpr::RBX)).with_size(8)]),
        vec![0xFE, 0x0B]
    );
}

#[test]
fn movzx_and_movsxd() {
    assert_eq!(
        one(
            64,
            "movzx",
            vec![Operand::reg(gpr::EAX), Operand::reg(gpr::AL)]
        ),
        vec![0x0F, 0xB6, 0xC0]
    );
    assert_eq!(
        one(
            64,
            "movsxd",
            vec![Operand::reg(gpr::RAX), Operand::reg(gpr::ECX)]
        ),
        vec![0x48, 0x63, 0xC1]
    );
}

#[test]
fn lea_base_index_scale() {
    assert_eq!(
        one(
            64,
            "lea",
            vec![
                Operand::reg(gpr::RAX),
                mem(Expr::from_reg(gpr::RBX)
                    .with_reg(gpr::RCX, 4)
                    .with_const(8)),
            ]
        ),
        vec![0x48, 0x8D, 0x44, 0x8B, 0x08]
    );
}

#[test]
fn shift_forms() {
    assert_eq!(
        one(64, "shl", vec![Operand::reg(gpr::EAX), imm(1)]),
        vec![0xD1, 0xE0]
    );
    assert_eq!(
        one(64, "shl", vec![Operand::reg(gpr::EAX), Operand::reg(gpr::CL)]),
        vec![0xD3, 0xE0]
    );
    assert_eq!(
        one(64, "shl", vec![Operand::reg(gpr::EAX), imm(5)]),
        vec![0xC1, 0xE0, 0x05]
    );
    assert_eq!(
        one(64, "sar", vec![Operand::reg(gpr::RDX), imm(63)]),
        vec![0x48, 0xC1, 0xFA, 0x3F]
    );
}

#[test]
fn imul_forms() {
    assert_eq!(
        one(64, "imul", vec![Operand::reg(gpr::EAX), imm(5)]),
        vec![0x6B, 0xC0, 0x05]
    );
    assert_eq!(
        one(
            64,
            "imul",
            vec![Operand::reg(gpr::EAX), Operand::reg(gpr::EBX), imm(1000)]
        ),
        vec![0x69, 0xC3, 0xE8, 0x03, 0x00, 0x00]
    );
}

#[test]
fn xchg_areg_short_form() {
    assert_eq!(
        one(
            64,
            "xchg",
            vec![Operand::reg(gpr::EAX), Operand::reg(gpr::EBX)]
        ),
        vec![0x93]
    );
    assert_eq!(
        one(
            64,
            "xchg",
            vec![Operand::reg(gpr::EBX), Operand::reg(gpr::ECX)]
        ),
        vec![0x87, 0xCB]
    );
}

#[test]
fn conditional_jump_short_and_near() {
    let mut asm = Asm::new(64);
    let sym = asm.symtab.intern("after");
    let mut insn = asm.insn("je");
    insn.push_operand(Operand::imm(Expr::from_sym(sym)));
    asm.encode(insn);
    asm.label("after");
    assert_eq!(asm.bytes(), vec![0x74, 0x00]);

    let mut asm = Asm::new(64);
    let sym = asm.symtab.intern("after");
    let mut insn = asm.insn("jne");
    insn.push_operand(
        Operand::imm(Expr::from_sym(sym)).with_tmod(TargetMod::Near),
    );
    asm.encode(insn);
    asm.label("after");
    assert_eq!(asm.bytes(), vec![0x0F, 0x85, 0x00, 0x00, 0x00, 0x00]);
}

#[test]
fn jcxz_rejects_near_modifier() {
    // No form in the group carries a NEAR gate, so matching fails.
    let mut asm = Asm::new(64);
    let sym = asm.symtab.intern("after");
    let mut insn = asm.insn("jrcxz");
    insn.push_operand(
        Operand::imm(Expr::from_sym(sym)).with_tmod(TargetMod::Near),
    );
    assert_eq!(asm.encode_err(insn), ErrorKind::BadInsnOperands);
}

#[test]
fn call_has_no_short_form() {
    let mut asm = Asm::new(64);
    let sym = asm.symtab.intern("after");
    let mut insn = asm.insn("call");
    insn.push_operand(
        Operand::imm(Expr::from_sym(sym)).with_tmod(TargetMod::Short),
    );
    assert_eq!(asm.encode_err(insn), ErrorKind::MissingJumpForm);
}

#[test]
fn loop_with_count_register_pins_addrsize() {
    let mut asm = Asm::new(64);
    let sym = asm.symtab.intern("top");
    asm.label("top");
    let mut insn = asm.insn("loop");
    insn.push_operand(Operand::imm(Expr::from_sym(sym)));
    insn.push_operand(Operand::reg(gpr::ECX));
    asm.encode(insn);
    assert_eq!(asm.bytes(), vec![0x67, 0xE2, 0xFD]);
}

#[test]
fn indirect_jump_and_call() {
    assert_eq!(
        one(64, "jmp", vec![Operand::reg(gpr::RBX)]),
        vec![0xFF, 0xE3]
    );
    assert_eq!(
        one(64, "call", vec![mem(Expr::from_reg(gpr::RAX))]),
        vec![0xFF, 0x10]
    );
}

#[test]
fn call_external_emits_pcrel_reloc() {
    let mut asm = Asm::new(64);
    let sym = asm.symtab.intern("extern_fn");
    let mut insn = asm.insn("call");
    insn.push_operand(Operand::imm(Expr::from_sym(sym)));
    asm.encode(insn);
    let (bytes, relocs) = asm.finish();
    assert_eq!(bytes, vec![0xE8, 0xFC, 0xFF, 0xFF, 0xFF]);
    assert_eq!(relocs.len(), 1);
    let reloc = &relocs[0];
    assert_eq!(reloc.offset, 1);
    assert_eq!(reloc.size, 32);
    assert!(reloc.relative);
    assert!(reloc.jump_target);
    assert_eq!(reloc.addend, -4);
    assert_eq!(reloc.next_insn, 0);
}

#[test]
fn far_jump_direct() {
    let mut asm = Asm::new(16);
    let mut insn = asm.insn("jmp");
    insn.push_operand(
        Operand::imm(Expr::from_const(0x5678))
            .with_seg(Expr::from_const(0x1234)),
    );
    asm.encode(insn);
    assert_eq!(asm.bytes(), vec![0xEA, 0x78, 0x56, 0x34, 0x12]);
}

#[test]
fn ret_forms() {
    assert_eq!(one(64, "ret", vec![]), vec![0xC3]);
    assert_eq!(one(64, "ret", vec![imm(8)]), vec![0xC2, 0x08, 0x00]);
    assert_eq!(one(16, "retf", vec![]), vec![0xCB]);
}

#[test]
fn int_and_in_out() {
    assert_eq!(one(32, "int", vec![imm(0x80)]), vec![0xCD, 0x80]);
    assert_eq!(
        one(64, "in", vec![Operand::reg(gpr::AL), imm(0x60)]),
        vec![0xE4, 0x60]
    );
    assert_eq!(
        one(64, "in", vec![Operand::reg(gpr::AL), Operand::reg(gpr::DX)]),
        vec![0xEC]
    );
    assert_eq!(
        one(64, "out", vec![Operand::reg(gpr::DX), Operand::reg(gpr::AL)]),
        vec![0xEE]
    );
}

#[test]
fn onebyte_opersize_variants() {
    assert_eq!(one(64, "cwde", vec![]), vec![0x98]);
    assert_eq!(one(64, "cbw", vec![]), vec![0x66, 0x98]);
    assert_eq!(one(64, "cqo", vec![]), vec![0x48, 0x99]);
    assert_eq!(one(64, "pause", vec![]), vec![0xF3, 0x90]);
    assert_eq!(one(64, "cpuid", vec![]), vec![0x0F, 0xA2]);
}

#[test]
fn bswap_uses_opcode_register_field() {
    assert_eq!(
        one(64, "bswap", vec![Operand::reg(gpr::reg64(9))]),
        vec![0x49, 0x0F, 0xC9]
    );
}

#[test]
fn setcc_and_cmovcc() {
    assert_eq!(
        one(64, "setz", vec![Operand::reg(gpr::AL)]),
        vec![0x0F, 0x94, 0xC0]
    );
    assert_eq!(
        one(
            64,
            "cmovne",
            vec![Operand::reg(gpr::EAX), Operand::reg(gpr::EBX)]
        ),
        vec![0x0F, 0x45, 0xC3]
    );
}

#[test]
fn x87_forms() {
    assert_eq!(
        one(
            32,
            "fld",
            vec![mem(Expr::from_reg(gpr::EAX)).with_size(32)]
        ),
        vec![0xD9, 0x00]
    );
    assert_eq!(
        one(32, "fld", vec![Operand::reg(Reg::new(RegClass::Fpu, 3))]),
        vec![0xD9, 0xC3]
    );
    assert_eq!(
        one(
            32,
            "fadd",
            vec![
                Operand::reg(Reg::new(RegClass::Fpu, 0)),
                Operand::reg(Reg::new(RegClass::Fpu, 2)),
            ]
        ),
        vec![0xD8, 0xC2]
    );
    // fadd to st2
    assert_eq!(
        one(
            32,
            "fadd",
            vec![Operand::reg(Reg::new(RegClass::Fpu, 2))
                .with_tmod(TargetMod::To)]
        ),
        vec![0xDC, 0xC2]
    );
}

#[test]
fn mmx_and_sse2_forms_of_pxor() {
    assert_eq!(
        one(
            64,
            "pxor",
            vec![
                Operand::reg(Reg::new(RegClass::Mmx, 0)),
                Operand::reg(Reg::new(RegClass::Mmx, 1)),
            ]
        ),
        vec![0x0F, 0xEF, 0xC1]
    );
    assert_eq!(
        one(
            64,
            "pxor",
            vec![Operand::reg(gpr::xmm(0)), Operand::reg(gpr::xmm(1))]
        ),
        vec![0x66, 0x0F, 0xEF, 0xC1]
    );
}

#[test]
fn sse_arith_prefixes() {
    assert_eq!(
        one(
            64,
            "addps",
            vec![Operand::reg(gpr::xmm(2)), Operand::reg(gpr::xmm(5))]
        ),
        vec![0x0F, 0x58, 0xD5]
    );
    assert_eq!(
        one(
            64,
            "addsd",
            vec![Operand::reg(gpr::xmm(1)), Operand::reg(gpr::xmm(2))]
        ),
        vec![0xF2, 0x0F, 0x58, 0xCA]
    );
    assert_eq!(
        one(
            64,
            "movaps",
            vec![mem(Expr::from_reg(gpr::RAX)), Operand::reg(gpr::xmm(3))]
        ),
        vec![0x0F, 0x29, 0x18]
    );
}

#[test]
fn mov_direct_offset_forms() {
    // In 64-bit mode the direct-offset form carries a 64-bit address.
    assert_eq!(
        one(64, "mov", vec![mem(Expr::from_const(0x10)), Operand::reg(gpr::AL)]),
        vec![0xA2, 0x10, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00]
    );
    // In 16-bit mode it is 16 bits wide.
    assert_eq!(
        one(
            16,
            "mov",
            vec![Operand::reg(gpr::AX), mem(Expr::from_const(0x1234))]
        ),
        vec![0xA1, 0x34, 0x12]
    );
}

#[test]
fn mov_moffs16_discards_address_override() {
    // The 16-bit direct-offset forms force 16-bit addressing: an
    // explicit override is dropped with a warning and no 0x67 prefix.
    let mut asm = Asm::new(16);
    let mut insn = asm.insn("mov");
    insn.push_prefix(Prefix::addr_size(32), SourceLoc::new(1));
    insn.push_operand(Operand::reg(gpr::AX));
    insn.push_operand(mem(Expr::from_const(0x1234)));
    asm.encode(insn);
    // The override is dropped when the address is analysed.
    asm.section
        .resolve(&asm.symtab, &mut asm.diags)
        .expect("span resolution");
    assert_eq!(asm.diags.len(), 1);
    let (bytes, _) = asm.section.to_bytes(&asm.symtab).expect("output");
    assert_eq!(bytes, vec![0xA1, 0x34, 0x12]);
}

#[test]
fn short_mov_via_gas_address_override() {
    // In GAS mode the direct-offset forms are unavailable, so the
    // register-or-memory form applies; a 32-bit address-size override in
    // 64-bit mode then shrinks it back to the short encoding.
    let mut asm = Asm::new(64);
    asm.config.dialect = Dialect::Gas;
    let mut insn = asm.insn("mov");
    insn.push_prefix(Prefix::addr_size(32), SourceLoc::new(1));
    // AT&T operand order: source first.
    insn.push_operand(mem(Expr::from_const(0x10)));
    insn.push_operand(Operand::reg(gpr::EAX));
    asm.encode(insn);
    assert_eq!(asm.bytes(), vec![0x67, 0xA1, 0x10, 0x00, 0x00, 0x00]);
}

#[test]
fn gas_reverses_operands() {
    let mut asm = Asm::new(64);
    asm.config.dialect = Dialect::Gas;
    let mut insn = asm.insn("movl");
    insn.push_operand(imm(1));
    insn.push_operand(Operand::reg(gpr::EAX));
    asm.encode(insn);
    assert_eq!(asm.bytes(), vec![0xB8, 0x01, 0x00, 0x00, 0x00]);
}

#[test]
fn gas_indirect_jump_requires_deref() {
    let mut asm = Asm::new(64);
    asm.config.dialect = Dialect::Gas;
    let mut insn = asm.insn("jmp");
    insn.push_operand(Operand::reg(gpr::RAX).deref());
    asm.encode(insn);
    assert!(asm.diags.is_empty());
    assert_eq!(asm.bytes(), vec![0xFF, 0xE0]);

    // Without `*` the jump still encodes but warns.
    let mut asm = Asm::new(64);
    asm.config.dialect = Dialect::Gas;
    let mut insn = asm.insn("jmp");
    insn.push_operand(Operand::reg(gpr::RAX));
    asm.encode(insn);
    assert_eq!(asm.diags.len(), 1);
}

#[test]
fn mov_high8_with_extended_reg_conflicts() {
    let mut asm = Asm::new(64);
    let mut insn = asm.insn("mov");
    insn.push_operand(Operand::reg(gpr::AH));
    insn.push_operand(Operand::reg(Reg::new(RegClass::Reg8x, 8)));
    assert_eq!(asm.encode_err(insn), ErrorKind::RexConflict);
}

#[test]
fn rex_needed_for_sil() {
    assert_eq!(
        one(64, "mov", vec![Operand::reg(Reg::new(RegClass::Reg8x, 6)), imm(1)]),
        vec![0x40, 0xB6, 0x01]
    );
}

#[test]
fn mov_moffs_external_symbol_reloc() {
    let mut asm = Asm::new(32);
    let sym = asm.symtab.intern("data");
    let mut insn = asm.insn("mov");
    insn.push_operand(Operand::reg(gpr::EAX));
    insn.push_operand(mem(Expr::from_sym(sym)));
    asm.encode(insn);
    let (bytes, relocs) = asm.finish();
    assert_eq!(bytes, vec![0xA1, 0x00, 0x00, 0x00, 0x00]);
    assert_eq!(relocs.len(), 1);
    assert_eq!(relocs[0].offset, 1);
    assert!(!relocs[0].relative);
}

#[test]
fn bad_operand_count() {
    let mut asm = Asm::new(64);
    let mut insn = asm.insn("add");
    insn.push_operand(Operand::reg(gpr::EAX));
    assert_eq!(asm.encode_err(insn), ErrorKind::BadNumOperands);
}

#[test]
fn mismatched_register_sizes_blame_an_operand() {
    let mut asm = Asm::new(64);
    let mut insn = asm.insn("mov");
    insn.push_operand(Operand::reg(gpr::EAX));
    insn.push_operand(Operand::reg(gpr::BX));
    // Waiving the size check on the first operand already finds a form,
    // so operand 1 gets the blame.
    assert_eq!(asm.encode_err(insn), ErrorKind::BadOperandSize(1));
}

#[test]
fn avx_requires_cpu_feature() {
    // The 32-bit baseline has no AVX.
    let config = Config::new(32);
    let err = parse_insn("vaddps", &config, SourceLoc::new(1))
        .expect_err("gate must fire");
    assert!(matches!(err.kind, ErrorKind::RequiresCpu(_)));
}

#[test]
fn equ_expansion_and_circularity() {
    let mut asm = Asm::new(64);
    let four = asm.symtab.intern("four");
    asm.symtab.define_equ(four, Expr::from_const(4));
    let mut insn = asm.insn("mov");
    insn.push_operand(Operand::reg(gpr::EAX));
    insn.push_operand(mem(Expr::from_reg(gpr::RBX).with_sym(four)));
    asm.encode(insn);
    assert_eq!(asm.bytes(), vec![0x8B, 0x43, 0x04]);

    let mut asm = Asm::new(64);
    let a = asm.symtab.intern("a");
    let b = asm.symtab.intern("b");
    asm.symtab.define_equ(a, Expr::from_sym(b));
    asm.symtab.define_equ(b, Expr::from_sym(a));
    let mut insn = asm.insn("mov");
    insn.push_operand(Operand::reg(gpr::EAX));
    insn.push_operand(mem(Expr::from_reg(gpr::RBX).with_sym(a)));
    let err = insn
        .encode(&mut asm.section, &asm.symtab, &mut asm.diags)
        .expect_err("circular equ");
    assert_eq!(err.kind, ErrorKind::EquCircularMem);
}

#[test]
fn multiple_lock_rep_warns() {
    let mut asm = Asm::new(64);
    let mut insn = asm.insn("movsb");
    insn.push_prefix(Prefix::LOCK, SourceLoc::new(1));
    insn.push_prefix(Prefix::REP, SourceLoc::new(1));
    asm.encode(insn);
    assert_eq!(asm.diags.len(), 1);
}

#[test]
fn skinit_pins_address_size() {
    let mut asm = Asm::new(64);
    let mut insn = asm.insn("skinit");
    insn.push_operand(mem(Expr::from_reg(gpr::EAX)));
    asm.encode(insn);
    // EAX operand in 64-bit mode: 0x67 address-size override.
    assert_eq!(asm.bytes(), vec![0x67, 0x0F, 0x01, 0xDE]);
}

#[test]
fn emitted_length_matches_resolved_length() {
    // Mixed section: every bytecode's emitted size must equal what the
    // resolver computed (checked by a debug assertion in output, plus the
    // label offsets staying consistent here).
    let mut asm = Asm::new(64);
    let target = asm.symtab.intern("end");
    let mut jmp = asm.insn("jmp");
    jmp.push_operand(Operand::imm(Expr::from_sym(target)));
    asm.encode(jmp);
    let mut mov = asm.insn("mov");
    mov.push_operand(Operand::reg(gpr::RAX));
    mov.push_operand(imm(1));
    asm.encode(mov);
    let mut add = asm.insn("add");
    add.push_operand(Operand::reg(gpr::RAX));
    add.push_operand(mem(Expr::from_reg(gpr::RSP).with_const(8)));
    asm.encode(add);
    asm.label("end");
    let bytes = asm.bytes();
    // jmp short over 12 bytes of payload.
    assert_eq!(bytes[0], 0xEB);
    assert_eq!(bytes[1], 12);
    assert_eq!(bytes.len(), 14);
}
