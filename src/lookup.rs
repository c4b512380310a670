//! Case-insensitive recognition of mnemonics, prefixes, registers, and
//! target modifiers.
//!
//! Each dialect has its own keyword map, built once on first use. The
//! NASM map holds the base spellings; the GAS map additionally carries
//! suffixed mnemonic spellings (`movl`, `addq`, ...) derived from the
//! suffix flags of each group's forms, plus the AT&T-only prefix names.

use crate::diag::{EncodeResult, Error, ErrorKind, SourceLoc};
use crate::features::CpuFeature::{self, Any as CAny};
use crate::insn::{check_insn_gates, Config, Dialect, Insn};
use crate::prefix::{Prefix, PrefixKind};
use crate::regs::{Reg, RegClass, SegReg, TargetMod};
use crate::tables::groups;
use crate::tables::{gas, misc, InsnForm};
use rustc_hash::FxHashMap;
use std::sync::OnceLock;

/// A mnemonic's entry: the form group plus per-keyword data.
#[derive(Clone, Debug)]
pub struct InsnKeyword {
    pub group: &'static [InsnForm],
    pub mod_data: [u8; 3],
    pub misc_flags: u8,
    pub cpu: [CpuFeature; 3],
    /// GAS suffix flags carried by this spelling; `WEAK` for unsuffixed
    /// GAS names, 0 for NASM.
    pub suffix: u16,
}

/// What an identifier resolves to.
#[derive(Clone, Debug)]
pub enum Keyword {
    Insn(InsnKeyword),
    Prefix { prefix: Prefix, only64: bool },
    Reg(Reg),
    SegReg(SegReg),
    TargetMod(TargetMod),
}

/// One row of the static mnemonic table.
#[derive(Clone, Copy)]
struct M(
    &'static str,
    &'static [InsnForm],
    [u8; 3],
    u8,
    CpuFeature,
);

use crate::features::CpuFeature::{
    Avx, Avx2, Fpu, I186, I386, I486, I586, I686, Mmx, Priv, Smm, Sse, Sse2,
    Svm, Xop,
};

#[rustfmt::skip]
static MNEMONICS: &[M] = &[
    // Arithmetic group: [opcode delta, spare, -].
    M("add", groups::ARITH, [0x00, 0, 0], 0, CAny),
    M("or",  groups::ARITH, [0x08, 1, 0], 0, CAny),
    M("adc", groups::ARITH, [0x10, 2, 0], 0, CAny),
    M("sbb", groups::ARITH, [0x18, 3, 0], 0, CAny),
    M("and", groups::ARITH, [0x20, 4, 0], 0, CAny),
    M("sub", groups::ARITH, [0x28, 5, 0], 0, CAny),
    M("xor", groups::ARITH, [0x30, 6, 0], 0, CAny),
    M("cmp", groups::ARITH, [0x38, 7, 0], 0, CAny),
    // F6 group: [spare, -, -].
    M("not",  groups::F6, [2, 0, 0], 0, CAny),
    M("neg",  groups::F6, [3, 0, 0], 0, CAny),
    M("mul",  groups::F6, [4, 0, 0], 0, CAny),
    M("div",  groups::F6, [6, 0, 0], 0, CAny),
    M("idiv", groups::F6, [7, 0, 0], 0, CAny),
    M("imul", groups::IMUL, [0, 0, 0], 0, CAny),
    // Shift group: [spare, -, -].
    M("rol", groups::SHIFT, [0, 0, 0], 0, CAny),
    M("ror", groups::SHIFT, [1, 0, 0], 0, CAny),
    M("rcl", groups::SHIFT, [2, 0, 0], 0, CAny),
    M("rcr", groups::SHIFT, [3, 0, 0], 0, CAny),
    M("shl", groups::SHIFT, [4, 0, 0], 0, CAny),
    M("sal", groups::SHIFT, [4, 0, 0], 0, CAny),
    M("shr", groups::SHIFT, [5, 0, 0], 0, CAny),
    M("sar", groups::SHIFT, [7, 0, 0], 0, CAny),
    M("test", groups::TEST, [0, 0, 0], 0, CAny),
    M("mov", groups::MOV, [0, 0, 0], 0, CAny),
    M("movsxd", groups::MOVSXD, [0, 0, 0], misc::ONLY_64, CAny),
    M("movzx", groups::MOVSZX, [0xB6, 0, 0], 0, I386),
    M("movsx", groups::MOVSZX, [0xBE, 0, 0], 0, I386),
    M("lea", groups::LEA, [0, 0, 0], 0, CAny),
    M("push", groups::PUSH, [0, 0, 0], 0, CAny),
    M("pop", groups::POP, [0, 0, 0], 0, CAny),
    // inc/dec: [short-form delta, spare, -].
    M("inc", groups::INCDEC, [0x00, 0, 0], 0, CAny),
    M("dec", groups::INCDEC, [0x08, 1, 0], 0, CAny),
    M("xchg", groups::XCHG, [0, 0, 0], 0, CAny),
    M("jmp", groups::JMP, [0, 0, 0], 0, CAny),
    M("call", groups::CALL, [0, 0, 0], 0, CAny),
    M("jcxz", groups::JCXZ, [16, 0, 0], misc::NOT_64, CAny),
    M("jecxz", groups::JCXZ, [32, 0, 0], 0, I386),
    M("jrcxz", groups::JCXZ, [64, 0, 0], misc::ONLY_64, CAny),
    // loop: [opcode delta, -, -].
    M("loopne", groups::LOOP, [0, 0, 0], 0, CAny),
    M("loopnz", groups::LOOP, [0, 0, 0], 0, CAny),
    M("loope",  groups::LOOP, [1, 0, 0], 0, CAny),
    M("loopz",  groups::LOOP, [1, 0, 0], 0, CAny),
    M("loop",   groups::LOOP, [2, 0, 0], 0, CAny),
    M("ret",  groups::RET, [0, 0, 0], 0, CAny),
    M("retn", groups::RET, [0, 0, 0], 0, CAny),
    M("retf", groups::RETF, [0, 0, 0], 0, CAny),
    M("int", groups::INT, [0, 0, 0], 0, CAny),
    M("in",  groups::IN, [0, 0, 0], 0, CAny),
    M("out", groups::OUT, [0, 0, 0], 0, CAny),
    M("bswap", groups::BSWAP, [0, 0, 0], 0, I486),
    M("cmpxchg", groups::CMPXCHG, [0xB0, 0, 0], 0, I486),
    M("xadd",    groups::CMPXCHG, [0xC0, 0, 0], 0, I486),
    // One-byte opcodes: [opcode, opersize, def64 opersize].
    M("nop",   groups::ONEBYTE, [0x90, 0, 0], 0, CAny),
    M("hlt",   groups::ONEBYTE, [0xF4, 0, 0], 0, Priv),
    M("clc",   groups::ONEBYTE, [0xF8, 0, 0], 0, CAny),
    M("stc",   groups::ONEBYTE, [0xF9, 0, 0], 0, CAny),
    M("cmc",   groups::ONEBYTE, [0xF5, 0, 0], 0, CAny),
    M("cli",   groups::ONEBYTE, [0xFA, 0, 0], 0, Priv),
    M("sti",   groups::ONEBYTE, [0xFB, 0, 0], 0, Priv),
    M("cld",   groups::ONEBYTE, [0xFC, 0, 0], 0, CAny),
    M("std",   groups::ONEBYTE, [0xFD, 0, 0], 0, CAny),
    M("cbw",   groups::ONEBYTE, [0x98, 16, 0], 0, CAny),
    M("cwde",  groups::ONEBYTE, [0x98, 32, 0], 0, I386),
    M("cdqe",  groups::ONEBYTE, [0x98, 64, 0], misc::ONLY_64, CAny),
    M("cwd",   groups::ONEBYTE, [0x99, 16, 0], 0, CAny),
    M("cdq",   groups::ONEBYTE, [0x99, 32, 0], 0, I386),
    M("cqo",   groups::ONEBYTE, [0x99, 64, 0], misc::ONLY_64, CAny),
    M("leave", groups::ONEBYTE, [0xC9, 0, 64], 0, I186),
    M("int3",  groups::ONEBYTE, [0xCC, 0, 0], 0, CAny),
    M("into",  groups::ONEBYTE, [0xCE, 0, 0], misc::NOT_64, CAny),
    M("iret",  groups::ONEBYTE, [0xCF, 0, 0], 0, CAny),
    M("iretd", groups::ONEBYTE, [0xCF, 32, 0], 0, I386),
    M("iretq", groups::ONEBYTE, [0xCF, 64, 0], misc::ONLY_64, CAny),
    M("pushf", groups::ONEBYTE, [0x9C, 0, 64], 0, CAny),
    M("popf",  groups::ONEBYTE, [0x9D, 0, 64], 0, CAny),
    M("pushfd", groups::ONEBYTE, [0x9C, 32, 0], misc::NOT_64, I386),
    M("popfd",  groups::ONEBYTE, [0x9D, 32, 0], misc::NOT_64, I386),
    M("pushfq", groups::ONEBYTE, [0x9C, 64, 64], misc::ONLY_64, CAny),
    M("popfq",  groups::ONEBYTE, [0x9D, 64, 64], misc::ONLY_64, CAny),
    M("xlatb", groups::ONEBYTE, [0xD7, 0, 0], 0, CAny),
    // String instructions.
    M("movsb", groups::ONEBYTE, [0xA4, 0, 0], 0, CAny),
    M("movsw", groups::ONEBYTE, [0xA5, 16, 0], 0, CAny),
    M("movsq", groups::ONEBYTE, [0xA5, 64, 0], misc::ONLY_64, CAny),
    M("cmpsb", groups::ONEBYTE, [0xA6, 0, 0], 0, CAny),
    M("cmpsw", groups::ONEBYTE, [0xA7, 16, 0], 0, CAny),
    M("cmpsq", groups::ONEBYTE, [0xA7, 64, 0], misc::ONLY_64, CAny),
    M("stosb", groups::ONEBYTE, [0xAA, 0, 0], 0, CAny),
    M("stosw", groups::ONEBYTE, [0xAB, 16, 0], 0, CAny),
    M("stosd", groups::ONEBYTE, [0xAB, 32, 0], 0, I386),
    M("stosq", groups::ONEBYTE, [0xAB, 64, 0], misc::ONLY_64, CAny),
    M("lodsb", groups::ONEBYTE, [0xAC, 0, 0], 0, CAny),
    M("lodsw", groups::ONEBYTE, [0xAD, 16, 0], 0, CAny),
    M("lodsd", groups::ONEBYTE, [0xAD, 32, 0], 0, I386),
    M("lodsq", groups::ONEBYTE, [0xAD, 64, 0], misc::ONLY_64, CAny),
    M("scasb", groups::ONEBYTE, [0xAE, 0, 0], 0, CAny),
    M("scasw", groups::ONEBYTE, [0xAF, 16, 0], 0, CAny),
    M("scasd", groups::ONEBYTE, [0xAF, 32, 0], 0, I386),
    M("scasq", groups::ONEBYTE, [0xAF, 64, 0], misc::ONLY_64, CAny),
    M("insb",  groups::ONEBYTE, [0x6C, 0, 0], 0, I186),
    M("insw",  groups::ONEBYTE, [0x6D, 16, 0], 0, I186),
    M("insd",  groups::ONEBYTE, [0x6D, 32, 0], 0, I386),
    M("outsb", groups::ONEBYTE, [0x6E, 0, 0], 0, I186),
    M("outsw", groups::ONEBYTE, [0x6F, 16, 0], 0, I186),
    M("outsd", groups::ONEBYTE, [0x6F, 32, 0], 0, I386),
    M("pause", groups::ONEBYTE_PREFIX, [0xF3, 0x90, 0], 0, CAny),
    // Two-byte opcodes: [byte 0, byte 1, -].
    M("cpuid",  groups::TWOBYTE, [0x0F, 0xA2, 0], 0, I486),
    M("rdtsc",  groups::TWOBYTE, [0x0F, 0x31, 0], 0, I586),
    M("rdmsr",  groups::TWOBYTE, [0x0F, 0x32, 0], 0, Priv),
    M("wrmsr",  groups::TWOBYTE, [0x0F, 0x30, 0], 0, Priv),
    M("rsm",    groups::TWOBYTE, [0x0F, 0xAA, 0], misc::NOT_64, Smm),
    M("ud2",    groups::TWOBYTE, [0x0F, 0x0B, 0], 0, I686),
    M("emms",   groups::TWOBYTE, [0x0F, 0x77, 0], 0, Mmx),
    M("clts",   groups::TWOBYTE, [0x0F, 0x06, 0], 0, Priv),
    M("invd",   groups::TWOBYTE, [0x0F, 0x08, 0], 0, Priv),
    M("wbinvd", groups::TWOBYTE, [0x0F, 0x09, 0], 0, Priv),
    M("syscall", groups::TWOBYTE, [0x0F, 0x05, 0], 0, CpuFeature::Amd),
    M("sysret",  groups::TWOBYTE, [0x0F, 0x07, 0], 0, Priv),
    // Three-byte opcodes: [byte 0, byte 1, byte 2].
    M("vmmcall", groups::THREEBYTE, [0x0F, 0x01, 0xD9], 0, Svm),
    M("vmload",  groups::THREEBYTE, [0x0F, 0x01, 0xDA], 0, Svm),
    M("vmsave",  groups::THREEBYTE, [0x0F, 0x01, 0xDB], 0, Svm),
    M("stgi",    groups::THREEBYTE, [0x0F, 0x01, 0xDC], 0, Svm),
    M("clgi",    groups::THREEBYTE, [0x0F, 0x01, 0xDD], 0, Svm),
    M("skinit",  groups::SKINIT, [0, 0, 0], 0, Svm),
    M("invlpga", groups::INVLPGA, [0, 0, 0], 0, Svm),
    // x87.
    M("fld",  groups::FLD, [0, 0, 0], 0, Fpu),
    M("fst",  groups::FST, [0, 0, 0], 0, Fpu),
    M("fstp", groups::FSTP, [0, 0, 0], 0, Fpu),
    // x87 arithmetic: [spare, -, -].
    M("fadd", groups::FARITH, [0, 0, 0], 0, Fpu),
    M("fmul", groups::FARITH, [1, 0, 0], 0, Fpu),
    // SSE moves: [prefix, opcode byte 1, -].
    M("movaps", groups::SSEMOV, [0x00, 0x28, 0], 0, Sse),
    M("movups", groups::SSEMOV, [0x00, 0x10, 0], 0, Sse),
    M("movapd", groups::SSEMOV, [0x66, 0x28, 0], 0, Sse2),
    M("movupd", groups::SSEMOV, [0x66, 0x10, 0], 0, Sse2),
    M("movss",  groups::SSEMOV, [0xF3, 0x10, 0], 0, Sse),
    M("movsd",  groups::MOVSD, [0, 0, 0], 0, CAny),
    // SSE arithmetic: [prefix, opcode byte 1, -].
    M("addps", groups::SSEARITH, [0x00, 0x58, 0], 0, Sse),
    M("addpd", groups::SSEARITH, [0x66, 0x58, 0], 0, Sse2),
    M("addss", groups::SSEARITH, [0xF3, 0x58, 0], 0, Sse),
    M("addsd", groups::SSEARITH, [0xF2, 0x58, 0], 0, Sse2),
    M("mulps", groups::SSEARITH, [0x00, 0x59, 0], 0, Sse),
    M("mulpd", groups::SSEARITH, [0x66, 0x59, 0], 0, Sse2),
    M("mulss", groups::SSEARITH, [0xF3, 0x59, 0], 0, Sse),
    M("mulsd", groups::SSEARITH, [0xF2, 0x59, 0], 0, Sse2),
    M("subps", groups::SSEARITH, [0x00, 0x5C, 0], 0, Sse),
    M("subpd", groups::SSEARITH, [0x66, 0x5C, 0], 0, Sse2),
    M("subss", groups::SSEARITH, [0xF3, 0x5C, 0], 0, Sse),
    M("subsd", groups::SSEARITH, [0xF2, 0x5C, 0], 0, Sse2),
    M("divps", groups::SSEARITH, [0x00, 0x5E, 0], 0, Sse),
    M("divpd", groups::SSEARITH, [0x66, 0x5E, 0], 0, Sse2),
    M("minps", groups::SSEARITH, [0x00, 0x5D, 0], 0, Sse),
    M("maxps", groups::SSEARITH, [0x00, 0x5F, 0], 0, Sse),
    M("sqrtps", groups::SSEARITH, [0x00, 0x51, 0], 0, Sse),
    M("andps", groups::SSEARITH, [0x00, 0x54, 0], 0, Sse),
    M("andpd", groups::SSEARITH, [0x66, 0x54, 0], 0, Sse2),
    M("orps",  groups::SSEARITH, [0x00, 0x56, 0], 0, Sse),
    M("orpd",  groups::SSEARITH, [0x66, 0x56, 0], 0, Sse2),
    M("xorps", groups::SSEARITH, [0x00, 0x57, 0], 0, Sse),
    M("xorpd", groups::SSEARITH, [0x66, 0x57, 0], 0, Sse2),
    M("ucomiss", groups::SSEARITH, [0x00, 0x2E, 0], 0, Sse),
    M("ucomisd", groups::SSEARITH, [0x66, 0x2E, 0], 0, Sse2),
    // SSE compares/shuffles with selector: [prefix, opcode byte 1, -].
    M("cmpps", groups::SSECMP_IMM, [0x00, 0xC2, 0], 0, Sse),
    M("cmppd", groups::SSECMP_IMM, [0x66, 0xC2, 0], 0, Sse2),
    M("cmpss", groups::SSECMP_IMM, [0xF3, 0xC2, 0], 0, Sse),
    M("shufps", groups::SSECMP_IMM, [0x00, 0xC6, 0], 0, Sse),
    M("shufpd", groups::SSECMP_IMM, [0x66, 0xC6, 0], 0, Sse2),
    // MMX/SSE2 integer: [opcode byte 1, -, -].
    M("pxor",    groups::MMXSSE2, [0xEF, 0, 0], 0, Mmx),
    M("pand",    groups::MMXSSE2, [0xDB, 0, 0], 0, Mmx),
    M("pandn",   groups::MMXSSE2, [0xDF, 0, 0], 0, Mmx),
    M("por",     groups::MMXSSE2, [0xEB, 0, 0], 0, Mmx),
    M("paddb",   groups::MMXSSE2, [0xFC, 0, 0], 0, Mmx),
    M("paddw",   groups::MMXSSE2, [0xFD, 0, 0], 0, Mmx),
    M("paddd",   groups::MMXSSE2, [0xFE, 0, 0], 0, Mmx),
    M("psubb",   groups::MMXSSE2, [0xF8, 0, 0], 0, Mmx),
    M("psubw",   groups::MMXSSE2, [0xF9, 0, 0], 0, Mmx),
    M("psubd",   groups::MMXSSE2, [0xFA, 0, 0], 0, Mmx),
    M("pcmpeqb", groups::MMXSSE2, [0x74, 0, 0], 0, Mmx),
    M("pcmpeqw", groups::MMXSSE2, [0x75, 0, 0], 0, Mmx),
    M("pcmpeqd", groups::MMXSSE2, [0x76, 0, 0], 0, Mmx),
];

/// AVX/XOP mnemonics are all tagged `ONLY_AVX`.
#[rustfmt::skip]
static AVX_MNEMONICS: &[M] = &[
    // Three-operand arithmetic: [opcode byte 1, xmm tag, ymm tag].
    M("vaddps", groups::AVXARITH, [0x58, 0xC0, 0xC4], 0, Avx),
    M("vaddpd", groups::AVXARITH, [0x58, 0xC1, 0xC5], 0, Avx),
    M("vmulps", groups::AVXARITH, [0x59, 0xC0, 0xC4], 0, Avx),
    M("vmulpd", groups::AVXARITH, [0x59, 0xC1, 0xC5], 0, Avx),
    M("vsubps", groups::AVXARITH, [0x5C, 0xC0, 0xC4], 0, Avx),
    M("vsubpd", groups::AVXARITH, [0x5C, 0xC1, 0xC5], 0, Avx),
    M("vdivps", groups::AVXARITH, [0x5E, 0xC0, 0xC4], 0, Avx),
    M("vdivpd", groups::AVXARITH, [0x5E, 0xC1, 0xC5], 0, Avx),
    M("vminps", groups::AVXARITH, [0x5D, 0xC0, 0xC4], 0, Avx),
    M("vmaxps", groups::AVXARITH, [0x5F, 0xC0, 0xC4], 0, Avx),
    M("vandps", groups::AVXARITH, [0x54, 0xC0, 0xC4], 0, Avx),
    M("vandpd", groups::AVXARITH, [0x54, 0xC1, 0xC5], 0, Avx),
    M("vorps",  groups::AVXARITH, [0x56, 0xC0, 0xC4], 0, Avx),
    M("vxorps", groups::AVXARITH, [0x57, 0xC0, 0xC4], 0, Avx),
    M("vxorpd", groups::AVXARITH, [0x57, 0xC1, 0xC5], 0, Avx),
    // Shifts by immediate: [opcode byte 1, spare, -].
    M("vpsrlw", groups::VPSHIFT_IMM, [0x71, 2, 0], 0, Avx),
    M("vpsrld", groups::VPSHIFT_IMM, [0x72, 2, 0], 0, Avx),
    M("vpsrlq", groups::VPSHIFT_IMM, [0x73, 2, 0], 0, Avx),
    M("vpsraw", groups::VPSHIFT_IMM, [0x71, 4, 0], 0, Avx),
    M("vpsrad", groups::VPSHIFT_IMM, [0x72, 4, 0], 0, Avx),
    M("vpsllw", groups::VPSHIFT_IMM, [0x71, 6, 0], 0, Avx),
    M("vpslld", groups::VPSHIFT_IMM, [0x72, 6, 0], 0, Avx),
    M("vpsllq", groups::VPSHIFT_IMM, [0x73, 6, 0], 0, Avx),
    // Two-operand moves: [opcode byte 1, xmm tag, ymm tag].
    M("vmovaps", groups::AVXMOV, [0x28, 0xC0, 0xC4], 0, Avx),
    M("vmovups", groups::AVXMOV, [0x10, 0xC0, 0xC4], 0, Avx),
    M("vmovapd", groups::AVXMOV, [0x28, 0xC1, 0xC5], 0, Avx),
    M("vmovupd", groups::AVXMOV, [0x10, 0xC1, 0xC5], 0, Avx),
    M("vgatherdps", groups::VGATHERDPS, [0, 0, 0], 0, Avx2),
    M("vgatherdpd", groups::VGATHERDPD, [0, 0, 0], 0, Avx2),
    // is4 forms: [opcode byte 2, -, -].
    M("vblendvps", groups::VBLENDV, [0x4A, 0, 0], 0, Avx),
    M("vblendvpd", groups::VBLENDV, [0x4B, 0, 0], 0, Avx),
    M("vpermil2ps", groups::VPERMIL2, [0x48, 0, 0], 0, Xop),
    M("vpermil2pd", groups::VPERMIL2, [0x49, 0, 0], 0, Xop),
    // [VEX tag, -, -].
    M("vzeroupper", groups::VZERO, [0xC0, 0, 0], 0, Avx),
    M("vzeroall",   groups::VZERO, [0xC4, 0, 0], 0, Avx),
    // XOP: [opcode byte 1, xmm tag, ymm tag].
    M("vfrczps", groups::VFRCZ, [0x80, 0x80, 0x84], 0, Xop),
    M("vfrczpd", groups::VFRCZ, [0x81, 0x80, 0x84], 0, Xop),
];

/// Condition-code spellings shared by jcc/setcc/cmovcc.
static CONDITIONS: &[(&str, u8)] = &[
    ("o", 0), ("no", 1),
    ("b", 2), ("c", 2), ("nae", 2),
    ("ae", 3), ("nb", 3), ("nc", 3),
    ("e", 4), ("z", 4),
    ("ne", 5), ("nz", 5),
    ("be", 6), ("na", 6),
    ("a", 7), ("nbe", 7),
    ("s", 8), ("ns", 9),
    ("p", 10), ("pe", 10),
    ("np", 11), ("po", 11),
    ("l", 12), ("nge", 12),
    ("ge", 13), ("nl", 13),
    ("le", 14), ("ng", 14),
    ("g", 15), ("nle", 15),
];

type KeywordMap = FxHashMap<String, Keyword>;

fn insert_insn(map: &mut KeywordMap, m: &M, misc_extra: u8, suffix: u16) {
    let M(name, group, mod_data, misc_flags, cpu) = *m;
    map.insert(
        name.to_string(),
        Keyword::Insn(InsnKeyword {
            group,
            mod_data,
            misc_flags: misc_flags | misc_extra,
            cpu: [cpu, CAny, CAny],
            suffix,
        }),
    );
}

fn insert_conditionals(map: &mut KeywordMap, suffix: u16) {
    for &(cond, cc) in CONDITIONS {
        map.insert(
            format!("j{cond}"),
            Keyword::Insn(InsnKeyword {
                group: groups::JCC,
                mod_data: [cc, 0, 0],
                misc_flags: 0,
                cpu: [CAny, CAny, CAny],
                suffix,
            }),
        );
        map.insert(
            format!("set{cond}"),
            Keyword::Insn(InsnKeyword {
                group: groups::SETCC,
                mod_data: [cc, 0, 0],
                misc_flags: 0,
                cpu: [I386, CAny, CAny],
                suffix,
            }),
        );
        map.insert(
            format!("cmov{cond}"),
            Keyword::Insn(InsnKeyword {
                group: groups::CMOVCC,
                mod_data: [cc, 0, 0],
                misc_flags: 0,
                cpu: [I686, CAny, CAny],
                suffix,
            }),
        );
    }
}

fn insert_registers(map: &mut KeywordMap) {
    let mut add = |reg: Reg| {
        map.insert(reg.to_string(), Keyword::Reg(reg));
    };
    for num in 0..8 {
        add(Reg::new(RegClass::Reg8, num));
        add(Reg::new(RegClass::Fpu, num));
        add(Reg::new(RegClass::Mmx, num));
        add(Reg::new(RegClass::Dr, num));
        add(Reg::new(RegClass::Tr, num));
    }
    for num in 0..16 {
        add(Reg::new(RegClass::Reg16, num));
        add(Reg::new(RegClass::Reg32, num));
        add(Reg::new(RegClass::Reg64, num));
        add(Reg::new(RegClass::Xmm, num));
        add(Reg::new(RegClass::Ymm, num));
        add(Reg::new(RegClass::Cr, num));
        if num >= 4 {
            // spl/bpl/sil/dil and r8b..r15b.
            add(Reg::new(RegClass::Reg8x, num));
        }
    }
    add(Reg::new(RegClass::Rip, 0));
    // st0 also has the "st" spelling.
    map.insert("st".to_string(), Keyword::Reg(Reg::new(RegClass::Fpu, 0)));

    for segreg in [
        SegReg::Es,
        SegReg::Cs,
        SegReg::Ss,
        SegReg::Ds,
        SegReg::Fs,
        SegReg::Gs,
    ] {
        map.insert(segreg.to_string(), Keyword::SegReg(segreg));
    }
}

fn insert_prefixes(map: &mut KeywordMap) {
    let mut add = |name: &str, prefix: Prefix, only64: bool| {
        map.insert(name.to_string(), Keyword::Prefix { prefix, only64 });
    };
    add("lock", Prefix::LOCK, false);
    add("rep", Prefix::REP, false);
    add("repe", Prefix::REP, false);
    add("repz", Prefix::REP, false);
    add("repne", Prefix::REPNE, false);
    add("repnz", Prefix::REPNE, false);
    add("xacquire", Prefix::XACQUIRE, false);
    add("xrelease", Prefix::XRELEASE, false);
    add("a16", Prefix::addr_size(16), false);
    add("a32", Prefix::addr_size(32), false);
    add("a64", Prefix::addr_size(64), true);
    add("o16", Prefix::oper_size(16), false);
    add("o32", Prefix::oper_size(32), false);
    add("o64", Prefix::oper_size(64), true);
    add("addr16", Prefix::addr_size(16), false);
    add("addr32", Prefix::addr_size(32), false);
    add("data16", Prefix::oper_size(16), false);
    add("data32", Prefix::oper_size(32), false);
}

fn insert_target_mods(map: &mut KeywordMap) {
    map.insert("near".to_string(), Keyword::TargetMod(TargetMod::Near));
    map.insert("short".to_string(), Keyword::TargetMod(TargetMod::Short));
    map.insert("far".to_string(), Keyword::TargetMod(TargetMod::Far));
    map.insert("to".to_string(), Keyword::TargetMod(TargetMod::To));
}

fn base_map(suffix: u16) -> KeywordMap {
    let mut map = KeywordMap::default();
    for m in MNEMONICS {
        insert_insn(&mut map, m, 0, suffix);
    }
    for m in AVX_MNEMONICS {
        insert_insn(&mut map, m, misc::ONLY_AVX, suffix);
    }
    insert_conditionals(&mut map, suffix);
    insert_registers(&mut map);
    insert_prefixes(&mut map);
    insert_target_mods(&mut map);
    map
}

fn nasm_map() -> &'static KeywordMap {
    static MAP: OnceLock<KeywordMap> = OnceLock::new();
    MAP.get_or_init(|| base_map(0))
}

fn gas_map() -> &'static KeywordMap {
    static MAP: OnceLock<KeywordMap> = OnceLock::new();
    MAP.get_or_init(|| {
        let mut map = base_map(gas::WEAK);
        // Derive suffixed spellings from the suffix flags of each form.
        let mut suffixed: Vec<(String, Keyword)> = Vec::new();
        for (name, keyword) in &map {
            let Keyword::Insn(kw) = keyword else { continue };
            for &(letter, flag) in &[
                ('b', gas::SUF_B),
                ('w', gas::SUF_W),
                ('l', gas::SUF_L),
                ('q', gas::SUF_Q),
                ('s', gas::SUF_S),
            ] {
                let available = kw.group.iter().any(|form| {
                    form.gas_flags & flag != 0
                        && form.gas_flags & gas::GAS_ILLEGAL == 0
                });
                if available {
                    let mut kw = kw.clone();
                    kw.suffix = flag;
                    suffixed.push((format!("{name}{letter}"), Keyword::Insn(kw)));
                }
            }
        }
        for (name, keyword) in suffixed {
            map.entry(name).or_insert(keyword);
        }
        map
    })
}

/// Look `name` up in the dialect's keyword map, case-insensitively.
pub fn lookup(name: &str, dialect: Dialect) -> Option<&'static Keyword> {
    let map = match dialect {
        Dialect::Nasm => nasm_map(),
        Dialect::Gas => gas_map(),
    };
    if name.chars().any(|c| c.is_ascii_uppercase()) {
        map.get(&name.to_ascii_lowercase())
    } else {
        map.get(name)
    }
}

/// Recognise a mnemonic and build an empty instruction for it, applying
/// the mode and CPU gates. `Ok(None)` means the identifier is not a
/// mnemonic.
pub fn parse_insn(
    name: &str,
    config: &Config,
    loc: SourceLoc,
) -> EncodeResult<Option<Insn>> {
    match lookup(name, config.dialect) {
        Some(Keyword::Insn(kw)) => {
            check_insn_gates(kw.misc_flags, &kw.cpu, config, loc)?;
            Ok(Some(Insn::new(
                kw.group,
                kw.mod_data,
                kw.misc_flags,
                kw.suffix,
                config,
                loc,
            )))
        }
        _ => Ok(None),
    }
}

/// Recognise a prefix keyword, applying the per-mode legality rules.
pub fn parse_prefix(
    name: &str,
    config: &Config,
    loc: SourceLoc,
) -> EncodeResult<Option<Prefix>> {
    match lookup(name, config.dialect) {
        Some(Keyword::Prefix { prefix, only64 }) => {
            if *only64 && config.mode_bits != 64 {
                return Err(Error::new(ErrorKind::PrefixIn64Mode, loc));
            }
            if config.mode_bits == 64 {
                // The 64-bit defaults cannot be re-stated by override.
                if prefix.kind == PrefixKind::OperSize && prefix.value == 32 {
                    return Err(Error::new(ErrorKind::InsnInvalid64Mode, loc));
                }
                if prefix.kind == PrefixKind::AddrSize && prefix.value == 16 {
                    return Err(Error::new(ErrorKind::InsnInvalid64Mode, loc));
                }
            }
            Ok(Some(*prefix))
        }
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn case_insensitive() {
        assert!(matches!(
            lookup("MOV", Dialect::Nasm),
            Some(Keyword::Insn(_))
        ));
        assert!(matches!(
            lookup("Rax", Dialect::Nasm),
            Some(Keyword::Reg(_))
        ));
        assert!(lookup("bogus", Dialect::Nasm).is_none());
    }

    #[test]
    fn registers_resolve() {
        let Some(Keyword::Reg(reg)) = lookup("r13", Dialect::Nasm) else {
            panic!("r13 must resolve to a register");
        };
        assert_eq!(reg.class(), RegClass::Reg64);
        assert_eq!(reg.num(), 13);
        assert!(matches!(
            lookup("gs", Dialect::Nasm),
            Some(Keyword::SegReg(SegReg::Gs))
        ));
    }

    #[test]
    fn gas_suffixed_names() {
        let Some(Keyword::Insn(kw)) = lookup("movl", Dialect::Gas) else {
            panic!("movl must resolve in GAS mode");
        };
        assert_eq!(kw.suffix, gas::SUF_L);
        // The unsuffixed spelling is weak.
        let Some(Keyword::Insn(kw)) = lookup("mov", Dialect::Gas) else {
            panic!("mov must resolve in GAS mode");
        };
        assert_eq!(kw.suffix, gas::WEAK);
        // NASM never sees suffixed names.
        assert!(lookup("movl", Dialect::Nasm).is_none());
    }

    #[test]
    fn mode_gates() {
        let config32 = Config::new(32);
        assert!(matches!(
            parse_insn("jrcxz", &config32, SourceLoc::default()),
            Err(Error { kind: ErrorKind::InsnIn64Mode, .. })
        ));
        let config64 = Config::new(64);
        assert!(matches!(
            parse_insn("into", &config64, SourceLoc::default()),
            Err(Error { kind: ErrorKind::InsnInvalid64Mode, .. })
        ));
        assert!(parse_insn("mov", &config64, SourceLoc::default())
            .unwrap()
            .is_some());
    }

    #[test]
    fn prefix_gates() {
        let config32 = Config::new(32);
        assert!(matches!(
            parse_prefix("a64", &config32, SourceLoc::default()),
            Err(Error { kind: ErrorKind::PrefixIn64Mode, .. })
        ));
        let config64 = Config::new(64);
        assert!(parse_prefix("lock", &config64, SourceLoc::default())
            .unwrap()
            .is_some());
        assert!(parse_prefix("a16", &config64, SourceLoc::default()).is_err());
    }
}
