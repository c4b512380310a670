//! The instruction form groups, one static slice per mnemonic family.
//!
//! Rows are searched in order; keep cheaper encodings first. Shared groups
//! read their per-mnemonic bytes through the row's modifier recipe: the
//! keyword table supplies `mod_data`, the row says what each byte means.

use super::Action as A;
use super::Modifier as M;
use super::OpSize::{Any, S128, S16, S256, S32, S64, S8, S80, SBits};
use super::OpType as T;
use super::PostAction as P;
use super::TmodGate as TM;
use super::{gas, misc, op, InsnForm};
use crate::features::CpuFeature::{
    Any as CAny, Avx, Avx2, Fpu, I186, I386, I486, I686, Mmx, Obs, Priv, Sse,
    Sse2, Svm, Xop,
};

const NO_OPS: &[super::OperandPattern] = &[];

/// add/or/adc/sbb/and/sub/xor/cmp.
///
/// `mod_data = [opcode delta, spare, -]`.
pub static ARITH: &[InsnForm] = &[
    // A-register short forms.
    InsnForm::new(1, [0x04, 0, 0], 0, &[
        op(T::Areg, S8, A::None),
        op(T::Imm, S8, A::Imm).relaxed(),
    ])
    .modifiers([M::Op0Add, M::Gap, M::None])
    .gas(gas::SUF_B),
    // Explicit byte immediates.
    InsnForm::new(1, [0x83, 0, 0], 0, &[
        op(T::Rm, S16, A::Ea),
        op(T::Imm, S8, A::SImm),
    ])
    .modifiers([M::Gap, M::SpAdd, M::None])
    .opersize(16)
    .gas(gas::SUF_W),
    InsnForm::new(1, [0x83, 0, 0], 0, &[
        op(T::Rm, S32, A::Ea),
        op(T::Imm, S8, A::SImm),
    ])
    .modifiers([M::Gap, M::SpAdd, M::None])
    .opersize(32)
    .gas(gas::SUF_L),
    InsnForm::new(1, [0x83, 0, 0], 0, &[
        op(T::Rm, S64, A::Ea),
        op(T::Imm, S8, A::SImm),
    ])
    .modifiers([M::Gap, M::SpAdd, M::None])
    .opersize(64)
    .misc(misc::ONLY_64)
    .gas(gas::SUF_Q),
    InsnForm::new(1, [0x05, 0, 0], 0, &[
        op(T::Areg, S16, A::None),
        op(T::Imm, S16, A::Imm).relaxed(),
    ])
    .modifiers([M::Op0Add, M::Gap, M::None])
    .opersize(16)
    .gas(gas::SUF_W),
    InsnForm::new(1, [0x05, 0, 0], 0, &[
        op(T::Areg, S32, A::None),
        op(T::Imm, S32, A::Imm).relaxed(),
    ])
    .modifiers([M::Op0Add, M::Gap, M::None])
    .opersize(32)
    .gas(gas::SUF_L),
    InsnForm::new(1, [0x05, 0, 0], 0, &[
        op(T::Areg, S64, A::None),
        op(T::Imm, S32, A::SImm).relaxed(),
    ])
    .modifiers([M::Op0Add, M::Gap, M::None])
    .opersize(64)
    .misc(misc::ONLY_64)
    .gas(gas::SUF_Q),
    // Generic immediate forms; imm8-range primary with full-width
    // alternate.
    InsnForm::new(1, [0x80, 0, 0], 0, &[
        op(T::Rm, S8, A::Ea),
        op(T::Imm, S8, A::Imm).relaxed(),
    ])
    .modifiers([M::Gap, M::SpAdd, M::None])
    .gas(gas::SUF_B),
    InsnForm::new(1, [0x83, 0x81, 0], 0, &[
        op(T::Rm, S16, A::Ea),
        op(T::Imm, S16, A::SImm).relaxed().post(P::SImm8),
    ])
    .modifiers([M::Gap, M::SpAdd, M::None])
    .opersize(16)
    .gas(gas::SUF_W),
    InsnForm::new(1, [0x83, 0x81, 0], 0, &[
        op(T::Rm, S32, A::Ea),
        op(T::Imm, S32, A::SImm).relaxed().post(P::SImm8),
    ])
    .modifiers([M::Gap, M::SpAdd, M::None])
    .opersize(32)
    .gas(gas::SUF_L),
    InsnForm::new(1, [0x83, 0x81, 0], 0, &[
        op(T::Rm, S64, A::Ea),
        op(T::Imm, S32, A::SImm).relaxed().post(P::SImm8),
    ])
    .modifiers([M::Gap, M::SpAdd, M::None])
    .opersize(64)
    .misc(misc::ONLY_64)
    .gas(gas::SUF_Q),
    // Register to r/m and back.
    InsnForm::new(1, [0x00, 0, 0], 0, &[
        op(T::Rm, S8, A::Ea).relaxed(),
        op(T::Reg, S8, A::Spare),
    ])
    .modifiers([M::Op0Add, M::Gap, M::None])
    .gas(gas::SUF_B),
    InsnForm::new(1, [0x01, 0, 0], 0, &[
        op(T::Rm, S16, A::Ea).relaxed(),
        op(T::Reg, S16, A::Spare),
    ])
    .modifiers([M::Op0Add, M::Gap, M::None])
    .opersize(16)
    .gas(gas::SUF_W),
    InsnForm::new(1, [0x01, 0, 0], 0, &[
        op(T::Rm, S32, A::Ea).relaxed(),
        op(T::Reg, S32, A::Spare),
    ])
    .modifiers([M::Op0Add, M::Gap, M::None])
    .opersize(32)
    .gas(gas::SUF_L),
    InsnForm::new(1, [0x01, 0, 0], 0, &[
        op(T::Rm, S64, A::Ea).relaxed(),
        op(T::Reg, S64, A::Spare),
    ])
    .modifiers([M::Op0Add, M::Gap, M::None])
    .opersize(64)
    .misc(misc::ONLY_64)
    .gas(gas::SUF_Q),
    InsnForm::new(1, [0x02, 0, 0], 0, &[
        op(T::Reg, S8, A::Spare),
        op(T::Rm, S8, A::Ea).relaxed(),
    ])
    .modifiers([M::Op0Add, M::Gap, M::None])
    .gas(gas::SUF_B),
    InsnForm::new(1, [0x03, 0, 0], 0, &[
        op(T::Reg, S16, A::Spare),
        op(T::Rm, S16, A::Ea).relaxed(),
    ])
    .modifiers([M::Op0Add, M::Gap, M::None])
    .opersize(16)
    .gas(gas::SUF_W),
    InsnForm::new(1, [0x03, 0, 0], 0, &[
        op(T::Reg, S32, A::Spare),
        op(T::Rm, S32, A::Ea).relaxed(),
    ])
    .modifiers([M::Op0Add, M::Gap, M::None])
    .opersize(32)
    .gas(gas::SUF_L),
    InsnForm::new(1, [0x03, 0, 0], 0, &[
        op(T::Reg, S64, A::Spare),
        op(T::Rm, S64, A::Ea).relaxed(),
    ])
    .modifiers([M::Op0Add, M::Gap, M::None])
    .opersize(64)
    .misc(misc::ONLY_64)
    .gas(gas::SUF_Q),
];

/// not/neg/mul/div/idiv. `mod_data = [spare, -, -]`.
pub static F6: &[InsnForm] = &[
    InsnForm::new(1, [0xF6, 0, 0], 0, &[op(T::Rm, S8, A::Ea)])
        .modifiers([M::SpAdd, M::None, M::None])
        .gas(gas::SUF_B),
    InsnForm::new(1, [0xF7, 0, 0], 0, &[op(T::Rm, S16, A::Ea)])
        .modifiers([M::SpAdd, M::None, M::None])
        .opersize(16)
        .gas(gas::SUF_W),
    InsnForm::new(1, [0xF7, 0, 0], 0, &[op(T::Rm, S32, A::Ea)])
        .modifiers([M::SpAdd, M::None, M::None])
        .opersize(32)
        .gas(gas::SUF_L),
    InsnForm::new(1, [0xF7, 0, 0], 0, &[op(T::Rm, S64, A::Ea)])
        .modifiers([M::SpAdd, M::None, M::None])
        .opersize(64)
        .misc(misc::ONLY_64)
        .gas(gas::SUF_Q),
];

/// imul, including the two- and three-operand forms.
pub static IMUL: &[InsnForm] = &[
    InsnForm::new(1, [0xF6, 0, 0], 5, &[op(T::Rm, S8, A::Ea)]).gas(gas::SUF_B),
    InsnForm::new(1, [0xF7, 0, 0], 5, &[op(T::Rm, S16, A::Ea)])
        .opersize(16)
        .gas(gas::SUF_W),
    InsnForm::new(1, [0xF7, 0, 0], 5, &[op(T::Rm, S32, A::Ea)])
        .opersize(32)
        .gas(gas::SUF_L),
    InsnForm::new(1, [0xF7, 0, 0], 5, &[op(T::Rm, S64, A::Ea)])
        .opersize(64)
        .misc(misc::ONLY_64)
        .gas(gas::SUF_Q),
    InsnForm::new(2, [0x0F, 0xAF, 0], 0, &[
        op(T::Reg, S16, A::Spare),
        op(T::Rm, S16, A::Ea).relaxed(),
    ])
    .opersize(16)
    .cpu([I386, CAny, CAny])
    .gas(gas::SUF_W),
    InsnForm::new(2, [0x0F, 0xAF, 0], 0, &[
        op(T::Reg, S32, A::Spare),
        op(T::Rm, S32, A::Ea).relaxed(),
    ])
    .opersize(32)
    .cpu([I386, CAny, CAny])
    .gas(gas::SUF_L),
    InsnForm::new(2, [0x0F, 0xAF, 0], 0, &[
        op(T::Reg, S64, A::Spare),
        op(T::Rm, S64, A::Ea).relaxed(),
    ])
    .opersize(64)
    .misc(misc::ONLY_64)
    .gas(gas::SUF_Q),
    // reg, rm, imm.
    InsnForm::new(1, [0x6B, 0x69, 0], 0, &[
        op(T::Reg, S16, A::Spare),
        op(T::Rm, S16, A::Ea).relaxed(),
        op(T::Imm, S16, A::SImm).relaxed().post(P::SImm8),
    ])
    .opersize(16)
    .cpu([I186, CAny, CAny])
    .gas(gas::SUF_W),
    InsnForm::new(1, [0x6B, 0x69, 0], 0, &[
        op(T::Reg, S32, A::Spare),
        op(T::Rm, S32, A::Ea).relaxed(),
        op(T::Imm, S32, A::SImm).relaxed().post(P::SImm8),
    ])
    .opersize(32)
    .cpu([I186, CAny, CAny])
    .gas(gas::SUF_L),
    InsnForm::new(1, [0x6B, 0x69, 0], 0, &[
        op(T::Reg, S64, A::Spare),
        op(T::Rm, S64, A::Ea).relaxed(),
        op(T::Imm, S32, A::SImm).relaxed().post(P::SImm8),
    ])
    .opersize(64)
    .misc(misc::ONLY_64)
    .gas(gas::SUF_Q),
    // reg, imm: the register is both destination and source.
    InsnForm::new(1, [0x6B, 0x69, 0], 0, &[
        op(T::Reg, S16, A::SpareEa),
        op(T::Imm, S16, A::SImm).relaxed().post(P::SImm8),
    ])
    .opersize(16)
    .cpu([I186, CAny, CAny])
    .gas(gas::SUF_W),
    InsnForm::new(1, [0x6B, 0x69, 0], 0, &[
        op(T::Reg, S32, A::SpareEa),
        op(T::Imm, S32, A::SImm).relaxed().post(P::SImm8),
    ])
    .opersize(32)
    .cpu([I186, CAny, CAny])
    .gas(gas::SUF_L),
    InsnForm::new(1, [0x6B, 0x69, 0], 0, &[
        op(T::Reg, S64, A::SpareEa),
        op(T::Imm, S32, A::SImm).relaxed().post(P::SImm8),
    ])
    .opersize(64)
    .misc(misc::ONLY_64)
    .gas(gas::SUF_Q),
];

/// rol/ror/rcl/rcr/shl/shr/sar. `mod_data = [spare, -, -]`.
pub static SHIFT: &[InsnForm] = &[
    InsnForm::new(1, [0xD0, 0, 0], 0, &[
        op(T::Rm, S8, A::Ea),
        op(T::Imm1, Any, A::None),
    ])
    .modifiers([M::SpAdd, M::None, M::None])
    .gas(gas::SUF_B),
    InsnForm::new(1, [0xD2, 0, 0], 0, &[
        op(T::Rm, S8, A::Ea),
        op(T::Creg, S8, A::None),
    ])
    .modifiers([M::SpAdd, M::None, M::None])
    .gas(gas::SUF_B),
    InsnForm::new(1, [0xC0, 0, 0], 0, &[
        op(T::Rm, S8, A::Ea),
        op(T::Imm, S8, A::Imm).relaxed(),
    ])
    .modifiers([M::SpAdd, M::None, M::None])
    .cpu([I186, CAny, CAny])
    .gas(gas::SUF_B),
    InsnForm::new(1, [0xD1, 0, 0], 0, &[
        op(T::Rm, S16, A::Ea),
        op(T::Imm1, Any, A::None),
    ])
    .modifiers([M::SpAdd, M::None, M::None])
    .opersize(16)
    .gas(gas::SUF_W),
    InsnForm::new(1, [0xD3, 0, 0], 0, &[
        op(T::Rm, S16, A::Ea),
        op(T::Creg, S8, A::None),
    ])
    .modifiers([M::SpAdd, M::None, M::None])
    .opersize(16)
    .gas(gas::SUF_W),
    InsnForm::new(1, [0xC1, 0, 0], 0, &[
        op(T::Rm, S16, A::Ea),
        op(T::Imm, S8, A::Imm).relaxed(),
    ])
    .modifiers([M::SpAdd, M::None, M::None])
    .opersize(16)
    .cpu([I186, CAny, CAny])
    .gas(gas::SUF_W),
    InsnForm::new(1, [0xD1, 0, 0], 0, &[
        op(T::Rm, S32, A::Ea),
        op(T::Imm1, Any, A::None),
    ])
    .modifiers([M::SpAdd, M::None, M::None])
    .opersize(32)
    .gas(gas::SUF_L),
    InsnForm::new(1, [0xD3, 0, 0], 0, &[
        op(T::Rm, S32, A::Ea),
        op(T::Creg, S8, A::None),
    ])
    .modifiers([M::SpAdd, M::None, M::None])
    .opersize(32)
    .gas(gas::SUF_L),
    InsnForm::new(1, [0xC1, 0, 0], 0, &[
        op(T::Rm, S32, A::Ea),
        op(T::Imm, S8, A::Imm).relaxed(),
    ])
    .modifiers([M::SpAdd, M::None, M::None])
    .opersize(32)
    .cpu([I186, CAny, CAny])
    .gas(gas::SUF_L),
    InsnForm::new(1, [0xD1, 0, 0], 0, &[
        op(T::Rm, S64, A::Ea),
        op(T::Imm1, Any, A::None),
    ])
    .modifiers([M::SpAdd, M::None, M::None])
    .opersize(64)
    .misc(misc::ONLY_64)
    .gas(gas::SUF_Q),
    InsnForm::new(1, [0xD3, 0, 0], 0, &[
        op(T::Rm, S64, A::Ea),
        op(T::Creg, S8, A::None),
    ])
    .modifiers([M::SpAdd, M::None, M::None])
    .opersize(64)
    .misc(misc::ONLY_64)
    .gas(gas::SUF_Q),
    InsnForm::new(1, [0xC1, 0, 0], 0, &[
        op(T::Rm, S64, A::Ea),
        op(T::Imm, S8, A::Imm).relaxed(),
    ])
    .modifiers([M::SpAdd, M::None, M::None])
    .opersize(64)
    .misc(misc::ONLY_64)
    .gas(gas::SUF_Q),
];

pub static TEST: &[InsnForm] = &[
    InsnForm::new(1, [0xA8, 0, 0], 0, &[
        op(T::Areg, S8, A::None),
        op(T::Imm, S8, A::Imm).relaxed(),
    ])
    .gas(gas::SUF_B),
    InsnForm::new(1, [0xA9, 0, 0], 0, &[
        op(T::Areg, S16, A::None),
        op(T::Imm, S16, A::Imm).relaxed(),
    ])
    .opersize(16)
    .gas(gas::SUF_W),
    InsnForm::new(1, [0xA9, 0, 0], 0, &[
        op(T::Areg, S32, A::None),
        op(T::Imm, S32, A::Imm).relaxed(),
    ])
    .opersize(32)
    .gas(gas::SUF_L),
    InsnForm::new(1, [0xA9, 0, 0], 0, &[
        op(T::Areg, S64, A::None),
        op(T::Imm, S32, A::SImm).relaxed(),
    ])
    .opersize(64)
    .misc(misc::ONLY_64)
    .gas(gas::SUF_Q),
    InsnForm::new(1, [0xF6, 0, 0], 0, &[
        op(T::Rm, S8, A::Ea),
        op(T::Imm, S8, A::Imm).relaxed(),
    ])
    .gas(gas::SUF_B),
    InsnForm::new(1, [0xF7, 0, 0], 0, &[
        op(T::Rm, S16, A::Ea),
        op(T::Imm, S16, A::Imm).relaxed(),
    ])
    .opersize(16)
    .gas(gas::SUF_W),
    InsnForm::new(1, [0xF7, 0, 0], 0, &[
        op(T::Rm, S32, A::Ea),
        op(T::Imm, S32, A::Imm).relaxed(),
    ])
    .opersize(32)
    .gas(gas::SUF_L),
    InsnForm::new(1, [0xF7, 0, 0], 0, &[
        op(T::Rm, S64, A::Ea),
        op(T::Imm, S32, A::SImm).relaxed(),
    ])
    .opersize(64)
    .misc(misc::ONLY_64)
    .gas(gas::SUF_Q),
    InsnForm::new(1, [0x84, 0, 0], 0, &[
        op(T::Rm, S8, A::Ea).relaxed(),
        op(T::Reg, S8, A::Spare),
    ])
    .gas(gas::SUF_B),
    InsnForm::new(1, [0x85, 0, 0], 0, &[
        op(T::Rm, S16, A::Ea).relaxed(),
        op(T::Reg, S16, A::Spare),
    ])
    .opersize(16)
    .gas(gas::SUF_W),
    InsnForm::new(1, [0x85, 0, 0], 0, &[
        op(T::Rm, S32, A::Ea).relaxed(),
        op(T::Reg, S32, A::Spare),
    ])
    .opersize(32)
    .gas(gas::SUF_L),
    InsnForm::new(1, [0x85, 0, 0], 0, &[
        op(T::Rm, S64, A::Ea).relaxed(),
        op(T::Reg, S64, A::Spare),
    ])
    .opersize(64)
    .misc(misc::ONLY_64)
    .gas(gas::SUF_Q),
    InsnForm::new(1, [0x84, 0, 0], 0, &[
        op(T::Reg, S8, A::Spare),
        op(T::Rm, S8, A::Ea).relaxed(),
    ])
    .gas(gas::SUF_B),
    InsnForm::new(1, [0x85, 0, 0], 0, &[
        op(T::Reg, S16, A::Spare),
        op(T::Rm, S16, A::Ea).relaxed(),
    ])
    .opersize(16)
    .gas(gas::SUF_W),
    InsnForm::new(1, [0x85, 0, 0], 0, &[
        op(T::Reg, S32, A::Spare),
        op(T::Rm, S32, A::Ea).relaxed(),
    ])
    .opersize(32)
    .gas(gas::SUF_L),
    InsnForm::new(1, [0x85, 0, 0], 0, &[
        op(T::Reg, S64, A::Spare),
        op(T::Rm, S64, A::Ea).relaxed(),
    ])
    .opersize(64)
    .misc(misc::ONLY_64)
    .gas(gas::SUF_Q),
];

/// mov in all its glory.
pub static MOV: &[InsnForm] = &[
    // Direct offset (moffs) forms.
    InsnForm::new(1, [0xA0, 0, 0], 0, &[
        op(T::Areg, S8, A::None),
        op(T::MemOffs, S8, A::Ea).relaxed(),
    ])
    .gas(gas::GAS_ILLEGAL),
    // The 16-bit direct-offset forms pin 16-bit addressing; an explicit
    // address-size override is discarded.
    InsnForm::new(1, [0xA1, 0, 0], 0, &[
        op(T::Areg, S16, A::None),
        op(T::MemOffs, S16, A::Ea).relaxed().post(P::A16),
    ])
    .opersize(16)
    .gas(gas::GAS_ILLEGAL),
    InsnForm::new(1, [0xA1, 0, 0], 0, &[
        op(T::Areg, S32, A::None),
        op(T::MemOffs, S32, A::Ea).relaxed(),
    ])
    .opersize(32)
    .gas(gas::GAS_ILLEGAL),
    InsnForm::new(1, [0xA1, 0, 0], 0, &[
        op(T::Areg, S64, A::None),
        op(T::MemOffs, S64, A::Ea).relaxed().eas64(),
    ])
    .opersize(64)
    .misc(misc::ONLY_64)
    .gas(gas::GAS_ILLEGAL),
    InsnForm::new(1, [0xA2, 0, 0], 0, &[
        op(T::MemOffs, S8, A::Ea).relaxed(),
        op(T::Areg, S8, A::None),
    ])
    .gas(gas::GAS_ILLEGAL),
    InsnForm::new(1, [0xA3, 0, 0], 0, &[
        op(T::MemOffs, S16, A::Ea).relaxed().post(P::A16),
        op(T::Areg, S16, A::None),
    ])
    .opersize(16)
    .gas(gas::GAS_ILLEGAL),
    InsnForm::new(1, [0xA3, 0, 0], 0, &[
        op(T::MemOffs, S32, A::Ea).relaxed(),
        op(T::Areg, S32, A::None),
    ])
    .opersize(32)
    .gas(gas::GAS_ILLEGAL),
    InsnForm::new(1, [0xA3, 0, 0], 0, &[
        op(T::MemOffs, S64, A::Ea).relaxed().eas64(),
        op(T::Areg, S64, A::None),
    ])
    .opersize(64)
    .misc(misc::ONLY_64)
    .gas(gas::GAS_ILLEGAL),
    // A-register loads/stores that may shrink to the moffs form under a
    // 32-bit address override in 64-bit mode.
    InsnForm::new(1, [0x8A, 0xA0, 0], 0, &[
        op(T::Areg, S8, A::Spare),
        op(T::Rm, S8, A::Ea).relaxed().post(P::ShortMov),
    ])
    .gas(gas::SUF_B),
    InsnForm::new(1, [0x8B, 0xA1, 0], 0, &[
        op(T::Areg, S16, A::Spare),
        op(T::Rm, S16, A::Ea).relaxed().post(P::ShortMov),
    ])
    .opersize(16)
    .gas(gas::SUF_W),
    InsnForm::new(1, [0x8B, 0xA1, 0], 0, &[
        op(T::Areg, S32, A::Spare),
        op(T::Rm, S32, A::Ea).relaxed().post(P::ShortMov),
    ])
    .opersize(32)
    .gas(gas::SUF_L),
    InsnForm::new(1, [0x8B, 0xA1, 0], 0, &[
        op(T::Areg, S64, A::Spare),
        op(T::Rm, S64, A::Ea).relaxed().post(P::ShortMov),
    ])
    .opersize(64)
    .misc(misc::ONLY_64)
    .gas(gas::SUF_Q),
    InsnForm::new(1, [0x88, 0xA2, 0], 0, &[
        op(T::Rm, S8, A::Ea).relaxed().post(P::ShortMov),
        op(T::Areg, S8, A::Spare),
    ])
    .gas(gas::SUF_B),
    InsnForm::new(1, [0x89, 0xA3, 0], 0, &[
        op(T::Rm, S16, A::Ea).relaxed().post(P::ShortMov),
        op(T::Areg, S16, A::Spare),
    ])
    .opersize(16)
    .gas(gas::SUF_W),
    InsnForm::new(1, [0x89, 0xA3, 0], 0, &[
        op(T::Rm, S32, A::Ea).relaxed().post(P::ShortMov),
        op(T::Areg, S32, A::Spare),
    ])
    .opersize(32)
    .gas(gas::SUF_L),
    InsnForm::new(1, [0x89, 0xA3, 0], 0, &[
        op(T::Rm, S64, A::Ea).relaxed().post(P::ShortMov),
        op(T::Areg, S64, A::Spare),
    ])
    .opersize(64)
    .misc(misc::ONLY_64)
    .gas(gas::SUF_Q),
    // General register moves.
    InsnForm::new(1, [0x88, 0, 0], 0, &[
        op(T::Rm, S8, A::Ea).relaxed(),
        op(T::Reg, S8, A::Spare),
    ])
    .gas(gas::SUF_B),
    InsnForm::new(1, [0x89, 0, 0], 0, &[
        op(T::Rm, S16, A::Ea).relaxed(),
        op(T::Reg, S16, A::Spare),
    ])
    .opersize(16)
    .gas(gas::SUF_W),
    InsnForm::new(1, [0x89, 0, 0], 0, &[
        op(T::Rm, S32, A::Ea).relaxed(),
        op(T::Reg, S32, A::Spare),
    ])
    .opersize(32)
    .gas(gas::SUF_L),
    InsnForm::new(1, [0x89, 0, 0], 0, &[
        op(T::Rm, S64, A::Ea).relaxed(),
        op(T::Reg, S64, A::Spare),
    ])
    .opersize(64)
    .misc(misc::ONLY_64)
    .gas(gas::SUF_Q),
    InsnForm::new(1, [0x8A, 0, 0], 0, &[
        op(T::Reg, S8, A::Spare),
        op(T::Rm, S8, A::Ea).relaxed(),
    ])
    .gas(gas::SUF_B),
    InsnForm::new(1, [0x8B, 0, 0], 0, &[
        op(T::Reg, S16, A::Spare),
        op(T::Rm, S16, A::Ea).relaxed(),
    ])
    .opersize(16)
    .gas(gas::SUF_W),
    InsnForm::new(1, [0x8B, 0, 0], 0, &[
        op(T::Reg, S32, A::Spare),
        op(T::Rm, S32, A::Ea).relaxed(),
    ])
    .opersize(32)
    .gas(gas::SUF_L),
    InsnForm::new(1, [0x8B, 0, 0], 0, &[
        op(T::Reg, S64, A::Spare),
        op(T::Rm, S64, A::Ea).relaxed(),
    ])
    .opersize(64)
    .misc(misc::ONLY_64)
    .gas(gas::SUF_Q),
    // Segment register moves.
    InsnForm::new(1, [0x8C, 0, 0], 0, &[
        op(T::Rm, S16, A::Ea).relaxed(),
        op(T::SegReg, Any, A::Spare),
    ])
    .gas(gas::SUF_W | gas::SUF_L),
    InsnForm::new(1, [0x8E, 0, 0], 0, &[
        op(T::SegReg, Any, A::Spare),
        op(T::Rm, S16, A::Ea).relaxed(),
    ])
    .gas(gas::SUF_W | gas::SUF_L),
    // Immediate loads.
    InsnForm::new(1, [0xB0, 0, 0], 0, &[
        op(T::Reg, S8, A::Op0Add),
        op(T::Imm, S8, A::Imm).relaxed(),
    ])
    .gas(gas::SUF_B),
    InsnForm::new(1, [0xB8, 0, 0], 0, &[
        op(T::Reg, S16, A::Op0Add),
        op(T::Imm, S16, A::Imm).relaxed(),
    ])
    .opersize(16)
    .gas(gas::SUF_W),
    InsnForm::new(1, [0xB8, 0, 0], 0, &[
        op(T::Reg, S32, A::Op0Add),
        op(T::Imm, S32, A::Imm).relaxed(),
    ])
    .opersize(32)
    .gas(gas::SUF_L),
    // A 64-bit immediate that shrinks to the sign-extended 32-bit C7
    // form when it fits.
    InsnForm::new(1, [0xB8, 0xC7, 0], 0, &[
        op(T::Reg, S64, A::Op0Add),
        op(T::Imm, S64, A::Imm).relaxed().post(P::SImm32Avail),
    ])
    .opersize(64)
    .misc(misc::ONLY_64)
    .gas(gas::SUF_Q),
    InsnForm::new(1, [0xC6, 0, 0], 0, &[
        op(T::Rm, S8, A::Ea),
        op(T::Imm, S8, A::Imm).relaxed(),
    ])
    .gas(gas::SUF_B),
    InsnForm::new(1, [0xC7, 0, 0], 0, &[
        op(T::Rm, S16, A::Ea),
        op(T::Imm, S16, A::Imm).relaxed(),
    ])
    .opersize(16)
    .gas(gas::SUF_W),
    InsnForm::new(1, [0xC7, 0, 0], 0, &[
        op(T::Rm, S32, A::Ea),
        op(T::Imm, S32, A::Imm).relaxed(),
    ])
    .opersize(32)
    .gas(gas::SUF_L),
    InsnForm::new(1, [0xC7, 0, 0], 0, &[
        op(T::Rm, S64, A::Ea),
        op(T::Imm, S32, A::SImm).relaxed(),
    ])
    .opersize(64)
    .misc(misc::ONLY_64)
    .gas(gas::SUF_Q),
    // Control, debug, and test registers.
    InsnForm::new(2, [0x0F, 0x22, 0], 0, &[
        op(T::CrReg, Any, A::Spare),
        op(T::Reg, S32, A::Ea),
    ])
    .misc(misc::NOT_64)
    .cpu([I486, Priv, CAny]),
    InsnForm::new(2, [0x0F, 0x22, 0], 0, &[
        op(T::CrReg, Any, A::Spare),
        op(T::Reg, S64, A::Ea),
    ])
    .misc(misc::ONLY_64)
    .cpu([Priv, CAny, CAny]),
    InsnForm::new(2, [0x0F, 0x20, 0], 0, &[
        op(T::Reg, S32, A::Ea),
        op(T::CrReg, Any, A::Spare),
    ])
    .misc(misc::NOT_64)
    .cpu([I486, Priv, CAny]),
    InsnForm::new(2, [0x0F, 0x20, 0], 0, &[
        op(T::Reg, S64, A::Ea),
        op(T::CrReg, Any, A::Spare),
    ])
    .misc(misc::ONLY_64)
    .cpu([Priv, CAny, CAny]),
    InsnForm::new(2, [0x0F, 0x23, 0], 0, &[
        op(T::DrReg, Any, A::Spare),
        op(T::Reg, S32, A::Ea),
    ])
    .misc(misc::NOT_64)
    .cpu([I386, Priv, CAny]),
    InsnForm::new(2, [0x0F, 0x23, 0], 0, &[
        op(T::DrReg, Any, A::Spare),
        op(T::Reg, S64, A::Ea),
    ])
    .misc(misc::ONLY_64)
    .cpu([Priv, CAny, CAny]),
    InsnForm::new(2, [0x0F, 0x21, 0], 0, &[
        op(T::Reg, S32, A::Ea),
        op(T::DrReg, Any, A::Spare),
    ])
    .misc(misc::NOT_64)
    .cpu([I386, Priv, CAny]),
    InsnForm::new(2, [0x0F, 0x21, 0], 0, &[
        op(T::Reg, S64, A::Ea),
        op(T::DrReg, Any, A::Spare),
    ])
    .misc(misc::ONLY_64)
    .cpu([Priv, CAny, CAny]),
    InsnForm::new(2, [0x0F, 0x26, 0], 0, &[
        op(T::TrReg, Any, A::Spare),
        op(T::Reg, S32, A::Ea),
    ])
    .misc(misc::NOT_64)
    .cpu([I486, Obs, Priv]),
    InsnForm::new(2, [0x0F, 0x24, 0], 0, &[
        op(T::Reg, S32, A::Ea),
        op(T::TrReg, Any, A::Spare),
    ])
    .misc(misc::NOT_64)
    .cpu([I486, Obs, Priv]),
];

/// movsxd (64-bit only).
pub static MOVSXD: &[InsnForm] = &[InsnForm::new(1, [0x63, 0, 0], 0, &[
    op(T::Reg, S64, A::Spare),
    op(T::Rm, S32, A::Ea),
])
.opersize(64)
.misc(misc::ONLY_64)
.gas(gas::SUF_L)];

/// movzx / movsx. `mod_data = [opcode byte 1 base, -, -]` (0xB6 or 0xBE).
pub static MOVSZX: &[InsnForm] = &[
    InsnForm::new(2, [0x0F, 0x00, 0], 0, &[
        op(T::Reg, S16, A::Spare),
        op(T::Rm, S8, A::Ea),
    ])
    .modifiers([M::Op1Add, M::None, M::None])
    .opersize(16)
    .cpu([I386, CAny, CAny])
    .gas(gas::SUF_B),
    InsnForm::new(2, [0x0F, 0x00, 0], 0, &[
        op(T::Reg, S32, A::Spare),
        op(T::Rm, S8, A::Ea),
    ])
    .modifiers([M::Op1Add, M::None, M::None])
    .opersize(32)
    .cpu([I386, CAny, CAny])
    .gas(gas::SUF_B),
    InsnForm::new(2, [0x0F, 0x00, 0], 0, &[
        op(T::Reg, S64, A::Spare),
        op(T::Rm, S8, A::Ea),
    ])
    .modifiers([M::Op1Add, M::None, M::None])
    .opersize(64)
    .misc(misc::ONLY_64)
    .gas(gas::SUF_B),
    InsnForm::new(2, [0x0F, 0x01, 0], 0, &[
        op(T::Reg, S32, A::Spare),
        op(T::Rm, S16, A::Ea),
    ])
    .modifiers([M::Op1Add, M::None, M::None])
    .opersize(32)
    .cpu([I386, CAny, CAny])
    .gas(gas::SUF_W),
    InsnForm::new(2, [0x0F, 0x01, 0], 0, &[
        op(T::Reg, S64, A::Spare),
        op(T::Rm, S16, A::Ea),
    ])
    .modifiers([M::Op1Add, M::None, M::None])
    .opersize(64)
    .misc(misc::ONLY_64)
    .gas(gas::SUF_W),
];

pub static LEA: &[InsnForm] = &[
    InsnForm::new(1, [0x8D, 0, 0], 0, &[
        op(T::Reg, S16, A::Spare),
        op(T::Mem, Any, A::Ea).relaxed(),
    ])
    .opersize(16)
    .gas(gas::SUF_W),
    InsnForm::new(1, [0x8D, 0, 0], 0, &[
        op(T::Reg, S32, A::Spare),
        op(T::Mem, Any, A::Ea).relaxed(),
    ])
    .opersize(32)
    .gas(gas::SUF_L),
    InsnForm::new(1, [0x8D, 0, 0], 0, &[
        op(T::Reg, S64, A::Spare),
        op(T::Mem, Any, A::Ea).relaxed(),
    ])
    .opersize(64)
    .misc(misc::ONLY_64)
    .gas(gas::SUF_Q),
];

pub static PUSH: &[InsnForm] = &[
    InsnForm::new(1, [0x50, 0, 0], 0, &[op(T::Reg, S16, A::Op0Add)])
        .opersize(16)
        .gas(gas::SUF_W),
    InsnForm::new(1, [0x50, 0, 0], 0, &[op(T::Reg, S32, A::Op0Add)])
        .misc(misc::NOT_64)
        .opersize(32)
        .gas(gas::SUF_L),
    InsnForm::new(1, [0x50, 0, 0], 0, &[op(T::Reg, S64, A::Op0Add)])
        .misc(misc::ONLY_64)
        .opersize(64)
        .def64(64)
        .gas(gas::SUF_Q),
    InsnForm::new(1, [0xFF, 0, 0], 6, &[op(T::Rm, S16, A::Ea)])
        .opersize(16)
        .gas(gas::SUF_W),
    InsnForm::new(1, [0xFF, 0, 0], 6, &[op(T::Rm, S32, A::Ea)])
        .misc(misc::NOT_64)
        .opersize(32)
        .gas(gas::SUF_L),
    InsnForm::new(1, [0xFF, 0, 0], 6, &[op(T::Rm, S64, A::Ea)])
        .misc(misc::ONLY_64)
        .opersize(64)
        .def64(64)
        .gas(gas::SUF_Q),
    InsnForm::new(1, [0x6A, 0, 0], 0, &[op(T::Imm, S8, A::SImm)])
        .cpu([I186, CAny, CAny])
        .def64(64),
    InsnForm::new(1, [0x6A, 0x68, 0], 0, &[
        op(T::Imm, SBits, A::SImm).relaxed().post(P::SImm8),
    ])
    .misc(misc::NOT_64)
    .cpu([I186, CAny, CAny]),
    // 64-bit pushes still take at most a 32-bit immediate.
    InsnForm::new(1, [0x6A, 0x68, 0], 0, &[
        op(T::Imm, S32, A::SImm).relaxed().post(P::SImm8),
    ])
    .misc(misc::ONLY_64)
    .def64(64),
    InsnForm::new(1, [0x0E, 0, 0], 0, &[op(T::Cs, Any, A::None)])
        .misc(misc::NOT_64),
    InsnForm::new(1, [0x16, 0, 0], 0, &[op(T::Ss, Any, A::None)])
        .misc(misc::NOT_64),
    InsnForm::new(1, [0x1E, 0, 0], 0, &[op(T::Ds, Any, A::None)])
        .misc(misc::NOT_64),
    InsnForm::new(1, [0x06, 0, 0], 0, &[op(T::Es, Any, A::None)])
        .misc(misc::NOT_64),
    InsnForm::new(2, [0x0F, 0xA0, 0], 0, &[op(T::Fs, Any, A::None)])
        .cpu([I386, CAny, CAny]),
    InsnForm::new(2, [0x0F, 0xA8, 0], 0, &[op(T::Gs, Any, A::None)])
        .cpu([I386, CAny, CAny]),
];

pub static POP: &[InsnForm] = &[
    InsnForm::new(1, [0x58, 0, 0], 0, &[op(T::Reg, S16, A::Op0Add)])
        .opersize(16)
        .gas(gas::SUF_W),
    InsnForm::new(1, [0x58, 0, 0], 0, &[op(T::Reg, S32, A::Op0Add)])
        .misc(misc::NOT_64)
        .opersize(32)
        .gas(gas::SUF_L),
    InsnForm::new(1, [0x58, 0, 0], 0, &[op(T::Reg, S64, A::Op0Add)])
        .misc(misc::ONLY_64)
        .opersize(64)
        .def64(64)
        .gas(gas::SUF_Q),
    InsnForm::new(1, [0x8F, 0, 0], 0, &[op(T::Rm, S16, A::Ea)])
        .opersize(16)
        .gas(gas::SUF_W),
    InsnForm::new(1, [0x8F, 0, 0], 0, &[op(T::Rm, S32, A::Ea)])
        .misc(misc::NOT_64)
        .opersize(32)
        .gas(gas::SUF_L),
    InsnForm::new(1, [0x8F, 0, 0], 0, &[op(T::Rm, S64, A::Ea)])
        .misc(misc::ONLY_64)
        .opersize(64)
        .def64(64)
        .gas(gas::SUF_Q),
    InsnForm::new(1, [0x17, 0, 0], 0, &[op(T::Ss, Any, A::None)])
        .misc(misc::NOT_64),
    InsnForm::new(1, [0x1F, 0, 0], 0, &[op(T::Ds, Any, A::None)])
        .misc(misc::NOT_64),
    InsnForm::new(1, [0x07, 0, 0], 0, &[op(T::Es, Any, A::None)])
        .misc(misc::NOT_64),
    InsnForm::new(2, [0x0F, 0xA1, 0], 0, &[op(T::Fs, Any, A::None)])
        .cpu([I386, CAny, CAny]),
    InsnForm::new(2, [0x0F, 0xA9, 0], 0, &[op(T::Gs, Any, A::None)])
        .cpu([I386, CAny, CAny]),
];

/// inc/dec. `mod_data = [short-form opcode delta, spare, -]`.
pub static INCDEC: &[InsnForm] = &[
    InsnForm::new(1, [0xFE, 0, 0], 0, &[op(T::Rm, S8, A::Ea)])
        .modifiers([M::Gap, M::SpAdd, M::None])
        .gas(gas::SUF_B),
    InsnForm::new(1, [0x40, 0, 0], 0, &[op(T::Reg, S16, A::Op0Add)])
        .modifiers([M::Op0Add, M::Gap, M::None])
        .misc(misc::NOT_64)
        .opersize(16)
        .gas(gas::SUF_W),
    InsnForm::new(1, [0x40, 0, 0], 0, &[op(T::Reg, S32, A::Op0Add)])
        .modifiers([M::Op0Add, M::Gap, M::None])
        .misc(misc::NOT_64)
        .opersize(32)
        .gas(gas::SUF_L),
    InsnForm::new(1, [0xFF, 0, 0], 0, &[op(T::Rm, S16, A::Ea)])
        .modifiers([M::Gap, M::SpAdd, M::None])
        .opersize(16)
        .gas(gas::SUF_W),
    InsnForm::new(1, [0xFF, 0, 0], 0, &[op(T::Rm, S32, A::Ea)])
        .modifiers([M::Gap, M::SpAdd, M::None])
        .opersize(32)
        .gas(gas::SUF_L),
    InsnForm::new(1, [0xFF, 0, 0], 0, &[op(T::Rm, S64, A::Ea)])
        .modifiers([M::Gap, M::SpAdd, M::None])
        .misc(misc::ONLY_64)
        .opersize(64)
        .gas(gas::SUF_Q),
];

pub static XCHG: &[InsnForm] = &[
    InsnForm::new(1, [0x90, 0, 0], 0, &[
        op(T::Areg, S16, A::None),
        op(T::Reg, S16, A::Op0Add),
    ])
    .opersize(16)
    .gas(gas::SUF_W),
    InsnForm::new(1, [0x90, 0, 0], 0, &[
        op(T::Reg, S16, A::Op0Add),
        op(T::Areg, S16, A::None),
    ])
    .opersize(16)
    .gas(gas::SUF_W),
    InsnForm::new(1, [0x90, 0, 0], 0, &[
        op(T::Areg, S32, A::None),
        op(T::Reg, S32, A::Op0Add),
    ])
    .opersize(32)
    .gas(gas::SUF_L),
    InsnForm::new(1, [0x90, 0, 0], 0, &[
        op(T::Reg, S32, A::Op0Add),
        op(T::Areg, S32, A::None),
    ])
    .opersize(32)
    .gas(gas::SUF_L),
    InsnForm::new(1, [0x90, 0, 0], 0, &[
        op(T::Areg, S64, A::None),
        op(T::Reg, S64, A::Op0Add),
    ])
    .opersize(64)
    .misc(misc::ONLY_64)
    .gas(gas::SUF_Q),
    InsnForm::new(1, [0x90, 0, 0], 0, &[
        op(T::Reg, S64, A::Op0Add),
        op(T::Areg, S64, A::None),
    ])
    .opersize(64)
    .misc(misc::ONLY_64)
    .gas(gas::SUF_Q),
    InsnForm::new(1, [0x86, 0, 0], 0, &[
        op(T::Rm, S8, A::Ea).relaxed(),
        op(T::Reg, S8, A::Spare),
    ])
    .gas(gas::SUF_B),
    InsnForm::new(1, [0x86, 0, 0], 0, &[
        op(T::Reg, S8, A::Spare),
        op(T::Rm, S8, A::Ea).relaxed(),
    ])
    .gas(gas::SUF_B),
    InsnForm::new(1, [0x87, 0, 0], 0, &[
        op(T::Rm, S16, A::Ea).relaxed(),
        op(T::Reg, S16, A::Spare),
    ])
    .opersize(16)
    .gas(gas::SUF_W),
    InsnForm::new(1, [0x87, 0, 0], 0, &[
        op(T::Reg, S16, A::Spare),
        op(T::Rm, S16, A::Ea).relaxed(),
    ])
    .opersize(16)
    .gas(gas::SUF_W),
    InsnForm::new(1, [0x87, 0, 0], 0, &[
        op(T::Rm, S32, A::Ea).relaxed(),
        op(T::Reg, S32, A::Spare),
    ])
    .opersize(32)
    .gas(gas::SUF_L),
    InsnForm::new(1, [0x87, 0, 0], 0, &[
        op(T::Reg, S32, A::Spare),
        op(T::Rm, S32, A::Ea).relaxed(),
    ])
    .opersize(32)
    .gas(gas::SUF_L),
    InsnForm::new(1, [0x87, 0, 0], 0, &[
        op(T::Rm, S64, A::Ea).relaxed(),
        op(T::Reg, S64, A::Spare),
    ])
    .opersize(64)
    .misc(misc::ONLY_64)
    .gas(gas::SUF_Q),
    InsnForm::new(1, [0x87, 0, 0], 0, &[
        op(T::Reg, S64, A::Spare),
        op(T::Rm, S64, A::Ea).relaxed(),
    ])
    .opersize(64)
    .misc(misc::ONLY_64)
    .gas(gas::SUF_Q),
];

/// Conditional jumps. `mod_data = [condition code, -, -]`.
pub static JCC: &[InsnForm] = &[
    InsnForm::new(1, [0x70, 0, 0], 0, &[
        op(T::Imm, Any, A::JmpRel).relaxed(),
    ])
    .modifiers([M::Op0Add, M::None, M::None]),
    InsnForm::new(1, [0x70, 0, 0], 0, &[
        op(T::Imm, Any, A::JmpRel).relaxed().tmod(TM::Short),
    ])
    .modifiers([M::Op0Add, M::None, M::None]),
    InsnForm::new(2, [0x0F, 0x80, 0], 0, &[
        op(T::Imm, Any, A::JmpRel).relaxed().tmod(TM::Near),
    ])
    .modifiers([M::Op1Add, M::None, M::None])
    .cpu([I386, CAny, CAny]),
];

/// jcxz/jecxz/jrcxz. `mod_data = [address size, -, -]`.
pub static JCXZ: &[InsnForm] = &[
    InsnForm::new(1, [0xE3, 0, 0], 0, &[
        op(T::Imm, Any, A::JmpRel).relaxed(),
    ])
    .modifiers([M::AdSizeR, M::None, M::None]),
    InsnForm::new(1, [0xE3, 0, 0], 0, &[
        op(T::Imm, Any, A::JmpRel).relaxed().tmod(TM::Short),
    ])
    .modifiers([M::AdSizeR, M::None, M::None]),
];

/// loop/loope/loopne. `mod_data = [opcode delta, -, -]`.
pub static LOOP: &[InsnForm] = &[
    InsnForm::new(1, [0xE0, 0, 0], 0, &[
        op(T::Imm, Any, A::JmpRel).relaxed(),
    ])
    .modifiers([M::Op0Add, M::None, M::None]),
    InsnForm::new(1, [0xE0, 0, 0], 0, &[
        op(T::Imm, Any, A::JmpRel).relaxed().tmod(TM::Short),
    ])
    .modifiers([M::Op0Add, M::None, M::None]),
    InsnForm::new(1, [0xE0, 0, 0], 0, &[
        op(T::Imm, Any, A::JmpRel).relaxed(),
        op(T::Creg, S16, A::AdSizeR),
    ])
    .modifiers([M::Op0Add, M::None, M::None])
    .misc(misc::NOT_64),
    InsnForm::new(1, [0xE0, 0, 0], 0, &[
        op(T::Imm, Any, A::JmpRel).relaxed(),
        op(T::Creg, S32, A::AdSizeR),
    ])
    .modifiers([M::Op0Add, M::None, M::None]),
    InsnForm::new(1, [0xE0, 0, 0], 0, &[
        op(T::Imm, Any, A::JmpRel).relaxed(),
        op(T::Creg, S64, A::AdSizeR),
    ])
    .modifiers([M::Op0Add, M::None, M::None])
    .misc(misc::ONLY_64),
];

pub static JMP: &[InsnForm] = &[
    InsnForm::new(1, [0xEB, 0, 0], 0, &[
        op(T::ImmNotSegOff, Any, A::JmpRel).relaxed(),
    ]),
    InsnForm::new(1, [0xEB, 0, 0], 0, &[
        op(T::Imm, Any, A::JmpRel).relaxed().tmod(TM::Short),
    ])
    .def64(64),
    InsnForm::new(1, [0xE9, 0, 0], 0, &[
        op(T::Imm, Any, A::JmpRel).relaxed().tmod(TM::Near),
    ])
    .def64(64),
    // Direct far jump.
    InsnForm::new(1, [0xEA, 0, 0], 0, &[
        op(T::Imm, Any, A::JmpFar).relaxed().tmod(TM::Far),
    ])
    .misc(misc::NOT_64),
    // Indirect.
    InsnForm::new(1, [0xFF, 0, 0], 4, &[op(T::Rm, S16, A::Ea)])
        .opersize(16)
        .gas(gas::SUF_W),
    InsnForm::new(1, [0xFF, 0, 0], 4, &[op(T::Rm, S32, A::Ea)])
        .misc(misc::NOT_64)
        .opersize(32)
        .gas(gas::SUF_L),
    InsnForm::new(1, [0xFF, 0, 0], 4, &[op(T::Rm, S64, A::Ea)])
        .misc(misc::ONLY_64)
        .opersize(64)
        .def64(64)
        .gas(gas::SUF_Q),
    InsnForm::new(1, [0xFF, 0, 0], 4, &[op(T::Rm, SBits, A::Ea).relaxed()])
        .def64(64),
    // Indirect far.
    InsnForm::new(1, [0xFF, 0, 0], 5, &[
        op(T::Mem, Any, A::Ea).relaxed().tmod(TM::Far),
    ]),
];

pub static CALL: &[InsnForm] = &[
    InsnForm::new(1, [0xE8, 0, 0], 0, &[
        op(T::ImmNotSegOff, Any, A::JmpRel).relaxed(),
    ]),
    InsnForm::new(1, [0xE8, 0, 0], 0, &[
        op(T::Imm, Any, A::JmpRel).relaxed().tmod(TM::Near),
    ])
    .def64(64),
    // There is no short call; accept the spelling so the jump encoder can
    // say so.
    InsnForm::new(0, [0, 0, 0], 0, &[
        op(T::Imm, Any, A::JmpRel).relaxed().tmod(TM::Short),
    ])
    .def64(64),
    // Direct far call.
    InsnForm::new(1, [0x9A, 0, 0], 0, &[
        op(T::Imm, Any, A::JmpFar).relaxed().tmod(TM::Far),
    ])
    .misc(misc::NOT_64),
    // Indirect.
    InsnForm::new(1, [0xFF, 0, 0], 2, &[op(T::Rm, S16, A::Ea)])
        .opersize(16)
        .gas(gas::SUF_W),
    InsnForm::new(1, [0xFF, 0, 0], 2, &[op(T::Rm, S32, A::Ea)])
        .misc(misc::NOT_64)
        .opersize(32)
        .gas(gas::SUF_L),
    InsnForm::new(1, [0xFF, 0, 0], 2, &[op(T::Rm, S64, A::Ea)])
        .misc(misc::ONLY_64)
        .opersize(64)
        .def64(64)
        .gas(gas::SUF_Q),
    InsnForm::new(1, [0xFF, 0, 0], 2, &[op(T::Rm, SBits, A::Ea).relaxed()])
        .def64(64),
    // Indirect far.
    InsnForm::new(1, [0xFF, 0, 0], 3, &[
        op(T::Mem, Any, A::Ea).relaxed().tmod(TM::Far),
    ]),
];

/// ret/retn. In 64-bit mode the operand size defaults to 64.
pub static RET: &[InsnForm] = &[
    InsnForm::new(1, [0xC3, 0, 0], 0, NO_OPS).def64(64),
    InsnForm::new(1, [0xC2, 0, 0], 0, &[op(T::Imm, S16, A::Imm).relaxed()])
        .def64(64),
];

pub static RETF: &[InsnForm] = &[
    InsnForm::new(1, [0xCB, 0, 0], 0, NO_OPS),
    InsnForm::new(1, [0xCA, 0, 0], 0, &[op(T::Imm, S16, A::Imm).relaxed()]),
];

/// One-byte opcodes. `mod_data = [opcode, opersize, def64 opersize]`.
pub static ONEBYTE: &[InsnForm] = &[InsnForm::new(1, [0, 0, 0], 0, NO_OPS)
    .modifiers([M::Op0Add, M::OpSizeR, M::DOpS64R])];

/// One-byte opcodes behind a mandatory prefix. `mod_data = [prefix,
/// opcode, -]`.
pub static ONEBYTE_PREFIX: &[InsnForm] = &[InsnForm::new(1, [0, 0, 0], 0, NO_OPS)
    .modifiers([M::PreAdd, M::Op0Add, M::None])];

/// Two-byte opcodes. `mod_data = [opcode byte 0, opcode byte 1, -]`.
pub static TWOBYTE: &[InsnForm] = &[InsnForm::new(2, [0, 0, 0], 0, NO_OPS)
    .modifiers([M::Op0Add, M::Op1Add, M::None])];

/// Three-byte opcodes. `mod_data = [byte 0, byte 1, byte 2]`.
pub static THREEBYTE: &[InsnForm] = &[InsnForm::new(3, [0, 0, 0], 0, NO_OPS)
    .modifiers([M::Op0Add, M::Op1Add, M::Op2Add])];

pub static INT: &[InsnForm] = &[InsnForm::new(1, [0xCD, 0, 0], 0, &[
    op(T::Imm, S8, A::Imm).relaxed(),
])];

pub static IN: &[InsnForm] = &[
    InsnForm::new(1, [0xE4, 0, 0], 0, &[
        op(T::Areg, S8, A::None),
        op(T::Imm, S8, A::Imm).relaxed(),
    ])
    .gas(gas::SUF_B),
    InsnForm::new(1, [0xE5, 0, 0], 0, &[
        op(T::Areg, S16, A::None),
        op(T::Imm, S8, A::Imm).relaxed(),
    ])
    .opersize(16)
    .gas(gas::SUF_W),
    InsnForm::new(1, [0xE5, 0, 0], 0, &[
        op(T::Areg, S32, A::None),
        op(T::Imm, S8, A::Imm).relaxed(),
    ])
    .opersize(32)
    .gas(gas::SUF_L),
    InsnForm::new(1, [0xEC, 0, 0], 0, &[
        op(T::Areg, S8, A::None),
        op(T::Dreg, S16, A::None),
    ])
    .gas(gas::SUF_B),
    InsnForm::new(1, [0xED, 0, 0], 0, &[
        op(T::Areg, S16, A::None),
        op(T::Dreg, S16, A::None),
    ])
    .opersize(16)
    .gas(gas::SUF_W),
    InsnForm::new(1, [0xED, 0, 0], 0, &[
        op(T::Areg, S32, A::None),
        op(T::Dreg, S16, A::None),
    ])
    .opersize(32)
    .gas(gas::SUF_L),
];

pub static OUT: &[InsnForm] = &[
    InsnForm::new(1, [0xE6, 0, 0], 0, &[
        op(T::Imm, S8, A::Imm).relaxed(),
        op(T::Areg, S8, A::None),
    ])
    .gas(gas::SUF_B),
    InsnForm::new(1, [0xE7, 0, 0], 0, &[
        op(T::Imm, S8, A::Imm).relaxed(),
        op(T::Areg, S16, A::None),
    ])
    .opersize(16)
    .gas(gas::SUF_W),
    InsnForm::new(1, [0xE7, 0, 0], 0, &[
        op(T::Imm, S8, A::Imm).relaxed(),
        op(T::Areg, S32, A::None),
    ])
    .opersize(32)
    .gas(gas::SUF_L),
    InsnForm::new(1, [0xEE, 0, 0], 0, &[
        op(T::Dreg, S16, A::None),
        op(T::Areg, S8, A::None),
    ])
    .gas(gas::SUF_B),
    InsnForm::new(1, [0xEF, 0, 0], 0, &[
        op(T::Dreg, S16, A::None),
        op(T::Areg, S16, A::None),
    ])
    .opersize(16)
    .gas(gas::SUF_W),
    InsnForm::new(1, [0xEF, 0, 0], 0, &[
        op(T::Dreg, S16, A::None),
        op(T::Areg, S32, A::None),
    ])
    .opersize(32)
    .gas(gas::SUF_L),
];

pub static BSWAP: &[InsnForm] = &[
    InsnForm::new(2, [0x0F, 0xC8, 0], 0, &[op(T::Reg, S32, A::Op1Add)])
        .opersize(32)
        .cpu([I486, CAny, CAny])
        .gas(gas::SUF_L),
    InsnForm::new(2, [0x0F, 0xC8, 0], 0, &[op(T::Reg, S64, A::Op1Add)])
        .opersize(64)
        .misc(misc::ONLY_64)
        .gas(gas::SUF_Q),
];

/// setcc. `mod_data = [condition code, -, -]`.
pub static SETCC: &[InsnForm] = &[InsnForm::new(2, [0x0F, 0x90, 0], 0, &[
    op(T::Rm, S8, A::Ea).relaxed(),
])
.modifiers([M::Op1Add, M::None, M::None])
.cpu([I386, CAny, CAny])
.gas(gas::SUF_B)];

/// cmovcc. `mod_data = [condition code, -, -]`.
pub static CMOVCC: &[InsnForm] = &[
    InsnForm::new(2, [0x0F, 0x40, 0], 0, &[
        op(T::Reg, S16, A::Spare),
        op(T::Rm, S16, A::Ea).relaxed(),
    ])
    .modifiers([M::Op1Add, M::None, M::None])
    .opersize(16)
    .cpu([I686, CAny, CAny])
    .gas(gas::SUF_W),
    InsnForm::new(2, [0x0F, 0x40, 0], 0, &[
        op(T::Reg, S32, A::Spare),
        op(T::Rm, S32, A::Ea).relaxed(),
    ])
    .modifiers([M::Op1Add, M::None, M::None])
    .opersize(32)
    .cpu([I686, CAny, CAny])
    .gas(gas::SUF_L),
    InsnForm::new(2, [0x0F, 0x40, 0], 0, &[
        op(T::Reg, S64, A::Spare),
        op(T::Rm, S64, A::Ea).relaxed(),
    ])
    .modifiers([M::Op1Add, M::None, M::None])
    .opersize(64)
    .misc(misc::ONLY_64)
    .gas(gas::SUF_Q),
];

/// cmpxchg / xadd. `mod_data = [opcode byte 1 base, -, -]`.
pub static CMPXCHG: &[InsnForm] = &[
    InsnForm::new(2, [0x0F, 0x00, 0], 0, &[
        op(T::Rm, S8, A::Ea).relaxed(),
        op(T::Reg, S8, A::Spare),
    ])
    .modifiers([M::Op1Add, M::None, M::None])
    .cpu([I486, CAny, CAny])
    .gas(gas::SUF_B),
    InsnForm::new(2, [0x0F, 0x01, 0], 0, &[
        op(T::Rm, S16, A::Ea).relaxed(),
        op(T::Reg, S16, A::Spare),
    ])
    .modifiers([M::Op1Add, M::None, M::None])
    .opersize(16)
    .cpu([I486, CAny, CAny])
    .gas(gas::SUF_W),
    InsnForm::new(2, [0x0F, 0x01, 0], 0, &[
        op(T::Rm, S32, A::Ea).relaxed(),
        op(T::Reg, S32, A::Spare),
    ])
    .modifiers([M::Op1Add, M::None, M::None])
    .opersize(32)
    .cpu([I486, CAny, CAny])
    .gas(gas::SUF_L),
    InsnForm::new(2, [0x0F, 0x01, 0], 0, &[
        op(T::Rm, S64, A::Ea).relaxed(),
        op(T::Reg, S64, A::Spare),
    ])
    .modifiers([M::Op1Add, M::None, M::None])
    .opersize(64)
    .misc(misc::ONLY_64)
    .gas(gas::SUF_Q),
];

/// x87 loads.
pub static FLD: &[InsnForm] = &[
    InsnForm::new(1, [0xD9, 0, 0], 0, &[op(T::Mem, S32, A::Ea)])
        .cpu([Fpu, CAny, CAny])
        .gas(gas::SUF_S),
    InsnForm::new(1, [0xDD, 0, 0], 0, &[op(T::Mem, S64, A::Ea)])
        .cpu([Fpu, CAny, CAny])
        .gas(gas::SUF_L),
    InsnForm::new(1, [0xDB, 0, 0], 5, &[op(T::Mem, S80, A::Ea)])
        .cpu([Fpu, CAny, CAny]),
    InsnForm::new(2, [0xD9, 0xC0, 0], 0, &[op(T::Reg, S80, A::Op1Add)])
        .cpu([Fpu, CAny, CAny]),
];

/// x87 store.
pub static FST: &[InsnForm] = &[
    InsnForm::new(1, [0xD9, 0, 0], 2, &[op(T::Mem, S32, A::Ea)])
        .cpu([Fpu, CAny, CAny])
        .gas(gas::SUF_S),
    InsnForm::new(1, [0xDD, 0, 0], 2, &[op(T::Mem, S64, A::Ea)])
        .cpu([Fpu, CAny, CAny])
        .gas(gas::SUF_L),
    InsnForm::new(2, [0xDD, 0xD0, 0], 0, &[op(T::Reg, S80, A::Op1Add)])
        .cpu([Fpu, CAny, CAny]),
];

/// x87 store-and-pop, including the 80-bit memory form.
pub static FSTP: &[InsnForm] = &[
    InsnForm::new(1, [0xD9, 0, 0], 3, &[op(T::Mem, S32, A::Ea)])
        .cpu([Fpu, CAny, CAny])
        .gas(gas::SUF_S),
    InsnForm::new(1, [0xDD, 0, 0], 3, &[op(T::Mem, S64, A::Ea)])
        .cpu([Fpu, CAny, CAny])
        .gas(gas::SUF_L),
    InsnForm::new(1, [0xDB, 0, 0], 7, &[op(T::Mem, S80, A::Ea)])
        .cpu([Fpu, CAny, CAny]),
    InsnForm::new(2, [0xDD, 0xD8, 0], 0, &[op(T::Reg, S80, A::Op1Add)])
        .cpu([Fpu, CAny, CAny]),
];

/// x87 arithmetic. `mod_data = [spare, -, -]`; the stack forms shift the
/// spare into the opcode's register field.
pub static FARITH: &[InsnForm] = &[
    InsnForm::new(1, [0xD8, 0, 0], 0, &[op(T::Mem, S32, A::Ea)])
        .modifiers([M::SpAdd, M::None, M::None])
        .cpu([Fpu, CAny, CAny])
        .gas(gas::SUF_S),
    InsnForm::new(1, [0xDC, 0, 0], 0, &[op(T::Mem, S64, A::Ea)])
        .modifiers([M::SpAdd, M::None, M::None])
        .cpu([Fpu, CAny, CAny])
        .gas(gas::SUF_L),
    InsnForm::new(2, [0xD8, 0xC0, 0], 0, &[
        op(T::St0, S80, A::None),
        op(T::Reg, S80, A::Op1Add),
    ])
    .modifiers([M::Op1AddSp, M::None, M::None])
    .cpu([Fpu, CAny, CAny]),
    // `to st(i)` form.
    InsnForm::new(2, [0xDC, 0xC0, 0], 0, &[
        op(T::Reg, S80, A::Op1Add).tmod(TM::To),
    ])
    .modifiers([M::Op1AddSp, M::None, M::None])
    .cpu([Fpu, CAny, CAny]),
    InsnForm::new(2, [0xDC, 0xC0, 0], 0, &[
        op(T::Reg, S80, A::Op1Add),
        op(T::St0, S80, A::None),
    ])
    .modifiers([M::Op1AddSp, M::None, M::None])
    .cpu([Fpu, CAny, CAny]),
];

/// SSE register moves (movaps and friends); the store opcode is the load
/// opcode plus one. `mod_data = [prefix byte, opcode byte 1, -]`.
pub static SSEMOV: &[InsnForm] = &[
    InsnForm::new(2, [0x0F, 0x00, 0], 0, &[
        op(T::SimdReg, S128, A::Spare),
        op(T::SimdRm, Any, A::Ea).relaxed(),
    ])
    .modifiers([M::PreAdd, M::Op1Add, M::None])
    .cpu([Sse, CAny, CAny]),
    InsnForm::new(2, [0x0F, 0x01, 0], 0, &[
        op(T::SimdRm, Any, A::Ea).relaxed(),
        op(T::SimdReg, S128, A::Spare),
    ])
    .modifiers([M::PreAdd, M::Op1Add, M::None])
    .cpu([Sse, CAny, CAny]),
];

/// SSE packed/scalar arithmetic. `mod_data = [prefix byte, opcode byte 1,
/// -]`.
pub static SSEARITH: &[InsnForm] = &[InsnForm::new(2, [0x0F, 0x00, 0], 0, &[
    op(T::SimdReg, S128, A::Spare),
    op(T::SimdRm, Any, A::Ea).relaxed(),
])
.modifiers([M::PreAdd, M::Op1Add, M::None])
.cpu([Sse, CAny, CAny])];

/// MMX/SSE2 integer ops at both 64 and 128 bits. `mod_data = [opcode
/// byte 1, -, -]`.
pub static MMXSSE2: &[InsnForm] = &[
    InsnForm::new(2, [0x0F, 0x00, 0], 0, &[
        op(T::SimdReg, S64, A::Spare),
        op(T::SimdRm, Any, A::Ea).relaxed(),
    ])
    .modifiers([M::Op1Add, M::None, M::None])
    .cpu([Mmx, CAny, CAny]),
    InsnForm::new(2, [0x0F, 0x00, 0], 0, &[
        op(T::SimdReg, S128, A::Spare),
        op(T::SimdRm, Any, A::Ea).relaxed(),
    ])
    .modifiers([M::Op1Add, M::None, M::None])
    .prefix(0x66)
    .cpu([Sse2, CAny, CAny]),
];

/// Three-operand AVX arithmetic, plus the two-operand spellings where
/// the destination doubles as first source. `mod_data = [opcode byte 1,
/// xmm VEX tag, ymm VEX tag]`.
pub static AVXARITH: &[InsnForm] = &[
    InsnForm::new(2, [0x0F, 0x00, 0], 0, &[
        op(T::SimdReg, S128, A::Spare),
        op(T::SimdReg, S128, A::Vex),
        op(T::SimdRm, Any, A::Ea).relaxed(),
    ])
    .modifiers([M::Op1Add, M::SetVex, M::None])
    .misc(misc::ONLY_AVX)
    .cpu([Avx, CAny, CAny]),
    InsnForm::new(2, [0x0F, 0x00, 0], 0, &[
        op(T::SimdReg, S256, A::Spare),
        op(T::SimdReg, S256, A::Vex),
        op(T::SimdRm, Any, A::Ea).relaxed(),
    ])
    .modifiers([M::Op1Add, M::Gap, M::SetVex])
    .misc(misc::ONLY_AVX)
    .cpu([Avx, CAny, CAny]),
    InsnForm::new(2, [0x0F, 0x00, 0], 0, &[
        op(T::SimdReg, S128, A::SpareVex),
        op(T::SimdRm, Any, A::Ea).relaxed(),
    ])
    .modifiers([M::Op1Add, M::SetVex, M::None])
    .misc(misc::ONLY_AVX)
    .cpu([Avx, CAny, CAny]),
    InsnForm::new(2, [0x0F, 0x00, 0], 0, &[
        op(T::SimdReg, S256, A::SpareVex),
        op(T::SimdRm, Any, A::Ea).relaxed(),
    ])
    .modifiers([M::Op1Add, M::Gap, M::SetVex])
    .misc(misc::ONLY_AVX)
    .cpu([Avx, CAny, CAny]),
];

/// AVX shifts by an immediate count. These are non-destructive-
/// destination forms: the destination register rides in VEX.vvvv and the
/// source in ModR/M.rm, with the two-operand spelling putting one
/// register in both. `mod_data = [opcode byte 1, spare, -]`.
pub static VPSHIFT_IMM: &[InsnForm] = &[
    InsnForm::new(2, [0x0F, 0x00, 0], 0, &[
        op(T::SimdReg, S128, A::Vex),
        op(T::SimdReg, S128, A::Ea),
        op(T::Imm, S8, A::Imm).relaxed(),
    ])
    .modifiers([M::Op1Add, M::SpAdd, M::None])
    .prefix(0xC1)
    .misc(misc::ONLY_AVX)
    .cpu([Avx, CAny, CAny]),
    InsnForm::new(2, [0x0F, 0x00, 0], 0, &[
        op(T::SimdReg, S128, A::EaVex),
        op(T::Imm, S8, A::Imm).relaxed(),
    ])
    .modifiers([M::Op1Add, M::SpAdd, M::None])
    .prefix(0xC1)
    .misc(misc::ONLY_AVX)
    .cpu([Avx, CAny, CAny]),
    InsnForm::new(2, [0x0F, 0x00, 0], 0, &[
        op(T::SimdReg, S256, A::Vex),
        op(T::SimdReg, S256, A::Ea),
        op(T::Imm, S8, A::Imm).relaxed(),
    ])
    .modifiers([M::Op1Add, M::SpAdd, M::None])
    .prefix(0xC5)
    .misc(misc::ONLY_AVX)
    .cpu([Avx2, CAny, CAny]),
    InsnForm::new(2, [0x0F, 0x00, 0], 0, &[
        op(T::SimdReg, S256, A::EaVex),
        op(T::Imm, S8, A::Imm).relaxed(),
    ])
    .modifiers([M::Op1Add, M::SpAdd, M::None])
    .prefix(0xC5)
    .misc(misc::ONLY_AVX)
    .cpu([Avx2, CAny, CAny]),
];

/// Two-operand AVX moves, load and store. `mod_data = [opcode byte 1,
/// xmm VEX tag, ymm VEX tag]`.
pub static AVXMOV: &[InsnForm] = &[
    InsnForm::new(2, [0x0F, 0x00, 0], 0, &[
        op(T::SimdReg, S128, A::Spare),
        op(T::SimdRm, Any, A::Ea).relaxed(),
    ])
    .modifiers([M::Op1Add, M::SetVex, M::None])
    .misc(misc::ONLY_AVX)
    .cpu([Avx, CAny, CAny]),
    InsnForm::new(2, [0x0F, 0x00, 0], 0, &[
        op(T::SimdReg, S256, A::Spare),
        op(T::SimdRm, Any, A::Ea).relaxed(),
    ])
    .modifiers([M::Op1Add, M::Gap, M::SetVex])
    .misc(misc::ONLY_AVX)
    .cpu([Avx, CAny, CAny]),
    InsnForm::new(2, [0x0F, 0x01, 0], 0, &[
        op(T::SimdRm, Any, A::Ea).relaxed(),
        op(T::SimdReg, S128, A::Spare),
    ])
    .modifiers([M::Op1Add, M::SetVex, M::None])
    .misc(misc::ONLY_AVX)
    .cpu([Avx, CAny, CAny]),
    InsnForm::new(2, [0x0F, 0x01, 0], 0, &[
        op(T::SimdRm, Any, A::Ea).relaxed(),
        op(T::SimdReg, S256, A::Spare),
    ])
    .modifiers([M::Op1Add, M::Gap, M::SetVex])
    .misc(misc::ONLY_AVX)
    .cpu([Avx, CAny, CAny]),
];

/// vgatherdps: dword-indexed single-precision gathers (vector SIB).
pub static VGATHERDPS: &[InsnForm] = &[
    InsnForm::new(3, [0x0F, 0x38, 0x92], 0, &[
        op(T::SimdReg, S128, A::Spare),
        op(T::MemXmmIndex, Any, A::Ea).relaxed(),
        op(T::SimdReg, S128, A::Vex),
    ])
    .prefix(0xC1)
    .misc(misc::ONLY_AVX)
    .cpu([Avx2, CAny, CAny]),
    InsnForm::new(3, [0x0F, 0x38, 0x92], 0, &[
        op(T::SimdReg, S256, A::Spare),
        op(T::MemYmmIndex, Any, A::Ea).relaxed(),
        op(T::SimdReg, S256, A::Vex),
    ])
    .prefix(0xC5)
    .misc(misc::ONLY_AVX)
    .cpu([Avx2, CAny, CAny]),
];

/// vgatherdpd: dword-indexed double-precision gathers; the index stays
/// XMM even for the 256-bit form.
pub static VGATHERDPD: &[InsnForm] = &[
    InsnForm::new(3, [0x0F, 0x38, 0x92], 0, &[
        op(T::SimdReg, S128, A::Spare),
        op(T::MemXmmIndex, Any, A::Ea).relaxed(),
        op(T::SimdReg, S128, A::Vex),
    ])
    .prefix(0xC9)
    .misc(misc::ONLY_AVX)
    .cpu([Avx2, CAny, CAny]),
    InsnForm::new(3, [0x0F, 0x38, 0x92], 0, &[
        op(T::SimdReg, S256, A::Spare),
        op(T::MemXmmIndex, Any, A::Ea).relaxed(),
        op(T::SimdReg, S256, A::Vex),
    ])
    .prefix(0xCD)
    .misc(misc::ONLY_AVX)
    .cpu([Avx2, CAny, CAny]),
];

/// vblendvps/vblendvpd: the fourth operand rides in the top nibble of an
/// immediate byte. `mod_data = [opcode byte 2, -, -]`.
pub static VBLENDV: &[InsnForm] = &[
    InsnForm::new(3, [0x0F, 0x3A, 0x00], 0, &[
        op(T::SimdReg, S128, A::Spare),
        op(T::SimdReg, S128, A::Vex),
        op(T::SimdRm, Any, A::Ea).relaxed(),
        op(T::SimdReg, S128, A::VexImmSrc),
    ])
    .modifiers([M::Op2Add, M::None, M::None])
    .prefix(0xC1)
    .misc(misc::ONLY_AVX)
    .cpu([Avx, CAny, CAny]),
    InsnForm::new(3, [0x0F, 0x3A, 0x00], 0, &[
        op(T::SimdReg, S256, A::Spare),
        op(T::SimdReg, S256, A::Vex),
        op(T::SimdRm, Any, A::Ea).relaxed(),
        op(T::SimdReg, S256, A::VexImmSrc),
    ])
    .modifiers([M::Op2Add, M::None, M::None])
    .prefix(0xC5)
    .misc(misc::ONLY_AVX)
    .cpu([Avx, CAny, CAny]),
];

/// vpermil2ps/vpermil2pd: five operands, the selector immediate sharing
/// its byte with the is4 register. `mod_data = [opcode byte 2, -, -]`.
pub static VPERMIL2: &[InsnForm] = &[
    InsnForm::new(3, [0x0F, 0x3A, 0x00], 0, &[
        op(T::SimdReg, S128, A::Spare),
        op(T::SimdReg, S128, A::Vex),
        op(T::SimdRm, Any, A::Ea).relaxed(),
        op(T::SimdReg, S128, A::VexImmSrc),
        op(T::Imm, S8, A::VexImm).relaxed(),
    ])
    .modifiers([M::Op2Add, M::None, M::None])
    .prefix(0xC1)
    .misc(misc::ONLY_AVX)
    .cpu([Xop, CAny, CAny]),
    InsnForm::new(3, [0x0F, 0x3A, 0x00], 0, &[
        op(T::SimdReg, S256, A::Spare),
        op(T::SimdReg, S256, A::Vex),
        op(T::SimdRm, Any, A::Ea).relaxed(),
        op(T::SimdReg, S256, A::VexImmSrc),
        op(T::Imm, S8, A::VexImm).relaxed(),
    ])
    .modifiers([M::Op2Add, M::None, M::None])
    .prefix(0xC5)
    .misc(misc::ONLY_AVX)
    .cpu([Xop, CAny, CAny]),
];

/// vzeroupper/vzeroall. `mod_data = [VEX tag, -, -]`.
pub static VZERO: &[InsnForm] = &[InsnForm::new(2, [0x0F, 0x77, 0], 0, NO_OPS)
    .modifiers([M::SetVex, M::None, M::None])
    .misc(misc::ONLY_AVX)
    .cpu([Avx, CAny, CAny])];

/// XOP frczps/frczpd. `mod_data = [opcode byte 1, xmm XOP tag, ymm XOP
/// tag]`.
pub static VFRCZ: &[InsnForm] = &[
    InsnForm::new(2, [0x09, 0x00, 0], 0, &[
        op(T::SimdReg, S128, A::Spare),
        op(T::SimdRm, Any, A::Ea).relaxed(),
    ])
    .modifiers([M::Op1Add, M::SetVex, M::None])
    .misc(misc::ONLY_AVX)
    .cpu([Xop, CAny, CAny]),
    InsnForm::new(2, [0x09, 0x00, 0], 0, &[
        op(T::SimdReg, S256, A::Spare),
        op(T::SimdRm, Any, A::Ea).relaxed(),
    ])
    .modifiers([M::Op1Add, M::Gap, M::SetVex])
    .misc(misc::ONLY_AVX)
    .cpu([Xop, CAny, CAny]),
];

/// skinit: the operand only pins the address size.
pub static SKINIT: &[InsnForm] = &[
    InsnForm::new(3, [0x0F, 0x01, 0xDE], 0, NO_OPS).cpu([Svm, CAny, CAny]),
    InsnForm::new(3, [0x0F, 0x01, 0xDE], 0, &[op(T::MemEax, Any, A::AdSizeEa)])
        .cpu([Svm, CAny, CAny]),
];

/// invlpga.
pub static INVLPGA: &[InsnForm] = &[
    InsnForm::new(3, [0x0F, 0x01, 0xDF], 0, NO_OPS).cpu([Svm, CAny, CAny]),
    InsnForm::new(3, [0x0F, 0x01, 0xDF], 0, &[
        op(T::MemRax, Any, A::AdSizeEa),
        op(T::Creg, S32, A::None),
    ])
    .cpu([Svm, CAny, CAny]),
];

/// cmpps/cmppd-style SSE compares carrying an immediate selector.
/// `mod_data = [prefix byte, opcode byte 1, -]`.
pub static SSECMP_IMM: &[InsnForm] = &[InsnForm::new(2, [0x0F, 0x00, 0], 0, &[
    op(T::SimdReg, S128, A::Spare),
    op(T::SimdRm, Any, A::Ea).relaxed(),
    op(T::Imm, S8, A::Imm).relaxed(),
])
.modifiers([M::PreAdd, M::Op1Add, M::None])
.cpu([Sse, CAny, CAny])];

/// movsd is both the dword string move and the SSE2 scalar move.
pub static MOVSD: &[InsnForm] = &[
    InsnForm::new(1, [0xA5, 0, 0], 0, NO_OPS).opersize(32),
    InsnForm::new(2, [0x0F, 0x10, 0], 0, &[
        op(T::SimdReg, S128, A::Spare),
        op(T::SimdRm, Any, A::Ea).relaxed(),
    ])
    .prefix(0xF2)
    .cpu([Sse2, CAny, CAny]),
    InsnForm::new(2, [0x0F, 0x11, 0], 0, &[
        op(T::SimdRm, Any, A::Ea).relaxed(),
        op(T::SimdReg, S128, A::Spare),
    ])
    .prefix(0xF2)
    .cpu([Sse2, CAny, CAny]),
];
