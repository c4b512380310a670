//! Instruction form tables: the row and pattern types.
//!
//! Each mnemonic resolves to a group — a static slice of [`InsnForm`] rows
//! searched in order; the first row whose gates and operand patterns all
//! accept wins. Rows are built at compile time with the `const` helpers
//! below; there is no startup allocation. Several mnemonics can share one
//! group by carrying per-keyword modifier bytes that the row's
//! [`Modifier`] recipe folds into the opcode, spare bits, or sizes.
//!
//! The group data itself lives in [`groups`].

use crate::features::CpuFeature;

pub mod groups;

/// GAS suffix acceptance and dialect gating bits (`InsnForm::gas_flags`).
pub mod gas {
    pub const SUF_B: u16 = 1 << 0;
    pub const SUF_W: u16 = 1 << 1;
    pub const SUF_L: u16 = 1 << 2;
    pub const SUF_Q: u16 = 1 << 3;
    pub const SUF_S: u16 = 1 << 4;
    pub const SUF_MASK: u16 = SUF_B | SUF_W | SUF_L | SUF_Q | SUF_S;

    /// Form only available in the GAS dialect.
    pub const GAS_ONLY: u16 = 1 << 5;
    /// Form not available in the GAS dialect.
    pub const GAS_ILLEGAL: u16 = 1 << 6;
    /// Do not reverse operands in GAS mode.
    pub const GAS_NO_REV: u16 = 1 << 7;

    /// On a parsed instruction (never a form): suffix known only weakly,
    /// relax operand sizing. Shares a bit with `GAS_ONLY`, which can never
    /// appear on an instruction.
    pub const WEAK: u16 = 1 << 5;
}

/// Mode and AVX gates (`InsnForm::misc_flags`).
pub mod misc {
    /// Only available in 64-bit mode.
    pub const ONLY_64: u8 = 1 << 0;
    /// Invalid in 64-bit mode.
    pub const NOT_64: u8 = 1 << 1;
    /// Only available as part of an AVX mnemonic.
    pub const ONLY_AVX: u8 = 1 << 2;
    /// Invalid as part of an AVX mnemonic.
    pub const NOT_AVX: u8 = 1 << 3;
}

/// How one keyword modifier byte is folded into the chosen form.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Modifier {
    /// No modifier in this slot.
    None,
    /// Consumes its byte without doing anything.
    Gap,
    /// Byte adds to the special prefix.
    PreAdd,
    /// Byte adds to opcode byte 0.
    Op0Add,
    /// Byte adds to opcode byte 1.
    Op1Add,
    /// Byte adds to opcode byte 2.
    Op2Add,
    /// Byte adds to the ModR/M spare field.
    SpAdd,
    /// Byte replaces the operand size.
    OpSizeR,
    /// Byte becomes an 8-bit immediate.
    Imm8,
    /// Byte replaces the address size (jumps only).
    AdSizeR,
    /// Byte replaces the default 64-bit operand size.
    DOpS64R,
    /// Byte is shifted into the spare bits of opcode byte 1.
    Op1AddSp,
    /// Byte replaces the VEX/XOP tag.
    SetVex,
}

/// Operand type accepted by a pattern slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OpType {
    /// Any immediate.
    Imm,
    /// Any general purpose or FPU register.
    Reg,
    /// Memory.
    Mem,
    /// General purpose or FPU register, or memory.
    Rm,
    /// Any MMX, XMM or YMM register.
    SimdReg,
    /// SIMD register or memory.
    SimdRm,
    /// A SIMD register equal to the one in operand 0.
    SimdRegMatch0,
    /// Any segment register.
    SegReg,
    CrReg,
    DrReg,
    TrReg,
    /// ST0 exactly.
    St0,
    /// AL/AX/EAX/RAX at the pattern size.
    Areg,
    /// CL/CX/ECX/RCX at the pattern size.
    Creg,
    /// DL/DX/EDX/RDX at the pattern size.
    Dreg,
    Cs,
    Ds,
    Es,
    Fs,
    Gs,
    Ss,
    /// CR4 exactly.
    Cr4,
    /// An effective address with no registers (MOV direct-offset forms).
    MemOffs,
    /// The immediate 1 (shift forms).
    Imm1,
    /// An immediate with no segment or target modifier (jmp/call).
    ImmNotSegOff,
    /// XMM0 exactly.
    Xmm0,
    /// A memory operand that is exactly `[ax]`/`[eax]`/`[rax]`.
    MemRax,
    /// A memory operand that is exactly `[eax]`.
    MemEax,
    /// A memory operand that is exactly `[dx]`.
    MemDx,
    /// Memory with an XMM index register (vector SIB).
    MemXmmIndex,
    /// Memory with a YMM index register (vector SIB).
    MemYmmIndex,
}

/// Operand size demanded by a pattern slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(usize)]
pub enum OpSize {
    /// Any size acceptable / no size spec acceptable (dep. on strictness).
    Any = 0,
    S8 = 1,
    S16 = 2,
    S32 = 3,
    S64 = 4,
    S80 = 5,
    S128 = 6,
    S256 = 7,
    /// The current mode size; a match also stores it into the opersize.
    SBits = 8,
}

/// Target-modifier gate for a pattern slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TmodGate {
    None,
    Near,
    Short,
    Far,
    To,
}

/// Where the operand's data is routed when the form is applied.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    /// Operand data is discarded.
    None,
    /// Into the effective-address field.
    Ea,
    /// Into both the EA r/m and the VEX vvvv field.
    EaVex,
    /// Into the immediate field.
    Imm,
    /// Into the immediate field, sign-extended.
    SImm,
    /// Into the ModR/M reg (spare) field.
    Spare,
    /// Into both the spare field and VEX vvvv.
    SpareVex,
    /// Added to opcode byte 0.
    Op0Add,
    /// Added to opcode byte 1.
    Op1Add,
    /// Into both the spare and EA fields (imul).
    SpareEa,
    /// Only sets the address size from the register (`MemRax`/`MemEax`).
    AdSizeEa,
    /// Into VEX vvvv only.
    Vex,
    /// Upper 4 bits of an 8-bit immediate (VEX is4).
    VexImmSrc,
    /// Lower 4 bits of that immediate.
    VexImm,
    /// Relative jump; the jump encoder takes over.
    JmpRel,
    /// Far jump; the far-jump encoder takes over.
    JmpFar,
    /// Operand size becomes the address size (jumps only).
    AdSizeR,
}

/// A deferred action that depends on expression values.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PostAction {
    None,
    /// Sign-extended imm8 that may expand to the alternate opcode.
    SImm8,
    /// May become the short-offset MOV form.
    ShortMov,
    /// Forced 16-bit address size; overrides are discarded.
    A16,
    /// A 64-bit immediate that may shrink to sign-extended 32.
    SImm32Avail,
}

/// One operand pattern slot of a form.
#[derive(Clone, Copy, Debug)]
pub struct OperandPattern {
    pub typ: OpType,
    pub size: OpSize,
    /// Relaxed size matching: an unspecified user size also matches.
    pub relaxed: bool,
    /// Only a 64-bit effective-address size is allowed.
    pub eas64: bool,
    pub tmod: TmodGate,
    pub action: Action,
    pub post: PostAction,
}

/// Build a strict pattern slot.
pub const fn op(typ: OpType, size: OpSize, action: Action) -> OperandPattern {
    OperandPattern {
        typ,
        size,
        relaxed: false,
        eas64: false,
        tmod: TmodGate::None,
        action,
        post: PostAction::None,
    }
}

impl OperandPattern {
    pub const fn relaxed(mut self) -> Self {
        self.relaxed = true;
        self
    }

    pub const fn eas64(mut self) -> Self {
        self.eas64 = true;
        self
    }

    pub const fn tmod(mut self, tmod: TmodGate) -> Self {
        self.tmod = tmod;
        self
    }

    pub const fn post(mut self, post: PostAction) -> Self {
        self.post = post;
        self
    }
}

/// One instruction form: a specific opcode / operand-pattern /
/// feature-gate combination.
#[derive(Clone, Copy, Debug)]
pub struct InsnForm {
    pub gas_flags: u16,
    pub misc_flags: u8,
    pub cpu: [CpuFeature; 3],
    pub modifiers: [Modifier; 3],
    /// Operand size, 0 meaning mode default.
    pub opersize: u8,
    /// Default operand size in 64-bit mode (0 is read as 32 for
    /// readability of the tables).
    pub def_opersize_64: u8,
    /// A special prefix byte (66/F2/F3), or a VEX tag in `0xC0..=0xCF`,
    /// or an XOP tag in `0x80..=0x8F`; 0 means none.
    pub special_prefix: u8,
    pub opcode_len: u8,
    pub opcode: [u8; 3],
    /// The ModR/M spare (extended opcode) bits.
    pub spare: u8,
    pub operands: &'static [OperandPattern],
}

impl InsnForm {
    pub const fn new(
        opcode_len: u8,
        opcode: [u8; 3],
        spare: u8,
        operands: &'static [OperandPattern],
    ) -> Self {
        Self {
            gas_flags: gas::SUF_MASK,
            misc_flags: 0,
            cpu: [CpuFeature::Any; 3],
            modifiers: [Modifier::None; 3],
            opersize: 0,
            def_opersize_64: 0,
            special_prefix: 0,
            opcode_len,
            opcode,
            spare,
            operands,
        }
    }

    pub const fn gas(mut self, flags: u16) -> Self {
        self.gas_flags = flags;
        self
    }

    pub const fn misc(mut self, flags: u8) -> Self {
        self.misc_flags = flags;
        self
    }

    pub const fn cpu(mut self, gates: [CpuFeature; 3]) -> Self {
        self.cpu = gates;
        self
    }

    pub const fn modifiers(mut self, modifiers: [Modifier; 3]) -> Self {
        self.modifiers = modifiers;
        self
    }

    pub const fn opersize(mut self, size: u8) -> Self {
        self.opersize = size;
        self
    }

    pub const fn def64(mut self, size: u8) -> Self {
        self.def_opersize_64 = size;
        self
    }

    pub const fn prefix(mut self, byte: u8) -> Self {
        self.special_prefix = byte;
        self
    }
}

/// The concrete widths for [`OpSize`] indices; `SBits` is patched to the
/// mode at match time.
pub fn size_lookup(mode_bits: u8) -> [u16; 9] {
    [0, 8, 16, 32, 64, 80, 128, 256, u16::from(mode_bits)]
}
