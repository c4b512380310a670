//! The register model: classes, segment registers, target modifiers.
//!
//! Registers are a flat class enum plus a hardware number; size and display
//! names come from match tables rather than any kind of dispatch. Note
//! numbers 8-15 are only valid for some classes, and only in 64-bit mode.

use core::fmt;

/// Register class.
///
/// The class fully determines which bit modes allow the register; the
/// REX-extended classes imply the encoded instruction must permit a REX
/// prefix.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RegClass {
    /// 8-bit legacy registers (AL..BH). Numbers 4-7 are AH/CH/DH/BH and
    /// forbid REX.
    Reg8,
    /// 8-bit registers that require a REX prefix (SPL/BPL/SIL/DIL, R8B..).
    /// 64-bit mode only.
    Reg8x,
    /// 16-bit registers.
    Reg16,
    /// 32-bit registers.
    Reg32,
    /// 64-bit registers. 64-bit mode only.
    Reg64,
    /// x87 floating-point stack registers ST0..ST7.
    Fpu,
    /// MMX registers MM0..MM7.
    Mmx,
    /// SSE registers XMM0..XMM15.
    Xmm,
    /// AVX registers YMM0..YMM15.
    Ymm,
    /// Control registers.
    Cr,
    /// Debug registers.
    Dr,
    /// Test registers.
    Tr,
    /// The instruction pointer; 64-bit mode only, number ignored.
    Rip,
}

/// A register: class plus hardware number.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Reg {
    class: RegClass,
    num: u8,
}

impl Reg {
    /// Create a register.
    ///
    /// # Panics
    ///
    /// Panics if `num` is out of range for the class (tables and parsers
    /// only construct valid registers).
    pub fn new(class: RegClass, num: u8) -> Self {
        let limit = match class {
            RegClass::Rip => 1,
            RegClass::Fpu | RegClass::Mmx | RegClass::Tr => 8,
            _ => 16,
        };
        assert!(num < limit, "invalid register number {num} for {class:?}");
        Self { class, num }
    }

    pub fn class(&self) -> RegClass {
        self.class
    }

    pub fn num(&self) -> u8 {
        self.num
    }

    /// The equivalent size of the register in bits, or 0 if it has no
    /// suitable equivalent size (CR/DR/TR).
    pub fn size(&self) -> u16 {
        match self.class {
            RegClass::Reg8 | RegClass::Reg8x => 8,
            RegClass::Reg16 => 16,
            RegClass::Reg32 => 32,
            RegClass::Reg64 | RegClass::Mmx | RegClass::Rip => 64,
            RegClass::Fpu => 80,
            RegClass::Xmm => 128,
            RegClass::Ymm => 256,
            RegClass::Cr | RegClass::Dr | RegClass::Tr => 0,
        }
    }
}

impl fmt::Display for Reg {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        static R8: [&str; 8] = ["al", "cl", "dl", "bl", "ah", "ch", "dh", "bh"];
        static R8X: [&str; 8] = ["al", "cl", "dl", "bl", "spl", "bpl", "sil", "dil"];
        static R16: [&str; 8] = ["ax", "cx", "dx", "bx", "sp", "bp", "si", "di"];
        static R32: [&str; 8] = ["eax", "ecx", "edx", "ebx", "esp", "ebp", "esi", "edi"];
        static R64: [&str; 8] = ["rax", "rcx", "rdx", "rbx", "rsp", "rbp", "rsi", "rdi"];
        let n = usize::from(self.num);
        match self.class {
            RegClass::Reg8 => write!(f, "{}", R8[n & 7]),
            RegClass::Reg8x if n < 8 => write!(f, "{}", R8X[n]),
            RegClass::Reg8x => write!(f, "r{n}b"),
            RegClass::Reg16 if n < 8 => write!(f, "{}", R16[n]),
            RegClass::Reg16 => write!(f, "r{n}w"),
            RegClass::Reg32 if n < 8 => write!(f, "{}", R32[n]),
            RegClass::Reg32 => write!(f, "r{n}d"),
            RegClass::Reg64 if n < 8 => write!(f, "{}", R64[n]),
            RegClass::Reg64 => write!(f, "r{n}"),
            RegClass::Fpu => write!(f, "st{n}"),
            RegClass::Mmx => write!(f, "mm{n}"),
            RegClass::Xmm => write!(f, "xmm{n}"),
            RegClass::Ymm => write!(f, "ymm{n}"),
            RegClass::Cr => write!(f, "cr{n}"),
            RegClass::Dr => write!(f, "dr{n}"),
            RegClass::Tr => write!(f, "tr{n}"),
            RegClass::Rip => write!(f, "rip"),
        }
    }
}

/// Convenience constructors for the registers the tables and tests name
/// directly.
pub mod gpr {
    use super::{Reg, RegClass};

    pub const AL: Reg = Reg { class: RegClass::Reg8, num: 0 };
    pub const CL: Reg = Reg { class: RegClass::Reg8, num: 1 };
    pub const DL: Reg = Reg { class: RegClass::Reg8, num: 2 };
    pub const AH: Reg = Reg { class: RegClass::Reg8, num: 4 };
    pub const AX: Reg = Reg { class: RegClass::Reg16, num: 0 };
    pub const CX: Reg = Reg { class: RegClass::Reg16, num: 1 };
    pub const DX: Reg = Reg { class: RegClass::Reg16, num: 2 };
    pub const BX: Reg = Reg { class: RegClass::Reg16, num: 3 };
    pub const SP: Reg = Reg { class: RegClass::Reg16, num: 4 };
    pub const BP: Reg = Reg { class: RegClass::Reg16, num: 5 };
    pub const SI: Reg = Reg { class: RegClass::Reg16, num: 6 };
    pub const DI: Reg = Reg { class: RegClass::Reg16, num: 7 };
    pub const EAX: Reg = Reg { class: RegClass::Reg32, num: 0 };
    pub const ECX: Reg = Reg { class: RegClass::Reg32, num: 1 };
    pub const EDX: Reg = Reg { class: RegClass::Reg32, num: 2 };
    pub const EBX: Reg = Reg { class: RegClass::Reg32, num: 3 };
    pub const ESP: Reg = Reg { class: RegClass::Reg32, num: 4 };
    pub const EBP: Reg = Reg { class: RegClass::Reg32, num: 5 };
    pub const ESI: Reg = Reg { class: RegClass::Reg32, num: 6 };
    pub const EDI: Reg = Reg { class: RegClass::Reg32, num: 7 };
    pub const RAX: Reg = Reg { class: RegClass::Reg64, num: 0 };
    pub const RCX: Reg = Reg { class: RegClass::Reg64, num: 1 };
    pub const RDX: Reg = Reg { class: RegClass::Reg64, num: 2 };
    pub const RBX: Reg = Reg { class: RegClass::Reg64, num: 3 };
    pub const RSP: Reg = Reg { class: RegClass::Reg64, num: 4 };
    pub const RBP: Reg = Reg { class: RegClass::Reg64, num: 5 };
    pub const RSI: Reg = Reg { class: RegClass::Reg64, num: 6 };
    pub const RDI: Reg = Reg { class: RegClass::Reg64, num: 7 };
    pub const R8: Reg = Reg { class: RegClass::Reg64, num: 8 };
    pub const R12: Reg = Reg { class: RegClass::Reg64, num: 12 };
    pub const R13: Reg = Reg { class: RegClass::Reg64, num: 13 };
    pub const RIP: Reg = Reg { class: RegClass::Rip, num: 0 };

    /// The 64-bit register with hardware number `num`.
    pub fn reg64(num: u8) -> Reg {
        Reg::new(RegClass::Reg64, num)
    }

    /// The SSE register with hardware number `num`.
    pub fn xmm(num: u8) -> Reg {
        Reg::new(RegClass::Xmm, num)
    }

    /// The AVX register with hardware number `num`.
    pub fn ymm(num: u8) -> Reg {
        Reg::new(RegClass::Ymm, num)
    }
}

/// A segment register with its fixed override prefix byte.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SegReg {
    Es,
    Cs,
    Ss,
    Ds,
    Fs,
    Gs,
}

impl SegReg {
    /// The hardware number used in ModR/M reg fields for segment moves.
    pub fn num(self) -> u8 {
        match self {
            SegReg::Es => 0,
            SegReg::Cs => 1,
            SegReg::Ss => 2,
            SegReg::Ds => 3,
            SegReg::Fs => 4,
            SegReg::Gs => 5,
        }
    }

    /// The segment-override prefix byte.
    pub fn prefix(self) -> u8 {
        match self {
            SegReg::Es => 0x26,
            SegReg::Cs => 0x2E,
            SegReg::Ss => 0x36,
            SegReg::Ds => 0x3E,
            SegReg::Fs => 0x64,
            SegReg::Gs => 0x65,
        }
    }

    /// True for the overrides that are architectural no-ops in 64-bit mode.
    pub fn ignored_in_64(self) -> bool {
        matches!(self, SegReg::Cs | SegReg::Ds | SegReg::Es | SegReg::Ss)
    }
}

impl fmt::Display for SegReg {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            SegReg::Es => "es",
            SegReg::Cs => "cs",
            SegReg::Ss => "ss",
            SegReg::Ds => "ds",
            SegReg::Fs => "fs",
            SegReg::Gs => "gs",
        };
        write!(f, "{name}")
    }
}

/// A jump/call target modifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TargetMod {
    Near,
    Short,
    Far,
    To,
}

impl fmt::Display for TargetMod {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TargetMod::Near => write!(f, "near"),
            TargetMod::Short => write!(f, "short"),
            TargetMod::Far => write!(f, "far"),
            TargetMod::To => write!(f, "to"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sizes() {
        assert_eq!(gpr::AL.size(), 8);
        assert_eq!(gpr::AX.size(), 16);
        assert_eq!(gpr::EAX.size(), 32);
        assert_eq!(gpr::RAX.size(), 64);
        assert_eq!(gpr::xmm(3).size(), 128);
        assert_eq!(gpr::ymm(3).size(), 256);
        assert_eq!(Reg::new(RegClass::Cr, 4).size(), 0);
    }

    #[test]
    fn names() {
        assert_eq!(gpr::RAX.to_string(), "rax");
        assert_eq!(gpr::reg64(13).to_string(), "r13");
        assert_eq!(Reg::new(RegClass::Reg8, 4).to_string(), "ah");
        assert_eq!(Reg::new(RegClass::Reg8x, 4).to_string(), "spl");
        assert_eq!(gpr::RIP.to_string(), "rip");
    }

    #[test]
    fn segreg_prefixes() {
        assert_eq!(SegReg::Es.prefix(), 0x26);
        assert_eq!(SegReg::Gs.prefix(), 0x65);
        assert!(SegReg::Cs.ignored_in_64());
        assert!(!SegReg::Fs.ignored_in_64());
    }
}
