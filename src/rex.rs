//! REX prefix discipline.
//!
//! A single byte tracks the generated REX prefix for an instruction. Zero
//! means "none yet"; the poison value means REX is *forbidden* because one
//! of AH/BH/CH/DH is in use — those registers have no encoding once a REX
//! prefix is present, so any later attempt to set a REX bit is an error.

use crate::diag::{EncodeResult, Error, ErrorKind, SourceLoc};
use crate::regs::{Reg, RegClass};

/// Bit positions within the low nibble of a REX byte.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum RexBit {
    B = 0,
    X = 1,
    R = 2,
    W = 3,
}

const FORBIDDEN: u8 = 0xFF;

/// The REX state of an instruction being encoded.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rex(u8);

impl Rex {
    pub fn none() -> Self {
        Rex(0)
    }

    /// Raw constructor for an explicit user REX byte.
    pub fn from_byte(byte: u8) -> Self {
        Rex(byte)
    }

    pub fn is_none(self) -> bool {
        self.0 == 0
    }

    pub fn is_forbidden(self) -> bool {
        self.0 == FORBIDDEN
    }

    /// The byte to emit, if any.
    pub fn byte(self) -> Option<u8> {
        if self.0 == 0 || self.0 == FORBIDDEN {
            None
        } else {
            Some(self.0)
        }
    }

    /// Raw value, including the poison pattern. Only the VEX folding layer
    /// wants this.
    pub fn raw(self) -> u8 {
        self.0
    }

    /// Force `REX.W` (presets the byte to 0x48).
    pub fn force_w(&mut self) {
        self.0 = 0x48;
    }

    /// Overwrite with an explicit byte (prefix folding).
    pub fn set_byte(&mut self, byte: u8) {
        self.0 = byte;
    }

    /// Fold register `reg` into this REX at `bit`, returning the low three
    /// bits of the register number for the ModR/M, SIB, or opcode field.
    ///
    /// In non-64-bit modes only the low three bits are produced. In 64-bit
    /// mode, REX-extended classes and numbers >= 8 set the requested REX
    /// bit; AH/BH/CH/DH poison the byte so it can never be set.
    pub fn set_from_reg(
        &mut self,
        reg: Reg,
        bits: u8,
        bit: RexBit,
        loc: SourceLoc,
    ) -> EncodeResult<u8> {
        let low3 = reg.num() & 7;

        if bits == 64 {
            if reg.class() == RegClass::Reg8x || reg.num() >= 8 {
                if self.is_forbidden() {
                    return Err(Error::new(ErrorKind::RexConflict, loc));
                }
                self.0 |= 0x40 | (((reg.num() & 8) >> 3) << (bit as u8));
            } else if reg.class() == RegClass::Reg8 && low3 >= 4 {
                // AH/BH/CH/DH: flag so REX can never be set.
                if self.0 != 0 && self.0 != FORBIDDEN {
                    return Err(Error::new(ErrorKind::RexConflict, loc));
                }
                self.0 = FORBIDDEN;
            }
        }
        Ok(low3)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regs::gpr;

    #[test]
    fn extended_reg_sets_bit() {
        let mut rex = Rex::none();
        let low3 = rex
            .set_from_reg(gpr::reg64(9), 64, RexBit::B, SourceLoc::default())
            .unwrap();
        assert_eq!(low3, 1);
        assert_eq!(rex.byte(), Some(0x41));
    }

    #[test]
    fn reg8x_forces_prefix() {
        let mut rex = Rex::none();
        let spl = Reg::new(RegClass::Reg8x, 4);
        rex.set_from_reg(spl, 64, RexBit::B, SourceLoc::default()).unwrap();
        assert_eq!(rex.byte(), Some(0x40));
    }

    #[test]
    fn high8_poisons() {
        let mut rex = Rex::none();
        rex.set_from_reg(gpr::AH, 64, RexBit::R, SourceLoc::default()).unwrap();
        assert!(rex.is_forbidden());
        assert_eq!(rex.byte(), None);
        // Any extended register afterwards is a conflict.
        assert!(rex
            .set_from_reg(gpr::reg64(8), 64, RexBit::B, SourceLoc::default())
            .is_err());
    }

    #[test]
    fn high8_after_rex_conflicts() {
        let mut rex = Rex::none();
        rex.set_from_reg(gpr::reg64(8), 64, RexBit::B, SourceLoc::default())
            .unwrap();
        assert!(rex
            .set_from_reg(gpr::AH, 64, RexBit::R, SourceLoc::default())
            .is_err());
    }

    #[test]
    fn non_64_mode_only_low3() {
        let mut rex = Rex::none();
        let low3 = rex
            .set_from_reg(gpr::AH, 32, RexBit::R, SourceLoc::default())
            .unwrap();
        assert_eq!(low3, 4);
        assert!(rex.is_none());
    }
}
