//! Per-instruction common state: sizes, LOCK/REP byte, mode.

use crate::diag::{Diagnostics, SourceLoc, Warning};
use crate::prefix::{Prefix, PrefixKind};
use crate::regs::SegReg;
use crate::rex::Rex;

/// The mutable per-instruction fields shared by every encoding path.
///
/// A size of 0 means "no override; use the mode default".
#[derive(Clone, Copy, Debug, Default)]
pub struct InsnCommon {
    pub addrsize: u8,
    pub opersize: u8,
    /// The LOCK/REP prefix byte; 0 indicates no prefix. Segment overrides
    /// written as bare prefixes land in this same slot (historical
    /// artifact, kept so the byte order of existing output is preserved).
    pub lockrep_pre: u8,
    pub mode_bits: u8,
}

impl InsnCommon {
    pub fn new(mode_bits: u8) -> Self {
        Self { mode_bits, ..Self::default() }
    }

    /// Fold a list of parsed prefixes into this state.
    ///
    /// `rex` is `None` for instructions that cannot carry a REX prefix
    /// (jumps); explicit REX prefixes are then warned about and dropped.
    pub fn apply_prefixes(
        &mut self,
        def_opersize_64: u8,
        prefixes: &[(Prefix, SourceLoc)],
        mut rex: Option<&mut Rex>,
        diags: &mut Diagnostics,
    ) {
        let mut first = true;
        for &(prefix, loc) in prefixes {
            match prefix.kind {
                PrefixKind::LockRep | PrefixKind::AcqRel => {
                    if self.lockrep_pre != 0 {
                        diags.warn(loc, Warning::MultipleLockRep);
                    }
                    self.lockrep_pre = prefix.value;
                }
                PrefixKind::AddrSize => self.addrsize = prefix.value,
                PrefixKind::OperSize => {
                    self.opersize = prefix.value;
                    if self.mode_bits == 64
                        && self.opersize == 64
                        && def_opersize_64 != 64
                    {
                        match rex.as_deref_mut() {
                            None => diags.warn(loc, Warning::IgnoringRexOnJump),
                            Some(rex) if rex.is_forbidden() => {
                                diags.warn(loc, Warning::IgnoringRexOnJump);
                            }
                            Some(rex) => rex.force_w(),
                        }
                    }
                }
                PrefixKind::SegOverride => {
                    // Stored in the same slot as LOCK/REP; see the field
                    // documentation.
                    self.lockrep_pre = prefix.value;
                }
                PrefixKind::Rex => match rex.as_deref_mut() {
                    None => diags.warn(loc, Warning::IgnoringRexOnJump),
                    Some(rex) if rex.is_forbidden() => {
                        diags.warn(loc, Warning::IgnoringRexOnJump);
                    }
                    Some(rex) => {
                        if !rex.is_none() {
                            if first {
                                diags.warn(loc, Warning::OverridingRex);
                            } else {
                                diags.warn(loc, Warning::MultipleRex);
                            }
                        }
                        // The parser only accepts REX tokens in 64-bit
                        // mode.
                        self.mode_bits = 64;
                        rex.set_byte(prefix.value);
                        first = false;
                    }
                },
            }
        }
    }

    /// Change a zero opersize to the mode default. 64-bit mode defaults to
    /// a 32-bit operand size; 64-bit must be opted into. The address size
    /// is left for the effective-address analyser to auto-detect.
    pub fn finish(&mut self) {
        if self.opersize == 0 {
            self.opersize = if self.mode_bits == 64 { 32 } else { self.mode_bits };
        }
    }

    fn need_addrsize_byte(&self) -> bool {
        self.addrsize != 0 && self.addrsize != self.mode_bits
    }

    fn need_opersize_byte(&self) -> bool {
        (self.mode_bits != 64 && self.opersize != self.mode_bits)
            || (self.mode_bits == 64 && self.opersize == 16)
    }

    /// Number of prefix bytes [`Self::to_bytes`] will write, not counting
    /// the segment override.
    pub fn len(&self) -> u32 {
        let mut len = 0;
        if self.need_addrsize_byte() {
            len += 1;
        }
        if self.need_opersize_byte() {
            len += 1;
        }
        if self.lockrep_pre != 0 {
            len += 1;
        }
        len
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Serialise the prefixes: segment override, 0x67, 0x66, LOCK/REP.
    pub fn to_bytes(&self, bytes: &mut Vec<u8>, segreg: Option<SegReg>) {
        if let Some(segreg) = segreg {
            bytes.push(segreg.prefix());
        }
        if self.need_addrsize_byte() {
            bytes.push(0x67);
        }
        if self.need_opersize_byte() {
            bytes.push(0x66);
        }
        if self.lockrep_pre != 0 {
            bytes.push(self.lockrep_pre);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diag::Diagnostics;

    #[test]
    fn opersize_defaults() {
        let mut common = InsnCommon::new(64);
        common.finish();
        assert_eq!(common.opersize, 32);

        let mut common = InsnCommon::new(16);
        common.finish();
        assert_eq!(common.opersize, 16);
    }

    #[test]
    fn prefix_bytes_in_order() {
        let mut common = InsnCommon::new(64);
        common.addrsize = 32;
        common.opersize = 16;
        common.lockrep_pre = 0xF0;
        let mut bytes = Vec::new();
        common.to_bytes(&mut bytes, Some(SegReg::Gs));
        assert_eq!(bytes, vec![0x65, 0x67, 0x66, 0xF0]);
        assert_eq!(common.len(), 3);
    }

    #[test]
    fn multiple_lockrep_warns_keeps_leftmost_slot_semantics() {
        let mut common = InsnCommon::new(32);
        let mut diags = Diagnostics::new();
        let loc = SourceLoc::new(5);
        common.apply_prefixes(
            0,
            &[(Prefix::LOCK, loc), (Prefix::REP, loc)],
            None,
            &mut diags,
        );
        assert_eq!(diags.len(), 1);
        assert_eq!(common.lockrep_pre, 0xF3);
    }

    #[test]
    fn opersize64_forces_rex_w() {
        let mut common = InsnCommon::new(64);
        let mut rex = Rex::none();
        let mut diags = Diagnostics::new();
        common.apply_prefixes(
            0,
            &[(Prefix::oper_size(64), SourceLoc::new(1))],
            Some(&mut rex),
            &mut diags,
        );
        assert_eq!(rex.byte(), Some(0x48));
        assert!(diags.is_empty());
    }

    #[test]
    fn explicit_rex_overrides_generated() {
        let mut common = InsnCommon::new(64);
        let mut rex = Rex::from_byte(0x48);
        let mut diags = Diagnostics::new();
        common.apply_prefixes(
            0,
            &[(Prefix::rex(0x44), SourceLoc::new(1))],
            Some(&mut rex),
            &mut diags,
        );
        assert_eq!(rex.byte(), Some(0x44));
        assert_eq!(diags.len(), 1);
    }
}
