//! VEX and XOP prefix construction.
//!
//! Forms carry the prefix as a `WLpp` tag: `0xC0..=0xCF` for VEX,
//! `0x80..=0x8F` for XOP. After the opcode is final, the tag and the
//! non-destructive source register are folded into two prefix bytes that
//! are stored in the opcode buffer, with the real opcode byte following;
//! the special-prefix slot records `0xC4` (or `0x8F`). Once the REX value
//! is known, a three-byte VEX with REX.X = REX.B = W = 0 and mmmmm = 1 is
//! shortened to the two-byte form. XOP is never shortened.

use crate::diag::{EncodeResult, Error, ErrorKind, SourceLoc};
use crate::opcode::Opcode;
use crate::rex::Rex;

/// True if `tag` is a VEX or XOP `WLpp` tag rather than a literal prefix
/// byte.
pub fn is_vex_xop_tag(tag: u8) -> bool {
    matches!(tag & 0xF0, 0xC0 | 0x80)
}

/// Fold the tag, opcode escape bytes, and vvvv register into prefix
/// bytes, rewriting `opcode` and `special_prefix`.
///
/// The first two opcode bytes become the second and third VEX/XOP bytes
/// (`RXB | mmmmm` with R=X=B left as 1, then `W vvvv L pp`), and the real
/// opcode byte follows. REX bits are merged at emission time.
pub fn build(
    opcode: &mut Opcode,
    special_prefix: &mut u8,
    mut vexdata: u8,
    vexreg: u8,
    loc: SourceLoc,
) -> EncodeResult<()> {
    let xop = vexdata & 0xF0 == 0x80;
    let mut bytes = [0xE0u8, 0, 0]; // R=X=B=1, mmmmm=0

    if xop {
        // The first opcode byte is the XOP map (0x08..0x0A) and supplies
        // mmmmm directly; the real opcode is in byte 1.
        let map = opcode.get(0);
        if !(0x08..=0x0A).contains(&map) {
            return Err(Error::new(
                ErrorKind::Internal("XOP opcode must start with 0x08..0x0A"),
                loc,
            ));
        }
        bytes[2] = opcode.get(1);
        bytes[0] |= map;
    } else {
        // VEX: map the escape bytes to mmmmm.
        if opcode.get(0) != 0x0F {
            return Err(Error::new(
                ErrorKind::Internal("VEX opcode must start with 0x0F"),
                loc,
            ));
        }
        if opcode.get(1) == 0x38 {
            bytes[2] = opcode.get(2);
            bytes[0] |= 0x02;
        } else if opcode.get(1) == 0x3A {
            bytes[2] = opcode.get(2);
            bytes[0] |= 0x03;
        } else {
            bytes[2] = opcode.get(1);
            bytes[0] |= 0x01;
        }
    }

    // A 66/F3/F2 planted by a modifier overrides the tag's pp field.
    if *special_prefix != 0 {
        vexdata &= !0x03;
        match *special_prefix {
            0x66 => vexdata |= 0x01,
            0xF3 => vexdata |= 0x02,
            0xF2 => vexdata |= 0x03,
            _ => {
                return Err(Error::new(
                    ErrorKind::Internal("unrecognized special prefix"),
                    loc,
                ))
            }
        }
    }

    // Second byte: W vvvv L pp, vvvv in ones' complement.
    bytes[1] = ((vexdata & 0x8) << 4) | ((15 - (vexreg & 0xF)) << 3) | (vexdata & 0x7);

    *special_prefix = if xop { 0x8F } else { 0xC4 };
    *opcode = Opcode::new(3, bytes);
    Ok(())
}

/// Shorten a three-byte VEX to two bytes when REX.X, REX.B, and W are all
/// zero and mmmmm is 1.
pub fn optimize(opcode: &mut Opcode, special_prefix: &mut u8, rex: Rex) {
    if *special_prefix != 0xC4 {
        return;
    }
    if opcode.get(0) & 0x1F == 1
        && opcode.get(1) & 0x80 == 0
        && (rex.is_forbidden() || rex.raw() & 0x0B == 0)
    {
        opcode.make_alt_2();
        *special_prefix = 0xC5;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vex_0f_map_shortens() {
        // 0F 58 (addps-style), tag W0 L1 pp0, vvvv = 2.
        let mut opcode = Opcode::new(2, [0x0F, 0x58, 0]);
        let mut prefix = 0u8;
        build(&mut opcode, &mut prefix, 0xC4, 2, SourceLoc::default()).unwrap();
        assert_eq!(prefix, 0xC4);
        assert_eq!(opcode.get(0), 0xE1); // RXB=111, mmmmm=1
        assert_eq!(opcode.get(1), 0b0_1101_1_00); // W=0 vvvv=~2 L=1 pp=0
        assert_eq!(opcode.get(2), 0x58);

        optimize(&mut opcode, &mut prefix, Rex::none());
        assert_eq!(prefix, 0xC5);
        assert_eq!(opcode.len(), 2);
        assert_eq!(opcode.get(0), 0b0_1101_1_00);
        assert_eq!(opcode.get(1), 0x58);
    }

    #[test]
    fn vex_0f38_map_stays_three_bytes() {
        let mut opcode = Opcode::new(3, [0x0F, 0x38, 0x92]);
        let mut prefix = 0u8;
        build(&mut opcode, &mut prefix, 0xC1, 3, SourceLoc::default()).unwrap();
        assert_eq!(opcode.get(0), 0xE2); // mmmmm=2
        optimize(&mut opcode, &mut prefix, Rex::none());
        assert_eq!(prefix, 0xC4);
        assert_eq!(opcode.len(), 3);
    }

    #[test]
    fn rex_b_blocks_shortening() {
        let mut opcode = Opcode::new(2, [0x0F, 0x58, 0]);
        let mut prefix = 0u8;
        build(&mut opcode, &mut prefix, 0xC0, 0, SourceLoc::default()).unwrap();
        let mut rex = Rex::none();
        rex.set_byte(0x41); // REX.B
        optimize(&mut opcode, &mut prefix, rex);
        assert_eq!(prefix, 0xC4);
    }

    #[test]
    fn xop_never_shortens() {
        let mut opcode = Opcode::new(2, [0x09, 0x80, 0]);
        let mut prefix = 0u8;
        build(&mut opcode, &mut prefix, 0x80, 0, SourceLoc::default()).unwrap();
        assert_eq!(prefix, 0x8F);
        assert_eq!(opcode.get(0), 0xE9); // RXB=111, mmmmm=01001
        optimize(&mut opcode, &mut prefix, Rex::none());
        assert_eq!(prefix, 0x8F);
        assert_eq!(opcode.len(), 3);
    }

    #[test]
    fn pp_override_from_special_prefix() {
        let mut opcode = Opcode::new(2, [0x0F, 0x58, 0]);
        let mut prefix = 0x66u8;
        build(&mut opcode, &mut prefix, 0xC0, 0, SourceLoc::default()).unwrap();
        assert_eq!(opcode.get(1) & 0x03, 0x01);
    }
}
