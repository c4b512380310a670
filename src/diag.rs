//! Source locations, errors, and the diagnostics sink.
//!
//! The encoder reports two kinds of problems: hard errors, which abort the
//! current instruction without emitting bytes, and warnings, which are
//! recorded and do not affect encoding. Both carry an opaque [`SourceLoc`]
//! preserved from the parser; the encoder never interprets it.

use core::fmt;

/// A source location.
///
/// This is an opaque 32-bit number attached to each instruction and operand.
/// The encoder does not interpret source locations in any way, it simply
/// preserves them from the input to the diagnostics and relocations.
///
/// The default source location uses the all-ones bit pattern `!0`. It is used
/// for values that can't be given a real source location.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SourceLoc(u32);

impl SourceLoc {
    /// Create a new source location with the given bits.
    pub fn new(bits: u32) -> Self {
        SourceLoc(bits)
    }

    /// Is this the default source location?
    pub fn is_default(self) -> bool {
        self == Default::default()
    }

    /// Read the bits of this source location.
    pub fn bits(self) -> u32 {
        self.0
    }
}

impl Default for SourceLoc {
    fn default() -> Self {
        SourceLoc(!0)
    }
}

impl fmt::Display for SourceLoc {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.is_default() {
            write!(f, "@-")
        } else {
            write!(f, "@{:04x}", self.0)
        }
    }
}

/// A hard encoding error.
///
/// Errors abort the instruction that produced them: the driver reports the
/// error and moves on to the next statement, and no bytes are emitted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Mnemonic takes a different number of operands.
    BadNumOperands,
    /// Operand N's explicit or register size does not match any form.
    BadOperandSize(u8),
    /// Operand types are inconsistent with any form.
    BadInsnOperands,
    /// Every form requires a feature outside the active mask; the payload
    /// names the missing features.
    RequiresCpu(String),
    /// Mnemonic is only valid in 64-bit mode.
    InsnIn64Mode,
    /// Mnemonic is invalid in 64-bit mode.
    InsnInvalid64Mode,
    /// Prefix is only valid in 64-bit mode.
    PrefixIn64Mode,
    /// Address expression is illegal (bad register class, illegal scale,
    /// conflicting registers, ESP as non-base index).
    InvalidEa,
    /// Explicit displacement size disagrees with the address size.
    InvalidDispSize,
    /// Symbol equate recursion inside a memory operand.
    EquCircularMem,
    /// Symbol equate recursion inside an immediate.
    EquCircularImm,
    /// AH/BH/CH/DH used with an instruction requiring REX.
    RexConflict,
    /// SHORT or NEAR was requested but that form does not exist.
    MissingJumpForm,
    /// An immediate cannot carry a segment override.
    ImmSegmentOverride,
    /// Segment register not representable in an effective address.
    InvalidEaSegment,
    /// Unsupported address size for this operand.
    BadAddressSize,
    /// 16-bit addresses are not supported in 64-bit mode.
    Addr16In64Mode,
    /// 64-bit effective address outside 64-bit mode.
    Ea64NotIn64Mode,
    /// RIP-relative addressing outside 64-bit mode.
    RipRelNot64Mode,
    /// Destination register must match source operand 1 or 3.
    DestNotSrc1OrSrc3,
    /// More operands than any x86 instruction accepts.
    TooManyOperands,
    /// Effective address or immediate expression too complex to encode.
    EaTooComplex,
    /// A symbol equate used in an address did not reduce to an integer.
    EquValueNotInteger,
    /// A size specifier expression did not reduce to an integer.
    SizeSpecNotInteger,
    /// A bug in the encoder itself, never caused by input.
    Internal(&'static str),
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use ErrorKind::*;
        match self {
            BadNumOperands => write!(f, "invalid number of operands"),
            BadOperandSize(n) => write!(f, "invalid size for operand {n}"),
            BadInsnOperands => {
                write!(f, "invalid combination of opcode and operands")
            }
            RequiresCpu(cpus) => write!(f, "requires CPU{cpus}"),
            InsnIn64Mode => write!(f, "instruction only valid in 64-bit mode"),
            InsnInvalid64Mode => write!(f, "invalid in 64-bit mode"),
            PrefixIn64Mode => write!(f, "prefix only valid in 64-bit mode"),
            InvalidEa => write!(f, "invalid effective address"),
            InvalidDispSize => {
                write!(f, "invalid effective address (displacement size)")
            }
            EquCircularMem => {
                write!(f, "circular reference in memory expression")
            }
            EquCircularImm => {
                write!(f, "circular reference in immediate expression")
            }
            RexConflict => {
                write!(f, "cannot use A/B/C/DH with instruction needing REX")
            }
            MissingJumpForm => {
                write!(f, "no SHORT or NEAR form of that jump instruction exists")
            }
            ImmSegmentOverride => {
                write!(f, "immediate does not support segment override")
            }
            InvalidEaSegment => {
                write!(f, "invalid segment in effective address")
            }
            BadAddressSize => write!(f, "unsupported address size"),
            Addr16In64Mode => {
                write!(f, "16-bit addresses not supported in 64-bit mode")
            }
            Ea64NotIn64Mode => {
                write!(f, "invalid effective address (64-bit in non-64-bit mode)")
            }
            RipRelNot64Mode => {
                write!(f, "RIP-relative addressing requires 64-bit mode")
            }
            DestNotSrc1OrSrc3 => {
                write!(f, "one of source operand 1 or 3 must match dest operand")
            }
            TooManyOperands => write!(f, "too many operands"),
            EaTooComplex => write!(f, "expression too complex"),
            EquValueNotInteger => write!(f, "equate value not an integer"),
            SizeSpecNotInteger => write!(f, "size specifier not an integer"),
            Internal(what) => write!(f, "internal error: {what}"),
        }
    }
}

/// An [`ErrorKind`] bound to the source location that caused it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Error {
    pub kind: ErrorKind,
    pub loc: SourceLoc,
}

impl Error {
    pub fn new(kind: ErrorKind, loc: SourceLoc) -> Self {
        Self { kind, loc }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}: {}", self.loc, self.kind)
    }
}

impl std::error::Error for Error {}

/// Result of an encoding operation.
pub type EncodeResult<T> = Result<T, Error>;

/// A non-fatal condition; the instruction still encodes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Warning {
    /// An 8-bit displacement override had to be widened.
    FixedInvalidDispSize,
    /// More than one LOCK or REP prefix; the leftmost wins.
    MultipleLockRep,
    /// More than one explicit REX prefix; the leftmost wins.
    MultipleRex,
    /// More than one segment override; the leftmost wins.
    MultipleSegOverride,
    /// An explicit REX prefix replaced the generated one.
    OverridingRex,
    /// REX requested on an instruction that cannot carry it (jumps).
    IgnoringRexOnJump,
    /// CS/DS/ES/SS segment override has no effect in 64-bit mode.
    SegIgnoredIn64Mode,
    /// GAS indirect call or jump without the `*` dereference marker.
    IndirectCallNoDeref,
    /// Prefixes attached to a converted operand were dropped.
    PrefixesSkipped,
    /// An explicit address-size override was discarded by the instruction.
    AddressSizeIgnored,
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use Warning::*;
        match self {
            FixedInvalidDispSize => write!(f, "invalid displacement size; fixed"),
            MultipleLockRep => {
                write!(f, "multiple LOCK or REP prefixes, using leftmost")
            }
            MultipleRex => write!(f, "multiple REX prefixes, using leftmost"),
            MultipleSegOverride => {
                write!(f, "multiple segment overrides, using leftmost")
            }
            OverridingRex => write!(f, "overriding generated REX prefix"),
            IgnoringRexOnJump => write!(f, "ignoring REX prefix on jump"),
            SegIgnoredIn64Mode => {
                write!(f, "segment override ignored in 64-bit mode")
            }
            IndirectCallNoDeref => write!(f, "indirect call without `*'"),
            PrefixesSkipped => {
                write!(f, "skipping prefixes on this instruction")
            }
            AddressSizeIgnored => write!(f, "address size override ignored"),
        }
    }
}

/// Severity of a recorded diagnostic.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
}

/// One recorded diagnostic.
#[derive(Clone, Debug)]
pub struct Diagnostic {
    pub severity: Severity,
    pub loc: SourceLoc,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.severity {
            Severity::Warning => write!(f, "{}: warning: {}", self.loc, self.message),
            Severity::Error => write!(f, "{}: error: {}", self.loc, self.message),
        }
    }
}

/// Collects diagnostics produced while encoding.
///
/// The sink is borrowed mutably for the duration of each encoding call;
/// nothing in the encoder retains it.
#[derive(Debug, Default)]
pub struct Diagnostics {
    diags: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a warning.
    pub fn warn(&mut self, loc: SourceLoc, warning: Warning) {
        self.diags.push(Diagnostic {
            severity: Severity::Warning,
            loc,
            message: warning.to_string(),
        });
    }

    /// Record a hard error.
    pub fn error(&mut self, err: &Error) {
        self.diags.push(Diagnostic {
            severity: Severity::Error,
            loc: err.loc,
            message: err.kind.to_string(),
        });
    }

    /// All diagnostics recorded so far, in order.
    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diags.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.diags.is_empty()
    }

    pub fn len(&self) -> usize {
        self.diags.len()
    }

    /// True if any recorded diagnostic is an error.
    pub fn has_errors(&self) -> bool {
        self.diags.iter().any(|d| d.severity == Severity::Error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sourceloc_display() {
        assert_eq!(SourceLoc::default().to_string(), "@-");
        assert_eq!(SourceLoc::new(0).to_string(), "@0000");
        assert_eq!(SourceLoc::new(16).to_string(), "@0010");
        assert_eq!(SourceLoc::new(0xabcdef).to_string(), "@abcdef");
    }

    #[test]
    fn sink_severity() {
        let mut diags = Diagnostics::new();
        diags.warn(SourceLoc::new(1), Warning::MultipleRex);
        assert!(!diags.has_errors());
        diags.error(&Error::new(ErrorKind::InvalidEa, SourceLoc::new(2)));
        assert!(diags.has_errors());
        assert_eq!(diags.len(), 2);
    }
}
