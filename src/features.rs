//! CPU feature gating.
//!
//! Every instruction form names up to three required features; the form is
//! only eligible when all three are present in the session's active mask.
//! The mask is a plain 64-bit set, fixed at session configuration time.

use core::fmt;

/// A CPU feature bit.
///
/// `Any` is the always-present filler used by forms that need fewer than
/// three gates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum CpuFeature {
    Any = 0,
    // Privilege/visibility classes.
    Priv,
    Prot,
    Undoc,
    Obs,
    // Functional units.
    Fpu,
    Mmx,
    Sse,
    Sse2,
    Sse3,
    Ssse3,
    Sse41,
    Sse42,
    Sse4a,
    Avx,
    Avx2,
    Fma,
    Xop,
    Aes,
    Clmul,
    Movbe,
    F16c,
    Smm,
    Svm,
    PadLock,
    ThreeDNow,
    Cyrix,
    Amd,
    Em64t,
    // Processor generations.
    I186,
    I286,
    I386,
    I486,
    I586,
    I686,
    P3,
    P4,
    Ia64,
    K6,
    Athlon,
    Hammer,
}

impl CpuFeature {
    /// Display name used by `REQUIRES_CPU` diagnostics.
    pub fn name(self) -> &'static str {
        use CpuFeature::*;
        match self {
            Any => "",
            Priv => " Privileged",
            Prot => " Protected",
            Undoc => " Undocumented",
            Obs => " Obsolete",
            Fpu => " FPU",
            Mmx => " MMX",
            Sse => " SSE",
            Sse2 => " SSE2",
            Sse3 => " SSE3",
            Ssse3 => " SSSE3",
            Sse41 => " SSE4.1",
            Sse42 => " SSE4.2",
            Sse4a => " SSE4a",
            Avx => " AVX",
            Avx2 => " AVX2",
            Fma => " FMA",
            Xop => " XOP",
            Aes => " AES",
            Clmul => " CLMUL",
            Movbe => " MOVBE",
            F16c => " F16C",
            Smm => " SMM",
            Svm => " SVM",
            PadLock => " PadLock",
            ThreeDNow => " 3DNow",
            Cyrix => " Cyrix",
            Amd => " AMD",
            Em64t => " EM64T",
            I186 => " 186",
            I286 => " 286",
            I386 => " 386",
            I486 => " 486",
            I586 => " 586",
            I686 => " 686",
            P3 => " P3",
            P4 => " P4",
            Ia64 => " IA64",
            K6 => " K6",
            Athlon => " Athlon",
            Hammer => " Hammer",
        }
    }
}

/// A set of CPU features.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CpuMask(u64);

impl CpuMask {
    /// The empty set. `Any` is nevertheless always considered present.
    pub fn empty() -> Self {
        CpuMask(0)
    }

    /// Add a feature, builder style.
    #[must_use]
    pub fn with(mut self, feature: CpuFeature) -> Self {
        self.insert(feature);
        self
    }

    pub fn insert(&mut self, feature: CpuFeature) {
        self.0 |= 1 << (feature as u8);
    }

    pub fn remove(&mut self, feature: CpuFeature) {
        self.0 &= !(1 << (feature as u8));
    }

    pub fn contains(&self, feature: CpuFeature) -> bool {
        matches!(feature, CpuFeature::Any) || self.0 & (1 << (feature as u8)) != 0
    }

    /// True when every feature named by `gates` is active.
    pub fn satisfies(&self, gates: &[CpuFeature; 3]) -> bool {
        gates.iter().all(|f| self.contains(*f))
    }

    /// A typical 32-bit protected-mode machine: everything through P4/SSE3,
    /// with the privileged/obsolete/undocumented classes enabled the way an
    /// assembler defaults them.
    pub fn baseline_32() -> Self {
        use CpuFeature::*;
        let mut mask = CpuMask::empty();
        for f in [
            Priv, Prot, Undoc, Obs, Fpu, Mmx, Sse, Sse2, Sse3, Smm, I186, I286,
            I386, I486, I586, I686, P3, P4,
        ] {
            mask.insert(f);
        }
        mask
    }

    /// [`CpuMask::baseline_32`] plus 64-bit and the SSSE3..AVX2/FMA/XOP tier.
    pub fn baseline_64() -> Self {
        use CpuFeature::*;
        let mut mask = Self::baseline_32();
        for f in [
            Em64t, Hammer, Amd, Ssse3, Sse41, Sse42, Sse4a, Avx, Avx2, Fma, Xop,
            Aes, Clmul, Movbe, F16c, Svm,
        ] {
            mask.insert(f);
        }
        mask
    }
}

/// The feature list for a `REQUIRES_CPU` diagnostic: the names of the
/// gates of a form, e.g. `" AVX"`.
pub struct MissingFeatures(pub [CpuFeature; 3]);

impl fmt::Display for MissingFeatures {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for feature in self.0 {
            write!(f, "{}", feature.name())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn any_always_present() {
        let mask = CpuMask::empty();
        assert!(mask.contains(CpuFeature::Any));
        assert!(!mask.contains(CpuFeature::Avx));
        assert!(mask.satisfies(&[CpuFeature::Any; 3]));
    }

    #[test]
    fn gates() {
        let mask = CpuMask::empty().with(CpuFeature::Avx);
        assert!(mask.satisfies(&[CpuFeature::Avx, CpuFeature::Any, CpuFeature::Any]));
        assert!(!mask.satisfies(&[CpuFeature::Avx2, CpuFeature::Any, CpuFeature::Any]));
    }

    #[test]
    fn missing_display() {
        let missing = MissingFeatures([
            CpuFeature::Avx,
            CpuFeature::I386,
            CpuFeature::Any,
        ]);
        assert_eq!(missing.to_string(), " AVX 386");
    }
}
