//! The bytecode container: ordered instruction bytes, span resolution,
//! and relocation output.
//!
//! Each appended instruction becomes one [`Bytecode`]: a fixed byte prefix
//! (with embedded relocatable values) plus an optional tail whose length
//! depends on span resolution. Encoders append fixed bytes directly when
//! the encoding is final and attach a [`BcKind`] tail otherwise.
//!
//! Span resolution is a fixpoint: compute initial lengths, then re-check
//! every registered span against the current label offsets, expanding
//! tails until nothing changes. Appends are totally ordered with parse
//! order, and relocations refer to offsets strictly inside their
//! instruction's emitted range.

use crate::diag::{Diagnostics, EncodeResult, Error, ErrorKind, SourceLoc};
use crate::expr::{SymbolId, SymbolKind, SymbolTable};
use crate::value::Value;
use log::{debug, trace};

/// Offset in bytes from the beginning of the section.
pub type CodeOffset = u32;

/// A relocation attached to an emitted value that still references a
/// symbol after same-section resolution.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Reloc {
    /// Section offset of the value's first byte.
    pub offset: CodeOffset,
    pub sym: SymbolId,
    /// Constant addend, already written into the value's bytes.
    pub addend: i64,
    /// Size in bits.
    pub size: u16,
    pub signed: bool,
    /// PC-relative fixup.
    pub relative: bool,
    pub jump_target: bool,
    /// The segment portion of the symbol's address is wanted.
    pub seg_of: bool,
    /// Offset from the start of the instruction to the value.
    pub insn_start: u32,
    /// Offset from the end of the value to the end of the instruction.
    pub next_insn: u32,
}

/// The span-resolution contract every deferred bytecode implements.
///
/// `calc_len` may cache analysis results on the bytecode but must be
/// idempotent: identical span values produce identical lengths and the
/// same span registrations. Encoding changes (alternate opcodes, wider
/// displacements) happen only in `expand` and `finalize`.
pub trait Contents {
    /// Resolve expressions against the symbol table and apply any
    /// non-span-dependent rewrites.
    fn finalize(
        &mut self,
        symtab: &SymbolTable,
        diags: &mut Diagnostics,
    ) -> EncodeResult<()>;

    /// Return the tail length in bytes, registering a span via `add_span`
    /// for every size-dependent field: `(span_id, value, neg_thres,
    /// pos_thres)`.
    fn calc_len(
        &mut self,
        add_span: &mut dyn FnMut(u32, &Value, i64, i64),
    ) -> EncodeResult<u32>;

    /// Grow the encoding for `span` whose value moved from `old_val` to
    /// `new_val`, updating `len` and the thresholds in place. Return
    /// `false` once the span is fully expanded.
    fn expand(
        &mut self,
        len: &mut u32,
        span: u32,
        old_val: i64,
        new_val: i64,
        neg_thres: &mut i64,
        pos_thres: &mut i64,
    ) -> EncodeResult<bool>;

    /// Append the final bytes.
    fn output(&mut self, out: &mut OutputContext) -> EncodeResult<()>;
}

/// The deferred bytecode variants.
#[derive(Debug)]
pub enum BcKind {
    General(crate::encode::GeneralBc),
    Jmp(crate::jmp::JmpBc),
}

impl Contents for BcKind {
    fn finalize(
        &mut self,
        symtab: &SymbolTable,
        diags: &mut Diagnostics,
    ) -> EncodeResult<()> {
        match self {
            BcKind::General(bc) => bc.finalize(symtab, diags),
            BcKind::Jmp(bc) => bc.finalize(symtab, diags),
        }
    }

    fn calc_len(
        &mut self,
        add_span: &mut dyn FnMut(u32, &Value, i64, i64),
    ) -> EncodeResult<u32> {
        match self {
            BcKind::General(bc) => bc.calc_len(add_span),
            BcKind::Jmp(bc) => bc.calc_len(add_span),
        }
    }

    fn expand(
        &mut self,
        len: &mut u32,
        span: u32,
        old_val: i64,
        new_val: i64,
        neg_thres: &mut i64,
        pos_thres: &mut i64,
    ) -> EncodeResult<bool> {
        match self {
            BcKind::General(bc) => {
                bc.expand(len, span, old_val, new_val, neg_thres, pos_thres)
            }
            BcKind::Jmp(bc) => {
                bc.expand(len, span, old_val, new_val, neg_thres, pos_thres)
            }
        }
    }

    fn output(&mut self, out: &mut OutputContext) -> EncodeResult<()> {
        match self {
            BcKind::General(bc) => bc.output(out),
            BcKind::Jmp(bc) => bc.output(out),
        }
    }
}

/// One instruction's worth of output.
#[derive(Debug, Default)]
pub struct Bytecode {
    pub loc: SourceLoc,
    fixed: Vec<u8>,
    /// Values embedded in the fixed bytes, by offset within `fixed`.
    fixed_values: Vec<(u32, Value)>,
    contents: Option<BcKind>,
    /// Tail length from the last `calc_len`/`expand`.
    tail_len: u32,
    /// Section offset, computed during span resolution.
    offset: CodeOffset,
}

impl Bytecode {
    pub fn new(loc: SourceLoc) -> Self {
        Self { loc, ..Self::default() }
    }

    /// The fixed byte buffer, for encoders emitting final bytes.
    pub fn fixed_mut(&mut self) -> &mut Vec<u8> {
        &mut self.fixed
    }

    /// Reserve space for `value` in the fixed bytes.
    pub fn append_fixed_value(&mut self, value: Value) {
        let off = u32::try_from(self.fixed.len()).unwrap();
        self.fixed.resize(self.fixed.len() + usize::from(value.size / 8), 0);
        self.fixed_values.push((off, value));
    }

    /// Attach a span-dependent tail.
    pub fn set_contents(&mut self, contents: BcKind) {
        debug_assert!(self.contents.is_none());
        self.contents = Some(contents);
    }

    pub fn len(&self) -> u32 {
        u32::try_from(self.fixed.len()).unwrap() + self.tail_len
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn offset(&self) -> CodeOffset {
        self.offset
    }
}

struct Span {
    bc: usize,
    id: u32,
    value: Value,
    neg_thres: i64,
    pos_thres: i64,
    active: bool,
}

/// Where resolved instruction bytes and relocations accumulate.
pub struct OutputContext<'a> {
    bytes: &'a mut Vec<u8>,
    relocs: &'a mut Vec<Reloc>,
    symtab: &'a SymbolTable,
    label_offsets: &'a [CodeOffset],
}

impl OutputContext<'_> {
    /// Current section offset.
    pub fn pos(&self) -> CodeOffset {
        u32::try_from(self.bytes.len()).unwrap()
    }

    pub fn push(&mut self, byte: u8) {
        self.bytes.push(byte);
    }

    pub fn extend(&mut self, bytes: &[u8]) {
        self.bytes.extend_from_slice(bytes);
    }

    pub fn bytes_mut(&mut self) -> &mut Vec<u8> {
        self.bytes
    }

    /// Emit `value` at the current position: as a number when it resolves
    /// within the section, as relocation plus addend bytes otherwise.
    pub fn output_value(&mut self, value: &Value) -> EncodeResult<()> {
        let pos = self.pos();
        if let Some(num) = value.resolve(self.symtab, self.label_offsets, pos) {
            value.write_number(num, self.bytes);
            return Ok(());
        }
        let Some(sym) = value.rel else {
            return Err(Error::new(
                ErrorKind::Internal("unresolved non-symbolic value"),
                value.loc,
            ));
        };
        let addend = value.expr().intnum().ok_or_else(|| {
            Error::new(ErrorKind::Internal("non-constant relocation addend"), value.loc)
        })?;
        self.relocs.push(Reloc {
            offset: pos,
            sym,
            addend,
            size: value.size,
            signed: value.signed,
            relative: value.curpos_rel,
            jump_target: value.jump_target,
            seg_of: value.seg_of,
            insn_start: value.insn_start,
            next_insn: value.next_insn,
        });
        value.write_number(addend, self.bytes);
        Ok(())
    }
}

/// An ordered sequence of bytecodes plus their relocations.
#[derive(Debug, Default)]
pub struct Section {
    bcs: Vec<Bytecode>,
    resolved: bool,
}

// Hard backstop; any real input converges in a handful of passes.
const MAX_RESOLVE_PASSES: u32 = 1000;

impl Section {
    pub fn new() -> Self {
        Self::default()
    }

    /// The index the next appended bytecode will get; labels defined "here"
    /// point at it.
    pub fn next_bc_index(&self) -> u32 {
        u32::try_from(self.bcs.len()).unwrap()
    }

    pub fn append(&mut self, bc: Bytecode) {
        debug_assert!(!self.resolved);
        self.bcs.push(bc);
    }

    pub fn bytecodes(&self) -> &[Bytecode] {
        &self.bcs
    }

    /// Offsets of every bytecode, with the total length appended so a
    /// label on the end of the section also resolves.
    fn compute_offsets(&mut self) -> Vec<CodeOffset> {
        let mut offsets = Vec::with_capacity(self.bcs.len() + 1);
        let mut offset = 0;
        for bc in &mut self.bcs {
            bc.offset = offset;
            offsets.push(offset);
            offset += bc.len();
        }
        offsets.push(offset);
        offsets
    }

    /// Run span resolution to a fixpoint.
    pub fn resolve(
        &mut self,
        symtab: &SymbolTable,
        diags: &mut Diagnostics,
    ) -> EncodeResult<()> {
        let mut spans: Vec<Span> = Vec::new();

        // Initial lengths, collecting spans.
        for (i, bc) in self.bcs.iter_mut().enumerate() {
            if let Some(contents) = &mut bc.contents {
                contents.finalize(symtab, diags)?;
                let mut add_span = |id: u32, value: &Value, neg: i64, pos: i64| {
                    spans.push(Span {
                        bc: i,
                        id,
                        value: value.clone(),
                        neg_thres: neg,
                        pos_thres: pos,
                        active: true,
                    });
                };
                bc.tail_len = contents.calc_len(&mut add_span)?;
            }
        }
        debug!("resolving {} spans over {} bytecodes", spans.len(), self.bcs.len());

        let mut offsets = self.compute_offsets();
        let mut passes = 0;
        loop {
            passes += 1;
            if passes > MAX_RESOLVE_PASSES {
                return Err(Error::new(
                    ErrorKind::Internal("span resolution did not converge"),
                    SourceLoc::default(),
                ));
            }
            let mut go_again = false;
            for span in spans.iter_mut().filter(|s| s.active) {
                let bc = &mut self.bcs[span.bc];
                // Span values are measured from the start of their own
                // instruction, with no trailing-byte adjustment.
                let mut probe = span.value.clone();
                probe.next_insn = 0;
                let val = probe.resolve(symtab, &offsets, bc.offset);
                let out_of_range = match val {
                    Some(v) => v < span.neg_thres || v > span.pos_thres,
                    // Not resolvable in-section: assume the worst.
                    None => true,
                };
                if !out_of_range {
                    continue;
                }
                let new_val = val.unwrap_or(i64::MAX);
                trace!(
                    "span {} on bytecode {} at {:#x}: {:?} outside [{}, {}]",
                    span.id, span.bc, bc.offset, val, span.neg_thres, span.pos_thres
                );
                let contents = bc
                    .contents
                    .as_mut()
                    .expect("span registered by bytecode without contents");
                let keep = contents.expand(
                    &mut bc.tail_len,
                    span.id,
                    0,
                    new_val,
                    &mut span.neg_thres,
                    &mut span.pos_thres,
                )?;
                span.active = keep;
                go_again = true;
            }
            let new_offsets = self.compute_offsets();
            if new_offsets != offsets {
                offsets = new_offsets;
                go_again = true;
            }
            if !go_again {
                break;
            }
        }
        debug!("span resolution converged after {passes} passes");
        self.resolved = true;
        Ok(())
    }

    /// Produce the final bytes and relocations. [`Section::resolve`] must
    /// have run first.
    pub fn to_bytes(
        &mut self,
        symtab: &SymbolTable,
    ) -> EncodeResult<(Vec<u8>, Vec<Reloc>)> {
        assert!(self.resolved, "resolve() must run before to_bytes()");
        let offsets = self.compute_offsets();
        let mut bytes = Vec::new();
        let mut relocs = Vec::new();

        for bc in &mut self.bcs {
            debug_assert_eq!(u32::try_from(bytes.len()).unwrap(), bc.offset);
            let fixed_start = bytes.len();
            bytes.extend_from_slice(&bc.fixed);
            // Patch embedded values over their reserved bytes.
            for (off, value) in &bc.fixed_values {
                let at = fixed_start + *off as usize;
                let pos = u32::try_from(at).unwrap();
                let mut tmp = Vec::new();
                if let Some(num) = value.resolve(symtab, &offsets, pos) {
                    value.write_number(num, &mut tmp);
                } else {
                    let Some(sym) = value.rel else {
                        return Err(Error::new(
                            ErrorKind::Internal("unresolved non-symbolic value"),
                            value.loc,
                        ));
                    };
                    let addend = value.expr().intnum().ok_or_else(|| {
                        Error::new(
                            ErrorKind::Internal("non-constant relocation addend"),
                            value.loc,
                        )
                    })?;
                    relocs.push(Reloc {
                        offset: pos,
                        sym,
                        addend,
                        size: value.size,
                        signed: value.signed,
                        relative: value.curpos_rel,
                        jump_target: value.jump_target,
                        seg_of: value.seg_of,
                        insn_start: value.insn_start,
                        next_insn: value.next_insn,
                    });
                    value.write_number(addend, &mut tmp);
                }
                bytes[at..at + tmp.len()].copy_from_slice(&tmp);
            }
            if let Some(contents) = &mut bc.contents {
                let mut ctx = OutputContext {
                    bytes: &mut bytes,
                    relocs: &mut relocs,
                    symtab,
                    label_offsets: &offsets,
                };
                let tail_start = ctx.pos();
                contents.output(&mut ctx)?;
                let written = ctx.pos() - tail_start;
                debug_assert_eq!(
                    written, bc.tail_len,
                    "emitted byte count disagrees with resolved length"
                );
            }
        }
        Ok((bytes, relocs))
    }
}

/// Define `name` as a label at the current end of `section`.
pub fn define_label_here(
    symtab: &mut SymbolTable,
    section: &Section,
    name: &str,
) -> SymbolId {
    let id = symtab.intern(name);
    symtab.define_label(id, section.next_bc_index());
    id
}

/// The section offset a label resolves to, if it is one.
pub fn label_offset(
    symtab: &SymbolTable,
    offsets: &[CodeOffset],
    id: SymbolId,
) -> Option<CodeOffset> {
    match symtab.get(id).kind {
        SymbolKind::Label(bc) => offsets.get(bc as usize).copied(),
        _ => None,
    }
}
