//! An x86/AMD64 instruction encoder.
//!
//! This crate turns parsed instructions — a mnemonic plus typed operands
//! and prefixes — into the exact byte sequences an object file needs,
//! together with relocation records for symbolic operands. It covers form
//! matching over static instruction tables, effective-address analysis
//! with full REX/VEX/XOP discipline, span-dependent sizing of jumps and
//! immediates, and serialisation in strict prefix/opcode/ModR-M/SIB/
//! displacement/immediate order.
//!
//! The expected driver loop: recognise a mnemonic with
//! [`lookup::parse_insn`], attach operands, and encode into a
//! [`Section`]; then run [`Section::resolve`] to converge span-dependent
//! sizes and [`Section::to_bytes`] to get the bytes and relocations.
//!
//! ```
//! use assembler_x86::{
//!     Config, Diagnostics, Expr, Operand, Section, SymbolTable,
//!     lookup::parse_insn, regs::gpr, SourceLoc,
//! };
//!
//! let config = Config::new(64);
//! let mut section = Section::new();
//! let mut symtab = SymbolTable::new();
//! let mut diags = Diagnostics::new();
//!
//! // mov eax, 1
//! let mut insn = parse_insn("mov", &config, SourceLoc::new(1))
//!     .unwrap()
//!     .expect("mov is a mnemonic");
//! insn.push_operand(Operand::reg(gpr::EAX));
//! insn.push_operand(Operand::imm(Expr::from_const(1)));
//! insn.encode(&mut section, &symtab, &mut diags).unwrap();
//!
//! section.resolve(&symtab, &mut diags).unwrap();
//! let (bytes, relocs) = section.to_bytes(&symtab).unwrap();
//! assert_eq!(bytes, vec![0xB8, 0x01, 0x00, 0x00, 0x00]);
//! assert!(relocs.is_empty());
//! ```

mod common;
mod container;
mod diag;
mod effaddr;
mod encode;
mod expr;
mod features;
mod insn;
mod jmp;
pub mod lookup;
mod opcode;
mod prefix;
pub mod regs;
mod rex;
pub mod tables;
mod value;
mod vex;

pub use common::InsnCommon;
pub use container::{
    define_label_here, label_offset, BcKind, Bytecode, CodeOffset, Contents,
    OutputContext, Reloc, Section,
};
pub use diag::{
    Diagnostic, Diagnostics, EncodeResult, Error, ErrorKind, Severity,
    SourceLoc, Warning,
};
pub use effaddr::{EffAddr, NeedSib, VsibMode};
pub use expr::{Expr, Symbol, SymbolId, SymbolKind, SymbolTable, Term};
pub use features::{CpuFeature, CpuMask};
pub use insn::{Config, Dialect, Insn, Operand, OperandKind};
pub use opcode::Opcode;
pub use prefix::{Prefix, PrefixKind};
pub use regs::{Reg, RegClass, SegReg, TargetMod};
pub use rex::{Rex, RexBit};
pub use value::Value;
