//! Vanta Circuit Intermediate Representation
//!
//! This crate provides the data structures the Vanta scheduling engine
//! consumes: qubit and classical-bit addressing, gates with per-operand
//! access modes, instructions with durations in cycles, and blocks as
//! ordered statement sequences.
//!
//! # Overview
//!
//! A [`Block`] is a straight-line sequence of [`Instruction`]s. Each
//! instruction exposes its operands together with the [`OperandMode`] in
//! which they are accessed; for quantum gates the mode encodes the
//! commutation axis of the operand (a CZ accesses both of its qubits in
//! Z-commuting mode, a CX accesses its control in Z-commuting mode and
//! its target in X-commuting mode, and so on). The scheduler uses these
//! modes to decide which instruction pairs may be reordered.
//!
//! # Example
//!
//! ```rust
//! use vanta_ir::{Block, QubitId, ClbitId};
//!
//! let mut block = Block::with_size("bell", 2, 2);
//! block.h(QubitId(0)).unwrap();
//! block.cx(QubitId(0), QubitId(1)).unwrap();
//! block.measure(QubitId(0), ClbitId(0)).unwrap();
//! block.measure(QubitId(1), ClbitId(1)).unwrap();
//!
//! assert_eq!(block.len(), 4);
//! ```

pub mod block;
pub mod error;
pub mod gate;
pub mod instruction;
pub mod qubit;

pub use block::Block;
pub use error::{IrError, IrResult};
pub use gate::{CustomGate, GateKind, OperandMode, StandardGate};
pub use instruction::{Instruction, InstructionKind};
pub use qubit::{ClbitId, QubitId};
