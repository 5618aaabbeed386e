//! Quantum gate types and their operand access modes.

use serde::{Deserialize, Serialize};

/// The way an instruction accesses one of its operands.
///
/// `Write`, `Read` and `Literal` are the classical access directions.
/// `Barrier` is a write that additionally marks the operand as a
/// synchronization point, and `Measure` is a write to a qubit that also
/// writes the implicit measurement bit paired with it. The `Commute*`
/// modes are qubit accesses that commute with other accesses along the
/// same Pauli axis: two Z-commuting accesses to the same qubit may be
/// freely reordered, but neither may be reordered with a write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperandMode {
    /// The operand is written (and possibly read).
    Write,
    /// The operand is only read.
    Read,
    /// The operand is a literal context; treated as a read.
    Literal,
    /// The operand is written and acts as a synchronization point.
    Barrier,
    /// The operand is a measured qubit; writes both the qubit and its
    /// implicit measurement bit.
    Measure,
    /// Qubit access commuting along the X axis.
    CommuteX,
    /// Qubit access commuting along the Y axis.
    CommuteY,
    /// Qubit access commuting along the Z axis.
    CommuteZ,
}

/// Standard gates with known semantics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StandardGate {
    /// Identity gate.
    I,
    /// Pauli-X gate.
    X,
    /// Pauli-Y gate.
    Y,
    /// Pauli-Z gate.
    Z,
    /// Hadamard gate.
    H,
    /// S gate (sqrt(Z)).
    S,
    /// S-dagger gate.
    Sdg,
    /// T gate (fourth root of Z).
    T,
    /// T-dagger gate.
    Tdg,
    /// sqrt(X) gate.
    SX,
    /// Rotation around X axis.
    Rx(f64),
    /// Rotation around Y axis.
    Ry(f64),
    /// Rotation around Z axis.
    Rz(f64),
    /// Phase gate.
    P(f64),
    /// Universal single-qubit gate U(θ, φ, λ).
    U(f64, f64, f64),
    /// Controlled-X (CNOT) gate.
    CX,
    /// Controlled-Y gate.
    CY,
    /// Controlled-Z gate.
    CZ,
    /// Controlled rotation around Z.
    CRz(f64),
    /// Controlled phase gate.
    CP(f64),
    /// XX rotation gate.
    RXX(f64),
    /// YY rotation gate.
    RYY(f64),
    /// ZZ rotation gate.
    RZZ(f64),
    /// SWAP gate.
    Swap,
    /// Toffoli gate (CCX).
    CCX,
}

impl StandardGate {
    /// Get the name of this gate.
    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            StandardGate::I => "id",
            StandardGate::X => "x",
            StandardGate::Y => "y",
            StandardGate::Z => "z",
            StandardGate::H => "h",
            StandardGate::S => "s",
            StandardGate::Sdg => "sdg",
            StandardGate::T => "t",
            StandardGate::Tdg => "tdg",
            StandardGate::SX => "sx",
            StandardGate::Rx(_) => "rx",
            StandardGate::Ry(_) => "ry",
            StandardGate::Rz(_) => "rz",
            StandardGate::P(_) => "p",
            StandardGate::U(_, _, _) => "u",
            StandardGate::CX => "cx",
            StandardGate::CY => "cy",
            StandardGate::CZ => "cz",
            StandardGate::CRz(_) => "crz",
            StandardGate::CP(_) => "cp",
            StandardGate::RXX(_) => "rxx",
            StandardGate::RYY(_) => "ryy",
            StandardGate::RZZ(_) => "rzz",
            StandardGate::Swap => "swap",
            StandardGate::CCX => "ccx",
        }
    }

    /// Get the number of qubits this gate operates on.
    #[inline]
    pub fn num_qubits(&self) -> u32 {
        self.operand_modes().len() as u32
    }

    /// Get the access mode for each qubit operand, in operand order.
    ///
    /// The modes encode how the gate commutes: diagonal gates and
    /// rotations around Z access their qubits in `CommuteZ` mode, X
    /// rotations in `CommuteX` mode, and gates without a single
    /// commutation axis (H, U, Swap) access their qubits in `Write`
    /// mode.
    pub fn operand_modes(&self) -> &'static [OperandMode] {
        use OperandMode::*;
        match self {
            StandardGate::I => &[Read],

            StandardGate::X | StandardGate::SX | StandardGate::Rx(_) => &[CommuteX],
            StandardGate::Y | StandardGate::Ry(_) => &[CommuteY],
            StandardGate::Z
            | StandardGate::S
            | StandardGate::Sdg
            | StandardGate::T
            | StandardGate::Tdg
            | StandardGate::Rz(_)
            | StandardGate::P(_) => &[CommuteZ],
            StandardGate::H | StandardGate::U(_, _, _) => &[Write],

            StandardGate::CX => &[CommuteZ, CommuteX],
            StandardGate::CY => &[CommuteZ, CommuteY],
            StandardGate::CZ | StandardGate::CRz(_) | StandardGate::CP(_) => {
                &[CommuteZ, CommuteZ]
            }
            StandardGate::RXX(_) => &[CommuteX, CommuteX],
            StandardGate::RYY(_) => &[CommuteY, CommuteY],
            StandardGate::RZZ(_) => &[CommuteZ, CommuteZ],
            StandardGate::Swap => &[Write, Write],

            StandardGate::CCX => &[CommuteZ, CommuteZ, CommuteX],
        }
    }
}

/// A user-defined gate with explicit operand access modes.
///
/// Custom gates carry their own commutation information, so gate sets
/// not covered by [`StandardGate`] can still participate in axis-aware
/// dependency analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomGate {
    /// The name of the gate.
    pub name: String,
    /// The access mode for each qubit operand.
    pub operand_modes: Vec<OperandMode>,
}

impl CustomGate {
    /// Create a new custom gate accessing all operands in write mode.
    pub fn new(name: impl Into<String>, num_qubits: u32) -> Self {
        Self {
            name: name.into(),
            operand_modes: vec![OperandMode::Write; num_qubits as usize],
        }
    }

    /// Set the operand access modes.
    #[must_use]
    pub fn with_operand_modes(mut self, modes: Vec<OperandMode>) -> Self {
        self.operand_modes = modes;
        self
    }

    /// Get the number of qubits this gate operates on.
    #[inline]
    pub fn num_qubits(&self) -> u32 {
        self.operand_modes.len() as u32
    }
}

/// A quantum gate, either standard or custom.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GateKind {
    /// A standard gate with known semantics.
    Standard(StandardGate),
    /// A custom user-defined gate.
    Custom(CustomGate),
}

impl GateKind {
    /// Get the name of this gate.
    #[inline]
    pub fn name(&self) -> &str {
        match self {
            GateKind::Standard(g) => g.name(),
            GateKind::Custom(g) => &g.name,
        }
    }

    /// Get the number of qubits.
    #[inline]
    pub fn num_qubits(&self) -> u32 {
        match self {
            GateKind::Standard(g) => g.num_qubits(),
            GateKind::Custom(g) => g.num_qubits(),
        }
    }

    /// Get the access mode for each qubit operand.
    pub fn operand_modes(&self) -> &[OperandMode] {
        match self {
            GateKind::Standard(g) => g.operand_modes(),
            GateKind::Custom(g) => &g.operand_modes,
        }
    }
}

impl From<StandardGate> for GateKind {
    fn from(gate: StandardGate) -> Self {
        GateKind::Standard(gate)
    }
}

impl From<CustomGate> for GateKind {
    fn from(gate: CustomGate) -> Self {
        GateKind::Custom(gate)
    }
}
