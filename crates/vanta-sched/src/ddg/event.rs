//! Static references, access modes and the events that statements
//! perform on them.
//!
//! Dependency analysis works on *events*: a statement accesses a set of
//! storage locations, each in some access mode. Two statements may be
//! reordered exactly when every pair of their events commutes. The
//! types in this module implement the may-alias logic over references
//! and the commutation rules over modes.

use std::fmt;

use vanta_ir::{ClbitId, Instruction, InstructionKind, OperandMode, QubitId};

/// The register an event refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Object {
    /// The quantum register.
    Qubits,
    /// The classical register.
    Clbits,
}

impl fmt::Display for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Object::Qubits => write!(f, "q"),
            Object::Clbits => write!(f, "c"),
        }
    }
}

/// The type of data stored at a referenced location.
///
/// A qubit location can be viewed as its main qubit type or as the
/// implicit classical bit that holds its latest measurement result; the
/// two views are distinct locations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DataType {
    /// Quantum state.
    Qubit,
    /// A classical bit.
    Bit,
}

/// A statically-known reference to a storage location, or to the global
/// state of the system.
///
/// A reference consists of a target register, the data type under which
/// it is accessed, and a statically-known index prefix. A reference
/// with fewer indices refers to a superset of the locations referred to
/// by one with more: `q` covers `q[2]`. The *global* reference (no
/// target) covers everything, including state not otherwise modeled.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Reference {
    /// The register referred to, or `None` for the global state.
    pub target: Option<Object>,
    /// The data type under which the target is accessed.
    pub data_type: DataType,
    /// Statically-known indices, major dimension first.
    pub indices: Vec<u64>,
}

impl Reference {
    /// A reference to the global state of the system.
    pub fn global() -> Self {
        Self {
            target: None,
            data_type: DataType::Qubit,
            indices: vec![],
        }
    }

    /// A reference to the quantum state of a qubit.
    pub fn qubit(qubit: QubitId) -> Self {
        Self {
            target: Some(Object::Qubits),
            data_type: DataType::Qubit,
            indices: vec![qubit.0 as u64],
        }
    }

    /// A reference to the implicit measurement bit of a qubit.
    pub fn implicit_bit(qubit: QubitId) -> Self {
        Self {
            target: Some(Object::Qubits),
            data_type: DataType::Bit,
            indices: vec![qubit.0 as u64],
        }
    }

    /// A reference to a classical bit.
    pub fn clbit(clbit: ClbitId) -> Self {
        Self {
            target: Some(Object::Clbits),
            data_type: DataType::Bit,
            indices: vec![clbit.0 as u64],
        }
    }

    /// Whether this refers to the global state of the system.
    #[inline]
    pub fn is_global_state(&self) -> bool {
        self.target.is_none()
    }

    /// Whether the two references provably refer to distinct locations.
    ///
    /// This is conservative: `false` means the references *may* alias,
    /// not that they do.
    pub fn is_provably_distinct_from(&self, other: &Reference) -> bool {
        // The global state aliases everything.
        if self.is_global_state() || other.is_global_state() {
            return false;
        }
        if self.target != other.target {
            return true;
        }
        // Distinct data types on the same target refer to distinct
        // state: the implicit measurement bit of a qubit is not the
        // qubit itself.
        if self.data_type != other.data_type {
            return true;
        }
        // Same object. If any aligned statically-known index pair
        // differs, the elements are distinct; a prefix relationship
        // means one may contain the other.
        self.indices
            .iter()
            .zip(&other.indices)
            .any(|(a, b)| a != b)
    }

    /// Whether `other` refers to a superset of the locations this
    /// reference refers to.
    pub fn is_shadowed_by(&self, other: &Reference) -> bool {
        if other.is_global_state() {
            return true;
        }
        if self.is_global_state() {
            return false;
        }
        if self.target != other.target || self.data_type != other.data_type {
            return false;
        }
        // A shadowing reference has an index prefix of ours.
        if other.indices.len() > self.indices.len() {
            return false;
        }
        self.indices
            .iter()
            .zip(&other.indices)
            .all(|(a, b)| a == b)
    }

    /// The most specific single reference that covers both `self` and
    /// `other`.
    pub fn union_with(&self, other: &Reference) -> Reference {
        if self.is_global_state()
            || other.is_global_state()
            || self.target != other.target
            || self.data_type != other.data_type
        {
            return Reference::global();
        }
        let indices = self
            .indices
            .iter()
            .zip(&other.indices)
            .take_while(|(a, b)| a == b)
            .map(|(a, _)| *a)
            .collect();
        Reference {
            target: self.target,
            data_type: self.data_type,
            indices,
        }
    }

    /// The most specific single reference that covers the intersection
    /// of `self` and `other`.
    pub fn intersect_with(&self, other: &Reference) -> Reference {
        if self.is_global_state() {
            return other.clone();
        }
        if other.is_global_state() {
            return self.clone();
        }
        if self.target != other.target || self.data_type != other.data_type {
            return Reference::global();
        }
        let mut indices = Vec::new();
        for (a, b) in self.indices.iter().zip(&other.indices) {
            if a != b {
                return Reference {
                    target: self.target,
                    data_type: self.data_type,
                    indices,
                };
            }
            indices.push(*a);
        }
        // All aligned indices match, so one reference is contained in
        // the other; return the more specific one.
        if self.indices.len() > other.indices.len() {
            self.clone()
        } else {
            other.clone()
        }
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(target) = self.target else {
            return write!(f, "<global>");
        };
        match (target, self.data_type) {
            (Object::Qubits, DataType::Bit) => write!(f, "bit(q")?,
            _ => write!(f, "{target}")?,
        }
        if let Some(first) = self.indices.first() {
            write!(f, "[{first}")?;
            for index in &self.indices[1..] {
                write!(f, ", {index}")?;
            }
            write!(f, "]")?;
        } else {
            write!(f, "[*]")?;
        }
        if target == Object::Qubits && self.data_type == DataType::Bit {
            write!(f, ")")?;
        }
        Ok(())
    }
}

/// The mode in which an event accesses its reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessMode {
    /// The location is written. Commutes with nothing.
    Write,
    /// The location is only read. Commutes with other reads.
    Read,
    /// Qubit access commuting along the X axis.
    CommuteX,
    /// Qubit access commuting along the Y axis.
    CommuteY,
    /// Qubit access commuting along the Z axis.
    CommuteZ,
}

impl AccessMode {
    /// Single-letter form, used to render dependency types (RAW, WAR,
    /// ZAZ, ...).
    pub fn as_letter(self) -> char {
        match self {
            AccessMode::Write => 'W',
            AccessMode::Read => 'R',
            AccessMode::CommuteX => 'X',
            AccessMode::CommuteY => 'Y',
            AccessMode::CommuteZ => 'Z',
        }
    }

    /// Whether two accesses in these modes to the same location may be
    /// reordered. Symmetric.
    pub fn commutes_with(self, other: AccessMode) -> bool {
        // Every mode except write commutes with itself.
        self == other && self != AccessMode::Write
    }

    /// Combine two modes on the same location into one.
    ///
    /// The result must not commute with anything that fails to commute
    /// with either input, so unequal modes collapse to write.
    pub fn combine_with(self, other: AccessMode) -> AccessMode {
        if self.commutes_with(other) {
            self
        } else {
            AccessMode::Write
        }
    }
}

impl fmt::Display for AccessMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessMode::Write => write!(f, "write"),
            AccessMode::Read => write!(f, "read"),
            AccessMode::CommuteX => write!(f, "commute-x"),
            AccessMode::CommuteY => write!(f, "commute-y"),
            AccessMode::CommuteZ => write!(f, "commute-z"),
        }
    }
}

/// A single access performed by a statement: a reference and the mode
/// it is accessed in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    /// The location accessed.
    pub reference: Reference,
    /// How it is accessed.
    pub mode: AccessMode,
}

impl Event {
    /// A write to the global state of the system, as performed by
    /// barriers and the graph sentinels.
    pub fn global_barrier() -> Self {
        Self {
            reference: Reference::global(),
            mode: AccessMode::Write,
        }
    }

    /// Whether this event may be reordered with `other`: the locations
    /// are provably distinct, or the modes commute.
    pub fn commutes_with(&self, other: &Event) -> bool {
        self.mode.commutes_with(other.mode)
            || self.reference.is_provably_distinct_from(&other.reference)
    }

    /// Whether `other` completely shadows this event: the modes do not
    /// commute and `other`'s reference covers ours.
    pub fn is_shadowed_by(&self, other: &Event) -> bool {
        !self.mode.commutes_with(other.mode) && self.reference.is_shadowed_by(&other.reference)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.mode.as_letter(), self.reference)
    }
}

/// The kind of dependency between two statements, in terms of the
/// access modes of the two conflicting events in program order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DependencyType {
    /// Access mode of the earlier statement.
    pub first_mode: AccessMode,
    /// Access mode of the later statement.
    pub second_mode: AccessMode,
}

impl fmt::Display for DependencyType {
    /// Renders in the usual "X-after-Y" form: a read following a write
    /// displays as `RAW`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}A{}",
            self.second_mode.as_letter(),
            self.first_mode.as_letter()
        )
    }
}

/// A reason for a dependency edge: the location both endpoints access
/// and the kind of conflict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cause {
    /// The (intersected) location both statements access.
    pub reference: Reference,
    /// The kind of conflict.
    pub dependency_type: DependencyType,
}

impl fmt::Display for Cause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.dependency_type, self.reference)
    }
}

/// Collects the events performed by a statement.
///
/// Accesses to the same reference are merged with
/// [`AccessMode::combine_with`], so each reference appears at most once
/// in the result. Commutation of gate operands can be disabled per
/// arity, which degrades the commuting modes to plain writes.
#[derive(Debug)]
pub struct EventGatherer {
    /// Allow single-qubit gates to commute on their operand.
    commute_single_qubit: bool,
    /// Allow multi-qubit gates to commute on their operands.
    commute_multi_qubit: bool,
    events: std::collections::BTreeMap<Reference, AccessMode>,
}

impl EventGatherer {
    /// Create a gatherer with the given commutation settings.
    pub fn new(commute_single_qubit: bool, commute_multi_qubit: bool) -> Self {
        Self {
            commute_single_qubit,
            commute_multi_qubit,
            events: std::collections::BTreeMap::new(),
        }
    }

    fn add(&mut self, reference: Reference, mode: AccessMode) {
        self.events
            .entry(reference)
            .and_modify(|existing| *existing = existing.combine_with(mode))
            .or_insert(mode);
    }

    /// Gather the events of a single instruction, replacing any
    /// previously gathered set.
    pub fn gather(&mut self, instruction: &Instruction) -> Vec<Event> {
        self.events.clear();

        match &instruction.kind {
            InstructionKind::Gate(gate) => {
                let commute = if instruction.qubits.len() > 1 {
                    self.commute_multi_qubit
                } else {
                    self.commute_single_qubit
                };
                for (&qubit, &mode) in instruction.qubits.iter().zip(gate.operand_modes()) {
                    let mode = normalize_operand_mode(mode, commute);
                    match mode {
                        NormalizedMode::Plain(mode) => {
                            self.add(Reference::qubit(qubit), mode);
                        }
                        NormalizedMode::Measure => {
                            self.add(Reference::qubit(qubit), AccessMode::Write);
                            self.add(Reference::implicit_bit(qubit), AccessMode::Write);
                        }
                    }
                }
            }
            InstructionKind::Measure => {
                for &qubit in &instruction.qubits {
                    self.add(Reference::qubit(qubit), AccessMode::Write);
                    self.add(Reference::implicit_bit(qubit), AccessMode::Write);
                }
            }
            InstructionKind::Reset | InstructionKind::Delay => {
                for &qubit in &instruction.qubits {
                    self.add(Reference::qubit(qubit), AccessMode::Write);
                }
            }
            InstructionKind::Barrier => {
                if instruction.qubits.is_empty() {
                    self.add(Reference::global(), AccessMode::Write);
                } else {
                    for &qubit in &instruction.qubits {
                        self.add(Reference::qubit(qubit), AccessMode::Write);
                    }
                }
            }
        }

        for &clbit in &instruction.clbits {
            self.add(Reference::clbit(clbit), AccessMode::Write);
        }
        for &clbit in &instruction.condition {
            self.add(Reference::clbit(clbit), AccessMode::Read);
        }

        // A statement we can't see into must be treated as touching
        // everything.
        if self.events.is_empty() {
            self.add(Reference::global(), AccessMode::Write);
        }

        self.events
            .iter()
            .map(|(reference, &mode)| Event {
                reference: reference.clone(),
                mode,
            })
            .collect()
    }
}

enum NormalizedMode {
    Plain(AccessMode),
    Measure,
}

fn normalize_operand_mode(mode: OperandMode, commute: bool) -> NormalizedMode {
    let commuting = |axis: AccessMode| {
        if commute {
            NormalizedMode::Plain(axis)
        } else {
            NormalizedMode::Plain(AccessMode::Write)
        }
    };
    match mode {
        OperandMode::Write | OperandMode::Barrier => NormalizedMode::Plain(AccessMode::Write),
        OperandMode::Read | OperandMode::Literal => NormalizedMode::Plain(AccessMode::Read),
        OperandMode::Measure => NormalizedMode::Measure,
        OperandMode::CommuteX => commuting(AccessMode::CommuteX),
        OperandMode::CommuteY => commuting(AccessMode::CommuteY),
        OperandMode::CommuteZ => commuting(AccessMode::CommuteZ),
    }
}
