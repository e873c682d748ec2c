//! Contract inheritance graph.
//!
//! Provides [`ContractId`], [`ContractGraph`] and the C3 linearization used
//! to order base contracts (most derived first), together with
//! [`LinearizationError`] for cyclic or inconsistent hierarchies.

use std::fmt;

use rustc_hash::FxHashMap;
use serde::Serialize;

/// A unique identifier for a contract, interface or library.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ContractId(pub u32);

/// A contract node in the inheritance graph.
#[derive(Debug)]
pub struct ContractNode {
    pub id: ContractId,
    pub name: String,
    /// Direct bases in the order they appear in the `is` list.
    pub bases: Vec<ContractId>,
}

/// Error returned when a contract hierarchy has no valid linearization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinearizationError {
    /// A contract inherits from itself, directly or transitively.
    /// The path ends with the repeated name, e.g. `["A", "B", "A"]`.
    Cycle { path: Vec<String> },
    /// The base lists order two contracts in opposite ways.
    Inconsistent { contract: String },
}

impl fmt::Display for LinearizationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinearizationError::Cycle { path } => {
                write!(f, "Definition of base has to precede definition of derived contract: {}", path.join(" -> "))
            }
            LinearizationError::Inconsistent { contract } => {
                write!(f, "Linearization of inheritance graph impossible for {}", contract)
            }
        }
    }
}

impl std::error::Error for LinearizationError {}

/// A directed graph of contracts and their direct bases.
///
/// Contracts are stored in insertion order and identified by [`ContractId`].
#[derive(Debug, Default)]
pub struct ContractGraph {
    contracts: Vec<ContractNode>,
    name_to_id: FxHashMap<String, ContractId>,
}

impl ContractGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a contract and return its sequentially assigned [`ContractId`].
    pub fn add_contract(&mut self, name: impl Into<String>) -> ContractId {
        let name = name.into();
        let id = ContractId(self.contracts.len() as u32);
        self.name_to_id.insert(name.clone(), id);
        self.contracts.push(ContractNode {
            id,
            name,
            bases: Vec::new(),
        });
        id
    }

    pub fn resolve(&self, name: &str) -> Option<ContractId> {
        self.name_to_id.get(name).copied()
    }

    /// Record that `derived` lists `base` in its `is` clause.
    /// Duplicates are ignored; the first position wins.
    pub fn add_base(&mut self, derived: ContractId, base: ContractId) {
        let bases = &mut self.contracts[derived.0 as usize].bases;
        if !bases.contains(&base) {
            bases.push(base);
        }
    }

    pub fn get(&self, id: ContractId) -> &ContractNode {
        &self.contracts[id.0 as usize]
    }

    pub fn len(&self) -> usize {
        self.contracts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contracts.is_empty()
    }

    /// C3 linearization of `id`, most derived first.
    ///
    /// Bases listed later in the `is` clause are considered more derived,
    /// so `contract C is A, B` linearizes to `[C, B, A, ...]`.
    pub fn linearize(&self, id: ContractId) -> Result<Vec<ContractId>, LinearizationError> {
        let mut stack = Vec::new();
        self.linearize_inner(id, &mut stack)
    }

    /// Linearize every contract, in insertion order.
    pub fn linearize_all(&self) -> Result<Vec<Vec<ContractId>>, LinearizationError> {
        self.contracts
            .iter()
            .map(|contract| self.linearize(contract.id))
            .collect()
    }

    fn linearize_inner(
        &self,
        id: ContractId,
        stack: &mut Vec<ContractId>,
    ) -> Result<Vec<ContractId>, LinearizationError> {
        if let Some(pos) = stack.iter().position(|c| *c == id) {
            let mut path: Vec<String> = stack[pos..]
                .iter()
                .map(|c| self.get(*c).name.clone())
                .collect();
            path.push(self.get(id).name.clone());
            return Err(LinearizationError::Cycle { path });
        }

        stack.push(id);
        let bases = &self.get(id).bases;
        let mut sequences = Vec::with_capacity(bases.len() + 1);
        for base in bases.iter().rev() {
            sequences.push(self.linearize_inner(*base, stack)?);
        }
        sequences.push(bases.iter().rev().copied().collect::<Vec<_>>());
        stack.pop();

        let mut result = vec![id];
        loop {
            sequences.retain(|seq| !seq.is_empty());
            if sequences.is_empty() {
                return Ok(result);
            }
            // A head is acceptable if it does not appear in the tail of any sequence.
            let head = sequences
                .iter()
                .map(|seq| seq[0])
                .find(|candidate| !sequences.iter().any(|seq| seq[1..].contains(candidate)));
            let Some(head) = head else {
                return Err(LinearizationError::Inconsistent {
                    contract: self.get(id).name.clone(),
                });
            };
            result.push(head);
            for seq in &mut sequences {
                if seq[0] == head {
                    seq.remove(0);
                }
            }
        }
    }
}
