//! Declaration store.
//!
//! The type engine does not own an AST. Structs, enums, contracts and
//! functions are registered here by the semantic analyzer (or by tests), and
//! types refer to them by id. Member types of declarations are interned
//! [`TypeId`]s, so a struct can be registered first, its type interned, and
//! its members filled in afterwards (which is how recursive structs work).

use serde::Serialize;
use tsol_common::{ContractGraph, LinearizationError};

use crate::ty::{StateMutability, TypeId};

pub use tsol_common::ContractId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct StructId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct EnumId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct UdvtId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct FunctionDeclId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct VariableId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SourceUnitId(pub u32);

/// A lexical scope that member lookups can happen in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ScopeId {
    SourceUnit(SourceUnitId),
    Contract(ContractId),
}

/// The declaration behind a function type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DeclRef {
    Function(FunctionDeclId),
    /// A public state variable; its function type is the getter.
    Variable(VariableId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Visibility {
    Private,
    Internal,
    Public,
    External,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ContractKind {
    Contract,
    Interface,
    Library,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum FunctionDefKind {
    Ordinary,
    Constructor,
    Fallback,
    Receive,
    Event { anonymous: bool },
    Error,
    Modifier,
}

#[derive(Debug, Clone)]
pub struct Param {
    pub name: String,
    pub ty: TypeId,
}

impl Param {
    pub fn new(name: impl Into<String>, ty: TypeId) -> Self {
        Self { name: name.into(), ty }
    }

    pub fn unnamed(ty: TypeId) -> Self {
        Self::new("", ty)
    }
}

#[derive(Debug, Clone)]
pub struct SourceUnitDef {
    pub id: SourceUnitId,
    pub path: String,
    pub using_for: Vec<UsingForDirective>,
    pub exports: Vec<(String, ExportedSymbol)>,
}

/// A top-level symbol visible through `import "x" as M; M.symbol`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportedSymbol {
    Contract(ContractId),
    Struct(StructId),
    Enum(EnumId),
    UserDefinedValueType(UdvtId),
    Function(FunctionDeclId),
}

#[derive(Debug, Clone)]
pub struct ContractDef {
    pub id: ContractId,
    pub name: String,
    pub kind: ContractKind,
    pub is_abstract: bool,
    pub source_unit: SourceUnitId,
    /// Filled by [`DeclStore::link_contracts`]; most derived first.
    pub linearized_bases: Vec<ContractId>,
    pub functions: Vec<FunctionDeclId>,
    pub state_variables: Vec<VariableId>,
    pub structs: Vec<StructId>,
    pub enums: Vec<EnumId>,
    pub udvts: Vec<UdvtId>,
    pub using_for: Vec<UsingForDirective>,
}

impl ContractDef {
    pub fn is_library(&self) -> bool {
        self.kind == ContractKind::Library
    }

    pub fn can_be_deployed(&self) -> bool {
        self.kind == ContractKind::Contract && !self.is_abstract
    }
}

#[derive(Debug, Clone)]
pub struct StructMember {
    pub name: String,
    pub ty: TypeId,
}

#[derive(Debug, Clone)]
pub struct StructDef {
    pub id: StructId,
    pub name: String,
    pub canonical_name: String,
    pub scope: ScopeId,
    pub members: Vec<StructMember>,
}

#[derive(Debug, Clone)]
pub struct EnumDef {
    pub id: EnumId,
    pub name: String,
    pub canonical_name: String,
    pub scope: ScopeId,
    pub values: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct UdvtDef {
    pub id: UdvtId,
    pub name: String,
    pub canonical_name: String,
    pub scope: ScopeId,
    pub underlying: TypeId,
}

#[derive(Debug, Clone)]
pub struct FunctionDef {
    pub id: FunctionDeclId,
    pub name: String,
    pub scope: ScopeId,
    pub kind: FunctionDefKind,
    pub visibility: Visibility,
    pub mutability: StateMutability,
    pub params: Vec<Param>,
    pub returns: Vec<Param>,
    pub implemented: bool,
}

impl FunctionDef {
    /// Start describing a function; the id is assigned by [`DeclStore::add_function`].
    pub fn new(name: impl Into<String>, scope: ScopeId) -> Self {
        Self {
            id: FunctionDeclId(u32::MAX),
            name: name.into(),
            scope,
            kind: FunctionDefKind::Ordinary,
            visibility: Visibility::Internal,
            mutability: StateMutability::NonPayable,
            params: Vec::new(),
            returns: Vec::new(),
            implemented: true,
        }
    }

    pub fn kind(mut self, kind: FunctionDefKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn mutability(mut self, mutability: StateMutability) -> Self {
        self.mutability = mutability;
        self
    }

    pub fn params(mut self, params: Vec<Param>) -> Self {
        self.params = params;
        self
    }

    pub fn returns(mut self, returns: Vec<Param>) -> Self {
        self.returns = returns;
        self
    }

    pub fn unimplemented(mut self) -> Self {
        self.implemented = false;
        self
    }

    pub fn is_ordinary(&self) -> bool {
        self.kind == FunctionDefKind::Ordinary
    }

    pub fn is_visible_as_library_member(&self) -> bool {
        self.visibility >= Visibility::Internal
    }

    /// Internal and public functions; external ones are only reachable
    /// through a message.
    pub fn is_visible_in_derived_contracts(&self) -> bool {
        matches!(self.visibility, Visibility::Internal | Visibility::Public)
    }

    pub fn is_public(&self) -> bool {
        self.visibility >= Visibility::Public
    }

    pub fn is_part_of_external_interface(&self) -> bool {
        self.is_ordinary() && self.is_public()
    }
}

#[derive(Debug, Clone)]
pub struct VariableDef {
    pub id: VariableId,
    pub name: String,
    pub ty: TypeId,
    pub contract: ContractId,
    pub visibility: Visibility,
}

/// `using L for T;` or `using {f, g} for T global;`.
#[derive(Debug, Clone)]
pub struct UsingForDirective {
    /// `None` for `using L for *`.
    pub target: Option<TypeId>,
    pub items: Vec<UsingForItem>,
    pub global: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UsingForItem {
    Library(ContractId),
    /// A single function, attached under the last segment of its path.
    Function { decl: FunctionDeclId, name: String },
}

/// All declarations known to one compilation.
#[derive(Debug, Default)]
pub struct DeclStore {
    source_units: Vec<SourceUnitDef>,
    contracts: Vec<ContractDef>,
    graph: ContractGraph,
    structs: Vec<StructDef>,
    enums: Vec<EnumDef>,
    udvts: Vec<UdvtDef>,
    functions: Vec<FunctionDef>,
    variables: Vec<VariableDef>,
}

impl DeclStore {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Registration ───────────────────────────────────────────────────

    pub fn add_source_unit(&mut self, path: impl Into<String>) -> SourceUnitId {
        let id = SourceUnitId(self.source_units.len() as u32);
        self.source_units.push(SourceUnitDef {
            id,
            path: path.into(),
            using_for: Vec::new(),
            exports: Vec::new(),
        });
        id
    }

    pub fn add_contract(
        &mut self,
        name: impl Into<String>,
        kind: ContractKind,
        source_unit: SourceUnitId,
    ) -> ContractId {
        let name = name.into();
        let id = self.graph.add_contract(name.clone());
        self.contracts.push(ContractDef {
            id,
            name: name.clone(),
            kind,
            is_abstract: false,
            source_unit,
            linearized_bases: vec![id],
            functions: Vec::new(),
            state_variables: Vec::new(),
            structs: Vec::new(),
            enums: Vec::new(),
            udvts: Vec::new(),
            using_for: Vec::new(),
        });
        self.source_units[source_unit.0 as usize]
            .exports
            .push((name, ExportedSymbol::Contract(id)));
        id
    }

    pub fn set_abstract(&mut self, contract: ContractId) {
        self.contracts[contract.0 as usize].is_abstract = true;
    }

    /// Record `derived is ..., base`. Call [`link_contracts`](Self::link_contracts) afterwards.
    pub fn add_base(&mut self, derived: ContractId, base: ContractId) {
        self.graph.add_base(derived, base);
    }

    /// Compute the linearized bases of every contract.
    pub fn link_contracts(&mut self) -> Result<(), LinearizationError> {
        let linearized = self.graph.linearize_all()?;
        for (contract, bases) in self.contracts.iter_mut().zip(linearized) {
            contract.linearized_bases = bases;
        }
        Ok(())
    }

    fn canonical_in_scope(&self, scope: ScopeId, name: &str) -> String {
        match scope {
            ScopeId::SourceUnit(_) => name.to_string(),
            ScopeId::Contract(c) => format!("{}.{}", self.contract(c).name, name),
        }
    }

    /// Register a struct with no members yet.
    pub fn add_struct(&mut self, name: impl Into<String>, scope: ScopeId) -> StructId {
        let name = name.into();
        let id = StructId(self.structs.len() as u32);
        let canonical_name = self.canonical_in_scope(scope, &name);
        self.structs.push(StructDef {
            id,
            name: name.clone(),
            canonical_name,
            scope,
            members: Vec::new(),
        });
        match scope {
            ScopeId::Contract(c) => self.contracts[c.0 as usize].structs.push(id),
            ScopeId::SourceUnit(su) => self.source_units[su.0 as usize]
                .exports
                .push((name, ExportedSymbol::Struct(id))),
        }
        id
    }

    pub fn set_struct_members(&mut self, id: StructId, members: Vec<(String, TypeId)>) {
        self.structs[id.0 as usize].members = members
            .into_iter()
            .map(|(name, ty)| StructMember { name, ty })
            .collect();
    }

    pub fn add_enum(&mut self, name: impl Into<String>, scope: ScopeId, values: &[&str]) -> EnumId {
        let name = name.into();
        let id = EnumId(self.enums.len() as u32);
        let canonical_name = self.canonical_in_scope(scope, &name);
        self.enums.push(EnumDef {
            id,
            name: name.clone(),
            canonical_name,
            scope,
            values: values.iter().map(|v| v.to_string()).collect(),
        });
        match scope {
            ScopeId::Contract(c) => self.contracts[c.0 as usize].enums.push(id),
            ScopeId::SourceUnit(su) => self.source_units[su.0 as usize]
                .exports
                .push((name, ExportedSymbol::Enum(id))),
        }
        id
    }

    pub fn add_udvt(&mut self, name: impl Into<String>, scope: ScopeId, underlying: TypeId) -> UdvtId {
        let name = name.into();
        let id = UdvtId(self.udvts.len() as u32);
        let canonical_name = self.canonical_in_scope(scope, &name);
        self.udvts.push(UdvtDef {
            id,
            name: name.clone(),
            canonical_name,
            scope,
            underlying,
        });
        match scope {
            ScopeId::Contract(c) => self.contracts[c.0 as usize].udvts.push(id),
            ScopeId::SourceUnit(su) => self.source_units[su.0 as usize]
                .exports
                .push((name, ExportedSymbol::UserDefinedValueType(id))),
        }
        id
    }

    pub fn add_function(&mut self, mut def: FunctionDef) -> FunctionDeclId {
        let id = FunctionDeclId(self.functions.len() as u32);
        def.id = id;
        match def.scope {
            ScopeId::Contract(c) => self.contracts[c.0 as usize].functions.push(id),
            ScopeId::SourceUnit(su) => self.source_units[su.0 as usize]
                .exports
                .push((def.name.clone(), ExportedSymbol::Function(id))),
        }
        self.functions.push(def);
        id
    }

    pub fn add_state_variable(
        &mut self,
        contract: ContractId,
        name: impl Into<String>,
        ty: TypeId,
        visibility: Visibility,
    ) -> VariableId {
        let id = VariableId(self.variables.len() as u32);
        self.variables.push(VariableDef {
            id,
            name: name.into(),
            ty,
            contract,
            visibility,
        });
        self.contracts[contract.0 as usize].state_variables.push(id);
        id
    }

    pub fn add_using_for(&mut self, scope: ScopeId, directive: UsingForDirective) {
        match scope {
            ScopeId::Contract(c) => self.contracts[c.0 as usize].using_for.push(directive),
            ScopeId::SourceUnit(su) => self.source_units[su.0 as usize].using_for.push(directive),
        }
    }

    // ── Lookup ─────────────────────────────────────────────────────────

    pub fn source_unit(&self, id: SourceUnitId) -> &SourceUnitDef {
        &self.source_units[id.0 as usize]
    }

    pub fn contract(&self, id: ContractId) -> &ContractDef {
        &self.contracts[id.0 as usize]
    }

    pub fn resolve_contract(&self, name: &str) -> Option<ContractId> {
        self.graph.resolve(name)
    }

    pub fn struct_def(&self, id: StructId) -> &StructDef {
        &self.structs[id.0 as usize]
    }

    pub fn enum_def(&self, id: EnumId) -> &EnumDef {
        &self.enums[id.0 as usize]
    }

    pub fn udvt(&self, id: UdvtId) -> &UdvtDef {
        &self.udvts[id.0 as usize]
    }

    pub fn function(&self, id: FunctionDeclId) -> &FunctionDef {
        &self.functions[id.0 as usize]
    }

    pub fn variable(&self, id: VariableId) -> &VariableDef {
        &self.variables[id.0 as usize]
    }

    /// Source unit a scope belongs to.
    pub fn source_unit_of(&self, scope: ScopeId) -> SourceUnitId {
        match scope {
            ScopeId::SourceUnit(su) => su,
            ScopeId::Contract(c) => self.contract(c).source_unit,
        }
    }

    pub fn derives_from(&self, derived: ContractId, base: ContractId) -> bool {
        self.contract(derived).linearized_bases.contains(&base)
    }

    /// The contract a function is declared in, if any.
    pub fn function_contract(&self, id: FunctionDeclId) -> Option<ContractId> {
        match self.function(id).scope {
            ScopeId::Contract(c) => Some(c),
            ScopeId::SourceUnit(_) => None,
        }
    }

    pub fn is_library_function(&self, id: FunctionDeclId) -> bool {
        self.function_contract(id)
            .is_some_and(|c| self.contract(c).is_library())
    }

    /// Name of the declaration behind a function type.
    pub fn decl_name(&self, decl: DeclRef) -> &str {
        match decl {
            DeclRef::Function(f) => &self.function(f).name,
            DeclRef::Variable(v) => &self.variable(v).name,
        }
    }
}
