//! Member resolution.
//!
//! The members of a type are its built-in members (`length` of an array,
//! `balance` of an address, the fields of a struct) followed by the library
//! functions attached to it with `using ... for` in the current scope. A
//! [`MemberList`] is computed once per (type, scope) pair and cached on the
//! context; its storage offsets are computed on first use.

use std::cell::OnceCell;
use std::rc::Rc;

use num_bigint::BigUint;
use rustc_hash::FxHashSet;
use tsol_common::{tsol_assert, tsol_unreachable};

use crate::ctx::TypeCtx;
use crate::decl::{
    ContractId, DeclRef, EnumId, ExportedSymbol, FunctionDeclId, FunctionDefKind, ScopeId,
    StructId, UdvtId, UsingForDirective, UsingForItem, VariableId, Visibility,
};
use crate::layout::{StorageOffset, StorageOffsets};
use crate::ty::{
    FunctionKind, FunctionOptions, FunctionType, MagicKind, StateMutability, Type, TypeId,
};

// ── Member list ────────────────────────────────────────────────────────

/// The declaration a member comes from, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberDecl {
    Function(FunctionDeclId),
    Variable(VariableId),
    StructField { id: StructId, index: usize },
    EnumValue { id: EnumId, index: usize },
    Contract(ContractId),
    Struct(StructId),
    Enum(EnumId),
    UserDefinedValueType(UdvtId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub name: String,
    pub ty: TypeId,
    pub decl: Option<MemberDecl>,
}

impl Member {
    pub fn builtin(name: impl Into<String>, ty: TypeId) -> Self {
        Self {
            name: name.into(),
            ty,
            decl: None,
        }
    }

    pub fn declared(name: impl Into<String>, ty: TypeId, decl: MemberDecl) -> Self {
        Self {
            name: name.into(),
            ty,
            decl: Some(decl),
        }
    }
}

/// Ordered members of a type. Names may repeat for overloads.
#[derive(Debug, Default)]
pub struct MemberList {
    members: Vec<Member>,
    storage_offsets: OnceCell<StorageOffsets>,
}

impl MemberList {
    pub fn new(members: Vec<Member>) -> Self {
        Self {
            members,
            storage_offsets: OnceCell::new(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Member> {
        self.members.iter()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.members.iter().map(|m| m.name.as_str()).collect()
    }

    /// All members called `name`.
    pub fn members_by_name(&self, name: &str) -> Vec<&Member> {
        self.members.iter().filter(|m| m.name == name).collect()
    }

    /// The type of the member `name`, if exactly one member has that name.
    pub fn member_type(&self, name: &str) -> Option<TypeId> {
        match self.members_by_name(name).as_slice() {
            [member] => Some(member.ty),
            _ => None,
        }
    }

    /// Slot assignment of the members in order, computed on first use.
    pub fn storage_offsets(&self, ctx: &mut TypeCtx) -> &StorageOffsets {
        self.storage_offsets.get_or_init(|| {
            let types: Vec<TypeId> = self.members.iter().map(|m| m.ty).collect();
            StorageOffsets::compute(ctx, &types)
        })
    }

    pub fn storage_size(&self, ctx: &mut TypeCtx) -> &BigUint {
        self.storage_offsets(ctx).storage_size()
    }

    /// Storage position of the first member called `name`.
    pub fn member_storage_offset(&self, ctx: &mut TypeCtx, name: &str) -> Option<&StorageOffset> {
        let index = self.members.iter().position(|m| m.name == name)?;
        self.storage_offsets(ctx).offset(index)
    }
}

// ── Resolution ─────────────────────────────────────────────────────────

impl TypeCtx {
    /// The members of `id` visible in `scope`. Without a scope only the
    /// built-in members are returned.
    pub fn members(&mut self, id: TypeId, scope: Option<ScopeId>) -> Rc<MemberList> {
        if let Some(list) = self.member_lists.get(&(id, scope)) {
            return Rc::clone(list);
        }
        let mut members = self.native_members(id, scope);
        if let Some(scope) = scope {
            members.extend(self.bound_functions(id, scope));
        }
        tracing::debug!(
            ty = %self.display(id),
            scope = ?scope,
            count = members.len(),
            "computed member list"
        );
        let list = Rc::new(MemberList::new(members));
        self.member_lists.insert((id, scope), Rc::clone(&list));
        list
    }

    /// The type of the unique member `name` of `id` in `scope`.
    pub fn member_type(&mut self, id: TypeId, name: &str, scope: Option<ScopeId>) -> Option<TypeId> {
        self.members(id, scope).member_type(name)
    }

    fn builtin_fn(
        &mut self,
        kind: FunctionKind,
        params: Vec<TypeId>,
        returns: Vec<TypeId>,
        mutability: StateMutability,
    ) -> TypeId {
        self.function(FunctionType::builtin(kind, params, returns, mutability))
    }

    fn pure_fn(&mut self, kind: FunctionKind, params: Vec<TypeId>, returns: Vec<TypeId>) -> TypeId {
        self.builtin_fn(kind, params, returns, StateMutability::Pure)
    }

    /// A pure built-in that takes any arguments and returns `returns`.
    fn variadic_fn(&mut self, kind: FunctionKind, returns: Vec<TypeId>) -> TypeId {
        self.function(
            FunctionType::builtin(kind, vec![], returns, StateMutability::Pure)
                .with_options(FunctionOptions::with_arbitrary_parameters()),
        )
    }

    fn native_members(&mut self, id: TypeId, scope: Option<ScopeId>) -> Vec<Member> {
        match self.get(id).clone() {
            Type::Address => self.address_members(),
            Type::FixedBytes(_) => vec![Member::builtin("length", self.prims().uint8)],
            Type::Array(array) => {
                let p = *self.prims();
                let mut members = vec![Member::builtin(
                    "empty",
                    self.pure_fn(FunctionKind::ArrayEmpty, vec![], vec![p.bool]),
                )];
                if array.is_byte_array_or_string() {
                    let text = if array.is_string() { p.string } else { p.bytes };
                    members.push(Member::builtin(
                        "toSlice",
                        self.pure_fn(FunctionKind::ByteToSlice, vec![], vec![p.slice]),
                    ));
                    members.extend(self.data_size_members());
                    let append = self.function(
                        FunctionType::builtin(
                            FunctionKind::StringMethod,
                            vec![text],
                            vec![],
                            StateMutability::Pure,
                        )
                        .named_params(&["tail"]),
                    );
                    members.push(Member::builtin("append", append));
                }
                if array.is_string() {
                    members.extend(self.string_members());
                } else {
                    let push_kind = if array.is_byte_array() {
                        FunctionKind::ByteArrayPush
                    } else {
                        FunctionKind::ArrayPush
                    };
                    members.push(Member::builtin("length", p.uint256));
                    members.push(Member::builtin("push", self.pure_fn(push_kind, vec![], vec![])));
                    members.push(Member::builtin(
                        "push",
                        self.pure_fn(push_kind, vec![array.base], vec![]),
                    ));
                    members.push(Member::builtin(
                        "pop",
                        self.pure_fn(FunctionKind::ArrayPop, vec![], vec![]),
                    ));
                }
                members
            }
            Type::Mapping { key, value } => self.map_members(key, value),
            Type::ExtraCurrencyCollection => {
                let p = *self.prims();
                self.map_members(p.uint32, p.var_uint32)
            }
            Type::Optional(inner) => self.optional_members(inner),
            Type::Struct { id: struct_id, is_pointer } => {
                let fields: Vec<(String, TypeId)> = self
                    .decls()
                    .struct_def(struct_id)
                    .members
                    .iter()
                    .map(|m| (m.name.clone(), m.ty))
                    .collect();
                let mut members = Vec::with_capacity(fields.len() + 1);
                let mut types = Vec::with_capacity(fields.len());
                for (index, (name, ty)) in fields.into_iter().enumerate() {
                    types.push(ty);
                    let ty = self.with_location(ty, is_pointer);
                    members.push(Member::declared(
                        name,
                        ty,
                        MemberDecl::StructField { id: struct_id, index },
                    ));
                }
                let unpack = self.pure_fn(FunctionKind::StructUnpack, vec![], types);
                members.push(Member::builtin("unpack", unpack));
                members
            }
            Type::Contract { id: contract, is_super } => {
                if is_super {
                    Vec::new()
                } else {
                    self.contract_interface_members(contract)
                }
            }
            Type::Function(function) => self.function_members(&function, scope),
            Type::TypeType(actual) => self.type_type_members(actual, scope),
            Type::Module(source_unit) => {
                let exports = self.decls().source_unit(source_unit).exports.clone();
                exports
                    .into_iter()
                    .map(|(name, symbol)| self.exported_member(name, symbol))
                    .collect()
            }
            Type::Magic(kind) => self.magic_members(kind),
            Type::TvmCell => {
                let p = *self.prims();
                let mut members = vec![
                    Member::builtin(
                        "depth",
                        self.pure_fn(FunctionKind::TvmCellDepth, vec![], vec![p.uint16]),
                    ),
                    Member::builtin(
                        "toSlice",
                        self.pure_fn(FunctionKind::TvmCellToSlice, vec![], vec![p.slice]),
                    ),
                ];
                members.extend(self.data_size_members());
                members
            }
            Type::TvmSlice => self.slice_members(),
            Type::TvmBuilder => self.builder_members(),
            Type::Variant => {
                let p = *self.prims();
                vec![
                    Member::builtin(
                        "isUint",
                        self.pure_fn(FunctionKind::VariantIsUint, vec![], vec![p.bool]),
                    ),
                    Member::builtin(
                        "toUint",
                        self.pure_fn(FunctionKind::VariantToUint, vec![], vec![p.uint256]),
                    ),
                ]
            }
            Type::TvmVector(element) => {
                let p = *self.prims();
                vec![
                    Member::builtin(
                        "push",
                        self.pure_fn(FunctionKind::TvmVectorPush, vec![element], vec![]),
                    ),
                    Member::builtin(
                        "length",
                        self.pure_fn(FunctionKind::TvmVectorLength, vec![], vec![p.uint8]),
                    ),
                    Member::builtin(
                        "pop",
                        self.pure_fn(FunctionKind::TvmVectorPop, vec![], vec![element]),
                    ),
                    Member::builtin(
                        "empty",
                        self.pure_fn(FunctionKind::TvmVectorLength, vec![], vec![p.bool]),
                    ),
                ]
            }
            Type::Integer(_)
            | Type::FixedPoint(_)
            | Type::VarInteger(_)
            | Type::RationalNumber(_)
            | Type::StringLiteral(_)
            | Type::Bool
            | Type::Enum(_)
            | Type::UserDefinedValueType(_)
            | Type::ArraySlice(_)
            | Type::Tuple(_)
            | Type::Modifier(_)
            | Type::Null
            | Type::EmptyMap
            | Type::InaccessibleDynamic => Vec::new(),
        }
    }

    // ── Built-in members per category ──────────────────────────────────

    fn address_members(&mut self) -> Vec<Member> {
        let p = *self.prims();
        let is_zero = self.pure_fn(FunctionKind::AddressIsZero, vec![], vec![p.bool]);
        let unpack = self.pure_fn(FunctionKind::AddressUnpack, vec![], vec![p.int8, p.uint256]);
        let get_type = self.pure_fn(FunctionKind::AddressType, vec![], vec![p.uint8]);
        let std_without_anycast = self.pure_fn(
            FunctionKind::AddressIsStdAddrWithoutAnyCast,
            vec![],
            vec![p.bool],
        );
        let transfer = self.function(
            FunctionType::builtin(
                FunctionKind::AddressTransfer,
                vec![p.uint128, p.bool, p.uint16, p.cell, p.extra_currency_collection, p.cell],
                vec![],
                StateMutability::Pure,
            )
            .named_params(&["value", "bounce", "flag", "body", "currencies", "stateInit"])
            .with_options(FunctionOptions::with_arbitrary_parameters()),
        );
        vec![
            Member::builtin("balance", p.uint128),
            Member::builtin("currencies", p.extra_currency_collection),
            Member::builtin("wid", p.int8),
            Member::builtin("value", p.uint256),
            Member::builtin("isStdZero", is_zero),
            Member::builtin("isNone", is_zero),
            Member::builtin("isExternZero", is_zero),
            Member::builtin("unpack", unpack),
            Member::builtin("getType", get_type),
            Member::builtin("isStdAddrWithoutAnyCast", std_without_anycast),
            Member::builtin("transfer", transfer),
        ]
    }

    fn data_size_members(&mut self) -> Vec<Member> {
        let p = *self.prims();
        let data_size = self.pure_fn(
            FunctionKind::TvmDataSize,
            vec![p.uint256],
            vec![p.uint256, p.uint256, p.uint256],
        );
        let triple = self.tuple(vec![p.uint256, p.uint256, p.uint256]);
        let maybe_triple = self.optional(triple);
        let data_size_q = self.pure_fn(FunctionKind::TvmDataSize, vec![p.uint256], vec![maybe_triple]);
        vec![
            Member::builtin("dataSize", data_size),
            Member::builtin("dataSizeQ", data_size_q),
        ]
    }

    fn string_members(&mut self) -> Vec<Member> {
        let p = *self.prims();
        let maybe_pos = self.optional(p.uint32);
        let substr_from = self.function(
            FunctionType::builtin(
                FunctionKind::StringSubstr,
                vec![p.uint256],
                vec![p.string],
                StateMutability::Pure,
            )
            .named_params(&["from"])
            .named_returns(&["substr"]),
        );
        let substr_range = self.function(
            FunctionType::builtin(
                FunctionKind::StringSubstr,
                vec![p.uint256, p.uint256],
                vec![p.string],
                StateMutability::Pure,
            )
            .named_params(&["from", "to"])
            .named_returns(&["substr"]),
        );
        let byte_length = self.function(
            FunctionType::builtin(FunctionKind::StringMethod, vec![], vec![p.uint32], StateMutability::Pure)
                .named_returns(&["byteLength"]),
        );
        let find_symbol = self.function(
            FunctionType::builtin(
                FunctionKind::StringMethod,
                vec![p.bytes1],
                vec![maybe_pos],
                StateMutability::Pure,
            )
            .named_params(&["symbol"])
            .named_returns(&["pos"]),
        );
        let find_substr = self.function(
            FunctionType::builtin(
                FunctionKind::StringMethod,
                vec![p.string],
                vec![maybe_pos],
                StateMutability::Pure,
            )
            .named_params(&["substr"])
            .named_returns(&["pos"]),
        );
        let convert_case = self.pure_fn(FunctionKind::StringMethod, vec![], vec![p.string]);
        vec![
            Member::builtin("substr", substr_from),
            Member::builtin("substr", substr_range),
            Member::builtin("byteLength", byte_length),
            Member::builtin("find", find_symbol),
            Member::builtin("findLast", find_symbol),
            Member::builtin("find", find_substr),
            Member::builtin("toLowerCase", convert_case),
            Member::builtin("toUpperCase", convert_case),
        ]
    }

    fn map_members(&mut self, key: TypeId, value: TypeId) -> Vec<Member> {
        let p = *self.prims();
        let maybe_value = self.optional(value);
        let keys = self.dynamic_array(key);
        let values = self.dynamic_array(value);

        let mut members = vec![Member::builtin(
            "at",
            self.pure_fn(FunctionKind::MappingAt, vec![key], vec![value]),
        )];
        let min_max = self.pure_fn(FunctionKind::MappingGetMinMax, vec![], vec![]);
        members.push(Member::builtin("min", min_max));
        members.push(Member::builtin("max", min_max));
        let del = self.pure_fn(FunctionKind::MappingDelMinOrMax, vec![], vec![]);
        members.push(Member::builtin("delMin", del));
        members.push(Member::builtin("delMax", del));
        let next_key = self.variadic_fn(FunctionKind::MappingGetNextKey, vec![]);
        for name in ["next", "prev", "nextOrEq", "prevOrEq"] {
            members.push(Member::builtin(name, next_key));
        }
        members.push(Member::builtin(
            "keys",
            self.pure_fn(FunctionKind::MappingKeys, vec![], vec![keys]),
        ));
        members.push(Member::builtin(
            "values",
            self.pure_fn(FunctionKind::MappingValues, vec![], vec![values]),
        ));
        members.push(Member::builtin(
            "fetch",
            self.pure_fn(FunctionKind::MappingFetch, vec![key], vec![maybe_value]),
        ));
        members.push(Member::builtin(
            "exists",
            self.pure_fn(FunctionKind::MappingExists, vec![key], vec![p.bool]),
        ));
        members.push(Member::builtin(
            "empty",
            self.pure_fn(FunctionKind::MappingEmpty, vec![], vec![p.bool]),
        ));
        let replace_or_add = self.pure_fn(FunctionKind::MappingReplaceOrAdd, vec![key, value], vec![p.bool]);
        members.push(Member::builtin("replace", replace_or_add));
        members.push(Member::builtin("add", replace_or_add));
        let get_set = self.pure_fn(FunctionKind::MappingGetSet, vec![key, value], vec![maybe_value]);
        for name in ["getSet", "getAdd", "getReplace"] {
            members.push(Member::builtin(name, get_set));
        }
        members
    }

    fn optional_members(&mut self, inner: TypeId) -> Vec<Member> {
        let p = *self.prims();
        let mut members = vec![
            Member::builtin(
                "hasValue",
                self.pure_fn(FunctionKind::OptionalHasValue, vec![], vec![p.bool]),
            ),
            Member::builtin("get", self.pure_fn(FunctionKind::OptionalGet, vec![], vec![inner])),
            Member::builtin("set", self.pure_fn(FunctionKind::OptionalSet, vec![inner], vec![])),
        ];
        if let Type::Tuple(components) = self.get(inner).clone() {
            let params: Vec<TypeId> = components.into_iter().flatten().collect();
            members.push(Member::builtin(
                "set",
                self.pure_fn(FunctionKind::OptionalSet, params, vec![]),
            ));
        }
        members.push(Member::builtin(
            "reset",
            self.pure_fn(FunctionKind::OptionalReset, vec![], vec![]),
        ));
        members
    }

    fn slice_members(&mut self) -> Vec<Member> {
        let p = *self.prims();
        let mut members = self.data_size_members();
        let count = self.pure_fn(FunctionKind::TvmSliceMethod, vec![], vec![p.uint16]);
        for name in ["bits", "refs", "depth"] {
            members.push(Member::builtin(name, count));
        }
        let empty = self.pure_fn(FunctionKind::TvmSliceMethod, vec![], vec![p.bool]);
        members.push(Member::builtin("empty", empty));
        let load_ones = self.pure_fn(FunctionKind::TvmSliceMethod, vec![], vec![p.uint16]);
        for name in ["loadOnes", "loadZeroes"] {
            members.push(Member::builtin(name, load_ones));
        }
        let load_same = self.pure_fn(FunctionKind::TvmSliceMethod, vec![p.uint8], vec![p.uint16]);
        members.push(Member::builtin("loadSame", load_same));
        let decode = self.variadic_fn(FunctionKind::TvmSliceDecode, vec![]);
        for name in ["decode", "decodeQ", "decodeFunctionParams"] {
            members.push(Member::builtin(name, decode));
        }
        members
    }

    fn builder_members(&mut self) -> Vec<Member> {
        let p = *self.prims();
        let mut members = Vec::new();
        let count = self.pure_fn(FunctionKind::TvmBuilderMethod, vec![], vec![p.uint16]);
        for name in ["depth", "bits", "refs", "remBits", "remRefs"] {
            members.push(Member::builtin(name, count));
        }
        members.push(Member::builtin(
            "size",
            self.pure_fn(FunctionKind::TvmBuilderMethod, vec![], vec![p.uint16, p.uint8]),
        ));
        members.push(Member::builtin(
            "remBitsAndRefs",
            self.pure_fn(FunctionKind::TvmBuilderMethod, vec![], vec![p.uint16, p.uint8]),
        ));
        members.push(Member::builtin(
            "toCell",
            self.pure_fn(FunctionKind::TvmBuilderMethod, vec![], vec![p.cell]),
        ));
        members.push(Member::builtin(
            "toSlice",
            self.pure_fn(FunctionKind::TvmBuilderMethod, vec![], vec![p.slice]),
        ));
        for reference in [p.builder, p.cell, p.slice] {
            members.push(Member::builtin(
                "storeRef",
                self.pure_fn(FunctionKind::TvmBuilderMethod, vec![reference], vec![]),
            ));
        }
        let store_bits = self.pure_fn(FunctionKind::TvmBuilderMethod, vec![p.uint256], vec![]);
        for name in ["storeOnes", "storeZeroes"] {
            members.push(Member::builtin(name, store_bits));
        }
        members.push(Member::builtin(
            "storeSame",
            self.pure_fn(FunctionKind::TvmBuilderMethod, vec![p.uint256, p.uint8], vec![]),
        ));
        members.push(Member::builtin(
            "store",
            self.variadic_fn(FunctionKind::TvmBuilderStore, vec![]),
        ));
        members.push(Member::builtin(
            "storeSigned",
            self.pure_fn(FunctionKind::TvmBuilderMethod, vec![p.int256, p.uint16], vec![]),
        ));
        members.push(Member::builtin(
            "storeUnsigned",
            self.pure_fn(FunctionKind::TvmBuilderMethod, vec![p.uint256, p.uint16], vec![]),
        ));
        members.push(Member::builtin(
            "storeTons",
            self.pure_fn(FunctionKind::TvmBuilderMethod, vec![p.uint128], vec![]),
        ));
        members
    }

    fn magic_members(&mut self, kind: MagicKind) -> Vec<Member> {
        let p = *self.prims();
        match kind {
            MagicKind::Block => vec![
                Member::builtin("logicaltime", p.uint64),
                Member::builtin("timestamp", p.uint32),
            ],
            MagicKind::Message => {
                let pubkey = self.pure_fn(FunctionKind::MsgPubkey, vec![], vec![p.uint256]);
                vec![
                    Member::builtin("sender", p.address),
                    Member::builtin("pubkey", pubkey),
                    Member::builtin("createdAt", p.uint32),
                    Member::builtin("hasStateInit", p.bool),
                    Member::builtin("value", p.uint128),
                    Member::builtin("data", p.slice),
                    Member::builtin("sig", p.bytes4),
                    Member::builtin("currencies", p.extra_currency_collection),
                    Member::builtin("isExternal", p.bool),
                    Member::builtin("isInternal", p.bool),
                    Member::builtin("isTickTock", p.bool),
                ]
            }
            MagicKind::Tvm => {
                let maybe_cell = self.optional(p.cell);
                let mut members = vec![
                    Member::builtin("code", self.pure_fn(FunctionKind::TvmMethod, vec![], vec![p.cell])),
                    Member::builtin(
                        "codeSalt",
                        self.pure_fn(FunctionKind::TvmMethod, vec![p.cell], vec![maybe_cell]),
                    ),
                    Member::builtin(
                        "setCodeSalt",
                        self.pure_fn(FunctionKind::TvmMethod, vec![p.cell, p.cell], vec![p.cell]),
                    ),
                    Member::builtin(
                        "pubkey",
                        self.pure_fn(FunctionKind::TvmMethod, vec![], vec![p.uint256]),
                    ),
                    Member::builtin(
                        "setPubkey",
                        self.builtin_fn(
                            FunctionKind::TvmMethod,
                            vec![p.uint256],
                            vec![],
                            StateMutability::NonPayable,
                        ),
                    ),
                    Member::builtin("accept", self.pure_fn(FunctionKind::TvmMethod, vec![], vec![])),
                ];
                let commit =
                    self.builtin_fn(FunctionKind::TvmMethod, vec![], vec![], StateMutability::NonPayable);
                for name in ["commit", "rawCommit", "resetStorage"] {
                    members.push(Member::builtin(name, commit));
                }
                members.push(Member::builtin(
                    "hash",
                    self.variadic_fn(FunctionKind::TvmMethod, vec![p.uint256]),
                ));
                members.push(Member::builtin(
                    "functionId",
                    self.variadic_fn(FunctionKind::TvmFunctionId, vec![p.uint32]),
                ));
                members.push(Member::builtin(
                    "buildStateInit",
                    self.variadic_fn(FunctionKind::TvmBuildStateInit, vec![p.cell]),
                ));
                members
            }
            MagicKind::Transaction => vec![
                Member::builtin("storageFee", p.uint64),
                Member::builtin("timestamp", p.uint64),
            ],
            MagicKind::Abi => vec![
                Member::builtin("encode", self.variadic_fn(FunctionKind::AbiEncode, vec![p.cell])),
                Member::builtin("decode", self.variadic_fn(FunctionKind::AbiDecode, vec![])),
            ],
            MagicKind::Math => {
                let mut members = Vec::new();
                for name in [
                    "divc", "divr", "max", "min", "minmax", "muldiv", "muldivr", "muldivc",
                    "muldivmod", "divmod", "abs", "modpow2", "sign",
                ] {
                    members.push(Member::builtin(name, self.variadic_fn(FunctionKind::MathMethod, vec![])));
                }
                members
            }
            MagicKind::Rnd => {
                let next = self.variadic_fn(FunctionKind::RndMethod, vec![]);
                vec![
                    Member::builtin("next", next),
                    Member::builtin(
                        "setSeed",
                        self.pure_fn(FunctionKind::RndMethod, vec![p.uint256], vec![]),
                    ),
                    Member::builtin(
                        "getSeed",
                        self.pure_fn(FunctionKind::RndMethod, vec![], vec![p.uint256]),
                    ),
                    Member::builtin("shuffle", self.pure_fn(FunctionKind::RndMethod, vec![], vec![])),
                    Member::builtin(
                        "shuffle",
                        self.pure_fn(FunctionKind::RndMethod, vec![p.uint256], vec![]),
                    ),
                ]
            }
            MagicKind::Gosh => {
                let text = self.pure_fn(FunctionKind::GoshMethod, vec![p.string, p.string], vec![p.string]);
                let zip = self.pure_fn(FunctionKind::GoshMethod, vec![p.string], vec![p.bytes]);
                let unzip = self.pure_fn(FunctionKind::GoshMethod, vec![p.bytes], vec![p.string]);
                vec![
                    Member::builtin("diff", text),
                    Member::builtin("applyPatch", text),
                    Member::builtin("zip", zip),
                    Member::builtin("unzip", unzip),
                ]
            }
            MagicKind::MetaType(argument) => self.meta_type_members(argument),
        }
    }

    /// `type(C)`, `type(uintN)` and `type(E)`.
    fn meta_type_members(&mut self, argument: TypeId) -> Vec<Member> {
        let p = *self.prims();
        match self.get(argument).clone() {
            Type::Contract { id, .. } => {
                if self.decls().contract(id).can_be_deployed() {
                    vec![
                        Member::builtin("creationCode", p.bytes),
                        Member::builtin("runtimeCode", p.bytes),
                        Member::builtin("name", p.string),
                    ]
                } else {
                    vec![
                        Member::builtin("interfaceId", p.bytes4),
                        Member::builtin("name", p.string),
                    ]
                }
            }
            Type::Integer(_) | Type::Enum(_) => vec![
                Member::builtin("min", argument),
                Member::builtin("max", argument),
            ],
            _ => tsol_unreachable!("Only enums, contracts or integer types supported for now."),
        }
    }

    fn function_members(&mut self, function: &FunctionType, scope: Option<ScopeId>) -> Vec<Member> {
        let p = *self.prims();
        let selector = vec![Member::builtin("selector", p.bytes4)];
        let decl = match function.declaration {
            Some(DeclRef::Function(decl)) => Some(decl),
            _ => None,
        };
        match function.kind {
            FunctionKind::Declaration => match decl {
                Some(decl) if self.decls().function(decl).is_part_of_external_interface() => selector,
                _ => Vec::new(),
            },
            FunctionKind::Internal => {
                let Some(decl) = decl else {
                    return Vec::new();
                };
                let Some(contract) = self.decls().function_contract(decl) else {
                    return Vec::new();
                };
                match scope {
                    Some(ScopeId::Contract(current))
                        if current != contract
                            && self.decls().function(decl).is_part_of_external_interface() =>
                    {
                        tsol_assert!(
                            self.decls().derives_from(current, contract),
                            "Internal function of an unrelated contract."
                        );
                        selector
                    }
                    _ => Vec::new(),
                }
            }
            FunctionKind::External => vec![
                Member::builtin("selector", p.bytes4),
                Member::builtin("address", p.address),
            ],
            FunctionKind::DelegateCall => match decl {
                Some(decl) if self.decls().function(decl).visibility != Visibility::Internal => selector,
                _ => Vec::new(),
            },
            FunctionKind::Error => selector,
            FunctionKind::Event => match decl.map(|d| self.decls().function(d).kind) {
                Some(FunctionDefKind::Event { anonymous: true }) => Vec::new(),
                _ => vec![Member::builtin("selector", p.bytes32)],
            },
            _ => Vec::new(),
        }
    }

    // ── Contracts ──────────────────────────────────────────────────────

    /// Externally callable functions and public getters of a contract,
    /// most derived first.
    fn contract_interface_members(&mut self, contract: ContractId) -> Vec<Member> {
        if self.decls().contract(contract).is_library() {
            return Vec::new();
        }
        let bases = self.decls().contract(contract).linearized_bases.clone();
        let mut seen = FxHashSet::default();
        let mut members = Vec::new();
        for base in bases {
            let def = self.decls().contract(base).clone();
            for function in def.functions {
                if !self.decls().function(function).is_part_of_external_interface() {
                    continue;
                }
                let external = self.function_type_of(function, FunctionKind::External);
                if self.interface_function_type(external).is_none() {
                    continue;
                }
                if !seen.insert(self.external_signature(external)) {
                    continue;
                }
                let name = self.decls().function(function).name.clone();
                let ty = self.as_externally_callable_function(external, false);
                members.push(Member::declared(name, ty, MemberDecl::Function(function)));
            }
            for variable in def.state_variables {
                let var = self.decls().variable(variable);
                if var.visibility < Visibility::Public {
                    continue;
                }
                let name = var.name.clone();
                let getter = self.getter_function_type(variable);
                if self.interface_function_type(getter).is_none() {
                    continue;
                }
                if !seen.insert(self.external_signature(getter)) {
                    continue;
                }
                let ty = self.as_externally_callable_function(getter, false);
                members.push(Member::declared(name, ty, MemberDecl::Variable(variable)));
            }
        }
        members
    }

    /// The type of a function accessed as `C.f`.
    pub fn function_type_via_contract_name(&mut self, function: FunctionDeclId) -> TypeId {
        let def = self.decls().function(function);
        let (kind, is_public) = (def.kind, def.is_public());
        match kind {
            FunctionDefKind::Event { .. } => self.function_type_of(function, FunctionKind::Event),
            FunctionDefKind::Error => self.function_type_of(function, FunctionKind::Error),
            _ if self.decls().is_library_function(function) => {
                if is_public {
                    let external = self.function_type_of(function, FunctionKind::External);
                    self.as_externally_callable_function(external, true)
                } else {
                    self.function_type_of(function, FunctionKind::Internal)
                }
            }
            _ => self.function_type_of(function, FunctionKind::Declaration),
        }
    }

    /// The type of a function referenced by its plain name.
    fn function_type_direct(&mut self, function: FunctionDeclId) -> TypeId {
        match self.decls().function(function).kind {
            FunctionDefKind::Event { .. } => self.function_type_of(function, FunctionKind::Event),
            FunctionDefKind::Error => self.function_type_of(function, FunctionKind::Error),
            _ => self.function_type_of(function, FunctionKind::Internal),
        }
    }

    fn type_type_members(&mut self, actual: TypeId, scope: Option<ScopeId>) -> Vec<Member> {
        let p = *self.prims();
        match self.get(actual).clone() {
            Type::Contract { id, is_super: true } => self.super_members(id),
            Type::Contract { id, is_super: false } => self.contract_type_members(id, scope),
            Type::Enum(enum_id) => {
                let values = self.decls().enum_def(enum_id).values.clone();
                values
                    .into_iter()
                    .enumerate()
                    .map(|(index, name)| {
                        Member::declared(name, actual, MemberDecl::EnumValue { id: enum_id, index })
                    })
                    .collect()
            }
            Type::Address => {
                let make_extern = self.pure_fn(
                    FunctionKind::AddressMakeAddrExtern,
                    vec![p.uint256, p.uint256],
                    vec![p.address],
                );
                let make_none = self.pure_fn(FunctionKind::AddressMakeAddrNone, vec![], vec![p.address]);
                let make_std = self.pure_fn(
                    FunctionKind::AddressMakeAddrStd,
                    vec![p.int8, p.uint256],
                    vec![p.address],
                );
                vec![
                    Member::builtin("makeAddrExtern", make_extern),
                    Member::builtin("makeAddrNone", make_none),
                    Member::builtin("makeAddrStd", make_std),
                ]
            }
            Type::UserDefinedValueType(udvt) => {
                let underlying = self.decls().udvt(udvt).underlying;
                vec![
                    Member::builtin("wrap", self.pure_fn(FunctionKind::Wrap, vec![underlying], vec![actual])),
                    Member::builtin("unwrap", self.pure_fn(FunctionKind::Unwrap, vec![actual], vec![underlying])),
                ]
            }
            Type::Array(array) if array.is_byte_array_or_string() => {
                let (result, kind) = if array.is_string() {
                    (p.string, FunctionKind::StringConcat)
                } else {
                    (p.bytes, FunctionKind::BytesConcat)
                };
                vec![Member::builtin("concat", self.variadic_fn(kind, vec![result]))]
            }
            _ => Vec::new(),
        }
    }

    /// Functions reachable through `super`: the most derived implemented
    /// function of each signature among the bases.
    fn super_members(&mut self, contract: ContractId) -> Vec<Member> {
        let bases = self.decls().contract(contract).linearized_bases.clone();
        tsol_assert!(
            !bases.is_empty(),
            "linearizedBaseContracts should at least contain the most derived contract."
        );
        let mut members: Vec<Member> = Vec::new();
        for base in bases.into_iter().skip(1) {
            let functions = self.decls().contract(base).functions.clone();
            for function in functions {
                let def = self.decls().function(function);
                if !def.is_ordinary() || !def.is_visible_in_derived_contracts() || !def.implemented {
                    continue;
                }
                let name = def.name.clone();
                let ty = self.function_type_of(function, FunctionKind::Internal);
                let shadowed = members.iter().any(|member| {
                    member.name == name && self.has_equal_parameter_types(member.ty, ty)
                });
                if !shadowed {
                    members.push(Member::declared(name, ty, MemberDecl::Function(function)));
                }
            }
        }
        members
    }

    fn has_equal_parameter_types(&self, a: TypeId, b: TypeId) -> bool {
        match (self.get(a), self.get(b)) {
            (Type::Function(f), Type::Function(g)) => {
                f.params.len() == g.params.len()
                    && f.params.iter().zip(&g.params).all(|(&x, &y)| self.types_equal(x, y))
            }
            _ => false,
        }
    }

    /// Members of `C` used as an expression: nested types, and functions
    /// depending on whether the current scope derives from `C`.
    fn contract_type_members(&mut self, contract: ContractId, scope: Option<ScopeId>) -> Vec<Member> {
        let def = self.decls().contract(contract).clone();
        let in_deriving_scope = match scope {
            Some(ScopeId::Contract(current)) => self.decls().derives_from(current, contract),
            _ => false,
        };
        let mut members = Vec::new();
        for &s in &def.structs {
            let name = self.decls().struct_def(s).name.clone();
            let ty = self.struct_type(s);
            let ty = self.type_type(ty);
            members.push(Member::declared(name, ty, MemberDecl::Struct(s)));
        }
        for &e in &def.enums {
            let name = self.decls().enum_def(e).name.clone();
            let ty = self.enum_type(e);
            let ty = self.type_type(ty);
            members.push(Member::declared(name, ty, MemberDecl::Enum(e)));
        }
        for &u in &def.udvts {
            let name = self.decls().udvt(u).name.clone();
            let ty = self.udvt(u);
            let ty = self.type_type(ty);
            members.push(Member::declared(name, ty, MemberDecl::UserDefinedValueType(u)));
        }
        for &function in &def.functions {
            let fdef = self.decls().function(function);
            if fdef.kind == FunctionDefKind::Modifier || fdef.name.is_empty() {
                continue;
            }
            let name = fdef.name.clone();
            let is_event_or_error = matches!(fdef.kind, FunctionDefKind::Event { .. } | FunctionDefKind::Error);
            let implemented = fdef.implemented;
            let derived_visible = fdef.is_visible_in_derived_contracts();
            let externally_visible =
                (def.is_library() && fdef.is_visible_as_library_member()) || fdef.is_public();
            let ty = if !def.is_library() && in_deriving_scope && derived_visible {
                if implemented || is_event_or_error {
                    self.function_type_direct(function)
                } else {
                    self.function_type_via_contract_name(function)
                }
            } else if externally_visible || is_event_or_error {
                self.function_type_via_contract_name(function)
            } else {
                continue;
            };
            members.push(Member::declared(name, ty, MemberDecl::Function(function)));
        }
        if !def.is_library() && in_deriving_scope {
            for &variable in &def.state_variables {
                let var = self.decls().variable(variable);
                if var.visibility >= Visibility::Internal {
                    members.push(Member::declared(var.name.clone(), var.ty, MemberDecl::Variable(variable)));
                }
            }
        }
        members
    }

    fn exported_member(&mut self, name: String, symbol: ExportedSymbol) -> Member {
        match symbol {
            ExportedSymbol::Contract(c) => {
                let ty = self.contract(c, false);
                let ty = self.type_type(ty);
                Member::declared(name, ty, MemberDecl::Contract(c))
            }
            ExportedSymbol::Struct(s) => {
                let ty = self.struct_type(s);
                let ty = self.type_type(ty);
                Member::declared(name, ty, MemberDecl::Struct(s))
            }
            ExportedSymbol::Enum(e) => {
                let ty = self.enum_type(e);
                let ty = self.type_type(ty);
                Member::declared(name, ty, MemberDecl::Enum(e))
            }
            ExportedSymbol::UserDefinedValueType(u) => {
                let ty = self.udvt(u);
                let ty = self.type_type(ty);
                Member::declared(name, ty, MemberDecl::UserDefinedValueType(u))
            }
            ExportedSymbol::Function(f) => {
                let ty = self.function_type_direct(f);
                Member::declared(name, ty, MemberDecl::Function(f))
            }
        }
    }

    // ── using ... for ──────────────────────────────────────────────────

    /// Scope a user-defined type is declared in.
    fn type_definition_scope(&self, id: TypeId) -> Option<ScopeId> {
        let decls = self.decls();
        match self.get(id) {
            Type::Struct { id, .. } => Some(decls.struct_def(*id).scope),
            Type::Enum(id) => Some(decls.enum_def(*id).scope),
            Type::UserDefinedValueType(id) => Some(decls.udvt(*id).scope),
            Type::Contract { id, .. } => Some(ScopeId::SourceUnit(decls.contract(*id).source_unit)),
            _ => None,
        }
    }

    fn using_for_directives(&self, id: TypeId, scope: ScopeId) -> Vec<UsingForDirective> {
        let decls = self.decls();
        let mut directives = Vec::new();
        if let ScopeId::Contract(contract) = scope {
            directives.extend(decls.contract(contract).using_for.iter().cloned());
        }
        let source_unit = decls.source_unit_of(scope);
        directives.extend(decls.source_unit(source_unit).using_for.iter().cloned());
        if let Some(ScopeId::SourceUnit(defining)) = self.type_definition_scope(id) {
            directives.extend(
                decls
                    .source_unit(defining)
                    .using_for
                    .iter()
                    .filter(|directive| directive.global && directive.target.is_some())
                    .cloned(),
            );
        }
        directives
    }

    /// Functions attached to `id` by `using ... for` directives visible in
    /// `scope`, bound to their first parameter.
    fn bound_functions(&mut self, id: TypeId, scope: ScopeId) -> Vec<Member> {
        let directives = self.using_for_directives(id, scope);
        let own_pointer = self.with_location(id, true);
        let mut seen: FxHashSet<(String, FunctionDeclId)> = FxHashSet::default();
        let mut members = Vec::new();
        for directive in directives {
            if let Some(target) = directive.target {
                if self.with_location(target, true) != own_pointer {
                    continue;
                }
            }
            for item in directive.items {
                match item {
                    UsingForItem::Library(library) => {
                        tsol_assert!(
                            self.decls().contract(library).is_library(),
                            "using-for names a contract that is not a library."
                        );
                        let functions = self.decls().contract(library).functions.clone();
                        for function in functions {
                            let def = self.decls().function(function);
                            if !def.is_ordinary()
                                || !def.is_visible_as_library_member()
                                || def.params.is_empty()
                            {
                                continue;
                            }
                            let name = def.name.clone();
                            self.add_bound_function(id, function, name, &mut seen, &mut members);
                        }
                    }
                    UsingForItem::Function { decl, name } => {
                        self.add_bound_function(id, decl, name, &mut seen, &mut members);
                    }
                }
            }
        }
        members
    }

    fn add_bound_function(
        &mut self,
        id: TypeId,
        function: FunctionDeclId,
        name: String,
        seen: &mut FxHashSet<(String, FunctionDeclId)>,
        members: &mut Vec<Member>,
    ) {
        if self.decls().function(function).params.is_empty() {
            return;
        }
        let ty = if self.decls().is_library_function(function) {
            self.function_type_via_contract_name(function)
        } else {
            self.function_type_of(function, FunctionKind::Internal)
        };
        let bound = self.as_bound_function(ty);
        let Some(self_type) = self.get(bound).as_function().and_then(|f| f.self_type()) else {
            tsol_unreachable!("Bound function without self type.");
        };
        if self.is_implicitly_convertible(id, self_type).is_ok() && seen.insert((name.clone(), function)) {
            members.push(Member::declared(name, bound, MemberDecl::Function(function)));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decl::{ContractKind, FunctionDef, Param, SourceUnitId};

    fn setup() -> (TypeCtx, SourceUnitId) {
        let mut ctx = TypeCtx::new();
        let su = ctx.decls_mut().add_source_unit("main.tsol");
        (ctx, su)
    }

    #[test]
    fn address_members() {
        let (mut ctx, _) = setup();
        let p = *ctx.prims();
        let members = ctx.members(p.address, None);
        assert_eq!(members.member_type("balance"), Some(p.uint128));
        assert_eq!(members.member_type("wid"), Some(p.int8));
        let transfer = members.member_type("transfer").unwrap();
        let transfer = ctx.get(transfer).as_function().unwrap();
        assert!(transfer.options.arbitrary_parameters);
        assert_eq!(transfer.param_names[0], "value");
    }

    #[test]
    fn array_members_and_overloads() {
        let (mut ctx, _) = setup();
        let p = *ctx.prims();
        let list = ctx.dynamic_array(p.uint32);
        let members = ctx.members(list, None);
        assert_eq!(members.members_by_name("push").len(), 2);
        assert_eq!(members.member_type("push"), None);
        assert_eq!(members.member_type("length"), Some(p.uint256));

        let strings = ctx.members(p.string, None);
        assert!(strings.member_type("length").is_none());
        assert_eq!(strings.members_by_name("substr").len(), 2);
        assert!(strings.member_type("toSlice").is_some());

        let bytes = ctx.members(p.bytes, None);
        let push = bytes.members_by_name("push")[0].ty;
        assert_eq!(
            ctx.get(push).as_function().unwrap().kind,
            FunctionKind::ByteArrayPush
        );
    }

    #[test]
    fn mapping_members() {
        let (mut ctx, _) = setup();
        let p = *ctx.prims();
        let map = ctx.mapping(p.uint32, p.address);
        let members = ctx.members(map, None);
        assert_eq!(
            members.names(),
            [
                "at", "min", "max", "delMin", "delMax", "next", "prev", "nextOrEq", "prevOrEq",
                "keys", "values", "fetch", "exists", "empty", "replace", "add", "getSet",
                "getAdd", "getReplace"
            ]
        );
        let fetch = members.member_type("fetch").unwrap();
        let maybe_address = ctx.optional(p.address);
        assert_eq!(ctx.get(fetch).as_function().unwrap().returns, vec![maybe_address]);
        let keys = members.member_type("keys").unwrap();
        let key_list = ctx.dynamic_array(p.uint32);
        assert_eq!(ctx.get(keys).as_function().unwrap().returns, vec![key_list]);
    }

    #[test]
    fn optional_of_tuple_has_two_setters() {
        let (mut ctx, _) = setup();
        let p = *ctx.prims();
        let pair = ctx.tuple(vec![p.uint8, p.bool]);
        let maybe_pair = ctx.optional(pair);
        let members = ctx.members(maybe_pair, None);
        assert_eq!(members.members_by_name("set").len(), 2);
        assert_eq!(members.member_type("get").map(|f| ctx.get(f).as_function().unwrap().returns.clone()), Some(vec![pair]));
    }

    #[test]
    fn struct_members_and_storage() {
        let (mut ctx, su) = setup();
        let p = *ctx.prims();
        let s = ctx.decls_mut().add_struct("Account", ScopeId::SourceUnit(su));
        let history = ctx.dynamic_array(p.uint64);
        ctx.decls_mut().set_struct_members(
            s,
            vec![
                ("owner".to_string(), p.address),
                ("nonce".to_string(), p.uint32),
                ("history".to_string(), history),
            ],
        );
        let account = ctx.struct_type(s);
        let members = ctx.members(account, None);
        assert_eq!(members.names(), ["owner", "nonce", "history", "unpack"]);
        let unpack = members.member_type("unpack").unwrap();
        assert_eq!(
            ctx.get(unpack).as_function().unwrap().returns,
            vec![p.address, p.uint32, history]
        );
        assert_eq!(members.storage_size(&mut ctx), &BigUint::from(3u32));
        assert_eq!(
            members.member_storage_offset(&mut ctx, "nonce"),
            Some(&StorageOffset::new(1u32, 0))
        );
        assert_eq!(members.member_storage_offset(&mut ctx, "unpack"), None);

        let pointer = ctx.with_location(account, true);
        let pointer_members = ctx.members(pointer, None);
        let history_ptr = ctx.with_location(history, true);
        assert_eq!(pointer_members.member_type("history"), Some(history_ptr));
    }

    #[test]
    fn member_lists_are_cached_until_cleared() {
        let (mut ctx, _) = setup();
        let p = *ctx.prims();
        let first = ctx.members(p.address, None);
        let second = ctx.members(p.address, None);
        assert!(Rc::ptr_eq(&first, &second));
        ctx.clear_caches();
        let third = ctx.members(p.address, None);
        assert!(!Rc::ptr_eq(&first, &third));
    }

    #[test]
    fn library_functions_bind_to_matching_types() {
        let (mut ctx, su) = setup();
        let p = *ctx.prims();
        let lib = ctx.decls_mut().add_contract("Math", ContractKind::Library, su);
        let lib_scope = ScopeId::Contract(lib);
        ctx.decls_mut().add_function(
            FunctionDef::new("double", lib_scope)
                .params(vec![Param::new("x", p.uint64)])
                .returns(vec![Param::unnamed(p.uint64)]),
        );
        ctx.decls_mut().add_function(
            FunctionDef::new("negate", lib_scope)
                .params(vec![Param::new("x", p.bool)])
                .returns(vec![Param::unnamed(p.bool)]),
        );
        ctx.decls_mut().add_function(
            FunctionDef::new("helper", lib_scope)
                .visibility(Visibility::Private)
                .params(vec![Param::new("x", p.uint64)]),
        );
        let scope = ScopeId::SourceUnit(su);
        let directive = UsingForDirective {
            target: None,
            items: vec![UsingForItem::Library(lib), UsingForItem::Library(lib)],
            global: false,
        };
        ctx.decls_mut().add_using_for(scope, directive);

        let members = ctx.members(p.uint32, Some(scope));
        let bound: Vec<&str> = members
            .iter()
            .filter(|m| m.decl.is_some())
            .map(|m| m.name.as_str())
            .collect();
        assert_eq!(bound, ["double"]);
        let double = members.member_type("double").unwrap();
        assert!(ctx.get(double).as_function().unwrap().bound());
        assert!(ctx.members(p.uint32, None).member_type("double").is_none());
    }

    #[test]
    fn global_using_for_follows_the_type() {
        let (mut ctx, defining) = setup();
        let p = *ctx.prims();
        let other = ctx.decls_mut().add_source_unit("other.tsol");
        let price = ctx.decls_mut().add_udvt("Price", ScopeId::SourceUnit(defining), p.uint128);
        let price_ty = ctx.udvt(price);
        let f = ctx.decls_mut().add_function(
            FunctionDef::new("isZero", ScopeId::SourceUnit(defining))
                .params(vec![Param::new("p", price_ty)])
                .returns(vec![Param::unnamed(p.bool)]),
        );
        ctx.decls_mut().add_using_for(
            ScopeId::SourceUnit(defining),
            UsingForDirective {
                target: Some(price_ty),
                items: vec![UsingForItem::Function {
                    decl: f,
                    name: "isZero".to_string(),
                }],
                global: true,
            },
        );
        let members = ctx.members(price_ty, Some(ScopeId::SourceUnit(other)));
        assert!(members.member_type("isZero").is_some());
        let members = ctx.members(p.uint128, Some(ScopeId::SourceUnit(other)));
        assert!(members.member_type("isZero").is_none());
    }

    #[test]
    fn super_lists_most_derived_base_functions() {
        let (mut ctx, su) = setup();
        let p = *ctx.prims();
        let a = ctx.decls_mut().add_contract("A", ContractKind::Contract, su);
        let b = ctx.decls_mut().add_contract("B", ContractKind::Contract, su);
        let c = ctx.decls_mut().add_contract("C", ContractKind::Contract, su);
        ctx.decls_mut().add_base(b, a);
        ctx.decls_mut().add_base(c, b);
        ctx.decls_mut().link_contracts().unwrap();
        let in_a = ctx.decls_mut().add_function(
            FunctionDef::new("hook", ScopeId::Contract(a)).params(vec![Param::new("x", p.uint8)]),
        );
        let in_b = ctx.decls_mut().add_function(
            FunctionDef::new("hook", ScopeId::Contract(b)).params(vec![Param::new("x", p.uint8)]),
        );
        ctx.decls_mut()
            .add_function(FunctionDef::new("hook", ScopeId::Contract(c)).params(vec![Param::new("x", p.uint8)]));
        ctx.decls_mut().add_function(
            FunctionDef::new("secret", ScopeId::Contract(a)).visibility(Visibility::Private),
        );
        let sup = ctx.contract(c, true);
        let sup_type = ctx.type_type(sup);
        let members = ctx.members(sup_type, Some(ScopeId::Contract(c)));
        let hooks = members.members_by_name("hook");
        assert_eq!(hooks.len(), 1);
        assert_eq!(hooks[0].decl, Some(MemberDecl::Function(in_b)));
        assert_ne!(hooks[0].decl, Some(MemberDecl::Function(in_a)));
        assert!(members.member_type("secret").is_none());
    }

    #[test]
    fn contract_members_are_external_functions() {
        let (mut ctx, su) = setup();
        let p = *ctx.prims();
        let token = ctx.decls_mut().add_contract("Token", ContractKind::Contract, su);
        ctx.decls_mut().add_function(
            FunctionDef::new("transfer", ScopeId::Contract(token))
                .visibility(Visibility::External)
                .params(vec![Param::new("to", p.address), Param::new("amount", p.uint128)]),
        );
        ctx.decls_mut().add_function(
            FunctionDef::new("internalOnly", ScopeId::Contract(token)).visibility(Visibility::Internal),
        );
        ctx.decls_mut()
            .add_state_variable(token, "totalSupply", p.uint128, Visibility::Public);
        let token_ty = ctx.contract(token, false);
        let members = ctx.members(token_ty, None);
        assert_eq!(members.names(), ["transfer", "totalSupply"]);
        let transfer = members.member_type("transfer").unwrap();
        let function = ctx.get(transfer).as_function().unwrap().clone();
        assert_eq!(function.kind, FunctionKind::External);
        let fn_members = ctx.members(transfer, None);
        assert_eq!(fn_members.names(), ["selector", "address"]);
    }

    #[test]
    fn type_members_of_enums_and_meta_types() {
        let (mut ctx, su) = setup();
        let p = *ctx.prims();
        let e = ctx
            .decls_mut()
            .add_enum("State", ScopeId::SourceUnit(su), &["Idle", "Busy"]);
        let state = ctx.enum_type(e);
        let state_type = ctx.type_type(state);
        let members = ctx.members(state_type, None);
        assert_eq!(members.names(), ["Idle", "Busy"]);
        assert_eq!(members.member_type("Busy"), Some(state));

        let meta = ctx.meta_type(p.uint16);
        let members = ctx.members(meta, None);
        assert_eq!(members.member_type("max"), Some(p.uint16));

        let iface = ctx.decls_mut().add_contract("IWallet", ContractKind::Interface, su);
        let iface_ty = ctx.contract(iface, false);
        let meta = ctx.meta_type(iface_ty);
        let members = ctx.members(meta, None);
        assert_eq!(members.names(), ["interfaceId", "name"]);
    }

    #[test]
    fn module_members_are_exports() {
        let (mut ctx, su) = setup();
        let p = *ctx.prims();
        ctx.decls_mut().add_contract("Vault", ContractKind::Contract, su);
        ctx.decls_mut().add_udvt("Amount", ScopeId::SourceUnit(su), p.uint128);
        let module = ctx.module(su);
        let members = ctx.members(module, None);
        assert_eq!(members.names(), ["Vault", "Amount"]);
        let amount = members.member_type("Amount").unwrap();
        assert!(matches!(ctx.get(amount), Type::TypeType(_)));
    }
}
