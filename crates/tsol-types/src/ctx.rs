//! The type context: an arena that interns every [`Type`] of one compilation.
//!
//! Types are deduplicated by structural value, so two requests for `uint256`
//! yield the same [`TypeId`] and handle equality is type equality for
//! everything except function types that differ only in parameter names.
//! Each interned type also records its rich identifier, which can be used to
//! look the handle up again.
//!
//! Derived facts (member lists, storage offsets, interface and encoding
//! types) are cached on the context and invalidated together by
//! [`TypeCtx::clear_caches`].

use std::rc::Rc;

use num_bigint::BigUint;
use num_rational::BigRational;
use rustc_hash::FxHashMap;
use serde::Deserialize;
use tsol_common::tsol_assert;

use crate::decl::{ContractId, DeclStore, EnumId, ScopeId, SourceUnitId, StructId, UdvtId};
use crate::error::TypeError;
use crate::members::MemberList;
use crate::ty::{
    ArrayKind, ArrayType, FixedPointType, FunctionType, IntegerType, MagicKind,
    RationalNumberType, Type, TypeId, VarIntegerType,
};

// ── Configuration ──────────────────────────────────────────────────────

/// Settings that influence type decisions.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TypeCtxConfig {
    /// Whether the v2 ABI encoder is available (nested dynamic arrays and structs).
    pub encoder_v2: bool,
    /// Largest numerator or denominator of a rational constant, in bits.
    pub precision_bits: u32,
    /// Largest number of fractional digits of a fixed-point type.
    pub max_fractional_digits: u32,
}

impl Default for TypeCtxConfig {
    fn default() -> Self {
        Self {
            encoder_v2: true,
            precision_bits: 4096,
            max_fractional_digits: 80,
        }
    }
}

impl TypeCtxConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

// ── Primitives ─────────────────────────────────────────────────────────

/// Handles of frequently used types, interned when the context is created.
#[derive(Debug, Clone, Copy, Default)]
pub struct Primitives {
    pub bool: TypeId,
    pub address: TypeId,
    pub uint8: TypeId,
    pub uint16: TypeId,
    pub uint32: TypeId,
    pub uint64: TypeId,
    pub uint128: TypeId,
    pub uint256: TypeId,
    pub int8: TypeId,
    pub int256: TypeId,
    pub bytes1: TypeId,
    pub bytes4: TypeId,
    pub bytes32: TypeId,
    pub bytes: TypeId,
    pub string: TypeId,
    pub cell: TypeId,
    pub slice: TypeId,
    pub builder: TypeId,
    pub variant: TypeId,
    pub null: TypeId,
    pub empty_map: TypeId,
    pub empty_tuple: TypeId,
    pub extra_currency_collection: TypeId,
    pub var_uint16: TypeId,
    pub var_uint32: TypeId,
    pub inaccessible_dynamic: TypeId,
}

// ── Context ────────────────────────────────────────────────────────────

pub struct TypeCtx {
    config: TypeCtxConfig,
    decls: DeclStore,
    types: Vec<Type>,
    rich_ids: Vec<String>,
    intern_map: FxHashMap<Type, TypeId>,
    by_rich_id: FxHashMap<String, TypeId>,
    prims: Primitives,
    pub(crate) member_lists: FxHashMap<(TypeId, Option<ScopeId>), Rc<MemberList>>,
    pub(crate) interface_memo: FxHashMap<(TypeId, bool), Result<TypeId, TypeError>>,
    pub(crate) encoding_memo: FxHashMap<TypeId, Option<TypeId>>,
}

impl Default for TypeCtx {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeCtx {
    pub fn new() -> Self {
        Self::with_config(TypeCtxConfig::default())
    }

    pub fn with_config(config: TypeCtxConfig) -> Self {
        let mut ctx = Self {
            config,
            decls: DeclStore::new(),
            types: Vec::new(),
            rich_ids: Vec::new(),
            intern_map: FxHashMap::default(),
            by_rich_id: FxHashMap::default(),
            prims: Primitives::default(),
            member_lists: FxHashMap::default(),
            interface_memo: FxHashMap::default(),
            encoding_memo: FxHashMap::default(),
        };
        ctx.prims = ctx.intern_primitives();
        ctx
    }

    fn intern_primitives(&mut self) -> Primitives {
        let bytes1 = self.intern(Type::FixedBytes(1));
        Primitives {
            bool: self.intern(Type::Bool),
            address: self.intern(Type::Address),
            uint8: self.uint(8),
            uint16: self.uint(16),
            uint32: self.uint(32),
            uint64: self.uint(64),
            uint128: self.uint(128),
            uint256: self.uint(256),
            int8: self.int(8),
            int256: self.int(256),
            bytes1,
            bytes4: self.intern(Type::FixedBytes(4)),
            bytes32: self.intern(Type::FixedBytes(32)),
            bytes: self.intern(Type::Array(ArrayType {
                kind: ArrayKind::Bytes,
                base: bytes1,
                length: None,
                is_pointer: false,
            })),
            string: self.intern(Type::Array(ArrayType {
                kind: ArrayKind::String,
                base: bytes1,
                length: None,
                is_pointer: false,
            })),
            cell: self.intern(Type::TvmCell),
            slice: self.intern(Type::TvmSlice),
            builder: self.intern(Type::TvmBuilder),
            variant: self.intern(Type::Variant),
            null: self.intern(Type::Null),
            empty_map: self.intern(Type::EmptyMap),
            empty_tuple: self.intern(Type::Tuple(Vec::new())),
            extra_currency_collection: self.intern(Type::ExtraCurrencyCollection),
            var_uint16: self.intern(Type::VarInteger(VarIntegerType { n: 16, signed: false })),
            var_uint32: self.intern(Type::VarInteger(VarIntegerType { n: 32, signed: false })),
            inaccessible_dynamic: self.intern(Type::InaccessibleDynamic),
        }
    }

    pub fn config(&self) -> &TypeCtxConfig {
        &self.config
    }

    pub fn decls(&self) -> &DeclStore {
        &self.decls
    }

    /// Declarations may be added at any time. Changing a declaration that a
    /// cached member list depends on requires [`clear_caches`](Self::clear_caches).
    pub fn decls_mut(&mut self) -> &mut DeclStore {
        &mut self.decls
    }

    pub fn prims(&self) -> &Primitives {
        &self.prims
    }

    // ── Interning ──────────────────────────────────────────────────────

    /// Intern `ty`, returning the existing handle if an equal type exists.
    pub fn intern(&mut self, ty: Type) -> TypeId {
        if let Some(&id) = self.intern_map.get(&ty) {
            return id;
        }
        let rich_id = self.compute_rich_identifier(&ty);
        let id = TypeId(self.types.len() as u32);
        tracing::trace!(id = id.0, rich_id = %rich_id, "interned type");
        self.by_rich_id.entry(rich_id.clone()).or_insert(id);
        self.rich_ids.push(rich_id);
        self.types.push(ty.clone());
        self.intern_map.insert(ty, id);
        id
    }

    pub fn get(&self, id: TypeId) -> &Type {
        &self.types[id.index()]
    }

    pub fn rich_identifier(&self, id: TypeId) -> &str {
        &self.rich_ids[id.index()]
    }

    /// Find the first type interned under `rich_id`.
    pub fn lookup(&self, rich_id: &str) -> Option<TypeId> {
        self.by_rich_id.get(rich_id).copied()
    }

    /// Number of interned types.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    // ── Lifecycle ──────────────────────────────────────────────────────

    /// Drop every derived cache: member lists (with their storage offsets)
    /// and the interface/encoding memo tables.
    pub fn clear_caches(&mut self) {
        tracing::debug!(
            member_lists = self.member_lists.len(),
            interface = self.interface_memo.len(),
            encoding = self.encoding_memo.len(),
            "clearing type caches"
        );
        self.member_lists.clear();
        self.interface_memo.clear();
        self.encoding_memo.clear();
    }

    /// Start a new compilation: all types and declarations are dropped.
    pub fn reset(&mut self) {
        tracing::debug!(types = self.types.len(), "resetting type context");
        *self = Self::with_config(self.config.clone());
    }

    // ── Constructors ───────────────────────────────────────────────────

    pub fn integer(&mut self, bits: u16, signed: bool) -> TypeId {
        tsol_assert!(
            (1..=256).contains(&bits) || (bits == 257 && signed),
            "Invalid integer bit width {}.",
            bits
        );
        self.intern(Type::Integer(IntegerType::new(bits, signed)))
    }

    pub fn uint(&mut self, bits: u16) -> TypeId {
        self.integer(bits, false)
    }

    pub fn int(&mut self, bits: u16) -> TypeId {
        self.integer(bits, true)
    }

    pub fn fixed_point(&mut self, total_bits: u16, fractional_digits: u16, signed: bool) -> TypeId {
        tsol_assert!(
            total_bits >= 8 && total_bits <= 256 && total_bits % 8 == 0,
            "Invalid fixed point bit width {}.",
            total_bits
        );
        tsol_assert!(
            u32::from(fractional_digits) <= self.config.max_fractional_digits,
            "Too many fractional digits: {}.",
            fractional_digits
        );
        self.intern(Type::FixedPoint(FixedPointType {
            total_bits,
            fractional_digits,
            signed,
        }))
    }

    pub fn var_integer(&mut self, n: u8, signed: bool) -> TypeId {
        tsol_assert!(n == 16 || n == 32, "Invalid varInteger size {}.", n);
        self.intern(Type::VarInteger(VarIntegerType { n, signed }))
    }

    pub fn fixed_bytes(&mut self, bytes: u8) -> TypeId {
        tsol_assert!((1..=32).contains(&bytes), "Invalid fixed bytes size {}.", bytes);
        self.intern(Type::FixedBytes(bytes))
    }

    pub fn rational(&mut self, value: BigRational) -> TypeId {
        self.intern(Type::RationalNumber(RationalNumberType {
            value,
            compatible_bytes: None,
        }))
    }

    /// A rational written as a hex literal of `bytes` bytes.
    pub fn rational_with_bytes(&mut self, value: BigRational, bytes: u8) -> TypeId {
        self.intern(Type::RationalNumber(RationalNumberType {
            value,
            compatible_bytes: Some(bytes),
        }))
    }

    pub fn string_literal(&mut self, value: impl Into<Vec<u8>>) -> TypeId {
        self.intern(Type::StringLiteral(value.into()))
    }

    pub fn contract(&mut self, id: ContractId, is_super: bool) -> TypeId {
        self.intern(Type::Contract { id, is_super })
    }

    pub fn enum_type(&mut self, id: EnumId) -> TypeId {
        self.intern(Type::Enum(id))
    }

    pub fn udvt(&mut self, id: UdvtId) -> TypeId {
        self.intern(Type::UserDefinedValueType(id))
    }

    pub fn struct_type(&mut self, id: StructId) -> TypeId {
        self.intern(Type::Struct {
            id,
            is_pointer: false,
        })
    }

    /// An ordinary array; `length` is `None` for `T[]`.
    pub fn array(&mut self, base: TypeId, length: Option<BigUint>) -> TypeId {
        self.intern(Type::Array(ArrayType {
            kind: ArrayKind::Ordinary,
            base,
            length,
            is_pointer: false,
        }))
    }

    pub fn fixed_array(&mut self, base: TypeId, length: u64) -> TypeId {
        self.array(base, Some(BigUint::from(length)))
    }

    pub fn dynamic_array(&mut self, base: TypeId) -> TypeId {
        self.array(base, None)
    }

    pub fn array_slice(&mut self, array: TypeId) -> TypeId {
        tsol_assert!(
            matches!(self.get(array), Type::Array(_)),
            "Slice of a non-array type requested."
        );
        self.intern(Type::ArraySlice(array))
    }

    pub fn mapping(&mut self, key: TypeId, value: TypeId) -> TypeId {
        self.intern(Type::Mapping { key, value })
    }

    pub fn optional(&mut self, inner: TypeId) -> TypeId {
        self.intern(Type::Optional(inner))
    }

    pub fn function(&mut self, function: FunctionType) -> TypeId {
        tsol_assert!(
            function.params.len() == function.param_names.len()
                && function.returns.len() == function.return_names.len(),
            "Parameter names do not match parameter types."
        );
        self.intern(Type::Function(Box::new(function)))
    }

    pub fn tuple(&mut self, components: Vec<TypeId>) -> TypeId {
        self.intern(Type::Tuple(components.into_iter().map(Some).collect()))
    }

    /// A tuple with possibly missing components.
    pub fn partial_tuple(&mut self, components: Vec<Option<TypeId>>) -> TypeId {
        self.intern(Type::Tuple(components))
    }

    pub fn modifier(&mut self, params: Vec<TypeId>) -> TypeId {
        self.intern(Type::Modifier(params))
    }

    pub fn module(&mut self, source_unit: SourceUnitId) -> TypeId {
        self.intern(Type::Module(source_unit))
    }

    pub fn type_type(&mut self, actual: TypeId) -> TypeId {
        self.intern(Type::TypeType(actual))
    }

    pub fn magic(&mut self, kind: MagicKind) -> TypeId {
        self.intern(Type::Magic(kind))
    }

    pub fn meta_type(&mut self, argument: TypeId) -> TypeId {
        self.intern(Type::Magic(MagicKind::MetaType(argument)))
    }

    pub fn tvm_vector(&mut self, element: TypeId) -> TypeId {
        self.intern(Type::TvmVector(element))
    }

    /// The same reference type with its pointer flag set to `is_pointer`.
    /// Array bases are converted recursively; value types are returned unchanged.
    pub fn with_location(&mut self, id: TypeId, is_pointer: bool) -> TypeId {
        match self.get(id).clone() {
            Type::Struct { id: s, .. } => self.intern(Type::Struct {
                id: s,
                is_pointer,
            }),
            Type::Array(array) => {
                let base = self.with_location(array.base, is_pointer);
                self.intern(Type::Array(ArrayType {
                    base,
                    is_pointer,
                    ..array
                }))
            }
            _ => id,
        }
    }

    pub fn is_pointer(&self, id: TypeId) -> bool {
        match self.get(id) {
            Type::Struct { is_pointer, .. } => *is_pointer,
            Type::Array(array) => array.is_pointer,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_traits::One;

    #[test]
    fn primitives_are_interned_once() {
        let mut ctx = TypeCtx::new();
        let p = *ctx.prims();
        assert_eq!(ctx.uint(256), p.uint256);
        assert_eq!(ctx.fixed_bytes(1), p.bytes1);
        assert_eq!(ctx.lookup("t_uint256"), Some(p.uint256));
        assert_eq!(ctx.rich_identifier(p.string), "t_string");
    }

    #[test]
    fn structural_interning() {
        let mut ctx = TypeCtx::new();
        let a = ctx.uint(32);
        let m1 = ctx.mapping(a, a);
        let m2 = ctx.mapping(a, a);
        assert_eq!(m1, m2);
        let before = ctx.len();
        let _ = ctx.rational(BigRational::one());
        let _ = ctx.rational(BigRational::one());
        assert_eq!(ctx.len(), before + 1);
    }

    #[test]
    fn with_location_recurses_into_arrays() {
        let mut ctx = TypeCtx::new();
        let u8t = ctx.uint(8);
        let inner = ctx.dynamic_array(u8t);
        let outer = ctx.fixed_array(inner, 3);
        let ptr = ctx.with_location(outer, true);
        assert_ne!(ptr, outer);
        assert!(ctx.is_pointer(ptr));
        let Type::Array(array) = ctx.get(ptr).clone() else {
            panic!("expected array");
        };
        assert!(ctx.is_pointer(array.base));
        assert_eq!(ctx.with_location(ptr, false), outer);
        assert_eq!(ctx.with_location(u8t, true), u8t);
    }

    #[test]
    fn config_from_json_fills_defaults() {
        let config = TypeCtxConfig::from_json(r#"{ "encoder_v2": false }"#).unwrap();
        assert!(!config.encoder_v2);
        assert_eq!(config.precision_bits, 4096);
        assert_eq!(config.max_fractional_digits, 80);
    }

    #[test]
    fn reset_drops_types() {
        let mut ctx = TypeCtx::new();
        let base = ctx.len();
        let u = ctx.uint(24);
        ctx.optional(u);
        assert_eq!(ctx.len(), base + 2);
        ctx.reset();
        assert_eq!(ctx.len(), base);
        assert_eq!(ctx.lookup("t_uint24"), None);
    }
}
