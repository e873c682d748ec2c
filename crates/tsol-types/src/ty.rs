//! Type representation for the TSol type engine.
//!
//! Every semantic type is one variant of the closed [`Type`] sum. Types are
//! never handled by value outside the [`TypeCtx`](crate::ctx::TypeCtx): the
//! context interns them and hands out [`TypeId`] handles, and all structural
//! components (array bases, mapping keys, function parameters) are
//! themselves handles into the same arena.

use num_bigint::BigUint;
use num_rational::BigRational;
use serde::Serialize;

use crate::decl::{ContractId, DeclRef, EnumId, SourceUnitId, StructId, UdvtId};

/// Interned handle to a [`Type`] owned by a [`TypeCtx`](crate::ctx::TypeCtx).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TypeId(pub u32);

impl TypeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// The fixed tag identifying which variant a type belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Category {
    Address,
    Integer,
    RationalNumber,
    StringLiteral,
    Bool,
    FixedPoint,
    Array,
    ArraySlice,
    FixedBytes,
    Contract,
    Struct,
    Function,
    Enum,
    UserDefinedValueType,
    Tuple,
    Mapping,
    TypeType,
    Modifier,
    Magic,
    Module,
    InaccessibleDynamic,
    TvmCell,
    TvmSlice,
    TvmBuilder,
    TvmVector,
    Variant,
    VarInteger,
    ExtraCurrencyCollection,
    Optional,
    Null,
    EmptyMap,
}

/// A semantic type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    Integer(IntegerType),
    FixedPoint(FixedPointType),
    /// `varUintN` / `varIntN`: a length-prefixed integer of at most `n - 1` bytes.
    VarInteger(VarIntegerType),
    RationalNumber(RationalNumberType),
    /// Raw bytes of a string literal; `hex".."` literals need not be UTF-8.
    StringLiteral(Vec<u8>),
    /// `bytesN`, 1 to 32 bytes.
    FixedBytes(u8),
    Bool,
    Address,
    Contract { id: ContractId, is_super: bool },
    Enum(EnumId),
    UserDefinedValueType(UdvtId),
    Struct { id: StructId, is_pointer: bool },
    Array(ArrayType),
    /// A slice `a[start:end]` of the given array type.
    ArraySlice(TypeId),
    Mapping { key: TypeId, value: TypeId },
    Optional(TypeId),
    Function(Box<FunctionType>),
    /// Components may be absent, e.g. the left side of `(, uint x) = f()`.
    Tuple(Vec<Option<TypeId>>),
    Modifier(Vec<TypeId>),
    Module(SourceUnitId),
    /// The type of a type name expression, e.g. `uint8` in `uint8(x)`.
    TypeType(TypeId),
    Magic(MagicKind),
    Null,
    EmptyMap,
    Variant,
    TvmCell,
    TvmSlice,
    TvmBuilder,
    TvmVector(TypeId),
    ExtraCurrencyCollection,
    InaccessibleDynamic,
}

impl Type {
    pub fn category(&self) -> Category {
        match self {
            Type::Integer(_) => Category::Integer,
            Type::FixedPoint(_) => Category::FixedPoint,
            Type::VarInteger(_) => Category::VarInteger,
            Type::RationalNumber(_) => Category::RationalNumber,
            Type::StringLiteral(_) => Category::StringLiteral,
            Type::FixedBytes(_) => Category::FixedBytes,
            Type::Bool => Category::Bool,
            Type::Address => Category::Address,
            Type::Contract { .. } => Category::Contract,
            Type::Enum(_) => Category::Enum,
            Type::UserDefinedValueType(_) => Category::UserDefinedValueType,
            Type::Struct { .. } => Category::Struct,
            Type::Array(_) => Category::Array,
            Type::ArraySlice(_) => Category::ArraySlice,
            Type::Mapping { .. } => Category::Mapping,
            Type::Optional(_) => Category::Optional,
            Type::Function(_) => Category::Function,
            Type::Tuple(_) => Category::Tuple,
            Type::Modifier(_) => Category::Modifier,
            Type::Module(_) => Category::Module,
            Type::TypeType(_) => Category::TypeType,
            Type::Magic(_) => Category::Magic,
            Type::Null => Category::Null,
            Type::EmptyMap => Category::EmptyMap,
            Type::Variant => Category::Variant,
            Type::TvmCell => Category::TvmCell,
            Type::TvmSlice => Category::TvmSlice,
            Type::TvmBuilder => Category::TvmBuilder,
            Type::TvmVector(_) => Category::TvmVector,
            Type::ExtraCurrencyCollection => Category::ExtraCurrencyCollection,
            Type::InaccessibleDynamic => Category::InaccessibleDynamic,
        }
    }

    /// Reference types carry a pointer flag that changes their identity.
    pub fn is_reference(&self) -> bool {
        matches!(self, Type::Array(_) | Type::Struct { .. })
    }

    pub fn as_function(&self) -> Option<&FunctionType> {
        match self {
            Type::Function(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&ArrayType> {
        match self {
            Type::Array(a) => Some(a),
            _ => None,
        }
    }
}

// ── Numeric types ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IntegerType {
    pub bits: u16,
    pub signed: bool,
}

impl IntegerType {
    pub fn new(bits: u16, signed: bool) -> Self {
        Self { bits, signed }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FixedPointType {
    pub total_bits: u16,
    pub fractional_digits: u16,
    pub signed: bool,
}

impl FixedPointType {
    /// The integer type with the same width and signedness.
    pub fn as_integer(&self) -> IntegerType {
        IntegerType::new(self.total_bits, self.signed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VarIntegerType {
    /// 16 or 32: the value occupies at most `n - 1` bytes.
    pub n: u8,
    pub signed: bool,
}

impl VarIntegerType {
    pub fn as_integer(&self) -> IntegerType {
        IntegerType::new((self.n as u16 - 1) * 8, self.signed)
    }

    /// Bits needed in a cell: the length prefix plus the largest payload.
    pub fn max_bit_size_in_cell(&self) -> u32 {
        match self.n {
            16 => 4 + 15 * 8,
            _ => 5 + 31 * 8,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RationalNumberType {
    pub value: BigRational,
    /// Byte width of the hex literal this number came from, if any. Such a
    /// literal converts implicitly to `bytesN` of exactly this width.
    pub compatible_bytes: Option<u8>,
}

// ── Arrays ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ArrayKind {
    Ordinary,
    Bytes,
    String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArrayType {
    pub kind: ArrayKind,
    /// Element type; `bytes1` for byte arrays and strings.
    pub base: TypeId,
    /// `None` for dynamically sized arrays.
    pub length: Option<BigUint>,
    pub is_pointer: bool,
}

impl ArrayType {
    pub fn is_dynamically_sized(&self) -> bool {
        self.length.is_none()
    }

    pub fn is_byte_array_or_string(&self) -> bool {
        self.kind != ArrayKind::Ordinary
    }

    pub fn is_byte_array(&self) -> bool {
        self.kind == ArrayKind::Bytes
    }

    pub fn is_string(&self) -> bool {
        self.kind == ArrayKind::String
    }
}

// ── Functions ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum StateMutability {
    Pure,
    View,
    NonPayable,
    Payable,
}

impl StateMutability {
    pub fn as_str(self) -> &'static str {
        match self {
            StateMutability::Pure => "pure",
            StateMutability::View => "view",
            StateMutability::NonPayable => "nonpayable",
            StateMutability::Payable => "payable",
        }
    }
}

/// What a function type calls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum FunctionKind {
    Internal,
    External,
    /// External call into a library.
    DelegateCall,
    /// The type of a function name referenced through its contract.
    Declaration,
    Creation,
    Event,
    Error,
    ArrayPush,
    ByteArrayPush,
    ArrayPop,
    ArrayEmpty,
    ByteToSlice,
    StringMethod,
    StringSubstr,
    StringConcat,
    BytesConcat,
    MappingAt,
    MappingGetMinMax,
    MappingDelMinOrMax,
    MappingGetNextKey,
    MappingKeys,
    MappingValues,
    MappingFetch,
    MappingExists,
    MappingEmpty,
    MappingReplaceOrAdd,
    MappingGetSet,
    OptionalHasValue,
    OptionalGet,
    OptionalSet,
    OptionalReset,
    StructUnpack,
    AddressIsZero,
    AddressUnpack,
    AddressType,
    AddressIsStdAddrWithoutAnyCast,
    AddressTransfer,
    AddressMakeAddrExtern,
    AddressMakeAddrNone,
    AddressMakeAddrStd,
    Wrap,
    Unwrap,
    TvmDataSize,
    TvmCellDepth,
    TvmCellToSlice,
    TvmSliceMethod,
    TvmSliceDecode,
    TvmBuilderMethod,
    TvmBuilderStore,
    TvmVectorPush,
    TvmVectorLength,
    TvmVectorPop,
    VariantIsUint,
    VariantToUint,
    MsgPubkey,
    TvmMethod,
    TvmFunctionId,
    TvmBuildStateInit,
    AbiEncode,
    AbiDecode,
    MathMethod,
    RndMethod,
    GoshMethod,
}

impl FunctionKind {
    /// The lowercase tag used inside rich identifiers.
    pub fn identifier_tag(self) -> &'static str {
        match self {
            FunctionKind::Internal => "internal",
            FunctionKind::External => "external",
            FunctionKind::DelegateCall => "delegatecall",
            FunctionKind::Declaration => "declaration",
            FunctionKind::Creation => "creation",
            FunctionKind::Event => "event",
            FunctionKind::Error => "error",
            FunctionKind::ArrayPush => "arraypush",
            FunctionKind::ByteArrayPush => "bytearraypush",
            FunctionKind::ArrayPop => "arraypop",
            FunctionKind::ArrayEmpty => "arrayempty",
            FunctionKind::ByteToSlice => "bytetoslice",
            FunctionKind::StringMethod => "stringmethod",
            FunctionKind::StringSubstr => "stringsubstr",
            FunctionKind::StringConcat => "stringconcat",
            FunctionKind::BytesConcat => "bytesconcat",
            FunctionKind::MappingAt => "mappingat",
            FunctionKind::MappingGetMinMax => "mappinggetminmax",
            FunctionKind::MappingDelMinOrMax => "mappingdelminmax",
            FunctionKind::MappingGetNextKey => "mappinggetnextkey",
            FunctionKind::MappingKeys => "mappingkeys",
            FunctionKind::MappingValues => "mappingvalues",
            FunctionKind::MappingFetch => "mappingfetch",
            FunctionKind::MappingExists => "mappingexists",
            FunctionKind::MappingEmpty => "mappingempty",
            FunctionKind::MappingReplaceOrAdd => "mappingreplaceoradd",
            FunctionKind::MappingGetSet => "mappinggetset",
            FunctionKind::OptionalHasValue => "optionalhasvalue",
            FunctionKind::OptionalGet | FunctionKind::OptionalSet => "optionalmethod",
            FunctionKind::OptionalReset => "optionalreset",
            FunctionKind::StructUnpack => "structunpack",
            FunctionKind::AddressIsZero => "addressiszero",
            FunctionKind::AddressUnpack => "addressunpack",
            FunctionKind::AddressType => "addresstype",
            FunctionKind::AddressIsStdAddrWithoutAnyCast => "addressisstdaddrwithoutanycast",
            FunctionKind::AddressTransfer => "addresstransfer",
            FunctionKind::AddressMakeAddrExtern => "addressmakeaddrextern",
            FunctionKind::AddressMakeAddrNone => "addressmakeaddrnone",
            FunctionKind::AddressMakeAddrStd => "addressmakeaddrstd",
            FunctionKind::Wrap => "wrap",
            FunctionKind::Unwrap => "unwrap",
            FunctionKind::TvmDataSize => "tvmdatasize",
            FunctionKind::TvmCellDepth => "tvmcelldepth",
            FunctionKind::TvmCellToSlice => "tvmcelltoslice",
            FunctionKind::TvmSliceMethod => "tvmslicemethod",
            FunctionKind::TvmSliceDecode => "tvmslicedecode",
            FunctionKind::TvmBuilderMethod => "tvmbuildermethod",
            FunctionKind::TvmBuilderStore => "tvmbuilderstore",
            FunctionKind::TvmVectorPush => "tvmtuplepush",
            FunctionKind::TvmVectorLength => "tvmtuplelength",
            FunctionKind::TvmVectorPop => "tvmtuplepop",
            FunctionKind::VariantIsUint => "variantisuint",
            FunctionKind::VariantToUint => "varianttouint",
            FunctionKind::MsgPubkey => "msgpubkey",
            FunctionKind::TvmMethod => "tvmmethod",
            FunctionKind::TvmFunctionId => "tvmfunctionid",
            FunctionKind::TvmBuildStateInit => "tvmbuildstateinit",
            FunctionKind::AbiEncode => "abiencode",
            FunctionKind::AbiDecode => "abidecode",
            FunctionKind::MathMethod => "mathmethod",
            FunctionKind::RndMethod => "rndmethod",
            FunctionKind::GoshMethod => "goshmethod",
        }
    }
}

/// Call-site options recorded on a function type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FunctionOptions {
    /// Attached to a value through `using ... for`; the first parameter is `self`.
    pub bound: bool,
    pub arbitrary_parameters: bool,
    pub value_set: bool,
    pub gas_set: bool,
    pub salt_set: bool,
}

impl FunctionOptions {
    pub fn with_arbitrary_parameters() -> Self {
        Self {
            arbitrary_parameters: true,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FunctionType {
    pub kind: FunctionKind,
    pub params: Vec<TypeId>,
    pub returns: Vec<TypeId>,
    pub param_names: Vec<String>,
    pub return_names: Vec<String>,
    pub mutability: StateMutability,
    pub declaration: Option<DeclRef>,
    pub options: FunctionOptions,
}

impl FunctionType {
    /// A built-in function type with unnamed parameters.
    pub fn builtin(
        kind: FunctionKind,
        params: Vec<TypeId>,
        returns: Vec<TypeId>,
        mutability: StateMutability,
    ) -> Self {
        let param_names = vec![String::new(); params.len()];
        let return_names = vec![String::new(); returns.len()];
        Self {
            kind,
            params,
            returns,
            param_names,
            return_names,
            mutability,
            declaration: None,
            options: FunctionOptions::default(),
        }
    }

    pub fn named_params(mut self, names: &[&str]) -> Self {
        self.param_names = names.iter().map(|n| n.to_string()).collect();
        self
    }

    pub fn named_returns(mut self, names: &[&str]) -> Self {
        self.return_names = names.iter().map(|n| n.to_string()).collect();
        self
    }

    pub fn with_options(mut self, options: FunctionOptions) -> Self {
        self.options = options;
        self
    }

    pub fn bound(&self) -> bool {
        self.options.bound
    }

    /// The type of `self` for a bound function.
    pub fn self_type(&self) -> Option<TypeId> {
        if self.bound() {
            self.params.first().copied()
        } else {
            None
        }
    }

    /// Internal and external function values fit in one stack slot pair and
    /// can be compared, stored and passed around.
    pub fn is_value_kind(&self) -> bool {
        matches!(self.kind, FunctionKind::Internal | FunctionKind::External)
    }
}

// ── Magic namespaces ───────────────────────────────────────────────────

/// Built-in namespaces such as `msg` or `tvm`, and `type(T)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MagicKind {
    Block,
    Message,
    Tvm,
    Transaction,
    Abi,
    Math,
    Rnd,
    Gosh,
    MetaType(TypeId),
}
