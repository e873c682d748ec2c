//! The three string projections of a type.
//!
//! - the rich identifier, a machine identifier that distinguishes every pair
//!   of distinct types and is escaped into a plain identifier by
//!   [`TypeCtx::identifier`];
//! - the canonical name, used in external function signatures;
//! - the display string, used in diagnostics.

use std::fmt;

use sha2::{Digest, Sha256};
use tsol_common::tsol_assert;

use crate::ctx::TypeCtx;
use crate::decl::DeclRef;
use crate::identifier::{escape_identifier, is_valid_identifier};
use crate::rational;
use crate::ty::{ArrayKind, FunctionKind, MagicKind, StateMutability, Type, TypeId};

fn parenthesize(inner: &str) -> String {
    format!("({})", inner)
}

impl TypeCtx {
    // ── Rich identifiers ───────────────────────────────────────────────

    fn identifier_list<'a>(&self, ids: impl IntoIterator<Item = &'a Option<TypeId>>) -> String {
        let parts: Vec<&str> = ids
            .into_iter()
            .map(|id| id.map_or("_", |id| self.rich_identifier(id)))
            .collect();
        parenthesize(&parts.join(","))
    }

    fn identifier_list_of(&self, ids: &[TypeId]) -> String {
        let wrapped: Vec<Option<TypeId>> = ids.iter().copied().map(Some).collect();
        self.identifier_list(&wrapped)
    }

    /// Compute the rich identifier of a type that is about to be interned.
    /// All components are already interned, so their identifiers are reused.
    pub(crate) fn compute_rich_identifier(&self, ty: &Type) -> String {
        let decls = self.decls();
        match ty {
            Type::Integer(int) => {
                format!("t_{}int{}", if int.signed { "" } else { "u" }, int.bits)
            }
            Type::FixedPoint(fixed) => format!(
                "t_{}fixed{}x{}",
                if fixed.signed { "" } else { "u" },
                fixed.total_bits,
                fixed.fractional_digits
            ),
            Type::VarInteger(var) => {
                format!("t_var{}int{}", if var.signed { "" } else { "u" }, var.n)
            }
            Type::RationalNumber(number) => {
                let numer = number.value.numer();
                let denom = number.value.denom();
                let mut id = if numer.sign() == num_bigint::Sign::Minus {
                    format!("t_rational_minus_{}_by_{}", numer.magnitude(), denom)
                } else {
                    format!("t_rational_{}_by_{}", numer, denom)
                };
                if let Some(bytes) = number.compatible_bytes {
                    id.push_str(&format!("_bytes{}", bytes));
                }
                id
            }
            Type::StringLiteral(value) => {
                format!("t_stringliteral_{}", hex::encode(Sha256::digest(value)))
            }
            Type::FixedBytes(n) => format!("t_bytes{}", n),
            Type::Bool => "t_bool".to_string(),
            Type::Address => "t_address".to_string(),
            Type::Contract { id, is_super } => format!(
                "{}{}{}",
                if *is_super { "t_super" } else { "t_contract" },
                parenthesize(&decls.contract(*id).name),
                id.0
            ),
            Type::Enum(id) => format!("t_enum{}{}", parenthesize(&decls.enum_def(*id).name), id.0),
            Type::UserDefinedValueType(id) => format!(
                "t_userDefinedValueType{}{}",
                parenthesize(&decls.udvt(*id).name),
                id.0
            ),
            Type::Struct { id, is_pointer } => format!(
                "t_struct{}{}{}",
                parenthesize(&decls.struct_def(*id).name),
                id.0,
                location_suffix(*is_pointer)
            ),
            Type::Array(array) => {
                let mut id = match array.kind {
                    ArrayKind::String => "t_string".to_string(),
                    ArrayKind::Bytes => "t_bytes".to_string(),
                    ArrayKind::Ordinary => {
                        let mut id = format!("t_array{}", parenthesize(self.rich_identifier(array.base)));
                        match &array.length {
                            None => id.push_str("dyn"),
                            Some(length) => id.push_str(&length.to_string()),
                        }
                        id
                    }
                };
                id.push_str(location_suffix(array.is_pointer));
                id
            }
            Type::ArraySlice(array) => format!("{}_slice", self.rich_identifier(*array)),
            Type::Mapping { key, value } => {
                format!("t_mapping{}", self.identifier_list_of(&[*key, *value]))
            }
            Type::Optional(inner) => format!("t_optional_{}", self.rich_identifier(*inner)),
            Type::Function(function) => {
                let mut id = format!(
                    "t_function_{}_{}{}returns{}",
                    function.kind.identifier_tag(),
                    function.mutability.as_str(),
                    self.identifier_list_of(&function.params),
                    self.identifier_list_of(&function.returns)
                );
                let options = function.options;
                if options.arbitrary_parameters {
                    id.push_str("arbitrary");
                }
                if options.value_set {
                    id.push_str("value");
                }
                if options.gas_set {
                    id.push_str("gas");
                }
                if options.salt_set {
                    id.push_str("salt");
                }
                if let Some(self_type) = function.self_type() {
                    id.push_str("bound_to");
                    id.push_str(&parenthesize(self.rich_identifier(self_type)));
                }
                id
            }
            Type::Tuple(components) => format!("t_tuple{}", self.identifier_list(components)),
            Type::Modifier(params) => format!("t_modifier{}", self.identifier_list_of(params)),
            Type::Module(su) => format!("t_module_{}", su.0),
            Type::TypeType(actual) => format!("t_type{}", parenthesize(self.rich_identifier(*actual))),
            Type::Magic(kind) => match kind {
                MagicKind::Block => "t_magic_block".to_string(),
                MagicKind::Message => "t_magic_message".to_string(),
                MagicKind::Tvm => "t_magic_tvm".to_string(),
                MagicKind::Transaction => "t_magic_transaction".to_string(),
                MagicKind::Abi => "t_magic_abi".to_string(),
                MagicKind::Math => "t_magic_math".to_string(),
                MagicKind::Rnd => "t_magic_rnd".to_string(),
                MagicKind::Gosh => "t_magic_gosh".to_string(),
                MagicKind::MetaType(arg) => {
                    format!("t_magic_meta_type_{}", self.rich_identifier(*arg))
                }
            },
            Type::Null => "null".to_string(),
            Type::EmptyMap => "emptyMap".to_string(),
            Type::Variant => "t_variant".to_string(),
            Type::TvmCell => "t_tvmcell".to_string(),
            Type::TvmSlice => "t_tvmslice".to_string(),
            Type::TvmBuilder => "t_tvmbuilder".to_string(),
            Type::TvmVector(element) => format!("t_vector_{}", self.rich_identifier(*element)),
            Type::ExtraCurrencyCollection => "t_extracurrencycollection".to_string(),
            Type::InaccessibleDynamic => "t_inaccessible".to_string(),
        }
    }

    /// The rich identifier escaped into `[A-Za-z0-9_$]`.
    pub fn identifier(&self, id: TypeId) -> String {
        let escaped = escape_identifier(self.rich_identifier(id));
        tsol_assert!(
            is_valid_identifier(&escaped),
            "Identifier contains invalid characters: {}",
            escaped
        );
        escaped
    }

    // ── Canonical names ────────────────────────────────────────────────

    /// The name used in external signatures.
    pub fn canonical_name(&self, id: TypeId) -> String {
        let decls = self.decls();
        match self.get(id) {
            Type::Contract { id, .. } => decls.contract(*id).name.clone(),
            Type::Enum(id) => decls.enum_def(*id).canonical_name.clone(),
            Type::UserDefinedValueType(id) => decls.udvt(*id).canonical_name.clone(),
            Type::Struct { id, .. } => decls.struct_def(*id).canonical_name.clone(),
            Type::Array(array) => match array.kind {
                ArrayKind::String => "string".to_string(),
                ArrayKind::Bytes => "bytes".to_string(),
                ArrayKind::Ordinary => format!(
                    "{}[{}]",
                    self.canonical_name(array.base),
                    array.length.as_ref().map(|l| l.to_string()).unwrap_or_default()
                ),
            },
            Type::Mapping { key, value } => format!(
                "mapping({} => {})",
                self.canonical_name(*key),
                self.canonical_name(*value)
            ),
            Type::Optional(inner) => format!("optional({})", self.canonical_name(*inner)),
            Type::TvmVector(element) => format!("vector({})", self.canonical_name(*element)),
            Type::Function(_) => "function".to_string(),
            _ => self.display(id).to_string(),
        }
    }

    // ── Display ────────────────────────────────────────────────────────

    /// Human-readable rendering for diagnostics.
    pub fn display(&self, id: TypeId) -> TypeDisplay<'_> {
        TypeDisplay { ctx: self, id }
    }
}

fn location_suffix(is_pointer: bool) -> &'static str {
    if is_pointer {
        "_ptr"
    } else {
        ""
    }
}

/// Borrowing [`fmt::Display`] adapter returned by [`TypeCtx::display`].
pub struct TypeDisplay<'a> {
    ctx: &'a TypeCtx,
    id: TypeId,
}

impl TypeDisplay<'_> {
    fn list(&self, f: &mut fmt::Formatter<'_>, ids: &[TypeId]) -> fmt::Result {
        write!(f, "(")?;
        for (i, id) in ids.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}", self.ctx.display(*id))?;
        }
        write!(f, ")")
    }
}

impl fmt::Display for TypeDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ctx = self.ctx;
        let decls = ctx.decls();
        match ctx.get(self.id) {
            Type::Integer(int) => write!(f, "{}int{}", if int.signed { "" } else { "u" }, int.bits),
            Type::FixedPoint(fixed) => write!(
                f,
                "{}fixed{}x{}",
                if fixed.signed { "" } else { "u" },
                fixed.total_bits,
                fixed.fractional_digits
            ),
            Type::VarInteger(var) => {
                write!(f, "var{}{}", if var.signed { "Int" } else { "Uint" }, var.n)
            }
            Type::RationalNumber(number) => {
                f.write_str(&rational::readable_rational(&number.value))
            }
            Type::StringLiteral(value) => {
                let printable = value.iter().all(|b| (0x20..0x7f).contains(b));
                if printable {
                    write!(f, "literal_string \"{}\"", String::from_utf8_lossy(value))
                } else {
                    write!(f, "literal_string hex\"{}\"", hex::encode(value))
                }
            }
            Type::FixedBytes(n) => write!(f, "bytes{}", n),
            Type::Bool => f.write_str("bool"),
            Type::Address => f.write_str("address"),
            Type::Contract { id, is_super } => {
                let contract = decls.contract(*id);
                write!(
                    f,
                    "{}{}{}",
                    if contract.is_library() { "library " } else { "contract " },
                    if *is_super { "super " } else { "" },
                    contract.name
                )
            }
            Type::Enum(id) => write!(f, "enum {}", decls.enum_def(*id).canonical_name),
            Type::UserDefinedValueType(id) => f.write_str(&decls.udvt(*id).canonical_name),
            Type::Struct { id, .. } => write!(f, "struct {}", decls.struct_def(*id).canonical_name),
            Type::Array(array) => match array.kind {
                ArrayKind::String => f.write_str("string"),
                ArrayKind::Bytes => f.write_str("bytes"),
                ArrayKind::Ordinary => {
                    write!(f, "{}[", ctx.display(array.base))?;
                    if let Some(length) = &array.length {
                        write!(f, "{}", length)?;
                    }
                    f.write_str("]")
                }
            },
            Type::ArraySlice(array) => write!(f, "{} slice", ctx.display(*array)),
            Type::Mapping { key, value } => {
                write!(f, "mapping({} => {})", ctx.display(*key), ctx.display(*value))
            }
            Type::Optional(inner) => write!(f, "optional({})", ctx.display(*inner)),
            Type::Function(function) => {
                f.write_str("function ")?;
                if function.kind == FunctionKind::Declaration {
                    if let Some(DeclRef::Function(decl)) = function.declaration {
                        if let Some(contract) = decls.function_contract(decl) {
                            write!(f, "{}.", decls.contract(contract).name)?;
                        }
                        f.write_str(&decls.function(decl).name)?;
                    }
                }
                self.list(f, &function.params)?;
                if function.mutability != StateMutability::NonPayable {
                    write!(f, " {}", function.mutability.as_str())?;
                }
                if function.kind == FunctionKind::External {
                    f.write_str(" external")?;
                }
                if !function.returns.is_empty() {
                    f.write_str(" returns ")?;
                    self.list(f, &function.returns)?;
                }
                Ok(())
            }
            Type::Tuple(components) => {
                f.write_str("tuple(")?;
                for (i, component) in components.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    if let Some(component) = component {
                        write!(f, "{}", ctx.display(*component))?;
                    }
                }
                f.write_str(")")
            }
            Type::Modifier(params) => {
                f.write_str("modifier ")?;
                self.list(f, params)
            }
            Type::Module(su) => write!(f, "module \"{}\"", decls.source_unit(*su).path),
            Type::TypeType(actual) => write!(f, "type({})", ctx.display(*actual)),
            Type::Magic(kind) => match kind {
                MagicKind::Block => f.write_str("block"),
                MagicKind::Message => f.write_str("msg"),
                MagicKind::Tvm => f.write_str("tvm"),
                MagicKind::Transaction => f.write_str("tx"),
                MagicKind::Abi => f.write_str("abi"),
                MagicKind::Math => f.write_str("math"),
                MagicKind::Rnd => f.write_str("rnd"),
                MagicKind::Gosh => f.write_str("gosh"),
                MagicKind::MetaType(arg) => write!(f, "type({})", ctx.display(*arg)),
            },
            Type::Null => f.write_str("null"),
            Type::EmptyMap => f.write_str("emptyMap"),
            Type::Variant => f.write_str("variant"),
            Type::TvmCell => f.write_str("TvmCell"),
            Type::TvmSlice => f.write_str("TvmSlice"),
            Type::TvmBuilder => f.write_str("TvmBuilder"),
            Type::TvmVector(element) => write!(f, "vector({})", ctx.display(*element)),
            Type::ExtraCurrencyCollection => f.write_str("ExtraCurrencyCollection"),
            Type::InaccessibleDynamic => f.write_str("inaccessible dynamic type"),
        }
    }
}
