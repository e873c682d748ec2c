//! External representation of types: interface types, encoding types,
//! calldata sizes and external function signatures.
//!
//! The interface type is what a type looks like in the signature of an
//! externally callable function. The encoding type is what the encoder
//! actually serializes. Both are memoized on the context.

use std::collections::VecDeque;

use num_traits::ToPrimitive;
use rustc_hash::FxHashSet;
use sha2::{Digest, Sha256};
use tsol_common::{tsol_assert, tsol_unreachable};

use crate::ctx::TypeCtx;
use crate::decl::{DeclRef, FunctionDeclId, StructId, VariableId};
use crate::error::TypeError;
use crate::ty::{
    ArrayType, FunctionKind, FunctionOptions, FunctionType, StateMutability, Type, TypeId,
};

/// Bytes of one head slot in calldata.
const WORD_BYTES: u32 = 32;

fn pad_to_word(size: u64) -> u64 {
    size.div_ceil(u64::from(WORD_BYTES)) * u64::from(WORD_BYTES)
}

impl TypeCtx {
    // ── Interface types ────────────────────────────────────────────────

    /// The type as it appears in an external function signature.
    ///
    /// Library functions may take some internal-only types (mappings,
    /// enums, contracts) as they are.
    pub fn interface_type(&mut self, id: TypeId, in_library: bool) -> Result<TypeId, TypeError> {
        if let Some(result) = self.interface_memo.get(&(id, in_library)) {
            return result.clone();
        }
        // Placeholder so a type that reaches itself through a mapping
        // terminates instead of recursing forever.
        self.interface_memo.insert(
            (id, in_library),
            Err(TypeError::interface(
                "Recursive type not allowed for public or external functions.",
            )),
        );
        let result = self.compute_interface_type(id, in_library);
        self.interface_memo.insert((id, in_library), result.clone());
        result
    }

    fn compute_interface_type(&mut self, id: TypeId, in_library: bool) -> Result<TypeId, TypeError> {
        match self.get(id).clone() {
            Type::Integer(_)
            | Type::FixedPoint(_)
            | Type::VarInteger(_)
            | Type::FixedBytes(_)
            | Type::Bool
            | Type::Address
            | Type::TvmCell
            | Type::TvmSlice
            | Type::TvmBuilder
            | Type::Variant
            | Type::ExtraCurrencyCollection => Ok(id),
            Type::Enum(_) => {
                if in_library {
                    Ok(id)
                } else {
                    Ok(self.prims().uint8)
                }
            }
            Type::Contract { is_super, .. } => {
                if is_super {
                    Err(TypeError::interface(
                        "Type super is not supported in external functions.",
                    ))
                } else if in_library {
                    Ok(id)
                } else {
                    Ok(self.prims().address)
                }
            }
            Type::UserDefinedValueType(udvt) => {
                let underlying = self.decls().udvt(udvt).underlying;
                self.interface_type(underlying, in_library)
            }
            Type::Array(array) => self.array_interface_type(id, &array),
            Type::Struct { id: struct_id, .. } => {
                if self.struct_is_recursive(struct_id) {
                    return Err(TypeError::interface(
                        "Recursive type not allowed for public or external functions.",
                    ));
                }
                if !in_library && self.contains_nested_mapping(id) {
                    return Err(TypeError::interface(
                        "Types containing (nested) mappings can only be parameters or return \
                         variables of internal or library functions.",
                    ));
                }
                let members: Vec<TypeId> = self
                    .decls()
                    .struct_def(struct_id)
                    .members
                    .iter()
                    .map(|member| member.ty)
                    .collect();
                for member in members {
                    self.interface_type(member, in_library)?;
                }
                Ok(self.with_location(id, true))
            }
            Type::Mapping { key, value } => {
                let key = self.interface_type(key, in_library)?;
                let value = self.interface_type(value, in_library)?;
                Ok(self.mapping(key, value))
            }
            Type::Optional(inner) => {
                let inner = self.interface_type(inner, in_library)?;
                Ok(self.optional(inner))
            }
            Type::TvmVector(element) => {
                let element = self.interface_type(element, in_library)?;
                Ok(self.tvm_vector(element))
            }
            Type::Function(function) => match function.kind {
                FunctionKind::External | FunctionKind::DelegateCall => Ok(id),
                FunctionKind::Internal => Err(TypeError::interface(
                    "Internal type is not allowed for public or external functions.",
                )),
                _ => Err(TypeError::interface(format!(
                    "Type {} is not supported in external functions.",
                    self.display(id)
                ))),
            },
            Type::RationalNumber(_)
            | Type::StringLiteral(_)
            | Type::ArraySlice(_)
            | Type::Tuple(_)
            | Type::Modifier(_)
            | Type::Module(_)
            | Type::TypeType(_)
            | Type::Magic(_)
            | Type::Null
            | Type::EmptyMap
            | Type::InaccessibleDynamic => Err(TypeError::interface(format!(
                "Type {} is not supported in external functions.",
                self.display(id)
            ))),
        }
    }

    /// The base is converted as outside a library, whatever the caller.
    fn array_interface_type(&mut self, id: TypeId, array: &ArrayType) -> Result<TypeId, TypeError> {
        let base = self.interface_type(array.base, false)?;
        if array.is_byte_array_or_string() {
            return Ok(self.with_location(id, true));
        }
        let interface = self.array(base, array.length.clone());
        Ok(self.with_location(interface, true))
    }

    /// Map every parameter to its interface type. Fails on the first
    /// parameter without one.
    pub fn transform_parameters_to_external(
        &mut self,
        params: &[TypeId],
        in_library: bool,
    ) -> Result<Vec<TypeId>, TypeError> {
        params
            .iter()
            .map(|&param| self.interface_type(param, in_library))
            .collect()
    }

    // ── Encoding types ─────────────────────────────────────────────────

    /// The type the encoder serializes a value of this type as.
    pub fn encoding_type(&mut self, id: TypeId) -> Option<TypeId> {
        if let Some(&result) = self.encoding_memo.get(&id) {
            return result;
        }
        let result = self.compute_encoding_type(id);
        self.encoding_memo.insert(id, result);
        result
    }

    fn compute_encoding_type(&mut self, id: TypeId) -> Option<TypeId> {
        match self.get(id).clone() {
            Type::Integer(_)
            | Type::FixedPoint(_)
            | Type::VarInteger(_)
            | Type::FixedBytes(_)
            | Type::Bool
            | Type::Address
            | Type::Struct { .. }
            | Type::TvmCell
            | Type::TvmSlice
            | Type::TvmBuilder
            | Type::TvmVector(_)
            | Type::Variant
            | Type::ExtraCurrencyCollection => Some(id),
            Type::Enum(_) => Some(self.prims().uint8),
            Type::Contract { is_super, .. } => (!is_super).then(|| self.prims().address),
            Type::UserDefinedValueType(udvt) => {
                let underlying = self.decls().udvt(udvt).underlying;
                self.encoding_type(underlying)
            }
            Type::Array(_) => Some(self.with_location(id, true)),
            Type::Mapping { .. } => Some(self.prims().uint256),
            Type::Optional(inner) => {
                let inner = self.encoding_type(inner)?;
                Some(self.optional(inner))
            }
            Type::Function(function) => {
                let options = function.options;
                if options.gas_set || options.value_set {
                    None
                } else if function.kind == FunctionKind::External {
                    Some(id)
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    /// Mobile type, then interface type, then encoding type. Without the v2
    /// encoder, structs and arrays of dynamic arrays cannot be encoded.
    ///
    /// `encoder_v2` falls back to the context configuration when `None`.
    pub fn full_encoding_type(
        &mut self,
        id: TypeId,
        in_library_call: bool,
        encoder_v2: Option<bool>,
    ) -> Option<TypeId> {
        let encoder_v2 = encoder_v2.unwrap_or(self.config().encoder_v2);
        let mobile = self.mobile_type(id)?;
        let interface = self.interface_type(mobile, in_library_call).ok()?;
        let encoding = self.encoding_type(interface)?;
        if encoder_v2 {
            return Some(encoding);
        }
        let mut base = encoding;
        while let Type::Array(array) = self.get(base) {
            base = array.base;
            if let Type::Array(inner) = self.get(base) {
                if inner.is_dynamically_sized() {
                    return None;
                }
            }
        }
        if matches!(self.get(base), Type::Struct { .. }) {
            return None;
        }
        Some(encoding)
    }

    // ── Calldata sizes ─────────────────────────────────────────────────

    /// Whether the encoded size depends on the value.
    pub fn is_dynamically_encoded(&mut self, id: TypeId) -> bool {
        match self.get(id).clone() {
            Type::Array(array) => {
                array.is_dynamically_sized() || self.is_dynamically_encoded(array.base)
            }
            Type::Struct { id: struct_id, .. } => {
                if self.struct_is_recursive(struct_id) {
                    return true;
                }
                for member in self.struct_member_types(struct_id) {
                    if let Ok(interface) = self.interface_type(member, false) {
                        if self.is_dynamically_encoded(interface) {
                            return true;
                        }
                    }
                }
                false
            }
            _ => false,
        }
    }

    /// Padded size of a statically encoded value.
    pub fn calldata_encoded_size(&mut self, id: TypeId) -> u32 {
        tsol_assert!(
            !self.is_dynamically_encoded(id),
            "Calldata size of a dynamically encoded type requested."
        );
        match self.get(id).clone() {
            Type::Integer(_)
            | Type::FixedPoint(_)
            | Type::VarInteger(_)
            | Type::FixedBytes(_)
            | Type::Bool
            | Type::Address
            | Type::Contract { .. }
            | Type::Enum(_)
            | Type::UserDefinedValueType(_) => WORD_BYTES,
            Type::Function(function) => match function.kind {
                FunctionKind::External | FunctionKind::Internal => {
                    pad_to_word(u64::from(self.storage_bytes(id))) as u32
                }
                _ => 0,
            },
            Type::Array(_) => self.static_array_calldata_size(id, true),
            Type::Struct { id: struct_id, .. } => self
                .struct_member_types(struct_id)
                .into_iter()
                .map(|member| self.calldata_encoded_size(member))
                .sum(),
            _ => 0,
        }
    }

    /// Size of the part of a dynamically encoded value that is always present.
    pub fn calldata_encoded_tail_size(&mut self, id: TypeId) -> u32 {
        tsol_assert!(
            self.is_dynamically_encoded(id),
            "Tail size of a statically encoded type requested."
        );
        match self.get(id).clone() {
            Type::Array(array) if array.is_dynamically_sized() => WORD_BYTES,
            Type::Array(_) => self.static_array_calldata_size(id, false),
            Type::Struct { id: struct_id, .. } => self
                .struct_member_types(struct_id)
                .into_iter()
                .map(|member| self.calldata_head_size(member))
                .sum(),
            _ => tsol_unreachable!("Tail size of {} requested.", self.display(id)),
        }
    }

    /// Size of the head slot: an offset for dynamic values, the value otherwise.
    pub fn calldata_head_size(&mut self, id: TypeId) -> u32 {
        if self.is_dynamically_encoded(id) {
            WORD_BYTES
        } else {
            self.calldata_encoded_size(id)
        }
    }

    fn static_array_calldata_size(&mut self, id: TypeId, padded: bool) -> u32 {
        let Type::Array(array) = self.get(id).clone() else {
            tsol_unreachable!("Array size of a non-array type requested.");
        };
        let Some(length) = array.length.as_ref().and_then(|l| l.to_u64()) else {
            tsol_unreachable!("Array size does not fit unsigned.");
        };
        let stride = if array.is_byte_array_or_string() {
            1
        } else {
            u64::from(self.calldata_head_size(array.base))
        };
        let mut size = length.saturating_mul(stride);
        if padded {
            size = pad_to_word(size);
        }
        tsol_assert!(size <= u64::from(u32::MAX), "Array size does not fit unsigned.");
        size as u32
    }

    /// Head offset of the field `name` inside an encoded struct.
    pub fn calldata_offset_of_member(&mut self, id: TypeId, name: &str) -> u32 {
        let Type::Struct { id: struct_id, .. } = *self.get(id) else {
            tsol_unreachable!("Member offset of a non-struct type requested.");
        };
        let members: Vec<(String, TypeId)> = self
            .decls()
            .struct_def(struct_id)
            .members
            .iter()
            .map(|member| (member.name.clone(), member.ty))
            .collect();
        let mut offset = 0;
        for (member_name, ty) in members {
            if member_name == name {
                return offset;
            }
            offset += self.calldata_head_size(ty);
        }
        tsol_unreachable!("Struct member not found.")
    }

    // ── Struct analysis ────────────────────────────────────────────────

    fn struct_member_types(&self, id: StructId) -> Vec<TypeId> {
        self.decls()
            .struct_def(id)
            .members
            .iter()
            .map(|member| member.ty)
            .collect()
    }

    /// Structs directly reachable from `id` through arrays, optionals and vectors.
    fn referenced_structs(&self, id: TypeId, out: &mut Vec<StructId>) {
        match self.get(id) {
            Type::Struct { id, .. } => out.push(*id),
            Type::Array(array) => self.referenced_structs(array.base, out),
            Type::Optional(inner) | Type::TvmVector(inner) => self.referenced_structs(*inner, out),
            _ => {}
        }
    }

    /// Whether a struct contains itself. A mapping breaks the cycle since
    /// its values are not stored inline.
    pub fn struct_is_recursive(&self, id: StructId) -> bool {
        let mut visited = FxHashSet::default();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let mut next = Vec::new();
            for member in self.struct_member_types(current) {
                self.referenced_structs(member, &mut next);
            }
            for s in next {
                if s == id {
                    return true;
                }
                if visited.insert(s) {
                    stack.push(s);
                }
            }
        }
        false
    }

    /// Whether a type contains a mapping somewhere inside a struct or
    /// array, searching struct members breadth first.
    pub fn contains_nested_mapping(&self, id: TypeId) -> bool {
        let mut visited = FxHashSet::default();
        let mut queue = VecDeque::from([id]);
        while let Some(current) = queue.pop_front() {
            let mut base = current;
            while let Type::Array(array) = self.get(base) {
                base = array.base;
            }
            match self.get(base) {
                Type::Mapping { .. } if base != id => return true,
                Type::Struct { id: struct_id, .. } => {
                    if visited.insert(*struct_id) {
                        queue.extend(self.struct_member_types(*struct_id));
                    }
                }
                _ => {}
            }
        }
        false
    }

    // ── Signatures ─────────────────────────────────────────────────────

    /// The name of an interface type inside an external signature. Structs
    /// are written as tuples of their members unless `structs_by_name`.
    pub fn signature_in_external_function(&mut self, id: TypeId, structs_by_name: bool) -> String {
        match self.get(id).clone() {
            Type::Array(array) if !array.is_byte_array_or_string() => {
                let base = self.signature_in_external_function(array.base, structs_by_name);
                let length = array.length.map(|l| l.to_string()).unwrap_or_default();
                format!("{}[{}]", base, length)
            }
            Type::Struct { id: struct_id, .. } if !structs_by_name => {
                let mut parts = Vec::new();
                for member in self.struct_member_types(struct_id) {
                    let Ok(interface) = self.interface_type(member, false) else {
                        tsol_unreachable!("Parameter should have external type.");
                    };
                    parts.push(self.signature_in_external_function(interface, false));
                }
                format!("({})", parts.join(","))
            }
            _ => self.canonical_name(id),
        }
    }

    fn function_type_of_id(&self, id: TypeId) -> FunctionType {
        match self.get(id) {
            Type::Function(function) => (**function).clone(),
            _ => tsol_unreachable!("Function type expected, got {}.", self.display(id)),
        }
    }

    fn declaration_in_library(&self, decl: DeclRef) -> bool {
        match decl {
            DeclRef::Function(f) => self.decls().is_library_function(f),
            DeclRef::Variable(_) => false,
        }
    }

    /// `name(type1,type2,...)` with canonical parameter names.
    pub fn external_signature(&mut self, function: TypeId) -> String {
        let function = self.function_type_of_id(function);
        let Some(decl) = function.declaration else {
            tsol_unreachable!("External signature of function needs declaration.");
        };
        let name = self.decls().decl_name(decl).to_string();
        tsol_assert!(!name.is_empty(), "Fallback function has no signature.");
        match function.kind {
            FunctionKind::Internal
            | FunctionKind::External
            | FunctionKind::DelegateCall
            | FunctionKind::Event
            | FunctionKind::Error
            | FunctionKind::Declaration => {}
            _ => tsol_unreachable!("Invalid function type for requesting external signature."),
        }
        let in_library = !matches!(function.kind, FunctionKind::Event | FunctionKind::Error)
            && self.declaration_in_library(decl);
        let params = match self.transform_parameters_to_external(&function.params, in_library) {
            Ok(params) => params,
            Err(err) => tsol_unreachable!("{}", err),
        };
        let names: Vec<String> = params
            .into_iter()
            .map(|param| self.signature_in_external_function(param, true))
            .collect();
        format!("{}({})", name, names.join(","))
    }

    /// The function selector: the first four bytes of the SHA-256 hash of
    /// the external signature, big endian.
    pub fn function_id(&mut self, function: TypeId) -> u32 {
        let digest = Sha256::digest(self.external_signature(function).as_bytes());
        u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]])
    }

    pub fn function_id_hex(&mut self, function: TypeId) -> String {
        hex::encode(self.function_id(function).to_be_bytes())
    }

    // ── Function types ─────────────────────────────────────────────────

    /// The type of a declared function, seen as `kind`.
    pub fn function_type_of(&mut self, decl: FunctionDeclId, kind: FunctionKind) -> TypeId {
        tsol_assert!(
            matches!(
                kind,
                FunctionKind::Internal
                    | FunctionKind::External
                    | FunctionKind::Declaration
                    | FunctionKind::Event
                    | FunctionKind::Error
            ),
            "Only internal or external function types or function declaration types can be \
             created from function definitions."
        );
        let def = self.decls().function(decl);
        let function = FunctionType {
            kind,
            params: def.params.iter().map(|p| p.ty).collect(),
            returns: def.returns.iter().map(|p| p.ty).collect(),
            param_names: def.params.iter().map(|p| p.name.clone()).collect(),
            return_names: def.returns.iter().map(|p| p.name.clone()).collect(),
            mutability: def.mutability,
            declaration: Some(DeclRef::Function(decl)),
            options: FunctionOptions::default(),
        };
        self.function(function)
    }

    /// The getter of a public state variable. Mapping keys and array
    /// indices become parameters; a struct value returns its members,
    /// leaving out mappings and arrays other than bytes and string.
    pub fn getter_function_type(&mut self, variable: VariableId) -> TypeId {
        let mut params = Vec::new();
        let mut current = self.decls().variable(variable).ty;
        loop {
            match self.get(current).clone() {
                Type::Mapping { key, value } => {
                    params.push(key);
                    current = value;
                }
                Type::Array(array) if !array.is_byte_array_or_string() => {
                    params.push(self.prims().uint256);
                    current = array.base;
                }
                _ => break,
            }
        }
        let mut returns = Vec::new();
        let mut return_names = Vec::new();
        if let Type::Struct { id: struct_id, .. } = *self.get(current) {
            let members: Vec<(String, TypeId)> = self
                .decls()
                .struct_def(struct_id)
                .members
                .iter()
                .map(|member| (member.name.clone(), member.ty))
                .collect();
            for (name, ty) in members {
                let skip = match self.get(ty) {
                    Type::Mapping { .. } => true,
                    Type::Array(array) => !array.is_byte_array_or_string(),
                    _ => false,
                };
                if !skip {
                    returns.push(self.with_location(ty, true));
                    return_names.push(name);
                }
            }
        } else {
            returns.push(self.with_location(current, true));
            return_names.push(String::new());
        }
        let function = FunctionType {
            kind: FunctionKind::External,
            param_names: vec![String::new(); params.len()],
            params,
            returns,
            return_names,
            mutability: StateMutability::View,
            declaration: Some(DeclRef::Variable(variable)),
            options: FunctionOptions::default(),
        };
        self.function(function)
    }

    /// The same function attached to a value through `using ... for`.
    pub fn as_bound_function(&mut self, function: TypeId) -> TypeId {
        let function = self.function_type_of_id(function);
        tsol_assert!(!function.params.is_empty(), "Bound function needs a self parameter.");
        tsol_assert!(
            !function.options.gas_set && !function.options.value_set && !function.options.salt_set,
            "Cannot bind a function with call options."
        );
        let options = FunctionOptions {
            bound: true,
            ..function.options
        };
        self.function(FunctionType {
            options,
            ..function
        })
    }

    /// The type of a function as called from outside: reference parameters
    /// become pointers, and library functions are called by delegate call.
    pub fn as_externally_callable_function(&mut self, function: TypeId, in_library: bool) -> TypeId {
        let function = self.function_type_of_id(function);
        let params = function
            .params
            .iter()
            .map(|&param| self.with_location(param, true))
            .collect();
        let mut kind = function.kind;
        if in_library {
            let Some(DeclRef::Function(decl)) = function.declaration else {
                tsol_unreachable!("Declaration has to be available.");
            };
            tsol_assert!(
                self.decls().function(decl).is_public(),
                "Library function called externally must be public."
            );
            kind = FunctionKind::DelegateCall;
        }
        self.function(FunctionType {
            kind,
            params,
            ..function
        })
    }

    /// The function with every parameter and return replaced by its
    /// interface type, or `None` if one of them has none.
    pub fn interface_function_type(&mut self, function: TypeId) -> Option<TypeId> {
        let function = self.function_type_of_id(function);
        let Some(decl) = function.declaration else {
            tsol_unreachable!("Declaration needed to determine interface function type.");
        };
        let in_library = !matches!(function.kind, FunctionKind::Event | FunctionKind::Error)
            && self.declaration_in_library(decl);
        let params = self
            .transform_parameters_to_external(&function.params, in_library)
            .ok()?;
        let returns = self
            .transform_parameters_to_external(&function.returns, in_library)
            .ok()?;
        if matches!(decl, DeclRef::Variable(_)) && returns.is_empty() {
            return None;
        }
        tsol_assert!(
            !function.options.arbitrary_parameters,
            "Function with arbitrary parameters has no interface type."
        );
        Some(self.function(FunctionType {
            params,
            returns,
            options: FunctionOptions::default(),
            ..function
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decl::{ContractKind, FunctionDef, Param, ScopeId, Visibility};

    fn source_unit(ctx: &mut TypeCtx) -> ScopeId {
        ScopeId::SourceUnit(ctx.decls_mut().add_source_unit("main.tsol"))
    }

    #[test]
    fn value_types_are_their_own_interface() {
        let mut ctx = TypeCtx::new();
        let p = *ctx.prims();
        assert_eq!(ctx.interface_type(p.uint128, false), Ok(p.uint128));
        assert_eq!(ctx.interface_type(p.cell, false), Ok(p.cell));
        assert_eq!(ctx.encoding_type(p.address), Some(p.address));
    }

    #[test]
    fn enums_and_contracts_in_libraries() {
        let mut ctx = TypeCtx::new();
        let p = *ctx.prims();
        let scope = source_unit(&mut ctx);
        let e = ctx.decls_mut().add_enum("Color", scope, &["Red", "Green"]);
        let color = ctx.enum_type(e);
        assert_eq!(ctx.interface_type(color, false), Ok(p.uint8));
        assert_eq!(ctx.interface_type(color, true), Ok(color));
        assert_eq!(ctx.encoding_type(color), Some(p.uint8));

        let ScopeId::SourceUnit(su) = scope else {
            unreachable!()
        };
        let c = ctx.decls_mut().add_contract("Token", ContractKind::Contract, su);
        let token = ctx.contract(c, false);
        let sup = ctx.contract(c, true);
        assert_eq!(ctx.interface_type(token, false), Ok(p.address));
        assert!(ctx.interface_type(sup, false).is_err());
        assert_eq!(ctx.encoding_type(sup), None);
    }

    #[test]
    fn literals_have_no_interface_type() {
        let mut ctx = TypeCtx::new();
        let literal = ctx.string_literal("abc");
        let err = ctx.interface_type(literal, false).unwrap_err();
        assert_eq!(err.code(), "T0004");
        assert!(err.to_string().contains("not supported in external functions"));
    }

    #[test]
    fn array_interface_is_pointer_with_interface_base() {
        let mut ctx = TypeCtx::new();
        let p = *ctx.prims();
        let scope = source_unit(&mut ctx);
        let e = ctx.decls_mut().add_enum("Color", scope, &["Red"]);
        let color = ctx.enum_type(e);
        let colors = ctx.fixed_array(color, 2);
        let interface = ctx.interface_type(colors, false).unwrap();
        let expected = ctx.fixed_array(p.uint8, 2);
        let expected = ctx.with_location(expected, true);
        assert_eq!(interface, expected);

        let string_interface = ctx.interface_type(p.string, false).unwrap();
        assert!(ctx.is_pointer(string_interface));
        assert_eq!(ctx.canonical_name(string_interface), "string");
    }

    #[test]
    fn structs_with_nested_mappings_need_a_library() {
        let mut ctx = TypeCtx::new();
        let p = *ctx.prims();
        let scope = source_unit(&mut ctx);
        let s = ctx.decls_mut().add_struct("Book", scope);
        let map = ctx.mapping(p.address, p.uint256);
        ctx.decls_mut()
            .set_struct_members(s, vec![("entries".to_string(), map), ("n".to_string(), p.uint8)]);
        let book = ctx.struct_type(s);
        assert!(ctx.contains_nested_mapping(book));
        assert!(ctx.interface_type(book, false).is_err());
        assert!(ctx.interface_type(book, true).is_ok());
        assert!(!ctx.contains_nested_mapping(map));
    }

    #[test]
    fn array_bases_are_never_library_types() {
        let mut ctx = TypeCtx::new();
        let p = *ctx.prims();
        let scope = source_unit(&mut ctx);
        let s = ctx.decls_mut().add_struct("Book", scope);
        let map = ctx.mapping(p.address, p.uint256);
        ctx.decls_mut().set_struct_members(s, vec![("entries".to_string(), map)]);
        let book = ctx.struct_type(s);
        let shelf = ctx.dynamic_array(book);
        assert!(ctx.interface_type(book, true).is_ok());
        let err = ctx.interface_type(shelf, true).unwrap_err();
        assert_eq!(err.code(), "T0004");

        let e = ctx.decls_mut().add_enum("Color", scope, &["Red"]);
        let color = ctx.enum_type(e);
        let colors = ctx.dynamic_array(color);
        let expected = ctx.dynamic_array(p.uint8);
        let expected = ctx.with_location(expected, true);
        assert_eq!(ctx.interface_type(colors, true), Ok(expected));
    }

    #[test]
    fn recursive_structs() {
        let mut ctx = TypeCtx::new();
        let p = *ctx.prims();
        let scope = source_unit(&mut ctx);
        let node = ctx.decls_mut().add_struct("Node", scope);
        let node_ty = ctx.struct_type(node);
        let children = ctx.dynamic_array(node_ty);
        ctx.decls_mut().set_struct_members(
            node,
            vec![("value".to_string(), p.uint32), ("children".to_string(), children)],
        );
        assert!(ctx.struct_is_recursive(node));
        assert!(ctx.is_dynamically_encoded(node_ty));
        assert!(ctx.interface_type(node_ty, false).is_err());

        let tree = ctx.decls_mut().add_struct("Tree", scope);
        let tree_ty = ctx.struct_type(tree);
        let by_key = ctx.mapping(p.uint32, tree_ty);
        ctx.decls_mut()
            .set_struct_members(tree, vec![("nodes".to_string(), by_key)]);
        assert!(!ctx.struct_is_recursive(tree));
    }

    #[test]
    fn calldata_sizes() {
        let mut ctx = TypeCtx::new();
        let p = *ctx.prims();
        let words = ctx.fixed_array(p.uint256, 3);
        assert!(!ctx.is_dynamically_encoded(words));
        assert_eq!(ctx.calldata_encoded_size(words), 96);
        assert_eq!(ctx.calldata_head_size(words), 96);

        let dynamic = ctx.dynamic_array(p.uint8);
        assert!(ctx.is_dynamically_encoded(dynamic));
        assert_eq!(ctx.calldata_encoded_tail_size(dynamic), 32);
        assert_eq!(ctx.calldata_head_size(dynamic), 32);

        let nested = ctx.fixed_array(dynamic, 2);
        assert!(ctx.is_dynamically_encoded(nested));
        assert_eq!(ctx.calldata_encoded_tail_size(nested), 64);
    }

    #[test]
    fn struct_calldata_layout() {
        let mut ctx = TypeCtx::new();
        let p = *ctx.prims();
        let scope = source_unit(&mut ctx);
        let s = ctx.decls_mut().add_struct("Profile", scope);
        let pair = ctx.fixed_array(p.uint64, 2);
        ctx.decls_mut().set_struct_members(
            s,
            vec![
                ("id".to_string(), p.uint32),
                ("keys".to_string(), pair),
                ("name".to_string(), p.string),
                ("active".to_string(), p.bool),
            ],
        );
        let profile = ctx.struct_type(s);
        assert!(ctx.is_dynamically_encoded(profile));
        assert_eq!(ctx.calldata_encoded_tail_size(profile), 32 + 64 + 32 + 32);
        assert_eq!(ctx.calldata_offset_of_member(profile, "name"), 96);
        assert_eq!(ctx.calldata_offset_of_member(profile, "active"), 128);
        assert_eq!(
            ctx.signature_in_external_function(profile, false),
            "(uint32,uint64[2],string,bool)"
        );
        assert_eq!(ctx.signature_in_external_function(profile, true), "Profile");
    }

    #[test]
    fn full_encoding_type_without_v2() {
        let mut ctx = TypeCtx::new();
        let p = *ctx.prims();
        let inner = ctx.dynamic_array(p.uint8);
        let outer = ctx.dynamic_array(inner);
        assert!(ctx.full_encoding_type(outer, false, Some(false)).is_none());
        assert!(ctx.full_encoding_type(outer, false, Some(true)).is_some());
        assert!(ctx.full_encoding_type(outer, false, None).is_some());

        let flat = ctx.fixed_array(p.uint8, 4);
        let expected = ctx.with_location(flat, true);
        assert_eq!(ctx.full_encoding_type(flat, false, Some(false)), Some(expected));

        let literal = ctx.rational_literal("7", crate::rational::Denomination::None).unwrap();
        assert_eq!(ctx.full_encoding_type(literal, false, None), Some(p.uint8));

        let scope = source_unit(&mut ctx);
        let s = ctx.decls_mut().add_struct("Point", scope);
        ctx.decls_mut()
            .set_struct_members(s, vec![("x".to_string(), p.uint8)]);
        let point = ctx.struct_type(s);
        assert!(ctx.full_encoding_type(point, false, Some(false)).is_none());
    }

    #[test]
    fn external_signature_and_function_id() {
        let mut ctx = TypeCtx::new();
        let p = *ctx.prims();
        let su = ctx.decls_mut().add_source_unit("main.tsol");
        let c = ctx.decls_mut().add_contract("Wallet", ContractKind::Contract, su);
        let f = ctx.decls_mut().add_function(
            FunctionDef::new("transfer", ScopeId::Contract(c))
                .visibility(Visibility::Public)
                .params(vec![Param::new("to", p.address), Param::new("value", p.uint128)]),
        );
        let ty = ctx.function_type_of(f, FunctionKind::External);
        assert_eq!(ctx.external_signature(ty), "transfer(address,uint128)");
        assert_eq!(ctx.function_id_hex(ty), "2f5a032e");
        assert_eq!(ctx.function_id(ty), 0x2f5a_032e);
    }

    #[test]
    fn getter_of_mapping_variable() {
        let mut ctx = TypeCtx::new();
        let p = *ctx.prims();
        let su = ctx.decls_mut().add_source_unit("main.tsol");
        let c = ctx.decls_mut().add_contract("Token", ContractKind::Contract, su);
        let map = ctx.mapping(p.address, p.uint128);
        let v = ctx
            .decls_mut()
            .add_state_variable(c, "balances", map, Visibility::Public);
        let getter = ctx.getter_function_type(v);
        let function = ctx.get(getter).as_function().unwrap().clone();
        assert_eq!(function.params, vec![p.address]);
        assert_eq!(function.returns, vec![p.uint128]);
        assert_eq!(function.mutability, StateMutability::View);
        assert_eq!(ctx.external_signature(getter), "balances(address)");
        assert_eq!(ctx.function_id_hex(getter), "b07d5ebb");
    }

    #[test]
    fn getter_of_struct_skips_mappings_and_arrays() {
        let mut ctx = TypeCtx::new();
        let p = *ctx.prims();
        let su = ctx.decls_mut().add_source_unit("main.tsol");
        let c = ctx.decls_mut().add_contract("Registry", ContractKind::Contract, su);
        let s = ctx.decls_mut().add_struct("Entry", ScopeId::Contract(c));
        let map = ctx.mapping(p.uint8, p.bool);
        let list = ctx.dynamic_array(p.uint8);
        ctx.decls_mut().set_struct_members(
            s,
            vec![
                ("owner".to_string(), p.address),
                ("flags".to_string(), map),
                ("items".to_string(), list),
                ("note".to_string(), p.string),
            ],
        );
        let entry = ctx.struct_type(s);
        let entries = ctx.dynamic_array(entry);
        let v = ctx
            .decls_mut()
            .add_state_variable(c, "entries", entries, Visibility::Public);
        let getter = ctx.getter_function_type(v);
        let function = ctx.get(getter).as_function().unwrap().clone();
        assert_eq!(function.params, vec![p.uint256]);
        assert_eq!(function.return_names, vec!["owner", "note"]);
        let note = ctx.with_location(p.string, true);
        assert_eq!(function.returns, vec![p.address, note]);
    }

    #[test]
    fn bound_and_externally_callable_functions() {
        let mut ctx = TypeCtx::new();
        let p = *ctx.prims();
        let su = ctx.decls_mut().add_source_unit("main.tsol");
        let lib = ctx.decls_mut().add_contract("Strings", ContractKind::Library, su);
        let f = ctx.decls_mut().add_function(
            FunctionDef::new("len", ScopeId::Contract(lib))
                .visibility(Visibility::Public)
                .params(vec![Param::new("s", p.string)])
                .returns(vec![Param::unnamed(p.uint32)]),
        );
        let internal = ctx.function_type_of(f, FunctionKind::Internal);
        let bound = ctx.as_bound_function(internal);
        let bound_fn = ctx.get(bound).as_function().unwrap().clone();
        assert!(bound_fn.bound());
        assert_eq!(bound_fn.self_type(), Some(p.string));

        let external = ctx.as_externally_callable_function(internal, true);
        let external_fn = ctx.get(external).as_function().unwrap().clone();
        assert_eq!(external_fn.kind, FunctionKind::DelegateCall);
        assert!(ctx.is_pointer(external_fn.params[0]));

        let interface = ctx.interface_function_type(internal).unwrap();
        let interface_fn = ctx.get(interface).as_function().unwrap().clone();
        assert_eq!(interface_fn.returns, vec![p.uint32]);
    }

    #[test]
    fn internal_function_params_have_no_interface() {
        let mut ctx = TypeCtx::new();
        let p = *ctx.prims();
        let callback = ctx.function(FunctionType::builtin(
            FunctionKind::Internal,
            vec![p.uint8],
            vec![],
            StateMutability::Pure,
        ));
        let scope = source_unit(&mut ctx);
        let f = ctx.decls_mut().add_function(
            FunctionDef::new("run", scope)
                .visibility(Visibility::Public)
                .params(vec![Param::new("cb", callback)]),
        );
        let ty = ctx.function_type_of(f, FunctionKind::External);
        assert_eq!(ctx.interface_function_type(ty), None);
    }
}
