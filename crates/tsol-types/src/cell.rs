//! Cell footprint of encoded values.
//!
//! Values passed in messages are written into cells of at most 1023 bits
//! and 4 references. The encoder fills one builder until the next value no
//! longer fits, then continues in a fresh cell chained by reference. This
//! module computes the per-type footprint and where each parameter lands.

use serde::Serialize;

use crate::ctx::TypeCtx;
use crate::error::TypeError;
use crate::ty::{Type, TypeId};

/// Data bits in one cell.
pub const CELL_BIT_LENGTH: u32 = 1023;
/// References in one cell.
pub const CELL_REF_LIMIT: u32 = 4;
/// Key width of the dictionary backing an array.
pub const ARRAY_KEY_LENGTH: u32 = 32;
/// Key width of the persistent data dictionary.
pub const DATA_KEY_LENGTH: u32 = 64;
/// Width of the function id header of a call.
pub const FUNCTION_ID_BITS: u32 = 32;

/// `addr_var` without anycast and a 32-bit workchain id.
pub const ADDRESS_MIN_BITS: u32 = 2 + 1 + 9 + 32 + 1;
/// `addr_std` with the longest anycast prefix.
pub const ADDRESS_MAX_BITS: u32 = 2 + 1 + 2 * 30 + 8 + 256;

/// Bits needed to store the index of one of `count` enum values, in whole bytes.
pub fn bits_for_enum(count: usize) -> u32 {
    let mut rest = count.saturating_sub(1);
    let mut bytes = 0;
    loop {
        rest >>= 8;
        bytes += 1;
        if rest == 0 {
            break;
        }
    }
    8 * bytes
}

/// Space a value takes in a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AbiTypeSize {
    pub min_bits: u32,
    pub max_bits: u32,
    pub refs: u32,
}

impl AbiTypeSize {
    fn bits(bits: u32) -> Self {
        Self {
            min_bits: bits,
            max_bits: bits,
            refs: 0,
        }
    }

    fn reference(bits: u32) -> Self {
        Self {
            min_bits: bits,
            max_bits: bits,
            refs: 1,
        }
    }
}

/// Tracks the free space of the builder being filled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodePosition {
    rest_bits: i64,
    rest_refs: i64,
    created_builders: u32,
}

impl EncodePosition {
    /// A position after a header of `header_bits`. One reference of the
    /// first cell is kept for the chain.
    pub fn new(header_bits: u32) -> Self {
        Self {
            rest_bits: i64::from(CELL_BIT_LENGTH) - i64::from(header_bits),
            rest_refs: i64::from(CELL_REF_LIMIT) - 1,
            created_builders: 0,
        }
    }

    /// Account for a value of `size`; returns whether it starts a new cell.
    pub fn need_new_cell(&mut self, size: &AbiTypeSize) -> bool {
        self.rest_bits -= i64::from(size.max_bits);
        self.rest_refs -= i64::from(size.refs);
        if self.rest_bits < 0 || self.rest_refs == 0 {
            self.rest_bits = i64::from(CELL_BIT_LENGTH) - i64::from(size.max_bits);
            self.rest_refs = i64::from(CELL_REF_LIMIT) - i64::from(size.refs);
            self.created_builders += 1;
            return true;
        }
        false
    }

    /// Number of cells opened after the first one.
    pub fn created_builders(&self) -> u32 {
        self.created_builders
    }
}

/// One encoded value and the cell it is written to; cell 0 holds the header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CellSlot {
    /// Dotted path: parameter index, then struct member names.
    pub path: String,
    pub type_id: TypeId,
    pub cell: u32,
}

/// Result of splitting a parameter list over chained cells.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CellPlan {
    pub slots: Vec<CellSlot>,
    pub cells: u32,
}

impl TypeCtx {
    /// Width and signedness of types stored as plain integers in a cell.
    pub fn integral_bits(&self, id: TypeId) -> Option<(u32, bool)> {
        match self.get(id) {
            Type::Integer(int) => Some((u32::from(int.bits), int.signed)),
            Type::Bool => Some((1, true)),
            Type::FixedBytes(n) => Some((8 * u32::from(*n), false)),
            Type::Enum(e) => Some((bits_for_enum(self.decls().enum_def(*e).values.len()), false)),
            Type::UserDefinedValueType(udvt) => self.integral_bits(self.decls().udvt(*udvt).underlying),
            _ => None,
        }
    }

    pub fn abi_type_size(&self, id: TypeId) -> Result<AbiTypeSize, TypeError> {
        if let Some((bits, _)) = self.integral_bits(id) {
            return Ok(AbiTypeSize::bits(bits));
        }
        match self.get(id) {
            Type::Address | Type::Contract { .. } => Ok(AbiTypeSize {
                min_bits: ADDRESS_MIN_BITS,
                max_bits: ADDRESS_MAX_BITS,
                refs: 0,
            }),
            Type::VarInteger(var) => Ok(AbiTypeSize {
                min_bits: var.max_bit_size_in_cell() - (u32::from(var.n) - 1) * 8,
                max_bits: var.max_bit_size_in_cell(),
                refs: 0,
            }),
            Type::Array(array) if array.is_byte_array_or_string() => Ok(AbiTypeSize::reference(0)),
            Type::Array(_) => Ok(AbiTypeSize::reference(ARRAY_KEY_LENGTH)),
            Type::TvmCell => Ok(AbiTypeSize::reference(0)),
            Type::UserDefinedValueType(udvt) => self.abi_type_size(self.decls().udvt(*udvt).underlying),
            _ => Err(TypeError::encoding(format!(
                "Unsupported type {} in cell encoding.",
                self.display(id)
            ))),
        }
    }

    /// Key width of a dictionary keyed by `key`.
    pub fn dict_key_length(&self, key: TypeId) -> Result<u32, TypeError> {
        if let Some((bits, _)) = self.integral_bits(key) {
            return Ok(bits);
        }
        match self.get(key) {
            Type::StringLiteral(_) => Ok(256),
            Type::Array(array) if array.is_byte_array_or_string() => Ok(256),
            Type::Address | Type::Contract { .. } => Ok(ADDRESS_MAX_BITS),
            _ => Err(TypeError::encoding(format!(
                "Type {} can not be used as a dictionary key.",
                self.display(key)
            ))),
        }
    }

    /// Split the parameters of a call over chained cells, after the 32-bit
    /// function id.
    pub fn plan_function_call(&self, params: &[TypeId]) -> Result<CellPlan, TypeError> {
        self.plan_cell_encoding(params, FUNCTION_ID_BITS)
    }

    /// Split `params` over chained cells, starting after `header_bits`.
    /// Struct parameters are flattened member by member.
    pub fn plan_cell_encoding(&self, params: &[TypeId], header_bits: u32) -> Result<CellPlan, TypeError> {
        let mut position = EncodePosition::new(header_bits);
        let mut slots = Vec::new();
        for (index, &param) in params.iter().enumerate() {
            self.plan_value(param, index.to_string(), &mut position, &mut slots)?;
        }
        tracing::trace!(
            params = params.len(),
            cells = position.created_builders() + 1,
            "planned cell encoding"
        );
        Ok(CellPlan {
            slots,
            cells: position.created_builders() + 1,
        })
    }

    fn plan_value(
        &self,
        id: TypeId,
        path: String,
        position: &mut EncodePosition,
        slots: &mut Vec<CellSlot>,
    ) -> Result<(), TypeError> {
        if let Type::Struct { id: struct_id, .. } = self.get(id) {
            for member in &self.decls().struct_def(*struct_id).members {
                self.plan_value(member.ty, format!("{}.{}", path, member.name), position, slots)?;
            }
            return Ok(());
        }
        let size = self.abi_type_size(id)?;
        position.need_new_cell(&size);
        slots.push(CellSlot {
            path,
            type_id: id,
            cell: position.created_builders(),
        });
        Ok(())
    }
}
