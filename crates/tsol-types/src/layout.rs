//! Storage layout: per-type footprints and slot packing.
//!
//! Storage is a sequence of 32-byte slots. Small values share a slot in
//! declaration order, and anything that does not fit in the remainder of
//! the current slot starts a new one. Values spanning more than one slot
//! always start at offset zero and leave the next value a fresh slot.

use std::collections::BTreeMap;

use num_bigint::BigUint;
use num_traits::{One, Zero};
use serde::{Serialize, Serializer};
use tsol_common::{tsol_assert, tsol_unreachable};

use crate::ctx::TypeCtx;
use crate::decl::ContractId;
use crate::ty::{FunctionKind, Type, TypeId};

/// Bytes in one storage slot.
pub const SLOT_BYTES: u32 = 32;

fn serialize_decimal<S: Serializer>(value: &BigUint, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&value.to_string())
}

fn slot_limit() -> BigUint {
    BigUint::one() << 256usize
}

/// Position of one value in storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StorageOffset {
    #[serde(serialize_with = "serialize_decimal")]
    pub slot: BigUint,
    /// Byte offset inside the slot, counted from the low-order end.
    pub offset: u32,
}

impl StorageOffset {
    pub fn new(slot: impl Into<BigUint>, offset: u32) -> Self {
        Self {
            slot: slot.into(),
            offset,
        }
    }
}

/// Slot assignment for an ordered list of types.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StorageOffsets {
    offsets: BTreeMap<usize, StorageOffset>,
    #[serde(serialize_with = "serialize_decimal")]
    storage_size: BigUint,
}

impl StorageOffsets {
    /// Pack `types` into slots. Types that cannot be stored get no offset.
    pub fn compute(ctx: &mut TypeCtx, types: &[TypeId]) -> Self {
        let mut slot = BigUint::zero();
        let mut byte_offset: u32 = 0;
        let mut offsets = BTreeMap::new();
        for (index, &ty) in types.iter().enumerate() {
            if !ctx.can_be_stored(ty) {
                continue;
            }
            let bytes = ctx.storage_bytes(ty);
            if byte_offset + bytes > SLOT_BYTES {
                slot += 1u32;
                byte_offset = 0;
            }
            tsol_assert!(slot < slot_limit(), "Object too large for storage.");
            offsets.insert(index, StorageOffset::new(slot.clone(), byte_offset));
            let size = ctx.storage_size(ty);
            tsol_assert!(size >= BigUint::one(), "Invalid storage size.");
            if size.is_one() && byte_offset + bytes <= SLOT_BYTES {
                byte_offset += bytes;
            } else {
                slot += size;
                byte_offset = 0;
            }
        }
        if byte_offset > 0 {
            slot += 1u32;
        }
        tsol_assert!(slot < slot_limit(), "Object too large for storage.");
        tracing::debug!(fields = types.len(), slots = %slot, "computed storage offsets");
        Self {
            offsets,
            storage_size: slot,
        }
    }

    /// Offset of the type at `index`, if it is stored.
    pub fn offset(&self, index: usize) -> Option<&StorageOffset> {
        self.offsets.get(&index)
    }

    /// Number of slots used, counting a partially filled last slot.
    pub fn storage_size(&self) -> &BigUint {
        &self.storage_size
    }

    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }
}

/// One named value in a storage layout report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StorageLayoutEntry {
    pub name: String,
    #[serde(serialize_with = "serialize_decimal")]
    pub slot: BigUint,
    pub offset: u32,
    pub type_id: TypeId,
}

impl TypeCtx {
    /// Whether a value of this type can live in storage.
    pub fn can_be_stored(&self, id: TypeId) -> bool {
        match self.get(id) {
            Type::Function(function) => function.is_value_kind(),
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
            | Type::InaccessibleDynamic => false,
            _ => true,
        }
    }

    /// Bytes a value occupies inside a slot. Never more than one slot.
    pub fn storage_bytes(&self, id: TypeId) -> u32 {
        match self.get(id) {
            Type::Integer(int) => u32::from(int.bits).div_ceil(8).min(SLOT_BYTES),
            Type::FixedPoint(fixed) => u32::from(fixed.total_bits) / 8,
            Type::VarInteger(var) => u32::from(var.n),
            Type::FixedBytes(n) => u32::from(*n),
            Type::Bool | Type::Enum(_) => 1,
            Type::UserDefinedValueType(udvt) => self.storage_bytes(self.decls().udvt(*udvt).underlying),
            Type::Function(function) => match function.kind {
                FunctionKind::External => 24,
                FunctionKind::Internal => 8,
                _ => tsol_unreachable!("Storage size of non-storable function type requested."),
            },
            _ => SLOT_BYTES,
        }
    }

    /// Number of slots a value occupies.
    pub fn storage_size(&mut self, id: TypeId) -> BigUint {
        match self.get(id).clone() {
            Type::Array(array) => {
                let Some(length) = array.length else {
                    return BigUint::one();
                };
                let base_bytes = self.storage_bytes(array.base);
                let size = if base_bytes == 0 {
                    BigUint::one()
                } else if base_bytes < SLOT_BYTES {
                    let per_slot = SLOT_BYTES / base_bytes;
                    (length + (per_slot - 1)) / per_slot
                } else {
                    length * self.storage_size(array.base)
                };
                tsol_assert!(size < slot_limit(), "Array too large for storage.");
                size.max(BigUint::one())
            }
            Type::Struct { .. } => {
                let members = self.members(id, None);
                members.storage_size(self).clone().max(BigUint::one())
            }
            Type::Function(function) if !function.is_value_kind() => {
                tsol_unreachable!("Storage size of non-storable function type requested.")
            }
            Type::Tuple(_) | Type::TypeType(_) | Type::Modifier(_) => {
                tsol_unreachable!("Storage size of non-storable type requested.")
            }
            _ => BigUint::one(),
        }
    }

    /// Storage position of the field `name` of a struct type.
    pub fn storage_offsets_of_member(&mut self, id: TypeId, name: &str) -> StorageOffset {
        let members = self.members(id, None);
        match members.member_storage_offset(self, name) {
            Some(offset) => offset.clone(),
            None => tsol_unreachable!("Storage offset of non-existing member requested."),
        }
    }

    /// Layout report of a struct type, one entry per stored field.
    pub fn storage_layout(&mut self, id: TypeId) -> Vec<StorageLayoutEntry> {
        let Type::Struct { id: struct_id, .. } = *self.get(id) else {
            tsol_unreachable!("Storage layout of a non-struct type requested.");
        };
        let fields: Vec<(String, TypeId)> = self
            .decls()
            .struct_def(struct_id)
            .members
            .iter()
            .map(|member| (member.name.clone(), member.ty))
            .collect();
        self.layout_entries(fields)
    }

    /// Layout of a contract's state variables, most basic contract first.
    pub fn contract_storage_layout(&mut self, contract: ContractId) -> Vec<StorageLayoutEntry> {
        let decls = self.decls();
        let variables: Vec<(String, TypeId)> = decls
            .contract(contract)
            .linearized_bases
            .iter()
            .rev()
            .flat_map(|&base| decls.contract(base).state_variables.iter())
            .map(|&var| {
                let def = decls.variable(var);
                (def.name.clone(), def.ty)
            })
            .collect();
        self.layout_entries(variables)
    }

    fn layout_entries(&mut self, fields: Vec<(String, TypeId)>) -> Vec<StorageLayoutEntry> {
        let types: Vec<TypeId> = fields.iter().map(|(_, ty)| *ty).collect();
        let offsets = StorageOffsets::compute(self, &types);
        fields
            .into_iter()
            .enumerate()
            .filter_map(|(index, (name, type_id))| {
                offsets.offset(index).map(|offset| StorageLayoutEntry {
                    name,
                    slot: offset.slot.clone(),
                    offset: offset.offset,
                    type_id,
                })
            })
            .collect()
    }
}
