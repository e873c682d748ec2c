//! External boundary of a small token contract: selectors, interface
//! types, contract members and the cell plan of a call.

use tsol_types::decl::{
    ContractId, ContractKind, FunctionDeclId, FunctionDef, Param, ScopeId, StructId, VariableId,
    Visibility,
};
use tsol_types::ty::StateMutability;
use tsol_types::{FunctionKind, TypeCtx, TypeId};

// ── Helpers ────────────────────────────────────────────────────────────

struct Vault {
    contract: ContractId,
    deposit_struct: StructId,
    transfer: FunctionDeclId,
    deposit: FunctionDeclId,
    sweep: FunctionDeclId,
    balances: VariableId,
    total_supply: VariableId,
}

/// ```text
/// contract Vault {
///     struct Deposit { address from; uint32 at; uint64[] notes; }
///     mapping(address => uint128) public balances;
///     uint128 public totalSupply;
///     function transfer(address to, uint128 amount) external;
///     function deposit(Deposit d) public;
///     function sweep(mapping(address => uint128) storage m) internal;
/// }
/// ```
fn vault(ctx: &mut TypeCtx) -> Vault {
    let p = *ctx.prims();
    let su = ctx.decls_mut().add_source_unit("vault.tsol");
    let contract = ctx.decls_mut().add_contract("Vault", ContractKind::Contract, su);
    let scope = ScopeId::Contract(contract);
    let deposit_struct = ctx.decls_mut().add_struct("Deposit", scope);
    let notes = ctx.dynamic_array(p.uint64);
    ctx.decls_mut().set_struct_members(
        deposit_struct,
        vec![
            ("from".to_string(), p.address),
            ("at".to_string(), p.uint32),
            ("notes".to_string(), notes),
        ],
    );
    let deposit_ty = ctx.struct_type(deposit_struct);
    let ledger = ctx.mapping(p.address, p.uint128);

    let balances = ctx
        .decls_mut()
        .add_state_variable(contract, "balances", ledger, Visibility::Public);
    let total_supply = ctx
        .decls_mut()
        .add_state_variable(contract, "totalSupply", p.uint128, Visibility::Public);
    let transfer = ctx.decls_mut().add_function(
        FunctionDef::new("transfer", scope)
            .visibility(Visibility::External)
            .params(vec![Param::new("to", p.address), Param::new("amount", p.uint128)]),
    );
    let deposit = ctx.decls_mut().add_function(
        FunctionDef::new("deposit", scope)
            .visibility(Visibility::Public)
            .mutability(StateMutability::Payable)
            .params(vec![Param::new("d", deposit_ty)]),
    );
    let sweep = ctx
        .decls_mut()
        .add_function(FunctionDef::new("sweep", scope).params(vec![Param::new("m", ledger)]));
    ctx.decls_mut().link_contracts().unwrap();
    Vault {
        contract,
        deposit_struct,
        transfer,
        deposit,
        sweep,
        balances,
        total_supply,
    }
}

fn render_plan(ctx: &mut TypeCtx, params: &[TypeId]) -> String {
    let plan = ctx.plan_function_call(params).unwrap();
    let mut lines: Vec<String> = plan
        .slots
        .iter()
        .map(|slot| format!("{} cell{} {}", slot.path, slot.cell, ctx.display(slot.type_id)))
        .collect();
    lines.push(format!("cells: {}", plan.cells));
    lines.join("\n")
}

// ── Selectors ──────────────────────────────────────────────────────────

#[test]
fn function_selectors() {
    let mut ctx = TypeCtx::new();
    let vault = vault(&mut ctx);

    let transfer = ctx.function_type_of(vault.transfer, FunctionKind::External);
    assert_eq!(ctx.external_signature(transfer), "transfer(address,uint128)");
    assert_eq!(ctx.function_id_hex(transfer), "2f5a032e");

    let deposit = ctx.function_type_of(vault.deposit, FunctionKind::External);
    assert_eq!(ctx.external_signature(deposit), "deposit(Vault.Deposit)");
    assert_eq!(ctx.function_id(deposit), 0xd25e_5ca2);

    let balances = ctx.getter_function_type(vault.balances);
    assert_eq!(ctx.external_signature(balances), "balances(address)");
    assert_eq!(ctx.function_id_hex(balances), "b07d5ebb");

    let total_supply = ctx.getter_function_type(vault.total_supply);
    assert_eq!(ctx.function_id_hex(total_supply), "a368022e");
}

#[test]
fn struct_signature_expands_members() {
    let mut ctx = TypeCtx::new();
    let vault = vault(&mut ctx);
    let deposit_ty = ctx.struct_type(vault.deposit_struct);
    let pointer = ctx.with_location(deposit_ty, true);
    assert_eq!(
        ctx.signature_in_external_function(pointer, false),
        "(address,uint32,uint64[])"
    );
    assert_eq!(ctx.signature_in_external_function(pointer, true), "Vault.Deposit");
}

// ── Interface types ────────────────────────────────────────────────────

#[test]
fn interface_types_of_functions() {
    let mut ctx = TypeCtx::new();
    let vault = vault(&mut ctx);
    let sweep = ctx.function_type_of(vault.sweep, FunctionKind::Internal);
    let internal_fn = ctx.function_type_of(vault.transfer, FunctionKind::Internal);
    assert!(ctx.interface_type(internal_fn, false).is_err());
    assert!(ctx.interface_function_type(sweep).is_some());

    let deposit = ctx.function_type_of(vault.deposit, FunctionKind::External);
    let interface = ctx.interface_function_type(deposit).unwrap();
    let params = ctx.get(interface).as_function().unwrap().params.clone();
    assert!(ctx.is_pointer(params[0]));
}

#[test]
fn contract_members_are_its_external_interface() {
    let mut ctx = TypeCtx::new();
    let vault = vault(&mut ctx);
    let vault_ty = ctx.contract(vault.contract, false);
    let members = ctx.members(vault_ty, None);
    assert_eq!(members.names(), ["transfer", "deposit", "balances", "totalSupply"]);
    let deposit = members.member_type("deposit").unwrap();
    let deposit = ctx.get(deposit).as_function().unwrap();
    assert_eq!(deposit.kind, FunctionKind::External);
    assert_eq!(deposit.mutability, StateMutability::Payable);
    assert!(ctx.is_pointer(deposit.params[0]));
}

#[test]
fn contract_type_members_depend_on_scope() {
    let mut ctx = TypeCtx::new();
    let vault = vault(&mut ctx);
    let vault_ty = ctx.contract(vault.contract, false);
    let type_of_vault = ctx.type_type(vault_ty);

    let outside = ctx.members(type_of_vault, None);
    assert_eq!(outside.names(), ["Deposit", "transfer", "deposit"]);
    let transfer = outside.member_type("transfer").unwrap();
    assert_eq!(
        ctx.get(transfer).as_function().unwrap().kind,
        FunctionKind::Declaration
    );

    let inside = ctx.members(type_of_vault, Some(ScopeId::Contract(vault.contract)));
    assert_eq!(
        inside.names(),
        ["Deposit", "transfer", "deposit", "sweep", "balances", "totalSupply"]
    );
    let sweep = inside.member_type("sweep").unwrap();
    assert_eq!(ctx.get(sweep).as_function().unwrap().kind, FunctionKind::Internal);
}

// ── Cell encoding ──────────────────────────────────────────────────────

#[test]
fn call_parameters_spill_into_a_second_cell() {
    let mut ctx = TypeCtx::new();
    let p = *ctx.prims();
    let params = [
        p.address, p.uint128, p.bool, p.cell, p.address, p.uint256, p.uint256,
    ];
    insta::assert_snapshot!(render_plan(&mut ctx, &params), @r"
    0 cell0 address
    1 cell0 uint128
    2 cell0 bool
    3 cell0 TvmCell
    4 cell0 address
    5 cell1 uint256
    6 cell1 uint256
    cells: 2
    ");
}

#[test]
fn struct_parameters_are_flattened() {
    let mut ctx = TypeCtx::new();
    let vault = vault(&mut ctx);
    let p = *ctx.prims();
    let deposit_ty = ctx.struct_type(vault.deposit_struct);
    insta::assert_snapshot!(render_plan(&mut ctx, &[p.uint8, deposit_ty]), @r"
    0 cell0 uint8
    1.from cell0 address
    1.at cell0 uint32
    1.notes cell0 uint64[]
    cells: 1
    ");
}
