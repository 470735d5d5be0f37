use std::collections::{HashMap, HashSet};

use nftledger_core::{Address, Aggregate, LedgerError, LedgerResult, TokenId};

use crate::command::{Approve, LedgerCommand, Mint, SafeTransferFrom, SetApprovalForAll, TransferFrom};
use crate::event::{Approval, ApprovalForAll, LedgerEvent, Transfer};
use crate::recipient::{RecipientCheck, RecipientOracle};

/// Aggregate root: TokenLedger.
///
/// Owns token identity, ownership, balances and approvals. Token ids are
/// dense (0..next_token_id), so per-token tables are vectors indexed by id.
/// Zero balances are not stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenLedger {
    admin: Address,
    owners: Vec<Address>,
    approvals: Vec<Option<Address>>,
    balances: HashMap<Address, u64>,
    operators: HashSet<(Address, Address)>,
    version: u64,
}

impl TokenLedger {
    /// A fresh ledger with no tokens. `admin` is fixed for the ledger's lifetime.
    pub fn new(admin: Address) -> Self {
        Self {
            admin,
            owners: Vec::new(),
            approvals: Vec::new(),
            balances: HashMap::new(),
            operators: HashSet::new(),
            version: 0,
        }
    }

    /// Rebuild a ledger by applying a recorded event sequence in order.
    pub fn rehydrate<'a>(admin: Address, events: impl IntoIterator<Item = &'a LedgerEvent>) -> Self {
        let mut ledger = Self::new(admin);
        for event in events {
            ledger.apply(event);
        }
        ledger
    }

    pub fn admin(&self) -> Address {
        self.admin
    }

    /// Id the next successful mint will assign.
    pub fn next_token_id(&self) -> TokenId {
        TokenId::new(self.owners.len() as u64)
    }

    /// Tokens minted so far. Tokens are never destroyed, so this is also the supply.
    pub fn total_minted(&self) -> u64 {
        self.owners.len() as u64
    }

    pub fn exists(&self, token_id: TokenId) -> bool {
        self.slot(token_id).is_some()
    }

    pub fn balance_of(&self, owner: Address) -> u64 {
        self.balances.get(&owner).copied().unwrap_or(0)
    }

    pub fn owner_of(&self, token_id: TokenId) -> LedgerResult<Address> {
        let idx = self.slot(token_id).ok_or(LedgerError::nonexistent(token_id))?;
        Ok(self.owners[idx])
    }

    pub fn get_approved(&self, token_id: TokenId) -> LedgerResult<Option<Address>> {
        let idx = self.slot(token_id).ok_or(LedgerError::nonexistent(token_id))?;
        Ok(self.approvals[idx])
    }

    pub fn is_approved_for_all(&self, owner: Address, operator: Address) -> bool {
        self.operators.contains(&(owner, operator))
    }

    /// Addresses with a non-zero balance and their balances, in no particular order.
    pub fn holders(&self) -> impl Iterator<Item = (Address, u64)> + '_ {
        self.balances.iter().map(|(a, b)| (*a, *b))
    }

    fn slot(&self, token_id: TokenId) -> Option<usize> {
        token_id.index().filter(|idx| *idx < self.owners.len())
    }

    fn credit(&mut self, owner: Address) {
        *self.balances.entry(owner).or_insert(0) += 1;
    }

    fn debit(&mut self, owner: Address) {
        if let Some(balance) = self.balances.get_mut(&owner) {
            *balance = balance.saturating_sub(1);
            if *balance == 0 {
                self.balances.remove(&owner);
            }
        }
    }
}

impl Aggregate for TokenLedger {
    type Command = LedgerCommand;
    type Event = LedgerEvent;
    type Error = LedgerError;
    type Env = dyn RecipientOracle;

    fn version(&self) -> u64 {
        self.version
    }

    fn apply(&mut self, event: &Self::Event) {
        match event {
            LedgerEvent::Transfer(e) => {
                let len = self.owners.len();
                match e.token_id.index() {
                    Some(idx) if idx == len => {
                        self.owners.push(e.to);
                        self.approvals.push(None);
                        self.credit(e.to);
                    }
                    Some(idx) if idx < len => {
                        let previous = core::mem::replace(&mut self.owners[idx], e.to);
                        self.approvals[idx] = None;
                        self.debit(previous);
                        self.credit(e.to);
                    }
                    // Not decided by this ledger (would leave a gap in ids).
                    _ => {}
                }
            }
            LedgerEvent::Approval(e) => {
                if let Some(idx) = self.slot(e.token_id) {
                    self.approvals[idx] = (!e.approved.is_zero()).then_some(e.approved);
                }
            }
            LedgerEvent::ApprovalForAll(e) => {
                if e.approved {
                    self.operators.insert((e.owner, e.operator));
                } else {
                    self.operators.remove(&(e.owner, e.operator));
                }
            }
        }

        // Deterministic version tracking: +1 per applied event.
        self.version += 1;
    }

    fn handle(
        &self,
        command: &Self::Command,
        oracle: &Self::Env,
    ) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            LedgerCommand::Mint(cmd) => self.handle_mint(cmd),
            LedgerCommand::TransferFrom(cmd) => self.handle_transfer(cmd),
            LedgerCommand::SafeTransferFrom(cmd) => self.handle_safe_transfer(cmd, oracle),
            LedgerCommand::Approve(cmd) => self.handle_approve(cmd),
            LedgerCommand::SetApprovalForAll(cmd) => Ok(self.handle_set_approval_for_all(cmd)),
        }
    }
}

impl TokenLedger {
    /// Checks, in order: the token exists, `from` owns it, and `caller` is
    /// `from`, the token's approved address, or an operator for `from`.
    fn ensure_can_transfer(&self, caller: Address, from: Address, token_id: TokenId) -> LedgerResult<()> {
        let owner = self.owner_of(token_id)?;
        if owner != from {
            return Err(LedgerError::transfer_not_authorized());
        }

        let approved = self.get_approved(token_id)? == Some(caller);
        if caller == from || approved || self.is_approved_for_all(from, caller) {
            Ok(())
        } else {
            Err(LedgerError::transfer_not_authorized())
        }
    }

    fn handle_mint(&self, cmd: &Mint) -> LedgerResult<Vec<LedgerEvent>> {
        if cmd.caller != self.admin {
            return Err(LedgerError::unauthorized("only admin"));
        }

        Ok(vec![LedgerEvent::Transfer(Transfer {
            from: Address::ZERO,
            to: self.admin,
            token_id: self.next_token_id(),
        })])
    }

    fn handle_transfer(&self, cmd: &TransferFrom) -> LedgerResult<Vec<LedgerEvent>> {
        self.ensure_can_transfer(cmd.caller, cmd.from, cmd.token_id)?;

        Ok(vec![LedgerEvent::Transfer(Transfer {
            from: cmd.from,
            to: cmd.to,
            token_id: cmd.token_id,
        })])
    }

    fn handle_safe_transfer(
        &self,
        cmd: &SafeTransferFrom,
        oracle: &dyn RecipientOracle,
    ) -> LedgerResult<Vec<LedgerEvent>> {
        self.ensure_can_transfer(cmd.caller, cmd.from, cmd.token_id)?;

        // Decided before anything is applied, so a refusal leaves no trace.
        match oracle.check(cmd.caller, cmd.from, cmd.to, cmd.token_id, &cmd.data) {
            RecipientCheck::NotAContract | RecipientCheck::Accepted => {}
            RecipientCheck::Rejected => {
                return Err(LedgerError::recipient_rejected(
                    "transfer to non ERC721Receiver implementer",
                ));
            }
        }

        Ok(vec![LedgerEvent::Transfer(Transfer {
            from: cmd.from,
            to: cmd.to,
            token_id: cmd.token_id,
        })])
    }

    fn handle_approve(&self, cmd: &Approve) -> LedgerResult<Vec<LedgerEvent>> {
        let owner = self.owner_of(cmd.token_id)?;
        if cmd.caller != owner && !self.is_approved_for_all(owner, cmd.caller) {
            return Err(LedgerError::unauthorized(
                "caller is not owner nor approved for all",
            ));
        }

        Ok(vec![LedgerEvent::Approval(Approval {
            owner,
            approved: cmd.approved,
            token_id: cmd.token_id,
        })])
    }

    fn handle_set_approval_for_all(&self, cmd: &SetApprovalForAll) -> Vec<LedgerEvent> {
        vec![LedgerEvent::ApprovalForAll(ApprovalForAll {
            owner: cmd.caller,
            operator: cmd.operator,
            approved: cmd.approved,
        })]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recipient::{ContractRegistry, NoContracts};
    use nftledger_events::execute;
    use proptest::prelude::*;

    fn admin() -> Address {
        Address::repeat_byte(0xad)
    }

    fn trader1() -> Address {
        Address::repeat_byte(0x01)
    }

    fn trader2() -> Address {
        Address::repeat_byte(0x02)
    }

    fn id(n: u64) -> TokenId {
        TokenId::new(n)
    }

    fn run(ledger: &mut TokenLedger, cmd: LedgerCommand) -> LedgerResult<Vec<LedgerEvent>> {
        let oracle: &dyn RecipientOracle = &NoContracts;
        execute(ledger, &cmd, oracle)
    }

    /// Ledger with tokens 0, 1, 2 minted to the admin.
    fn ledger_with_three_tokens() -> TokenLedger {
        let mut ledger = TokenLedger::new(admin());
        for _ in 0..3 {
            run(&mut ledger, LedgerCommand::mint(admin())).unwrap();
        }
        ledger
    }

    #[test]
    fn fresh_ledger_is_empty() {
        let ledger = TokenLedger::new(admin());
        assert_eq!(ledger.admin(), admin());
        assert_eq!(ledger.next_token_id(), id(0));
        assert_eq!(ledger.total_minted(), 0);
        assert_eq!(ledger.balance_of(admin()), 0);
        assert_eq!(ledger.version(), 0);
    }

    #[test]
    fn mint_by_non_admin_is_rejected() {
        let mut ledger = ledger_with_three_tokens();
        let before = ledger.clone();

        let err = run(&mut ledger, LedgerCommand::mint(Address::repeat_byte(0x04))).unwrap_err();
        assert_eq!(err, LedgerError::unauthorized("only admin"));
        assert_eq!(err.reason(), "only admin");
        assert_eq!(ledger, before);
    }

    #[test]
    fn mint_by_admin_emits_transfer_from_zero() {
        let mut ledger = ledger_with_three_tokens();

        let events = run(&mut ledger, LedgerCommand::mint(admin())).unwrap();
        assert_eq!(events, vec![LedgerEvent::transfer(Address::ZERO, admin(), id(3))]);
        assert_eq!(ledger.balance_of(admin()), 4);
        assert_eq!(ledger.total_minted(), 4);
        assert_eq!(ledger.owner_of(id(3)).unwrap(), admin());
        assert_eq!(ledger.get_approved(id(3)).unwrap(), None);
    }

    #[test]
    fn reads_on_unminted_token_fail() {
        let ledger = ledger_with_three_tokens();
        assert_eq!(ledger.owner_of(id(3)), Err(LedgerError::NonexistentToken(id(3))));
        assert_eq!(ledger.get_approved(id(99)), Err(LedgerError::NonexistentToken(id(99))));
        assert!(!ledger.exists(id(3)));
        assert!(ledger.exists(id(2)));
    }

    #[test]
    fn transfer_moves_token_and_balances() {
        let mut ledger = ledger_with_three_tokens();

        let events = run(
            &mut ledger,
            LedgerCommand::transfer_from(admin(), admin(), trader1(), id(1)),
        )
        .unwrap();

        assert_eq!(events, vec![LedgerEvent::transfer(admin(), trader1(), id(1))]);
        assert_eq!(ledger.owner_of(id(1)).unwrap(), trader1());
        assert_eq!(ledger.balance_of(trader1()), 1);
        assert_eq!(ledger.balance_of(admin()), 2);
    }

    #[test]
    fn transfer_of_unminted_token_fails_with_nonexistent() {
        let mut ledger = ledger_with_three_tokens();
        let err = run(
            &mut ledger,
            LedgerCommand::transfer_from(admin(), admin(), trader1(), id(7)),
        )
        .unwrap_err();
        assert_eq!(err, LedgerError::NonexistentToken(id(7)));
    }

    #[test]
    fn third_party_cannot_move_someone_elses_token() {
        let mut ledger = ledger_with_three_tokens();
        run(&mut ledger, LedgerCommand::transfer_from(admin(), admin(), trader1(), id(1))).unwrap();
        let before = ledger.clone();

        let err = run(
            &mut ledger,
            LedgerCommand::transfer_from(trader2(), trader1(), trader2(), id(1)),
        )
        .unwrap_err();

        assert_eq!(err, LedgerError::transfer_not_authorized());
        assert_eq!(err.reason(), "Transfer not authorized");
        assert_eq!(ledger.balance_of(trader1()), 1);
        assert_eq!(ledger.balance_of(trader2()), 0);
        assert_eq!(ledger, before);
    }

    #[test]
    fn previous_owner_cannot_move_token_again() {
        let mut ledger = ledger_with_three_tokens();
        run(&mut ledger, LedgerCommand::transfer_from(admin(), admin(), trader1(), id(1))).unwrap();

        // admin's balance of token 1 is now 0
        let err = run(
            &mut ledger,
            LedgerCommand::transfer_from(admin(), trader1(), trader2(), id(1)),
        )
        .unwrap_err();
        assert_eq!(err, LedgerError::transfer_not_authorized());
    }

    #[test]
    fn mismatched_from_is_rejected_even_when_caller_owns_it() {
        let mut ledger = ledger_with_three_tokens();
        run(&mut ledger, LedgerCommand::transfer_from(admin(), admin(), trader1(), id(1))).unwrap();
        let before = ledger.clone();

        let err = run(
            &mut ledger,
            LedgerCommand::transfer_from(trader1(), trader2(), trader1(), id(1)),
        )
        .unwrap_err();
        assert_eq!(err, LedgerError::transfer_not_authorized());
        assert_eq!(ledger, before);
    }

    #[test]
    fn approved_address_can_transfer_once_and_approval_resets() {
        let mut ledger = ledger_with_three_tokens();

        let approval = run(&mut ledger, LedgerCommand::approve(admin(), trader1(), id(0))).unwrap();
        assert_eq!(ledger.get_approved(id(0)).unwrap(), Some(trader1()));

        let transfer = run(
            &mut ledger,
            LedgerCommand::transfer_from(trader1(), admin(), trader1(), id(0)),
        )
        .unwrap();

        assert_eq!(
            [approval, transfer].concat(),
            vec![
                LedgerEvent::approval(admin(), trader1(), id(0)),
                LedgerEvent::transfer(admin(), trader1(), id(0)),
            ]
        );
        assert_eq!(ledger.balance_of(admin()), 2);
        assert_eq!(ledger.balance_of(trader1()), 1);
        assert_eq!(ledger.owner_of(id(0)).unwrap(), trader1());
        assert_eq!(ledger.get_approved(id(0)).unwrap(), None);
    }

    #[test]
    fn fresh_approval_overwrites_previous_one() {
        let mut ledger = ledger_with_three_tokens();
        run(&mut ledger, LedgerCommand::approve(admin(), trader1(), id(0))).unwrap();
        run(&mut ledger, LedgerCommand::approve(admin(), trader2(), id(0))).unwrap();
        assert_eq!(ledger.get_approved(id(0)).unwrap(), Some(trader2()));

        let err = run(
            &mut ledger,
            LedgerCommand::transfer_from(trader1(), admin(), trader1(), id(0)),
        )
        .unwrap_err();
        assert_eq!(err, LedgerError::transfer_not_authorized());
    }

    #[test]
    fn approving_zero_address_clears_approval() {
        let mut ledger = ledger_with_three_tokens();
        run(&mut ledger, LedgerCommand::approve(admin(), trader1(), id(2))).unwrap();
        let events = run(&mut ledger, LedgerCommand::approve(admin(), Address::ZERO, id(2))).unwrap();
        assert_eq!(events, vec![LedgerEvent::approval(admin(), Address::ZERO, id(2))]);
        assert_eq!(ledger.get_approved(id(2)).unwrap(), None);
    }

    #[test]
    fn approve_requires_owner_or_operator() {
        let mut ledger = ledger_with_three_tokens();
        let before = ledger.clone();

        let err = run(&mut ledger, LedgerCommand::approve(trader1(), trader1(), id(0))).unwrap_err();
        assert!(matches!(err, LedgerError::Unauthorized(_)));
        assert_eq!(ledger, before);

        let err = run(&mut ledger, LedgerCommand::approve(admin(), trader1(), id(5))).unwrap_err();
        assert_eq!(err, LedgerError::NonexistentToken(id(5)));
    }

    #[test]
    fn operator_can_approve_and_transfer_until_revoked() {
        let mut ledger = ledger_with_three_tokens();

        let events = run(
            &mut ledger,
            LedgerCommand::set_approval_for_all(admin(), trader1(), true),
        )
        .unwrap();
        assert_eq!(events, vec![LedgerEvent::approval_for_all(admin(), trader1(), true)]);
        assert!(ledger.is_approved_for_all(admin(), trader1()));

        // Approval event names the owner, not the operator that issued it.
        let events = run(&mut ledger, LedgerCommand::approve(trader1(), trader2(), id(0))).unwrap();
        assert_eq!(events, vec![LedgerEvent::approval(admin(), trader2(), id(0))]);

        run(&mut ledger, LedgerCommand::transfer_from(trader1(), admin(), trader2(), id(1))).unwrap();
        assert_eq!(ledger.owner_of(id(1)).unwrap(), trader2());

        run(&mut ledger, LedgerCommand::set_approval_for_all(admin(), trader1(), false)).unwrap();
        assert!(!ledger.is_approved_for_all(admin(), trader1()));

        let err = run(
            &mut ledger,
            LedgerCommand::transfer_from(trader1(), admin(), trader2(), id(2)),
        )
        .unwrap_err();
        assert_eq!(err, LedgerError::transfer_not_authorized());
    }

    #[test]
    fn revoking_an_operator_emits_approval_for_all_false() {
        let mut ledger = ledger_with_three_tokens();
        run(&mut ledger, LedgerCommand::set_approval_for_all(admin(), trader1(), true)).unwrap();

        let events = run(
            &mut ledger,
            LedgerCommand::set_approval_for_all(admin(), trader1(), false),
        )
        .unwrap();
        assert_eq!(events, vec![LedgerEvent::approval_for_all(admin(), trader1(), false)]);

        let payload = serde_json::to_value(&events[0]).unwrap();
        assert_eq!(payload["event"], "ApprovalForAll");
        assert_eq!(payload["owner"], admin().to_string());
        assert_eq!(payload["operator"], trader1().to_string());
        assert_eq!(payload["approved"], false);
    }

    #[test]
    fn designating_oneself_as_operator_is_accepted_and_grants_nothing() {
        let mut ledger = ledger_with_three_tokens();
        run(&mut ledger, LedgerCommand::transfer_from(admin(), admin(), trader1(), id(0))).unwrap();

        let events = run(
            &mut ledger,
            LedgerCommand::set_approval_for_all(trader2(), trader2(), true),
        )
        .unwrap();
        assert_eq!(events, vec![LedgerEvent::approval_for_all(trader2(), trader2(), true)]);
        assert!(ledger.is_approved_for_all(trader2(), trader2()));

        // Still no reach over tokens trader2 does not own.
        let before = ledger.clone();
        let err = run(
            &mut ledger,
            LedgerCommand::transfer_from(trader2(), trader1(), trader2(), id(0)),
        )
        .unwrap_err();
        assert_eq!(err, LedgerError::transfer_not_authorized());
        let err = run(&mut ledger, LedgerCommand::approve(trader2(), trader2(), id(1))).unwrap_err();
        assert!(matches!(err, LedgerError::Unauthorized(_)));
        assert_eq!(ledger, before);

        // An owner naming itself keeps exactly the rights it already had.
        run(&mut ledger, LedgerCommand::set_approval_for_all(trader1(), trader1(), true)).unwrap();
        run(&mut ledger, LedgerCommand::transfer_from(trader1(), trader1(), trader2(), id(0))).unwrap();
        assert_eq!(ledger.owner_of(id(0)).unwrap(), trader2());
    }

    #[test]
    fn operator_standing_survives_transfers_of_owner_tokens() {
        let mut ledger = ledger_with_three_tokens();
        run(&mut ledger, LedgerCommand::set_approval_for_all(admin(), trader1(), true)).unwrap();
        run(&mut ledger, LedgerCommand::transfer_from(admin(), admin(), trader2(), id(0))).unwrap();
        assert!(ledger.is_approved_for_all(admin(), trader1()));

        // Future tokens are covered too.
        run(&mut ledger, LedgerCommand::mint(admin())).unwrap();
        run(&mut ledger, LedgerCommand::transfer_from(trader1(), admin(), trader1(), id(3))).unwrap();
        assert_eq!(ledger.owner_of(id(3)).unwrap(), trader1());
    }

    #[test]
    fn operator_of_previous_owner_loses_reach_after_transfer() {
        let mut ledger = ledger_with_three_tokens();
        run(&mut ledger, LedgerCommand::set_approval_for_all(admin(), trader1(), true)).unwrap();
        run(&mut ledger, LedgerCommand::transfer_from(admin(), admin(), trader2(), id(0))).unwrap();

        let err = run(
            &mut ledger,
            LedgerCommand::transfer_from(trader1(), trader2(), trader1(), id(0)),
        )
        .unwrap_err();
        assert_eq!(err, LedgerError::transfer_not_authorized());
    }

    #[test]
    fn transfer_to_zero_address_is_accepted() {
        let mut ledger = ledger_with_three_tokens();
        run(&mut ledger, LedgerCommand::transfer_from(admin(), admin(), Address::ZERO, id(0))).unwrap();
        assert_eq!(ledger.owner_of(id(0)).unwrap(), Address::ZERO);
        assert_eq!(ledger.balance_of(Address::ZERO), 1);
        assert_eq!(ledger.total_minted(), 3);
    }

    #[test]
    fn self_transfer_keeps_balance_and_clears_approval() {
        let mut ledger = ledger_with_three_tokens();
        run(&mut ledger, LedgerCommand::approve(admin(), trader1(), id(0))).unwrap();
        run(&mut ledger, LedgerCommand::transfer_from(admin(), admin(), admin(), id(0))).unwrap();
        assert_eq!(ledger.balance_of(admin()), 3);
        assert_eq!(ledger.get_approved(id(0)).unwrap(), None);
    }

    #[test]
    fn safe_transfer_to_rejecting_contract_changes_nothing() {
        let mut ledger = ledger_with_three_tokens();
        let contract = Address::repeat_byte(0xcc);
        let registry = ContractRegistry::new().with_contract(contract, false);
        run(&mut ledger, LedgerCommand::approve(admin(), trader1(), id(1))).unwrap();
        let before = ledger.clone();

        let oracle: &dyn RecipientOracle = &registry;
        let err = execute(
            &mut ledger,
            &LedgerCommand::safe_transfer_from(admin(), admin(), contract, id(1), vec![]),
            oracle,
        )
        .unwrap_err();

        assert!(matches!(err, LedgerError::RecipientRejected(_)));
        assert_eq!(ledger, before);
        assert_eq!(ledger.get_approved(id(1)).unwrap(), Some(trader1()));
    }

    #[test]
    fn safe_transfer_to_accepting_contract_or_account_succeeds() {
        let mut ledger = ledger_with_three_tokens();
        let contract = Address::repeat_byte(0xcd);
        let registry = ContractRegistry::new().with_contract(contract, true);
        let oracle: &dyn RecipientOracle = &registry;

        let events = execute(
            &mut ledger,
            &LedgerCommand::safe_transfer_from(admin(), admin(), contract, id(0), b"hi".to_vec()),
            oracle,
        )
        .unwrap();
        assert_eq!(events, vec![LedgerEvent::transfer(admin(), contract, id(0))]);

        execute(
            &mut ledger,
            &LedgerCommand::safe_transfer_from(admin(), admin(), trader1(), id(1), vec![]),
            oracle,
        )
        .unwrap();
        assert_eq!(ledger.owner_of(id(0)).unwrap(), contract);
        assert_eq!(ledger.owner_of(id(1)).unwrap(), trader1());
    }

    #[test]
    fn safe_transfer_checks_authorization_before_recipient() {
        let mut ledger = ledger_with_three_tokens();
        let contract = Address::repeat_byte(0xce);
        let registry = ContractRegistry::new().with_contract(contract, false);
        let oracle: &dyn RecipientOracle = &registry;

        let err = execute(
            &mut ledger,
            &LedgerCommand::safe_transfer_from(trader1(), admin(), contract, id(0), vec![]),
            oracle,
        )
        .unwrap_err();
        assert_eq!(err, LedgerError::transfer_not_authorized());
    }

    #[test]
    fn end_to_end_scenario() {
        let mut ledger = ledger_with_three_tokens();
        assert_eq!(ledger.balance_of(admin()), 3);
        for n in 0..3 {
            assert_eq!(ledger.owner_of(id(n)).unwrap(), admin());
        }

        run(&mut ledger, LedgerCommand::transfer_from(admin(), admin(), trader1(), id(1))).unwrap();
        assert_eq!(ledger.balance_of(trader1()), 1);
        assert_eq!(ledger.balance_of(admin()), 2);

        let err = run(
            &mut ledger,
            LedgerCommand::transfer_from(trader2(), trader1(), trader2(), id(1)),
        )
        .unwrap_err();
        assert_eq!(err, LedgerError::transfer_not_authorized());
        assert_eq!(ledger.balance_of(trader1()), 1);
        assert_eq!(ledger.balance_of(trader2()), 0);
    }

    #[test]
    fn handle_does_not_mutate_state() {
        let ledger = ledger_with_three_tokens();
        let before = ledger.clone();
        let oracle: &dyn RecipientOracle = &NoContracts;

        let cmd = LedgerCommand::transfer_from(admin(), admin(), trader1(), id(0));
        let events1 = ledger.handle(&cmd, oracle).unwrap();
        let events2 = ledger.handle(&cmd, oracle).unwrap();

        assert_eq!(events1, events2);
        assert_eq!(ledger, before);
    }

    #[test]
    fn rehydrate_reproduces_live_state() {
        let mut ledger = ledger_with_three_tokens();
        let mut history = vec![
            LedgerEvent::transfer(Address::ZERO, admin(), id(0)),
            LedgerEvent::transfer(Address::ZERO, admin(), id(1)),
            LedgerEvent::transfer(Address::ZERO, admin(), id(2)),
        ];
        for cmd in [
            LedgerCommand::set_approval_for_all(admin(), trader2(), true),
            LedgerCommand::approve(admin(), trader1(), id(2)),
            LedgerCommand::transfer_from(trader2(), admin(), trader1(), id(0)),
        ] {
            history.extend(run(&mut ledger, cmd).unwrap());
        }

        let replayed = TokenLedger::rehydrate(admin(), &history);
        assert_eq!(replayed, ledger);
        assert_eq!(replayed.version(), 6);
    }

    #[test]
    fn events_with_gapped_token_ids_are_ignored() {
        let mut ledger = TokenLedger::new(admin());
        ledger.apply(&LedgerEvent::transfer(Address::ZERO, admin(), id(5)));
        assert_eq!(ledger.total_minted(), 0);
        assert_eq!(ledger.balance_of(admin()), 0);
    }

    // ── property tests ──────────────────────────────────────────────────────

    fn actor(i: u8) -> Address {
        match i % 4 {
            0 => admin(),
            1 => trader1(),
            2 => trader2(),
            _ => Address::ZERO,
        }
    }

    fn arb_command() -> impl Strategy<Value = LedgerCommand> {
        prop_oneof![
            (0u8..4).prop_map(|c| LedgerCommand::mint(actor(c))),
            (0u8..4, 0u8..4, 0u8..4, 0u64..6).prop_map(|(c, f, t, n)| {
                LedgerCommand::transfer_from(actor(c), actor(f), actor(t), id(n))
            }),
            (0u8..4, 0u8..4, 0u8..4, 0u64..6).prop_map(|(c, f, t, n)| {
                LedgerCommand::safe_transfer_from(actor(c), actor(f), actor(t), id(n), vec![])
            }),
            (0u8..4, 0u8..4, 0u64..6)
                .prop_map(|(c, a, n)| LedgerCommand::approve(actor(c), actor(a), id(n))),
            (0u8..4, 0u8..4, any::<bool>()).prop_map(|(c, o, b)| {
                LedgerCommand::set_approval_for_all(actor(c), actor(o), b)
            }),
        ]
    }

    fn assert_balances_consistent(ledger: &TokenLedger) -> Result<(), TestCaseError> {
        let mut counted: HashMap<Address, u64> = HashMap::new();
        for n in 0..ledger.total_minted() {
            *counted.entry(ledger.owner_of(id(n)).unwrap()).or_insert(0) += 1;
        }
        for i in 0..4 {
            let a = actor(i);
            prop_assert_eq!(ledger.balance_of(a), counted.get(&a).copied().unwrap_or(0));
        }
        let total: u64 = ledger.holders().map(|(_, b)| b).sum();
        prop_assert_eq!(total, ledger.total_minted());
        Ok(())
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: whatever sequence of calls is submitted, balances always
        /// match the owner registry and sum to the minted count.
        #[test]
        fn balances_always_match_ownership(commands in prop::collection::vec(arb_command(), 1..40)) {
            let mut ledger = TokenLedger::new(admin());
            // The registry flags trader2 as a rejecting contract.
            let registry = ContractRegistry::new().with_contract(trader2(), false);
            let oracle: &dyn RecipientOracle = &registry;

            for cmd in commands {
                let before = ledger.clone();
                match execute(&mut ledger, &cmd, oracle) {
                    Ok(events) => {
                        prop_assert_eq!(events.len(), 1);
                        prop_assert_eq!(ledger.version(), before.version() + 1);
                        if let LedgerEvent::Transfer(t) = &events[0] {
                            prop_assert_eq!(ledger.owner_of(t.token_id).unwrap(), t.to);
                            prop_assert_eq!(ledger.get_approved(t.token_id).unwrap(), None);
                        }
                    }
                    Err(_) => prop_assert_eq!(&ledger, &before),
                }
                assert_balances_consistent(&ledger)?;
            }
        }

        /// Property: minting succeeds exactly when the caller is the admin.
        #[test]
        fn only_admin_can_mint(callers in prop::collection::vec(0u8..4, 1..20)) {
            let mut ledger = TokenLedger::new(admin());
            for c in callers {
                let minted = ledger.total_minted();
                let balance = ledger.balance_of(admin());
                let result = run(&mut ledger, LedgerCommand::mint(actor(c)));
                if actor(c) == admin() {
                    prop_assert!(result.is_ok());
                    prop_assert_eq!(ledger.total_minted(), minted + 1);
                    prop_assert_eq!(ledger.balance_of(admin()), balance + 1);
                } else {
                    prop_assert!(matches!(result, Err(LedgerError::Unauthorized(_))));
                    prop_assert_eq!(ledger.total_minted(), minted);
                }
            }
        }
    }
}
