//! In-memory store implementing every repository trait
//!
//! Used by the integration test-suite and for running the service without a
//! Redis instance. One mutex serializes all mutations, which gives the same
//! guard semantics the Lua scripts provide on Redis.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use shared::Multiplier;

use crate::domain::{
    Bet, CommissionEntry, DepositRequest, Role, Round, TransferStatus, User, WithdrawRequest,
};
use crate::errors::{AppError, Result};

use super::bets::{BetRepository, CashoutGate};
use super::commissions::CommissionRepository;
use super::rounds::RoundRepository;
use super::sessions::SessionRepository;
use super::transfers::TransferRepository;
use super::users::UserRepository;

#[derive(Default)]
struct Inner {
    users: HashMap<Uuid, User>,
    users_by_email: HashMap<String, Uuid>,
    sessions: HashMap<String, Uuid>,
    rounds: HashMap<Uuid, Round>,
    bets: HashMap<Uuid, Bet>,
    bets_by_round: HashMap<Uuid, Vec<Uuid>>,
    deposits: HashMap<Uuid, DepositRequest>,
    deposit_order: Vec<Uuid>,
    withdraws: HashMap<Uuid, WithdrawRequest>,
    withdraw_order: Vec<Uuid>,
    commission_entries: Vec<CommissionEntry>,
    commission_total: u64,
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        // A poisoned lock means a panicked test thread; propagating the
        // panic is the right behavior there.
        self.inner.lock().expect("memory store lock poisoned")
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn upsert_by_email(&self, email: &str, role: Role) -> Result<User> {
        let mut inner = self.lock();

        if let Some(user_id) = inner.users_by_email.get(email).copied() {
            let user = inner
                .users
                .get_mut(&user_id)
                .ok_or_else(|| AppError::user_not_found(user_id))?;
            user.role = role;
            return Ok(user.clone());
        }

        let user = User {
            user_id: Uuid::new_v4(),
            email: email.to_string(),
            balance: 0,
            role,
            created_at: Utc::now(),
        };
        inner.users_by_email.insert(email.to_string(), user.user_id);
        inner.users.insert(user.user_id, user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, user_id: Uuid) -> Result<Option<User>> {
        Ok(self.lock().users.get(&user_id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let inner = self.lock();
        Ok(inner
            .users_by_email
            .get(email)
            .and_then(|id| inner.users.get(id))
            .cloned())
    }

    async fn debit(&self, user_id: Uuid, amount: u64) -> Result<u64> {
        let mut inner = self.lock();
        let user = inner
            .users
            .get_mut(&user_id)
            .ok_or_else(|| AppError::user_not_found(user_id))?;

        if user.balance < amount {
            return Err(AppError::InsufficientFunds);
        }

        user.balance -= amount;
        Ok(user.balance)
    }

    async fn credit(&self, user_id: Uuid, amount: u64) -> Result<u64> {
        let mut inner = self.lock();
        let user = inner
            .users
            .get_mut(&user_id)
            .ok_or_else(|| AppError::user_not_found(user_id))?;

        user.balance += amount;
        Ok(user.balance)
    }
}

#[async_trait]
impl SessionRepository for MemoryStore {
    async fn issue(&self, user_id: Uuid) -> Result<String> {
        let token = Uuid::new_v4().to_string().replace('-', "");
        self.lock().sessions.insert(token.clone(), user_id);
        Ok(token)
    }

    async fn resolve(&self, token: &str) -> Result<Option<Uuid>> {
        Ok(self.lock().sessions.get(token).copied())
    }
}

#[async_trait]
impl RoundRepository for MemoryStore {
    async fn create(&self) -> Result<Round> {
        let round = Round {
            round_id: Uuid::new_v4(),
            crash_multiplier: None,
            finished: false,
            created_at: Utc::now(),
        };
        self.lock().rounds.insert(round.round_id, round.clone());
        Ok(round)
    }

    async fn find_by_id(&self, round_id: Uuid) -> Result<Option<Round>> {
        Ok(self.lock().rounds.get(&round_id).cloned())
    }

    async fn finish(&self, round_id: Uuid, crash: Multiplier) -> Result<bool> {
        let mut inner = self.lock();
        let round = inner
            .rounds
            .get_mut(&round_id)
            .ok_or_else(|| AppError::round_not_found(round_id))?;

        if round.finished {
            return Ok(false);
        }

        round.finished = true;
        round.crash_multiplier = Some(crash);
        Ok(true)
    }
}

#[async_trait]
impl BetRepository for MemoryStore {
    async fn create(&self, user_id: Uuid, round_id: Uuid, amount: u64) -> Result<Bet> {
        let bet = Bet {
            bet_id: Uuid::new_v4(),
            user_id,
            round_id,
            amount,
            cashed_out: false,
            cashed_at_multiplier: None,
            result_paid: None,
            created_at: Utc::now(),
        };

        let mut inner = self.lock();
        inner
            .bets_by_round
            .entry(round_id)
            .or_default()
            .push(bet.bet_id);
        inner.bets.insert(bet.bet_id, bet.clone());
        Ok(bet)
    }

    async fn find_by_id(&self, bet_id: Uuid) -> Result<Option<Bet>> {
        Ok(self.lock().bets.get(&bet_id).cloned())
    }

    async fn find_by_round(&self, round_id: Uuid) -> Result<Vec<Bet>> {
        let inner = self.lock();
        Ok(inner
            .bets_by_round
            .get(&round_id)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| inner.bets.get(id))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn claim_cashout(&self, bet_id: Uuid, multiplier: Multiplier) -> Result<CashoutGate> {
        let mut inner = self.lock();

        let round_id = match inner.bets.get(&bet_id) {
            Some(bet) if bet.cashed_out => return Ok(CashoutGate::AlreadyCashedOut),
            Some(bet) => bet.round_id,
            None => return Err(AppError::bet_not_found(bet_id)),
        };

        let round_finished = inner
            .rounds
            .get(&round_id)
            .map(|r| r.finished)
            .unwrap_or(false);
        if round_finished {
            return Ok(CashoutGate::RoundClosed);
        }

        let bet = inner
            .bets
            .get_mut(&bet_id)
            .ok_or_else(|| AppError::bet_not_found(bet_id))?;
        bet.cashed_out = true;
        bet.cashed_at_multiplier = Some(multiplier);
        Ok(CashoutGate::Applied)
    }

    async fn mark_result_paid(&self, bet_id: Uuid, paid: bool) -> Result<()> {
        let mut inner = self.lock();
        let bet = inner
            .bets
            .get_mut(&bet_id)
            .ok_or_else(|| AppError::bet_not_found(bet_id))?;
        bet.result_paid = Some(paid);
        Ok(())
    }
}

#[async_trait]
impl TransferRepository for MemoryStore {
    async fn create_deposit(
        &self,
        user_id: Uuid,
        amount: u64,
        method: &str,
        note: Option<String>,
    ) -> Result<DepositRequest> {
        let request = DepositRequest {
            request_id: Uuid::new_v4(),
            user_id,
            amount,
            method: method.to_string(),
            note,
            status: TransferStatus::Pending,
            created_at: Utc::now(),
        };

        let mut inner = self.lock();
        inner.deposit_order.push(request.request_id);
        inner.deposits.insert(request.request_id, request.clone());
        Ok(request)
    }

    async fn find_deposit(&self, request_id: Uuid) -> Result<Option<DepositRequest>> {
        Ok(self.lock().deposits.get(&request_id).cloned())
    }

    async fn list_deposits(&self, limit: i64, offset: i64) -> Result<Vec<DepositRequest>> {
        let inner = self.lock();
        Ok(page_newest_first(&inner.deposit_order, limit, offset)
            .filter_map(|id| inner.deposits.get(id))
            .cloned()
            .collect())
    }

    async fn approve_deposit(&self, request_id: Uuid) -> Result<bool> {
        let mut inner = self.lock();
        let request = inner
            .deposits
            .get_mut(&request_id)
            .ok_or_else(|| AppError::request_not_found(request_id))?;

        if request.status != TransferStatus::Pending {
            return Ok(false);
        }

        request.status = TransferStatus::Approved;
        Ok(true)
    }

    async fn create_withdraw(
        &self,
        user_id: Uuid,
        amount: u64,
        method: &str,
        details: Option<serde_json::Value>,
    ) -> Result<WithdrawRequest> {
        let request = WithdrawRequest {
            request_id: Uuid::new_v4(),
            user_id,
            amount,
            method: method.to_string(),
            details,
            status: TransferStatus::Pending,
            created_at: Utc::now(),
        };

        let mut inner = self.lock();
        inner.withdraw_order.push(request.request_id);
        inner.withdraws.insert(request.request_id, request.clone());
        Ok(request)
    }

    async fn find_withdraw(&self, request_id: Uuid) -> Result<Option<WithdrawRequest>> {
        Ok(self.lock().withdraws.get(&request_id).cloned())
    }

    async fn list_withdraws(&self, limit: i64, offset: i64) -> Result<Vec<WithdrawRequest>> {
        let inner = self.lock();
        Ok(page_newest_first(&inner.withdraw_order, limit, offset)
            .filter_map(|id| inner.withdraws.get(id))
            .cloned()
            .collect())
    }

    async fn mark_withdraw_paid(&self, request_id: Uuid) -> Result<bool> {
        let mut inner = self.lock();
        let request = inner
            .withdraws
            .get_mut(&request_id)
            .ok_or_else(|| AppError::request_not_found(request_id))?;

        if request.status != TransferStatus::Pending {
            return Ok(false);
        }

        request.status = TransferStatus::Paid;
        Ok(true)
    }
}

#[async_trait]
impl CommissionRepository for MemoryStore {
    async fn record(&self, round_id: Uuid, amount: u64) -> Result<CommissionEntry> {
        let entry = CommissionEntry {
            commission_id: Uuid::new_v4(),
            round_id,
            amount,
            created_at: Utc::now(),
        };

        let mut inner = self.lock();
        inner.commission_total += amount;
        inner.commission_entries.push(entry.clone());
        Ok(entry)
    }

    async fn report(&self) -> Result<(u64, u64)> {
        let inner = self.lock();
        Ok((inner.commission_total, inner.commission_entries.len() as u64))
    }
}

fn page_newest_first(order: &[Uuid], limit: i64, offset: i64) -> impl Iterator<Item = &Uuid> {
    order
        .iter()
        .rev()
        .skip(offset.max(0) as usize)
        .take(limit.max(0) as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_debit_requires_sufficient_balance() {
        let store = MemoryStore::new();
        let user = store.upsert_by_email("a@b.test", Role::Player).await.unwrap();
        store.credit(user.user_id, 100).await.unwrap();

        let err = store.debit(user.user_id, 150).await.unwrap_err();
        assert!(matches!(err, AppError::InsufficientFunds));

        // Balance unchanged after the refused debit
        let user = UserRepository::find_by_id(&store, user.user_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(user.balance, 100);

        assert_eq!(store.debit(user.user_id, 100).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_upsert_keeps_balance_and_updates_role() {
        let store = MemoryStore::new();
        let user = store.upsert_by_email("a@b.test", Role::Player).await.unwrap();
        store.credit(user.user_id, 500).await.unwrap();

        let again = store.upsert_by_email("a@b.test", Role::Admin).await.unwrap();
        assert_eq!(again.user_id, user.user_id);
        assert_eq!(again.balance, 500);
        assert_eq!(again.role, Role::Admin);
    }

    #[tokio::test]
    async fn test_cashout_claim_is_once_only() {
        let store = MemoryStore::new();
        let round = RoundRepository::create(&store).await.unwrap();
        let bet = BetRepository::create(&store, Uuid::new_v4(), round.round_id, 1000)
            .await
            .unwrap();
        let multiplier = Multiplier::new(200).unwrap();

        assert_eq!(
            store.claim_cashout(bet.bet_id, multiplier).await.unwrap(),
            CashoutGate::Applied
        );
        assert_eq!(
            store.claim_cashout(bet.bet_id, multiplier).await.unwrap(),
            CashoutGate::AlreadyCashedOut
        );
    }

    #[tokio::test]
    async fn test_cashout_claim_refused_after_round_finish() {
        let store = MemoryStore::new();
        let round = RoundRepository::create(&store).await.unwrap();
        let bet = BetRepository::create(&store, Uuid::new_v4(), round.round_id, 1000)
            .await
            .unwrap();

        assert!(store
            .finish(round.round_id, Multiplier::new(150).unwrap())
            .await
            .unwrap());

        assert_eq!(
            store
                .claim_cashout(bet.bet_id, Multiplier::new(200).unwrap())
                .await
                .unwrap(),
            CashoutGate::RoundClosed
        );
    }

    #[tokio::test]
    async fn test_round_finish_is_once_only() {
        let store = MemoryStore::new();
        let round = RoundRepository::create(&store).await.unwrap();
        let crash = Multiplier::new(250).unwrap();

        assert!(store.finish(round.round_id, crash).await.unwrap());
        assert!(!store.finish(round.round_id, crash).await.unwrap());

        let round = RoundRepository::find_by_id(&store, round.round_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(round.crash_multiplier, Some(crash));
    }

    #[tokio::test]
    async fn test_transfer_transitions_are_once_only() {
        let store = MemoryStore::new();
        let user_id = Uuid::new_v4();

        let deposit = store
            .create_deposit(user_id, 5000, "bank", None)
            .await
            .unwrap();
        assert!(store.approve_deposit(deposit.request_id).await.unwrap());
        assert!(!store.approve_deposit(deposit.request_id).await.unwrap());

        let withdraw = store
            .create_withdraw(user_id, 2500, "bank", None)
            .await
            .unwrap();
        assert!(store.mark_withdraw_paid(withdraw.request_id).await.unwrap());
        assert!(!store.mark_withdraw_paid(withdraw.request_id).await.unwrap());
    }

    #[tokio::test]
    async fn test_commission_report_accumulates() {
        let store = MemoryStore::new();
        let round_id = Uuid::new_v4();

        store.record(round_id, 100).await.unwrap();
        store.record(round_id, 250).await.unwrap();

        assert_eq!(store.report().await.unwrap(), (350, 2));
    }

    #[tokio::test]
    async fn test_list_is_newest_first() {
        let store = MemoryStore::new();
        let user_id = Uuid::new_v4();

        let first = store.create_deposit(user_id, 1, "bank", None).await.unwrap();
        let second = store.create_deposit(user_id, 2, "bank", None).await.unwrap();

        let listed = store.list_deposits(10, 0).await.unwrap();
        assert_eq!(listed[0].request_id, second.request_id);
        assert_eq!(listed[1].request_id, first.request_id);

        let paged = store.list_deposits(1, 1).await.unwrap();
        assert_eq!(paged.len(), 1);
        assert_eq!(paged[0].request_id, first.request_id);
    }
}
