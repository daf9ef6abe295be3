//! Ledger reader interface
//!
//! The engine never talks to the chain. A [`LedgerReader`] hands out
//! point-in-time copies of banks and accounts; bounding their staleness is
//! the caller's job.

use async_trait::async_trait;
use lendrisk_core::BankAddress;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use crate::balance::Account;
use crate::bank::Bank;
use crate::error::BankError;

#[async_trait]
pub trait LedgerReader: Send + Sync {
    async fn get_bank(&self, address: &BankAddress) -> Result<Bank, BankError>;

    async fn get_account(&self, id: &str) -> Result<Account, BankError>;

    /// Banks for every balance the account holds
    async fn get_account_banks(&self, account: &Account) -> Result<HashMap<BankAddress, Bank>, BankError> {
        let mut banks = HashMap::new();
        for balance in account.balances() {
            let bank = self.get_bank(balance.bank()).await?;
            banks.insert(bank.address.clone(), bank);
        }
        Ok(banks)
    }
}

/// Serialized ledger contents
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    #[serde(default)]
    pub banks: Vec<Bank>,
    #[serde(default)]
    pub accounts: Vec<Account>,
}

impl LedgerSnapshot {
    /// Parse and validate. Corrupt balances never load.
    pub fn from_json(json: &str) -> Result<Self, BankError> {
        let snapshot: Self = serde_json::from_str(json).map_err(|e| BankError::Snapshot(e.to_string()))?;
        snapshot.validate()?;
        Ok(snapshot)
    }

    pub fn validate(&self) -> Result<(), BankError> {
        for bank in &self.banks {
            bank.validate()?;
        }
        for account in &self.accounts {
            account.validate()?;
        }
        Ok(())
    }
}

/// In-memory ledger backed by a snapshot
#[derive(Default)]
pub struct MemoryLedger {
    banks: RwLock<HashMap<BankAddress, Bank>>,
    accounts: RwLock<HashMap<String, Account>>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snapshot: LedgerSnapshot) -> Self {
        let ledger = Self::new();
        for bank in snapshot.banks {
            ledger.put_bank(bank);
        }
        for account in snapshot.accounts {
            ledger.put_account(account);
        }
        ledger
    }

    pub fn put_bank(&self, bank: Bank) {
        let mut banks = self.banks.write().unwrap_or_else(PoisonError::into_inner);
        banks.insert(bank.address.clone(), bank);
    }

    pub fn put_account(&self, account: Account) {
        let mut accounts = self.accounts.write().unwrap_or_else(PoisonError::into_inner);
        accounts.insert(account.id.clone(), account);
    }

    pub fn bank_addresses(&self) -> Vec<BankAddress> {
        let banks = self.banks.read().unwrap_or_else(PoisonError::into_inner);
        let mut addresses: Vec<_> = banks.keys().cloned().collect();
        addresses.sort();
        addresses
    }
}

#[async_trait]
impl LedgerReader for MemoryLedger {
    async fn get_bank(&self, address: &BankAddress) -> Result<Bank, BankError> {
        let banks = self.banks.read().unwrap_or_else(PoisonError::into_inner);
        banks
            .get(address)
            .cloned()
            .ok_or_else(|| BankError::BankNotFound(address.clone()))
    }

    async fn get_account(&self, id: &str) -> Result<Account, BankError> {
        let accounts = self.accounts.read().unwrap_or_else(PoisonError::into_inner);
        accounts
            .get(id)
            .cloned()
            .ok_or_else(|| BankError::AccountNotFound(id.to_string()))
    }
}
