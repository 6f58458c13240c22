//! Read-side projection of an account.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{Account, InventoryEntry, InventoryItem, TransferRecord};

/// A transfer record seen from one account, with the username on the other
/// side when there is one (purchases have none).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub record: TransferRecord,
    pub counterparty: Option<String>,
}

/// Balance, inventory and coin history of one account, assembled on read.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    pub account: Account,
    pub inventory: Vec<InventoryEntry>,
    /// Records where the account is the source, oldest first.
    pub sent: Vec<HistoryEntry>,
    /// Records where the account is the destination, oldest first.
    pub received: Vec<HistoryEntry>,
}

impl UserInfo {
    pub fn balance(&self) -> i64 {
        self.account.balance
    }

    /// Inventory grouped by item name, sorted by name.
    pub fn inventory_summary(&self) -> Vec<InventoryItem> {
        let mut counts: BTreeMap<&str, u32> = BTreeMap::new();
        for entry in &self.inventory {
            *counts.entry(entry.item_name.as_str()).or_default() += 1;
        }
        counts
            .into_iter()
            .map(|(name, quantity)| InventoryItem {
                name: name.to_string(),
                quantity,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use uuid::Uuid;

    use super::*;
    use crate::AccountId;

    #[test]
    fn inventory_summary_counts_duplicates() {
        let account = Account {
            id: AccountId::new(),
            username: "bob".to_string(),
            balance: 0,
            created_at: Utc::now(),
        };
        let entry = |name: &str| InventoryEntry {
            account_id: account.id,
            item_id: Uuid::new_v4(),
            item_name: name.to_string(),
            acquired_at: Utc::now(),
        };
        let info = UserInfo {
            inventory: vec![entry("hoody"), entry("cup"), entry("hoody")],
            account,
            sent: Vec::new(),
            received: Vec::new(),
        };

        assert_eq!(
            info.inventory_summary(),
            vec![
                InventoryItem {
                    name: "cup".to_string(),
                    quantity: 1
                },
                InventoryItem {
                    name: "hoody".to_string(),
                    quantity: 2
                },
            ]
        );
    }
}
