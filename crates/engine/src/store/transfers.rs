use async_trait::async_trait;
use sea_orm::{DatabaseTransaction, QueryFilter, QueryOrder, prelude::*};

use crate::{
    AccountId, EngineError, HistoryEntry, NewTransfer, ResultEngine, TransferRecord,
    ports::TransferStore, transfers,
};

use super::DbStore;

#[derive(Clone, Copy)]
enum Side {
    Sent,
    Received,
}

#[async_trait]
impl TransferStore<DatabaseTransaction> for DbStore {
    async fn append(&self, scope: &DatabaseTransaction, transfer: &NewTransfer) -> ResultEngine<()> {
        transfers::Entity::insert(transfers::ActiveModel::from(transfer))
            .exec(scope)
            .await?;
        Ok(())
    }

    async fn sent_by(&self, account: &AccountId) -> ResultEngine<Vec<HistoryEntry>> {
        self.history(account, Side::Sent).await
    }

    async fn received_by(&self, account: &AccountId) -> ResultEngine<Vec<HistoryEntry>> {
        self.history(account, Side::Received).await
    }
}

impl DbStore {
    async fn history(&self, account: &AccountId, side: Side) -> ResultEngine<Vec<HistoryEntry>> {
        let column = match side {
            Side::Sent => transfers::Column::FromUserId,
            Side::Received => transfers::Column::ToUserId,
        };
        let records = transfers::Entity::find()
            .filter(column.eq(account.to_string()))
            .order_by_asc(transfers::Column::Id)
            .all(&self.database)
            .await?
            .into_iter()
            .map(TransferRecord::try_from)
            .collect::<ResultEngine<Vec<_>>>()?;

        let counterparty_of = |record: &TransferRecord| match side {
            Side::Sent => record.to,
            Side::Received => record.from,
        };
        let names = self
            .usernames(records.iter().filter_map(counterparty_of))
            .await?;

        records
            .into_iter()
            .map(|record| {
                let counterparty = counterparty_of(&record)
                    .map(|id| {
                        names.get(&id).cloned().ok_or_else(|| {
                            EngineError::KeyNotFound(format!(
                                "account {id} referenced by transfer {}",
                                record.id
                            ))
                        })
                    })
                    .transpose()?;
                Ok(HistoryEntry {
                    record,
                    counterparty,
                })
            })
            .collect()
    }
}
