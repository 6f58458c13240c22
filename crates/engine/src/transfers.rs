//! Transfer records: the append-only audit trail of coin movements.
//!
//! A record is written in the same transaction as the balance change it
//! documents and is never updated or deleted afterwards.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};

use crate::{AccountId, EngineError, ResultEngine};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferKind {
    /// Coins moved from one account to another.
    Transfer,
    /// Coins spent on a catalog item.
    Purchase,
}

impl TransferKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Transfer => "transfer",
            Self::Purchase => "purchase",
        }
    }
}

impl TryFrom<&str> for TransferKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "transfer" => Ok(Self::Transfer),
            "purchase" => Ok(Self::Purchase),
            other => Err(EngineError::InvalidId(format!(
                "invalid transfer kind: {other}"
            ))),
        }
    }
}

/// A record about to be appended. Only constructible through
/// [`NewTransfer::transfer`] and [`NewTransfer::purchase`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewTransfer {
    kind: TransferKind,
    from: Option<AccountId>,
    to: Option<AccountId>,
    amount: i64,
    occurred_at: DateTime<Utc>,
}

impl NewTransfer {
    pub fn transfer(
        from: AccountId,
        to: AccountId,
        amount: i64,
        occurred_at: DateTime<Utc>,
    ) -> ResultEngine<Self> {
        ensure_positive(amount)?;
        if from == to {
            return Err(EngineError::InvalidRecipient(
                "cannot transfer coins to the same account".to_string(),
            ));
        }
        Ok(Self {
            kind: TransferKind::Transfer,
            from: Some(from),
            to: Some(to),
            amount,
            occurred_at,
        })
    }

    pub fn purchase(
        buyer: AccountId,
        amount: i64,
        occurred_at: DateTime<Utc>,
    ) -> ResultEngine<Self> {
        ensure_positive(amount)?;
        Ok(Self {
            kind: TransferKind::Purchase,
            from: Some(buyer),
            to: None,
            amount,
            occurred_at,
        })
    }

    pub fn kind(&self) -> TransferKind {
        self.kind
    }

    pub fn from(&self) -> Option<AccountId> {
        self.from
    }

    pub fn to(&self) -> Option<AccountId> {
        self.to
    }

    pub fn amount(&self) -> i64 {
        self.amount
    }

    pub fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }

    /// Attach the storage-assigned sequence number.
    pub fn into_record(self, id: i64) -> TransferRecord {
        TransferRecord {
            id,
            kind: self.kind,
            from: self.from,
            to: self.to,
            amount: self.amount,
            occurred_at: self.occurred_at,
        }
    }
}

fn ensure_positive(amount: i64) -> ResultEngine<()> {
    if amount <= 0 {
        return Err(EngineError::InvalidAmount(
            "amount must be > 0".to_string(),
        ));
    }
    Ok(())
}

/// A persisted record. `id` grows with insertion order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRecord {
    pub id: i64,
    pub kind: TransferKind,
    pub from: Option<AccountId>,
    pub to: Option<AccountId>,
    pub amount: i64,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "transfers")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub kind: String,
    pub from_user_id: Option<String>,
    pub to_user_id: Option<String>,
    pub amount: i64,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&NewTransfer> for ActiveModel {
    fn from(transfer: &NewTransfer) -> Self {
        Self {
            id: ActiveValue::NotSet,
            kind: ActiveValue::Set(transfer.kind.as_str().to_string()),
            from_user_id: ActiveValue::Set(transfer.from.map(|id| id.to_string())),
            to_user_id: ActiveValue::Set(transfer.to.map(|id| id.to_string())),
            amount: ActiveValue::Set(transfer.amount),
            created_at: ActiveValue::Set(transfer.occurred_at),
        }
    }
}

impl TryFrom<Model> for TransferRecord {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let kind = TransferKind::try_from(model.kind.as_str())?;
        let from = model
            .from_user_id
            .as_deref()
            .map(AccountId::try_from)
            .transpose()?;
        let to = model
            .to_user_id
            .as_deref()
            .map(AccountId::try_from)
            .transpose()?;
        let new = match (kind, from, to) {
            (TransferKind::Transfer, Some(from), Some(to)) => {
                NewTransfer::transfer(from, to, model.amount, model.created_at)?
            }
            (TransferKind::Purchase, Some(buyer), None) => {
                NewTransfer::purchase(buyer, model.amount, model.created_at)?
            }
            _ => {
                return Err(EngineError::InvalidId(format!(
                    "transfer {} has parties inconsistent with kind {}",
                    model.id, model.kind
                )));
            }
        };
        Ok(new.into_record(model.id))
    }
}
