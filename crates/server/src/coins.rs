use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::{
    ServerError,
    server::ServerState,
    types::coins::{
        CoinHistory, InfoResponse, InventoryItem, ReceivedCoins, SendCoinRequest, SentCoins,
        SentKind,
    },
};
use engine::{AccountId, TransferKind, UserInfo};

fn info_response(info: UserInfo) -> InfoResponse {
    let inventory = info
        .inventory_summary()
        .into_iter()
        .map(|item| InventoryItem {
            item_type: item.name,
            quantity: item.quantity,
        })
        .collect();
    let received = info
        .received
        .into_iter()
        .map(|entry| ReceivedCoins {
            from_user: entry.counterparty.unwrap_or_default(),
            amount: entry.record.amount,
            date: entry.record.occurred_at,
        })
        .collect();
    let sent = info
        .sent
        .into_iter()
        .map(|entry| SentCoins {
            to_user: entry.counterparty,
            amount: entry.record.amount,
            kind: match entry.record.kind {
                TransferKind::Transfer => SentKind::Transfer,
                TransferKind::Purchase => SentKind::Purchase,
            },
            date: entry.record.occurred_at,
        })
        .collect();

    InfoResponse {
        coins: info.account.balance,
        inventory,
        coin_history: CoinHistory { received, sent },
    }
}

pub async fn info(
    State(state): State<ServerState>,
    Extension(account): Extension<AccountId>,
) -> Result<Json<InfoResponse>, ServerError> {
    let info = state
        .engine
        .user_info(&state.call_context(), &account)
        .await?;
    Ok(Json(info_response(info)))
}

pub async fn send_coin(
    State(state): State<ServerState>,
    Extension(account): Extension<AccountId>,
    Json(payload): Json<SendCoinRequest>,
) -> Result<StatusCode, ServerError> {
    state
        .engine
        .send_coin(
            &state.call_context(),
            &account,
            &payload.to_user,
            payload.amount,
        )
        .await?;
    Ok(StatusCode::OK)
}

pub async fn buy(
    State(state): State<ServerState>,
    Extension(account): Extension<AccountId>,
    Path(item): Path<String>,
) -> Result<StatusCode, ServerError> {
    state
        .engine
        .buy_merch(&state.call_context(), &account, &item)
        .await?;
    Ok(StatusCode::OK)
}
