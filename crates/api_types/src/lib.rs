//! JSON bodies of the merch store HTTP API.
//!
//! Field names follow the public API contract (camelCase), not Rust naming.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Body of every non-2xx response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

pub mod auth {
    use super::*;

    /// Log in, registering the user on first sight.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct AuthRequest {
        pub username: String,
        pub password: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct AuthResponse {
        /// Bearer token for the `Authorization` header.
        pub token: String,
    }
}

pub mod coins {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct SendCoinRequest {
        pub to_user: String,
        pub amount: i64,
    }

    #[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct InfoResponse {
        pub coins: i64,
        pub inventory: Vec<InventoryItem>,
        pub coin_history: CoinHistory,
    }

    #[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct InventoryItem {
        #[serde(rename = "type")]
        pub item_type: String,
        pub quantity: u32,
    }

    #[derive(Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
    pub struct CoinHistory {
        pub received: Vec<ReceivedCoins>,
        pub sent: Vec<SentCoins>,
    }

    #[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ReceivedCoins {
        pub from_user: String,
        pub amount: i64,
        pub date: DateTime<Utc>,
    }

    /// Coins leaving the account. `to_user` is absent for purchases.
    #[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct SentCoins {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub to_user: Option<String>,
        pub amount: i64,
        pub kind: SentKind,
        pub date: DateTime<Utc>,
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum SentKind {
        Transfer,
        Purchase,
    }
}

#[cfg(test)]
mod tests {
    use super::coins::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn info_response_uses_api_field_names() {
        let date = Utc.with_ymd_and_hms(2025, 2, 1, 10, 0, 0).unwrap();
        let info = InfoResponse {
            coins: 620,
            inventory: vec![InventoryItem {
                item_type: "hoody".to_string(),
                quantity: 1,
            }],
            coin_history: CoinHistory {
                received: vec![ReceivedCoins {
                    from_user: "alice".to_string(),
                    amount: 20,
                    date,
                }],
                sent: vec![
                    SentCoins {
                        to_user: None,
                        amount: 300,
                        kind: SentKind::Purchase,
                        date,
                    },
                    SentCoins {
                        to_user: Some("bob".to_string()),
                        amount: 100,
                        kind: SentKind::Transfer,
                        date,
                    },
                ],
            },
        };

        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "coins": 620,
                "inventory": [{"type": "hoody", "quantity": 1}],
                "coinHistory": {
                    "received": [
                        {"fromUser": "alice", "amount": 20, "date": "2025-02-01T10:00:00Z"}
                    ],
                    "sent": [
                        {"amount": 300, "kind": "purchase", "date": "2025-02-01T10:00:00Z"},
                        {
                            "toUser": "bob",
                            "amount": 100,
                            "kind": "transfer",
                            "date": "2025-02-01T10:00:00Z"
                        }
                    ]
                }
            })
        );
    }

    #[test]
    fn send_coin_request_reads_camel_case() {
        let req: SendCoinRequest =
            serde_json::from_str(r#"{"toUser": "bob", "amount": 15}"#).unwrap();
        assert_eq!(req.to_user, "bob");
        assert_eq!(req.amount, 15);
    }
}
