use crate::{AccountId, CallContext, ResultEngine, UserInfo};

use super::Engine;

impl Engine {
    /// Balance, inventory and coin history of `caller`.
    pub async fn user_info(&self, ctx: &CallContext, caller: &AccountId) -> ResultEngine<UserInfo> {
        self.ledger.get_user_info(ctx, caller).await
    }

    /// Transfer `amount` coins from `caller` to `to_username`.
    ///
    /// Fails with a client error (and without touching any balance) when the
    /// amount is not positive, the caller cannot afford it or the recipient
    /// does not exist.
    pub async fn send_coin(
        &self,
        ctx: &CallContext,
        caller: &AccountId,
        to_username: &str,
        amount: i64,
    ) -> ResultEngine<()> {
        self.ledger.send_coin(ctx, caller, to_username, amount).await
    }

    /// Buy one unit of `item_name` for `caller`.
    pub async fn buy_merch(
        &self,
        ctx: &CallContext,
        caller: &AccountId,
        item_name: &str,
    ) -> ResultEngine<()> {
        self.ledger.buy_merch(ctx, caller, item_name).await
    }
}
