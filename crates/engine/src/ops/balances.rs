use std::collections::BTreeSet;

use uuid::Uuid;

use sea_orm::{
    ActiveValue, Condition, DatabaseTransaction, QueryFilter, TransactionTrait, prelude::*,
};

use crate::{EngineError, ResultEngine, Transaction, transactions, wallets};

use super::{Engine, with_tx};

impl Engine {
    /// Recomputes the denormalized balance of every wallet from the ledger.
    ///
    /// Repair tool: normal writes already keep balances in sync.
    pub async fn recompute_balances(&self) -> ResultEngine<u64> {
        with_tx!(self, |db_tx| {
            let ids: Vec<String> = wallets::Entity::find()
                .all(&db_tx)
                .await?
                .into_iter()
                .map(|wallet| wallet.id)
                .collect();
            let mut count = 0u64;
            for id in ids {
                let wallet_id = crate::util::parse_uuid(&id, "wallet")?;
                self.recompute_wallet_balance(&db_tx, wallet_id).await?;
                count += 1;
            }
            tracing::info!(wallets = count, "wallet balances recomputed");
            Ok(count)
        })
    }

    /// Recomputes the balance of each wallet, once per distinct id.
    pub(super) async fn recompute_wallet_balances<I>(
        &self,
        db_tx: &DatabaseTransaction,
        wallet_ids: I,
    ) -> ResultEngine<()>
    where
        I: IntoIterator<Item = Uuid>,
    {
        let distinct: BTreeSet<Uuid> = wallet_ids.into_iter().collect();
        for wallet_id in distinct {
            self.recompute_wallet_balance(db_tx, wallet_id).await?;
        }
        Ok(())
    }

    /// Sums every transaction touching `wallet_id` and stores the result.
    async fn recompute_wallet_balance(
        &self,
        db_tx: &DatabaseTransaction,
        wallet_id: Uuid,
    ) -> ResultEngine<i64> {
        let id = wallet_id.to_string();
        let models = transactions::Entity::find()
            .filter(
                Condition::any()
                    .add(transactions::Column::WalletId.eq(id.clone()))
                    .add(transactions::Column::ToWalletId.eq(id.clone())),
            )
            .all(db_tx)
            .await?;

        let mut balance = 0i64;
        for model in models {
            let tx = Transaction::try_from(model)?;
            balance = balance
                .checked_add(tx.wallet_delta(wallet_id))
                .ok_or_else(|| EngineError::InvalidAmount("wallet balance overflow".to_string()))?;
        }

        let active = wallets::ActiveModel {
            id: ActiveValue::Set(id),
            balance_minor: ActiveValue::Set(balance),
            ..Default::default()
        };
        active.update(db_tx).await?;
        tracing::debug!(%wallet_id, balance, "wallet balance recomputed");
        Ok(balance)
    }
}
