use uuid::Uuid;

use sea_orm::{
    ActiveValue, DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
    sea_query::Expr,
};

use crate::{Currency, EngineError, ResultEngine, Wallet, wallets};

use super::{Engine, normalize_required_text, with_tx};

impl Engine {
    /// Return a wallet snapshot from DB.
    pub async fn wallet(&self, wallet_id: Uuid) -> ResultEngine<Wallet> {
        with_tx!(self, |db_tx| {
            let model = self.require_wallet(&db_tx, wallet_id).await?;
            Wallet::try_from(model)
        })
    }

    /// Lists wallets ordered by name.
    pub async fn list_wallets(&self, include_archived: bool) -> ResultEngine<Vec<Wallet>> {
        with_tx!(self, |db_tx| {
            let mut query = wallets::Entity::find().order_by_asc(wallets::Column::Name);
            if !include_archived {
                query = query.filter(wallets::Column::Archived.eq(false));
            }
            let models = query.all(&db_tx).await?;
            models
                .into_iter()
                .map(Wallet::try_from)
                .collect::<ResultEngine<Vec<_>>>()
        })
    }

    /// Add a new, empty wallet.
    ///
    /// Wallet names are unique case-insensitively.
    pub async fn new_wallet(&self, name: &str, currency: Currency) -> ResultEngine<Wallet> {
        let name = normalize_required_text(name, "name")?;
        with_tx!(self, |db_tx| {
            self.ensure_wallet_name_free(&db_tx, &name, None).await?;

            let wallet = Wallet::new(name, currency);
            wallets::ActiveModel::from(&wallet).insert(&db_tx).await?;
            tracing::info!(wallet_id = %wallet.id, name = %wallet.name, "wallet created");
            Ok(wallet)
        })
    }

    /// Renames an existing wallet.
    pub async fn rename_wallet(&self, wallet_id: Uuid, new_name: &str) -> ResultEngine<()> {
        let new_name = normalize_required_text(new_name, "name")?;
        with_tx!(self, |db_tx| {
            self.require_wallet(&db_tx, wallet_id).await?;
            self.ensure_wallet_name_free(&db_tx, &new_name, Some(wallet_id))
                .await?;

            let active = wallets::ActiveModel {
                id: ActiveValue::Set(wallet_id.to_string()),
                name: ActiveValue::Set(new_name),
                ..Default::default()
            };
            active.update(&db_tx).await?;
            Ok(())
        })
    }

    /// Archives/unarchives an existing wallet.
    ///
    /// Archived wallets keep their history but accept no new transactions.
    pub async fn set_wallet_archived(&self, wallet_id: Uuid, archived: bool) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            self.require_wallet(&db_tx, wallet_id).await?;

            let active = wallets::ActiveModel {
                id: ActiveValue::Set(wallet_id.to_string()),
                archived: ActiveValue::Set(archived),
                ..Default::default()
            };
            active.update(&db_tx).await?;
            Ok(())
        })
    }

    pub(super) async fn require_wallet(
        &self,
        db_tx: &DatabaseTransaction,
        wallet_id: Uuid,
    ) -> ResultEngine<wallets::Model> {
        wallets::Entity::find_by_id(wallet_id.to_string())
            .one(db_tx)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("wallet not exists".to_string()))
    }

    /// Like `require_wallet`, but also rejects archived wallets.
    pub(super) async fn require_open_wallet(
        &self,
        db_tx: &DatabaseTransaction,
        wallet_id: Uuid,
    ) -> ResultEngine<Wallet> {
        let wallet = Wallet::try_from(self.require_wallet(db_tx, wallet_id).await?)?;
        if wallet.archived {
            return Err(EngineError::validation(
                "wallet_id",
                format!("wallet '{}' is archived", wallet.name),
            ));
        }
        Ok(wallet)
    }

    async fn ensure_wallet_name_free(
        &self,
        db_tx: &DatabaseTransaction,
        name: &str,
        except: Option<Uuid>,
    ) -> ResultEngine<()> {
        let mut query = wallets::Entity::find()
            .filter(Expr::cust("LOWER(name)").eq(name.to_lowercase()));
        if let Some(except) = except {
            query = query.filter(wallets::Column::Id.ne(except.to_string()));
        }
        if query.one(db_tx).await?.is_some() {
            return Err(EngineError::ExistingKey(name.to_string()));
        }
        Ok(())
    }
}
