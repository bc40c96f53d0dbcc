use sea_orm::{QueryFilter, TransactionTrait, prelude::*};

use crate::{Currency, LoanPositions, ResultEngine, loans, positions::aggregate};

use super::{Engine, with_tx};

impl Engine {
    /// Receivable, payable and net position over all loans.
    ///
    /// Amounts in different currencies are never summed together: pass a
    /// `currency` to restrict the aggregate to one of them.
    pub async fn loan_positions(&self, currency: Option<Currency>) -> ResultEngine<LoanPositions> {
        with_tx!(self, |db_tx| {
            let mut query = loans::Entity::find();
            if let Some(currency) = currency {
                query = query.filter(loans::Column::Currency.eq(currency.code()));
            }
            let rows = query.all(&db_tx).await?;
            Ok(aggregate(&rows))
        })
    }
}
