use chrono::NaiveDate;
use intel_core::CongressTrade;
use intel_store::{MetaStore, StoreResult};
use uuid::Uuid;

/// Composite cursor `(transaction_date desc, id desc)` per the rescore
/// pagination contract: the next page is every row strictly before this
/// point in that ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RescoreCursor {
    pub transaction_date: NaiveDate,
    pub id: Uuid,
}

impl RescoreCursor {
    pub fn from_trade(trade: &CongressTrade) -> Self {
        Self {
            transaction_date: trade.transaction_date,
            id: trade.id,
        }
    }
}

/// One page of a rescore run plus the cursor to resume from, if any rows
/// remain.
pub struct RescorePage {
    pub trades: Vec<CongressTrade>,
    pub next_cursor: Option<RescoreCursor>,
}

/// Fetches the next page of trades after `cursor`, ordered by
/// `(transaction_date desc, id desc)`. The store over-fetches `2 *
/// batch_size` rows and filters client-side against the cursor, which is
/// sufficient because the ordering itself is produced server-side and is
/// stable across pages.
pub async fn next_page(
    store: &MetaStore,
    cursor: Option<RescoreCursor>,
    batch_size: i64,
) -> StoreResult<RescorePage> {
    let trades = store
        .trades_after_cursor(cursor.map(|c| (c.transaction_date, c.id)), batch_size)
        .await?;

    let next_cursor = trades.last().map(RescoreCursor::from_trade);

    Ok(RescorePage { trades, next_cursor })
}

#[cfg(test)]
mod tests {
    use super::*;
    use intel_core::{AssetType, Chamber, Owner, TradeType};

    fn trade(date: NaiveDate, id: Uuid) -> CongressTrade {
        CongressTrade {
            id,
            politician_id: Uuid::new_v4(),
            ticker: "MSFT".into(),
            chamber: Chamber::House,
            party: "I".into(),
            state: "NY".into(),
            owner: Owner::SelfOwner,
            transaction_date: date,
            disclosure_date: date,
            trade_type: TradeType::Purchase,
            amount: "$1,001 - $15,000".into(),
            price: None,
            asset_type: AssetType::Stock,
            notes: None,
        }
    }

    #[test]
    fn cursor_from_trade_carries_date_and_id() {
        let id = Uuid::new_v4();
        let date = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let t = trade(date, id);
        let cursor = RescoreCursor::from_trade(&t);
        assert_eq!(cursor.transaction_date, date);
        assert_eq!(cursor.id, id);
    }
}
