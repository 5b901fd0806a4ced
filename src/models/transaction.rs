// SPDX-License-Identifier: MIT

//! Transaction records and tracker aggregates.

use serde::{Deserialize, Serialize};

/// Payment method a transaction was settled with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentMethod {
    CashApp,
    Zelle,
    ApplePay,
    PayPal,
    Crypto,
}

impl PaymentMethod {
    /// All methods, in display order.
    pub const ALL: [PaymentMethod; 5] = [
        PaymentMethod::CashApp,
        PaymentMethod::Zelle,
        PaymentMethod::ApplePay,
        PaymentMethod::PayPal,
        PaymentMethod::Crypto,
    ];
}

/// A single recorded transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    pub cost: f64,
    pub paid_to_me: f64,
    pub method: PaymentMethod,
    /// Always `paid_to_me - cost`, computed at creation.
    pub profit: f64,
    /// RFC 3339
    pub timestamp: String,
}

impl Transaction {
    pub fn new(cost: f64, paid_to_me: f64, method: PaymentMethod, now: &str) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            cost,
            paid_to_me,
            method,
            profit: paid_to_me - cost,
            timestamp: now.to_string(),
        }
    }
}

/// Aggregate stats blob, kept consistent with the transaction list on every
/// write.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrackerStats {
    #[serde(default)]
    pub total_profit: f64,
}

/// CashApp settlement fee rate applied at wipe time.
const CASHAPP_FEE_RATE: f64 = 0.025;
/// Fee rate for every other payment method.
const OTHER_FEE_RATE: f64 = 0.03;

/// Audit record of a tracker reset ("wipe"). Append-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WipeLog {
    pub id: String,
    pub timestamp: String,
    pub total_profit: f64,
    pub cashapp_fee: f64,
    pub other_fee: f64,
    pub total_fees: f64,
    pub transaction_count: u32,
}

impl WipeLog {
    /// Snapshot the tracker state being wiped, including the fee split the
    /// operator settles out-of-band (2.5% on CashApp profit, 3% elsewhere).
    pub fn from_transactions(transactions: &[Transaction], total_profit: f64, now: &str) -> Self {
        let cashapp_profit: f64 = transactions
            .iter()
            .filter(|t| t.method == PaymentMethod::CashApp)
            .map(|t| t.profit)
            .sum();
        let other_profit: f64 = transactions
            .iter()
            .filter(|t| t.method != PaymentMethod::CashApp)
            .map(|t| t.profit)
            .sum();

        let cashapp_fee = cashapp_profit * CASHAPP_FEE_RATE;
        let other_fee = other_profit * OTHER_FEE_RATE;

        Self {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: now.to_string(),
            total_profit,
            cashapp_fee,
            other_fee,
            total_fees: cashapp_fee + other_fee,
            transaction_count: transactions.len() as u32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tx(cost: f64, paid: f64, method: PaymentMethod) -> Transaction {
        Transaction::new(cost, paid, method, "2024-01-15T10:00:00Z")
    }

    #[test]
    fn test_profit_is_computed_at_creation() {
        let t = tx(10.0, 35.0, PaymentMethod::Zelle);
        assert_eq!(t.profit, 25.0);
    }

    #[test]
    fn test_wipe_log_fee_split() {
        let transactions = vec![
            tx(0.0, 100.0, PaymentMethod::CashApp), // $100 profit, 2.5% fee
            tx(0.0, 200.0, PaymentMethod::PayPal),  // $200 profit, 3% fee
        ];

        let log = WipeLog::from_transactions(&transactions, 300.0, "2024-01-15T10:00:00Z");

        assert_eq!(log.cashapp_fee, 2.5);
        assert_eq!(log.other_fee, 6.0);
        assert_eq!(log.total_fees, 8.5);
        assert_eq!(log.transaction_count, 2);
        assert_eq!(log.total_profit, 300.0);
    }

    #[test]
    fn test_payment_method_serializes_as_plain_name() {
        let json = serde_json::to_string(&PaymentMethod::ApplePay).unwrap();
        assert_eq!(json, "\"ApplePay\"");
    }
}
