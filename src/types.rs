use serde::{Deserialize, Serialize};

/// Staking period offered by the deposit form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Period {
    #[default]
    OneDay,
    SevenDay,
    ThirtyDay,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodTerms {
    pub label: &'static str,
    pub nominal_days: u32,
    pub reward_percent: u32,
    pub duration_days: u32,
}

// The 7 and 30 day plans lock funds for 9 and 40 days, the same numbers as
// their reward percentages. This matches what the backend currently receives;
// confirm with product before changing either value.
const PERIOD_TERMS: [(Period, PeriodTerms); 3] = [
    (
        Period::OneDay,
        PeriodTerms {
            label: "1 day",
            nominal_days: 1,
            reward_percent: 1,
            duration_days: 1,
        },
    ),
    (
        Period::SevenDay,
        PeriodTerms {
            label: "7 day",
            nominal_days: 7,
            reward_percent: 9,
            duration_days: 9,
        },
    ),
    (
        Period::ThirtyDay,
        PeriodTerms {
            label: "30 day",
            nominal_days: 30,
            reward_percent: 40,
            duration_days: 40,
        },
    ),
];

impl Period {
    pub const ALL: [Period; 3] = [Period::OneDay, Period::SevenDay, Period::ThirtyDay];

    pub fn terms(&self) -> PeriodTerms {
        PERIOD_TERMS[self.window_index()].1
    }

    /// Position of this period in the statistics aggregate.
    pub fn window_index(&self) -> usize {
        match self {
            Period::OneDay => 0,
            Period::SevenDay => 1,
            Period::ThirtyDay => 2,
        }
    }

    pub fn label(&self) -> &'static str {
        self.terms().label
    }
}

/// Transfer request handed to the wallet for signing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletTransactionRequest {
    pub valid_until: i64,
    pub messages: Vec<WalletMessage>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalletMessage {
    pub address: String,
    /// Nanotons, as a decimal string.
    pub amount: String,
}

/// What the wallet hands back after the user approves a transfer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalletTransactionResult {
    /// Base64 bag of cells holding the signed external message.
    pub boc: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepositRecord {
    pub header: DepositHeader,
    pub body: DepositBody,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepositHeader {
    pub hash: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepositBody {
    pub user_wallet_address: String,
    pub deposite_date: String,
    pub receiving_date: String,
    pub amount: String,
    pub rewards: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatisticsEntry {
    #[serde(default)]
    pub total: serde_json::Value,
}

pub type StatisticsSnapshot = Vec<StatisticsEntry>;
