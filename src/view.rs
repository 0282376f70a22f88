use crate::abi::{
    Bet,
    Market,
    MarketStatus,
    Side,
    Team,
};
use chrono::DateTime;
use ethers::{
    types::{
        Address,
        U256,
    },
    utils::{
        ParseUnits,
        format_units,
        parse_units,
    },
};
use thiserror::Error;

/// Odds travel on the wire as integer thousandths of decimal odds, so
/// 2500 means odds of 2.50.
pub const ODDS_SCALE: u64 = 1000;
/// Smallest odds the exchange accepts, 1.01.
pub const MIN_ODDS: u64 = 1010;

#[derive(Debug, Error, Eq, PartialEq)]
pub enum ViewError {
    #[error("invalid odds '{0}': expected a decimal number of at least 1.01")]
    InvalidOdds(String),
    #[error("invalid amount '{0}'")]
    InvalidAmount(String),
    #[error("invalid timestamp '{0}': expected YYYY-MM-DD HH:MM or unix seconds")]
    InvalidTimestamp(String),
    #[error("invalid address '{0}'")]
    InvalidAddress(String),
    #[error("{field} value out of range")]
    OutOfRange { field: &'static str },
    #[error("unknown {field} ordinal {value}")]
    UnknownOrdinal { field: &'static str, value: u8 },
}

/// "2500" -> "2.50". A non-zero thousandths digit keeps the third decimal.
pub fn format_odds(odds: U256) -> String {
    if odds.bits() > 128 {
        return odds.to_string();
    }
    let thousandths = odds.as_u128();
    let whole = thousandths / u128::from(ODDS_SCALE);
    let frac = thousandths % u128::from(ODDS_SCALE);
    if frac % 10 == 0 {
        format!("{whole}.{:02}", frac / 10)
    } else {
        format!("{whole}.{frac:03}")
    }
}

/// "2.5" -> 2500. No float arithmetic; the fractional part is read as up
/// to three decimal digits.
pub fn parse_odds(input: &str) -> Result<U256, ViewError> {
    let trimmed = input.trim();
    let invalid = || ViewError::InvalidOdds(trimmed.to_string());
    let (whole_str, frac_str) = match trimmed.split_once('.') {
        Some((w, f)) => (w, f),
        None => (trimmed, ""),
    };
    if whole_str.is_empty() || frac_str.len() > 3 {
        return Err(invalid());
    }
    let whole: u64 = whole_str.parse().map_err(|_| invalid())?;
    let frac: u64 = if frac_str.is_empty() {
        0
    } else {
        let digits: u64 = frac_str.parse().map_err(|_| invalid())?;
        digits * 10u64.pow(3 - frac_str.len() as u32)
    };
    let thousandths = whole
        .checked_mul(ODDS_SCALE)
        .and_then(|w| w.checked_add(frac))
        .ok_or_else(invalid)?;
    if thousandths < MIN_ODDS {
        return Err(invalid());
    }
    Ok(U256::from(thousandths))
}

/// Token smallest units -> decimal string, trailing zeros trimmed.
pub fn format_amount(amount: U256, decimals: u32) -> String {
    let formatted = format_units(amount, decimals).unwrap_or_else(|_| amount.to_string());
    match formatted.split_once('.') {
        Some((whole, frac)) => {
            let frac = frac.trim_end_matches('0');
            if frac.is_empty() {
                whole.to_string()
            } else {
                format!("{whole}.{frac}")
            }
        }
        None => formatted,
    }
}

/// Decimal string -> token smallest units.
pub fn parse_amount(input: &str, decimals: u32) -> Result<U256, ViewError> {
    let trimmed = input.trim();
    let invalid = || ViewError::InvalidAmount(trimmed.to_string());
    match parse_units(trimmed, decimals) {
        Ok(ParseUnits::U256(value)) if !value.is_zero() => Ok(value),
        _ => Err(invalid()),
    }
}

pub fn format_timestamp(unix_seconds: u64) -> String {
    match DateTime::from_timestamp(unix_seconds as i64, 0) {
        Some(moment) => moment.format("%Y-%m-%d %H:%M UTC").to_string(),
        None => format!("@{unix_seconds}"),
    }
}

/// Accepts `YYYY-MM-DD HH:MM` (interpreted as UTC) or raw unix seconds.
pub fn parse_timestamp(input: &str) -> Result<u64, ViewError> {
    let trimmed = input.trim();
    if let Ok(seconds) = trimmed.parse::<u64>() {
        return Ok(seconds);
    }
    let parsed = chrono::NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M")
        .map_err(|_| ViewError::InvalidTimestamp(trimmed.to_string()))?;
    let seconds = parsed.and_utc().timestamp();
    u64::try_from(seconds).map_err(|_| ViewError::InvalidTimestamp(trimmed.to_string()))
}

pub fn parse_address(input: &str) -> Result<Address, ViewError> {
    input
        .trim()
        .parse::<Address>()
        .map_err(|_| ViewError::InvalidAddress(input.trim().to_string()))
}

/// First six and last four characters of the hex form.
pub fn short_address(address: Address) -> String {
    let hex = format!("{address:#x}");
    format!("{}…{}", &hex[..6], &hex[hex.len() - 4..])
}

/// Index fields come back from an untrusted node; anything wider than 32
/// bits cannot index an option list.
fn checked_index(value: U256) -> Option<usize> {
    (value.bits() <= 32).then(|| value.as_u32() as usize)
}

fn checked_seconds(value: U256, field: &'static str) -> Result<u64, ViewError> {
    if value.bits() > 64 {
        return Err(ViewError::OutOfRange { field });
    }
    Ok(value.as_u64())
}

/// Potential payout and liability for an order preview. A back bet wins
/// stake×(odds−1) and risks the stake; a lay bet wins the stake and risks
/// stake×(odds−1).
pub fn payout_preview(side: Side, stake: U256, odds: U256) -> (U256, U256) {
    let scale = U256::from(ODDS_SCALE);
    let profit = stake * odds.saturating_sub(scale) / scale;
    match side {
        Side::Back => (profit, stake),
        Side::Lay => (stake, profit),
    }
}

#[derive(Clone, Debug)]
pub struct TeamView {
    pub id: U256,
    pub name: String,
    pub manager: String,
    pub fan_token: String,
}

impl TeamView {
    pub fn from_record(team: Team) -> Self {
        Self {
            id: team.id,
            name: team.name,
            manager: short_address(team.team_manager),
            fan_token: short_address(team.fan_token),
        }
    }
}

#[derive(Clone, Debug)]
pub struct MarketView {
    pub id: U256,
    pub team_id: U256,
    pub category: String,
    pub question: String,
    pub description: String,
    pub options: Vec<String>,
    pub starts: String,
    pub ends: String,
    pub status: MarketStatus,
    /// The winning option's label, only present once the market resolves.
    pub resolved_outcome: Option<String>,
}

impl MarketView {
    pub fn from_record(market: Market) -> Result<Self, ViewError> {
        let status = MarketStatus::from_ordinal(market.status).ok_or(
            ViewError::UnknownOrdinal {
                field: "market status",
                value: market.status,
            },
        )?;
        let resolved_outcome = match status {
            MarketStatus::Resolved => Some(
                checked_index(market.resolved_outcome_index)
                    .and_then(|index| market.options.get(index).cloned())
                    .unwrap_or_else(|| {
                        format!("option {}", market.resolved_outcome_index)
                    }),
            ),
            _ => None,
        };
        Ok(Self {
            id: market.id,
            team_id: market.team_id,
            category: market.category,
            question: market.question,
            description: market.description,
            options: market.options,
            starts: format_timestamp(checked_seconds(market.start_time, "market start time")?),
            ends: format_timestamp(checked_seconds(market.end_time, "market end time")?),
            status,
            resolved_outcome,
        })
    }

    pub fn status_label(&self) -> &'static str {
        self.status.label()
    }
}

#[derive(Clone, Debug)]
pub struct BetView {
    pub id: U256,
    pub market_id: U256,
    pub outcome: String,
    pub side: Side,
    pub amount: String,
    pub odds: String,
    pub potential_payout: String,
    pub liability: String,
    pub market_status: MarketStatus,
}

impl BetView {
    pub fn from_record(
        bet: Bet,
        options: &[String],
        market_status: MarketStatus,
        decimals: u32,
    ) -> Result<Self, ViewError> {
        let side = Side::from_ordinal(bet.order_type).ok_or(ViewError::UnknownOrdinal {
            field: "order side",
            value: bet.order_type,
        })?;
        let outcome = checked_index(bet.outcome_index)
            .and_then(|index| options.get(index).cloned())
            .unwrap_or_else(|| format!("option {}", bet.outcome_index));
        let (payout, liability) = payout_preview(side, bet.amount, bet.odds);
        Ok(Self {
            id: bet.id,
            market_id: bet.market_id,
            outcome,
            side,
            amount: format_amount(bet.amount, decimals),
            odds: format_odds(bet.odds),
            potential_payout: format_amount(payout, decimals),
            liability: format_amount(liability, decimals),
            market_status,
        })
    }

    /// Per-bet lifecycle badge. The contract exposes no per-order match
    /// state, so the badge follows the market: orders on a resolved market
    /// are settled one way or the other.
    pub fn status_badge(&self) -> &'static str {
        match self.market_status {
            MarketStatus::Open => "Open",
            MarketStatus::Closed => "Closed",
            MarketStatus::Resolved => "Settled",
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]
    use super::*;
    use proptest::prelude::*;

    fn market_fixture() -> Market {
        Market {
            id: U256::from(7),
            team_id: U256::from(1),
            team_manager: Address::repeat_byte(0xAB),
            fan_token: Address::repeat_byte(0xCD),
            category: "Football".to_string(),
            question: "Who wins?".to_string(),
            description: "desc".to_string(),
            options: vec!["A".to_string(), "B".to_string()],
            start_time: U256::from(1_700_000_000u64),
            end_time: U256::from(1_700_100_000u64),
            status: 0,
            resolved_outcome_index: U256::zero(),
        }
    }

    #[test]
    fn format_odds__two_decimals_for_round_values() {
        assert_eq!(format_odds(U256::from(2500u64)), "2.50");
        assert_eq!(format_odds(U256::from(1010u64)), "1.01");
        assert_eq!(format_odds(U256::from(10_000u64)), "10.00");
    }

    #[test]
    fn format_odds__keeps_third_decimal_when_set() {
        assert_eq!(format_odds(U256::from(1015u64)), "1.015");
    }

    #[test]
    fn parse_odds__accepts_plain_and_fractional_input() {
        assert_eq!(parse_odds("2.50").unwrap(), U256::from(2500u64));
        assert_eq!(parse_odds("2.5").unwrap(), U256::from(2500u64));
        assert_eq!(parse_odds("3").unwrap(), U256::from(3000u64));
        assert_eq!(parse_odds(" 1.015 ").unwrap(), U256::from(1015u64));
    }

    #[test]
    fn parse_odds__rejects_below_minimum_and_garbage() {
        assert!(parse_odds("1.00").is_err());
        assert!(parse_odds("0.5").is_err());
        assert!(parse_odds("two").is_err());
        assert!(parse_odds("2.5000").is_err());
        assert!(parse_odds("").is_err());
    }

    #[test]
    fn format_amount__trims_trailing_zeros() {
        let one_and_a_half = U256::from(1_500_000_000_000_000_000u64);
        assert_eq!(format_amount(one_and_a_half, 18), "1.5");
        assert_eq!(format_amount(U256::from(2u64) * U256::exp10(18), 18), "2");
    }

    #[test]
    fn parse_amount__rejects_zero_and_garbage() {
        assert!(parse_amount("0", 18).is_err());
        assert!(parse_amount("lots", 18).is_err());
    }

    #[test]
    fn format_timestamp__renders_utc_minutes() {
        assert_eq!(format_timestamp(1_700_000_000), "2023-11-14 22:13 UTC");
    }

    #[test]
    fn parse_timestamp__accepts_both_forms() {
        assert_eq!(parse_timestamp("1700000000").unwrap(), 1_700_000_000);
        assert_eq!(
            parse_timestamp("2023-11-14 22:13").unwrap(),
            1_700_000_000 - 1_700_000_000 % 60
        );
    }

    #[test]
    fn short_address__first_six_last_four() {
        let address = Address::repeat_byte(0xAB);
        assert_eq!(short_address(address), "0xabab…abab");
    }

    #[test]
    fn market_view__resolved_renders_winning_option_label() {
        // given
        let mut market = market_fixture();
        market.status = 2;
        market.resolved_outcome_index = U256::from(1);

        // when
        let view = MarketView::from_record(market).unwrap();

        // then
        assert_eq!(view.status_label(), "Resolved");
        assert_eq!(view.resolved_outcome.as_deref(), Some("B"));
    }

    #[test]
    fn market_view__open_market_has_no_outcome() {
        // given
        let market = market_fixture();

        // when
        let view = MarketView::from_record(market).unwrap();

        // then
        assert_eq!(view.status_label(), "Open");
        assert_eq!(view.resolved_outcome, None);
        assert_eq!(view.starts, "2023-11-14 22:13 UTC");
    }

    #[test]
    fn market_view__unknown_status_ordinal_is_an_error() {
        // given
        let mut market = market_fixture();
        market.status = 9;

        // when
        let result = MarketView::from_record(market);

        // then
        assert_eq!(
            result.unwrap_err(),
            ViewError::UnknownOrdinal {
                field: "market status",
                value: 9
            }
        );
    }

    #[test]
    fn market_view__oversized_timestamp_is_an_error() {
        // given
        let mut market = market_fixture();
        market.start_time = U256::MAX;

        // when
        let result = MarketView::from_record(market);

        // then
        assert_eq!(
            result.unwrap_err(),
            ViewError::OutOfRange {
                field: "market start time"
            }
        );
    }

    #[test]
    fn market_view__oversized_resolved_index_falls_back_to_label() {
        // given
        let mut market = market_fixture();
        market.status = 2;
        market.resolved_outcome_index = U256::MAX;

        // when
        let view = MarketView::from_record(market).unwrap();

        // then
        assert_eq!(
            view.resolved_outcome,
            Some(format!("option {}", U256::MAX))
        );
    }

    #[test]
    fn payout_preview__back_and_lay_mirror_each_other() {
        // given
        let stake = U256::from(100u64);
        let odds = U256::from(2500u64);

        // when
        let (back_payout, back_liability) = payout_preview(Side::Back, stake, odds);
        let (lay_payout, lay_liability) = payout_preview(Side::Lay, stake, odds);

        // then
        assert_eq!(back_payout, U256::from(150u64));
        assert_eq!(back_liability, stake);
        assert_eq!(lay_payout, stake);
        assert_eq!(lay_liability, U256::from(150u64));
    }

    #[test]
    fn bet_view__labels_side_and_outcome() {
        // given
        let bet = Bet {
            id: U256::from(3),
            market_id: U256::from(7),
            user: Address::repeat_byte(0x11),
            outcome_index: U256::zero(),
            amount: U256::from(5u64) * U256::exp10(18),
            odds: U256::from(2000u64),
            order_type: 1,
        };
        let options = vec!["A".to_string(), "B".to_string()];

        // when
        let view = BetView::from_record(bet, &options, MarketStatus::Open, 18).unwrap();

        // then
        assert_eq!(view.side, Side::Lay);
        assert_eq!(view.outcome, "A");
        assert_eq!(view.amount, "5");
        assert_eq!(view.odds, "2.00");
        assert_eq!(view.potential_payout, "5");
        assert_eq!(view.liability, "5");
        assert_eq!(view.status_badge(), "Open");
    }

    #[test]
    fn bet_view__resolved_market_badges_bet_as_settled() {
        // given
        let bet = Bet {
            id: U256::from(3),
            market_id: U256::from(7),
            user: Address::repeat_byte(0x11),
            outcome_index: U256::zero(),
            amount: U256::from(100u64),
            odds: U256::from(2500u64),
            order_type: 0,
        };
        let options = vec!["A".to_string(), "B".to_string()];

        // when
        let view = BetView::from_record(bet, &options, MarketStatus::Resolved, 18).unwrap();

        // then
        assert_eq!(view.status_badge(), "Settled");
    }

    #[test]
    fn bet_view__oversized_outcome_index_falls_back_to_label() {
        // given
        let bet = Bet {
            id: U256::from(3),
            market_id: U256::from(7),
            user: Address::repeat_byte(0x11),
            outcome_index: U256::MAX,
            amount: U256::from(100u64),
            odds: U256::from(2500u64),
            order_type: 0,
        };
        let options = vec!["A".to_string(), "B".to_string()];

        // when
        let view = BetView::from_record(bet, &options, MarketStatus::Open, 18).unwrap();

        // then
        assert_eq!(view.outcome, format!("option {}", U256::MAX));
    }

    proptest! {
        #[test]
        fn odds_format_parse_agree(thousandths in MIN_ODDS..10_000_000u64) {
            let formatted = format_odds(U256::from(thousandths));
            let parsed = parse_odds(&formatted).unwrap();
            prop_assert_eq!(parsed, U256::from(thousandths));
        }

        #[test]
        fn amount_format_parse_agree(units in 1u64..u64::MAX) {
            let amount = U256::from(units);
            let formatted = format_amount(amount, 18);
            let parsed = parse_amount(&formatted, 18).unwrap();
            prop_assert_eq!(parsed, amount);
        }

        #[test]
        fn status_ordinals_total_below_three(ordinal in 0u8..=2) {
            prop_assert!(MarketStatus::from_ordinal(ordinal).is_some());
            prop_assert_eq!(MarketStatus::from_ordinal(ordinal).unwrap().ordinal(), ordinal);
        }
    }
}
