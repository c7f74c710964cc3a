use thiserror::Error;

use crate::model::OptionChain;

/// ATM metrics resolved from one expiry's chain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AtmQuote {
    /// Strike closest to spot.
    pub strike: f64,
    /// Average of call/put implied volatility at the ATM strike, in percent.
    pub avg_iv: f64,
    /// call.lastPrice + put.lastPrice at the ATM strike.
    pub straddle: f64,
}

#[derive(Debug, Error)]
pub enum AtmError {
    #[error("option chain has no call strikes")]
    EmptyChain,

    #[error("strike {strike} missing from {side} side of the chain")]
    MissingSide { strike: f64, side: &'static str },
}

/// Find the call strike nearest to spot (first wins on ties) and read
/// the call/put rows at that exact strike.
pub fn resolve(chain: &OptionChain, spot: f64) -> Result<AtmQuote, AtmError> {
    let atm_strike = chain
        .calls
        .iter()
        .map(|row| row.strike)
        .min_by(|a, b| {
            (a - spot)
                .abs()
                .partial_cmp(&(b - spot).abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .ok_or(AtmError::EmptyChain)?;

    let call = chain
        .calls
        .iter()
        .find(|row| row.strike == atm_strike)
        .ok_or(AtmError::MissingSide {
            strike: atm_strike,
            side: "call",
        })?;
    let put = chain
        .puts
        .iter()
        .find(|row| row.strike == atm_strike)
        .ok_or(AtmError::MissingSide {
            strike: atm_strike,
            side: "put",
        })?;

    Ok(AtmQuote {
        strike: atm_strike,
        avg_iv: (call.implied_volatility + put.implied_volatility) / 2.0 * 100.0,
        straddle: call.last_price + put.last_price,
    })
}
