use crate::{
    aggregate::{RATE_DECIMALS, round_to},
    error::AggregateError,
    model::{ConversionResult, Domain, RatesResult},
};

/// Decimal places kept for converted amounts.
pub const AMOUNT_DECIMALS: u32 = 2;

/// Convert `amount` of `rates.base` into `to` using the merged average rate.
///
/// The rate is always held to [`RATE_DECIMALS`], including when a single
/// provider's quote was passed through unrounded by the merge. `sources` lists
/// only the providers that quoted `to`, which can be a subset of
/// `rates.sources`.
pub fn convert(
    domain: Domain,
    rates: &RatesResult,
    to: &str,
    amount: f64,
) -> Result<ConversionResult, AggregateError> {
    let exchange = rates.exchange(to).ok_or_else(|| AggregateError::ConversionUnavailable {
        domain,
        from: rates.base.clone(),
        to: to.to_string(),
    })?;

    let rate = round_to(exchange.average_rate, RATE_DECIMALS);

    Ok(ConversionResult {
        from: rates.base.clone(),
        to: exchange.currency.clone(),
        amount,
        converted: round_to(amount * rate, AMOUNT_DECIMALS),
        rate,
        sources: exchange.source_names(),
    })
}
