//! Merge policies applied once every provider has settled.
//!
//! Both policies are pure functions of their input. A single successful
//! quote is passed through untouched so that one provider's precision is
//! never altered by rounding.

use std::collections::{BTreeMap, BTreeSet};

use crate::model::{CurrencyRate, RatesResult, SourceQuote, SourceRate, WeatherReading};

/// Decimal places kept for exchange rates.
pub const RATE_DECIMALS: u32 = 5;
/// Decimal places kept for temperatures and wind speeds.
pub const MEASUREMENT_DECIMALS: u32 = 1;

/// Round half away from zero to `decimals` places.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

/// Arithmetic mean, `None` for an empty input.
pub fn mean<I>(values: I) -> Option<f64>
where
    I: IntoIterator<Item = f64>,
{
    let (sum, count) = values.into_iter().fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    (count > 0).then(|| sum / count as f64)
}

/// Most frequent value, counting in first-appearance order.
///
/// On a tie the value reached later in that order wins: the running best is
/// only kept while its count is strictly greater than the challenger's.
pub fn majority_vote<'a, I>(values: I) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut counts: Vec<(&'a str, usize)> = Vec::new();
    for value in values {
        match counts.iter_mut().find(|(seen, _)| *seen == value) {
            Some((_, n)) => *n += 1,
            None => counts.push((value, 1)),
        }
    }

    counts
        .into_iter()
        .reduce(|best, next| if best.1 > next.1 { best } else { next })
        .map(|(value, _)| value)
}

/// Provenance label for a merged reading, e.g. `Aggregated (A, B)`.
pub fn aggregated_label<'a, I>(sources: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    format!("Aggregated ({})", sources.into_iter().collect::<Vec<_>>().join(", "))
}

/// Rate-merge policy: per-currency mean across every quote reporting it.
///
/// Non-finite values are dropped. A source contributes at most once per
/// currency (its first reported value).
pub fn merge_rates(base: &str, quotes: &[SourceQuote]) -> RatesResult {
    let passthrough = quotes.len() == 1;

    let mut by_currency: BTreeMap<&str, Vec<SourceRate>> = BTreeMap::new();
    let mut sources: BTreeSet<&str> = BTreeSet::new();

    for quote in quotes {
        sources.insert(quote.source.as_str());

        for (currency, rate) in &quote.values {
            if !rate.is_finite() {
                continue;
            }
            let entry = by_currency.entry(currency.as_str()).or_default();
            if entry.iter().any(|r| r.source == quote.source) {
                continue;
            }
            entry.push(SourceRate { source: quote.source.clone(), rate: *rate });
        }
    }

    // BTreeMap iteration is ordinal by currency code.
    let exchanges = by_currency
        .into_iter()
        .filter_map(|(currency, rates)| {
            let average = mean(rates.iter().map(|r| r.rate))?;
            let (rates, average_rate) = if passthrough {
                (rates, average)
            } else {
                let rounded = rates
                    .into_iter()
                    .map(|r| SourceRate { rate: round_to(r.rate, RATE_DECIMALS), ..r })
                    .collect();
                (rounded, round_to(average, RATE_DECIMALS))
            };
            Some(CurrencyRate { currency: currency.to_string(), rates, average_rate })
        })
        .collect();

    RatesResult {
        base: base.to_string(),
        exchanges,
        sources: sources.into_iter().map(str::to_string).collect(),
    }
}

/// Scalar+categorical policy for current conditions.
///
/// Returns `None` only for an empty input.
pub fn merge_weather(readings: &[WeatherReading]) -> Option<WeatherReading> {
    let first = readings.first()?;
    if readings.len() == 1 {
        return Some(first.clone());
    }

    let temperature = mean(readings.iter().map(|r| r.temperature))?;
    let humidity = mean(readings.iter().map(|r| f64::from(r.humidity)))?;
    let wind_speed = mean(readings.iter().map(|r| r.wind_speed))?;
    let description = majority_vote(readings.iter().map(|r| r.description.as_str()))?;

    Some(WeatherReading {
        city: first.city.clone(),
        temperature: round_to(temperature, MEASUREMENT_DECIMALS),
        humidity: humidity.round().clamp(0.0, f64::from(u8::MAX)) as u8,
        description: description.to_string(),
        wind_speed: round_to(wind_speed, MEASUREMENT_DECIMALS),
        source: aggregated_label(readings.iter().map(|r| r.source.as_str())),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quote(source: &str, values: &[(&str, f64)]) -> SourceQuote {
        SourceQuote::new(
            source,
            values.iter().map(|(c, r)| (c.to_string(), *r)).collect(),
        )
    }

    fn reading(source: &str, temperature: f64, humidity: u8, description: &str) -> WeatherReading {
        WeatherReading {
            city: "Lisbon".into(),
            temperature,
            humidity,
            description: description.into(),
            wind_speed: 3.0,
            source: source.into(),
        }
    }

    #[test]
    fn round_to_is_half_away_from_zero() {
        assert_eq!(round_to(2.5, 0), 3.0);
        assert_eq!(round_to(-2.5, 0), -3.0);
        assert_eq!(round_to(0.123456, 5), 0.12346);
        assert_eq!(round_to(21.04, 1), 21.0);
    }

    #[test]
    fn mean_of_nothing_is_none() {
        assert_eq!(mean(Vec::<f64>::new()), None);
        assert_eq!(mean(vec![1.0, 2.0, 6.0]), Some(3.0));
    }

    #[test]
    fn two_sources_average_per_currency() {
        let quotes = vec![quote("A", &[("USD", 2.0)]), quote("B", &[("USD", 3.0)])];

        let result = merge_rates("EUR", &quotes);

        assert_eq!(result.base, "EUR");
        assert_eq!(result.exchanges.len(), 1);
        let usd = &result.exchanges[0];
        assert_eq!(usd.average_rate, 2.5);
        assert_eq!(
            usd.rates,
            vec![
                SourceRate { source: "A".into(), rate: 2.0 },
                SourceRate { source: "B".into(), rate: 3.0 }
            ]
        );
    }

    #[test]
    fn single_quote_is_passed_through_unrounded() {
        let quotes = vec![quote("Solo", &[("EUR", 1.1), ("JPY", 151.123456789)])];

        let result = merge_rates("USD", &quotes);

        assert_eq!(result.exchange("EUR").map(|e| e.average_rate), Some(1.1));
        let jpy = result.exchange("JPY").unwrap();
        assert_eq!(jpy.average_rate, 151.123456789);
        assert_eq!(jpy.rates[0].rate, 151.123456789);
        assert_eq!(result.sources, vec!["Solo".to_string()]);
    }

    #[test]
    fn multiple_quotes_round_rates_and_average() {
        let quotes = vec![
            quote("A", &[("JPY", 151.123456)]),
            quote("B", &[("JPY", 151.12345)]),
        ];

        let result = merge_rates("USD", &quotes);
        let jpy = result.exchange("JPY").unwrap();

        assert_eq!(jpy.rates[0].rate, 151.12346);
        assert_eq!(jpy.rates[1].rate, 151.12345);
        assert_eq!(jpy.average_rate, 151.12345);
    }

    #[test]
    fn sparse_union_sorted_by_currency_with_global_sources() {
        let quotes = vec![
            quote("Zeta", &[("JPY", 150.0), ("EUR", 0.9)]),
            quote("Alpha", &[("EUR", 0.92)]),
            quote("Mid", &[("CHF", 0.88)]),
        ];

        let result = merge_rates("USD", &quotes);

        let currencies: Vec<&str> = result.exchanges.iter().map(|e| e.currency.as_str()).collect();
        assert_eq!(currencies, vec!["CHF", "EUR", "JPY"]);
        assert_eq!(result.sources, vec!["Alpha", "Mid", "Zeta"]);

        // Within an entry, first-appearance order of the quote list is kept.
        let eur = result.exchange("EUR").unwrap();
        assert_eq!(eur.source_names(), vec!["Zeta", "Alpha"]);
        assert_eq!(eur.average_rate, 0.91);
        assert_eq!(result.exchange("CHF").unwrap().source_names(), vec!["Mid"]);
    }

    #[test]
    fn duplicate_source_contributes_once_per_currency() {
        let quotes = vec![quote("A", &[("USD", 2.0)]), quote("A", &[("USD", 4.0)])];

        let result = merge_rates("EUR", &quotes);
        let usd = result.exchange("USD").unwrap();

        assert_eq!(usd.rates.len(), 1);
        assert_eq!(usd.average_rate, 2.0);
        assert_eq!(result.sources, vec!["A"]);
    }

    #[test]
    fn merge_is_repeatable_and_numerically_order_independent() {
        let forward = vec![
            quote("A", &[("USD", 1.1), ("GBP", 0.8)]),
            quote("B", &[("USD", 1.3)]),
            quote("C", &[("USD", 1.2), ("GBP", 0.9)]),
        ];
        let mut reversed = forward.clone();
        reversed.reverse();

        let first = merge_rates("EUR", &forward);
        assert_eq!(first, merge_rates("EUR", &forward));

        let other = merge_rates("EUR", &reversed);
        for (a, b) in first.exchanges.iter().zip(&other.exchanges) {
            assert_eq!(a.currency, b.currency);
            assert_eq!(a.average_rate, b.average_rate);
        }
        assert_eq!(first.sources, other.sources);
        assert_eq!(other.exchange("USD").unwrap().source_names(), vec!["C", "B", "A"]);
    }

    #[test]
    fn majority_vote_counts_occurrences() {
        assert_eq!(majority_vote(["Rain", "Sun", "Rain"]), Some("Rain"));
        assert_eq!(majority_vote(["Sun", "Rain", "Rain", "Sun", "Sun"]), Some("Sun"));
        assert_eq!(majority_vote(Vec::<&str>::new()), None);
    }

    #[test]
    fn majority_vote_tie_goes_to_later_value() {
        assert_eq!(majority_vote(["Sunny", "Rain"]), Some("Rain"));
        assert_eq!(majority_vote(["Fog", "Sun", "Sun", "Fog", "Haze"]), Some("Sun"));
    }

    #[test]
    fn weather_means_and_majority() {
        let readings = vec![reading("A", 20.0, 50, "Cloudy"), reading("B", 22.0, 60, "Cloudy")];

        let merged = merge_weather(&readings).unwrap();

        assert_eq!(merged.temperature, 21.0);
        assert_eq!(merged.humidity, 55);
        assert_eq!(merged.description, "Cloudy");
        assert_eq!(merged.wind_speed, 3.0);
        assert_eq!(merged.city, "Lisbon");
        assert_eq!(merged.source, "Aggregated (A, B)");
    }

    #[test]
    fn weather_rounding() {
        let mut a = reading("A", 20.13, 51, "Mist");
        let mut b = reading("B", 20.0, 54, "Mist");
        a.wind_speed = 2.22;
        b.wind_speed = 2.0;

        let merged = merge_weather(&[a, b]).unwrap();

        assert_eq!(merged.temperature, 20.1);
        assert_eq!(merged.humidity, 53);
        assert_eq!(merged.wind_speed, 2.1);
    }

    #[test]
    fn single_weather_reading_is_unchanged() {
        let solo = reading("WeatherAPI", 18.456, 47, "Overcast");

        let merged = merge_weather(std::slice::from_ref(&solo)).unwrap();

        assert_eq!(merged, solo);
    }

    #[test]
    fn empty_weather_input_is_none() {
        assert_eq!(merge_weather(&[]), None);
    }
}
