//! Per-model token pricing for cost estimation.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::Usage;

const PER_TOKENS: Decimal = dec!(1000);

/// Input/output rates per 1K tokens. Estimates for user awareness only, not
/// billing reconciliation.
fn rates(model: &str) -> (Decimal, Decimal) {
    match model {
        m if m.starts_with("gpt-4o-mini") => (dec!(0.00015), dec!(0.0006)),
        m if m.starts_with("gpt-4o") => (dec!(0.0025), dec!(0.01)),
        m if m.starts_with("gpt-4") => (dec!(0.03), dec!(0.06)),
        m if m.starts_with("gpt-3.5-turbo") => (dec!(0.0015), dec!(0.002)),
        _ => (dec!(0.001), dec!(0.001)),
    }
}

/// Estimated cost of one call in currency units, computed in exact decimal
/// arithmetic.
pub fn cost_for(model: &str, usage: &Usage) -> Decimal {
    let (input_rate, output_rate) = rates(model);
    Decimal::from(usage.prompt_tokens) * input_rate / PER_TOKENS
        + Decimal::from(usage.completion_tokens) * output_rate / PER_TOKENS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_model_cost() {
        let usage = Usage {
            prompt_tokens: 1000,
            completion_tokens: 500,
        };
        // gpt-3.5-turbo: 1.0 * 0.0015 + 0.5 * 0.002 = 0.0025
        assert_eq!(cost_for("gpt-3.5-turbo", &usage), dec!(0.0025));
    }

    #[test]
    fn test_unknown_model_uses_fallback_rates() {
        let usage = Usage {
            prompt_tokens: 2000,
            completion_tokens: 1000,
        };
        assert_eq!(cost_for("some-local-model", &usage), dec!(0.003));
    }

    #[test]
    fn test_zero_usage_costs_nothing() {
        assert_eq!(cost_for("gpt-4", &Usage::default()), Decimal::ZERO);
    }

    #[test]
    fn test_versioned_model_matches_prefix() {
        let usage = Usage {
            prompt_tokens: 1000,
            completion_tokens: 0,
        };
        assert_eq!(cost_for("gpt-3.5-turbo-0125", &usage), dec!(0.0015));
    }
}
