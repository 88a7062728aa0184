use crate::record::{IntOrText, SalaryPeriod};

/// Decides whether an annualized salary is a real figure or a placeholder.
pub trait SalaryFilter {
    fn is_plausible(&self, annual: u64) -> bool;
}

/// Rejects values whose binary form has fewer than `n` set bits.
///
/// Listings tend to carry round sentinel amounts (powers of two and the like)
/// where no salary was given. This can also zero out a legitimate low-entropy
/// figure, so it stays swappable.
#[derive(Debug, Clone, Copy)]
pub struct MinSetBits(pub u32);

impl SalaryFilter for MinSetBits {
    fn is_plausible(&self, annual: u64) -> bool {
        annual.count_ones() >= self.0
    }
}

#[derive(Debug, Clone, Copy)]
pub struct AcceptAll;

impl SalaryFilter for AcceptAll {
    fn is_plausible(&self, _annual: u64) -> bool {
        true
    }
}

pub fn is_numeric(token: &str) -> bool {
    !token.is_empty() && token.chars().all(|c| c.is_ascii_digit())
}

/// Pull a day count out of free text such as "Active 4 days ago" or "30+ days ago".
///
/// The first token that is either all digits or contains a `+` decides the
/// outcome. Text with no such token comes back unchanged.
pub fn parse_relative_duration(text: &str) -> IntOrText {
    for token in text.split_whitespace() {
        if is_numeric(token) {
            if let Ok(n) = token.parse() {
                return IntOrText::Int(n);
            }
            break;
        }
        if token.contains('+') {
            if let Ok(n) = token.trim_end_matches('+').parse() {
                return IntOrText::Int(n);
            }
            break;
        }
    }
    IntOrText::Text(text.to_string())
}

pub fn coerce_numeric_or_string(text: &str) -> IntOrText {
    if is_numeric(text) {
        if let Ok(n) = text.parse() {
            return IntOrText::Int(n);
        }
    }
    IntOrText::Text(text.to_string())
}

/// Convert a (min, max) salary pair to yearly figures.
///
/// Monthly amounts are multiplied by 12; other periods pass through. Negative
/// inputs, overflow and values the filter rejects all become 0.
pub fn annualize_salary(
    min: i64,
    max: i64,
    period: SalaryPeriod,
    filter: &dyn SalaryFilter,
) -> (u64, u64) {
    let factor = match period {
        SalaryPeriod::Monthly => 12,
        _ => 1,
    };
    let annualize = |value: i64| -> u64 {
        let annual = u64::try_from(value)
            .ok()
            .and_then(|v| v.checked_mul(factor))
            .unwrap_or(0);
        if filter.is_plausible(annual) {
            annual
        } else {
            0
        }
    };
    (annualize(min), annualize(max))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_duration_examples() {
        assert_eq!(parse_relative_duration("Active 4 days ago"), IntOrText::Int(4));
        assert_eq!(parse_relative_duration("30+ days ago"), IntOrText::Int(30));
        assert_eq!(
            parse_relative_duration("RECURRING_HIRE"),
            IntOrText::Text("RECURRING_HIRE".into())
        );
    }

    #[test]
    fn relative_duration_first_match_wins() {
        assert_eq!(parse_relative_duration("10+ of 3 days"), IntOrText::Int(10));
        assert_eq!(parse_relative_duration("3 of 10+ days"), IntOrText::Int(3));
        assert_eq!(parse_relative_duration("Just posted"), IntOrText::Text("Just posted".into()));
        // "C++" is the first plus-token and is not a number
        assert_eq!(parse_relative_duration("C++ 5 days"), IntOrText::Text("C++ 5 days".into()));
    }

    #[test]
    fn coerce_examples() {
        assert_eq!(coerce_numeric_or_string("5"), IntOrText::Int(5));
        assert_eq!(
            coerce_numeric_or_string("RECURRING_HIRE"),
            IntOrText::Text("RECURRING_HIRE".into())
        );
        assert_eq!(coerce_numeric_or_string("5 people"), IntOrText::Text("5 people".into()));
        assert_eq!(coerce_numeric_or_string(""), IntOrText::Text(String::new()));
    }

    #[test]
    fn monthly_salary_is_annualized() {
        let filter = MinSetBits(4);
        assert_eq!(
            annualize_salary(1000, 2000, SalaryPeriod::Monthly, &filter),
            (12000, 24000)
        );
        assert_eq!(
            annualize_salary(600000, 900000, SalaryPeriod::Yearly, &filter),
            (600000, 900000)
        );
    }

    #[test]
    fn low_entropy_salary_is_zeroed() {
        let filter = MinSetBits(4);
        assert_eq!(annualize_salary(4096, 100000, SalaryPeriod::Yearly, &filter), (0, 100000));
        // 1024 * 12 = 12288 has two set bits
        assert_eq!(annualize_salary(1024, 1000, SalaryPeriod::Monthly, &filter), (0, 12000));
        assert_eq!(annualize_salary(4096, 0, SalaryPeriod::Yearly, &AcceptAll), (4096, 0));
    }

    #[test]
    fn invalid_salary_is_zeroed() {
        assert_eq!(annualize_salary(-5, i64::MAX, SalaryPeriod::Monthly, &AcceptAll), (0, 0));
    }
}
