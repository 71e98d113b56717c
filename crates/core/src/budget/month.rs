//! Calendar months as stored on budget entries.

use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// A calendar month, stored by its Portuguese name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(try_from = "MonthInput")]
pub enum Month {
    /// January.
    Janeiro = 1,
    /// February.
    Fevereiro,
    /// March.
    Marco,
    /// April.
    Abril,
    /// May.
    Maio,
    /// June.
    Junho,
    /// July.
    Julho,
    /// August.
    Agosto,
    /// September.
    Setembro,
    /// October.
    Outubro,
    /// November.
    Novembro,
    /// December.
    Dezembro,
}

impl Month {
    /// All months in calendar order.
    pub const ALL: [Self; 12] = [
        Self::Janeiro,
        Self::Fevereiro,
        Self::Marco,
        Self::Abril,
        Self::Maio,
        Self::Junho,
        Self::Julho,
        Self::Agosto,
        Self::Setembro,
        Self::Outubro,
        Self::Novembro,
        Self::Dezembro,
    ];

    /// Returns the stored name of the month.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Janeiro => "Janeiro",
            Self::Fevereiro => "Fevereiro",
            Self::Marco => "Março",
            Self::Abril => "Abril",
            Self::Maio => "Maio",
            Self::Junho => "Junho",
            Self::Julho => "Julho",
            Self::Agosto => "Agosto",
            Self::Setembro => "Setembro",
            Self::Outubro => "Outubro",
            Self::Novembro => "Novembro",
            Self::Dezembro => "Dezembro",
        }
    }

    /// Returns the month number (1 = January).
    #[must_use]
    pub const fn number(self) -> u32 {
        self as u32
    }

    /// Returns the month with the given number, if it is in `1..=12`.
    #[must_use]
    pub fn from_number(number: u32) -> Option<Self> {
        let index = usize::try_from(number.checked_sub(1)?).ok()?;
        Self::ALL.get(index).copied()
    }

    /// Looks a month up by name, ignoring case and the cedilla in "Março".
    pub fn from_name(name: &str) -> Option<Self> {
        let wanted = name.trim().to_lowercase().replace('ç', "c");
        Self::ALL
            .into_iter()
            .find(|m| m.name().to_lowercase().replace('ç', "c") == wanted)
    }

    /// Parses either a month name or a month number.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().parse::<u32>() {
            Ok(number) => Self::from_number(number),
            Err(_) => Self::from_name(value),
        }
    }

    /// Returns the following month and the year it falls in, `None` past `i32::MAX`.
    #[must_use]
    pub fn next(self, year: i32) -> Option<(Self, i32)> {
        match self {
            Self::Dezembro => year.checked_add(1).map(|y| (Self::Janeiro, y)),
            other => Some((Self::ALL[other.number() as usize], year)),
        }
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for Month {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

/// Month as accepted on the wire: `"Março"`, `"3"` or `3`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum MonthInput {
    /// Month number.
    Number(u32),
    /// Month name or number as text.
    Text(String),
}

impl TryFrom<MonthInput> for Month {
    type Error = String;

    fn try_from(value: MonthInput) -> Result<Self, Self::Error> {
        match value {
            MonthInput::Number(n) => Self::from_number(n).ok_or_else(|| format!("Mês inválido: {n}")),
            MonthInput::Text(s) => Self::parse(&s).ok_or_else(|| format!("Mês inválido: {s}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("Janeiro", Month::Janeiro)]
    #[case("março", Month::Marco)]
    #[case("Marco", Month::Marco)]
    #[case(" DEZEMBRO ", Month::Dezembro)]
    #[case("7", Month::Julho)]
    fn test_parse(#[case] input: &str, #[case] expected: Month) {
        assert_eq!(Month::parse(input), Some(expected));
    }

    #[rstest]
    #[case("0")]
    #[case("13")]
    #[case("Smarch")]
    #[case("")]
    fn test_parse_rejects(#[case] input: &str) {
        assert_eq!(Month::parse(input), None);
    }

    #[test]
    fn test_next_wraps_year() {
        assert_eq!(Month::Dezembro.next(2024), Some((Month::Janeiro, 2025)));
        assert_eq!(Month::Janeiro.next(2024), Some((Month::Fevereiro, 2024)));
    }

    #[test]
    fn test_next_past_last_year_is_none() {
        assert_eq!(Month::Dezembro.next(i32::MAX), None);
        assert_eq!(Month::Novembro.next(i32::MAX), Some((Month::Dezembro, i32::MAX)));
    }

    #[test]
    fn test_serde_accepts_name_and_number() {
        let a: Month = serde_json::from_str("\"Março\"").unwrap();
        let b: Month = serde_json::from_str("3").unwrap();
        assert_eq!(a, b);
        assert_eq!(serde_json::to_string(&a).unwrap(), "\"Março\"");
        assert!(serde_json::from_str::<Month>("13").is_err());
    }
}
