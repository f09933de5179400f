//! Whether a transaction earned or spent money.

use std::{fmt::Display, str::FromStr};

use rusqlite::{
    ToSql,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};

use crate::Error;

/// The polarity of a transaction.
///
/// Amounts are stored as positive numbers, the kind decides whether an
/// amount adds to or subtracts from the balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    /// Money that was earned.
    Income,
    /// Money that was spent.
    Expense,
}

impl Kind {
    /// The text stored in the database for this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Kind::Income => "income",
            Kind::Expense => "expense",
        }
    }

    /// `amount` with the sign it has on the balance: positive for income,
    /// negative for expenses.
    pub fn signed(&self, amount: f64) -> f64 {
        match self {
            Kind::Income => amount,
            Kind::Expense => -amount,
        }
    }
}

impl Display for Kind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Kind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "income" => Ok(Kind::Income),
            "expense" => Ok(Kind::Expense),
            _ => Err(Error::InvalidKind(s.to_owned())),
        }
    }
}

impl ToSql for Kind {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for Kind {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error| FromSqlError::Other(Box::new(error)))
    }
}

#[cfg(test)]
mod tests {
    use crate::Error;

    use super::Kind;

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("income".parse(), Ok(Kind::Income));
        assert_eq!("Expense".parse(), Ok(Kind::Expense));
        assert_eq!(" INCOME ".parse(), Ok(Kind::Income));
    }

    #[test]
    fn rejects_unknown_kind() {
        assert_eq!(
            "transfer".parse::<Kind>(),
            Err(Error::InvalidKind("transfer".to_owned()))
        );
    }

    #[test]
    fn signs_amount() {
        assert_eq!(Kind::Income.signed(12.5), 12.5);
        assert_eq!(Kind::Expense.signed(12.5), -12.5);
    }
}
