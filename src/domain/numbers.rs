use chrono::{NaiveDate, Utc};
use uuid::Uuid;

/// Generated business identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberKind {
    PaymentReference,
    Receipt,
    Permit,
}

impl NumberKind {
    pub fn prefix(&self) -> &'static str {
        match self {
            NumberKind::PaymentReference => "PAY",
            NumberKind::Receipt => "RCP",
            NumberKind::Permit => "PRM",
        }
    }
}

/// `PREFIX-YYYYMMDD-XXXXXXXX` for today, with eight random upper-case hex digits
pub fn generate(kind: NumberKind) -> String {
    format_number(kind, Utc::now().date_naive(), Uuid::new_v4())
}

pub fn format_number(kind: NumberKind, date: NaiveDate, id: Uuid) -> String {
    let hex = id.simple().to_string();
    format!("{}-{}-{}", kind.prefix(), date.format("%Y%m%d"), hex[..8].to_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic_layout() {
        let id = Uuid::parse_str("a1b2c3d4-0000-4000-8000-000000000000").unwrap();
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        assert_eq!(format_number(NumberKind::Receipt, date, id), "RCP-20240309-A1B2C3D4");
    }

    #[test]
    fn generated_numbers_match_the_pattern() {
        for kind in [NumberKind::PaymentReference, NumberKind::Receipt, NumberKind::Permit] {
            let number = generate(kind);
            let parts: Vec<&str> = number.split('-').collect();
            assert_eq!(parts.len(), 3);
            assert_eq!(parts[0], kind.prefix());
            assert_eq!(parts[1].len(), 8);
            assert!(parts[1].chars().all(|c| c.is_ascii_digit()));
            assert_eq!(parts[2].len(), 8);
            assert!(parts[2].chars().all(|c| c.is_ascii_digit() || ('A'..='F').contains(&c)));
        }
        assert_ne!(generate(NumberKind::Permit), generate(NumberKind::Permit));
    }
}
