// Customer number parsing and normalization
//
// The same canonical form is used for directory lookups, manual campaign lists
// and the identification form, so "e12345 - cb" typed by a customer matches the
// "E12345-CB" entry an admin pasted into a list.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// ASCII digits only: `\d` would also admit other Unicode digit sets
static FORMATS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"^[0-9]+$",
        r"^[0-9]+-[0-9]+$",
        r"^[A-Z][0-9]+-[A-Z]+$",
        r"^\*[0-9]+$",
    ]
    .into_iter()
    .map(|pattern| Regex::new(pattern).expect("static customer number pattern"))
    .collect()
});

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid customer number: '{0}'")]
pub struct InvalidCustomerNumber(pub String);

/// A customer number in canonical form
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(try_from = "String", into = "String")]
#[schema(value_type = String, example = "E12345-CB")]
pub struct CustomerNumber(String);

impl CustomerNumber {
    /// Normalize a raw input and check it against the accepted formats
    ///
    /// Whitespace anywhere is dropped and letters are uppercased before matching.
    pub fn parse(raw: &str) -> Result<Self, InvalidCustomerNumber> {
        let canonical: String = raw
            .chars()
            .filter(|c| !c.is_whitespace())
            .map(|c| c.to_ascii_uppercase())
            .collect();

        if FORMATS.iter().any(|regex| regex.is_match(&canonical)) {
            Ok(Self(canonical))
        } else {
            Err(InvalidCustomerNumber(raw.trim().to_string()))
        }
    }

    /// Prospect number for a freshly allocated sequence value
    pub fn prospect(sequence: i64) -> Self {
        Self(format!("*{}", sequence))
    }

    pub fn is_prospect(&self) -> bool {
        self.0.starts_with('*')
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for CustomerNumber {
    type Error = InvalidCustomerNumber;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<CustomerNumber> for String {
    fn from(number: CustomerNumber) -> Self {
        number.0
    }
}

impl std::fmt::Display for CustomerNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Result of parsing an admin-maintained customer list
#[derive(Debug, Clone, Default)]
pub struct CustomerList {
    numbers: HashSet<CustomerNumber>,
    rejected: Vec<String>,
}

impl CustomerList {
    /// Parse a newline separated list (`,` and `;` are tolerated as separators)
    ///
    /// Blank entries are skipped; entries in no accepted format are kept in `rejected`.
    pub fn parse(text: &str) -> Self {
        let mut list = CustomerList::default();

        for entry in text.split(|c| matches!(c, '\n' | '\r' | ',' | ';')) {
            if entry.trim().is_empty() {
                continue;
            }
            match CustomerNumber::parse(entry) {
                Ok(number) => {
                    list.numbers.insert(number);
                }
                Err(InvalidCustomerNumber(raw)) => list.rejected.push(raw),
            }
        }

        list
    }

    pub fn contains(&self, number: &CustomerNumber) -> bool {
        self.numbers.contains(number)
    }

    pub fn len(&self) -> usize {
        self.numbers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.numbers.is_empty()
    }

    pub fn rejected(&self) -> &[String] {
        &self.rejected
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_accepts_the_four_formats() {
        for raw in ["123456", "123456-12", "E12345-CB", "*12345"] {
            let number = CustomerNumber::parse(raw).unwrap();
            assert_eq!(number.as_str(), raw);
        }
    }

    #[test]
    fn test_normalizes_whitespace_and_case() {
        assert_eq!(CustomerNumber::parse("  123456 ").unwrap().as_str(), "123456");
        assert_eq!(CustomerNumber::parse("e12345-cb").unwrap().as_str(), "E12345-CB");
        assert_eq!(CustomerNumber::parse("123456 - 12").unwrap().as_str(), "123456-12");
        assert_eq!(CustomerNumber::parse("\t* 12345\n").unwrap().as_str(), "*12345");
    }

    #[test]
    fn test_rejects_other_shapes() {
        for raw in ["", "   ", "12a456", "E12345", "EE12345-CB", "123456-", "-12", "**123", "E12345-C1", "12 34-AB", "١٢٣٤٥٦", "１２３４５６", "E١٢٣-CB", "*１２"] {
            assert!(CustomerNumber::parse(raw).is_err(), "'{}' should be rejected", raw);
        }
    }

    #[test]
    fn test_prospect_numbers() {
        let number = CustomerNumber::prospect(100042);
        assert_eq!(number.as_str(), "*100042");
        assert!(number.is_prospect());
        assert!(!CustomerNumber::parse("100042").unwrap().is_prospect());
    }

    #[test]
    fn test_deserialize_validates() {
        let number: CustomerNumber = serde_json::from_str("\" e99999-cb \"").unwrap();
        assert_eq!(number.as_str(), "E99999-CB");
        assert!(serde_json::from_str::<CustomerNumber>("\"not a number\"").is_err());
    }

    #[test]
    fn test_list_parsing_with_mixed_separators() {
        let list = CustomerList::parse("123456\r\nE99999-CB\n\n  *777 ; 55-1, bogus\n");
        assert_eq!(list.len(), 4);
        assert!(list.contains(&CustomerNumber::parse("123456").unwrap()));
        assert!(list.contains(&CustomerNumber::parse("e99999-cb").unwrap()));
        assert!(list.contains(&CustomerNumber::parse("*777").unwrap()));
        assert!(list.contains(&CustomerNumber::parse("55-1").unwrap()));
        assert_eq!(list.rejected(), &["bogus".to_string()]);
    }

    #[test]
    fn test_empty_list() {
        let list = CustomerList::parse("\n \n");
        assert!(list.is_empty());
        assert!(list.rejected().is_empty());
    }

    fn logical_number() -> impl Strategy<Value = String> {
        prop_oneof![
            "[0-9]{1,8}",
            "[0-9]{1,8}-[0-9]{1,3}",
            "[A-Z][0-9]{1,6}-[A-Z]{1,3}",
            "\\*[0-9]{1,6}",
        ]
    }

    proptest! {
        // Normalizing a noisy input matches the list entry of the same logical number
        #[test]
        fn prop_noisy_input_matches_list_entry(
            canonical in logical_number(),
            leading in "[ \t]{0,3}",
            trailing in "[ \t]{0,3}",
            lowercase in any::<bool>(),
        ) {
            let typed = if lowercase { canonical.to_lowercase() } else { canonical.clone() };
            let raw = format!("{}{}{}", leading, typed, trailing);

            let list = CustomerList::parse(&format!("  {}  \n000", canonical));
            let number = CustomerNumber::parse(&raw).unwrap();

            prop_assert_eq!(number.as_str(), canonical.as_str());
            prop_assert!(list.contains(&number));
        }

        // Parsing the canonical form again is a no-op
        #[test]
        fn prop_parse_is_idempotent(canonical in logical_number()) {
            let once = CustomerNumber::parse(&canonical).unwrap();
            let twice = CustomerNumber::parse(once.as_str()).unwrap();
            prop_assert_eq!(once, twice);
        }
    }
}
