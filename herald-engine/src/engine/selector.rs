//! Equality selectors over message headers.
//!
//! Grammar: `KEY = 'text'` or `KEY = 123`, terms joined by `AND`. An empty
//! selector matches every message. A message lacking a selected header
//! never matches.

use herald_protocol::{PropertySet, Value};

use super::error::BrokerError;

#[derive(Debug, Clone, PartialEq)]
enum Expected {
    Text(String),
    Integer(i64),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Selector {
    terms: Vec<(String, Expected)>,
}

impl Selector {
    pub fn parse(selector: &str) -> Result<Self, BrokerError> {
        let invalid = |reason: &str| BrokerError::InvalidSelector {
            selector: selector.to_string(),
            reason: reason.to_string(),
        };

        if selector.trim().is_empty() {
            return Ok(Self::default());
        }

        let mut terms = Vec::new();
        for term in selector.split(" AND ") {
            let (key, expected) = term
                .split_once('=')
                .ok_or_else(|| invalid("term has no '='"))?;
            let key = key.trim();
            if key.is_empty() || !key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                return Err(invalid("header name must be alphanumeric"));
            }

            let expected = expected.trim();
            let expected = if let Some(text) = expected
                .strip_prefix('\'')
                .and_then(|rest| rest.strip_suffix('\''))
            {
                Expected::Text(text.to_string())
            } else {
                expected
                    .parse()
                    .map(Expected::Integer)
                    .map_err(|_| invalid("value must be quoted text or an integer"))?
            };
            terms.push((key.to_string(), expected));
        }
        Ok(Self { terms })
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn matches(&self, headers: &PropertySet) -> bool {
        self.terms
            .iter()
            .all(|(key, expected)| match (headers.get(key), expected) {
                (Some(Value::String(actual)), Expected::Text(text)) => actual == text,
                (Some(value), Expected::Integer(n)) => value.as_i64() == Some(*n),
                _ => false,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn headers() -> PropertySet {
        let mut ps = PropertySet::new();
        ps.set("STATUS", "done");
        ps.set("STAGEID", 3);
        ps.set("ORIGINATORID", 77_i64);
        ps
    }

    #[test]
    fn empty_selector_matches_everything() {
        assert!(Selector::parse("").unwrap().matches(&headers()));
        assert!(Selector::parse("  ").unwrap().matches(&PropertySet::new()));
    }

    #[test]
    fn text_and_integer_terms() {
        let selector = Selector::parse("STATUS = 'done' AND STAGEID = 3").unwrap();
        assert!(selector.matches(&headers()));
        assert!(Selector::parse("ORIGINATORID=77").unwrap().matches(&headers()));
        assert!(!Selector::parse("STATUS = 'failed'").unwrap().matches(&headers()));
        assert!(!Selector::parse("STAGEID = '3'").unwrap().matches(&headers()));
        assert!(!Selector::parse("MISSING = 1").unwrap().matches(&headers()));
    }

    #[test]
    fn quoted_text_may_contain_spaces_and_equals() {
        let mut ps = PropertySet::new();
        ps.set("MESSAGE", "a = b");
        assert!(Selector::parse("MESSAGE = 'a = b'").unwrap().matches(&ps));
    }

    #[test]
    fn malformed_selectors_are_rejected() {
        for bad in ["STATUS", "= 'x'", "STATUS = done", "ST-ATUS = 1"] {
            assert!(
                matches!(Selector::parse(bad), Err(BrokerError::InvalidSelector { .. })),
                "{bad} should be rejected"
            );
        }
    }

    proptest! {
        #[test]
        fn selects_exactly_the_matching_value(
            wanted in "[a-z0-9 ]{0,12}",
            actual in "[a-z0-9 ]{0,12}",
            id in any::<i64>(),
        ) {
            let mut ps = PropertySet::new();
            ps.set("STATUS", actual.as_str());
            ps.set("ORIGINATORID", id);

            let by_text = Selector::parse(&format!("STATUS = '{wanted}'")).unwrap();
            prop_assert_eq!(by_text.matches(&ps), wanted == actual);
            let by_id = Selector::parse(&format!("ORIGINATORID = {id}")).unwrap();
            prop_assert!(by_id.matches(&ps));
        }
    }
}
