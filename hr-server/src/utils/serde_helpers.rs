//! Request body serde helpers
//!
//! Email fields are trimmed and lower-cased while deserializing, so the
//! `email` validator and the store lookups see the same value.

use serde::{Deserialize, Deserializer};
use shared::util::normalize_email;

/// Deserialize an email address, normalized
pub fn email<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    String::deserialize(deserializer).map(|s| normalize_email(&s))
}

/// Deserialize an optional email address, normalized
pub fn opt_email<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(|opt| opt.map(|s| normalize_email(&s)))
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Body {
        #[serde(deserialize_with = "super::email")]
        email: String,
        #[serde(default, deserialize_with = "super::opt_email")]
        backup: Option<String>,
    }

    #[test]
    fn test_email_is_trimmed_and_lowercased() {
        let body: Body =
            serde_json::from_str(r#"{"email":"  Jane.Doe@Example.COM ","backup":" B@X.io"}"#)
                .unwrap();
        assert_eq!(body.email, "jane.doe@example.com");
        assert_eq!(body.backup.as_deref(), Some("b@x.io"));
    }

    #[test]
    fn test_missing_optional_email() {
        let body: Body = serde_json::from_str(r#"{"email":"a@b.co"}"#).unwrap();
        assert_eq!(body.backup, None);

        let body: Body = serde_json::from_str(r#"{"email":"a@b.co","backup":null}"#).unwrap();
        assert_eq!(body.backup, None);
    }
}
