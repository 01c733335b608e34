//! Decoding of purchase listing pages.
//!
//! A listing page is a JSON array. Each element is usually a string
//! holding one backslash-escaped JSON record; the escapes have to be
//! expanded before the record itself can be parsed. Plain JSON objects are
//! accepted as well.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use super::entry::{AccountId, BundleId, ProductEntry};
use crate::error::{VaultError, VaultResult};

/// Raw purchase record as served by the listing endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogRecord {
    #[serde(deserialize_with = "required_id")]
    pub id: u64,
    #[serde(rename = "bundle_name")]
    pub name: String,
    /// Account that paid for the bundle.
    #[serde(rename = "user_id", default, deserialize_with = "optional_id")]
    pub purchaser_id: Option<u64>,
    /// Account that received the bundle as a gift.
    #[serde(rename = "gift_taker_id", default, deserialize_with = "optional_id")]
    pub recipient_id: Option<u64>,
}

impl CatalogRecord {
    /// Account whose id must be used for follow-up requests.
    ///
    /// The recipient wins for gifts; a zero id counts as absent.
    pub fn owner(&self) -> Option<AccountId> {
        self.recipient_id
            .filter(|id| *id != 0)
            .or(self.purchaser_id.filter(|id| *id != 0))
            .map(AccountId)
    }

    /// Build the entry, falling back to `session_account` when the record
    /// names no owner.
    pub fn into_entry(self, session_account: AccountId) -> ProductEntry {
        let owner = self.owner().unwrap_or(session_account);
        ProductEntry::new(BundleId(self.id), self.name, owner)
    }
}

/// Decode one listing page into entries.
pub fn decode_page(url: &str, body: &str, session_account: AccountId) -> VaultResult<Vec<ProductEntry>> {
    let items: Vec<Value> = serde_json::from_str(body).map_err(|e| VaultError::Decode {
        url: url.to_string(),
        reason: format!("listing is not a JSON array: {}", e),
    })?;

    items
        .into_iter()
        .map(|item| {
            decode_record(item)
                .map(|record| record.into_entry(session_account))
                .map_err(|reason| VaultError::Decode {
                    url: url.to_string(),
                    reason,
                })
        })
        .collect()
}

fn decode_record(item: Value) -> Result<CatalogRecord, String> {
    match item {
        Value::String(raw) => {
            let unescaped = unescape_record(&raw);
            serde_json::from_str(&unescaped)
                .or_else(|_| serde_json::from_str(&raw))
                .map_err(|e| format!("bad record: {}", e))
        }
        Value::Object(_) => serde_json::from_value(item).map_err(|e| format!("bad record: {}", e)),
        other => Err(format!("unexpected listing element: {}", other)),
    }
}

/// Expand backslash escape sequences in a raw record.
///
/// Handles `\\ \' \" \a \b \f \n \r \t \v`, octal `\ooo`, `\xhh`,
/// `\uXXXX` (joining surrogate pairs) and `\UXXXXXXXX`. Unknown or
/// malformed escapes are kept verbatim.
pub fn unescape_record(raw: &str) -> String {
    let chars: Vec<char> = raw.chars().collect();
    let mut out = String::with_capacity(raw.len());
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if c != '\\' || i + 1 >= chars.len() {
            out.push(c);
            i += 1;
            continue;
        }

        let next = chars[i + 1];
        let simple = match next {
            '\\' => Some('\\'),
            '\'' => Some('\''),
            '"' => Some('"'),
            'a' => Some('\u{07}'),
            'b' => Some('\u{08}'),
            'f' => Some('\u{0C}'),
            'n' => Some('\n'),
            'r' => Some('\r'),
            't' => Some('\t'),
            'v' => Some('\u{0B}'),
            _ => None,
        };
        if let Some(ch) = simple {
            out.push(ch);
            i += 2;
            continue;
        }

        match next {
            // Line continuation
            '\n' => i += 2,
            '0'..='7' => {
                let digits: String = chars[i + 1..]
                    .iter()
                    .take(3)
                    .take_while(|d| d.is_digit(8))
                    .collect();
                let value = u32::from_str_radix(&digits, 8).unwrap_or(0);
                out.push(char::from_u32(value).unwrap_or('\u{FFFD}'));
                i += 1 + digits.len();
            }
            'x' => match hex_at(&chars, i + 2, 2) {
                Some(value) => {
                    out.push(char::from_u32(value).unwrap_or('\u{FFFD}'));
                    i += 4;
                }
                None => {
                    out.push('\\');
                    i += 1;
                }
            },
            'u' => match hex_at(&chars, i + 2, 4) {
                Some(high @ 0xD800..=0xDBFF) => {
                    let low = (chars.get(i + 6) == Some(&'\\') && chars.get(i + 7) == Some(&'u'))
                        .then(|| hex_at(&chars, i + 8, 4))
                        .flatten()
                        .filter(|low| (0xDC00..=0xDFFF).contains(low));
                    match low {
                        Some(low) => {
                            let combined = 0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00);
                            out.push(char::from_u32(combined).unwrap_or('\u{FFFD}'));
                            i += 12;
                        }
                        None => {
                            out.push('\u{FFFD}');
                            i += 6;
                        }
                    }
                }
                Some(value) => {
                    out.push(char::from_u32(value).unwrap_or('\u{FFFD}'));
                    i += 6;
                }
                None => {
                    out.push('\\');
                    i += 1;
                }
            },
            'U' => match hex_at(&chars, i + 2, 8) {
                Some(value) => {
                    out.push(char::from_u32(value).unwrap_or('\u{FFFD}'));
                    i += 10;
                }
                None => {
                    out.push('\\');
                    i += 1;
                }
            },
            _ => {
                out.push('\\');
                i += 1;
            }
        }
    }

    out
}

/// Parse exactly `len` hex digits starting at `start`.
fn hex_at(chars: &[char], start: usize, len: usize) -> Option<u32> {
    let digits = chars.get(start..start + len)?;
    if !digits.iter().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    u32::from_str_radix(&digits.iter().collect::<String>(), 16).ok()
}

fn required_id<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    optional_id(deserializer)?.ok_or_else(|| serde::de::Error::custom("missing id"))
}

/// Ids arrive as numbers, numeric strings or null.
fn optional_id<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        Value::Number(n) => n
            .as_u64()
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid id: {}", n))),
        Value::String(s) if s.trim().is_empty() => Ok(None),
        Value::String(s) => s
            .trim()
            .parse::<u64>()
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("invalid id: {}", s))),
        other => Err(serde::de::Error::custom(format!("invalid id: {}", other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const URL: &str = "https://store/users/1/more_entries?page=0&kind=bundles";

    #[test]
    fn test_unescape_simple_sequences() {
        assert_eq!(unescape_record(r#"{\"a\": 1}"#), r#"{"a": 1}"#);
        assert_eq!(unescape_record(r"Café"), "Café");
        assert_eq!(unescape_record(r"\x41\102"), "AB");
        assert_eq!(unescape_record(r"\ud83c\udfae"), "🎮");
        assert_eq!(unescape_record(r"\U0001F3AE"), "🎮");
    }

    #[test]
    fn test_unescape_keeps_malformed_sequences() {
        assert_eq!(unescape_record(r"\q"), r"\q");
        assert_eq!(unescape_record(r"\u12"), r"\u12");
        assert_eq!(unescape_record("trailing\\"), "trailing\\");
        assert_eq!(unescape_record(r"\ud83c alone"), "\u{FFFD} alone");
    }

    #[test]
    fn test_decode_escaped_string_records() {
        let body = r#"["{\"id\": 5, \"bundle_name\": \"Caf\\u00e9 Bundle\", \"user_id\": 1, \"gift_taker_id\": null}"]"#;
        let entries = decode_page(URL, body, AccountId(1)).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id(), BundleId(5));
        assert_eq!(entries[0].name(), "Café Bundle");
        assert_eq!(entries[0].owner(), AccountId(1));
    }

    #[test]
    fn test_decode_object_records() {
        let body = r#"[{"id": "8", "bundle_name": "Plain", "user_id": 3}]"#;
        let entries = decode_page(URL, body, AccountId(3)).unwrap();
        assert_eq!(entries[0].id(), BundleId(8));
    }

    #[test]
    fn test_gift_recipient_wins() {
        let body = r#"[{"id": 1, "bundle_name": "Gift", "user_id": 7, "gift_taker_id": 42}]"#;
        let entries = decode_page(URL, body, AccountId(7)).unwrap();
        assert_eq!(entries[0].owner(), AccountId(42));
    }

    #[test]
    fn test_zero_recipient_falls_back_to_purchaser() {
        let body = r#"[{"id": 1, "bundle_name": "Own", "user_id": 7, "gift_taker_id": 0}]"#;
        let entries = decode_page(URL, body, AccountId(99)).unwrap();
        assert_eq!(entries[0].owner(), AccountId(7));
    }

    #[test]
    fn test_missing_owner_uses_session_account() {
        let body = r#"[{"id": 1, "bundle_name": "Orphan"}]"#;
        let entries = decode_page(URL, body, AccountId(99)).unwrap();
        assert_eq!(entries[0].owner(), AccountId(99));
    }

    #[test]
    fn test_empty_page() {
        assert!(decode_page(URL, "[]", AccountId(1)).unwrap().is_empty());
        assert!(decode_page(URL, " [ ] ", AccountId(1)).unwrap().is_empty());
    }

    #[test]
    fn test_invalid_page_is_decode_error() {
        let err = decode_page(URL, "<html>", AccountId(1)).unwrap_err();
        assert!(matches!(err, VaultError::Decode { .. }));

        let err = decode_page(URL, r#"[{"bundle_name": "no id"}]"#, AccountId(1)).unwrap_err();
        assert!(matches!(err, VaultError::Decode { .. }));
    }

    proptest! {
        #[test]
        fn prop_text_without_backslash_is_unchanged(s in "[^\\\\]*") {
            prop_assert_eq!(unescape_record(&s), s);
        }

        #[test]
        fn prop_escaped_backslashes_and_quotes_roundtrip(s in "[a-z\\\\\"]{0,32}") {
            let escaped = s.replace('\\', "\\\\").replace('"', "\\\"");
            prop_assert_eq!(unescape_record(&escaped), s);
        }
    }
}
