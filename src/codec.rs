//! Textual encoding of items for transport through page state.
//!
//! Items are written as JSON objects. Absent fields are always written as
//! `null` and never skipped: the consumer branches on whether `content` or
//! `file` is present, so a dropped key would make the entry unreadable. The
//! decoder holds the other half of that contract and rejects omitted keys.

use serde::{Deserialize, Deserializer};

use crate::items::Item;
use crate::{Error, Result};

/// Serialize an item for the pending-update buffer.
///
/// Items that carry both or neither payload are refused with
/// [`Error::EncodingAmbiguity`].
pub fn encode(item: &Item) -> Result<String> {
    item.kind()?;
    serde_json::to_string(item).map_err(|e| Error::EncodeError(e.to_string()))
}

/// Reconstruct an item from a single encoded entry.
///
/// Entries carrying both or neither payload are refused the same way
/// [`encode`] refuses them.
pub fn decode(entry: &str) -> Result<Item> {
    let item: Item =
        serde_json::from_str(entry).map_err(|e| Error::DecodeError(e.to_string()))?;
    item.kind()?;
    Ok(item)
}

/// Decode every entry of a delimited buffer, in order
pub fn decode_buffer(buffer: &str, delimiter: char) -> Result<Vec<Item>> {
    split_entries(buffer, delimiter)
        .into_iter()
        .map(decode)
        .collect()
}

/// Split a buffer on top-level delimiters.
///
/// Delimiters inside JSON strings, objects or arrays belong to the entry.
/// Empty segments are dropped. An entry with an unbalanced `"`, `{` or `[`
/// swallows everything after it; encoded items never have one.
pub fn split_entries(buffer: &str, delimiter: char) -> Vec<&str> {
    let mut entries = Vec::new();
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    let mut start = 0;

    for (i, c) in buffer.char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' | '[' => depth += 1,
            '}' | ']' => depth = depth.saturating_sub(1),
            c if c == delimiter && depth == 0 => {
                if i > start {
                    entries.push(&buffer[start..i]);
                }
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    if start < buffer.len() {
        entries.push(&buffer[start..]);
    }
    entries
}

/// Deserialize an `Option` that must be present in the input, even if `null`
pub(crate) fn required_nullable<'de, D, T>(
    deserializer: D,
) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer)
}

/// File bytes travel as a standard base64 string
pub(crate) mod base64_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as Base64Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(data: &[u8], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&STANDARD.encode(data))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::items::tests::png_header;
    use crate::items::{build_file_item, build_item, build_text_item, TextPayload};

    #[test]
    fn absent_fields_are_written_as_null() {
        let item = build_text_item(
            "hi",
            12,
            "Arial",
            "#000",
            "#fff",
            false,
            1,
            2,
            None,
            None,
            true,
        );
        let encoded = encode(&item).unwrap();
        assert!(encoded.contains("\"file\":null"));
        assert!(encoded.contains("\"width\":null"));
        assert!(encoded.contains("\"height\":null"));
    }

    #[test]
    fn text_item_round_trips() {
        let item = build_text_item(
            "a, \"quoted\" {text}",
            14,
            "Mono",
            "red",
            "blue",
            true,
            -3,
            9,
            Some(120),
            None,
            false,
        );
        let decoded = decode(&encode(&item).unwrap()).unwrap();
        assert_eq!(decoded, item);
        assert!(decoded.file.is_none());
    }

    #[test]
    fn file_item_round_trips() {
        let item = build_file_item(
            "dot.png",
            "image/png",
            png_header(3, 2),
            4,
            5,
            Some(250),
            Some(80),
            true,
        );
        let encoded = encode(&item).unwrap();
        assert!(encoded.contains("\"content\":null"));
        assert_eq!(decode(&encoded).unwrap(), item);
    }

    #[test]
    fn missing_key_is_not_treated_as_null() {
        let item = build_text_item(
            "x",
            8,
            "Arial",
            "black",
            "white",
            false,
            0,
            0,
            None,
            None,
            true,
        );
        let encoded = encode(&item).unwrap();
        let stripped = encoded.replace("\"file\":null,", "");
        assert_ne!(stripped, encoded);
        assert!(matches!(decode(&stripped), Err(Error::DecodeError(_))));
    }

    #[test]
    fn ambiguous_items_are_refused() {
        let neither = build_item(None, None, 0, 0, None, None, true);
        assert!(matches!(encode(&neither), Err(Error::EncodingAmbiguity(_))));

        let file =
            crate::items::build_file_payload("a.bin", "application/octet-stream", vec![1, 2]);
        let both = build_item(Some(TextPayload::default()), Some(file), 0, 0, None, None, true);
        assert!(matches!(encode(&both), Err(Error::EncodingAmbiguity(_))));
    }

    #[test]
    fn decode_refuses_ambiguous_entries() {
        let neither = concat!(
            r#"{"content":null,"file":null,"#,
            r#""x":0,"y":0,"width":null,"height":null,"movable":true}"#
        );
        assert!(matches!(decode(neither), Err(Error::EncodingAmbiguity(_))));

        let both = format!(
            r#"{{"content":{},"file":{},"x":0,"y":0,"width":null,"height":null,"movable":true}}"#,
            serde_json::to_string(&TextPayload::default()).unwrap(),
            r#"{"name":"a","file_type":"image/png","data":"AQI=","width":1,"height":1}"#
        );
        assert!(matches!(decode(&both), Err(Error::EncodingAmbiguity(_))));
        assert!(matches!(decode_buffer(&both, ','), Err(Error::EncodingAmbiguity(_))));
    }

    #[test]
    fn unbalanced_quote_swallows_the_rest() {
        assert_eq!(split_entries("say \"hi,B", ','), vec!["say \"hi,B"]);
    }

    #[test]
    fn split_skips_nested_and_quoted_delimiters() {
        let buffer = r#"{"a":[1,2]},{"b":"x,y"},,{"c":"\",}"}"#;
        let entries = split_entries(buffer, ',');
        assert_eq!(
            entries,
            vec![r#"{"a":[1,2]}"#, r#"{"b":"x,y"}"#, r#"{"c":"\",}"}"#]
        );
    }

    #[test]
    fn split_plain_tokens() {
        assert_eq!(split_entries("A,B,C", ','), vec!["A", "B", "C"]);
        assert_eq!(split_entries("A,", ','), vec!["A"]);
        assert!(split_entries("", ',').is_empty());
    }

    #[test]
    fn decode_buffer_keeps_order() {
        let first = build_text_item(
            "one",
            8,
            "Arial",
            "black",
            "white",
            false,
            0,
            0,
            None,
            None,
            true,
        );
        let second = build_text_item(
            "two",
            8,
            "Arial",
            "black",
            "white",
            false,
            0,
            0,
            None,
            None,
            true,
        );
        let buffer = format!("{},{}", encode(&first).unwrap(), encode(&second).unwrap());
        let items = decode_buffer(&buffer, ',').unwrap();
        assert_eq!(items, vec![first, second]);
    }
}
