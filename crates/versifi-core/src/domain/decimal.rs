//! 소수 문자열 필드를 위한 serde 보조 함수.
//!
//! 서버는 값이 없는 소수 필드를 생략하거나 빈 문자열로 보냅니다.
//! 두 경우 모두 `None`으로 취급합니다.

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum DecimalRepr {
    Text(String),
    Number(Decimal),
}

/// `Option<Decimal>` 필드 역직렬화 (`""`, `null` → `None`).
pub(crate) fn optional<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<DecimalRepr>::deserialize(deserializer)? {
        None => Ok(None),
        Some(DecimalRepr::Number(value)) => Ok(Some(value)),
        Some(DecimalRepr::Text(text)) if text.trim().is_empty() => Ok(None),
        Some(DecimalRepr::Text(text)) => text
            .trim()
            .parse()
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Probe {
        #[serde(default, deserialize_with = "super::optional")]
        value: Option<rust_decimal::Decimal>,
    }

    #[test]
    fn test_optional_decimal_variants() {
        let parse = |json: &str| serde_json::from_str::<Probe>(json).unwrap().value;

        assert_eq!(parse(r#"{"value":"42.5"}"#), Some(dec!(42.5)));
        assert_eq!(parse(r#"{"value":""}"#), None);
        assert_eq!(parse(r#"{"value":null}"#), None);
        assert_eq!(parse(r#"{}"#), None);
        assert!(serde_json::from_str::<Probe>(r#"{"value":"abc"}"#).is_err());
    }
}
