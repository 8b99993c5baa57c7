//! Serde deserializer projecting a [`Value`] tree onto typed records.
//!
//! Scalars arrive as strings and are parsed to the width the target field
//! asks for. A single-element array stands in for its element and a scalar
//! stands in for a single-element sequence, so `--tag a` and `--tag a,b` both
//! decode into `Vec<String>`.
//!
//! Shape errors follow the serde contract: a wrong container shape is a
//! [`OptionsError::TypeMismatch`], a missing struct field is an
//! [`OptionsError::KeyNotFound`] and an empty value where a scalar is required
//! is an [`OptionsError::ValueNotFound`]. Errors carry the key path they were
//! raised under.

use std::collections::btree_map;
use std::vec;

use serde::de::{
    self, DeserializeOwned, DeserializeSeed, EnumAccess, IntoDeserializer, MapAccess, SeqAccess,
    VariantAccess, Visitor,
};

use crate::error::{OptionsError, Result};
use crate::value::Value;

/// Decodes a value tree into `T`.
///
/// # Example
///
/// ```
/// use commandant_options::{from_value, ObjectFormat};
/// use std::collections::BTreeMap;
///
/// let value = ObjectFormat::default().parse("a=1,b=2").unwrap();
/// let map: BTreeMap<String, u32> = from_value(value).unwrap();
/// assert_eq!(map["b"], 2);
/// ```
pub fn from_value<T: DeserializeOwned>(value: Value) -> Result<T> {
    T::deserialize(ValueDeserializer::new(value))
}

/// Deserializer over an owned [`Value`].
#[derive(Debug, Clone)]
pub struct ValueDeserializer {
    value: Value,
}

impl ValueDeserializer {
    pub fn new(value: Value) -> Self {
        Self { value }
    }

    /// The textual scalar behind the value.
    fn text(self, expected: &str) -> Result<String> {
        match unwrap_single(self.value) {
            Value::Str(s) => Ok(s),
            Value::Array(items) if items.is_empty() => Err(OptionsError::ValueNotFound {
                path: String::new(),
                expected: expected.to_string(),
            }),
            other => Err(mismatch(expected, &other)),
        }
    }

    fn parse<N: std::str::FromStr>(self, expected: &str) -> Result<N> {
        let text = self.text(expected)?;
        text.parse().map_err(|_| mismatch(expected, &Value::Str(text)))
    }
}

fn key_deserializer(key: String) -> de::value::StringDeserializer<OptionsError> {
    key.into_deserializer()
}

fn unwrap_single(value: Value) -> Value {
    match value {
        Value::Array(mut items) if items.len() == 1 => items.remove(0),
        other => other,
    }
}

fn mismatch(expected: &str, found: &Value) -> OptionsError {
    let found = match found {
        Value::Str(s) => format!("string \"{}\"", s),
        other => format!("{} `{}`", other.kind(), other),
    };
    OptionsError::TypeMismatch {
        path: String::new(),
        expected: expected.to_string(),
        found,
    }
}

macro_rules! deserialize_number {
    ($($method:ident => $visit:ident: $ty:ty),* $(,)?) => {
        $(
            fn $method<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
                visitor.$visit(self.parse::<$ty>(stringify!($ty))?)
            }
        )*
    };
}

impl<'de> de::Deserializer<'de> for ValueDeserializer {
    type Error = OptionsError;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self.value {
            Value::Dict(dict) => visitor.visit_map(DictAccess::new(dict)),
            Value::Array(items) => visitor.visit_seq(ArrayAccess::new(items)),
            Value::Str(s) => visitor.visit_string(s),
            Value::Bool(b) => visitor.visit_bool(b),
        }
    }

    fn deserialize_bool<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match unwrap_single(self.value) {
            Value::Bool(b) => visitor.visit_bool(b),
            Value::Str(s) if s == "true" => visitor.visit_bool(true),
            Value::Str(s) if s == "false" => visitor.visit_bool(false),
            other => Err(mismatch("bool", &other)),
        }
    }

    deserialize_number! {
        deserialize_i8 => visit_i8: i8,
        deserialize_i16 => visit_i16: i16,
        deserialize_i32 => visit_i32: i32,
        deserialize_i64 => visit_i64: i64,
        deserialize_u8 => visit_u8: u8,
        deserialize_u16 => visit_u16: u16,
        deserialize_u32 => visit_u32: u32,
        deserialize_u64 => visit_u64: u64,
        deserialize_f32 => visit_f32: f32,
        deserialize_f64 => visit_f64: f64,
    }

    fn deserialize_char<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        let text = self.text("char")?;
        let mut chars = text.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => visitor.visit_char(c),
            _ => Err(mismatch("char", &Value::Str(text))),
        }
    }

    fn deserialize_str<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_string(self.text("string")?)
    }

    fn deserialize_string<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_string(self.text("string")?)
    }

    fn deserialize_bytes<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_byte_buf(self.text("bytes")?.into_bytes())
    }

    fn deserialize_byte_buf<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.deserialize_bytes(visitor)
    }

    // A key that reached the decoder was present, so it is always `Some`.
    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_some(self)
    }

    fn deserialize_unit<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self.value {
            Value::Dict(d) if d.is_empty() => visitor.visit_unit(),
            Value::Array(a) if a.is_empty() => visitor.visit_unit(),
            other => Err(mismatch("unit", &other)),
        }
    }

    fn deserialize_unit_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value> {
        self.deserialize_unit(visitor)
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_seq<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self.value {
            Value::Array(items) => visitor.visit_seq(ArrayAccess::new(items)),
            Value::Dict(dict) => Err(mismatch("array", &Value::Dict(dict))),
            scalar => visitor.visit_seq(ArrayAccess::new(vec![scalar])),
        }
    }

    fn deserialize_tuple<V: Visitor<'de>>(self, _len: usize, visitor: V) -> Result<V::Value> {
        self.deserialize_seq(visitor)
    }

    fn deserialize_tuple_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _len: usize,
        visitor: V,
    ) -> Result<V::Value> {
        self.deserialize_seq(visitor)
    }

    fn deserialize_map<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self.value {
            Value::Dict(dict) => visitor.visit_map(DictAccess::new(dict)),
            other => Err(mismatch("dictionary", &other)),
        }
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value> {
        self.deserialize_map(visitor)
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value> {
        match unwrap_single(self.value) {
            Value::Str(variant) => visitor.visit_enum(variant.into_deserializer()),
            Value::Dict(dict) if dict.len() == 1 => {
                let (variant, value) = dict.into_iter().next().ok_or_else(|| {
                    OptionsError::Custom("enum dictionary lost its entry".to_string())
                })?;
                visitor.visit_enum(VariantDeserializer { variant, value })
            }
            other => Err(mismatch("enum variant", &other)),
        }
    }

    fn deserialize_identifier<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.deserialize_string(visitor)
    }

    fn deserialize_ignored_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_unit()
    }
}

impl<'de> IntoDeserializer<'de, OptionsError> for Value {
    type Deserializer = ValueDeserializer;

    fn into_deserializer(self) -> Self::Deserializer {
        ValueDeserializer::new(self)
    }
}

struct DictAccess {
    iter: btree_map::IntoIter<String, Value>,
    pending: Option<(String, Value)>,
}

impl DictAccess {
    fn new(dict: btree_map::BTreeMap<String, Value>) -> Self {
        Self {
            iter: dict.into_iter(),
            pending: None,
        }
    }
}

impl<'de> MapAccess<'de> for DictAccess {
    type Error = OptionsError;

    fn next_key_seed<K: DeserializeSeed<'de>>(&mut self, seed: K) -> Result<Option<K::Value>> {
        match self.iter.next() {
            Some((key, value)) => {
                let decoded = seed.deserialize(key_deserializer(key.clone()))?;
                self.pending = Some((key, value));
                Ok(Some(decoded))
            }
            None => Ok(None),
        }
    }

    fn next_value_seed<S: DeserializeSeed<'de>>(&mut self, seed: S) -> Result<S::Value> {
        let (key, value) = self
            .pending
            .take()
            .ok_or_else(|| OptionsError::Custom("value requested before key".to_string()))?;
        seed.deserialize(ValueDeserializer::new(value))
            .map_err(|err| err.at(&key))
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.iter.len())
    }
}

struct ArrayAccess {
    iter: vec::IntoIter<Value>,
    index: usize,
}

impl ArrayAccess {
    fn new(items: Vec<Value>) -> Self {
        Self {
            iter: items.into_iter(),
            index: 0,
        }
    }
}

impl<'de> SeqAccess<'de> for ArrayAccess {
    type Error = OptionsError;

    fn next_element_seed<S: DeserializeSeed<'de>>(&mut self, seed: S) -> Result<Option<S::Value>> {
        match self.iter.next() {
            Some(value) => {
                let index = self.index;
                self.index += 1;
                seed.deserialize(ValueDeserializer::new(value))
                    .map(Some)
                    .map_err(|err| err.at(&index.to_string()))
            }
            None => Ok(None),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.iter.len())
    }
}

/// `variant=value` selects a newtype variant carrying `value`.
struct VariantDeserializer {
    variant: String,
    value: Value,
}

impl<'de> EnumAccess<'de> for VariantDeserializer {
    type Error = OptionsError;
    type Variant = ValueDeserializer;

    fn variant_seed<S: DeserializeSeed<'de>>(self, seed: S) -> Result<(S::Value, Self::Variant)> {
        let variant = seed.deserialize(key_deserializer(self.variant))?;
        Ok((variant, ValueDeserializer::new(self.value)))
    }
}

impl<'de> VariantAccess<'de> for ValueDeserializer {
    type Error = OptionsError;

    fn unit_variant(self) -> Result<()> {
        Err(mismatch("unit variant", &self.value))
    }

    fn newtype_variant_seed<S: DeserializeSeed<'de>>(self, seed: S) -> Result<S::Value> {
        seed.deserialize(self)
    }

    fn tuple_variant<V: Visitor<'de>>(self, _len: usize, visitor: V) -> Result<V::Value> {
        de::Deserializer::deserialize_seq(self, visitor)
    }

    fn struct_variant<V: Visitor<'de>>(
        self,
        _fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value> {
        de::Deserializer::deserialize_map(self, visitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::ObjectFormat;
    use crate::value::Dict;
    use serde::Deserialize;
    use std::collections::BTreeMap;

    fn parse(token: &str) -> Value {
        ObjectFormat::default().parse(token).unwrap()
    }

    fn record(entries: Vec<(&str, Value)>) -> Value {
        Value::Dict(
            entries
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect::<Dict>(),
        )
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Inner {
        host: String,
        port: u16,
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Outer {
        name: String,
        count: i32,
        ratio: f64,
        verbose: bool,
        tags: Vec<String>,
        inner: Inner,
        limit: Option<u8>,
    }

    #[test]
    fn test_decode_full_record() {
        let value = record(vec![
            ("name", Value::from("demo")),
            ("count", Value::from("-4")),
            ("ratio", Value::from("0.5")),
            ("verbose", Value::Bool(true)),
            ("tags", parse("a,b")),
            ("inner", parse("host=localhost,port=8080")),
        ]);
        let outer: Outer = from_value(value).unwrap();
        assert_eq!(
            outer,
            Outer {
                name: "demo".into(),
                count: -4,
                ratio: 0.5,
                verbose: true,
                tags: vec!["a".into(), "b".into()],
                inner: Inner {
                    host: "localhost".into(),
                    port: 8080
                },
                limit: None,
            }
        );
    }

    #[test]
    fn test_scalar_decodes_as_single_element_array() {
        let tags: Vec<String> = from_value(Value::from("solo")).unwrap();
        assert_eq!(tags, vec!["solo"]);
    }

    #[test]
    fn test_single_element_array_decodes_as_scalar() {
        let n: u32 = from_value(Value::from(vec!["7"])).unwrap();
        assert_eq!(n, 7);
    }

    #[test]
    fn test_number_parse_failure_is_type_mismatch() {
        let err = from_value::<u8>(Value::from("300")).unwrap_err();
        assert!(matches!(err, OptionsError::TypeMismatch { .. }));
    }

    #[test]
    fn test_dict_for_scalar_is_type_mismatch() {
        let err = from_value::<String>(parse("k=v")).unwrap_err();
        match err {
            OptionsError::TypeMismatch { expected, .. } => assert_eq!(expected, "string"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_empty_array_for_scalar_is_value_not_found() {
        let err = from_value::<String>(Value::Array(vec![])).unwrap_err();
        assert!(matches!(err, OptionsError::ValueNotFound { .. }));
    }

    #[test]
    fn test_missing_field_is_key_not_found_with_path() {
        let value = record(vec![
            ("name", Value::from("demo")),
            ("count", Value::from("1")),
            ("ratio", Value::from("1")),
            ("verbose", Value::Bool(false)),
            ("tags", Value::Array(vec![])),
            ("inner", parse("host=localhost")),
        ]);
        let err = from_value::<Outer>(value).unwrap_err();
        assert_eq!(
            err,
            OptionsError::KeyNotFound {
                key: "inner.port".into()
            }
        );
    }

    #[test]
    fn test_type_mismatch_carries_path() {
        let value = record(vec![("inner", parse("host=h,port=x"))]);
        #[derive(Debug, Deserialize)]
        struct Wrapper {
            #[allow(dead_code)]
            inner: Inner,
        }
        match from_value::<Wrapper>(value).unwrap_err() {
            OptionsError::TypeMismatch { path, .. } => assert_eq!(path, "inner.port"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_bool_from_text() {
        assert!(from_value::<bool>(Value::from("true")).unwrap());
        assert!(!from_value::<bool>(Value::from("false")).unwrap());
        assert!(from_value::<bool>(Value::from("yes")).is_err());
    }

    #[test]
    fn test_enum_variants() {
        #[derive(Debug, Deserialize, PartialEq)]
        #[serde(rename_all = "lowercase")]
        enum Mode {
            Fast,
            Slow,
            Limit(u32),
        }
        assert_eq!(from_value::<Mode>(Value::from("fast")).unwrap(), Mode::Fast);
        assert_eq!(from_value::<Mode>(Value::from("slow")).unwrap(), Mode::Slow);
        assert_eq!(
            from_value::<Mode>(parse("limit=10")).unwrap(),
            Mode::Limit(10)
        );
        assert!(from_value::<Mode>(Value::from("other")).is_err());
    }

    #[test]
    fn test_char_and_map() {
        assert_eq!(from_value::<char>(Value::from("x")).unwrap(), 'x');
        assert!(from_value::<char>(Value::from("xy")).is_err());

        let map: BTreeMap<String, String> = from_value(parse("k1=v1,k2=v2")).unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map["k2"], "v2");
    }

    #[test]
    fn test_any_roundtrips_through_json_value() {
        let json: serde_json::Value = from_value(parse("a=1,b=2")).unwrap();
        assert_eq!(json, serde_json::json!({"a": "1", "b": "2"}));
    }
}
