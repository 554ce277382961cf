use std::any::{Any, TypeId};

use serde::{
    de::{
        self, value::StringDeserializer, DeserializeOwned, DeserializeSeed, EnumAccess,
        IntoDeserializer, MapAccess, SeqAccess, Unexpected, VariantAccess, Visitor,
    },
    forward_to_deserialize_any, Deserialize, Deserializer, Serialize,
};
use serde_json::{map, Map, Value};

use crate::{lowercase::Lowercase, EfetchError};

/// Serializes a request body with struct field names lower-cased.
///
/// Map keys (`HashMap`, `BTreeMap`, `serde_json::Value` objects) are written as given.
pub(crate) fn encode_body<B>(body: &B) -> Result<String, EfetchError>
where
    B: Serialize + ?Sized,
{
    serde_json::to_string(&Lowercase(body)).map_err(|err| EfetchError::Serialize(err.to_string()))
}

/// Decodes a response body into `T`.
///
/// `String` targets receive the raw body. An empty body decodes as JSON `null`.
/// Struct field names and externally tagged enum variants match case-insensitively,
/// exact matches first. `#[serde(flatten)]` fields, internally tagged and untagged
/// enums go through serde's buffered content and match with exact case.
pub(crate) fn decode_body<T>(body: String) -> Result<T, EfetchError>
where
    T: DeserializeOwned + 'static,
{
    if TypeId::of::<T>() == TypeId::of::<String>() {
        let raw: Box<dyn Any> = Box::new(body);
        return raw
            .downcast::<T>()
            .map(|value| *value)
            .map_err(|_| EfetchError::Deserialize {
                message: "raw body could not be returned as string".to_owned(),
                body: String::new(),
            });
    }

    let value = if body.trim().is_empty() {
        Value::Null
    } else {
        serde_json::from_str::<Value>(&body).map_err(|err| EfetchError::Deserialize {
            message: format!("invalid response JSON: {err}"),
            body: body.clone(),
        })?
    };

    T::deserialize(CaseInsensitive(value)).map_err(|err| EfetchError::Deserialize {
        message: format!("response JSON does not match target type: {err}"),
        body,
    })
}

/// Renames object keys to the struct field they match ignoring ASCII case.
fn match_fields(
    object: Map<String, Value>,
    fields: &'static [&'static str],
) -> Map<String, Value> {
    let mut matched = Map::new();
    for (key, value) in object {
        matched.insert(match_name(key, fields), value);
    }
    matched
}

fn match_name(key: String, names: &'static [&'static str]) -> String {
    if names.contains(&key.as_str()) {
        return key;
    }
    names
        .iter()
        .find(|name| name.eq_ignore_ascii_case(&key))
        .map(|name| (*name).to_owned())
        .unwrap_or(key)
}

struct CaseInsensitive(Value);

impl<'de> Deserializer<'de> for CaseInsensitive {
    type Error = serde_json::Error;

    fn deserialize_any<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        match self.0 {
            Value::Object(object) => visitor.visit_map(ObjectAccess::new(object)),
            Value::Array(items) => visitor.visit_seq(ArrayAccess {
                iter: items.into_iter(),
            }),
            other => other.deserialize_any(visitor),
        }
    }

    fn deserialize_option<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        match self.0 {
            Value::Null => visitor.visit_none(),
            other => visitor.visit_some(CaseInsensitive(other)),
        }
    }

    fn deserialize_newtype_struct<V>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_struct<V>(
        self,
        _name: &'static str,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        match self.0 {
            Value::Object(object) => {
                visitor.visit_map(ObjectAccess::new(match_fields(object, fields)))
            }
            other => CaseInsensitive(other).deserialize_any(visitor),
        }
    }

    fn deserialize_enum<V>(
        self,
        name: &'static str,
        variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        match self.0 {
            Value::String(variant) => visitor.visit_enum(TaggedVariant {
                variant: match_name(variant, variants),
                payload: None,
            }),
            Value::Object(object) if object.len() == 1 => match object.into_iter().next() {
                Some((variant, payload)) => visitor.visit_enum(TaggedVariant {
                    variant: match_name(variant, variants),
                    payload: Some(payload),
                }),
                None => Err(de::Error::invalid_length(0, &"object with one variant key")),
            },
            other => other.deserialize_enum(name, variants, visitor),
        }
    }

    forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        bytes byte_buf unit unit_struct seq tuple tuple_struct map identifier ignored_any
    }
}

struct ObjectAccess {
    iter: map::IntoIter,
    value: Option<Value>,
}

impl ObjectAccess {
    fn new(object: Map<String, Value>) -> Self {
        Self {
            iter: object.into_iter(),
            value: None,
        }
    }
}

impl<'de> MapAccess<'de> for ObjectAccess {
    type Error = serde_json::Error;

    fn next_key_seed<K>(&mut self, seed: K) -> Result<Option<K::Value>, Self::Error>
    where
        K: DeserializeSeed<'de>,
    {
        match self.iter.next() {
            Some((key, value)) => {
                self.value = Some(value);
                let key: StringDeserializer<serde_json::Error> = key.into_deserializer();
                seed.deserialize(key).map(Some)
            }
            None => Ok(None),
        }
    }

    fn next_value_seed<V>(&mut self, seed: V) -> Result<V::Value, Self::Error>
    where
        V: DeserializeSeed<'de>,
    {
        let value = self.value.take().ok_or_else(|| {
            <serde_json::Error as de::Error>::custom("map value requested before key")
        })?;
        seed.deserialize(CaseInsensitive(value))
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.iter.len())
    }
}

struct ArrayAccess {
    iter: std::vec::IntoIter<Value>,
}

impl<'de> SeqAccess<'de> for ArrayAccess {
    type Error = serde_json::Error;

    fn next_element_seed<T>(&mut self, seed: T) -> Result<Option<T::Value>, Self::Error>
    where
        T: DeserializeSeed<'de>,
    {
        match self.iter.next() {
            Some(value) => seed.deserialize(CaseInsensitive(value)).map(Some),
            None => Ok(None),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.iter.len())
    }
}

/// Externally tagged enum: `"Variant"` or `{"Variant": payload}`.
struct TaggedVariant {
    variant: String,
    payload: Option<Value>,
}

impl<'de> EnumAccess<'de> for TaggedVariant {
    type Error = serde_json::Error;
    type Variant = VariantPayload;

    fn variant_seed<S>(self, seed: S) -> Result<(S::Value, Self::Variant), Self::Error>
    where
        S: DeserializeSeed<'de>,
    {
        let variant: StringDeserializer<serde_json::Error> = self.variant.into_deserializer();
        let value = seed.deserialize(variant)?;
        Ok((value, VariantPayload(self.payload)))
    }
}

struct VariantPayload(Option<Value>);

impl<'de> VariantAccess<'de> for VariantPayload {
    type Error = serde_json::Error;

    fn unit_variant(self) -> Result<(), Self::Error> {
        match self.0 {
            None => Ok(()),
            Some(value) => <()>::deserialize(value),
        }
    }

    fn newtype_variant_seed<S>(self, seed: S) -> Result<S::Value, Self::Error>
    where
        S: DeserializeSeed<'de>,
    {
        match self.0 {
            Some(value) => seed.deserialize(CaseInsensitive(value)),
            None => Err(de::Error::invalid_type(
                Unexpected::UnitVariant,
                &"newtype variant",
            )),
        }
    }

    fn tuple_variant<V>(self, _len: usize, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        match self.0 {
            Some(value) => CaseInsensitive(value).deserialize_any(visitor),
            None => Err(de::Error::invalid_type(
                Unexpected::UnitVariant,
                &"tuple variant",
            )),
        }
    }

    fn struct_variant<V>(
        self,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        match self.0 {
            Some(Value::Object(object)) => {
                visitor.visit_map(ObjectAccess::new(match_fields(object, fields)))
            }
            Some(other) => CaseInsensitive(other).deserialize_any(visitor),
            None => Err(de::Error::invalid_type(
                Unexpected::UnitVariant,
                &"struct variant",
            )),
        }
    }
}
