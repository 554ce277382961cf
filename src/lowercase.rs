//! Serializer adapter that lower-cases struct field names.
//!
//! Struct and struct-variant fields are renamed; map keys pass through untouched.

use serde::ser::{
    self, Serialize, SerializeMap, SerializeSeq, SerializeStruct, SerializeStructVariant,
    SerializeTuple, SerializeTupleStruct, SerializeTupleVariant, Serializer,
};

/// Wraps a value so that every struct field name beneath it is lower-cased.
pub(crate) struct Lowercase<'a, T: ?Sized>(pub(crate) &'a T);

impl<T> Serialize for Lowercase<'_, T>
where
    T: Serialize + ?Sized,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.0.serialize(LowercaseSerializer(serializer))
    }
}

struct LowercaseSerializer<S>(S);

/// Forwards elements of a sequence-like compound, wrapping each value.
struct Compound<C>(C);

/// Emits a struct as a map whose keys are the lower-cased field names.
struct FieldsAsMap<M>(M);

/// Buffers struct-variant fields so they can be written as `{variant: {fields}}`.
struct VariantFields<M> {
    map: M,
    fields: Vec<(String, serde_json::Value)>,
}

/// Ordered field list written as a JSON object.
struct OrderedFields<'a>(&'a [(String, serde_json::Value)]);

impl Serialize for OrderedFields<'_> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, value) in self.0 {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl<S> Serializer for LowercaseSerializer<S>
where
    S: Serializer,
{
    type Ok = S::Ok;
    type Error = S::Error;
    type SerializeSeq = Compound<S::SerializeSeq>;
    type SerializeTuple = Compound<S::SerializeTuple>;
    type SerializeTupleStruct = Compound<S::SerializeTupleStruct>;
    type SerializeTupleVariant = Compound<S::SerializeTupleVariant>;
    type SerializeMap = Compound<S::SerializeMap>;
    type SerializeStruct = FieldsAsMap<S::SerializeMap>;
    type SerializeStructVariant = VariantFields<S::SerializeMap>;

    fn serialize_bool(self, v: bool) -> Result<S::Ok, S::Error> {
        self.0.serialize_bool(v)
    }

    fn serialize_i8(self, v: i8) -> Result<S::Ok, S::Error> {
        self.0.serialize_i8(v)
    }

    fn serialize_i16(self, v: i16) -> Result<S::Ok, S::Error> {
        self.0.serialize_i16(v)
    }

    fn serialize_i32(self, v: i32) -> Result<S::Ok, S::Error> {
        self.0.serialize_i32(v)
    }

    fn serialize_i64(self, v: i64) -> Result<S::Ok, S::Error> {
        self.0.serialize_i64(v)
    }

    fn serialize_i128(self, v: i128) -> Result<S::Ok, S::Error> {
        self.0.serialize_i128(v)
    }

    fn serialize_u8(self, v: u8) -> Result<S::Ok, S::Error> {
        self.0.serialize_u8(v)
    }

    fn serialize_u16(self, v: u16) -> Result<S::Ok, S::Error> {
        self.0.serialize_u16(v)
    }

    fn serialize_u32(self, v: u32) -> Result<S::Ok, S::Error> {
        self.0.serialize_u32(v)
    }

    fn serialize_u64(self, v: u64) -> Result<S::Ok, S::Error> {
        self.0.serialize_u64(v)
    }

    fn serialize_u128(self, v: u128) -> Result<S::Ok, S::Error> {
        self.0.serialize_u128(v)
    }

    fn serialize_f32(self, v: f32) -> Result<S::Ok, S::Error> {
        self.0.serialize_f32(v)
    }

    fn serialize_f64(self, v: f64) -> Result<S::Ok, S::Error> {
        self.0.serialize_f64(v)
    }

    fn serialize_char(self, v: char) -> Result<S::Ok, S::Error> {
        self.0.serialize_char(v)
    }

    fn serialize_str(self, v: &str) -> Result<S::Ok, S::Error> {
        self.0.serialize_str(v)
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<S::Ok, S::Error> {
        self.0.serialize_bytes(v)
    }

    fn serialize_none(self) -> Result<S::Ok, S::Error> {
        self.0.serialize_none()
    }

    fn serialize_some<T>(self, value: &T) -> Result<S::Ok, S::Error>
    where
        T: Serialize + ?Sized,
    {
        self.0.serialize_some(&Lowercase(value))
    }

    fn serialize_unit(self) -> Result<S::Ok, S::Error> {
        self.0.serialize_unit()
    }

    fn serialize_unit_struct(self, name: &'static str) -> Result<S::Ok, S::Error> {
        self.0.serialize_unit_struct(name)
    }

    fn serialize_unit_variant(
        self,
        name: &'static str,
        variant_index: u32,
        variant: &'static str,
    ) -> Result<S::Ok, S::Error> {
        self.0.serialize_unit_variant(name, variant_index, variant)
    }

    fn serialize_newtype_struct<T>(self, name: &'static str, value: &T) -> Result<S::Ok, S::Error>
    where
        T: Serialize + ?Sized,
    {
        self.0.serialize_newtype_struct(name, &Lowercase(value))
    }

    fn serialize_newtype_variant<T>(
        self,
        name: &'static str,
        variant_index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<S::Ok, S::Error>
    where
        T: Serialize + ?Sized,
    {
        self.0
            .serialize_newtype_variant(name, variant_index, variant, &Lowercase(value))
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<Self::SerializeSeq, S::Error> {
        self.0.serialize_seq(len).map(Compound)
    }

    fn serialize_tuple(self, len: usize) -> Result<Self::SerializeTuple, S::Error> {
        self.0.serialize_tuple(len).map(Compound)
    }

    fn serialize_tuple_struct(
        self,
        name: &'static str,
        len: usize,
    ) -> Result<Self::SerializeTupleStruct, S::Error> {
        self.0.serialize_tuple_struct(name, len).map(Compound)
    }

    fn serialize_tuple_variant(
        self,
        name: &'static str,
        variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<Self::SerializeTupleVariant, S::Error> {
        self.0
            .serialize_tuple_variant(name, variant_index, variant, len)
            .map(Compound)
    }

    fn serialize_map(self, len: Option<usize>) -> Result<Self::SerializeMap, S::Error> {
        self.0.serialize_map(len).map(Compound)
    }

    fn serialize_struct(
        self,
        _name: &'static str,
        len: usize,
    ) -> Result<Self::SerializeStruct, S::Error> {
        self.0.serialize_map(Some(len)).map(FieldsAsMap)
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<Self::SerializeStructVariant, S::Error> {
        let mut map = self.0.serialize_map(Some(1))?;
        map.serialize_key(variant)?;
        Ok(VariantFields {
            map,
            fields: Vec::with_capacity(len),
        })
    }

    fn is_human_readable(&self) -> bool {
        self.0.is_human_readable()
    }
}

impl<C> SerializeSeq for Compound<C>
where
    C: SerializeSeq,
{
    type Ok = C::Ok;
    type Error = C::Error;

    fn serialize_element<T>(&mut self, value: &T) -> Result<(), C::Error>
    where
        T: Serialize + ?Sized,
    {
        self.0.serialize_element(&Lowercase(value))
    }

    fn end(self) -> Result<C::Ok, C::Error> {
        self.0.end()
    }
}

impl<C> SerializeTuple for Compound<C>
where
    C: SerializeTuple,
{
    type Ok = C::Ok;
    type Error = C::Error;

    fn serialize_element<T>(&mut self, value: &T) -> Result<(), C::Error>
    where
        T: Serialize + ?Sized,
    {
        self.0.serialize_element(&Lowercase(value))
    }

    fn end(self) -> Result<C::Ok, C::Error> {
        self.0.end()
    }
}

impl<C> SerializeTupleStruct for Compound<C>
where
    C: SerializeTupleStruct,
{
    type Ok = C::Ok;
    type Error = C::Error;

    fn serialize_field<T>(&mut self, value: &T) -> Result<(), C::Error>
    where
        T: Serialize + ?Sized,
    {
        self.0.serialize_field(&Lowercase(value))
    }

    fn end(self) -> Result<C::Ok, C::Error> {
        self.0.end()
    }
}

impl<C> SerializeTupleVariant for Compound<C>
where
    C: SerializeTupleVariant,
{
    type Ok = C::Ok;
    type Error = C::Error;

    fn serialize_field<T>(&mut self, value: &T) -> Result<(), C::Error>
    where
        T: Serialize + ?Sized,
    {
        self.0.serialize_field(&Lowercase(value))
    }

    fn end(self) -> Result<C::Ok, C::Error> {
        self.0.end()
    }
}

// Map keys are data, not property names: they are written verbatim.
impl<C> SerializeMap for Compound<C>
where
    C: SerializeMap,
{
    type Ok = C::Ok;
    type Error = C::Error;

    fn serialize_key<T>(&mut self, key: &T) -> Result<(), C::Error>
    where
        T: Serialize + ?Sized,
    {
        self.0.serialize_key(key)
    }

    fn serialize_value<T>(&mut self, value: &T) -> Result<(), C::Error>
    where
        T: Serialize + ?Sized,
    {
        self.0.serialize_value(&Lowercase(value))
    }

    fn serialize_entry<K, V>(&mut self, key: &K, value: &V) -> Result<(), C::Error>
    where
        K: Serialize + ?Sized,
        V: Serialize + ?Sized,
    {
        self.0.serialize_entry(key, &Lowercase(value))
    }

    fn end(self) -> Result<C::Ok, C::Error> {
        self.0.end()
    }
}

impl<M> SerializeStruct for FieldsAsMap<M>
where
    M: SerializeMap,
{
    type Ok = M::Ok;
    type Error = M::Error;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<(), M::Error>
    where
        T: Serialize + ?Sized,
    {
        self.0.serialize_entry(&key.to_lowercase(), &Lowercase(value))
    }

    fn end(self) -> Result<M::Ok, M::Error> {
        self.0.end()
    }
}

impl<M> SerializeStructVariant for VariantFields<M>
where
    M: SerializeMap,
{
    type Ok = M::Ok;
    type Error = M::Error;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<(), M::Error>
    where
        T: Serialize + ?Sized,
    {
        let value =
            serde_json::to_value(Lowercase(value)).map_err(<M::Error as ser::Error>::custom)?;
        self.fields.push((key.to_lowercase(), value));
        Ok(())
    }

    fn end(mut self) -> Result<M::Ok, M::Error> {
        self.map.serialize_value(&OrderedFields(&self.fields))?;
        self.map.end()
    }
}
