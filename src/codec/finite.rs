//! 非有限浮點數檢查
//!
//! serde_json 會把 NaN 與 ±inf 靜默寫成 `null`，之後再也無法解碼回原類型。
//! 編碼前先以不產生輸出的序列化器走訪整個值，遇到非有限浮點數即拒絕。

use serde::ser::{self, Serialize};
use std::fmt::Display;
use thiserror::Error;

#[derive(Debug, Error)]
enum Rejection {
    #[error("非有限浮點數: {0}")]
    NonFinite(f64),

    /// 值本身的 Serialize 實現報錯；留給 serde_json 回報
    #[error("{0}")]
    Custom(String),
}

impl ser::Error for Rejection {
    fn custom<T: Display>(msg: T) -> Self {
        Rejection::Custom(msg.to_string())
    }
}

/// 值中第一個非有限的浮點數；沒有時返回 `None`
pub(crate) fn first_non_finite<T>(value: &T) -> Option<f64>
where
    T: Serialize + ?Sized,
{
    match value.serialize(FiniteCheck) {
        Err(Rejection::NonFinite(n)) => Some(n),
        Ok(()) | Err(Rejection::Custom(_)) => None,
    }
}

#[derive(Clone, Copy)]
struct FiniteCheck;

impl FiniteCheck {
    fn float(value: f64) -> Result<(), Rejection> {
        if value.is_finite() {
            Ok(())
        } else {
            Err(Rejection::NonFinite(value))
        }
    }
}

impl ser::Serializer for FiniteCheck {
    type Ok = ();
    type Error = Rejection;
    type SerializeSeq = Self;
    type SerializeTuple = Self;
    type SerializeTupleStruct = Self;
    type SerializeTupleVariant = Self;
    type SerializeMap = Self;
    type SerializeStruct = Self;
    type SerializeStructVariant = Self;

    fn serialize_bool(self, _: bool) -> Result<(), Rejection> {
        Ok(())
    }

    fn serialize_i8(self, _: i8) -> Result<(), Rejection> {
        Ok(())
    }

    fn serialize_i16(self, _: i16) -> Result<(), Rejection> {
        Ok(())
    }

    fn serialize_i32(self, _: i32) -> Result<(), Rejection> {
        Ok(())
    }

    fn serialize_i64(self, _: i64) -> Result<(), Rejection> {
        Ok(())
    }

    fn serialize_i128(self, _: i128) -> Result<(), Rejection> {
        Ok(())
    }

    fn serialize_u8(self, _: u8) -> Result<(), Rejection> {
        Ok(())
    }

    fn serialize_u16(self, _: u16) -> Result<(), Rejection> {
        Ok(())
    }

    fn serialize_u32(self, _: u32) -> Result<(), Rejection> {
        Ok(())
    }

    fn serialize_u64(self, _: u64) -> Result<(), Rejection> {
        Ok(())
    }

    fn serialize_u128(self, _: u128) -> Result<(), Rejection> {
        Ok(())
    }

    fn serialize_f32(self, v: f32) -> Result<(), Rejection> {
        Self::float(f64::from(v))
    }

    fn serialize_f64(self, v: f64) -> Result<(), Rejection> {
        Self::float(v)
    }

    fn serialize_char(self, _: char) -> Result<(), Rejection> {
        Ok(())
    }

    fn serialize_str(self, _: &str) -> Result<(), Rejection> {
        Ok(())
    }

    fn serialize_bytes(self, _: &[u8]) -> Result<(), Rejection> {
        Ok(())
    }

    fn serialize_none(self) -> Result<(), Rejection> {
        Ok(())
    }

    fn serialize_some<T: Serialize + ?Sized>(self, value: &T) -> Result<(), Rejection> {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<(), Rejection> {
        Ok(())
    }

    fn serialize_unit_struct(self, _: &'static str) -> Result<(), Rejection> {
        Ok(())
    }

    fn serialize_unit_variant(self, _: &'static str, _: u32, _: &'static str) -> Result<(), Rejection> {
        Ok(())
    }

    fn serialize_newtype_struct<T: Serialize + ?Sized>(
        self,
        _: &'static str,
        value: &T,
    ) -> Result<(), Rejection> {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: Serialize + ?Sized>(
        self,
        _: &'static str,
        _: u32,
        _: &'static str,
        value: &T,
    ) -> Result<(), Rejection> {
        value.serialize(self)
    }

    fn serialize_seq(self, _: Option<usize>) -> Result<Self, Rejection> {
        Ok(self)
    }

    fn serialize_tuple(self, _: usize) -> Result<Self, Rejection> {
        Ok(self)
    }

    fn serialize_tuple_struct(self, _: &'static str, _: usize) -> Result<Self, Rejection> {
        Ok(self)
    }

    fn serialize_tuple_variant(
        self,
        _: &'static str,
        _: u32,
        _: &'static str,
        _: usize,
    ) -> Result<Self, Rejection> {
        Ok(self)
    }

    fn serialize_map(self, _: Option<usize>) -> Result<Self, Rejection> {
        Ok(self)
    }

    fn serialize_struct(self, _: &'static str, _: usize) -> Result<Self, Rejection> {
        Ok(self)
    }

    fn serialize_struct_variant(
        self,
        _: &'static str,
        _: u32,
        _: &'static str,
        _: usize,
    ) -> Result<Self, Rejection> {
        Ok(self)
    }
}

impl ser::SerializeSeq for FiniteCheck {
    type Ok = ();
    type Error = Rejection;

    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), Rejection> {
        value.serialize(*self)
    }

    fn end(self) -> Result<(), Rejection> {
        Ok(())
    }
}

impl ser::SerializeTuple for FiniteCheck {
    type Ok = ();
    type Error = Rejection;

    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), Rejection> {
        value.serialize(*self)
    }

    fn end(self) -> Result<(), Rejection> {
        Ok(())
    }
}

impl ser::SerializeTupleStruct for FiniteCheck {
    type Ok = ();
    type Error = Rejection;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), Rejection> {
        value.serialize(*self)
    }

    fn end(self) -> Result<(), Rejection> {
        Ok(())
    }
}

impl ser::SerializeTupleVariant for FiniteCheck {
    type Ok = ();
    type Error = Rejection;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), Rejection> {
        value.serialize(*self)
    }

    fn end(self) -> Result<(), Rejection> {
        Ok(())
    }
}

impl ser::SerializeMap for FiniteCheck {
    type Ok = ();
    type Error = Rejection;

    fn serialize_key<T: Serialize + ?Sized>(&mut self, key: &T) -> Result<(), Rejection> {
        key.serialize(*self)
    }

    fn serialize_value<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), Rejection> {
        value.serialize(*self)
    }

    fn end(self) -> Result<(), Rejection> {
        Ok(())
    }
}

impl ser::SerializeStruct for FiniteCheck {
    type Ok = ();
    type Error = Rejection;

    fn serialize_field<T: Serialize + ?Sized>(
        &mut self,
        _: &'static str,
        value: &T,
    ) -> Result<(), Rejection> {
        value.serialize(*self)
    }

    fn end(self) -> Result<(), Rejection> {
        Ok(())
    }
}

impl ser::SerializeStructVariant for FiniteCheck {
    type Ok = ();
    type Error = Rejection;

    fn serialize_field<T: Serialize + ?Sized>(
        &mut self,
        _: &'static str,
        value: &T,
    ) -> Result<(), Rejection> {
        value.serialize(*self)
    }

    fn end(self) -> Result<(), Rejection> {
        Ok(())
    }
}
