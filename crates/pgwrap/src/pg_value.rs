//! Binary column values decoded into `serde_json::Value`.
//!
//! Built-in scalar types map to their natural JSON form. Types JSON has no
//! form for (intervals, network addresses, ranges, money, out-of-range
//! numerics) become the same text PostgreSQL would print. User enums become
//! their label, composites an object keyed by attribute name, arrays nested
//! JSON arrays. Anything else is a decode error, never `null`.

use serde_json::{Map, Number, Value};
use std::error::Error;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use tokio_postgres::types::{Field, FromSql, Kind, Type};

type BoxError = Box<dyn Error + Sync + Send>;

const RANGE_EMPTY: u8 = 0x01;
const RANGE_LOWER_INCLUSIVE: u8 = 0x02;
const RANGE_UPPER_INCLUSIVE: u8 = 0x04;
const RANGE_LOWER_INFINITE: u8 = 0x08;
const RANGE_UPPER_INFINITE: u8 = 0x10;

const NUMERIC_POSITIVE: u16 = 0x0000;
const NUMERIC_NEGATIVE: u16 = 0x4000;
const NUMERIC_NAN: u16 = 0xC000;
const NUMERIC_PINF: u16 = 0xD000;
const NUMERIC_NINF: u16 = 0xF000;

/// A column value of any type; SQL NULL is `Value::Null`.
pub(crate) struct PgValue(pub(crate) Value);

impl<'a> FromSql<'a> for PgValue {
    fn from_sql(ty: &Type, raw: &'a [u8]) -> Result<Self, BoxError> {
        decode(ty, raw).map(PgValue)
    }

    fn from_sql_null(_ty: &Type) -> Result<Self, BoxError> {
        Ok(PgValue(Value::Null))
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }
}

pub(crate) fn decode(ty: &Type, raw: &[u8]) -> Result<Value, BoxError> {
    let value = match *ty {
        Type::BOOL => Value::Bool(bool::from_sql(ty, raw)?),
        Type::CHAR => Value::String(char::from(i8::from_sql(ty, raw)? as u8).to_string()),
        Type::INT2 => i16::from_sql(ty, raw)?.into(),
        Type::INT4 => i32::from_sql(ty, raw)?.into(),
        Type::INT8 => i64::from_sql(ty, raw)?.into(),
        Type::OID => u32::from_sql(ty, raw)?.into(),
        Type::FLOAT4 => float4(f32::from_sql(ty, raw)?),
        Type::FLOAT8 => float(f64::from_sql(ty, raw)?),
        // rust_decimal covers 28 digits; anything it cannot hold exactly is
        // printed from the digit groups.
        Type::NUMERIC => match rust_decimal::Decimal::from_sql(ty, raw) {
            Ok(decimal) if Some(decimal.scale()) == numeric_scale(raw) => {
                Value::String(decimal.to_string())
            }
            _ => Value::String(numeric_text(raw)?),
        },
        Type::MONEY => Value::String(money_text(i64::from_sql(ty, raw)?)),
        Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME | Type::UNKNOWN | Type::XML => {
            Value::String(std::str::from_utf8(raw)?.to_string())
        }
        Type::JSON | Type::JSONB => Value::from_sql(ty, raw)?,
        Type::UUID => Value::String(uuid::Uuid::from_sql(ty, raw)?.to_string()),
        Type::TIMESTAMP => match infinity_label(raw) {
            Some(label) => Value::String(label.to_string()),
            None => serde_json::to_value(chrono::NaiveDateTime::from_sql(ty, raw)?)?,
        },
        Type::TIMESTAMPTZ => match infinity_label(raw) {
            Some(label) => Value::String(label.to_string()),
            None => serde_json::to_value(chrono::DateTime::<chrono::Utc>::from_sql(ty, raw)?)?,
        },
        Type::DATE => match infinity_label(raw) {
            Some(label) => Value::String(label.to_string()),
            None => serde_json::to_value(chrono::NaiveDate::from_sql(ty, raw)?)?,
        },
        Type::TIME => Value::String(clock_text(i64::from_sql(ty, raw)?)),
        Type::TIMETZ => Value::String(timetz_text(raw)?),
        Type::INTERVAL => Value::String(interval_text(raw)?),
        Type::INET | Type::CIDR => Value::String(inet_text(raw)?),
        Type::BYTEA => Value::Array(raw.iter().map(|b| Value::from(*b)).collect()),
        _ => match ty.kind() {
            Kind::Enum(_) => Value::String(std::str::from_utf8(raw)?.to_string()),
            Kind::Array(member) => array(member, raw)?,
            Kind::Domain(base) => decode(base, raw)?,
            Kind::Composite(fields) => composite(ty, fields, raw)?,
            Kind::Range(element) => Value::String(range_text(element, raw)?),
            _ => return Err(format!("unsupported column type {ty}").into()),
        },
    };
    Ok(value)
}

/// Big-endian reader over one value's bytes.
struct Reader<'a> {
    raw: &'a [u8],
    what: &'static str,
}

impl<'a> Reader<'a> {
    fn new(raw: &'a [u8], what: &'static str) -> Self {
        Self { raw, what }
    }

    fn bytes(&mut self, len: usize) -> Result<&'a [u8], BoxError> {
        if self.raw.len() < len {
            return Err(format!("{}: insufficient data", self.what).into());
        }
        let (head, tail) = self.raw.split_at(len);
        self.raw = tail;
        Ok(head)
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N], BoxError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.bytes(N)?);
        Ok(out)
    }

    fn u8(&mut self) -> Result<u8, BoxError> {
        Ok(self.array::<1>()?[0])
    }

    fn i16(&mut self) -> Result<i16, BoxError> {
        Ok(i16::from_be_bytes(self.array()?))
    }

    fn u16(&mut self) -> Result<u16, BoxError> {
        Ok(u16::from_be_bytes(self.array()?))
    }

    fn i32(&mut self) -> Result<i32, BoxError> {
        Ok(i32::from_be_bytes(self.array()?))
    }

    fn u32(&mut self) -> Result<u32, BoxError> {
        Ok(u32::from_be_bytes(self.array()?))
    }

    fn i64(&mut self) -> Result<i64, BoxError> {
        Ok(i64::from_be_bytes(self.array()?))
    }

    /// Length-prefixed element; a negative length is NULL.
    fn element(&mut self) -> Result<Option<&'a [u8]>, BoxError> {
        let len = self.i32()?;
        match usize::try_from(len) {
            Ok(len) => self.bytes(len).map(Some),
            Err(_) => Ok(None),
        }
    }
}

fn decode_element(ty: &Type, raw: Option<&[u8]>) -> Result<Value, BoxError> {
    match raw {
        Some(raw) => decode(ty, raw),
        None => Ok(Value::Null),
    }
}

/// Finite floats are numbers; NaN and the infinities use PostgreSQL's
/// spelling as strings.
fn float(v: f64) -> Value {
    match Number::from_f64(v) {
        Some(n) => Value::Number(n),
        None if v.is_nan() => Value::String("NaN".to_string()),
        None if v > 0.0 => Value::String("Infinity".to_string()),
        None => Value::String("-Infinity".to_string()),
    }
}

/// Widen through the shortest decimal form so `0.1f32` stays `0.1`.
fn float4(v: f32) -> Value {
    if v.is_finite() {
        float(v.to_string().parse().unwrap_or(f64::from(v)))
    } else {
        float(f64::from(v))
    }
}

fn infinity_label(raw: &[u8]) -> Option<&'static str> {
    let (max, min) = match raw.len() {
        8 => {
            let v = i64::from_be_bytes(raw.try_into().ok()?);
            (v == i64::MAX, v == i64::MIN)
        }
        4 => {
            let v = i32::from_be_bytes(raw.try_into().ok()?);
            (v == i32::MAX, v == i32::MIN)
        }
        _ => return None,
    };
    if max {
        Some("infinity")
    } else if min {
        Some("-infinity")
    } else {
        None
    }
}

fn numeric_scale(raw: &[u8]) -> Option<u32> {
    let dscale = raw.get(6..8)?;
    Some(u32::from(u16::from_be_bytes([dscale[0], dscale[1]])))
}

/// NUMERIC in base-10000 digit groups, printed with `dscale` fraction digits.
fn numeric_text(raw: &[u8]) -> Result<String, BoxError> {
    let mut r = Reader::new(raw, "numeric");
    let ndigits = r.i16()?;
    let weight = r.i16()?;
    let sign = r.u16()?;
    let dscale = usize::from(r.u16()?);
    match sign {
        NUMERIC_NAN => return Ok("NaN".to_string()),
        NUMERIC_PINF => return Ok("Infinity".to_string()),
        NUMERIC_NINF => return Ok("-Infinity".to_string()),
        NUMERIC_POSITIVE | NUMERIC_NEGATIVE => {}
        other => return Err(format!("numeric: invalid sign {other:#06x}").into()),
    }
    let digits = (0..ndigits.max(0))
        .map(|_| r.i16())
        .collect::<Result<Vec<_>, _>>()?;
    let digit = |idx: i32| -> i16 {
        usize::try_from(idx)
            .ok()
            .and_then(|i| digits.get(i).copied())
            .unwrap_or(0)
    };

    let mut out = String::new();
    if sign == NUMERIC_NEGATIVE {
        out.push('-');
    }
    if weight < 0 {
        out.push('0');
    } else {
        out.push_str(&digit(0).to_string());
        for idx in 1..=i32::from(weight) {
            out.push_str(&format!("{:04}", digit(idx)));
        }
    }
    if dscale > 0 {
        let mut fraction = String::with_capacity(dscale + 4);
        let mut idx = i32::from(weight) + 1;
        while fraction.len() < dscale {
            fraction.push_str(&format!("{:04}", digit(idx)));
            idx += 1;
        }
        fraction.truncate(dscale);
        out.push('.');
        out.push_str(&fraction);
    }
    Ok(out)
}

fn money_text(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!("{sign}{}.{:02}", abs / 100, abs % 100)
}

/// `HH:MM:SS[.ffffff]`, trailing fraction zeros dropped; hours may exceed 24.
fn clock_text(micros: i64) -> String {
    let sign = if micros < 0 { "-" } else { "" };
    let abs = micros.unsigned_abs();
    let hours = abs / 3_600_000_000;
    let minutes = (abs / 60_000_000) % 60;
    let seconds = (abs / 1_000_000) % 60;
    let fraction = abs % 1_000_000;
    let mut out = format!("{sign}{hours:02}:{minutes:02}:{seconds:02}");
    if fraction != 0 {
        let digits = format!("{fraction:06}");
        out.push('.');
        out.push_str(digits.trim_end_matches('0'));
    }
    out
}

fn timetz_text(raw: &[u8]) -> Result<String, BoxError> {
    let mut r = Reader::new(raw, "timetz");
    let micros = r.i64()?;
    // stored as seconds west of UTC
    let offset = -r.i32()?;
    let sign = if offset < 0 { '-' } else { '+' };
    let abs = offset.unsigned_abs();
    let mut out = format!("{}{sign}{:02}", clock_text(micros), abs / 3600);
    if abs % 3600 != 0 {
        out.push_str(&format!(":{:02}", (abs / 60) % 60));
        if abs % 60 != 0 {
            out.push_str(&format!(":{:02}", abs % 60));
        }
    }
    Ok(out)
}

/// The `postgres` interval style: `1 year 2 mons 3 days 04:05:06`.
fn interval_text(raw: &[u8]) -> Result<String, BoxError> {
    let mut r = Reader::new(raw, "interval");
    let micros = r.i64()?;
    let days = r.i32()?;
    let months = r.i32()?;

    let mut parts = Vec::new();
    for (n, unit) in [(months / 12, "year"), (months % 12, "mon"), (days, "day")] {
        match n {
            0 => {}
            1 => parts.push(format!("1 {unit}")),
            n => parts.push(format!("{n} {unit}s")),
        }
    }
    if micros != 0 || parts.is_empty() {
        parts.push(clock_text(micros));
    }
    Ok(parts.join(" "))
}

fn inet_text(raw: &[u8]) -> Result<String, BoxError> {
    let mut r = Reader::new(raw, "inet");
    let family = r.u8()?;
    let bits = r.u8()?;
    let is_cidr = r.u8()? != 0;
    let len = r.u8()?;
    let (addr, max_bits) = match (family, len) {
        (2, 4) => (IpAddr::V4(Ipv4Addr::from(r.array::<4>()?)), 32),
        (3, 16) => (IpAddr::V6(Ipv6Addr::from(r.array::<16>()?)), 128),
        _ => return Err(format!("inet: unknown family {family} with {len} address bytes").into()),
    };
    if is_cidr || bits != max_bits {
        Ok(format!("{addr}/{bits}"))
    } else {
        Ok(addr.to_string())
    }
}

/// One- or multi-dimensional array as nested JSON arrays.
fn array(member: &Type, raw: &[u8]) -> Result<Value, BoxError> {
    let mut r = Reader::new(raw, "array");
    let ndim = r.i32()?;
    let _has_nulls = r.i32()?;
    let _element_oid = r.u32()?;

    let mut dims = Vec::with_capacity(usize::try_from(ndim).unwrap_or(0));
    for _ in 0..ndim {
        let len = r.i32()?;
        let _lower_bound = r.i32()?;
        dims.push(usize::try_from(len).unwrap_or(0));
    }
    if dims.is_empty() {
        return Ok(Value::Array(Vec::new()));
    }

    let total: usize = dims.iter().product();
    let mut items = Vec::with_capacity(total);
    for _ in 0..total {
        items.push(decode_element(member, r.element()?)?);
    }
    Ok(nest(&dims, &mut items.into_iter()))
}

fn nest<I: Iterator<Item = Value>>(dims: &[usize], items: &mut I) -> Value {
    match dims {
        [] => Value::Array(Vec::new()),
        [len] => Value::Array(items.by_ref().take(*len).collect()),
        [len, rest @ ..] => Value::Array((0..*len).map(|_| nest(rest, items)).collect()),
    }
}

fn composite(ty: &Type, fields: &[Field], raw: &[u8]) -> Result<Value, BoxError> {
    let mut r = Reader::new(raw, "composite");
    let count = r.i32()?;
    if usize::try_from(count).ok() != Some(fields.len()) {
        return Err(format!(
            "composite {ty}: expected {} fields, got {count}",
            fields.len()
        )
        .into());
    }
    let mut map = Map::with_capacity(fields.len());
    for field in fields {
        let _oid = r.u32()?;
        let value = decode_element(field.type_(), r.element()?)?;
        map.insert(field.name().to_string(), value);
    }
    Ok(Value::Object(map))
}

/// Range literal text: `[1,5)`, `(,10]`, `empty`.
fn range_text(element: &Type, raw: &[u8]) -> Result<String, BoxError> {
    let mut r = Reader::new(raw, "range");
    let flags = r.u8()?;
    if flags & RANGE_EMPTY != 0 {
        return Ok("empty".to_string());
    }
    let mut bound = |infinite: u8| -> Result<String, BoxError> {
        if flags & infinite != 0 {
            return Ok(String::new());
        }
        Ok(match decode_element(element, r.element()?)? {
            Value::String(s) => s,
            other => other.to_string(),
        })
    };
    let lower = bound(RANGE_LOWER_INFINITE)?;
    let upper = bound(RANGE_UPPER_INFINITE)?;
    let open = if flags & RANGE_LOWER_INCLUSIVE != 0 { '[' } else { '(' };
    let close = if flags & RANGE_UPPER_INCLUSIVE != 0 { ']' } else { ')' };
    Ok(format!("{open}{lower},{upper}{close}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn numeric(ndigits: i16, weight: i16, sign: u16, dscale: u16, digits: &[i16]) -> Vec<u8> {
        let mut raw = Vec::new();
        raw.extend_from_slice(&ndigits.to_be_bytes());
        raw.extend_from_slice(&weight.to_be_bytes());
        raw.extend_from_slice(&sign.to_be_bytes());
        raw.extend_from_slice(&dscale.to_be_bytes());
        for d in digits {
            raw.extend_from_slice(&d.to_be_bytes());
        }
        raw
    }

    fn interval(micros: i64, days: i32, months: i32) -> Vec<u8> {
        let mut raw = micros.to_be_bytes().to_vec();
        raw.extend_from_slice(&days.to_be_bytes());
        raw.extend_from_slice(&months.to_be_bytes());
        raw
    }

    fn int4_element(raw: &mut Vec<u8>, v: i32) {
        raw.extend_from_slice(&4i32.to_be_bytes());
        raw.extend_from_slice(&v.to_be_bytes());
    }

    #[test]
    fn numeric_beyond_decimal_range_is_text() {
        // 1e30 = 100 * 10000^7
        let raw = numeric(1, 7, NUMERIC_POSITIVE, 0, &[100]);
        let expected = format!("1{}", "0".repeat(30));
        assert_eq!(decode(&Type::NUMERIC, &raw).unwrap(), json!(expected));
    }

    #[test]
    fn numeric_scale_and_sign() {
        assert_eq!(
            numeric_text(&numeric(2, 0, NUMERIC_NEGATIVE, 1, &[12, 5000])).unwrap(),
            "-12.5"
        );
        assert_eq!(
            numeric_text(&numeric(1, -1, NUMERIC_POSITIVE, 3, &[10])).unwrap(),
            "0.001"
        );
        assert_eq!(
            decode(&Type::NUMERIC, &numeric(2, 0, NUMERIC_POSITIVE, 2, &[12, 5000])).unwrap(),
            json!("12.50")
        );
        assert_eq!(
            decode(&Type::NUMERIC, &numeric(0, 0, NUMERIC_NAN, 0, &[])).unwrap(),
            json!("NaN")
        );
    }

    #[test]
    fn non_finite_floats_are_strings() {
        let nan = f64::NAN.to_be_bytes();
        assert_eq!(decode(&Type::FLOAT8, &nan).unwrap(), json!("NaN"));
        let neg = f32::NEG_INFINITY.to_be_bytes();
        assert_eq!(decode(&Type::FLOAT4, &neg).unwrap(), json!("-Infinity"));
        let tenth = 0.1f32.to_be_bytes();
        assert_eq!(decode(&Type::FLOAT4, &tenth).unwrap(), json!(0.1));
    }

    #[test]
    fn interval_uses_postgres_style() {
        let day = interval(0, 1, 0);
        assert_eq!(decode(&Type::INTERVAL, &day).unwrap(), json!("1 day"));
        let mixed = interval(4 * 3_600_000_000 + 5 * 60_000_000 + 6_500_000, 3, 14);
        assert_eq!(interval_text(&mixed).unwrap(), "1 year 2 mons 3 days 04:05:06.5");
        assert_eq!(interval_text(&interval(0, -1, 0)).unwrap(), "-1 days");
        assert_eq!(interval_text(&interval(0, 0, 0)).unwrap(), "00:00:00");
    }

    #[test]
    fn inet_and_cidr() {
        let host = [2, 32, 0, 4, 10, 0, 0, 1];
        assert_eq!(decode(&Type::INET, &host).unwrap(), json!("10.0.0.1"));
        let net = [2, 8, 1, 4, 10, 0, 0, 0];
        assert_eq!(decode(&Type::CIDR, &net).unwrap(), json!("10.0.0.0/8"));
        assert!(decode(&Type::INET, &[9, 0, 0, 0]).is_err());
    }

    #[test]
    fn timetz_offset() {
        let mut raw = (12i64 * 3_600_000_000).to_be_bytes().to_vec();
        raw.extend_from_slice(&(-7200i32).to_be_bytes());
        assert_eq!(decode(&Type::TIMETZ, &raw).unwrap(), json!("12:00:00+02"));
    }

    #[test]
    fn money_is_fixed_point_text() {
        assert_eq!(decode(&Type::MONEY, &1234i64.to_be_bytes()).unwrap(), json!("12.34"));
        assert_eq!(money_text(-5), "-0.05");
    }

    #[test]
    fn infinite_timestamps() {
        let raw = i64::MAX.to_be_bytes();
        assert_eq!(decode(&Type::TIMESTAMPTZ, &raw).unwrap(), json!("infinity"));
        let raw = i32::MIN.to_be_bytes();
        assert_eq!(decode(&Type::DATE, &raw).unwrap(), json!("-infinity"));
    }

    #[test]
    fn enum_label() {
        let mood = Type::new(
            "mood".to_string(),
            90_001,
            Kind::Enum(vec!["sad".to_string(), "happy".to_string()]),
            "public".to_string(),
        );
        assert_eq!(decode(&mood, b"happy").unwrap(), json!("happy"));
    }

    #[test]
    fn multi_dimensional_array_with_null() {
        let mut raw = Vec::new();
        raw.extend_from_slice(&2i32.to_be_bytes());
        raw.extend_from_slice(&1i32.to_be_bytes());
        raw.extend_from_slice(&23u32.to_be_bytes());
        for _ in 0..2 {
            raw.extend_from_slice(&2i32.to_be_bytes());
            raw.extend_from_slice(&1i32.to_be_bytes());
        }
        int4_element(&mut raw, 1);
        raw.extend_from_slice(&(-1i32).to_be_bytes());
        int4_element(&mut raw, 3);
        int4_element(&mut raw, 4);
        assert_eq!(
            decode(&Type::INT4_ARRAY, &raw).unwrap(),
            json!([[1, null], [3, 4]])
        );
    }

    #[test]
    fn empty_array() {
        let mut raw = Vec::new();
        raw.extend_from_slice(&0i32.to_be_bytes());
        raw.extend_from_slice(&0i32.to_be_bytes());
        raw.extend_from_slice(&700u32.to_be_bytes());
        assert_eq!(decode(&Type::FLOAT4_ARRAY, &raw).unwrap(), json!([]));
    }

    #[test]
    fn composite_object() {
        let pair = Type::new(
            "pair".to_string(),
            90_002,
            Kind::Composite(vec![
                Field::new("id".to_string(), Type::INT4),
                Field::new("label".to_string(), Type::TEXT),
            ]),
            "public".to_string(),
        );
        let mut raw = 2i32.to_be_bytes().to_vec();
        raw.extend_from_slice(&23u32.to_be_bytes());
        int4_element(&mut raw, 7);
        raw.extend_from_slice(&25u32.to_be_bytes());
        raw.extend_from_slice(&(-1i32).to_be_bytes());
        assert_eq!(decode(&pair, &raw).unwrap(), json!({"id": 7, "label": null}));
    }

    #[test]
    fn range_literal() {
        let mut raw = vec![RANGE_LOWER_INCLUSIVE];
        int4_element(&mut raw, 1);
        int4_element(&mut raw, 5);
        assert_eq!(decode(&Type::INT4_RANGE, &raw).unwrap(), json!("[1,5)"));
        assert_eq!(
            decode(&Type::INT4_RANGE, &[RANGE_EMPTY]).unwrap(),
            json!("empty")
        );
        let mut unbounded = vec![RANGE_LOWER_INFINITE | RANGE_UPPER_INCLUSIVE];
        int4_element(&mut unbounded, 10);
        assert_eq!(
            decode(&Type::INT4_RANGE, &unbounded).unwrap(),
            json!("(,10]")
        );
    }

    #[test]
    fn unsupported_type_is_an_error() {
        assert!(decode(&Type::RECORD, &[0, 0, 0, 0]).is_err());
    }

    #[test]
    fn truncated_value_is_an_error() {
        assert!(decode(&Type::INTERVAL, &[0, 0]).is_err());
    }
}
