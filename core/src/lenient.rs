// core/src/lenient.rs
//! Tolerante deserialiserere for serverdata.
//!
//! Serveren har sendt tall som strenger, `null` og helt andre typer i felt
//! som skal være numeriske. Ingen av disse skal velte dekodingen: verdien
//! blir enten et endelig tall eller "mangler".

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Godtar kun ekte JSON-tall (tilsvarer `typeof x === "number"`).
pub fn as_number(v: &Value) -> Option<f64> {
    v.as_f64().filter(|x| x.is_finite())
}

/// Tall eller numerisk streng (" 12.5 "). Alt annet gir `None`.
pub fn coerce_number(v: &Value) -> Option<f64> {
    let x = match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    x.filter(|x| x.is_finite())
}

/// Dato i formen `YYYY-MM-DD`, eventuelt med klokkeslett-hale (`2024-01-01T06:00:00Z`).
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let head = s.trim().get(..10)?;
    NaiveDate::parse_from_str(head, "%Y-%m-%d").ok()
}

pub fn number<'de, D>(d: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Option::<Value>::deserialize(d)?;
    Ok(v.as_ref().and_then(as_number))
}

pub fn coerced<'de, D>(d: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Option::<Value>::deserialize(d)?;
    Ok(v.as_ref().and_then(coerce_number))
}

/// Liste der hvert element beholder plassen sin; ikke-tall blir `None`.
pub fn number_list<'de, D>(d: D) -> Result<Vec<Option<f64>>, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Option::<Value>::deserialize(d)?;
    Ok(match v {
        Some(Value::Array(items)) => items.iter().map(as_number).collect(),
        _ => Vec::new(),
    })
}

pub fn date<'de, D>(d: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Option::<Value>::deserialize(d)?;
    Ok(v.as_ref().and_then(Value::as_str).and_then(parse_date))
}

/// Id kan komme som tall eller streng; vi holder den som streng i URL-ene uansett.
pub fn id<'de, D>(d: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Option::<Value>::deserialize(d)?;
    Ok(match v {
        Some(Value::String(s)) => s,
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    })
}

/// `null` eller manglende felt blir `T::default()` (typisk tom `Vec`).
pub fn or_default<'de, D, T>(d: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(d)?.unwrap_or_default())
}

/// Tekst som tåler `null` og ikke-strenger.
pub fn text<'de, D>(d: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Option::<Value>::deserialize(d)?;
    Ok(match v {
        Some(Value::String(s)) => Some(s),
        _ => None,
    })
}
