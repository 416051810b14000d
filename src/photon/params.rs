use std::collections::BTreeMap;

use crate::photon::Value;

/// Slot-keyed parameter table attached to events and operations.
///
/// Slot numbers are positional, not insertion-ordered; a duplicate slot on
/// the wire overwrites the earlier entry. The client serializes numbers in
/// the smallest type that fits, so the accessors coerce across the numeric
/// shapes instead of demanding an exact wire type.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Parameters {
    slots: BTreeMap<u8, Value>,
}

impl Parameters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, slot: u8, value: Value) {
        self.slots.insert(slot, value);
    }

    pub fn get(&self, slot: u8) -> Option<&Value> {
        self.slots.get(&slot)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u8, &Value)> {
        self.slots.iter().map(|(slot, value)| (*slot, value))
    }

    /// Integer view of a slot, coercing Byte/Short/Int/Long.
    pub fn int(&self, slot: u8) -> Option<i64> {
        self.get(slot).and_then(as_i64)
    }

    pub fn int_or(&self, slot: u8, default: i64) -> i64 {
        self.int(slot).unwrap_or(default)
    }

    /// Float view of a slot, coercing Float/Double and the integer shapes.
    pub fn float(&self, slot: u8) -> Option<f32> {
        self.get(slot).and_then(as_f32)
    }

    pub fn bool(&self, slot: u8) -> Option<bool> {
        match self.get(slot)? {
            Value::Bool(b) => Some(*b),
            Value::Byte(b) => Some(*b != 0),
            _ => None,
        }
    }

    pub fn string(&self, slot: u8) -> Option<&str> {
        match self.get(slot)? {
            Value::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn string_or_empty(&self, slot: u8) -> String {
        self.string(slot).unwrap_or_default().to_string()
    }

    /// World-plane position from a two-element numeric array.
    pub fn position(&self, slot: u8) -> Option<(f32, f32)> {
        let items = self.numeric_items(slot)?;
        if items.len() < 2 {
            return None;
        }
        Some((items[0], items[1]))
    }

    /// Flat float view of an array slot (interleaved coordinate lists).
    pub fn float_list(&self, slot: u8) -> Option<Vec<f32>> {
        self.numeric_items(slot)
    }

    /// Flat integer view of an array slot (id/type/tier lists).
    pub fn int_list(&self, slot: u8) -> Option<Vec<i64>> {
        match self.get(slot)? {
            Value::ByteArray(bytes) => Some(bytes.iter().map(|b| i64::from(*b)).collect()),
            Value::IntArray(items) => Some(items.iter().map(|v| i64::from(*v)).collect()),
            Value::Array { items, .. } | Value::ObjectArray(items) => {
                items.iter().map(as_i64).collect()
            }
            _ => None,
        }
    }

    fn numeric_items(&self, slot: u8) -> Option<Vec<f32>> {
        match self.get(slot)? {
            Value::Array { items, .. } | Value::ObjectArray(items) => {
                items.iter().map(as_f32).collect()
            }
            Value::ByteArray(bytes) => Some(bytes.iter().map(|b| f32::from(*b)).collect()),
            Value::IntArray(items) => Some(items.iter().map(|v| *v as f32).collect()),
            _ => None,
        }
    }
}

impl FromIterator<(u8, Value)> for Parameters {
    fn from_iter<I: IntoIterator<Item = (u8, Value)>>(iter: I) -> Self {
        let mut params = Parameters::new();
        for (slot, value) in iter {
            params.insert(slot, value);
        }
        params
    }
}

fn as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Byte(b) => Some(i64::from(*b)),
        Value::Short(v) => Some(i64::from(*v)),
        Value::Int(v) => Some(i64::from(*v)),
        Value::Long(v) => Some(*v),
        _ => None,
    }
}

fn as_f32(value: &Value) -> Option<f32> {
    match value {
        Value::Float(v) => Some(*v),
        Value::Double(v) => Some(*v as f32),
        Value::Byte(b) => Some(f32::from(*b)),
        Value::Short(v) => Some(f32::from(*v)),
        Value::Int(v) => Some(*v as f32),
        Value::Long(v) => Some(*v as f32),
        _ => None,
    }
}
