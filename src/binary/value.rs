//! Decoded Avro values.

/// A value that can be encoded to or decoded from Avro binary data.
///
/// Enums surface as `String(symbol)` and union values as the unwrapped
/// inner value, so `decode(encode(v)) == v` holds for the values callers
/// construct.
#[derive(Debug, Clone, PartialEq)]
pub enum AvroValue {
    /// Null value
    Null,
    /// Boolean value
    Boolean(bool),
    /// 32-bit signed integer
    Int(i32),
    /// 64-bit signed integer
    Long(i64),
    /// 32-bit floating point
    Float(f32),
    /// 64-bit floating point
    Double(f64),
    /// Byte array
    Bytes(Vec<u8>),
    /// UTF-8 string (also carries enum symbols)
    String(String),
    /// Record with named fields
    Record(Vec<(String, AvroValue)>),
    /// Array of values
    Array(Vec<AvroValue>),
    /// Map with string keys
    Map(Vec<(String, AvroValue)>),
    /// Fixed-size byte array
    Fixed(Vec<u8>),
}

impl AvroValue {
    /// Build a record value from `(name, value)` pairs.
    pub fn record<N: Into<String>>(fields: Vec<(N, AvroValue)>) -> AvroValue {
        AvroValue::Record(
            fields
                .into_iter()
                .map(|(name, value)| (name.into(), value))
                .collect(),
        )
    }

    /// The record fields, if this is a record.
    pub fn as_record(&self) -> Option<&[(String, AvroValue)]> {
        match self {
            AvroValue::Record(fields) => Some(fields),
            _ => None,
        }
    }

    /// Look up a record field by name.
    pub fn field(&self, name: &str) -> Option<&AvroValue> {
        self.as_record()?
            .iter()
            .find(|(field_name, _)| field_name == name)
            .map(|(_, value)| value)
    }

    /// The string content, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AvroValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// The integer content, if this is an int.
    pub fn as_i32(&self) -> Option<i32> {
        match self {
            AvroValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// The long content, if this is a long.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            AvroValue::Long(v) => Some(*v),
            _ => None,
        }
    }
}

impl From<&str> for AvroValue {
    fn from(s: &str) -> Self {
        AvroValue::String(s.to_string())
    }
}

impl From<String> for AvroValue {
    fn from(s: String) -> Self {
        AvroValue::String(s)
    }
}

impl From<i32> for AvroValue {
    fn from(v: i32) -> Self {
        AvroValue::Int(v)
    }
}

impl From<i64> for AvroValue {
    fn from(v: i64) -> Self {
        AvroValue::Long(v)
    }
}

impl From<f64> for AvroValue {
    fn from(v: f64) -> Self {
        AvroValue::Double(v)
    }
}

impl From<bool> for AvroValue {
    fn from(v: bool) -> Self {
        AvroValue::Boolean(v)
    }
}
