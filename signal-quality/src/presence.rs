// Tolerant reads over untyped payloads.
// Absent, null and wrongly-typed fields all read as "not present".

use common::LensTag;
use serde_json::Value;

/// JSON truthiness: null, false, 0, NaN and "" are not present
pub fn truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().map(|f| f != 0.0 && !f.is_nan()).unwrap_or(true),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    }
}

pub fn number(value: Option<&Value>) -> Option<f64> {
    value.and_then(Value::as_f64)
}

pub fn is_number(value: Option<&Value>) -> bool {
    value.is_some_and(Value::is_number)
}

pub fn is_array(value: Option<&Value>) -> bool {
    value.is_some_and(Value::is_array)
}

pub fn object(value: Option<&Value>) -> Option<&Value> {
    value.filter(|v| v.is_object())
}

/// The block holding a lens's fields: the top-level `<lens>` object, falling
/// back to `lens_data.<lens>`.
pub fn lens_block(payload: &Value, lens: LensTag) -> Option<&Value> {
    if lens.is_generic() {
        return None;
    }
    object(payload.get(lens.as_str()))
        .or_else(|| object(payload.pointer(&format!("/lens_data/{}", lens.as_str()))))
}
