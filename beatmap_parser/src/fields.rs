/// Integer field. Decimal values (seen in some older maps) truncate toward zero.
pub(crate) fn int(field: &str) -> Option<i64> {
    let field = field.trim();
    if let Ok(v) = field.parse::<i64>() {
        return Some(v);
    }
    match field.parse::<f64>() {
        Ok(v) if v.is_finite() => Some(v.trunc() as i64),
        _ => None,
    }
}

pub(crate) fn int32(field: &str) -> Option<i32> {
    int(field).and_then(|v| i32::try_from(v).ok())
}

pub(crate) fn float(field: &str) -> Option<f64> {
    field.trim().parse::<f64>().ok()
}

/// `fields[idx]` when present and non-empty.
pub(crate) fn nth<'a>(fields: &[&'a str], idx: usize) -> Option<&'a str> {
    fields.get(idx).copied().filter(|s| !s.is_empty())
}
