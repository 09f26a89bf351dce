//! Custom garde rules shared by the resource DTOs.

/// Rejects values that are empty once surrounding whitespace is removed.
pub fn not_blank(value: &str, _ctx: &()) -> garde::Result {
    if value.trim().is_empty() {
        return Err(garde::Error::new("must not be blank"));
    }
    Ok(())
}
