//! core::naming
//!
//! Shim naming rules.
//!
//! # Scheme
//!
//! A shim name is the original name followed by [`SHIM_MARKER`] and the
//! decimal value of a per-forge counter. Names in the host-reserved
//! namespace ([`RESERVED_PREFIX`]) and names that already start with the
//! escape character get one leading [`ESCAPE`], so a shim never lands inside
//! a namespace the host keeps for itself.
//!
//! Decoding is the exact inverse for every name that does not itself carry
//! the marker.

/// Token separating the original name from the counter.
pub const SHIM_MARKER: &str = "$__shim";

/// Namespace reserved by the host environment.
pub const RESERVED_PREFIX: &str = "std";

/// Escape character prepended to names that would collide with the host.
pub const ESCAPE: char = '$';

fn needs_escape(name: &str) -> bool {
    name.starts_with(RESERVED_PREFIX) || name.starts_with(ESCAPE)
}

/// Encode a shim name for `original` and counter value `counter`.
///
/// # Example
///
/// ```
/// use realmwork::core::naming::encode_shim_name;
///
/// assert_eq!(encode_shim_name("svc.Widget", 3), "svc.Widget$__shim3");
/// assert_eq!(encode_shim_name("std.io.Reader", 1), "$std.io.Reader$__shim1");
/// ```
pub fn encode_shim_name(original: &str, counter: u64) -> String {
    let mut buf = String::with_capacity(original.len() + SHIM_MARKER.len() + 21);
    if needs_escape(original) {
        buf.push(ESCAPE);
    }
    buf.push_str(original);
    buf.push_str(SHIM_MARKER);
    buf.push_str(&counter.to_string());
    buf
}

/// Recover the original name from a shim name.
///
/// Returns `name` unchanged when it is not a shim name: no marker, or
/// something other than decimal digits after the last marker.
///
/// # Example
///
/// ```
/// use realmwork::core::naming::original_name;
///
/// assert_eq!(original_name("svc.Widget$__shim3"), "svc.Widget");
/// assert_eq!(original_name("$std.io.Reader$__shim1"), "std.io.Reader");
/// assert_eq!(original_name("svc.Widget"), "svc.Widget");
/// assert_eq!(original_name("svc.Widget$__shimX"), "svc.Widget$__shimX");
/// ```
pub fn original_name(name: &str) -> &str {
    let Some(marker) = name.rfind(SHIM_MARKER) else {
        return name;
    };
    let digits = &name[marker + SHIM_MARKER.len()..];
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return name;
    }
    let head = &name[..marker];
    match head.strip_prefix(ESCAPE) {
        Some(rest) if needs_escape(rest) => rest,
        _ => head,
    }
}

/// True if `name` decodes to something other than itself.
pub fn is_shim_name(name: &str) -> bool {
    original_name(name) != name
}
