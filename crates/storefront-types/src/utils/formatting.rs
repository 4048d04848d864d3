//! String formatting utilities.
//!
//! Provides helpers that keep identifiers short in log lines.

/// Truncates an identifier for display purposes.
///
/// Shows only the first 8 characters followed by ".." for longer strings.
pub fn truncate_id(id: &str) -> String {
	match id.char_indices().nth(8) {
		Some((cut, _)) => format!("{}..", &id[..cut]),
		None => id.to_string(),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_truncate_id() {
		assert_eq!(truncate_id("12345678"), "12345678");
		assert_eq!(truncate_id("123456789"), "12345678..");
		assert_eq!(
			truncate_id("5f0c2a9e-6d1b-4c55-9a0e-3f4d2b7c8e10"),
			"5f0c2a9e.."
		);
	}

	#[test]
	fn test_truncate_multibyte_id() {
		assert_eq!(truncate_id("đơn-hàng-số-một"), "đơn-hàng..");
	}
}
