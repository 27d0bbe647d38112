//! Value conversion helpers for Gherkin data tables
//!
//! Converts string values from feature files to context values.

use akte_engine::{PlaceholderContext, Value};

/// Convert a Gherkin table cell value to a context Value.
///
/// Supports:
/// - `true` / `false` -> Bool
/// - `null` -> Null
/// - Integer literals -> Int
/// - Float literals -> Float
/// - `[a, b, c]` -> Array of converted items
/// - Everything else -> String
pub fn convert_gherkin_value(val: &str) -> Value {
    let trimmed = val.trim();

    if trimmed == "true" {
        return Value::Bool(true);
    }
    if trimmed == "false" {
        return Value::Bool(false);
    }

    if trimmed == "null" {
        return Value::Null;
    }

    if let Some(inner) = trimmed.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
        if inner.trim().is_empty() {
            return Value::Array(Vec::new());
        }
        return Value::Array(inner.split(',').map(convert_gherkin_value).collect());
    }

    if let Ok(i) = trimmed.parse::<i64>() {
        return Value::Int(i);
    }

    if let Ok(f) = trimmed.parse::<f64>() {
        return Value::Float(f);
    }

    Value::String(trimmed.to_string())
}

/// Parse a two-column Gherkin table into a placeholder context.
///
/// The table format is:
/// ```text
/// | NaamKoper    | Jansen |
/// | AantalKopers | 2      |
/// ```
///
/// Strings become replacements. Other scalars become replacements with
/// their text form plus a typed entry; lists and nulls are typed-only.
pub fn parse_table_to_context(table: &cucumber::gherkin::Table) -> PlaceholderContext {
    let mut ctx = PlaceholderContext::new();

    for row in &table.rows {
        if row.len() < 2 {
            continue;
        }
        let key = row[0].trim();
        match convert_gherkin_value(&row[1]) {
            Value::String(s) => ctx.insert(key, unescape_cell(&s)),
            value @ (Value::Null | Value::Array(_)) => ctx.insert_typed(key, value),
            value => {
                ctx.insert(key, value.to_text().unwrap_or_default());
                ctx.insert_typed(key, value);
            }
        }
    }

    ctx
}

/// Unescape `\n` and `\t` sequences in a table cell or expected text.
pub fn unescape_cell(val: &str) -> String {
    val.replace("\\n", "\n").replace("\\t", "\t")
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::panic, clippy::unwrap_used)]
mod tests {
    use super::{convert_gherkin_value, unescape_cell};
    use akte_engine::Value;

    #[test]
    fn test_convert_scalars() {
        assert_eq!(convert_gherkin_value(" true "), Value::Bool(true));
        assert_eq!(convert_gherkin_value("null"), Value::Null);
        assert_eq!(convert_gherkin_value("42"), Value::Int(42));
        assert_eq!(convert_gherkin_value("1250.5"), Value::Float(1250.5));
        assert_eq!(
            convert_gherkin_value("De Vries"),
            Value::String("De Vries".to_string())
        );
    }

    #[test]
    fn test_convert_list() {
        assert_eq!(
            convert_gherkin_value("[3, 4, BV]"),
            Value::Array(vec![
                Value::Int(3),
                Value::Int(4),
                Value::String("BV".to_string())
            ])
        );
        assert_eq!(convert_gherkin_value("[]"), Value::Array(vec![]));
    }

    #[test]
    fn test_unescape_cell() {
        assert_eq!(unescape_cell("a\\nb"), "a\nb");
        assert_eq!(unescape_cell("\\t1.1 Koop"), "\t1.1 Koop");
    }
}
