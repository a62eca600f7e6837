//! Delimiter-joined encoding for lists of ids.
//!
//! Items are joined with `,`. A backslash escapes a literal `,` or `\`
//! inside an item; any other backslash is kept as is, so plain
//! comma-joined values written by older producers decode unchanged.
//!
//! Empty items are dropped on decode, matching the split semantics those
//! producers relied on. Consequently `deserialize(serialize(x)) == x` holds
//! for every list of non-empty items.

/// Separator between encoded items.
pub const DELIMITER: char = ',';
const ESCAPE: char = '\\';

/// Encodes a list of items into a single string.
#[must_use]
pub fn serialize<S: AsRef<str>>(items: &[S]) -> String {
    let mut out = String::new();
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            out.push(DELIMITER);
        }
        for c in item.as_ref().chars() {
            if c == DELIMITER || c == ESCAPE {
                out.push(ESCAPE);
            }
            out.push(c);
        }
    }
    out
}

/// Decodes a string produced by [`serialize`].
///
/// An absent value decodes to an empty list.
#[must_use]
pub fn deserialize(encoded: Option<&str>) -> Vec<String> {
    let Some(encoded) = encoded else {
        return Vec::new();
    };

    let mut items = Vec::new();
    let mut current = String::new();
    let mut chars = encoded.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            ESCAPE => match chars.peek() {
                Some(&next) if next == DELIMITER || next == ESCAPE => {
                    current.push(next);
                    chars.next();
                }
                _ => current.push(ESCAPE),
            },
            DELIMITER => {
                if !current.is_empty() {
                    items.push(std::mem::take(&mut current));
                }
            }
            other => current.push(other),
        }
    }
    if !current.is_empty() {
        items.push(current);
    }
    items
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_value_is_empty_list() {
        assert!(deserialize(None).is_empty());
    }

    #[test]
    fn empty_value_is_empty_list() {
        assert!(deserialize(Some("")).is_empty());
        assert!(serialize::<&str>(&[]).is_empty());
    }

    #[test]
    fn plain_ids_join_with_comma() {
        assert_eq!(serialize(&["s1", "s2"]), "s1,s2");
        assert_eq!(deserialize(Some("s1,s2")), vec!["s1", "s2"]);
    }

    #[test]
    fn empty_tokens_are_dropped() {
        assert_eq!(deserialize(Some(",s1,,s2,")), vec!["s1", "s2"]);
    }

    #[test]
    fn delimiter_and_escape_are_escaped() {
        let encoded = serialize(&["a,b", r"c\d"]);
        assert_eq!(encoded, r"a\,b,c\\d");
        assert_eq!(deserialize(Some(encoded.as_str())), vec!["a,b", r"c\d"]);
    }

    #[test]
    fn lone_backslash_is_literal() {
        assert_eq!(deserialize(Some(r"a\b,c\")), vec![r"a\b", r"c\"]);
    }
}
