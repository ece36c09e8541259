//! Key path utilities.
//!
//! A key path is a separator-delimited identifier such as `common.hello`.
//! Every function here is pure; the separator comes from `keySeparator`.

/// Default key separator.
pub const DEFAULT_SEPARATOR: &str = ".";

/// Splits a key path into its segments.
///
/// An empty key path has zero segments.
#[must_use]
pub fn split<'a>(keypath: &'a str, separator: &str) -> Vec<&'a str> {
    if keypath.is_empty() {
        return Vec::new();
    }
    keypath.split(separator).collect()
}

/// Joins segments back into a key path.
#[must_use]
pub fn join<S: AsRef<str>>(segments: &[S], separator: &str) -> String {
    segments.iter().map(AsRef::as_ref).collect::<Vec<_>>().join(separator)
}

/// Returns the last segment of a key path.
#[must_use]
pub fn keyname<'a>(keypath: &'a str, separator: &str) -> &'a str {
    keypath.rsplit_once(separator).map_or(keypath, |(_, name)| name)
}

/// Returns the key path with its last segment removed, or `None` at the root.
#[must_use]
pub fn parent<'a>(keypath: &'a str, separator: &str) -> Option<&'a str> {
    if keypath.is_empty() {
        return None;
    }
    Some(keypath.rsplit_once(separator).map_or("", |(parent, _)| parent))
}

/// Checks that every segment of a key path is non-empty.
#[must_use]
pub fn is_well_formed(keypath: &str, separator: &str) -> bool {
    !keypath.is_empty() && keypath.split(separator).all(|segment| !segment.is_empty())
}

/// Checks if `child_key` is a descendant of `parent_key`.
///
/// Supports both separator-based (e.g., `items.foo`) and array notation (e.g., `items[0]`).
#[must_use]
pub fn is_child_key(child_key: &str, parent_key: &str, separator: &str) -> bool {
    let Some(remainder) = child_key.strip_prefix(parent_key) else {
        return false;
    };

    !remainder.is_empty() && (remainder.starts_with(separator) || remainder.starts_with('['))
}

/// Array element keys (`items[0]`) come from flattened arrays and cannot be edited in place.
#[must_use]
pub fn is_array_key(keypath: &str) -> bool {
    keypath.contains('[')
}

#[cfg(test)]
mod tests {
    use googletest::prelude::*;
    use rstest::*;

    use super::*;

    #[rstest]
    #[case::single("hello")]
    #[case::nested("common.hello")]
    #[case::deep("a.b.c.d")]
    #[case::array_segment("menu.items[0]")]
    fn split_then_join_round_trips(#[case] keypath: &str) {
        let segments = split(keypath, ".");

        assert_that!(join(&segments, "."), eq(keypath));
    }

    #[rstest]
    fn split_empty_is_zero_segments() {
        assert_that!(split("", "."), is_empty());
        assert_that!(join::<&str>(&[], "."), eq(""));
    }

    #[rstest]
    fn split_keeps_order() {
        assert_that!(split("a.b.c", "."), elements_are![eq(&"a"), eq(&"b"), eq(&"c")]);
        assert_that!(split("ns:key", ":"), elements_are![eq(&"ns"), eq(&"key")]);
    }

    #[rstest]
    #[case("a.b.c", "c", Some("a.b"))]
    #[case("a", "a", Some(""))]
    #[case("", "", None)]
    fn keyname_and_parent(
        #[case] keypath: &str,
        #[case] expected_name: &str,
        #[case] expected_parent: Option<&str>,
    ) {
        assert_that!(keyname(keypath, "."), eq(expected_name));
        assert_that!(parent(keypath, "."), eq(expected_parent));
    }

    #[rstest]
    #[case("a.b", true)]
    #[case("a", true)]
    #[case("", false)]
    #[case("a..b", false)]
    #[case(".a", false)]
    #[case("a.", false)]
    fn well_formed_paths(#[case] keypath: &str, #[case] expected: bool) {
        assert_that!(is_well_formed(keypath, "."), eq(expected));
    }

    #[rstest]
    #[case("items.foo", "items", true)]
    #[case("items[0]", "items", true)]
    #[case("deep.nested.key", "deep.nested", true)]
    #[case("itemsX", "items", false)]
    #[case("items", "items", false)]
    #[case("other.key", "items", false)]
    fn child_keys(#[case] child: &str, #[case] parent: &str, #[case] expected: bool) {
        assert_that!(is_child_key(child, parent, "."), eq(expected));
    }

    #[rstest]
    fn child_keys_with_custom_separator() {
        assert_that!(is_child_key("ns:key:sub", "ns:key", ":"), eq(true));
        assert_that!(is_child_key("a/b/c", "a", "/"), eq(true));
    }
}
