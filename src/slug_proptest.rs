//! Property-based tests for slug generation.
//!
//! These tests use proptest to generate random titles and verify that the
//! produced identifiers are always safe to use as file names.

#[cfg(test)]
mod proptest_tests {
    use crate::defaults::MAX_ID_LEN;
    use crate::slug::{entry_id, slugify};
    use proptest::prelude::*;

    proptest! {
        /// Property: slugs only contain alphanumerics and single hyphens
        #[test]
        fn slugify_produces_safe_alphabet(input in ".*") {
            let slug = slugify(&input);
            for ch in slug.chars() {
                prop_assert!(
                    ch == '-' || ch.is_alphanumeric(),
                    "unexpected character '{}' in slug '{}' from '{}'",
                    ch,
                    slug,
                    input
                );
            }
            prop_assert!(!slug.contains("--"));
            prop_assert!(!slug.starts_with('-'));
            prop_assert!(!slug.ends_with('-'));
        }

        /// Property: slugs never exceed the id length limit
        #[test]
        fn slugify_respects_length_limit(input in ".{0,300}") {
            prop_assert!(slugify(&input).chars().count() <= MAX_ID_LEN);
        }

        /// Property: slugify is idempotent on its own output
        #[test]
        fn slugify_is_idempotent(input in ".*") {
            let once = slugify(&input);
            prop_assert_eq!(slugify(&once), once.clone());
        }

        /// Property: plain lower-case ASCII words joined by single spaces map to hyphens
        #[test]
        fn slugify_maps_word_separators(words in prop::collection::vec("[a-z0-9]{1,8}", 1..6)) {
            let title = words.join(" ");
            let expected = words.join("-");
            prop_assume!(expected.chars().count() <= MAX_ID_LEN);
            prop_assert_eq!(slugify(&title), expected);
        }

        /// Property: entry_id fails exactly when the slug is empty
        #[test]
        fn entry_id_fails_only_on_empty_slug(input in ".*") {
            let slug = slugify(&input);
            match entry_id(&input) {
                Ok(id) => prop_assert_eq!(id, slug),
                Err(_) => prop_assert!(slug.is_empty()),
            }
        }
    }
}
