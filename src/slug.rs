use unicode_casefold::UnicodeCaseFold;

/// URL-safe identifier for a reference label.
///
/// Case folded, with every run of non-alphanumeric characters collapsed
/// into a single hyphen, so a usage and its definition meet on the same
/// fragment regardless of how either was capitalised.
pub fn slugify(label: &str) -> String {
    let folded: String = label.chars().case_fold().collect();
    let mut slug = String::with_capacity(folded.len());
    let mut pending_hyphen = false;
    for ch in folded.chars() {
        if ch.is_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(ch);
        } else {
            pending_hyphen = true;
        }
    }
    slug
}
