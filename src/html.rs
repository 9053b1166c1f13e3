//! Raw HTML passthrough: recognising where a verbatim element ends

/// Elements that never have content or a closing tag
pub const VOID_ELEMENTS: [&str; 14] = [
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param",
    "source", "track", "wbr",
];

pub fn is_void_element(name: &str) -> bool {
    VOID_ELEMENTS.iter().any(|void| void.eq_ignore_ascii_case(name))
}

pub fn is_tag_name_start(ch: char) -> bool {
    ch.is_ascii_alphabetic()
}

pub fn is_tag_name_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '-'
}

/// What the most recently completed tag of a raw HTML body means for `name`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagEffect {
    Opens,
    Closes,
    Neither,
}

/// Classify the last tag in `html`, which must end with `>`.
///
/// Returns `None` when there is no `<` to start the tag.
pub fn last_tag_effect(html: &str, name: &str) -> Option<TagEffect> {
    let start = html.rfind('<')?;
    let tag = &html[start + 1..html.len() - 1];
    if let Some(closing) = tag.strip_prefix('/') {
        let closing = closing.trim_end();
        return Some(if closing.eq_ignore_ascii_case(name) {
            TagEffect::Closes
        } else {
            TagEffect::Neither
        });
    }
    let opening = tag
        .get(..name.len())
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case(name))
        && tag[name.len()..]
            .chars()
            .next()
            .is_none_or(|ch| ch.is_whitespace() || ch == '/');
    Some(if opening && !tag.ends_with('/') {
        TagEffect::Opens
    } else {
        TagEffect::Neither
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("img", true)]
    #[case("BR", true)]
    #[case("meter", false)]
    #[case("p", false)]
    fn test_void_elements(#[case] name: &str, #[case] expected: bool) {
        assert_eq!(is_void_element(name), expected);
    }

    #[rstest]
    #[case("<div>a</div>", "div", Some(TagEffect::Closes))]
    #[case("<div>a</DIV >", "div", Some(TagEffect::Closes))]
    #[case("<div>a<div class=\"x\">", "div", Some(TagEffect::Opens))]
    #[case("<div>a<divider>", "div", Some(TagEffect::Neither))]
    #[case("<div>a<div/>", "div", Some(TagEffect::Neither))]
    #[case("<div>a</span>", "div", Some(TagEffect::Neither))]
    #[case("a>", "div", None)]
    fn test_last_tag_effect(
        #[case] html: &str,
        #[case] name: &str,
        #[case] expected: Option<TagEffect>,
    ) {
        assert_eq!(last_tag_effect(html, name), expected);
    }
}
