/// Construction-time configuration: serialisable options plus injected hooks
use crate::error::{Error, HookError};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const DEFAULT_LANGUAGE_PREFIX: &str = "language-";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Options {
    /// CSS class prefix for the language tag of fenced code blocks
    pub language_prefix: String,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            language_prefix: DEFAULT_LANGUAGE_PREFIX.to_string(),
        }
    }
}

impl Options {
    /// Read options from a JSON object; missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, Error> {
        Ok(serde_json::from_str(json)?)
    }
}

type HighlightFn = dyn Fn(&str, &str) -> Result<String, HookError>;
type LinkHrefFn = dyn Fn(&str) -> Result<String, HookError>;
type MediaFn = dyn Fn(&str, &str) -> Result<String, HookError>;

/// Optional extension points, each a plain function value.
#[derive(Default)]
pub struct Hooks {
    pub(crate) highlight: Option<Box<HighlightFn>>,
    pub(crate) link_href: Option<Box<LinkHrefFn>>,
    pub(crate) media: Option<Box<MediaFn>>,
}

impl Hooks {
    pub fn new() -> Self {
        Self::default()
    }

    /// `(code, language) -> html`; an empty result falls back to escaping.
    pub fn highlight<F>(mut self, hook: F) -> Self
    where
        F: Fn(&str, &str) -> Result<String, HookError> + 'static,
    {
        self.highlight = Some(Box::new(hook));
        self
    }

    /// `(href) -> href`, applied to every link target before emission.
    pub fn link_href<F>(mut self, hook: F) -> Self
    where
        F: Fn(&str) -> Result<String, HookError> + 'static,
    {
        self.link_href = Some(Box::new(hook));
        self
    }

    /// `(src, alt) -> html`, replacing the default `<img>` rendering.
    pub fn media<F>(mut self, hook: F) -> Self
    where
        F: Fn(&str, &str) -> Result<String, HookError> + 'static,
    {
        self.media = Some(Box::new(hook));
        self
    }
}

impl fmt::Debug for Hooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hooks")
            .field("highlight", &self.highlight.is_some())
            .field("link_href", &self.link_href.is_some())
            .field("media", &self.media.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults_from_empty_json() {
        assert_eq!(Options::from_json("{}").unwrap(), Options::default());
    }

    #[test]
    fn test_language_prefix_from_json() {
        let options = Options::from_json(r#"{"languagePrefix": "lang-"}"#).unwrap();
        assert_eq!(options.language_prefix, "lang-");
    }

    #[test]
    fn test_malformed_json_is_config_error() {
        let err = Options::from_json("{languagePrefix").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_hooks_debug_shows_presence() {
        let hooks = Hooks::new().link_href(|href| Ok(href.to_string()));
        assert_eq!(
            format!("{:?}", hooks),
            "Hooks { highlight: false, link_href: true, media: false }"
        );
    }
}
