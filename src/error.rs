use std::fmt;

/// Error returned by a caller-supplied hook
pub type HookError = Box<dyn std::error::Error + Send + Sync>;

/// Which hook failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookKind {
    Highlight,
    LinkHref,
    Media,
}

impl fmt::Display for HookKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HookKind::Highlight => "highlight",
            HookKind::LinkHref => "link href",
            HookKind::Media => "media",
        };
        f.write_str(name)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The scanner hit a state/input combination it has no transition for.
    /// This is a bug in the parser, never a property of the input.
    #[error("no transition from {state} on {found:?}")]
    UnexpectedState {
        state: &'static str,
        found: Option<char>,
    },
    #[error("parser halted after an earlier fault")]
    Halted,
    #[error("{hook} hook failed: {source}")]
    Hook {
        hook: HookKind,
        #[source]
        source: HookError,
    },
    #[error("invalid options: {0}")]
    Config(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn unexpected(state: &'static str, found: Option<char>) -> Self {
        Error::UnexpectedState { state, found }
    }
}
