//! Evidence behind an ownership decision, and how far to trust it

use std::fmt;

/// Why an operation was given to its owner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Evidence {
    /// A class-typed parameter names the receiver
    ParameterClass,
    /// Only a `DeleteOptions` parameter, with no class in the responses
    DeleteOptions,
    /// Untyped `body` parameter resolved through the response class
    BodyAnyResponse,
    /// A 2xx response class
    ResponseClass,
    /// The operation's group/version/kind hint
    GvkHint,
    /// Single token match on the method name
    TokenMatch,
    /// Concatenated suffix of the method name
    SuffixMatch,
    /// Permutation of every method-name token
    PermutationMatch,
    /// Nothing matched
    Unresolved,
}

impl Evidence {
    /// Confidence in this kind of evidence (0.0-1.0)
    pub fn confidence(&self) -> f32 {
        match self {
            Evidence::ParameterClass => 0.95,
            Evidence::GvkHint => 0.9,
            Evidence::ResponseClass => 0.85,
            Evidence::BodyAnyResponse => 0.8,
            Evidence::DeleteOptions => 0.7,
            Evidence::SuffixMatch => 0.6,
            Evidence::TokenMatch => 0.5,
            Evidence::PermutationMatch => 0.4,
            Evidence::Unresolved => 0.0,
        }
    }

    /// Confidence level as a human-readable string
    pub fn level(&self) -> &'static str {
        match self.confidence() {
            x if x >= 0.8 => "HIGH",
            x if x >= 0.6 => "MEDIUM",
            _ => "LOW",
        }
    }

    /// Lexical guesses need a second look before the bindings ship
    pub fn needs_review(&self) -> bool {
        self.confidence() < 0.7
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Evidence::ParameterClass => "parameter-class",
            Evidence::DeleteOptions => "delete-options",
            Evidence::BodyAnyResponse => "body-any-response",
            Evidence::ResponseClass => "response-class",
            Evidence::GvkHint => "gvk-hint",
            Evidence::TokenMatch => "token-match",
            Evidence::SuffixMatch => "suffix-match",
            Evidence::PermutationMatch => "permutation-match",
            Evidence::Unresolved => "unresolved",
        }
    }
}

impl fmt::Display for Evidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
