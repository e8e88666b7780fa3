//! Hotkey binding values.
//!
//! # Responsibility
//! - Parse raw `(modifiers, key)` pairs and `"<ctrl>+<alt>+a"` combo strings.
//! - Provide an equality that treats modifiers as an unordered set.
//!
//! # Invariants
//! - A `Hotkey` always carries a valid key symbol: one character, or a named
//!   key token such as `<f5>` that is not a modifier.
//! - Modifier order and duplicates in the input never affect equality.

use crate::model::argument::ArgumentError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};

static NAMED_KEY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^<[a-z][a-z0-9_]*>$").expect("valid named key regex"));
static COMBO_MODIFIER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(<[a-z][a-z0-9_]*>)\+").expect("valid combo modifier regex"));

/// Modifier key of a hotkey.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Modifier {
    #[serde(rename = "<shift>")]
    Shift,
    #[serde(rename = "<ctrl>")]
    Control,
    #[serde(rename = "<alt>")]
    Alt,
    #[serde(rename = "<alt_gr>")]
    AltGr,
    #[serde(rename = "<super>")]
    Super,
    #[serde(rename = "<hyper>")]
    Hyper,
    #[serde(rename = "<meta>")]
    Meta,
    #[serde(rename = "<capslock>")]
    CapsLock,
    #[serde(rename = "<numlock>")]
    NumLock,
}

impl Modifier {
    pub const ALL: [Modifier; 9] = [
        Modifier::Shift,
        Modifier::Control,
        Modifier::Alt,
        Modifier::AltGr,
        Modifier::Super,
        Modifier::Hyper,
        Modifier::Meta,
        Modifier::CapsLock,
        Modifier::NumLock,
    ];

    pub fn token(self) -> &'static str {
        match self {
            Self::Shift => "<shift>",
            Self::Control => "<ctrl>",
            Self::Alt => "<alt>",
            Self::AltGr => "<alt_gr>",
            Self::Super => "<super>",
            Self::Hyper => "<hyper>",
            Self::Meta => "<meta>",
            Self::CapsLock => "<capslock>",
            Self::NumLock => "<numlock>",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|modifier| modifier.token() == token)
    }
}

impl Display for Modifier {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.token())
    }
}

/// Validated hotkey: modifier set plus key symbol.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Hotkey {
    modifiers: BTreeSet<Modifier>,
    key: String,
}

impl Hotkey {
    /// Builds a hotkey from already typed modifiers.
    ///
    /// # Errors
    /// - Returns an error when `key` is not a valid key symbol.
    pub fn new(
        modifiers: impl IntoIterator<Item = Modifier>,
        key: impl Into<String>,
    ) -> Result<Self, ArgumentError> {
        let key = key.into();
        validate_key(&key)?;
        Ok(Self {
            modifiers: modifiers.into_iter().collect(),
            key,
        })
    }

    pub fn modifiers(&self) -> &BTreeSet<Modifier> {
        &self.modifiers
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

impl Display for Hotkey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for modifier in &self.modifiers {
            write!(f, "{modifier}+")?;
        }
        f.write_str(&self.key)
    }
}

/// Raw hotkey descriptor as supplied by a caller, before validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HotkeyArg {
    pub modifiers: Vec<String>,
    pub key: String,
}

impl HotkeyArg {
    pub fn new<I, S>(modifiers: I, key: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            modifiers: modifiers.into_iter().map(Into::into).collect(),
            key: key.into(),
        }
    }

    /// Splits a combo string like `<ctrl>+<shift>+a` into modifiers and key.
    ///
    /// Leading `<name>+` groups are modifiers; the remainder is the key, so
    /// `<ctrl>++` binds the `+` key and `<ctrl>+ ` binds the space key.
    pub fn parse_combo(combo: &str) -> Result<Self, ArgumentError> {
        let mut rest = combo.trim_start();
        let mut modifiers = Vec::new();
        while let Some(captures) = COMBO_MODIFIER_RE.captures(rest) {
            let (whole, token) = match (captures.get(0), captures.get(1)) {
                (Some(whole), Some(token)) => (whole, token),
                _ => break,
            };
            modifiers.push(token.as_str().to_string());
            rest = &rest[whole.end()..];
        }
        if rest.is_empty() {
            return Err(ArgumentError::new(format!(
                "hotkey `{combo}` has no key after its modifiers"
            )));
        }
        Ok(Self {
            modifiers,
            key: rest.to_string(),
        })
    }

    /// Validates the descriptor into a [`Hotkey`].
    ///
    /// # Errors
    /// - Unknown modifier token.
    /// - Empty or otherwise invalid key symbol.
    pub fn validate(&self) -> Result<Hotkey, ArgumentError> {
        let mut modifiers = BTreeSet::new();
        for token in &self.modifiers {
            let modifier = Modifier::from_token(token).ok_or_else(|| {
                ArgumentError::new(format!("hotkey modifier `{token}` is not a modifier key"))
            })?;
            modifiers.insert(modifier);
        }
        Hotkey::new(modifiers, self.key.clone())
    }
}

fn validate_key(key: &str) -> Result<(), ArgumentError> {
    if key.is_empty() {
        return Err(ArgumentError::new("hotkey key must not be empty"));
    }
    if key.chars().count() == 1 {
        return Ok(());
    }
    if !NAMED_KEY_RE.is_match(key) {
        return Err(ArgumentError::new(format!(
            "hotkey key `{key}` must be a single character or a named key like <f5>"
        )));
    }
    if Modifier::from_token(key).is_some() {
        return Err(ArgumentError::new(format!(
            "hotkey key `{key}` is a modifier key"
        )));
    }
    Ok(())
}
