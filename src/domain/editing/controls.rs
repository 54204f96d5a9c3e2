// SPDX-License-Identifier: MPL-2.0
//! Editor controls a host may hide.
//!
//! Hiding is a presentation concern: the core never refuses an operation
//! because its control is hidden. The set is passed in at session creation
//! so there is no shared toolbar state.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// One toolbar control of the editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ControlKind {
    Crop,
    MagicCrop,
    Sticker,
    Draw,
    Text,
    Save,
    Clear,
}

impl ControlKind {
    /// All controls, in toolbar order.
    pub const ALL: [Self; 7] = [
        Self::Crop,
        Self::MagicCrop,
        Self::Sticker,
        Self::Draw,
        Self::Text,
        Self::Save,
        Self::Clear,
    ];

    /// Returns the identifier used in configuration files.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Crop => "crop",
            Self::MagicCrop => "magicCrop",
            Self::Sticker => "sticker",
            Self::Draw => "draw",
            Self::Text => "text",
            Self::Save => "save",
            Self::Clear => "clear",
        }
    }
}

impl fmt::Display for ControlKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ControlKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown control '{s}'"))
    }
}

/// The set of controls the host should not present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HiddenControls(BTreeSet<ControlKind>);

impl HiddenControls {
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    pub fn hide(&mut self, kind: ControlKind) {
        self.0.insert(kind);
    }

    pub fn show(&mut self, kind: ControlKind) {
        self.0.remove(&kind);
    }

    #[must_use]
    pub fn is_hidden(&self, kind: ControlKind) -> bool {
        self.0.contains(&kind)
    }

    /// Controls the host should present, in toolbar order.
    pub fn visible(&self) -> impl Iterator<Item = ControlKind> + '_ {
        ControlKind::ALL
            .into_iter()
            .filter(move |kind| !self.is_hidden(*kind))
    }
}

impl FromIterator<ControlKind> for HiddenControls {
    fn from_iter<I: IntoIterator<Item = ControlKind>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
