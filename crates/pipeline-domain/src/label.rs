use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

pub type LabelId = Uuid;

/// The fixed palette a label color is picked from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum LabelColor {
    Blue,
    Red,
    Green,
    Yellow,
    Purple,
    Pink,
    Cyan,
    Orange,
}

impl LabelColor {
    pub const ALL: [LabelColor; 8] = [
        LabelColor::Blue,
        LabelColor::Red,
        LabelColor::Green,
        LabelColor::Yellow,
        LabelColor::Purple,
        LabelColor::Pink,
        LabelColor::Cyan,
        LabelColor::Orange,
    ];

    pub fn hex(self) -> &'static str {
        match self {
            LabelColor::Blue => "#1890ff",
            LabelColor::Red => "#ff4d4f",
            LabelColor::Green => "#52c41a",
            LabelColor::Yellow => "#faad14",
            LabelColor::Purple => "#722ed1",
            LabelColor::Pink => "#eb2f96",
            LabelColor::Cyan => "#13c2c2",
            LabelColor::Orange => "#fa8c16",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            LabelColor::Blue => "blue",
            LabelColor::Red => "red",
            LabelColor::Green => "green",
            LabelColor::Yellow => "yellow",
            LabelColor::Purple => "purple",
            LabelColor::Pink => "pink",
            LabelColor::Cyan => "cyan",
            LabelColor::Orange => "orange",
        }
    }

    /// Accepts either the hex code or the color name, case-insensitively.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|c| c.hex() == s || c.name() == s)
    }
}

impl fmt::Display for LabelColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.hex())
    }
}

impl TryFrom<String> for LabelColor {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value).ok_or_else(|| format!("unknown label color: {}", value))
    }
}

impl From<LabelColor> for String {
    fn from(color: LabelColor) -> Self {
        color.hex().to_string()
    }
}

/// Which part of the application a label belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelContext {
    Sales,
    Appointment,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    pub id: LabelId,
    pub name: String,
    pub color: LabelColor,
    /// `None` means the label is shared by every context.
    #[serde(default)]
    pub context: Option<LabelContext>,
}

impl Label {
    pub fn applies_to(&self, context: LabelContext) -> bool {
        self.context.map_or(true, |c| c == context)
    }
}

/// Request body for creating a label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewLabel {
    pub name: String,
    pub color: LabelColor,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<LabelContext>,
}

/// Selects the labels visible in one context: those scoped to it plus the
/// unscoped ones.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LabelFilter {
    pub context: Option<LabelContext>,
}

impl LabelFilter {
    pub fn for_context(context: LabelContext) -> Self {
        Self {
            context: Some(context),
        }
    }

    pub fn matches(&self, label: &Label) -> bool {
        match self.context {
            Some(context) => label.applies_to(context),
            None => true,
        }
    }
}
