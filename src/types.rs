use std::fmt;
use std::str::FromStr;

/// Canonical task name type used throughout the crate.
pub type TaskName = String;

/// Asset classes whose transform can be swapped for an external command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AssetClass {
    Style,
    Scripts,
    Page,
    Image,
    Font,
    Extra,
}

impl AssetClass {
    pub const ALL: [AssetClass; 6] = [
        AssetClass::Style,
        AssetClass::Scripts,
        AssetClass::Page,
        AssetClass::Image,
        AssetClass::Font,
        AssetClass::Extra,
    ];

    /// Name of the primitive task (and transform) handling this class.
    pub fn task_name(self) -> &'static str {
        match self {
            AssetClass::Style => "style",
            AssetClass::Scripts => "scripts",
            AssetClass::Page => "page",
            AssetClass::Image => "image",
            AssetClass::Font => "font",
            AssetClass::Extra => "extra",
        }
    }
}

impl fmt::Display for AssetClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.task_name())
    }
}

impl FromStr for AssetClass {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_lowercase();
        AssetClass::ALL
            .into_iter()
            .find(|class| class.task_name() == name)
            .ok_or_else(|| {
                format!(
                    "unknown transform '{s}' (expected one of style, scripts, page, image, font, extra)"
                )
            })
    }
}

/// Outcome of a single run, as seen by the watch dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Success,
    Failed(String),
}
