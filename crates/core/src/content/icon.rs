use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

/// Icons the site knows how to render next to services, departments and
/// feature blurbs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Icon {
    Camera,
    Monitor,
    Scan,
    Target,
    Search,
    UserCheck,
    Heart,
    Award,
}

impl Icon {
    pub const ALL: [Icon; 8] = [
        Icon::Camera,
        Icon::Monitor,
        Icon::Scan,
        Icon::Target,
        Icon::Search,
        Icon::UserCheck,
        Icon::Heart,
        Icon::Award,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Icon::Camera => "Camera",
            Icon::Monitor => "Monitor",
            Icon::Scan => "Scan",
            Icon::Target => "Target",
            Icon::Search => "Search",
            Icon::UserCheck => "UserCheck",
            Icon::Heart => "Heart",
            Icon::Award => "Award",
        }
    }

    /// Resolve a stored icon name. Blank means "no icon"; an unknown name is
    /// logged and also treated as "no icon".
    pub fn resolve(raw: &str) -> Option<Icon> {
        let name = raw.trim();
        if name.is_empty() {
            return None;
        }
        match name.parse() {
            Ok(icon) => Some(icon),
            Err(UnknownIcon(name)) => {
                tracing::warn!(icon = %name, "dropping unknown icon name");
                None
            }
        }
    }
}

impl fmt::Display for Icon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown icon: {0}")]
pub struct UnknownIcon(pub String);

impl FromStr for Icon {
    type Err = UnknownIcon;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Icon::ALL
            .into_iter()
            .find(|icon| icon.name() == s)
            .ok_or_else(|| UnknownIcon(s.to_string()))
    }
}

/// `deserialize_with` helper for optional icon fields.
pub fn lenient<'de, D>(deserializer: D) -> Result<Option<Icon>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(Icon::resolve))
}
