//! Content type tags

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of hosted content an instance embeds
///
/// The tag selects the constructor used by the registry, the base path of
/// every remote operation, and the path collection events arrive under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbedType {
    Report,
    Dashboard,
    Tile,
    Qna,
}

impl EmbedType {
    /// Every known content type
    pub const ALL: [EmbedType; 4] = [
        EmbedType::Report,
        EmbedType::Dashboard,
        EmbedType::Tile,
        EmbedType::Qna,
    ];

    /// Canonical lowercase tag
    pub fn as_str(&self) -> &'static str {
        match self {
            EmbedType::Report => "report",
            EmbedType::Dashboard => "dashboard",
            EmbedType::Tile => "tile",
            EmbedType::Qna => "qna",
        }
    }

    /// Base path of operations sent to the content (`/report`, `/dashboard`, ...)
    pub fn route_base(&self) -> &'static str {
        match self {
            EmbedType::Report => "/report",
            EmbedType::Dashboard => "/dashboard",
            EmbedType::Tile => "/tile",
            EmbedType::Qna => "/qna",
        }
    }

    /// Path collection events for this type arrive under (`reports`, ...)
    pub fn event_collection(&self) -> &'static str {
        match self {
            EmbedType::Report => "reports",
            EmbedType::Dashboard => "dashboards",
            EmbedType::Tile => "tiles",
            EmbedType::Qna => "qnas",
        }
    }
}

impl fmt::Display for EmbedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for a type tag that names no known content type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownEmbedType(pub String);

impl fmt::Display for UnknownEmbedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown embed type '{}'", self.0)
    }
}

impl std::error::Error for UnknownEmbedType {}

impl FromStr for EmbedType {
    type Err = UnknownEmbedType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "report" => Ok(EmbedType::Report),
            "dashboard" => Ok(EmbedType::Dashboard),
            "tile" => Ok(EmbedType::Tile),
            "qna" | "visual-qna" => Ok(EmbedType::Qna),
            _ => Err(UnknownEmbedType(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("Report".parse::<EmbedType>(), Ok(EmbedType::Report));
        assert_eq!("DASHBOARD".parse::<EmbedType>(), Ok(EmbedType::Dashboard));
        assert_eq!("visual-qna".parse::<EmbedType>(), Ok(EmbedType::Qna));
    }

    #[test]
    fn test_parse_unknown() {
        let err = "unknownType".parse::<EmbedType>().unwrap_err();
        assert_eq!(err, UnknownEmbedType("unknownType".to_string()));
    }

    #[test]
    fn test_tag_round_trips_through_display() {
        for ty in EmbedType::ALL {
            assert_eq!(ty.to_string().parse::<EmbedType>(), Ok(ty));
        }
    }

    #[test]
    fn test_route_bases() {
        assert_eq!(EmbedType::Report.route_base(), "/report");
        assert_eq!(EmbedType::Dashboard.route_base(), "/dashboard");
        assert_eq!(EmbedType::Report.event_collection(), "reports");
    }

    #[test]
    fn test_serde_uses_lowercase_tag() {
        let json = serde_json::to_string(&EmbedType::Tile).unwrap();
        assert_eq!(json, "\"tile\"");
    }
}
