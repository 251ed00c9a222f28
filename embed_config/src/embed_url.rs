//! Content ids carried in embed URLs

use core_types::EmbedType;
use regex::Regex;
use std::sync::LazyLock;

static ID_PARAMETER: LazyLock<Result<Regex, regex::Error>> = LazyLock::new(|| {
    Regex::new(r#"(?:^|[?&])(reportId|dashboardId|tileId|datasetId)="?([^&"]+)"?"#)
});

/// Query parameter naming the content id for a type
pub fn id_parameter(embed_type: EmbedType) -> &'static str {
    match embed_type {
        EmbedType::Report => "reportId",
        EmbedType::Dashboard => "dashboardId",
        EmbedType::Tile => "tileId",
        EmbedType::Qna => "datasetId",
    }
}

/// Extracts the content id for `embed_type` from an embed URL
///
/// Surrounding quotes are tolerated and the value stops at the next `&`.
pub fn find_id_from_embed_url(embed_type: EmbedType, url: &str) -> Option<String> {
    let pattern = ID_PARAMETER.as_ref().ok()?;
    let wanted = id_parameter(embed_type);
    pattern
        .captures_iter(url)
        .find(|captures| &captures[1] == wanted)
        .map(|captures| captures[2].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_id_from_url() {
        let url = "https://host/appTokenReportEmbed?reportId=ABC123";
        assert_eq!(
            find_id_from_embed_url(EmbedType::Report, url).as_deref(),
            Some("ABC123")
        );
    }

    #[test]
    fn test_value_stops_at_ampersand_and_quotes() {
        let url = r#"https://host/embed?groupId=g&reportId="R-1"&autoAuth=true"#;
        assert_eq!(
            find_id_from_embed_url(EmbedType::Report, url).as_deref(),
            Some("R-1")
        );
    }

    #[test]
    fn test_parameter_depends_on_type() {
        let url = "https://host/embed?dashboardId=D1&tileId=T1";
        assert_eq!(find_id_from_embed_url(EmbedType::Report, url), None);
        assert_eq!(
            find_id_from_embed_url(EmbedType::Dashboard, url).as_deref(),
            Some("D1")
        );
        assert_eq!(
            find_id_from_embed_url(EmbedType::Tile, url).as_deref(),
            Some("T1")
        );
    }

    #[test]
    fn test_parameter_name_must_be_whole() {
        let url = "https://host/embed?otherReportId=X";
        assert_eq!(find_id_from_embed_url(EmbedType::Report, url), None);
    }
}
