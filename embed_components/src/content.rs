//! Dashboards, tiles and Q&A

use crate::embed::{Embed, EmbedParts};
use crate::Instance;

/// Events a dashboard adds to the base set
pub const DASHBOARD_EVENTS: &[&str] = &["tileClicked"];

/// Events a tile adds to the base set
pub const TILE_EVENTS: &[&str] = &["tileClicked"];

/// Events a Q&A surface adds to the base set
pub const QNA_EVENTS: &[&str] = &["visualRendered"];

#[derive(Clone, Debug)]
pub struct Dashboard {
    embed: Embed,
}

impl Dashboard {
    /// Constructor registered for the `dashboard` type
    pub fn create(parts: EmbedParts) -> Instance {
        Instance::Dashboard(Self {
            embed: Embed::new(parts, DASHBOARD_EVENTS),
        })
    }

    pub fn embed(&self) -> &Embed {
        &self.embed
    }

    pub fn get_id(&self) -> String {
        self.embed.config().id
    }
}

#[derive(Clone, Debug)]
pub struct Tile {
    embed: Embed,
}

impl Tile {
    /// Constructor registered for the `tile` type
    pub fn create(parts: EmbedParts) -> Instance {
        Instance::Tile(Self {
            embed: Embed::new(parts, TILE_EVENTS),
        })
    }

    pub fn embed(&self) -> &Embed {
        &self.embed
    }

    pub fn get_id(&self) -> String {
        self.embed.config().id
    }
}

#[derive(Clone, Debug)]
pub struct Qna {
    embed: Embed,
}

impl Qna {
    /// Constructor registered for the `qna` type
    pub fn create(parts: EmbedParts) -> Instance {
        Instance::Qna(Self {
            embed: Embed::new(parts, QNA_EVENTS),
        })
    }

    pub fn embed(&self) -> &Embed {
        &self.embed
    }

    /// Dataset the Q&A surface answers questions about
    pub fn get_dataset_id(&self) -> String {
        self.embed.config().id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{parts_for, ScriptedChannel};
    use core_types::EmbedType;
    use futures::executor::block_on;

    #[test]
    fn test_event_sets_per_type() {
        let channel = ScriptedChannel::accepting();

        let dashboard = Dashboard::create(parts_for(EmbedType::Dashboard, &channel));
        assert!(dashboard.embed().is_event_allowed("tileClicked"));
        assert!(dashboard.embed().is_event_allowed("loaded"));
        assert!(!dashboard.embed().is_event_allowed("pageChanged"));

        let tile = Tile::create(parts_for(EmbedType::Tile, &channel));
        assert_eq!(tile.embed().allowed_events(), &["loaded", "error", "tileClicked"]);

        let qna = Qna::create(parts_for(EmbedType::Qna, &channel));
        assert!(qna.embed().is_event_allowed("visualRendered"));
        assert!(!qna.embed().is_event_allowed("filtersApplied"));
    }

    #[test]
    fn test_dashboard_loads_under_its_own_base() {
        let channel = ScriptedChannel::accepting();
        let dashboard = Dashboard::create(parts_for(EmbedType::Dashboard, &channel));

        block_on(dashboard.embed().reload()).unwrap();
        assert_eq!(channel.sent()[0].url, "/dashboard/load");
    }
}
