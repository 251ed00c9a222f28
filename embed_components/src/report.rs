//! Reports and the pages and visuals inside them

use crate::embed::{from_body, to_body, Embed, EmbedParts};
use crate::error::EmbedError;
use crate::node::{Filterable, Node};
use crate::Instance;
use ipc::{PageDescriptor, SettingsPatch, VisualDescriptor};
use serde_json::Value;
use std::fmt;

/// Events a report adds to the base set
pub const REPORT_EVENTS: &[&str] = &[
    "dataSelected",
    "filtersApplied",
    "pageChanged",
    "settingsUpdated",
];

/// A report instance
#[derive(Clone, Debug)]
pub struct Report {
    embed: Embed,
}

impl Report {
    /// Constructor registered for the `report` type
    pub fn create(parts: EmbedParts) -> Instance {
        Instance::Report(Self {
            embed: Embed::new(parts, REPORT_EVENTS),
        })
    }

    pub(crate) fn from_embed(embed: Embed) -> Self {
        Self { embed }
    }

    pub fn embed(&self) -> &Embed {
        &self.embed
    }

    /// Report id from the stored configuration
    pub fn get_id(&self) -> String {
        self.embed.config().id
    }

    pub async fn get_pages(&self) -> Result<Vec<Page>, EmbedError> {
        let response = self
            .embed
            .channel()
            .get(&self.operation_url("/pages"), Some(self.embed.addressing()))
            .await?;
        let pages: Vec<PageDescriptor> = from_body(response.body)?;
        Ok(pages
            .into_iter()
            .map(|page| self.page(page.name, page.display_name))
            .collect())
    }

    /// Page handle by name; no request is made
    pub fn page(&self, name: impl Into<String>, display_name: Option<String>) -> Page {
        Page {
            report: self.clone(),
            name: name.into(),
            display_name,
        }
    }

    /// Makes the named page active
    pub async fn set_page(&self, name: &str) -> Result<(), EmbedError> {
        self.embed
            .channel()
            .put(
                &self.operation_url("/pages/active"),
                to_body(&PageDescriptor::named(name))?,
                Some(self.embed.addressing()),
            )
            .await?;
        Ok(())
    }

    /// Updates pane visibility; acknowledged fields also become part of what `reload` replays
    pub async fn update_settings(&self, settings: SettingsPatch) -> Result<(), EmbedError> {
        self.embed
            .channel()
            .patch(
                &self.operation_url("/settings"),
                to_body(&settings)?,
                Some(self.embed.addressing()),
            )
            .await?;
        self.embed.update_settings_locally(&settings);
        Ok(())
    }

    pub async fn print(&self) -> Result<(), EmbedError> {
        self.post_command("/print").await
    }

    pub async fn refresh(&self) -> Result<(), EmbedError> {
        self.post_command("/refresh").await
    }

    async fn post_command(&self, suffix: &str) -> Result<(), EmbedError> {
        self.embed
            .channel()
            .post(
                &self.operation_url(suffix),
                Value::Null,
                Some(self.embed.addressing()),
            )
            .await?;
        Ok(())
    }
}

impl Node for Report {
    fn owner(&self) -> &Embed {
        &self.embed
    }

    fn build_path(&self) -> String {
        "/".to_string()
    }
}

impl Filterable for Report {}

/// A page of a report
///
/// A value: two pages are equal when they share a name and a report.
#[derive(Clone)]
pub struct Page {
    report: Report,
    name: String,
    display_name: Option<String>,
}

impl Page {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Informational only
    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    pub fn report(&self) -> &Report {
        &self.report
    }

    pub async fn set_active(&self) -> Result<(), EmbedError> {
        self.report.set_page(&self.name).await
    }

    pub async fn get_visuals(&self) -> Result<Vec<Visual>, EmbedError> {
        let owner = self.owner();
        let response = owner
            .channel()
            .get(&self.operation_url("/visuals"), Some(owner.addressing()))
            .await?;
        let visuals: Vec<VisualDescriptor> = from_body(response.body)?;
        Ok(visuals
            .into_iter()
            .map(|visual| self.visual(visual.name))
            .collect())
    }

    /// Visual handle by name; no request is made
    pub fn visual(&self, name: impl Into<String>) -> Visual {
        Visual {
            page: self.clone(),
            name: name.into(),
        }
    }
}

impl PartialEq for Page {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.report.embed.ptr_eq(&other.report.embed)
    }
}

impl fmt::Debug for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Page")
            .field("name", &self.name)
            .field("display_name", &self.display_name)
            .field("report", self.report.embed.unique_id())
            .finish()
    }
}

impl Node for Page {
    fn owner(&self) -> &Embed {
        &self.report.embed
    }

    fn build_path(&self) -> String {
        format!("/pages/{}", self.name)
    }
}

impl Filterable for Page {}

/// A visual on a page
#[derive(Clone, PartialEq)]
pub struct Visual {
    page: Page,
    name: String,
}

impl Visual {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn page(&self) -> &Page {
        &self.page
    }
}

impl fmt::Debug for Visual {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Visual")
            .field("name", &self.name)
            .field("page", &self.page.name)
            .finish()
    }
}

impl Node for Visual {
    fn owner(&self) -> &Embed {
        self.page.owner()
    }

    fn build_path(&self) -> String {
        format!("/pages/{}/visuals/{}", self.page.name, self.name)
    }
}

impl Filterable for Visual {}
