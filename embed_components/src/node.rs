//! Addressable nodes and filter operations

use crate::embed::{from_body, to_body, Embed};
use crate::error::EmbedError;
use async_trait::async_trait;
use ipc::Filter;

/// A node operations can be scoped to
pub trait Node {
    /// Instance that owns this node
    fn owner(&self) -> &Embed;

    /// Path relative to the content type's base (`/`, `/pages/{name}`, ...)
    fn build_path(&self) -> String;

    /// Full operation path: type base, node path, then `suffix`
    fn operation_url(&self, suffix: &str) -> String {
        format!(
            "{}{}{}",
            self.owner().embed_type().route_base(),
            self.build_path().trim_end_matches('/'),
            suffix
        )
    }
}

/// Nodes that carry filters
#[async_trait(?Send)]
pub trait Filterable: Node {
    async fn get_filters(&self) -> Result<Vec<Filter>, EmbedError> {
        let owner = self.owner();
        let response = owner
            .channel()
            .get(&self.operation_url("/filters"), Some(owner.addressing()))
            .await?;
        from_body(response.body)
    }

    /// Replaces the node's filters
    async fn set_filters(&self, filters: Vec<Filter>) -> Result<(), EmbedError> {
        let owner = self.owner();
        owner
            .channel()
            .put(
                &self.operation_url("/filters"),
                to_body(&filters)?,
                Some(owner.addressing()),
            )
            .await?;
        Ok(())
    }

    async fn remove_filters(&self) -> Result<(), EmbedError> {
        self.set_filters(Vec::new()).await
    }
}
