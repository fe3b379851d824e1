//! Tool Registry Index. Retrieves the tools most relevant to a question by
//! embedding each tool's name and description.

use std::collections::HashSet;
use std::sync::Arc;

use docrouter_core::embedding::Embedder;
use docrouter_core::error::IndexBuildError;
use docrouter_core::tool::Tool;
use tracing::{debug, info};

use crate::store::{VectorIndex, embed_batched};

const EMBED_BATCH: usize = 64;

/// Immutable index of every registered tool.
///
/// Rebuilding produces a new index; readers holding an `Arc` to the old one
/// keep a consistent view.
pub struct ToolRegistryIndex {
    index: VectorIndex<Arc<dyn Tool>>,
    embedder: Arc<dyn Embedder>,
}

impl ToolRegistryIndex {
    /// An index with no tools.
    pub fn empty(embedder: Arc<dyn Embedder>) -> Self {
        Self {
            index: VectorIndex::new(),
            embedder,
        }
    }

    /// Embed and index `tools`. Blank or duplicate names are rejected.
    pub async fn build(
        tools: Vec<Arc<dyn Tool>>,
        embedder: Arc<dyn Embedder>,
    ) -> Result<Self, IndexBuildError> {
        Self::empty(embedder).rebuild(&[], tools).await
    }

    /// A new index without the tools named in `remove` and with `add`.
    ///
    /// Existing description vectors are reused; only added tools are embedded.
    pub async fn rebuild(
        &self,
        remove: &[String],
        add: Vec<Arc<dyn Tool>>,
    ) -> Result<Self, IndexBuildError> {
        let mut seen: HashSet<String> = HashSet::new();
        let mut index = VectorIndex::with_capacity(self.index.len() + add.len());

        for entry in self.index.entries() {
            let name = entry.payload.name();
            if remove.iter().any(|r| r == name) {
                continue;
            }
            seen.insert(name.to_string());
            index.insert(entry.payload.clone(), entry.vector.clone());
        }

        for tool in &add {
            let name = tool.name();
            if name.trim().is_empty() {
                return Err(IndexBuildError::UnnamedTool);
            }
            if !seen.insert(name.to_string()) {
                return Err(IndexBuildError::DuplicateTool(name.to_string()));
            }
        }

        let texts: Vec<String> = add.iter().map(|t| t.retrieval_text()).collect();
        if !texts.is_empty() {
            let vectors = embed_batched(self.embedder.as_ref(), &texts, EMBED_BATCH).await?;
            for (tool, vector) in add.into_iter().zip(vectors) {
                index.insert(tool, vector);
            }
        }

        info!(
            removed = remove.len(),
            added = texts.len(),
            total = index.len(),
            "Tool registry index built"
        );

        Ok(Self {
            index,
            embedder: self.embedder.clone(),
        })
    }

    /// The `k` tools most similar to `query`, best first, ties by name.
    pub async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<Arc<dyn Tool>>, IndexBuildError> {
        if self.index.is_empty() || k == 0 {
            return Ok(Vec::new());
        }

        let query_vector = self.embedder.embed_one(query).await?;
        let hits = self
            .index
            .search(&query_vector, k, |_| true, |a, b| a.name().cmp(b.name()));

        let tools: Vec<Arc<dyn Tool>> = hits.into_iter().map(|hit| hit.payload.clone()).collect();
        debug!(
            k,
            retrieved = ?tools.iter().map(|t| t.name()).collect::<Vec<_>>(),
            "Retrieved tools"
        );
        Ok(tools)
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.index
            .entries()
            .find(|entry| entry.payload.name() == name)
            .map(|entry| entry.payload.clone())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.entries().any(|entry| entry.payload.name() == name)
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Registered tool names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .index
            .entries()
            .map(|entry| entry.payload.name().to_string())
            .collect();
        names.sort();
        names
    }

    pub fn embedder(&self) -> &Arc<dyn Embedder> {
        &self.embedder
    }
}

impl std::fmt::Debug for ToolRegistryIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistryIndex")
            .field("tools", &self.names())
            .field("embedder", &self.embedder.name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::KeywordEmbedder;
    use async_trait::async_trait;
    use docrouter_core::error::ToolError;
    use docrouter_core::tool::ToolResult;

    struct NamedTool {
        name: String,
        description: String,
    }

    #[async_trait]
    impl Tool for NamedTool {
        fn name(&self) -> &str {
            &self.name
        }
        fn description(&self) -> &str {
            &self.description
        }
        fn parameters_schema(&self) -> serde_json::Value {
            serde_json::json!({"type": "object"})
        }
        async fn execute(&self, _arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
            Ok(ToolResult::ok("call", &self.name))
        }
    }

    fn tool(name: &str, description: &str) -> Arc<dyn Tool> {
        Arc::new(NamedTool {
            name: name.into(),
            description: description.into(),
        })
    }

    fn embedder() -> Arc<KeywordEmbedder> {
        Arc::new(KeywordEmbedder::new(&["amazon", "tesla", "summar"]))
    }

    fn tools() -> Vec<Arc<dyn Tool>> {
        vec![
            tool("vector_tool_amazon", "Answer questions over amazon"),
            tool("summary_tool_amazon", "Useful for summarization questions related to amazon"),
            tool("vector_tool_tesla", "Answer questions over tesla"),
            tool("summary_tool_tesla", "Useful for summarization questions related to tesla"),
        ]
    }

    #[tokio::test]
    async fn retrieves_most_relevant_tools() {
        let registry = ToolRegistryIndex::build(tools(), embedder()).await.unwrap();
        assert_eq!(registry.len(), 4);

        let found = registry.retrieve("summarize tesla", 1).await.unwrap();
        assert_eq!(found[0].name(), "summary_tool_tesla");

        let found = registry.retrieve("amazon revenue", 2).await.unwrap();
        let names: Vec<&str> = found.iter().map(|t| t.name()).collect();
        assert!(names.iter().all(|n| n.ends_with("amazon")));
    }

    #[tokio::test]
    async fn retrieve_caps_at_k_and_is_deterministic() {
        let registry = ToolRegistryIndex::build(tools(), embedder()).await.unwrap();
        let first: Vec<String> = registry
            .retrieve("tesla", 3)
            .await
            .unwrap()
            .iter()
            .map(|t| t.name().to_string())
            .collect();
        let second: Vec<String> = registry
            .retrieve("tesla", 3)
            .await
            .unwrap()
            .iter()
            .map(|t| t.name().to_string())
            .collect();
        assert_eq!(first.len(), 3);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn equal_scores_order_by_name() {
        let registry = ToolRegistryIndex::build(
            vec![tool("b_tool", "tesla"), tool("a_tool", "tesla")],
            embedder(),
        )
        .await
        .unwrap();
        let found = registry.retrieve("tesla", 2).await.unwrap();
        assert_eq!(found[0].name(), "a_tool");
        assert_eq!(found[1].name(), "b_tool");
    }

    #[tokio::test]
    async fn empty_registry_returns_nothing_without_embedding() {
        let embedder = embedder();
        let registry = ToolRegistryIndex::build(Vec::new(), embedder.clone()).await.unwrap();
        assert!(registry.retrieve("anything", 3).await.unwrap().is_empty());
        assert_eq!(embedder.calls(), 0);
    }

    #[tokio::test]
    async fn duplicate_names_are_rejected() {
        let err = ToolRegistryIndex::build(
            vec![tool("vector_tool_amazon", "a"), tool("vector_tool_amazon", "b")],
            embedder(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, IndexBuildError::DuplicateTool(ref n) if n == "vector_tool_amazon"));
    }

    #[tokio::test]
    async fn blank_names_are_rejected() {
        let err = ToolRegistryIndex::build(vec![tool("  ", "nameless")], embedder())
            .await
            .unwrap_err();
        assert!(matches!(err, IndexBuildError::UnnamedTool));
    }

    #[tokio::test]
    async fn rebuild_keeps_untouched_tools_and_embeds_only_new_ones() {
        let embedder = embedder();
        let registry = ToolRegistryIndex::build(tools(), embedder.clone()).await.unwrap();
        assert_eq!(embedder.calls(), 1);

        let rebuilt = registry
            .rebuild(
                &["vector_tool_tesla".to_string(), "summary_tool_tesla".to_string()],
                vec![tool("vector_tool_tesla", "Answer questions over the new tesla filing")],
            )
            .await
            .unwrap();
        assert_eq!(embedder.calls(), 2);
        assert_eq!(
            rebuilt.names(),
            vec!["summary_tool_amazon", "vector_tool_amazon", "vector_tool_tesla"]
        );
        // the original snapshot is untouched
        assert_eq!(registry.len(), 4);
        assert!(rebuilt.get("summary_tool_tesla").is_none());
        assert!(rebuilt.contains("vector_tool_amazon"));
    }

    #[tokio::test]
    async fn rebuild_rejects_collision_with_kept_tool() {
        let registry = ToolRegistryIndex::build(tools(), embedder()).await.unwrap();
        let err = registry
            .rebuild(&[], vec![tool("vector_tool_amazon", "again")])
            .await
            .unwrap_err();
        assert!(matches!(err, IndexBuildError::DuplicateTool(_)));
    }
}
