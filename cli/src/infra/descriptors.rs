//! YAML implementation of the `DescriptorSource` port.

use anyhow::{Context, Result};
use rigup_common::{Environment, EnvironmentIndex, Tool, ToolIndex};

use crate::application::ports::{ContentFetcher, DescriptorSource};

pub const TOOLS_INDEX: &str = "tools.yaml";
pub const ENVIRONMENTS_INDEX: &str = "environments.yaml";

/// Reads `tools.yaml` and `environments.yaml` through a content fetcher.
pub struct YamlDescriptorSource<F> {
    fetcher: F,
}

impl<F: ContentFetcher> YamlDescriptorSource<F> {
    pub fn new(fetcher: F) -> Self {
        Self { fetcher }
    }

    async fn fetch_text(&self, path: &str) -> Result<String> {
        let bytes = self.fetcher.fetch_content(path).await?;
        String::from_utf8(bytes).with_context(|| format!("{path} is not valid UTF-8"))
    }
}

impl<F: ContentFetcher> DescriptorSource for YamlDescriptorSource<F> {
    async fn tools(&self) -> Result<Vec<Tool>> {
        let text = self.fetch_text(TOOLS_INDEX).await?;
        let index: ToolIndex =
            serde_yaml::from_str(&text).with_context(|| format!("cannot parse {TOOLS_INDEX}"))?;
        Ok(index.tools)
    }

    async fn environments(&self) -> Result<Vec<Environment>> {
        let text = self.fetch_text(ENVIRONMENTS_INDEX).await?;
        let index: EnvironmentIndex = serde_yaml::from_str(&text)
            .with_context(|| format!("cannot parse {ENVIRONMENTS_INDEX}"))?;
        Ok(index.environments)
    }
}
