use std::sync::Arc;

pub mod config;
pub mod domain;
pub mod errors;
pub mod logging;
pub mod mcp;
pub mod router;

use config::Config;
use domain::{
    files::DocumentRoot, resources::register_resources, store::SampleData, tools::register_tools,
};
use errors::RegistryError;
use router::{resources::ResourceRouter, subscriptions::ResourceEvents, tools::ToolRegistry};

#[derive(Clone)]
pub struct AppState {
    pub resources: Arc<ResourceRouter>,
    pub tools: Arc<ToolRegistry>,
    pub events: ResourceEvents,
    pub data: SampleData,
}

impl AppState {
    pub fn new(
        resources: ResourceRouter,
        tools: ToolRegistry,
        events: ResourceEvents,
        data: SampleData,
    ) -> Self {
        Self {
            resources: Arc::new(resources),
            tools: Arc::new(tools),
            events,
            data,
        }
    }
}

/// Seeds the sample dataset and registers every resource and tool.
pub fn build_state(config: &Config) -> Result<AppState, RegistryError> {
    let data = SampleData::seeded();
    let events = ResourceEvents::new();
    let docs = DocumentRoot::new(&config.docs_root);

    let mut resources = ResourceRouter::new();
    register_resources(&mut resources, &data, &docs, &config.readme_file)?;

    let mut tools = ToolRegistry::new();
    register_tools(&mut tools, &data, &events)?;

    Ok(AppState::new(resources, tools, events, data))
}
