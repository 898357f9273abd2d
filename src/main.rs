use resource_demo_mcp::{build_state, config::Config, logging, mcp::transport::serve_stdio};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init_logging();

    let config = Config::from_env()?;
    let state = build_state(&config)?;

    info!(
        docs_root = %config.docs_root.display(),
        resources = state.resources.list_static_resources().len(),
        templates = state.resources.list_templates().len(),
        tools = state.tools.list_tools().len(),
        users = state.data.users.len(),
        projects = state.data.projects.len(),
        "server starting on stdio"
    );

    serve_stdio(&state).await?;
    Ok(())
}
