//! MCP server exposing the implementors index.

use crate::format::{
    format_implementors, format_load_report, format_search_results, format_traits,
    format_unknown_trait,
};
use crate::fragment::{FragmentLayout, render_fragment};
use crate::registry::Delivery;
use crate::search::{search_implementors, suggest_traits};
use crate::state::IndexState;
use crate::types::TraitPath;
use rmcp::{
    ServerHandler,
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::*,
    schemars::{self, JsonSchema, generate::SchemaSettings},
    tool, tool_handler, tool_router,
};
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;

/// Number of trait suggestions offered for an unknown trait path.
const SUGGESTION_COUNT: usize = 5;

/// Parameters for load_docs tool
#[derive(Debug, Deserialize, JsonSchema)]
pub struct LoadDocsRequest {
    /// Documentation root (e.g. `target/doc`) or its `implementors` directory.
    /// Uses the configured or auto-detected root when omitted.
    #[serde(default)]
    pub path: Option<String>,
}

/// Parameters for list_traits tool
#[derive(Debug, Deserialize, JsonSchema)]
pub struct ListTraitsRequest {
    /// Only list traits defined in this crate (e.g. `core`, `serde`)
    #[serde(default)]
    pub crate_filter: Option<String>,
}

/// Parameters for list_implementors tool
#[derive(Debug, Deserialize, JsonSchema)]
pub struct ListImplementorsRequest {
    /// Full trait path, e.g. `core::hash::Hash`
    pub trait_path: String,
    /// Only show implementations contributed by this crate
    #[serde(default)]
    pub group: Option<String>,
}

/// Parameters for search_implementors tool
#[derive(Debug, Deserialize, JsonSchema)]
pub struct SearchImplementorsRequest {
    /// Type or trait name to look for
    pub query: String,
    /// Maximum number of results (defaults to the configured search limit)
    #[serde(default)]
    pub limit: Option<usize>,
}

/// Parameters for register_fragment tool
#[derive(Debug, Deserialize, JsonSchema)]
pub struct RegisterFragmentRequest {
    /// Trait the fragment belongs to, e.g. `core::hash::Hash`
    pub trait_path: String,
    /// Fragment script text
    pub source: String,
    /// Initialize pages that are still waiting, flushing their pending fragments
    #[serde(default)]
    pub initialize: bool,
}

/// Parameters for export_fragment tool
#[derive(Debug, Deserialize, JsonSchema)]
pub struct ExportFragmentRequest {
    /// Trait whose registered implementors should be written out
    pub trait_path: String,
    /// Emit one `implementors[...] = ...` assignment per crate instead of a single object
    #[serde(default)]
    pub assignments: bool,
}

/// MCP Server for implementor queries
#[derive(Clone)]
pub struct ImplementorServer {
    /// Shared index state
    state: Arc<IndexState>,

    /// Tool router for handling MCP tool calls
    tool_router: ToolRouter<Self>,
}

impl std::fmt::Debug for ImplementorServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImplementorServer")
            .field("state", &self.state)
            .finish()
    }
}

#[tool_router]
impl ImplementorServer {
    /// Create a new server around shared state.
    pub fn new(state: Arc<IndexState>) -> Self {
        Self {
            state,
            tool_router: Self::tool_router(),
        }
    }

    /// Get a reference to the shared state.
    pub fn state(&self) -> &Arc<IndexState> {
        &self.state
    }

    #[tool(
        description = "Load the trait implementors index of a rustdoc output directory (e.g. target/doc). Without a path, uses the configured or auto-detected documentation root.",
        input_schema = inline_schema_for_type::<LoadDocsRequest>()
    )]
    async fn load_docs(
        &self,
        Parameters(request): Parameters<LoadDocsRequest>,
    ) -> std::result::Result<String, String> {
        let explicit = request
            .path
            .as_deref()
            .map(|p| PathBuf::from(crate::config::expand_tilde(p).as_ref()));

        let (root, report) = self
            .state
            .load(explicit.as_deref())
            .await
            .map_err(|e| format!("Failed to load docs: {:#}", e))?;

        let stats = self.state.index().await.stats();
        Ok(format_load_report(&root, &report, stats))
    }

    #[tool(
        description = "List traits that have implementors in the loaded documentation, with implementation counts. Optionally restrict to traits defined in one crate.",
        input_schema = inline_schema_for_type::<ListTraitsRequest>()
    )]
    async fn list_traits(
        &self,
        Parameters(request): Parameters<ListTraitsRequest>,
    ) -> std::result::Result<String, String> {
        let index = self.state.index().await;
        Ok(format_traits(&index, request.crate_filter.as_deref()))
    }

    #[tool(
        description = "List every known implementation of a trait, grouped by the crate that provides it. Accepts full trait paths like 'core::hash::Hash'.",
        input_schema = inline_schema_for_type::<ListImplementorsRequest>()
    )]
    async fn list_implementors(
        &self,
        Parameters(request): Parameters<ListImplementorsRequest>,
    ) -> std::result::Result<String, String> {
        let trait_path = TraitPath::new(&request.trait_path);
        let index = self.state.index().await;

        match index.implementors(&trait_path) {
            Some(snapshot) => Ok(format_implementors(
                &trait_path,
                snapshot,
                request.group.as_deref(),
            )),
            None => {
                let suggestions = suggest_traits(&index, trait_path.as_str(), SUGGESTION_COUNT);
                Err(format_unknown_trait(&trait_path, &suggestions))
            }
        }
    }

    #[tool(
        description = "Search implementations by implementing type name, signature text or trait name. Returns results ranked by relevance.",
        input_schema = inline_schema_for_type::<SearchImplementorsRequest>()
    )]
    async fn search_implementors(
        &self,
        Parameters(request): Parameters<SearchImplementorsRequest>,
    ) -> std::result::Result<String, String> {
        let limit = request
            .limit
            .unwrap_or(self.state.config().search_limit);
        let index = self.state.index().await;
        let hits = search_implementors(&index, &request.query, limit);
        Ok(format_search_results(&request.query, &hits))
    }

    #[tool(
        description = "Register an implementors fragment script for a trait. The fragment is delivered immediately if the trait's page is initialized, or held as pending until pages are initialized.",
        input_schema = inline_schema_for_type::<RegisterFragmentRequest>()
    )]
    async fn register_fragment(
        &self,
        Parameters(request): Parameters<RegisterFragmentRequest>,
    ) -> std::result::Result<String, String> {
        let trait_path = TraitPath::new(&request.trait_path);
        let delivery = self
            .state
            .register_fragment(trait_path.clone(), &request.source)
            .await
            .map_err(|e| format!("{:#}", e))?;

        let mut response = match delivery {
            Delivery::Registered => format!("Registered fragment for {}.\n", trait_path),
            Delivery::Deferred => format!("Fragment for {} is pending.\n", trait_path),
        };
        if request.initialize {
            let flushed = self.state.initialize_pending().await;
            response.push_str(&format!("Initialized pages, flushed {} pending fragments.\n", flushed));
        }
        Ok(response)
    }

    #[tool(
        description = "Write the registered implementors of a trait back out as a self-registering fragment script.",
        input_schema = inline_schema_for_type::<ExportFragmentRequest>()
    )]
    async fn export_fragment(
        &self,
        Parameters(request): Parameters<ExportFragmentRequest>,
    ) -> std::result::Result<String, String> {
        let trait_path = TraitPath::new(&request.trait_path);
        let index = self.state.index().await;
        let Some(snapshot) = index.implementors(&trait_path) else {
            let suggestions = suggest_traits(&index, trait_path.as_str(), SUGGESTION_COUNT);
            return Err(format_unknown_trait(&trait_path, &suggestions));
        };

        let layout = if request.assignments {
            FragmentLayout::Assignments
        } else {
            FragmentLayout::Object
        };
        render_fragment(&snapshot.to_map(), layout).map_err(|e| format!("{:#}", e))
    }
}

#[tool_handler]
impl ServerHandler for ImplementorServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo::new(ServerCapabilities::builder().enable_tools().build())
            .with_protocol_version(ProtocolVersion::V_2024_11_05)
            .with_server_info(Implementation::from_build_env())
            .with_instructions(
                "rustdoc-implementors: browse which types implement which traits in generated Rust documentation. \
                 The documentation root is detected on startup; use load_docs to load another one, \
                 then list_traits, list_implementors or search_implementors.",
            )
    }
}

/// Generate an inline JSON schema for MCP tools
///
/// Unlike rmcp's default `schema_for_type()`, this function sets `inline_subschemas = true`
/// to generate inline enum definitions instead of $ref patterns.
pub fn inline_schema_for_type<T: JsonSchema>() -> Arc<JsonObject> {
    let mut settings = SchemaSettings::draft07();
    settings.transforms = vec![Box::new(schemars::transform::AddNullable::default())];
    settings.inline_subschemas = true;

    let generator = settings.into_generator();
    let schema = generator.into_root_schema_for::<T>();
    let object = serde_json::to_value(schema).expect("failed to serialize schema");

    let serde_json::Value::Object(json_object) = object else {
        panic!("Schema serialization produced non-object value");
    };

    Arc::new(json_object)
}
