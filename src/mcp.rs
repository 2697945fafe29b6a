use anyhow::Result;
use rmcp::{
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{ServerCapabilities, ServerInfo},
    schemars, tool, tool_handler, tool_router, ServerHandler, ServiceExt,
};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::info;

use crate::build::{BuildList, Direction};
use crate::session::{Session, DEFAULT_OUTPUT};
use crate::source::scan_folder;

// Request structs for tools

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct FolderRequest {
    #[schemars(description = "Folder to list PDFs and images from")]
    pub folder: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct PathRequest {
    #[schemars(description = "Path to a PDF or image file")]
    pub path: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ChangePageRequest {
    #[schemars(description = "Pages to move by, e.g. 1 for next or -1 for previous")]
    pub delta: i32,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct AddToBuildRequest {
    #[schemars(description = "Page ranges (e.g., '1,3-5'); empty or 'All' for every page")]
    #[serde(default)]
    pub range: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct MoveEntryRequest {
    #[schemars(description = "Entry position in the build list (1-based)")]
    pub index: usize,
    #[schemars(description = "'up' or 'down'")]
    pub direction: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct EntryRequest {
    #[schemars(description = "Entry position in the build list (1-based)")]
    pub index: usize,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ExportRequest {
    #[schemars(description = "Output file path (default: Final_Project.pdf)")]
    #[serde(default = "default_output")]
    pub output: String,
}

fn default_output() -> String {
    DEFAULT_OUTPUT.to_string()
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ProjectRequest {
    #[schemars(description = "Path to the JSON project file holding the build list")]
    pub path: String,
}

#[derive(Debug, Clone)]
pub struct BuildServer {
    session: Arc<Mutex<Session>>,
    tool_router: ToolRouter<Self>,
}

impl BuildServer {
    pub fn new() -> Self {
        Self {
            session: Arc::new(Mutex::new(Session::new())),
            tool_router: Self::tool_router(),
        }
    }

    fn session(&self) -> MutexGuard<'_, Session> {
        // a panicked tool call must not wedge the rest of the session
        self.session.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for BuildServer {
    fn default() -> Self {
        Self::new()
    }
}

fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|e| format!("Error: {}", e))
}

fn build_list_result(build: &BuildList) -> Vec<BuildEntryResult> {
    build
        .entries()
        .iter()
        .enumerate()
        .map(|(i, entry)| BuildEntryResult {
            position: i + 1,
            path: entry.source.path().display().to_string(),
            kind: entry.source.kind().to_string(),
            range: entry.range.to_string(),
            rotation: entry.rotation.degrees(),
            label: entry.label(),
        })
        .collect()
}

#[tool_router]
impl BuildServer {
    #[tool(description = "List the PDF and image files directly inside a folder")]
    fn scan_folder(&self, Parameters(FolderRequest { folder }): Parameters<FolderRequest>) -> String {
        match scan_folder(&folder) {
            Ok(sources) => to_json(&sources),
            Err(e) => format!("Error: {}", e),
        }
    }

    #[tool(description = "Open a PDF or image for preview. Resets the page position and rotation.")]
    fn open_source(&self, Parameters(PathRequest { path }): Parameters<PathRequest>) -> String {
        match self.session().open(&path) {
            Ok(page) => to_json(&page),
            Err(e) => format!("Error: {}", e),
        }
    }

    #[tool(description = "Move the preview to another page of the open source")]
    fn change_page(&self, Parameters(req): Parameters<ChangePageRequest>) -> String {
        match self.session().change_page(req.delta as isize) {
            Ok(page) => to_json(&page),
            Err(e) => format!("Error: {}", e),
        }
    }

    #[tool(description = "Rotate the preview a further 90 degrees clockwise. Rotation applies to selections added afterwards.")]
    fn rotate(&self) -> String {
        let mut session = self.session();
        session.rotate();
        match session.current_page() {
            Ok(page) => to_json(&page),
            Err(e) => format!("Error: {}", e),
        }
    }

    #[tool(description = "Describe the page currently shown in the preview")]
    fn page_info(&self) -> String {
        match self.session().current_page() {
            Ok(page) => to_json(&page),
            Err(e) => format!("Error: {}", e),
        }
    }

    #[tool(description = "Add the previewed source to the build list with a page range (e.g., '1,3-5') and the current rotation")]
    fn add_to_build(&self, Parameters(req): Parameters<AddToBuildRequest>) -> String {
        let mut session = self.session();
        match session.add_to_build(&req.range) {
            Ok(_) => to_json(&build_list_result(session.build())),
            Err(e) => format!("Error: {}", e),
        }
    }

    #[tool(description = "Show the build list in export order")]
    fn list_build(&self) -> String {
        to_json(&build_list_result(self.session().build()))
    }

    #[tool(description = "Move a build list entry up or down by one place")]
    fn move_entry(&self, Parameters(req): Parameters<MoveEntryRequest>) -> String {
        let direction: Direction = match req.direction.parse() {
            Ok(d) => d,
            Err(e) => return format!("Error: {}", e),
        };
        let Some(index) = req.index.checked_sub(1) else {
            return "Error: entry positions start at 1".to_string();
        };

        let mut session = self.session();
        session.move_entry(index, direction);
        to_json(&build_list_result(session.build()))
    }

    #[tool(description = "Remove an entry from the build list")]
    fn remove_entry(&self, Parameters(EntryRequest { index }): Parameters<EntryRequest>) -> String {
        let Some(index) = index.checked_sub(1) else {
            return "Error: entry positions start at 1".to_string();
        };

        let mut session = self.session();
        match session.remove_entry(index) {
            Ok(_) => to_json(&build_list_result(session.build())),
            Err(e) => format!("Error: {}", e),
        }
    }

    #[tool(description = "Remove every entry from the build list")]
    fn clear_build(&self) -> String {
        let mut session = self.session();
        session.clear_build();
        session.status().to_string()
    }

    #[tool(description = "Assemble the build list into a single PDF. Nothing is written if any entry fails.")]
    fn export_build(&self, Parameters(ExportRequest { output }): Parameters<ExportRequest>) -> String {
        match self.session().export(&output) {
            Ok(summary) => to_json(&summary),
            Err(e) => format!("Error: {}", e),
        }
    }

    #[tool(description = "Save the build list to a JSON project file")]
    fn save_build(&self, Parameters(ProjectRequest { path }): Parameters<ProjectRequest>) -> String {
        let session = self.session();
        match session.build().save(&path) {
            Ok(()) => to_json(&SaveResult {
                path,
                entries: session.build().len(),
            }),
            Err(e) => format!("Error: {}", e),
        }
    }

    #[tool(description = "Replace the build list with the one stored in a JSON project file")]
    fn load_build(&self, Parameters(ProjectRequest { path }): Parameters<ProjectRequest>) -> String {
        match BuildList::load(&path) {
            Ok(build) => {
                let mut session = self.session();
                session.replace_build(build);
                to_json(&build_list_result(session.build()))
            }
            Err(e) => format!("Error: {}", e),
        }
    }
}

// Result types for MCP tools

#[derive(Debug, Serialize, Deserialize, schemars::JsonSchema)]
pub struct BuildEntryResult {
    pub position: usize,
    pub path: String,
    pub kind: String,
    pub range: String,
    pub rotation: i64,
    pub label: String,
}

#[derive(Debug, Serialize, Deserialize, schemars::JsonSchema)]
pub struct SaveResult {
    pub path: String,
    pub entries: usize,
}

#[tool_handler]
impl ServerHandler for BuildServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Assemble a new PDF from pages of existing PDFs and images. Use scan_folder to \
                 find sources, open_source/change_page/rotate to preview, add_to_build to stage \
                 a page range, move_entry/remove_entry/clear_build to arrange the build list, \
                 and export_build to write the merged PDF."
                    .to_string(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

pub async fn run_server() -> Result<()> {
    let server = BuildServer::new();
    info!("serving MCP on stdio");

    // Serve using stdin/stdout as a tuple
    let service = server.serve((tokio::io::stdin(), tokio::io::stdout())).await?;

    service.waiting().await?;

    Ok(())
}
