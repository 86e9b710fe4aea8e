use async_trait::async_trait;
use serde::Serialize;
use std::path::PathBuf;
use tauri::AppHandle;
use tauri_plugin_dialog::DialogExt;

use super::handlers;
use super::Envelope;

/// Title of the audit directory picker.
pub const FOLDER_DIALOG_TITLE: &str = "Select Audit File Output Directory (Who Changed That)";

/// Host capability for choosing a directory. `None` means the user cancelled.
#[async_trait]
pub trait DirectoryPicker: Send + Sync {
    async fn pick_directory(&self, title: &str) -> Option<PathBuf>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectedFolder {
    pub path: String,
}

/// Native folder dialog provided by the dialog plugin.
pub struct NativeDirectoryPicker {
    app: AppHandle,
}

impl NativeDirectoryPicker {
    pub fn new(app: AppHandle) -> Self {
        Self { app }
    }
}

#[async_trait]
impl DirectoryPicker for NativeDirectoryPicker {
    async fn pick_directory(&self, title: &str) -> Option<PathBuf> {
        let (tx, rx) = tokio::sync::oneshot::channel();
        self.app
            .dialog()
            .file()
            .set_title(title)
            .pick_folder(move |folder| {
                let _ = tx.send(folder);
            });

        let folder = rx.await.ok().flatten()?;
        match folder.into_path() {
            Ok(path) => Some(path),
            Err(e) => {
                log::warn!("Folder dialog returned an unusable path: {}", e);
                None
            }
        }
    }
}

/// Let the user choose the directory the server audit writes to.
#[tauri::command]
pub async fn select_folder(app: AppHandle) -> Result<Envelope<SelectedFolder>, String> {
    Ok(handlers::select_folder(&NativeDirectoryPicker::new(app)).await)
}
