mod client;
mod installer;
mod supervisor;
mod typescript_adapter;

pub use client::{path_to_uri, uri_to_path, LspClient};
pub use installer::FsInstaller;
pub use supervisor::LspSupervisor;
pub use typescript_adapter::TypeScriptAdapter;
