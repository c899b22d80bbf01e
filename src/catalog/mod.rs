//! Service catalog and compose file selection
//!
//! The catalog is static data: the services the launcher knows how to
//! deploy, and the mapping from detected platform to the compose variant
//! directory each service's file lives in.

use crate::error::{LauncherError, Result};
use crate::system::{JetsonModel, Platform};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// One deployable service
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Service {
    /// Display name
    pub name: &'static str,
    /// Catalog key: lowercased name, spaces as underscores. Used for
    /// compose file names, project names, and log file names.
    pub key: &'static str,
    /// One-line description
    pub description: &'static str,
    /// Default web UI URL once the container is up
    pub default_url: &'static str,
}

/// All services the launcher can deploy
pub const SERVICES: &[Service] = &[
    Service {
        name: "Ollama",
        key: "ollama",
        description: "Run large language models locally",
        default_url: "http://localhost:3000",
    },
    Service {
        name: "SillyTavern",
        key: "sillytavern",
        description: "Advanced chat UI for LLMs",
        default_url: "http://localhost:8008",
    },
    Service {
        name: "Tavern AI",
        key: "tavern_ai",
        description: "Character-based chat UI for LLMs",
        default_url: "http://localhost:8080",
    },
    Service {
        name: "Oobabooga",
        key: "oobabooga",
        description: "Text generation web UI",
        default_url: "http://localhost:7860",
    },
    Service {
        name: "A1111",
        key: "a1111",
        description: "Stable Diffusion web UI",
        default_url: "http://localhost:7860",
    },
    Service {
        name: "ComfyUI",
        key: "comfyui",
        description: "Node-based UI for Stable Diffusion",
        default_url: "http://localhost:8188",
    },
    Service {
        name: "n8n",
        key: "n8n",
        description: "Workflow automation tool",
        default_url: "http://localhost:5678",
    },
    Service {
        name: "Archon",
        key: "archon",
        description: "AI agent framework",
        default_url: "http://localhost:8501",
    },
    Service {
        name: "Supabase",
        key: "supabase",
        description: "Open source Firebase alternative",
        default_url: "http://localhost:8000",
    },
];

/// Normalize a user-supplied service name to a catalog key
pub fn service_key(name: &str) -> String {
    name.trim().to_lowercase().replace(' ', "_")
}

/// Look up a service by key or display name
pub fn find_service(name: &str) -> Result<&'static Service> {
    let key = service_key(name);
    SERVICES
        .iter()
        .find(|s| s.key == key)
        .ok_or_else(|| LauncherError::UnknownService(name.to_string()))
}

/// Compose file path for a service on a platform, relative to the compose
/// directory root. Every platform that is not explicitly handled falls back
/// to the plain x86 variant.
pub fn compose_rel_path(
    platform: Platform,
    jetson: Option<JetsonModel>,
    key: &str,
) -> PathBuf {
    let dir = match (platform, jetson) {
        (Platform::Dgx, _) => "platforms/nvidia/dgx".to_string(),
        (Platform::Jetson, Some(model)) => {
            format!("platforms/nvidia/jetson/{}", model.as_str())
        }
        (Platform::Nvidia, _) => "platforms/nvidia/rtx".to_string(),
        (Platform::Amd, _) => "platforms/amd".to_string(),
        (Platform::Apple, _) => "platforms/apple".to_string(),
        // Jetson marker present but model unreadable: treat as generic
        _ => "platforms/x86".to_string(),
    };
    PathBuf::from(dir).join(format!("{key}-compose.yaml"))
}

/// Resolve the on-disk compose file for a service, erroring with the
/// expected path when the catalog has no file for this platform
pub fn resolve_compose_file(
    compose_dir: &Path,
    platform: Platform,
    jetson: Option<JetsonModel>,
    key: &str,
) -> Result<PathBuf> {
    let path = compose_dir.join(compose_rel_path(platform, jetson, key));
    if !path.is_file() {
        return Err(LauncherError::ComposeFileMissing(path));
    }
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_service_key_normalization() {
        assert_eq!(service_key("Tavern AI"), "tavern_ai");
        assert_eq!(service_key("ComfyUI"), "comfyui");
        assert_eq!(service_key("  Ollama "), "ollama");
    }

    #[test]
    fn test_find_service() {
        assert_eq!(find_service("ollama").unwrap().name, "Ollama");
        assert_eq!(find_service("Tavern AI").unwrap().key, "tavern_ai");
        assert!(matches!(
            find_service("does-not-exist"),
            Err(LauncherError::UnknownService(_))
        ));
    }

    #[test]
    fn test_catalog_keys_are_normalized_names() {
        for service in SERVICES {
            assert_eq!(service.key, service_key(service.name));
        }
    }

    #[test]
    fn test_compose_path_per_platform() {
        assert_eq!(
            compose_rel_path(Platform::Dgx, None, "ollama"),
            PathBuf::from("platforms/nvidia/dgx/ollama-compose.yaml")
        );
        assert_eq!(
            compose_rel_path(Platform::Jetson, Some(JetsonModel::OrinNx16Gb), "comfyui"),
            PathBuf::from("platforms/nvidia/jetson/orin_nx_16gb/comfyui-compose.yaml")
        );
        assert_eq!(
            compose_rel_path(Platform::Nvidia, None, "a1111"),
            PathBuf::from("platforms/nvidia/rtx/a1111-compose.yaml")
        );
        assert_eq!(
            compose_rel_path(Platform::Amd, None, "ollama"),
            PathBuf::from("platforms/amd/ollama-compose.yaml")
        );
        assert_eq!(
            compose_rel_path(Platform::Apple, None, "ollama"),
            PathBuf::from("platforms/apple/ollama-compose.yaml")
        );
        // Intel, ARM, unknown, and Jetson-without-model all fall back to x86
        assert_eq!(
            compose_rel_path(Platform::Intel, None, "n8n"),
            PathBuf::from("platforms/x86/n8n-compose.yaml")
        );
        assert_eq!(
            compose_rel_path(Platform::Jetson, None, "n8n"),
            PathBuf::from("platforms/x86/n8n-compose.yaml")
        );
    }

    #[test]
    fn test_resolve_missing_file_names_expected_path() {
        let dir = tempfile::tempdir().unwrap();
        let err = resolve_compose_file(dir.path(), Platform::Amd, None, "ollama").unwrap_err();
        match err {
            LauncherError::ComposeFileMissing(path) => {
                assert!(path.ends_with("platforms/amd/ollama-compose.yaml"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_resolve_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("platforms/apple");
        fs::create_dir_all(&target).unwrap();
        fs::write(target.join("ollama-compose.yaml"), "services: {}\n").unwrap();

        let path =
            resolve_compose_file(dir.path(), Platform::Apple, None, "ollama").unwrap();
        assert!(path.is_file());
    }
}
