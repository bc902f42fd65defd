//! Server-side configuration file.
//!
//! ```toml
//! [server]
//! listen = "0.0.0.0:8080"
//! cors_origins = ["http://localhost:5173"]
//!
//! [storage]
//! data_dir = "/var/lib/faena"
//!
//! [[catalog.especies]]
//! nombre = "Bovino"
//! categorias = ["Vaquillona", "Novillo"]
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use faena::model::CatalogSeed;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub server: ListenConfig,
    pub storage: StorageConfig,
    /// Reference data inserted at start-up.
    #[serde(default)]
    pub catalog: CatalogSeed,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListenConfig {
    /// Listen address; `--listen` overrides it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub listen: Option<String>,
    /// Origins allowed by CORS. Empty allows any origin.
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    pub data_dir: String,
    /// Defaults to `{data_dir}/faena.sqlite`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sqlite_path: Option<String>,
}

impl ServerConfig {
    /// Resolve a context name or path. A bare name maps to
    /// `/etc/faena/<name>.toml`; anything with `/` or `.` is used as given.
    pub fn resolve_path(name_or_path: &str) -> PathBuf {
        if name_or_path.contains('/') || name_or_path.contains('.') {
            PathBuf::from(name_or_path)
        } else {
            PathBuf::from(format!("/etc/faena/{}.toml", name_or_path))
        }
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read {}: {}", path.display(), e))?;
        let config: ServerConfig = toml::from_str(&content)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_path() {
        assert_eq!(
            ServerConfig::resolve_path("chaco"),
            PathBuf::from("/etc/faena/chaco.toml")
        );
        assert_eq!(
            ServerConfig::resolve_path("./faenad.toml"),
            PathBuf::from("./faenad.toml")
        );
    }

    #[test]
    fn test_load_full_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("faenad.toml");
        std::fs::write(
            &path,
            r#"
[server]
listen = "127.0.0.1:9000"
cors_origins = ["http://localhost:5173"]

[storage]
data_dir = "/tmp/faena"

[catalog]
enfermedades = ["Hidatidosis"]
tipos_parte = ["Hígado", "Pulmón"]

[[catalog.especies]]
nombre = "Bovino"
categorias = ["Vaquillona", "Novillo"]

[[catalog.titulares]]
nombre = "Frigorífico Municipal"
cuit = "30-12345678-9"
"#,
        )
        .unwrap();

        let config = ServerConfig::load(&path).unwrap();
        assert_eq!(config.server.listen.as_deref(), Some("127.0.0.1:9000"));
        assert_eq!(config.server.cors_origins.len(), 1);
        assert_eq!(config.storage.data_dir, "/tmp/faena");
        assert!(config.storage.sqlite_path.is_none());
        assert_eq!(config.catalog.especies[0].categorias[1], "Novillo");
        assert_eq!(config.catalog.tipos_parte.len(), 2);
        assert_eq!(config.catalog.titulares[0].cuit.as_deref(), Some("30-12345678-9"));
    }

    #[test]
    fn test_minimal_config() {
        let config: ServerConfig = toml::from_str("[storage]\ndata_dir = \"data\"\n").unwrap();
        assert!(config.server.listen.is_none());
        assert!(config.catalog.especies.is_empty());
    }

    #[test]
    fn test_missing_file() {
        assert!(ServerConfig::load(Path::new("/nonexistent/faenad.toml")).is_err());
    }
}
