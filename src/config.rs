//! # Project Configuration
//!
//! This module defines the per-project configuration stored in `config.yaml`
//! at the root of a changelog project, and the logic for loading and saving it.
//!
//! ## Lookup
//!
//! [`load_project_config`] reads `config.yaml` from the project root. When it
//! is absent, it falls back to `package.yaml` in the parent directory, which
//! lets a package carry its changelog metadata next to its other manifests.
//!
//! ## Fields
//!
//! - `id` (required): the project identifier. The legacy key `project` is
//!   accepted as well.
//! - `name`: display name, defaults to the id.
//! - `description`: free text.
//! - `repository`: forge reference in `owner/name` form, used for links and
//!   publishing.
//! - `components`: the allowed component labels. Either a list of names or a
//!   mapping from name to description.
//! - `modules`: a glob pattern locating sibling changelog projects.
//! - `export_style`: the default notes style, `standard` or `compact`.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};

use crate::defaults::{CONFIG_FILENAME, PACKAGE_FILENAME};
use crate::error::{Error, Result};
use crate::notes::NotesStyle;

/// Structured representation of a changelog project's configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Project identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// Free-text description
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    /// Forge repository reference (`owner/name`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,
    /// Allowed component labels with optional descriptions, in declaration order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<Component>,
    /// Glob pattern for module discovery
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modules: Option<String>,
    /// Default rendering style for release notes
    #[serde(default, skip_serializing_if = "NotesStyle::is_standard")]
    pub export_style: NotesStyle,
}

/// An allowed component label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Component {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
}

impl Config {
    /// Create a minimal configuration with the given id and name.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            repository: None,
            components: Vec::new(),
            modules: None,
            export_style: NotesStyle::Standard,
        }
    }

    /// Names of the allowed components.
    pub fn component_names(&self) -> Vec<String> {
        self.components.iter().map(|c| c.name.clone()).collect()
    }

    /// Returns the canonical spelling of a component, matched case-insensitively.
    ///
    /// When the configuration declares no components, any non-empty label is
    /// accepted as-is.
    pub fn canonical_component(&self, label: &str) -> Option<String> {
        let label = label.trim();
        if label.is_empty() {
            return None;
        }
        if self.components.is_empty() {
            return Some(label.to_string());
        }
        self.components
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(label))
            .map(|c| c.name.clone())
    }
}

/// Returns the default configuration path for a project root.
pub fn default_config_path(project_root: &Path) -> PathBuf {
    project_root.join(CONFIG_FILENAME)
}

/// Parses a YAML string into a [`Config`].
pub fn parse(yaml_content: &str) -> Result<Config> {
    let raw: Value = serde_yaml::from_str(yaml_content)?;
    let map = match raw {
        Value::Mapping(map) => map,
        Value::Null => Mapping::new(),
        _ => {
            return Err(Error::Config {
                message: "config root must be a mapping".to_string(),
                hint: None,
            })
        }
    };
    from_mapping(&map)
}

fn from_mapping(map: &Mapping) -> Result<Config> {
    let id = string_field(map, "id")
        .or_else(|| string_field(map, "project"))
        .ok_or_else(|| Error::Config {
            message: "missing required 'id'".to_string(),
            hint: Some("add 'id: <project-id>' to the configuration".to_string()),
        })?;

    let name = string_field(map, "name").unwrap_or_else(|| id.clone());
    let description = string_field(map, "description").unwrap_or_default();
    let repository = string_field(map, "repository");
    let modules = string_field(map, "modules");

    let export_style = match map.get("export_style") {
        None | Some(Value::Null) => NotesStyle::Standard,
        Some(Value::String(style)) => style.parse().map_err(|_| Error::Config {
            message: format!("'export_style' must be one of: standard, compact (got '{style}')"),
            hint: None,
        })?,
        Some(_) => {
            return Err(Error::Config {
                message: "'export_style' must be a string".to_string(),
                hint: None,
            })
        }
    };

    let components = parse_components(map.get("components"))?;

    Ok(Config {
        id,
        name,
        description,
        repository,
        components,
        modules,
        export_style,
    })
}

fn string_field(map: &Mapping, key: &str) -> Option<String> {
    let text = match map.get(key)? {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Parse the `components` field, which may be a list of names, a mapping of
/// name to description, or a single string.
fn parse_components(value: Option<&Value>) -> Result<Vec<Component>> {
    let mut components: Vec<Component> = Vec::new();
    let mut push = |name: String, description: String| {
        let name = name.trim().to_string();
        if name.is_empty() || components.iter().any(|c| c.name == name) {
            return;
        }
        components.push(Component {
            name,
            description: description.trim().to_string(),
        });
    };

    match value {
        None | Some(Value::Null) => {}
        Some(Value::String(name)) => push(name.clone(), String::new()),
        Some(Value::Sequence(items)) => {
            for item in items {
                match item {
                    Value::String(name) => push(name.clone(), String::new()),
                    Value::Number(n) => push(n.to_string(), String::new()),
                    _ => {
                        return Err(Error::Config {
                            message: "'components' entries must be strings".to_string(),
                            hint: None,
                        })
                    }
                }
            }
        }
        Some(Value::Mapping(map)) => {
            for (key, desc) in map {
                let Some(name) = key.as_str() else {
                    return Err(Error::Config {
                        message: "'components' keys must be strings".to_string(),
                        hint: None,
                    });
                };
                let description = desc.as_str().unwrap_or_default().to_string();
                push(name.to_string(), description);
            }
        }
        Some(_) => {
            return Err(Error::Config {
                message: "'components' must be a list or a mapping".to_string(),
                hint: None,
            })
        }
    }
    Ok(components)
}

/// Load a configuration file from disk.
pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Config> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| Error::Config {
        message: format!("cannot read {}: {}", path.display(), e),
        hint: None,
    })?;
    parse(&content).map_err(|e| match e {
        Error::Config { message, hint } => Error::Config {
            message: format!("{}: {}", path.display(), message),
            hint,
        },
        other => Error::Config {
            message: format!("{}: {}", path.display(), other),
            hint: None,
        },
    })
}

/// Load the configuration for a project root.
///
/// Reads `config.yaml` in the root, falling back to `package.yaml` in the
/// parent directory.
pub fn load_project_config(project_root: &Path) -> Result<Config> {
    let config_path = default_config_path(project_root);
    if config_path.is_file() {
        return from_file(&config_path);
    }
    let package_path = project_root.join("..").join(PACKAGE_FILENAME);
    if package_path.is_file() {
        return from_file(&package_path);
    }
    Err(Error::Config {
        message: format!("no {} found in {}", CONFIG_FILENAME, project_root.display()),
        hint: Some(format!(
            "create {} with at least an 'id' field, or point --root at a changelog project",
            CONFIG_FILENAME
        )),
    })
}

/// Write the configuration to disk, omitting default values.
pub fn save_config(config: &Config, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, to_yaml(config)?)?;
    Ok(())
}

/// Serialize a configuration into the on-disk YAML shape.
///
/// Components without descriptions are written as a plain list; otherwise a
/// mapping from name to description is used.
pub fn to_yaml(config: &Config) -> Result<String> {
    let mut map = Mapping::new();
    map.insert("id".into(), config.id.clone().into());
    map.insert("name".into(), config.name.clone().into());
    if !config.description.is_empty() {
        map.insert("description".into(), config.description.clone().into());
    }
    if let Some(repository) = &config.repository {
        map.insert("repository".into(), repository.clone().into());
    }
    if !config.components.is_empty() {
        let value = if config.components.iter().all(|c| c.description.is_empty()) {
            Value::Sequence(
                config
                    .components
                    .iter()
                    .map(|c| Value::String(c.name.clone()))
                    .collect(),
            )
        } else {
            let mut components = Mapping::new();
            for component in &config.components {
                components.insert(
                    component.name.clone().into(),
                    component.description.clone().into(),
                );
            }
            Value::Mapping(components)
        };
        map.insert("components".into(), value);
    }
    if let Some(modules) = &config.modules {
        map.insert("modules".into(), modules.clone().into());
    }
    if !config.export_style.is_standard() {
        map.insert(
            "export_style".into(),
            config.export_style.as_str().to_string().into(),
        );
    }
    Ok(serde_yaml::to_string(&Value::Mapping(map))?)
}
