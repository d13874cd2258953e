//! KDL configuration for the `quire` command.
//!
//! ```kdl
//! ignored-tags "html" "body" "span"
//! cursor-tag "caret"
//! collapse-whitespace #false
//! media-max-width 640
//! plugins "audio-shortcode" "gutenberg-comments"
//! color "accent" "#00ff00"
//! ```
//!
//! Every node is optional. A missing config file means defaults.

use std::path::{Path, PathBuf};

use kdl::{KdlDocument, KdlNode, KdlValue};
use miette::Diagnostic;
use quire_core::color::parse_color;
use quire_core::{ConverterConfig, Plugin, PluginSet};
use smol_str::SmolStr;

#[derive(thiserror::Error, Debug, Diagnostic)]
pub enum ConfigError {
    #[error("failed to read config file {path}")]
    #[diagnostic(code(quire::config::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Syntax(#[from] kdl::KdlError),

    #[error("`{node}` expects {expected}")]
    #[diagnostic(code(quire::config::invalid_value))]
    InvalidValue {
        node: String,
        expected: &'static str,
    },

    #[error("unknown plugin `{0}`")]
    #[diagnostic(
        code(quire::config::unknown_plugin),
        help("built-in plugins are audio-shortcode, video-shortcode, caption-shortcode and gutenberg-comments")
    )]
    UnknownPlugin(String),
}

/// Settings assembled from the config file.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub converter: ConverterConfig,
    pub plugins: Vec<SmolStr>,
}

impl CliConfig {
    /// Load from `path`, or from the default location when None.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path.map(Path::to_path_buf).or_else(default_config_path) else {
            return Ok(Self::default());
        };
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;
        Self::from_kdl(&text)
    }

    pub fn from_kdl(text: &str) -> Result<Self, ConfigError> {
        let doc: KdlDocument = text.parse()?;
        let mut config = Self::default();

        for node in doc.nodes() {
            let name = node.name().value();
            match name {
                "ignored-tags" => {
                    config.converter.ignored_tags =
                        strings(node)?.into_iter().map(SmolStr::new).collect();
                }
                "cursor-tag" => config.converter.cursor_tag = SmolStr::new(string(node)?),
                "collapse-whitespace" => config.converter.collapse_whitespace = boolean(node)?,
                "more-comment" => config.converter.more_comment = SmolStr::new(string(node)?),
                "page-comment" => config.converter.page_comment = SmolStr::new(string(node)?),
                "media-max-width" => config.converter.media_max_width = integer(node)?,
                "plugins" => {
                    for plugin in strings(node)? {
                        if Plugin::builtin(plugin).is_none() {
                            return Err(ConfigError::UnknownPlugin(plugin.to_string()));
                        }
                        config.plugins.push(SmolStr::new(plugin));
                    }
                }
                "color" => {
                    let [resource, value] = strings(node)?[..] else {
                        return Err(invalid(node, "a name and a color"));
                    };
                    let color = parse_color(value, &config.converter.color_resources)
                        .ok_or_else(|| invalid(node, "a hex or CSS color"))?;
                    config
                        .converter
                        .color_resources
                        .insert(SmolStr::new(resource), color);
                }
                other => tracing::warn!(node = other, "ignoring unknown config node"),
            }
        }
        Ok(config)
    }

    pub fn plugin_set(&self) -> PluginSet {
        self.plugins
            .iter()
            .filter_map(|name| Plugin::builtin(name))
            .fold(PluginSet::new(), PluginSet::with)
    }
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("quire").join("config.kdl"))
}

fn invalid(node: &KdlNode, expected: &'static str) -> ConfigError {
    ConfigError::InvalidValue {
        node: node.name().value().to_string(),
        expected,
    }
}

fn arguments(node: &KdlNode) -> impl Iterator<Item = &KdlValue> {
    node.entries()
        .iter()
        .filter(|entry| entry.name().is_none())
        .map(|entry| entry.value())
}

fn strings(node: &KdlNode) -> Result<Vec<&str>, ConfigError> {
    arguments(node)
        .map(|value| match value {
            KdlValue::String(s) => Ok(s.as_str()),
            _ => Err(invalid(node, "string arguments")),
        })
        .collect()
}

fn string(node: &KdlNode) -> Result<&str, ConfigError> {
    match strings(node)?[..] {
        [value] => Ok(value),
        _ => Err(invalid(node, "one string argument")),
    }
}

fn boolean(node: &KdlNode) -> Result<bool, ConfigError> {
    match arguments(node).collect::<Vec<_>>()[..] {
        [KdlValue::Bool(value)] => Ok(*value),
        _ => Err(invalid(node, "#true or #false")),
    }
}

fn integer(node: &KdlNode) -> Result<u32, ConfigError> {
    match arguments(node).collect::<Vec<_>>()[..] {
        [KdlValue::Integer(value)] => {
            u32::try_from(*value).map_err(|_| invalid(node, "a positive integer"))
        }
        _ => Err(invalid(node, "one integer argument")),
    }
}
