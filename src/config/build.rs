// ABOUTME: Build section of the app config.
// ABOUTME: Declares a prebuilt image or how to build one from source.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuildConfig {
    /// Prebuilt image to deploy instead of building.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    /// Buildpack builder image.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub builder: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub buildpacks: Vec<String>,

    /// Name of a builtin builder.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub builtin: Option<String>,

    /// Settings passed to the builtin builder.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub settings: HashMap<String, serde_json::Value>,

    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub args: HashMap<String, String>,

    /// Dockerfile path, relative to the config file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dockerfile: Option<String>,

    /// Ignore file path, relative to the config file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ignorefile: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build_target: Option<String>,
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

impl BuildConfig {
    pub fn image(&self) -> Option<&str> {
        present(&self.image)
    }

    pub fn builder(&self) -> Option<&str> {
        present(&self.builder)
    }

    pub fn builtin(&self) -> Option<&str> {
        present(&self.builtin)
    }

    pub fn dockerfile(&self) -> Option<&str> {
        present(&self.dockerfile)
    }

    pub fn ignorefile(&self) -> Option<&str> {
        present(&self.ignorefile)
    }

    pub fn build_target(&self) -> Option<&str> {
        present(&self.build_target)
    }

    /// Human-readable list of every build strategy this section declares.
    pub fn strategies(&self) -> Vec<String> {
        let mut strategies = Vec::new();

        if let Some(image) = self.image() {
            strategies.push(format!("the \"{image}\" docker image"));
        }
        if self.builder().is_some() || !self.buildpacks.is_empty() {
            strategies.push("a buildpack".to_string());
        }
        if self.dockerfile().is_some() || self.build_target().is_some() {
            strategies.push("a dockerfile".to_string());
        }
        if let Some(builtin) = self.builtin() {
            strategies.push(format!("the \"{builtin}\" builtin"));
        }

        strategies
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_build_has_no_strategies() {
        assert!(BuildConfig::default().strategies().is_empty());
    }

    #[test]
    fn empty_strings_are_not_strategies() {
        let build = BuildConfig {
            image: Some(String::new()),
            dockerfile: Some(String::new()),
            ..Default::default()
        };
        assert!(build.strategies().is_empty());
    }

    #[test]
    fn lists_each_declared_strategy() {
        let build = BuildConfig {
            image: Some("nginx:1.25".to_string()),
            buildpacks: vec!["heroku/nodejs".to_string()],
            build_target: Some("release".to_string()),
            builtin: Some("node".to_string()),
            ..Default::default()
        };
        assert_eq!(
            build.strategies(),
            vec![
                "the \"nginx:1.25\" docker image".to_string(),
                "a buildpack".to_string(),
                "a dockerfile".to_string(),
                "the \"node\" builtin".to_string(),
            ]
        );
    }
}
