//! TOML reading catalog parser.
//!
//! Loads reading levels, materials and badges from TOML files and
//! directories, and validates them.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::model::{Badge, Catalog, Category, ReadingLevel, ReadingMaterial, RequirementType};
use crate::text;

/// Intermediate TOML structure for parsing catalog files.
#[derive(Debug, Deserialize)]
struct TomlCatalogFile {
    catalog: TomlCatalogHeader,
    #[serde(default)]
    levels: Vec<ReadingLevel>,
    #[serde(default)]
    materials: Vec<TomlMaterial>,
    #[serde(default)]
    badges: Vec<Badge>,
}

#[derive(Debug, Deserialize)]
struct TomlCatalogHeader {
    id: String,
    name: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct TomlMaterial {
    id: String,
    title: String,
    content: String,
    level: String,
    #[serde(default = "default_category")]
    category: String,
    #[serde(default)]
    author: String,
    #[serde(default)]
    word_count: Option<u64>,
    #[serde(default = "default_minutes")]
    estimated_time_minutes: u32,
}

fn default_category() -> String {
    "fiction".to_string()
}

fn default_minutes() -> u32 {
    5
}

/// Parse a single TOML file into a `Catalog`.
pub fn parse_catalog(path: &Path) -> Result<Catalog> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read catalog file: {}", path.display()))?;

    parse_catalog_str(&content, path)
}

/// Parse a TOML string into a `Catalog` (useful for testing).
pub fn parse_catalog_str(content: &str, source_path: &Path) -> Result<Catalog> {
    let parsed: TomlCatalogFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    let materials = parsed
        .materials
        .into_iter()
        .map(|m| {
            let category: Category = m
                .category
                .parse()
                .map_err(|e: String| anyhow::anyhow!("material '{}': {}", m.id, e))?;
            // Zero means "not given", as an empty count is never meaningful.
            let word_count = match m.word_count {
                Some(n) if n > 0 => n,
                _ => text::word_count(&m.content) as u64,
            };
            Ok(ReadingMaterial {
                id: m.id,
                title: m.title,
                content: m.content,
                level: m.level,
                category,
                author: m.author,
                word_count,
                estimated_time_minutes: m.estimated_time_minutes,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Catalog {
        id: parsed.catalog.id,
        name: parsed.catalog.name,
        description: parsed.catalog.description,
        levels: parsed.levels,
        materials,
        badges: parsed.badges,
    })
}

/// Recursively load all `.toml` catalog files from a directory.
pub fn load_catalog_directory(dir: &Path) -> Result<Vec<Catalog>> {
    let mut catalogs = Vec::new();

    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
    {
        let entry = entry?;
        let path = entry.path();

        if path.is_dir() {
            catalogs.extend(load_catalog_directory(&path)?);
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            match parse_catalog(&path) {
                Ok(catalog) => catalogs.push(catalog),
                Err(e) => {
                    tracing::warn!("skipping {}: {}", path.display(), e);
                }
            }
        }
    }

    Ok(catalogs)
}

/// Load a catalog from a file, or merge every catalog found in a directory.
pub fn load_catalog(path: &Path) -> Result<Catalog> {
    if !path.is_dir() {
        return parse_catalog(path);
    }
    let mut catalogs = load_catalog_directory(path)?.into_iter();
    let Some(mut merged) = catalogs.next() else {
        anyhow::bail!("no catalog files in {}", path.display());
    };
    for catalog in catalogs {
        merged.levels.extend(catalog.levels);
        merged.materials.extend(catalog.materials);
        merged.badges.extend(catalog.badges);
    }
    Ok(merged)
}

/// A warning from catalog validation.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// The id of the offending entry (if applicable).
    pub item_id: Option<String>,
    /// Warning message.
    pub message: String,
}

impl ValidationWarning {
    fn new(item_id: &str, message: impl Into<String>) -> Self {
        Self {
            item_id: Some(item_id.to_string()),
            message: message.into(),
        }
    }
}

/// Validate a catalog for common issues.
pub fn validate_catalog(catalog: &Catalog) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    let mut seen = HashSet::new();
    for level in &catalog.levels {
        if !seen.insert(&level.id) {
            warnings.push(ValidationWarning::new(&level.id, format!("duplicate level ID: {}", level.id)));
        }
    }
    let level_ids: HashSet<&String> = catalog.levels.iter().map(|l| &l.id).collect();

    let mut seen = HashSet::new();
    for material in &catalog.materials {
        if !seen.insert(&material.id) {
            warnings.push(ValidationWarning::new(
                &material.id,
                format!("duplicate material ID: {}", material.id),
            ));
        }
        if !level_ids.contains(&material.level) {
            warnings.push(ValidationWarning::new(
                &material.id,
                format!("unknown level '{}'", material.level),
            ));
        }
        if material.content.trim().is_empty() {
            warnings.push(ValidationWarning::new(&material.id, "content is empty"));
        }
    }

    let mut seen = HashSet::new();
    for badge in &catalog.badges {
        if !seen.insert(&badge.id) {
            warnings.push(ValidationWarning::new(&badge.id, format!("duplicate badge ID: {}", badge.id)));
        }
        if badge.requirement_type == RequirementType::Unsupported {
            warnings.push(ValidationWarning::new(
                &badge.id,
                "unsupported requirement type; badge can never be earned",
            ));
        }
        if badge.requirement_value <= 0.0 {
            warnings.push(ValidationWarning::new(
                &badge.id,
                "requirement_value is not positive; badge is earned immediately",
            ));
        }
    }

    warnings
}
