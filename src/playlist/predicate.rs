//! Structured filters for the root playlist query.
//!
//! A playlist definition becomes a [`Predicate`] tree which renders to a SQL
//! fragment with `?` placeholders plus the matching parameter list. Values from
//! the definition never end up inside the SQL text.

use rusqlite::types::Value;

use super::config::{AudioFeature, PlaylistConfig};

/// A column the root playlist query can filter on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    ArtistName,
    Genre,
    Feature(AudioFeature),
}

impl Column {
    /// Qualified column reference inside the root playlist join.
    pub fn sql(self) -> String {
        match self {
            Column::ArtistName => "artists.name".to_string(),
            Column::Genre => "artist_genres.genre".to_string(),
            Column::Feature(feature) => format!("track_audio_features.\"{}\"", feature.as_str()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// `column >= min AND column <= max`, either side optional.
    Range {
        column: Column,
        min: Option<f64>,
        max: Option<f64>,
    },
    /// `column IN (values...)`.
    Membership { column: Column, values: Vec<String> },
    /// Every child must hold. Empty means "no constraint".
    All(Vec<Predicate>),
}

impl Predicate {
    /// Builds the filter for a playlist definition: one node per configured
    /// dimension, combined with AND. Unconfigured dimensions add nothing.
    pub fn from_config(config: &PlaylistConfig) -> Predicate {
        let mut nodes = Vec::new();

        if !config.artists.is_empty() {
            nodes.push(Predicate::Membership {
                column: Column::ArtistName,
                values: config.artists.clone(),
            });
        }

        if !config.genres.is_empty() {
            nodes.push(Predicate::Membership {
                column: Column::Genre,
                values: config.genres.clone(),
            });
        }

        if let Some(features) = &config.audio_features {
            for (feature, range) in features {
                if range.is_unbounded() {
                    continue;
                }
                nodes.push(Predicate::Range {
                    column: Column::Feature(*feature),
                    min: range.min,
                    max: range.max,
                });
            }
        }

        Predicate::All(nodes)
    }

    /// True when the tree constrains nothing.
    pub fn is_empty(&self) -> bool {
        match self {
            Predicate::Range { min, max, .. } => min.is_none() && max.is_none(),
            Predicate::Membership { .. } => false,
            Predicate::All(children) => children.iter().all(Predicate::is_empty),
        }
    }

    /// Renders the tree, appending bound values to `params`.
    ///
    /// Returns `None` for a tree that constrains nothing. An empty membership
    /// list renders as a clause that matches no row.
    pub fn render(&self, params: &mut Vec<Value>) -> Option<String> {
        match self {
            Predicate::Range { column, min, max } => {
                let mut clauses = Vec::new();
                if let Some(min) = min {
                    params.push(Value::Real(*min));
                    clauses.push(format!("{} >= ?", column.sql()));
                }
                if let Some(max) = max {
                    params.push(Value::Real(*max));
                    clauses.push(format!("{} <= ?", column.sql()));
                }
                match clauses.len() {
                    0 => None,
                    1 => clauses.pop().map(|c| format!("({c})")),
                    _ => Some(format!("({})", clauses.join(" AND "))),
                }
            }
            Predicate::Membership { column, values } => {
                if values.is_empty() {
                    return Some("(0 = 1)".to_string());
                }
                let placeholders = vec!["?"; values.len()].join(", ");
                params.extend(values.iter().cloned().map(Value::Text));
                Some(format!("({} IN ({placeholders}))", column.sql()))
            }
            Predicate::All(children) => {
                let rendered: Vec<String> = children
                    .iter()
                    .filter_map(|child| child.render(params))
                    .collect();
                if rendered.is_empty() {
                    None
                } else {
                    Some(rendered.join(" AND "))
                }
            }
        }
    }
}
