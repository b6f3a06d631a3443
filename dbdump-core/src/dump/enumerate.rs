//! Schema object discovery.
//!
//! Runs the adapter's listing query for every enabled object kind and
//! records names in result order. Non-empty include lists restrict tables
//! and views; exclusion patterns are applied later, at export time.

use crate::{
    Result,
    adapters::DumpAdapter,
    error::DumpError,
    models::{ObjectKind, SchemaObjects},
    settings::Settings,
    source::DataSource,
};

/// Outcome of one enumeration pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Enumeration {
    /// Discovered names per kind
    pub objects: SchemaObjects,
    /// Include-table entries that matched no table
    pub unmatched_tables: Vec<String>,
    /// Include-view entries that matched no view
    pub unmatched_views: Vec<String>,
}

/// Object kinds to enumerate under the current settings, in export order.
pub fn enabled_kinds(settings: &Settings) -> Vec<ObjectKind> {
    let mut kinds = vec![ObjectKind::Table, ObjectKind::View];
    if !settings.is_enabled("skip-triggers") {
        kinds.push(ObjectKind::Trigger);
    }
    if settings.is_enabled("routines") {
        kinds.push(ObjectKind::Function);
        kinds.push(ObjectKind::Procedure);
    }
    if settings.is_enabled("events") {
        kinds.push(ObjectKind::Event);
    }
    kinds
}

/// Discovers schema object names.
///
/// # Errors
/// Returns the data source error of a failed listing query, or
/// [`DumpError::UnexpectedResult`] for a row without a name.
pub async fn enumerate(
    source: &mut dyn DataSource,
    adapter: &dyn DumpAdapter,
    settings: &Settings,
    database: &str,
) -> Result<Enumeration> {
    let mut include_tables = settings.include_tables().to_vec();
    let mut include_views = settings.include_views().to_vec();
    let mut objects = SchemaObjects::default();

    for kind in enabled_kinds(settings) {
        let rows = source.query(&adapter.list_objects(kind, database)).await?;
        let include = match kind {
            ObjectKind::Table => Some(&mut include_tables),
            ObjectKind::View => Some(&mut include_views),
            _ => None,
        };
        let names = select_names(adapter, kind, &rows, include)?;
        tracing::debug!("Found {} {}(s)", names.len(), kind);
        *objects.names_mut(kind) = names;
    }

    Ok(Enumeration {
        objects,
        unmatched_tables: include_tables,
        unmatched_views: include_views,
    })
}

fn select_names(
    adapter: &dyn DumpAdapter,
    kind: ObjectKind,
    rows: &[crate::models::Row],
    mut include: Option<&mut Vec<String>>,
) -> Result<Vec<String>> {
    // Fixed before the loop: draining the list must not turn filtering off.
    let filtering = include.as_ref().is_some_and(|list| !list.is_empty());
    let mut names = Vec::with_capacity(rows.len());
    for row in rows {
        let name = adapter.listed_name(kind, row).ok_or_else(|| {
            DumpError::unexpected_result(format!("{} listing returned a row without a name", kind))
        })?;
        if !filtering {
            names.push(name.to_string());
            continue;
        }
        if let Some(list) = include.as_deref_mut() {
            if let Some(position) = list.iter().position(|wanted| wanted == name) {
                list.remove(position);
                names.push(name.to_string());
            }
        }
    }
    Ok(names)
}
