use handlebars::{Handlebars, RenderError, TemplateError};
use serde::Serialize;

use crate::record::PersonnelForm;
use crate::state::{DashboardState, LoadStatus};
use crate::view::{SummaryStats, TableRow, division_entries, render_personnel_table};

const DASHBOARD_TEMPLATE: &str = include_str!("./templates/dashboard.hbs");

/// Alert shown above the dashboard after an action
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    /// "success" or "error", used as a CSS class suffix
    pub kind: &'static str,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Notice {
            kind: "success",
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Notice {
            kind: "error",
            message: message.into(),
        }
    }
}

#[derive(Debug, Serialize)]
struct DivisionLink {
    name: String,
    active: bool,
    href: String,
}

#[derive(Debug, Serialize)]
struct Choice {
    value: String,
    selected: bool,
}

#[derive(Debug, Serialize)]
struct PageContext<'a> {
    stats: SummaryStats,
    rows: Vec<TableRow>,
    divisions: Vec<DivisionLink>,
    search_term: &'a str,
    load_error: Option<&'a str>,
    empty: bool,
    notice: Option<&'a Notice>,
    form: &'a PersonnelForm,
    ranks: Vec<Choice>,
    division_choices: Vec<Choice>,
    fetched_at: Option<String>,
}

/// Page-level inputs that do not come from the dashboard state
#[derive(Debug, Default)]
pub struct PageOptions<'a> {
    /// Configured division list; empty falls back to the divisions in the data
    pub divisions: &'a [String],
    /// Configured rank choices; empty renders a free-text input
    pub ranks: &'a [String],
    pub notice: Option<&'a Notice>,
    /// Values to put back into the add form
    pub form: Option<&'a PersonnelForm>,
}

/// Renders the dashboard HTML from a [`DashboardState`]
pub struct PageRenderer {
    registry: Handlebars<'static>,
}

impl PageRenderer {
    pub fn new() -> Result<Self, TemplateError> {
        let mut registry = Handlebars::new();
        registry.register_template_string("dashboard", DASHBOARD_TEMPLATE)?;
        Ok(PageRenderer { registry })
    }

    /// Render the full dashboard page
    ///
    /// Cell text is HTML-escaped by the template engine.
    pub fn render(
        &self,
        state: &DashboardState,
        options: &PageOptions<'_>,
    ) -> Result<String, RenderError> {
        let empty_form = PersonnelForm::default();
        let form = options.form.unwrap_or(&empty_form);

        let divisions: &[String] = if options.divisions.is_empty() {
            &state.known_divisions
        } else {
            options.divisions
        };

        let load_error = match &state.load_status {
            LoadStatus::Failed(reason) => Some(reason.as_str()),
            _ => None,
        };

        let context = PageContext {
            stats: state.stats,
            rows: render_personnel_table(&state.records),
            divisions: division_entries(divisions, state.active_division.as_deref())
                .into_iter()
                .map(|entry| DivisionLink {
                    href: format!("/division/{}", urlencoding::encode(&entry.name)),
                    name: entry.name,
                    active: entry.active,
                })
                .collect(),
            search_term: state.search_term.as_deref().unwrap_or(""),
            load_error,
            empty: state.records.is_empty() && state.load_status == LoadStatus::Loaded,
            notice: options.notice,
            form,
            ranks: choices(options.ranks, &form.rank),
            division_choices: choices(options.divisions, &form.division),
            fetched_at: state
                .fetched_at
                .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string()),
        };

        self.registry.render("dashboard", &context)
    }
}

fn choices(values: &[String], current: &str) -> Vec<Choice> {
    values
        .iter()
        .map(|value| Choice {
            value: value.clone(),
            selected: value == current,
        })
        .collect()
}
