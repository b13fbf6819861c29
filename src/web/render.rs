//! HTML rendering for the tracker pages.
//!
//! Every user-supplied string goes through [`escape`] before it reaches the
//! markup.

use std::collections::BTreeSet;
use std::fmt::Write;

use super::session::{AdminAction, Flash, FlashKind, SessionState};
use crate::entity::{FilamentDraft, FilamentRecord};
use crate::filter::{FilterOptions, Selection};

pub const PAGE_TITLE: &str = "Fredrickson's Printing - Filament Tracker";

const STYLE: &str = r#"
:root { --fp-blue: #4169E1; }
body { font-family: system-ui, sans-serif; margin: 0; color: #212529; background: #f8f9fa; }
.layout { display: flex; min-height: 100vh; }
.sidebar { width: 14rem; padding: 1.5rem; background: #eef1f6; }
.main { flex: 1; padding: 2rem; }
.fp-header { background: var(--fp-blue); color: white; padding: 2rem; border-radius: 10px; text-align: center; margin-bottom: 2rem; }
.fp-title { font-size: 2.5rem; font-weight: bold; margin-bottom: 0.5rem; }
.fp-subtitle { font-size: 1.5rem; opacity: 0.9; }
h3 { color: var(--fp-blue); border-bottom: 2px solid var(--fp-blue); padding-bottom: 0.5rem; margin-top: 2rem; }
button { background: var(--fp-blue); color: white; padding: 0.5rem 2rem; border-radius: 5px; border: none; cursor: pointer; }
button.secondary { background: #6c757d; }
button.danger { background: #c0392b; }
input[type=text], input[type=password], select { border: 1px solid var(--fp-blue); border-radius: 5px; padding: 0.5rem; }
.columns { display: flex; gap: 1.5rem; flex-wrap: wrap; }
.columns > div { flex: 1; min-width: 12rem; display: flex; flex-direction: column; gap: 0.5rem; }
.flash { padding: 0.75rem 1rem; border-radius: 5px; margin-bottom: 1rem; }
.flash.success { background: #d4edda; color: #155724; }
.flash.error { background: #f8d7da; color: #721c24; }
table.inventory { width: 100%; border-collapse: collapse; border: 2px solid #dee2e6; font-size: 1.1rem; background: white; }
table.inventory th { background: var(--fp-blue); color: white; padding: 15px; text-align: left; white-space: nowrap; }
table.inventory td { padding: 12px; border: 1px solid #dee2e6; }
table.inventory tr:hover td { background: #f1f3f5; }
.color-preview { display: inline-block; width: 30px; height: 30px; border-radius: 50%; border: 2px solid #dee2e6; vertical-align: middle; }
"#;

/// Escape text for use in element content and quoted attributes.
pub fn escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Small filled circle in the record's color.
pub fn swatch(record: &FilamentRecord) -> String {
    format!(
        r#"<div class="color-preview" style="background-color: {};" title="{}"></div>"#,
        escape(record.color_hex.as_str()),
        escape(record.color_hex.as_str())
    )
}

fn layout(body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title}</title>
<style>{style}</style>
</head>
<body>
{body}
</body>
</html>
"#,
        title = escape(PAGE_TITLE),
        style = STYLE,
        body = body
    )
}

fn header() -> &'static str {
    r#"<div class="fp-header">
<div class="fp-title">Fredrickson's Printing</div>
<div class="fp-subtitle">Filament Inventory Management System</div>
</div>"#
}

fn flash_html(flash: Option<&Flash>) -> String {
    match flash {
        Some(flash) => {
            let class = match flash.kind {
                FlashKind::Success => "success",
                FlashKind::Error => "error",
            };
            format!(
                r#"<div class="flash {}" role="status">{}</div>"#,
                class,
                escape(&flash.message)
            )
        }
        None => String::new(),
    }
}

/// Unauthenticated view: a password box and a login button, nothing else.
pub fn login_page(flash: Option<&Flash>) -> String {
    let body = format!(
        r#"<div class="main">
{header}
{flash}
<h3>Welcome to Fredrickson's Printing</h3>
<p>Please login to access the filament inventory system.</p>
<form method="post" action="/login">
<label>Enter password: <input type="password" name="password" autofocus></label>
<button type="submit">Login</button>
</form>
</div>"#,
        header = header(),
        flash = flash_html(flash)
    );
    layout(&body)
}

/// Full-page error, used when the inventory cannot be read.
pub fn error_page(message: &str, authenticated: bool) -> String {
    let logout = if authenticated {
        logout_form()
    } else {
        String::new()
    };
    let body = format!(
        r#"<div class="main">
{header}
<div class="flash error" role="alert">{message}</div>
{logout}
</div>"#,
        header = header(),
        message = escape(message),
        logout = logout
    );
    layout(&body)
}

/// Everything the authenticated inventory page shows.
pub struct InventoryView<'a> {
    pub session: &'a SessionState,
    /// Full collection, feeding the edit selector
    pub records: &'a [FilamentRecord],
    /// Filtered rows for the table
    pub visible: &'a [FilamentRecord],
    pub options: &'a FilterOptions,
    pub selection: &'a Selection,
    pub flash: Option<&'a Flash>,
}

pub fn inventory_page(view: &InventoryView<'_>) -> String {
    let mut main = String::new();
    main.push_str(header());
    main.push_str(&flash_html(view.flash));

    if view.session.admin_visible {
        main.push_str(&admin_panel(view.session, view.records));
    }

    main.push_str(&filter_form(view.options, view.selection));
    main.push_str(&inventory_table(view.visible));
    main.push_str(&logout_form());

    let body = format!(
        r#"<div class="layout">
<nav class="sidebar">
<h3>Controls</h3>
<form method="post" action="/admin/toggle">
<button type="submit">Toggle Admin Interface</button>
</form>
</nav>
<div class="main">
{main}
</div>
</div>"#,
        main = main
    );
    layout(&body)
}

fn logout_form() -> String {
    r#"<form method="post" action="/logout" class="logout">
<button type="submit" class="secondary">Logout</button>
</form>"#
        .to_string()
}

fn admin_panel(session: &SessionState, records: &[FilamentRecord]) -> String {
    let mut html = String::from("<section class=\"admin\">\n<h3>Inventory Management</h3>\n");

    let _ = write!(
        html,
        r#"<form method="post" action="/admin/action" class="action-switch">
<label><input type="radio" name="action" value="add"{add}> Add New Filament</label>
<label><input type="radio" name="action" value="edit"{edit}> Edit Existing Filament</label>
<button type="submit" class="secondary">Select Action</button>
</form>
"#,
        add = checked(session.admin_action == AdminAction::Add),
        edit = checked(session.admin_action == AdminAction::Edit)
    );

    match session.admin_action {
        AdminAction::Add => {
            let draft = session.pending_draft.clone().unwrap_or_else(|| {
                FilamentDraft::new("", "", "", 50, "#000000")
            });
            html.push_str(&add_form(&draft));
        }
        AdminAction::Edit => html.push_str(&edit_forms(session.edit_index, records)),
    }

    html.push_str("</section>\n");
    html
}

fn checked(on: bool) -> &'static str {
    if on {
        " checked"
    } else {
        ""
    }
}

fn selected(on: bool) -> &'static str {
    if on {
        " selected"
    } else {
        ""
    }
}

/// Color, company, type, remaining and hex inputs shared by both forms.
fn record_fields(draft: &FilamentDraft) -> String {
    let picker_value = draft
        .color_hex
        .parse::<crate::entity::ColorHex>()
        .map(|hex| hex.as_str().to_ascii_lowercase())
        .unwrap_or_else(|_| "#000000".to_string());

    format!(
        r#"<div class="columns">
<div>
<label>Color Name <input type="text" name="color" value="{color}"></label>
<label>Select Color <input type="color" name="color_hex" value="{hex}"></label>
</div>
<div>
<label>Company <input type="text" name="company" value="{company}"></label>
<label>Type <input type="text" name="type" value="{kind}"></label>
</div>
<div>
<label>Remaining % <input type="range" name="remaining" min="0" max="100" value="{remaining}"></label>
</div>
</div>
"#,
        color = escape(&draft.color),
        hex = escape(&picker_value),
        company = escape(&draft.company),
        kind = escape(&draft.kind),
        remaining = draft.remaining.clamp(0, 100)
    )
}

fn add_form(draft: &FilamentDraft) -> String {
    format!(
        r#"<form method="post" action="/filaments" class="add-filament">
{fields}<button type="submit">Add Filament</button>
</form>
"#,
        fields = record_fields(draft)
    )
}

fn edit_forms(edit_index: usize, records: &[FilamentRecord]) -> String {
    if records.is_empty() {
        return "<p>No filaments to edit.</p>\n".to_string();
    }

    let index = if edit_index < records.len() { edit_index } else { 0 };
    let current = &records[index];

    let mut options = String::new();
    for (i, record) in records.iter().enumerate() {
        let _ = writeln!(
            options,
            r#"<option value="{}"{}>{}</option>"#,
            i,
            selected(i == index),
            escape(&record.label())
        );
    }

    format!(
        r#"<form method="post" action="/admin/select" class="select-filament">
<label>Select Filament to Edit <select name="index">
{options}</select></label>
<button type="submit" class="secondary">Select</button>
</form>
<form method="post" action="/filaments/{index}/update" class="edit-filament">
{expected}{fields}<button type="submit">Update Filament</button>
<button type="submit" class="danger" formaction="/filaments/{index}/delete">Delete Filament</button>
</form>
"#,
        options = options,
        index = index,
        expected = expected_fields(current),
        fields = record_fields(&FilamentDraft::from(current))
    )
}

/// Hidden copy of the record the edit form was rendered from.
fn expected_fields(record: &FilamentRecord) -> String {
    format!(
        r#"<input type="hidden" name="expected_color" value="{}">
<input type="hidden" name="expected_company" value="{}">
<input type="hidden" name="expected_type" value="{}">
<input type="hidden" name="expected_remaining" value="{}">
<input type="hidden" name="expected_color_hex" value="{}">
"#,
        escape(&record.color),
        escape(&record.company),
        escape(&record.kind),
        record.remaining,
        escape(record.color_hex.as_str())
    )
}

fn filter_form(options: &FilterOptions, selection: &Selection) -> String {
    format!(
        r#"<h3>Filter Inventory</h3>
<form method="get" action="/" class="filters">
<div class="columns">
{colors}{companies}{types}</div>
<button type="submit">Apply Filters</button>
<a href="/">Clear</a>
</form>
"#,
        colors = multi_select("Filter by Color", "color", &options.colors, &selection.colors),
        companies = multi_select(
            "Filter by Company",
            "company",
            &options.companies,
            &selection.companies
        ),
        types = multi_select("Filter by Type", "type", &options.types, &selection.types)
    )
}

fn multi_select(label: &str, name: &str, values: &[String], chosen: &BTreeSet<String>) -> String {
    let mut html = format!(
        "<div>\n<label>{}\n<select name=\"{}\" multiple size=\"{}\">\n",
        escape(label),
        name,
        values.len().clamp(1, 6)
    );
    for value in values {
        let _ = writeln!(
            html,
            r#"<option value="{v}"{s}>{v}</option>"#,
            v = escape(value),
            s = selected(chosen.contains(value))
        );
    }
    html.push_str("</select>\n</label>\n</div>\n");
    html
}

fn inventory_table(rows: &[FilamentRecord]) -> String {
    let mut html = String::from(
        r#"<h3>Current Inventory</h3>
<table class="inventory">
<thead><tr><th></th><th>Color</th><th>Company</th><th>Type</th><th>Remaining %</th></tr></thead>
<tbody>
"#,
    );

    if rows.is_empty() {
        html.push_str("<tr><td colspan=\"5\">No filaments match the current filters.</td></tr>\n");
    }

    for record in rows {
        let _ = writeln!(
            html,
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            swatch(record),
            escape(&record.color),
            escape(&record.company),
            escape(&record.kind),
            record.remaining
        );
    }

    html.push_str("</tbody>\n</table>\n");
    html
}
