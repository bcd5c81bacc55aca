/*!
# Personnel Dashboard

A dashboard for personnel records kept in a remote, spreadsheet-backed
service, built in Rust.

## Overview

The roster lives in a "Personnel" sheet behind a Google Apps Script web app.
The dashboard reads the whole sheet, renders it as a table with overview
counts, lets users search it and pick a division, and appends new members
through a form. Nothing is cached between actions: every action fetches the
sheet again and redraws. Each browser keeps its own division selection.

## Architecture

### Data Access Layer
- **sheets**: HTTP client for the sheet endpoint (`fetch_rows`, `append_row`)
- **record**: Row and form types, form validation, append outcome

### View Layer
- **view**: Table rows, overview counts, search and division filtering
- **state**: Explicit dashboard state sequenced by request generation
- **session**: One dashboard state per browser, keyed by cookie
- **page**: Handlebars rendering of the dashboard page

### Web Layer
- **app**: axum routing and handlers
- **config**: Environment configuration

## Routes

- `/` - Load the dashboard
- `/search?q=` - Search by name, rank, division or ID
- `/division/{name}` - Select a division
- `/personnel` (POST) - Add a member
- `/api/personnel` - Roster as JSON
*/

pub mod config;
pub mod record;
pub mod state;
pub mod view;

#[cfg(feature = "web")]
pub mod app;
#[cfg(feature = "web")]
pub mod page;
#[cfg(feature = "web")]
pub mod session;
#[cfg(feature = "web")]
pub mod sheets;

/// Re-export the core types to make them easier to use
pub use record::*;
pub use state::*;
pub use view::*;
