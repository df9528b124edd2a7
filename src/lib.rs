//! Flowchart editor core.
//!
//! The diagram model and editing engine behind an interactive flowchart
//! editor: a typed shape/connection graph per tab, port-compatibility rules,
//! deterministic orthogonal path routing, whole-document undo/redo, and a
//! debounced background autosave worker. Rendering, pointer input and text
//! layout are external collaborators: they call in with resolved ids and
//! coordinates, and paint whatever the returned [`session::Change`] values
//! and [`routing::Route`]s describe.

pub mod autosave;
pub mod diagram;
pub mod document;
pub mod geometry;
pub mod routing;
pub mod rules;
pub mod session;
pub mod shapes;
pub mod undo;

pub use autosave::{AutosaveConfig, AutosaveEvent, AutosaveHandle, start_autosave_thread};
pub use diagram::{Connection, ConnectionId, Diagram, ShapeId};
pub use document::{SavedWorkspace, default_storage_path};
pub use geometry::Point;
pub use routing::{Route, RouteColor, RouteLabel, route};
pub use rules::{Direction, can_connect};
pub use session::{Change, Selection, Session, TabId};
pub use shapes::{Shape, ShapeType};
pub use undo::{History, Snapshot};
