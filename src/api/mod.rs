//! REST API module
//!
//! Request/response access to the contracts. Callers identify themselves
//! with a `caller` field on every mutating request; amounts are decimal
//! strings.
//!
//! # Endpoints
//!
//! ## Registry
//! - `GET /api/rectangles` - List rectangles
//! - `POST /api/rectangles` - Create rectangle
//! - `GET /api/rectangles/{id}` - Get rectangle
//! - `POST /api/rectangles/{id}/resize` - Resize rectangle
//! - `POST /api/rectangles/{id}/move` - Move rectangle
//! - `GET /api/rectangles/area` - Total surface
//!
//! ## Ledger
//! - `GET /api/ledger` - Ledger statistics
//! - `POST /api/ledger/deposit` - Deposit
//! - `POST /api/ledger/withdraw` - Withdraw (all, or `amount`)
//! - `POST /api/ledger/recipient` - Change recipient
//! - `POST /api/ledger/halt`, `POST /api/ledger/resume` - Halt flag
//! - `GET /api/ledger/depositors`, `GET /api/ledger/depositors/{index}`
//!
//! ## Notifications
//! - `GET /api/notifications?since=N` - Retained notifications
//! - `GET /ws` - Live notifications

pub mod handlers;
pub mod routes;
pub mod websocket;

pub use handlers::{ApiState, SharedService};
pub use routes::create_router;
pub use websocket::WsMessage;
