pub use ticketmail_types::prelude::*;

// vim: ts=4
