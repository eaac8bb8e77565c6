//! Data models for MediaSync.
//!
//! This module contains the domain models:
//! - Mode, DataScope, MediaScope
//! - SyncRequest
//! - SyncResult and its ErrorEntry list
//! - Account and Section

pub mod account;
pub mod mode;
pub mod request;
pub mod result;

pub use account::{Account, AccountDirectory, Section};
pub use mode::{DataScope, MediaScope, Mode};
pub use request::SyncRequest;
pub use result::{ErrorEntry, SyncResult};
