//! Data-view transaction layer
//!
//! This module tracks optimistic pending mutations per entity and decides
//! which bulk actions apply to a selection of (possibly pending) rows.

pub mod bulk;
pub mod record;
pub mod transaction;
