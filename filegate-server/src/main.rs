//! The file gateway server component.
//!
//! This builds on top of [`filegate_service`], and exposes the storage and
//! account layer as an `HTTP` API which can serve files directly to
//! *external clients*.
#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

use anyhow::Result;

fn main() -> Result<()> {
    filegate_server::cli::execute()
}
