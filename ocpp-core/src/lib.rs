pub mod format;
pub mod v16;
