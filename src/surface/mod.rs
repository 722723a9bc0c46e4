pub(crate) mod format;
pub(crate) mod image;
