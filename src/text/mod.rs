pub(crate) mod glyph;
