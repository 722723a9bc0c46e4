pub(crate) mod path;
pub(crate) mod pool;
pub(crate) mod rasterizer;
pub(crate) mod scanline;
