pub(crate) mod funcs;
pub(crate) mod operator;
