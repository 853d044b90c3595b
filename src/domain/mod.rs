pub(crate) mod switch;
pub(crate) mod working_sets;
