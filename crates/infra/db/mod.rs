pub mod postgres;
pub mod repositories;
#[cfg(test)]
pub(crate) mod test_support;
