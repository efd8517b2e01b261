pub mod base;
pub mod cortex;

#[cfg(test)]
pub mod mock;
