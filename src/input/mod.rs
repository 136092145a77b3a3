pub mod dispatcher;
#[cfg(test)]
pub mod dispatcher_test;
pub mod source;
pub mod target;
