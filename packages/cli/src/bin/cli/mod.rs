pub mod serve;
pub mod timeline;
pub mod token;
