pub mod figshare;
pub mod http;
pub mod twitter;
