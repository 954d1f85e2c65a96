pub mod detector;
pub mod fetcher;
pub mod poller;
