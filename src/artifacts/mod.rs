pub mod ole;
pub mod search;
pub mod thumbcache;
pub mod thumbsdb;
