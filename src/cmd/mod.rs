pub mod catalog;
pub mod login;
pub mod output;
pub mod stream;
