pub mod add;
pub mod delete;
pub mod edit;
pub mod init;
pub mod list;
pub mod show;
pub mod sync;
