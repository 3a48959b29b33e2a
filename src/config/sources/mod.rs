pub mod environment;
pub mod repo_file;
