//! Command-line front end for managing database migrations.

pub mod cli;
