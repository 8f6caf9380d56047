//! Rebuilds the crate when embedded migrations change.
//!
//! `embed_migrations!` reads the migration SQL at compile time, but Cargo
//! does not track those files on its own.

fn main() {
    println!("cargo:rerun-if-changed=migrations");
}
