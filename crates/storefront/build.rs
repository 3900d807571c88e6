//! Build script for storefront crate.
//!
//! Generates content-based hashes for static assets (CSS and JS) so they can
//! be served with immutable cache headers.

use std::env;
use std::fs;
use std::path::Path;

use sha2::{Digest, Sha256};

/// (source path under `static/`, env var, derived file stem, extension)
const ASSETS: &[(&str, &str, &str, &str)] = &[
    ("css/main.css", "CSS_HASH", "main", "css"),
    ("js/app.js", "JS_HASH", "app", "js"),
];

fn main() {
    let manifest_dir =
        env::var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR must be set by Cargo");
    let static_dir = Path::new(&manifest_dir).join("static");

    for (source, var, stem, ext) in ASSETS {
        hash_asset(&static_dir, source, var, stem, ext);
    }
}

/// Hash an asset and copy it to `static/derived/` with the hash in its name.
///
/// Sets `var` for use with `env!`.
fn hash_asset(static_dir: &Path, source: &str, var: &str, stem: &str, ext: &str) {
    let path = static_dir.join(source);
    println!("cargo:rerun-if-changed={}", path.display());

    let content = match fs::read(&path) {
        Ok(content) => content,
        Err(e) => {
            println!("cargo:warning=Could not read {source}: {e}");
            println!("cargo:rustc-env={var}=");
            return;
        }
    };

    // First 8 hex chars of SHA256
    let hash = format!("{:x}", Sha256::digest(&content));
    let short_hash = &hash[..8];
    println!("cargo:rustc-env={var}={short_hash}");

    let derived_dir = static_dir.join("derived");
    fs::create_dir_all(&derived_dir).expect("Failed to create derived asset directory");
    fs::copy(&path, derived_dir.join(format!("{stem}.{short_hash}.{ext}")))
        .expect("Failed to copy asset to derived directory");
}
