use std::collections::hash_map::DefaultHasher;
use std::fs;
use std::hash::{Hash, Hasher};

// Cache-busting hash over the static assets, exposed as STATIC_HASH.
fn main() {
    println!("cargo:rerun-if-changed=static/");

    let mut hasher = DefaultHasher::new();

    let mut entries: Vec<_> = fs::read_dir("static")
        .expect("static directory missing")
        .filter_map(|e| e.ok())
        .collect();
    entries.sort_by_key(|e| e.file_name());

    for entry in entries {
        let path = entry.path();
        if path.is_file() {
            path.file_name()
                .and_then(|n| n.to_str())
                .unwrap_or_default()
                .hash(&mut hasher);
            fs::read(&path).unwrap_or_default().hash(&mut hasher);
        }
    }

    let hash = format!("{:x}", hasher.finish());
    println!("cargo:rustc-env=STATIC_HASH={}", &hash[..8.min(hash.len())]);
}
