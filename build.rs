use entities::ENTITIES;
use std::fmt::Write as _;
use std::{env, fs, path::PathBuf};

/// Generates a `phf::Map<&'static str, &'static str>` mapping entity names
/// (without the leading `&` or trailing `;`) to their decoded UTF-8 text, so
/// `entity::lookup` is a compile-time perfect-hash lookup rather than a
/// linear scan over the ~2,200 HTML5 entities.
///
/// `entities::ENTITIES` includes many names both with and without a
/// trailing `;`; only the `;`-terminated form is valid per CommonMark, so
/// those without are excluded here.
fn main() {
    let out_dir: PathBuf = env::var("OUT_DIR").unwrap().parse().unwrap();

    let mut map = phf_codegen::Map::new();
    for e in ENTITIES
        .iter()
        .filter(|e| e.entity.starts_with('&') && e.entity.ends_with(';'))
    {
        let name = &e.entity[1..e.entity.len() - 1];
        map.entry(name, format!("{:?}", e.characters));
    }

    let mut out = String::new();
    writeln!(
        out,
        "static TRANSLATED_ENTITIES: phf::Map<&'static str, &'static str> = {};",
        map.build()
    )
    .unwrap();

    fs::write(out_dir.join("entitydata.rs"), out).unwrap();
}
