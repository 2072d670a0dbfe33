use std::{env, fs, path::PathBuf};

use config::mm::{HART_STACK_SIZE, PagingScheme, RAM_START};

fn main() {
    let manifest_dir = env::var("CARGO_MANIFEST_DIR").unwrap();
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    let target_os = env::var("CARGO_CFG_TARGET_OS").unwrap_or_default();

    // The build script links against a host build of `config`, which does
    // not see the features of this crate. Pick the scheme from ours.
    let scheme = if env::var_os("CARGO_FEATURE_SV32").is_some() {
        PagingScheme::Sv32
    } else if env::var_os("CARGO_FEATURE_SV48").is_some() {
        PagingScheme::Sv48
    } else {
        PagingScheme::Sv39
    };

    let link_script = fs::read_to_string(PathBuf::from(&manifest_dir).join("linker.ld"))
        .unwrap()
        .replace("%RAM_START%", &RAM_START.to_string())
        .replace("%MEGAPAGE_SIZE%", &scheme.megapage_size().to_string())
        .replace("%HART_STACK_SIZE%", &HART_STACK_SIZE.to_string());
    let linker_script_dest = out_dir.join("linker.ld");
    fs::write(&linker_script_dest, link_script).unwrap();

    // Image embedded as the payload; empty unless `PAYLOAD` names one.
    let payload = match env::var_os("PAYLOAD") {
        Some(path) => PathBuf::from(path),
        None => {
            let empty = out_dir.join("empty-payload.bin");
            fs::write(&empty, []).unwrap();
            empty
        }
    };
    println!("cargo:rustc-env=PAYLOAD_PATH={}", payload.display());
    println!("cargo:rerun-if-env-changed=PAYLOAD");
    println!("cargo:rerun-if-changed={}", payload.display());
    println!("cargo:rerun-if-changed=linker.ld");

    if target_os == "none" {
        println!("cargo:rustc-link-arg=-T{}", linker_script_dest.display());
    }
}
