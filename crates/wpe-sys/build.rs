use std::env;
use std::fs;
use std::path::PathBuf;

fn main() {
    println!("cargo::rerun-if-changed=build.rs");
    println!("cargo::rerun-if-changed=wrapper.h");
    println!("cargo::rustc-check-cfg=cfg(wpe_unavailable)");

    let out_path = PathBuf::from(env::var("OUT_DIR").expect("OUT_DIR is set by cargo"));
    let bindings_path = out_path.join("bindings.rs");

    // Hosts without the WPE stack still build the workspace; the
    // `in-app-browser` crate only links these symbols behind its `wpe` feature.
    let libraries = ["wpe-1.0", "wpe-webkit-2.0", "wpe-platform-2.0"]
        .iter()
        .map(|name| pkg_config::Config::new().probe(name))
        .collect::<Result<Vec<_>, _>>();

    let libraries = match libraries {
        Ok(libraries) => libraries,
        Err(e) => {
            println!("cargo::warning=WPE WebKit not found, generating empty bindings: {e}");
            println!("cargo::rustc-cfg=wpe_unavailable");
            fs::write(&bindings_path, "").expect("Failed to write empty bindings");
            return;
        }
    };

    let mut builder = bindgen::Builder::default()
        .header("wrapper.h")
        .parse_callbacks(Box::new(bindgen::CargoCallbacks::new()))
        .allowlist_function("wpe_.*")
        .allowlist_function("webkit_.*")
        .allowlist_function("jsc_.*")
        .allowlist_function("g_(object_unref|signal_connect_data|signal_handler_disconnect|error_free|free|main_context_default|main_context_iteration)")
        .allowlist_type("WPE.*")
        .allowlist_type("WebKit.*")
        .allowlist_type("JSC.*")
        .allowlist_var("WPE_.*")
        .allowlist_var("WEBKIT_.*")
        .generate_comments(true)
        .derive_debug(true)
        .derive_default(true);

    for path in libraries.iter().flat_map(|lib| lib.include_paths.iter()) {
        builder = builder.clang_arg(format!("-I{}", path.display()));
    }

    let bindings = builder
        .generate()
        .expect("Failed to generate bindings");

    bindings
        .write_to_file(&bindings_path)
        .expect("Failed to write bindings");
}
