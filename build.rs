//! Build script for the provider protocol.
//!
//! `src/generated.rs` is committed, so a normal build needs neither this
//! script's output nor `protoc`. After editing `proto/provider.proto`, run
//! `cargo build --features regenerate-proto` and commit the new file.

fn main() -> Result<(), Box<dyn std::error::Error>> {
    #[cfg(feature = "regenerate-proto")]
    {
        let out_dir = std::path::PathBuf::from("src");
        tonic_prost_build::configure()
            .build_client(false)
            .build_server(true)
            .out_dir(&out_dir)
            .compile_protos(&["proto/provider.proto"], &["proto"])?;

        // prost names the file after the proto package
        let generated = out_dir.join("boundary.provider.v1.rs");
        if generated.exists() {
            std::fs::rename(generated, out_dir.join("generated.rs"))?;
        }
    }

    println!("cargo:rerun-if-changed=proto/provider.proto");

    Ok(())
}
